use serde::{Deserialize, Serialize};

/// プレースホルダー（欠落レコードの代替）IDの接頭辞
pub const PLACEHOLDER_ID_PREFIX: &str = "placeholder-";

/// 復旧済みレコードIDの接頭辞
pub const RECOVERED_ID_PREFIX: &str = "recovered-";

/// プレースホルダーレコードの名前
pub const PLACEHOLDER_NAME: &str = "Loading...";

/// カテゴリ欠落時のフォールバック候補（添字の剰余で選択）
pub const FALLBACK_CATEGORIES: &[&str] = &[
    "food",
    "transportation",
    "entertainment",
    "utilities",
    "shopping",
    "other",
];

/// 添字に対応するフォールバックカテゴリを取得
pub fn fallback_category(index: usize) -> &'static str {
    FALLBACK_CATEGORIES[index % FALLBACK_CATEGORIES.len()]
}

/// IDが復旧マーカー接頭辞で始まるかどうか
pub fn is_recovery_id(id: &str) -> bool {
    id.starts_with(PLACEHOLDER_ID_PREFIX) || id.starts_with(RECOVERED_ID_PREFIX)
}

/// 経費データモデル
///
/// 取得境界を出る経費は必須フィールド（id, name, amount, category, date）が
/// すべて埋まっている。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub category: String,
    pub date: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    /// 合成・不完全なレコードかどうか（サーバーには送信しない派生値）
    #[serde(default, skip_deserializing)]
    pub is_placeholder: bool,
}

impl Expense {
    /// IDから`is_placeholder`を再計算する
    pub fn with_derived_flags(mut self) -> Self {
        self.is_placeholder = is_recovery_id(&self.id);
        self
    }

    /// 実データ（プレースホルダーでない）かどうか
    pub fn is_real(&self) -> bool {
        !self.is_placeholder
    }
}

/// 経費作成用DTO
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseDto {
    pub name: String,
    pub amount: f64,
    pub category: String,
    pub date: String,
    /// ユーザーID（認証後に設定される）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// 経費更新用DTO
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl UpdateExpenseDto {
    /// 更新対象のフィールドがないかどうか
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.amount.is_none() && self.category.is_none() && self.date.is_none()
    }
}
