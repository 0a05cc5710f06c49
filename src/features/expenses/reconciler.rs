//! 部分的に欠損したレスポンスの復旧
//!
//! GraphQLはフィールド単位のエラーを返すことがあり、その場合レコード全体ではなく
//! 該当フィールドだけが`null`になる。ここでは欠損レコードをプレースホルダーで置き換え、
//! 欠損フィールドを決定的な値で補い、必須フィールドが必ず埋まった経費列を返す。

use super::models::{
    fallback_category, Expense, PLACEHOLDER_ID_PREFIX, PLACEHOLDER_NAME, RECOVERED_ID_PREFIX,
};
use crate::shared::graphql::{GraphQLError, PathSegment};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// 1レコード1フィールドのエラー参照
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldError {
    pub record_index: usize,
    pub field: String,
}

impl FieldError {
    pub fn new(record_index: usize, field: &str) -> Self {
        Self {
            record_index,
            field: field.to_string(),
        }
    }

    /// エラーパスからフィールドエラーを導出する
    ///
    /// パスは最低3要素必要。先頭以外で、直後にフィールド名が続く最後の添字を
    /// レコード番号とする（`["listExpenses", 1, "amount"]`、
    /// `["listExpenses", "items", 1, "amount"]`のどちらにも対応）。
    pub fn from_path(path: &[PathSegment]) -> Option<Self> {
        if path.len() < 3 {
            return None;
        }

        (1..path.len() - 1).rev().find_map(|i| {
            let record_index = path[i].as_index()?;
            let field = path[i + 1].as_field()?;
            Some(Self::new(record_index, field))
        })
    }
}

/// GraphQLエラー群からフィールドエラーを抽出する（パスが短いものは無視）
pub fn field_errors_from(errors: &[GraphQLError]) -> Vec<FieldError> {
    errors
        .iter()
        .filter_map(|e| e.path.as_deref().and_then(FieldError::from_path))
        .collect()
}

/// 現在時刻で復旧処理を行う
pub fn reconcile(raw_records: Option<&Value>, field_errors: &[FieldError]) -> Vec<Expense> {
    reconcile_at(raw_records, field_errors, Utc::now())
}

/// 指定した時刻で復旧処理を行う
///
/// # 引数
/// * `raw_records` - レスポンスから取り出したレコード配列（配列以外は空扱い）
/// * `field_errors` - フィールドエラー
/// * `now` - 補完に使う現在時刻
pub fn reconcile_at(
    raw_records: Option<&Value>,
    field_errors: &[FieldError],
    now: DateTime<Utc>,
) -> Vec<Expense> {
    let Some(records) = raw_records.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut errors_by_record: HashMap<usize, HashSet<&str>> = HashMap::new();
    for error in field_errors {
        errors_by_record
            .entry(error.record_index)
            .or_default()
            .insert(error.field.as_str());
    }

    let no_errors = HashSet::new();
    let mut placeholders = 0;
    let mut repaired = 0;

    let expenses: Vec<Expense> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let flagged = errors_by_record.get(&index).unwrap_or(&no_errors);
            match record.as_object() {
                None => {
                    placeholders += 1;
                    Some(placeholder(index, now))
                }
                Some(fields) => {
                    let fields = RawFields::read(fields, flagged);
                    if !flagged.is_empty() || !fields.is_complete() {
                        repaired += 1;
                    }
                    Some(fields.into_expense(index, now))
                }
            }
        })
        .collect();

    if placeholders > 0 || repaired > 0 {
        warn!(
            "経費レコードを復旧しました: total={}, placeholders={placeholders}, repaired={repaired}",
            expenses.len()
        );
    } else {
        debug!("経費レコードはすべて正常です: total={}", expenses.len());
    }

    expenses
}

/// 欠落したレコードの代替
fn placeholder(index: usize, now: DateTime<Utc>) -> Expense {
    let timestamp = now.to_rfc3339();
    Expense {
        id: format!("{PLACEHOLDER_ID_PREFIX}{index}-{}", now.timestamp_millis()),
        name: PLACEHOLDER_NAME.to_string(),
        amount: 0.0,
        category: fallback_category(index).to_string(),
        date: timestamp.clone(),
        user_id: None,
        created_at: Some(timestamp.clone()),
        updated_at: Some(timestamp),
        is_placeholder: true,
    }
}

/// エラーフラグを考慮して読み取ったフィールド値（`None`は欠損）
struct RawFields {
    id: Option<String>,
    name: Option<String>,
    amount: Option<f64>,
    category: Option<String>,
    date: Option<String>,
    user_id: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl RawFields {
    fn read(fields: &Map<String, Value>, flagged: &HashSet<&str>) -> Self {
        let text = |name: &str| -> Option<String> {
            if flagged.contains(name) {
                return None;
            }
            match fields.get(name)? {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };

        let amount = if flagged.contains("amount") {
            None
        } else {
            fields.get("amount").and_then(read_amount)
        };

        Self {
            id: text("id"),
            name: text("name"),
            amount,
            category: text("category"),
            date: text("date"),
            user_id: text("userId"),
            created_at: text("createdAt"),
            updated_at: text("updatedAt"),
        }
    }

    fn is_complete(&self) -> bool {
        self.id.is_some()
            && self.name.is_some()
            && self.amount.is_some()
            && self.category.is_some()
            && self.date.is_some()
    }

    fn into_expense(self, index: usize, now: DateTime<Utc>) -> Expense {
        Expense {
            id: self.id.unwrap_or_else(|| {
                format!("{RECOVERED_ID_PREFIX}{index}-{}", now.timestamp_millis())
            }),
            name: self.name.unwrap_or_else(|| format!("Expense {}", index + 1)),
            amount: self.amount.unwrap_or(0.0),
            category: self
                .category
                .unwrap_or_else(|| fallback_category(index).to_string()),
            date: self.date.unwrap_or_else(|| now.to_rfc3339()),
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_placeholder: false,
        }
        .with_derived_flags()
    }
}

/// 金額を読み取る（数値または数値文字列。負数・非有限値は欠損扱い）
fn read_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (amount.is_finite() && amount >= 0.0).then_some(amount)
}
