/// 経費機能モジュール
///
/// このモジュールは経費一覧の取得と更新に関連する機能を提供します：
/// - 短期キャッシュとバックオフ付きリトライによる一覧取得
/// - フィールド単位のエラーを含むレスポンスの復旧
/// - 経費の作成、更新、削除（成功時にキャッシュを無効化）
// サブモジュールの宣言
pub mod backoff;
pub mod cache;
pub mod fetcher;
pub mod identity;
pub mod models;
pub mod mutations;
pub mod queries;
pub mod reconciler;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

// 公開インターフェース：外部から使用可能な型と関数をエクスポート

// モデル
pub use models::{CreateExpenseDto, Expense, UpdateExpenseDto};

// 一覧取得
pub use backoff::BackoffSchedule;
pub use cache::{CacheEntry, CacheStore, InMemoryCacheStore};
pub use fetcher::ResilientListFetcher;
pub use identity::{IdentityProvider, StaticIdentity};
pub use reconciler::{reconcile, FieldError};

// 更新系
pub use mutations::ExpenseMutations;
pub use service::ExpenseService;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exports() {
        // モジュールが正しくエクスポートされていることを確認
        let _expense: Option<Expense> = None;
        let _create_dto: Option<CreateExpenseDto> = None;
        let _update_dto: Option<UpdateExpenseDto> = None;
        let _entry: Option<CacheEntry> = None;
        let _field_error: Option<FieldError> = None;

        // この時点でコンパイルが通れば、エクスポートは正しく機能している
    }
}
