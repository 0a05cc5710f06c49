use super::cache::{CacheStore, InMemoryCacheStore};
use super::fetcher::ResilientListFetcher;
use super::identity::{IdentityProvider, StaticIdentity};
use super::models::{CreateExpenseDto, Expense, UpdateExpenseDto};
use super::mutations::ExpenseMutations;
use crate::shared::api_client::GraphQLClient;
use crate::shared::config::environment::FetchConfig;
use crate::shared::errors::AppResult;
use crate::shared::graphql::RemoteQueryClient;
use std::sync::Arc;

/// 経費サービス
///
/// 一覧取得と更新系操作で同じクライアントとキャッシュを共有し、
/// 更新が成功すると次の一覧取得は必ず通信する。
pub struct ExpenseService {
    fetcher: ResilientListFetcher,
    mutations: ExpenseMutations,
}

impl ExpenseService {
    /// クライアントと設定からサービスを作成
    pub fn new(client: Arc<dyn RemoteQueryClient>, config: &FetchConfig) -> Self {
        let identity = Arc::new(StaticIdentity::new(config.default_user_id.clone()));
        Self::with_parts(client, Arc::new(InMemoryCacheStore::new()), identity, config)
    }

    /// 各部品を指定してサービスを作成
    pub fn with_parts(
        client: Arc<dyn RemoteQueryClient>,
        cache: Arc<dyn CacheStore>,
        identity: Arc<dyn IdentityProvider>,
        config: &FetchConfig,
    ) -> Self {
        Self {
            fetcher: ResilientListFetcher::new(client.clone(), cache.clone(), identity, config),
            mutations: ExpenseMutations::new(client, cache),
        }
    }

    /// 環境変数からサービスを作成
    pub fn from_env() -> AppResult<Self> {
        let client = GraphQLClient::new()?;
        Ok(Self::new(Arc::new(client), &FetchConfig::from_env()))
    }

    /// 一覧取得処理を取得
    ///
    /// # 戻り値
    /// このサービスが使用する一覧取得処理（設定値の確認用）
    pub fn fetcher(&self) -> &ResilientListFetcher {
        &self.fetcher
    }

    /// 経費一覧を取得する（失敗しない）
    pub async fn list_expenses(&self, user_id: Option<&str>) -> Vec<Expense> {
        self.fetcher.list_expenses(user_id).await
    }

    /// 経費を作成する
    ///
    /// # 引数
    /// * `dto` - 作成する経費の内容
    ///
    /// # 戻り値
    /// 作成された経費。成功時は一覧キャッシュが無効化される
    pub async fn create_expense(&self, dto: &CreateExpenseDto) -> AppResult<Expense> {
        self.mutations.create_expense(dto).await
    }

    /// 経費を更新する
    ///
    /// # 引数
    /// * `id` - 更新対象の経費ID
    /// * `dto` - 変更するフィールド（未指定のフィールドは変更しない）
    ///
    /// # 戻り値
    /// 更新後の経費。成功時は一覧キャッシュが無効化される
    pub async fn update_expense(&self, id: &str, dto: &UpdateExpenseDto) -> AppResult<Expense> {
        self.mutations.update_expense(id, dto).await
    }

    /// 経費を削除する
    ///
    /// # 引数
    /// * `id` - 削除対象の経費ID
    ///
    /// # 戻り値
    /// 成功時は`()`。成功時は一覧キャッシュが無効化される
    pub async fn delete_expense(&self, id: &str) -> AppResult<()> {
        self.mutations.delete_expense(id).await
    }
}
