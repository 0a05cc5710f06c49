//! 経費一覧の耐障害取得
//!
//! キャッシュ確認 → バックオフ付きリトライ → 部分復旧 の順に処理し、
//! 呼び出し元には常に（空の可能性がある）経費列を返す。

use super::backoff::BackoffSchedule;
use super::cache::{CacheEntry, CacheStore};
use super::identity::{resolve_user_id, IdentityProvider};
use super::models::Expense;
use super::queries::{extract_list_records, list_expenses_request};
use super::reconciler::{field_errors_from, reconcile};
use crate::shared::config::environment::{FetchConfig, MAX_LIST_RETRIES};
use crate::shared::graphql::{QueryResponse, RemoteQueryClient};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// レスポンスの経費列を復旧処理にかける
fn reconcile_response(response: &QueryResponse) -> Vec<Expense> {
    let records = extract_list_records(response.data.as_ref());
    reconcile(records, &field_errors_from(&response.errors))
}

/// 実データの割合が半分以上かどうか（キャッシュしてよい品質か）
fn is_cacheable(expenses: &[Expense]) -> bool {
    let real = expenses.iter().filter(|e| e.is_real()).count();
    real * 2 >= expenses.len()
}

/// 経費一覧の耐障害取得
pub struct ResilientListFetcher {
    client: Arc<dyn RemoteQueryClient>,
    cache: Arc<dyn CacheStore>,
    identity: Arc<dyn IdentityProvider>,
    max_retries: u32,
    cache_ttl: Duration,
    backoff: BackoffSchedule,
}

impl ResilientListFetcher {
    /// 新しい取得処理を作成
    ///
    /// # 引数
    /// * `client` - GraphQLクライアント
    /// * `cache` - 一覧キャッシュ（更新系処理と共有する）
    /// * `identity` - 既定ユーザーIDの解決方法
    /// * `config` - リトライ回数・キャッシュ有効期間
    pub fn new(
        client: Arc<dyn RemoteQueryClient>,
        cache: Arc<dyn CacheStore>,
        identity: Arc<dyn IdentityProvider>,
        config: &FetchConfig,
    ) -> Self {
        Self {
            client,
            cache,
            identity,
            max_retries: config.max_retries.min(MAX_LIST_RETRIES),
            cache_ttl: config.cache_ttl,
            backoff: BackoffSchedule::default(),
        }
    }

    /// バックオフ表を差し替える
    pub fn with_backoff(mut self, backoff: BackoffSchedule) -> Self {
        self.backoff = backoff;
        self
    }

    /// 最大リトライ回数（試行回数は`max_retries + 1`）
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// キャッシュの有効期間
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// キャッシュを無効化する
    pub fn invalidate(&self) {
        self.cache.clear();
    }

    /// 経費一覧を取得する
    ///
    /// 失敗を呼び出し元に返すことはない。劣化した結果は
    /// `is_placeholder`や空の列として表れる。
    ///
    /// # 引数
    /// * `user_id` - ユーザーID（未指定の場合は既定ユーザー）
    pub async fn list_expenses(&self, user_id: Option<&str>) -> Vec<Expense> {
        let user_id = resolve_user_id(user_id, self.identity.as_ref());

        if let Some(cached) = self
            .cache
            .get(&user_id)
            .and_then(|entry| entry.fresh_data(self.cache_ttl).cloned())
        {
            debug!("経費一覧をキャッシュから返します: user_id={user_id}, count={}", cached.len());
            return cached;
        }

        let request = list_expenses_request(&user_id);
        let total_attempts = self.max_retries.saturating_add(1);
        // 空でない復旧結果を返した最後のレスポンス分
        let mut last_usable: Option<Vec<Expense>> = None;

        for attempt in 0..=self.max_retries {
            let is_final = attempt == self.max_retries;
            tokio::time::sleep(self.backoff.delay_for(attempt)).await;

            let response = match self.client.query(&request).await {
                Ok(response) => response,
                Err(e) if e.class.is_throttled() && !is_final => {
                    warn!(
                        "経費一覧取得がレート制限されました。リトライします: attempt={}/{}, error={e}",
                        attempt + 1,
                        total_attempts
                    );
                    tokio::time::sleep(self.backoff.throttle_penalty).await;
                    continue;
                }
                Err(e) => {
                    error!("経費一覧取得に失敗しました: user_id={user_id}, error={e}");
                    return Self::salvage(last_usable);
                }
            };

            let expenses = reconcile_response(&response);
            let rate_limited = response.is_rate_limited();

            if !expenses.is_empty() {
                if is_cacheable(&expenses) {
                    info!(
                        "経費一覧取得成功: user_id={user_id}, count={}, attempt={}",
                        expenses.len(),
                        attempt + 1
                    );
                    self.cache
                        .set(&user_id, CacheEntry::new(&user_id, expenses.clone()));
                    return expenses;
                }

                if is_final {
                    warn!(
                        "経費一覧の大半が復旧レコードです（キャッシュしません）: user_id={user_id}, count={}",
                        expenses.len()
                    );
                    return expenses;
                }

                warn!(
                    "経費一覧の品質が低いためリトライします: attempt={}/{}",
                    attempt + 1,
                    total_attempts
                );
                last_usable = Some(expenses);
                continue;
            }

            if rate_limited && !is_final {
                warn!(
                    "経費一覧取得がレート制限されました。リトライします: attempt={}/{}",
                    attempt + 1,
                    total_attempts
                );
                continue;
            }

            if !rate_limited {
                debug!("経費一覧は空です: user_id={user_id}");
                return Vec::new();
            }
        }

        warn!(
            "経費一覧取得のリトライ上限に達しました: user_id={user_id}, attempts={total_attempts}"
        );
        Self::salvage(last_usable)
    }

    /// この呼び出しで最後に得られた空でない結果を返す
    ///
    /// レート制限などで空になったレスポンスは対象外。
    fn salvage(last_usable: Option<Vec<Expense>>) -> Vec<Expense> {
        match last_usable {
            Some(expenses) => {
                info!("直前のレスポンスから経費を復旧しました: count={}", expenses.len());
                expenses
            }
            None => Vec::new(),
        }
    }
}
