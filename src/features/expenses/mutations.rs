//! 経費の作成・更新・削除
//!
//! 成功した更新系操作は戻る前に一覧キャッシュを無効化する。

use super::cache::CacheStore;
use super::models::{CreateExpenseDto, Expense, UpdateExpenseDto};
use super::queries::{create_expense_mutation, delete_expense_mutation, update_expense_mutation};
use crate::shared::errors::{AppError, AppResult};
use crate::shared::graphql::{GraphQLRequest, QueryResponse, RemoteQueryClient, TransportError};
use log::info;
use serde_json::{json, Value};
use std::sync::Arc;

/// 金額のバリデーション
fn validate_amount(amount: f64) -> AppResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::validation("金額は0以上の数値である必要があります"));
    }
    Ok(())
}

/// 名前のバリデーション
fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("経費名を入力してください"));
    }
    Ok(())
}

/// 通信エラーをアプリケーションエラーに変換
fn map_transport_error(operation: &str, error: TransportError) -> AppError {
    if error.class.is_throttled() {
        AppError::RateLimited(format!("{operation}: {}", error.message))
    } else {
        AppError::external_service(operation, error.message.as_str())
    }
}

/// レスポンスから操作結果を取り出す（nullは結果なし）
fn operation_payload(operation: &str, data: Option<Value>) -> Option<Value> {
    data.and_then(|mut data| data.get_mut(operation).map(Value::take))
        .filter(|payload| !payload.is_null())
}

/// レスポンスのエラーをアプリケーションエラーに変換（先頭のエラーを代表とする）
fn response_error(operation: &str, response: &QueryResponse) -> Option<AppError> {
    response.errors.first().map(|first| {
        if first.class.is_throttled() {
            AppError::RateLimited(format!("{operation}: {}", first.message))
        } else {
            AppError::external_service(operation, first.message.as_str())
        }
    })
}

/// 経費の更新系操作
pub struct ExpenseMutations {
    client: Arc<dyn RemoteQueryClient>,
    cache: Arc<dyn CacheStore>,
}

impl ExpenseMutations {
    pub fn new(client: Arc<dyn RemoteQueryClient>, cache: Arc<dyn CacheStore>) -> Self {
        Self { client, cache }
    }

    async fn execute(&self, operation: &str, request: GraphQLRequest) -> AppResult<Value> {
        let response = self
            .client
            .query(&request)
            .await
            .map_err(|e| map_transport_error(operation, e))?;
        let error = response_error(operation, &response);
        let payload = operation_payload(operation, response.data);

        // 結果が返っていればサーバー側は変更済みとみなす
        if payload.is_some() {
            self.cache.clear();
        }
        if let Some(error) = error {
            return Err(error);
        }

        payload.ok_or_else(|| AppError::not_found(format!("{operation}の結果")))
    }

    /// 経費を作成する
    ///
    /// # 引数
    /// * `dto` - 経費作成用DTO
    ///
    /// # 戻り値
    /// 作成された経費
    pub async fn create_expense(&self, dto: &CreateExpenseDto) -> AppResult<Expense> {
        validate_name(&dto.name)?;
        validate_amount(dto.amount)?;

        let request = GraphQLRequest::new(&create_expense_mutation(), "CreateExpense")
            .variable("input", serde_json::to_value(dto)?);
        let payload = self.execute("createExpense", request).await?;
        let expense: Expense = serde_json::from_value::<Expense>(payload)?.with_derived_flags();

        info!("経費作成成功: expense_id={}", expense.id);
        Ok(expense)
    }

    /// 経費を更新する
    ///
    /// # 引数
    /// * `id` - 経費ID
    /// * `dto` - 経費更新用DTO（指定したフィールドのみ更新）
    pub async fn update_expense(&self, id: &str, dto: &UpdateExpenseDto) -> AppResult<Expense> {
        info!("経費更新処理開始: expense_id={id}, dto={dto:?}");

        if dto.is_empty() {
            return Err(AppError::validation("更新する項目がありません"));
        }
        if let Some(name) = &dto.name {
            validate_name(name)?;
        }
        if let Some(amount) = dto.amount {
            validate_amount(amount)?;
        }

        let mut input = serde_json::to_value(dto)?;
        input["id"] = json!(id);

        let request =
            GraphQLRequest::new(&update_expense_mutation(), "UpdateExpense").variable("input", input);
        let payload = self.execute("updateExpense", request).await?;
        let expense: Expense = serde_json::from_value::<Expense>(payload)?.with_derived_flags();

        info!("経費更新成功: expense_id={id}");
        Ok(expense)
    }

    /// 経費を削除する
    pub async fn delete_expense(&self, id: &str) -> AppResult<()> {
        info!("経費削除処理開始: expense_id={id}");

        let request = GraphQLRequest::new(&delete_expense_mutation(), "DeleteExpense")
            .variable("input", json!({ "id": id }));
        self.execute("deleteExpense", request).await?;

        info!("経費削除成功: expense_id={id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::expenses::cache::{CacheEntry, InMemoryCacheStore};
    use crate::features::expenses::testing::{expense_record, ScriptedClient};
    use crate::shared::graphql::{GraphQLError, PathSegment};

    fn filled_cache() -> Arc<InMemoryCacheStore> {
        let cache = Arc::new(InMemoryCacheStore::new());
        cache.set("user-1", CacheEntry::new("user-1", Vec::new()));
        cache
    }

    fn payload(operation: &str, value: Value) -> QueryResponse {
        QueryResponse {
            data: Some(json!({ operation: value })),
            errors: Vec::new(),
        }
    }

    fn create_dto() -> CreateExpenseDto {
        CreateExpenseDto {
            name: "Coffee".to_string(),
            amount: 450.0,
            category: "food".to_string(),
            date: "2024-01-01".to_string(),
            user_id: Some("user-1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_clears_cache() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(payload(
            "createExpense",
            expense_record("new-1", "Coffee"),
        ))]));
        let cache = filled_cache();
        let mutations = ExpenseMutations::new(client.clone(), cache.clone());

        let expense = mutations.create_expense(&create_dto()).await.unwrap();

        assert_eq!(expense.id, "new-1");
        assert!(!expense.is_placeholder);
        assert_eq!(cache.snapshot(), CacheEntry::default());
        let request = &client.requests()[0];
        assert_eq!(request.variables["input"]["name"], "Coffee");
        assert_eq!(request.variables["input"]["userId"], "user-1");
    }

    #[tokio::test]
    async fn test_update_sends_id_and_clears_cache() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(payload(
            "updateExpense",
            expense_record("exp-1", "Dinner"),
        ))]));
        let cache = filled_cache();
        let mutations = ExpenseMutations::new(client.clone(), cache.clone());

        let dto = UpdateExpenseDto {
            name: Some("Dinner".to_string()),
            ..Default::default()
        };
        let expense = mutations.update_expense("exp-1", &dto).await.unwrap();

        assert_eq!(expense.name, "Dinner");
        assert!(cache.get("user-1").is_none());
        let input = &client.requests()[0].variables["input"];
        assert_eq!(input["id"], "exp-1");
        assert!(input.get("amount").is_none());
    }

    #[tokio::test]
    async fn test_delete_clears_cache() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(payload(
            "deleteExpense",
            json!({ "id": "exp-1" }),
        ))]));
        let cache = filled_cache();
        let mutations = ExpenseMutations::new(client, cache.clone());

        mutations.delete_expense("exp-1").await.unwrap();
        assert!(cache.get("user-1").is_none());
    }

    #[tokio::test]
    async fn test_validation_errors_skip_remote_call() {
        let client = Arc::new(ScriptedClient::new(Vec::new()));
        let cache = filled_cache();
        let mutations = ExpenseMutations::new(client.clone(), cache.clone());

        let negative = CreateExpenseDto {
            amount: -1.0,
            ..create_dto()
        };
        assert!(matches!(
            mutations.create_expense(&negative).await,
            Err(AppError::Validation(_))
        ));

        let blank = CreateExpenseDto {
            name: "  ".to_string(),
            ..create_dto()
        };
        assert!(mutations.create_expense(&blank).await.is_err());
        assert!(mutations
            .update_expense("exp-1", &UpdateExpenseDto::default())
            .await
            .is_err());

        assert_eq!(client.calls(), 0);
        assert!(cache.get("user-1").is_some());
    }

    #[tokio::test]
    async fn test_failed_mutation_keeps_cache() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(QueryResponse {
            data: Some(json!({ "deleteExpense": null })),
            errors: vec![GraphQLError::new("Rate Exceeded").with_error_type("Throttling")],
        })]));
        let cache = filled_cache();
        let mutations = ExpenseMutations::new(client, cache.clone());

        let result = mutations.delete_expense("exp-1").await;
        assert!(matches!(result, Err(AppError::RateLimited(_))));
        assert!(cache.get("user-1").is_some());
    }

    #[tokio::test]
    async fn test_partial_success_still_clears_cache() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(QueryResponse {
            data: Some(json!({ "createExpense": expense_record("new-1", "Coffee") })),
            errors: vec![GraphQLError::new("Cannot return null for non-nullable type")
                .with_path(vec![
                    PathSegment::Key("createExpense".to_string()),
                    PathSegment::Key("description".to_string()),
                ])],
        })]));
        let cache = filled_cache();
        let mutations = ExpenseMutations::new(client, cache.clone());

        let result = mutations.create_expense(&create_dto()).await;
        assert!(matches!(result, Err(AppError::ExternalService(_))));
        assert_eq!(cache.snapshot(), CacheEntry::default());
    }

    #[tokio::test]
    async fn test_transport_error_is_external_service() {
        let client = Arc::new(ScriptedClient::new(vec![Err(TransportError::terminal(
            "HTTP 500",
        ))]));
        let mutations = ExpenseMutations::new(client, filled_cache());

        let result = mutations.delete_expense("exp-1").await;
        assert!(matches!(result, Err(AppError::ExternalService(_))));
    }
}
