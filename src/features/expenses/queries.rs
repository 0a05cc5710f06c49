//! 経費のGraphQL文書とレスポンスからのレコード抽出

use crate::shared::graphql::GraphQLRequest;
use serde_json::Value;

/// 経費一覧のデータキー
pub const LIST_EXPENSES_KEY: &str = "listExpenses";

const EXPENSE_FIELDS: &str = "id name amount category date userId createdAt updatedAt";

/// 経費一覧取得クエリ
pub fn list_expenses_query() -> String {
    format!(
        "query ListExpenses($userId: ID!) {{ listExpenses(filter: {{ userId: {{ eq: $userId }} }}) {{ items {{ {EXPENSE_FIELDS} }} }} }}"
    )
}

/// 経費作成ミューテーション
pub fn create_expense_mutation() -> String {
    format!(
        "mutation CreateExpense($input: CreateExpenseInput!) {{ createExpense(input: $input) {{ {EXPENSE_FIELDS} }} }}"
    )
}

/// 経費更新ミューテーション
pub fn update_expense_mutation() -> String {
    format!(
        "mutation UpdateExpense($input: UpdateExpenseInput!) {{ updateExpense(input: $input) {{ {EXPENSE_FIELDS} }} }}"
    )
}

/// 経費削除ミューテーション
pub fn delete_expense_mutation() -> String {
    "mutation DeleteExpense($input: DeleteExpenseInput!) { deleteExpense(input: $input) { id } }"
        .to_string()
}

/// 経費一覧取得リクエストを作成
pub fn list_expenses_request(user_id: &str) -> GraphQLRequest {
    GraphQLRequest::new(&list_expenses_query(), "ListExpenses").variable("userId", user_id)
}

/// レスポンスの`data`から経費レコードの配列を取り出す
///
/// `listExpenses`が配列そのもの、または`items`を持つ接続型のどちらにも対応する。
/// 見つからない場合は`None`。
pub fn extract_list_records(data: Option<&Value>) -> Option<&Value> {
    let list = data?.get(LIST_EXPENSES_KEY)?;
    match list {
        Value::Array(_) => Some(list),
        Value::Object(_) => list.get("items"),
        _ => None,
    }
}
