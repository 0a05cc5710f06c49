//! テスト用のGraphQLクライアントとレスポンス生成

use crate::shared::graphql::{
    GraphQLError, GraphQLRequest, QueryResponse, RemoteQueryClient, TransportError,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

type Scripted = Result<QueryResponse, TransportError>;

/// 用意した応答を順に返すクライアント
///
/// 応答を使い切った後は最後の応答を返し続ける。
pub struct ScriptedClient {
    script: Mutex<VecDeque<Scripted>>,
    last: Mutex<Option<Scripted>>,
    requests: Mutex<Vec<GraphQLRequest>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 常に同じ応答を返す
    pub fn repeating(response: Scripted) -> Self {
        Self::new(vec![response])
    }

    /// 呼び出し回数
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// 受け取ったリクエスト
    pub fn requests(&self) -> Vec<GraphQLRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// 一覧取得で要求されたユーザーID
    pub fn requested_user_ids(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.variables.get("userId").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl RemoteQueryClient for ScriptedClient {
    async fn query(&self, request: &GraphQLRequest) -> Result<QueryResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(next) = next {
            *last = Some(next);
        }
        last.clone()
            .unwrap_or_else(|| Err(TransportError::terminal("応答が用意されていません")))
    }
}

/// 正常な経費レコード
pub fn expense_record(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "amount": 500,
        "category": "food",
        "date": "2024-01-01",
        "userId": "user-1",
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z"
    })
}

/// 経費一覧のレスポンス
pub fn list_response(records: Vec<Value>) -> QueryResponse {
    QueryResponse {
        data: Some(json!({ "listExpenses": { "items": records } })),
        errors: Vec::new(),
    }
}

/// レート制限されたレスポンス
pub fn rate_limited_response() -> QueryResponse {
    QueryResponse {
        data: Some(json!({ "listExpenses": null })),
        errors: vec![GraphQLError::new("Rate Exceeded").with_error_type("Throttling")],
    }
}
