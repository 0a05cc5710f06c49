//! GraphQL通信の共通型
//!
//! リクエスト・レスポンスのワイヤー形式、エラー分類、
//! およびリモートクエリクライアントのトレイトを定義します。

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// レート制限を示すエラータイプ
pub const THROTTLING_ERROR_TYPES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "TooManyRequestsException",
    "RateLimitExceeded",
];

/// レート制限を示すエラーメッセージ
static RATE_LIMIT_MESSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)rate\s+exceeded|too\s+many\s+requests").expect("正規表現が不正です")
});

/// エラー分類
///
/// ベンダー固有のエラーはクライアント境界でこの分類に変換されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// レート制限（リトライ対象）
    Throttled,
    /// 一時的な障害（接続失敗・タイムアウト・5xx）
    Transient,
    /// 回復不能なエラー
    Terminal,
}

impl ErrorClass {
    /// レート制限かどうか
    pub fn is_throttled(self) -> bool {
        self == ErrorClass::Throttled
    }
}

/// エラータイプとメッセージからエラー分類を判定する
///
/// # 引数
/// * `error_type` - エラータイプ（例: `Throttling`）
/// * `message` - エラーメッセージ
pub fn classify_error(error_type: Option<&str>, message: &str) -> ErrorClass {
    let throttled_type = error_type
        .map(|t| THROTTLING_ERROR_TYPES.iter().any(|known| known.eq_ignore_ascii_case(t)))
        .unwrap_or(false);

    if throttled_type || RATE_LIMIT_MESSAGE.is_match(message) {
        ErrorClass::Throttled
    } else {
        ErrorClass::Terminal
    }
}

/// GraphQLリクエスト
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GraphQLRequest {
    /// クエリ文書
    pub query: String,
    /// 変数
    pub variables: Map<String, Value>,
    /// 操作名
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphQLRequest {
    /// 新しいリクエストを作成
    pub fn new(query: &str, operation_name: &str) -> Self {
        Self {
            query: query.to_string(),
            variables: Map::new(),
            operation_name: Some(operation_name.to_string()),
        }
    }

    /// 変数を追加
    pub fn variable(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.variables.insert(name.to_string(), value.into());
        self
    }
}

/// エラーパスの要素
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// 配列の添字
    Index(u64),
    /// フィールド名
    Key(String),
}

impl PathSegment {
    /// 添字として解釈できる場合はその値を返す
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => usize::try_from(*i).ok(),
            PathSegment::Key(key) => key.parse().ok(),
        }
    }

    /// フィールド名として解釈できる場合はその値を返す
    pub fn as_field(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) if key.parse::<usize>().is_err() => Some(key),
            _ => None,
        }
    }
}

/// GraphQLレスポンスのエラー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    /// エラーメッセージ
    #[serde(default)]
    pub message: String,
    /// ベンダー固有のエラータイプ
    #[serde(rename = "errorType", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// エラーが発生したフィールドのパス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    /// クライアント境界で付与されるエラー分類
    #[serde(skip, default = "terminal")]
    pub class: ErrorClass,
}

fn terminal() -> ErrorClass {
    ErrorClass::Terminal
}

impl GraphQLError {
    /// メッセージからエラーを作成（分類はメッセージから判定）
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            error_type: None,
            path: None,
            class: classify_error(None, message),
        }
    }

    /// エラータイプを設定して再分類
    pub fn with_error_type(mut self, error_type: &str) -> Self {
        self.error_type = Some(error_type.to_string());
        self.class = classify_error(self.error_type.as_deref(), &self.message);
        self
    }

    /// パスを設定
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = Some(path);
        self
    }

    /// エラータイプとメッセージから分類を付与し直す
    pub fn classified(mut self) -> Self {
        self.class = classify_error(self.error_type.as_deref(), &self.message);
        self
    }
}

/// GraphQLレスポンス
///
/// `data`と`errors`が同時に存在する場合があります。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Vec<GraphQLError>,
}

impl QueryResponse {
    /// 全エラーの分類を付与し直す
    pub fn classified(mut self) -> Self {
        self.errors = self.errors.into_iter().map(GraphQLError::classified).collect();
        self
    }

    /// レート制限エラーを含むかどうか
    pub fn is_rate_limited(&self) -> bool {
        self.errors.iter().any(|e| e.class.is_throttled())
    }
}

/// 通信レベルのエラー（レスポンスを得られなかった場合）
#[derive(Debug, Clone, Error)]
#[error("通信エラー({class:?}): {message}")]
pub struct TransportError {
    pub class: ErrorClass,
    pub message: String,
    pub status: Option<u16>,
}

impl TransportError {
    pub fn throttled<S: Into<String>>(message: S) -> Self {
        Self {
            class: ErrorClass::Throttled,
            message: message.into(),
            status: None,
        }
    }

    pub fn transient<S: Into<String>>(message: S) -> Self {
        Self {
            class: ErrorClass::Transient,
            message: message.into(),
            status: None,
        }
    }

    pub fn terminal<S: Into<String>>(message: S) -> Self {
        Self {
            class: ErrorClass::Terminal,
            message: message.into(),
            status: None,
        }
    }
}

/// リモートクエリクライアント
///
/// GraphQLの通信を抽象化します。実装はベンダー固有のエラーを
/// [`ErrorClass`]に変換して返す必要があります。
#[async_trait]
pub trait RemoteQueryClient: Send + Sync {
    /// クエリまたはミューテーションを実行
    async fn query(&self, request: &GraphQLRequest) -> Result<QueryResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_by_error_type() {
        assert_eq!(classify_error(Some("Throttling"), "x"), ErrorClass::Throttled);
        assert_eq!(
            classify_error(Some("throttlingexception"), "x"),
            ErrorClass::Throttled
        );
        assert_eq!(
            classify_error(Some("Unauthorized"), "Not Authorized"),
            ErrorClass::Terminal
        );
    }

    #[test]
    fn test_classify_by_message() {
        assert_eq!(
            classify_error(None, "Rate Exceeded for resolver"),
            ErrorClass::Throttled
        );
        assert_eq!(classify_error(None, "429 Too Many Requests"), ErrorClass::Throttled);
        assert_eq!(classify_error(None, "Validation error"), ErrorClass::Terminal);
    }

    #[test]
    fn test_response_deserialization_with_data_and_errors() {
        let body = json!({
            "data": { "listExpenses": { "items": [null] } },
            "errors": [{
                "message": "Cannot return null for non-nullable type",
                "errorType": "DynamoDB:ProvisionedThroughputExceededException",
                "path": ["listExpenses", "items", 0, "amount"]
            }, {
                "message": "Rate Exceeded",
                "errorType": "Throttling"
            }]
        });

        let response: QueryResponse = serde_json::from_value::<QueryResponse>(body)
            .unwrap()
            .classified();

        assert!(response.data.is_some());
        assert_eq!(response.errors.len(), 2);
        assert_eq!(response.errors[0].class, ErrorClass::Terminal);
        assert_eq!(
            response.errors[0].path.as_ref().unwrap()[2],
            PathSegment::Index(0)
        );
        assert!(response.is_rate_limited());
    }

    #[test]
    fn test_path_segment_interpretation() {
        assert_eq!(PathSegment::Index(3).as_index(), Some(3));
        assert_eq!(PathSegment::Key("2".to_string()).as_index(), Some(2));
        assert_eq!(PathSegment::Key("amount".to_string()).as_index(), None);
        assert_eq!(PathSegment::Key("amount".to_string()).as_field(), Some("amount"));
        assert_eq!(PathSegment::Key("2".to_string()).as_field(), None);
        assert_eq!(PathSegment::Index(1).as_field(), None);
    }

    #[test]
    fn test_request_serialization() {
        let request = GraphQLRequest::new("query ListExpenses { x }", "ListExpenses")
            .variable("userId", "user-1");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["variables"]["userId"], "user-1");
        assert_eq!(json["operationName"], "ListExpenses");
    }
}
