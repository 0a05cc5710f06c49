//! GraphQL APIクライアント
//!
//! GraphQLエンドポイント（AppSync互換）との通信を行うクライアント。
//! ベンダー固有のエラーはここで[`ErrorClass`]に変換する。

use crate::shared::config::environment::GraphQLConfig;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::graphql::{
    classify_error, ErrorClass, GraphQLRequest, QueryResponse, RemoteQueryClient, TransportError,
};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// HTTPステータスからエラー分類を判定する
pub fn classify_status(status: StatusCode) -> ErrorClass {
    if status == StatusCode::TOO_MANY_REQUESTS {
        ErrorClass::Throttled
    } else if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        ErrorClass::Transient
    } else {
        ErrorClass::Terminal
    }
}

/// reqwestのエラーを通信エラーに変換する
fn transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() || error.is_connect() {
        TransportError::transient(format!("GraphQLエンドポイントへの接続に失敗しました: {error}"))
    } else {
        TransportError::terminal(format!("GraphQLリクエストの送信に失敗しました: {error}"))
    }
}

/// GraphQL APIクライアント
pub struct GraphQLClient {
    client: Client,
    config: GraphQLConfig,
    auth_token: Option<String>,
}

impl GraphQLClient {
    /// 環境設定から新しいクライアントを作成
    pub fn new() -> AppResult<Self> {
        let config = GraphQLConfig::from_env()?;
        Self::new_with_config(config)
    }

    /// 設定を指定してクライアントを作成
    pub fn new_with_config(config: GraphQLConfig) -> AppResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTPクライアント初期化失敗: {e}")))?;

        Ok(Self {
            client,
            config,
            auth_token: None,
        })
    }

    /// 認証トークン（Cognito等のJWT）を設定
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// エンドポイントURLを取得
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// エラーレスポンスを処理し、分類付きの通信エラーに変換
    async fn handle_error_response(&self, response: reqwest::Response) -> TransportError {
        let status = response.status();

        let request_id = response
            .headers()
            .get("x-amzn-requestid")
            .or_else(|| response.headers().get("x-request-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "レスポンス読み取り失敗".to_string());

        // GraphQL形式のエラーが含まれていればその分類を優先
        let body_class = serde_json::from_str::<QueryResponse>(&body)
            .ok()
            .map(QueryResponse::classified)
            .and_then(|parsed| {
                parsed
                    .errors
                    .iter()
                    .map(|e| e.class)
                    .find(|class| class.is_throttled())
            })
            .unwrap_or_else(|| classify_error(None, &body));

        let class = if body_class.is_throttled() {
            body_class
        } else {
            classify_status(status)
        };

        warn!(
            "GraphQLエンドポイントからエラーレスポンス: status={}, class={class:?}, request_id={request_id}, body={body}",
            status.as_u16()
        );

        TransportError {
            class,
            message: format!("HTTP {}: {body}", status.as_u16()),
            status: Some(status.as_u16()),
        }
    }
}

#[async_trait]
impl RemoteQueryClient for GraphQLClient {
    async fn query(&self, request: &GraphQLRequest) -> Result<QueryResponse, TransportError> {
        let operation = request.operation_name.as_deref().unwrap_or("anonymous");
        let request_id = uuid::Uuid::new_v4().to_string();
        info!("GraphQLリクエスト送信: operation={operation}, request_id={request_id}");

        let mut builder = self
            .client
            .post(&self.config.endpoint)
            .header("x-request-id", &request_id)
            .json(request);

        if let Some(api_key) = &self.config.api_key {
            builder = builder.header("x-api-key", api_key);
        }
        if let Some(token) = &self.auth_token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }

        let response = builder.send().await.map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(self.handle_error_response(response).await);
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| TransportError::terminal(format!("レスポンス解析エラー: {e}")))?;
        let parsed = parsed.classified();

        debug!(
            "GraphQLレスポンス受信: operation={operation}, has_data={}, errors={}",
            parsed.data.is_some(),
            parsed.errors.len()
        );
        Ok(parsed)
    }
}
