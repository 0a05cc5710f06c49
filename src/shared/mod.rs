/// 共有エラー型とエラーハンドリング
pub mod errors;

/// 共有設定管理
pub mod config;

/// GraphQL通信の共通型
pub mod graphql;

/// GraphQL APIクライアント
pub mod api_client;

// 便利な再エクスポート
pub use config::{
    get_environment, initialize_logging_system, load_environment_variables, Environment,
    EnvironmentConfig, FetchConfig, GraphQLConfig,
};
pub use errors::{AppError, AppResult, ErrorSeverity};
pub use graphql::{ErrorClass, GraphQLError, GraphQLRequest, QueryResponse, RemoteQueryClient, TransportError};
