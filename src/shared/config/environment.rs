use crate::shared::errors::{AppError, AppResult};
use std::time::Duration;

/// アプリケーションの実行環境を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    /// 開発環境
    Development,
    /// プロダクション環境
    Production,
}

/// 環境変数取得エラー
#[derive(Debug, Clone)]
pub struct EnvVarError {
    /// 変数名
    pub var_name: String,
    /// エラーメッセージ
    pub message: String,
}

impl std::fmt::Display for EnvVarError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "環境変数 {} が見つかりません: {}",
            self.var_name, self.message
        )
    }
}

impl std::error::Error for EnvVarError {}

impl From<EnvVarError> for AppError {
    fn from(error: EnvVarError) -> Self {
        AppError::Configuration(error.to_string())
    }
}

/// 環境変数を取得する（優先順位: 起動時 > コンパイル時 > エラー）
///
/// # 取得順序
/// 1. 起動時の環境変数（`std::env::var`）
/// 2. コンパイル時の環境変数（`option_env!`マクロ）
/// 3. どちらも見つからない場合はエラー
#[macro_export]
macro_rules! get_env_var {
    ($var_name:expr) => {{
        // 1. 起動時の環境変数を確認
        if let Ok(value) = std::env::var($var_name) {
            log::debug!("環境変数 {} を起動時の環境変数から取得しました", $var_name);
            Ok(value)
        }
        // 2. コンパイル時の環境変数を確認
        else if let Some(value) = option_env!($var_name) {
            log::debug!("環境変数 {} をコンパイル時の環境変数から取得しました", $var_name);
            Ok(value.to_string())
        }
        // 3. どちらも見つからない場合はエラー
        else {
            Err($crate::shared::config::environment::EnvVarError {
                var_name: $var_name.to_string(),
                message: format!(
                    "起動時の環境変数 {} もコンパイル時の環境変数も見つかりませんでした",
                    $var_name
                ),
            })
        }
    }};
}

/// 環境変数を取得する（オプション版）
#[macro_export]
macro_rules! get_env_var_optional {
    ($var_name:expr) => {{
        $crate::get_env_var!($var_name).ok()
    }};
}

/// 環境変数を取得する（デフォルト値付き）
#[macro_export]
macro_rules! get_env_var_or_default {
    ($var_name:expr, $default_value:expr) => {{
        $crate::get_env_var!($var_name).unwrap_or_else(|_| {
            log::debug!(
                "環境変数 {} が見つからないため、デフォルト値を使用します: {}",
                $var_name,
                $default_value
            );
            $default_value.to_string()
        })
    }};
}

/// 環境設定を管理する構造体
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// 実行環境
    pub environment: String,
    /// デバッグモードの有効/無効
    pub debug_mode: bool,
    /// ログレベル
    pub log_level: String,
}

impl EnvironmentConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Self {
        let environment = get_environment();
        let debug_mode = environment == Environment::Development;
        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| {
            if debug_mode {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

        Self {
            environment: format!("{environment:?}").to_lowercase(),
            debug_mode,
            log_level,
        }
    }
}

/// 現在の実行環境を判定する
///
/// # 判定ロジック
/// 1. 実行時環境変数 ENVIRONMENT を確認
/// 2. デバッグビルドの場合は Development
/// 3. リリースビルドの場合は Production
pub fn get_environment() -> Environment {
    if let Ok(env_var) = std::env::var("ENVIRONMENT") {
        let env = match env_var.as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        };
        log::debug!("環境判定: 実行時環境変数を使用 -> {env_var} -> {env:?}");
        return env;
    }

    // フォールバック: ビルド設定に基づく判定
    let env = if cfg!(debug_assertions) {
        Environment::Development
    } else {
        Environment::Production
    };
    log::debug!(
        "環境判定: ビルド設定を使用 -> debug_assertions={} -> {env:?}",
        cfg!(debug_assertions)
    );
    env
}

/// 環境変数を読み込む
///
/// 開発環境（デバッグビルド）の場合のみ.envファイルを読み込む。
/// 本番ビルドでは環境変数は実行時に設定されることを前提とする。
pub fn load_environment_variables() {
    if !cfg!(debug_assertions) {
        eprintln!("本番環境: 環境変数は実行時に設定されます");
        return;
    }

    match dotenv::dotenv() {
        Ok(path) => {
            eprintln!("環境ファイルを読み込みました: {}", path.display());
        }
        Err(e) => {
            eprintln!("環境ファイルの読み込みに失敗: {e}");
            eprintln!("環境変数が設定されていることを確認してください");
        }
    }
}

/// ログレベル文字列を`log::LevelFilter`に変換する
pub fn parse_log_level(level: &str) -> log::LevelFilter {
    match level.to_lowercase().as_str() {
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        "off" => log::LevelFilter::Off,
        _ => log::LevelFilter::Info,
    }
}

/// ログシステムを初期化する
///
/// # 処理内容
/// 1. 環境設定を取得
/// 2. ログレベルを設定
/// 3. env_loggerを初期化（初期化済みの場合は何もしない）
pub fn initialize_logging_system() {
    let env_config = EnvironmentConfig::from_env();
    let log_level = parse_log_level(&env_config.log_level);

    let result = env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .try_init();

    if result.is_err() {
        log::debug!("ログシステムは既に初期化されています");
        return;
    }

    log::info!(
        "ログシステムを初期化しました: level={}, environment={}",
        env_config.log_level,
        env_config.environment
    );
}

/// GraphQL API設定を管理する構造体
#[derive(Debug, Clone)]
pub struct GraphQLConfig {
    /// GraphQLエンドポイントURL
    pub endpoint: String,
    /// APIキー（AppSyncのAPI_KEY認証用）
    pub api_key: Option<String>,
    /// リクエストのタイムアウト（秒）
    pub timeout_seconds: u64,
}

impl GraphQLConfig {
    /// 環境変数からGraphQL設定を読み込む
    ///
    /// # エラー
    /// GRAPHQL_ENDPOINTが見つからない場合は設定エラー
    pub fn from_env() -> AppResult<Self> {
        let endpoint = crate::get_env_var!("GRAPHQL_ENDPOINT")?;
        let api_key = crate::get_env_var_optional!("GRAPHQL_API_KEY");

        let timeout_seconds = crate::get_env_var_or_default!("API_TIMEOUT_SECONDS", "30")
            .parse()
            .unwrap_or_else(|_| {
                log::warn!(
                    "API_TIMEOUT_SECONDSのパースに失敗しました。デフォルト値30秒を使用します"
                );
                30
            });

        let config = Self {
            endpoint,
            api_key,
            timeout_seconds,
        };
        config.validate()?;

        if config.api_key.is_none() && !config.is_localhost() {
            log::warn!(
                "GRAPHQL_API_KEYが設定されていません。リモートエンドポイントでは認証に失敗する可能性があります: endpoint={}",
                config.endpoint
            );
        }

        log::info!(
            "GraphQL設定: endpoint={}, api_key={}, timeout={}s",
            config.endpoint,
            if config.api_key.is_some() { "あり" } else { "なし" },
            config.timeout_seconds
        );
        Ok(config)
    }

    /// 設定を検証する
    pub fn validate(&self) -> AppResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(AppError::configuration(
                "GraphQLエンドポイントが設定されていません",
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(AppError::configuration(
                "APIタイムアウトは0より大きい値である必要があります",
            ));
        }

        Ok(())
    }

    /// エンドポイントがlocalhostかどうかを判定
    pub fn is_localhost(&self) -> bool {
        self.endpoint.contains("localhost") || self.endpoint.contains("127.0.0.1")
    }
}

/// 一覧取得の最大リトライ回数の上限
pub const MAX_LIST_RETRIES: u32 = 10;

/// 経費一覧取得の設定
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// 最大リトライ回数（試行回数は max_retries + 1）
    pub max_retries: u32,
    /// キャッシュの有効期間
    pub cache_ttl: Duration,
    /// 呼び出し元がユーザーIDを指定しなかった場合の既定ユーザーID
    pub default_user_id: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            cache_ttl: Duration::from_secs(60),
            default_user_id: None,
        }
    }
}

/// リトライ回数を上限内に収める
fn clamp_max_retries(max_retries: u32) -> u32 {
    if max_retries > MAX_LIST_RETRIES {
        log::warn!(
            "LIST_MAX_RETRIESが上限を超えています。{MAX_LIST_RETRIES}回に制限します: value={max_retries}"
        );
        return MAX_LIST_RETRIES;
    }
    max_retries
}

impl FetchConfig {
    /// 環境変数から取得設定を読み込む
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_retries = crate::get_env_var_or_default!("LIST_MAX_RETRIES", "5")
            .parse()
            .unwrap_or_else(|_| {
                log::warn!("LIST_MAX_RETRIESのパースに失敗しました。デフォルト値5回を使用します");
                defaults.max_retries
            });
        let max_retries = clamp_max_retries(max_retries);

        let cache_ttl = crate::get_env_var_or_default!("LIST_CACHE_TTL_SECONDS", "60")
            .parse()
            .map(Duration::from_secs)
            .unwrap_or_else(|_| {
                log::warn!(
                    "LIST_CACHE_TTL_SECONDSのパースに失敗しました。デフォルト値60秒を使用します"
                );
                defaults.cache_ttl
            });

        let default_user_id = crate::get_env_var_optional!("DEFAULT_USER_ID")
            .filter(|id| !id.trim().is_empty());

        log::info!(
            "取得設定: max_retries={max_retries}, cache_ttl={cache_ttl:?}, default_user_id={default_user_id:?}"
        );

        Self {
            max_retries,
            cache_ttl,
            default_user_id,
        }
    }
}
