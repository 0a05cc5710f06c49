/// 既定のユーザーIDを解決する
///
/// 呼び出し元がユーザーIDを渡さなかった場合に使われます。
pub trait IdentityProvider: Send + Sync {
    /// 現在のユーザーID（不明な場合は`None`）
    fn current_user_id(&self) -> Option<String>;
}

/// どの解決方法でもユーザーが決まらない場合のID
pub const ANONYMOUS_USER_ID: &str = "anonymous";

/// 固定のユーザーIDを返す
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    user_id: Option<String>,
}

impl StaticIdentity {
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user_id: user_id.filter(|id| !id.trim().is_empty()),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.clone()
    }
}

/// 実効ユーザーIDを決める
///
/// 呼び出し元の指定 > 既定ユーザー > `anonymous` の順。空白のみの指定は未指定扱い。
pub fn resolve_user_id(requested: Option<&str>, identity: &dyn IdentityProvider) -> String {
    requested
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| identity.current_user_id())
        .unwrap_or_else(|| ANONYMOUS_USER_ID.to_string())
}
