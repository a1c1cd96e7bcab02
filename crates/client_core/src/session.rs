use shared::domain::UserId;

pub const DEFAULT_AVATAR_PLACEHOLDER: &str = "/assets/avatar_placeholder.png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: UserId,
    pub user_name: String,
    pub avatar: Option<String>,
    pub access_token: Option<String>,
}

/// Source of the signed-in user. Injected into the controller and the HTTP
/// transport instead of being read from global state.
pub trait SessionProvider: Send + Sync {
    fn current_user(&self) -> Option<SessionUser>;
}

pub struct AnonymousSession;

impl SessionProvider for AnonymousSession {
    fn current_user(&self) -> Option<SessionUser> {
        None
    }
}

pub struct StaticSession {
    user: SessionUser,
}

impl StaticSession {
    pub fn new(user: SessionUser) -> Self {
        Self { user }
    }
}

impl SessionProvider for StaticSession {
    fn current_user(&self) -> Option<SessionUser> {
        Some(self.user.clone())
    }
}

pub fn resolve_avatar(user: Option<&SessionUser>, placeholder: &str) -> String {
    user.and_then(|user| user.avatar.as_deref())
        .filter(|avatar| !avatar.is_empty())
        .unwrap_or(placeholder)
        .to_string()
}
