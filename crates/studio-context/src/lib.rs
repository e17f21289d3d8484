//! Request-scoped caller identity.
//!
//! The transport boundary attaches a [`CallerContext`] to the request scope
//! via [`CallerContext::scope`]; service-layer code reads it back with the
//! free functions below without threading it through every call. Reads taken
//! outside an active scope return empty/zero values rather than panicking —
//! the core treats identity as opaque and never requires it to be present.

#![deny(unsafe_code)]
#![warn(missing_docs)]

tokio::task_local! {
    static CALLER: CallerContext;
}

/// Caller identity attached to a request: an opaque user id, a display
/// name, and an opaque auth token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerContext {
    /// Opaque caller-supplied user id. Empty when unknown.
    pub user_id: String,
    /// Caller-supplied display name. Empty when unknown.
    pub user_name: String,
    /// Opaque auth token, if one was presented.
    pub token: Option<String>,
}

impl CallerContext {
    /// Build a new context from a user id and name, with no token.
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            token: None,
        }
    }

    /// Attach an auth token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Run `f` with `self` bound as the current request's caller context.
    pub async fn scope<F, T>(self, f: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        CALLER.scope(self, f).await
    }
}

/// The current request's caller id, or an empty string outside an active
/// scope.
pub fn user_id() -> String {
    CALLER
        .try_with(|c| c.user_id.clone())
        .unwrap_or_default()
}

/// The current request's caller display name, or an empty string outside an
/// active scope.
pub fn user_name() -> String {
    CALLER
        .try_with(|c| c.user_name.clone())
        .unwrap_or_default()
}

/// The current request's auth token, or `None` outside an active scope or
/// when no token was presented.
pub fn auth_token() -> Option<String> {
    CALLER.try_with(|c| c.token.clone()).unwrap_or(None)
}
