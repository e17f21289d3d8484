use serde::{Deserialize, Serialize};

/// Opaque caller identity attached to an entity as its creator or editor.
///
/// The core treats identity as two plain strings handed in by the caller; it
/// never interprets or authenticates them (see `studio-context` for the
/// request-scoped propagation of this value, and spec.md §9 for why this is
/// standardised on an opaque string `user_id` rather than an integer one).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque caller-supplied user id.
    pub user_id: String,
    /// Caller-supplied display name.
    pub user_name: String,
}

impl Identity {
    /// Build an identity from a user id and display name.
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_both_fields() {
        let id = Identity::new("u-1", "Ada");
        assert_eq!(id.user_id, "u-1");
        assert_eq!(id.user_name, "Ada");
    }

    #[test]
    fn default_is_empty() {
        let id = Identity::default();
        assert_eq!(id.user_id, "");
        assert_eq!(id.user_name, "");
    }

    #[test]
    fn serde_roundtrip() {
        let id = Identity::new("u-1", "Ada");
        let json = serde_json::to_string(&id).unwrap();
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
