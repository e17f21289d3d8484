//! Shared mapping from `sqlx::Error` to [`StudioError`].

use studio_error::StudioError;

/// `true` if `err` is a Postgres unique-constraint violation (SQLSTATE
/// `23505`), the signal every store in this crate uses to turn a duplicate
/// insert into [`studio_error::ErrorKind::Conflict`] instead of `Internal`.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err.as_database_error().and_then(|e| e.code()),
        Some(code) if code == "23505"
    )
}

/// Map any other store-level `sqlx::Error` to [`StudioError::internal`].
pub fn internal(context: &str, err: sqlx::Error) -> StudioError {
    StudioError::internal(format!("{context}: {err}")).with_cause(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_error_is_not_unique_violation() {
        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
