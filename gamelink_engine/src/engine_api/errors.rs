use std::fmt::Display;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentApiError {
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Order not found")]
    OrderNotFound,
    #[error("Player not found")]
    PlayerNotFound,
    #[error("Dispute not found")]
    DisputeNotFound,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl AssignmentApiError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::OrderNotFound | Self::PlayerNotFound | Self::DisputeNotFound)
    }
}

/// Any backend failure becomes an opaque [`AssignmentApiError::DatabaseError`].
pub(crate) fn db_error<E: Display>(e: E) -> AssignmentApiError {
    AssignmentApiError::DatabaseError(e.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_classes() {
        assert!(AssignmentApiError::validation("nope").is_validation());
        assert!(AssignmentApiError::DisputeNotFound.is_not_found());
        assert!(!AssignmentApiError::DatabaseError("boom".into()).is_not_found());
        assert_eq!(AssignmentApiError::validation("nope").to_string(), "Invalid request: nope");
    }
}
