use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No matching row, or a matching row the caller is not entitled to see.
    /// The two cases share this variant and its message.
    #[error("not found")]
    NotFound,

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }

    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::ConstraintViolation(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            rusqlite::Error::SqliteFailure(ref failure, ref message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::ConstraintViolation(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                )
            }
            other => Error::Storage(other),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err = Error::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_constraint_failure_maps_to_constraint_violation() {
        // SQLITE_CONSTRAINT_FOREIGNKEY
        let failure = rusqlite::ffi::Error::new(787);
        let err = Error::from(rusqlite::Error::SqliteFailure(
            failure,
            Some("FOREIGN KEY constraint failed".to_string()),
        ));
        assert!(err.is_constraint_violation());
        assert_eq!(
            err.to_string(),
            "constraint violation: FOREIGN KEY constraint failed"
        );
    }

    #[test]
    fn test_other_failures_map_to_storage() {
        let err = Error::from(rusqlite::Error::InvalidQuery);
        assert!(matches!(err, Error::Storage(_)));
    }
}
