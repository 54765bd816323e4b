use certpick_commons::StoreLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Certificate store {location}\\{store} is unavailable: {reason}")]
    RepositoryUnavailable {
        store: String,
        location: StoreLocation,
        reason: String,
    },

    #[error("Certificate store query failed: {0}")]
    PlatformQueryFailure(String),

    #[error("Invalid selection query: {0}")]
    InvalidQuery(String),

    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),
}

impl StoreError {
    pub fn unavailable(store: &str, location: StoreLocation, reason: impl ToString) -> Self {
        StoreError::RepositoryUnavailable {
            store: store.to_string(),
            location,
            reason: reason.to_string(),
        }
    }

    pub fn query_failure(reason: impl ToString) -> Self {
        StoreError::PlatformQueryFailure(reason.to_string())
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::RepositoryUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_message() {
        let err = StoreError::unavailable("My", StoreLocation::LocalMachine, "access denied");

        assert!(err.is_unavailable());
        assert_eq!(
            err.to_string(),
            "Certificate store LocalMachine\\My is unavailable: access denied"
        );
    }

    #[test]
    fn test_query_failure_message() {
        let err = StoreError::query_failure("enumeration aborted");

        assert!(!err.is_unavailable());
        assert_eq!(
            err.to_string(),
            "Certificate store query failed: enumeration aborted"
        );
    }
}
