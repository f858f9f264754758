//! Error types for the proxy layer.
//!
//! These errors cover the registry's own release API only. Statuses coming
//! back from the vendor library are `Hresult`s and are returned verbatim,
//! never wrapped.

use thiserror::Error;

use crate::pairing::RegistrationId;

/// Error type for registry operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyError {
    /// The registration id is not live (already released, or never issued).
    #[error("unknown registration id: {id}")]
    UnknownRegistration {
        /// The id that failed to resolve.
        id: RegistrationId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<ProxyError>();
    }
}
