//! Convenience re-exports for common types.

pub use crate::error::ProxyError;
pub use crate::pairing::{CallbackRegistry, PairingRecord, RegistrationId};
pub use crate::proxy::{Proxy, Registration};
