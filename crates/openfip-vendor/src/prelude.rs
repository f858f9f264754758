//! Convenience re-exports for common types.

pub use crate::api::DirectOutputApi;
pub use crate::error::VendorError;
pub use crate::library::{DEFAULT_LIBRARY_NAME, LIBRARY_PATH_ENV, VendorConfig, VendorLibrary};
pub use crate::mock::{MockVendor, VendorCall};
