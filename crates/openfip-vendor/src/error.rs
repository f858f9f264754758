//! Error types for vendor-library binding.
//!
//! These errors cover locating and binding the vendor library only. Once a
//! call reaches the vendor, its `Hresult` is the sole status channel and is
//! returned verbatim by the layers above.

use thiserror::Error;

/// Error type for loading and binding the vendor library.
#[derive(Error, Debug)]
pub enum VendorError {
    /// The vendor shared library could not be loaded.
    #[error("vendor library error: {0}")]
    Library(#[from] libloading::Error),

    /// A required `DirectOutput_*` export is missing from the loaded library.
    #[error("vendor symbol missing: {name}")]
    MissingSymbol {
        /// The unresolved export name.
        name: &'static str,
        /// The underlying loader error.
        #[source]
        source: libloading::Error,
    },
}
