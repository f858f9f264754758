//! Vendor-library boundary for the DirectOutput forwarding shim.
//!
//! This crate owns everything that touches the real vendor library:
//! - [`DirectOutputApi`]: the trait describing the vendor's native surface,
//!   one method per `DirectOutput_*` entry point
//! - [`VendorLibrary`]: resolves every vendor symbol once at load time and
//!   forwards each call through the stored function pointer
//! - [`VendorConfig`]: locates the vendor shared library (explicit path,
//!   environment override, or platform default name)
//! - [`mock::MockVendor`]: a scriptable stand-in that records every call and
//!   can fire stored callbacks on demand, for testing the layers above
//!
//! The vendor library is an opaque collaborator: nothing here interprets
//! device protocol, retries, or remaps status codes.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod api;
pub mod error;
pub mod library;
pub mod mock;
pub mod prelude;

pub use api::DirectOutputApi;
pub use error::VendorError;
pub use library::{DEFAULT_LIBRARY_NAME, LIBRARY_PATH_ENV, VendorConfig, VendorLibrary};
