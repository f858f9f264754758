//! Transparent forwarding shim over the Saitek DirectOutput library.
//!
//! DirectOutput's registration calls accept exactly one callback pointer
//! and one opaque context. This crate interposes between a caller and the
//! vendor implementation: each registration pairs the caller's callback
//! with the caller's context in a registry-owned record, hands the vendor
//! a fixed trampoline plus a pointer to that record, and the trampoline
//! invokes the caller's callback with the caller's context restored in the
//! final argument slot. Device handles and contexts pass through as opaque
//! values, never dereferenced.
//!
//! All non-registration operations forward argument for argument with the
//! vendor's status returned verbatim.
//!
//! [`exports`] exposes the surface as `DirectOutput_*` C symbols for use
//! as a drop-in replacement library; [`Proxy`] is the same surface over
//! any [`openfip_vendor::DirectOutputApi`] implementation.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod exports;
pub mod pairing;
pub mod prelude;
pub mod proxy;
mod trampoline;

pub use error::ProxyError;
pub use pairing::{CallbackRegistry, PairingRecord, RegistrationId};
pub use proxy::{Proxy, Registration};
