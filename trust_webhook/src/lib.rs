//! Mutating admission webhook for trust-manager `Bundle` resources
//!
//! Before a `Bundle` is persisted the API server sends it here, and the
//! password hashes of its JKS and PKCS#12 outputs are filled in when unset.
//! The defaulting itself lives behind [`CustomDefaulter`]; [`WebhookServer`]
//! serves any number of [`MutatingAdmissionHandler`]s over warp.

pub mod admission;
pub mod apis;
pub mod config;
pub mod defaulter;
mod error;
pub mod password_hash;
pub mod server;

pub use admission::{DefaultingHandler, MutatingAdmissionHandler};
pub use defaulter::{BundleDefaulter, CustomDefaulter};
pub use error::{Error, HandlerError, Result};
pub use server::WebhookServer;
