//! Structured logging for cardmart
//!
//! All crates log through `tracing`. Authorization audit events use the
//! [`AUDIT_TARGET`] target so they can be routed or filtered separately.

pub mod init;

pub use init::{build_env_filter, init_logging};

/// `tracing` target for authorization audit events
pub const AUDIT_TARGET: &str = "cardmart::audit";
