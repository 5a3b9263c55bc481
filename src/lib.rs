//! wg-provision: WireGuard server and client configuration generator
//!
//! This library generates key pairs, allocates tunnel addresses from a subnet
//! and renders the configuration files for one WireGuard server and any
//! number of clients.
//!
//! # Architecture
//!
//! Addresses and keys feed a builder that assembles a server configuration
//! and its first client; further clients are appended to the same aggregate.
//! Rendering turns any configuration into the wg-quick text format. Random
//! sources are always injected so builds can be reproduced in tests.
//!
//! # Modules
//!
//! - `wireguard`: Keys, address allocation, interface/peer model and rendering
//! - `provision`: Initial build and client addition
//! - `config`: TOML provisioning settings
//! - `output`: Writing rendered configurations to disk
//! - `error`: Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod output;
pub mod provision;
pub mod wireguard;

// Re-export commonly used types
pub use error::{ProvisionError, Result};
pub use provision::{AppConfig, BuildParams};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
