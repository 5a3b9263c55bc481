//! Error types for wg-provision
//!
//! This module defines the error types used throughout the library.
//! We use `thiserror` for ergonomic error definitions and `anyhow` for
//! error propagation in the binary.

use std::net::IpAddr;

use ipnet::IpNet;
use thiserror::Error;

/// Main error type for provisioning operations
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Subnet text could not be parsed as CIDR
    #[error("Invalid subnet: {0}")]
    InvalidSubnet(String),

    /// The next address (or the one reserved after it) falls outside the subnet
    #[error("Can't allocate IP address {next}: capacity of subnet {subnet} has been reached")]
    SubnetExhausted {
        /// Subnet the allocation was made from
        subnet: IpNet,
        /// First address that did not fit
        next: IpAddr,
    },

    /// The random source could not supply key material
    #[error("Entropy source failure: {0}")]
    Entropy(String),

    /// Settings-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Aggregate is not in a state the operation can work with
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias using ProvisionError
pub type Result<T> = std::result::Result<T, ProvisionError>;

impl From<toml::de::Error> for ProvisionError {
    fn from(err: toml::de::Error) -> Self {
        ProvisionError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ProvisionError {
    fn from(err: toml::ser::Error) -> Self {
        ProvisionError::Serialization(err.to_string())
    }
}

impl From<rand::Error> for ProvisionError {
    fn from(err: rand::Error) -> Self {
        ProvisionError::Entropy(err.to_string())
    }
}
