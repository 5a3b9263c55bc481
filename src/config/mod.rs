//! Provisioning settings
//!
//! This module handles the TOML settings file that supplies the subnet,
//! endpoint and client defaults, and turns it into [`BuildParams`]. Every
//! field has a default, so an empty file is a valid configuration.

mod validation;

pub use validation::{
    validate_cidr, validate_client_file_pattern, validate_file_name, validate_keepalive,
    validate_mtu,
};

use crate::error::{ProvisionError, Result};
use crate::provision::{
    resolve_endpoint, BuildParams, Endpoint, DEFAULT_ALLOWED_IPS, DEFAULT_DNS, DEFAULT_MTU,
    DEFAULT_PERSISTENT_KEEPALIVE, DEFAULT_SUBNET,
};
use crate::wireguard::parse_subnet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Settings for provisioning a server and its clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionSettings {
    /// WireGuard subnet (CIDR notation, e.g., "10.9.0.0/24")
    #[serde(default = "default_subnet")]
    pub subnet: String,

    /// Server endpoint written into client configs (host:port)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Server listen port; an unused UDP port is chosen when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,

    /// Comma-separated DNS servers for clients
    #[serde(default = "default_dns")]
    pub dns: String,

    /// Client MTU (0 to omit)
    #[serde(default = "default_mtu")]
    pub mtu: u16,

    /// Client persistent keepalive in seconds (0 to omit)
    #[serde(default = "default_keepalive")]
    pub persistent_keepalive: u16,

    /// Routes clients send through the server (CIDR notation)
    #[serde(default = "default_allowed_ips")]
    pub allowed_ips: Vec<String>,

    /// File name of the server configuration
    #[serde(default = "default_server_config_file")]
    pub server_config_file: String,

    /// File name pattern of client configurations; `{}` is the client number
    #[serde(default = "default_client_config_file")]
    pub client_config_file: String,
}

impl ProvisionSettings {
    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            ProvisionError::Config(format!("Failed to read settings file {:?}: {}", path, e))
        })?;

        debug!("Loaded settings from {:?}", path);
        Self::parse(&contents)
    }

    /// Parse settings from a TOML string
    pub fn parse(toml: &str) -> Result<Self> {
        toml::from_str(toml)
            .map_err(|e| ProvisionError::Config(format!("Failed to parse TOML settings: {}", e)))
    }

    /// Serialize the settings back to TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate every field.
    ///
    /// The endpoint is not checked here: an unparseable endpoint falls back
    /// to the default when build parameters are resolved.
    pub fn validate(&self) -> Result<()> {
        parse_subnet(&self.subnet)?;
        validate_mtu(self.mtu)?;
        validate_keepalive(self.persistent_keepalive)?;

        if self.allowed_ips.is_empty() {
            return Err(ProvisionError::Config(
                "At least one allowed IP is required".to_string(),
            ));
        }
        for allowed_ip in &self.allowed_ips {
            validate_cidr(allowed_ip)?;
        }

        validate_file_name(&self.server_config_file)?;
        validate_client_file_pattern(&self.client_config_file)?;

        Ok(())
    }

    /// File name for the client with the given 1-based number
    pub fn client_file_name(&self, number: usize) -> String {
        self.client_config_file.replacen("{}", &number.to_string(), 1)
    }

    /// Resolve build parameters.
    ///
    /// An explicit `listen_port` wins; otherwise the port of a valid endpoint
    /// is used, and failing that `discovered_port`. Without a valid endpoint
    /// clients are pointed at the loopback address on the listen port.
    pub fn build_params(&self, discovered_port: u16) -> Result<BuildParams> {
        let fallback_port = self.listen_port.unwrap_or(discovered_port);
        let endpoint = resolve_endpoint(self.endpoint.as_deref(), Endpoint::localhost(fallback_port));
        let listen_port = self.listen_port.unwrap_or(endpoint.port);

        let allowed_ips = self
            .allowed_ips
            .iter()
            .map(|ip| validate_cidr(ip))
            .collect::<Result<Vec<_>>>()?;

        let mut params = BuildParams::new(self.subnet.clone(), endpoint, listen_port);
        params.dns = self.dns.clone();
        params.mtu = self.mtu;
        params.persistent_keepalive = self.persistent_keepalive;
        params.allowed_ips = allowed_ips;
        Ok(params)
    }
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            subnet: default_subnet(),
            endpoint: None,
            listen_port: None,
            dns: default_dns(),
            mtu: default_mtu(),
            persistent_keepalive: default_keepalive(),
            allowed_ips: default_allowed_ips(),
            server_config_file: default_server_config_file(),
            client_config_file: default_client_config_file(),
        }
    }
}

// Default value functions for serde
fn default_subnet() -> String {
    DEFAULT_SUBNET.to_string()
}

fn default_dns() -> String {
    DEFAULT_DNS.to_string()
}

fn default_mtu() -> u16 {
    DEFAULT_MTU
}

fn default_keepalive() -> u16 {
    DEFAULT_PERSISTENT_KEEPALIVE
}

fn default_allowed_ips() -> Vec<String> {
    vec![DEFAULT_ALLOWED_IPS.to_string()]
}

fn default_server_config_file() -> String {
    "wiresock.conf".to_string()
}

fn default_client_config_file() -> String {
    "wsclient_{}.conf".to_string()
}
