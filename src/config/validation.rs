//! Settings validation functions
//!
//! This module provides validation for the provisioning settings fields:
//! subnet and route CIDRs, interface parameters and output file names.

use crate::error::{ProvisionError, Result};
use ipnet::IpNet;

/// Validate CIDR notation (IP/prefix)
pub fn validate_cidr(cidr: &str) -> Result<IpNet> {
    cidr.trim().parse::<IpNet>().map_err(|e| {
        ProvisionError::Config(format!(
            "Invalid CIDR notation: {} ({}; expected format: IP/prefix)",
            cidr, e
        ))
    })
}

/// Validate MTU value (0 to omit it, otherwise 1280-1500 for WireGuard)
pub fn validate_mtu(mtu: u16) -> Result<()> {
    if mtu != 0 && !(1280..=1500).contains(&mtu) {
        return Err(ProvisionError::Config(format!(
            "MTU value {} is out of valid range (1280-1500, or 0 to omit)",
            mtu
        )));
    }
    Ok(())
}

/// Validate keepalive interval
pub fn validate_keepalive(secs: u16) -> Result<()> {
    // Reasonable range: 0 (disabled) or 10-300 seconds
    if secs > 0 && secs < 10 {
        return Err(ProvisionError::Config(format!(
            "Keepalive interval {} is too short (minimum 10 seconds or 0 to disable)",
            secs
        )));
    }

    if secs > 300 {
        return Err(ProvisionError::Config(format!(
            "Keepalive interval {} is too long (maximum 300 seconds)",
            secs
        )));
    }

    Ok(())
}

/// Validate a configuration file name (no directories, not empty)
pub fn validate_file_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ProvisionError::Config(
            "File name cannot be empty".to_string(),
        ));
    }

    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(ProvisionError::Config(format!(
            "File name '{}' must not contain path separators",
            name
        )));
    }

    Ok(())
}

/// Validate the client file name pattern, which numbers files through `{}`
pub fn validate_client_file_pattern(pattern: &str) -> Result<()> {
    validate_file_name(pattern)?;

    if pattern.matches("{}").count() != 1 {
        return Err(ProvisionError::Config(format!(
            "Client file pattern '{}' must contain exactly one '{{}}' placeholder",
            pattern
        )));
    }

    Ok(())
}
