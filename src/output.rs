//! Writing rendered configurations to disk
//!
//! Configuration files contain private keys, so they are created with
//! owner-only permissions (0600) on unix.

use crate::config::ProvisionSettings;
use crate::error::{ProvisionError, Result};
use crate::provision::AppConfig;
use std::fs;
use std::io::Write;
use std::net::{Ipv4Addr, UdpSocket};
use std::path::{Path, PathBuf};
use tracing::info;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

/// Write `text` to `dir/file_name`, replacing any existing file
pub fn write_config<P: AsRef<Path>>(dir: P, file_name: &str, text: &str) -> Result<PathBuf> {
    let path = dir.as_ref().join(file_name);

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(&path).map_err(|e| {
        ProvisionError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to create config file {:?}: {}", path, e),
        ))
    })?;

    file.write_all(text.as_bytes()).map_err(|e| {
        ProvisionError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write config file {:?}: {}", path, e),
        ))
    })?;

    Ok(path)
}

/// Write the most recently added client's configuration and the server's.
///
/// The client file is numbered with the client's 1-based position. Returns
/// the client path followed by the server path.
pub fn write_provisioned<P: AsRef<Path>>(
    dir: P,
    settings: &ProvisionSettings,
    app: &AppConfig,
) -> Result<(PathBuf, PathBuf)> {
    let dir = dir.as_ref();
    let number = app.client_count();
    let client_text = app.client_config_text(number.saturating_sub(1))?;

    let client_path = write_config(dir, &settings.client_file_name(number), &client_text)?;
    info!("Saved client configuration: {}", client_path.display());

    let server_path = write_config(dir, &settings.server_config_file, &app.server_config_text())?;
    info!("Saved server configuration: {}", server_path.display());

    Ok((client_path, server_path))
}

/// Write the server configuration and every client configuration
pub fn write_all<P: AsRef<Path>>(
    dir: P,
    settings: &ProvisionSettings,
    app: &AppConfig,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut paths = Vec::with_capacity(app.client_count() + 1);

    paths.push(write_config(
        dir,
        &settings.server_config_file,
        &app.server_config_text(),
    )?);

    for index in 0..app.client_count() {
        let text = app.client_config_text(index)?;
        paths.push(write_config(dir, &settings.client_file_name(index + 1), &text)?);
    }

    info!("Saved {} configuration file(s) to {}", paths.len(), dir.display());
    Ok(paths)
}

/// Ask the OS for a UDP port that is currently free
pub fn find_unused_udp_port() -> Result<u16> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    Ok(socket.local_addr()?.port())
}
