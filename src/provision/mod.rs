//! Provisioning of a server and its clients
//!
//! `AppConfig` holds the server configuration and one client configuration
//! per server peer, in the same order. It only grows: clients are appended
//! with [`AppConfig::add_client`] and never removed.

mod builder;
pub mod input;

pub use builder::{
    build_initial, default_allowed_ips, BuildParams, DEFAULT_ALLOWED_IPS, DEFAULT_DNS,
    DEFAULT_MTU, DEFAULT_PERSISTENT_KEEPALIVE, DEFAULT_SUBNET,
};
pub use input::{parse_dns_list, resolve_endpoint, Endpoint};

use crate::error::{ProvisionError, Result};
use crate::wireguard::{
    to_host_address, AddressAllocator, ClientConfig, KeyPair, ServerConfig, WireguardConfig,
};
use rand::{CryptoRng, RngCore};
use std::collections::HashSet;
use tracing::info;

/// A server together with the configurations of all of its clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    server: ServerConfig,
    clients: Vec<ClientConfig>,
}

impl AppConfig {
    /// Build the server and its first client
    pub fn provision<R>(params: &BuildParams, rng: &mut R) -> Result<Self>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let (server, client) = build_initial(params, rng)?;
        info!(
            subnet = %params.subnet,
            endpoint = %params.endpoint,
            listen_port = params.listen_port,
            "Provisioned server and first client"
        );
        Ok(Self {
            server,
            clients: vec![client],
        })
    }

    /// Append a client, allocating the address after the last client's.
    ///
    /// The new client copies the last client's DNS, MTU and server peer and
    /// gets a fresh key pair. Nothing is modified unless the whole addition
    /// succeeds.
    pub fn add_client<R>(&mut self, rng: &mut R) -> Result<&ClientConfig>
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        let template = self.clients.last().ok_or_else(|| {
            ProvisionError::InvalidState("No client to continue allocation from".to_string())
        })?;
        let previous = template.interface.primary_address().ok_or_else(|| {
            ProvisionError::InvalidState("Last client has no interface address".to_string())
        })?;

        let address = AddressAllocator::for_interface(previous).next_after(previous.addr())?;
        let keys = KeyPair::generate_from(rng)?;

        let mut client = template.clone();
        client.interface.addresses = vec![address];
        client.interface.private_key = keys.private;

        self.server.add_peer(keys.public, vec![to_host_address(&address)]);
        self.clients.push(client);

        info!(client = self.clients.len(), %address, "Added client");
        Ok(&self.clients[self.clients.len() - 1])
    }

    /// The server configuration
    pub fn server(&self) -> &ServerConfig {
        &self.server
    }

    /// All client configurations, in provisioning order
    pub fn clients(&self) -> &[ClientConfig] {
        &self.clients
    }

    /// Number of provisioned clients
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Client configuration by 0-based index
    pub fn client(&self, index: usize) -> Result<&ClientConfig> {
        self.clients.get(index).ok_or_else(|| {
            ProvisionError::NotFound(format!(
                "Client {} (only {} provisioned)",
                index,
                self.clients.len()
            ))
        })
    }

    /// Most recently added client
    pub fn last_client(&self) -> Option<&ClientConfig> {
        self.clients.last()
    }

    /// Rendered server configuration
    pub fn server_config_text(&self) -> String {
        self.server.render()
    }

    /// Rendered configuration of the client at a 0-based index
    pub fn client_config_text(&self, index: usize) -> Result<String> {
        self.client(index).map(|client| client.render())
    }

    /// Check the pairing between server peers and clients.
    ///
    /// Peer `i` of the server must carry client `i`'s public key and its
    /// host-masked address, every client must point at the server's public
    /// key, and no address may be used twice.
    pub fn verify(&self) -> Result<()> {
        let peers = self.server.peers();
        if peers.len() != self.clients.len() {
            return Err(ProvisionError::InvalidState(format!(
                "Server has {} peers but there are {} clients",
                peers.len(),
                self.clients.len()
            )));
        }

        let server_public = self.server.interface.public_key();
        let mut seen = HashSet::new();

        for (index, (peer, client)) in peers.iter().zip(&self.clients).enumerate() {
            if client.server.public_key != server_public {
                return Err(ProvisionError::InvalidState(format!(
                    "Client {} does not point at the server's public key",
                    index
                )));
            }

            if peer.public_key != client.interface.public_key() {
                return Err(ProvisionError::InvalidState(format!(
                    "Server peer {} does not match client {}'s public key",
                    index, index
                )));
            }

            let address = client.interface.primary_address().ok_or_else(|| {
                ProvisionError::InvalidState(format!("Client {} has no address", index))
            })?;
            let host = to_host_address(address);

            if !seen.insert(host) {
                return Err(ProvisionError::InvalidState(format!(
                    "Address {} is assigned to more than one client",
                    host
                )));
            }

            let owners = peers
                .iter()
                .filter(|p| p.allowed_ips.contains(&host))
                .count();
            if owners != 1 || !peer.allowed_ips.contains(&host) {
                return Err(ProvisionError::InvalidState(format!(
                    "Address {} of client {} must be allowed on exactly its own server peer",
                    host, index
                )));
            }
        }

        Ok(())
    }
}
