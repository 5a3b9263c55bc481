//! WireGuard interface and peer model
//!
//! A server and a client configuration share the same `[Interface]` and
//! `[Peer]` building blocks but are distinct types: a server owns any number
//! of peers, a client has exactly one peer, the server it connects to.

use crate::wireguard::render;
use crate::wireguard::{PrivateKey, PublicKey};
use ipnet::IpNet;
use std::fmt;
use std::net::IpAddr;

/// The local side of a WireGuard configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    /// Interface private key
    pub private_key: PrivateKey,
    /// UDP listen port (0 = unset)
    pub listen_port: u16,
    /// Interface addresses (CIDR)
    pub addresses: Vec<IpNet>,
    /// DNS servers pushed to the interface
    pub dns: Vec<IpAddr>,
    /// Maximum Transmission Unit (0 = unset)
    pub mtu: u16,
}

impl Interface {
    /// Create an interface with the given key and addresses and nothing else set
    pub fn new(private_key: PrivateKey, addresses: Vec<IpNet>) -> Self {
        Self {
            private_key,
            listen_port: 0,
            addresses,
            dns: Vec::new(),
            mtu: 0,
        }
    }

    /// Public key derived from the interface's private key
    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }

    /// First interface address, the one allocation continues from
    pub fn primary_address(&self) -> Option<&IpNet> {
        self.addresses.first()
    }
}

/// A remote endpoint as seen from one interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Peer's public key
    pub public_key: PublicKey,
    /// Address ranges routed to/through this peer
    pub allowed_ips: Vec<IpNet>,
    /// Externally reachable host:port of the peer
    pub endpoint: Option<String>,
    /// Persistent keepalive interval in seconds (0 = unset)
    pub persistent_keepalive: u16,
}

impl Peer {
    /// Create a peer with the given key and allowed IPs
    pub fn new(public_key: PublicKey, allowed_ips: Vec<IpNet>) -> Self {
        Self {
            public_key,
            allowed_ips,
            endpoint: None,
            persistent_keepalive: 0,
        }
    }

    /// Set the endpoint; an empty string clears it
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        let endpoint = endpoint.into();
        self.endpoint = if endpoint.is_empty() {
            None
        } else {
            Some(endpoint)
        };
    }

    /// Set keepalive interval in seconds (0 disables it)
    pub fn set_keepalive_secs(&mut self, secs: u16) {
        self.persistent_keepalive = secs;
    }
}

/// Anything that renders as one `[Interface]` block followed by `[Peer]` blocks
pub trait WireguardConfig {
    /// The local interface
    fn interface(&self) -> &Interface;

    /// Peers in output order
    fn peers(&self) -> &[Peer];

    /// Render in the wg-quick configuration format
    fn render(&self) -> String {
        render::render_config(self)
    }
}

/// Server side: listens on a port and knows every client as a peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server interface
    pub interface: Interface,
    peers: Vec<Peer>,
}

impl ServerConfig {
    /// Create a server configuration with no peers yet
    pub fn new(private_key: PrivateKey, addresses: Vec<IpNet>, listen_port: u16) -> Self {
        let mut interface = Interface::new(private_key, addresses);
        interface.listen_port = listen_port;
        Self {
            interface,
            peers: Vec::new(),
        }
    }

    /// Append a peer and return it for further configuration
    pub fn add_peer(&mut self, public_key: PublicKey, allowed_ips: Vec<IpNet>) -> &mut Peer {
        self.peers.push(Peer::new(public_key, allowed_ips));
        let last = self.peers.len() - 1;
        &mut self.peers[last]
    }

    /// Number of peers
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}

impl WireguardConfig for ServerConfig {
    fn interface(&self) -> &Interface {
        &self.interface
    }

    fn peers(&self) -> &[Peer] {
        &self.peers
    }
}

/// Client side: a single peer, the server, reached through its endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Client interface
    pub interface: Interface,
    /// The server this client connects to
    pub server: Peer,
}

impl ClientConfig {
    /// Create a client configuration pointing at a server
    pub fn new(
        private_key: PrivateKey,
        addresses: Vec<IpNet>,
        server_public_key: PublicKey,
        allowed_ips: Vec<IpNet>,
        endpoint: impl Into<String>,
    ) -> Self {
        let mut server = Peer::new(server_public_key, allowed_ips);
        server.set_endpoint(endpoint);
        Self {
            interface: Interface::new(private_key, addresses),
            server,
        }
    }
}

impl WireguardConfig for ClientConfig {
    fn interface(&self) -> &Interface {
        &self.interface
    }

    fn peers(&self) -> &[Peer] {
        std::slice::from_ref(&self.server)
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wireguard::KeyPair;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn keypair(seed: u64) -> KeyPair {
        KeyPair::generate_from(&mut StdRng::seed_from_u64(seed)).unwrap()
    }

    #[test]
    fn test_interface_new_leaves_optionals_unset() {
        let key = keypair(1);
        let iface = Interface::new(key.private.clone(), vec!["10.9.0.1/24".parse().unwrap()]);
        assert_eq!(iface.listen_port, 0);
        assert_eq!(iface.mtu, 0);
        assert!(iface.dns.is_empty());
        assert_eq!(iface.public_key(), key.public);
        assert_eq!(iface.primary_address().unwrap().to_string(), "10.9.0.1/24");
    }

    #[test]
    fn test_peer_endpoint_and_keepalive() {
        let mut peer = Peer::new(keypair(2).public, vec![]);
        assert!(peer.endpoint.is_none());

        peer.set_endpoint("vpn.example.com:51820");
        assert_eq!(peer.endpoint.as_deref(), Some("vpn.example.com:51820"));

        peer.set_endpoint("");
        assert!(peer.endpoint.is_none());

        peer.set_keepalive_secs(25);
        assert_eq!(peer.persistent_keepalive, 25);
    }

    #[test]
    fn test_server_add_peer() {
        let server_key = keypair(3);
        let mut server = ServerConfig::new(
            server_key.private,
            vec!["10.9.0.1/24".parse().unwrap()],
            51820,
        );
        assert_eq!(server.interface.listen_port, 51820);
        assert_eq!(server.peer_count(), 0);

        let client = keypair(4);
        let peer = server.add_peer(client.public.clone(), vec!["10.9.0.2/32".parse().unwrap()]);
        peer.set_keepalive_secs(10);

        assert_eq!(server.peer_count(), 1);
        assert_eq!(server.peers()[0].public_key, client.public);
        assert_eq!(server.peers()[0].persistent_keepalive, 10);
    }

    #[test]
    fn test_client_has_single_server_peer() {
        let server_key = keypair(5);
        let client = ClientConfig::new(
            keypair(6).private,
            vec!["10.9.0.2/24".parse().unwrap()],
            server_key.public.clone(),
            vec!["0.0.0.0/0".parse().unwrap()],
            "203.0.113.1:51820",
        );

        assert_eq!(client.interface.listen_port, 0);
        assert_eq!(client.peers().len(), 1);
        assert_eq!(client.peers()[0].public_key, server_key.public);
        assert_eq!(client.server.endpoint.as_deref(), Some("203.0.113.1:51820"));
    }
}
