//! Initial server/client configuration assembly

use crate::error::{ProvisionError, Result};
use crate::provision::input::{parse_dns_list, Endpoint};
use crate::wireguard::{
    parse_subnet, to_host_address, AddressAllocator, ClientConfig, KeyPair, ServerConfig,
};
use ipnet::IpNet;
use rand::{CryptoRng, RngCore};
use tracing::debug;

/// Subnet used when the operator does not choose one
pub const DEFAULT_SUBNET: &str = "10.9.0.0/24";
/// Client route set meaning "route everything through the tunnel"
pub const DEFAULT_ALLOWED_IPS: &str = "0.0.0.0/0";
/// DNS servers pushed to clients by default
pub const DEFAULT_DNS: &str = "8.8.8.8, 1.1.1.1";
/// Client MTU
pub const DEFAULT_MTU: u16 = 1420;
/// Client keepalive towards the server, in seconds
pub const DEFAULT_PERSISTENT_KEEPALIVE: u16 = 25;

/// Inputs for building the initial server and client configurations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildParams {
    /// Subnet in CIDR notation; parsed during the build
    pub subnet: String,
    /// Server endpoint written into client configurations
    pub endpoint: Endpoint,
    /// Server listen port (0 leaves it out)
    pub listen_port: u16,
    /// Comma-separated DNS servers for clients
    pub dns: String,
    /// Client MTU (0 leaves it out)
    pub mtu: u16,
    /// Client keepalive in seconds (0 leaves it out)
    pub persistent_keepalive: u16,
    /// Routes clients send through the server
    pub allowed_ips: Vec<IpNet>,
}

impl BuildParams {
    /// Parameters with the default DNS, MTU, keepalive and route set
    pub fn new(subnet: impl Into<String>, endpoint: Endpoint, listen_port: u16) -> Self {
        Self {
            subnet: subnet.into(),
            endpoint,
            listen_port,
            dns: DEFAULT_DNS.to_string(),
            mtu: DEFAULT_MTU,
            persistent_keepalive: DEFAULT_PERSISTENT_KEEPALIVE,
            allowed_ips: vec![default_allowed_ips()],
        }
    }
}

/// The default client route set as a network
pub fn default_allowed_ips() -> IpNet {
    IpNet::V4(ipnet::Ipv4Net::default())
}

/// Build the server configuration and its first client.
///
/// The server gets the first address after the subnet's network address and
/// the client the one after that. The server lists the client as its only
/// peer with a host-masked allowed IP; the client points at the server's
/// endpoint and routes `params.allowed_ips` through it.
pub fn build_initial<R>(params: &BuildParams, rng: &mut R) -> Result<(ServerConfig, ClientConfig)>
where
    R: RngCore + CryptoRng + ?Sized,
{
    if params.allowed_ips.is_empty() {
        return Err(ProvisionError::Config(
            "Client allowed IPs cannot be empty".to_string(),
        ));
    }

    let subnet = parse_subnet(&params.subnet)?;
    let (server_address, client_address) = AddressAllocator::new(subnet).initial()?;

    let server_keys = KeyPair::generate_from(rng)?;
    let client_keys = KeyPair::generate_from(rng)?;

    let mut server = ServerConfig::new(
        server_keys.private,
        vec![server_address],
        params.listen_port,
    );
    server.add_peer(client_keys.public, vec![to_host_address(&client_address)]);

    let mut client = ClientConfig::new(
        client_keys.private,
        vec![client_address],
        server_keys.public,
        params.allowed_ips.clone(),
        params.endpoint.to_string(),
    );
    client.interface.dns = parse_dns_list(&params.dns);
    client.interface.mtu = params.mtu;
    client.server.set_keepalive_secs(params.persistent_keepalive);

    debug!(
        %subnet,
        server = %server_address,
        client = %client_address,
        dns = client.interface.dns.len(),
        "Built initial configuration"
    );

    Ok((server, client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wireguard::WireguardConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn params(subnet: &str) -> BuildParams {
        BuildParams::new(subnet, Endpoint::new("203.0.113.10", 51820), 51820)
    }

    #[test]
    fn test_build_initial_addresses() {
        let (server, client) = build_initial(&params("10.9.0.0/24"), &mut StdRng::seed_from_u64(1)).unwrap();

        assert_eq!(server.interface.addresses[0].to_string(), "10.9.0.1/24");
        assert_eq!(client.interface.addresses[0].to_string(), "10.9.0.2/24");
        assert_eq!(server.peers()[0].allowed_ips[0].to_string(), "10.9.0.2/32");
    }

    #[test]
    fn test_build_initial_key_pairing() {
        let (server, client) = build_initial(&params("10.9.0.0/24"), &mut StdRng::seed_from_u64(2)).unwrap();

        assert_eq!(server.peers()[0].public_key, client.interface.public_key());
        assert_eq!(client.server.public_key, server.interface.public_key());
        assert_ne!(server.interface.private_key, client.interface.private_key);
    }

    #[test]
    fn test_build_initial_interface_settings() {
        let (server, client) = build_initial(&params("10.9.0.0/24"), &mut StdRng::seed_from_u64(3)).unwrap();

        assert_eq!(server.interface.listen_port, 51820);
        assert!(server.interface.dns.is_empty());
        assert_eq!(server.interface.mtu, 0);
        assert!(server.peers()[0].endpoint.is_none());

        assert_eq!(client.interface.listen_port, 0);
        assert_eq!(client.interface.mtu, DEFAULT_MTU);
        assert_eq!(
            client.interface.dns,
            vec!["8.8.8.8".parse::<std::net::IpAddr>().unwrap(), "1.1.1.1".parse().unwrap()]
        );
        assert_eq!(client.server.endpoint.as_deref(), Some("203.0.113.10:51820"));
        assert_eq!(client.server.persistent_keepalive, DEFAULT_PERSISTENT_KEEPALIVE);
        assert_eq!(client.server.allowed_ips[0].to_string(), DEFAULT_ALLOWED_IPS);
    }

    #[test]
    fn test_build_initial_filters_dns() {
        let mut p = params("10.9.0.0/24");
        p.dns = "not-an-ip, 1.1.1.1".to_string();
        let (_, client) = build_initial(&p, &mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(client.interface.dns, vec!["1.1.1.1".parse::<std::net::IpAddr>().unwrap()]);
    }

    #[test]
    fn test_build_initial_invalid_subnet() {
        let err = build_initial(&params("10.9.0.0/99"), &mut StdRng::seed_from_u64(5)).unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidSubnet(_)));
    }

    #[test]
    fn test_build_initial_requires_allowed_ips() {
        let mut p = params("10.9.0.0/24");
        p.allowed_ips.clear();
        let err = build_initial(&p, &mut StdRng::seed_from_u64(11)).unwrap_err();
        assert!(matches!(err, ProvisionError::Config(_)));
    }

    #[test]
    fn test_build_initial_subnet_too_small() {
        let err = build_initial(&params("10.9.0.0/32"), &mut StdRng::seed_from_u64(6)).unwrap_err();
        assert!(matches!(err, ProvisionError::SubnetExhausted { .. }));
    }

    #[test]
    fn test_build_initial_is_deterministic_with_seed() {
        let a = build_initial(&params("10.9.0.0/24"), &mut StdRng::seed_from_u64(9)).unwrap();
        let b = build_initial(&params("10.9.0.0/24"), &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_build_initial_ipv6_subnet() {
        let (server, client) = build_initial(&params("fd00:9::/64"), &mut StdRng::seed_from_u64(10)).unwrap();
        assert_eq!(server.interface.addresses[0].to_string(), "fd00:9::1/64");
        assert_eq!(client.interface.addresses[0].to_string(), "fd00:9::2/64");
        assert_eq!(server.peers()[0].allowed_ips[0].to_string(), "fd00:9::2/128");
    }
}
