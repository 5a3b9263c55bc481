//! WireGuard configuration material
//!
//! Key generation, address allocation, the interface/peer model and its
//! rendering to the wg-quick text format.

mod address;
mod config;
mod keys;
pub mod render;

pub use address::{next_address, parse_subnet, subnet_contains, to_host_address, AddressAllocator};
pub use config::{ClientConfig, Interface, Peer, ServerConfig, WireguardConfig};
pub use keys::{clamp, KeyPair, PrivateKey, PublicKey, KEY_SIZE};
