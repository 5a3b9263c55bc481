//! Rendering to the wg-quick configuration text format
//!
//! Optional settings produce no line at all when unset. Each `[Peer]` block
//! starts with a blank line so blocks can be concatenated directly after the
//! `[Interface]` block.

use crate::wireguard::{Peer, WireguardConfig};
use std::fmt::{Display, Write};

/// Render a single `[Peer]` block, including its leading blank line
pub fn render_peer(peer: &Peer) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write!(
        out,
        "\n[Peer]\nPublicKey = {}\nAllowedIPs = {}\n",
        peer.public_key.to_base64(),
        join(&peer.allowed_ips)
    );

    if let Some(endpoint) = peer.endpoint.as_deref().filter(|e| !e.is_empty()) {
        let _ = writeln!(out, "Endpoint = {}", endpoint);
    }

    if peer.persistent_keepalive != 0 {
        let _ = writeln!(out, "PersistentKeepalive = {}", peer.persistent_keepalive);
    }

    out
}

/// Render a complete configuration: the interface followed by every peer in order
pub fn render_config<C: WireguardConfig + ?Sized>(config: &C) -> String {
    let iface = config.interface();
    let mut out = String::new();
    let _ = write!(
        out,
        "[Interface]\nPrivateKey = {}\nAddress = {}\n",
        iface.private_key.to_base64(),
        join(&iface.addresses)
    );

    if iface.listen_port != 0 {
        let _ = writeln!(out, "ListenPort = {}", iface.listen_port);
    }

    if !iface.dns.is_empty() {
        let _ = writeln!(out, "DNS = {}", join(&iface.dns));
    }

    if iface.mtu != 0 {
        let _ = writeln!(out, "MTU = {}", iface.mtu);
    }

    for peer in config.peers() {
        out.push_str(&render_peer(peer));
    }

    out
}

fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
