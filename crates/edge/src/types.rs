use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub proxied: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardProtocol {
    Tcp,
    Udp,
    #[default]
    TcpUdp,
}

impl ForwardProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForwardProtocol::Tcp => "tcp",
            ForwardProtocol::Udp => "udp",
            ForwardProtocol::TcpUdp => "tcp_udp",
        }
    }
}

/// WAN port forwarded to a host on the LAN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortForward {
    pub name: String,
    pub dst_port: u16,
    pub fwd_address: Ipv4Addr,
    pub fwd_port: u16,
    pub protocol: ForwardProtocol,
}

impl PortForward {
    /// Forward the same port number on TCP.
    pub fn tcp(name: impl Into<String>, port: u16, fwd_address: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            dst_port: port,
            fwd_address,
            fwd_port: port,
            protocol: ForwardProtocol::Tcp,
        }
    }
}
