//! Clients for the devices and services at the edge of the home network:
//! the public DNS zone and the router that forwards traffic to the cluster.

pub mod cloudflare;
pub mod error;
pub mod traits;
pub mod types;
pub mod unifi;

pub use cloudflare::CloudflareClient;
pub use error::{EdgeError, Result};
pub use traits::{DnsProvider, IngressDevice};
pub use types::{DnsRecord, ForwardProtocol, PortForward};
pub use unifi::UnifiClient;
