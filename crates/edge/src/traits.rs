use std::net::Ipv4Addr;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{DnsRecord, PortForward};

/// Public DNS for the platform domain
#[async_trait]
pub trait DnsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Point `record` at `address`, creating or updating it. `zone` may be
    /// the zone apex or any name below it.
    async fn upsert_a_record(
        &self,
        zone: &str,
        record: &str,
        address: Ipv4Addr,
    ) -> Result<DnsRecord>;
}

/// The router that exposes the cluster's gateway to the internet
#[async_trait]
pub trait IngressDevice: Send + Sync {
    fn name(&self) -> &'static str;

    /// Public address of the WAN uplink
    async fn wan_address(&self) -> Result<Ipv4Addr>;

    /// Create the rule, or update the existing rule with the same name.
    async fn ensure_port_forward(&self, rule: &PortForward) -> Result<()>;
}
