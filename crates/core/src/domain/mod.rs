mod catalog;
mod config;
mod git;
mod network;

pub use catalog::{Catalog, CatalogApp};
pub use config::{
    defaults, ClusterType, DnsProviderKind, GitopsSettings, IstioSettings, ProvisionConfig,
    ProvisionInputs, UnifiSettings, CLOUD_PROVIDER,
};
pub use git::{GitProtocol, GitProvider};
pub use network::{is_dns1123_label, Ipv4Cidr};
