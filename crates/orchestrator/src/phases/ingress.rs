use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cluster::{ResourceRef, WaitCondition};
use edge::{DnsProvider, IngressDevice, PortForward};
use platform_core::ProvisionConfig;
use tracing::{info, warn};

use crate::core::{Phase, PhaseContext};
use crate::error::{PhaseError, PhaseResult};

const FORWARDED_PORTS: &[(&str, u16)] = &[("http", 80), ("https", 443)];

/// Publishes the gateway: waits for its load balancer address, forwards the
/// WAN ports to it and points the platform domain at the public address.
pub struct ConfigureIngressPhase {
    dns: Option<Arc<dyn DnsProvider>>,
    ingress_device: Option<Arc<dyn IngressDevice>>,
}

impl ConfigureIngressPhase {
    pub fn new(
        dns: Option<Arc<dyn DnsProvider>>,
        ingress_device: Option<Arc<dyn IngressDevice>>,
    ) -> Self {
        Self {
            dns,
            ingress_device,
        }
    }
}

/// Service fronting the platform gateway for the chosen ingress stack.
pub fn gateway_service(config: &ProvisionConfig) -> ResourceRef {
    if config.install_kgateway {
        ResourceRef::namespaced("service", "kgateway-system", "kgateway")
    } else if config.istio.enabled {
        ResourceRef::namespaced("service", "istio-system", "istio-ingressgateway")
    } else {
        ResourceRef::namespaced("service", "ingress-nginx", "ingress-nginx-controller")
    }
}

#[async_trait]
impl Phase for ConfigureIngressPhase {
    fn name(&self) -> &str {
        "configure-ingress"
    }

    fn checkpoint(&self) -> Option<&str> {
        Some("ingress")
    }

    fn title(&self) -> &str {
        "Configure Ingress and DNS"
    }

    fn estimated_minutes(&self) -> u32 {
        3
    }

    async fn run(&self, ctx: &PhaseContext<'_>) -> PhaseResult {
        let config = ctx.config;
        let service = gateway_service(config);

        let state = ctx
            .cluster
            .wait_for_condition(
                &service,
                &WaitCondition::LoadBalancerAssigned,
                Duration::from_secs(10 * 60),
            )
            .await?;
        let lb_address = match state.load_balancer_ip {
            Some(IpAddr::V4(address)) => address,
            other => {
                return Err(PhaseError::precondition(format!(
                    "{} has no IPv4 load balancer address (got {:?})",
                    service, other
                )))
            }
        };
        if !config.lb_ip_range.contains(lb_address) {
            warn!(
                address = %lb_address,
                lb_ip_range = %config.lb_ip_range,
                "Gateway address is outside the configured pool"
            );
        }
        info!(service = %service, address = %lb_address, "Gateway load balancer ready");

        let public_address = match &self.ingress_device {
            Some(device) => self.forward_ports(ctx, device.as_ref(), lb_address).await?,
            None => lb_address,
        };
        ctx.check_cancelled()?;

        let dns = self.dns.as_ref().ok_or_else(|| {
            PhaseError::precondition(format!(
                "no {} credentials available to publish {}",
                config.dns_provider.as_str(),
                config.domain_name
            ))
        })?;

        let wildcard = format!("*.{}", config.domain_name);
        for record in [config.domain_name.as_str(), wildcard.as_str()] {
            dns.upsert_a_record(&config.domain_name, record, public_address)
                .await?;
        }

        info!(
            domain = %config.domain_name,
            address = %public_address,
            dns = dns.name(),
            "DNS records published"
        );
        Ok(())
    }
}

impl ConfigureIngressPhase {
    async fn forward_ports(
        &self,
        ctx: &PhaseContext<'_>,
        device: &dyn IngressDevice,
        lb_address: Ipv4Addr,
    ) -> PhaseResult<Ipv4Addr> {
        for (suffix, port) in FORWARDED_PORTS {
            ctx.check_cancelled()?;
            let rule = PortForward::tcp(
                format!("{}-{}", ctx.config.cluster_name, suffix),
                *port,
                lb_address,
            );
            device.ensure_port_forward(&rule).await?;
        }

        let wan = device.wan_address().await?;
        info!(device = device.name(), wan = %wan, "Port forwards in place");
        Ok(wan)
    }
}
