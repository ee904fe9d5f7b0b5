use std::net::Ipv4Addr;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{EdgeError, Result};
use crate::traits::IngressDevice;
use crate::types::PortForward;

const CSRF_HEADER: &str = "x-csrf-token";

/// UniFi OS console (UDM, UCG, Cloud Key) driven through its local
/// Network application API.
pub struct UnifiClient {
    base_url: String,
    username: String,
    password: String,
    site: String,
    client: Client,
    csrf_token: Mutex<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct UnifiResponse<T> {
    meta: Meta,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    rc: String,
    msg: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PortForwardEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    enabled: bool,
    src: String,
    dst_port: String,
    fwd: String,
    fwd_port: String,
    proto: String,
    pfwd_interface: String,
    log: bool,
}

impl PortForwardEntry {
    fn from_rule(rule: &PortForward) -> Self {
        Self {
            id: None,
            name: rule.name.clone(),
            enabled: true,
            src: "any".to_string(),
            dst_port: rule.dst_port.to_string(),
            fwd: rule.fwd_address.to_string(),
            fwd_port: rule.fwd_port.to_string(),
            proto: rule.protocol.as_str().to_string(),
            pfwd_interface: "wan".to_string(),
            log: false,
        }
    }

    fn same_target(&self, other: &PortForwardEntry) -> bool {
        self.enabled == other.enabled
            && self.dst_port == other.dst_port
            && self.fwd == other.fwd
            && self.fwd_port == other.fwd_port
            && self.proto == other.proto
    }
}

#[derive(Debug, Deserialize)]
struct HealthEntry {
    subsystem: String,
    wan_ip: Option<String>,
}

impl UnifiClient {
    /// `host` may be a bare address (`192.168.1.1`) or a full URL.
    pub fn new(
        host: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", host.trim_end_matches('/'))
        };

        // Consoles serve a self-signed certificate out of the box
        let client = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| EdgeError::Config(e.to_string()))?;

        Ok(Self {
            base_url,
            username: username.into(),
            password: password.into(),
            site: "default".to_string(),
            client,
            csrf_token: Mutex::new(None),
        })
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn network_url(&self, path: &str) -> String {
        format!(
            "{}/proxy/network/api/s/{}/{}",
            self.base_url, self.site, path
        )
    }

    /// Log in once per client; the session cookie lives in the cookie store.
    async fn login(&self) -> Result<String> {
        let mut csrf = self.csrf_token.lock().await;
        if let Some(token) = csrf.as_ref() {
            return Ok(token.clone());
        }

        debug!("Logging in to UniFi console at {}", self.base_url);
        let response = self
            .client
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&serde_json::json!({
                "username": self.username,
                "password": self.password,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EdgeError::Authentication(format!(
                "UniFi login as {} returned {}",
                self.username, status
            )));
        }

        let token = response
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_default();
        *csrf = Some(token.clone());
        Ok(token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        let csrf = self.login().await?;
        let response = request.header(CSRF_HEADER, csrf).send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            *self.csrf_token.lock().await = None;
            return Err(EdgeError::Authentication(
                "UniFi session rejected".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EdgeError::Api(format!("Status {}: {}", status, body)));
        }

        let body: UnifiResponse<T> = response.json().await?;
        if body.meta.rc != "ok" {
            return Err(EdgeError::Api(
                body.meta.msg.unwrap_or_else(|| body.meta.rc.clone()),
            ));
        }
        Ok(body.data)
    }
}

#[async_trait]
impl IngressDevice for UnifiClient {
    fn name(&self) -> &'static str {
        "unifi"
    }

    async fn wan_address(&self) -> Result<Ipv4Addr> {
        let health: Vec<HealthEntry> = self
            .send(self.client.get(self.network_url("stat/health")))
            .await?;

        let wan_ip = health
            .into_iter()
            .find(|entry| entry.subsystem == "wan")
            .and_then(|entry| entry.wan_ip)
            .ok_or_else(|| EdgeError::InvalidResponse("no WAN address reported".to_string()))?;

        wan_ip
            .parse()
            .map_err(|_| EdgeError::InvalidResponse(format!("invalid WAN address {}", wan_ip)))
    }

    async fn ensure_port_forward(&self, rule: &PortForward) -> Result<()> {
        let existing: Vec<PortForwardEntry> = self
            .send(self.client.get(self.network_url("rest/portforward")))
            .await?;

        let mut desired = PortForwardEntry::from_rule(rule);
        match existing.into_iter().find(|entry| entry.name == rule.name) {
            Some(current) if current.same_target(&desired) => {
                debug!("Port forward {} already in place", rule.name);
            }
            Some(current) => {
                info!(
                    "Updating port forward {} -> {}:{}",
                    rule.name, rule.fwd_address, rule.fwd_port
                );
                let id = current.id.filter(|id| !id.is_empty()).ok_or_else(|| {
                    EdgeError::InvalidResponse(format!(
                        "port forward {} has no _id",
                        rule.name
                    ))
                })?;
                desired.id = Some(id.clone());
                let _: Vec<PortForwardEntry> = self
                    .send(
                        self.client
                            .put(self.network_url(&format!("rest/portforward/{}", id)))
                            .json(&desired),
                    )
                    .await?;
            }
            None => {
                info!(
                    "Creating port forward {} -> {}:{}",
                    rule.name, rule.fwd_address, rule.fwd_port
                );
                let _: Vec<PortForwardEntry> = self
                    .send(self.client.post(self.network_url("rest/portforward")).json(&desired))
                    .await?;
            }
        }
        Ok(())
    }
}
