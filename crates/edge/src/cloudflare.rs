use std::net::Ipv4Addr;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EdgeError, Result};
use crate::traits::DnsProvider;
use crate::types::DnsRecord;

pub const CLOUDFLARE_API_URL: &str = "https://api.cloudflare.com/client/v4";
pub const TOKEN_ENV: &str = "CLOUDFLARE_API_TOKEN";

pub struct CloudflareClient {
    base_url: String,
    token: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Serialize)]
struct RecordRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    content: String,
    /// 1 means automatic
    ttl: u32,
    proxied: bool,
}

impl CloudflareClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(CLOUDFLARE_API_URL, token)
    }

    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: Client::new(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV)
            .map_err(|_| EdgeError::Authentication(format!("{} not set", TOKEN_ENV)))?;
        Ok(Self::new(token))
    }

    /// Find the zone hosting `domain`, trying `domain` itself first and then
    /// each parent down to the registrable two-label name.
    async fn zone_id(&self, domain: &str) -> Result<String> {
        for candidate in zone_candidates(domain) {
            debug!("Looking up Cloudflare zone {}", candidate);

            let response = self
                .client
                .get(format!("{}/zones", self.base_url))
                .bearer_auth(&self.token)
                .query(&[("name", candidate)])
                .send()
                .await?;

            let zones: Vec<Zone> = self.handle_response(response).await?;
            if let Some(zone) = zones.into_iter().next() {
                if candidate != domain {
                    debug!("{} is served by zone {}", domain, candidate);
                }
                return Ok(zone.id);
            }
        }

        Err(EdgeError::ZoneNotFound(domain.to_string()))
    }

    async fn find_a_record(&self, zone_id: &str, name: &str) -> Result<Option<DnsRecord>> {
        let response = self
            .client
            .get(format!("{}/zones/{}/dns_records", self.base_url, zone_id))
            .bearer_auth(&self.token)
            .query(&[("type", "A"), ("name", name)])
            .send()
            .await?;

        let records: Vec<DnsRecord> = self.handle_response(response).await?;
        Ok(records.into_iter().next())
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        let envelope: Envelope<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(EdgeError::Api(format!("Status {}: {}", status, body)));
            }
            Err(e) => return Err(e.into()),
        };

        if !envelope.success || !status.is_success() {
            let message = envelope
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    EdgeError::Authentication(message)
                }
                _ => EdgeError::Api(format!("Status {}: {}", status, message)),
            });
        }

        envelope
            .result
            .ok_or_else(|| EdgeError::InvalidResponse("missing result".to_string()))
    }
}

#[async_trait]
impl DnsProvider for CloudflareClient {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    async fn upsert_a_record(
        &self,
        zone: &str,
        record: &str,
        address: Ipv4Addr,
    ) -> Result<DnsRecord> {
        let zone_id = self.zone_id(zone).await?;
        let request = RecordRequest {
            record_type: "A",
            name: record,
            content: address.to_string(),
            ttl: 1,
            proxied: false,
        };

        let response = match self.find_a_record(&zone_id, record).await? {
            Some(existing) if existing.content == request.content => {
                debug!("{} already points at {}", record, address);
                return Ok(existing);
            }
            Some(existing) => {
                info!("Updating A record {} -> {}", record, address);
                self.client
                    .put(format!(
                        "{}/zones/{}/dns_records/{}",
                        self.base_url, zone_id, existing.id
                    ))
                    .bearer_auth(&self.token)
                    .json(&request)
                    .send()
                    .await?
            }
            None => {
                info!("Creating A record {} -> {}", record, address);
                self.client
                    .post(format!("{}/zones/{}/dns_records", self.base_url, zone_id))
                    .bearer_auth(&self.token)
                    .json(&request)
                    .send()
                    .await?
            }
        };

        self.handle_response(response).await
    }
}

/// `a.b.example.com`, `b.example.com`, `example.com`; a bare label is tried as is.
fn zone_candidates(domain: &str) -> Vec<&str> {
    let domain = domain.trim_end_matches('.');
    let mut candidates = vec![domain];
    let mut rest = domain;
    while let Some((_, parent)) = rest.split_once('.') {
        if !parent.contains('.') {
            break;
        }
        candidates.push(parent);
        rest = parent;
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_candidates() {
        assert_eq!(
            zone_candidates("k1.lab.example.com"),
            vec!["k1.lab.example.com", "lab.example.com", "example.com"]
        );
        assert_eq!(zone_candidates("example.com."), vec!["example.com"]);
        assert_eq!(zone_candidates("localhost"), vec!["localhost"]);
    }

    #[test]
    fn test_client_creation() {
        let client = CloudflareClient::new("token");
        assert_eq!(client.base_url, CLOUDFLARE_API_URL);

        let client = CloudflareClient::with_base_url("http://localhost:8080/", "token");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_record_request_shape() {
        let request = RecordRequest {
            record_type: "A",
            name: "*.example.com",
            content: "203.0.113.7".to_string(),
            ttl: 1,
            proxied: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "A");
        assert_eq!(json["name"], "*.example.com");
        assert_eq!(json["proxied"], false);
    }
}
