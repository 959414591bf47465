// # Cloudflare Registrar
//
// This crate provides the Cloudflare API v4 implementation of the
// `Registrar` trait.
//
// ## Behaviour
//
// - One HTTP request per trait call, 10 second timeout, no retries
// - Every response is checked twice: HTTP status first, then the
//   `success` flag of the Cloudflare envelope
// - Non-success statuses are mapped to distinct messages (401/403, 404,
//   429, 5xx) by a single helper
// - Absence (no zone, no record) is `Ok(None)`, never an error
//
// ## Security Requirements
//
// - Token and global key NEVER appear in logs or `Debug` output
//
// ## API Reference
//
// - Verify token: GET `/user/tokens/verify` (or GET `/user` with a global key)
// - List zones: GET `/zones?name=...`
// - List records: GET `/zones/:zone_id/dns_records?type=...&name=...`
// - Create record: POST `/zones/:zone_id/dns_records`
// - Patch record: PATCH `/zones/:zone_id/dns_records/:record_id`
// - Delete record: DELETE `/zones/:zone_id/dns_records/:record_id`
// - Read record: GET `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::traits::{Address, Registrar};
use ddns_core::{Credentials, Error, RecordType, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;

/// HTTP timeout for every API request
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// TTL value Cloudflare interprets as "automatic"
const AUTOMATIC_TTL: u32 = 1;

/// Cloudflare API v4 client
///
/// Stateless between calls: zone and record ids are passed in by the
/// reconciler, which owns the persisted state.
pub struct CloudflareRegistrar {
    /// API base URL without trailing slash
    api_base: String,

    /// ⚠️ NEVER log this value
    credentials: Credentials,

    client: reqwest::Client,
}

// Custom Debug implementation that hides the credentials
impl std::fmt::Debug for CloudflareRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareRegistrar")
            .field("api_base", &self.api_base)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl CloudflareRegistrar {
    /// Create a registrar talking to `api_base`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the token or key is empty, and
    /// [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(api_base: impl Into<String>, credentials: Credentials) -> Result<Self> {
        let empty = match &credentials {
            Credentials::Token(token) => token.is_empty(),
            Credentials::GlobalKey { email, key } => email.is_empty() || key.is_empty(),
        };
        if empty {
            return Err(Error::config("Cloudflare credentials cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Attach the auth headers matching the credential mode
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Content-Type", "application/json");
        match &self.credentials {
            Credentials::Token(token) => request.bearer_auth(token),
            Credentials::GlobalKey { email, key } => request
                .header("X-Auth-Email", email)
                .header("X-Auth-Key", key),
        }
    }

    /// Send a request and return the envelope of a successful response
    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Value> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| Error::http(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, action, &error_text));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::registrar(format!("Failed to parse response: {}", e)))?;

        if json["success"].as_bool() != Some(true) {
            return Err(Error::registrar(format!(
                "{} failed: {}",
                action,
                envelope_errors(&json)
            )));
        }

        Ok(json)
    }
}

/// Map a non-success HTTP status to an error
fn status_error(status: StatusCode, action: &str, error_text: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::registrar(format!(
            "Authentication failed: Invalid credentials or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::registrar(format!("{} failed: not found. Status: {}", action, status)),
        429 => Error::registrar(format!(
            "Rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::registrar(format!(
            "Cloudflare server error (transient): {} - {}",
            status, error_text
        )),
        _ => Error::registrar(format!("{} failed: {} - {}", action, status, error_text)),
    }
}

/// Join the `errors[].message` entries of an envelope
fn envelope_errors(json: &Value) -> String {
    let messages: Vec<&str> = json["errors"]
        .as_array()
        .map(|errors| errors.iter().filter_map(|e| e["message"].as_str()).collect())
        .unwrap_or_default();

    if messages.is_empty() {
        "success=false".to_string()
    } else {
        messages.join("; ")
    }
}

fn first_id(json: &Value) -> Result<Option<String>> {
    let results = json["result"].as_array().ok_or_else(|| {
        Error::registrar("Invalid response format: result is not an array")
    })?;

    match results.first() {
        None => Ok(None),
        Some(item) => item["id"]
            .as_str()
            .map(|id| Some(id.to_string()))
            .ok_or_else(|| Error::registrar("Invalid response format: id is not a string")),
    }
}

#[async_trait]
impl Registrar for CloudflareRegistrar {
    async fn verify_credentials(&self) -> Result<bool> {
        let path = match self.credentials {
            Credentials::Token(_) => "/user/tokens/verify",
            Credentials::GlobalKey { .. } => "/user",
        };

        match self.send(self.client.get(self.url(path)), "Credential check").await {
            Ok(_) => Ok(true),
            Err(e @ Error::Http(_)) => Err(e),
            Err(e) => {
                tracing::warn!("Credential check rejected: {}", e);
                Ok(false)
            }
        }
    }

    async fn find_zone_id(&self, zone_name: &str) -> Result<Option<String>> {
        tracing::debug!("Looking up zone ID for {}", zone_name);

        let request = self
            .client
            .get(self.url("/zones"))
            .query(&[("name", zone_name)]);
        let json = self.send(request, "Zone lookup").await?;

        let zone_id = first_id(&json)?;
        tracing::debug!("Zone lookup for {}: {:?}", zone_name, zone_id);
        Ok(zone_id)
    }

    async fn find_record_id(
        &self,
        zone_id: &str,
        fqdn: &str,
        record_type: RecordType,
    ) -> Result<Option<String>> {
        tracing::debug!("Looking up record ID: {} (type: {})", fqdn, record_type);

        let request = self
            .client
            .get(self.url(&format!("/zones/{}/dns_records", zone_id)))
            .query(&[("type", record_type.as_str()), ("name", fqdn)]);
        let json = self.send(request, "Record lookup").await?;

        first_id(&json)
    }

    async fn create_record(
        &self,
        zone_id: &str,
        fqdn: &str,
        address: &Address,
        record_type: RecordType,
        proxied: bool,
    ) -> Result<String> {
        let payload = json!({
            "type": record_type.as_str(),
            "name": fqdn,
            "content": address.as_str(),
            "proxied": proxied,
            "ttl": AUTOMATIC_TTL,
        });

        let request = self
            .client
            .post(self.url(&format!("/zones/{}/dns_records", zone_id)))
            .json(&payload);
        let json = self.send(request, "Record creation").await?;

        json["result"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::registrar("Invalid response format: result.id is not a string"))
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        fqdn: &str,
        address: &Address,
        record_type: RecordType,
        proxied: bool,
    ) -> Result<()> {
        let payload = json!({
            "type": record_type.as_str(),
            "name": fqdn,
            "content": address.as_str(),
            "proxied": proxied,
        });

        let request = self
            .client
            .patch(self.url(&format!("/zones/{}/dns_records/{}", zone_id, record_id)))
            .json(&payload);
        self.send(request, "Record update").await?;

        tracing::info!("DNS record updated: {} -> {}", fqdn, address);
        Ok(())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.url(&format!("/zones/{}/dns_records/{}", zone_id, record_id)));
        self.send(request, "Record deletion").await?;
        Ok(())
    }

    async fn get_record_content(&self, zone_id: &str, record_id: &str) -> Result<Option<Address>> {
        let request = self
            .client
            .get(self.url(&format!("/zones/{}/dns_records/{}", zone_id, record_id)));
        let json = self.send(request, "Record read").await?;

        Ok(json["result"]["content"].as_str().and_then(Address::from_output))
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
