// # DNS Address Detectors
//
// Public address detection through DNS "who am I" services. These are the
// first steps of the detection chain, ahead of the HTTP echo services.
//
// ## Detectors
//
// - [`WhoamiDetector`]: `whoami.cloudflare` TXT record in the CHAOS class.
//   The answer is the address the query arrived from.
// - [`OpenDnsDetector`]: `myip.opendns.com` A record on OpenDNS resolvers.
//
// ## Implementation Notes
//
// hickory's `SyncClient` is blocking, so every query runs inside
// `tokio::task::spawn_blocking`. The detection chain applies the per-step
// timeout around the whole query.

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use ddns_core::traits::{Address, AddressDetector};
use ddns_core::{Error, Result};
use hickory_client::client::{Client, SyncClient};
use hickory_client::op::ResponseCode;
use hickory_client::rr::{DNSClass, Name, RData, RecordType as QueryType};
use hickory_client::udp::UdpClientConnection;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;
use std::time::Duration;

/// Cloudflare's IPv6 resolver, used for the IPv6 who-am-I lookup
pub const CLOUDFLARE_IPV6_RESOLVER: &str = "2606:4700:4700::1111";

/// OpenDNS resolver answering `myip.opendns.com`
pub const OPENDNS_RESOLVER: &str = "resolver1.opendns.com";

/// Longest textual IPv4 address (`255.255.255.255`)
const MAX_IPV4_LEN: usize = 15;

/// UDP read timeout for a single query
const QUERY_TIMEOUT: Duration = Duration::from_secs(4);

/// `whoami.cloudflare` CH TXT lookup
#[derive(Debug, Clone)]
pub struct WhoamiDetector {
    name: String,
    server: String,
    max_len: Option<usize>,
}

impl WhoamiDetector {
    /// IPv4 lookup against `server`; answers longer than an IPv4 literal
    /// are discarded so an IPv6 reply falls through to the next step
    pub fn ipv4(server: impl Into<String>) -> Self {
        let server = server.into();
        Self {
            name: format!("DNS server {}", server),
            server,
            max_len: Some(MAX_IPV4_LEN),
        }
    }

    /// IPv6 lookup against Cloudflare's IPv6 resolver
    pub fn ipv6() -> Self {
        Self {
            name: format!("DNS server {}", CLOUDFLARE_IPV6_RESOLVER),
            server: CLOUDFLARE_IPV6_RESOLVER.to_string(),
            max_len: None,
        }
    }

    /// Pick the address out of the rendered answers, applying the length cap
    fn pick(&self, answers: &[String]) -> Option<Address> {
        answers
            .first()
            .and_then(|answer| clean_answer(answer, self.max_len))
    }
}

#[async_trait]
impl AddressDetector for WhoamiDetector {
    async fn attempt(&self) -> Result<Option<Address>> {
        let answers = query(&self.server, "whoami.cloudflare", DNSClass::CH, QueryType::TXT).await?;
        Ok(self.pick(&answers))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// `myip.opendns.com` A lookup
#[derive(Debug, Clone)]
pub struct OpenDnsDetector {
    server: String,
}

impl OpenDnsDetector {
    pub fn new() -> Self {
        Self {
            server: OPENDNS_RESOLVER.to_string(),
        }
    }
}

impl Default for OpenDnsDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressDetector for OpenDnsDetector {
    async fn attempt(&self) -> Result<Option<Address>> {
        let answers = query(&self.server, "myip.opendns.com", DNSClass::IN, QueryType::A).await?;
        Ok(answers.first().and_then(|answer| clean_answer(answer, None)))
    }

    fn name(&self) -> &str {
        "OpenDNS"
    }
}

/// DNS steps of the IPv4 chain, in order
pub fn ipv4_detectors(dns_server: &str) -> Vec<Box<dyn AddressDetector>> {
    vec![
        Box::new(WhoamiDetector::ipv4(dns_server)),
        Box::new(OpenDnsDetector::new()),
    ]
}

/// DNS steps of the IPv6 chain, in order
pub fn ipv6_detectors() -> Vec<Box<dyn AddressDetector>> {
    vec![Box::new(WhoamiDetector::ipv6())]
}

/// Strip quotes and whitespace from an answer and apply the length cap
///
/// Returns `None` for empty answers and answers longer than `max_len`.
pub fn clean_answer(raw: &str, max_len: Option<usize>) -> Option<Address> {
    let address = Address::from_output(&raw.replace('"', ""))?;
    match max_len {
        Some(max) if address.len() > max => {
            tracing::debug!("Discarding answer {} (longer than {})", address, max);
            None
        }
        _ => Some(address),
    }
}

/// Resolve a server given as `ip`, `ip:port`, `[v6]:port` or a hostname
fn server_addr(server: &str) -> anyhow::Result<SocketAddr> {
    if let Ok(addr) = server.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = server.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, 53));
    }
    (server, 53)
        .to_socket_addrs()
        .with_context(|| format!("Failed to resolve DNS server {server}"))?
        .next()
        .ok_or_else(|| anyhow!("DNS server {server} has no address"))
}

/// Run one query and return the answers rendered as text
async fn query(
    server: &str,
    name: &'static str,
    class: DNSClass,
    query_type: QueryType,
) -> Result<Vec<String>> {
    let server = server.to_string();

    let answers = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<String>> {
        let addr = server_addr(&server)?;
        let conn = UdpClientConnection::with_timeout(addr, QUERY_TIMEOUT)
            .context("Failed to create UDP connection")?;
        let client = SyncClient::new(conn);

        let name = Name::from_str(name).with_context(|| format!("Invalid query name: {name}"))?;
        let response = client
            .query(&name, class, query_type)
            .with_context(|| format!("Query for {name} via {server} failed"))?;

        if response.response_code() != ResponseCode::NoError {
            return Err(anyhow!(
                "Query for {name} via {server} returned {:?}",
                response.response_code()
            ));
        }

        Ok(response
            .answers()
            .iter()
            .filter_map(|record| record.data())
            .filter_map(render)
            .collect())
    })
    .await
    .map_err(|e| Error::detection(format!("DNS query task failed: {}", e)))??;

    Ok(answers)
}

fn render(data: &RData) -> Option<String> {
    match data {
        RData::TXT(txt) => Some(
            txt.txt_data()
                .iter()
                .map(|part| String::from_utf8_lossy(part).into_owned())
                .collect(),
        ),
        RData::A(a) => Some(a.to_string()),
        RData::AAAA(aaaa) => Some(aaaa.to_string()),
        _ => None,
    }
}
