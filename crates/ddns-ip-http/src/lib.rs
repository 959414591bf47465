// # HTTP Address Detectors
//
// Public address detection through HTTP "what is my IP" echo services.
// These follow the DNS steps in the detection chain.
//
// ## Services
//
// Each service answers either with the bare address as text or with a JSON
// object carrying it in one field. The lists are tried in order:
//
// | IPv4                          | IPv6                          |
// |-------------------------------|-------------------------------|
// | ipinfo.io (`ip`)              | ifconfig.co                   |
// | api.ipify.org                 | api6.ipify.org                |
// | icanhazip.com                 | icanhazip.com                 |
// | checkip.amazonaws.com         | checkip.amazonaws.com         |
// | httpbin.org/ip (`origin`)     | httpbin.org/ip (`origin`)     |
// | api.myip.com (`ip`)           | api.myip.com (`ip`)           |

use ddns_core::traits::{Address, AddressDetector};
use ddns_core::{Error, Result};
use serde_json::Value;
use std::time::Duration;

/// HTTP timeout for a single service request
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// How a service returns the address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// Body is the address, possibly surrounded by whitespace
    PlainText,
    /// Body is a JSON object with the address in this field
    JsonField(&'static str),
}

const IPV4_SERVICES: &[(&str, Extract)] = &[
    ("https://ipinfo.io", Extract::JsonField("ip")),
    ("https://api.ipify.org", Extract::PlainText),
    ("https://icanhazip.com", Extract::PlainText),
    ("https://checkip.amazonaws.com", Extract::PlainText),
    ("https://httpbin.org/ip", Extract::JsonField("origin")),
    ("https://api.myip.com", Extract::JsonField("ip")),
];

const IPV6_SERVICES: &[(&str, Extract)] = &[
    ("https://ifconfig.co", Extract::PlainText),
    ("https://api6.ipify.org", Extract::PlainText),
    ("https://icanhazip.com", Extract::PlainText),
    ("https://checkip.amazonaws.com", Extract::PlainText),
    ("https://httpbin.org/ip", Extract::JsonField("origin")),
    ("https://api.myip.com", Extract::JsonField("ip")),
];

/// One echo service
#[derive(Debug, Clone)]
pub struct HttpEchoDetector {
    url: String,
    extract: Extract,
    client: reqwest::Client,
}

impl HttpEchoDetector {
    /// Create a detector sharing `client`
    pub fn new(url: impl Into<String>, extract: Extract, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            extract,
            client,
        }
    }

    /// Pull the address out of a response body
    fn parse(&self, body: &str) -> Result<Option<Address>> {
        match self.extract {
            Extract::PlainText => Ok(Address::from_output(body)),
            Extract::JsonField(field) => {
                let json: Value = serde_json::from_str(body)?;
                Ok(json[field].as_str().and_then(Address::from_output))
            }
        }
    }
}

#[async_trait::async_trait]
impl AddressDetector for HttpEchoDetector {
    async fn attempt(&self) -> Result<Option<Address>> {
        tracing::debug!("Fetching public IP from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::http(format!("HTTP error: {}", response.status())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        self.parse(&body)
    }

    fn name(&self) -> &str {
        &self.url
    }
}

/// Build the shared HTTP client for all echo services
pub fn client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .build()
        .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))
}

fn detectors(services: &[(&str, Extract)], client: &reqwest::Client) -> Vec<Box<dyn AddressDetector>> {
    services
        .iter()
        .map(|(url, extract)| {
            Box::new(HttpEchoDetector::new(*url, *extract, client.clone())) as Box<dyn AddressDetector>
        })
        .collect()
}

/// HTTP steps of the IPv4 chain, in order
pub fn ipv4_services(client: &reqwest::Client) -> Vec<Box<dyn AddressDetector>> {
    detectors(IPV4_SERVICES, client)
}

/// HTTP steps of the IPv6 chain, in order
pub fn ipv6_services(client: &reqwest::Client) -> Vec<Box<dyn AddressDetector>> {
    detectors(IPV6_SERVICES, client)
}
