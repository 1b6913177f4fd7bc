//! Delivery status fetcher and JSONP body extraction

use std::sync::Arc;

use crate::config::Config;
use crate::io::HttpClient;
use crate::probe::ConnectivityProbe;

/// Result of one fetch attempt, produced once per tick.
///
/// Every failure mode is folded into a variant here; nothing past the
/// fetcher boundary returns an error for a failed probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success { count: u64 },
    NetworkUnavailable,
    TransportError { message: String },
    ParseError { body: String },
}

/// Fetches the deliveries-in-range count from the delivery server
pub struct StatusFetcher {
    count_url: String,
    endpoint: String,
    http: Arc<dyn HttpClient>,
    probe: Arc<dyn ConnectivityProbe>,
}

impl std::fmt::Debug for StatusFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusFetcher")
            .field("count_url", &self.count_url)
            .finish()
    }
}

impl StatusFetcher {
    pub fn new(config: &Config, http: Arc<dyn HttpClient>, probe: Arc<dyn ConnectivityProbe>) -> Self {
        let count_url = format!(
            "{}/deliveriescountinrange.jsonp?callback={}&lat={}&lng={}&radius={}",
            config.endpoint,
            config.callback,
            config.geofence.lat,
            config.geofence.lng,
            config.geofence.radius_degrees
        );

        tracing::debug!("Created StatusFetcher for {}", count_url);

        Self {
            count_url,
            endpoint: config.endpoint.clone(),
            http,
            probe,
        }
    }

    /// Perform one bounded fetch of the delivery count.
    ///
    /// Short-circuits without a request when the probe reports no
    /// connectivity, so a dead link never shows up as connection-refused
    /// noise in the logs.
    pub async fn fetch(&self) -> FetchOutcome {
        if !self.probe.is_connected().await {
            tracing::debug!("No connectivity, skipping fetch");
            return FetchOutcome::NetworkUnavailable;
        }

        match self.http.get(&self.count_url).await {
            Ok(response) if (200..300).contains(&response.status) => {
                match parse_jsonp_count(&response.body) {
                    Some(count) => {
                        tracing::debug!("Delivery count: {}", count);
                        FetchOutcome::Success { count }
                    }
                    None => {
                        tracing::warn!("Unparseable count response: {:?}", response.body);
                        FetchOutcome::ParseError {
                            body: response.body,
                        }
                    }
                }
            }
            Ok(response) => {
                tracing::warn!("Count request returned status {}", response.status);
                FetchOutcome::TransportError {
                    message: format!("status {}", response.status),
                }
            }
            Err(e) => {
                tracing::warn!("Count request failed: {}", e);
                FetchOutcome::TransportError {
                    message: e.to_string(),
                }
            }
        }
    }

    /// One-shot account verification against the server.
    ///
    /// Not part of the periodic tick; uses the same transport. The server
    /// answers with the literal string "True" (any casing) for a known
    /// email, anything else means no.
    pub async fn verify(&self, email: &str) -> bool {
        let url = format!("{}/verify?email={}", self.endpoint, email);
        match self.http.get(&url).await {
            Ok(response) if (200..300).contains(&response.status) => {
                let ok = response.body.trim().eq_ignore_ascii_case("true");
                if !ok {
                    tracing::debug!("Verify response: {:?}", response.body);
                }
                ok
            }
            Ok(response) => {
                tracing::debug!("Verify request returned status {}", response.status);
                false
            }
            Err(e) => {
                tracing::debug!("Verify request failed: {}", e);
                false
            }
        }
    }
}

/// Extract the integer payload from a JSONP-shaped body `callback(<count>)`.
///
/// Takes the text after the first `(` up to the next `)` (or end of input
/// when the closing paren is missing) and parses it as a base-10
/// non-negative integer. Returns `None` for anything else.
pub fn parse_jsonp_count(body: &str) -> Option<u64> {
    let open = body.find('(')?;
    let rest = &body[open + 1..];
    let interior = match rest.find(')') {
        Some(close) => &rest[..close],
        None => rest,
    };
    interior.trim().parse::<u64>().ok()
}
