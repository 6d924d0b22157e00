//! `RoutingProvider` backed by the OSRM Route service over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use ridescout_core::{Coordinate, RoutingError, RoutingProvider, TripRoute};
use url::Url;

use super::osrm::RouteResponse;

/// Error type for [`OsrmRoutingClient`] construction failures.
#[derive(Debug)]
pub enum ProviderBuildError {
    /// The base URL could not be parsed or cannot carry a path.
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
}

impl std::fmt::Display for ProviderBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBaseUrl { url, reason } => {
                write!(f, "invalid routing base URL {url:?}: {reason}")
            }
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
        }
    }
}

impl std::error::Error for ProviderBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidBaseUrl { .. } => None,
            Self::HttpClient(err) => Some(err),
        }
    }
}

/// Public OSRM demo server.
pub const DEFAULT_OSRM_BASE_URL: &str = "https://router.project-osrm.org";

/// Default user agent for OSRM requests.
pub const DEFAULT_USER_AGENT: &str = "ridescout-routing/0.1";

/// Default routing profile.
const DEFAULT_PROFILE: &str = "driving";

/// Default connection timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Configuration for [`OsrmRoutingClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsrmRoutingConfig {
    /// Base URL for the OSRM service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// OSRM profile segment, usually `"driving"`.
    pub profile: String,
    /// User agent string for requests.
    pub user_agent: String,
    /// Upper bound on establishing a connection.
    pub connect_timeout: Duration,
}

impl Default for OsrmRoutingConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OSRM_BASE_URL.to_owned(),
            profile: DEFAULT_PROFILE.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }
}

impl OsrmRoutingConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the routing profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// HTTP routing provider using the OSRM Route API.
///
/// The underlying [`Client`] is built once and pooled; clones share it.
/// Per-request timeouts come from the caller of
/// [`RoutingProvider::route`], so the engine's per-call bound is enforced
/// at the socket as well as around the future.
#[derive(Debug, Clone)]
pub struct OsrmRoutingClient {
    client: Client,
    base_url: Url,
    config: OsrmRoutingConfig,
}

impl OsrmRoutingClient {
    /// Create a client for `base_url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to
    /// build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(OsrmRoutingConfig::new(base_url))
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to
    /// build.
    pub fn with_config(config: OsrmRoutingConfig) -> Result<Self, ProviderBuildError> {
        let invalid = |reason: String| ProviderBuildError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason,
        };
        let base_url = Url::parse(&config.base_url).map_err(|err| invalid(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path".to_owned()));
        }
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// The configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &OsrmRoutingConfig {
        &self.config
    }

    /// Build the OSRM Route API URL for a two-point route.
    ///
    /// The URL format is
    /// `{base_url}/route/v1/{profile}/{lon},{lat};{lon},{lat}?overview=full&geometries=geojson`.
    fn build_route_url(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Url, RoutingError> {
        let coordinates = format!(
            "{},{};{},{}",
            origin.longitude, origin.latitude, destination.longitude, destination.latitude
        );
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RoutingError::Unreachable {
                message: format!("{} cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(["route", "v1", self.config.profile.as_str(), coordinates.as_str()]);
        url.query_pairs_mut()
            .append_pair("overview", "full")
            .append_pair("geometries", "geojson");
        Ok(url)
    }
}

/// Convert a reqwest error to a `RoutingError`.
fn convert_reqwest_error(error: &reqwest::Error, timeout: Duration) -> RoutingError {
    if error.is_timeout() {
        return RoutingError::timeout(timeout);
    }
    if let Some(status) = error.status() {
        return RoutingError::Unreachable {
            message: format!("HTTP {status}: {error}"),
        };
    }
    RoutingError::Unreachable {
        message: error.to_string(),
    }
}

#[async_trait]
impl RoutingProvider for OsrmRoutingClient {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        timeout: Duration,
    ) -> Result<TripRoute, RoutingError> {
        let url = self.build_route_url(origin, destination)?;
        debug!("requesting route {url}");

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|err| convert_reqwest_error(&err, timeout))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| convert_reqwest_error(&err, timeout))?;

        // OSRM reports NoRoute with a 400 status and a JSON body, so the body
        // is inspected before the status.
        match serde_json::from_slice::<RouteResponse>(&body) {
            Ok(parsed) => parsed.into_trip_route().inspect_err(|err| {
                debug!("route {url} rejected: {err}");
            }),
            Err(err) if status.is_success() => {
                warn!("unparseable OSRM response from {url}: {err}");
                Err(RoutingError::MalformedResponse {
                    message: err.to_string(),
                })
            }
            Err(_) => Err(RoutingError::Unreachable {
                message: format!("{url} returned HTTP {status}"),
            }),
        }
    }
}
