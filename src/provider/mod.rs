// Provider adapters: one per third-party hotel search API

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::ProviderError;
use crate::listing::{CanonicalListing, ListingDraft, SearchRequest};

pub mod booking;
pub(crate) mod de;
pub mod hotels;
pub mod tripadvisor;

pub use booking::BookingAdapter;
pub use hotels::HotelsAdapter;
pub use tripadvisor::TripadvisorAdapter;

const USER_AGENT: &str = "stay-aggregator/0.1";

/// Query-string pairs in the order the provider expects them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Query builder, network caller and response transformer for one provider.
///
/// `build_query` and `transform` are pure. `invoke` performs exactly one GET and
/// never retries; retrying is the caller's business.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn build_query(&self, request: &SearchRequest) -> Query;

    async fn invoke(&self, query: &Query) -> Result<Value, ProviderError>;

    fn transform(&self, raw: Value) -> Result<Vec<CanonicalListing>, ProviderError>;
}

/// Where and how a provider is called: `{base_url}{search_path}?{query}` plus headers.
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    client: Client,
    search_url: Url,
    headers: HeaderMap,
}

impl ProviderEndpoint {
    pub fn new(
        client: Client,
        base_url: &str,
        search_path: &str,
        headers: HeaderMap,
    ) -> Result<Self, ProviderError> {
        let joined = format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            search_path.trim_start_matches('/')
        );
        let search_url = Url::parse(&joined).map_err(|e| {
            ProviderError::InvalidConfig(format!("invalid provider URL '{joined}': {e}"))
        })?;
        Ok(Self {
            client,
            search_url,
            headers,
        })
    }

    /// RapidAPI-style endpoint: key header plus a host header derived from `base_url`.
    pub fn rapidapi(
        client: Client,
        base_url: &str,
        search_path: &str,
        api_key: &str,
    ) -> Result<Self, ProviderError> {
        let host = Url::parse(base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| {
                ProviderError::InvalidConfig(format!("provider base URL '{base_url}' has no host"))
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-rapidapi-key"),
            header_value("api key", api_key)?,
        );
        headers.insert(
            HeaderName::from_static("x-rapidapi-host"),
            header_value("host", &host)?,
        );
        Self::new(client, base_url, search_path, headers)
    }

    pub fn url_for(&self, query: &Query) -> Url {
        let mut url = self.search_url.clone();
        if !query.pairs().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query.pairs() {
                pairs.append_pair(k, v);
            }
        }
        url
    }

    /// One GET. Non-2xx becomes `Http { status }`; an empty body decodes to `Null`.
    pub async fn get_json(&self, query: &Query) -> Result<Value, ProviderError> {
        let response = self
            .client
            .get(self.url_for(query))
            .headers(self.headers.clone())
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ProviderError::Decode {
            context: "search response".to_string(),
            reason: e.to_string(),
        })
    }
}

fn header_value(what: &str, raw: &str) -> Result<HeaderValue, ProviderError> {
    HeaderValue::from_str(raw)
        .map_err(|e| ProviderError::InvalidConfig(format!("invalid {what} header value: {e}")))
}

/// Decodes a provider envelope. `null` (empty body) yields the empty envelope.
pub(crate) fn decode_envelope<T>(raw: Value) -> Result<T, ProviderError>
where
    T: DeserializeOwned + Default,
{
    if raw.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(raw).map_err(|e| ProviderError::Decode {
        context: "search response".to_string(),
        reason: e.to_string(),
    })
}

/// Decodes each candidate record independently; records that fail to decode or
/// lack an id/name are dropped without affecting the rest.
pub(crate) fn normalize<R, F>(provider: &str, items: Vec<Value>, convert: F) -> Vec<CanonicalListing>
where
    R: DeserializeOwned,
    F: Fn(R) -> ListingDraft,
{
    let total = items.len();
    let listings: Vec<CanonicalListing> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<R>(item).ok())
        .map(convert)
        .filter_map(ListingDraft::finish)
        .collect();

    if listings.len() < total {
        tracing::debug!(
            provider,
            total,
            dropped = total - listings.len(),
            "dropped incomplete provider records"
        );
    }
    listings
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Booking,
    Tripadvisor,
    Hotels,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Booking => "booking",
            ProviderKind::Tripadvisor => "tripadvisor",
            ProviderKind::Hotels => "hotels",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Booking => "https://booking-com.p.rapidapi.com",
            ProviderKind::Tripadvisor => "https://travel-advisor.p.rapidapi.com",
            ProviderKind::Hotels => "https://hotels-com-provider.p.rapidapi.com",
        }
    }

    pub fn base_url_env_var(&self) -> &'static str {
        match self {
            ProviderKind::Booking => "STAY_BOOKING_BASE_URL",
            ProviderKind::Tripadvisor => "STAY_TRIPADVISOR_BASE_URL",
            ProviderKind::Hotels => "STAY_HOTELS_BASE_URL",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "booking" => Ok(ProviderKind::Booking),
            "tripadvisor" => Ok(ProviderKind::Tripadvisor),
            "hotels" => Ok(ProviderKind::Hotels),
            other => Err(format!("unknown provider '{other}'")),
        }
    }
}

pub fn http_client(timeout: Duration) -> Result<Client, ProviderError> {
    Ok(Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(5))
        .user_agent(USER_AGENT)
        .build()?)
}

pub fn build_adapter(
    kind: ProviderKind,
    client: Client,
    base_url: &str,
    api_key: &str,
) -> Result<Arc<dyn ProviderAdapter>, ProviderError> {
    Ok(match kind {
        ProviderKind::Booking => Arc::new(BookingAdapter::new(client, base_url, api_key)?),
        ProviderKind::Tripadvisor => Arc::new(TripadvisorAdapter::new(client, base_url, api_key)?),
        ProviderKind::Hotels => Arc::new(HotelsAdapter::new(client, base_url, api_key)?),
    })
}

/// Builds the configured adapters in priority order, sharing one HTTP client.
pub fn build_adapters(config: &AppConfig) -> Result<Vec<Arc<dyn ProviderAdapter>>, ProviderError> {
    if config.providers.is_empty() {
        return Ok(Vec::new());
    }
    let api_key = config
        .api_key
        .as_deref()
        .ok_or_else(|| ProviderError::InvalidConfig("missing provider API key".to_string()))?;
    let client = http_client(config.http_timeout())?;

    config
        .providers
        .iter()
        .map(|p| build_adapter(p.kind, client.clone(), &p.base_url, api_key))
        .collect()
}
