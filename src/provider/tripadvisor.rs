// Travel Advisor hotel list via RapidAPI. Listings arrive under `data[]`;
// sponsored placeholders without a `location_id` are skipped

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::{de, decode_envelope, normalize, ProviderAdapter, ProviderEndpoint, Query};
use crate::error::ProviderError;
use crate::listing::{CanonicalListing, ListingDraft, SearchRequest};

pub const NAME: &str = "tripadvisor";
const SEARCH_PATH: &str = "/hotels/list";

#[derive(Debug, Default, Deserialize)]
struct TripadvisorEnvelope {
    #[serde(default)]
    data: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TripadvisorHotel {
    #[serde(deserialize_with = "de::opt_string")]
    location_id: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    name: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    location_string: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    description: Option<String>,
    #[serde(deserialize_with = "de::lenient")]
    photo: Option<Photo>,
    #[serde(deserialize_with = "de::opt_f64")]
    rating: Option<f64>,
    #[serde(deserialize_with = "de::opt_decimal")]
    price: Option<Decimal>,
    #[serde(deserialize_with = "de::string_list")]
    amenities: Vec<String>,
    #[serde(deserialize_with = "de::opt_bool")]
    is_sponsored: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Photo {
    #[serde(deserialize_with = "de::lenient")]
    images: Option<PhotoImages>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PhotoImages {
    #[serde(deserialize_with = "de::lenient")]
    large: Option<Image>,
    #[serde(deserialize_with = "de::lenient")]
    medium: Option<Image>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Image {
    #[serde(deserialize_with = "de::opt_string")]
    url: Option<String>,
}

impl From<TripadvisorHotel> for ListingDraft {
    fn from(hotel: TripadvisorHotel) -> Self {
        let image_url = hotel
            .photo
            .and_then(|p| p.images)
            .and_then(|i| i.large.or(i.medium))
            .and_then(|img| img.url);

        ListingDraft {
            id: hotel.location_id,
            name: hotel.name,
            location: hotel.location_string,
            description: hotel.description,
            image_url,
            rating: hotel.rating,
            price_per_night: hotel.price,
            amenities: hotel.amenities,
            featured: hotel.is_sponsored,
        }
    }
}

pub struct TripadvisorAdapter {
    endpoint: ProviderEndpoint,
}

impl TripadvisorAdapter {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: ProviderEndpoint::rapidapi(client, base_url, SEARCH_PATH, api_key)?,
        })
    }
}

#[async_trait]
impl ProviderAdapter for TripadvisorAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn build_query(&self, request: &SearchRequest) -> Query {
        Query::new()
            .param("location", request.location())
            .param("checkin", request.check_in_param())
            .param("nights", request.nights())
            .param("adults", request.guest_count())
            .param("rooms", 1)
            .param("currency", "USD")
            .param("lang", "en_US")
            .param("limit", 30)
    }

    async fn invoke(&self, query: &Query) -> Result<Value, ProviderError> {
        self.endpoint.get_json(query).await
    }

    fn transform(&self, raw: Value) -> Result<Vec<CanonicalListing>, ProviderError> {
        let envelope: TripadvisorEnvelope = decode_envelope(raw)?;
        Ok(normalize::<TripadvisorHotel, _>(
            NAME,
            envelope.data.unwrap_or_default(),
            ListingDraft::from,
        ))
    }
}
