// Hotels.com property search via RapidAPI. Listings arrive under `properties[]`
// with camelCase keys and deeply nested price/image/review objects

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::{de, decode_envelope, normalize, ProviderAdapter, ProviderEndpoint, Query};
use crate::error::ProviderError;
use crate::listing::{CanonicalListing, ListingDraft, SearchRequest};

pub const NAME: &str = "hotels";
const SEARCH_PATH: &str = "/v2/hotels/search";

#[derive(Debug, Default, Deserialize)]
struct HotelsEnvelope {
    #[serde(default)]
    properties: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HotelsProperty {
    #[serde(deserialize_with = "de::opt_string")]
    id: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    name: Option<String>,
    #[serde(deserialize_with = "de::lenient")]
    neighborhood: Option<Named>,
    #[serde(deserialize_with = "de::opt_string")]
    tagline: Option<String>,
    #[serde(deserialize_with = "de::lenient")]
    property_image: Option<PropertyImage>,
    #[serde(deserialize_with = "de::lenient")]
    reviews: Option<Reviews>,
    #[serde(deserialize_with = "de::lenient")]
    price: Option<Price>,
    #[serde(deserialize_with = "de::string_list")]
    amenities: Vec<String>,
    #[serde(deserialize_with = "de::opt_bool")]
    featured: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Named {
    #[serde(deserialize_with = "de::opt_string")]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PropertyImage {
    #[serde(deserialize_with = "de::lenient")]
    image: Option<ImageRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageRef {
    #[serde(deserialize_with = "de::opt_string")]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Reviews {
    // 0-10 scale
    #[serde(deserialize_with = "de::opt_f64")]
    score: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Price {
    #[serde(deserialize_with = "de::lenient")]
    lead: Option<LeadPrice>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LeadPrice {
    #[serde(deserialize_with = "de::opt_decimal")]
    amount: Option<Decimal>,
}

impl From<HotelsProperty> for ListingDraft {
    fn from(property: HotelsProperty) -> Self {
        ListingDraft {
            id: property.id,
            name: property.name,
            location: property.neighborhood.and_then(|n| n.name),
            description: property.tagline,
            image_url: property
                .property_image
                .and_then(|p| p.image)
                .and_then(|i| i.url),
            rating: property
                .reviews
                .and_then(|r| r.score)
                .map(|score| score / 2.0),
            price_per_night: property
                .price
                .and_then(|p| p.lead)
                .and_then(|l| l.amount),
            amenities: property.amenities,
            featured: property.featured,
        }
    }
}

pub struct HotelsAdapter {
    endpoint: ProviderEndpoint,
}

impl HotelsAdapter {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: ProviderEndpoint::rapidapi(client, base_url, SEARCH_PATH, api_key)?,
        })
    }
}

#[async_trait]
impl ProviderAdapter for HotelsAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn build_query(&self, request: &SearchRequest) -> Query {
        Query::new()
            .param("destination", request.location())
            .param("checkIn", request.check_in_param())
            .param("checkOut", request.check_out_param())
            .param("adults", request.guest_count())
            .param("currency", "USD")
            .param("locale", "en_US")
            .param("sort", "RECOMMENDED")
    }

    async fn invoke(&self, query: &Query) -> Result<Value, ProviderError> {
        self.endpoint.get_json(query).await
    }

    fn transform(&self, raw: Value) -> Result<Vec<CanonicalListing>, ProviderError> {
        let envelope: HotelsEnvelope = decode_envelope(raw)?;
        Ok(normalize::<HotelsProperty, _>(
            NAME,
            envelope.properties.unwrap_or_default(),
            ListingDraft::from,
        ))
    }
}
