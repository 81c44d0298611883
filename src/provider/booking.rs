// Booking.com search via RapidAPI. Listings arrive under `result[]`

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::{de, decode_envelope, normalize, ProviderAdapter, ProviderEndpoint, Query};
use crate::error::ProviderError;
use crate::listing::{CanonicalListing, ListingDraft, SearchRequest};

pub const NAME: &str = "booking";
const SEARCH_PATH: &str = "/v1/hotels/search";

#[derive(Debug, Default, Deserialize)]
struct BookingEnvelope {
    #[serde(default)]
    result: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BookingHotel {
    #[serde(deserialize_with = "de::opt_string")]
    hotel_id: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    hotel_name: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    city: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    address: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    unit_configuration_label: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    max_photo_url: Option<String>,
    #[serde(deserialize_with = "de::opt_string")]
    main_photo_url: Option<String>,
    // 0-10 scale
    #[serde(deserialize_with = "de::opt_f64")]
    review_score: Option<f64>,
    #[serde(deserialize_with = "de::lenient")]
    composite_price_breakdown: Option<PriceBreakdown>,
    #[serde(deserialize_with = "de::string_list")]
    hotel_facilities: Vec<String>,
    #[serde(deserialize_with = "de::opt_bool")]
    is_genius_deal: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PriceBreakdown {
    #[serde(deserialize_with = "de::lenient")]
    gross_amount_per_night: Option<Amount>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Amount {
    #[serde(deserialize_with = "de::opt_decimal")]
    value: Option<Decimal>,
}

impl From<BookingHotel> for ListingDraft {
    fn from(hotel: BookingHotel) -> Self {
        ListingDraft {
            id: hotel.hotel_id,
            name: hotel.hotel_name,
            location: hotel.city.or(hotel.address),
            description: hotel.unit_configuration_label,
            image_url: hotel.max_photo_url.or(hotel.main_photo_url),
            rating: hotel.review_score.map(|score| score / 2.0),
            price_per_night: hotel
                .composite_price_breakdown
                .and_then(|b| b.gross_amount_per_night)
                .and_then(|a| a.value),
            amenities: hotel.hotel_facilities,
            featured: hotel.is_genius_deal,
        }
    }
}

pub struct BookingAdapter {
    endpoint: ProviderEndpoint,
}

impl BookingAdapter {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            endpoint: ProviderEndpoint::rapidapi(client, base_url, SEARCH_PATH, api_key)?,
        })
    }
}

#[async_trait]
impl ProviderAdapter for BookingAdapter {
    fn name(&self) -> &str {
        NAME
    }

    fn build_query(&self, request: &SearchRequest) -> Query {
        Query::new()
            .param("dest_type", "city")
            .param("name", request.location())
            .param("checkin_date", request.check_in_param())
            .param("checkout_date", request.check_out_param())
            .param("adults_number", request.guest_count())
            .param("room_number", 1)
            .param("order_by", "popularity")
            .param("filter_by_currency", "USD")
            .param("locale", "en-gb")
            .param("units", "metric")
    }

    async fn invoke(&self, query: &Query) -> Result<Value, ProviderError> {
        self.endpoint.get_json(query).await
    }

    fn transform(&self, raw: Value) -> Result<Vec<CanonicalListing>, ProviderError> {
        let envelope: BookingEnvelope = decode_envelope(raw)?;
        Ok(normalize::<BookingHotel, _>(
            NAME,
            envelope.result.unwrap_or_default(),
            ListingDraft::from,
        ))
    }
}
