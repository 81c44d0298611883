// Search input and the canonical listing every provider is normalized into

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_RATING: f64 = 4.5;
pub const MAX_RATING: f64 = 5.0;
pub const DEFAULT_PRICE_PER_NIGHT: i64 = 299;
pub const DEFAULT_AMENITY: &str = "Standard Amenities";
pub const FALLBACK_IMAGE_URL: &str = "/images/hotel-placeholder.jpg";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A validated hotel search. Built once by the caller and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    location: String,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guest_count: u32,
}

impl SearchRequest {
    /// Parses `YYYY-MM-DD` dates and validates the request.
    pub fn new(
        location: impl Into<String>,
        check_in: &str,
        check_out: &str,
        guest_count: u32,
    ) -> Result<Self, ValidationError> {
        let location = location.into().trim().to_string();
        if location.is_empty() {
            return Err(ValidationError::new("location", "must not be blank"));
        }

        let check_in = parse_date("check_in", check_in)?;
        let check_out = parse_date("check_out", check_out)?;
        if check_out <= check_in {
            return Err(ValidationError::new(
                "check_out",
                format!("must be after check-in {check_in}"),
            ));
        }

        if guest_count < 1 {
            return Err(ValidationError::new("guest_count", "must be at least 1"));
        }

        Ok(Self {
            location,
            check_in,
            check_out,
            guest_count,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn guest_count(&self) -> u32 {
        self.guest_count
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn check_in_param(&self) -> String {
        self.check_in.format(DATE_FORMAT).to_string()
    }

    pub fn check_out_param(&self) -> String {
        self.check_out.format(DATE_FORMAT).to_string()
    }
}

fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| ValidationError::new(field, format!("expected YYYY-MM-DD, got {raw:?}: {e}")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalListing {
    pub id: String,
    pub name: String,
    pub location: String,
    pub description: String,
    pub image_url: String,
    pub rating: f64,
    pub price_per_night: Decimal,
    pub amenities: BTreeSet<String>,
    pub featured: bool,
}

/// Provider-neutral partial record produced by an adapter before defaults apply.
///
/// Adapters fill in what their payload carries and call [`ListingDraft::finish`];
/// nothing else in the crate constructs a [`CanonicalListing`] field by field.
#[derive(Debug, Clone, Default)]
pub struct ListingDraft {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
    pub price_per_night: Option<Decimal>,
    pub amenities: Vec<String>,
    pub featured: Option<bool>,
}

impl ListingDraft {
    /// Applies field defaults. Returns `None` when `id` or `name` is missing or blank.
    pub fn finish(self) -> Option<CanonicalListing> {
        let id = non_blank(self.id)?;
        let name = non_blank(self.name)?;

        let rating = self
            .rating
            .filter(|r| r.is_finite())
            .map(|r| r.clamp(0.0, MAX_RATING))
            .unwrap_or(DEFAULT_RATING);

        let price_per_night = self
            .price_per_night
            .filter(|p| !p.is_sign_negative())
            .unwrap_or_else(|| Decimal::from(DEFAULT_PRICE_PER_NIGHT));

        let mut amenities: BTreeSet<String> = self
            .amenities
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        if amenities.is_empty() {
            amenities.insert(DEFAULT_AMENITY.to_string());
        }

        Some(CanonicalListing {
            id,
            name,
            location: non_blank(self.location).unwrap_or_default(),
            description: non_blank(self.description).unwrap_or_default(),
            image_url: non_blank(self.image_url).unwrap_or_else(|| FALLBACK_IMAGE_URL.to_string()),
            rating,
            price_per_night,
            amenities,
            featured: self.featured.unwrap_or(false),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ListingDraft {
        ListingDraft {
            id: Some("h-1".into()),
            name: Some("Harbour View".into()),
            ..Default::default()
        }
    }

    #[test]
    fn search_request_accepts_valid_input() {
        let req = SearchRequest::new(" Lisbon ", "2025-06-01", "2025-06-04", 2).unwrap();
        assert_eq!(req.location(), "Lisbon");
        assert_eq!(req.nights(), 3);
        assert_eq!(req.check_in_param(), "2025-06-01");
        assert_eq!(req.check_out_param(), "2025-06-04");
    }

    #[test]
    fn search_request_rejects_zero_guests() {
        let err = SearchRequest::new("Lisbon", "2025-06-01", "2025-06-04", 0).unwrap_err();
        assert_eq!(err.field, "guest_count");
        assert!(err.to_string().starts_with("validation failed"));
    }

    #[test]
    fn search_request_rejects_inverted_dates() {
        let err = SearchRequest::new("Lisbon", "2025-06-04", "2025-06-04", 1).unwrap_err();
        assert_eq!(err.field, "check_out");
    }

    #[test]
    fn search_request_rejects_bad_date_and_blank_location() {
        assert_eq!(
            SearchRequest::new("Lisbon", "06/01/2025", "2025-06-04", 1)
                .unwrap_err()
                .field,
            "check_in"
        );
        assert_eq!(
            SearchRequest::new("  ", "2025-06-01", "2025-06-04", 1)
                .unwrap_err()
                .field,
            "location"
        );
    }

    #[test]
    fn finish_applies_defaults() {
        let listing = draft().finish().unwrap();
        assert_eq!(listing.rating, DEFAULT_RATING);
        assert_eq!(listing.price_per_night, Decimal::from(299));
        assert_eq!(
            listing.amenities.into_iter().collect::<Vec<_>>(),
            vec![DEFAULT_AMENITY.to_string()]
        );
        assert_eq!(listing.image_url, FALLBACK_IMAGE_URL);
        assert_eq!(listing.location, "");
        assert!(!listing.featured);
    }

    #[test]
    fn finish_drops_records_without_id_or_name() {
        let no_id = ListingDraft {
            id: None,
            ..draft()
        };
        let blank_name = ListingDraft {
            name: Some("   ".into()),
            ..draft()
        };
        assert!(no_id.finish().is_none());
        assert!(blank_name.finish().is_none());
    }

    #[test]
    fn finish_clamps_rating_and_rejects_negative_price() {
        let listing = ListingDraft {
            rating: Some(7.2),
            price_per_night: Some(Decimal::from(-10)),
            ..draft()
        }
        .finish()
        .unwrap();
        assert_eq!(listing.rating, MAX_RATING);
        assert_eq!(listing.price_per_night, Decimal::from(DEFAULT_PRICE_PER_NIGHT));
    }

    #[test]
    fn finish_deduplicates_amenities() {
        let listing = ListingDraft {
            amenities: vec!["Pool".into(), " Pool ".into(), "".into(), "Wifi".into()],
            ..draft()
        }
        .finish()
        .unwrap();
        assert_eq!(listing.amenities.len(), 2);
        assert!(listing.amenities.contains("Wifi"));
    }
}
