use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::fetch::{BasicClient, HttpClient, WithHeader, fetch_bytes};
use crate::geo::Coordinates;
use crate::location::provider::{Address, ReverseGeocoder};

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

const USER_AGENT: &str = concat!("telesignal/", env!("CARGO_PKG_VERSION"));

/// Reverse geocoder backed by an OSM Nominatim-compatible endpoint.
pub struct NominatimGeocoder<C> {
    client: C,
    base_url: String,
}

impl NominatimGeocoder<WithHeader<BasicClient>> {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = WithHeader::user_agent(BasicClient::with_timeout(timeout)?, USER_AGENT)?;
        Ok(Self::with_client(client, base_url))
    }
}

impl<C: HttpClient> NominatimGeocoder<C> {
    pub fn with_client(client: C, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> ReverseGeocoder for NominatimGeocoder<C> {
    async fn reverse(&self, coords: Coordinates) -> Result<Address> {
        let url = format!(
            "{}/reverse?format=json&lat={}&lon={}&zoom=10&addressdetails=1",
            self.base_url, coords.latitude, coords.longitude
        );

        let bytes = fetch_bytes(&self.client, &url)
            .await
            .context("reverse geocoding request failed")?;
        let json: Value =
            serde_json::from_slice(&bytes).context("failed to parse reverse geocoding response")?;

        let address = parse_address(&json)?;
        debug!(city = ?address.city, pincode = ?address.pincode, "Reverse geocoded");
        Ok(address)
    }
}

/// Extracts address components from a Nominatim `reverse` response. The
/// city falls back through town, village, and suburb.
pub fn parse_address(json: &Value) -> Result<Address> {
    let address = json
        .get("address")
        .and_then(Value::as_object)
        .ok_or_else(|| anyhow::anyhow!("unable to determine location from coordinates"))?;

    let text = |key: &str| {
        address
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    Ok(Address {
        city: ["city", "town", "village", "suburb"].iter().find_map(|k| text(k)),
        state: text("state"),
        pincode: text("postcode"),
        country: text("country"),
        district: text("state_district"),
        display_name: json.get("display_name").and_then(Value::as_str).map(str::to_string),
    })
}
