// src/geocode.rs

use crate::client::StationsClient;
use crate::error::StationError;
use crate::geopoint::GeoPoint;

use reqwest::Url;
use serde_json::Value;

// GeoJSON stores coordinates as [longitude, latitude]; the first feature is
// the geocoder's best match.
fn first_feature_point(response: &Value) -> Option<GeoPoint> {
    let coords = &response["features"][0]["geometry"]["coordinates"];
    let lat = coords[1].as_f64()?;
    let lon = coords[0].as_f64()?;
    let point = GeoPoint::new(lat, lon);
    point.is_valid().then_some(point)
}

impl StationsClient {
    /// Geocodes a free-text place name to a coordinate pair.
    ///
    /// Returns `Ok(None)` when the geocoder has no match; only transport and
    /// service failures are errors. Used when a resort record lacks stored
    /// coordinates.
    pub async fn geocode(&self, place: &str) -> Result<Option<GeoPoint>, StationError> {
        let place = place.trim();
        if place.is_empty() {
            return Err(StationError::InvalidInput(
                "place cannot be empty for geocode".to_string(),
            ));
        }

        let params = [("q", place), ("format", "geojson")];
        let url = Url::parse_with_params(&self.geocoder_url, &params)?;

        log::debug!("Geocoding query: {}", url.as_str());

        // The client's default headers already carry the descriptive
        // User-Agent the geocoding service's usage policy asks for.
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(StationError::ReqwestError)?;

        let body: Value = self._send_and_process_response(response, "geocode").await?;
        Ok(first_feature_point(&body))
    }
}
