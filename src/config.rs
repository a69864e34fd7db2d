// src/config.rs

use crate::client::StationsClient;
use crate::error::StationError;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-station widget configuration, the one explicit schema for everything
/// the admin UI edits.
///
/// Defaulting happens in a single merge-with-defaults step: every section
/// carries `#[serde(default)]`, so a partial (or empty) stored document
/// deserializes into the same shape as [`WidgetsConfig::default`] with only
/// the stored sections overridden. Consumers never fall back per field.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct WidgetsConfig {
    #[serde(rename = "stationSlug", default)]
    pub station_slug: String,
    #[serde(default)]
    pub pistes: PistesWidget,
    #[serde(default)]
    pub meteo: MeteoWidget,
    #[serde(default)]
    pub description: DescriptionWidget,
    #[serde(default)]
    pub forfaits: ForfaitsWidget,
    #[serde(default)]
    pub webcams: WebcamsWidget,
    #[serde(default)]
    pub snow: SnowWidget,
    #[serde(default)]
    pub snowpark: SnowparkWidget,
}

/// Piste map block: a small inline image plus a large one for the modal.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PistesWidget {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "smallMapUrl", default)]
    pub small_map_url: Option<String>,
    #[serde(rename = "largeMapUrl", default)]
    pub large_map_url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MeteoWidget {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "iframeUrl", default)]
    pub iframe_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DescriptionWidget {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(rename = "metaTitle", default)]
    pub meta_title: Option<String>,
    #[serde(rename = "metaDescription", default)]
    pub meta_description: Option<String>,
}

/// A lift-pass offer ("forfait") row.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ForfaitItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ForfaitsWidget {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub items: Vec<ForfaitItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WebcamsWidget {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "radiusKm", default = "default_webcam_radius")]
    pub radius_km: f64,
}

impl Default for WebcamsWidget {
    fn default() -> Self {
        WebcamsWidget {
            enabled: false,
            radius_km: default_webcam_radius(),
        }
    }
}

fn default_webcam_radius() -> f64 {
    30.0
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SnowWidget {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "iframeUrl", default)]
    pub iframe_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SnowparkWidget {
    #[serde(default)]
    pub enabled: bool,
    #[serde(rename = "mapUrl", default)]
    pub map_url: Option<String>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl WidgetsConfig {
    /// The merge-with-defaults step: parses a stored document, tolerating any
    /// missing section, and stamps the slug the config belongs to.
    pub fn from_stored(slug: &str, stored: Value) -> Result<Self, StationError> {
        let mut cfg: WidgetsConfig = serde_json::from_value(stored)?;
        cfg.station_slug = slug.to_string();
        Ok(cfg)
    }

    fn empty_for(slug: &str) -> Self {
        WidgetsConfig {
            station_slug: slug.to_string(),
            ..WidgetsConfig::default()
        }
    }
}

impl StationsClient {
    /// Fetches the widget configuration for a station
    /// (`GET /api/admin/stations/{slug}/widgets`).
    ///
    /// A station with nothing stored yet (204 or 404) yields the default
    /// config rather than an error.
    pub async fn fetch_widgets(&self, slug: &str) -> Result<WidgetsConfig, StationError> {
        if slug.is_empty() {
            return Err(StationError::InvalidInput(
                "slug cannot be empty for fetch_widgets".to_string(),
            ));
        }

        let endpoint = format!("api/admin/stations/{}/widgets", slug);
        let response = self
            ._request_raw(Method::GET, &endpoint, None::<&Value>)
            .await?;

        let status = response.status().as_u16();
        if status == 204 || status == 404 {
            log::debug!("no widgets stored for '{}', using defaults", slug);
            return Ok(WidgetsConfig::empty_for(slug));
        }

        let stored: Value = self._send_and_process_response(response, &endpoint).await?;
        WidgetsConfig::from_stored(slug, stored)
    }

    /// Saves the widget configuration for a station
    /// (`PUT /api/admin/stations/{slug}/widgets`).
    pub async fn save_widgets(
        &self,
        slug: &str,
        config: &WidgetsConfig,
    ) -> Result<(), StationError> {
        if slug.is_empty() {
            return Err(StationError::InvalidInput(
                "slug cannot be empty for save_widgets".to_string(),
            ));
        }

        let endpoint = format!("api/admin/stations/{}/widgets", slug);
        let response = self
            ._request_raw(Method::PUT, &endpoint, Some(config))
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            Err(StationError::from_response(status.as_u16(), body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_merges_to_defaults() {
        let cfg = WidgetsConfig::from_stored("val-pelens", json!({})).expect("empty doc parses");
        assert_eq!(cfg.station_slug, "val-pelens");
        assert!(!cfg.pistes.enabled);
        assert!(cfg.forfaits.items.is_empty());
        assert_eq!(cfg.webcams.radius_km, 30.0);
    }

    #[test]
    fn partial_document_overrides_only_named_sections() {
        let cfg = WidgetsConfig::from_stored(
            "val-pelens",
            json!({
                "stationSlug": "stale-slug",
                "pistes": { "enabled": true, "largeMapUrl": "https://cdn/plan.jpg" },
                "webcams": { "enabled": true, "radiusKm": 45.0 }
            }),
        )
        .expect("partial doc parses");

        assert_eq!(cfg.station_slug, "val-pelens", "slug is always restamped");
        assert!(cfg.pistes.enabled);
        assert_eq!(cfg.pistes.large_map_url.as_deref(), Some("https://cdn/plan.jpg"));
        assert_eq!(cfg.pistes.small_map_url, None);
        assert_eq!(cfg.webcams.radius_km, 45.0);
        // Untouched sections stay at their defaults.
        assert_eq!(cfg.snowpark, SnowparkWidget::default());
        assert!(!cfg.meteo.enabled);
    }

    #[test]
    fn round_trips_through_wire_names() {
        let mut cfg = WidgetsConfig::empty_for("val-pelens");
        cfg.pistes.small_map_url = Some("https://cdn/plan-small.jpg".to_string());

        let value = serde_json::to_value(&cfg).expect("serializes");
        assert_eq!(value["stationSlug"], "val-pelens");
        assert_eq!(value["pistes"]["smallMapUrl"], "https://cdn/plan-small.jpg");
    }
}
