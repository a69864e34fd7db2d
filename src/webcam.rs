// src/webcam.rs

use crate::client::StationsClient;
use crate::error::StationError;
use crate::geopoint::GeoPoint;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Mean Earth radius used for great-circle distances, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A webcam as returned by the webcam directory service, before ranking.
///
/// Constructed fresh per request from the directory response and discarded
/// after the page is rendered; nothing here is persisted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WebcamCandidate {
    pub id: String,
    pub title: String,
    pub preview_url: Option<String>,
    /// Embeddable player URL, when the directory exposes one.
    pub embed_url: Option<String>,
    /// External page for the webcam (fallback when there is no embed).
    pub page_url: Option<String>,
    pub location: Option<GeoPoint>,
}

/// A [`WebcamCandidate`] annotated with its distance from the reference point.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RankedWebcam {
    #[serde(flatten)]
    pub candidate: WebcamCandidate,
    /// Great-circle distance to the reference point. `f64::INFINITY` marks a
    /// candidate without a usable location; such candidates never survive a
    /// finite-radius filter.
    pub distance_km: f64,
}

/// Great-circle distance between two points via the haversine formula,
/// in kilometers.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Ranks `candidates` by ascending distance from `reference` and keeps only
/// those within `radius_km`.
///
/// Candidates without a valid location get `distance_km = f64::INFINITY` and
/// are excluded for any finite radius. Ties keep their input order: the sort
/// is stable, and that ordering is part of the contract.
///
/// Pure and synchronous; inputs are consumed, not mutated in place.
///
/// # Errors
///
/// Returns [`StationError::InvalidReference`] when the reference point itself
/// is not a finite, in-range coordinate pair. Callers should present that as
/// "coordinates unavailable" rather than crash.
pub fn rank_by_proximity(
    reference: GeoPoint,
    candidates: Vec<WebcamCandidate>,
    radius_km: f64,
) -> Result<Vec<RankedWebcam>, StationError> {
    if !reference.is_valid() {
        return Err(StationError::InvalidReference(format!(
            "reference ({}, {}) is not a finite, in-range coordinate pair",
            reference.latitude, reference.longitude
        )));
    }

    let mut ranked: Vec<RankedWebcam> = candidates
        .into_iter()
        .map(|candidate| {
            let distance_km = match candidate.location {
                Some(loc) if loc.is_valid() => haversine_km(reference, loc),
                _ => f64::INFINITY,
            };
            RankedWebcam {
                candidate,
                distance_km,
            }
        })
        .collect();

    // Vec::sort_by is stable; equal distances keep input order.
    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked.retain(|r| r.distance_km.is_finite() && r.distance_km <= radius_km);

    Ok(ranked)
}

/// A latitude/longitude box of roughly `radius_km` around a center point,
/// used as the fallback directory query when the nearby query fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

pub fn bounding_box_around(center: GeoPoint, radius_km: f64) -> BoundingBox {
    let d_lat = radius_km / 110.574;
    let d_lon = radius_km / (111.320 * center.latitude.to_radians().cos());
    BoundingBox {
        min_lat: center.latitude - d_lat,
        min_lon: center.longitude - d_lon,
        max_lat: center.latitude + d_lat,
        max_lon: center.longitude + d_lon,
    }
}

// Wire shapes of the webcam directory (Windy v3 style). Everything is
// optional; the mapping below decides what a missing field means.

#[derive(Debug, Deserialize)]
struct DirectoryResponse {
    #[serde(default)]
    webcams: Vec<DirectoryWebcam>,
}

#[derive(Debug, Deserialize)]
struct DirectoryWebcam {
    #[serde(rename = "webcamId")]
    webcam_id: Option<Value>,
    id: Option<Value>,
    title: Option<String>,
    images: Option<DirectoryImages>,
    player: Option<DirectoryPlayer>,
    urls: Option<DirectoryUrls>,
    location: Option<DirectoryLocation>,
}

#[derive(Debug, Deserialize)]
struct DirectoryImages {
    current: Option<DirectoryImageSet>,
    daylight: Option<DirectoryImageSet>,
}

#[derive(Debug, Deserialize)]
struct DirectoryImageSet {
    preview: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectoryPlayer {
    day: Option<DirectoryEmbed>,
    lifetime: Option<DirectoryEmbed>,
    live: Option<DirectoryEmbed>,
}

#[derive(Debug, Deserialize)]
struct DirectoryEmbed {
    embed: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectoryUrls {
    current: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectoryLocation {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
}

// The directory sends numeric ids; older payloads sent strings.
fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl DirectoryWebcam {
    fn into_candidate(self) -> Option<WebcamCandidate> {
        let id = self
            .webcam_id
            .as_ref()
            .and_then(id_to_string)
            .or_else(|| self.id.as_ref().and_then(id_to_string))?;

        let location = self.location.as_ref().and_then(|loc| {
            match (loc.latitude, loc.longitude) {
                (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
                _ => None,
            }
        });

        let title = self
            .title
            .filter(|t| !t.is_empty())
            .or_else(|| self.location.as_ref().and_then(|loc| loc.city.clone()))
            .unwrap_or_else(|| "Webcam".to_string());

        let preview_url = self.images.and_then(|images| {
            images
                .current
                .as_ref()
                .and_then(|set| set.preview.clone())
                .or_else(|| images.daylight.as_ref().and_then(|set| set.preview.clone()))
                .or_else(|| images.current.as_ref().and_then(|set| set.icon.clone()))
        });

        let embed_url = self.player.and_then(|player| {
            player
                .day
                .and_then(|e| e.embed)
                .or_else(|| player.lifetime.and_then(|e| e.embed))
                .or_else(|| player.live.and_then(|e| e.embed))
        });

        let page_url = self.urls.and_then(|urls| urls.current);

        Some(WebcamCandidate {
            id,
            title,
            preview_url,
            embed_url,
            page_url,
            location,
        })
    }
}

impl StationsClient {
    /// Fetches webcam candidates around `center` from the webcam directory.
    ///
    /// The primary query asks the directory for webcams `nearby` the center;
    /// if that request fails for any reason, a bounding-box query over the
    /// same area is tried before giving up.
    ///
    /// Requires the webcams API key configured at client construction.
    pub async fn fetch_webcams(
        &self,
        center: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<WebcamCandidate>, StationError> {
        if !center.is_valid() {
            return Err(StationError::InvalidReference(format!(
                "center ({}, {}) is not a finite, in-range coordinate pair",
                center.latitude, center.longitude
            )));
        }

        let nearby = vec![(
            "nearby".to_string(),
            format!("{},{},{}", center.latitude, center.longitude, radius_km),
        )];
        match self.directory_query(&nearby).await {
            Ok(candidates) => Ok(candidates),
            Err(err) => {
                log::warn!(
                    "nearby webcam query failed ({}), falling back to bounding box",
                    err
                );
                let bb = bounding_box_around(center, radius_km);
                let bbox = vec![
                    ("westLon".to_string(), bb.min_lon.to_string()),
                    ("southLat".to_string(), bb.min_lat.to_string()),
                    ("eastLon".to_string(), bb.max_lon.to_string()),
                    ("northLat".to_string(), bb.max_lat.to_string()),
                ];
                self.directory_query(&bbox).await
            }
        }
    }

    /// Fetches webcams around `center` and ranks them by ascending distance,
    /// keeping only those within `radius_km`.
    pub async fn fetch_ranked_webcams(
        &self,
        center: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<RankedWebcam>, StationError> {
        let candidates = self.fetch_webcams(center, radius_km).await?;
        rank_by_proximity(center, candidates, radius_km)
    }

    async fn directory_query(
        &self,
        area_params: &[(String, String)],
    ) -> Result<Vec<WebcamCandidate>, StationError> {
        let api_key = self.webcams_api_key.as_deref().ok_or_else(|| {
            StationError::InvalidInput(
                "a webcams API key is required to query the webcam directory".to_string(),
            )
        })?;

        let mut params: Vec<(String, String)> = area_params.to_vec();
        params.push((
            "include".to_string(),
            "images,location,player,urls".to_string(),
        ));
        params.push(("lang".to_string(), "fr".to_string()));
        params.push(("limit".to_string(), "50".to_string()));

        let base = format!("{}/webcams", self.directory_url);
        let url = Url::parse_with_params(&base, &params)?;

        log::debug!("Webcam directory query: {}", url.as_str());

        let response = self
            .http_client
            .get(url)
            .header("X-WINDY-API-KEY", api_key)
            .send()
            .await
            .map_err(StationError::ReqwestError)?;

        let directory: DirectoryResponse = self
            ._send_and_process_response(response, "webcams")
            .await?;

        Ok(directory
            .webcams
            .into_iter()
            .filter_map(DirectoryWebcam::into_candidate)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cam(id: &str, location: Option<GeoPoint>) -> WebcamCandidate {
        WebcamCandidate {
            id: id.to_string(),
            title: format!("Webcam {id}"),
            preview_url: None,
            embed_url: None,
            page_url: None,
            location,
        }
    }

    #[test]
    fn haversine_zero_for_identical_points() {
        let p = GeoPoint::new(45.0, 6.0);
        assert!(haversine_km(p, p).abs() < 1e-9);
    }

    #[test]
    fn haversine_one_degree_latitude() {
        let d = haversine_km(GeoPoint::new(45.0, 6.0), GeoPoint::new(46.0, 6.0));
        // One degree of latitude on a 6371 km sphere is ~111.19 km.
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn ranks_and_filters_by_radius() {
        let reference = GeoPoint::new(45.0, 6.0);
        let candidates = vec![
            cam("c", Some(GeoPoint::new(46.0, 6.0))),
            cam("a", Some(GeoPoint::new(45.0, 6.0))),
            cam("b", Some(GeoPoint::new(45.1, 6.0))),
        ];

        let ranked = rank_by_proximity(reference, candidates, 50.0).expect("valid reference");

        let ids: Vec<&str> = ranked.iter().map(|r| r.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"], "c is ~111 km away and must be dropped");
        assert!(ranked[0].distance_km.abs() < 1e-9);
        assert!((ranked[1].distance_km - 11.1).abs() < 0.1);
    }

    #[test]
    fn output_is_sorted_non_decreasing() {
        let reference = GeoPoint::new(0.0, 0.0);
        let candidates = vec![
            cam("far", Some(GeoPoint::new(3.0, 0.0))),
            cam("near", Some(GeoPoint::new(0.5, 0.0))),
            cam("mid", Some(GeoPoint::new(1.5, 0.0))),
        ];

        let ranked = rank_by_proximity(reference, candidates, 1000.0).expect("valid reference");
        for pair in ranked.windows(2) {
            assert!(pair[0].distance_km <= pair[1].distance_km);
        }
    }

    #[test]
    fn ties_keep_input_order() {
        let reference = GeoPoint::new(45.0, 6.0);
        let same_spot = GeoPoint::new(45.1, 6.0);
        let candidates = vec![
            cam("first", Some(same_spot)),
            cam("second", Some(same_spot)),
        ];

        let ranked = rank_by_proximity(reference, candidates, 50.0).expect("valid reference");
        assert_eq!(ranked[0].candidate.id, "first");
        assert_eq!(ranked[1].candidate.id, "second");
    }

    #[test]
    fn missing_or_invalid_locations_never_appear() {
        let reference = GeoPoint::new(45.0, 6.0);
        let candidates = vec![
            cam("no-location", None),
            cam("bad-location", Some(GeoPoint::new(f64::NAN, 6.0))),
            cam("ok", Some(GeoPoint::new(45.0, 6.0))),
        ];

        let ranked =
            rank_by_proximity(reference, candidates, f64::MAX).expect("valid reference");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate.id, "ok");
    }

    #[test]
    fn zero_radius_keeps_only_exact_matches() {
        let reference = GeoPoint::new(45.0, 6.0);
        let candidates = vec![
            cam("exact", Some(reference)),
            cam("nearby", Some(GeoPoint::new(45.001, 6.0))),
        ];

        let ranked = rank_by_proximity(reference, candidates, 0.0).expect("valid reference");
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].candidate.id, "exact");
    }

    #[test]
    fn empty_input_is_empty_output() {
        let ranked = rank_by_proximity(GeoPoint::new(45.0, 6.0), Vec::new(), 30.0)
            .expect("valid reference");
        assert!(ranked.is_empty());
    }

    #[test]
    fn invalid_reference_is_an_error() {
        let err = rank_by_proximity(GeoPoint::new(f64::NAN, 6.0), Vec::new(), 30.0)
            .expect_err("NaN reference must fail");
        assert!(matches!(err, StationError::InvalidReference(_)));
    }

    #[test]
    fn bounding_box_is_symmetric_around_center() {
        let center = GeoPoint::new(45.0, 6.0);
        let bb = bounding_box_around(center, 30.0);
        assert!((bb.max_lat - center.latitude - (center.latitude - bb.min_lat)).abs() < 1e-12);
        assert!(bb.min_lat < center.latitude && center.latitude < bb.max_lat);
        assert!(bb.min_lon < center.longitude && center.longitude < bb.max_lon);
    }

    #[test]
    fn directory_mapping_follows_preview_and_embed_fallbacks() {
        let payload = json!({
            "webcams": [
                {
                    "webcamId": 1577,
                    "title": "Col du Galibier",
                    "images": { "current": { "preview": "https://img/preview.jpg", "icon": "https://img/icon.jpg" } },
                    "player": { "day": { "embed": "https://player/day" } },
                    "urls": { "current": "https://page/1577" },
                    "location": { "latitude": 45.06, "longitude": 6.40, "city": "Valloire" }
                },
                {
                    "id": "legacy-42",
                    "images": { "daylight": { "preview": "https://img/daylight.jpg" } },
                    "player": { "live": { "embed": "https://player/live" } },
                    "location": { "city": "Serre Chevalier" }
                },
                {
                    "title": "No id, dropped"
                }
            ]
        });

        let parsed: DirectoryResponse = serde_json::from_value(payload).expect("directory json");
        let candidates: Vec<WebcamCandidate> = parsed
            .webcams
            .into_iter()
            .filter_map(DirectoryWebcam::into_candidate)
            .collect();

        assert_eq!(candidates.len(), 2);

        assert_eq!(candidates[0].id, "1577");
        assert_eq!(candidates[0].title, "Col du Galibier");
        assert_eq!(candidates[0].preview_url.as_deref(), Some("https://img/preview.jpg"));
        assert_eq!(candidates[0].embed_url.as_deref(), Some("https://player/day"));
        assert_eq!(candidates[0].page_url.as_deref(), Some("https://page/1577"));
        assert_eq!(candidates[0].location, Some(GeoPoint::new(45.06, 6.40)));

        assert_eq!(candidates[1].id, "legacy-42");
        assert_eq!(candidates[1].title, "Serre Chevalier", "city is the title fallback");
        assert_eq!(candidates[1].preview_url.as_deref(), Some("https://img/daylight.jpg"));
        assert_eq!(candidates[1].embed_url.as_deref(), Some("https://player/live"));
        assert_eq!(candidates[1].location, None, "city alone is not a location");
    }
}
