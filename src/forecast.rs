// src/forecast.rs

use crate::client::StationsClient;
use crate::error::StationError;
use crate::geopoint::GeoPoint;

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Current conditions at the station.
///
/// `weather_code` is the forecast service's numeric condition taxonomy
/// (WMO codes); mapping codes to labels and icons is a presentation concern.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct CurrentConditions {
    pub temperature_c: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub weather_code: Option<i64>,
}

/// One day of forecast, normalized for the snow widget.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DayForecast {
    pub date: Option<String>,
    pub t_min_c: Option<f64>,
    pub t_max_c: Option<f64>,
    pub snowfall_cm: Option<f64>,
    pub snow_depth_cm: Option<f64>,
    pub precipitation_mm: Option<f64>,
}

/// Normalized forecast payload: current conditions, today, and the next
/// three days.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SkiForecast {
    pub updated_at: DateTime<Utc>,
    pub current: CurrentConditions,
    pub today: DayForecast,
    pub next_days: Vec<DayForecast>,
}

// Wire shapes of the forecast service (Open-Meteo style).

#[derive(Debug, Deserialize, Default)]
pub(crate) struct ForecastResponse {
    current_weather: Option<WireCurrentWeather>,
    daily: Option<WireDaily>,
}

#[derive(Debug, Deserialize)]
struct WireCurrentWeather {
    temperature: Option<f64>,
    windspeed: Option<f64>,
    winddirection: Option<f64>,
    weathercode: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
struct WireDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    snowfall_sum: Vec<Option<f64>>,
    #[serde(default)]
    snow_depth_max: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
}

impl WireDaily {
    fn day(&self, idx: usize) -> DayForecast {
        fn at(v: &[Option<f64>], idx: usize) -> Option<f64> {
            v.get(idx).copied().flatten()
        }
        DayForecast {
            date: self.time.get(idx).cloned(),
            t_min_c: at(&self.temperature_2m_min, idx),
            t_max_c: at(&self.temperature_2m_max, idx),
            snowfall_cm: at(&self.snowfall_sum, idx),
            snow_depth_cm: at(&self.snow_depth_max, idx),
            precipitation_mm: at(&self.precipitation_sum, idx),
        }
    }
}

impl ForecastResponse {
    pub(crate) fn normalize(self, updated_at: DateTime<Utc>) -> SkiForecast {
        let current = match self.current_weather {
            Some(now) => CurrentConditions {
                temperature_c: now.temperature,
                wind_speed_kmh: now.windspeed,
                wind_direction_deg: now.winddirection,
                weather_code: now.weathercode,
            },
            None => CurrentConditions::default(),
        };

        let daily = self.daily.unwrap_or_default();
        let today = daily.day(0);
        // Days 1 through 3, as many as the service returned.
        let next_days = (1..daily.time.len().min(4)).map(|i| daily.day(i)).collect();

        SkiForecast {
            updated_at,
            current,
            today,
            next_days,
        }
    }
}

impl StationsClient {
    /// Fetches current conditions and a multi-day snow forecast for a point.
    ///
    /// # Errors
    ///
    /// [`StationError::InvalidReference`] when the point is not a finite,
    /// in-range coordinate pair; API and transport failures propagate as-is.
    pub async fn fetch_forecast(&self, point: GeoPoint) -> Result<SkiForecast, StationError> {
        if !point.is_valid() {
            return Err(StationError::InvalidReference(format!(
                "forecast point ({}, {}) is not a finite, in-range coordinate pair",
                point.latitude, point.longitude
            )));
        }

        let params = [
            ("latitude", point.latitude.to_string()),
            ("longitude", point.longitude.to_string()),
            ("current_weather", "true".to_string()),
            ("timezone", "auto".to_string()),
            (
                "hourly",
                "temperature_2m,snowfall,snow_depth,wind_speed_10m,precipitation".to_string(),
            ),
            (
                "daily",
                "temperature_2m_max,temperature_2m_min,snowfall_sum,snow_depth_max,precipitation_sum"
                    .to_string(),
            ),
        ];
        let url = Url::parse_with_params(&self.forecast_url, &params)?;

        log::debug!("Forecast query: {}", url.as_str());

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(StationError::ReqwestError)?;

        let wire: ForecastResponse = self
            ._send_and_process_response(response, "forecast")
            .await?;

        Ok(wire.normalize(Utc::now()))
    }
}
