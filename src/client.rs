// src/client.rs

use crate::error::StationError;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, Response as HttpResponse, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Default public endpoint of the webcam directory service.
pub const DEFAULT_DIRECTORY_URL: &str = "https://api.windy.com/webcams/api/v3";
/// Default public endpoint of the forecast service.
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
/// Default public endpoint of the geocoding service.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";

const USER_AGENT_VALUE: &str = concat!("stations-rs/", env!("CARGO_PKG_VERSION"));

/// The main client for interacting with the resort API and the third-party
/// services a station page consumes (webcam directory, forecast, geocoder,
/// storage credential issuer).
///
/// `StationsClient` holds the resort-API base URL, the optional webcam
/// directory API key and an underlying `reqwest::Client` for HTTP
/// communication. It is cheap to clone; clones share the same connection
/// pool, and independent calls on clones are fully independent.
///
/// # Initialization
///
/// ```rust,no_run
/// use stations_rs::StationsClient;
/// # use stations_rs::StationError;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), StationError> {
/// let client = StationsClient::new("http://127.0.0.1:5001", Some("myWebcamsApiKey"))?;
///
/// let resorts = client.list_resorts(Some("val")).await?;
/// println!("{} resorts matched", resorts.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StationsClient {
    /// Base URL of the resort API, normalized (scheme present, no trailing slash).
    pub api_url: String,
    pub(crate) webcams_api_key: Option<String>,
    pub(crate) directory_url: String,
    pub(crate) forecast_url: String,
    pub(crate) geocoder_url: String,
    pub(crate) http_client: Client,
}

impl StationsClient {
    /// Creates a new `StationsClient`.
    ///
    /// # Arguments
    ///
    /// * `api_url`: The base URL of the resort API (e.g. `"http://127.0.0.1:5001"`).
    ///   The client normalizes it: a missing scheme defaults to `http://`, and a
    ///   trailing slash is removed.
    /// * `webcams_api_key`: Optional API key for the webcam directory service.
    ///   Required only by [`fetch_webcams`](StationsClient::fetch_webcams) and
    ///   [`fetch_ranked_webcams`](StationsClient::fetch_ranked_webcams).
    ///
    /// # Returns
    ///
    /// A `Result` containing the new `StationsClient`, or a `StationError` if the
    /// URL cannot be used as a base or the HTTP client cannot be built.
    pub fn new(api_url: &str, webcams_api_key: Option<&str>) -> Result<Self, StationError> {
        let mut temp_url_string = api_url.to_string();

        // Ensure scheme is present
        if !temp_url_string.starts_with("http://") && !temp_url_string.starts_with("https://") {
            temp_url_string = format!("http://{}", temp_url_string);
        }

        let parsed_api_url = Url::parse(&temp_url_string)?;

        if parsed_api_url.cannot_be_a_base() {
            return Err(StationError::SdkError(format!(
                "The api_url '{}' (after ensuring scheme) resolved to '{}', which cannot be a base URL. Please provide a full base URL (e.g., http://127.0.0.1:5001).",
                api_url, parsed_api_url
            )));
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT_VALUE),
        );

        let http_client = Client::builder()
            .default_headers(default_headers)
            .build()
            .map_err(StationError::ReqwestError)?;

        let final_api_url = parsed_api_url.as_str().trim_end_matches('/').to_string();

        log::debug!("StationsClient initialized with api_url: {}", final_api_url);

        Ok(Self {
            api_url: final_api_url,
            webcams_api_key: webcams_api_key.map(|s| s.to_string()),
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            http_client,
        })
    }

    /// Overrides the webcam directory endpoint (self-hosted proxy or test stub).
    pub fn with_directory_url(mut self, url: &str) -> Self {
        self.directory_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Overrides the forecast service endpoint.
    pub fn with_forecast_url(mut self, url: &str) -> Self {
        self.forecast_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Overrides the geocoding service endpoint.
    pub fn with_geocoder_url(mut self, url: &str) -> Self {
        self.geocoder_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Builds an absolute URL for a resort-API endpoint relative to `api_url`.
    pub(crate) fn endpoint_url(&self, endpoint: &str) -> Result<Url, StationError> {
        let full = format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    /// Sends a request to the resort API and deserializes the JSON response.
    ///
    /// Success responses are deserialized into `R`; failure responses are
    /// surfaced as [`StationError::ApiError`] with whatever `error`/`detail`
    /// message the body carried.
    pub(crate) async fn _request<T, R>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&T>,
    ) -> Result<R, StationError>
    where
        T: Serialize + Send + Sync + ?Sized,
        R: DeserializeOwned + Send + 'static,
    {
        let response = self._request_raw(method, endpoint, body).await?;
        self._send_and_process_response(response, endpoint).await
    }

    /// Sends a request to the resort API and returns the raw response.
    ///
    /// Used by callers that need to inspect the status themselves (e.g. the
    /// widget config fetch, where 204/404 means "no config stored yet").
    pub(crate) async fn _request_raw<T>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&T>,
    ) -> Result<HttpResponse, StationError>
    where
        T: Serialize + Send + Sync + ?Sized,
    {
        let url = self.endpoint_url(endpoint)?;

        log::debug!("--- StationsClient request ---");
        log::debug!("URL: {}", url.as_str());
        log::debug!("Method: {}", method);

        let mut request_builder = self.http_client.request(method, url);
        if let Some(data) = body {
            request_builder = request_builder.json(data);
        }

        request_builder
            .send()
            .await
            .map_err(StationError::ReqwestError)
    }

    // Internal helper to process a response into a deserialized value or a
    // typed API error.
    pub(crate) async fn _send_and_process_response<R: DeserializeOwned + Send + 'static>(
        &self,
        response: HttpResponse,
        _endpoint_context: &str,
    ) -> Result<R, StationError> {
        let status = response.status();
        let response_url = response.url().to_string();

        // Get the body as text first so failures can be logged verbatim.
        let response_text = response.text().await.map_err(StationError::ReqwestError)?;

        if status.is_success() {
            serde_json::from_str::<R>(&response_text).map_err(|e| {
                log::error!(
                    "JSON deserialization failed for successful response from '{}'. Status: {}. Error: {}. Body: {}",
                    response_url,
                    status,
                    e,
                    &response_text
                );
                StationError::JsonDeserializationFailed(format!(
                    "Failed to deserialize successful response from '{}': {}. Body: {}",
                    response_url, e, &response_text
                ))
            })
        } else {
            let parsed_body: Value = match serde_json::from_str(&response_text) {
                Ok(json_val) => json_val,
                Err(_) => {
                    log::warn!(
                        "Failed to parse error response body as JSON from '{}'. Status: {}. Body: {}",
                        response_url,
                        status,
                        &response_text
                    );
                    serde_json::json!({
                        "error": format!("HTTP Error {} with non-JSON body", status),
                        "body_snippet": response_text.chars().take(100).collect::<String>(),
                    })
                }
            };
            Err(StationError::from_response(status.as_u16(), parsed_body))
        }
    }

    // Public HTTP method wrappers

    pub async fn get<R: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &str,
    ) -> Result<R, StationError> {
        self._request(Method::GET, endpoint, None::<&Value>).await
    }

    pub async fn post<T: Serialize + Send + Sync, R: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &str,
        data: &T,
    ) -> Result<R, StationError> {
        self._request(Method::POST, endpoint, Some(data)).await
    }

    pub async fn put<T: Serialize + Send + Sync, R: DeserializeOwned + Send + 'static>(
        &self,
        endpoint: &str,
        data: &T,
    ) -> Result<R, StationError> {
        self._request(Method::PUT, endpoint, Some(data)).await
    }
}
