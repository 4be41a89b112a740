use chrono::NaiveDateTime;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Default request timeout applied to every call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Filters for the site collection endpoint. Fields left as `None` are
/// not sent as query parameters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

/// Score bounds accepted by the statistics and export endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ScoreRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteSummary {
    pub id: u32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub area: i64,
    pub total_score: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteListResponse {
    pub sites: Vec<SiteSummary>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

/// Per-criterion suitability scores, present once a site has been analyzed.
#[derive(Debug, Deserialize, Clone)]
pub struct SiteScores {
    pub solar_score: f64,
    pub area_score: f64,
    pub grid_score: f64,
    pub slope_score: f64,
    pub infrastructure_score: f64,
    pub total_score: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteDetail {
    pub id: u32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Usable area in square meters.
    pub area: i64,
    /// Average irradiance in kWh/m²/day.
    pub solar_irradiance: f64,
    /// Distance to the nearest grid connection, km.
    pub grid_distance: f64,
    /// Terrain slope in degrees.
    pub slope: f64,
    /// Distance to the nearest road, km.
    pub road_distance: f64,
    pub scores: Option<SiteScores>,
}

/// Criterion weights for the suitability analysis. The service expects
/// them to sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AnalysisWeights {
    pub solar: f64,
    pub area: f64,
    pub grid_distance: f64,
    pub slope: f64,
    pub infrastructure: f64,
}

impl Default for AnalysisWeights {
    fn default() -> Self {
        Self {
            solar: 0.30,
            area: 0.20,
            grid_distance: 0.20,
            slope: 0.15,
            infrastructure: 0.15,
        }
    }
}

impl AnalysisWeights {
    pub fn sum(&self) -> f64 {
        self.solar + self.area + self.grid_distance + self.slope + self.infrastructure
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub weights: AnalysisWeights,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisResponse {
    pub success: bool,
    pub message: String,
    pub sites_analyzed: u64,
    pub weights_used: AnalysisWeights,
    /// Service-local timestamp, no timezone attached.
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatisticsResponse {
    pub total_sites: u64,
    pub average_score: Option<f64>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HealthResponse {
    pub status: String,
}

/// Export payload format requested from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

/// Failure of a single API call. Callers can branch on the variant
/// instead of string-matching the message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {path}: {message}")]
    NotFound { path: String, message: String },
    #[error("request rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("server error ({status}): {message}")]
    Server { status: StatusCode, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// HTTP status of the failed call, when one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            ApiError::Rejected { status, .. } | ApiError::Server { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Transport(e) if e.is_timeout())
    }
}

/// Client for the solar site analysis service. One shared transport:
/// base URL, uniform timeout, JSON content type. Construct once at
/// startup and pass to consumers; cloning is cheap.
#[derive(Clone)]
pub struct SolarApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl SolarApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List sites, optionally bounded by score and paginated.
    pub async fn get_sites(&self, filter: &SiteFilter) -> Result<SiteListResponse, ApiError> {
        let url = format!("{}/api/sites", self.base_url);
        let response = self.dispatch(self.client.get(&url).query(filter)).await?;
        Ok(response.json().await?)
    }

    /// Fetch one site by its identifier. A missing id surfaces as
    /// [`ApiError::NotFound`] with the upstream status preserved.
    pub async fn get_site_by_id(&self, site_id: u32) -> Result<SiteDetail, ApiError> {
        let url = format!("{}/api/sites/{}", self.base_url, site_id);
        let response = self.dispatch(self.client.get(&url)).await?;
        Ok(response.json().await?)
    }

    /// Recalculate suitability scores for all sites with custom weights.
    pub async fn analyze_sites(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, ApiError> {
        let url = format!("{}/api/analyze", self.base_url);
        let response = self.dispatch(self.client.post(&url).json(request)).await?;
        Ok(response.json().await?)
    }

    /// Aggregate metrics over the (optionally bounded) score range.
    pub async fn get_statistics(&self, range: &ScoreRange) -> Result<StatisticsResponse, ApiError> {
        let url = format!("{}/api/statistics", self.base_url);
        let response = self.dispatch(self.client.get(&url).query(range)).await?;
        Ok(response.json().await?)
    }

    /// Liveness probe.
    pub async fn health_check(&self) -> Result<HealthResponse, ApiError> {
        let url = format!("{}/health", self.base_url);
        let response = self.dispatch(self.client.get(&url)).await?;
        Ok(response.json().await?)
    }

    /// Fetch the CSV export as raw bytes. Saving is the caller's concern,
    /// see [`crate::export`].
    pub async fn export_csv(&self, range: &ScoreRange) -> Result<Vec<u8>, ApiError> {
        let response = self.export(range, ExportFormat::Csv).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch the JSON export as a parsed value.
    pub async fn export_json(&self, range: &ScoreRange) -> Result<Value, ApiError> {
        let response = self.export(range, ExportFormat::Json).await?;
        Ok(response.json().await?)
    }

    async fn export(
        &self,
        range: &ScoreRange,
        format: ExportFormat,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}/api/export", self.base_url);
        self.dispatch(
            self.client
                .get(&url)
                .query(range)
                .query(&[("format", format.as_str())]),
        )
        .await
    }

    /// Single funnel for every outgoing request. Failures are logged here
    /// exactly once, with the upstream error body when one is available,
    /// then handed back to the caller untouched. No retries.
    async fn dispatch(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(target: "api", "request failed: {e}");
                return Err(ApiError::Transport(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let path = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(status, &body);
        tracing::error!(target: "api", "API error {status} on {path}: {message}");

        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound { path, message },
            s if s.is_client_error() => ApiError::Rejected { status: s, message },
            _ => ApiError::Server { status, message },
        })
    }
}

/// Pull the human-readable message out of an error body. The service
/// reports errors as `{"detail": "..."}`; anything else is passed through,
/// and an empty body falls back to the status line.
fn extract_error_message(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status.to_string();
    }
    match serde_json::from_str::<Value>(body) {
        Ok(value) => value
            .get("detail")
            .and_then(|d| d.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_message_prefers_detail_field() {
        let body = json!({"detail": "Site not found"}).to_string();
        assert_eq!(
            extract_error_message(StatusCode::NOT_FOUND, &body),
            "Site not found"
        );
    }

    #[test]
    fn error_message_passes_through_non_json_body() {
        assert_eq!(
            extract_error_message(StatusCode::BAD_GATEWAY, "upstream exploded"),
            "upstream exploded"
        );
    }

    #[test]
    fn error_message_falls_back_to_status_on_empty_body() {
        assert_eq!(
            extract_error_message(StatusCode::NOT_FOUND, ""),
            "404 Not Found"
        );
    }

    #[test]
    fn unset_filters_are_not_serialized() {
        let filter = SiteFilter {
            min_score: Some(50.0),
            ..Default::default()
        };
        let value = serde_json::to_value(&filter).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("min_score"));
        assert!(!obj.contains_key("max_score"));
        assert!(!obj.contains_key("limit"));
        assert!(!obj.contains_key("offset"));
    }

    #[test]
    fn empty_filter_serializes_to_no_parameters() {
        let value = serde_json::to_value(SiteFilter::default()).unwrap();
        assert!(value.as_object().unwrap().is_empty());
    }

    #[test]
    fn default_weights_sum_to_one() {
        let weights = AnalysisWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn export_format_strings() {
        assert_eq!(ExportFormat::Csv.as_str(), "csv");
        assert_eq!(ExportFormat::Json.as_str(), "json");
    }
}
