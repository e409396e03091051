use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

use crate::{config::Config, error::RuntimeError};

/// Tag key attached to every submission, the value is the tenant
const TENANT_TAG: &str = "company";

const SERIES_PATH: &str = "/api/v1/series";

const API_KEY_HEADER: &str = "DD-API-KEY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// `MetricSubmission` is a single count for one tenant at one point in time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetricSubmission {
    /// Full metric name
    pub metric: String,
    /// Unix epoch seconds
    pub timestamp: i64,
    /// Tenant the event belongs to
    pub tenant: String,
}

/// Status and raw body returned by the metrics backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl SubmitResponse {
    /// Datadog answers 202 when it accepts a series for asynchronous ingestion
    pub fn is_accepted(&self) -> bool {
        self.status == StatusCode::ACCEPTED.as_u16()
    }
}

/// `MetricsBackend` receives metric submissions, one network call per submission
#[async_trait]
pub trait MetricsBackend {
    /// Send one submission and return the backend's answer
    async fn submit(&self, submission: &MetricSubmission) -> Result<SubmitResponse, RuntimeError>;
}

#[derive(Debug, PartialEq, Serialize)]
struct SeriesPayload<'a> {
    series: Vec<Series<'a>>,
}

#[derive(Debug, PartialEq, Serialize)]
struct Series<'a> {
    metric: &'a str,
    points: [[i64; 2]; 1],
    #[serde(rename = "type")]
    kind: &'static str,
    host: &'a str,
    tags: Vec<String>,
}

impl<'a> SeriesPayload<'a> {
    fn new(submission: &'a MetricSubmission, host: &'a str) -> SeriesPayload<'a> {
        SeriesPayload {
            series: vec![Series {
                metric: &submission.metric,
                points: [[submission.timestamp, 1]],
                kind: "count",
                host,
                tags: vec![format!("{TENANT_TAG}:{}", submission.tenant)],
            }],
        }
    }
}

/// Datadog series API client
pub struct DatadogClient {
    http: reqwest::Client,
    series_url: String,
    api_key: String,
    host: String,
}

impl DatadogClient {
    /// Initialize the Datadog client from the function configuration
    #[tracing::instrument(skip(config))]
    pub fn new(config: &Config) -> Result<DatadogClient, RuntimeError> {
        tracing::info!(api_url = %config.dd_api_url, "Initializing Datadog client");
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(DatadogClient {
            http,
            series_url: format!("{}{}", config.dd_api_url.trim_end_matches('/'), SERIES_PATH),
            api_key: config.dd_api_key.clone(),
            host: config.dd_host.clone(),
        })
    }

    fn request(&self, submission: &MetricSubmission) -> reqwest::RequestBuilder {
        self.http
            .post(&self.series_url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&SeriesPayload::new(submission, &self.host))
    }
}

#[async_trait]
impl MetricsBackend for DatadogClient {
    #[tracing::instrument(skip(self))]
    async fn submit(&self, submission: &MetricSubmission) -> Result<SubmitResponse, RuntimeError> {
        let response = self.request(submission).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(SubmitResponse { status, body })
    }
}
