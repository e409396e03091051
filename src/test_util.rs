use std::{collections::HashMap, io::Write, sync::Mutex};

use async_trait::async_trait;
use aws_types::{region::Region, Credentials, SdkConfig};
use flate2::{write::GzEncoder, Compression};

use crate::{
    config::Config,
    error::RuntimeError,
    metrics::{MetricSubmission, MetricsBackend, SubmitResponse},
    record::LogRecord,
    storage::ObjectStore,
};

/// Configuration for mocking AWS SDK clients
pub async fn get_mock_config() -> SdkConfig {
    aws_config::from_env()
        .region(Region::new("us-west-1"))
        .credentials_provider(Credentials::new(
            "accesskey",
            "privatekey",
            None,
            None,
            "dummy",
        ))
        .load()
        .await
}

/// Base request builder for the AWS SDK calls
pub fn get_request_builder(service: &str) -> http::request::Builder {
    http::Request::builder().uri(format!("https://{service}.us-west-1.amazonaws.com/"))
}

/// Function configuration pointing at the given Datadog url
pub fn test_config(api_url: &str) -> Config {
    Config {
        dd_host: "test-host".into(),
        dd_api_key: "secret-key".into(),
        dd_api_url: api_url.into(),
        metric_name: "test.metric".into(),
        url_pattern: Default::default(),
        debug: false,
        s3_assume_role_arn: None,
    }
}

/// Gzip a text payload
pub fn gzip(content: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

/// Access log line with the given timestamp and request column
pub fn alb_line(timestamp: &str, request: &str) -> String {
    format!(
        r#"https {timestamp} app/my-loadbalancer/50dc6c495c0c9188 192.168.131.39:2817 10.0.0.1:80 0.086 0.048 0.037 200 200 0 57 "{request}" "curl/7.46.0" ECDHE-RSA-AES128-GCM-SHA256 TLSv1.2 arn:aws:elasticloadbalancing:us-east-2:123456789012:targetgroup/my-targets/73e2d6bc24d8a067 "Root=1-58337281-1d84f3d73c47ec4e58577259" "auth.example.com" "arn:aws:acm:us-east-2:123456789012:certificate/12345678-1234-1234-1234-123456789012" 1 {timestamp} "forward" "-" "-" "10.0.0.1:80" "200" "-" "-""#
    )
}

/// Parsed access log record with the given timestamp and request column
pub fn alb_record(timestamp: &str, request: &str) -> LogRecord {
    LogRecord::parse(&alb_line(timestamp, request)).unwrap()
}

/// In-memory object store, unknown objects fail to download
#[derive(Default)]
pub struct FakeStore {
    objects: HashMap<(String, String), Vec<u8>>,
}

impl FakeStore {
    pub fn with_object(mut self, bucket: &str, key: &str, content: Vec<u8>) -> Self {
        self.objects.insert((bucket.into(), key.into()), content);
        self
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, RuntimeError> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| RuntimeError::ObjectBody(format!("no such key {key}").into()))
    }
}

/// Metrics backend recording every submission.
/// Accepts everything unless told otherwise for a tenant.
#[derive(Default)]
pub struct FakeBackend {
    submissions: Mutex<Vec<MetricSubmission>>,
    rejected: Vec<String>,
    unreachable: Vec<String>,
}

impl FakeBackend {
    /// Answer 400 for submissions of this tenant
    pub fn rejecting(mut self, tenant: &str) -> Self {
        self.rejected.push(tenant.into());
        self
    }

    /// Fail with a transport error for submissions of this tenant
    pub fn unreachable_for(mut self, tenant: &str) -> Self {
        self.unreachable.push(tenant.into());
        self
    }

    pub fn submissions(&self) -> Vec<MetricSubmission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricsBackend for FakeBackend {
    async fn submit(&self, submission: &MetricSubmission) -> Result<SubmitResponse, RuntimeError> {
        self.submissions.lock().unwrap().push(submission.clone());

        if self.unreachable.contains(&submission.tenant) {
            let err = reqwest::Client::new()
                .post("not a url")
                .send()
                .await
                .unwrap_err();
            return Err(RuntimeError::Transport(err));
        }

        let status = if self.rejected.contains(&submission.tenant) {
            400
        } else {
            202
        };
        Ok(SubmitResponse {
            status,
            body: r#"{"status": "ok"}"#.into(),
        })
    }
}
