#![deny(missing_docs)]
//! <fullname>ALB login metrics</fullname>
//!
//! Lambda function that receives S3 notifications for new
//! Application Load Balancer access logs. It finds the login
//! requests of every tenant in those logs, and sends one
//! count per request to Datadog.
use lambda_runtime::LambdaEvent;

mod classify;
pub use classify::{Classification, Classifier, SkipReason, TenantMatch, UrlPattern};

mod config;
pub use config::Config;

mod decompress;
pub use decompress::gunzip;

mod error;
pub use error::RuntimeError;

mod event;
pub use event::{S3Bucket, S3Entity, S3Event, S3EventRecord, S3Object};

mod metrics;
pub use metrics::{DatadogClient, MetricSubmission, MetricsBackend, SubmitResponse};

mod pipeline;
pub use pipeline::{Pipeline, PipelineRun, SUCCESS};

mod record;
pub use record::{LogRecord, RequestLine, SchemaMismatch};

mod storage;
pub use storage::{ObjectStore, S3ObjectStore};

/// `sts` includes helpers to work with AWS STS
pub mod sts;

#[cfg(test)]
mod test_util;

/// `handle_event` is the Lambda function entry point
/// that receives the notifications from S3
#[tracing::instrument(skip_all, fields(request_id = %event.context.request_id))]
pub async fn handle_event<S, M>(
    store: &S,
    backend: &M,
    classifier: &Classifier,
    event: LambdaEvent<S3Event>,
) -> Result<String, RuntimeError>
where
    S: ObjectStore,
    M: MetricsBackend,
{
    Pipeline::new(store, backend, classifier)
        .run(&event.payload)
        .await
        .into_result()
}
