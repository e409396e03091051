use crate::{
    classify::{Classification, Classifier},
    decompress::gunzip,
    error::RuntimeError,
    event::{S3Event, S3EventRecord},
    metrics::{MetricSubmission, MetricsBackend},
    record::LogRecord,
    storage::ObjectStore,
};

/// Result reported to the caller when no error was counted
pub const SUCCESS: &str = "Success";

/// `PipelineRun` accumulates the outcome of one invocation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineRun {
    errors: usize,
    submitted: usize,
}

impl PipelineRun {
    /// Object and submission failures counted so far
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// Submissions accepted by the metrics backend
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Convert the run into the invocation result.
    /// A run without trackable events is still a success.
    pub fn into_result(self) -> Result<String, RuntimeError> {
        if self.errors == 0 {
            Ok(SUCCESS.to_string())
        } else {
            Err(RuntimeError::ProcessingFailed {
                errors: self.errors,
            })
        }
    }
}

/// `Pipeline` drives every object of a notification batch through
/// decompression, extraction, classification and metric submission.
pub struct Pipeline<'a, S, M> {
    store: &'a S,
    backend: &'a M,
    classifier: &'a Classifier,
}

impl<'a, S, M> Pipeline<'a, S, M>
where
    S: ObjectStore,
    M: MetricsBackend,
{
    /// Build a pipeline over the given collaborators
    pub fn new(store: &'a S, backend: &'a M, classifier: &'a Classifier) -> Self {
        Pipeline {
            store,
            backend,
            classifier,
        }
    }

    /// Process every object in the batch, in order.
    /// A failing object never stops the objects after it.
    pub async fn run(&self, event: &S3Event) -> PipelineRun {
        let mut run = PipelineRun::default();
        for record in &event.records {
            self.process_object(record, &mut run).await;
        }

        tracing::info!(
            objects = event.records.len(),
            submitted = run.submitted,
            errors = run.errors,
            "batch processed"
        );
        run
    }

    async fn process_object(&self, record: &S3EventRecord, run: &mut PipelineRun) {
        let bucket = &record.s3.bucket.name;
        let key = &record.s3.object.key;
        tracing::info!(
            event_source = %record.event_source,
            event_time = %record.event_time,
            %bucket,
            %key,
            "processing log object"
        );

        let payload = match self.store.fetch(bucket, key).await {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(error = ?err, %bucket, %key, "failed to download log object");
                run.errors += 1;
                return;
            }
        };
        tracing::info!(%bucket, %key, bytes = payload.len(), "downloaded log object");

        let logs = match gunzip(&payload) {
            Ok(logs) => logs,
            Err(err) => {
                tracing::error!(error = ?err, %bucket, %key, "failed to decompress log object");
                run.errors += 1;
                return;
            }
        };
        drop(payload);

        for line in String::from_utf8_lossy(&logs).lines() {
            self.process_line(line, run).await;
        }
    }

    async fn process_line(&self, line: &str, run: &mut PipelineRun) {
        let record = match LogRecord::parse(line) {
            Ok(record) => record,
            Err(mismatch) => {
                tracing::debug!(%mismatch, "line does not match the access log format");
                return;
            }
        };

        let submission = match self.classifier.classify(&record) {
            Classification::Trackable(submission) => submission,
            Classification::Skipped(reason) => {
                tracing::debug!(timestamp = %record.timestamp, %reason, "record skipped");
                return;
            }
        };

        tracing::info!(
            timestamp = %record.timestamp,
            request = %record.request,
            status_code = %record.elb_status_code,
            company = %submission.tenant,
            "trackable request"
        );

        self.submit(&submission, run).await;
    }

    async fn submit(&self, submission: &MetricSubmission, run: &mut PipelineRun) {
        match self.backend.submit(submission).await {
            Ok(response) if response.is_accepted() => {
                tracing::info!(
                    metric = %submission.metric,
                    status = response.status,
                    body = %response.body,
                    "posted metric"
                );
                run.submitted += 1;
            }
            Ok(response) => {
                tracing::error!(
                    metric = %submission.metric,
                    status = response.status,
                    body = %response.body,
                    "metric rejected"
                );
                run.errors += 1;
            }
            Err(err) => {
                tracing::error!(error = ?err, metric = %submission.metric, "failed to post metric");
                run.errors += 1;
            }
        }
    }
}
