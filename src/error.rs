use thiserror::Error as ThisError;

/// Different errors that the application can raise
#[derive(Debug, ThisError)]
pub enum RuntimeError {
    /// Error returned when a required environment variable is not set
    #[error("missing environment variable {0}")]
    MissingEnv(String),
    /// Error returned when an environment variable holds an unsupported value
    #[error("invalid value {value:?} for environment variable {name}")]
    InvalidEnv {
        /// Name of the environment variable
        name: String,
        /// Value found in the environment
        value: String,
    },
    /// Error returned if a URL pattern fails to compile
    #[error("invalid url pattern")]
    InvalidPattern(#[from] regex::Error),
    /// Error returned if we cannot assume a specific role
    #[error("failed to assume role")]
    AssumeRoleFailure(#[from] aws_sdk_sts::Error),
    /// Error returned if the credentials are missing after assuming a new role
    #[error("missing s3 credentials")]
    MissingCredentials,
    /// Error returned by the S3 API
    #[error("unexpected s3 error")]
    S3(#[from] aws_sdk_s3::Error),
    /// Error returned if the object body stream breaks while downloading
    #[error("failed to read object body")]
    ObjectBody(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// Error returned if the log payload is not a valid gzip archive
    #[error("invalid gzip payload")]
    Decompression(#[source] std::io::Error),
    /// Error returned when the metrics backend cannot be reached
    #[error("failed to reach the metrics backend")]
    Transport(#[from] reqwest::Error),
    /// Error returned at the end of an invocation that counted failures
    #[error("Failure: encountered {errors} errors")]
    ProcessingFailed {
        /// Number of object and submission failures in the invocation
        errors: usize,
    },
}
