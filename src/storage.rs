use async_trait::async_trait;
use aws_sdk_s3::{Client, Error};
use aws_sdk_sts::Client as StsClient;
use aws_types::SdkConfig;

use crate::{error::RuntimeError, sts};

/// `ObjectStore` downloads log objects
#[async_trait]
pub trait ObjectStore {
    /// Fetch the full content of an object
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, RuntimeError>;
}

/// S3 client implementation.
pub struct S3ObjectStore {
    inner: Client,
}

impl S3ObjectStore {
    /// Initialize the S3 client.
    /// When a role is given, the client uses credentials from that assumed role.
    #[tracing::instrument(skip(config))]
    pub async fn new(
        config: &SdkConfig,
        assume_role_arn: Option<&str>,
    ) -> Result<S3ObjectStore, RuntimeError> {
        tracing::info!("Initializing S3 client");
        let inner = match assume_role_arn {
            Some(arn) => {
                let session_id = format!("alb_login_metrics_session_{}", uuid::Uuid::new_v4());
                let assumed = sts::assume_role(&StsClient::new(config), &session_id, arn).await?;
                Client::new(&assumed)
            }
            None => Client::new(config),
        };

        Ok(S3ObjectStore { inner })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, RuntimeError> {
        let output = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(Error::from)?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|err| RuntimeError::ObjectBody(err.into()))?;

        Ok(body.into_bytes().to_vec())
    }
}
