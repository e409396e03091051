use crate::error::RuntimeError;
use aws_sdk_sts::{Client, Error};
use aws_types::{Credentials, SdkConfig};

/// Build an SDK configuration whose credentials come from an assumed role,
/// so log objects can be read from the account that owns the load balancer.
#[tracing::instrument(skip(client))]
pub async fn assume_role(
    client: &Client,
    session_id: &str,
    assume_role_arn: &str,
) -> Result<SdkConfig, RuntimeError> {
    tracing::info!("assuming log bucket role");

    let output = client
        .assume_role()
        .role_arn(assume_role_arn)
        .role_session_name(session_id)
        .send()
        .await
        .map_err(Error::from)?;

    let credentials = output
        .credentials
        .as_ref()
        .and_then(|creds| {
            let key_id = creds.access_key_id()?;
            let secret = creds.secret_access_key()?;
            Some(Credentials::from_keys(
                key_id,
                secret,
                creds.session_token().map(String::from),
            ))
        })
        .ok_or(RuntimeError::MissingCredentials)?;

    Ok(aws_config::from_env()
        .credentials_provider(credentials)
        .load()
        .await)
}
