use std::fmt;

use crate::{classify::UrlPattern, error::RuntimeError};

const DEFAULT_API_URL: &str = "https://api.datadoghq.com";

const DEFAULT_METRIC_NAME: &str = "test.metric";

/// `Config` holds the function settings, read once at startup
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Host reported with every series point (`DD_HOST`)
    pub dd_host: String,
    /// Datadog API key (`DD_API_KEY`)
    pub dd_api_key: String,
    /// Datadog site base url (`DD_API_URL`)
    pub dd_api_url: String,
    /// Base name of the emitted metric (`DD_METRIC_NAME`)
    pub metric_name: String,
    /// Which request urls are tracked (`URL_PATTERN`)
    pub url_pattern: UrlPattern,
    /// Debug logging, enabled when `DEBUG` is set to any value
    pub debug: bool,
    /// Role assumed before reading log objects (`S3_ASSUME_ROLE_ARN`)
    pub s3_assume_role_arn: Option<String>,
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Config, RuntimeError> {
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through a variable lookup function
    pub fn from_lookup<F>(lookup: F) -> Result<Config, RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required =
            |name: &str| lookup(name).ok_or_else(|| RuntimeError::MissingEnv(name.into()));

        let url_pattern = match lookup("URL_PATTERN") {
            Some(value) => value.parse().map_err(|value| RuntimeError::InvalidEnv {
                name: "URL_PATTERN".into(),
                value,
            })?,
            None => UrlPattern::default(),
        };

        Ok(Config {
            dd_host: required("DD_HOST")?,
            dd_api_key: required("DD_API_KEY")?,
            dd_api_url: lookup("DD_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            metric_name: lookup("DD_METRIC_NAME").unwrap_or_else(|| DEFAULT_METRIC_NAME.into()),
            url_pattern,
            debug: lookup("DEBUG").is_some(),
            s3_assume_role_arn: lookup("S3_ASSUME_ROLE_ARN").filter(|arn| !arn.is_empty()),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("dd_host", &self.dd_host)
            .field("dd_api_key", &"<redacted>")
            .field("dd_api_url", &self.dd_api_url)
            .field("metric_name", &self.metric_name)
            .field("url_pattern", &self.url_pattern)
            .field("debug", &self.debug)
            .field("s3_assume_role_arn", &self.s3_assume_role_arn)
            .finish()
    }
}
