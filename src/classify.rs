use std::{fmt, str::FromStr};

use chrono::DateTime;
use regex::Regex;

use crate::{error::RuntimeError, metrics::MetricSubmission, record::LogRecord};

/// Only requests sent with this method are tracked
const TRACKED_METHOD: &str = "POST";

/// `UrlPattern` selects which request urls count as trackable events.
///
/// Both patterns expect `scheme://host[:port]/<tenant>/...`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UrlPattern {
    /// `/<tenant>/login`, reported as `<metric>.login`
    #[default]
    Login,
    /// `/<tenant>/<qualifier>/...`, reported as `<metric>.<qualifier>`
    TenantPath,
}

impl UrlPattern {
    fn regex(&self) -> &'static str {
        match self {
            UrlPattern::Login => {
                r"^[A-Za-z][A-Za-z0-9+.-]*://[^/\s]+/([^/?#\s]+)/(login)/?(?:[?#]\S*)?$"
            }
            UrlPattern::TenantPath => {
                r"^[A-Za-z][A-Za-z0-9+.-]*://[^/\s]+/([^/?#\s]+)/([^/?#\s]+)"
            }
        }
    }
}

impl FromStr for UrlPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(UrlPattern::Login),
            "tenant_path" => Ok(UrlPattern::TenantPath),
            other => Err(other.to_string()),
        }
    }
}

/// Tenant and metric qualifier captured from a request url
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TenantMatch {
    /// Tenant identifier, the first path segment
    pub tenant: String,
    /// Suffix appended to the metric base name
    pub qualifier: String,
}

/// Reason a record does not produce a metric
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The request column lacks a method or a url
    MalformedRequest(String),
    /// The url doesn't match the configured pattern
    UntrackedUrl(String),
    /// The method isn't `POST`
    UntrackedMethod(String),
    /// The timestamp isn't a valid RFC 3339 date
    InvalidTimestamp(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MalformedRequest(request) => write!(f, "malformed request - {request}"),
            SkipReason::UntrackedUrl(url) => write!(f, "request uri is not tracked - {url}"),
            SkipReason::UntrackedMethod(method) => write!(f, "method is not POST - {method}"),
            SkipReason::InvalidTimestamp(timestamp) => {
                write!(f, "invalid timestamp - {timestamp}")
            }
        }
    }
}

/// Outcome of classifying a record
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    /// The record is a trackable event
    Trackable(MetricSubmission),
    /// The record is ignored
    Skipped(SkipReason),
}

/// `Classifier` turns log records into metric submissions
#[derive(Clone, Debug)]
pub struct Classifier {
    url: Regex,
    metric_base: String,
}

impl Classifier {
    /// Build a classifier for the given url pattern and metric base name
    pub fn new(pattern: UrlPattern, metric_base: &str) -> Result<Classifier, RuntimeError> {
        Ok(Classifier {
            url: Regex::new(pattern.regex())?,
            metric_base: metric_base.into(),
        })
    }

    /// Match a request url against the configured pattern
    pub fn match_url(&self, url: &str) -> Option<TenantMatch> {
        let captures = self.url.captures(url)?;
        Some(TenantMatch {
            tenant: captures.get(1)?.as_str().to_string(),
            qualifier: captures.get(2)?.as_str().to_string(),
        })
    }

    /// Decide whether a record is trackable.
    ///
    /// The url is checked before the method, and the timestamp last.
    pub fn classify(&self, record: &LogRecord) -> Classification {
        let request = match record.request_line() {
            Some(request) => request,
            None => {
                return Classification::Skipped(SkipReason::MalformedRequest(
                    record.request.clone(),
                ))
            }
        };

        let matched = match self.match_url(request.url) {
            Some(matched) => matched,
            None => return Classification::Skipped(SkipReason::UntrackedUrl(request.url.into())),
        };

        if request.method != TRACKED_METHOD {
            return Classification::Skipped(SkipReason::UntrackedMethod(request.method.into()));
        }

        let timestamp = match DateTime::parse_from_rfc3339(&record.timestamp) {
            Ok(timestamp) => timestamp.timestamp(),
            Err(_) => {
                return Classification::Skipped(SkipReason::InvalidTimestamp(
                    record.timestamp.clone(),
                ))
            }
        };

        Classification::Trackable(MetricSubmission {
            metric: format!("{}.{}", self.metric_base, matched.qualifier),
            timestamp,
            tenant: matched.tenant,
        })
    }
}
