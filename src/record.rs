//! Application Load Balancer access log records.
//!
//! Entry format:
//! <https://docs.aws.amazon.com/elasticloadbalancing/latest/application/load-balancer-access-logs.html#access-log-entry-format>
use std::fmt;

/// A column of the access log entry format
struct Column {
    name: &'static str,
    quoted: bool,
}

const fn bare(name: &'static str) -> Column {
    Column {
        name,
        quoted: false,
    }
}

const fn quoted(name: &'static str) -> Column {
    Column { name, quoted: true }
}

const COLUMNS: [Column; 25] = [
    bare("type"),
    bare("timestamp"),
    bare("elb"),
    bare("client_port"),
    bare("target_port"),
    bare("request_processing_time"),
    bare("target_processing_time"),
    bare("response_processing_time"),
    bare("elb_status_code"),
    bare("target_status_code"),
    bare("received_bytes"),
    bare("sent_bytes"),
    quoted("request"),
    quoted("user_agent"),
    bare("ssl_cipher"),
    bare("ssl_protocol"),
    bare("target_group_arn"),
    quoted("trace_id"),
    quoted("domain_name"),
    quoted("chosen_cert_arn"),
    bare("matched_rule_priority"),
    bare("request_creation_time"),
    quoted("actions_executed"),
    quoted("redirect_url"),
    quoted("error_reason"),
];

/// `LogRecord` is one access log line split into its named columns.
///
/// Quoted columns hold their content without the surrounding quotes.
/// No column is validated beyond its position and quoting.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogRecord {
    /// Request type: `http`, `https`, `h2`, `grpcs`, `ws` or `wss`
    pub kind: String,
    /// Time the load balancer generated the response
    pub timestamp: String,
    /// Load balancer resource id
    pub elb: String,
    /// Client `ip:port`
    pub client_port: String,
    /// Target `ip:port`
    pub target_port: String,
    /// Seconds from request receipt to target dispatch
    pub request_processing_time: String,
    /// Seconds the target took to start responding
    pub target_processing_time: String,
    /// Seconds from target response to client response
    pub response_processing_time: String,
    /// Status code of the load balancer response
    pub elb_status_code: String,
    /// Status code of the target response
    pub target_status_code: String,
    /// Request size in bytes
    pub received_bytes: String,
    /// Response size in bytes
    pub sent_bytes: String,
    /// Request line: method, url and protocol
    pub request: String,
    /// Client user agent
    pub user_agent: String,
    /// TLS cipher
    pub ssl_cipher: String,
    /// TLS protocol
    pub ssl_protocol: String,
    /// Target group ARN
    pub target_group_arn: String,
    /// X-Amzn-Trace-Id header
    pub trace_id: String,
    /// SNI domain
    pub domain_name: String,
    /// Certificate presented to the client
    pub chosen_cert_arn: String,
    /// Priority of the matching listener rule
    pub matched_rule_priority: String,
    /// Time the load balancer received the request
    pub request_creation_time: String,
    /// Actions taken while processing the request
    pub actions_executed: String,
    /// Redirect target, if any
    pub redirect_url: String,
    /// Error reason, if any
    pub error_reason: String,
}

/// Reason a line does not fit the access log entry format
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaMismatch {
    /// The line ends before every column is present
    TooFewFields {
        /// Number of tokens found in the line
        found: usize,
        /// Number of columns in the format
        expected: usize,
    },
    /// A quoted token is never closed
    UnbalancedQuote,
    /// A quoted column holds a bare token
    ExpectedQuoted(&'static str),
    /// A bare column holds a quoted token
    UnexpectedQuoted(&'static str),
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaMismatch::TooFewFields { found, expected } => {
                write!(f, "found {found} fields, expected {expected}")
            }
            SchemaMismatch::UnbalancedQuote => write!(f, "unbalanced quote"),
            SchemaMismatch::ExpectedQuoted(name) => write!(f, "field {name} must be quoted"),
            SchemaMismatch::UnexpectedQuoted(name) => {
                write!(f, "field {name} must not be quoted")
            }
        }
    }
}

/// The three parts of a request column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestLine<'a> {
    /// HTTP method
    pub method: &'a str,
    /// Full request url, including scheme and port
    pub url: &'a str,
    /// Protocol version, missing on some malformed requests
    pub protocol: Option<&'a str>,
}

impl<'a> RequestLine<'a> {
    /// Split a request column on whitespace.
    /// Returns `None` if the method or the url is missing.
    pub fn parse(request: &'a str) -> Option<RequestLine<'a>> {
        let mut parts = request.split_whitespace();
        let method = parts.next()?;
        let url = parts.next()?;
        Some(RequestLine {
            method,
            url,
            protocol: parts.next(),
        })
    }
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Bare(&'a str),
    Quoted(&'a str),
}

impl<'a> Token<'a> {
    fn into_column_value(self, column: &Column) -> Result<String, SchemaMismatch> {
        match (self, column.quoted) {
            (Token::Quoted(value), true) | (Token::Bare(value), false) => Ok(value.to_string()),
            (Token::Bare(_), true) => Err(SchemaMismatch::ExpectedQuoted(column.name)),
            (Token::Quoted(_), false) => Err(SchemaMismatch::UnexpectedQuoted(column.name)),
        }
    }
}

/// Byte offset of the quote closing a quoted token.
/// A backslash escapes the character after it.
fn closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

fn tokenize(line: &str) -> Result<Vec<Token<'_>>, SchemaMismatch> {
    let mut tokens = Vec::with_capacity(COLUMNS.len());
    let mut rest = line.trim_start();

    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix('"') {
            let end = closing_quote(inner).ok_or(SchemaMismatch::UnbalancedQuote)?;
            tokens.push(Token::Quoted(&inner[..end]));
            rest = &inner[end + 1..];
            if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                return Err(SchemaMismatch::UnbalancedQuote);
            }
        } else {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            tokens.push(Token::Bare(&rest[..end]));
            rest = &rest[end..];
        }
        rest = rest.trim_start();
    }

    Ok(tokens)
}

impl LogRecord {
    /// Parse one access log line.
    ///
    /// Tokens after the last known column are ignored, newer load balancers
    /// append columns after `error_reason`.
    pub fn parse(line: &str) -> Result<LogRecord, SchemaMismatch> {
        let tokens = tokenize(line)?;
        let found = tokens.len();
        let too_few = || SchemaMismatch::TooFewFields {
            found,
            expected: COLUMNS.len(),
        };
        if found < COLUMNS.len() {
            return Err(too_few());
        }

        let values = COLUMNS
            .iter()
            .zip(tokens)
            .map(|(column, token)| token.into_column_value(column))
            .collect::<Result<Vec<_>, _>>()?;

        let [
            kind,
            timestamp,
            elb,
            client_port,
            target_port,
            request_processing_time,
            target_processing_time,
            response_processing_time,
            elb_status_code,
            target_status_code,
            received_bytes,
            sent_bytes,
            request,
            user_agent,
            ssl_cipher,
            ssl_protocol,
            target_group_arn,
            trace_id,
            domain_name,
            chosen_cert_arn,
            matched_rule_priority,
            request_creation_time,
            actions_executed,
            redirect_url,
            error_reason,
        ]: [String; 25] = values.try_into().map_err(|_| too_few())?;

        Ok(LogRecord {
            kind,
            timestamp,
            elb,
            client_port,
            target_port,
            request_processing_time,
            target_processing_time,
            response_processing_time,
            elb_status_code,
            target_status_code,
            received_bytes,
            sent_bytes,
            request,
            user_agent,
            ssl_cipher,
            ssl_protocol,
            target_group_arn,
            trace_id,
            domain_name,
            chosen_cert_arn,
            matched_rule_priority,
            request_creation_time,
            actions_executed,
            redirect_url,
            error_reason,
        })
    }

    /// Split the request column into method, url and protocol
    pub fn request_line(&self) -> Option<RequestLine<'_>> {
        RequestLine::parse(&self.request)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::alb_line;

    const DOCS_EXAMPLE: &str = r#"https 2018-07-02T22:23:00.186641Z app/my-loadbalancer/50dc6c495c0c9188 192.168.131.39:2817 10.0.0.1:80 0.086 0.048 0.037 200 200 0 57 "GET https://www.example.com:443/ HTTP/1.1" "curl/7.46.0" ECDHE-RSA-AES128-GCM-SHA256 TLSv1.2 arn:aws:elasticloadbalancing:us-east-2:123456789012:targetgroup/my-targets/73e2d6bc24d8a067 "Root=1-58337281-1d84f3d73c47ec4e58577259" "www.example.com" "arn:aws:acm:us-east-2:123456789012:certificate/12345678-1234-1234-1234-123456789012" 1 2018-07-02T22:22:48.364000Z "authenticate,forward" "-" "-""#;

    #[test]
    fn test_parse_docs_example() {
        let record = LogRecord::parse(DOCS_EXAMPLE).expect("failed to parse");

        assert_eq!("https", record.kind);
        assert_eq!("2018-07-02T22:23:00.186641Z", record.timestamp);
        assert_eq!("app/my-loadbalancer/50dc6c495c0c9188", record.elb);
        assert_eq!("192.168.131.39:2817", record.client_port);
        assert_eq!("10.0.0.1:80", record.target_port);
        assert_eq!("0.086", record.request_processing_time);
        assert_eq!("0.048", record.target_processing_time);
        assert_eq!("0.037", record.response_processing_time);
        assert_eq!("200", record.elb_status_code);
        assert_eq!("200", record.target_status_code);
        assert_eq!("0", record.received_bytes);
        assert_eq!("57", record.sent_bytes);
        assert_eq!("GET https://www.example.com:443/ HTTP/1.1", record.request);
        assert_eq!("curl/7.46.0", record.user_agent);
        assert_eq!("ECDHE-RSA-AES128-GCM-SHA256", record.ssl_cipher);
        assert_eq!("TLSv1.2", record.ssl_protocol);
        assert_eq!(
            "arn:aws:elasticloadbalancing:us-east-2:123456789012:targetgroup/my-targets/73e2d6bc24d8a067",
            record.target_group_arn
        );
        assert_eq!("Root=1-58337281-1d84f3d73c47ec4e58577259", record.trace_id);
        assert_eq!("www.example.com", record.domain_name);
        assert_eq!(
            "arn:aws:acm:us-east-2:123456789012:certificate/12345678-1234-1234-1234-123456789012",
            record.chosen_cert_arn
        );
        assert_eq!("1", record.matched_rule_priority);
        assert_eq!("2018-07-02T22:22:48.364000Z", record.request_creation_time);
        assert_eq!("authenticate,forward", record.actions_executed);
        assert_eq!("-", record.redirect_url);
        assert_eq!("-", record.error_reason);
    }

    #[test]
    fn test_parse_ignores_trailing_columns() {
        let line = format!(r#"{DOCS_EXAMPLE} "10.0.0.1:80" "200" "-" "-""#);
        let record = LogRecord::parse(&line).expect("failed to parse");
        assert_eq!("-", record.error_reason);
        assert_eq!(LogRecord::parse(DOCS_EXAMPLE).unwrap(), record);
    }

    #[test]
    fn test_parse_keeps_spaces_and_escaped_quotes_inside_quotes() {
        let line = DOCS_EXAMPLE.replace(
            r#""curl/7.46.0""#,
            r#""Mozilla/5.0 (X11; Linux x86_64) \"quoted\"""#,
        );
        let record = LogRecord::parse(&line).expect("failed to parse");
        assert_eq!(
            r#"Mozilla/5.0 (X11; Linux x86_64) \"quoted\""#,
            record.user_agent
        );
        assert_eq!("ECDHE-RSA-AES128-GCM-SHA256", record.ssl_cipher);
    }

    #[test]
    fn test_parse_rejects_short_line() {
        let line = "https 2018-07-02T22:23:00.186641Z app/my-loadbalancer/50dc6c495c0c9188";
        assert_eq!(
            Err(SchemaMismatch::TooFewFields {
                found: 3,
                expected: 25
            }),
            LogRecord::parse(line)
        );
        assert_eq!(
            Err(SchemaMismatch::TooFewFields {
                found: 0,
                expected: 25
            }),
            LogRecord::parse("")
        );
    }

    #[test]
    fn test_parse_rejects_unbalanced_quote() {
        let line = DOCS_EXAMPLE.replace(r#""curl/7.46.0""#, r#""curl/7.46.0"#);
        assert_eq!(Err(SchemaMismatch::UnbalancedQuote), LogRecord::parse(&line));

        let line = format!(r#"{DOCS_EXAMPLE} "unterminated"#);
        assert_eq!(Err(SchemaMismatch::UnbalancedQuote), LogRecord::parse(&line));
    }

    #[test]
    fn test_parse_rejects_misplaced_quoting() {
        let line = DOCS_EXAMPLE.replace(r#""curl/7.46.0""#, "curl/7.46.0");
        assert_eq!(
            Err(SchemaMismatch::ExpectedQuoted("user_agent")),
            LogRecord::parse(&line)
        );

        let line = DOCS_EXAMPLE.replace("TLSv1.2", r#""TLSv1.2""#);
        assert_eq!(
            Err(SchemaMismatch::UnexpectedQuoted("ssl_protocol")),
            LogRecord::parse(&line)
        );
    }

    #[test]
    fn test_parse_sample_line() {
        let line = alb_line(
            "2023-01-01T00:00:00Z",
            "POST https://auth.example.com:443/acme/login HTTP/1.1",
        );
        let record = LogRecord::parse(&line).expect("failed to parse");
        assert_eq!("2023-01-01T00:00:00Z", record.timestamp);
        assert_eq!(
            Some(RequestLine {
                method: "POST",
                url: "https://auth.example.com:443/acme/login",
                protocol: Some("HTTP/1.1"),
            }),
            record.request_line()
        );
    }

    #[test]
    fn test_request_line_needs_method_and_url() {
        assert_eq!(None, RequestLine::parse(""));
        assert_eq!(None, RequestLine::parse("-"));
        assert_eq!(
            Some(RequestLine {
                method: "POST",
                url: "https://example.com:443/acme/login",
                protocol: None,
            }),
            RequestLine::parse("POST https://example.com:443/acme/login")
        );
    }
}
