//! Minimal HTTP/1.1 request parsing and response encoding
//!
//! Only what the example server needs: a request head without a body, and
//! responses that close the connection after being written.

use std::fmt;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Largest request head accepted
pub const MAX_HEAD_BYTES: usize = 16 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HttpError {
    #[error("malformed request line")]
    MalformedRequestLine,

    #[error("unsupported protocol version '{0}'")]
    UnsupportedVersion(String),

    #[error("request head exceeds {} bytes", MAX_HEAD_BYTES)]
    HeadTooLarge,

    #[error("connection closed before the request head was complete")]
    Incomplete,

    #[error("read failed: {0}")]
    Io(String),
}

/// A parsed request head
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Path without the query string
    pub path: String,
    pub query: Option<String>,
    pub version: String,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Header value by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_head(&self) -> bool {
        self.method == "HEAD"
    }
}

/// Parse a request head (request line plus headers)
pub fn parse_request(head: &str) -> Result<Request, HttpError> {
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default();

    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(HttpError::MalformedRequestLine);
    };
    if !version.starts_with("HTTP/1.") {
        return Err(HttpError::UnsupportedVersion(version.to_string()));
    }

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (target.to_string(), None),
    };

    let headers = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect();

    Ok(Request {
        method: method.to_ascii_uppercase(),
        path,
        query,
        version: version.to_string(),
        headers,
    })
}

/// Read bytes until the blank line that ends a request head
pub async fn read_head<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String, HttpError> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let n = reader
            .read(&mut chunk)
            .await
            .map_err(|e| HttpError::Io(e.to_string()))?;
        if n == 0 {
            return Err(HttpError::Incomplete);
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = find_head_end(&buf) {
            return Ok(String::from_utf8_lossy(&buf[..end]).into_owned());
        }
        if buf.len() > MAX_HEAD_BYTES {
            return Err(HttpError::HeadTooLarge);
        }
    }
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Response status codes used by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    InternalServerError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::MethodNotAllowed => 405,
            Status::InternalServerError => 500,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::InternalServerError => "Internal Server Error",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.reason())
    }
}

/// A complete response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: Status, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Response {
            status,
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.into(),
        }
    }

    pub fn html(body: impl Into<Vec<u8>>) -> Self {
        Response::new(Status::Ok, "text/html; charset=utf-8", body)
    }

    pub fn json(value: &serde_json::Value) -> Self {
        Response::new(Status::Ok, "application/json", value.to_string())
    }

    /// Plain text response carrying the status line as its body
    pub fn error(status: Status) -> Self {
        Response::new(status, "text/plain; charset=utf-8", status.to_string())
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Serialize the response; HEAD responses keep the length but drop the body
    pub fn to_bytes(&self, include_body: bool) -> Vec<u8> {
        let mut head = format!("HTTP/1.1 {}\r\n", self.status);
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        head.push_str("Connection: close\r\n\r\n");

        let mut bytes = head.into_bytes();
        if include_body {
            bytes.extend_from_slice(&self.body);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let request =
            parse_request("get /help?x=1 HTTP/1.1\r\nHost: localhost\r\nAccept: */*").unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/help");
        assert_eq!(request.query.as_deref(), Some("x=1"));
        assert_eq!(request.header("host"), Some("localhost"));
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(parse_request("GET"), Err(HttpError::MalformedRequestLine));
        assert_eq!(
            parse_request("GET / SPDY/3"),
            Err(HttpError::UnsupportedVersion("SPDY/3".to_string()))
        );
    }

    #[tokio::test]
    async fn test_read_head_stops_at_blank_line() {
        let mut input: &[u8] = b"GET / HTTP/1.1\r\nHost: a\r\n\r\nbody";
        let head = read_head(&mut input).await.unwrap();
        assert_eq!(head, "GET / HTTP/1.1\r\nHost: a");

        let mut truncated: &[u8] = b"GET / HTTP/1.1\r\n";
        assert_eq!(read_head(&mut truncated).await, Err(HttpError::Incomplete));
    }

    #[test]
    fn test_head_response_has_no_body() {
        let response = Response::html("<p>hi</p>");
        let full = String::from_utf8(response.to_bytes(true)).unwrap();
        assert!(full.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(full.contains("Content-Length: 9\r\n"));
        assert!(full.ends_with("<p>hi</p>"));

        let head = String::from_utf8(response.to_bytes(false)).unwrap();
        assert!(head.ends_with("\r\n\r\n"));
    }
}
