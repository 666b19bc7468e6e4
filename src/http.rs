//! Minimal blocking HTTP/1.1 client for plain `http://` endpoints.
//!
//! Used for the optional ML service and the upstream pollutant providers;
//! both are reached over a local network or a proxy, so TLS is out of scope.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("dns error: {0}")]
    Dns(String),
    #[error("connect error: {0}")]
    Connect(std::io::Error),
    #[error("io error: {0}")]
    Io(std::io::Error),
    #[error("http status {0} ({1})")]
    Status(u16, String),
    #[error("invalid response body: {0}")]
    Encoding(String),
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParsedUrl {
    pub host: String,
    pub port: u16,
    pub path: String,
}

pub fn parse_http_url(endpoint: &str) -> Result<ParsedUrl, HttpError> {
    let trimmed = endpoint
        .strip_prefix("http://")
        .ok_or_else(|| HttpError::InvalidUrl("only http:// supported".to_string()))?;

    let mut parts = trimmed.splitn(2, '/');
    let host_port = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HttpError::InvalidUrl("missing host".to_string()))?;
    let path = match parts.next() {
        Some(path) if !path.is_empty() => format!("/{path}"),
        _ => "/".to_string(),
    };

    let mut host_parts = host_port.splitn(2, ':');
    let host = host_parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HttpError::InvalidUrl("missing host".to_string()))?;
    let port = match host_parts.next() {
        Some(port_str) if !port_str.is_empty() => port_str
            .parse::<u16>()
            .map_err(|_| HttpError::InvalidUrl("invalid port".to_string()))?,
        _ => 80,
    };

    Ok(ParsedUrl {
        host: host.to_string(),
        port,
        path,
    })
}

/// Joins a base endpoint and a route without doubling the slash.
pub fn join(endpoint: &str, route: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}

pub fn get(endpoint: &str, timeout: Duration) -> Result<String, HttpError> {
    send("GET", endpoint, None, timeout)
}

pub fn post_json(endpoint: &str, body: &str, timeout: Duration) -> Result<String, HttpError> {
    send("POST", endpoint, Some(body), timeout)
}

fn send(
    method: &str,
    endpoint: &str,
    body: Option<&str>,
    timeout: Duration,
) -> Result<String, HttpError> {
    let parsed = parse_http_url(endpoint)?;
    let addr = (parsed.host.as_str(), parsed.port)
        .to_socket_addrs()
        .map_err(|err| HttpError::Dns(err.to_string()))?
        .next()
        .ok_or_else(|| HttpError::Dns("no addresses resolved".to_string()))?;

    let mut stream = TcpStream::connect_timeout(&addr, timeout).map_err(HttpError::Connect)?;
    stream
        .set_read_timeout(Some(timeout))
        .map_err(HttpError::Io)?;
    stream
        .set_write_timeout(Some(timeout))
        .map_err(HttpError::Io)?;

    let request = match body {
        Some(body) => format!(
            "{method} {} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            parsed.path,
            parsed.host,
            body.len(),
        ),
        None => format!(
            "{method} {} HTTP/1.1\r\nHost: {}\r\nAccept: application/json\r\nConnection: close\r\n\r\n",
            parsed.path, parsed.host,
        ),
    };

    stream
        .write_all(request.as_bytes())
        .map_err(HttpError::Io)?;

    let mut response = String::new();
    stream.read_to_string(&mut response).map_err(HttpError::Io)?;

    let (headers, body) = response
        .split_once("\r\n\r\n")
        .ok_or_else(|| HttpError::Status(0, "invalid http response".to_string()))?;

    let status_line = headers
        .lines()
        .next()
        .ok_or_else(|| HttpError::Status(0, "missing status line".to_string()))?;
    let status_code = status_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| HttpError::Status(0, "missing status code".to_string()))?
        .parse::<u16>()
        .map_err(|_| HttpError::Status(0, "invalid status code".to_string()))?;

    let chunked = headers.lines().skip(1).any(|line| {
        line.split_once(':').is_some_and(|(name, value)| {
            name.trim().eq_ignore_ascii_case("transfer-encoding")
                && value.to_ascii_lowercase().contains("chunked")
        })
    });
    let body = if chunked {
        decode_chunked(body)?
    } else {
        body.to_string()
    };

    if status_code >= 400 {
        return Err(HttpError::Status(status_code, body.trim().to_string()));
    }

    Ok(body)
}

/// Reassembles a `Transfer-Encoding: chunked` body. Trailers are ignored.
fn decode_chunked(body: &str) -> Result<String, HttpError> {
    let malformed = || HttpError::Encoding("malformed chunked body".to_string());
    let mut rest = body.as_bytes();
    let mut decoded = Vec::with_capacity(rest.len());
    loop {
        let line_end = rest
            .windows(2)
            .position(|pair| pair == b"\r\n")
            .ok_or_else(malformed)?;
        let size_line = std::str::from_utf8(&rest[..line_end]).map_err(|_| malformed())?;
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16).map_err(|_| malformed())?;
        rest = &rest[line_end + 2..];
        if size == 0 {
            break;
        }
        let chunk = rest.get(..size).ok_or_else(malformed)?;
        decoded.extend_from_slice(chunk);
        rest = rest[size..].strip_prefix(b"\r\n").ok_or_else(malformed)?;
    }
    String::from_utf8(decoded).map_err(|_| HttpError::Encoding("body is not utf-8".to_string()))
}
