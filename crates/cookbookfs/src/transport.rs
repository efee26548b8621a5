// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! REST transport to the configuration server.
//!
//! The collection node only needs `get_json`; uploaders receive the same
//! handle and use `put_json` for their own requests.

use crate::config::ChefConfig;
use diagnostics::*;
use serde_json::Value;
use std::time::Duration;

/// HTTP status the server answers with when a frozen version is overwritten.
pub const STATUS_CONFLICT: u16 = 409;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request to {url} timed out: {message}")]
    Timeout { url: String, message: String },

    #[error("{status} response from {url}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("invalid response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl TransportError {
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }

    /// True for the version-immutability conflict status.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, TransportError::Status { status, .. } if *status == STATUS_CONFLICT)
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Blocking JSON transport. `path` is relative to the server base URL.
pub trait Transport {
    fn get_json(&self, path: &str) -> Result<Value>;

    fn put_json(&self, path: &str, body: &Value) -> Result<Value>;
}

/// `Transport` over `reqwest::blocking`.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request {
                url: base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ChefConfig) -> Result<Self> {
        Self::new(
            config.chef_server_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn send(&self, url: String, request: reqwest::blocking::RequestBuilder) -> Result<Value> {
        let resp = request
            .header("accept", "application/json")
            .send()
            .map_err(|e| request_error(&url, &e))?;

        let status = resp.status();
        let text = resp.text().map_err(|e| request_error(&url, &e))?;
        if !status.is_success() {
            debug!("{url} answered {status}", url: url.as_str(), status: status.as_u16());
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| TransportError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

impl Transport for HttpTransport {
    fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.url_for(path);
        debug!("GET {url}", url: url.as_str());
        let request = self.client.get(&url);
        self.send(url, request)
    }

    fn put_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = self.url_for(path);
        debug!("PUT {url}", url: url.as_str());
        let request = self
            .client
            .put(&url)
            .header("content-type", "application/json")
            .body(body.to_string());
        self.send(url, request)
    }
}

fn request_error(url: &str, err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    /// Reads one request, headers and any declared body.
    fn read_request(stream: &mut TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            data.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&data).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .map_or(0, |(_, value)| value.trim().parse::<usize>().unwrap());
                if data.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8(data).unwrap()
    }

    /// Serves one connection with a canned response; yields the raw request.
    fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            stream.flush().unwrap();
            request
        });
        (base, handle)
    }

    #[test]
    fn test_get_decodes_json() {
        let (base, server) = serve_once("200 OK", r#"{"apache2": {"versions": []}}"#);
        let transport = HttpTransport::new(base, Duration::from_secs(5)).unwrap();

        let value = transport.get_json("cookbooks/?num_versions=all").unwrap();
        assert_eq!(value, serde_json::json!({"apache2": {"versions": []}}));

        let request = server.join().unwrap();
        assert!(request.starts_with("GET /cookbooks/?num_versions=all HTTP/1.1\r\n"));
        assert!(request.to_ascii_lowercase().contains("accept: application/json"));
    }

    #[test]
    fn test_put_sends_json_body() {
        let (base, server) = serve_once("201 Created", "{}");
        let transport = HttpTransport::new(base, Duration::from_secs(5)).unwrap();

        let body = serde_json::json!({"name": "apache2-1.0.0", "frozen?": true});
        transport.put_json("cookbooks/apache2/1.0.0", &body).unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("PUT /cookbooks/apache2/1.0.0 HTTP/1.1\r\n"));
        assert!(request.ends_with(&body.to_string()));
    }

    #[test]
    fn test_conflict_response_is_status_error() {
        let (base, server) = serve_once("409 Conflict", r#"{"error": ["frozen"]}"#);
        let transport = HttpTransport::new(base, Duration::from_secs(5)).unwrap();

        let err = transport
            .put_json("cookbooks/apache2/1.0.0", &serde_json::json!({}))
            .unwrap_err();
        assert!(err.is_conflict(), "unexpected {err:?}");
        match err {
            TransportError::Status { status, body, url } => {
                assert_eq!(status, 409);
                assert_eq!(body, r#"{"error": ["frozen"]}"#);
                assert!(url.ends_with("/cookbooks/apache2/1.0.0"));
            }
            other => panic!("unexpected {other:?}"),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_non_json_success_is_decode_error() {
        let (base, server) = serve_once("200 OK", "<html>maintenance</html>");
        let transport = HttpTransport::new(base, Duration::from_secs(5)).unwrap();

        let err = transport.get_json("cookbooks").unwrap_err();
        assert!(matches!(err, TransportError::Decode { .. }), "unexpected {err:?}");
        assert_eq!(err.status(), None);
        server.join().unwrap();
    }

    #[test]
    fn test_silent_server_is_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        // Accept and hold the connection well past the client deadline.
        let _server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            thread::sleep(Duration::from_secs(3));
            drop(stream);
        });
        let transport = HttpTransport::new(base, Duration::from_millis(200)).unwrap();

        let err = transport.get_json("cookbooks").unwrap_err();
        assert!(err.is_timeout(), "unexpected {err:?}");
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_refused_connection_is_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let transport = HttpTransport::new(base, Duration::from_secs(5)).unwrap();

        let err = transport.get_json("cookbooks").unwrap_err();
        assert!(matches!(err, TransportError::Request { .. }), "unexpected {err:?}");
    }

    #[test]
    fn test_url_joining() {
        let transport =
            HttpTransport::new("https://chef.example.com/organizations/acme/", Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            transport.url_for("/cookbooks/?num_versions=all"),
            "https://chef.example.com/organizations/acme/cookbooks/?num_versions=all"
        );
    }

    #[test]
    fn test_conflict_classification() {
        let conflict = TransportError::Status {
            url: "u".into(),
            status: 409,
            body: String::new(),
        };
        assert!(conflict.is_conflict());
        assert!(!conflict.is_timeout());
        assert_eq!(conflict.status(), Some(409));

        let missing = TransportError::Status {
            url: "u".into(),
            status: 404,
            body: String::new(),
        };
        assert!(!missing.is_conflict());

        let timeout = TransportError::Timeout {
            url: "u".into(),
            message: "deadline".into(),
        };
        assert!(timeout.is_timeout());
        assert_eq!(timeout.status(), None);
    }
}
