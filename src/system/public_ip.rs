//! Public IP lookup through an external echo service.

use std::net::IpAddr;
use std::time::Duration;

use crate::error::{LookupError, Result};

/// Echo service used when none is configured
pub const DEFAULT_LOOKUP_URL: &str = "https://api.ipify.org";

/// Source of the host's public address
#[allow(async_fn_in_trait)]
pub trait PublicIpSource {
    async fn lookup(&self) -> std::result::Result<IpAddr, LookupError>;
}

/// Plain-text echo service over HTTP(S), e.g. api.ipify.org
#[derive(Debug, Clone)]
pub struct HttpIpLookup {
    client: reqwest::Client,
    url: String,
}

impl HttpIpLookup {
    /// Client whose whole request (connect, headers, body) is bounded by `timeout`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PublicIpSource for HttpIpLookup {
    async fn lookup(&self) -> std::result::Result<IpAddr, LookupError> {
        let request_failed = |source| LookupError::Request {
            url: self.url.clone(),
            source,
        };

        let response = self.client.get(&self.url).send().await.map_err(request_failed)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }
        let body = response.text().await.map_err(request_failed)?;
        parse_ip_body(&body)
    }
}

/// The echo service answers with the bare address, possibly newline-terminated.
pub fn parse_ip_body(body: &str) -> std::result::Result<IpAddr, LookupError> {
    let trimmed = body.trim();
    trimmed
        .parse()
        .map_err(|_| LookupError::InvalidBody(trimmed.chars().take(64).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}/", addr)
    }

    #[test]
    fn body_parsing() {
        assert_eq!(parse_ip_body("203.0.113.7\n").unwrap(), "203.0.113.7".parse::<IpAddr>().unwrap());
        assert_eq!(parse_ip_body(" 2001:db8::5 ").unwrap(), "2001:db8::5".parse::<IpAddr>().unwrap());
        assert!(matches!(parse_ip_body("<html>rate limited</html>"), Err(LookupError::InvalidBody(_))));
    }

    #[tokio::test]
    async fn lookup_reads_plain_text_address() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 13\r\nConnection: close\r\n\r\n198.51.100.4\n").await;
        let lookup = HttpIpLookup::new(url, Duration::from_secs(2)).unwrap();
        assert_eq!(lookup.lookup().await.unwrap(), "198.51.100.4".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let url = serve_once("HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let lookup = HttpIpLookup::new(url, Duration::from_secs(2)).unwrap();
        assert!(matches!(lookup.lookup().await, Err(LookupError::Status(503))));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        // Accept and hold the connection without answering
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let lookup = HttpIpLookup::new(url, Duration::from_millis(200)).unwrap();
        let started = std::time::Instant::now();
        assert!(matches!(lookup.lookup().await, Err(LookupError::Request { .. })));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
