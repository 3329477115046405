//! SBI HTTP/2 Client
//!
//! HTTP/2 (h2c) client implementation using hyper for SBI communication.
//! One connection per peer, established on first use and reused after.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::client::conn::http2::SendRequest;
use hyper::{Method, Request, Uri};
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::constants::HTTP_PORT;
use crate::error::{SbiError, SbiResult};
use crate::message::{SbiRequest, SbiResponse};
use crate::types::UriScheme;

/// SBI Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbiClientConfig {
    /// Target host (FQDN or IP)
    pub host: String,
    /// Target port
    pub port: u16,
}

impl SbiClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse an `http://host[:port]` base URI. Any path is ignored.
    pub fn from_uri(base: &str) -> SbiResult<Self> {
        let uri: Uri = base
            .parse()
            .map_err(|e| SbiError::InvalidUri(format!("{base}: {e}")))?;

        let scheme = uri
            .scheme_str()
            .and_then(UriScheme::from_str_opt)
            .ok_or_else(|| SbiError::InvalidUri(format!("{base}: missing scheme")))?;
        if scheme != UriScheme::Http {
            return Err(SbiError::ClientError(format!(
                "{base}: only plain http is supported"
            )));
        }

        let host = uri
            .host()
            .ok_or_else(|| SbiError::InvalidUri(format!("{base}: missing host")))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');

        Ok(Self::new(host, uri.port_u16().unwrap_or(HTTP_PORT)))
    }

    /// `http://host:port`
    pub fn base_uri(&self) -> String {
        if self.host.contains(':') {
            format!("{}://[{}]:{}", UriScheme::Http, self.host, self.port)
        } else {
            format!("{}://{}:{}", UriScheme::Http, self.host, self.port)
        }
    }

    fn authority(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Connection state for HTTP/2
struct ConnectionState {
    sender: SendRequest<Full<Bytes>>,
}

/// SBI Client - HTTP/2 client for SBI communication
pub struct SbiClient {
    config: SbiClientConfig,
    /// Connection state (lazily initialized)
    connection: Mutex<Option<ConnectionState>>,
}

impl SbiClient {
    pub fn new(config: SbiClientConfig) -> Self {
        Self {
            config,
            connection: Mutex::new(None),
        }
    }

    pub fn with_host_port(host: impl Into<String>, port: u16) -> Self {
        Self::new(SbiClientConfig::new(host, port))
    }

    pub fn from_uri(base: &str) -> SbiResult<Self> {
        Ok(Self::new(SbiClientConfig::from_uri(base)?))
    }

    pub fn config(&self) -> &SbiClientConfig {
        &self.config
    }

    async fn connect(&self) -> SbiResult<SendRequest<Full<Bytes>>> {
        let addr = self.config.authority();

        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| SbiError::ConnectionError(format!("{addr}: {e}")))?;
        let io = TokioIo::new(stream);

        let (sender, conn) = hyper::client::conn::http2::handshake(TokioExecutor::new(), io)
            .await
            .map_err(|e| SbiError::ConnectionError(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                log::warn!("HTTP/2 connection to {addr} closed: {e}");
            }
        });

        log::debug!("Connected to {}", self.config.base_uri());
        Ok(sender)
    }

    /// Get or create a connection
    async fn get_connection(&self) -> SbiResult<SendRequest<Full<Bytes>>> {
        let mut conn_guard = self.connection.lock().await;

        if let Some(ref state) = *conn_guard {
            if state.sender.is_ready() {
                return Ok(state.sender.clone());
            }
        }

        let sender = self.connect().await?;
        *conn_guard = Some(ConnectionState {
            sender: sender.clone(),
        });
        Ok(sender)
    }

    /// Send an SBI request and receive a response. Single attempt.
    pub async fn send_request(&self, request: SbiRequest) -> SbiResult<SbiResponse> {
        let mut sender = self.get_connection().await?;

        let uri_str = if request.header.uri.starts_with("http") {
            request.header.uri.clone()
        } else {
            format!("{}{}", self.config.base_uri(), request.header.uri)
        };

        let uri_with_params = if request.http.params.is_empty() {
            uri_str
        } else {
            let mut params: Vec<String> = request
                .http
                .params
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            params.sort();
            format!("{}?{}", uri_str, params.join("&"))
        };

        let uri: Uri = uri_with_params
            .parse()
            .map_err(|e| SbiError::InvalidUri(format!("{uri_with_params}: {e}")))?;

        let method = match request.header.method.to_uppercase().as_str() {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "PATCH" => Method::PATCH,
            other => return Err(SbiError::InvalidMethod(other.to_string())),
        };

        let body = request
            .http
            .content
            .map(|c| Full::new(Bytes::from(c)))
            .unwrap_or_else(|| Full::new(Bytes::new()));

        let mut req_builder = Request::builder().method(method).uri(uri);
        for (key, value) in &request.http.headers {
            req_builder = req_builder.header(key.as_str(), value.as_str());
        }

        let http_request = req_builder
            .body(body)
            .map_err(|e| SbiError::ClientError(e.to_string()))?;

        let response = sender
            .send_request(http_request)
            .await
            .map_err(|e| SbiError::HyperError(e.to_string()))?;

        convert_response(response).await
    }

    pub async fn get(&self, path: &str) -> SbiResult<SbiResponse> {
        self.send_request(SbiRequest::get(path)).await
    }

    pub async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> SbiResult<SbiResponse> {
        self.send_request(SbiRequest::post(path).with_json_body(body)?)
            .await
    }

    pub async fn put_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> SbiResult<SbiResponse> {
        self.send_request(SbiRequest::put(path).with_json_body(body)?)
            .await
    }

    pub async fn delete(&self, path: &str) -> SbiResult<SbiResponse> {
        self.send_request(SbiRequest::delete(path)).await
    }

    /// Close the connection
    pub async fn close(&self) {
        let mut conn_guard = self.connection.lock().await;
        *conn_guard = None;
    }
}

async fn convert_response(response: hyper::Response<Incoming>) -> SbiResult<SbiResponse> {
    let status = response.status().as_u16();

    let mut headers = HashMap::new();
    for (key, value) in response.headers() {
        if let Ok(v) = value.to_str() {
            headers.insert(key.to_string(), v.to_string());
        }
    }

    let body_bytes = response
        .into_body()
        .collect()
        .await
        .map_err(|e| SbiError::InvalidResponse(e.to_string()))?
        .to_bytes();

    let mut sbi_response = SbiResponse::with_status(status);
    sbi_response.http.headers = headers;
    if !body_bytes.is_empty() {
        sbi_response.http.content = Some(String::from_utf8_lossy(&body_bytes).to_string());
    }

    Ok(sbi_response)
}

/// Shared clients keyed by peer base URI
#[derive(Default)]
pub struct SbiClientPool {
    clients: DashMap<String, Arc<SbiClient>>,
}

impl SbiClientPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client for the peer that serves `uri`, created on first use
    pub fn get_client(&self, uri: &str) -> SbiResult<Arc<SbiClient>> {
        let config = SbiClientConfig::from_uri(uri)?;
        let key = config.base_uri();

        if let Some(client) = self.clients.get(&key) {
            return Ok(client.clone());
        }

        let client = self
            .clients
            .entry(key)
            .or_insert_with(|| Arc::new(SbiClient::new(config)))
            .clone();
        Ok(client)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
