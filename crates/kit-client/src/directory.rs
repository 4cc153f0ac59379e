//! REST implementation of the request directory

use crate::{ClientConfig, ClientError, ClientResult};
use async_trait::async_trait;
use kit_core::{CoreResult, RentalRequestRecord, RequestDirectory};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

const REQUESTS_PATH: &str = "borrowing-requests";
const APPROVED_REQUESTS_PATH: &str = "borrowing-requests/approved";

/// List bodies come either bare or wrapped in a `data` envelope
#[derive(Deserialize)]
#[serde(untagged)]
enum Body<T> {
    Bare(T),
    Envelope { data: T },
}

impl<T> Body<T> {
    fn into_inner(self) -> T {
        match self {
            Body::Bare(v) | Body::Envelope { data: v } => v,
        }
    }
}

fn decode<T: DeserializeOwned>(text: &str) -> ClientResult<T> {
    serde_json::from_str::<Body<T>>(text)
        .map(Body::into_inner)
        .map_err(|e| ClientError::Decode(e.to_string()))
}

/// Rental request lists fetched over HTTP
pub struct HttpRequestDirectory {
    config: ClientConfig,
    root: Url,
    client: reqwest::Client,
}

impl HttpRequestDirectory {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let root = config.api_root()?;
        let mut builder = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(std::time::Duration::from_secs(config.timeout_secs));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self { config, root, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// All requests regardless of status
    pub async fn fetch_requests(&self) -> ClientResult<Vec<RentalRequestRecord>> {
        self.get_json(self.endpoint(REQUESTS_PATH)?).await
    }

    /// Requests in the approved state
    pub async fn fetch_approved_requests(&self) -> ClientResult<Vec<RentalRequestRecord>> {
        self.get_json(self.endpoint(APPROVED_REQUESTS_PATH)?).await
    }

    /// A single request by id
    pub async fn get_request(&self, id: &str) -> ClientResult<RentalRequestRecord> {
        self.get_json(self.request_url(id)?).await
    }

    /// Endpoint of one request; the id is percent-encoded as a single segment
    fn request_url(&self, id: &str) -> ClientResult<Url> {
        let mut url = self.endpoint(REQUESTS_PATH)?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("{} cannot take path segments", self.root)))?
            .push(id);
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.root
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url.clone()).header("Accept", "application/json");
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let text = response.text().await?;
        decode(&text)
    }
}

#[async_trait]
impl RequestDirectory for HttpRequestDirectory {
    async fn list_requests(&self) -> CoreResult<Vec<RentalRequestRecord>> {
        Ok(self.fetch_requests().await?)
    }

    async fn list_approved_requests(&self) -> CoreResult<Vec<RentalRequestRecord>> {
        Ok(self.fetch_approved_requests().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kit_core::{ScanMode, ScannedPayload};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const LIST: &str = r#"[{"id": 1, "requestedBy": {"id": 42}, "kit": {"id": 7}, "requestType": "BORROW_KIT", "status": "APPROVED"}]"#;

    /// Serve one canned HTTP response and hand back the raw request
    async fn serve_once(status: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf).to_string()
        });

        (format!("http://{}/api", addr), handle)
    }

    #[test]
    fn test_decode_bare_and_enveloped_lists() {
        let bare: Vec<RentalRequestRecord> = decode(LIST).unwrap();
        let wrapped: Vec<RentalRequestRecord> = decode(&format!(r#"{{"data": {}}}"#, LIST)).unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare.len(), 1);
    }

    #[test]
    fn test_decode_rejects_unrelated_json() {
        let result: ClientResult<Vec<RentalRequestRecord>> = decode(r#"{"message": "ok"}"#);
        assert!(matches!(result, Err(ClientError::Decode(_))));
    }

    #[test]
    fn test_endpoints() {
        let directory =
            HttpRequestDirectory::new(ClientConfig::default().with_base_url("https://rental.example.edu/api")).unwrap();

        assert_eq!(
            directory.endpoint(APPROVED_REQUESTS_PATH).unwrap().as_str(),
            "https://rental.example.edu/api/borrowing-requests/approved"
        );
    }

    #[test]
    fn test_request_id_stays_in_one_segment() {
        let directory =
            HttpRequestDirectory::new(ClientConfig::default().with_base_url("https://rental.example.edu/api")).unwrap();

        assert_eq!(
            directory.request_url("12").unwrap().as_str(),
            "https://rental.example.edu/api/borrowing-requests/12"
        );
        assert_eq!(
            directory.request_url("../x").unwrap().path(),
            "/api/borrowing-requests/..%2Fx"
        );

        let url = directory.request_url("a?b").unwrap();
        assert_eq!(url.path(), "/api/borrowing-requests/a%3Fb");
        assert!(url.query().is_none());
    }

    #[tokio::test]
    async fn test_fetch_approved_requests_over_http() {
        let (base_url, server) = serve_once("200 OK", LIST.to_string()).await;
        let config = ClientConfig::default()
            .with_base_url(base_url)
            .with_token("op-token")
            .without_proxy();
        let directory = HttpRequestDirectory::new(config).unwrap();

        let found = kit_core::find_match(&directory, &ScannedPayload::kit("42", "7"), ScanMode::Return).await;
        assert!(found.unwrap().id.matches("1"));

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /api/borrowing-requests/approved "));
        assert!(request.to_lowercase().contains("authorization: bearer op-token"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (base_url, server) = serve_once("500 Internal Server Error", "{}".to_string()).await;
        let directory = HttpRequestDirectory::new(ClientConfig::default().with_base_url(base_url).without_proxy()).unwrap();

        let result = directory.fetch_requests().await;
        assert!(matches!(result, Err(ClientError::Status { status: 500, .. })));
        server.await.unwrap();
    }
}
