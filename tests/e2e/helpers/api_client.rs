use anyhow::Result;
use http_body_util::{BodyExt, Full};
use hyper::{body::Bytes, Method, Request, Response, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

/// A file field for an upload form
pub fn file_part(filename: &str, content_type: &str, data: &[u8]) -> multipart::Part {
    multipart::Part::bytes(data.to_vec())
        .file_name(filename.to_string())
        .mime_str(content_type)
        .expect("Invalid content type")
}

#[derive(Clone)]
pub struct TestClient {
    base_url: String,
    client: Client<hyper_util::client::legacy::connect::HttpConnector, Full<Bytes>>,
    form_client: reqwest::Client,
}

impl TestClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self {
            base_url: base_url.to_string(),
            client,
            form_client: reqwest::Client::builder()
                .no_proxy()
                .build()
                .expect("Failed to build form client"),
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::GET, path).await
    }

    pub async fn post_empty(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::POST, path).await
    }

    pub async fn post_multipart(&self, path: &str, form: multipart::Form) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.form_client.post(&url).multipart(form).send().await?;

        ApiResponse::from_reqwest(response).await
    }

    async fn request(&self, method: Method, path: &str) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        let request = Request::builder()
            .method(method)
            .uri(&url)
            .body(Full::new(Bytes::new()))?;
        let response = self.client.request(request).await?;

        ApiResponse::from_response(response).await
    }
}

pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
    pub body_bytes: Vec<u8>,
    pub headers: HashMap<String, String>,
}

impl ApiResponse {
    async fn from_response(response: Response<hyper::body::Incoming>) -> Result<Self> {
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        let body_bytes = response.into_body().collect().await?.to_bytes().to_vec();

        Ok(Self::from_parts(status, headers, body_bytes))
    }

    async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = StatusCode::from_u16(response.status().as_u16())?;
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();

        let body_bytes = response.bytes().await?.to_vec();

        Ok(Self::from_parts(status, headers, body_bytes))
    }

    fn from_parts(
        status: StatusCode,
        headers: HashMap<String, String>,
        body_bytes: Vec<u8>,
    ) -> Self {
        let body = if !body_bytes.is_empty() {
            serde_json::from_slice(&body_bytes).ok()
        } else {
            None
        };

        Self {
            status,
            body,
            body_bytes,
            headers,
        }
    }

    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {} but got {}. Body: {:?}",
            expected, self.status, self.body
        );
        self
    }

    /// Assert that the error response contains the expected message
    pub fn assert_error_message(&self, expected_message: &str) -> &Self {
        let message = self
            .body
            .as_ref()
            .and_then(|b| b.get("message"))
            .and_then(|m| m.as_str())
            .expect("Missing message field in error response");

        assert!(
            message.contains(expected_message),
            "Expected error message to contain '{}', but got '{}'",
            expected_message,
            message
        );
        self
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body_bytes)?)
    }

    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers.get(name)
    }

    pub fn assert_header(&self, name: &str, value: &str) -> &Self {
        let actual = self
            .headers
            .get(name)
            .unwrap_or_else(|| panic!("Header '{}' not found", name));
        assert_eq!(actual, value, "Header '{}' value mismatch", name);
        self
    }

    pub fn assert_header_exists(&self, name: &str) -> &Self {
        assert!(
            self.headers.contains_key(name),
            "Header '{}' not found",
            name
        );
        self
    }
}
