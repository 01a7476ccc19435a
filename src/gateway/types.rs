use crate::errors::GatewayError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Caller-supplied request options, passed through to the transport
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        RequestOptions {
            method,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Adds a header, replacing any previous value with the same name
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, GatewayError> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            GatewayError::InvalidHeader {
                reason: format!("{}: {}", name, e),
            }
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| GatewayError::InvalidHeader {
            reason: format!("{}: {}", name, e),
        })?;

        self.headers.insert(name, value);
        Ok(self)
    }

    /// Serializes `body` as the JSON request body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, GatewayError> {
        let bytes =
            serde_json::to_vec(body).map_err(|e| GatewayError::InvalidBody { source: e })?;
        self.body = Some(bytes);
        Ok(self)
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A fully read response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    url: String,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, url: String, body: Vec<u8>) -> Self {
        ApiResponse {
            status,
            headers,
            url,
            body,
        }
    }

    /// Reads the whole body of a transport response
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, GatewayError> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().to_string();
        let body = response.bytes().await?.to_vec();

        Ok(Self::new(status, headers, url, body))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Body as text, invalid UTF-8 replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::CONTENT_TYPE;

    #[test]
    fn test_request_options_default() {
        let options = RequestOptions::default();
        assert_eq!(options.method, Method::GET);
        assert!(options.headers.is_empty());
        assert!(options.body.is_none());
    }

    #[test]
    fn test_request_options_header_replaces() {
        let options = RequestOptions::post()
            .header("X-Trace", "one")
            .unwrap()
            .header("x-trace", "two")
            .unwrap();

        assert_eq!(options.headers.get_all("x-trace").iter().count(), 1);
        assert_eq!(options.headers["x-trace"], "two");
    }

    #[test]
    fn test_request_options_invalid_header() {
        assert!(matches!(
            RequestOptions::get().header("bad header", "v"),
            Err(GatewayError::InvalidHeader { .. })
        ));
        assert!(matches!(
            RequestOptions::get().header("X-Ok", "line\nbreak"),
            Err(GatewayError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_request_options_json_body() {
        let options = RequestOptions::post()
            .json(&serde_json::json!({ "name": "oatmeal" }))
            .unwrap();

        assert_eq!(options.body.as_deref(), Some(br#"{"name":"oatmeal"}"#.as_slice()));
    }

    #[test]
    fn test_api_response_accessors() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let response = ApiResponse::new(
            StatusCode::UNAUTHORIZED,
            headers,
            "http://localhost/api/v1/items".to_string(),
            br#"{"error":"forbidden"}"#.to_vec(),
        );

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.url(), "http://localhost/api/v1/items");
        assert_eq!(response.text(), r#"{"error":"forbidden"}"#);

        let body: serde_json::Value = response.json().unwrap();
        assert_eq!(body["error"], "forbidden");
    }
}
