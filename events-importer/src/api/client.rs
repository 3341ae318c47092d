//! Supabase table client
//!
//! Inserts go straight to PostgREST (`POST {url}/rest/v1/{table}`); nothing
//! else of the Supabase API is needed here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::constants::{REST_PATH, headers};
use crate::config::Config;

/// A remote table that accepts single-record inserts
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Insert one record and return the backend's response body
    /// (`Value::Null` when the backend sends none)
    async fn insert(&self, table: &str, record: &Value) -> Result<Value>;
}

#[async_trait]
impl<T: TableClient + ?Sized> TableClient for &T {
    async fn insert(&self, table: &str, record: &Value) -> Result<Value> {
        (**self).insert(table, record).await
    }
}

/// HTTP client for a Supabase project's REST interface
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: config.url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Endpoint for a table, e.g. `https://x.supabase.co/rest/v1/events`
    pub fn table_url(&self, table: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let url = format!("{}/{}/{}", base, REST_PATH, table);
        Url::parse(&url).with_context(|| format!("Invalid table URL: {}", url))
    }

    pub fn build_insert_request(&self, table: &str, record: &Value) -> Result<reqwest::Request> {
        let url = self.table_url(table)?;

        self.http
            .post(url)
            .header(headers::API_KEY, &self.api_key)
            .bearer_auth(&self.api_key)
            .header(headers::PREFER, headers::RETURN_REPRESENTATION)
            .json(record)
            .build()
            .context("Failed to build insert request")
    }
}

#[async_trait]
impl TableClient for SupabaseClient {
    async fn insert(&self, table: &str, record: &Value) -> Result<Value> {
        let request = self.build_insert_request(table, record)?;
        debug!("POST {}", request.url());

        let response = self
            .http
            .execute(request)
            .await
            .with_context(|| format!("Insert request to '{}' failed", table))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read insert response body")?;

        if !status.is_success() {
            anyhow::bail!(
                "Insert into '{}' failed with status {}: {}",
                table,
                status,
                describe_error(&body)
            );
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).context("Failed to parse insert response")
    }
}

/// Render a PostgREST error body; anything unrecognised is returned as-is
fn describe_error(body: &str) -> String {
    let Ok(err) = serde_json::from_str::<PostgrestError>(body) else {
        return body.trim().to_string();
    };

    let mut parts = Vec::new();
    if let Some(message) = err.message {
        parts.push(message);
    }
    if let Some(code) = err.code {
        parts.push(format!("code {}", code));
    }
    if let Some(details) = err.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(hint) = err.hint {
        parts.push(format!("hint: {}", hint));
    }

    if parts.is_empty() {
        body.trim().to_string()
    } else {
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::constants::EVENTS_TABLE;
    use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
    use serde_json::json;

    fn client_for(url: &str) -> SupabaseClient {
        let config = Config {
            url: Url::parse(url).unwrap(),
            api_key: "sb_publishable_test".to_string(),
        };
        SupabaseClient::new(&config).unwrap()
    }

    #[test]
    fn test_table_url() {
        let client = client_for("https://abc.supabase.co");
        assert_eq!(
            client.table_url(EVENTS_TABLE).unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/events"
        );
    }

    #[test]
    fn test_table_url_trailing_slash() {
        let client = client_for("https://abc.supabase.co/");
        assert_eq!(
            client.table_url("events").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/events"
        );
    }

    #[test]
    fn test_table_url_keeps_base_path() {
        let client = client_for("http://localhost:54321/proxy/");
        assert_eq!(
            client.table_url("events").unwrap().as_str(),
            "http://localhost:54321/proxy/rest/v1/events"
        );
    }

    #[test]
    fn test_insert_request_shape() {
        let client = client_for("https://abc.supabase.co");
        let record = json!({
            "recording_id": 7,
            "event_type_id": 2,
            "timestamp": "2024-05-01T10:00:00",
            "offset_ms": 1500,
            "metadata": {}
        });

        let request = client.build_insert_request(EVENTS_TABLE, &record).unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://abc.supabase.co/rest/v1/events"
        );

        let h = request.headers();
        assert_eq!(h.get(headers::API_KEY).unwrap(), "sb_publishable_test");
        assert_eq!(
            h.get(AUTHORIZATION).unwrap(),
            "Bearer sb_publishable_test"
        );
        assert_eq!(h.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(h.get(headers::PREFER).unwrap(), "return=representation");

        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        let sent: Value = serde_json::from_slice(body).unwrap();
        assert_eq!(sent, record);
    }

    #[test]
    fn test_describe_postgrest_error() {
        let body = r#"{"code":"22007","details":null,"hint":null,"message":"invalid input syntax for type timestamp with time zone: \"yesterday-ish\""}"#;
        assert_eq!(
            describe_error(body),
            "invalid input syntax for type timestamp with time zone: \"yesterday-ish\"; code 22007"
        );
    }

    #[test]
    fn test_describe_non_json_error() {
        assert_eq!(describe_error("  Bad Gateway \n"), "Bad Gateway");
    }

    /// Serve one canned HTTP response on a local port; the handle yields the
    /// request line and headers that were received
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut received = Vec::new();
            let mut chunk = [0u8; 1024];
            let head = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before request completed");
                received.extend_from_slice(&chunk[..n]);

                let Some(end) = received.windows(4).position(|w| w == b"\r\n\r\n") else {
                    continue;
                };
                let head = String::from_utf8_lossy(&received[..end]).to_string();
                let content_length = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if received.len() >= end + 4 + content_length {
                    break head;
                }
            };

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            head
        });

        (format!("http://{}", addr), handle)
    }

    fn local_client(base_url: &str) -> SupabaseClient {
        SupabaseClient {
            http: reqwest::Client::builder().no_proxy().build().unwrap(),
            base_url: Url::parse(base_url).unwrap(),
            api_key: "sb_publishable_test".to_string(),
        }
    }

    fn event() -> Value {
        json!({
            "recording_id": 7,
            "event_type_id": 2,
            "timestamp": "2024-05-01T10:00:00",
            "offset_ms": 1500,
            "metadata": {"a": 1}
        })
    }

    #[tokio::test]
    async fn test_insert_returns_created_rows() {
        let (url, server) = serve_once(
            "201 Created",
            r#"[{"id":41,"recording_id":7,"event_type_id":2,"timestamp":"2024-05-01T10:00:00+00:00","offset_ms":1500,"metadata":{"a":1}}]"#,
        )
        .await;

        let stored = local_client(&url)
            .insert(EVENTS_TABLE, &event())
            .await
            .unwrap();
        assert_eq!(stored[0]["id"], json!(41));
        assert_eq!(stored[0]["metadata"], json!({"a": 1}));

        let head = server.await.unwrap();
        assert!(head.starts_with("POST /rest/v1/events HTTP/1.1"));
        assert!(head.to_lowercase().contains("apikey: sb_publishable_test"));
        assert!(head.to_lowercase().contains("prefer: return=representation"));
    }

    #[tokio::test]
    async fn test_insert_with_empty_body() {
        let (url, server) = serve_once("201 Created", "").await;

        let stored = local_client(&url)
            .insert(EVENTS_TABLE, &event())
            .await
            .unwrap();
        assert_eq!(stored, Value::Null);

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_rejected_by_backend() {
        let (url, server) = serve_once(
            "400 Bad Request",
            r#"{"code":"23502","details":"Failing row contains (41, null).","hint":null,"message":"null value in column \"recording_id\" violates not-null constraint"}"#,
        )
        .await;

        let err = local_client(&url)
            .insert(EVENTS_TABLE, &event())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insert into 'events' failed with status 400 Bad Request: \
             null value in column \"recording_id\" violates not-null constraint; \
             code 23502; details: Failing row contains (41, null)."
        );

        server.await.unwrap();
    }
}
