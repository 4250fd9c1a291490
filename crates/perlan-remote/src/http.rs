//! HTTP document-store remote.
//!
//! Talks to a small REST API:
//!
//! - `GET    {base}/v1/collections/{c}/documents` returns `{"documents": [{"id", "data"}]}`
//! - `PUT    {base}/v1/collections/{c}/documents/{id}` with the document as body
//! - `DELETE {base}/v1/collections/{c}/documents/{id}`

use async_trait::async_trait;
use serde::Deserialize;
use tracing::instrument;

use perlan_core::error::RemoteError;
use perlan_core::traits::{Document, RemoteStore};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A remote store reached over HTTP.
pub struct HttpRemote {
    base_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemote")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl HttpRemote {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout_secs: Option<u64>,
    ) -> anyhow::Result<Self> {
        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RemoteError::NetworkError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout_secs,
            client,
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/v1/collections/{collection}/documents", self.base_url)
    }

    /// The document URL with `id` percent-encoded as one path segment.
    fn document_url(&self, collection: &str, id: &str) -> Result<reqwest::Url, RemoteError> {
        let mut url = reqwest::Url::parse(&self.collection_url(collection))
            .map_err(|e| RemoteError::NetworkError(format!("invalid remote URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| {
                RemoteError::NetworkError(format!("remote URL cannot have a path: {}", self.base_url))
            })?
            .push(id);
        Ok(url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Authorization", format!("Bearer {key}")),
            None => req,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        self.authorize(req).send().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout(self.timeout_secs)
            } else {
                RemoteError::NetworkError(e.to_string())
            }
        })
    }
}

/// Map an error status to a `RemoteError`, consuming the body for the message.
async fn status_error(response: reqwest::Response, target: &str) -> RemoteError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    match status {
        401 | 403 => RemoteError::AuthenticationFailed(body),
        404 => RemoteError::NotFound(target.to_string()),
        _ => RemoteError::ApiError {
            status,
            message: body,
        },
    }
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
}

#[async_trait]
impl RemoteStore for HttpRemote {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<Document>> {
        let response = self
            .send(self.client.get(self.collection_url(collection)))
            .await?;

        // A collection that was never written reads as empty.
        if response.status().as_u16() == 404 {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(status_error(response, collection).await.into());
        }

        let body: ListResponse = response.json().await.map_err(|e| RemoteError::ApiError {
            status: 0,
            message: format!("failed to parse response: {e}"),
        })?;
        tracing::debug!("listed {} documents", body.documents.len());
        Ok(body.documents)
    }

    #[instrument(skip(self, data))]
    async fn put(&self, collection: &str, id: &str, data: &serde_json::Value) -> anyhow::Result<()> {
        let response = self
            .send(self.client.put(self.document_url(collection, id)?).json(data))
            .await?;
        if !response.status().is_success() {
            return Err(status_error(response, &format!("{collection}/{id}")).await.into());
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()> {
        let response = self
            .send(self.client.delete(self.document_url(collection, id)?))
            .await?;
        let status = response.status();
        if status.is_success() || status.as_u16() == 404 {
            return Ok(());
        }
        Err(status_error(response, &format!("{collection}/{id}")).await.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn list_documents() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/collections/questions/documents"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [
                    {"id": "nl-1", "data": {"id": "nl-1", "text": "Aurora?"}},
                    {"id": "nl-2", "data": {"id": "nl-2", "text": "Solar wind?"}}
                ]
            })))
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&server.uri(), Some("test-key".into()), None).unwrap();
        let docs = remote.list("questions").await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].id, "nl-2");
        assert_eq!(docs[0].data["text"], "Aurora?");
    }

    #[tokio::test]
    async fn missing_collection_lists_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/collections/learning_modules/documents"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&server.uri(), None, None).unwrap();
        assert!(remote.list("learning_modules").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn put_sends_document_body() {
        let server = MockServer::start().await;
        let data = json!({"id": "q1", "text": "Hot water?"});

        Mock::given(method("PUT"))
            .and(path("/v1/collections/questions/documents/q1"))
            .and(body_json(&data))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&format!("{}/", server.uri()), None, None).unwrap();
        remote.put("questions", "q1", &data).await.unwrap();
    }

    #[tokio::test]
    async fn document_ids_are_one_path_segment() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/v1/collections/questions/documents/a%2Fb%3Fc%20d"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/v1/collections/questions/documents/a%2Fb%3Fc%20d"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&server.uri(), None, None).unwrap();
        remote.put("questions", "a/b?c d", &json!({})).await.unwrap();
        remote.delete("questions", "a/b?c d").await.unwrap();
    }

    #[tokio::test]
    async fn delete_treats_404_as_success() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/v1/collections/questions/documents/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&server.uri(), None, None).unwrap();
        remote.delete("questions", "gone").await.unwrap();
    }

    #[tokio::test]
    async fn auth_failure_is_permanent() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&server.uri(), Some("wrong".into()), None).unwrap();
        let err = remote.put("stats", "anna", &json!({})).await.unwrap_err();
        let remote_err = err.downcast_ref::<RemoteError>().unwrap();
        assert!(matches!(remote_err, RemoteError::AuthenticationFailed(_)));
        assert!(remote_err.is_permanent());
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let remote = HttpRemote::new(&server.uri(), None, None).unwrap();
        let err = remote.list("questions").await.unwrap_err();
        let remote_err = err.downcast_ref::<RemoteError>().unwrap();
        assert!(matches!(remote_err, RemoteError::ApiError { status: 503, .. }));
        assert!(!remote_err.is_permanent());
    }

    #[tokio::test]
    async fn unreachable_server_is_network_error() {
        // Bind then drop a server so the port is closed.
        let uri = {
            let server = MockServer::start().await;
            server.uri()
        };
        let remote = HttpRemote::new(&uri, None, Some(2)).unwrap();
        let err = remote.list("questions").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RemoteError>(),
            Some(RemoteError::NetworkError(_)) | Some(RemoteError::Timeout(_))
        ));
    }
}
