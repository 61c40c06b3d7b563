//! Firestore REST client for the hosted inventory collection.
//!
//! Documents live at `projects/{project}/databases/(default)/documents/{collection}/{name}`
//! and carry a single integer field:
//!
//! ```json
//! { "fields": { "quantity": { "integerValue": "3" } } }
//! ```
//!
//! - list: `GET {collection}` paged via `pageSize` / `nextPageToken`
//! - get: `GET {collection}/{name}`; HTTP 404 means absent
//! - put: `PATCH {collection}/{name}` (no precondition, so it upserts)
//! - delete: `DELETE {collection}/{name}`

use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use stockroom_core::ItemName;
use stockroom_inventory::InventoryItem;

use super::r#trait::{InventoryStore, StoreUnavailable, decode_record};

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_COLLECTION: &str = "inventory";
const PAGE_SIZE: u32 = 300;

/// Connection settings for a Firestore project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub collection: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            collection: DEFAULT_COLLECTION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            bearer_token: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(rename = "nextPageToken", default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    fields: Fields,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Fields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quantity: Option<IntegerValue>,
}

/// Firestore encodes 64-bit integers as JSON strings.
#[derive(Debug, Serialize, Deserialize)]
struct IntegerValue {
    #[serde(rename = "integerValue")]
    integer_value: serde_json::Value,
}

impl Document {
    fn with_quantity(quantity: u64) -> Self {
        Self {
            name: None,
            fields: Fields {
                quantity: Some(IntegerValue {
                    integer_value: serde_json::Value::String(quantity.to_string()),
                }),
            },
        }
    }

    fn decode(&self, key: &str) -> Result<InventoryItem, StoreUnavailable> {
        let raw = self
            .fields
            .quantity
            .as_ref()
            .map(|q| &q.integer_value)
            .ok_or_else(|| StoreUnavailable::new(format!("document {key:?} has no quantity")))?;

        let quantity = match raw {
            serde_json::Value::String(s) => s.parse::<i64>().ok(),
            serde_json::Value::Number(n) => n.as_i64(),
            _ => None,
        }
        .ok_or_else(|| {
            StoreUnavailable::new(format!("document {key:?} has a non-integer quantity"))
        })?;

        decode_record(key, quantity)
    }

    /// Last path segment of the document's resource name.
    fn key(&self) -> Result<&str, StoreUnavailable> {
        self.name
            .as_deref()
            .and_then(|n| n.rsplit('/').next())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StoreUnavailable::new("listed document has no name"))
    }
}

/// Inventory store backed by a Firestore collection over REST.
#[derive(Debug, Clone)]
pub struct FirestoreInventoryStore {
    client: reqwest::Client,
    collection_url: Url,
    api_key: Option<String>,
    bearer_token: Option<String>,
}

impl FirestoreInventoryStore {
    pub fn new(config: FirestoreConfig) -> Result<Self, StoreUnavailable> {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(
        client: reqwest::Client,
        config: FirestoreConfig,
    ) -> Result<Self, StoreUnavailable> {
        let mut collection_url = Url::parse(&config.base_url).map_err(|e| {
            StoreUnavailable::new(format!("invalid Firestore base URL {:?}: {e}", config.base_url))
        })?;

        collection_url
            .path_segments_mut()
            .map_err(|_| StoreUnavailable::new("Firestore base URL cannot carry a path"))?
            .pop_if_empty()
            .extend([
                "projects",
                config.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                config.collection.as_str(),
            ]);

        Ok(Self {
            client,
            collection_url,
            api_key: config.api_key,
            bearer_token: config.bearer_token,
        })
    }

    pub fn collection_url(&self) -> &Url {
        &self.collection_url
    }

    fn document_url(&self, name: &ItemName) -> Result<Url, StoreUnavailable> {
        let mut url = self.collection_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreUnavailable::new("Firestore collection URL cannot carry a path"))?
            .push(name.as_str());
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, mut url: Url) -> reqwest::RequestBuilder {
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        let req = self.client.request(method, url);
        match &self.bearer_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(
        &self,
        operation: &'static str,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, StoreUnavailable> {
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(operation, error = %e, "firestore request failed");
            StoreUnavailable::new(format!("firestore {operation} failed: {e}"))
        })?;
        tracing::debug!(operation, status = %resp.status(), "firestore response");
        Ok(resp)
    }

    async fn fail_status(operation: &'static str, resp: reqwest::Response) -> StoreUnavailable {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        tracing::warn!(operation, %status, "firestore returned an error status");
        StoreUnavailable::new(format!("firestore {operation} returned {status}: {body}"))
    }
}

#[async_trait::async_trait]
impl InventoryStore for FirestoreInventoryStore {
    async fn list(&self) -> Result<Vec<InventoryItem>, StoreUnavailable> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.collection_url.clone();
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &PAGE_SIZE.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let resp = self
                .send("list", self.request(reqwest::Method::GET, url))
                .await?;
            if !resp.status().is_success() {
                return Err(Self::fail_status("list", resp).await);
            }

            let page: ListDocumentsResponse = resp
                .json()
                .await
                .map_err(|e| {
                    StoreUnavailable::new(format!("firestore list: malformed response: {e}"))
                })?;

            for doc in &page.documents {
                items.push(doc.decode(doc.key()?)?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn get(&self, name: &ItemName) -> Result<Option<InventoryItem>, StoreUnavailable> {
        let url = self.document_url(name)?;
        let resp = self.send("get", self.request(reqwest::Method::GET, url)).await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Self::fail_status("get", resp).await);
        }

        let doc: Document = resp
            .json()
            .await
            .map_err(|e| StoreUnavailable::new(format!("firestore get: malformed response: {e}")))?;
        doc.decode(name.as_str()).map(Some)
    }

    async fn put(&self, name: &ItemName, quantity: u64) -> Result<(), StoreUnavailable> {
        if quantity == 0 {
            return Err(StoreUnavailable::new(format!(
                "refusing to store {name} with quantity 0"
            )));
        }

        let url = self.document_url(name)?;
        let req = self
            .request(reqwest::Method::PATCH, url)
            .json(&Document::with_quantity(quantity));
        let resp = self.send("put", req).await?;

        if !resp.status().is_success() {
            return Err(Self::fail_status("put", resp).await);
        }
        Ok(())
    }

    async fn delete(&self, name: &ItemName) -> Result<(), StoreUnavailable> {
        let url = self.document_url(name)?;
        let resp = self
            .send("delete", self.request(reqwest::Method::DELETE, url))
            .await?;

        // Deleting a missing document is not an error.
        if resp.status().is_success() || resp.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(Self::fail_status("delete", resp).await)
    }
}
