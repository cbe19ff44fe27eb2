use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::*;
use postgrest::{Builder, Postgrest};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{config::Config, model::Document, GenericError};

use super::subscription::{CollectionSubscription, DocumentSubscription, Subscription};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("permission denied on '{0}'")]
    PermissionDenied(String),
    #[error("document {0} not found")]
    NotFound(String),
    #[error("write rejected: {0}")]
    Rejected(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::PermissionDenied(_))
    }
}

/// A collection read, optionally narrowed to documents whose string field
/// equals a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub collection: String,
    pub field_eq: Option<(String, String)>,
}

impl Query {
    pub fn collection(collection: impl Into<String>) -> Self {
        Query {
            collection: collection.into(),
            field_eq: None,
        }
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.field_eq = Some((field.into(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match &self.field_eq {
            None => true,
            Some((field, value)) => doc.get(field).and_then(Value::as_str) == Some(value.as_str()),
        }
    }
}

/// The remote document database. Collections are addressed by path, so the
/// reviews under a trip live at `citytrips/{id}/reviews`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn run(&self, query: &Query) -> Result<Vec<Document>, StoreError>;
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;
    async fn add(&self, collection: &str, data: Value) -> Result<String, StoreError>;
    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError>;
    /// Atomically appends `element` to an array field unless an equal element
    /// is already there.
    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        element: Value,
    ) -> Result<(), StoreError>;
    async fn subscribe(&self, query: &Query) -> Result<CollectionSubscription, StoreError>;
    async fn subscribe_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<DocumentSubscription, StoreError>;

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.run(&Query::collection(collection)).await
    }

    async fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        self.run(&Query::collection(collection).where_eq(field, value))
            .await
    }
}

/// Document store on top of a Supabase `documents` table
/// (`path text, id text, data jsonb`, primary key `(path, id)`). Field updates
/// go through the `set_document_field` and `array_union` database functions,
/// both taking `(p_path, p_id, p_field, p_value)`.
#[derive(Clone)]
pub struct SupabaseService {
    client: Arc<Postgrest>,
    supabase_token: String,
    poll_interval: Duration,
}

const TABLE: &str = "documents";

impl SupabaseService {
    pub fn new(config: &Config) -> Result<Self, GenericError> {
        let endpoint = config
            .supabase_endpoint
            .as_deref()
            .ok_or("SUPABASE_ENDPOINT not set.")?;
        let supabase_token = config
            .supabase_token
            .clone()
            .ok_or("SUPABASE_TOKEN not set.")?;
        let client = Postgrest::new(endpoint).insert_header("apikey", supabase_token.clone());
        Ok(SupabaseService {
            client: Arc::new(client),
            supabase_token,
            poll_interval: config.poll_interval,
        })
    }

    fn documents(&self) -> Builder {
        self.client.from(TABLE).auth(&self.supabase_token)
    }

    async fn call(
        &self,
        function: &str,
        path: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let params = json!({
            "p_path": path,
            "p_id": id,
            "p_field": field,
            "p_value": value,
        });
        let builder = self
            .client
            .rpc(function, params.to_string())
            .auth(&self.supabase_token);
        send(path, builder).await?;
        Ok(())
    }
}

async fn send(path: &str, builder: Builder) -> Result<String, StoreError> {
    let response = builder
        .execute()
        .await
        .map_err(|why| StoreError::Backend(why.to_string()))?;
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|why| StoreError::Backend(why.to_string()))?;
    trace!("Supabase answered {} for '{}'.", status, path);
    match status {
        200..=299 => Ok(body),
        401 | 403 => Err(StoreError::PermissionDenied(path.to_string())),
        404 => Err(StoreError::NotFound(path.to_string())),
        409 => Err(StoreError::Rejected(body)),
        _ => Err(StoreError::Backend(format!("{}: {}", status, body))),
    }
}

/// Re-runs `fetch` on every tick and forwards results that differ from the
/// previous one. Stops after the first error or once the subscription is
/// dropped.
fn poll<T, F, Fut>(interval: Duration, mut fetch: F) -> Subscription<T>
where
    T: PartialEq + Clone + Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, StoreError>> + Send + 'static,
{
    let (sender, receiver) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        let mut last: Option<T> = None;
        loop {
            ticker.tick().await;
            match fetch().await {
                Ok(snapshot) => {
                    if last.as_ref() == Some(&snapshot) {
                        continue;
                    }
                    if sender.send(Ok(snapshot.clone())).is_err() {
                        break;
                    }
                    last = Some(snapshot);
                }
                Err(why) => {
                    let _ = sender.send(Err(why));
                    break;
                }
            }
        }
    });
    let abort = task.abort_handle();
    Subscription::new(receiver, move || abort.abort())
}

#[async_trait]
impl DocumentStore for SupabaseService {
    async fn run(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut builder = self
            .documents()
            .eq("path", &query.collection)
            .select("id,data");
        if let Some((field, value)) = &query.field_eq {
            builder = builder.eq(format!("data->>{}", field), value);
        }
        let raw_resp = send(&query.collection, builder).await?;
        let docs: Vec<Document> = serde_json::from_str(&raw_resp)?;
        trace!("Read {} documents from '{}'.", docs.len(), query.collection);
        Ok(docs)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let builder = self
            .documents()
            .eq("path", collection)
            .eq("id", id)
            .select("id,data");
        let raw_resp = send(collection, builder).await?;
        let docs: Vec<Document> = serde_json::from_str(&raw_resp)?;
        Ok(docs.into_iter().next())
    }

    async fn add(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        let id = Uuid::new_v4().simple().to_string();
        let json = json!({
            "path": collection,
            "id": id,
            "data": data
        })
        .to_string();
        send(collection, self.documents().insert(json)).await?;
        debug!("Added document {} to '{}'.", id, collection);
        Ok(id)
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.call("set_document_field", collection, id, field, value)
            .await
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        element: Value,
    ) -> Result<(), StoreError> {
        self.call("array_union", collection, id, field, element).await
    }

    async fn subscribe(&self, query: &Query) -> Result<CollectionSubscription, StoreError> {
        let service = self.clone();
        let query = query.clone();
        Ok(poll(self.poll_interval, move || {
            let service = service.clone();
            let query = query.clone();
            async move { service.run(&query).await }
        }))
    }

    async fn subscribe_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<DocumentSubscription, StoreError> {
        let service = self.clone();
        let collection = collection.to_string();
        let id = id.to_string();
        Ok(poll(self.poll_interval, move || {
            let service = service.clone();
            let collection = collection.clone();
            let id = id.clone();
            async move { service.get(&collection, &id).await }
        }))
    }
}
