use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::*;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::Document;

use super::database::{DocumentStore, Query, StoreError};
use super::subscription::{
    CollectionSubscription, DocumentSubscription, Subscription, UpdateSender,
};

enum Listener {
    Query(Query, UpdateSender<Vec<Document>>),
    Document(String, String, UpdateSender<Option<Document>>),
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    active: HashMap<u64, Listener>,
}

type Collections = HashMap<String, Vec<Document>>;

/// In-memory document store for tests and local runs. Keeps insertion order,
/// counts reads per collection path, and can be told to deny access to a
/// collection or to reject array unions.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    listeners: Arc<Mutex<Listeners>>,
    reads: Mutex<HashMap<String, usize>>,
    denied: Mutex<HashSet<String>>,
    reject_array_union: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `{ "<collection path>": { "<id>": { ...fields } } }`.
    pub async fn from_seed(seed: &Value) -> Result<Self, StoreError> {
        let store = MemoryStore::new();
        let collections = seed
            .as_object()
            .ok_or_else(|| StoreError::Backend("seed must be a map of collections".to_string()))?;
        for (collection, docs) in collections {
            let docs = docs.as_object().ok_or_else(|| {
                StoreError::Backend(format!("collection '{}' must be a map of documents", collection))
            })?;
            for (id, data) in docs {
                store.insert(collection, id, data.clone()).await;
            }
        }
        Ok(store)
    }

    pub async fn insert(&self, collection: &str, id: &str, data: Value) {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|doc| doc.id == id) {
            Some(doc) => doc.data = data,
            None => docs.push(Document::new(id, data)),
        }
        self.notify(&collections, collection);
    }

    /// Number of reads (`run`, `get` and subscription snapshots) served for a
    /// collection path.
    pub fn reads(&self, collection: &str) -> usize {
        self.lock_reads().get(collection).copied().unwrap_or(0)
    }

    pub fn deny(&self, collection: &str) {
        self.lock_denied().insert(collection.to_string());
    }

    pub fn reject_array_union(&self, reject: bool) {
        self.reject_array_union.store(reject, Ordering::SeqCst);
    }

    pub fn active_listeners(&self) -> usize {
        lock(&self.listeners).active.len()
    }

    fn lock_reads(&self) -> std::sync::MutexGuard<'_, HashMap<String, usize>> {
        lock(&self.reads)
    }

    fn lock_denied(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        lock(&self.denied)
    }

    fn check_access(&self, collection: &str) -> Result<(), StoreError> {
        if self.lock_denied().contains(collection) {
            return Err(StoreError::PermissionDenied(collection.to_string()));
        }
        Ok(())
    }

    fn count_read(&self, collection: &str) {
        *self.lock_reads().entry(collection.to_string()).or_default() += 1;
    }

    fn register(&self, listener: Listener) -> Box<dyn FnOnce() + Send> {
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.active.insert(id, listener);
        let shared = Arc::clone(&self.listeners);
        Box::new(move || {
            lock(&shared).active.remove(&id);
            trace!("Released listener {}.", id);
        })
    }

    /// Pushes fresh snapshots to every listener watching `collection`.
    fn notify(&self, collections: &Collections, collection: &str) {
        let mut listeners = lock(&self.listeners);
        listeners.active.retain(|_, listener| match listener {
            Listener::Query(query, sender) if query.collection == collection => sender
                .send(Ok(select(collections, query)))
                .is_ok(),
            Listener::Document(path, id, sender) if path.as_str() == collection => sender
                .send(Ok(find(collections, path, id)))
                .is_ok(),
            _ => true,
        });
    }

    async fn modify<F>(&self, collection: &str, id: &str, change: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Map<String, Value>) -> Result<(), StoreError> + Send,
    {
        self.check_access(collection)?;
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", collection, id)))?;
        if !doc.data.is_object() {
            doc.data = Value::Object(Map::new());
        }
        if let Value::Object(fields) = &mut doc.data {
            change(fields)?;
        }
        self.notify(&collections, collection);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn select(collections: &Collections, query: &Query) -> Vec<Document> {
    collections
        .get(&query.collection)
        .map(|docs| docs.iter().filter(|doc| query.matches(doc)).cloned().collect())
        .unwrap_or_default()
}

fn find(collections: &Collections, collection: &str, id: &str) -> Option<Document> {
    collections
        .get(collection)
        .and_then(|docs| docs.iter().find(|doc| doc.id == id))
        .cloned()
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn run(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.check_access(&query.collection)?;
        self.count_read(&query.collection);
        let collections = self.collections.read().await;
        Ok(select(&collections, query))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check_access(collection)?;
        self.count_read(collection);
        let collections = self.collections.read().await;
        Ok(find(&collections, collection, id))
    }

    async fn add(&self, collection: &str, data: Value) -> Result<String, StoreError> {
        self.check_access(collection)?;
        let id = Uuid::new_v4().simple().to_string();
        self.insert(collection, &id, data).await;
        Ok(id)
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.modify(collection, id, |fields| {
            fields.insert(field.to_string(), value);
            Ok(())
        })
        .await
    }

    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        element: Value,
    ) -> Result<(), StoreError> {
        if self.reject_array_union.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected(format!(
                "array union on {}/{}",
                collection, id
            )));
        }
        self.modify(collection, id, |fields| {
            match fields.get_mut(field) {
                Some(Value::Array(items)) => {
                    if !items.contains(&element) {
                        items.push(element);
                    }
                }
                _ => {
                    fields.insert(field.to_string(), Value::Array(vec![element]));
                }
            }
            Ok(())
        })
        .await
    }

    async fn subscribe(&self, query: &Query) -> Result<CollectionSubscription, StoreError> {
        if let Err(why) = self.check_access(&query.collection) {
            let (sender, subscription) = Subscription::channel(|| {});
            let _ = sender.send(Err(why));
            return Ok(subscription);
        }
        self.count_read(&query.collection);
        let collections = self.collections.read().await;
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        let _ = sender.send(Ok(select(&collections, query)));
        let release = self.register(Listener::Query(query.clone(), sender));
        Ok(Subscription::new(receiver, release))
    }

    async fn subscribe_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<DocumentSubscription, StoreError> {
        if let Err(why) = self.check_access(collection) {
            let (sender, subscription) = Subscription::channel(|| {});
            let _ = sender.send(Err(why));
            return Ok(subscription);
        }
        self.count_read(collection);
        let collections = self.collections.read().await;
        let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
        let _ = sender.send(Ok(find(&collections, collection, id)));
        let release = self.register(Listener::Document(
            collection.to_string(),
            id.to_string(),
            sender,
        ));
        Ok(Subscription::new(receiver, release))
    }
}
