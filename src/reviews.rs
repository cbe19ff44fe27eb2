use log::*;
use serde_json::Value;

use crate::model::{Document, NewReview, ReviewRecord};
use crate::services::{reviews_path, DocumentStore, StoreError, REVIEWS, TRIPS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostPath {
    ArrayUnion,
    ReadModifyWrite,
}

pub async fn load_reviews(
    store: &dyn DocumentStore,
    trip_id: &str,
) -> Result<Vec<ReviewRecord>, StoreError> {
    match store.get(TRIPS, trip_id).await? {
        Some(doc) => reviews_for(store, &doc).await,
        None => Ok(Vec::new()),
    }
}

/// The trip's inline `reviews` array when it has entries; otherwise the
/// `reviews` sub-collection. The two are never combined.
pub async fn reviews_for(
    store: &dyn DocumentStore,
    trip: &Document,
) -> Result<Vec<ReviewRecord>, StoreError> {
    if let Some(inline) = inline_reviews(trip) {
        return Ok(inline);
    }
    let docs = store.list(&reviews_path(&trip.id)).await?;
    trace!("Read {} reviews from sub-collection of {}.", docs.len(), trip.id);
    Ok(docs.iter().map(ReviewRecord::from_subcollection).collect())
}

fn inline_reviews(trip: &Document) -> Option<Vec<ReviewRecord>> {
    let entries = trip.get(REVIEWS)?.as_array()?;
    if entries.is_empty() {
        return None;
    }
    Some(
        entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| ReviewRecord::from_inline(idx, entry))
            .collect(),
    )
}

/// Appends a review to the trip's inline array. Tries an atomic array union
/// first; if the store refuses, reads the current array and writes it back
/// with the review appended.
///
/// The fallback is not safe against concurrent writers: a review posted by
/// someone else between the read and the write is lost.
pub async fn post_review(
    store: &dyn DocumentStore,
    trip_id: &str,
    review: &NewReview,
) -> Result<PostPath, StoreError> {
    let element = review.to_value();
    match store
        .array_union(TRIPS, trip_id, REVIEWS, element.clone())
        .await
    {
        Ok(()) => Ok(PostPath::ArrayUnion),
        Err(why) => {
            warn!("Array update failed, attempting safe write: {}", why);
            let current = store.get(TRIPS, trip_id).await?;
            let mut entries: Vec<Value> = current
                .as_ref()
                .and_then(|doc| doc.get(REVIEWS))
                .and_then(Value::as_array)
                .map(|items| items.iter().filter(|v| !v.is_null()).cloned().collect())
                .unwrap_or_default();
            entries.push(element);
            store
                .update_field(TRIPS, trip_id, REVIEWS, Value::Array(entries))
                .await?;
            Ok(PostPath::ReadModifyWrite)
        }
    }
}
