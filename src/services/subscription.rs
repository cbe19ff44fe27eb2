use tokio::sync::mpsc;

use crate::model::Document;

use super::StoreError;

pub type CollectionSubscription = Subscription<Vec<Document>>;
pub type DocumentSubscription = Subscription<Option<Document>>;

pub type UpdateSender<T> = mpsc::UnboundedSender<Result<T, StoreError>>;

/// A live listener on the store. Updates arrive in order; the first one is the
/// snapshot at the time of subscribing. Dropping the handle removes the
/// listener.
pub struct Subscription<T> {
    receiver: mpsc::UnboundedReceiver<Result<T, StoreError>>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl<T> Subscription<T> {
    pub fn new<F>(receiver: mpsc::UnboundedReceiver<Result<T, StoreError>>, release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Subscription {
            receiver,
            release: Some(Box::new(release)),
        }
    }

    pub fn channel<F>(release: F) -> (UpdateSender<T>, Self)
    where
        F: FnOnce() + Send + 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        (sender, Subscription::new(receiver, release))
    }

    /// Waits for the next update. `None` once the store has stopped
    /// delivering, e.g. after reporting an error.
    pub async fn next(&mut self) -> Option<Result<T, StoreError>> {
        self.receiver.recv().await
    }

    pub fn try_next(&mut self) -> Option<Result<T, StoreError>> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.release.is_none())
            .finish()
    }
}
