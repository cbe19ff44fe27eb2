use std::sync::Arc;

use chrono::Utc;
use log::*;

use crate::model::{Document, Message, UserProfile};
use crate::services::subscription::CollectionSubscription;
use crate::services::{DocumentStore, Query, StoreError, MESSAGES, USERS};

use super::{Notice, Notices};

pub const UNKNOWN_SENDER: &str = "Unknown";

/// Messages sent to the signed-in user, and the people they can write to.
pub struct Inbox {
    store: Arc<dyn DocumentStore>,
    user_id: String,
    contacts: Vec<UserProfile>,
    received: Vec<Message>,
    subscription: Option<CollectionSubscription>,
    notices: Notices,
}

impl Inbox {
    pub fn new(store: Arc<dyn DocumentStore>, user_id: &str) -> Self {
        Inbox {
            store,
            user_id: user_id.to_string(),
            contacts: Vec::new(),
            received: Vec::new(),
            subscription: None,
            notices: Notices::default(),
        }
    }

    pub fn contacts(&self) -> &[UserProfile] {
        &self.contacts
    }

    pub fn received(&self) -> &[Message] {
        &self.received
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.take()
    }

    /// Everyone in `users` except the signed-in user.
    pub async fn load_contacts(&mut self) {
        match self.store.list(USERS).await {
            Ok(docs) => {
                self.contacts = docs
                    .iter()
                    .map(UserProfile::from_document)
                    .filter(|profile| profile.user_id != self.user_id)
                    .collect();
            }
            Err(why) => warn!("Failed to load users: {}", why),
        }
    }

    pub async fn attach(&mut self) -> Result<(), StoreError> {
        let query = Query::collection(MESSAGES).where_eq("to", self.user_id.clone());
        self.subscription = Some(self.store.subscribe(&query).await?);
        Ok(())
    }

    pub fn detach(&mut self) {
        self.subscription = None;
    }

    pub async fn next_update(&mut self) -> bool {
        let update = match self.subscription.as_mut() {
            Some(subscription) => subscription.next().await,
            None => None,
        };
        match update {
            Some(Ok(docs)) => {
                self.receive(&docs).await;
                true
            }
            Some(Err(why)) => {
                warn!("Failed to listen for messages: {}", why);
                true
            }
            None => {
                self.subscription = None;
                false
            }
        }
    }

    /// Adds messages from a snapshot that are not shown yet, each labelled
    /// with its sender's name.
    pub async fn receive(&mut self, docs: &[Document]) {
        for doc in docs {
            let mut message = Message::from_document(doc);
            if self.received.iter().any(|known| known.same_as(&message)) {
                continue;
            }
            match self.store.query_eq(USERS, "userId", &message.from).await {
                Ok(senders) => {
                    message.from_name = senders
                        .first()
                        .map(UserProfile::from_document)
                        .map(|profile| profile.name)
                        .filter(|name| !name.is_empty())
                        .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
                    self.received.push(message);
                }
                Err(why) => warn!("Failed to look up sender {}: {}", message.from, why),
            }
        }
    }

    pub async fn send(&mut self, to: &str, text: &str) -> bool {
        let message = Message::new(&self.user_id, to, text, Utc::now().timestamp_millis());
        match self.store.add(MESSAGES, message.to_value()).await {
            Ok(id) => {
                debug!("Sent message {} to {}.", id, to);
                true
            }
            Err(why) => {
                self.notices
                    .failure(format!("Failed to send message: {}", why));
                false
            }
        }
    }
}
