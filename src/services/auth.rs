use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use log::*;
use uuid::Uuid;

use crate::{model::UserIdentity, CityTripError};

#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<UserIdentity>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, CityTripError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity, CityTripError>;
    fn sign_out(&self);
}

struct Account {
    password: String,
    identity: UserIdentity,
}

/// Accounts held in memory. The command line starts it already signed in as
/// the configured user.
#[derive(Default)]
pub struct MemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    current: Mutex<Option<UserIdentity>>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: UserIdentity) -> Self {
        let auth = MemoryAuth::new();
        *auth.lock_current() = Some(user);
        auth
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<UserIdentity>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_accounts(&self) -> std::sync::MutexGuard<'_, HashMap<String, Account>> {
        self.accounts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    fn current_user(&self) -> Option<UserIdentity> {
        self.lock_current().clone()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, CityTripError> {
        let identity = {
            let accounts = self.lock_accounts();
            match accounts.get(email) {
                Some(account) if account.password == password => account.identity.clone(),
                _ => {
                    return Err(CityTripError::Auth(
                        "The email or password is incorrect.".to_string(),
                    ))
                }
            }
        };
        debug!("Signed in {}.", identity.id);
        *self.lock_current() = Some(identity.clone());
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity, CityTripError> {
        let identity = {
            let mut accounts = self.lock_accounts();
            if accounts.contains_key(email) {
                return Err(CityTripError::Auth(
                    "The email address is already in use by another account.".to_string(),
                ));
            }
            let identity = UserIdentity {
                id: Uuid::new_v4().simple().to_string(),
                display_name: None,
                email: Some(email.to_string()),
            };
            accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    identity: identity.clone(),
                },
            );
            identity
        };
        *self.lock_current() = Some(identity.clone());
        Ok(identity)
    }

    fn sign_out(&self) {
        *self.lock_current() = None;
    }
}
