use log::*;

use crate::model::{UserIdentity, UserProfile};
use crate::services::auth::AuthProvider;
use crate::services::{DocumentStore, USERS};
use crate::CityTripError;

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_credentials(email: &str, password: &str) -> Result<(), CityTripError> {
    if email.trim().is_empty() {
        return Err(CityTripError::Validation("Email is required".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CityTripError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub async fn sign_in(
    auth: &dyn AuthProvider,
    email: &str,
    password: &str,
) -> Result<UserIdentity, CityTripError> {
    validate_credentials(email, password)?;
    auth.sign_in(email.trim(), password).await
}

/// Creates the account and its `users` profile, named after the email's
/// local part.
pub async fn register(
    auth: &dyn AuthProvider,
    store: &dyn DocumentStore,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<UserIdentity, CityTripError> {
    validate_credentials(email, password)?;
    if password != confirm_password {
        return Err(CityTripError::Validation(
            "Passwords do not match".to_string(),
        ));
    }
    let email = email.trim();
    let user = auth.sign_up(email, password).await?;
    let profile = UserProfile::for_signup(&user.id, email);
    store.add(USERS, profile.to_value()).await?;
    debug!("Registered {} as '{}'.", user.id, profile.name);
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::MemoryAuth;
    use crate::services::MemoryStore;
    use serde_json::json;

    #[test]
    fn credential_rules() {
        assert!(validate_credentials("", "secret1").is_err());
        assert!(validate_credentials("a@b.c", "12345").is_err());
        assert!(validate_credentials("a@b.c", "123456").is_ok());
    }

    #[tokio::test]
    async fn register_writes_profile_and_signs_in() {
        let auth = MemoryAuth::new();
        let store = MemoryStore::new();
        let user = register(&auth, &store, " jan@ap.be ", "secret1", "secret1")
            .await
            .unwrap();
        assert_eq!(auth.current_user(), Some(user.clone()));

        let users = store.list(USERS).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].data, json!({"userId": user.id, "name": "jan"}));

        auth.sign_out();
        assert_eq!(sign_in(&auth, "jan@ap.be", "secret1").await.unwrap(), user);
        assert!(sign_in(&auth, "jan@ap.be", "wrong-pw").await.is_err());
    }

    #[tokio::test]
    async fn mismatched_confirmation_creates_nothing() {
        let auth = MemoryAuth::new();
        let store = MemoryStore::new();
        assert!(register(&auth, &store, "a@b.c", "secret1", "secret2")
            .await
            .is_err());
        assert!(auth.current_user().is_none());
        assert!(store.list(USERS).await.unwrap().is_empty());
    }
}
