use std::path::PathBuf;
use std::time::Duration;

use crate::{model::UserIdentity, GenericError};

pub const DEFAULT_POLL_SECS: u64 = 5;
pub const DEFAULT_IMAGE_DIR: &str = "./citytrips_images";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub supabase_endpoint: Option<String>,
    pub supabase_token: Option<String>,
    pub google_maps_token: Option<String>,
    pub poll_interval: Duration,
    pub image_dir: PathBuf,
    pub user: Option<UserIdentity>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            supabase_endpoint: None,
            supabase_token: None,
            google_maps_token: None,
            poll_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            user: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, GenericError> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, GenericError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let poll_secs = match var("CITYTRIP_POLL_SECS") {
            Some(secs) => secs.trim().parse::<u64>()?,
            None => DEFAULT_POLL_SECS,
        };
        let user = var("CITYTRIP_USER_ID").map(|id| UserIdentity {
            id,
            display_name: var("CITYTRIP_USER_NAME"),
            email: var("CITYTRIP_USER_EMAIL"),
        });
        Ok(Config {
            supabase_endpoint: var("SUPABASE_ENDPOINT"),
            supabase_token: var("SUPABASE_TOKEN"),
            google_maps_token: var("GOOGLE_MAPS_TOKEN"),
            poll_interval: Duration::from_secs(poll_secs.max(1)),
            image_dir: var("CITYTRIP_IMAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR)),
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, GenericError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        assert_eq!(config(&[]).unwrap(), Config::default());
    }

    #[test]
    fn reads_user_and_interval() {
        let config = config(&[
            ("CITYTRIP_POLL_SECS", "12"),
            ("CITYTRIP_USER_ID", "u1"),
            ("CITYTRIP_USER_EMAIL", "ann@example.com"),
            ("CITYTRIP_USER_NAME", " "),
        ])
        .unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(12));
        let user = config.user.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.display_name, None);
        assert_eq!(user.label(), "ann@example.com");
    }

    #[test]
    fn bad_interval_is_an_error() {
        assert!(config(&[("CITYTRIP_POLL_SECS", "soon")]).is_err());
    }
}
