//! Data models for registered applications and end users.
//!
//! Both sets are immutable after startup. They come either from the built-in
//! demo fixtures or from a JSON seed file.

mod application;
mod user;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use application::{ClientRegistry, RegisteredApplication};
pub use user::{User, UserDirectory, UserInfo, encode_credential};

/// Seed data loaded at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub applications: Vec<RegisteredApplication>,

    #[serde(default)]
    pub users: Vec<User>,
}

impl Seed {
    /// Parse seed data from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON does not match the seed schema.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Read seed data from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&raw)?)
    }

    /// Reject seeds with repeated application ids, client ids or user emails.
    ///
    /// # Errors
    ///
    /// Returns error naming the first duplicate found.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut ids = HashSet::new();
        let mut client_ids = HashSet::new();
        for app in &self.applications {
            anyhow::ensure!(ids.insert(app.id.as_str()), "duplicate application id: {}", app.id);
            anyhow::ensure!(
                client_ids.insert(app.client_id.as_str()),
                "duplicate client_id: {}",
                app.client_id
            );
        }

        let mut emails = HashSet::new();
        for user in &self.users {
            anyhow::ensure!(emails.insert(user.email.as_str()), "duplicate user email: {}", user.email);
        }
        Ok(())
    }

    /// Split the seed into its registry and directory.
    #[must_use]
    pub fn into_parts(self) -> (ClientRegistry, UserDirectory) {
        (ClientRegistry::new(self.applications), UserDirectory::new(self.users))
    }
}

/// Load the registry and directory from an optional seed file, falling back
/// to the demo fixtures.
///
/// # Errors
///
/// Returns error if a seed file is given but cannot be loaded.
pub fn load_fixtures(seed_file: Option<&Path>) -> anyhow::Result<(ClientRegistry, UserDirectory)> {
    match seed_file {
        Some(path) => {
            let seed = Seed::from_path(path)?;
            seed.validate()?;
            tracing::info!(
                path = %path.display(),
                applications = seed.applications.len(),
                users = seed.users.len(),
                "Loaded seed file"
            );
            Ok(seed.into_parts())
        }
        None => Ok((ClientRegistry::with_demo_applications(), UserDirectory::with_demo_users())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_from_json() {
        let json = r#"{
            "applications": [{
                "id": "app-1",
                "client_id": "abc",
                "client_secret": "s3cret",
                "redirect_uri": "https://rp.example.com/cb",
                "name": "Example RP"
            }],
            "users": [{
                "id": "u-1",
                "name": "Ada",
                "email": "ada@example.com",
                "credential": "YWRh",
                "roles": "admin"
            }]
        }"#;

        let (registry, directory) = Seed::from_json(json).unwrap().into_parts();
        assert_eq!(registry.find_by_id("app-1").unwrap().client_id, "abc");
        assert!(directory.find_by_email_and_credential("ada@example.com", "ada").is_some());
    }

    #[test]
    fn test_seed_rejects_duplicates() {
        let app = |id: &str, client_id: &str| RegisteredApplication {
            id: id.into(),
            client_id: client_id.into(),
            client_secret: "s".into(),
            redirect_uri: "https://rp.example.com/cb".into(),
            name: "RP".into(),
        };

        let seed = Seed { applications: vec![app("a", "x"), app("b", "x")], users: vec![] };
        assert!(seed.validate().unwrap_err().to_string().contains("duplicate client_id"));

        let seed = Seed { applications: vec![app("a", "x"), app("a", "y")], users: vec![] };
        assert!(seed.validate().unwrap_err().to_string().contains("duplicate application id"));

        let seed = Seed { applications: vec![app("a", "x"), app("b", "y")], users: vec![] };
        assert!(seed.validate().is_ok());
    }

    #[test]
    fn test_seed_sections_default_to_empty() {
        let seed = Seed::from_json("{}").unwrap();
        assert!(seed.applications.is_empty());
        assert!(seed.users.is_empty());
    }

    #[test]
    fn test_fixtures_fall_back_to_demo() {
        let (registry, directory) = load_fixtures(None).unwrap();
        assert!(registry.find_by_client_id("12345").is_some());
        assert_eq!(directory.len(), 3);
    }

    #[test]
    fn test_missing_seed_file_is_error() {
        assert!(load_fixtures(Some(Path::new("/definitely/not/here.json"))).is_err());
    }
}
