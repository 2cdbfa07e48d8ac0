//! Registered client applications.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A client application allowed to run the authorization code flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredApplication {
    /// Internal identifier, bound to authorization sessions.
    pub id: String,

    /// Public client identifier presented at `/authorize` and `/token`.
    pub client_id: String,

    /// Shared secret presented at `/token`.
    pub client_secret: String,

    /// The only redirect URI this client may use (exact match).
    pub redirect_uri: String,

    /// Display name shown on the consent page.
    pub name: String,
}

impl RegisteredApplication {
    /// Check a client secret and redirect URI against the registration.
    #[must_use]
    pub fn matches_binding(&self, client_secret: &str, redirect_uri: &str) -> bool {
        self.client_secret == client_secret && self.redirect_uri == redirect_uri
    }
}

/// Read-only lookup over the applications preloaded at startup.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    by_client_id: HashMap<String, RegisteredApplication>,
    client_ids_by_id: HashMap<String, String>,
}

impl ClientRegistry {
    /// Build a registry from a fixed set of applications.
    ///
    /// A later entry sharing a client id or an internal id with an earlier one
    /// replaces it under both keys, so `find_by_id(id)` always returns the
    /// application whose `id` is `id`.
    #[must_use]
    pub fn new(applications: impl IntoIterator<Item = RegisteredApplication>) -> Self {
        let mut registry = Self::default();
        for app in applications {
            if let Some(old) = registry.by_client_id.remove(&app.client_id) {
                registry.client_ids_by_id.remove(&old.id);
            }
            if let Some(old_client_id) = registry.client_ids_by_id.remove(&app.id) {
                registry.by_client_id.remove(&old_client_id);
            }
            registry.client_ids_by_id.insert(app.id.clone(), app.client_id.clone());
            registry.by_client_id.insert(app.client_id.clone(), app);
        }
        registry
    }

    /// Registry holding the demo relying party used by the bundled client apps.
    #[must_use]
    pub fn with_demo_applications() -> Self {
        Self::new([RegisteredApplication {
            id: "4b3d6d22-a317-456c-9f2e-793bd6a29ac0".into(),
            client_id: "12345".into(),
            client_secret: "dkjdqqdkjdqjdqjkqefv".into(),
            redirect_uri: "http://localhost:8081/redirect".into(),
            name: "TheCommunity".into(),
        }])
    }

    /// Look up an application by its public client id.
    #[must_use]
    pub fn find_by_client_id(&self, client_id: &str) -> Option<&RegisteredApplication> {
        self.by_client_id.get(client_id)
    }

    /// Look up an application by its internal id.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&RegisteredApplication> {
        self.client_ids_by_id.get(id).and_then(|client_id| self.by_client_id.get(client_id))
    }

    /// Number of registered applications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_client_id.len()
    }

    /// Whether no application is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_client_id.is_empty()
    }
}
