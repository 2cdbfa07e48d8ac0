//! End users and their credentials.
//!
//! Credentials are stored with a reversible base64 encoding. This is a
//! placeholder for demos and tests only: a real deployment must swap
//! [`encode_credential`] for a salted one-way hash while keeping the
//! `email + secret -> user` contract of [`UserDirectory::find_by_email_and_credential`].

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

/// An end user who can sign in at the login page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Internal identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Login email, unique within the directory.
    pub email: String,

    /// Encoded credential (see [`encode_credential`]).
    pub credential: String,

    /// Role string carried into access tokens.
    pub roles: String,
}

/// Projection of a user released by the user-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub email: String,
    pub roles: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self { name: user.name.clone(), email: user.email.clone(), roles: user.roles.clone() }
    }
}

/// Encode a presented password into its stored form.
#[must_use]
pub fn encode_credential(password: &str) -> String {
    STANDARD.encode(password.as_bytes())
}

/// Read-only lookup over the users preloaded at startup.
#[derive(Debug, Default)]
pub struct UserDirectory {
    by_email: HashMap<String, User>,
}

impl UserDirectory {
    /// Build a directory from a fixed set of users.
    #[must_use]
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self { by_email: users.into_iter().map(|u| (u.email.clone(), u)).collect() }
    }

    /// Directory with the demo accounts.
    #[must_use]
    pub fn with_demo_users() -> Self {
        Self::new([
            User {
                id: "af8ab5ea-8cc9-44a0-8d83-c4e9462166bc".into(),
                name: "John Doe".into(),
                email: "john.doe@email.com".into(),
                credential: "ampq".into(), // jjj
                roles: "*".into(),
            },
            User {
                id: "2ea086fe-d0e1-4e05-b24b-d954c45a3f52".into(),
                name: "Marion Ruhl".into(),
                email: "marion.ruhl@email.com".into(),
                credential: "cGFzc3dvcmQ=".into(), // password
                roles: "user".into(),
            },
            User {
                id: "bde77f50-7a67-4ce2-88a0-3ad3fcc05340".into(),
                name: "Angela Coghill".into(),
                email: "angela.coghill@email.com".into(),
                credential: "YW5nZWxhY29nMTIzNDU=".into(), // angelacog12345
                roles: "user".into(),
            },
        ])
    }

    /// Look up a user by email and verify the presented password.
    #[must_use]
    pub fn find_by_email_and_credential(&self, email: &str, password: &str) -> Option<&User> {
        let user = self.by_email.get(email)?;
        if user.credential == encode_credential(password) {
            Some(user)
        } else {
            tracing::debug!(email = %email, "Credential mismatch");
            None
        }
    }

    /// Look up a user by email.
    #[must_use]
    pub fn find_by_email(&self, email: &str) -> Option<&User> {
        self.by_email.get(email)
    }

    /// Number of users in the directory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_email.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_email.is_empty()
    }
}
