//! Property-based tests for credential parsing, redirect binding and token lifetimes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use oauth_provider::error::TokenError;
use oauth_provider::models::{ClientRegistry, RegisteredApplication, User, encode_credential};
use oauth_provider::server::oauth::{SessionStore, TokenIssuer};
use oauth_provider::server::oauth::credentials::{encode_basic, parse_basic};

const LIFETIME_SECS: i64 = 3600;

fn application(redirect_uri: &str) -> RegisteredApplication {
    RegisteredApplication {
        id: "app-id".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        redirect_uri: redirect_uri.to_string(),
        name: "App".to_string(),
    }
}

fn user(name: &str, email: &str) -> User {
    User {
        id: "user-id".to_string(),
        name: name.to_string(),
        email: email.to_string(),
        credential: encode_credential("pw"),
        roles: "user".to_string(),
    }
}

fn issuer() -> TokenIssuer {
    TokenIssuer::new_hs256(b"proptest-secret", Duration::from_secs(LIFETIME_SECS as u64))
}

/// Issue a code for a logged-in session and look it up with one field replaced.
fn lookup_with(field: usize, value: &str) -> (bool, bool) {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    rt.block_on(async {
        let registry = Arc::new(ClientRegistry::new([application("https://app.example/cb")]));
        let store = SessionStore::new(registry, Duration::from_secs(600));
        store.create("client", "", "st".to_string()).await.unwrap();
        store.attach_email("st", "a@b.c").await.unwrap();
        let (_, code) = store.attach_code("st").await.unwrap();

        let mut args =
            ["client".to_string(), "secret".to_string(), "https://app.example/cb".to_string(), code];
        let exact =
            store.find_by_code_and_client(&args[0], &args[1], &args[2], &args[3]).await.is_some();
        args[field] = value.to_string();
        let mismatched =
            store.find_by_code_and_client(&args[0], &args[1], &args[2], &args[3]).await.is_some();
        (exact, mismatched)
    })
}

proptest! {
    /// Any single mismatched field in the binding lookup yields not-found.
    #[test]
    fn binding_lookup_rejects_any_mismatch(field in 0usize..4, value in "[A-Za-z0-9:/._-]{0,40}") {
        prop_assume!(!["client", "secret", "https://app.example/cb"].contains(&value.as_str()) || field == 3);
        let (exact, mismatched) = lookup_with(field, &value);
        prop_assert!(exact);
        prop_assert!(!mismatched);
    }

    /// Credentials without a colon survive a Basic header round trip.
    #[test]
    fn basic_header_roundtrip(
        client_id in "[A-Za-z0-9._~-]{1,40}",
        client_secret in "[A-Za-z0-9._~!$&'()*+,;=-]{1,60}",
    ) {
        let parsed = parse_basic(&encode_basic(&client_id, &client_secret)).unwrap();
        prop_assert_eq!(parsed.client_id, client_id);
        prop_assert_eq!(parsed.client_secret, client_secret);
    }

    /// A payload with more than one colon is rejected.
    #[test]
    fn basic_header_rejects_extra_colons(
        a in "[a-z0-9]{0,10}",
        b in "[a-z0-9]{0,10}",
        c in "[a-z0-9]{0,10}",
    ) {
        let secret = format!("{b}:{c}");
        prop_assert!(parse_basic(&encode_basic(&a, &secret)).is_none());
    }

    /// Arbitrary header values never panic the parser.
    #[test]
    fn basic_header_arbitrary_input(value in ".{0,200}") {
        let _ = parse_basic(&value);
        let _ = parse_basic(&format!("Basic {value}"));
    }

    /// The redirect binding is an exact string comparison.
    #[test]
    fn redirect_binding_is_exact(
        registered in "https?://[a-z]{1,12}(:[0-9]{2,5})?/[a-z/]{0,20}",
        suffix in "[a-z/?=&]{1,8}",
    ) {
        let app = application(&registered);
        prop_assert!(app.matches_binding("secret", &registered));
        let extended = format!("{registered}{suffix}");
        prop_assert!(!app.matches_binding("secret", &extended));
        prop_assert!(!app.matches_binding("secret", &registered.to_uppercase()));
        prop_assert!(!app.matches_binding("other", &registered));
    }

    /// Tokens verify strictly before `exp` and expire from `exp` on.
    #[test]
    fn token_lifetime_boundary(
        issued_at in 1_000_000_000i64..2_000_000_000,
        offset in 0i64..(LIFETIME_SECS * 2),
        name in "[A-Za-z ]{1,30}",
    ) {
        let issuer = issuer();
        let issued = Utc.timestamp_opt(issued_at, 0).unwrap();
        let token = issuer.issue_at(&user(&name, "a@b.c"), issued).unwrap();

        let now = Utc.timestamp_opt(issued_at + offset, 0).unwrap();
        let result = issuer.verify_at(&token, now);
        if offset < LIFETIME_SECS {
            let claims = result.unwrap();
            prop_assert_eq!(claims.name.as_deref(), Some(name.as_str()));
            prop_assert_eq!(claims.exp, issued_at + LIFETIME_SECS);
        } else {
            prop_assert!(matches!(result, Err(TokenError::Expired)));
        }
    }

    /// Random strings are never accepted as tokens.
    #[test]
    fn token_rejects_arbitrary_input(token in ".{0,300}") {
        prop_assert!(issuer().verify(&token).is_err());
    }
}
