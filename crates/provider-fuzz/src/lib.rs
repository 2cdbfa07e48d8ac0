//! Fuzzing library for oauth-provider.
//!
//! Targets cover the inputs an unauthenticated caller controls: bearer tokens,
//! `Basic` authorization headers and seed documents.
//!
//! # Usage
//!
//! ```bash
//! cd crates/provider-fuzz
//! cargo +nightly fuzz run fuzz_token_verify -- -max_total_time=60
//! ```

pub use oauth_provider::models;
pub use oauth_provider::server::oauth::{TokenIssuer, credentials};
