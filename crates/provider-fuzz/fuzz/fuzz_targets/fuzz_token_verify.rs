#![no_main]

use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use oauth_provider::server::oauth::{TokenIssuer, claims_to_user};

fuzz_target!(|data: &[u8]| {
    // Arbitrary text must be rejected without panicking
    if let Ok(token) = std::str::from_utf8(data) {
        let issuer = TokenIssuer::new_hs256(b"fuzz-secret", Duration::from_secs(3600));
        if let Ok(claims) = issuer.verify(token) {
            let _ = claims_to_user(&claims);
        }
    }
});
