#![no_main]

use libfuzzer_sys::fuzz_target;
use oauth_provider::server::oauth::credentials::parse_basic;

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = std::str::from_utf8(data) {
        let _ = parse_basic(value);
        let _ = parse_basic(&format!("Basic {value}"));
    }
});
