#![no_main]

use libfuzzer_sys::fuzz_target;
use oauth_provider::models::Seed;

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = std::str::from_utf8(data) {
        if let Ok(seed) = Seed::from_json(json) {
            let _ = seed.into_parts();
        }
    }
});
