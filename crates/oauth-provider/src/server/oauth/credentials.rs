//! `Authorization` header parsing for client credentials and bearer tokens.

use axum::http::{HeaderMap, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Client credentials taken from a `Basic` authorization header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Parse `Basic base64(client_id:client_secret)`.
///
/// Returns `None` for any other scheme, bad base64, non-UTF-8 content, or a
/// payload that does not split into exactly two `:`-separated parts.
#[must_use]
pub fn parse_basic(value: &str) -> Option<ClientCredentials> {
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = match STANDARD.decode(encoded.trim()) {
        Ok(bytes) => String::from_utf8(bytes).ok()?,
        Err(e) => {
            tracing::warn!(error = %e, "Could not decode Basic authorization header");
            return None;
        }
    };

    let mut parts = decoded.split(':');
    let (Some(client_id), Some(client_secret), None) = (parts.next(), parts.next(), parts.next())
    else {
        tracing::warn!("Basic authorization header is not <client_id>:<client_secret>");
        return None;
    };

    Some(ClientCredentials {
        client_id: client_id.to_owned(),
        client_secret: client_secret.to_owned(),
    })
}

/// Extract client credentials from the request's `Authorization` header.
#[must_use]
pub fn basic_from_headers(headers: &HeaderMap) -> Option<ClientCredentials> {
    headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()).and_then(parse_basic)
}

/// Extract a non-empty bearer token from the request's `Authorization` header.
#[must_use]
pub fn bearer_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Encode a `Basic` authorization header value.
#[must_use]
pub fn encode_basic(client_id: &str, client_secret: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{client_id}:{client_secret}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_basic_valid() {
        // base64("12345:dkjdqqdkjdqjdqjkqefv")
        let creds = parse_basic("Basic MTIzNDU6ZGtqZHFxZGtqZHFqZHFqa3FlZnY=").unwrap();
        assert_eq!(creds.client_id, "12345");
        assert_eq!(creds.client_secret, "dkjdqqdkjdqjdqjkqefv");
    }

    #[test]
    fn test_parse_basic_rejects_bad_input() {
        assert!(parse_basic("").is_none());
        assert!(parse_basic("Bearer abc").is_none());
        assert!(parse_basic("Basic !!!notbase64").is_none());
        // base64("no-colon")
        assert!(parse_basic("Basic bm8tY29sb24=").is_none());
        // base64("a:b:c")
        assert!(parse_basic("Basic YTpiOmM=").is_none());
    }

    #[test]
    fn test_encode_roundtrip() {
        let header = encode_basic("client", "secret");
        let creds = parse_basic(&header).unwrap();
        assert_eq!(creds, ClientCredentials { client_id: "client".into(), client_secret: "secret".into() });
    }

    #[test]
    fn test_bearer_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(bearer_from_headers(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_from_headers(&headers), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_from_headers(&headers).is_none());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_from_headers(&headers).is_none());
    }
}
