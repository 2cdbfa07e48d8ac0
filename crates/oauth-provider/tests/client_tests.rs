//! Relying-party client tests.
//!
//! Mocked provider responses via wiremock, plus one run against a live server.

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oauth_provider::config::Config;
use oauth_provider::error::ClientError;
use oauth_provider::models::{ClientRegistry, UserDirectory};
use oauth_provider::{AuthServer, ProviderClient};

const CLIENT_ID: &str = "12345";
const CLIENT_SECRET: &str = "dkjdqqdkjdqjdqjkqefv";
const REDIRECT_URI: &str = "http://localhost:8081/redirect";

fn client_for(mock_server: &MockServer) -> ProviderClient {
    ProviderClient::with_retries(&mock_server.uri(), CLIENT_ID, CLIENT_SECRET, 2).unwrap()
}

// =============================================================================
// Token exchange
// =============================================================================

#[tokio::test]
async fn test_exchange_code_posts_form() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=the-code"))
        .and(body_string_contains("client_id=12345"))
        .and(body_string_contains("client_secret=dkjdqqdkjdqjdqjkqefv"))
        .and(body_string_contains("redirect_uri=http%3A%2F%2Flocalhost%3A8081%2Fredirect"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let token = client_for(&mock_server).exchange_code("the-code", REDIRECT_URI).await.unwrap();
    assert_eq!(token.access_token, "tok");
    assert_eq!(token.token_type, "bearer");
    assert_eq!(token.expires_in, 3600);
}

#[tokio::test]
async fn test_exchange_code_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("authorization code already used"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).exchange_code("used", REDIRECT_URI).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(err.to_string().contains("authorization code already used"));
}

#[tokio::test]
async fn test_exchange_code_bad_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("missing params"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).exchange_code("c", REDIRECT_URI).await.unwrap_err();
    assert!(matches!(err, ClientError::BadRequest { .. }));
}

#[tokio::test]
async fn test_exchange_code_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).exchange_code("c", REDIRECT_URI).await.unwrap_err();
    assert!(matches!(err, ClientError::UnexpectedStatus { status: 500, .. }));
}

#[tokio::test]
async fn test_exchange_code_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).exchange_code("c", REDIRECT_URI).await.unwrap_err();
    assert!(matches!(err, ClientError::Parse(_)));
}

// =============================================================================
// User info
// =============================================================================

#[tokio::test]
async fn test_user_info_sends_bearer() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resources/v2/userinfo"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "John Doe",
            "email": "john.doe@email.com",
            "roles": "*"
        })))
        .mount(&mock_server)
        .await;

    let user = client_for(&mock_server).user_info("tok").await.unwrap();
    assert_eq!(user.name, "John Doe");
    assert_eq!(user.email, "john.doe@email.com");
    assert_eq!(user.roles, "*");
}

#[tokio::test]
async fn test_user_info_rejected_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resources/v2/userinfo"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid access token"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).user_info("bad").await.unwrap_err();
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn test_user_info_retries_transient_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/resources/v2/userinfo"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/resources/v2/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Marion Ruhl",
            "email": "marion.ruhl@email.com",
            "roles": "user"
        })))
        .mount(&mock_server)
        .await;

    let user = client_for(&mock_server).user_info("tok").await.unwrap();
    assert_eq!(user.name, "Marion Ruhl");
}

// =============================================================================
// Against a live provider
// =============================================================================

#[tokio::test]
async fn test_exchange_and_fetch_against_live_server() {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header as http_header};
    use tower::ServiceExt;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let config = Config::new(0, Some(base_url.clone()), Some("live-test-secret".to_string()));
    let server = AuthServer::new(
        config,
        ClientRegistry::with_demo_applications(),
        UserDirectory::with_demo_users(),
    );
    let app = server.router();
    tokio::spawn(async move {
        axum::serve(listener, server.router()).await.unwrap();
    });

    let client = ProviderClient::new(&base_url, CLIENT_ID, CLIENT_SECRET).unwrap();

    // Drive the browser-facing steps through the shared router
    let authorize = client.authorize_url(REDIRECT_URI, "read", Some("live-state")).unwrap();
    let response = app
        .clone()
        .oneshot(
            Request::get(format!("{}?{}", authorize.path(), authorize.query().unwrap()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let submit = serde_urlencoded::to_string([
        ("state", "live-state"),
        ("email", "angela.coghill@email.com"),
        ("password", "angelacog12345"),
    ])
    .unwrap();
    let response = app
        .clone()
        .oneshot(
            Request::post("/oauth/v2/submit")
                .header(http_header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(submit))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::post("/oauth/v2/consent")
                .header(http_header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("state=live-state"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    let callback = url::Url::parse(
        response.headers().get(http_header::LOCATION).unwrap().to_str().unwrap(),
    )
    .unwrap();
    let code = callback.query_pairs().find(|(k, _)| k == "code").unwrap().1.into_owned();

    // Backend side over real HTTP
    let (token, user) = client.exchange_and_fetch(&code, REDIRECT_URI).await.unwrap();
    assert_eq!(token.token_type, "bearer");
    assert_eq!(user.name, "Angela Coghill");
    assert_eq!(user.roles, "user");

    let err = client.exchange_code(&code, REDIRECT_URI).await.unwrap_err();
    assert!(err.is_unauthorized());
}
