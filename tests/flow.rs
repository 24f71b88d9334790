use std::collections::HashMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use warp::http::StatusCode;
use warp::hyper::body::Bytes;

use kagi::core::models::{ClientCredential, Credentials};
use kagi::core::types::{ClientId, ClientSecret, RedirectUri};
use kagi::db::{DbStore, Table};
use kagi::http::Server;
use kagi::provider::{Lifetimes, OAuth2Provider};
use kagi::util::hash::HashingService;

const REDIRECT_URI: &str = "https://oauth-redirect.example.com/r/project";

fn client() -> ClientCredential {
    ClientCredential {
        id: ClientId("C".to_string()),
        secret: ClientSecret("SECRET".to_string()),
        redirect_uri: RedirectUri(REDIRECT_URI.to_string()),
        response_type: "code".to_string(),
    }
}

fn server_with(store: DbStore) -> Server {
    let mut users = HashMap::new();
    users.insert("alice".to_string(), "pw1".to_string());
    users.insert("bob".to_string(), "pw2".to_string());

    let provider = OAuth2Provider::new(
        client(),
        Credentials(users),
        store,
        HashingService::with_secret_key("test".to_string()),
        Lifetimes::default(),
    );
    Server::new(Arc::new(provider), RedirectUri("/signin".to_string()))
}

fn server() -> Server {
    server_with(DbStore::in_memory())
}

fn auth_query(state: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair("client_id", "C")
        .append_pair("redirect_uri", REDIRECT_URI)
        .append_pair("state", state)
        .append_pair("response_type", "code")
        .finish()
}

/// Query parameters of a `Location` header, relative or absolute.
fn location_params(location: &str) -> (String, HashMap<String, String>) {
    let base = url::Url::parse("http://localhost").unwrap();
    let url = base.join(location).unwrap();
    let params = url.query_pairs().into_owned().collect();
    let target = format!("{}{}", url.origin().ascii_serialization(), url.path());
    (target, params)
}

fn location(res: &warp::http::Response<Bytes>) -> String {
    res.headers()["location"].to_str().unwrap().to_string()
}

async fn sign_in(server: &Server, username: &str, password: &str) -> warp::http::Response<Bytes> {
    let routes = server.routes();

    let res = warp::test::request()
        .method("GET")
        .path(&format!("/auth?{}", auth_query("S")))
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::FOUND);
    let (target, params) = location_params(&location(&res));
    assert_eq!(target, "http://localhost/signin");

    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("login_token", &params["login_token"])
        .append_pair("username", username)
        .append_pair("password", password)
        .finish();
    warp::test::request()
        .method("GET")
        .path(&format!("/login?{}", query))
        .reply(&routes)
        .await
}

async fn authorization_code(server: &Server) -> String {
    let res = sign_in(server, "alice", "pw1").await;
    assert_eq!(res.status(), StatusCode::FOUND);

    let (target, params) = location_params(&location(&res));
    assert_eq!(target, REDIRECT_URI);
    assert_eq!(params["state"], "S");
    params["code"].clone()
}

async fn exchange(server: &Server, body: String) -> warp::http::Response<Bytes> {
    warp::test::request()
        .method("POST")
        .path("/exchange")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(body)
        .reply(&server.routes())
        .await
}

fn code_body(code: &str) -> String {
    format!(
        "client_id=C&client_secret=SECRET&grant_type=authorization_code&code={}",
        code
    )
}

fn json(res: &warp::http::Response<Bytes>) -> serde_json::Value {
    serde_json::from_slice(res.body()).unwrap()
}

async fn validate(server: &Server, token: &str) -> warp::http::Response<Bytes> {
    warp::test::request()
        .method("GET")
        .path(&format!("/validate?access_token={}", token))
        .reply(&server.routes())
        .await
}

#[tokio::test]
async fn full_authorization_code_flow() {
    let server = server();
    let code = authorization_code(&server).await;

    let res = exchange(&server, code_body(&code)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(&res);
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["expires_in"], 1800);
    assert!(body["refresh_token"].is_string());
    let access_token = body["access_token"].as_str().unwrap().to_string();

    let res = validate(&server, &access_token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json(&res);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["clientID"], "C");
    assert!(body["expiration"].is_string());

    // codes are single use
    let res = exchange(&server, code_body(&code)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_authorization_request_is_rejected() {
    let server = server();
    let routes = server.routes();

    let res = warp::test::request()
        .method("GET")
        .path("/auth?client_id=C&state=S&response_type=code")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(&res.body()[..], b"400 Bad Request: malformed request");

    let res = warp::test::request()
        .method("GET")
        .path("/auth")
        .reply(&routes)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn wrong_password_is_forbidden() {
    let server = server();
    let res = sign_in(&server, "alice", "pw2").await;

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(res.headers().get("location").is_none());
}

#[tokio::test]
async fn unsupported_grant_type_is_bad_request() {
    let server = server();
    let res = exchange(
        &server,
        "client_id=C&client_secret=SECRET&grant_type=password".to_string(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(&res.body()[..], b"400 Bad Request: unrecognized grant type");
}

#[tokio::test]
async fn basic_authentication_is_accepted() {
    let server = server();
    let code = authorization_code(&server).await;

    let res = warp::test::request()
        .method("POST")
        .path("/exchange")
        .header("content-type", "application/x-www-form-urlencoded")
        .header("authorization", format!("Basic {}", STANDARD.encode("C:SECRET")))
        .body(format!("grant_type=authorization_code&code={}", code))
        .reply(&server.routes())
        .await;

    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_token_mints_new_access_tokens() {
    let server = server();
    let code = authorization_code(&server).await;
    let first = json(&exchange(&server, code_body(&code)).await);
    let refresh_token = first["refresh_token"].as_str().unwrap();

    let body = format!(
        "client_id=C&client_secret=SECRET&grant_type=refresh_token&refresh_token={}",
        refresh_token
    );
    for _ in 0..2 {
        let res = exchange(&server, body.clone()).await;
        assert_eq!(res.status(), StatusCode::OK);

        let refreshed = json(&res);
        assert!(refreshed.get("refresh_token").is_none());
        assert_ne!(refreshed["access_token"], first["access_token"]);

        let token = refreshed["access_token"].as_str().unwrap();
        assert_eq!(validate(&server, token).await.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn validate_rejects_missing_and_unknown_tokens() {
    let server = server();

    let res = warp::test::request()
        .method("GET")
        .path("/validate")
        .reply(&server.routes())
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = validate(&server, "not-a-token").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn store_failure_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing").join("authorizationsTable.json");
    let store = DbStore {
        sessions: Table::in_memory(),
        codes: Table::open(missing).await.unwrap(),
        access: Table::in_memory(),
        refresh: Table::in_memory(),
    };
    let server = server_with(store);

    let res = sign_in(&server, "alice", "pw1").await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let server = server();
    let res = warp::test::request()
        .method("GET")
        .path("/token")
        .reply(&server.routes())
        .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
