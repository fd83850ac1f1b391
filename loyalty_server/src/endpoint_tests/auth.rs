use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use loyalty_engine::{
    db_types::{User, UserCredentials},
    traits::AuthApiError,
    Argon2Hasher,
    AuthApi,
    CredentialHasher,
};

use super::{
    helpers::{auth_config, send_request},
    mocks::MockAuthManager,
};
use crate::{
    auth::{TokenIssuer, ACCESS_TOKEN_COOKIE},
    data_objects::TokenResponse,
    routes::{LoginRoute, RegisterRoute},
};

fn configure(db: MockAuthManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(AuthApi::new(db)))
            .service(RegisterRoute::<MockAuthManager>::new())
            .service(LoginRoute::<MockAuthManager>::new());
    }
}

fn post(path: &str, body: &str) -> TestRequest {
    TestRequest::post().uri(path).insert_header(("Content-Type", "application/json")).set_payload(body.to_string())
}

#[actix_web::test]
async fn register_issues_a_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_create_user()
        .withf(|u| u.login == "alice" && u.password_hash.starts_with("$argon2"))
        .returning(|u| Ok(User { id: 7, login: u.login, created_at: Utc::now() }));
    let req = post("/register", r#"{"login":"alice","password":"hunter2"}"#);
    let (status, headers, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let response: TokenResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.token_type, "Bearer");
    let claims = TokenIssuer::new(&auth_config()).validate_token(&response.access_token).unwrap();
    assert_eq!(claims.user_id().unwrap(), 7);
    assert_eq!(claims.login, "alice");
    let bearer = headers.get("authorization").unwrap().to_str().unwrap();
    assert_eq!(bearer, format!("Bearer {}", response.access_token));
    let cookie = headers.get("set-cookie").unwrap().to_str().unwrap();
    assert!(cookie.starts_with(&format!("{ACCESS_TOKEN_COOKIE}={}", response.access_token)), "{cookie}");
    assert!(cookie.contains("HttpOnly"));
}

#[actix_web::test]
async fn register_taken_login() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_create_user().returning(|u| Err(AuthApiError::UserAlreadyExists(u.login)));
    let req = post("/register", r#"{"login":"alice","password":"hunter2"}"#);
    let (status, _, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"The login 'alice' is already registered"}"#);
}

#[actix_web::test]
async fn register_malformed_body() {
    let _ = env_logger::try_init().ok();
    let db = MockAuthManager::new();
    let (status, _, body) = send_request(post("/register", r#"{"login":"alice"}"#), configure(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with(r#"{"error":"Could not read request body"#), "{body}");
}

#[actix_web::test]
async fn register_bad_login() {
    let _ = env_logger::try_init().ok();
    // No expectations: storage must not be touched
    let db = MockAuthManager::new();
    let req = post("/register", r#"{"login":"has space","password":"hunter2"}"#);
    let (status, _, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Invalid login name"), "{body}");
}

fn alice_credentials(password: &str) -> UserCredentials {
    let password_hash = Argon2Hasher.hash(password).unwrap();
    UserCredentials { user_id: 1, login: "alice".into(), password_hash }
}

#[actix_web::test]
async fn login_with_correct_password() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    let creds = alice_credentials("hunter2");
    db.expect_fetch_credentials().withf(|login| login == "alice").returning(move |_| Ok(Some(creds.clone())));
    let req = post("/login", r#"{"login":"alice","password":"hunter2"}"#);
    let (status, _, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let response: TokenResponse = serde_json::from_str(&body).unwrap();
    let claims = TokenIssuer::new(&auth_config()).validate_token(&response.access_token).unwrap();
    assert_eq!(claims.user_id().unwrap(), 1);
}

#[actix_web::test]
async fn login_with_wrong_password() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    let creds = alice_credentials("hunter2");
    db.expect_fetch_credentials().returning(move |_| Ok(Some(creds.clone())));
    let req = post("/login", r#"{"login":"alice","password":"hunter3"}"#);
    let (status, headers, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(headers.get("authorization").is_none());
    assert_eq!(body, r#"{"error":"Authentication Error. The login or password is incorrect."}"#);
}

#[actix_web::test]
async fn login_unknown_user() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_fetch_credentials().returning(|_| Ok(None));
    let req = post("/login", r#"{"login":"mallory","password":"hunter2"}"#);
    let (status, _, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. The login or password is incorrect."}"#);
}
