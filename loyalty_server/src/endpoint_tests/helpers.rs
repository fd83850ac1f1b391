use actix_web::{
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use loyalty_engine::AuthenticatedUser;

use crate::{auth::TokenIssuer, config::AuthConfig, routes::json_config};

// A fixed secret for issuing test tokens. DO NOT re-use it anywhere.
const TEST_JWT_SECRET: &str = "8a3b1c9f2e6d4a7b0c5e8f1a2d3b4c6e9f0a1b2c3d4e5f60718293a4b5c6d7e8";

pub fn auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET, chrono::Duration::hours(1))
}

pub fn issue_token(user_id: i64, login: &str, expiry: DateTime<Utc>) -> String {
    let user = AuthenticatedUser { id: user_id, login: login.to_string() };
    TokenIssuer::new(&auth_config()).issue_token_with_expiry(&user, expiry).expect("Failed to sign token")
}

/// A token for user #1 (alice) that is good for the next day.
pub fn alice_token() -> String {
    issue_token(1, "alice", Utc::now() + chrono::Duration::days(1))
}

pub fn timestamp(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

/// Sends `req` to an app with the token issuer and JSON config registered, plus whatever `configure` adds.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, HeaderMap, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new()
        .app_data(json_config())
        .app_data(web::Data::new(TokenIssuer::new(&auth_config())))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let headers = res.headers().clone();
    let body = test::read_body(res).await;
    (status, headers, String::from_utf8_lossy(&body).into_owned())
}

pub fn with_token(req: TestRequest, token: &str) -> TestRequest {
    req.insert_header(("Authorization", format!("Bearer {token}")))
}
