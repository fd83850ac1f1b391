use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use loyalty_engine::{
    db_types::{Order, OrderNumber, OrderStatusType, Points},
    traits::{AccountApiError, InsertOrderResult, LedgerError},
    AccountApi,
    OrderFlowApi,
};

use super::{
    helpers::{alice_token, issue_token, send_request, timestamp, with_token},
    mocks::MockLedger,
};
use crate::{
    auth::ACCESS_TOKEN_COOKIE,
    routes::{MyOrdersRoute, UploadOrderRoute},
};

fn order(number: &str, user_id: i64, status: OrderStatusType, accrual: Option<Points>, day: u32) -> Order {
    Order {
        id: day as i64,
        number: number.parse::<OrderNumber>().unwrap(),
        user_id,
        status,
        accrual,
        uploaded_at: timestamp(day, 12),
        updated_at: timestamp(day, 13),
    }
}

fn configure(db: MockLedger) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(OrderFlowApi::new(db)));
        cfg.service(UploadOrderRoute::<MockLedger>::new());
    }
}

fn configure_listing(db: MockLedger) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(AccountApi::new(db)));
        cfg.service(MyOrdersRoute::<MockLedger>::new());
    }
}

fn upload(number: &str) -> TestRequest {
    TestRequest::post().uri("/orders").insert_header(("Content-Type", "text/plain")).set_payload(number.to_string())
}

#[actix_web::test]
async fn upload_without_token() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) = send_request(upload("79927398713"), configure(MockLedger::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication Error. No access token was provided. Log in first."}"#);
}

#[actix_web::test]
async fn upload_new_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedger::new();
    db.expect_insert_order()
        .withf(|user_id, number| *user_id == 1 && number.as_str() == "79927398713")
        .returning(|_, n| Ok(InsertOrderResult::Inserted(order(n.as_str(), 1, OrderStatusType::New, None, 1))));
    let req = with_token(upload("79927398713\n"), &alice_token());
    let (status, _, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::ACCEPTED, "{body}");
    assert_eq!(body, r#"{"success":true,"message":"Order 79927398713 accepted"}"#);
}

#[actix_web::test]
async fn upload_own_order_again() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedger::new();
    db.expect_insert_order().returning(|_, n| {
        Ok(InsertOrderResult::AlreadyExists(order(n.as_str(), 1, OrderStatusType::Processing, None, 1)))
    });
    let req = with_token(upload("79927398713"), &alice_token());
    let (status, _, _) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn upload_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedger::new();
    db.expect_insert_order()
        .returning(|_, n| Ok(InsertOrderResult::AlreadyExists(order(n.as_str(), 2, OrderStatusType::New, None, 1))));
    let req = with_token(upload("79927398713"), &alice_token());
    let (status, _, body) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, r#"{"error":"Order 79927398713 has already been uploaded by another user"}"#);
}

#[actix_web::test]
async fn upload_bad_checksum() {
    let _ = env_logger::try_init().ok();
    // No expectations: storage must not be touched
    let req = with_token(upload("79927398710"), &alice_token());
    let (status, _, body) = send_request(req, configure(MockLedger::new())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, r#"{"error":"'79927398710' is not a valid order number"}"#);
}

#[actix_web::test]
async fn upload_empty_body() {
    let _ = env_logger::try_init().ok();
    let req = with_token(upload("  "), &alice_token());
    let (status, _, _) = send_request(req, configure(MockLedger::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn upload_with_cookie_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedger::new();
    db.expect_insert_order()
        .returning(|_, n| Ok(InsertOrderResult::Inserted(order(n.as_str(), 1, OrderStatusType::New, None, 1))));
    let cookie = actix_web::cookie::Cookie::new(ACCESS_TOKEN_COOKIE, alice_token());
    let req = upload("79927398713").cookie(cookie);
    let (status, _, _) = send_request(req, configure(db)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[actix_web::test]
async fn upload_with_expired_token() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, "alice", Utc::now() - chrono::Duration::hours(3));
    let (status, _, body) = send_request(with_token(upload("79927398713"), &token), configure(MockLedger::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("ExpiredSignature"), "{body}");
}

#[actix_web::test]
async fn upload_with_tampered_token() {
    let _ = env_logger::try_init().ok();
    let mut token = alice_token();
    let n = token.len();
    token.replace_range(n - 10..n - 5, "AAAAA");
    let (status, _, body) = send_request(with_token(upload("79927398713"), &token), configure(MockLedger::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Access token is not valid"), "{body}");
}

#[actix_web::test]
async fn list_my_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedger::new();
    db.expect_fetch_orders_for_user().withf(|user_id| *user_id == 1).returning(|_| {
        Ok(vec![
            order("79927398713", 1, OrderStatusType::Processed, Some(Points::from(500_00)), 10),
            order("12345678903", 1, OrderStatusType::Processed, Some(Points::from(729_98)), 9),
            order("2377225624", 1, OrderStatusType::Invalid, None, 8),
            order("4561261212345467", 1, OrderStatusType::New, None, 7),
        ])
    });
    let req = with_token(TestRequest::get().uri("/orders"), &alice_token());
    let (status, _, body) = send_request(req, configure_listing(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDERS_JSON);
}

#[actix_web::test]
async fn list_no_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedger::new();
    db.expect_fetch_orders_for_user().returning(|_| Ok(vec![]));
    let req = with_token(TestRequest::get().uri("/orders"), &alice_token());
    let (status, _, body) = send_request(req, configure_listing(db)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[actix_web::test]
async fn storage_failures_are_server_errors() {
    let _ = env_logger::try_init().ok();
    let mut db = MockLedger::new();
    db.expect_fetch_orders_for_user().returning(|_| Err(AccountApiError::Timeout(5000)));
    let req = with_token(TestRequest::get().uri("/orders"), &alice_token());
    let (status, _, _) = send_request(req, configure_listing(db)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let mut db = MockLedger::new();
    db.expect_insert_order().returning(|_, _| Err(LedgerError::DatabaseError("disk I/O error".into())));
    let (status, _, _) = send_request(with_token(upload("79927398713"), &alice_token()), configure(db)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

const ORDERS_JSON: &str = r#"[{"number":"79927398713","status":"PROCESSED","accrual":500,"uploaded_at":"2024-03-10T12:00:00Z"},{"number":"12345678903","status":"PROCESSED","accrual":729.98,"uploaded_at":"2024-03-09T12:00:00Z"},{"number":"2377225624","status":"INVALID","uploaded_at":"2024-03-08T12:00:00Z"},{"number":"4561261212345467","status":"NEW","uploaded_at":"2024-03-07T12:00:00Z"}]"#;
