use actix_web::{http::StatusCode, test, test::TestRequest, App};

use crate::routes::health;

mod auth;
mod helpers;
mod orders;

#[actix_web::test]
async fn health_check() {
    let app = test::init_service(App::new().service(health)).await;
    let res = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(test::read_body(res).await, "👍️\n");
}
