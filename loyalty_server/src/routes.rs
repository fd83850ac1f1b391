//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: they extract the caller's identity from the access
//! token, hand the request to the matching engine API and translate the outcome into a status code. Anything more
//! involved belongs in the engine.
//!
//! Every handler that touches storage is async. Worker threads process their requests sequentially, so blocking
//! inside a handler stalls every other request queued on that worker.
use actix_web::{
    cookie::Cookie,
    get,
    http::header,
    web,
    HttpRequest,
    HttpResponse,
    Responder,
};
use log::*;
use loyalty_engine::{
    traits::{AccountManagement, AuthManagement, LedgerDatabase},
    AccountApi,
    AuthApi,
    AuthenticatedUser,
    OrderFlowApi,
    SubmitOrderResult,
    WithdrawalApi,
};

use crate::{
    auth::{JwtClaims, TokenIssuer, ACCESS_TOKEN_COOKIE},
    data_objects::{
        BalanceResponse,
        Credentials,
        JsonResponse,
        OrderResponse,
        TokenResponse,
        WithdrawalRequest,
        WithdrawalResponse,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so routes over a storage backend are registered with `route!`.
// `route!(my_orders => Get "/orders" impl AccountManagement)` defines `MyOrdersRoute<B>`, which mounts
// `my_orders::<B>`.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $bound:path) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where B: $bound + 'static
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

/// Maps malformed JSON bodies onto a 400 with the usual error body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejected request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/register" impl AuthManagement);
/// Creates a new user and logs them straight in.
///
/// Responds with 409 if the login is taken, and 400 if the login or password does not meet the rules.
pub async fn register<B: AuthManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<B>>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login, password } = body.into_inner();
    debug!("💻️ POST register for {login}");
    let user = api.register_user(&login, &password).await?;
    token_response(&user, &issuer)
}

route!(login => Post "/login" impl AuthManagement);
/// Exchanges a login and password for an access token. Unknown logins and wrong passwords both get a 401.
pub async fn login<B: AuthManagement>(
    body: web::Json<Credentials>,
    api: web::Data<AuthApi<B>>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let Credentials { login, password } = body.into_inner();
    debug!("💻️ POST login for {login}");
    let user = api.authenticate_user(&login, &password).await?;
    token_response(&user, &issuer)
}

/// The token goes out three ways: the `Authorization` header, a cookie, and the JSON body.
fn token_response(user: &AuthenticatedUser, issuer: &TokenIssuer) -> Result<HttpResponse, ServerError> {
    let token = issuer.issue_token(user)?;
    let cookie = Cookie::build(ACCESS_TOKEN_COOKIE, token.clone()).path("/").http_only(true).finish();
    Ok(HttpResponse::Ok()
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .cookie(cookie)
        .json(TokenResponse::bearer(token)))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(upload_order => Post "/orders" impl LedgerDatabase);
/// Registers an order number, sent as a plain-text body, to the caller.
///
/// * 202 - the number is new and now belongs to the caller.
/// * 200 - the caller had already uploaded this number.
/// * 409 - another user uploaded this number first.
/// * 422 - the number fails the Luhn check.
pub async fn upload_order<B: LedgerDatabase>(
    claims: JwtClaims,
    body: String,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id()?;
    let number = body.trim();
    if number.is_empty() {
        return Err(ServerError::InvalidRequestBody("The request body must contain an order number".into()));
    }
    debug!("💻️ POST order {number} for user #{user_id}");
    match api.submit_order(user_id, number).await? {
        SubmitOrderResult::Accepted(order) => {
            Ok(HttpResponse::Accepted().json(JsonResponse::success(format!("Order {} accepted", order.number))))
        },
        SubmitOrderResult::AlreadyOwnedBySameUser(order) => {
            Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Order {} was already uploaded", order.number))))
        },
        SubmitOrderResult::OwnedByOther => Err(ServerError::OrderOwnedByOther(number.to_string())),
    }
}

route!(my_orders => Get "/orders" impl AccountManagement);
/// Lists the caller's orders, newest first. Responds with 204 if there are none.
pub async fn my_orders<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id()?;
    debug!("💻️ GET orders for user #{user_id}");
    let orders = api.orders_for_user(user_id).await?;
    if orders.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let orders = orders.into_iter().map(OrderResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(orders))
}

//----------------------------------------------   Balance  ----------------------------------------------------
route!(my_balance => Get "/balance" impl AccountManagement);
pub async fn my_balance<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id()?;
    debug!("💻️ GET balance for user #{user_id}");
    let balance = api.balance_for_user(user_id).await?;
    Ok(HttpResponse::Ok().json(BalanceResponse::from(balance)))
}

route!(withdraw => Post "/balance/withdraw" impl LedgerDatabase);
/// Spends points against an order number.
///
/// * 402 - the balance does not cover the sum. Nothing is written.
/// * 422 - the order number fails the Luhn check, or the sum is not positive.
pub async fn withdraw<B: LedgerDatabase>(
    claims: JwtClaims,
    body: web::Json<WithdrawalRequest>,
    api: web::Data<WithdrawalApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id()?;
    let WithdrawalRequest { order, sum } = body.into_inner();
    debug!("💻️ POST withdraw {sum} against {order} for user #{user_id}");
    let withdrawal = api.withdraw(user_id, order.trim(), sum).await?;
    Ok(HttpResponse::Ok().json(WithdrawalResponse::from(withdrawal)))
}

route!(my_withdrawals => Get "/withdrawals" impl AccountManagement);
/// Lists the caller's withdrawals, newest first. Responds with 204 if there are none.
pub async fn my_withdrawals<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.user_id()?;
    debug!("💻️ GET withdrawals for user #{user_id}");
    let withdrawals = api.withdrawals_for_user(user_id).await?;
    if withdrawals.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    let withdrawals = withdrawals.into_iter().map(WithdrawalResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(withdrawals))
}

/// Falls through for anything under `/api/user` that did not match a route.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    debug!("💻️ No route for {} {}", req.method(), req.path());
    HttpResponse::NotFound().json(JsonResponse::failure(format!("No route for {}", req.path())))
}
