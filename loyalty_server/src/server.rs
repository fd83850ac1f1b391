use std::{path::Path, time::Duration};

use accrual_tools::AccrualApi;
use actix_web::{dev::Server, http::KeepAlive, middleware, web, App, HttpServer};
use log::*;
use loyalty_engine::{AccountApi, AuthApi, OrderFlowApi, SqliteDatabase, WithdrawalApi};
use tokio::sync::watch;

use crate::{
    accrual_worker::{start_accrual_worker, AccrualService},
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        json_config,
        not_found,
        LoginRoute,
        MyBalanceRoute,
        MyOrdersRoute,
        MyWithdrawalsRoute,
        RegisterRoute,
        UploadOrderRoute,
        WithdrawRoute,
    },
};

/// How long an in-flight reconciliation pass may run on after the HTTP server has stopped.
const WORKER_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    ensure_database_dir(&config.database_url)?;
    let db = SqliteDatabase::new_with_options(&config.database_url, config.max_connections, config.storage_timeout)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let accrual = AccrualApi::new(config.accrual.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🌐️ Accrual service is at {}", accrual.config().address);

    let (shutdown, shutdown_rx) = watch::channel(false);
    let mut worker = start_accrual_worker(db.clone(), AccrualService::new(accrual), config.poll_interval, shutdown_rx);
    let srv = create_server_instance(config, db.clone())?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));

    info!("🕰️ Stopping the accrual worker");
    let _ = shutdown.send(true);
    if tokio::time::timeout(WORKER_SHUTDOWN_GRACE, &mut worker).await.is_err() {
        warn!("🕰️ The accrual worker did not stop within {WORKER_SHUTDOWN_GRACE:?}. Aborting it.");
        worker.abort();
    }
    db.pool().close().await;
    result
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let auth_config = config.auth.clone();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone());
        let withdrawal_api = WithdrawalApi::new(db.clone());
        let accounts_api = AccountApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&auth_config);
        let user_scope = web::scope("/api/user")
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(UploadOrderRoute::<SqliteDatabase>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(MyBalanceRoute::<SqliteDatabase>::new())
            .service(WithdrawRoute::<SqliteDatabase>::new())
            .service(MyWithdrawalsRoute::<SqliteDatabase>::new())
            .default_service(web::to(not_found));
        App::new()
            .wrap(middleware::Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lpg::access_log"))
            .wrap(middleware::Compress::default())
            .app_data(json_config())
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(withdrawal_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(jwt_signer))
            .service(health)
            .service(user_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(config.run_address.as_str())?
    .run();
    Ok(srv)
}

/// SQLite creates a missing database file, but not the directory it lives in.
fn ensure_database_dir(url: &str) -> Result<(), ServerError> {
    let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            info!("🗃️ Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
            Ok(())
        },
        _ => Ok(()),
    }
}
