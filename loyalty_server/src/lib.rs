//! # Loyalty points gateway server
//! This crate hosts the HTTP server for the loyalty points gateway. It is responsible for:
//! * Registering users and issuing access tokens.
//! * Accepting order numbers from users and reporting on their progress.
//! * Reporting point balances and accepting withdrawals.
//! * Running the background worker that pulls rewards from the accrual service.
//!
//! ## Configuration
//! The server is configured via environment variables, with a few command-line overrides. See
//! [config](config/index.html) and [cli](cli/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `POST /api/user/register`, `POST /api/user/login`: Exchange credentials for an access token.
//! * `POST /api/user/orders`, `GET /api/user/orders`: Upload an order number, or list your orders.
//! * `GET /api/user/balance`: Your current and withdrawn points.
//! * `POST /api/user/balance/withdraw`, `GET /api/user/withdrawals`: Spend points, or list what you have spent.
pub mod accrual_worker;
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
