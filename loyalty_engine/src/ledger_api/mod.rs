//! # Loyalty engine public API
//!
//! The `ledger_api` module exposes the programmatic API for the loyalty engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`order_flow_api`] registers order numbers and enforces the one-owner-per-number rule.
//! * [`withdrawal_api`] spends points against an order number.
//! * [`reconciliation_api`] pulls outcomes from the accrual service and applies them to the ledger.
//! * [`accounts_api`] provides read-only views of orders, balances and withdrawals.
//! * [`auth_api`] registers and authenticates users.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits the API needs.
//!
//! ```rust,ignore
//! use loyalty_engine::{AccountApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/loyalty.db", 5).await?;
//! // SqliteDatabase implements AccountManagement
//! let api = AccountApi::new(db);
//! let balance = api.balance_for_user(user_id).await?;
//! ```
pub mod accounts_api;
pub mod auth_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod reconciliation_api;
pub mod withdrawal_api;
