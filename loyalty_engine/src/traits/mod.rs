//! #  Ledger backend contracts.
//!
//! This module provides the interfaces that define the contracts of the loyalty engine *backends*. The order
//! registrar, withdrawal processor and accrual reconciler depend only on these traits, never on a concrete storage
//! engine, so tests can substitute a mock or an in-memory store.
//!
//! * [`LedgerDatabase`] is the write side: order registration, accrual application and withdrawals. Each of these
//!   operations is a single atomic unit.
//! * [`AccountManagement`] provides read-only projections of users, orders, balances and withdrawals.
//! * [`AuthManagement`] stores users and their (already hashed) credentials.
//! * [`AccrualSource`] is the contract for the external service that computes rewards.
mod account_management;
mod accrual_source;
mod auth_management;
mod data_objects;
mod ledger_database;

pub use account_management::{AccountApiError, AccountManagement};
pub use accrual_source::{AccrualReport, AccrualSource, AccrualSourceError, ExternalAccrualStatus};
pub use auth_management::{AuthApiError, AuthManagement};
pub use data_objects::{AccrualApplied, InsertOrderResult};
pub use ledger_database::{LedgerDatabase, LedgerError};
