//! Loyalty Engine
//!
//! The loyalty engine tracks the orders users redeem for reward points, and the points balance those orders earn.
//! Rewards are calculated by an external accrual service, asynchronously, so the engine reconciles its own view of
//! each order against that service until the order reaches a final state.
//!
//! The library is divided into the following sections:
//! 1. Storage contracts ([`mod@traits`]) and the SQLite backend that implements them. Callers should never touch the
//!    database directly. The exception is the data types used in the database, which are defined in [`mod@db_types`]
//!    and are public.
//! 2. The public API ([`mod@ledger_api`]). Order registration, withdrawals, reconciliation, account views and
//!    authentication each have their own API object that wraps a backend.
//! 3. Helpers ([`mod@helpers`]), most importantly the Luhn check used to validate order numbers.
//!
//! The invariants the engine protects:
//! * An order number belongs to the first user who submits it, forever.
//! * A user's spendable balance is never negative, no matter how withdrawals and accrual credits interleave.
//! * An order's status change and the credit it carries are never observable separately.
pub mod db_types;
pub mod helpers;
pub mod ledger_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use ledger_api::{
    accounts_api::AccountApi,
    auth_api::{Argon2Hasher, AuthApi, AuthenticatedUser, CredentialHasher},
    errors::{OrderFlowError, ReconcileError, WithdrawalError},
    order_flow_api::OrderFlowApi,
    order_objects::{ReconcileSummary, SubmitOrderResult},
    reconciliation_api::ReconciliationApi,
    withdrawal_api::WithdrawalApi,
};
pub use traits::{
    AccountApiError,
    AccountManagement,
    AccrualReport,
    AccrualSource,
    AccrualSourceError,
    AuthApiError,
    AuthManagement,
    ExternalAccrualStatus,
    InsertOrderResult,
    LedgerDatabase,
    LedgerError,
};
