//! `SqliteDatabase` is a concrete implementation of a loyalty engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the storage traits defined in the [`traits`]
//! module. Every trait method runs under a bounded timeout so that a stuck lock or an exhausted pool surfaces as an
//! error instead of a hung request.
//!
//! [`traits`]: crate::traits
use std::{fmt::Debug, future::Future, time::Duration};

use log::*;
use sqlx::{migrate, migrate::MigrateError, SqlitePool};

use super::db::{balances, db_url, is_foreign_key_violation, new_pool, orders, users, withdrawals};
use crate::{
    db_types::{
        AccrualUpdate,
        Balance,
        NewUser,
        NewWithdrawal,
        Order,
        OrderNumber,
        OrderStatusType,
        User,
        UserCredentials,
        Withdrawal,
    },
    traits::{
        AccountApiError,
        AccountManagement,
        AccrualApplied,
        AuthApiError,
        AuthManagement,
        InsertOrderResult,
        LedgerDatabase,
        LedgerError,
    },
};

/// Upper bound on any single storage call.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
    op_timeout: Duration,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `LPG_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        Self::new_with_options(url, max_connections, DEFAULT_STORAGE_TIMEOUT).await
    }

    /// `op_timeout` caps every storage call made through this instance.
    pub async fn new_with_options(url: &str, max_connections: u32, op_timeout: Duration) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections, op_timeout).await?;
        debug!("🗃️ Connected to {url} with {max_connections} max connections");
        Ok(Self { url: url.to_string(), pool, op_timeout })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn storage_timeout(&self) -> Duration {
        self.op_timeout
    }

    /// Brings the schema up to date. Safe to call on every start.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    async fn timed<T, E, F>(&self, op: &str, fut: F) -> Result<T, E>
    where
        E: StorageTimeout,
        F: Future<Output = Result<T, E>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("🗃️ {op} did not complete within {} ms", self.op_timeout.as_millis());
                Err(E::timed_out(self.op_timeout))
            },
        }
    }
}

trait StorageTimeout {
    fn timed_out(after: Duration) -> Self;
}

impl StorageTimeout for LedgerError {
    fn timed_out(after: Duration) -> Self {
        Self::Timeout(after.as_millis())
    }
}

impl StorageTimeout for AccountApiError {
    fn timed_out(after: Duration) -> Self {
        Self::Timeout(after.as_millis())
    }
}

impl StorageTimeout for AuthApiError {
    fn timed_out(after: Duration) -> Self {
        Self::Timeout(after.as_millis())
    }
}

impl LedgerDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, user_id: i64, number: &OrderNumber) -> Result<InsertOrderResult, LedgerError> {
        self.timed("insert_order", async {
            let mut tx = self.pool.begin().await?;
            let result = match orders::idempotent_insert(user_id, number, &mut tx).await {
                Err(e) if is_foreign_key_violation(&e) => return Err(LedgerError::UserNotFound(user_id)),
                r => r?,
            };
            tx.commit().await?;
            Ok::<_, LedgerError>(result)
        })
        .await
    }

    async fn fetch_pending_orders(&self) -> Result<Vec<Order>, LedgerError> {
        self.timed("fetch_pending_orders", async {
            let mut conn = self.pool.acquire().await?;
            let orders = orders::fetch_pending_orders(&mut conn).await?;
            Ok::<_, LedgerError>(orders)
        })
        .await
    }

    async fn apply_accrual(
        &self,
        number: &OrderNumber,
        update: AccrualUpdate,
    ) -> Result<Option<AccrualApplied>, LedgerError> {
        self.timed("apply_accrual", async {
            let mut tx = self.pool.begin().await?;
            let Some(order) = orders::update_accrual(number, &update, &mut tx).await? else {
                debug!("🗃️ Order {number} is not pending. The accrual update was ignored.");
                return Ok(None);
            };
            let credited = match update.accrual {
                Some(amount) if update.status == OrderStatusType::Processed && amount.is_positive() => {
                    if !balances::credit_balance(order.user_id, amount, &mut tx).await? {
                        // Dropping the transaction rolls back the status change, so the order stays pending.
                        return match balances::fetch_balance(order.user_id, &mut tx).await? {
                            Some(_) => Err(LedgerError::BalanceOverflow(order.user_id)),
                            None => Err(LedgerError::UserNotFound(order.user_id)),
                        };
                    }
                    Some(amount)
                },
                _ => None,
            };
            tx.commit().await?;
            trace!("🗃️ Order {number} is now {}. Credited: {credited:?}", order.status);
            Ok::<_, LedgerError>(Some(AccrualApplied { order, credited }))
        })
        .await
    }

    async fn withdraw(&self, user_id: i64, withdrawal: NewWithdrawal) -> Result<Withdrawal, LedgerError> {
        self.timed("withdraw", async {
            let mut tx = self.pool.begin().await?;
            if !balances::try_debit_balance(user_id, withdrawal.sum, &mut tx).await? {
                let balance = balances::fetch_balance(user_id, &mut tx).await?;
                // Dropping the transaction rolls it back. Nothing was written anyway.
                return match balance {
                    Some(b) if b.current < withdrawal.sum => {
                        Err(LedgerError::InsufficientBalance { requested: withdrawal.sum, available: b.current })
                    },
                    Some(_) => Err(LedgerError::BalanceOverflow(user_id)),
                    None => Err(LedgerError::UserNotFound(user_id)),
                };
            }
            let record = withdrawals::insert_withdrawal(user_id, &withdrawal, &mut tx).await?;
            tx.commit().await?;
            Ok::<_, LedgerError>(record)
        })
        .await
    }

    async fn close(&mut self) -> Result<(), LedgerError> {
        self.pool.close().await;
        Ok(())
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountApiError> {
        self.timed("fetch_user", async {
            let mut conn = self.pool.acquire().await?;
            Ok::<_, AccountApiError>(users::fetch_user_by_id(user_id, &mut conn).await?)
        })
        .await
    }

    async fn fetch_user_by_login(&self, login: &str) -> Result<Option<User>, AccountApiError> {
        self.timed("fetch_user_by_login", async {
            let mut conn = self.pool.acquire().await?;
            Ok::<_, AccountApiError>(users::fetch_user_by_login(login, &mut conn).await?)
        })
        .await
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, AccountApiError> {
        self.timed("fetch_orders_for_user", async {
            let mut conn = self.pool.acquire().await?;
            Ok::<_, AccountApiError>(orders::fetch_orders_for_user(user_id, &mut conn).await?)
        })
        .await
    }

    async fn fetch_order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, AccountApiError> {
        self.timed("fetch_order_by_number", async {
            let mut conn = self.pool.acquire().await?;
            Ok::<_, AccountApiError>(orders::fetch_order_by_number(number, &mut conn).await?)
        })
        .await
    }

    async fn fetch_balance(&self, user_id: i64) -> Result<Option<Balance>, AccountApiError> {
        self.timed("fetch_balance", async {
            let mut conn = self.pool.acquire().await?;
            Ok::<_, AccountApiError>(balances::fetch_balance(user_id, &mut conn).await?)
        })
        .await
    }

    async fn fetch_withdrawals_for_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, AccountApiError> {
        self.timed("fetch_withdrawals_for_user", async {
            let mut conn = self.pool.acquire().await?;
            Ok::<_, AccountApiError>(withdrawals::fetch_withdrawals_for_user(user_id, &mut conn).await?)
        })
        .await
    }
}

impl AuthManagement for SqliteDatabase {
    async fn create_user(&self, user: NewUser) -> Result<User, AuthApiError> {
        self.timed("create_user", async {
            let login = user.login.clone();
            let mut tx = self.pool.begin().await?;
            let Some(user) = users::insert_user(user, &mut tx).await? else {
                return Err(AuthApiError::UserAlreadyExists(login));
            };
            balances::create_balance(user.id, &mut tx).await?;
            tx.commit().await?;
            debug!("🗃️ Created user #{} ({})", user.id, user.login);
            Ok::<_, AuthApiError>(user)
        })
        .await
    }

    async fn fetch_credentials(&self, login: &str) -> Result<Option<UserCredentials>, AuthApiError> {
        self.timed("fetch_credentials", async {
            let mut conn = self.pool.acquire().await?;
            Ok::<_, AuthApiError>(users::fetch_credentials(login, &mut conn).await?)
        })
        .await
    }
}
