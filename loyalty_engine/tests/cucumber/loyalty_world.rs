use std::{collections::HashMap, fmt::Debug, sync::Mutex};

use cucumber::World;
use log::*;
use loyalty_engine::{
    db_types::{OrderNumber, Points},
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    AccountApi,
    AccrualReport,
    AccrualSource,
    AccrualSourceError,
    AuthApi,
    OrderFlowApi,
    ReconcileSummary,
    ReconciliationApi,
    SqliteDatabase,
    SubmitOrderResult,
    WithdrawalApi,
    WithdrawalError,
};

#[derive(Default, Debug, World)]
pub struct LoyaltyWorld {
    pub system: Option<LoyaltySystem>,
    pub users: HashMap<String, i64>,
    pub accrual: ScriptedAccrual,
    pub last_submission: Option<SubmitOrderResult>,
    pub last_withdrawal: Option<Result<(), WithdrawalError>>,
    pub last_pass: Option<ReconcileSummary>,
}

#[derive(Debug)]
pub struct LoyaltySystem {
    pub db_path: String,
    pub db: SqliteDatabase,
}

impl LoyaltySystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        create_database(&url).await;
        run_migrations(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("🚀️ Created database: {url}");
        Self { db_path: url, db }
    }
}

impl LoyaltyWorld {
    fn db(&self) -> SqliteDatabase {
        self.system.as_ref().expect("Ledger not initialised").db.clone()
    }

    pub fn user(&self, login: &str) -> i64 {
        *self.users.get(login).unwrap_or_else(|| panic!("No user called {login}"))
    }

    pub fn auth(&self) -> AuthApi<SqliteDatabase> {
        AuthApi::new(self.db())
    }

    pub fn orders(&self) -> OrderFlowApi<SqliteDatabase> {
        OrderFlowApi::new(self.db())
    }

    pub fn withdrawals(&self) -> WithdrawalApi<SqliteDatabase> {
        WithdrawalApi::new(self.db())
    }

    pub fn accounts(&self) -> AccountApi<SqliteDatabase> {
        AccountApi::new(self.db())
    }

    pub fn reconciler(&self) -> ReconciliationApi<SqliteDatabase> {
        ReconciliationApi::new(self.db())
    }
}

/// Accrual answers set up by the scenario. Unknown orders are reported as not registered.
#[derive(Default, Debug)]
pub struct ScriptedAccrual {
    reports: Mutex<HashMap<String, Result<AccrualReport, AccrualSourceError>>>,
}

impl ScriptedAccrual {
    pub fn set(&self, number: &str, report: Result<AccrualReport, AccrualSourceError>) {
        self.reports.lock().unwrap().insert(number.to_string(), report);
    }
}

impl AccrualSource for ScriptedAccrual {
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<Option<AccrualReport>, AccrualSourceError> {
        self.reports.lock().unwrap().get(number.as_str()).cloned().transpose()
    }
}

pub fn parse_points(s: &str) -> Points {
    s.parse().unwrap_or_else(|e| panic!("{s} is not a valid points amount: {e:?}"))
}
