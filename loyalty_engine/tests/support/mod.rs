#![allow(dead_code)]
use std::{collections::HashMap, sync::Mutex, time::Duration};

use loyalty_engine::{
    db_types::{OrderNumber, Points},
    helpers::luhn_check_digit,
    test_utils::prepare_env::{drop_database, prepare_test_env, random_db_path},
    AccrualReport,
    AccrualSource,
    AccrualSourceError,
    AuthApi,
    ExternalAccrualStatus,
    LedgerDatabase,
    SqliteDatabase,
};

pub struct TestLedger {
    pub url: String,
    pub db: SqliteDatabase,
}

impl TestLedger {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 10).await.expect("Error creating connection to database");
        Self { url, db }
    }

    pub async fn register(&self, login: &str) -> i64 {
        let api = AuthApi::new(self.db.clone());
        api.register_user(login, "password123").await.expect("Could not register user").id
    }

    pub async fn teardown(mut self) {
        self.db.close().await.expect("Could not close database");
        drop_database(&self.url).await;
    }
}

/// Builds a Luhn-valid order number from any seed.
pub fn order_number(seed: u64) -> String {
    let payload = seed.to_string();
    let check = luhn_check_digit(&payload).expect("seed is numeric");
    format!("{payload}{check}")
}

pub fn points(whole: i64) -> Points {
    Points::from_points(whole)
}

/// An in-memory stand-in for the accrual service.
#[derive(Default)]
pub struct FakeAccrualService {
    reports: Mutex<HashMap<String, Result<AccrualReport, AccrualSourceError>>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<String>>,
}

impl FakeAccrualService {
    pub fn report(&self, number: &str, status: ExternalAccrualStatus, accrual: Option<Points>) {
        self.reports.lock().unwrap().insert(number.to_string(), Ok(AccrualReport::new(status, accrual)));
    }

    pub fn fail(&self, number: &str, error: AccrualSourceError) {
        self.reports.lock().unwrap().insert(number.to_string(), Err(error));
    }

    pub fn delay(&self, number: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(number.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl AccrualSource for FakeAccrualService {
    async fn fetch_accrual(&self, number: &OrderNumber) -> Result<Option<AccrualReport>, AccrualSourceError> {
        self.calls.lock().unwrap().push(number.to_string());
        let delay = self.delays.lock().unwrap().get(number.as_str()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let report = self.reports.lock().unwrap().get(number.as_str()).cloned();
        report.transpose()
    }
}
