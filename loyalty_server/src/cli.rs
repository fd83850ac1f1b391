use std::{env, env::VarError, time::Duration};

use clap::Parser;
use log::*;

use crate::config::ServerConfig;

const README: &str = include_str!("./cli-help.txt");

#[derive(Parser, Debug, Default)]
#[command(version, about = "Loyalty points gateway server", after_help = README)]
pub struct Cli {
    /// Address and port to listen on, e.g. localhost:18080
    #[arg(short = 'a', long = "address")]
    pub run_address: Option<String>,
    /// SQLite connection string, e.g. sqlite://data/loyalty.db
    #[arg(short = 'd', long = "database")]
    pub database_url: Option<String>,
    /// Base URL of the accrual service
    #[arg(short = 'r', long = "accrual")]
    pub accrual_address: Option<String>,
    /// Seconds between reconciliation passes
    #[arg(short = 'i', long = "interval")]
    pub poll_interval: Option<u64>,
    /// Print the current configuration environment and exit
    #[arg(long = "show-env")]
    pub show_env: bool,
}

impl Cli {
    /// Copies flag values into `config`, unless the matching environment variable was set.
    pub fn apply_to(&self, config: &mut ServerConfig) {
        if let Some(v) = flag_value("LPG_RUN_ADDRESS", &self.run_address) {
            config.run_address = v.clone();
        }
        if let Some(v) = flag_value("LPG_DATABASE_URL", &self.database_url) {
            config.database_url = v.clone();
        }
        if let Some(v) = flag_value("LPG_ACCRUAL_SYSTEM_ADDRESS", &self.accrual_address) {
            config.accrual = config.accrual.clone().with_address(v.as_str());
        }
        if let Some(v) = flag_value("LPG_POLL_INTERVAL", &self.poll_interval) {
            config.poll_interval = Duration::from_secs((*v).max(1));
        }
    }
}

fn flag_value<'a, T>(env_name: &str, flag: &'a Option<T>) -> Option<&'a T> {
    let flag = flag.as_ref()?;
    if env::var_os(env_name).is_some() {
        info!("🪛️ {env_name} is set, so the matching command line flag is ignored");
        None
    } else {
        Some(flag)
    }
}

pub fn display_envs() {
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "LPG_RUN_ADDRESS",
        "LPG_DATABASE_URL",
        "LPG_POLL_INTERVAL",
        "LPG_STORAGE_TIMEOUT_MS",
        "LPG_MAX_CONNECTIONS",
        "LPG_TOKEN_LIFETIME_HOURS",
        "LPG_ACCRUAL_SYSTEM_ADDRESS",
        "LPG_ACCRUAL_REQUEST_TIMEOUT_MS",
        "LPG_ACCRUAL_MAX_RETRIES",
        "LPG_ACCRUAL_BACKOFF_BASE_MS",
        "LPG_ACCRUAL_BACKOFF_MAX_MS",
        "LPG_ACCRUAL_MAX_TOTAL_WAIT_MS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
