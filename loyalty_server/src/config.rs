use std::{env, io::Write, time::Duration};

use accrual_tools::AccrualConfig;
use log::*;
use lpg_common::{parse_env_or_default, Secret};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_RUN_ADDRESS: &str = "localhost:18080";
const DEFAULT_DATABASE_URL: &str = "sqlite://data/loyalty.db";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_millis(5000);
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host and port to listen on, e.g. `localhost:18080`.
    pub run_address: String,
    pub database_url: String,
    /// Time between reconciliation passes. A pass is also cut off after this long.
    pub poll_interval: Duration,
    /// Upper bound on any single storage call.
    pub storage_timeout: Duration,
    pub max_connections: u32,
    pub auth: AuthConfig,
    pub accrual: AccrualConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            run_address: DEFAULT_RUN_ADDRESS.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auth: AuthConfig::default(),
            accrual: AccrualConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let run_address = env::var("LPG_RUN_ADDRESS").ok().unwrap_or_else(|| {
            info!("🪛️ LPG_RUN_ADDRESS is not set. Using the default, {DEFAULT_RUN_ADDRESS}.");
            DEFAULT_RUN_ADDRESS.into()
        });
        let database_url = env::var("LPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ LPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let poll_interval = parse_env_or_default("LPG_POLL_INTERVAL", DEFAULT_POLL_INTERVAL.as_secs(), |e| {
            warn!("🪛️ {e}. Using the default of {} s.", DEFAULT_POLL_INTERVAL.as_secs())
        });
        let poll_interval = if poll_interval == 0 {
            warn!("🪛️ LPG_POLL_INTERVAL must be at least 1 s. Using the default instead.");
            DEFAULT_POLL_INTERVAL
        } else {
            Duration::from_secs(poll_interval)
        };
        let storage_timeout =
            parse_env_or_default("LPG_STORAGE_TIMEOUT_MS", DEFAULT_STORAGE_TIMEOUT.as_millis() as u64, |e| {
                warn!("🪛️ {e}. Using the default of {} ms.", DEFAULT_STORAGE_TIMEOUT.as_millis())
            });
        let max_connections = parse_env_or_default("LPG_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS, |e| {
            warn!("🪛️ {e}. Using the default of {DEFAULT_MAX_CONNECTIONS}.")
        });
        let mut auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!("🪛️ Could not load the authentication configuration. {e}. Reverting to the default configuration.");
            AuthConfig::default()
        });
        let hours = parse_env_or_default("LPG_TOKEN_LIFETIME_HOURS", DEFAULT_TOKEN_LIFETIME_HOURS, |e| {
            warn!("🪛️ {e}. Tokens will be valid for {DEFAULT_TOKEN_LIFETIME_HOURS} hours.")
        });
        auth.token_lifetime = chrono::Duration::hours(hours.max(1));
        let accrual = AccrualConfig::new_from_env_or_default();
        Self {
            run_address,
            database_url,
            poll_interval,
            storage_timeout: Duration::from_millis(storage_timeout),
            max_connections: max_connections.max(1),
            auth,
            accrual,
        }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HMAC key for signing and verifying access tokens.
    pub jwt_secret: Secret<String>,
    pub token_lifetime: chrono::Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this since every restart will log all users out. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => match writeln!(f, "{secret}") {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, \
                     you are doing it wrong! Set the LPG_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                    p.to_str().unwrap_or("???")
                ),
                Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self::new(secret, chrono::Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS))
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S, token_lifetime: chrono::Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), token_lifetime }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("LPG_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [LPG_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("LPG_JWT_SECRET is empty".into()));
        }
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            warn!("🪛️ LPG_JWT_SECRET is shorter than {MIN_JWT_SECRET_LENGTH} characters. Consider a longer secret.");
        }
        Ok(Self::new(secret, chrono::Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS)))
    }
}
