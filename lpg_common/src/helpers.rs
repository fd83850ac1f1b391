use std::{env, fmt::Display, str::FromStr};

/// Reads and parses the environment variable `name`. Returns `default` if the variable is missing or cannot be
/// parsed. The failure reason is passed to `on_error` so that callers can log it in their own voice.
pub fn parse_env_or_default<T, F>(name: &str, default: T, on_error: F) -> T
where
    T: FromStr,
    T::Err: Display,
    F: FnOnce(String),
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            on_error(format!("{s} is not a valid value for {name}. {e}"));
            default
        }),
        Err(_) => default,
    }
}
