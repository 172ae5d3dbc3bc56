use std::env;

use crate::error::AppError;

/// Resolve the database URL for the process.
///
/// `DATABASE_URL` wins when set; otherwise the URL is composed from the
/// individual `POSTGRES_*` variables.
pub fn database_url() -> Result<String, AppError> {
    if let Ok(url) = env::var("DATABASE_URL") {
        return Ok(url);
    }

    let host = env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
    let db_name = must_var("POSTGRES_DB")?;
    let username = must_var("POSTGRES_USER")?;
    let password = must_var("POSTGRES_PASSWORD")?;

    Ok(format!(
        "postgresql://{username}:{password}@{host}:{port}/{db_name}"
    ))
}

/// Get required environment variable or return a config error
fn must_var(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::config(format!("Missing required env var: {name}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_vars_produce_config_error() {
        // Only meaningful when the composing path is taken
        if env::var("DATABASE_URL").is_ok() {
            return;
        }
        env::remove_var("POSTGRES_DB");
        let err = database_url().unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }
}
