//! Operator login gate for commands that write data.

use fttm_core::{AppConfig, Credentials, Environment, Operator};

/// Checks the operator against the static credential table.
///
/// Returns `Ok(None)` only in development with an empty table, where the
/// gate is disabled with a warning.
///
/// # Errors
///
/// Returns an error if the table is malformed, empty outside development,
/// the username or password is missing, or the pair does not match.
pub(crate) fn require_operator(
    config: &AppConfig,
    user: Option<&str>,
    password: Option<&str>,
) -> anyhow::Result<Option<Operator>> {
    let credentials = Credentials::parse(&config.credentials, &config.password_salt)?;

    if credentials.is_empty() {
        if config.env == Environment::Development {
            tracing::warn!("no operator credentials configured; login disabled in development");
            return Ok(None);
        }
        anyhow::bail!("no operator credentials configured; set FTTM_CREDENTIALS");
    }

    let user = user.ok_or_else(|| anyhow::anyhow!("login required: pass --user or set FTTM_USER"))?;
    let password =
        password.ok_or_else(|| anyhow::anyhow!("login required: set FTTM_PASSWORD for '{user}'"))?;

    let operator = credentials.login(user, password)?;
    tracing::info!(operator = %operator.username, "operator logged in");
    Ok(Some(operator))
}
