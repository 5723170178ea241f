//! Environment variable expansion for configuration strings.

use std::convert::Infallible;

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// A reference to an unset variable without a default is an error naming
/// both the variable and the config `field` it appeared in. Values without
/// `${` are returned as-is, so a literal `$` in a path is left alone.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let mut unset = Vec::new();
    let expanded = shellexpand::env_with_context(value, |var| {
        let found = std::env::var(var).ok();
        if found.is_none() {
            unset.push(var.to_owned());
        }
        Ok::<_, Infallible>(found)
    })
    .unwrap_or_else(|e| match e.cause {})
    .into_owned();

    // Unset variables with a default were substituted; the rest stay literal.
    if let Some(missing) = unset
        .iter()
        .find(|var| expanded.contains(&format!("${{{var}}}")))
    {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{missing}}} not set"),
        });
    }

    Ok(expanded)
}
