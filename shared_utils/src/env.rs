use thiserror::Error;

/// Errors raised while reading process configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable required by the application is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// The variable is set but holds an empty (or whitespace-only) value.
    #[error("Environment variable {0} is empty")]
    EmptyEnvVar(String),
}

/// Reads a required environment variable.
///
/// Blank values are rejected: a `DATABASE_URL=""` left over in a shell is
/// almost never what the caller wants.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, ConfigError> {
    let value = std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyEnvVar(name.to_string()));
    }
    Ok(value)
}

/// Reads an optional environment variable, treating blank values as unset.
pub fn get_env_var_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_var_is_reported_by_name() {
        let err = get_env_var("SHARED_UTILS_TEST_DEFINITELY_UNSET").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing environment variable: SHARED_UTILS_TEST_DEFINITELY_UNSET"
        );
    }

    #[test]
    fn unset_optional_is_none() {
        assert!(get_env_var_opt("SHARED_UTILS_TEST_ALSO_UNSET").is_none());
    }
}
