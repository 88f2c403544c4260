//! Application configuration

use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // CORS origin of the browser client
    pub client_url: String,

    // Typing indicator inactivity timeout
    pub typing_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3001".to_string()),
            client_url: env::var("CLIENT_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            typing_timeout_ms: {
                let raw =
                    env::var("TYPING_TIMEOUT_MS").unwrap_or_else(|_| "3000".to_string());
                let ms: u64 = raw
                    .parse()
                    .map_err(|_| ConfigError::Invalid("TYPING_TIMEOUT_MS must be an integer"))?;
                if ms == 0 {
                    return Err(ConfigError::Invalid("TYPING_TIMEOUT_MS must be positive"));
                }
                ms
            },
        })
    }

    /// Typing inactivity timeout as a duration
    pub fn typing_timeout(&self) -> Duration {
        Duration::from_millis(self.typing_timeout_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure config tests run serially (they modify shared env vars)
    static CONFIG_TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults() {
        let _lock = CONFIG_TEST_MUTEX.lock().unwrap();
        env::remove_var("BIND_ADDRESS");
        env::remove_var("CLIENT_URL");
        env::remove_var("TYPING_TIMEOUT_MS");

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3001");
        assert_eq!(config.client_url, "http://localhost:3000");
        assert_eq!(config.typing_timeout_ms, 3000);
        assert_eq!(config.typing_timeout(), Duration::from_millis(3000));
    }

    #[test]
    fn test_typing_timeout_validation() {
        let _lock = CONFIG_TEST_MUTEX.lock().unwrap();

        env::set_var("TYPING_TIMEOUT_MS", "not-a-number");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid(_))
        ));

        env::set_var("TYPING_TIMEOUT_MS", "0");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Invalid(_))
        ));

        env::set_var("TYPING_TIMEOUT_MS", "1500");
        let config = Config::from_env().unwrap();
        assert_eq!(config.typing_timeout_ms, 1500);

        env::remove_var("TYPING_TIMEOUT_MS");
    }
}
