use core_config::{app_info, server::ServerConfig, storage::StorageConfig, AppInfo, FromEnv};

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `core_config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=3000
        let storage = StorageConfig::from_env()?; // Uses default: TODO_DATA_FILE=todos.json

        Ok(Self {
            app: app_info!(),
            server,
            storage,
            environment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_from_env_defaults() {
        temp_env::with_vars(
            [
                ("APP_ENV", None::<&str>),
                ("PORT", None),
                ("TODO_DATA_FILE", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.app.name, "todo_api");
                assert_eq!(config.server.port, 3000);
                assert_eq!(config.storage.data_file, PathBuf::from("todos.json"));
                assert!(config.environment.is_development());
            },
        );
    }

    #[test]
    fn test_config_from_env_rejects_bad_port() {
        temp_env::with_var("PORT", Some("eighty"), || {
            assert!(Config::from_env().is_err());
        });
    }
}
