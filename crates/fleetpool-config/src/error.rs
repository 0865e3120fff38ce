use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Config file not found. Looked in:\n\
        - current directory: fleetpool.local.yaml, fleetpool.yaml\n\
        - ~/.config/fleetpool/fleetpool.yaml\n\
        Set FLEETPOOL_CONFIG_PATH to point at a file directly"
    )]
    ConfigFileNotFound,

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
