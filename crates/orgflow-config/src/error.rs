use orgflow_cloud::CloudError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Config file not found. Looked in:\n\
        - ./configs/accounts.yaml\n\
        - ./accounts.yaml\n\
        - ~/.config/orgflow/accounts.yaml\n\
        Pass --config or set ORGFLOW_CONFIG to point at a file directly"
    )]
    ConfigFileNotFound,

    #[error("Config file does not exist: {0}")]
    MissingFile(PathBuf),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CloudError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::TemplateNotFound(path) => {
                CloudError::TemplateNotFound(path.display().to_string())
            }
            other => CloudError::Configuration(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
