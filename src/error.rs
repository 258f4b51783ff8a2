//! Error types for the drawer engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DrawerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("row {index} out of range (list has {count} rows)")]
    RowOutOfRange { index: usize, count: usize },

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),
}

pub type Result<T> = std::result::Result<T, DrawerError>;
