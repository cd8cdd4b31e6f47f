use std::io;

use sensorthings_core::{ModelError, PathError, RequestError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("logger initialization failed: {0}")]
    Logger(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("invalid version: {0}")]
    Version(#[from] PathError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("usage: sta-parse [--config <path>] <url>...")]
    Usage,
}

pub type Result<T> = std::result::Result<T, CliError>;
