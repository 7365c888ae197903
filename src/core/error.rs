

use thiserror::Error;

use crate::core::events::SoftDeleteEventKind;
use crate::engine::EngineError;


#[derive(Error, Debug)]
pub enum SoftDeleteError {
    #[error("Configuration error on {type_name}.{field}: {reason}")]
    Configuration {
        type_name: String,
        field: String,
        reason: String,
    },

    #[error("Listener failed during {kind}: {source}")]
    Listener {
        kind: SoftDeleteEventKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

impl SoftDeleteError {
    pub fn configuration(
        type_name: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Configuration {
            type_name: type_name.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn listener(kind: SoftDeleteEventKind, source: anyhow::Error) -> Self {
        Self::Listener { kind, source }
    }
}


pub type Result<T> = std::result::Result<T, SoftDeleteError>;
