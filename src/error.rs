//! Error taxonomy for the import pipeline.
//!
//! Parsing and mapping errors block progression to the next step, execution
//! errors roll the session back one step. Row-level validation failures are
//! never raised here; they are folded into [`crate::executor::ImportResult`].

use thiserror::Error;

use crate::session::SessionState;

#[derive(Debug, Error)]
pub enum ImportError {
    /// Fewer than one header line plus one data line.
    #[error("Input must contain a header line and at least one data row (found {lines} non-blank line(s))")]
    EmptyInput { lines: usize },

    #[error("Unknown source column '{0}'")]
    UnknownColumn(String),

    #[error("Unknown target field '{0}'")]
    UnknownField(String),

    #[error("Unknown module '{0}'")]
    UnknownModule(String),

    #[error("Import into module '{module}' failed")]
    ImportExecution {
        module: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("An import is already in flight for this session")]
    ImportInProgress,

    #[error("Cannot {action} while the session is {from}")]
    InvalidTransition {
        from: SessionState,
        action: &'static str,
    },
}

impl ImportError {
    /// Recoverable errors leave the session's data intact.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ImportError::EmptyInput { .. } | ImportError::ImportExecution { .. }
        )
    }
}
