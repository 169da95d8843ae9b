//! Unified error type for the engine, configuration and persistence layers.

use thiserror::Error;

/// Every failure the crate can report.
///
/// Validation-class variants carry a message meant for the user. Collaborator
/// failures (database, I/O, price lookup) are logged where they happen and
/// shown through [`Error::user_message`] in sanitized form.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be read, parsed or validated
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Input rejected before any state was touched
    #[error("Validation error: {message}")]
    Validation {
        /// What the user has to fix
        message: String,
    },

    /// ND 30 and ND 39 do not add up to the total
    #[error("Allocation does not reconcile: ND 30 {nd30:.2} + ND 39 {nd39:.2} != total {total:.2}")]
    NotReconciled {
        /// ND 30 side
        nd30: f64,
        /// ND 39 side
        nd39: f64,
        /// Total the sides must add up to
        total: f64,
    },

    /// Inputs changed after the item was staged
    #[error("Staged calculation is outdated, stage the item again before saving")]
    Stale,

    /// Lifecycle action not allowed in the current editing state
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        /// Requested action
        action: &'static str,
        /// Current editing state
        state: &'static str,
    },

    /// Parent document does not exist
    #[error("Plan not found: {id}")]
    PlanNotFound {
        /// Plan id
        id: i64,
    },

    /// Cost record does not exist
    #[error("Cost record not found: {id}")]
    RecordNotFound {
        /// Record id
        id: i64,
    },

    /// Price-lookup collaborator failed
    #[error("Price lookup failed: {message}")]
    PriceLookup {
        /// Collaborator message
        message: String,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable could not be read
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Funds detail JSON could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Text safe to show to the user.
    ///
    /// Validation-class errors are returned as-is; collaborator failures are
    /// replaced by a generic message so backend details never reach the screen.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Io(_) | Self::Json(_) => {
                "Não foi possível salvar os dados. Tente novamente.".to_string()
            }
            Self::PriceLookup { .. } => {
                "Não foi possível consultar o preço do combustível.".to_string()
            }
            Self::EnvVar(_) | Self::Config { .. } => {
                "Configuração inválida. Contate o administrador.".to_string()
            }
            Self::Validation { message } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the error is a user-fixable validation problem.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::NotReconciled { .. }
                | Self::Stale
                | Self::InvalidTransition { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
