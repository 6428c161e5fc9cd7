//! Case store messages
//!
//! Commands and responses for the actor pattern.

use casestore::JournalError;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{Case, Category};

/// Errors from case store operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Case not found: {0}")]
    NotFound(String),

    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("Channel error")]
    ChannelError,
}

impl StateError {
    /// The append was rejected because the case id is already stored
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StateError::Journal(e) if e.is_duplicate())
    }
}

/// Response from case store operations
pub type StateResponse<T> = Result<T, StateError>;

/// Commands sent to the CaseStore actor
#[derive(Debug)]
pub enum StateCommand {
    Append {
        case: Box<Case>,
        reply: oneshot::Sender<StateResponse<()>>,
    },
    ListAll {
        category: Option<Category>,
        reply: oneshot::Sender<StateResponse<Vec<Case>>>,
    },
    Resolve {
        id_or_prefix: String,
        reply: oneshot::Sender<StateResponse<Case>>,
    },
    Count {
        reply: oneshot::Sender<StateResponse<usize>>,
    },
    Shutdown,
}
