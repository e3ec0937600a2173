use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("no edge weight between {from} and {to}")]
    MissingEdge { from: String, to: String },
    #[error("cancelled: {0}")]
    Cancelled(String),
    #[error("{context}.\nSTDOUT:\n{stdout}\nSTDERR:\n{stderr}")]
    ProcessFailed {
        context: String,
        stdout: String,
        stderr: String,
    },
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    pub fn missing_edge(from: impl std::fmt::Debug, to: impl std::fmt::Debug) -> Self {
        Self::MissingEdge {
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// True for failures caused by looking up a pair the graph does not hold.
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::MissingEdge { .. })
    }
}
