use std::fmt;

/// Machine-readable error codes surfaced to collaborators and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    InvalidBounds,
    NotInCollection,
    InvalidRank,
    HeadroomExhausted,
    StorageFailure,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidBounds => "E1003",
            Self::NotInCollection => "E2001",
            Self::InvalidRank => "E2002",
            Self::HeadroomExhausted => "E2003",
            Self::StorageFailure => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidBounds => "Invalid rank space bounds",
            Self::NotInCollection => "Card not in collection",
            Self::InvalidRank => "Invalid rank value",
            Self::HeadroomExhausted => "No rank headroom after redistribution",
            Self::StorageFailure => "Rank storage failure",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `cardrank init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .cardrank/config.toml and retry."),
            Self::InvalidBounds => {
                Some("Ensure [space] satisfies min < 2 * threshold < max, threshold > 0, and sig_figs is 0 or large enough.")
            }
            Self::NotInCollection => Some("Check the card number and --collection name."),
            Self::InvalidRank => Some("Ranks are plain decimal numbers such as 12.5."),
            Self::HeadroomExhausted => {
                Some("The collection is too large for the configured rank space; widen [space].")
            }
            Self::StorageFailure => Some("Retry the whole operation; check disk space and locks."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by ranking operations and their storage collaborators.
#[derive(Debug, thiserror::Error)]
pub enum RankError {
    /// A lookup named an item the collection cannot locate.
    #[error("{key} is not in the collection")]
    NotInCollection { key: String },

    /// The rank space is misconfigured.
    #[error("invalid rank space: min {min}, max {max}, threshold {threshold}")]
    InvalidBounds {
        min: String,
        max: String,
        threshold: String,
    },

    /// The precision policy cannot tell two ranks one threshold apart at the
    /// largest magnitude of the space.
    #[error("{sig_figs} significant digits cannot resolve this rank space; at least {required} are needed")]
    InsufficientPrecision { sig_figs: u64, required: u64 },

    /// A rank literal could not be parsed as a decimal.
    #[error("invalid rank '{0}'")]
    InvalidRank(String),

    /// Redistribution did not restore room at the end of the collection.
    #[error("no headroom above rank {last} after redistribution")]
    HeadroomExhausted { last: String },

    /// The storage collaborator failed.
    #[error("rank storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl RankError {
    /// Build a [`RankError::NotInCollection`] for any displayable key.
    pub fn not_in_collection(key: impl fmt::Display) -> Self {
        Self::NotInCollection {
            key: key.to_string(),
        }
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotInCollection { .. } => ErrorCode::NotInCollection,
            Self::InvalidBounds { .. } | Self::InsufficientPrecision { .. } => {
                ErrorCode::InvalidBounds
            }
            Self::InvalidRank(_) => ErrorCode::InvalidRank,
            Self::HeadroomExhausted { .. } => ErrorCode::HeadroomExhausted,
            Self::Storage(_) => ErrorCode::StorageFailure,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}
