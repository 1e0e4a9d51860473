use std::fmt;

use serde::{Serialize, Serializer};

/// Machine-readable error codes for scripts and dashboards consuming CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InputNotFound,
    UnsupportedFileType,
    InputTooLarge,
    MissingColumns,
    MalformedCsv,
    SearchBudgetExceeded,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InputNotFound => "E2001",
            Self::UnsupportedFileType => "E2002",
            Self::InputTooLarge => "E2003",
            Self::MissingColumns => "E2004",
            Self::MalformedCsv => "E2005",
            Self::SearchBudgetExceeded => "E3001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InputNotFound => "Input file not found",
            Self::UnsupportedFileType => "Only CSV files are accepted",
            Self::InputTooLarge => "Input file too large",
            Self::MissingColumns => "Missing required columns",
            Self::MalformedCsv => "Failed to parse CSV",
            Self::SearchBudgetExceeded => "Graph search budget exhausted",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in mulenet.toml and retry."),
            Self::InputNotFound => Some("Check the path to the transaction export."),
            Self::UnsupportedFileType => Some("Export the transactions as a .csv file."),
            Self::InputTooLarge => {
                Some("Split the export or raise analysis.max_input_bytes in mulenet.toml.")
            }
            Self::MissingColumns => Some(
                "Provide transaction_id, sender_id, receiver_id, amount and timestamp columns.",
            ),
            Self::MalformedCsv => Some("Check the file for ragged rows or invalid UTF-8."),
            Self::SearchBudgetExceeded => {
                Some("Raise the search budget in mulenet.toml or analyse a smaller batch.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Serialized as the bare `E####` string.
impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}
