use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("column {index}: {reason}")]
    BadColumn { index: usize, reason: String },
    #[error("duplicate column key: {0}")]
    DuplicateColumn(String),
    #[error("column {key}: unknown format {format}")]
    UnknownFormat { key: String, format: String },
    #[error("{0}")]
    BadOptions(String),
    #[error("search is disabled for this table")]
    SearchDisabled,
    #[error("sorting is disabled for column {0}")]
    SortDisabled(String),
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("pagination is disabled for this table")]
    PaginationDisabled,
    #[error("row {position} is not on the current page ({shown} rows shown)")]
    RowOutOfRange { position: usize, shown: usize },
}

impl TableError {
    /// Stable code reported in IPC error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            TableError::BadColumn { .. } => "bad_columns",
            TableError::DuplicateColumn(_) => "duplicate_column",
            TableError::UnknownFormat { .. } => "unknown_format",
            TableError::BadOptions(_) => "bad_options",
            TableError::SearchDisabled => "search_disabled",
            TableError::SortDisabled(_) => "sort_disabled",
            TableError::UnknownColumn(_) => "unknown_column",
            TableError::PaginationDisabled => "pagination_disabled",
            TableError::RowOutOfRange { .. } => "row_out_of_range",
        }
    }
}
