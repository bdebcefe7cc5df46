use thiserror::Error;

pub type Result<T> = std::result::Result<T, HoldingsError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HoldingsError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Table has {found} columns but at least {required} are required")]
    SchemaTooNarrow { found: usize, required: usize },

    #[error("Required field '{0}' is not mapped to any column")]
    MissingRequiredField(String),

    #[error("Cannot parse weight '{raw}' at row {row}")]
    UnparseableWeight { row: usize, raw: String },
}

impl HoldingsError {
    /// Schema-level failures are reported before any row is read.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            HoldingsError::SchemaTooNarrow { .. } | HoldingsError::MissingRequiredField(_)
        )
    }
}
