use thiserror::Error;

#[derive(Debug, Error)]
pub enum NadirError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read workbook {path}: {reason}")]
    WorkbookUnreadable { path: String, reason: String },

    #[error("Sheet '{sheet}' not found in {source_name}")]
    SheetMissing { source_name: String, sheet: String },

    #[error("Column '{column}' not found in sheet '{sheet}'")]
    ColumnMissing { sheet: String, column: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, NadirError>;
