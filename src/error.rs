use thiserror::Error;

/// Failures surfaced while preparing or running a mining job.
#[derive( Error, Debug )]
pub enum MiningError {
    /// Required input column absent. Fatal before any mining starts.
    #[error( "Missing required column '{column}'" )]
    MissingColumn { column: String },

    /// The time values of one entity cannot be totally ordered.
    /// The entity is dropped from its population, mining carries on.
    #[error( "Entity '{entity}' has a time key that cannot be ordered: '{value}'" )]
    MalformedTimeKey { entity: String, value: String },

    #[error( "Invalid support threshold '{value}': expected a number in (0, 100]" )]
    InvalidThreshold { value: String },

    #[error( "Unknown run mode '{value}': expected 'separate' or 'together'" )]
    UnknownRunMode { value: String },

    #[error( "Line {line} has {found} fields, header declares {expected}" )]
    MalformedRow { line: usize, expected: usize, found: usize },

    #[error( "IO error: {0}" )]
    Io( #[from] std::io::Error ),

    #[error( "JSON error: {0}" )]
    Json( #[from] serde_json::Error ),
}

pub type Result<T> = std::result::Result<T, MiningError>;
