/// Emits a tracing event at a level only known at runtime
macro_rules! log_at {
    ( $level:expr, $($arg:tt)+ ) => {
        match $level {
            tracing::Level::ERROR => tracing::error!( $($arg)+ ),
            tracing::Level::WARN => tracing::warn!( $($arg)+ ),
            tracing::Level::INFO => tracing::info!( $($arg)+ ),
            tracing::Level::DEBUG => tracing::debug!( $($arg)+ ),
            _ => tracing::trace!( $($arg)+ ),
        }
    }
}

pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod miner;
pub mod model;
pub mod run;

pub use config::{MiningConfig, RunMode, Threshold};
pub use data::{Count, Database, DelimitedSequence, Event, EventLog, Item, Itemvec, SequenceDatabase, TimeKey, Vocabulary};
pub use error::MiningError;
pub use miner::{GspMiner, LevelResult, Miner, MiningResult, RunState, SupportRecord, ThresholdRun};
pub use model::{Candidate, Generator, GspGenerator};
pub use run::{PartitionOutcome, PartitionReport};

/// Objects that can be recorded in the log
pub trait Loggable {
    fn log( &self, message: &str, level: tracing::Level );
}
