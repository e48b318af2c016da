pub mod config;
pub mod engine;
pub mod error;
pub mod grouper;
pub mod model;
pub mod parser;
pub mod progress;
pub mod report;
pub mod scanner;

pub use config::AppConfig;
pub use engine::{EngineOutcome, ScanEngine};
pub use error::Error;
pub use model::{
    DuplicateGroup, FileRecord, GroupDecision, IdentityKey, PatternKind, ScanMetadata,
    ScanReport, SCHEMA_VERSION,
};
pub use progress::{ProgressReporter, SilentReporter};
pub use report::store::ReportStore;
pub use scanner::{CancelFlag, ScanOptions, ScanOutcome};
