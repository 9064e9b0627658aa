pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{
    capture::{open_scanner, LineScanner, TextDecoder},
    memory::MemoryStore,
    sound::{LogFeedback, SoundFeedback},
    supabase::SupabaseStore,
};
pub use config::AppConfig;
pub use core::{
    engine::{RunSummary, ScanEngine},
    pipeline::{Rejection, ScanOutcome, ScanPipeline},
};
pub use domain::model::{ActiveReceptacle, CreditReceipt};
pub use utils::error::{PointsError, Result};
