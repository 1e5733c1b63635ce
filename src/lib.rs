pub mod analyzer;
pub mod config;
pub mod error;
pub mod ingest;
pub mod parser;
pub mod refresh;
pub mod render;
pub mod state;

pub use config::AppConfig;
pub use error::{AppError, IngestionError};
pub use refresh::{trigger_channel, RefreshOrchestrator, Trigger, TriggerHandle};

// ─── E2E Integration Tests ──────────────────────────────────────────────────
