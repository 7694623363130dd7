// Public modules
pub mod types;
pub mod error;
pub mod config;
pub mod normalize;
pub mod parsing;
pub mod extract;
pub mod report;
pub mod escape;
pub mod render;
pub mod pipeline;
pub mod zoho;
pub mod telegram;

// Re-export commonly used items
pub use types::*;
pub use error::RumError;
pub use config::{load_config, load_config_with_env, within_schedule, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use normalize::{normalize_path, normalize_value, is_reportable};
pub use extract::{extract_records, ResponseShape};
pub use report::{build_report, ColumnLayout};
pub use escape::EscapeDialect;
pub use render::{render_blocks, render_error, Renderer};
pub use pipeline::{MonitorPipeline, RumSource, ChatSink};
pub use zoho::ZohoClient;
pub use telegram::TelegramClient;
