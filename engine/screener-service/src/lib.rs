//! Market screener service
//!
//! Composes the cache, the realtime channel, the filter/sort engines, and
//! the screener store into the screening pipeline, and owns the polling and
//! channel event loops plus service lifecycle.

pub mod config;
pub mod fetch;
pub mod pipeline;
pub mod service;
pub mod status;

pub use config::ScreenerConfig;
pub use fetch::FuturesClient;
pub use pipeline::ScreeningPipeline;
pub use service::ScreenerService;
pub use status::ApiStatus;
