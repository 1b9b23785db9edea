pub mod assistant;
pub mod clock;
pub mod config;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod progress;
pub mod recipe;
pub mod router;
pub mod session;
pub mod state;
pub mod tracing;

pub use config::ApiConfig;
pub use state::ApiState;
