//! # Simulation Configuration
//!
//! Runtime and logging settings shared by every crate in the workspace.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use arena_config::{init_tracing, load_config};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = load_config(None)?;
//! init_tracing(&config.logging)?;
//! # Ok(())
//! # }
//! ```
//!
//! Environment variables use the `ARENA_` prefix and `__` between section and
//! key, e.g. `ARENA_RUNTIME__OVERFLOW_CHECK=false` or `ARENA_LOGGING__JSON=true`.

pub mod logging;
pub mod settings;

// Re-export commonly used types
pub use logging::init_tracing;
pub use settings::{load_config, LoggingConfig, RuntimeSettings, SimulationConfig, ENV_PREFIX};
