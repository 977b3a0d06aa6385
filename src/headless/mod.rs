//! Headless mode for agentic testing
//!
//! Runs rounds without any graphical output, suitable for automated testing
//! and batch simulation.
//!
//! ## Usage
//!
//! ```bash
//! # Run a headless round
//! cargo run --release -- --headless round_config.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "final_flash_shield": "Absorbable",
//!   "tie_break": "Draw",
//!   "max_duration_secs": 120,
//!   "random_seed": 42
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::HeadlessRoundConfig;
pub use runner::{build_core_round_app, run_headless_round, RoundResult};
