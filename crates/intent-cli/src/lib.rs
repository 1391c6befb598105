//! Intent router command-line library.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (query, repl, detect, stats, clear-cache)
//! - `actions`: Demo action handlers over a device repository

pub mod actions;
pub mod cli;
pub mod commands;

pub use actions::{
    demo_registry, Device, DeviceError, DeviceRepository, DeviceStatus, InMemoryDeviceRepository,
    UserProfile,
};
pub use cli::{Cli, Commands, ProviderArg};
pub use commands::{
    build_engine, build_provider, clear_cache, init_logging, load_settings, render_result,
    run_detect, run_query, run_repl, show_stats,
};
