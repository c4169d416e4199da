//! confbind CLI library
//!
//! Exposes the CLI entry point so the `confbind` binary stays a thin wrapper.

mod cli;
mod shapes;

pub use cli::run;
