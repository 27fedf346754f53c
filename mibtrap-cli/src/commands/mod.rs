//! Command handlers -- one module per subcommand

pub mod catalog;
pub mod config;
pub mod mapping;
pub mod trap;
