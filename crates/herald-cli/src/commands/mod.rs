//! Command implementations for herald-cli

pub mod check;
pub mod info;
pub mod init;

pub use check::run_check;
pub use info::run_info;
pub use init::run_init;
