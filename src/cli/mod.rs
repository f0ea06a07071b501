//! CLI command implementations

pub mod catalog;
pub mod init;
pub mod levels;
pub mod serve;
pub mod simulate;
