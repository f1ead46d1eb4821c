//! CLI subcommands

pub mod debate;
pub mod experts;
pub mod info;
