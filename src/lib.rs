//! Team optimizer: picks the strongest fixed-size roster in which every damage type is
//! resisted by at least one member, solved exactly as a binary integer program.

pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
pub mod optimizer;
pub mod parallel;
pub mod server;
