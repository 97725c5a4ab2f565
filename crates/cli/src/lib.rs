//! `picker-sim`: replay media picker scenarios against a simulated host.

pub mod cli;
pub mod logging;
pub mod output;
pub mod scenario;
