//! Command-line front end for LogiTrack.

pub mod config;
pub mod render;
