//! Centralized constants for the paved-roads gateway.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod labels;
pub mod lifecycle;
pub mod network;
pub mod paths;
pub mod policy;
pub mod quota;
pub mod state;
