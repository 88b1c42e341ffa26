//! netpulse: periodic network status logger.
//!
//! Every tick the monitor records:
//!   - public IP (external echo service)
//!   - active interface, its hardware port label and MAC address
//!   - reachability and round-trip latency to a target host (`ping`)
//!
//! and appends one pipe-delimited line to stdout and a log file.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod preflight;
pub mod sample;
pub mod sink;
pub mod system;

pub use error::{Error, Result};
pub use monitor::Monitor;
pub use sample::{parse_line, ConnectionStatus, NetworkSample};
