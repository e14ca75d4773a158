//! # BoardCheck I/O
//!
//! File formats around the checker: board, netlist and configuration
//! documents are JSON in the serde form of the model types; reports are
//! written as line-oriented text or as JSON.

pub mod board_file;
pub mod config;
pub mod error;
pub mod report;

pub use board_file::{load_board, load_netlist, read_board, read_netlist, save_board, save_netlist, write_board};
pub use config::{load_config, read_config, CheckConfig, ReportFormat};
pub use error::IoError;
pub use report::{format_position, save_report, ReportWriter};
