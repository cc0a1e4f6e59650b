//! UCI (Universal Chess Interface) protocol implementation

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::{GoParams, UciCommand};
pub use output::{UciResponse, send_info_string, send_response};
pub use parser::parse_uci_command;
