//! Port traits at the I/O seams.

pub mod archive_port;
pub mod config_port;
pub mod data_port;
