//! Port traits the domain depends on; adapters implement them.

pub mod clock_port;
pub mod config_port;
pub mod fund_data_port;
pub mod report_port;
