//! Concrete adapter implementations for ports.

pub mod clock_adapter;
pub mod csv_adapter;
#[cfg(feature = "eastmoney")]
pub mod eastmoney_adapter;
pub mod file_config_adapter;
pub mod text_report_adapter;
