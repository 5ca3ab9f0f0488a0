pub mod boundary;
pub mod dashboard_config;
pub mod error;

// Sales dataset module
pub mod sales;
