pub mod aggregation;
pub mod export;
pub mod filter_engine;
pub mod period_calculator;
pub mod record_ingestor;
pub mod session;
