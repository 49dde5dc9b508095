// Library for tests to access modules

pub mod aggregator;
pub mod config;
pub mod error;
pub mod formatter;
pub mod models;
pub mod scheduler;
pub mod sender;
pub mod sources;
pub mod units;
