pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod features;
pub mod handbook;
pub mod indicators;
pub mod listing;
pub mod market_data;
pub mod models;
pub mod param_utils;
pub mod performance;
pub mod signals;
pub mod simulator;
pub mod strategy;
pub mod strategy_utils;
pub mod sweep;
pub mod sweep_status;
