//! bracket-desk: risk-sized bracket orders for a brokerage gateway
//!
//! This library provides the core components for:
//! - Position sizing from account equity, risk percent and stop distance
//! - Order planning for market, limit, stop and bracket strategies
//! - Stop ladders and 2R OCO targets priced from the actual fill
//! - Bounded, one-at-a-time plan execution against a broker
//! - Quote, day range, account and position retrieval
//! - A paper gateway for the binary and the tests
//! - Logging and Prometheus metrics

pub mod broker;
pub mod cli;
pub mod config;
pub mod desk;
pub mod execution;
pub mod order;
pub mod planner;
pub mod risk;
pub mod telemetry;
