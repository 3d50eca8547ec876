//! Integration tests for bracket-desk

mod config_test;
mod desk_test;
mod plan_test;
