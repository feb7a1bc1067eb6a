//! Student Hub Library
//!
//! LMS aggregation, caching, grade and calendar logic, service clients and
//! the terminal dashboard, shared by the binary and integration tests.

pub mod aggregator;
pub mod app;
pub mod cache;
pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod grades;
pub mod logging;
pub mod ui;
