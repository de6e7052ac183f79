//! Waitlister - A multi-tenant waitlist ranking service
//!
//! This library provides the core functionality for the Waitlister service,
//! including waitlist management, sequential position assignment, referral
//! tracking, bulk CSV import/export, and the HTTP API.
//!
//! # Architecture
//! - `storage`: SeaORM storage backend and data access
//! - `analytics`: Landing page view tracking
//! - `services`: Business logic shared by public and admin APIs
//! - `api`: HTTP services and middleware
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging and system utilities
//! - `utils`: Referral codes, slugs and CSV row handling

pub mod analytics;
pub mod api;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
