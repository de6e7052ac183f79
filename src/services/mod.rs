//! Service layer for business logic
//!
//! This module provides unified business logic shared between the
//! public signup API and the admin dashboard API.

pub mod import_validation;
mod waitlist_service;

pub use import_validation::{ImportRowError, ImportSignupRaw, ImportSignupRich};
pub use waitlist_service::*;
