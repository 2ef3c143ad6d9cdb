//! Course staffing: application intake, staff review, offers, and status e-mails.

pub mod applications;
pub mod config;
pub mod error;
pub mod telemetry;
