//! CardioGuard - heart-disease risk assessment and appointment backend
//!
//! This library provides the core functionality for the CardioGuard system:
//! patient accounts, classifier-backed risk assessments, the doctor
//! appointment workflow, notifications, and the admin surface.

pub mod api;
pub mod config;
pub mod db;
pub mod ml;
pub mod models;
pub mod services;
