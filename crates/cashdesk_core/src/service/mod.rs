//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce the membership business invariants above the repository
//!   layer.

pub mod cash_desk;
