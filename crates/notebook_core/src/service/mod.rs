//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate engine and codec calls into session-level APIs.
//! - Keep UI/host layers decoupled from reducer details.

pub mod notebook_service;
