//! Shared utilities and common types for the Transdesk backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Password hashing with Argon2id
//! - Bearer token issue and validation
//! - Common validation logic
//! - Offset pagination helpers

pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
