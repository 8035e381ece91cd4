//! # Forum Core
//!
//! The domain layer of the forum topics service.
//! This crate contains the topic model, pagination types and the ports that
//! infrastructure must implement. It has no infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod pagination;
pub mod ports;

pub use error::DomainError;
