//! # Forum Shared
//!
//! Request forms, response DTOs and the error body of the topics API.
//! Kept free of server dependencies so clients can reuse it.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, FieldError};
