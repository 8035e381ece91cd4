//! SeaORM entities of the forum schema.

pub mod course;
pub mod reply;
pub mod topic;
pub mod user;
