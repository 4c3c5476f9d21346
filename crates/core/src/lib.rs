pub mod error;
pub mod topics;
pub mod types;
