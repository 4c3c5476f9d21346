//! Row models and insert DTOs.

pub mod history_event;
