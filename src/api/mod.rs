//! API module
//!
//! Contains HTTP request handlers for the conversation endpoints

pub mod conversations;
pub mod utils;
