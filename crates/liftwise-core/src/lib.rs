//! Core logic for liftwise: program schema and generation, the AI client
//! adapters, workout-day tracking, wizard answers, uploads, and session
//! signing.

pub mod error;
pub mod llm;
pub mod program;
pub mod session;
pub mod text;
pub mod tracker;
pub mod upload;
pub mod wizard;

pub use error::ServiceError;
