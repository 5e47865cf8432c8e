//! # railbird-provider
//!
//! The boundary to the remote completion service: message types, the
//! `CompletionClient` trait, a reqwest-backed HTTP implementation, retry
//! with exponential backoff, and the client error taxonomy.

pub mod client;
pub mod error;
pub mod message;
pub mod retry;

pub use client::{
    ClientConfig, Completion, CompletionClient, FinishReason, HttpCompletionClient,
};
pub use error::ClientError;
pub use message::{Message, MessageRole};
pub use retry::{with_retry, RetryClassification, RetryConfig, RetryableError};
