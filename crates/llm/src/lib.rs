//! Text-generation collaborator for lurker.
//!
//! The core pipeline only sees the [`provider::LlmProvider`] trait; concrete
//! HTTP backends live in [`http`].

pub mod http;
pub mod provider;
