pub mod filter;
pub mod gating;
pub mod layout;
pub mod relevance;
