//! Text-generation provider implementations for Safina.
//!
//! All providers implement the `safina_core::Provider` trait.
//! The `ProviderManager` picks a live one per query.

pub mod manager;
pub mod openai_compat;
pub mod router;

pub use manager::ProviderManager;
pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
