//! Built-in handlers for Safina.
//!
//! Handlers give the orchestrator its capabilities: check loan eligibility
//! against the lending datasets, answer policy questions from the FAQ
//! knowledge base, and respond to greetings or anything else.

pub mod eligibility;
pub mod faq;
pub mod general;
mod time_of_day;

#[cfg(test)]
mod test_helpers;

use safina_core::tool::{CapabilityRegistry, Handler};
use std::sync::Arc;

pub use eligibility::{EligibilityHandler, EligibilityLookup, TableLookup};
pub use faq::{FaqBook, FaqHandler};
pub use general::GeneralHandler;

/// Create a registry with all built-in handlers.
///
/// Registration order is eligibility, FAQ, general; the tool catalog shown
/// to the backend follows it.
pub fn default_registry(lookup: Arc<dyn EligibilityLookup>, faqs: FaqBook) -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    registry.register_handler(Arc::new(EligibilityHandler::new(lookup)));
    registry.register_handler(Arc::new(FaqHandler::new(faqs)));
    registry.register_handler(fallback_handler());
    registry
}

/// The handler used when the selected tool has no owner.
pub fn fallback_handler() -> Arc<dyn Handler> {
    Arc::new(GeneralHandler)
}
