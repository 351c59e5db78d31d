//! The query orchestrator for Safina.
//!
//! Every query makes one linear pass:
//!
//! 1. **Pick a provider** that passes its availability check
//! 2. **Load context** for the session
//! 3. **Select a tool** via the provider, given the full catalog
//! 4. **Execute** the owning handler (or the fallback handler)
//! 5. **Record** the interaction and return the response
//!
//! Failures at any step degrade to a low-confidence response rather than
//! an error.

pub mod orchestrator;

#[cfg(test)]
mod test_helpers;

pub use orchestrator::Orchestrator;
