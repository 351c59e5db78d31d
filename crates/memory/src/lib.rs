//! Session context storage for Safina.
//!
//! Each session holds a bounded, ordered window of past interactions. The
//! window slides: once it is full, the oldest interaction is evicted first.

pub mod session;

pub use session::SessionStore;
