//! # Safina Core
//!
//! Domain types, traits, and error definitions for the Safina query
//! pipeline. This crate has no framework dependencies: it defines the model
//! that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Every seam is a trait here (`Provider`, `Handler`). Implementations live
//! in their respective crates, which keeps the dependency graph pointing
//! inward and lets tests swap in scripted mocks.

pub mod context;
pub mod error;
pub mod provider;
pub mod response;
pub mod selection;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use context::{Interaction, SessionContext, account_from_arguments};
pub use error::{DataError, Error, ManagerError, ProviderError, Result, ToolError};
pub use provider::{Availability, Provider, ToolSelection};
pub use response::{Response, Status};
pub use tool::{CapabilityRegistry, Handler, ParamSpec, ToolSpec, ValidationLevel};
