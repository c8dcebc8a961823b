//! Scope management for the content model.
//!
//! Provides a stack of scopes that layers model data for nested template
//! sections. Each scope keeps:
//!
//! - a shared container, read through by descendant scopes
//! - a local container for isolated writes, visible only while the scope is
//!   current
//! - an attribute container that is never serialized and never inherited
//!
//! ## Module Structure
//!
//! - [`types`] - Type definitions (ScopeId, ScopeKind, Layer, Slot, Attribute)
//! - [`chain`] - Scope and ScopeChain implementations

mod chain;
mod types;

// Re-export all public types
pub use chain::{Lineage, Scope, ScopeChain};
pub use types::{Attribute, Layer, ScopeId, ScopeKind, Slot};
