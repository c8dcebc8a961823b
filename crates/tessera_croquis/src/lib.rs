//! # tessera_croquis
//!
//! Croquis - The scoped content model for Tessera.
//!
//! ## Name Origin
//!
//! A **croquis** is a quick sketch that captures the essential shape of a
//! subject. Each render sketches its page into a `TemplateContentModel`: a
//! layered set of key/value scopes that the template renderer later reads
//! from.
//!
//! ## Purpose
//!
//! - **Scopes**: push and pop data layers for nested template sections
//! - **Path writes**: `a.b.c` style writes that reuse the closest existing owner
//! - **Attributes**: an out-of-band channel that is never serialized
//! - **Projection**: a flattened, cached JSON view of the whole chain
//!
//! ## Architecture
//!
//! ```text
//!   path (KeyPath)
//!        ↓
//!   scope (ScopeChain)
//!        ↓
//!   model (TemplateContentModel)  ← properties, attributes, JSON cache
//! ```

// Core modules
mod error;
pub mod model;
pub mod path;
mod scope;
pub mod value;

// Re-export core types
pub use error::{ValueError, ValueResult};
pub use model::{ScopeLocality, TemplateContentModel, HTTP_REQUEST, HTTP_RESPONSE};
pub use path::KeyPath;
pub use scope::*;
pub use value::{FromValue, Value, ValueKind, ValueMap};
