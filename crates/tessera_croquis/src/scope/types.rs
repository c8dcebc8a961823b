//! Type definitions for the scope chain.
//!
//! - `ScopeId` - Position of a scope in the chain
//! - `ScopeKind` - How a scope relates to its parent
//! - `Layer` / `Slot` - Addressing of a scope's containers
//! - `Attribute` - Opaque values on the unscoped attribute channel

use std::any::Any;
use std::sync::Arc;

/// Opaque attribute value. Attributes carry anything processors need to hand
/// to each other (requests, service handles, flags) and are never serialized.
pub type Attribute = Arc<dyn Any + Send + Sync>;

/// Unique identifier for a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ScopeId(u32);

impl ScopeId {
    /// The root scope
    pub const ROOT: Self = Self(0);

    /// Create a new scope ID
    #[inline(always)]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    #[inline(always)]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScopeKind {
    /// Terminal ancestor, created with the model
    Root = 0,
    /// Child scope that reads through to its parent
    Extended = 1,
    /// Child scope that does not see its ancestors
    Isolated = 2,
}

impl ScopeKind {
    /// Whether lookups continue into the parent scope.
    #[inline]
    pub const fn reads_through(self) -> bool {
        matches!(self, ScopeKind::Extended)
    }

    pub fn to_display(self) -> &'static str {
        match self {
            ScopeKind::Root => "root",
            ScopeKind::Extended => "extended",
            ScopeKind::Isolated => "isolated",
        }
    }
}

/// One of the two property containers held by a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// Inherited by descendant scopes
    Shared,
    /// Written by isolated writes; only visible while the scope is active
    Local,
}

/// Address of a container: a scope plus one of its layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub scope: ScopeId,
    pub layer: Layer,
}

impl Slot {
    #[inline]
    pub const fn shared(scope: ScopeId) -> Self {
        Self {
            scope,
            layer: Layer::Shared,
        }
    }

    #[inline]
    pub const fn local(scope: ScopeId) -> Self {
        Self {
            scope,
            layer: Layer::Local,
        }
    }
}
