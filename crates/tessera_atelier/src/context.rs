//! Execution context handed to context processors.
//!
//! The context is the processors' view of the render: which content resource
//! is being rendered, which component categories apply, and any other values
//! the rendering pipeline chose to expose by name.

use std::any::Any;
use std::sync::Arc;

use tessera_carton::{CompactString, FxHashMap, FxHashSet};
use tessera_croquis::ValueMap;

use crate::errors::ExtractError;

/// Well-known context key of the resource being rendered.
pub const CONTENT_RESOURCE: &str = "tessera.contentResource";

/// A renderable content resource.
pub trait ContentResource: Send + Sync {
    /// Repository path of the resource
    fn path(&self) -> &str;

    /// Backing node, `None` when the resource does not exist in the repository
    fn node(&self) -> Option<&dyn ContentNode>;
}

/// A repository node attached to a resource.
pub trait ContentNode: Send + Sync {
    fn name(&self) -> &str;

    /// Stable repository identifier of the node
    fn identifier(&self) -> &str;

    /// All attached properties, already converted to renderable values.
    fn properties(&self) -> Result<ValueMap, ExtractError>;
}

/// Named values and categories visible to processors during one render.
#[derive(Default)]
pub struct ExecutionContext {
    values: FxHashMap<CompactString, Arc<dyn Any + Send + Sync>>,
    categories: FxHashSet<CompactString>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add component categories of the render.
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.categories
            .extend(categories.into_iter().map(|c| CompactString::new(c.as_ref())));
        self
    }

    #[inline]
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains(category)
    }

    pub fn insert<T: Any + Send + Sync>(&mut self, name: &str, value: T) {
        self.values.insert(CompactString::new(name), Arc::new(value));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.values.get(name)
    }

    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.values.get(name)?.downcast_ref::<T>()
    }

    /// Expose `resource` under [`CONTENT_RESOURCE`].
    pub fn set_resource(&mut self, resource: Arc<dyn ContentResource>) {
        self.insert(CONTENT_RESOURCE, resource);
    }

    /// The resource being rendered, if any.
    pub fn resource(&self) -> Option<Arc<dyn ContentResource>> {
        self.get_as::<Arc<dyn ContentResource>>(CONTENT_RESOURCE)
            .cloned()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.values.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("ExecutionContext")
            .field("values", &names)
            .field("categories", &self.categories)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Page;

    impl ContentResource for Page {
        fn path(&self) -> &str {
            "/sites/home"
        }

        fn node(&self) -> Option<&dyn ContentNode> {
            None
        }
    }

    #[test]
    fn test_typed_values() {
        let mut ctx = ExecutionContext::new();
        ctx.insert("locale", "en".to_string());
        assert_eq!(ctx.get_as::<String>("locale").map(String::as_str), Some("en"));
        assert!(ctx.get_as::<u32>("locale").is_none());
        assert!(ctx.get("missing").is_none());
    }

    #[test]
    fn test_resource_roundtrip() {
        let mut ctx = ExecutionContext::new();
        assert!(ctx.resource().is_none());
        ctx.set_resource(Arc::new(Page));
        assert_eq!(ctx.resource().map(|r| r.path().to_string()), Some("/sites/home".into()));
    }

    #[test]
    fn test_categories() {
        let ctx = ExecutionContext::new().with_categories(["content", "teaser"]);
        assert!(ctx.has_category("content"));
        assert!(!ctx.has_category("layout"));
    }
}
