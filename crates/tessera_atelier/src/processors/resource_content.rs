//! Copies the properties of the rendered resource into the content model.
//!
//! The resulting map is written under the configured content key:
//!
//! | resource state    | content map                                           |
//! |-------------------|-------------------------------------------------------|
//! | no resource       | `xk_contentId: "_NONE"`                               |
//! | resource, no node | `path`                                                |
//! | resource and node | content id, non-reserved properties, `id`, `jcr:uuid`, `path`, `name` |

use tessera_carton::{content_hash, CompactString};
use tessera_croquis::{TemplateContentModel, Value, ValueMap};

use crate::config::ProcessorConfig;
use crate::context::{ContentResource, ExecutionContext};
use crate::errors::{ExtractError, ProcessError, ProcessResult};
use crate::processor::{ContextProcessor, HIGHEST_PRIORITY};

/// Category of components that render repository content.
pub const CONTENT_CATEGORY: &str = "content";

/// Content id of the rendered component
pub const CONTENT_ID: &str = "xk_contentId";
/// Content id used when there is no resource
pub const NO_CONTENT_ID: &str = "_NONE";
pub const ID: &str = "id";
pub const NODE_UUID: &str = "jcr:uuid";
pub const PATH: &str = "path";
pub const NAME: &str = "name";

/// Adds every non-reserved property of the current resource's node to the
/// model. Runs before all other processors.
#[derive(Debug, Clone, Default)]
pub struct AddAllResourceContentProperties {
    config: ProcessorConfig,
}

impl AddAllResourceContentProperties {
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Build the content map for `resource`.
    pub fn collect(
        &self,
        resource: Option<&dyn ContentResource>,
    ) -> Result<ValueMap, ExtractError> {
        let mut content = ValueMap::new();

        let Some(resource) = resource else {
            insert(&mut content, CONTENT_ID, NO_CONTENT_ID);
            return Ok(content);
        };

        let path = resource.path();
        match resource.node() {
            Some(node) => {
                let content_id = content_hash(path);
                insert(&mut content, CONTENT_ID, content_id.as_str());

                let mut skipped = 0usize;
                for (name, value) in node.properties()? {
                    if self.config.is_reserved(&name) {
                        skipped += 1;
                        continue;
                    }
                    content.insert(name, value);
                }
                tracing::trace!(path, skipped, "filtered reserved properties");

                insert(&mut content, ID, content_id);
                insert(&mut content, NODE_UUID, node.identifier());
                insert(&mut content, NAME, node.name());
            }
            None => {
                tracing::debug!(path, "resource has no node, content cleared");
            }
        }
        insert(&mut content, PATH, path);

        Ok(content)
    }
}

#[inline]
fn insert(content: &mut ValueMap, key: &str, value: impl Into<Value>) {
    content.insert(CompactString::new(key), value.into());
}

impl ContextProcessor for AddAllResourceContentProperties {
    fn name(&self) -> &'static str {
        "add-all-resource-content-properties"
    }

    fn any_of(&self) -> &[&'static str] {
        &[CONTENT_CATEGORY]
    }

    fn priority(&self) -> i32 {
        HIGHEST_PRIORITY
    }

    fn process(&self, ctx: &ExecutionContext, model: &TemplateContentModel) -> ProcessResult<()> {
        let resource = ctx.resource();
        let content = self.collect(resource.as_deref()).map_err(|source| {
            let path = resource
                .as_ref()
                .map(|r| r.path().to_string())
                .unwrap_or_default();
            tracing::error!(
                processor = self.name(),
                path = %path,
                error = %source,
                "failed to collect resource content"
            );
            ProcessError::new(self.name(), path, source)
        })?;

        model.set(&self.config.resource_content_key, content);
        Ok(())
    }
}
