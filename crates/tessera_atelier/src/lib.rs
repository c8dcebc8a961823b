//! # tessera_atelier
//!
//! Atelier - Context processors that populate Tessera content models.
//!
//! ## Name Origin
//!
//! An **atelier** is the workshop where the sketches get worked into finished
//! pieces. Here, context processors take the render's execution context and
//! fill the `TemplateContentModel` sketched by `tessera_croquis`.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use tessera_atelier::{
//!     AddAllResourceContentProperties, ContentNode, ContentResource, ExecutionContext,
//!     ProcessorChain, ProcessorConfig,
//! };
//! use tessera_croquis::TemplateContentModel;
//!
//! struct Missing;
//!
//! impl ContentResource for Missing {
//!     fn path(&self) -> &str {
//!         "/sites/home/gone"
//!     }
//!
//!     fn node(&self) -> Option<&dyn ContentNode> {
//!         None
//!     }
//! }
//!
//! let mut chain = ProcessorChain::new();
//! chain.register(AddAllResourceContentProperties::new(ProcessorConfig::default()));
//!
//! let mut ctx = ExecutionContext::new().with_categories(["content"]);
//! ctx.set_resource(Arc::new(Missing));
//!
//! let model = TemplateContentModel::default();
//! chain.run(&ctx, &model).unwrap();
//! assert_eq!(model.get_as_string("content.path"), "/sites/home/gone");
//! ```

pub mod config;
pub mod context;
pub mod errors;
pub mod processor;
pub mod processors;

pub use config::{load_config, ProcessorConfig, CONFIG_FILE_NAME};
pub use context::{ContentNode, ContentResource, ExecutionContext, CONTENT_RESOURCE};
pub use errors::{ExtractError, ProcessError, ProcessResult};
pub use processor::{ContextProcessor, ProcessorChain, DEFAULT_PRIORITY, HIGHEST_PRIORITY};
pub use processors::AddAllResourceContentProperties;
