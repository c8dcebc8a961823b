//! Built-in context processors.

mod resource_content;

pub use resource_content::{
    AddAllResourceContentProperties, CONTENT_CATEGORY, CONTENT_ID, ID, NAME, NODE_UUID,
    NO_CONTENT_ID, PATH,
};
