//! The template content model.
//!
//! `TemplateContentModel` is the handle template processors write into and
//! renderers read from during one render. It wraps a [`ScopeChain`] behind a
//! single lock, so every write and scope change is exclusive, and keeps the
//! rendered JSON of the chain cached until the next mutation.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tessera_carton::CompactString;

use crate::path::KeyPath;
use crate::scope::{Attribute, ScopeChain, ScopeId, ScopeKind};
use crate::value::{map_to_json, FromValue, Value, ValueKind, ValueMap};

/// Reserved attribute name under which the request carrier is stored on the
/// root scope.
pub const HTTP_REQUEST: &str = "HTTP_REQUEST";

/// Reserved attribute name of the response carrier, also on the root scope.
pub const HTTP_RESPONSE: &str = "HTTP_RESPONSE";

/// Attribute names readable from every scope.
const CARRIERS: [&str; 2] = [HTTP_REQUEST, HTTP_RESPONSE];

/// Where a property write lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeLocality {
    /// Root scope, unless a map along the path is already owned by a scope
    /// visible from the current one
    Root,
    /// Closest scope that already owns the path, otherwise the current scope
    #[default]
    Closest,
    /// Current scope only, visible while it stays current
    Isolated,
}

/// Cached JSON rendering of the chain.
#[derive(Debug, Clone, Default)]
enum Rendered {
    #[default]
    Stale,
    Fresh(Arc<str>),
}

#[derive(Debug)]
struct ModelState {
    chain: ScopeChain,
    rendered: Rendered,
}

impl ModelState {
    #[inline]
    fn invalidate(&mut self) {
        self.rendered = Rendered::Stale;
    }

    #[inline]
    fn resolve(&self, path: &KeyPath) -> Option<&Value> {
        self.chain.resolve(self.chain.current_id(), path.segments())
    }
}

/// Scoped key/value model fed to the template renderer.
///
/// All methods take `&self`; chaining methods return `&Self`:
///
/// ```
/// use tessera_croquis::TemplateContentModel;
///
/// let model = TemplateContentModel::default();
/// model.set("page.title", "Home").extend_scope().set("item", 1);
/// assert_eq!(model.get_as_string("page.title"), "Home");
/// model.retract_scope();
/// assert!(!model.has("item"));
/// ```
pub struct TemplateContentModel {
    state: Mutex<ModelState>,
}

impl Default for TemplateContentModel {
    fn default() -> Self {
        Self::new((), ())
    }
}

impl TemplateContentModel {
    /// Create a model for one render with an empty root scope.
    pub fn new<Req, Res>(request: Req, response: Res) -> Self
    where
        Req: Any + Send + Sync,
        Res: Any + Send + Sync,
    {
        Self::with_initial_data(request, response, ValueMap::new())
    }

    /// Create a model whose root scope starts with `data`.
    pub fn with_initial_data<Req, Res>(request: Req, response: Res, data: ValueMap) -> Self
    where
        Req: Any + Send + Sync,
        Res: Any + Send + Sync,
    {
        let mut chain = ScopeChain::with_root_data(data);
        let root = chain.root_scope_mut();
        root.set_attribute(CompactString::new(HTTP_REQUEST), Arc::new(request));
        root.set_attribute(CompactString::new(HTTP_RESPONSE), Arc::new(response));
        Self {
            state: Mutex::new(ModelState {
                chain,
                rendered: Rendered::Stale,
            }),
        }
    }

    // ---- Scope lifecycle ----

    /// Push a child scope that reads through to the current one.
    pub fn extend_scope(&self) -> &Self {
        self.push_scope(ScopeKind::Extended, None)
    }

    /// Push a child scope and merge `data` into it.
    pub fn extend_scope_with(&self, data: ValueMap) -> &Self {
        self.push_scope(ScopeKind::Extended, Some(data))
    }

    /// Push a child scope that does not see any ancestor data.
    pub fn isolate_scope(&self) -> &Self {
        self.push_scope(ScopeKind::Isolated, None)
    }

    fn push_scope(&self, kind: ScopeKind, data: Option<ValueMap>) -> &Self {
        let mut state = self.state.lock();
        let id = state.chain.enter_scope(kind);
        if let Some(data) = data {
            state.chain.merge_into_current(data);
        }
        state.invalidate();
        tracing::debug!(
            scope = id.as_u32(),
            kind = kind.to_display(),
            "entered scope"
        );
        self
    }

    /// Pop the current scope. At root this changes nothing.
    pub fn retract_scope(&self) -> &Self {
        let mut state = self.state.lock();
        let left = state.chain.current_id();
        if state.chain.exit_scope() {
            tracing::debug!(scope = left.as_u32(), "retracted scope");
        } else {
            tracing::trace!("retract at root ignored");
        }
        state.invalidate();
        self
    }

    /// Shallow merge of `data` into the current scope's own container.
    pub fn isolate_to_current_scope(&self, data: ValueMap) -> &Self {
        let mut state = self.state.lock();
        state.chain.merge_into_current(data);
        state.invalidate();
        self
    }

    /// Distance of the current scope from root.
    pub fn scope_depth(&self) -> u32 {
        self.state.lock().chain.depth()
    }

    // ---- Properties ----

    /// Set `path` to `value` on the closest scope owning the path.
    ///
    /// For `lists.GoT.Starks.killed`, the chain is searched for an existing
    /// `lists`, then `lists.GoT`, and so on. Missing intermediates are created
    /// on the scope where the search left off, or on the current scope if no
    /// part of the path exists yet.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> &Self {
        self.set_with(path, value, ScopeLocality::Closest)
    }

    /// Set `path` on the root scope.
    pub fn set_to_root(&self, path: &str, value: impl Into<Value>) -> &Self {
        self.set_with(path, value, ScopeLocality::Root)
    }

    /// Set `path` on the current scope only, hidden from child scopes.
    pub fn set_as_isolated(&self, path: &str, value: impl Into<Value>) -> &Self {
        self.set_with(path, value, ScopeLocality::Isolated)
    }

    pub fn set_with(&self, path: &str, value: impl Into<Value>, locality: ScopeLocality) -> &Self {
        let key_path = KeyPath::parse(path);
        let value = value.into();
        let mut state = self.state.lock();
        match locality {
            ScopeLocality::Root => state.chain.write(ScopeId::ROOT, &key_path, value),
            ScopeLocality::Closest => {
                let current = state.chain.current_id();
                state.chain.write(current, &key_path, value);
            }
            ScopeLocality::Isolated => state.chain.write_isolated(&key_path, value),
        }
        state.invalidate();
        tracing::trace!(path = %key_path, ?locality, "set property");
        self
    }

    /// Resolve `path` from the current scope, reading through ancestors.
    pub fn get(&self, path: &str) -> Option<Value> {
        let key_path = KeyPath::parse(path);
        self.state.lock().resolve(&key_path).cloned()
    }

    /// Whether `path` resolves to a non-null value.
    pub fn has(&self, path: &str) -> bool {
        !path.is_empty() && self.get(path).is_some()
    }

    /// Whether `path` resolves to a value readable as `kind`.
    pub fn is(&self, path: &str, kind: ValueKind) -> bool {
        !path.is_empty()
            && self
                .get(path)
                .is_some_and(|value| kind.accepts(value.kind()))
    }

    /// Typed read. `None` when absent or of another kind.
    pub fn get_as<T: FromValue>(&self, path: &str) -> Option<T> {
        if path.is_empty() {
            return None;
        }
        let value = self.get(path)?;
        if T::KIND.accepts(value.kind()) {
            T::from_value(&value)
        } else {
            None
        }
    }

    /// String form of the value at `path`, or an empty string when absent.
    pub fn get_as_string(&self, path: &str) -> String {
        self.get(path)
            .map(|value| value.to_string())
            .unwrap_or_default()
    }

    // ---- Attributes ----

    /// Set an attribute on the current scope.
    ///
    /// Attributes are excluded from every serialized form of the model and
    /// can only be read back by exact name from the scope that holds them.
    /// They let processors share information without it reaching clients.
    pub fn set_attribute<T: Any + Send + Sync>(&self, name: &str, value: T) -> &Self {
        self.set_attribute_arc(name, Arc::new(value))
    }

    /// Set an already shared attribute on the current scope.
    pub fn set_attribute_arc(&self, name: &str, value: Attribute) -> &Self {
        self.state
            .lock()
            .chain
            .current_scope_mut()
            .set_attribute(CompactString::new(name), value);
        self
    }

    /// Attribute `name` on the current scope.
    ///
    /// [`HTTP_REQUEST`] and [`HTTP_RESPONSE`] fall back to the root scope, so
    /// the carriers are reachable from any depth.
    pub fn get_attribute(&self, name: &str) -> Option<Attribute> {
        let state = self.state.lock();
        let chain = &state.chain;
        chain
            .current_scope()
            .attribute(name)
            .or_else(|| {
                CARRIERS
                    .contains(&name)
                    .then(|| chain.root_scope().attribute(name))
                    .flatten()
            })
            .cloned()
    }

    /// Attribute `name` on the current scope, if it holds a `T`.
    pub fn get_attribute_as<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.get_attribute(name)?.downcast::<T>().ok()
    }

    /// The request this model was created for.
    pub fn request<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.carrier(HTTP_REQUEST)
    }

    /// The response this model was created for.
    pub fn response<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.carrier(HTTP_RESPONSE)
    }

    fn carrier<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let state = self.state.lock();
        let carrier = state.chain.root_scope().attribute(name)?.clone();
        carrier.downcast::<T>().ok()
    }

    // ---- Serialization ----

    /// Flattened projection of every scope visible from the current one.
    pub fn to_json_object(&self) -> serde_json::Map<String, serde_json::Value> {
        let state = self.state.lock();
        map_to_json(&state.chain.flatten())
    }

    /// Only the named top-level keys, resolved through the chain. Keys that
    /// resolve to nothing are omitted.
    pub fn to_json_object_for(&self, keys: &[&str]) -> serde_json::Map<String, serde_json::Value> {
        let state = self.state.lock();
        keys.iter()
            .filter_map(|key| {
                let value = state.resolve(&KeyPath::parse(key))?;
                Some((key.to_string(), value.to_json()))
            })
            .collect()
    }

    /// JSON string of the flattened projection, cached until the next
    /// mutation.
    pub fn to_json_string(&self) -> Arc<str> {
        let mut state = self.state.lock();
        if let Rendered::Fresh(json) = &state.rendered {
            return Arc::clone(json);
        }

        let json: Arc<str> =
            serde_json::Value::Object(map_to_json(&state.chain.flatten())).to_string().into();
        tracing::trace!(bytes = json.len(), "rendered model json");
        state.rendered = Rendered::Fresh(Arc::clone(&json));
        json
    }
}

impl fmt::Display for TemplateContentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_string())
    }
}

impl fmt::Debug for TemplateContentModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateContentModel")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}
