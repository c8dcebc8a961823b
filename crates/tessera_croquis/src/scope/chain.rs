//! Scope chain management for the content model.
//!
//! This module provides the core scope management functionality:
//! - `Scope` - A single layer of model data
//! - `ScopeChain` - The stack of scopes, leaf first, with path-addressed
//!   reads and writes

use tessera_carton::{CompactString, FxHashMap};

use super::types::{Attribute, Layer, ScopeId, ScopeKind, Slot};
use crate::path::KeyPath;
use crate::value::{ensure_map, fill_gaps, overlay, remove_path, Value, ValueMap};

/// A single scope in the scope chain
#[derive(Debug)]
pub struct Scope {
    /// Unique identifier
    pub id: ScopeId,
    /// Enclosing scope (`None` for root)
    pub parent: Option<ScopeId>,
    /// Kind of scope
    pub kind: ScopeKind,
    /// Properties inherited by descendant scopes
    data: ValueMap,
    /// Properties from isolated writes
    local: ValueMap,
    /// Unscoped attributes, never serialized
    attributes: FxHashMap<CompactString, Attribute>,
}

impl Scope {
    /// Create a new, empty scope
    #[inline]
    pub fn new(id: ScopeId, parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self::with_data(id, parent, kind, ValueMap::new())
    }

    /// Create a new scope holding `data`
    #[inline]
    pub fn with_data(
        id: ScopeId,
        parent: Option<ScopeId>,
        kind: ScopeKind,
        data: ValueMap,
    ) -> Self {
        Self {
            id,
            parent,
            kind,
            data,
            local: ValueMap::new(),
            attributes: FxHashMap::default(),
        }
    }

    /// Shared properties of this scope only
    #[inline]
    pub fn data(&self) -> &ValueMap {
        &self.data
    }

    /// Isolated properties of this scope only
    #[inline]
    pub fn local(&self) -> &ValueMap {
        &self.local
    }

    #[inline]
    pub fn layer(&self, layer: Layer) -> &ValueMap {
        match layer {
            Layer::Shared => &self.data,
            Layer::Local => &self.local,
        }
    }

    #[inline]
    pub fn layer_mut(&mut self, layer: Layer) -> &mut ValueMap {
        match layer {
            Layer::Shared => &mut self.data,
            Layer::Local => &mut self.local,
        }
    }

    /// Get an attribute by exact name (this scope only)
    #[inline]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    #[inline]
    pub fn set_attribute(&mut self, name: CompactString, value: Attribute) {
        self.attributes.insert(name, value);
    }

    #[inline]
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }
}

/// Manages the scope chain of one content model.
///
/// Scopes form a strict stack: the current scope is always the last one
/// pushed, and exiting it drops it.
#[derive(Debug)]
pub struct ScopeChain {
    /// All live scopes (indexed by ScopeId)
    scopes: Vec<Scope>,
    /// Current scope ID
    current: ScopeId,
}

impl Default for ScopeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeChain {
    /// Create a chain holding only an empty root scope
    #[inline]
    pub fn new() -> Self {
        Self::with_root_data(ValueMap::new())
    }

    /// Create a chain whose root scope starts with `data`
    pub fn with_root_data(data: ValueMap) -> Self {
        Self {
            scopes: vec![Scope::with_data(ScopeId::ROOT, None, ScopeKind::Root, data)],
            current: ScopeId::ROOT,
        }
    }

    /// Get the current scope
    #[inline]
    pub fn current_scope(&self) -> &Scope {
        &self.scopes[self.current.index()]
    }

    /// Get the current scope mutably
    #[inline]
    pub fn current_scope_mut(&mut self) -> &mut Scope {
        let idx = self.current.index();
        &mut self.scopes[idx]
    }

    #[inline]
    pub fn root_scope(&self) -> &Scope {
        &self.scopes[ScopeId::ROOT.index()]
    }

    #[inline]
    pub fn root_scope_mut(&mut self) -> &mut Scope {
        &mut self.scopes[ScopeId::ROOT.index()]
    }

    /// Get a scope by ID
    #[inline]
    pub fn get_scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.index())
    }

    /// Current scope ID
    #[inline]
    pub const fn current_id(&self) -> ScopeId {
        self.current
    }

    /// Number of live scopes, root included
    #[inline]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Check if only the root scope is live
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scopes.len() == 1
    }

    /// Distance of the current scope from root
    #[inline]
    pub fn depth(&self) -> u32 {
        (self.scopes.len() - 1) as u32
    }

    /// Enter a new child scope of the current one
    pub fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        debug_assert!(kind != ScopeKind::Root, "only the chain creates a root");
        let id = ScopeId::new(self.scopes.len() as u32);
        self.scopes.push(Scope::new(id, Some(self.current), kind));
        self.current = id;
        id
    }

    /// Drop the current scope and return to its parent.
    ///
    /// Returns `false` (and changes nothing) at root.
    pub fn exit_scope(&mut self) -> bool {
        let Some(parent) = self.current_scope().parent else {
            return false;
        };
        self.scopes.pop();
        self.current = parent;
        true
    }

    /// Scopes visible from `from`, closest first. Stops after the first
    /// scope that does not read through to its parent.
    #[inline]
    pub fn lineage(&self, from: ScopeId) -> Lineage<'_> {
        Lineage {
            chain: self,
            next: Some(from),
        }
    }

    /// Layers of `id` that lookups may see. The local layer belongs to the
    /// current scope only.
    #[inline]
    fn visible_layers(&self, id: ScopeId) -> &'static [Layer] {
        if id == self.current {
            &[Layer::Local, Layer::Shared]
        } else {
            &[Layer::Shared]
        }
    }

    /// Find the closest container that resolves `segments` to a non-null
    /// value, starting at `from` and walking toward root.
    pub fn locate<S: AsRef<str>>(&self, from: ScopeId, segments: &[S]) -> Option<(Slot, &Value)> {
        self.locate_in(from, segments, true)
    }

    /// Like [`locate`](Self::locate), optionally skipping local layers.
    fn locate_in<S: AsRef<str>>(
        &self,
        from: ScopeId,
        segments: &[S],
        with_local: bool,
    ) -> Option<(Slot, &Value)> {
        let (first, rest) = segments.split_first()?;

        for scope in self.lineage(from) {
            for &layer in self.visible_layers(scope.id) {
                if layer == Layer::Local && !with_local {
                    continue;
                }
                let found = scope
                    .layer(layer)
                    .get(first.as_ref())
                    .and_then(|value| value.lookup(rest))
                    .filter(|value| !value.is_null());
                if let Some(value) = found {
                    return Some((
                        Slot {
                            scope: scope.id,
                            layer,
                        },
                        value,
                    ));
                }
            }
        }

        None
    }

    /// Resolve `segments` from `from`, reading through ancestors
    #[inline]
    pub fn resolve<S: AsRef<str>>(&self, from: ScopeId, segments: &[S]) -> Option<&Value> {
        self.locate(from, segments).map(|(_, value)| value)
    }

    /// Container at `trail` inside `slot`, creating maps along the way.
    fn container_mut(&mut self, slot: Slot, trail: &[CompactString]) -> &mut ValueMap {
        let mut container = self.scopes[slot.scope.index()].layer_mut(slot.layer);
        for key in trail {
            container = ensure_map(container, key);
        }
        container
    }

    /// Write `value` at `path` into a shared layer.
    ///
    /// Each ancestor segment is resolved through the chain from the current
    /// scope, local layers excluded. An existing map is reused where it lives,
    /// even in an ancestor scope. A missing key, or a key holding anything
    /// other than a map, gets a fresh map in the container currently being
    /// walked, which starts as `target`. Whatever the current scope's local
    /// layer holds along `path` is dropped so the write is what reads see.
    pub fn write(&mut self, target: ScopeId, path: &KeyPath, value: Value) {
        let ancestors = path.ancestors();
        let mut slot = Slot::shared(target);
        let mut trail: Vec<CompactString> = Vec::with_capacity(ancestors.len());

        for depth in 1..=ancestors.len() {
            let sub_path = &ancestors[..depth];
            let owner = match self.locate_in(self.current, sub_path, false) {
                Some((owner, Value::Map(_))) => Some(owner),
                _ => None,
            };

            match owner {
                Some(owner) => {
                    slot = owner;
                    trail.clear();
                    trail.extend_from_slice(sub_path);
                }
                None => {
                    let key = &sub_path[depth - 1];
                    self.container_mut(slot, &trail)
                        .insert(key.clone(), Value::empty_map());
                    trail.push(key.clone());
                }
            }
        }

        self.container_mut(slot, &trail)
            .insert(path.target_key().clone(), value);
        remove_path(
            self.current_scope_mut().layer_mut(Layer::Local),
            path.segments(),
        );
    }

    /// Write `value` at `path` into the current scope's local layer, with
    /// no owner search.
    pub fn write_isolated(&mut self, path: &KeyPath, value: Value) {
        let mut key = path.target_key().clone();
        let mut skeleton = value;
        for ancestor in path.ancestors().iter().rev() {
            let mut wrapper = ValueMap::new();
            wrapper.insert(key, skeleton);
            skeleton = Value::Map(wrapper);
            key = ancestor.clone();
        }

        let mut isolated = ValueMap::new();
        isolated.insert(key, skeleton);
        overlay(self.current_scope_mut().layer_mut(Layer::Local), isolated);
    }

    /// Shallow merge of `data` into the current scope's shared layer only.
    /// Top-level keys in `data` replace existing ones.
    #[inline]
    pub fn merge_into_current(&mut self, data: ValueMap) {
        self.current_scope_mut().layer_mut(Layer::Shared).extend(data);
    }

    /// Flattened view of everything visible from the current scope.
    /// Closer scopes win on conflicting keys; maps merge.
    pub fn flatten(&self) -> ValueMap {
        let current = self.current_scope();
        let mut flat = current.local.clone();
        fill_gaps(&mut flat, &current.data);
        for scope in self.lineage(self.current).skip(1) {
            fill_gaps(&mut flat, &scope.data);
        }
        flat
    }
}

/// Iterator over the scopes visible from a starting scope.
#[derive(Debug, Clone)]
pub struct Lineage<'a> {
    chain: &'a ScopeChain,
    next: Option<ScopeId>,
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a Scope;

    fn next(&mut self) -> Option<Self::Item> {
        let scope = self.chain.get_scope(self.next?)?;
        self.next = if scope.kind.reads_through() {
            scope.parent
        } else {
            None
        };
        Some(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> KeyPath {
        KeyPath::parse(p)
    }

    #[test]
    fn test_scope_chain_basic() {
        let mut chain = ScopeChain::new();
        chain.write(ScopeId::ROOT, &path("foo"), Value::from(1));

        assert!(chain.resolve(chain.current_id(), &["foo"]).is_some());
        assert!(chain.resolve(chain.current_id(), &["bar"]).is_none());

        let child = chain.enter_scope(ScopeKind::Extended);
        chain.write(child, &path("bar"), Value::from(2));

        // Can see both foo and bar
        assert!(chain.resolve(child, &["foo"]).is_some());
        assert!(chain.resolve(child, &["bar"]).is_some());

        assert!(chain.exit_scope());

        // Can only see foo now
        assert!(chain.resolve(chain.current_id(), &["foo"]).is_some());
        assert!(chain.resolve(chain.current_id(), &["bar"]).is_none());
    }

    #[test]
    fn test_scope_shadowing() {
        let mut chain = ScopeChain::new();
        chain.write(ScopeId::ROOT, &path("x"), Value::from("outer"));
        let child = chain.enter_scope(ScopeKind::Extended);
        chain.current_scope_mut()
            .layer_mut(Layer::Shared)
            .insert("x".into(), Value::from("inner"));

        let (slot, value) = chain.locate(child, &["x"]).unwrap();
        assert_eq!(slot, Slot::shared(child));
        assert_eq!(value, &Value::from("inner"));
    }

    #[test]
    fn test_exit_root_is_noop() {
        let mut chain = ScopeChain::new();
        assert!(!chain.exit_scope());
        assert_eq!(chain.current_id(), ScopeId::ROOT);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_exit_releases_scope() {
        let mut chain = ScopeChain::new();
        chain.enter_scope(ScopeKind::Extended);
        chain.enter_scope(ScopeKind::Extended);
        assert_eq!(chain.depth(), 2);
        chain.exit_scope();
        assert_eq!(chain.depth(), 1);
        assert_eq!(chain.len(), 2);
        assert!(chain.get_scope(ScopeId::new(2)).is_none());
    }

    #[test]
    fn test_lineage_stops_at_isolated() {
        let mut chain = ScopeChain::new();
        chain.enter_scope(ScopeKind::Extended);
        let isolated = chain.enter_scope(ScopeKind::Isolated);
        let leaf = chain.enter_scope(ScopeKind::Extended);

        let ids: Vec<ScopeId> = chain.lineage(leaf).map(|s| s.id).collect();
        assert_eq!(ids, vec![leaf, isolated]);
    }

    #[test]
    fn test_write_reuses_ancestor_map() {
        let mut chain = ScopeChain::new();
        chain.write(ScopeId::ROOT, &path("lists.GoT"), Value::empty_map());
        let child = chain.enter_scope(ScopeKind::Extended);

        chain.write(child, &path("lists.GoT.Starks"), Value::from("Eddard"));

        assert!(chain.current_scope().data().is_empty());
        assert_eq!(
            chain.root_scope().data().get("lists").and_then(|v| v.lookup(&["GoT", "Starks"])),
            Some(&Value::from("Eddard"))
        );
    }

    #[test]
    fn test_write_creates_in_target_when_unowned() {
        let mut chain = ScopeChain::new();
        let child = chain.enter_scope(ScopeKind::Extended);
        chain.write(child, &path("a.b"), Value::from(1));

        assert!(chain.root_scope().data().is_empty());
        assert_eq!(
            chain.current_scope().data().get("a").and_then(|v| v.lookup(&["b"])),
            Some(&Value::from(1))
        );
    }

    #[test]
    fn test_write_replaces_ancestor_scalar_locally() {
        let mut chain = ScopeChain::new();
        chain.write(ScopeId::ROOT, &path("a"), Value::from(5));
        let child = chain.enter_scope(ScopeKind::Extended);
        chain.write(child, &path("a.b"), Value::from("x"));

        // Root keeps its scalar, the child shadows it with a map
        assert_eq!(chain.root_scope().data().get("a"), Some(&Value::from(5)));
        assert_eq!(
            chain.resolve(child, &["a", "b"]),
            Some(&Value::from("x"))
        );
    }

    #[test]
    fn test_local_layer_only_visible_while_current() {
        let mut chain = ScopeChain::new();
        chain.write_isolated(&path("x.y"), Value::from(1));
        assert_eq!(
            chain.resolve(ScopeId::ROOT, &["x", "y"]),
            Some(&Value::from(1))
        );

        let child = chain.enter_scope(ScopeKind::Extended);
        assert!(chain.resolve(child, &["x", "y"]).is_none());

        chain.exit_scope();
        assert_eq!(
            chain.resolve(ScopeId::ROOT, &["x", "y"]),
            Some(&Value::from(1))
        );
    }

    #[test]
    fn test_shared_write_replaces_local_value() {
        let mut chain = ScopeChain::new();
        chain.write_isolated(&path("title"), Value::from("a"));
        chain.write(ScopeId::ROOT, &path("title"), Value::from("b"));

        assert!(chain.current_scope().local().is_empty());
        assert_eq!(chain.resolve(ScopeId::ROOT, &["title"]), Some(&Value::from("b")));
    }

    #[test]
    fn test_local_map_does_not_own_shared_writes() {
        let mut chain = ScopeChain::new();
        chain.write_isolated(&path("x.y"), Value::from(1));
        chain.write(ScopeId::ROOT, &path("x.z"), Value::from(2));

        assert_eq!(
            chain.root_scope().data().get("x").and_then(|v| v.lookup(&["z"])),
            Some(&Value::from(2))
        );
        let child = chain.enter_scope(ScopeKind::Extended);
        assert_eq!(chain.resolve(child, &["x", "z"]), Some(&Value::from(2)));
        assert!(chain.resolve(child, &["x", "y"]).is_none());
    }

    #[test]
    fn test_root_target_reuses_owner_seen_from_current() {
        let mut chain = ScopeChain::new();
        let child = chain.enter_scope(ScopeKind::Extended);
        chain.write(child, &path("page.title"), Value::from("Child"));
        chain.write(ScopeId::ROOT, &path("page.lang"), Value::from("en"));

        assert!(chain.root_scope().data().is_empty());
        assert_eq!(
            chain.current_scope().data().get("page").and_then(|v| v.lookup(&["lang"])),
            Some(&Value::from("en"))
        );

        // Unowned paths still land in the target
        chain.write(ScopeId::ROOT, &path("site.name"), Value::from("Tessera"));
        assert!(chain.root_scope().data().contains_key("site"));
    }

    #[test]
    fn test_null_is_unresolved() {
        let mut chain = ScopeChain::new();
        chain.write(ScopeId::ROOT, &path("a"), Value::from("root"));
        let child = chain.enter_scope(ScopeKind::Extended);
        chain.write(child, &path("a"), Value::Null);
        assert_eq!(chain.resolve(child, &["a"]), Some(&Value::from("root")));
    }

    #[test]
    fn test_merge_replaces_top_level_keys() {
        let mut chain = ScopeChain::new();
        chain.write(ScopeId::ROOT, &path("page.title"), Value::from("Home"));
        chain.write(ScopeId::ROOT, &path("page.lang"), Value::from("en"));

        let page: ValueMap = [(CompactString::from("title"), Value::from("About"))]
            .into_iter()
            .collect();
        chain.merge_into_current(
            [(CompactString::from("page"), Value::Map(page))]
                .into_iter()
                .collect(),
        );

        assert_eq!(
            chain.resolve(ScopeId::ROOT, &["page", "title"]),
            Some(&Value::from("About"))
        );
        assert!(chain.resolve(ScopeId::ROOT, &["page", "lang"]).is_none());
    }

    #[test]
    fn test_flatten_closer_wins() {
        let mut chain = ScopeChain::new();
        chain.write(ScopeId::ROOT, &path("title"), Value::from("root"));
        chain.write(ScopeId::ROOT, &path("page.lang"), Value::from("en"));
        let child = chain.enter_scope(ScopeKind::Extended);
        chain.merge_into_current(
            [
                ("title".into(), Value::from("child")),
                (
                    "page".into(),
                    Value::Map([("slug".into(), Value::from("home"))].into_iter().collect()),
                ),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(chain.current_id(), child);

        let flat = Value::Map(chain.flatten());
        assert_eq!(
            flat.to_string(),
            r#"{"page":{"lang":"en","slug":"home"},"title":"child"}"#
        );
    }
}
