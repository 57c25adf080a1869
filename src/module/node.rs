use crate::controller::ControllerDef;
use crate::di::{ComponentDef, TypeKey};
use std::collections::HashMap;
use uuid::Uuid;

/// Runtime node of the module graph.
///
/// Created once per distinct token; providers and controllers are kept in
/// declaration order, keyed by type. Names are for display only.
#[derive(Clone, Debug)]
pub struct ModuleNode {
    id: Uuid,
    token: String,
    metatype: TypeKey,
    imports: Vec<String>,
    providers: Vec<ComponentDef>,
    controllers: Vec<ControllerDef>,
    exports: Vec<TypeKey>,
    is_global: bool,
    distance: usize,
}

impl ModuleNode {
    pub fn new(metatype: TypeKey, token: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            token: token.into(),
            metatype,
            imports: Vec::new(),
            providers: Vec::new(),
            controllers: Vec::new(),
            exports: Vec::new(),
            is_global: false,
            distance: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn metatype(&self) -> TypeKey {
        self.metatype
    }

    pub fn name(&self) -> &'static str {
        self.metatype.short_name()
    }

    /// Tokens of the imported modules.
    pub fn imports(&self) -> &[String] {
        &self.imports
    }

    pub fn providers(&self) -> impl Iterator<Item = (&str, &ComponentDef)> {
        self.providers.iter().map(|def| (def.name(), def))
    }

    pub fn controllers(&self) -> impl Iterator<Item = (&str, &ControllerDef)> {
        self.controllers.iter().map(|def| (def.name(), def))
    }

    pub fn exports(&self) -> &[TypeKey] {
        &self.exports
    }

    pub fn is_global(&self) -> bool {
        self.is_global
    }

    pub fn distance(&self) -> usize {
        self.distance
    }

    pub fn has_provider(&self, key: TypeKey) -> bool {
        self.providers.iter().any(|def| def.key() == key)
    }

    pub fn has_controller(&self, key: TypeKey) -> bool {
        self.controllers.iter().any(|def| def.key() == key)
    }

    pub fn add_import(&mut self, token: impl Into<String>) {
        let token = token.into();
        if !self.imports.contains(&token) {
            self.imports.push(token);
        }
    }

    pub fn add_provider(&mut self, provider: ComponentDef) -> String {
        let name = provider.name().to_string();
        upsert(&mut self.providers, provider, ComponentDef::key);
        name
    }

    pub fn add_controller(&mut self, controller: ControllerDef) -> String {
        let name = controller.name().to_string();
        upsert(&mut self.controllers, controller, ControllerDef::key);
        name
    }

    pub(crate) fn set_exports(&mut self, exports: Vec<TypeKey>) {
        self.exports = exports;
    }

    pub(crate) fn set_global(&mut self, is_global: bool) {
        self.is_global = is_global;
    }

    pub(crate) fn set_distance(&mut self, distance: usize) {
        self.distance = distance;
    }
}

fn upsert<T>(entries: &mut Vec<T>, value: T, key: fn(&T) -> TypeKey) {
    let id = key(&value);
    match entries.iter_mut().find(|existing| key(existing) == id) {
        Some(entry) => *entry = value,
        None => entries.push(value),
    }
}

/// Token-keyed registry of module nodes, iterated in registration order.
pub struct ModulesContainer {
    application_id: String,
    modules: Vec<ModuleNode>,
    index: HashMap<String, usize>,
}

impl ModulesContainer {
    pub fn new() -> Self {
        Self {
            application_id: Uuid::new_v4().simple().to_string(),
            modules: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn has(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    pub fn get(&self, token: &str) -> Option<&ModuleNode> {
        self.index.get(token).map(|&idx| &self.modules[idx])
    }

    pub fn get_mut(&mut self, token: &str) -> Option<&mut ModuleNode> {
        self.index.get(token).map(|&idx| &mut self.modules[idx])
    }

    pub fn get_by_id(&self, id: Uuid) -> Option<&ModuleNode> {
        self.modules.iter().find(|module| module.id() == id)
    }

    /// Insert a node; an already registered token keeps its existing node.
    pub fn insert(&mut self, node: ModuleNode) -> &ModuleNode {
        let idx = match self.index.get(node.token()) {
            Some(&idx) => idx,
            None => {
                self.index.insert(node.token().to_string(), self.modules.len());
                self.modules.push(node);
                self.modules.len() - 1
            }
        };
        &self.modules[idx]
    }

    pub fn values(&self) -> impl Iterator<Item = &ModuleNode> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn clear(&mut self) {
        self.modules.clear();
        self.index.clear();
    }
}

impl Default for ModulesContainer {
    fn default() -> Self {
        Self::new()
    }
}
