use crate::di::Component;
use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Runtime identity of a Rust type, the unit the container binds and caches by.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, e.g. `app::user::UserService`.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path; generic arguments are kept as-is.
    pub fn short_name(&self) -> &'static str {
        let base_end = self.name.find('<').unwrap_or(self.name.len());
        let start = self.name[..base_end]
            .rfind("::")
            .map(|idx| idx + 2)
            .unwrap_or(0);
        &self.name[start..]
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A constructor parameter resolved from the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub name: &'static str,
    pub key: TypeKey,
    /// Whether the dependency type carries the injectable marker.
    pub injectable: bool,
}

/// What a component needs from the container versus what it initializes itself.
///
/// Generated by `#[derive(Injectable)]` and `#[controller]`: every `Arc<T>` field
/// becomes a [`Dependency`], every other field an instance variable together
/// with the source text of its initializer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMetadata {
    key: TypeKey,
    dependencies: Vec<Dependency>,
    instance_vars: BTreeMap<&'static str, &'static str>,
}

impl ClassMetadata {
    pub fn new(key: TypeKey) -> Self {
        Self {
            key,
            dependencies: Vec::new(),
            instance_vars: BTreeMap::new(),
        }
    }

    /// Record a dependency on `T`, reading its injectable marker.
    pub fn dependency<T: Component>(self, name: &'static str) -> Self {
        self.dependency_on(name, TypeKey::of::<T>(), T::INJECTABLE)
    }

    pub fn dependency_on(mut self, name: &'static str, key: TypeKey, injectable: bool) -> Self {
        self.instance_vars.remove(name);
        self.dependencies.retain(|dep| dep.name != name);
        self.dependencies.push(Dependency {
            name,
            key,
            injectable,
        });
        self
    }

    /// Record a field the component initializes on its own.
    ///
    /// Names already recorded as dependencies are ignored.
    pub fn instance_var(mut self, name: &'static str, initializer: &'static str) -> Self {
        if !self.is_dependency(name) {
            self.instance_vars.insert(name, initializer);
        }
        self
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// `{field name → dependency type}`.
    pub fn dependency_map(&self) -> BTreeMap<&'static str, TypeKey> {
        self.dependencies
            .iter()
            .map(|dep| (dep.name, dep.key))
            .collect()
    }

    pub fn instance_vars(&self) -> &BTreeMap<&'static str, &'static str> {
        &self.instance_vars
    }

    pub fn is_dependency(&self, name: &str) -> bool {
        self.dependencies.iter().any(|dep| dep.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty() && self.instance_vars.is_empty()
    }
}
