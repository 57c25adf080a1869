use crate::di::{ClassMetadata, Container, TypeKey};
use crate::error::Result;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased singleton as stored by the container.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A type the container knows how to construct.
///
/// Implemented by `#[derive(Injectable)]` for providers and by `#[controller]`
/// for controllers. Only types whose `INJECTABLE` marker is `true` may be listed
/// as module providers or used as dependencies.
///
/// # Example
/// ```
/// use nestrs::Injectable;
/// use std::sync::Arc;
///
/// #[derive(Injectable)]
/// pub struct UserRepository {}
///
/// #[derive(Injectable)]
/// pub struct UserService {
///     repository: Arc<UserRepository>,
///     #[inject(default = "Vec::new()")]
///     audit: Vec<String>,
/// }
/// ```
pub trait Component: Sized + Send + Sync + 'static {
    /// The injectable marker.
    const INJECTABLE: bool;

    /// Dependency binding record of this type.
    ///
    /// Hand-written implementations may skip it, in which case the container
    /// sees no declared dependencies.
    fn metadata() -> ClassMetadata {
        ClassMetadata::new(TypeKey::of::<Self>())
    }

    /// Create an instance by resolving dependencies from the container
    ///
    /// # Errors
    /// Returns an error if any required dependency cannot be resolved.
    fn inject(container: &Container) -> Result<Self>;
}

#[derive(Clone)]
enum Factory {
    Construct(fn(&Container) -> Result<Instance>),
    Value(Instance),
}

/// Registration record of a provider: its type, marker, metadata and factory.
#[derive(Clone)]
pub struct ComponentDef {
    key: TypeKey,
    injectable: bool,
    metadata: fn() -> ClassMetadata,
    factory: Factory,
}

impl ComponentDef {
    pub fn of<T: Component>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            injectable: T::INJECTABLE,
            metadata: T::metadata,
            factory: Factory::Construct(construct::<T>),
        }
    }

    /// A provider backed by an already built instance.
    pub fn value<T: Send + Sync + 'static>(instance: T) -> Self {
        Self {
            key: TypeKey::of::<T>(),
            injectable: true,
            metadata: opaque_metadata::<T>,
            factory: Factory::Value(Arc::new(instance)),
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.short_name()
    }

    pub fn is_injectable(&self) -> bool {
        self.injectable
    }

    pub fn is_value(&self) -> bool {
        matches!(self.factory, Factory::Value(_))
    }

    pub fn metadata(&self) -> ClassMetadata {
        (self.metadata)()
    }

    pub(crate) fn prebuilt(&self) -> Option<Instance> {
        match &self.factory {
            Factory::Value(instance) => Some(Arc::clone(instance)),
            Factory::Construct(_) => None,
        }
    }

    pub(crate) fn instantiate(&self, container: &Container) -> Result<Instance> {
        match &self.factory {
            Factory::Construct(construct) => construct(container),
            Factory::Value(instance) => Ok(Arc::clone(instance)),
        }
    }
}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef")
            .field("type", &self.key)
            .field("injectable", &self.injectable)
            .field("value", &self.is_value())
            .finish()
    }
}

fn construct<T: Component>(container: &Container) -> Result<Instance> {
    Ok(Arc::new(T::inject(container)?))
}

fn opaque_metadata<T: 'static>() -> ClassMetadata {
    ClassMetadata::new(TypeKey::of::<T>())
}
