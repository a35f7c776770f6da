//! The dependency container.
//!
//! The container constructs types by walking an explicit factory graph:
//! a type eligible for implicit self-binding implements [`Construct`] and
//! pulls its own dependencies from the container, the way a constructor
//! would declare them. Bindings override that default and come in two
//! kinds, direct-type and factory, each either shared (singleton) or not.
//!
//! Resolution is synchronous and re-entrant: a `construct` body calls
//! back into the container for each dependency. A visited-set guards
//! against circular constructor graphs, which fail with
//! [`ResolveError::CyclicDependency`] instead of recursing forever.
//!
//! The binding table and singleton cache are lock-protected so a single
//! process-wide container is sound, but the intended deployment is one
//! container per request worker with at most one in-flight dispatch.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ResolveError;
use crate::params::ParamBag;

/// A type-erased resolved instance.
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

/// A type-erased producer: builds one instance from the container and an
/// explicit parameter bag.
pub type AnyProducer =
    Arc<dyn Fn(&Container, &ParamBag) -> Result<AnyInstance, ResolveError> + Send + Sync>;

/// Types the container can build without an explicit binding.
///
/// `construct` plays the role of the constructor: non-primitive
/// dependencies are pulled with [`Container::resolve`], primitive ones
/// from the explicit parameter bag (use [`ParamBag::get_or`] for
/// parameters with declared defaults, and fail with
/// [`ResolveError::UnresolvableDependency`] when a required primitive is
/// absent).
pub trait Construct: Sized + Send + Sync + 'static {
    /// Build an instance.
    fn construct(container: &Container, params: &ParamBag) -> Result<Self, ResolveError>;
}

struct Binding {
    producer: AnyProducer,
    shared: bool,
    instance: Option<AnyInstance>,
}

/// The dependency resolver.
#[derive(Default)]
pub struct Container {
    bindings: RwLock<HashMap<TypeId, Binding>>,
}

thread_local! {
    // In-progress resolutions on this thread, outermost first.
    static RESOLUTION_STACK: RefCell<Vec<(TypeId, &'static str)>> = const { RefCell::new(Vec::new()) };
}

struct CycleGuard;

impl CycleGuard {
    fn enter(key: TypeId, name: &'static str) -> Result<Self, ResolveError> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|(k, _)| *k == key) {
                let chain = stack
                    .iter()
                    .map(|(_, n)| *n)
                    .chain(std::iter::once(name))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(ResolveError::CyclicDependency { chain });
            }
            stack.push((key, name));
            Ok(Self)
        })
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

impl Container {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a direct-type binding for `T` (non-shared).
    ///
    /// Overwrites any prior binding for `T` silently, discarding a cached
    /// singleton instance if one existed.
    pub fn bind<T: Construct>(&self) {
        self.insert_binding(TypeId::of::<T>(), construct_producer::<T>(), false);
    }

    /// Register a direct-type singleton binding for `T`.
    ///
    /// The first successful resolution caches the instance; later calls
    /// return the identical `Arc`.
    pub fn singleton<T: Construct>(&self) {
        self.insert_binding(TypeId::of::<T>(), construct_producer::<T>(), true);
    }

    /// Register a factory binding for `T` (non-shared).
    pub fn bind_factory<T, F>(&self, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container, &ParamBag) -> Result<T, ResolveError> + Send + Sync + 'static,
    {
        self.insert_binding(TypeId::of::<T>(), factory_producer(factory), false);
    }

    /// Register a factory singleton binding for `T`.
    pub fn singleton_factory<T, F>(&self, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Container, &ParamBag) -> Result<T, ResolveError> + Send + Sync + 'static,
    {
        self.insert_binding(TypeId::of::<T>(), factory_producer(factory), true);
    }

    /// Register a producer under an arbitrary key.
    ///
    /// Escape hatch for registries that manage their own keys (the
    /// middleware registry resolves through this). The producer's output
    /// is not checked against the key; a consumer that needs a concrete
    /// type must downcast and handle the mismatch.
    pub fn bind_erased(&self, key: TypeId, producer: AnyProducer, shared: bool) {
        self.insert_binding(key, producer, shared);
    }

    /// Resolve `T`: use its binding if one exists, otherwise build it
    /// directly via [`Construct`] (implicit self-binding).
    pub fn resolve<T: Construct>(&self) -> Result<Arc<T>, ResolveError> {
        self.resolve_with(&ParamBag::new())
    }

    /// Resolve `T` with an explicit parameter bag.
    pub fn resolve_with<T: Construct>(&self, params: &ParamBag) -> Result<Arc<T>, ResolveError> {
        let erased = self.resolve_erased(
            TypeId::of::<T>(),
            type_name::<T>(),
            params,
            Some(construct_producer::<T>()),
        )?;
        downcast::<T>(erased)
    }

    /// Resolve `T` from an explicit binding only.
    ///
    /// Unlike [`resolve`](Self::resolve) there is no implicit
    /// self-binding; an absent binding is [`ResolveError::NotRegistered`].
    pub fn resolve_bound<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ResolveError> {
        let erased = self.resolve_erased(
            TypeId::of::<T>(),
            type_name::<T>(),
            &ParamBag::new(),
            None,
        )?;
        downcast::<T>(erased)
    }

    /// True if an explicit binding exists for `T`.
    #[must_use]
    pub fn has_binding<T: Any>(&self) -> bool {
        self.bindings.read().contains_key(&TypeId::of::<T>())
    }

    /// Type-erased resolution: binding if present, fallback otherwise.
    pub fn resolve_erased(
        &self,
        key: TypeId,
        name: &'static str,
        params: &ParamBag,
        fallback: Option<AnyProducer>,
    ) -> Result<AnyInstance, ResolveError> {
        let _guard = CycleGuard::enter(key, name)?;

        // Snapshot the producer so the lock is not held while it runs;
        // producers recurse into the container.
        let (producer, shared) = {
            let bindings = self.bindings.read();
            match bindings.get(&key) {
                Some(binding) => {
                    if binding.shared {
                        if let Some(instance) = &binding.instance {
                            return Ok(Arc::clone(instance));
                        }
                    }
                    (Arc::clone(&binding.producer), binding.shared)
                }
                None => match fallback {
                    Some(producer) => (producer, false),
                    None => return Err(ResolveError::NotRegistered { type_name: name }),
                },
            }
        };

        let instance = producer(self, params)?;

        if shared {
            let mut bindings = self.bindings.write();
            if let Some(binding) = bindings.get_mut(&key) {
                // Another resolution may have won the race; keep the
                // first stored instance so identity stays stable.
                if let Some(existing) = &binding.instance {
                    return Ok(Arc::clone(existing));
                }
                binding.instance = Some(Arc::clone(&instance));
            }
        }

        Ok(instance)
    }

    fn insert_binding(&self, key: TypeId, producer: AnyProducer, shared: bool) {
        let mut bindings = self.bindings.write();
        bindings.insert(
            key,
            Binding {
                producer,
                shared,
                instance: None,
            },
        );
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.bindings.read().len())
            .finish()
    }
}

fn construct_producer<T: Construct>() -> AnyProducer {
    Arc::new(|container, params| Ok(Arc::new(T::construct(container, params)?) as AnyInstance))
}

fn factory_producer<T, F>(factory: F) -> AnyProducer
where
    T: Any + Send + Sync,
    F: Fn(&Container, &ParamBag) -> Result<T, ResolveError> + Send + Sync + 'static,
{
    Arc::new(move |container, params| {
        Ok(Arc::new(factory(container, params)?) as AnyInstance)
    })
}

fn downcast<T: Any + Send + Sync>(erased: AnyInstance) -> Result<Arc<T>, ResolveError> {
    erased
        .downcast::<T>()
        .map_err(|_| ResolveError::Instantiation {
            type_name: type_name::<T>(),
            reason: "binding produced a value of a different type".to_string(),
        })
}
