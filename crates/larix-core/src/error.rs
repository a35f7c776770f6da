//! Error types shared across the framework.
//!
//! The core recovers from nothing: route definition mistakes surface as
//! [`RouterError`] while the application wires its routes, and everything
//! that goes wrong during a dispatch surfaces as [`DispatchError`] and
//! propagates to the process-edge handler. There are no retries anywhere
//! in this subsystem.

use crate::request::Method;

/// Failure while resolving a type through the [`Container`](crate::Container).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    /// The requested type has no binding and cannot be built implicitly.
    #[error("no binding registered for `{type_name}`")]
    NotRegistered {
        /// Name of the requested type.
        type_name: &'static str,
    },

    /// A constructor needed a primitive value that was neither supplied
    /// in the explicit parameter bag nor covered by a default.
    #[error("unresolvable dependency: parameter `{name}` for `{type_name}`")]
    UnresolvableDependency {
        /// Constructor parameter name.
        name: String,
        /// Type whose constructor required the parameter.
        type_name: &'static str,
    },

    /// A producer ran but could not build the target type.
    #[error("cannot instantiate `{type_name}`: {reason}")]
    Instantiation {
        /// Name of the type being built.
        type_name: &'static str,
        /// Human-readable cause.
        reason: String,
    },

    /// The constructor dependency graph loops back on itself.
    #[error("cyclic dependency: {chain}")]
    CyclicDependency {
        /// The resolution chain, innermost last (e.g. `A -> B -> A`).
        chain: String,
    },
}

/// Failure while dispatching one request.
///
/// `NotFound` and `MethodNotAllowed` are clean terminal states the
/// process edge turns into 404/405 responses; every other variant is a
/// fatal request failure (500-equivalent).
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    /// Routes exist for the method, but no template matched the path.
    #[error("no route matches {method} {path}")]
    NotFound {
        /// Request method.
        method: Method,
        /// Request path.
        path: String,
    },

    /// No routes at all are registered for the request method.
    #[error("method {method} not allowed")]
    MethodNotAllowed {
        /// Request method.
        method: Method,
    },

    /// An action parameter had neither a path-matched value nor a default.
    #[error("missing required parameter #{position} for route `{template}`")]
    MissingParameter {
        /// Zero-based position among the action's path-bound parameters.
        position: usize,
        /// URL template of the matched route.
        template: String,
    },

    /// A path-matched value could not be coerced to the declared type.
    #[error("invalid parameter value `{value}`: expected {expected}")]
    InvalidParameter {
        /// The raw matched substring.
        value: String,
        /// What the action declared (e.g. `an integer`).
        expected: &'static str,
    },

    /// A configured middleware resolved to a value that does not expose
    /// the `handle(request, next)` capability.
    #[error("`{type_name}` does not implement the middleware contract")]
    ContractViolation {
        /// Name of the offending type.
        type_name: &'static str,
    },

    /// Container resolution failed while building a controller,
    /// middleware, or injected action argument.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl DispatchError {
    /// True for the two intentionally-modeled terminal states.
    #[must_use]
    pub fn is_terminal_state(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::MethodNotAllowed { .. })
    }
}

/// Failure at route-definition or URL-generation time.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RouterError {
    /// `url_for` was called with a name no route carries.
    #[error("route `{name}` not found")]
    UnknownRoute {
        /// The requested route name.
        name: String,
    },

    /// `url_for` was called without a value for a declared placeholder.
    #[error("missing value for placeholder `{name}` in `{template}`")]
    MissingUrlParameter {
        /// Placeholder identifier.
        name: String,
        /// URL template of the named route.
        template: String,
    },
}
