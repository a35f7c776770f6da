//! Middleware contract and the per-dispatch pipeline.
//!
//! A middleware wraps the rest of the pipeline: it receives the request
//! and a [`Next`] continuation, and either forwards (`next.run(request)`)
//! or short-circuits by returning its own response. Frames are composed
//! right-to-left around the terminal action, so the first registered
//! middleware is the outermost on the way in and the last to see the
//! response on the way out.
//!
//! Routes reference middleware through [`MiddlewareSpec`]: a typed key
//! resolved through the [`Container`] at dispatch time, not at
//! registration time. A binding under that key which yields something
//! other than the expected middleware type fails with
//! [`DispatchError::ContractViolation`].

use std::any::{Any, TypeId, type_name};
use std::sync::Arc;

use crate::container::{AnyInstance, AnyProducer, Construct, Container};
use crate::error::{DispatchError, ResolveError};
use crate::params::ParamBag;
use crate::request::{Method, Request};
use crate::response::Response;

/// The terminal action at the center of a pipeline.
pub type Terminal<'a> = &'a dyn Fn(&mut Request) -> Result<Response, DispatchError>;

/// A unit of request interception.
pub trait Middleware: Send + Sync + 'static {
    /// Handle the request: forward via `next` or short-circuit.
    fn handle(&self, request: &mut Request, next: Next<'_>) -> Result<Response, DispatchError>;
}

/// The continuation handed to a middleware.
///
/// Holds the unconsumed tail of the middleware stack plus the terminal
/// action. Consuming `self` in [`run`](Self::run) makes "forward at most
/// once" a type-level property.
pub struct Next<'a> {
    stack: &'a [Arc<dyn Middleware>],
    terminal: Terminal<'a>,
}

impl Next<'_> {
    /// Invoke the rest of the pipeline.
    pub fn run(self, request: &mut Request) -> Result<Response, DispatchError> {
        match self.stack.split_first() {
            Some((middleware, rest)) => middleware.handle(
                request,
                Next {
                    stack: rest,
                    terminal: self.terminal,
                },
            ),
            None => (self.terminal)(request),
        }
    }
}

/// An ordered middleware stack, built fresh per dispatch.
pub struct Pipeline {
    stack: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    /// Build a pipeline from resolved middleware, outermost first.
    #[must_use]
    pub fn new(stack: Vec<Arc<dyn Middleware>>) -> Self {
        Self { stack }
    }

    /// Run the pipeline around `terminal`.
    pub fn run(
        &self,
        request: &mut Request,
        terminal: Terminal<'_>,
    ) -> Result<Response, DispatchError> {
        Next {
            stack: &self.stack,
            terminal,
        }
        .run(request)
    }
}

type CastFn = Arc<dyn Fn(AnyInstance) -> Option<Arc<dyn Middleware>> + Send + Sync>;

/// A lazily-resolved middleware reference attached to a route.
///
/// Created with [`of`](Self::of) (bare reference) or
/// [`with_params`](Self::with_params) (reference plus parameter bag).
#[derive(Clone)]
pub struct MiddlewareSpec {
    key: TypeId,
    type_name: &'static str,
    params: Option<ParamBag>,
    fallback: AnyProducer,
    cast: CastFn,
}

impl MiddlewareSpec {
    /// Reference middleware `M`, constructed with an empty parameter bag.
    #[must_use]
    pub fn of<M: Middleware + Construct>() -> Self {
        Self::build::<M>(None)
    }

    /// Reference middleware `M`, constructed with `params`.
    #[must_use]
    pub fn with_params<M: Middleware + Construct>(params: ParamBag) -> Self {
        Self::build::<M>(Some(params))
    }

    fn build<M: Middleware + Construct>(params: Option<ParamBag>) -> Self {
        let fallback: AnyProducer = Arc::new(|container, params| {
            Ok(Arc::new(M::construct(container, params)?) as AnyInstance)
        });
        let cast: CastFn = Arc::new(|erased| {
            erased
                .downcast::<M>()
                .ok()
                .map(|concrete| concrete as Arc<dyn Middleware>)
        });
        Self {
            key: TypeId::of::<M>(),
            type_name: type_name::<M>(),
            params,
            fallback,
            cast,
        }
    }

    /// The referenced type's name, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Resolve to an instance through the container.
    pub fn resolve(&self, container: &Container) -> Result<Arc<dyn Middleware>, DispatchError> {
        let empty = ParamBag::new();
        let params = self.params.as_ref().unwrap_or(&empty);
        let erased = container.resolve_erased(
            self.key,
            self.type_name,
            params,
            Some(Arc::clone(&self.fallback)),
        )?;
        (self.cast)(erased).ok_or(DispatchError::ContractViolation {
            type_name: self.type_name,
        })
    }
}

impl std::fmt::Debug for MiddlewareSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareSpec")
            .field("type_name", &self.type_name)
            .field("has_params", &self.params.is_some())
            .finish()
    }
}

/// The authenticated principal, placed on the request as a typed
/// extension by whatever session layer the embedding process runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Stable user identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
}

/// Rejects requests that carry no [`AuthenticatedUser`] extension by
/// redirecting to the login path.
pub struct RequireAuth {
    login_path: String,
}

impl RequireAuth {
    /// Guard with an explicit login path.
    #[must_use]
    pub fn new(login_path: impl Into<String>) -> Self {
        Self {
            login_path: login_path.into(),
        }
    }
}

impl Construct for RequireAuth {
    fn construct(_container: &Container, params: &ParamBag) -> Result<Self, ResolveError> {
        let login_path = params.get_or("login_path", "/login");
        let login_path =
            login_path
                .as_str()
                .ok_or_else(|| ResolveError::UnresolvableDependency {
                    name: "login_path".to_string(),
                    type_name: type_name::<Self>(),
                })?;
        Ok(Self::new(login_path))
    }
}

impl Middleware for RequireAuth {
    fn handle(&self, request: &mut Request, next: Next<'_>) -> Result<Response, DispatchError> {
        if request.get_extension::<AuthenticatedUser>().is_none() {
            return Ok(Response::redirect(self.login_path.clone()));
        }
        next.run(request)
    }
}

/// CSRF guard for state-changing requests.
///
/// GET requests pass through untouched. Any other method must carry the
/// token field in its parameter bag, matching the expected token;
/// otherwise the pipeline short-circuits with `419 Page Expired`.
pub struct CsrfGuard {
    expected: String,
    field: String,
}

impl CsrfGuard {
    /// Default name of the token field in the request parameter bag.
    pub const TOKEN_FIELD: &'static str = "_csrf_token";

    /// Guard against the given expected token, using the default field.
    #[must_use]
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            field: Self::TOKEN_FIELD.to_string(),
        }
    }

    /// Override the token field name.
    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }
}

impl Construct for CsrfGuard {
    fn construct(_container: &Container, params: &ParamBag) -> Result<Self, ResolveError> {
        let expected = params.str_value("token").ok_or_else(|| {
            ResolveError::UnresolvableDependency {
                name: "token".to_string(),
                type_name: type_name::<Self>(),
            }
        })?;
        let field = params.get_or("field", Self::TOKEN_FIELD);
        let field = field
            .as_str()
            .ok_or_else(|| ResolveError::UnresolvableDependency {
                name: "field".to_string(),
                type_name: type_name::<Self>(),
            })?;
        Ok(Self::new(expected).field(field))
    }
}

impl Middleware for CsrfGuard {
    fn handle(&self, request: &mut Request, next: Next<'_>) -> Result<Response, DispatchError> {
        if request.method() == Method::Get {
            return next.run(request);
        }
        let supplied = request.param_str(&self.field).unwrap_or("");
        if supplied.is_empty() || supplied != self.expected {
            return Ok(Response::page_expired());
        }
        next.run(request)
    }
}
