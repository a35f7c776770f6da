//! A small synchronous web framework core.
//!
//! larix provides the request-routing heart of a server-rendered web
//! application:
//!
//! - **Explicit routing** — URL templates with `{placeholder}` segments,
//!   named routes, and prefix groups
//! - **Middleware pipeline** — per-route interception with typed
//!   request extensions
//! - **Dependency injection** — an explicit factory graph instead of
//!   runtime reflection, with singleton and per-resolution bindings
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use larix::prelude::*;
//!
//! let mut routes = RouteTable::new();
//! let _ = routes
//!     .get("/users/{id}", action(|_req: &Request, id: i64| {
//!         Response::ok().body_text(format!("user {id}"))
//!     }))
//!     .name("users.show");
//!
//! let app = Dispatcher::new(routes, Arc::new(Container::new()));
//! let mut request = Request::new(Method::Get, "/users/7");
//! let response = app.handle(&mut request);
//! assert_eq!(response.body(), "user 7");
//! ```
//!
//! # Crate Structure
//!
//! - [`larix_core`] — Request/Response, [`Container`], the
//!   [`Middleware`] contract, errors, configuration
//! - [`larix_router`] — [`PathPattern`], [`RouteTable`], [`Dispatcher`]

#![forbid(unsafe_code)]

pub use larix_core as core;
pub use larix_router as router;

pub use larix_core::{
    AppConfig, AuthenticatedUser, Construct, Container, CsrfGuard, DispatchError, Headers, Method,
    Middleware, MiddlewareSpec, Next, ParamBag, Pipeline, RequireAuth, Request, ResolveError,
    Response, RouterError, StatusCode, Terminal, UnknownMethod,
};
pub use larix_router::{
    ActionArg, BindContext, ControllerFn, Dep, Dispatcher, FromPathValue, Handler, HandlerFn,
    PathPattern, Route, RouteHandle, RouteTable, action, controller_action,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{
        AppConfig, AuthenticatedUser, Construct, Container, CsrfGuard, Dep, DispatchError,
        Dispatcher, Method, Middleware, MiddlewareSpec, Next, ParamBag, Request, ResolveError,
        Response, RouteTable, StatusCode, action, controller_action,
    };
}
