//! Request dispatch.
//!
//! The dispatcher walks the route table for the request's method,
//! selects the first matching route, resolves its middleware through
//! the container, and runs the pipeline down to the route's handler.

use std::sync::Arc;

use larix_core::{Container, DispatchError, Pipeline, Request, Response};

use crate::route::RouteTable;

/// Routes requests to handlers.
pub struct Dispatcher {
    table: RouteTable,
    container: Arc<Container>,
}

impl Dispatcher {
    /// Build a dispatcher from a finished table and a container.
    #[must_use]
    pub fn new(table: RouteTable, container: Arc<Container>) -> Self {
        Self { table, container }
    }

    /// The route table.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The service container.
    #[must_use]
    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    /// Dispatch a request, surfacing routing failures as errors.
    ///
    /// A method with no registered routes at all is rejected as
    /// [`DispatchError::MethodNotAllowed`] before any path matching,
    /// even when another method's table has a template that would have
    /// matched the path. Within a method, candidates are tried in
    /// registration order and the first match wins.
    pub fn dispatch(&self, request: &mut Request) -> Result<Response, DispatchError> {
        let candidates = self.table.candidates_for(request.method());
        if candidates.is_empty() {
            tracing::warn!(method = %request.method(), path = %request.path(), "no routes for method");
            return Err(DispatchError::MethodNotAllowed {
                method: request.method(),
            });
        }

        for route in candidates {
            let Some(matched) = route.pattern().match_path(request.path()) else {
                continue;
            };
            let values: Vec<String> = matched.iter().map(ToString::to_string).collect();
            tracing::debug!(
                method = %request.method(),
                path = %request.path(),
                template = route.template(),
                "route matched"
            );

            for (name, value) in route.pattern().param_names().iter().zip(&values) {
                request.set_param(*name, value.clone());
            }

            let mut stack = Vec::with_capacity(route.middleware().len());
            for spec in route.middleware() {
                stack.push(spec.resolve(&self.container)?);
            }

            let handler = Arc::clone(route.handler());
            let container = Arc::clone(&self.container);
            let template = route.template().to_string();
            let terminal = move |req: &mut Request| -> Result<Response, DispatchError> {
                handler.invoke(&container, req, &values, &template)
            };
            return Pipeline::new(stack).run(request, &terminal);
        }

        tracing::warn!(method = %request.method(), path = %request.path(), "no route matched");
        Err(DispatchError::NotFound {
            method: request.method(),
            path: request.path().to_string(),
        })
    }

    /// Dispatch a request and map every failure to a response.
    ///
    /// Not-found and method-not-allowed map to their canonical bodies;
    /// anything else is logged and answered with a 500.
    pub fn handle(&self, request: &mut Request) -> Response {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(DispatchError::NotFound { .. }) => Response::not_found(),
            Err(DispatchError::MethodNotAllowed { .. }) => Response::method_not_allowed(),
            Err(err) => {
                tracing::error!(error = %err, "dispatch failed");
                Response::internal_error()
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.table.route_count())
            .finish_non_exhaustive()
    }
}
