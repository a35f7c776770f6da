//! Route records and the route table.
//!
//! Registration returns a [`RouteHandle`] owning the follow-up `.name()`
//! and `.middleware()` calls for exactly that route, so attachment needs
//! no hidden "last defined route" cursor and two tables can be built in
//! parallel without interference.

use std::collections::HashMap;
use std::sync::Arc;

use larix_core::{Method, MiddlewareSpec, ParamBag, RouterError};
use serde_json::Value;

use crate::handler::Handler;
use crate::pattern::PathPattern;

/// One registered route.
pub struct Route {
    method: Method,
    template: String,
    pattern: PathPattern,
    handler: Arc<dyn Handler>,
    middleware: Vec<MiddlewareSpec>,
    name: Option<String>,
}

impl Route {
    /// The HTTP method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// The URL template (prefix already applied).
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The terminal handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Middleware references in registration order.
    #[must_use]
    pub fn middleware(&self) -> &[MiddlewareSpec] {
        &self.middleware
    }

    /// The reverse-lookup name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.template)
            .field("middleware", &self.middleware.len())
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
struct NamedRoute {
    template: String,
}

/// Method-keyed, insertion-ordered route storage.
///
/// Matching is first-registered, first-tried; overlapping templates are
/// allowed and never deduplicated.
#[derive(Default)]
pub struct RouteTable {
    routes: HashMap<Method, Vec<Route>>,
    named: HashMap<String, NamedRoute>,
    current_prefix: String,
}

impl RouteTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a GET route.
    pub fn get(&mut self, url: &str, handler: Arc<dyn Handler>) -> RouteHandle<'_> {
        self.register(Method::Get, url, handler)
    }

    /// Register a POST route.
    pub fn post(&mut self, url: &str, handler: Arc<dyn Handler>) -> RouteHandle<'_> {
        self.register(Method::Post, url, handler)
    }

    /// Register a PUT route.
    pub fn put(&mut self, url: &str, handler: Arc<dyn Handler>) -> RouteHandle<'_> {
        self.register(Method::Put, url, handler)
    }

    /// Register a DELETE route.
    pub fn delete(&mut self, url: &str, handler: Arc<dyn Handler>) -> RouteHandle<'_> {
        self.register(Method::Delete, url, handler)
    }

    /// Register a PATCH route.
    pub fn patch(&mut self, url: &str, handler: Arc<dyn Handler>) -> RouteHandle<'_> {
        self.register(Method::Patch, url, handler)
    }

    /// Register a route under the current group prefix.
    ///
    /// The effective template is plain string concatenation of the
    /// prefix stack and `url`; no slashes are added or removed.
    pub fn register(
        &mut self,
        method: Method,
        url: &str,
        handler: Arc<dyn Handler>,
    ) -> RouteHandle<'_> {
        let template = format!("{}{}", self.current_prefix, url);
        let route = Route {
            method,
            pattern: PathPattern::compile(&template),
            template,
            handler,
            middleware: Vec::new(),
            name: None,
        };
        let index = {
            let list = self.routes.entry(method).or_default();
            list.push(route);
            list.len() - 1
        };
        RouteHandle {
            table: self,
            method,
            index,
        }
    }

    /// Register routes under a shared prefix.
    ///
    /// Nested groups concatenate their prefixes.
    pub fn group(&mut self, prefix: &str, build: impl FnOnce(&mut Self)) {
        let previous_len = self.current_prefix.len();
        self.current_prefix.push_str(prefix);
        build(self);
        self.current_prefix.truncate(previous_len);
    }

    /// Insertion-ordered routes for a method; empty when the method has
    /// no routes at all (the caller treats that as method-not-allowed).
    #[must_use]
    pub fn candidates_for(&self, method: Method) -> &[Route] {
        self.routes.get(&method).map_or(&[], Vec::as_slice)
    }

    /// Generate a URL for a named route.
    ///
    /// Every placeholder in the route's template must have a value in
    /// `params`; a missing one is [`RouterError::MissingUrlParameter`]
    /// rather than a silently-stripped segment. Values substitute as
    /// plain strings (numbers via their decimal form).
    pub fn url_for(&self, name: &str, params: &ParamBag) -> Result<String, RouterError> {
        let named = self
            .named
            .get(name)
            .ok_or_else(|| RouterError::UnknownRoute {
                name: name.to_string(),
            })?;

        let pattern = PathPattern::compile(&named.template);
        let mut url = named.template.clone();
        for param in pattern.param_names() {
            let value = params
                .get(param)
                .ok_or_else(|| RouterError::MissingUrlParameter {
                    name: param.to_string(),
                    template: named.template.clone(),
                })?;
            url = url.replace(&format!("{{{param}}}"), &value_to_string(value));
        }
        Ok(url)
    }

    /// Total number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    fn route_mut(&mut self, method: Method, index: usize) -> &mut Route {
        self.routes
            .get_mut(&method)
            .and_then(|list| list.get_mut(index))
            .expect("route handle points at a registered route")
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.route_count())
            .field("named", &self.named.len())
            .finish_non_exhaustive()
    }
}

/// Builder handle for the route just registered.
pub struct RouteHandle<'t> {
    table: &'t mut RouteTable,
    method: Method,
    index: usize,
}

impl RouteHandle<'_> {
    /// Attach a reverse-lookup name.
    ///
    /// Re-registering an existing name overwrites the earlier mapping.
    #[must_use]
    pub fn name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        let template = {
            let route = self.table.route_mut(self.method, self.index);
            route.name = Some(name.clone());
            route.template.clone()
        };
        self.table.named.insert(name, NamedRoute { template });
        self
    }

    /// Append one middleware reference.
    #[must_use]
    pub fn middleware(self, spec: MiddlewareSpec) -> Self {
        self.table
            .route_mut(self.method, self.index)
            .middleware
            .push(spec);
        self
    }

    /// Append several middleware references, in the given order.
    #[must_use]
    pub fn middleware_all(self, specs: impl IntoIterator<Item = MiddlewareSpec>) -> Self {
        self.table
            .route_mut(self.method, self.index)
            .middleware
            .extend(specs);
        self
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
