//! Route table, URL patterns, and the request dispatcher.
//!
//! This crate turns a set of URL templates into a dispatchable table:
//! - [`PathPattern`]: compiled `{placeholder}` templates and matching
//! - [`RouteTable`] / [`RouteHandle`]: registration, groups, names
//! - [`Handler`] and the [`action`] / [`controller_action`] adapters
//! - [`Dispatcher`]: method check, first-match selection, middleware
//!   resolution, pipeline execution

#![forbid(unsafe_code)]

mod dispatch;
mod handler;
mod pattern;
mod route;

pub use dispatch::Dispatcher;
pub use handler::{
    ActionArg, BindContext, ControllerFn, Dep, FromPathValue, Handler, HandlerFn, action,
    controller_action,
};
pub use pattern::PathPattern;
pub use route::{Route, RouteHandle, RouteTable};
