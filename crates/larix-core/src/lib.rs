//! Core types for the larix framework.
//!
//! This crate provides the fundamental building blocks:
//! - [`Request`] and [`Response`] types
//! - The [`Container`] dependency resolver and [`Construct`] factory trait
//! - The [`Middleware`] contract and per-dispatch [`Pipeline`]
//! - Error taxonomy and application configuration
//!
//! # Design Principles
//!
//! - No runtime reflection: dependency wiring is an explicit factory graph
//! - Fully synchronous: a dispatch runs to completion with no suspension
//! - All types support `Send + Sync`; the intended deployment is one
//!   container per request worker

#![forbid(unsafe_code)]

mod config;
mod container;
mod error;
mod middleware;
mod params;
mod request;
mod response;

pub use config::AppConfig;
pub use container::{AnyInstance, AnyProducer, Construct, Container};
pub use error::{DispatchError, ResolveError, RouterError};
pub use middleware::{
    AuthenticatedUser, CsrfGuard, Middleware, MiddlewareSpec, Next, Pipeline, RequireAuth,
    Terminal,
};
pub use params::ParamBag;
pub use request::{Headers, Method, Request, UnknownMethod};
pub use response::{Response, StatusCode};
