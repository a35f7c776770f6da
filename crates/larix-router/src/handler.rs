//! Action handlers and argument binding.
//!
//! An action declares its parameters in its signature; binding walks the
//! declared parameters in order. Path-coercible parameters (`String`,
//! integers, and their `Option` forms) consume the next unconsumed
//! path-matched value in template order; [`Dep<T>`] parameters resolve
//! through the container instead and consume nothing. Only integer
//! coercion is defined for path values; everything else receives the
//! matched string unchanged.

use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use larix_core::{Construct, Container, DispatchError, Request, Response};

/// A route's terminal target, invoked once per matched dispatch.
pub trait Handler: Send + Sync {
    /// Bind arguments and run the action.
    fn invoke(
        &self,
        container: &Container,
        request: &Request,
        path_values: &[String],
        template: &str,
    ) -> Result<Response, DispatchError>;
}

/// Everything an action argument can be bound from.
pub struct BindContext<'a> {
    container: &'a Container,
    request: &'a Request,
    path_values: &'a [String],
    consumed: usize,
    template: &'a str,
}

impl<'a> BindContext<'a> {
    /// Create a context over the matched path values.
    #[must_use]
    pub fn new(
        container: &'a Container,
        request: &'a Request,
        path_values: &'a [String],
        template: &'a str,
    ) -> Self {
        Self {
            container,
            request,
            path_values,
            consumed: 0,
            template,
        }
    }

    /// The container for dependency-typed arguments.
    #[must_use]
    pub fn container(&self) -> &'a Container {
        self.container
    }

    /// The request under dispatch.
    #[must_use]
    pub fn request(&self) -> &'a Request {
        self.request
    }

    /// Consume the next path-matched value; absent is a hard failure.
    pub fn next_path_value(&mut self) -> Result<&'a str, DispatchError> {
        let position = self.consumed;
        match self.path_values.get(position) {
            Some(value) => {
                self.consumed += 1;
                Ok(value)
            }
            None => Err(DispatchError::MissingParameter {
                position,
                template: self.template.to_string(),
            }),
        }
    }

    /// Consume the next path-matched value if one remains.
    pub fn try_next_path_value(&mut self) -> Option<&'a str> {
        let value = self.path_values.get(self.consumed)?;
        self.consumed += 1;
        Some(value)
    }
}

/// Types constructible from one matched path value.
pub trait FromPathValue: Sized {
    /// Coerce the raw matched substring.
    fn from_path_value(raw: &str) -> Result<Self, DispatchError>;
}

impl FromPathValue for String {
    fn from_path_value(raw: &str) -> Result<Self, DispatchError> {
        Ok(raw.to_string())
    }
}

macro_rules! integer_from_path_value {
    ($($ty:ty),* $(,)?) => {$(
        impl FromPathValue for $ty {
            fn from_path_value(raw: &str) -> Result<Self, DispatchError> {
                raw.parse::<$ty>()
                    .map_err(|_| DispatchError::InvalidParameter {
                        value: raw.to_string(),
                        expected: "an integer",
                    })
            }
        }
    )*};
}

integer_from_path_value!(i32, i64, u32, u64);

/// One declared action parameter.
pub trait ActionArg: Sized {
    /// Bind the parameter from the context.
    fn bind(cx: &mut BindContext<'_>) -> Result<Self, DispatchError>;
}

macro_rules! path_action_arg {
    ($($ty:ty),* $(,)?) => {$(
        impl ActionArg for $ty {
            fn bind(cx: &mut BindContext<'_>) -> Result<Self, DispatchError> {
                let raw = cx.next_path_value()?;
                <$ty as FromPathValue>::from_path_value(raw)
            }
        }

        // The optional form stands in for a declared default: `None`
        // when the template supplies no further value.
        impl ActionArg for Option<$ty> {
            fn bind(cx: &mut BindContext<'_>) -> Result<Self, DispatchError> {
                match cx.try_next_path_value() {
                    Some(raw) => Ok(Some(<$ty as FromPathValue>::from_path_value(raw)?)),
                    None => Ok(None),
                }
            }
        }
    )*};
}

path_action_arg!(String, i32, i64, u32, u64);

/// A dependency-typed action parameter, resolved through the container.
#[derive(Debug)]
pub struct Dep<T>(pub Arc<T>);

impl<T: Construct> ActionArg for Dep<T> {
    fn bind(cx: &mut BindContext<'_>) -> Result<Self, DispatchError> {
        Ok(Self(cx.container().resolve::<T>()?))
    }
}

impl<T> Deref for Dep<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Functions usable as free-standing actions.
pub trait HandlerFn<Args>: Send + Sync + 'static {
    /// Bind arguments and run.
    fn call(&self, cx: &mut BindContext<'_>) -> Result<Response, DispatchError>;
}

/// Functions usable as controller actions: the first parameter is the
/// controller, resolved through the container at dispatch time.
pub trait ControllerFn<C, Args>: Send + Sync + 'static {
    /// Bind arguments and run against the controller.
    fn call(&self, controller: &C, cx: &mut BindContext<'_>) -> Result<Response, DispatchError>;
}

macro_rules! impl_handler_fns {
    ($($arg:ident),*) => {
        #[allow(non_snake_case)]
        impl<F, $($arg,)*> HandlerFn<($($arg,)*)> for F
        where
            F: Fn(&Request $(, $arg)*) -> Response + Send + Sync + 'static,
            $($arg: ActionArg,)*
        {
            fn call(&self, cx: &mut BindContext<'_>) -> Result<Response, DispatchError> {
                $(let $arg = <$arg as ActionArg>::bind(cx)?;)*
                Ok((self)(cx.request() $(, $arg)*))
            }
        }

        #[allow(non_snake_case)]
        impl<F, C, $($arg,)*> ControllerFn<C, ($($arg,)*)> for F
        where
            F: Fn(&C, &Request $(, $arg)*) -> Response + Send + Sync + 'static,
            C: Send + Sync + 'static,
            $($arg: ActionArg,)*
        {
            fn call(&self, controller: &C, cx: &mut BindContext<'_>) -> Result<Response, DispatchError> {
                $(let $arg = <$arg as ActionArg>::bind(cx)?;)*
                Ok((self)(controller, cx.request() $(, $arg)*))
            }
        }
    };
}

impl_handler_fns!();
impl_handler_fns!(A1);
impl_handler_fns!(A1, A2);
impl_handler_fns!(A1, A2, A3);
impl_handler_fns!(A1, A2, A3, A4);

struct FnAction<F, Args> {
    f: F,
    _marker: PhantomData<fn() -> Args>,
}

impl<F, Args> Handler for FnAction<F, Args>
where
    F: HandlerFn<Args>,
    Args: Send + Sync + 'static,
{
    fn invoke(
        &self,
        container: &Container,
        request: &Request,
        path_values: &[String],
        template: &str,
    ) -> Result<Response, DispatchError> {
        let mut cx = BindContext::new(container, request, path_values, template);
        self.f.call(&mut cx)
    }
}

/// Adapt a function into a route handler.
pub fn action<F, Args>(f: F) -> Arc<dyn Handler>
where
    F: HandlerFn<Args>,
    Args: Send + Sync + 'static,
{
    Arc::new(FnAction {
        f,
        _marker: PhantomData,
    })
}

struct ControllerAction<C, F, Args> {
    f: F,
    _marker: PhantomData<fn() -> (C, Args)>,
}

impl<C, F, Args> Handler for ControllerAction<C, F, Args>
where
    C: Construct,
    F: ControllerFn<C, Args>,
    Args: Send + Sync + 'static,
{
    fn invoke(
        &self,
        container: &Container,
        request: &Request,
        path_values: &[String],
        template: &str,
    ) -> Result<Response, DispatchError> {
        // The controller is built per dispatch, like any other resolved
        // type; bind a singleton to share one instance.
        let controller = container.resolve::<C>()?;
        let mut cx = BindContext::new(container, request, path_values, template);
        self.f.call(&controller, &mut cx)
    }
}

/// Adapt a controller method into a route handler.
///
/// The controller type is resolved through the container when the route
/// fires; the method receives it by reference.
pub fn controller_action<C, F, Args>(f: F) -> Arc<dyn Handler>
where
    C: Construct,
    F: ControllerFn<C, Args>,
    Args: Send + Sync + 'static,
{
    Arc::new(ControllerAction::<C, F, Args> {
        f,
        _marker: PhantomData,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use larix_core::{Method, ParamBag, ResolveError};

    fn values(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn string_argument_passes_through_unchanged() {
        let container = Container::new();
        let request = Request::new(Method::Get, "/users/abc");
        let handler = action(|_req: &Request, id: String| Response::ok().body_text(id));
        let response = handler
            .invoke(&container, &request, &values(&["abc"]), "/users/{id}")
            .expect("invoke");
        assert_eq!(response.body(), "abc");
    }

    #[test]
    fn integer_argument_is_coerced() {
        let container = Container::new();
        let request = Request::new(Method::Get, "/users/42");
        let handler = action(|_req: &Request, id: i64| Response::ok().body_text(format!("{}", id * 2)));
        let response = handler
            .invoke(&container, &request, &values(&["42"]), "/users/{id}")
            .expect("invoke");
        assert_eq!(response.body(), "84");
    }

    #[test]
    fn non_numeric_value_for_integer_is_invalid() {
        let container = Container::new();
        let request = Request::new(Method::Get, "/users/abc");
        let handler = action(|_req: &Request, _id: i64| Response::ok());
        let err = handler
            .invoke(&container, &request, &values(&["abc"]), "/users/{id}")
            .expect_err("coercion failure");
        assert!(matches!(err, DispatchError::InvalidParameter { .. }));
    }

    #[test]
    fn missing_required_argument_fails() {
        let container = Container::new();
        let request = Request::new(Method::Get, "/users");
        let handler = action(|_req: &Request, _id: i64| Response::ok());
        let err = handler
            .invoke(&container, &request, &values(&[]), "/users/{id}")
            .expect_err("missing value");
        assert!(matches!(
            err,
            DispatchError::MissingParameter { position: 0, .. }
        ));
    }

    #[test]
    fn optional_argument_defaults_to_none() {
        let container = Container::new();
        let request = Request::new(Method::Get, "/posts");
        let handler = action(|_req: &Request, page: Option<i64>| {
            Response::ok().body_text(format!("page={}", page.unwrap_or(1)))
        });
        let response = handler
            .invoke(&container, &request, &values(&[]), "/posts")
            .expect("invoke");
        assert_eq!(response.body(), "page=1");

        let response = handler
            .invoke(&container, &request, &values(&["3"]), "/posts/{page}")
            .expect("invoke");
        assert_eq!(response.body(), "page=3");
    }

    struct Greeter {
        greeting: String,
    }

    impl Construct for Greeter {
        fn construct(_container: &Container, params: &ParamBag) -> Result<Self, ResolveError> {
            let greeting = params.get_or("greeting", "hello");
            Ok(Self {
                greeting: greeting.as_str().unwrap_or("hello").to_string(),
            })
        }
    }

    #[test]
    fn dependency_arguments_resolve_and_consume_no_path_values() {
        let container = Container::new();
        let request = Request::new(Method::Get, "/greet/ada");
        let handler = action(|_req: &Request, svc: Dep<Greeter>, name: String| {
            Response::ok().body_text(format!("{} {}", svc.greeting, name))
        });
        let response = handler
            .invoke(&container, &request, &values(&["ada"]), "/greet/{name}")
            .expect("invoke");
        assert_eq!(response.body(), "hello ada");
    }

    struct UserController {
        greeter: Arc<Greeter>,
    }

    impl UserController {
        fn show(&self, _request: &Request, id: i64) -> Response {
            Response::ok().body_text(format!("{} user {id}", self.greeter.greeting))
        }
    }

    impl Construct for UserController {
        fn construct(container: &Container, _params: &ParamBag) -> Result<Self, ResolveError> {
            Ok(Self {
                greeter: container.resolve::<Greeter>()?,
            })
        }
    }

    #[test]
    fn controller_actions_resolve_the_controller_per_dispatch() {
        let container = Container::new();
        let request = Request::new(Method::Get, "/users/9");
        let handler = controller_action::<UserController, _, _>(UserController::show);
        let response = handler
            .invoke(&container, &request, &values(&["9"]), "/users/{id}")
            .expect("invoke");
        assert_eq!(response.body(), "hello user 9");
    }
}
