//! End-to-end dispatch behavior: table construction, matching policy,
//! middleware resolution, and URL generation working together.

use std::sync::{Arc, Mutex};

use larix_core::{
    AuthenticatedUser, Construct, Container, CsrfGuard, DispatchError, Method, Middleware,
    MiddlewareSpec, Next, ParamBag, RequireAuth, Request, ResolveError, Response, StatusCode,
};
use larix_router::{Dep, Dispatcher, RouteTable, action, controller_action};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

type TraceLog = Arc<Mutex<Vec<String>>>;

struct TraceStep {
    label: String,
    log: TraceLog,
}

impl Construct for TraceStep {
    fn construct(_container: &Container, params: &ParamBag) -> Result<Self, ResolveError> {
        let label = params.get_or("label", "step");
        let label = label
            .as_str()
            .ok_or_else(|| ResolveError::UnresolvableDependency {
                name: "label".to_string(),
                type_name: std::any::type_name::<Self>(),
            })?;
        Ok(Self {
            label: label.to_string(),
            log: Arc::new(Mutex::new(Vec::new())),
        })
    }
}

impl Middleware for TraceStep {
    fn handle(&self, request: &mut Request, next: Next<'_>) -> Result<Response, DispatchError> {
        self.log.lock().unwrap().push(format!("{}:in", self.label));
        let response = next.run(request)?;
        self.log.lock().unwrap().push(format!("{}:out", self.label));
        Ok(response)
    }
}

#[test]
fn routes_dispatch_with_bound_path_parameters() {
    init_tracing();
    let mut table = RouteTable::new();
    let _ = table.get(
        "/users/{id}/posts/{post}",
        action(|_req: &Request, id: i64, post: String| {
            Response::ok().body_text(format!("user {id} post {post}"))
        }),
    );
    let dispatcher = Dispatcher::new(table, Arc::new(Container::new()));

    let mut request = Request::new(Method::Get, "/users/7/posts/intro");
    let response = dispatcher.dispatch(&mut request).expect("dispatch");
    assert_eq!(response.body(), "user 7 post intro");
}

#[test]
fn matching_is_anchored_to_the_full_path() {
    init_tracing();
    let mut table = RouteTable::new();
    let _ = table.get("/users/{id}", action(|_req: &Request| Response::ok()));
    let dispatcher = Dispatcher::new(table, Arc::new(Container::new()));

    for path in ["/users/7/extra", "/prefix/users/7", "/users/"] {
        let mut request = Request::new(Method::Get, path);
        let err = dispatcher.dispatch(&mut request).expect_err(path);
        assert!(matches!(err, DispatchError::NotFound { .. }), "{path}");
    }
}

#[test]
fn method_check_precedes_path_matching() {
    init_tracing();
    let mut table = RouteTable::new();
    let _ = table.get("/users", action(|_req: &Request| Response::ok()));
    let dispatcher = Dispatcher::new(table, Arc::new(Container::new()));

    // The path would match under GET; the POST table is empty, so the
    // failure is method-not-allowed, not not-found.
    let mut request = Request::new(Method::Post, "/users");
    let err = dispatcher.dispatch(&mut request).expect_err("no POST");
    assert!(matches!(err, DispatchError::MethodNotAllowed { .. }));
    assert_eq!(
        dispatcher.handle(&mut request).status(),
        StatusCode::METHOD_NOT_ALLOWED
    );
}

#[test]
fn earlier_registration_shadows_later_overlapping_templates() {
    init_tracing();
    let mut table = RouteTable::new();
    let _ = table.get(
        "/a/{x}",
        action(|req: &Request| {
            Response::ok().body_text(format!("x={}", req.param_str("x").unwrap_or_default()))
        }),
    );
    let _ = table.get("/a/fixed", action(|_req: &Request| Response::ok().body_text("literal")));
    let dispatcher = Dispatcher::new(table, Arc::new(Container::new()));

    let mut request = Request::new(Method::Get, "/a/fixed");
    let response = dispatcher.dispatch(&mut request).expect("dispatch");
    assert_eq!(response.body(), "x=fixed");
}

#[test]
fn middleware_wraps_the_handler_in_registration_order() {
    init_tracing();
    let log: TraceLog = Arc::new(Mutex::new(Vec::new()));

    let container = Container::new();
    let outer_log = Arc::clone(&log);
    container.singleton_factory::<TraceStep, _>(move |_, _| {
        Ok(TraceStep {
            label: "outer".to_string(),
            log: Arc::clone(&outer_log),
        })
    });

    let mut table = RouteTable::new();
    let handler_log = Arc::clone(&log);
    let _ = table
        .get(
            "/traced",
            action(move |_req: &Request| {
                handler_log.lock().unwrap().push("handler".to_string());
                Response::ok()
            }),
        )
        .middleware(MiddlewareSpec::of::<TraceStep>());
    let dispatcher = Dispatcher::new(table, Arc::new(container));

    let mut request = Request::new(Method::Get, "/traced");
    let response = dispatcher.dispatch(&mut request).expect("dispatch");
    assert!(response.status().is_success());
    assert_eq!(*log.lock().unwrap(), vec!["outer:in", "handler", "outer:out"]);
}

#[test]
fn auth_guard_short_circuits_anonymous_requests() {
    init_tracing();
    let mut table = RouteTable::new();
    let _ = table
        .get("/dashboard", action(|_req: &Request| Response::ok().body_text("secret")))
        .middleware(MiddlewareSpec::of::<RequireAuth>());
    let dispatcher = Dispatcher::new(table, Arc::new(Container::new()));

    let mut request = Request::new(Method::Get, "/dashboard");
    let response = dispatcher.dispatch(&mut request).expect("dispatch");
    assert_eq!(response.header_value("location"), Some("/login"));

    let mut request = Request::new(Method::Get, "/dashboard");
    request.insert_extension(AuthenticatedUser {
        id: 3,
        name: "ada".to_string(),
    });
    let response = dispatcher.dispatch(&mut request).expect("dispatch");
    assert_eq!(response.body(), "secret");
}

#[test]
fn csrf_guard_rejects_writes_without_the_token() {
    init_tracing();
    let mut table = RouteTable::new();
    let _ = table
        .post("/users", action(|_req: &Request| Response::ok().body_text("created")))
        .middleware(MiddlewareSpec::with_params::<CsrfGuard>(
            ParamBag::new().with("token", "tok-123"),
        ));
    let dispatcher = Dispatcher::new(table, Arc::new(Container::new()));

    let mut request = Request::new(Method::Post, "/users");
    let response = dispatcher.dispatch(&mut request).expect("dispatch");
    assert_eq!(response.status(), StatusCode::PAGE_EXPIRED);

    let mut request =
        Request::new(Method::Post, "/users").with_param(CsrfGuard::TOKEN_FIELD, "tok-123");
    let response = dispatcher.dispatch(&mut request).expect("dispatch");
    assert_eq!(response.body(), "created");
}

struct HitCounter {
    hits: Mutex<u64>,
}

impl Construct for HitCounter {
    fn construct(_container: &Container, _params: &ParamBag) -> Result<Self, ResolveError> {
        Ok(Self { hits: Mutex::new(0) })
    }
}

impl HitCounter {
    fn bump(&self) -> u64 {
        let mut hits = self.hits.lock().unwrap();
        *hits += 1;
        *hits
    }
}

#[test]
fn singleton_services_keep_state_across_dispatches() {
    init_tracing();
    let container = Container::new();
    container.singleton::<HitCounter>();

    let mut table = RouteTable::new();
    let _ = table.get(
        "/hits",
        action(|_req: &Request, counter: Dep<HitCounter>| {
            Response::ok().body_text(counter.bump().to_string())
        }),
    );
    let dispatcher = Dispatcher::new(table, Arc::new(container));

    for expected in ["1", "2", "3"] {
        let mut request = Request::new(Method::Get, "/hits");
        let response = dispatcher.dispatch(&mut request).expect("dispatch");
        assert_eq!(response.body(), expected);
    }
}

#[test]
fn non_shared_services_reset_between_dispatches() {
    init_tracing();
    let container = Container::new();
    container.bind::<HitCounter>();

    let mut table = RouteTable::new();
    let _ = table.get(
        "/hits",
        action(|_req: &Request, counter: Dep<HitCounter>| {
            Response::ok().body_text(counter.bump().to_string())
        }),
    );
    let dispatcher = Dispatcher::new(table, Arc::new(container));

    for _ in 0..3 {
        let mut request = Request::new(Method::Get, "/hits");
        let response = dispatcher.dispatch(&mut request).expect("dispatch");
        assert_eq!(response.body(), "1");
    }
}

struct PostController;

impl PostController {
    fn show(&self, _request: &Request, id: i64) -> Response {
        Response::ok().body_text(format!("post {id}"))
    }
}

impl Construct for PostController {
    fn construct(_container: &Container, _params: &ParamBag) -> Result<Self, ResolveError> {
        Ok(Self)
    }
}

#[test]
fn grouped_controller_routes_dispatch_and_generate_urls() {
    init_tracing();
    let mut table = RouteTable::new();
    table.group("/blog", |t| {
        let _ = t
            .get("/posts/{id}", controller_action::<PostController, _, _>(PostController::show))
            .name("posts.show");
    });
    let url = table
        .url_for("posts.show", &ParamBag::new().with("id", 12))
        .expect("url");
    assert_eq!(url, "/blog/posts/12");

    let dispatcher = Dispatcher::new(table, Arc::new(Container::new()));
    let mut request = Request::new(Method::Get, "/blog/posts/12");
    let response = dispatcher.dispatch(&mut request).expect("dispatch");
    assert_eq!(response.body(), "post 12");
}
