//! Getting Started Example
//!
//! Builds a small application route table and dispatches a few requests
//! against it in-process.
//!
//! Run with: cargo run --example getting_started -p larix

use std::sync::Arc;

use larix::prelude::*;

struct UserRepo {
    users: Vec<(i64, &'static str)>,
}

impl Construct for UserRepo {
    fn construct(_container: &Container, _params: &ParamBag) -> Result<Self, ResolveError> {
        Ok(Self {
            users: vec![(1, "ada"), (2, "grace"), (3, "edsger")],
        })
    }
}

impl UserRepo {
    fn find(&self, id: i64) -> Option<&'static str> {
        self.users
            .iter()
            .find(|(user_id, _)| *user_id == id)
            .map(|(_, name)| *name)
    }
}

struct UserController;

impl Construct for UserController {
    fn construct(_container: &Container, _params: &ParamBag) -> Result<Self, ResolveError> {
        Ok(Self)
    }
}

impl UserController {
    fn index(&self, _request: &Request) -> Response {
        Response::ok().body_text("user index")
    }

    fn show(&self, _request: &Request, id: i64) -> Response {
        Response::ok().body_text(format!("user {id}"))
    }
}

fn main() {
    println!("larix getting started\n");

    // === Routes ===
    let mut routes = RouteTable::new();
    let _ = routes.get("/", action(|_req: &Request| {
        Response::ok().body_text("Hello, World!")
    }));
    routes.group("/users", |r| {
        let _ = r
            .get("", controller_action::<UserController, _, _>(UserController::index))
            .name("users.index");
        let _ = r
            .get("/{id}", action(|_req: &Request, repo: Dep<UserRepo>, id: i64| {
                match repo.find(id) {
                    Some(name) => Response::ok().body_text(name),
                    None => Response::not_found(),
                }
            }))
            .name("users.show");
        let _ = r
            .post("", action(|_req: &Request| Response::ok().body_text("created")))
            .middleware(MiddlewareSpec::with_params::<CsrfGuard>(
                ParamBag::new().with("token", "demo-token"),
            ));
    });

    // === Container ===
    let container = Container::new();
    container.singleton::<UserRepo>();
    let app = Dispatcher::new(routes, Arc::new(container));

    // === Dispatch ===
    let mut request = Request::new(Method::Get, "/");
    let response = app.handle(&mut request);
    println!("GET / -> {} ({})", response.status(), response.body());

    let mut request = Request::new(Method::Get, "/users/2");
    let response = app.handle(&mut request);
    println!("GET /users/2 -> {} ({})", response.status(), response.body());
    assert_eq!(response.body(), "grace");

    let mut request = Request::new(Method::Get, "/users/99");
    let response = app.handle(&mut request);
    println!("GET /users/99 -> {}", response.status());

    // Missing CSRF token: the guard answers before the handler runs.
    let mut request = Request::new(Method::Post, "/users");
    let response = app.handle(&mut request);
    println!("POST /users (no token) -> {}", response.status());
    assert_eq!(response.status(), StatusCode::PAGE_EXPIRED);

    let mut request =
        Request::new(Method::Post, "/users").with_param(CsrfGuard::TOKEN_FIELD, "demo-token");
    let response = app.handle(&mut request);
    println!("POST /users (token) -> {} ({})", response.status(), response.body());
    assert_eq!(response.body(), "created");

    // === Named URLs ===
    let url = app
        .table()
        .url_for("users.show", &ParamBag::new().with("id", 2))
        .expect("known route");
    println!("\nurl_for(users.show, id=2) -> {url}");
}
