use http::Method;
use serde_json::json;
use std::sync::Arc;
use storefront_engine::net::{Canned, HeaderSet, Payload, ScriptedBackend};
use storefront_engine::router::{names, Route, RouteMeta, RouteTable};
use storefront_engine::storage::{InMemoryArea, StorageArea};
use storefront_engine::{AppContext, AuthOutcome, ClientConfig, Credentials, Role, Severity};

fn context_with(backend: Arc<ScriptedBackend>, area: Arc<dyn StorageArea>) -> AppContext {
    AppContext::new(ClientConfig::default(), backend, area)
}

fn context(backend: Arc<ScriptedBackend>) -> AppContext {
    context_with(backend, Arc::new(InMemoryArea::new()))
}

fn admin_login(backend: &ScriptedBackend) {
    backend.on(
        Method::POST,
        "/api/login",
        Canned::json(200, json!({"message": "Welcome back", "data": {"token": "adm", "name": "Root", "isAdmin": true}})),
    );
    // The server's "who am I" reply carries the name only.
    backend.on(Method::GET, "/api/user-name", Canned::json(200, json!({"data": {"name": "Root"}})));
}

#[tokio::test]
async fn mismatched_content_type_yields_the_failure_result() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.on(
        Method::GET,
        "/api/admin/categories",
        Canned::new(200).header("content-type", "text/html").body(b"<html/>".to_vec()),
    );
    backend.on(
        Method::GET,
        "/api/admin/categories/export",
        Canned::json(200, json!({"data": []})),
    );
    let ctx = context(backend);

    let json = ctx.fetcher().get("/api/admin/categories", &HeaderSet::json()).await;
    assert_eq!(json.status, 400);
    assert_eq!(json.payload, Payload::Empty);

    let csv = ctx.fetcher().get("/api/admin/categories/export", &HeaderSet::csv()).await;
    assert_eq!(csv.status, 400);
    assert!(csv.filename.is_none());
}

#[tokio::test]
async fn admin_login_then_login_page_redirects_home() {
    let backend = Arc::new(ScriptedBackend::new());
    admin_login(&backend);
    let ctx = context(backend);

    let outcome = ctx.login(&Credentials::login("root@shop.test", "secret")).await;

    assert_eq!(outcome, AuthOutcome::Succeeded);
    assert_eq!(ctx.session().role(), Role::Admin);
    assert_eq!(ctx.client_state().token().as_deref(), Some("adm"));
    assert!(ctx.current_location().unwrap().is(names::ADMIN));

    let loc = ctx.navigate("/login").await;
    assert!(loc.is(names::HOME));
    assert_eq!(loc.redirected_from.as_deref(), Some("/login"));
}

#[tokio::test]
async fn check_session_401_always_ends_the_session() {
    for admin in [false, true] {
        let backend = Arc::new(ScriptedBackend::new());
        backend
            .on(
                Method::GET,
                "/api/user-name",
                Canned::json(200, json!({"data": {"name": "Dana", "isAdmin": admin}})),
            )
            .on(Method::GET, "/api/user-name", Canned::json(401, json!({"message": "Unauthenticated."})));
        let area: Arc<dyn StorageArea> = Arc::new(InMemoryArea::with_items([("token", "abc"), ("carts", "[]")]));
        let ctx = context_with(backend, area.clone());

        assert!(ctx.check_session().await.is_signed_in());
        assert_eq!(ctx.check_session().await, Role::Anonymous);

        assert!(area.get_item("token").is_none());
        assert!(area.get_item("carts").is_none());
        assert_eq!(ctx.session().name(), "");
    }
}

#[tokio::test]
async fn admin_routes_by_role() {
    // Anonymous
    let ctx = context(Arc::new(ScriptedBackend::new()));
    assert!(ctx.navigate("/admin").await.is(names::LOGIN));

    // Signed in, not an admin
    let backend = Arc::new(ScriptedBackend::new());
    backend.on(Method::GET, "/api/user-name", Canned::json(200, json!({"data": {"name": "Eve"}})));
    let area: Arc<dyn StorageArea> = Arc::new(InMemoryArea::with_items([("token", "t")]));
    let ctx = context_with(backend, area);
    let loc = ctx.navigate("/admin/products").await;
    assert!(loc.is(names::NOT_FOUND));
    assert_eq!(loc.redirected_from.as_deref(), Some("/admin/products"));

    // Admin
    let backend = Arc::new(ScriptedBackend::new());
    backend.on(
        Method::GET,
        "/api/user-name",
        Canned::json(200, json!({"data": {"name": "Root", "isAdmin": true}})),
    );
    let area: Arc<dyn StorageArea> = Arc::new(InMemoryArea::with_items([("token", "t")]));
    let ctx = context_with(backend, area);
    let loc = ctx.navigate("/admin/products").await;
    assert!(loc.is(names::ADMIN_PRODUCTS));
    assert!(loc.redirected_from.is_none());
}

#[tokio::test]
async fn logout_without_token_makes_no_call() {
    let backend = Arc::new(ScriptedBackend::new());
    let ctx = context(backend.clone());

    let outcome = ctx.logout().await;

    assert!(outcome.is_success());
    assert_eq!(backend.request_count(), 0);
    assert_eq!(ctx.session().role(), Role::Anonymous);
    assert!(ctx.current_location().unwrap().is(names::LOGIN));
}

#[tokio::test]
async fn persisted_admin_token_is_confirmed_as_alice() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.on(Method::GET, "/api/user-name", Canned::json(200, json!({"name": "Alice", "isAdmin": true})));
    let area: Arc<dyn StorageArea> = Arc::new(InMemoryArea::with_items([("token", "abc")]));
    let ctx = context_with(backend.clone(), area);

    assert_eq!(ctx.check_session().await, Role::Admin);
    assert_eq!(ctx.session().name(), "Alice");

    let req = backend.last_request().unwrap();
    assert_eq!(req.headers.get(http::header::AUTHORIZATION).unwrap(), "Bearer abc");
}

#[tokio::test]
async fn unprocessable_login_exposes_field_errors() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.on(
        Method::POST,
        "/api/login",
        Canned::json(422, json!({"message": "The given data was invalid.", "errors": {"email": ["invalid"]}})),
    );
    let ctx = context(backend);

    let outcome = ctx.login(&Credentials::login("nope", "pw")).await;

    assert_eq!(ctx.session().role(), Role::Anonymous);
    let errors = ctx.session().field_errors();
    assert_eq!(errors.get("email"), Some(&["invalid".to_string()][..]));
    assert!(matches!(outcome, AuthOutcome::Invalid(e) if e == errors));

    let toast = ctx.notifier().last().unwrap();
    assert_eq!(toast.severity, Severity::Error);
    assert_eq!(toast.detail, "The given data was invalid.");
}

#[tokio::test]
async fn full_round_trip_ends_on_login() {
    let backend = Arc::new(ScriptedBackend::new());
    admin_login(&backend);
    backend.on(Method::DELETE, "/api/logout", Canned::new(204));
    let ctx = context(backend.clone());

    ctx.login(&Credentials::login("root@shop.test", "secret")).await;
    let mut nav = ctx.navigator().subscribe();
    ctx.logout().await;

    assert!(ctx.client_state().token().is_none());
    assert_eq!(ctx.session().role(), Role::Anonymous);
    let event = nav.recv().await.unwrap();
    assert!(event.to.is(names::LOGIN));
    assert!(event.from.unwrap().is(names::ADMIN));

    let methods: Vec<Method> = backend.requests().into_iter().map(|r| r.method).collect();
    assert!(methods.contains(&Method::DELETE));
}

#[tokio::test]
async fn logout_empties_the_cart() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.on(Method::DELETE, "/api/logout", Canned::json(200, json!({"message": "bye"})));
    let area: Arc<dyn StorageArea> = Arc::new(InMemoryArea::with_items([("token", "t")]));
    let ctx = context_with(backend, area);

    ctx.cart()
        .add(storefront_engine::CartItem::new("p1", "Dune", 12.5), 2)
        .unwrap();
    assert_eq!(ctx.cart().total(), 25.0);

    ctx.logout().await;

    assert!(ctx.cart().is_empty());
}

#[tokio::test]
async fn admin_keeps_admin_routes_after_name_only_session_checks() {
    let backend = Arc::new(ScriptedBackend::new());
    admin_login(&backend);
    let ctx = context(backend.clone());

    ctx.login(&Credentials::login("root@shop.test", "secret")).await;
    assert!(ctx.current_location().unwrap().is(names::ADMIN));

    for (path, name) in [
        ("/admin/products", names::ADMIN_PRODUCTS),
        ("/admin/orders", names::ADMIN_ORDERS),
    ] {
        let loc = ctx.navigate(path).await;
        assert!(loc.is(name), "{path} landed on {}", loc.name);
        assert!(loc.redirected_from.is_none());
    }
    assert_eq!(ctx.session().role(), Role::Admin);
    assert_eq!(ctx.session().name(), "Root");

    let checks = backend
        .requests()
        .into_iter()
        .filter(|r| r.url.path() == "/api/user-name")
        .count();
    assert_eq!(checks, 3);
}

#[tokio::test]
async fn logout_without_token_clears_the_persisted_cart() {
    let backend = Arc::new(ScriptedBackend::new());
    let area: Arc<dyn StorageArea> = Arc::new(InMemoryArea::with_items([(
        "carts",
        r#"[{"product_id":"p1","name":"Dune","price":12.5,"quantity":1}]"#,
    )]));
    let ctx = context_with(backend.clone(), area.clone());
    assert_eq!(ctx.cart().len(), 1);

    assert!(ctx.logout().await.is_success());

    assert!(ctx.client_state().cart_json().is_none());
    assert!(area.get_item("carts").is_none());
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test]
async fn redirect_cycles_end_on_not_found() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.on(Method::GET, "/api/user-name", Canned::json(200, json!({"data": {"name": "Eve"}})));
    let area: Arc<dyn StorageArea> = Arc::new(InMemoryArea::with_items([("token", "t")]));

    // A signed-in user is sent to `home`, which only admits anonymous users.
    let mut routes = RouteTable::storefront();
    routes.add(Route::new(names::HOME, "/", RouteMeta::anonymous()));
    let ctx = AppContext::builder()
        .backend(backend)
        .storage(area)
        .routes(routes)
        .build()
        .unwrap();

    let loc = ctx.navigate("/").await;

    assert!(loc.is(names::NOT_FOUND));
    assert_eq!(loc.redirected_from.as_deref(), Some("/"));
    assert!(ctx.current_location().unwrap().is(names::NOT_FOUND));
}
