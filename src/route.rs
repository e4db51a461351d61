//! Routes and the registration surface shared by both routers.
//!
//! There are two ways to register a route, and both end in the same
//! [`Registrar::register_route`] call.
//!
//! **Imperative**: describe the route completely, then hand it over:
//!
//! ```rust
//! use proxy_router::{Error, Method, Registrar, Resolver, Request, Response, RouteDef};
//!
//! async fn list(_req: Request) -> Result<Response, Error> { Ok(Response::json("[]")) }
//!
//! let mut app = Resolver::new();
//! app.register_route(RouteDef::new([Method::Get, Method::Head], "/items", list).compress(true));
//! app.add_route(Method::Get, "/items/all", list);
//! ```
//!
//! **Declarative**: options first, handler last, in the spirit of a
//! decorator sitting on top of a function:
//!
//! ```rust
//! use proxy_router::{Error, Registrar, Resolver, Request, Response};
//!
//! async fn show(req: Request) -> Result<Response, Error> {
//!     Ok(Response::json(format!(r#"{{"id":"{}"}}"#, req.param("id").unwrap_or_default())))
//! }
//!
//! let mut app = Resolver::new();
//! app.get("/items/<id>")
//!     .cache_control("max-age=60")
//!     .to(show);
//! ```

use std::fmt;

use crate::handler::{BoxedHandler, Handler};
use crate::method::{Method, Methods};
use crate::middleware::{BoxedMiddleware, Middleware};
use crate::pattern::Pattern;

/// A route as registered: rule text not yet compiled, CORS not yet resolved
/// against a resolver default.
#[derive(Clone)]
pub struct RouteDef {
    pub(crate) methods: Methods,
    pub(crate) rule: String,
    pub(crate) handler: BoxedHandler,
    pub(crate) cors: Option<bool>,
    pub(crate) compress: bool,
    pub(crate) cache_control: Option<String>,
    pub(crate) middlewares: Vec<BoxedMiddleware>,
}

impl RouteDef {
    pub fn new(methods: impl Into<Methods>, rule: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            methods: methods.into(),
            rule: rule.into(),
            handler: handler.into_boxed_handler(),
            cors: None,
            compress: false,
            cache_control: None,
            middlewares: Vec::new(),
        }
    }

    /// Overrides the resolver's CORS default for this route.
    pub fn cors(mut self, enabled: bool) -> Self {
        self.cors = Some(enabled);
        self
    }

    /// Gzip the body when the client accepts it.
    pub fn compress(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// `Cache-Control` value for `200` responses. Other statuses get `no-cache`.
    pub fn cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    /// Appends a middleware. The first one added runs outermost.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(middleware.into_boxed_middleware());
        self
    }

    pub fn methods(&self) -> &Methods { &self.methods }
    pub fn rule(&self) -> &str { &self.rule }
    pub fn cors_override(&self) -> Option<bool> { self.cors }
}

impl fmt::Debug for RouteDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDef")
            .field("methods", &self.methods)
            .field("rule", &self.rule)
            .field("cors", &self.cors)
            .field("compress", &self.compress)
            .field("cache_control", &self.cache_control)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// A compiled route inside a [`Resolver`](crate::Resolver). Immutable once
/// registered.
#[derive(Clone)]
pub struct Route {
    pub methods: Methods,
    pub pattern: Pattern,
    pub cors: bool,
    pub compress: bool,
    pub cache_control: Option<String>,
    pub(crate) handler: BoxedHandler,
    pub(crate) middlewares: Vec<BoxedMiddleware>,
}

impl Route {
    /// Compiles `def` for one method, with CORS resolved to a concrete flag.
    ///
    /// # Panics
    ///
    /// Panics if the rule cannot be compiled. Route tables are fixed at
    /// startup, so a bad rule is a programming error.
    pub(crate) fn compile(def: &RouteDef, rule: &str, method: Method, cors: bool) -> Self {
        let pattern = Pattern::compile(rule).unwrap_or_else(|e| panic!("{e}"));
        Self {
            methods: method.into(),
            pattern,
            cors,
            compress: def.compress,
            cache_control: def.cache_control.clone(),
            handler: def.handler.clone(),
            middlewares: def.middlewares.clone(),
        }
    }

    pub fn matches_method(&self, method: Method) -> bool {
        self.methods.contains(method)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("methods", &self.methods)
            .field("pattern", &self.pattern)
            .field("cors", &self.cors)
            .field("compress", &self.compress)
            .field("cache_control", &self.cache_control)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

// ── Registrar ─────────────────────────────────────────────────────────────────

/// The registration surface of [`Resolver`](crate::Resolver) and
/// [`Router`](crate::Router).
pub trait Registrar {
    /// The single registration routine every other method funnels into.
    ///
    /// # Panics
    ///
    /// Panics if the route has no methods.
    fn register_route(&mut self, route: RouteDef);

    /// Registers `handler` for `methods` + `rule` with default options.
    fn add_route(
        &mut self,
        methods: impl Into<Methods>,
        rule: &str,
        handler: impl Handler,
    ) -> &mut Self
    where
        Self: Sized,
    {
        self.register_route(RouteDef::new(methods, rule, handler));
        self
    }

    /// Starts a declarative registration for `rule` answering `methods`.
    fn route(&mut self, rule: &str, methods: impl Into<Methods>) -> RouteBuilder<'_, Self>
    where
        Self: Sized,
    {
        RouteBuilder::new(self, rule, methods.into())
    }

    fn get(&mut self, rule: &str) -> RouteBuilder<'_, Self> where Self: Sized {
        self.route(rule, Method::Get)
    }

    fn post(&mut self, rule: &str) -> RouteBuilder<'_, Self> where Self: Sized {
        self.route(rule, Method::Post)
    }

    fn put(&mut self, rule: &str) -> RouteBuilder<'_, Self> where Self: Sized {
        self.route(rule, Method::Put)
    }

    fn patch(&mut self, rule: &str) -> RouteBuilder<'_, Self> where Self: Sized {
        self.route(rule, Method::Patch)
    }

    fn delete(&mut self, rule: &str) -> RouteBuilder<'_, Self> where Self: Sized {
        self.route(rule, Method::Delete)
    }
}

/// A pending declarative registration. Options first, then [`to`](Self::to)
/// binds the handler and registers the route.
#[must_use = "a route is only registered once `.to(handler)` is called"]
pub struct RouteBuilder<'a, R: Registrar> {
    registrar: &'a mut R,
    methods: Methods,
    rule: String,
    cors: Option<bool>,
    compress: bool,
    cache_control: Option<String>,
    middlewares: Vec<BoxedMiddleware>,
}

impl<'a, R: Registrar> RouteBuilder<'a, R> {
    fn new(registrar: &'a mut R, rule: &str, methods: Methods) -> Self {
        Self {
            registrar,
            methods,
            rule: rule.to_owned(),
            cors: None,
            compress: false,
            cache_control: None,
            middlewares: Vec::new(),
        }
    }

    pub fn cors(mut self, enabled: bool) -> Self {
        self.cors = Some(enabled);
        self
    }

    pub fn compress(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    pub fn cache_control(mut self, value: impl Into<String>) -> Self {
        self.cache_control = Some(value.into());
        self
    }

    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(middleware.into_boxed_middleware());
        self
    }

    /// Binds `handler` and registers the route.
    pub fn to(self, handler: impl Handler) -> &'a mut R {
        let route = RouteDef {
            methods: self.methods,
            rule: self.rule,
            handler: handler.into_boxed_handler(),
            cors: self.cors,
            compress: self.compress,
            cache_control: self.cache_control,
            middlewares: self.middlewares,
        };
        self.registrar.register_route(route);
        self.registrar
    }
}
