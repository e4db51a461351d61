//! Sub-routers.
//!
//! A [`Router`] collects routes without compiling them, so a feature can
//! define its routes on its own and be mounted later under any prefix with
//! [`Resolver::include_routes`](crate::Resolver::include_routes). Mounting
//! is a one-time merge at startup: afterwards the mounted routes are
//! ordinary resolver routes.
//!
//! ```rust
//! use proxy_router::{Error, Registrar, Request, Resolver, Response, Router};
//!
//! async fn one(_req: Request) -> Result<Response, Error> { Ok(Response::text("one")) }
//!
//! let mut v1 = Router::new();
//! v1.get("/multi/one").to(one);
//!
//! let mut app = Resolver::new();
//! app.include_routes(&v1, "/v1");      // answers GET /v1/multi/one
//! ```

use tracing::debug;

use crate::route::{Registrar, RouteDef};

/// A standalone set of routes, mountable into a [`Resolver`](crate::Resolver).
#[derive(Clone, Debug, Default)]
pub struct Router {
    routes: Vec<RouteDef>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Routes in registration order, rules as written.
    pub fn routes(&self) -> &[RouteDef] {
        &self.routes
    }
}

impl Registrar for Router {
    fn register_route(&mut self, route: RouteDef) {
        assert!(!route.methods.is_empty(), "route `{}` has no HTTP methods", route.rule);
        debug!(rule = %route.rule, methods = route.methods.len(), "sub-router route registered");
        self.routes.push(route);
    }
}
