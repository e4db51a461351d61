//! Route registry and request resolution.
//!
//! A [`Resolver`] is built once at startup and then only read. Resolution
//! takes `&self` and keeps every piece of per-request state on the stack,
//! so one resolver can serve any number of concurrent requests.
//!
//! # Resolution order
//!
//! Routes are kept sorted by the *source text* of their compiled pattern,
//! descending, and the first route whose method and pattern match wins.
//! String ordering puts `/items/all` ahead of `/items/<id>` and
//! `/items/<id>` ahead of `/items`, which is usually what you want, but it
//! is string ordering and not a specificity score. Routes with equal source
//! text keep registration order.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::cors::CorsConfig;
use crate::error::Error;
use crate::event::{InvocationContext, ProxyEvent};
use crate::headers::Headers;
use crate::method::Method;
use crate::middleware;
use crate::problem::{MIME_TYPE, ProblemDocument};
use crate::request::{Context, Request};
use crate::response::{ProxyResponse, Response};
use crate::route::{Registrar, Route, RouteDef};
use crate::router::Router;

const NOT_FOUND_DETAIL: &str = "No route found for the HTTP path";

/// Resolver settings, deserialisable from `{"cors": {...}, "stripPrefixes": [...]}`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolverConfig {
    /// When set, routes default to CORS-enabled and `OPTIONS` preflights
    /// are answered.
    pub cors: Option<CorsConfig>,
    /// Leading path segments removed before matching. First match wins.
    pub strip_prefixes: Vec<String>,
}

/// The application resolver.
///
/// ```rust
/// use proxy_router::{
///     CorsConfig, Error, InvocationContext, ProxyEvent, Registrar, Request, Resolver, Response,
/// };
///
/// async fn get_item(req: Request) -> Result<Response, Error> {
///     Ok(Response::json(format!(r#"{{"id":"{}"}}"#, req.param("id").unwrap_or_default())))
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut app = Resolver::new()
///     .with_cors(CorsConfig::new())
///     .strip_prefixes(["/prod"]);
/// app.get("/items/<id>").to(get_item);
///
/// let event = ProxyEvent::new("GET", "/prod/items/7");
/// let response = app.resolve(event, InvocationContext::default()).await.unwrap();
/// assert_eq!(response.status_code, 200);
/// assert_eq!(response.body, r#"{"id":"7"}"#);
/// # }
/// ```
pub struct Resolver {
    routes: Vec<Route>,
    route_keys: BTreeSet<String>,
    cors: Option<CorsConfig>,
    cors_methods: Vec<Method>,
    strip_prefixes: Vec<String>,
    context: Arc<Context>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::with_config(ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            routes: Vec::new(),
            route_keys: BTreeSet::new(),
            cors: config.cors,
            cors_methods: vec![Method::Options],
            strip_prefixes: config.strip_prefixes,
            context: Arc::new(Context::new()),
        }
    }

    /// Sets the CORS policy. Call before registering routes: a route picks
    /// up the CORS default at registration time.
    pub fn with_cors(mut self, cors: CorsConfig) -> Self {
        self.cors = Some(cors);
        self
    }

    pub fn strip_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.strip_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn cors(&self) -> Option<&CorsConfig> {
        self.cors.as_ref()
    }

    /// Routes in resolution order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// `"<METHOD>_<rule>"` per registered route, `"<rule>"` per included one.
    pub fn route_keys(&self) -> impl Iterator<Item = &str> {
        self.route_keys.iter().map(String::as_str)
    }

    /// Methods advertised in `Access-Control-Allow-Methods`: `OPTIONS` plus
    /// the method of every CORS-enabled route, repeats included.
    pub fn cors_methods(&self) -> &[Method] {
        &self.cors_methods
    }

    /// Mounts every route of `router` under `prefix`.
    ///
    /// Each rule is recompiled as `prefix + rule`. A prefix of `/` or `""`
    /// mounts the rules unchanged.
    pub fn include_routes(&mut self, router: &Router, prefix: &str) {
        for def in router.routes() {
            let rule = match prefix {
                "" | "/" => def.rule.clone(),
                _ => format!("{prefix}{}", def.rule),
            };
            self.push_route(def, &rule);
            self.route_keys.insert(def.rule.clone());
        }
        self.sort_routes();
    }

    /// Merges `additional` into the context shared with handlers. Keys
    /// already present take the new value; an empty map changes nothing.
    pub fn append_context(&mut self, additional: Context) {
        if additional.is_empty() {
            return;
        }
        Arc::make_mut(&mut self.context).extend(additional);
    }

    pub fn clear_context(&mut self) {
        Arc::make_mut(&mut self.context).clear();
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Routes one proxy event and builds the wire response.
    ///
    /// A request that matches nothing yields a `404` problem document, or a
    /// `204` preflight answer for `OPTIONS` when CORS is configured. Handler
    /// and middleware errors are returned unchanged.
    pub async fn resolve(
        &self,
        event: ProxyEvent,
        invocation: InvocationContext,
    ) -> Result<ProxyResponse, Error> {
        event.validate()?;
        let event = Arc::new(event);
        let method = event.http_method.to_ascii_uppercase();
        let path = match self.strip_prefix(&event.path) {
            "" => "/",
            path => path,
        };

        let matched = method.parse::<Method>().ok().and_then(|method| {
            self.routes.iter().find_map(|route| {
                if !route.matches_method(method) {
                    return None;
                }
                route.pattern.captures(path).map(|args| (route, args))
            })
        });

        match matched {
            Some((route, args)) => {
                debug!(%method, path, rule = route.pattern.rule(), "route matched");
                self.call_route(route, event, invocation, args).await
            }
            None => {
                debug!(%method, path, "no route matched");
                self.not_found(&method)?.build(&event, None, self.cors.as_ref())
            }
        }
    }

    /// [`resolve`](Self::resolve), with any error turned into a `500`
    /// problem document. This is the boundary a hosting shim should call.
    pub async fn handle(&self, event: ProxyEvent, invocation: InvocationContext) -> ProxyResponse {
        match self.resolve(event, invocation).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "request failed");
                internal_error(&format!("Error handling request: {e}"))
            }
        }
    }

    async fn call_route(
        &self,
        route: &Route,
        event: Arc<ProxyEvent>,
        invocation: InvocationContext,
        args: HashMap<String, String>,
    ) -> Result<ProxyResponse, Error> {
        let req = Request::new(
            Arc::clone(&event),
            Arc::new(invocation),
            args,
            Arc::clone(&self.context),
        );
        let reply = middleware::dispatch(&route.middlewares, &route.handler, req).await?;
        reply.to_response()?.build(&event, Some(route), self.cors.as_ref())
    }

    /// The response for a request no route claimed.
    fn not_found(&self, method: &str) -> Result<Response, Error> {
        let mut headers = Headers::new();
        if let Some(cors) = &self.cors {
            headers = cors.headers();
            if method == Method::Options.as_str() {
                headers.insert("Access-Control-Allow-Methods".to_owned(), self.allow_methods());
                return Ok(Response::new(204, None, "", headers));
            }
        }

        let problem = ProblemDocument::not_found(NOT_FOUND_DETAIL);
        Ok(Response::new(404, Some(MIME_TYPE), serde_json::to_string(&problem)?, headers))
    }

    fn allow_methods(&self) -> String {
        let unique: BTreeSet<&str> = self.cors_methods.iter().map(|m| m.as_str()).collect();
        unique.into_iter().collect::<Vec<_>>().join(",")
    }

    /// Removes the first configured prefix `path` starts with. A path equal
    /// to a prefix becomes `/`.
    fn strip_prefix<'p>(&self, path: &'p str) -> &'p str {
        for prefix in &self.strip_prefixes {
            if path == prefix {
                return "/";
            }
            if let Some(rest) = path.strip_prefix(prefix.as_str()) {
                return rest;
            }
        }
        path
    }

    /// Appends one compiled route per method of `def`, matching `rule`.
    fn push_route(&mut self, def: &RouteDef, rule: &str) {
        assert!(!def.methods.is_empty(), "route `{}` has no HTTP methods", def.rule);
        let cors = def.cors.unwrap_or(self.cors.is_some());
        for method in def.methods.iter() {
            self.routes.push(Route::compile(def, rule, method, cors));
            if cors {
                self.cors_methods.push(method);
            }
            debug!(%method, rule, cors, compress = def.compress, "route registered");
        }
    }

    /// Descending by pattern source. `sort_by` is stable, so equal sources
    /// stay in registration order.
    fn sort_routes(&mut self) {
        self.routes.sort_by(|a, b| b.pattern.cmp(&a.pattern));
    }
}

impl Registrar for Resolver {
    fn register_route(&mut self, route: RouteDef) {
        for method in route.methods.iter() {
            let key = format!("{method}_{}", route.rule);
            if !self.route_keys.insert(key) {
                warn!(%method, rule = %route.rule, "route registered more than once");
            }
        }
        self.push_route(&route, &route.rule);
        self.sort_routes();
    }
}

impl Default for Resolver {
    fn default() -> Self { Self::new() }
}

/// A `500` problem-document response, built without any fallible step.
pub fn internal_error(detail: &str) -> ProxyResponse {
    let problem = ProblemDocument::internal_server_error(detail);
    let mut headers = Headers::new();
    headers.insert("Content-Type".to_owned(), MIME_TYPE.to_owned());
    ProxyResponse {
        status_code: problem.status,
        body: serde_json::to_string(&problem).unwrap_or_default(),
        is_base64_encoded: false,
        headers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Reply;

    async fn ok(_req: Request) -> Result<Reply, Error> {
        Ok(Reply::Response(Response::status(200)))
    }

    #[test]
    fn strip_prefix_rules() {
        let app = Resolver::new().strip_prefixes(["/base-path", "/base"]);
        assert_eq!(app.strip_prefix("/base-path"), "/");
        assert_eq!(app.strip_prefix("/base-path/v1/x"), "/v1/x");
        assert_eq!(app.strip_prefix("/base/v1"), "/v1");
        assert_eq!(app.strip_prefix("/other"), "/other");
    }

    #[test]
    fn routes_stay_sorted_by_source_descending() {
        let mut app = Resolver::new();
        app.add_route(Method::Get, "/single", ok)
            .add_route(Method::Get, "/single/<id>", ok)
            .add_route(Method::Get, "/single/test", ok);
        let rules: Vec<_> = app.routes().iter().map(|r| r.pattern.rule()).collect();
        assert_eq!(rules, ["/single/test", "/single/<id>", "/single"]);
    }

    #[test]
    fn multi_method_registration_fans_out() {
        let mut app = Resolver::new().with_cors(CorsConfig::new());
        app.add_route([Method::Get, Method::Post], "/items", ok);
        assert_eq!(app.routes().len(), 2);
        assert!(app.routes().iter().all(|r| r.methods.len() == 1 && r.cors));
        assert_eq!(app.cors_methods(), [Method::Options, Method::Get, Method::Post]);
        assert_eq!(app.route_keys().collect::<Vec<_>>(), ["GET_/items", "POST_/items"]);
    }

    #[test]
    #[should_panic(expected = "has no HTTP methods")]
    fn empty_method_set_is_rejected() {
        let mut app = Resolver::new();
        app.add_route(Vec::<Method>::new(), "/nothing", ok);
    }

    #[test]
    fn allow_methods_sorted_and_unique() {
        let mut app = Resolver::new().with_cors(CorsConfig::new());
        app.add_route(Method::Post, "/a", ok)
            .add_route(Method::Get, "/b", ok)
            .add_route(Method::Post, "/c", ok);
        assert_eq!(app.allow_methods(), "GET,OPTIONS,POST");
    }
}
