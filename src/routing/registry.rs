//! Route table construction from the schema document.

use std::sync::Arc;

use axum::http::Method;
use axum::routing::MethodFilter;

use crate::routing::template::{PathTemplate, RouteError};
use crate::schema::document::SchemaDocument;

/// One proxy route: a bound (method, path template, origin) triple.
///
/// Created at startup, immutable, shared by the handler closed over it.
#[derive(Debug)]
pub struct ProxyRoute {
    /// HTTP method this route accepts.
    pub method: Method,

    /// Method filter used when registering the axum route.
    pub filter: MethodFilter,

    /// Compiled path template.
    pub template: PathTemplate,

    /// Origin base URL the substituted path is appended to.
    pub origin_base_url: String,
}

/// Immutable table of proxy routes, one per (method, path) pair surviving
/// filtering. Consulted only while building the axum router.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Arc<ProxyRoute>>,
}

impl RouteTable {
    /// Enumerate every (path template, method) pair of the document and
    /// compile one route per pair.
    ///
    /// Path-item keys that are not HTTP methods (`parameters`, `summary`,
    /// `$ref`, ...) are skipped; they describe operations, they are not
    /// operations.
    pub fn from_schema(
        document: &SchemaDocument,
        origin_base_url: &str,
    ) -> Result<Self, RouteError> {
        let mut routes = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for (path, operations) in document.paths() {
            let template = PathTemplate::compile(path)?;
            for method_key in operations.keys() {
                let Some((method, filter)) = recognize_method(method_key) else {
                    tracing::debug!(key = %method_key, path = %path, "Skipping non-method path item key");
                    continue;
                };

                // Exactly one route per (method, path) pair; a document
                // carrying both `get` and `GET` keys collapses to one.
                if !seen.insert((method.clone(), path.to_string())) {
                    tracing::warn!("Duplicate operation {} {} ignored", method, path);
                    continue;
                }

                tracing::info!("Registered route {} {}", method, path);
                routes.push(Arc::new(ProxyRoute {
                    method,
                    filter,
                    template: template.clone(),
                    origin_base_url: origin_base_url.to_string(),
                }));
            }
        }

        Ok(Self { routes })
    }

    /// Iterate over the routes.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<ProxyRoute>> {
        self.routes.iter()
    }

    /// Number of routes in the table.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// True when the table holds no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Map an OpenAPI path-item key to an HTTP method, case-insensitively.
/// Returns `None` for keys that are not operations.
fn recognize_method(key: &str) -> Option<(Method, MethodFilter)> {
    match key.to_uppercase().as_str() {
        "GET" => Some((Method::GET, MethodFilter::GET)),
        "PUT" => Some((Method::PUT, MethodFilter::PUT)),
        "POST" => Some((Method::POST, MethodFilter::POST)),
        "DELETE" => Some((Method::DELETE, MethodFilter::DELETE)),
        "OPTIONS" => Some((Method::OPTIONS, MethodFilter::OPTIONS)),
        "HEAD" => Some((Method::HEAD, MethodFilter::HEAD)),
        "PATCH" => Some((Method::PATCH, MethodFilter::PATCH)),
        "TRACE" => Some((Method::TRACE, MethodFilter::TRACE)),
        _ => None,
    }
}
