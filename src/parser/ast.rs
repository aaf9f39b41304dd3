// Structural records extracted from source files
//
// These are the facts the analyzer links together: functions, components,
// routes and database queries. All of them serialize into the snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP method of a route or client call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Head,
    All,
}

impl HttpMethod {
    /// Parse a method name case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "patch" => Some(Self::Patch),
            "delete" | "del" => Some(Self::Delete),
            "options" => Some(Self::Options),
            "head" => Some(Self::Head),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::All => "ALL",
        }
    }

    /// Whether a route registered with `self` serves a request with `other`
    pub fn accepts(&self, other: HttpMethod) -> bool {
        *self == HttpMethod::All || *self == other
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A top-level function declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    /// Declaring file, relative to the project root
    pub file: String,
    /// Parameter names as written (best-effort)
    pub params: Vec<String>,
    pub exported: bool,
    pub is_async: bool,
    pub line: usize,
    /// Callee expressions found in the body, in order of first appearance
    pub calls: Vec<String>,
    /// HTTP client calls made in the body, always unlinked
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_calls: Vec<ApiCall>,
}

impl FunctionInfo {
    pub fn new(name: &str, file: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            file: file.to_string(),
            params: Vec::new(),
            exported: false,
            is_async: false,
            line,
            calls: Vec::new(),
            api_calls: Vec::new(),
        }
    }

    /// Signature-like summary, e.g. `async getUsers(req, res)`
    pub fn signature(&self) -> String {
        let prefix = if self.is_async { "async " } else { "" };
        format!("{}{}({})", prefix, self.name, self.params.join(", "))
    }
}

/// Whether a component is UI or a service module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Ui,
    Service,
}

/// Resolution state of a client call against the known routes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RouteLink {
    Linked {
        file: String,
        method: HttpMethod,
        path: String,
    },
    Unlinked,
}

impl RouteLink {
    pub fn is_linked(&self) -> bool {
        matches!(self, RouteLink::Linked { .. })
    }
}

/// An outbound HTTP client call made by a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCall {
    /// Method when recoverable from the call site
    pub method: Option<HttpMethod>,
    /// Normalized URL path
    pub url: String,
    pub line: usize,
    pub route: RouteLink,
    /// Invoked function the call was reached through, when not made directly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
}

impl ApiCall {
    pub fn new(method: Option<HttpMethod>, url: &str, line: usize) -> Self {
        Self {
            method,
            url: url.to_string(),
            line,
            route: RouteLink::Unlinked,
            via: None,
        }
    }
}

/// A UI component or service module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub name: String,
    pub file: String,
    pub kind: ComponentKind,
    pub line: usize,
    /// Identifiers invoked inside the component
    pub invokes: Vec<String>,
    pub api_calls: Vec<ApiCall>,
}

/// Resolution state of a route's handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HandlerLink {
    Linked { file: String, function: String },
    Unlinked,
}

impl HandlerLink {
    pub fn is_linked(&self) -> bool {
        matches!(self, HandlerLink::Linked { .. })
    }
}

/// Marker used as handler name for inline function handlers
pub const INLINE_HANDLER: &str = "<inline>";

/// A registered HTTP route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub method: HttpMethod,
    pub path: String,
    pub file: String,
    pub line: usize,
    /// Handler expression as written, or `<inline>`
    pub handler: String,
    /// Middleware identifiers registered before the handler
    pub middleware: Vec<String>,
    /// Calls made by an inline handler
    pub invokes: Vec<String>,
    pub handler_link: HandlerLink,
    /// Indices into the snapshot's query list reached through the handler
    pub query_ids: Vec<usize>,
}

impl RouteInfo {
    pub fn new(method: HttpMethod, path: &str, file: &str, line: usize, handler: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            file: file.to_string(),
            line,
            handler: handler.to_string(),
            middleware: Vec::new(),
            invokes: Vec::new(),
            handler_link: HandlerLink::Unlinked,
            query_ids: Vec::new(),
        }
    }

    /// `GET /users`
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn is_inline(&self) -> bool {
        self.handler == INLINE_HANDLER
    }
}

/// Kind of database operation, inferred from the call site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryOperation {
    Read,
    Write,
    Delete,
}

impl QueryOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for QueryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A database access call site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseQuery {
    pub file: String,
    /// Enclosing top-level function, when there is one
    pub function: Option<String>,
    pub operation: QueryOperation,
    /// Table or collection, if recoverable
    pub table: Option<String>,
    /// Call expression summary, e.g. `User.find`
    pub call: String,
    pub line: usize,
}

/// Everything extracted from one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileExtraction {
    pub functions: Vec<FunctionInfo>,
    pub components: Vec<ComponentInfo>,
    pub routes: Vec<RouteInfo>,
    pub queries: Vec<DatabaseQuery>,
    pub env_vars: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_parse() {
        assert_eq!(HttpMethod::parse("get"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("DELETE"), Some(HttpMethod::Delete));
        assert_eq!(HttpMethod::parse("del"), Some(HttpMethod::Delete));
        assert_eq!(HttpMethod::parse("fetch"), None);
    }

    #[test]
    fn test_http_method_accepts() {
        assert!(HttpMethod::All.accepts(HttpMethod::Post));
        assert!(HttpMethod::Get.accepts(HttpMethod::Get));
        assert!(!HttpMethod::Get.accepts(HttpMethod::Post));
    }

    #[test]
    fn test_function_signature() {
        let mut func = FunctionInfo::new("getUsers", "services/users.js", 3);
        func.is_async = true;
        func.params = vec!["req".to_string(), "res".to_string()];
        assert_eq!(func.signature(), "async getUsers(req, res)");
    }

    #[test]
    fn test_route_label() {
        let route = RouteInfo::new(HttpMethod::Post, "/users", "routes/users.js", 4, "createUser");
        assert_eq!(route.label(), "POST /users");
        assert!(!route.is_inline());
        assert!(!route.handler_link.is_linked());
    }

    #[test]
    fn test_link_serialization() {
        let link = HandlerLink::Linked {
            file: "services/users.js".to_string(),
            function: "getUsers".to_string(),
        };
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["status"], "linked");
        assert_eq!(json["function"], "getUsers");

        let unlinked = serde_json::to_value(RouteLink::Unlinked).unwrap();
        assert_eq!(unlinked["status"], "unlinked");
    }

    #[test]
    fn test_method_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&HttpMethod::Get).unwrap(), "\"GET\"");
        assert_eq!(serde_json::to_string(&QueryOperation::Write).unwrap(), "\"write\"");
    }
}
