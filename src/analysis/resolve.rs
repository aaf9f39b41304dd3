// Cross-file resolution pass
//
// Linking is heuristic and name-based. A route handler links to the first
// function with the same name, preferring the route's own file and then
// files in path order. A client call links to the first route whose method
// and path match, exact before suffix. A component also reaches the calls
// made inside the functions it invokes. Anything that cannot be linked stays
// `Unlinked` and is still rendered downstream.

use crate::analysis::CodebaseAnalysis;
use crate::parser::{ApiCall, ComponentInfo, FunctionInfo, HandlerLink, RouteInfo, RouteLink};
use std::collections::HashSet;
use tracing::debug;

/// Run every resolution step over a freshly assembled snapshot
pub fn resolve(analysis: &mut CodebaseAnalysis) {
    drop_dangling(analysis);
    link_handlers(analysis);
    link_queries(analysis);
    link_api_calls(analysis);
}

/// Remove records whose declaring file is not part of the snapshot
fn drop_dangling(analysis: &mut CodebaseAnalysis) {
    let known: HashSet<String> = analysis.files.iter().map(|f| f.path.clone()).collect();
    let before = analysis.functions.len()
        + analysis.components.len()
        + analysis.routes.len()
        + analysis.queries.len();

    analysis.functions.retain(|f| known.contains(&f.file));
    analysis.components.retain(|c| known.contains(&c.file));
    analysis.routes.retain(|r| known.contains(&r.file));
    analysis.queries.retain(|q| known.contains(&q.file));

    let after = analysis.functions.len()
        + analysis.components.len()
        + analysis.routes.len()
        + analysis.queries.len();
    if after < before {
        debug!("Dropped {} records with no file in the snapshot", before - after);
    }
}

/// Last segment of a member chain: `users.controller.list` -> `list`
pub fn callee_name(expr: &str) -> &str {
    expr.rsplit('.').next().unwrap_or(expr)
}

/// Find a function by name, same file first, then in snapshot order
pub fn find_function<'a>(
    functions: &'a [FunctionInfo],
    file: &str,
    name: &str,
) -> Option<&'a FunctionInfo> {
    let name = callee_name(name);
    functions
        .iter()
        .find(|f| f.file == file && f.name == name)
        .or_else(|| functions.iter().find(|f| f.name == name))
}

fn link_handlers(analysis: &mut CodebaseAnalysis) {
    let functions = &analysis.functions;
    for route in analysis.routes.iter_mut() {
        route.handler_link = handler_link(functions, route);
        if !route.handler_link.is_linked() {
            debug!("Unlinked handler {} for {}", route.handler, route.label());
        }
    }
}

fn handler_link(functions: &[FunctionInfo], route: &RouteInfo) -> HandlerLink {
    let names: Vec<&str> = if route.is_inline() {
        route.invokes.iter().map(String::as_str).collect()
    } else {
        vec![route.handler.as_str()]
    };

    names
        .into_iter()
        .find_map(|name| find_function(functions, &route.file, name))
        .map(|f| HandlerLink::Linked {
            file: f.file.clone(),
            function: f.name.clone(),
        })
        .unwrap_or(HandlerLink::Unlinked)
}

/// Queries inside the handler, plus inside functions the handler calls
fn link_queries(analysis: &mut CodebaseAnalysis) {
    let functions = &analysis.functions;
    let queries = &analysis.queries;

    let queries_in = |file: &str, function: &str| -> Vec<usize> {
        queries
            .iter()
            .enumerate()
            .filter(|(_, q)| q.file == file && q.function.as_deref() == Some(function))
            .map(|(i, _)| i)
            .collect()
    };

    for route in analysis.routes.iter_mut() {
        let HandlerLink::Linked { file, function } = &route.handler_link else {
            route.query_ids.clear();
            continue;
        };

        let mut ids = queries_in(file, function);
        if let Some(handler) = functions.iter().find(|f| &f.file == file && &f.name == function) {
            for call in &handler.calls {
                if let Some(callee) = find_function(functions, &handler.file, call) {
                    ids.extend(queries_in(&callee.file, &callee.name));
                }
            }
        }

        ids.sort_unstable();
        ids.dedup();
        route.query_ids = ids;
    }
}

fn link_api_calls(analysis: &mut CodebaseAnalysis) {
    let routes = &analysis.routes;
    let functions = &analysis.functions;
    for component in analysis.components.iter_mut() {
        component.api_calls.retain(|call| call.via.is_none());
        let reached = calls_through_invokes(functions, component);
        component.api_calls.extend(reached);

        for call in component.api_calls.iter_mut() {
            call.route = match match_route(routes, call) {
                Some(route) => RouteLink::Linked {
                    file: route.file.clone(),
                    method: route.method,
                    path: route.path.clone(),
                },
                None => {
                    debug!("No route for {} call to {}", component.name, call.url);
                    RouteLink::Unlinked
                }
            };
        }
    }
}

/// Client calls made inside the functions a component invokes
///
/// Each invoked name resolves like a handler does (same file, then snapshot
/// order). Calls already made directly by the component are not repeated.
fn calls_through_invokes(functions: &[FunctionInfo], component: &ComponentInfo) -> Vec<ApiCall> {
    let mut visited = HashSet::new();
    let mut reached = Vec::new();

    for name in &component.invokes {
        let Some(function) = find_function(functions, &component.file, name) else {
            continue;
        };
        if !visited.insert((function.file.as_str(), function.name.as_str())) {
            continue;
        }
        for call in &function.api_calls {
            let direct = function.file == component.file
                && component
                    .api_calls
                    .iter()
                    .any(|own| own.line == call.line && own.url == call.url);
            if direct {
                continue;
            }
            let mut call = call.clone();
            call.route = RouteLink::Unlinked;
            call.via = Some(function.name.clone());
            reached.push(call);
        }
    }

    reached
}

/// First route serving the call: exact path match, then suffix match
///
/// Within each pass a route matched on literal segments wins over one that
/// needed `:param` wildcards, so `/:id` never claims `/api/users` while
/// `/users` exists.
pub fn match_route<'a>(routes: &'a [RouteInfo], call: &ApiCall) -> Option<&'a RouteInfo> {
    let call_segments = segments(&call.url);
    let method_ok = |route: &RouteInfo| match call.method {
        Some(method) => route.method.accepts(method),
        None => true,
    };

    let exact = routes
        .iter()
        .filter(|r| method_ok(r))
        .filter_map(|r| wildcards_used(&call_segments, &segments(&r.path)).map(|w| (w, r)))
        .min_by_key(|(wildcards, _)| *wildcards);

    exact
        .or_else(|| {
            routes
                .iter()
                .filter(|r| method_ok(r))
                .filter_map(|r| {
                    let route_segments = segments(&r.path);
                    if route_segments.is_empty() || call_segments.len() <= route_segments.len() {
                        return None;
                    }
                    let tail = &call_segments[call_segments.len() - route_segments.len()..];
                    wildcards_used(tail, &route_segments).map(|w| (w, r))
                })
                .min_by_key(|(wildcards, _)| *wildcards)
        })
        .map(|(_, route)| route)
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Number of segments matched through a `:param` wildcard, or `None` on mismatch
fn wildcards_used(call: &[&str], route: &[&str]) -> Option<usize> {
    if call.len() != route.len() {
        return None;
    }
    let mut wildcards = 0;
    for (c, r) in call.iter().zip(route) {
        if c.starts_with(':') || r.starts_with(':') {
            wildcards += 1;
        } else if c != r {
            return None;
        }
    }
    Some(wildcards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{FileInfo, FileType};
    use crate::parser::{ComponentInfo, ComponentKind, DatabaseQuery, HttpMethod, QueryOperation};
    use chrono::Utc;
    use std::path::PathBuf;

    fn snapshot(paths: &[&str]) -> CodebaseAnalysis {
        CodebaseAnalysis {
            project_name: "test".to_string(),
            root: PathBuf::from("/tmp/test"),
            generated_at: Utc::now(),
            fingerprint: String::new(),
            files: paths
                .iter()
                .map(|p| FileInfo {
                    path: p.to_string(),
                    file_type: FileType::Other,
                    size: 0,
                    modified: None,
                })
                .collect(),
            functions: Vec::new(),
            components: Vec::new(),
            routes: Vec::new(),
            queries: Vec::new(),
            env_vars: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn function(name: &str, file: &str, calls: &[&str]) -> FunctionInfo {
        let mut f = FunctionInfo::new(name, file, 1);
        f.calls = calls.iter().map(|c| c.to_string()).collect();
        f
    }

    fn query(file: &str, function: &str, table: &str) -> DatabaseQuery {
        DatabaseQuery {
            file: file.to_string(),
            function: Some(function.to_string()),
            operation: QueryOperation::Read,
            table: Some(table.to_string()),
            call: format!("{}.find", table),
            line: 1,
        }
    }

    fn api_call(method: Option<HttpMethod>, url: &str) -> ApiCall {
        ApiCall::new(method, url, 1)
    }

    fn component(name: &str, file: &str, invokes: &[&str], api_calls: Vec<ApiCall>) -> ComponentInfo {
        ComponentInfo {
            name: name.to_string(),
            file: file.to_string(),
            kind: ComponentKind::Ui,
            line: 1,
            invokes: invokes.iter().map(|i| i.to_string()).collect(),
            api_calls,
        }
    }

    #[test]
    fn test_handler_prefers_same_file() {
        let mut analysis = snapshot(&["a/routes.js", "b/service.js"]);
        analysis.functions = vec![
            function("list", "a/routes.js", &[]),
            function("list", "b/service.js", &[]),
        ];
        analysis.routes = vec![RouteInfo::new(HttpMethod::Get, "/x", "a/routes.js", 1, "list")];
        resolve(&mut analysis);

        assert_eq!(
            analysis.routes[0].handler_link,
            HandlerLink::Linked {
                file: "a/routes.js".to_string(),
                function: "list".to_string()
            }
        );
    }

    #[test]
    fn test_handler_falls_back_to_first_file_in_order() {
        let mut analysis = snapshot(&["controllers/a.js", "controllers/b.js", "routes.js"]);
        analysis.functions = vec![
            function("getUsers", "controllers/a.js", &[]),
            function("getUsers", "controllers/b.js", &[]),
        ];
        analysis.routes = vec![RouteInfo::new(
            HttpMethod::Get,
            "/users",
            "routes.js",
            1,
            "usersController.getUsers",
        )];
        resolve(&mut analysis);

        match &analysis.routes[0].handler_link {
            HandlerLink::Linked { file, function } => {
                assert_eq!(file, "controllers/a.js");
                assert_eq!(function, "getUsers");
            }
            HandlerLink::Unlinked => panic!("expected a linked handler"),
        }
    }

    #[test]
    fn test_unknown_handler_stays_unlinked() {
        let mut analysis = snapshot(&["routes.js"]);
        analysis.routes = vec![RouteInfo::new(HttpMethod::Get, "/", "routes.js", 1, "missing")];
        resolve(&mut analysis);
        assert_eq!(analysis.routes.len(), 1);
        assert_eq!(analysis.routes[0].handler_link, HandlerLink::Unlinked);
        assert!(analysis.routes[0].query_ids.is_empty());
    }

    #[test]
    fn test_inline_handler_uses_invokes() {
        let mut analysis = snapshot(&["routes.js", "services.js"]);
        analysis.functions = vec![function("removeUser", "services.js", &[])];
        let mut route = RouteInfo::new(HttpMethod::Delete, "/users/:id", "routes.js", 1, crate::parser::INLINE_HANDLER);
        route.invokes = vec!["validateId".to_string(), "svc.removeUser".to_string()];
        analysis.routes = vec![route];
        resolve(&mut analysis);

        assert!(matches!(
            &analysis.routes[0].handler_link,
            HandlerLink::Linked { function, .. } if function == "removeUser"
        ));
    }

    #[test]
    fn test_two_hop_queries() {
        let mut analysis = snapshot(&["controllers.js", "services.js"]);
        analysis.functions = vec![
            function("listUsers", "controllers.js", &["userService.findAll", "log"]),
            function("findAll", "services.js", &[]),
        ];
        analysis.queries = vec![
            query("controllers.js", "listUsers", "audit"),
            query("services.js", "findAll", "users"),
            query("services.js", "other", "orders"),
        ];
        analysis.routes = vec![RouteInfo::new(HttpMethod::Get, "/users", "controllers.js", 1, "listUsers")];
        resolve(&mut analysis);

        assert_eq!(analysis.routes[0].query_ids, vec![0, 1]);
    }

    #[test]
    fn test_api_call_exact_then_suffix() {
        let mut analysis = snapshot(&["routes.js", "src/components/List.jsx"]);
        analysis.routes = vec![
            RouteInfo::new(HttpMethod::Get, "/users", "routes.js", 1, "a"),
            RouteInfo::new(HttpMethod::Post, "/users", "routes.js", 2, "b"),
            RouteInfo::new(HttpMethod::Get, "/users/:id", "routes.js", 3, "c"),
        ];
        analysis.components = vec![ComponentInfo {
            name: "List".to_string(),
            file: "src/components/List.jsx".to_string(),
            kind: ComponentKind::Ui,
            line: 1,
            invokes: Vec::new(),
            api_calls: vec![
                api_call(Some(HttpMethod::Post), "/users"),
                api_call(Some(HttpMethod::Get), "/api/users/42"),
                api_call(Some(HttpMethod::Delete), "/users"),
                api_call(None, "/users"),
            ],
        }];
        resolve(&mut analysis);

        let links: Vec<&RouteLink> = analysis.components[0].api_calls.iter().map(|c| &c.route).collect();
        assert_eq!(
            links[0],
            &RouteLink::Linked {
                file: "routes.js".to_string(),
                method: HttpMethod::Post,
                path: "/users".to_string()
            }
        );
        assert!(matches!(links[1], RouteLink::Linked { path, .. } if path == "/users/:id"));
        assert_eq!(links[2], &RouteLink::Unlinked);
        assert!(matches!(links[3], RouteLink::Linked { method: HttpMethod::Get, .. }));
    }

    #[test]
    fn test_literal_suffix_beats_param_suffix() {
        let mut analysis = snapshot(&["routes/items.js", "routes/users.js", "src/components/List.jsx"]);
        analysis.routes = vec![
            RouteInfo::new(HttpMethod::Get, "/:id", "routes/items.js", 1, "show"),
            RouteInfo::new(HttpMethod::Get, "/users", "routes/users.js", 1, "list"),
        ];
        analysis.components = vec![component(
            "List",
            "src/components/List.jsx",
            &[],
            vec![api_call(Some(HttpMethod::Get), "/api/users"), api_call(None, "/api/42")],
        )];
        resolve(&mut analysis);

        let calls = &analysis.components[0].api_calls;
        assert!(matches!(&calls[0].route, RouteLink::Linked { path, .. } if path == "/users"));
        assert!(matches!(&calls[1].route, RouteLink::Linked { path, .. } if path == "/:id"));
    }

    #[test]
    fn test_literal_exact_beats_param_exact() {
        let mut analysis = snapshot(&["routes.js"]);
        analysis.routes = vec![
            RouteInfo::new(HttpMethod::Get, "/users/:id", "routes.js", 1, "show"),
            RouteInfo::new(HttpMethod::Get, "/users/me", "routes.js", 2, "me"),
        ];
        let call = api_call(Some(HttpMethod::Get), "/users/me");
        assert_eq!(match_route(&analysis.routes, &call).map(|r| r.handler.as_str()), Some("me"));
    }

    #[test]
    fn test_component_reaches_calls_through_invoked_function() {
        let mut analysis = snapshot(&["routes/users.js", "src/components/UserList.jsx", "src/services/userApi.js"]);
        let mut fetch_users = function("fetchUsers", "src/services/userApi.js", &["axios.get"]);
        fetch_users.api_calls = vec![api_call(Some(HttpMethod::Get), "/users")];
        analysis.functions = vec![fetch_users];
        analysis.routes = vec![RouteInfo::new(HttpMethod::Get, "/users", "routes/users.js", 1, "list")];
        analysis.components = vec![component(
            "UserList",
            "src/components/UserList.jsx",
            &["useState", "api.fetchUsers", "fetchUsers"],
            Vec::new(),
        )];
        resolve(&mut analysis);

        let calls = &analysis.components[0].api_calls;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].via.as_deref(), Some("fetchUsers"));
        assert_eq!(
            calls[0].route,
            RouteLink::Linked {
                file: "routes/users.js".to_string(),
                method: HttpMethod::Get,
                path: "/users".to_string()
            }
        );

        // A second pass re-derives instead of piling up copies
        let before = analysis.components.clone();
        resolve(&mut analysis);
        assert_eq!(analysis.components, before);
    }

    #[test]
    fn test_direct_call_is_not_repeated_through_same_file_helper() {
        let mut analysis = snapshot(&["src/components/Form.jsx"]);
        let mut helper = function("save", "src/components/Form.jsx", &[]);
        helper.api_calls = vec![api_call(Some(HttpMethod::Post), "/forms")];
        analysis.functions = vec![helper];
        analysis.components = vec![component(
            "Form",
            "src/components/Form.jsx",
            &["save"],
            vec![api_call(Some(HttpMethod::Post), "/forms")],
        )];
        resolve(&mut analysis);

        assert_eq!(analysis.components[0].api_calls.len(), 1);
        assert!(analysis.components[0].api_calls[0].via.is_none());
    }

    #[test]
    fn test_dangling_records_are_dropped() {
        let mut analysis = snapshot(&["kept.js"]);
        analysis.functions = vec![function("a", "kept.js", &[]), function("b", "gone.js", &[])];
        analysis.routes = vec![RouteInfo::new(HttpMethod::Get, "/", "gone.js", 1, "a")];
        resolve(&mut analysis);

        assert_eq!(analysis.functions.len(), 1);
        assert!(analysis.routes.is_empty());
    }

    #[test]
    fn test_callee_name() {
        assert_eq!(callee_name("users.controller.list"), "list");
        assert_eq!(callee_name("list"), "list");
    }
}
