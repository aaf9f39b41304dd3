// Documentation model and its generation from a snapshot

use crate::analysis::{CodebaseAnalysis, FileType, RelationGraph, ScanWarning};
use crate::config::Config;
use crate::error::Result;
use crate::output::diagrams::DiagramGenerator;
use crate::output::templates::TemplateEngine;
use crate::parser::{
    ApiCall, ComponentKind, DatabaseQuery, HandlerLink, HttpMethod, QueryOperation, RouteInfo,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tera::Context;
use tracing::{debug, info};

/// Version of the persisted documentation layout
pub const FORMAT_VERSION: u32 = 1;

/// Table name used for queries whose target could not be recovered
pub const UNKNOWN_TABLE: &str = "(unknown)";

/// The complete documentation model, replaced wholesale on regeneration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedDocumentation {
    pub format_version: u32,
    pub project_name: String,
    pub overview: String,
    pub frontend: FrontendDoc,
    pub backend: BackendDoc,
    pub database: DatabaseDoc,
    pub user_flows: Vec<UserFlow>,
    /// Mermaid flowchart text; empty when diagrams are disabled
    pub architecture_diagram: String,
    pub deployment_guide: String,
    pub troubleshooting: String,
    pub generated_at: DateTime<Utc>,
    pub source_fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontendDoc {
    pub summary: String,
    pub components: Vec<ComponentDoc>,
}

/// A UI component with its outbound calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDoc {
    pub name: String,
    pub file: String,
    /// Directory the component lives in
    pub group: String,
    pub description: String,
    pub invokes: Vec<String>,
    pub api_calls: Vec<ApiCall>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendDoc {
    pub summary: String,
    pub groups: Vec<RouteGroup>,
}

/// Routes declared in one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGroup {
    pub file: String,
    pub endpoints: Vec<ApiEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub method: HttpMethod,
    pub path: String,
    pub line: usize,
    pub handler: String,
    pub handler_link: HandlerLink,
    pub middleware: Vec<String>,
    pub description: String,
    pub queries: Vec<DatabaseQuery>,
    /// Names of components calling this endpoint
    pub called_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDoc {
    pub summary: String,
    pub tables: Vec<TableDoc>,
}

/// Queries grouped under one table or collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDoc {
    pub name: String,
    pub operations: Vec<QueryOperation>,
    pub queries: Vec<DatabaseQuery>,
}

/// A named chain from a component through a route to the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFlow {
    pub name: String,
    pub steps: Vec<FlowStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowStep {
    Component {
        name: String,
        file: String,
    },
    Route {
        method: HttpMethod,
        path: String,
        file: String,
    },
    Handler {
        function: String,
        file: String,
    },
    Query {
        operation: QueryOperation,
        table: Option<String>,
        file: String,
    },
}

impl FlowStep {
    /// One-line description of the step
    pub fn describe(&self) -> String {
        match self {
            FlowStep::Component { name, .. } => format!("User interacts with {}", name),
            FlowStep::Route { method, path, .. } => format!("{} {} is called", method, path),
            FlowStep::Handler { function, .. } => format!("{} handles the request", function),
            FlowStep::Query {
                operation, table, ..
            } => match table {
                Some(table) => format!("Database {} on {}", operation, table),
                None => format!("Database {}", operation),
            },
        }
    }
}

/// Receiver of human-readable progress messages
///
/// Reporting is fire-and-forget: generation never depends on it.
pub trait ProgressSink {
    fn report(&self, status: &str);
}

/// The default sink; discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _status: &str) {}
}

impl<F> ProgressSink for F
where
    F: Fn(&str),
{
    fn report(&self, status: &str) {
        self(status)
    }
}

/// Maps a snapshot into a [`GeneratedDocumentation`]
pub struct DocumentationGenerator {
    templates: TemplateEngine,
    diagrams: DiagramGenerator,
    description: Option<String>,
}

impl DocumentationGenerator {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            templates: TemplateEngine::new()?,
            diagrams: DiagramGenerator::from_config(&config.diagrams),
            description: config.project.description.clone(),
        })
    }

    /// Generate without progress reporting
    pub fn generate(&self, analysis: &CodebaseAnalysis) -> Result<GeneratedDocumentation> {
        self.generate_with_progress(analysis, &NoProgress)
    }

    /// Generate, reporting each phase to `progress`
    pub fn generate_with_progress(
        &self,
        analysis: &CodebaseAnalysis,
        progress: &dyn ProgressSink,
    ) -> Result<GeneratedDocumentation> {
        info!("Generating documentation for {}", analysis.project_name);
        let graph = RelationGraph::build(analysis);
        debug!("Relation graph: {:?}", graph.stats());

        progress.report("Writing overview");
        let overview = self.overview(analysis)?;

        progress.report("Documenting frontend components");
        let frontend = self.frontend(analysis)?;

        progress.report("Documenting backend routes");
        let backend = self.backend(analysis, &graph)?;

        progress.report("Documenting database access");
        let database = self.database(analysis)?;

        progress.report("Deriving user flows");
        let user_flows = user_flows(analysis, &graph);

        progress.report("Drawing architecture diagram");
        let architecture_diagram = self.diagrams.generate(analysis, &graph);

        progress.report("Writing deployment guide");
        let deployment_guide = self.deployment_guide(analysis)?;

        progress.report("Writing troubleshooting guide");
        let troubleshooting = self.troubleshooting(analysis)?;

        progress.report("Documentation generated");

        Ok(GeneratedDocumentation {
            format_version: FORMAT_VERSION,
            project_name: analysis.project_name.clone(),
            overview,
            frontend,
            backend,
            database,
            user_flows,
            architecture_diagram,
            deployment_guide,
            troubleshooting,
            generated_at: Utc::now(),
            source_fingerprint: analysis.fingerprint.clone(),
        })
    }

    fn overview(&self, analysis: &CodebaseAnalysis) -> Result<String> {
        let file_types: Vec<FileTypeCount> = analysis
            .file_type_counts()
            .into_iter()
            .map(|(t, count)| FileTypeCount {
                label: t.label(),
                count,
            })
            .collect();
        let (linked_calls, total_calls) = call_counts(analysis);
        let query_files: BTreeSet<&str> = analysis.queries.iter().map(|q| q.file.as_str()).collect();

        let mut context = Context::new();
        context.insert("project_name", &analysis.project_name);
        context.insert("description", &self.description);
        context.insert("file_count", &analysis.files.len());
        context.insert("function_count", &analysis.functions.len());
        context.insert("component_count", &analysis.ui_components().count());
        context.insert("route_count", &analysis.routes.len());
        context.insert("query_count", &analysis.queries.len());
        context.insert("file_types", &file_types);
        context.insert("has_frontend", &has_frontend(analysis));
        context.insert("has_backend", &!analysis.routes.is_empty());
        context.insert("has_database", &!analysis.queries.is_empty());
        context.insert("query_file_count", &query_files.len());
        context.insert("linked_calls", &linked_calls);
        context.insert("total_calls", &total_calls);

        self.templates.render("overview.md", &context)
    }

    fn frontend(&self, analysis: &CodebaseAnalysis) -> Result<FrontendDoc> {
        let components: Vec<ComponentDoc> = analysis
            .ui_components()
            .map(|c| {
                let linked = c.api_calls.iter().filter(|a| a.route.is_linked()).count();
                let description = match c.api_calls.len() {
                    0 => format!("{} is a UI component defined in {}.", c.name, c.file),
                    n => format!(
                        "{} is a UI component defined in {}. It makes {} API call{}, {} of which resolve to a backend route.",
                        c.name,
                        c.file,
                        n,
                        if n == 1 { "" } else { "s" },
                        linked
                    ),
                };
                ComponentDoc {
                    name: c.name.clone(),
                    file: c.file.clone(),
                    group: parent_dir(&c.file),
                    description,
                    invokes: c.invokes.clone(),
                    api_calls: c.api_calls.clone(),
                }
            })
            .collect();

        let groups: BTreeSet<&str> = components.iter().map(|c| c.group.as_str()).collect();
        let (linked_calls, total_calls) = call_counts(analysis);

        let mut context = Context::new();
        context.insert("component_count", &components.len());
        context.insert("group_count", &groups.len());
        context.insert("linked_calls", &linked_calls);
        context.insert("total_calls", &total_calls);
        let summary = self.templates.render("frontend.md", &context)?;

        Ok(FrontendDoc {
            summary,
            components,
        })
    }

    fn backend(&self, analysis: &CodebaseAnalysis, graph: &RelationGraph) -> Result<BackendDoc> {
        let mut groups: Vec<RouteGroup> = Vec::new();

        for (index, route) in analysis.routes.iter().enumerate() {
            let queries: Vec<DatabaseQuery> = graph
                .queries_of(index)
                .into_iter()
                .filter_map(|q| analysis.queries.get(q).cloned())
                .collect();
            let called_by: Vec<String> = graph
                .callers_of(index)
                .into_iter()
                .filter_map(|c| analysis.components.get(c).map(|c| c.name.clone()))
                .collect();

            let endpoint = ApiEndpoint {
                method: route.method,
                path: route.path.clone(),
                line: route.line,
                handler: route.handler.clone(),
                handler_link: route.handler_link.clone(),
                middleware: route.middleware.clone(),
                description: describe_route(route, &queries),
                queries,
                called_by,
            };

            match groups.last_mut() {
                Some(group) if group.file == route.file => group.endpoints.push(endpoint),
                _ => groups.push(RouteGroup {
                    file: route.file.clone(),
                    endpoints: vec![endpoint],
                }),
            }
        }

        let linked_handlers = analysis
            .routes
            .iter()
            .filter(|r| r.handler_link.is_linked())
            .count();
        let query_routes = analysis
            .routes
            .iter()
            .filter(|r| !r.query_ids.is_empty())
            .count();

        let mut context = Context::new();
        context.insert("route_count", &analysis.routes.len());
        context.insert("group_count", &groups.len());
        context.insert("linked_handlers", &linked_handlers);
        context.insert("query_routes", &query_routes);
        let summary = self.templates.render("backend.md", &context)?;

        Ok(BackendDoc { summary, groups })
    }

    fn database(&self, analysis: &CodebaseAnalysis) -> Result<DatabaseDoc> {
        let mut by_table: BTreeMap<String, Vec<DatabaseQuery>> = BTreeMap::new();
        for query in &analysis.queries {
            let name = query.table.clone().unwrap_or_else(|| UNKNOWN_TABLE.to_string());
            by_table.entry(name).or_default().push(query.clone());
        }

        let tables: Vec<TableDoc> = by_table
            .into_iter()
            .map(|(name, queries)| {
                let operations: BTreeSet<QueryOperation> =
                    queries.iter().map(|q| q.operation).collect();
                TableDoc {
                    name,
                    operations: operations.into_iter().collect(),
                    queries,
                }
            })
            .collect();

        let count = |op: QueryOperation| analysis.queries.iter().filter(|q| q.operation == op).count();

        let mut context = Context::new();
        context.insert("query_count", &analysis.queries.len());
        context.insert("table_count", &tables.len());
        context.insert("reads", &count(QueryOperation::Read));
        context.insert("writes", &count(QueryOperation::Write));
        context.insert("deletes", &count(QueryOperation::Delete));
        let summary = self.templates.render("database.md", &context)?;

        Ok(DatabaseDoc { summary, tables })
    }

    fn deployment_guide(&self, analysis: &CodebaseAnalysis) -> Result<String> {
        let config_files: Vec<&str> = analysis
            .files
            .iter()
            .filter(|f| f.file_type == FileType::Config)
            .map(|f| f.path.as_str())
            .collect();

        let mut context = Context::new();
        context.insert("project_name", &analysis.project_name);
        context.insert("has_dockerfile", &analysis.has_file_named("Dockerfile"));
        context.insert(
            "has_compose",
            &["docker-compose.yml", "docker-compose.yaml", "compose.yml", "compose.yaml"]
                .iter()
                .any(|name| analysis.has_file_named(name)),
        );
        context.insert("has_package_json", &analysis.has_file("package.json"));
        context.insert("env_vars", &analysis.env_vars);
        context.insert("config_files", &config_files);

        self.templates.render("deployment.md", &context)
    }

    fn troubleshooting(&self, analysis: &CodebaseAnalysis) -> Result<String> {
        let unlinked_routes: Vec<UnlinkedRoute> = analysis
            .routes
            .iter()
            .filter(|r| !r.handler_link.is_linked())
            .map(|r| UnlinkedRoute {
                label: r.label(),
                file: r.file.clone(),
                handler: r.handler.clone(),
            })
            .collect();

        let unlinked_calls: Vec<UnlinkedCall> = analysis
            .components
            .iter()
            .flat_map(|c| {
                c.api_calls
                    .iter()
                    .filter(|a| !a.route.is_linked())
                    .map(move |a| UnlinkedCall {
                        component: c.name.clone(),
                        url: a.url.clone(),
                    })
            })
            .collect();

        let show_cors = has_frontend(analysis) && !analysis.routes.is_empty();
        let has_database = !analysis.queries.is_empty();
        let warnings: &[ScanWarning] = &analysis.warnings;
        let all_clear = unlinked_routes.is_empty()
            && unlinked_calls.is_empty()
            && warnings.is_empty()
            && !show_cors
            && !has_database;

        let mut context = Context::new();
        context.insert("unlinked_routes", &unlinked_routes);
        context.insert("unlinked_calls", &unlinked_calls);
        context.insert("show_cors", &show_cors);
        context.insert("has_database", &has_database);
        context.insert("warnings", warnings);
        context.insert("all_clear", &all_clear);

        self.templates.render("troubleshooting.md", &context)
    }
}

#[derive(Serialize)]
struct FileTypeCount {
    label: &'static str,
    count: usize,
}

#[derive(Serialize)]
struct UnlinkedRoute {
    label: String,
    file: String,
    handler: String,
}

#[derive(Serialize)]
struct UnlinkedCall {
    component: String,
    url: String,
}

/// Flows follow component -> route -> handler -> queries
///
/// A chain is continuous only when it reaches at least one query. Components
/// or routes that stop short get no flow.
fn user_flows(analysis: &CodebaseAnalysis, graph: &RelationGraph) -> Vec<UserFlow> {
    let mut flows = Vec::new();

    for (c, component) in analysis.components.iter().enumerate() {
        if component.kind != ComponentKind::Ui {
            continue;
        }
        for r in graph.routes_called_by(c) {
            let Some(route) = analysis.routes.get(r) else { continue };

            let mut steps = vec![
                FlowStep::Component {
                    name: component.name.clone(),
                    file: component.file.clone(),
                },
                FlowStep::Route {
                    method: route.method,
                    path: route.path.clone(),
                    file: route.file.clone(),
                },
            ];

            if let Some(function) = graph.handler_of(r).and_then(|f| analysis.functions.get(f)) {
                steps.push(FlowStep::Handler {
                    function: function.name.clone(),
                    file: function.file.clone(),
                });
            }

            let queries: Vec<FlowStep> = graph
                .queries_of(r)
                .into_iter()
                .filter_map(|q| analysis.queries.get(q))
                .map(|query| FlowStep::Query {
                    operation: query.operation,
                    table: query.table.clone(),
                    file: query.file.clone(),
                })
                .collect();
            if queries.is_empty() {
                continue;
            }
            steps.extend(queries);

            flows.push(UserFlow {
                name: format!("{}: {}", component.name, route.label()),
                steps,
            });
        }
    }

    flows
}

fn describe_route(route: &RouteInfo, queries: &[DatabaseQuery]) -> String {
    let mut text = match &route.handler_link {
        HandlerLink::Linked { file, function } => {
            format!("{} is handled by {} in {}.", route.label(), function, file)
        }
        HandlerLink::Unlinked if route.is_inline() => {
            format!("{} is handled by an inline function.", route.label())
        }
        HandlerLink::Unlinked => format!(
            "{} is bound to {}, which could not be resolved to a known function.",
            route.label(),
            route.handler
        ),
    };

    if !route.middleware.is_empty() {
        text.push_str(&format!(" Middleware: {}.", route.middleware.join(", ")));
    }

    if !queries.is_empty() {
        let targets: BTreeSet<String> = queries
            .iter()
            .map(|q| match &q.table {
                Some(table) => format!("{} {}", q.operation, table),
                None => q.operation.to_string(),
            })
            .collect();
        text.push_str(&format!(
            " Database access: {}.",
            targets.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }

    text
}

/// (linked, total) client calls across all components
fn call_counts(analysis: &CodebaseAnalysis) -> (usize, usize) {
    let calls = analysis.components.iter().flat_map(|c| c.api_calls.iter());
    let total = calls.clone().count();
    let linked = calls.filter(|a| a.route.is_linked()).count();
    (linked, total)
}

fn has_frontend(analysis: &CodebaseAnalysis) -> bool {
    analysis.ui_components().next().is_some() || analysis.has_file_type(FileType::Component)
}

fn parent_dir(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => ".".to_string(),
    }
}
