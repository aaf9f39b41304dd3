// JavaScript/TypeScript structural extraction
//
// Every file is parsed with tree-sitter and records are read off the syntax
// tree, so comments, regex literals and JSX text never look like code.
// Regexes only recognize idioms in node text, such as router constructors
// and SQL statements. Constructs that match no known idiom are left out.

use crate::analysis::classify::FileType;
use crate::error::{Error, Result};
use crate::parser::ast::*;
use regex::Regex;
use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tracing::debug;
use tree_sitter::{Language, Node, Parser, Tree};

/// Supported JavaScript variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JsVariant {
    JavaScript,
    TypeScript,
    Jsx,
    Tsx,
    Vue,
    Svelte,
}

impl JsVariant {
    /// Detect variant from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => Some(Self::JavaScript),
            "jsx" => Some(Self::Jsx),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "vue" => Some(Self::Vue),
            "svelte" => Some(Self::Svelte),
            _ => None,
        }
    }

    /// Check if this is a TypeScript variant
    pub fn is_typescript(&self) -> bool {
        matches!(self, Self::TypeScript | Self::Tsx)
    }

    /// Single-file component formats where the file itself is the component
    pub fn is_single_file_component(&self) -> bool {
        matches!(self, Self::Vue | Self::Svelte)
    }

    /// Grammar for the script text; the JavaScript grammar accepts JSX
    fn grammar(&self) -> Language {
        match self {
            Self::Tsx => tree_sitter_typescript::language_tsx(),
            v if v.is_typescript() => tree_sitter_typescript::language_typescript(),
            _ => tree_sitter_javascript::language(),
        }
    }
}

const NOISE_RECEIVERS: &[&str] = &[
    "console", "JSON", "Math", "Object", "Array", "Promise", "Number", "String", "Boolean",
    "Date", "res", "req", "next", "response", "request", "ctx", "this", "window", "document",
    "process", "require", "parseInt", "parseFloat", "setTimeout", "setInterval",
    "clearTimeout", "clearInterval", "Symbol", "Error", "Buffer", "URL", "Reflect", "Intl",
    "useState", "useEffect", "useMemo", "useCallback", "useRef", "useContext", "useReducer",
    "useLayoutEffect",
];

const NON_MODELS: &[&str] = &[
    "Object", "Array", "JSON", "Math", "Promise", "Date", "Number", "String", "Boolean",
    "Reflect", "Intl", "Buffer", "React", "Error", "Map", "Set", "Symbol", "Proxy", "WeakMap",
    "URL", "Vue", "Axios",
];

const ROUTER_NAMES: &[&str] = &["app", "router", "server", "routes"];

const CLIENT_RECEIVERS: &[&str] = &[
    "axios", "api", "apiClient", "client", "http", "httpClient", "request", "ky", "superagent",
    "instance", "$http", "$axios",
];
const CLIENT_METHODS: &[&str] = &["get", "post", "put", "patch", "delete"];

const BUILDER_RECEIVERS: &[&str] = &["knex", "db", "trx"];
const SUPABASE_METHODS: &[&str] = &["select", "insert", "update", "upsert", "delete"];
const SQL_METHODS: &[&str] = &["query", "execute", "run", "all", "prepare", "raw"];
const ENV_OBJECTS: &[&str] = &["process.env", "import.meta.env"];

const FUNCTION_KINDS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

/// Tree-sitter backed extractor for the JavaScript family
pub struct JavaScriptExtractor {
    ident_chain: Regex,
    router_constructor: Regex,
    component_base: Regex,
    component_wrapper: Regex,
    model_method: Regex,
    prisma_method: Regex,
    sql_statement: Regex,
    script_block: Regex,
    typescript_lang: Regex,
}

/// A top-level declaration and the node it spans
struct Declaration<'t> {
    name: String,
    span: Node<'t>,
    /// Absent for class and memo/forwardRef components
    function: Option<Node<'t>>,
    exported: bool,
}

impl Declaration<'_> {
    fn contains(&self, offset: usize) -> bool {
        self.span.start_byte() <= offset && offset < self.span.end_byte()
    }

    fn line(&self) -> usize {
        line_of(self.span)
    }
}

impl JavaScriptExtractor {
    /// Compile the idiom patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            ident_chain: Regex::new(r"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*$")?,
            router_constructor: Regex::new(
                r"^(?:express|fastify|Fastify|Hono|Koa|KoaRouter|koaRouter)$|(?:^|\.)Router$",
            )?,
            component_base: Regex::new(r"\bextends\s+(?:React\s*\.\s*)?(?:Pure)?Component\b")?,
            component_wrapper: Regex::new(r"^(?:React\.)?(?:memo|forwardRef)$")?,
            model_method: Regex::new(
                r"^(?:find|findOne|findById|findAll|findByPk|findAndCountAll|findOneAndUpdate|findByIdAndUpdate|findOneAndDelete|findByIdAndDelete|countDocuments|count|aggregate|exists|distinct|create|insertMany|bulkCreate|updateOne|updateMany|update|upsert|replaceOne|deleteOne|deleteMany|destroy|remove)$",
            )?,
            prisma_method: Regex::new(
                r"^(?:findMany|findUniqueOrThrow|findUnique|findFirstOrThrow|findFirst|count|aggregate|groupBy|createMany|create|updateMany|update|upsert|deleteMany|delete)$",
            )?,
            sql_statement: Regex::new(
                r#"(?is)^\s*(select\b.*?\bfrom|insert\s+into|update|delete\s+from)\s+[`"\[]?([A-Za-z_][\w.]*)"#,
            )?,
            script_block: Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script>")?,
            typescript_lang: Regex::new(r#"\blang\s*=\s*['"](?:ts|typescript)['"]"#)?,
        })
    }

    /// Extract records from one file's source text
    pub fn extract(
        &self,
        relative: &str,
        file_type: FileType,
        source: &str,
    ) -> Result<FileExtraction> {
        if source.contains('\0') {
            return Err(Error::parse(relative, "binary content in source file"));
        }

        let variant = Path::new(relative)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(JsVariant::from_extension)
            .ok_or_else(|| Error::parse(relative, "not a JavaScript-family file"))?;

        let (script, grammar) = if variant.is_single_file_component() {
            let (script, typescript) = self.embedded_script(relative, source)?;
            let grammar = if typescript {
                JsVariant::TypeScript
            } else {
                JsVariant::JavaScript
            };
            (Cow::Owned(script), grammar)
        } else {
            (Cow::Borrowed(source), variant)
        };
        let text: &str = &script;

        let tree = parse_tree(relative, grammar, text)?;
        let root = tree.root_node();
        if root.has_error() {
            debug!("Syntax errors in {}; keeping what parsed", relative);
        }

        let statements = named_children(root);
        let exports = self.exported_names(&statements, text);
        let declarations = self.declarations(&statements, text);
        let api_calls = self.api_calls(root, text);
        let functions = self.functions(relative, &declarations, &exports, &api_calls, text);

        let mut out = FileExtraction::default();
        match file_type {
            FileType::Component => {
                out.components = self.ui_components(
                    relative,
                    variant,
                    root,
                    &statements,
                    &declarations,
                    &api_calls,
                    text,
                );
            }
            FileType::Service => {
                if !functions.is_empty() || !api_calls.is_empty() {
                    out.components.push(ComponentInfo {
                        name: module_name(relative),
                        file: relative.to_string(),
                        kind: ComponentKind::Service,
                        line: 1,
                        invokes: self.calls_in(root, text, &[]),
                        api_calls: api_calls.iter().map(|(_, call)| call.clone()).collect(),
                    });
                }
            }
            _ => {}
        }

        if !matches!(
            file_type,
            FileType::Component | FileType::Test | FileType::Style | FileType::Config
        ) {
            out.routes = self.routes(relative, root, text);
            out.queries = self.queries(relative, root, &declarations, text);
        }

        out.env_vars = env_vars(root, text);
        out.functions = functions;

        Ok(out)
    }

    /// Script blocks of a single-file component, everything else blanked
    ///
    /// Byte offsets and line breaks are kept so positions match the file.
    fn embedded_script(&self, relative: &str, source: &str) -> Result<(String, bool)> {
        let mut bytes: Vec<u8> = source
            .bytes()
            .map(|b| if b == b'\n' { b'\n' } else { b' ' })
            .collect();
        let mut typescript = false;

        for caps in self.script_block.captures_iter(source) {
            let Some(body) = caps.get(2) else { continue };
            typescript |= self.typescript_lang.is_match(&caps[1]);
            bytes[body.range()].copy_from_slice(body.as_str().as_bytes());
        }

        let script = String::from_utf8(bytes).map_err(|e| Error::parse(relative, e.to_string()))?;
        Ok((script, typescript))
    }

    /// Names exported through export lists, CommonJS objects, or default exports
    fn exported_names(&self, statements: &[Node], source: &str) -> HashSet<String> {
        let mut names = HashSet::new();

        for &statement in statements {
            match statement.kind() {
                "export_statement" => {
                    if let Some(value) = statement.child_by_field_name("value") {
                        if value.kind() == "identifier" {
                            names.insert(snippet(value, source).to_string());
                        }
                    }
                    for clause in named_children(statement) {
                        if clause.kind() != "export_clause" {
                            continue;
                        }
                        for specifier in named_children(clause) {
                            if let Some(name) = specifier.child_by_field_name("name") {
                                names.insert(snippet(name, source).to_string());
                            }
                        }
                    }
                }
                "expression_statement" => {
                    let Some((left, right)) = assignment(statement) else { continue };
                    if compact(snippet(left, source)) != "module.exports" {
                        continue;
                    }
                    match right.kind() {
                        "identifier" => {
                            names.insert(snippet(right, source).to_string());
                        }
                        "object" => {
                            for property in named_children(right) {
                                match property.kind() {
                                    "shorthand_property_identifier" => {
                                        names.insert(snippet(property, source).to_string());
                                    }
                                    "pair" => {
                                        for field in ["key", "value"] {
                                            let Some(node) = property.child_by_field_name(field) else {
                                                continue;
                                            };
                                            let name = snippet(node, source);
                                            if is_identifier(name) {
                                                names.insert(name.to_string());
                                            }
                                        }
                                    }
                                    _ => {}
                                }
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        names
    }

    fn declarations<'t>(&self, statements: &[Node<'t>], source: &str) -> Vec<Declaration<'t>> {
        let mut found = Vec::new();
        for &statement in statements {
            self.declare(statement, statement, false, source, &mut found);
        }
        found
    }

    /// Record the function or component a top-level statement declares
    fn declare<'t>(
        &self,
        statement: Node<'t>,
        node: Node<'t>,
        exported: bool,
        source: &str,
        found: &mut Vec<Declaration<'t>>,
    ) {
        match node.kind() {
            "export_statement" => {
                if let Some(inner) = node.child_by_field_name("declaration") {
                    self.declare(statement, inner, true, source, found);
                }
            }
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    found.push(Declaration {
                        name: snippet(name, source).to_string(),
                        span: statement,
                        function: Some(node),
                        exported,
                    });
                }
            }
            "class_declaration" => {
                let Some(name) = node.child_by_field_name("name") else { return };
                let is_component = named_children(node).into_iter().any(|child| {
                    child.kind() == "class_heritage"
                        && self.component_base.is_match(snippet(child, source))
                });
                if is_component {
                    found.push(Declaration {
                        name: snippet(name, source).to_string(),
                        span: statement,
                        function: None,
                        exported,
                    });
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                for declarator in named_children(node) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    let (Some(name), Some(value)) = (
                        declarator.child_by_field_name("name"),
                        declarator.child_by_field_name("value"),
                    ) else {
                        continue;
                    };
                    if name.kind() != "identifier" {
                        continue;
                    }
                    let name = snippet(name, source).to_string();
                    let value = unwrap_parens(value);
                    if is_function(value) {
                        found.push(Declaration {
                            name,
                            span: declarator,
                            function: Some(value),
                            exported,
                        });
                    } else if is_pascal_case(&name) && self.is_wrapped_component(value, source) {
                        found.push(Declaration {
                            name,
                            span: declarator,
                            function: None,
                            exported,
                        });
                    }
                }
            }
            "expression_statement" => {
                // exports.name = function / module.exports.name = () => ...
                let Some((left, right)) = assignment(node) else { return };
                if !is_function(right) || left.kind() != "member_expression" {
                    return;
                }
                let (Some(object), Some(property)) = (
                    left.child_by_field_name("object"),
                    left.child_by_field_name("property"),
                ) else {
                    return;
                };
                if matches!(compact(snippet(object, source)).as_str(), "exports" | "module.exports") {
                    found.push(Declaration {
                        name: snippet(property, source).to_string(),
                        span: statement,
                        function: Some(right),
                        exported: true,
                    });
                }
            }
            _ => {}
        }
    }

    fn is_wrapped_component(&self, value: Node, source: &str) -> bool {
        value.kind() == "call_expression"
            && value
                .child_by_field_name("function")
                .map(|callee| self.component_wrapper.is_match(&compact(snippet(callee, source))))
                .unwrap_or(false)
    }

    fn functions(
        &self,
        relative: &str,
        declarations: &[Declaration],
        exports: &HashSet<String>,
        api_calls: &[(usize, ApiCall)],
        source: &str,
    ) -> Vec<FunctionInfo> {
        let mut seen = HashSet::new();
        let mut functions = Vec::new();

        for decl in declarations {
            let Some(node) = decl.function else { continue };
            if !seen.insert(decl.name.as_str()) {
                continue;
            }
            let mut func = FunctionInfo::new(&decl.name, relative, decl.line());
            func.exported = decl.exported || exports.contains(&decl.name);
            func.is_async = has_token(node, "async");
            func.params = params(node, source);
            func.calls = self.calls_in(decl.span, source, &[decl.name.as_str()]);
            func.api_calls = calls_within(api_calls, decl);
            functions.push(func);
        }

        functions
    }

    #[allow(clippy::too_many_arguments)]
    fn ui_components(
        &self,
        relative: &str,
        variant: JsVariant,
        root: Node,
        statements: &[Node],
        declarations: &[Declaration],
        api_calls: &[(usize, ApiCall)],
        source: &str,
    ) -> Vec<ComponentInfo> {
        let mut components = Vec::new();
        let mut seen = HashSet::new();

        for decl in declarations {
            if !is_pascal_case(&decl.name) || !seen.insert(decl.name.as_str()) {
                continue;
            }
            components.push(ComponentInfo {
                name: decl.name.clone(),
                file: relative.to_string(),
                kind: ComponentKind::Ui,
                line: decl.line(),
                invokes: self.calls_in(decl.span, source, &[decl.name.as_str()]),
                api_calls: calls_within(api_calls, decl),
            });
        }

        let anonymous_default = statements
            .iter()
            .any(|s| s.kind() == "export_statement" && has_token(*s, "default"));
        if components.is_empty() && (variant.is_single_file_component() || anonymous_default) {
            components.push(ComponentInfo {
                name: pascal_case(&module_name(relative)),
                file: relative.to_string(),
                kind: ComponentKind::Ui,
                line: 1,
                invokes: self.calls_in(root, source, &[]),
                api_calls: api_calls.iter().map(|(_, call)| call.clone()).collect(),
            });
        }

        components
    }

    /// Identifiers bound to a router or app constructor anywhere in the file
    fn router_bindings(&self, root: Node, source: &str) -> HashSet<String> {
        descendants(root, &["variable_declarator"])
            .into_iter()
            .filter_map(|declarator| {
                let name = declarator.child_by_field_name("name")?;
                let value = unwrap_parens(declarator.child_by_field_name("value")?);
                let callee = match value.kind() {
                    "call_expression" => value.child_by_field_name("function")?,
                    "new_expression" => value.child_by_field_name("constructor")?,
                    _ => return None,
                };
                self.router_constructor
                    .is_match(&compact(snippet(callee, source)))
                    .then(|| snippet(name, source).to_string())
            })
            .collect()
    }

    fn routes(&self, relative: &str, root: Node, source: &str) -> Vec<RouteInfo> {
        let bound = self.router_bindings(root, source);
        let is_router = |name: &str| {
            bound.contains(name)
                || ROUTER_NAMES.contains(&name)
                || name.ends_with("Router")
                || name.ends_with("router")
        };

        let mut routes: Vec<(usize, RouteInfo)> = Vec::new();

        for call in descendants(root, &["call_expression"]) {
            if call.has_error() {
                continue;
            }
            let Some(callee) = call.child_by_field_name("function") else { continue };
            if callee.kind() != "member_expression" {
                continue;
            }
            let (Some(object), Some(property)) = (
                callee.child_by_field_name("object"),
                callee.child_by_field_name("property"),
            ) else {
                continue;
            };
            let Some(method) = HttpMethod::parse(snippet(property, source)) else { continue };
            let args = arguments(call);

            match object.kind() {
                // router.get('/path', ...middleware, handler)
                "identifier" if is_router(snippet(object, source)) => {
                    let Some(path) = args.first().and_then(|a| route_path(*a, source)) else {
                        continue;
                    };
                    let Some((handler, middleware)) = args[1..].split_last() else { continue };
                    let route = self.build_route(
                        method,
                        &path,
                        relative,
                        line_of(call),
                        *handler,
                        middleware,
                        source,
                    );
                    routes.push((property.start_byte(), route));
                }
                // router.route('/path').get(handler).post(...)
                "call_expression" => {
                    let Some(path) = chained_route_path(object, source, &is_router) else {
                        continue;
                    };
                    let Some((handler, middleware)) = args.split_last() else { continue };
                    let route = self.build_route(
                        method,
                        &path,
                        relative,
                        line_of(property),
                        *handler,
                        middleware,
                        source,
                    );
                    routes.push((property.start_byte(), route));
                }
                _ => {}
            }
        }

        routes.sort_by_key(|(offset, _)| *offset);
        routes.into_iter().map(|(_, r)| r).collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn build_route(
        &self,
        method: HttpMethod,
        path: &str,
        relative: &str,
        line: usize,
        handler: Node,
        middleware: &[Node],
        source: &str,
    ) -> RouteInfo {
        let (name, invokes) = self.handler_of(handler, source);
        let mut route = RouteInfo::new(method, path, relative, line, &name);
        route.invokes = invokes;
        route.middleware = middleware
            .iter()
            .flat_map(|arg| self.middleware_names(*arg, source))
            .collect();
        route
    }

    /// Handler name, unwrapping `asyncHandler(fn)`; inline handlers keep their calls
    fn handler_of(&self, arg: Node, source: &str) -> (String, Vec<String>) {
        let chain = compact(snippet(arg, source));
        match arg.kind() {
            "identifier" | "member_expression" if self.ident_chain.is_match(&chain) => {
                (chain, Vec::new())
            }
            "call_expression" => match arguments(arg).as_slice() {
                [only] => {
                    let inner = compact(snippet(*only, source));
                    if self.ident_chain.is_match(&inner) {
                        (inner, Vec::new())
                    } else {
                        (chain, Vec::new())
                    }
                }
                _ => (chain, Vec::new()),
            },
            kind if FUNCTION_KINDS.contains(&kind) => {
                (INLINE_HANDLER.to_string(), self.calls_in(arg, source, &[]))
            }
            _ => (chain, Vec::new()),
        }
    }

    fn middleware_names(&self, arg: Node, source: &str) -> Vec<String> {
        match arg.kind() {
            "array" => named_children(arg)
                .into_iter()
                .flat_map(|item| self.middleware_names(item, source))
                .collect(),
            "call_expression" => arg
                .child_by_field_name("function")
                .map(|callee| compact(snippet(callee, source)))
                .filter(|name| self.ident_chain.is_match(name))
                .into_iter()
                .collect(),
            _ => {
                let chain = compact(snippet(arg, source));
                if self.ident_chain.is_match(&chain) {
                    vec![chain]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Outbound HTTP client calls with their byte offsets
    fn api_calls(&self, root: Node, source: &str) -> Vec<(usize, ApiCall)> {
        descendants(root, &["call_expression"])
            .into_iter()
            .filter_map(|call| {
                let (method, url) = client_request(call, source)?;
                Some((call.start_byte(), ApiCall::new(method, &url, line_of(call))))
            })
            .collect()
    }

    /// Database call sites, attributed to their enclosing declaration
    fn queries(
        &self,
        relative: &str,
        root: Node,
        declarations: &[Declaration],
        source: &str,
    ) -> Vec<DatabaseQuery> {
        descendants(root, &["call_expression"])
            .into_iter()
            .filter_map(|call| {
                let (operation, table, summary) = self.query_at(call, source)?;
                let offset = call.start_byte();
                Some(DatabaseQuery {
                    file: relative.to_string(),
                    function: declarations
                        .iter()
                        .find(|d| d.contains(offset))
                        .map(|d| d.name.clone()),
                    operation,
                    table,
                    call: summary,
                    line: line_of(call),
                })
            })
            .collect()
    }

    /// Operation, table and summary of a database call, if the call is one
    fn query_at(
        &self,
        call: Node,
        source: &str,
    ) -> Option<(QueryOperation, Option<String>, String)> {
        let callee = call.child_by_field_name("function")?;

        if callee.kind() == "identifier" {
            // knex('users').where(...).del()
            if !BUILDER_RECEIVERS.contains(&snippet(callee, source)) {
                return None;
            }
            let table = arguments(call).first().and_then(|a| literal_value(*a, source))?;
            let chain = chained_methods(call, source);
            let operation = if chain.iter().any(|m| matches!(*m, "del" | "delete")) {
                QueryOperation::Delete
            } else if chain.iter().any(|m| matches!(*m, "insert" | "update" | "upsert")) {
                QueryOperation::Write
            } else {
                QueryOperation::Read
            };
            let summary = format!("query builder '{}'", table);
            return Some((operation, Some(table), summary));
        }

        if callee.kind() != "member_expression" {
            return None;
        }
        let object = callee.child_by_field_name("object")?;
        let method = snippet(callee.child_by_field_name("property")?, source);

        match object.kind() {
            "identifier" => {
                let receiver = snippet(object, source);
                if is_pascal_case(receiver)
                    && !NON_MODELS.contains(&receiver)
                    && self.model_method.is_match(method)
                {
                    let operation = operation_for(method)?;
                    return Some((
                        operation,
                        Some(receiver.to_string()),
                        format!("{}.{}", receiver, method),
                    ));
                }
            }
            "member_expression" => {
                let chain = compact(snippet(object, source));
                if let Some(model) = chain.strip_prefix("prisma.") {
                    if is_identifier(model) && self.prisma_method.is_match(method) {
                        let operation = operation_for(method)?;
                        return Some((
                            operation,
                            Some(model.to_string()),
                            format!("prisma.{}.{}", model, method),
                        ));
                    }
                }
            }
            "call_expression" => {
                let inner = compact(snippet(object.child_by_field_name("function")?, source));
                let table = arguments(object).first().and_then(|a| literal_value(*a, source));
                if inner.ends_with(".collection") {
                    let table = table?;
                    let operation = operation_for(method)?;
                    let summary = format!("collection('{}').{}", table, method);
                    return Some((operation, Some(table), summary));
                }
                if inner == "supabase.from" && SUPABASE_METHODS.contains(&method) {
                    let table = table?;
                    let operation = operation_for(method)?;
                    let summary = format!("supabase.from('{}').{}", table, method);
                    return Some((operation, Some(table), summary));
                }
            }
            _ => {}
        }

        self.sql_query(call, method, source)
    }

    /// `pool.query('SELECT ...')` and similar raw SQL calls
    fn sql_query(
        &self,
        call: Node,
        method: &str,
        source: &str,
    ) -> Option<(QueryOperation, Option<String>, String)> {
        if !SQL_METHODS.contains(&method) {
            return None;
        }
        let sql = arguments(call).first().and_then(|a| literal_value(*a, source))?;
        let caps = self.sql_statement.captures(&sql)?;
        let keyword = caps[1].split_whitespace().next().unwrap_or("").to_lowercase();
        let operation = operation_for(&keyword)?;
        Some((
            operation,
            Some(caps[2].to_string()),
            format!("SQL {}", keyword.to_uppercase()),
        ))
    }

    /// Callee expressions in order of first appearance, minus noise
    fn calls_in(&self, node: Node, source: &str, exclude: &[&str]) -> Vec<String> {
        let mut found: Vec<(usize, String)> = descendants(node, &["call_expression"])
            .into_iter()
            .filter_map(|call| {
                let callee = call.child_by_field_name("function")?;
                if !matches!(callee.kind(), "identifier" | "member_expression") {
                    return None;
                }
                let chain = compact(snippet(callee, source));
                if !self.ident_chain.is_match(&chain) {
                    return None;
                }
                let first = chain.split('.').next().unwrap_or("");
                let last = chain.rsplit('.').next().unwrap_or("");
                if NOISE_RECEIVERS.contains(&first) || exclude.contains(&last) {
                    return None;
                }
                Some((callee.start_byte(), chain))
            })
            .collect();
        found.sort_by_key(|(offset, _)| *offset);

        let mut seen = HashSet::new();
        found
            .into_iter()
            .map(|(_, chain)| chain)
            .filter(|chain| seen.insert(chain.clone()))
            .collect()
    }
}

fn parse_tree(relative: &str, variant: JsVariant, text: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&variant.grammar())
        .map_err(|e| Error::parse(relative, format!("failed to load grammar: {}", e)))?;
    parser
        .parse(text, None)
        .ok_or_else(|| Error::parse(relative, "parser produced no syntax tree"))
}

/// Method and normalized URL of a `fetch` or HTTP-client call
fn client_request(call: Node, source: &str) -> Option<(Option<HttpMethod>, String)> {
    let callee = call.child_by_field_name("function")?;
    let args = arguments(call);

    let method = match callee.kind() {
        "identifier" if snippet(callee, source) == "fetch" => Some(
            args.get(1)
                .and_then(|options| option_method(*options, source))
                .unwrap_or(HttpMethod::Get),
        ),
        "member_expression" => {
            let object = compact(snippet(callee.child_by_field_name("object")?, source));
            let receiver = object.strip_prefix("this.").unwrap_or(&object);
            let property = snippet(callee.child_by_field_name("property")?, source);
            if !CLIENT_RECEIVERS.contains(&receiver) || !CLIENT_METHODS.contains(&property) {
                return None;
            }
            HttpMethod::parse(property)
        }
        _ => return None,
    };

    let url = args
        .first()
        .and_then(|a| literal_value(*a, source))
        .and_then(|u| normalize_url(&u))?;
    Some((method, url))
}

/// `method: 'PUT'` in a fetch options object
fn option_method(options: Node, source: &str) -> Option<HttpMethod> {
    if options.kind() != "object" {
        return None;
    }
    named_children(options)
        .into_iter()
        .filter(|p| p.kind() == "pair")
        .find_map(|pair| {
            let key = pair.child_by_field_name("key")?;
            let key = snippet(key, source).trim_matches(|c: char| c == '\'' || c == '"');
            if key != "method" {
                return None;
            }
            let value = literal_value(pair.child_by_field_name("value")?, source)?;
            HttpMethod::parse(&value)
        })
}

/// Path of `router.route('/path')` at the base of a method chain
fn chained_route_path(mut node: Node, source: &str, is_router: &dyn Fn(&str) -> bool) -> Option<String> {
    loop {
        if node.kind() != "call_expression" {
            return None;
        }
        let callee = node.child_by_field_name("function")?;
        if callee.kind() != "member_expression" {
            return None;
        }
        let property = snippet(callee.child_by_field_name("property")?, source);
        let object = callee.child_by_field_name("object")?;

        if property == "route" {
            if object.kind() == "identifier" && is_router(snippet(object, source)) {
                return arguments(node).first().and_then(|a| route_path(*a, source));
            }
            return None;
        }
        HttpMethod::parse(property)?;
        node = object;
    }
}

/// Method names chained onto a call: `knex('t').where(..).del()` -> `[where, del]`
fn chained_methods<'s>(call: Node, source: &'s str) -> Vec<&'s str> {
    let mut names = Vec::new();
    let mut node = call;

    while let Some(parent) = node.parent() {
        match parent.kind() {
            "member_expression" if parent.child_by_field_name("object") == Some(node) => {
                if let Some(property) = parent.child_by_field_name("property") {
                    names.push(snippet(property, source));
                }
            }
            "call_expression" if parent.child_by_field_name("function") == Some(node) => {}
            _ => break,
        }
        node = parent;
    }

    names
}

fn env_vars(root: Node, source: &str) -> Vec<String> {
    let mut vars = BTreeSet::new();

    for node in descendants(root, &["member_expression", "subscript_expression"]) {
        let Some(object) = node.child_by_field_name("object") else { continue };
        if !ENV_OBJECTS.contains(&compact(snippet(object, source)).as_str()) {
            continue;
        }
        let name = if node.kind() == "member_expression" {
            node.child_by_field_name("property")
                .map(|p| snippet(p, source).to_string())
        } else {
            node.child_by_field_name("index")
                .and_then(|i| literal_value(i, source))
        };
        if let Some(name) = name.filter(|n| is_identifier(n)) {
            vars.insert(name);
        }
    }

    vars.into_iter().collect()
}

/// Parameter names from a function node (best-effort)
fn params(function: Node, source: &str) -> Vec<String> {
    if let Some(single) = function.child_by_field_name("parameter") {
        return vec![snippet(single, source).to_string()];
    }
    let Some(list) = function.child_by_field_name("parameters") else {
        return Vec::new();
    };
    named_children(list)
        .into_iter()
        .filter_map(|p| param_name(p, source))
        .collect()
}

fn param_name(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "identifier" => Some(snippet(node, source).to_string()),
        "assignment_pattern" => param_name(node.child_by_field_name("left")?, source),
        "rest_pattern" => named_children(node)
            .into_iter()
            .next()
            .and_then(|inner| param_name(inner, source)),
        "object_pattern" | "array_pattern" => Some(compact_spaces(snippet(node, source))),
        "required_parameter" | "optional_parameter" => {
            param_name(node.child_by_field_name("pattern")?, source)
        }
        _ => None,
    }
}

/// Content of a string or template literal; interpolations become `:param`
fn literal_value(node: Node, source: &str) -> Option<String> {
    match node.kind() {
        "string" => {
            let text = snippet(node, source);
            text.get(1..text.len().saturating_sub(1)).map(str::to_string)
        }
        "template_string" => {
            let (start, end) = (node.start_byte() + 1, node.end_byte().saturating_sub(1));
            let mut out = String::new();
            let mut cursor = start;
            for part in named_children(node) {
                if part.kind() == "template_substitution" {
                    out.push_str(source.get(cursor..part.start_byte())?);
                    out.push_str(":param");
                    cursor = part.end_byte();
                }
            }
            out.push_str(source.get(cursor..end)?);
            Some(out)
        }
        _ => None,
    }
}

/// Path of a route registration, if the argument is a path literal
fn route_path(node: Node, source: &str) -> Option<String> {
    let path = literal_value(node, source)?;
    if path.starts_with('/') || path == "*" {
        Some(path)
    } else {
        None
    }
}

/// Normalize a client URL to a bare path
pub fn normalize_url(url: &str) -> Option<String> {
    let mut path = url.trim();
    if path.is_empty() || path.contains(char::is_whitespace) {
        return None;
    }

    if let Some(idx) = path.find("://") {
        let after = &path[idx + 3..];
        path = after.find('/').map(|i| &after[i..]).unwrap_or("/");
    }

    while let Some(rest) = path.strip_prefix(":param") {
        path = rest;
    }

    let path = path.split(['?', '#']).next().unwrap_or("");
    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    Some(normalized)
}

fn operation_for(method: &str) -> Option<QueryOperation> {
    let m = method.to_lowercase();
    if m.contains("delete") || m.contains("destroy") || m == "remove" || m == "del" {
        Some(QueryOperation::Delete)
    } else if m.contains("update")
        || m.contains("create")
        || m.contains("insert")
        || m.contains("upsert")
        || m.contains("replace")
        || m == "save"
    {
        Some(QueryOperation::Write)
    } else if m.starts_with("find")
        || m.starts_with("select")
        || m.starts_with("count")
        || m.starts_with("aggregate")
        || m.starts_with("exists")
        || m.starts_with("distinct")
        || m.starts_with("group")
    {
        Some(QueryOperation::Read)
    } else {
        None
    }
}

fn snippet<'s>(node: Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

/// Named children, comments excluded
fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    children
}

/// Nodes of the given kinds under `root` (inclusive), in document order
fn descendants<'t>(root: Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if kinds.contains(&node.kind()) {
            found.push(node);
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'t>> = node.named_children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    found
}

/// Whether an anonymous token such as `async` or `default` is a direct child
fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    found
}

fn arguments(call: Node<'_>) -> Vec<Node<'_>> {
    match call.child_by_field_name("arguments") {
        Some(args) if args.kind() == "arguments" => named_children(args),
        // tagged template: fetch`/users`
        Some(template) => vec![template],
        None => Vec::new(),
    }
}

/// Left and right side of `left = right;`
fn assignment(statement: Node<'_>) -> Option<(Node<'_>, Node<'_>)> {
    let expression = named_children(statement).into_iter().next()?;
    if expression.kind() != "assignment_expression" {
        return None;
    }
    Some((
        expression.child_by_field_name("left")?,
        unwrap_parens(expression.child_by_field_name("right")?),
    ))
}

fn unwrap_parens(mut node: Node<'_>) -> Node<'_> {
    while node.kind() == "parenthesized_expression" {
        match named_children(node).into_iter().next() {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

fn is_function(node: Node) -> bool {
    FUNCTION_KINDS.contains(&node.kind())
}

fn calls_within(api_calls: &[(usize, ApiCall)], decl: &Declaration) -> Vec<ApiCall> {
    api_calls
        .iter()
        .filter(|(offset, _)| decl.contains(*offset))
        .map(|(_, call)| call.clone())
        .collect()
}

fn compact(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn compact_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn is_pascal_case(name: &str) -> bool {
    name.chars().next().map(|c| c.is_ascii_uppercase()).unwrap_or(false)
}

/// File stem, or the parent directory name for `index.*` files
fn module_name(relative: &str) -> String {
    let path = Path::new(relative);
    let stem = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .unwrap_or("module");
    if stem == "index" {
        if let Some(parent) = path.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str()) {
            return parent.to_string();
        }
    }
    stem.to_string()
}

fn pascal_case(s: &str) -> String {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(path: &str, file_type: FileType, source: &str) -> FileExtraction {
        JavaScriptExtractor::new()
            .unwrap()
            .extract(path, file_type, source)
            .unwrap()
    }

    #[test]
    fn test_js_variant_detection() {
        assert_eq!(JsVariant::from_extension("js"), Some(JsVariant::JavaScript));
        assert_eq!(JsVariant::from_extension("jsx"), Some(JsVariant::Jsx));
        assert_eq!(JsVariant::from_extension("ts"), Some(JsVariant::TypeScript));
        assert_eq!(JsVariant::from_extension("tsx"), Some(JsVariant::Tsx));
        assert_eq!(JsVariant::from_extension("vue"), Some(JsVariant::Vue));
        assert_eq!(JsVariant::from_extension("py"), None);
        assert!(JsVariant::Tsx.is_typescript());
    }

    #[test]
    fn test_functions_and_exports() {
        let source = r#"
export async function getUsersFromDB(limit, { offset }) {
    return User.find().limit(limit);
}

const helper = (x) => x * 2;

function internal(a = 1, ...rest) {
    return helper(a);
}

module.exports = { internal };
"#;
        let result = extract("services/users.js", FileType::Service, source);
        let names: Vec<&str> = result.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["getUsersFromDB", "helper", "internal"]);

        let get = &result.functions[0];
        assert!(get.exported);
        assert!(get.is_async);
        assert_eq!(get.params, vec!["limit".to_string(), "{ offset }".to_string()]);
        assert_eq!(get.line, 2);

        assert!(!result.functions[1].exported);
        assert!(result.functions[2].exported);
        assert_eq!(result.functions[2].params, vec!["a".to_string(), "rest".to_string()]);
        assert_eq!(result.functions[2].calls, vec!["helper".to_string()]);
    }

    #[test]
    fn test_commonjs_exports_assign() {
        let source = "exports.listUsers = async (req, res) => {\n  res.json(await svc.all());\n};\n";
        let result = extract("controllers/users.js", FileType::Route, source);
        assert_eq!(result.functions.len(), 1);
        assert!(result.functions[0].exported);
        assert!(result.functions[0].is_async);
        assert_eq!(result.functions[0].calls, vec!["svc.all".to_string()]);
    }

    #[test]
    fn test_route_registration() {
        let source = r#"
const express = require('express');
const router = express.Router();
const { getUsersFromDB, createUser } = require('../services/users');

router.get('/users', getUsersFromDB);
router.post('/users', authenticate, validate(userSchema), createUser);
router.delete("/users/:id", async (req, res) => {
    await removeUser(req.params.id);
    res.sendStatus(204);
});
app.get('env');
axios.get('/users');

module.exports = router;
"#;
        let result = extract("routes/users.js", FileType::Route, source);
        assert_eq!(result.routes.len(), 3);

        let get = &result.routes[0];
        assert_eq!(get.method, HttpMethod::Get);
        assert_eq!(get.path, "/users");
        assert_eq!(get.handler, "getUsersFromDB");
        assert!(get.middleware.is_empty());
        assert_eq!(get.line, 6);

        let post = &result.routes[1];
        assert_eq!(post.handler, "createUser");
        assert_eq!(post.middleware, vec!["authenticate".to_string(), "validate".to_string()]);

        let delete = &result.routes[2];
        assert_eq!(delete.method, HttpMethod::Delete);
        assert!(delete.is_inline());
        assert_eq!(delete.invokes, vec!["removeUser".to_string()]);
    }

    #[test]
    fn test_route_chain() {
        let source = "const r = Router();\nr.route('/items')\n  .get(listItems)\n  .post(requireAuth, addItem);\n";
        let result = extract("server/items.js", FileType::Other, source);
        assert_eq!(result.routes.len(), 2);
        assert_eq!(result.routes[0].label(), "GET /items");
        assert_eq!(result.routes[1].handler, "addItem");
        assert_eq!(result.routes[1].middleware, vec!["requireAuth".to_string()]);
    }

    #[test]
    fn test_wrapped_handler_is_unwrapped() {
        let source = "app.get('/health', asyncHandler(healthCheck));\n";
        let result = extract("server.js", FileType::Route, source);
        assert_eq!(result.routes[0].handler, "healthCheck");
    }

    #[test]
    fn test_routes_in_comments_are_ignored() {
        let source = "// router.get('/old', legacy);\n/* app.post('/gone', gone); */\nrouter.get('/new', fresh);\n";
        let result = extract("routes/a.js", FileType::Route, source);
        assert_eq!(result.routes.len(), 1);
        assert_eq!(result.routes[0].path, "/new");
        assert_eq!(result.routes[0].line, 3);
    }

    #[test]
    fn test_ui_component_with_api_calls() {
        let source = r#"
import React, { useEffect, useState } from 'react';
import axios from 'axios';

export default function UserList() {
    const [users, setUsers] = useState([]);
    useEffect(() => {
        axios.get('/users').then((r) => setUsers(r.data));
    }, []);
    return <ul>{users.map((u) => <li key={u.id}>{u.name}</li>)}</ul>;
}

function formatName(user) {
    return user.name;
}
"#;
        let result = extract("src/components/UserList.jsx", FileType::Component, source);
        assert_eq!(result.components.len(), 1);
        let component = &result.components[0];
        assert_eq!(component.name, "UserList");
        assert_eq!(component.kind, ComponentKind::Ui);
        assert_eq!(component.api_calls.len(), 1);
        assert_eq!(component.api_calls[0].url, "/users");
        assert_eq!(component.api_calls[0].method, Some(HttpMethod::Get));
        assert!(component.invokes.contains(&"setUsers".to_string()));
        assert!(result.routes.is_empty());
    }

    #[test]
    fn test_fetch_with_method_and_template() {
        let source = r#"
export const UserForm = () => {
    const save = () => fetch(`${API_URL}/users/${id}?x=1`, { method: 'PUT', body });
    return <form onSubmit={save} />;
};
"#;
        let result = extract("src/components/UserForm.tsx", FileType::Component, source);
        let calls = &result.components[0].api_calls;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "/users/:param");
        assert_eq!(calls[0].method, Some(HttpMethod::Put));
    }

    #[test]
    fn test_regex_literal_and_comment_do_not_confuse_routes() {
        let source = "s.replace(/`/g, '');\n// router.get('/legacy', oldHandler);\nrouter.get('/users', list);\n";
        let result = extract("routes/a.js", FileType::Route, source);
        let labels: Vec<String> = result.routes.iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec!["GET /users".to_string()]);
        assert_eq!(result.routes[0].line, 3);
    }

    #[test]
    fn test_jsx_text_is_not_code() {
        let source = "export function Docs() {\n  return <p>Call fetch('/hidden') or router.get('/x', h)</p>;\n}\n";
        let result = extract("src/components/Docs.jsx", FileType::Component, source);
        assert_eq!(result.components.len(), 1);
        assert!(result.components[0].api_calls.is_empty());
        assert!(result.components[0].invokes.is_empty());
    }

    #[test]
    fn test_api_calls_in_route_classified_client_module() {
        let source = "import axios from 'axios';\nexport function fetchUsers() {\n  return axios.get('/users');\n}\n";
        let result = extract("src/api/users.js", FileType::Route, source);
        assert!(result.routes.is_empty());
        assert!(result.components.is_empty());
        let calls = &result.functions[0].api_calls;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "/users");
        assert_eq!(calls[0].method, Some(HttpMethod::Get));
        assert_eq!(calls[0].line, 3);
    }

    #[test]
    fn test_typescript_signatures() {
        let source = "export async function getUser(id: string, opts?: Options): Promise<User> {\n  return api.get(`/users/${id}`);\n}\n";
        let result = extract("src/api/users.ts", FileType::Route, source);
        let func = &result.functions[0];
        assert_eq!(func.name, "getUser");
        assert!(func.exported);
        assert!(func.is_async);
        assert_eq!(func.params, vec!["id".to_string(), "opts".to_string()]);
        assert_eq!(func.api_calls[0].url, "/users/:param");
    }

    #[test]
    fn test_vue_typescript_script_block() {
        let source = "<template><p>{{ a }}</p></template>\n<script lang=\"ts\">\nconst load = async (): Promise<void> => { await axios.post('/api/items'); };\n</script>\n";
        let result = extract("src/views/Items.vue", FileType::Component, source);
        assert_eq!(result.functions[0].name, "load");
        assert_eq!(result.functions[0].line, 3);
        assert_eq!(result.components[0].name, "Items");
        assert_eq!(result.components[0].api_calls[0].method, Some(HttpMethod::Post));
    }

    #[test]
    fn test_class_and_memo_components() {
        let source = "export class Header extends React.Component {\n  render() { return null; }\n}\nexport const Footer = React.memo(() => null);\n";
        let result = extract("src/components/Layout.jsx", FileType::Component, source);
        let names: Vec<&str> = result.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Header", "Footer"]);
    }

    #[test]
    fn test_vue_single_file_component() {
        let source = "<template><div/></template>\n<script>\nexport default { mounted() { fetch('/api/items'); } };\n</script>\n";
        let result = extract("src/views/item-list.vue", FileType::Component, source);
        assert_eq!(result.components.len(), 1);
        assert_eq!(result.components[0].name, "ItemList");
        assert_eq!(result.components[0].api_calls[0].url, "/api/items");
    }

    #[test]
    fn test_service_module_component() {
        let source = "export async function fetchUsers() {\n  return api.get('/users');\n}\n";
        let result = extract("src/services/userApi.js", FileType::Service, source);
        assert_eq!(result.components.len(), 1);
        assert_eq!(result.components[0].kind, ComponentKind::Service);
        assert_eq!(result.components[0].name, "userApi");
        assert_eq!(result.components[0].api_calls[0].url, "/users");
    }

    #[test]
    fn test_database_queries() {
        let source = r#"
async function getUsersFromDB() {
    return User.find({ active: true });
}

async function removeUser(id) {
    await User.findByIdAndDelete(id);
}

const addOrder = async (order) => prisma.order.create({ data: order });

function stats() {
    const keys = Object.create(null);
    return pool.query('SELECT id FROM users WHERE active = true');
}

function purge() {
    return knex('sessions').where('expired', true).del();
}
"#;
        let result = extract("services/users.js", FileType::Service, source);
        let summary: Vec<(Option<&str>, QueryOperation, Option<&str>)> = result
            .queries
            .iter()
            .map(|q| (q.function.as_deref(), q.operation, q.table.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Some("getUsersFromDB"), QueryOperation::Read, Some("User")),
                (Some("removeUser"), QueryOperation::Delete, Some("User")),
                (Some("addOrder"), QueryOperation::Write, Some("order")),
                (Some("stats"), QueryOperation::Read, Some("users")),
                (Some("purge"), QueryOperation::Delete, Some("sessions")),
            ]
        );
    }

    #[test]
    fn test_collection_and_supabase_queries() {
        let source = "function a() { return db.collection('posts').insertOne(p); }\nfunction b() { return supabase.from('tags').select('*'); }\n";
        let result = extract("db/posts.js", FileType::Database, source);
        assert_eq!(result.queries.len(), 2);
        assert_eq!(result.queries[0].operation, QueryOperation::Write);
        assert_eq!(result.queries[0].table.as_deref(), Some("posts"));
        assert_eq!(result.queries[1].operation, QueryOperation::Read);
        assert_eq!(result.queries[1].table.as_deref(), Some("tags"));
    }

    #[test]
    fn test_env_vars() {
        let source = "const url = process.env.DATABASE_URL;\nconst port = process.env['PORT'] || 3000;\nconst key = import.meta.env.VITE_KEY;\n";
        let result = extract("src/config.js", FileType::Other, source);
        assert_eq!(result.env_vars, vec!["DATABASE_URL", "PORT", "VITE_KEY"]);
    }

    #[test]
    fn test_binary_content_is_rejected() {
        let extractor = JavaScriptExtractor::new().unwrap();
        let result = extractor.extract("a.js", FileType::Other, "abc\0def");
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_source_does_not_fail() {
        let source = "router.get('/broken', (req, res => {\nfunction ( {\nconst = ;\n";
        let result = extract("routes/broken.js", FileType::Route, source);
        assert!(result.routes.is_empty());
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("/users/"), Some("/users".to_string()));
        assert_eq!(normalize_url("https://api.example.com/v1/users?x=1"), Some("/v1/users".to_string()));
        assert_eq!(normalize_url(":param/users"), Some("/users".to_string()));
        assert_eq!(normalize_url("users"), Some("/users".to_string()));
        assert_eq!(normalize_url(""), None);
        assert_eq!(normalize_url("not a url"), None);
    }

    #[test]
    fn test_module_name_and_pascal_case() {
        assert_eq!(module_name("src/services/userApi.js"), "userApi");
        assert_eq!(module_name("src/components/Card/index.jsx"), "Card");
        assert_eq!(pascal_case("item-list"), "ItemList");
    }
}
