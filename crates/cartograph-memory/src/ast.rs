//! AST extraction: parses source files into a forest of [`CodeNodeDraft`]
//! values ready for [`crate::store::Store::replace_code_tree`].
//!
//! Grounded on `DevsHero-NeuroSiphon`'s `inspector.rs`: a `tree-sitter`
//! `Parser` per language, walked node-by-node rather than via compiled
//! queries, with byte offsets converted to 1-indexed lines via
//! `node.start_position().row`. Only python/typescript/javascript are fully
//! extracted per spec; any other detected language returns an empty forest
//! (a `Language::Other` no-op, not an error) so discovery can still record a
//! fingerprint.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tree_sitter::{Node, Parser};

use cartograph_core::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Other,
}

/// Exact extension → language mapping from §4.4. Extensions outside this map
/// (or mapped to `Other`) are still discoverable by the code indexer, but
/// never reach a parser.
pub fn detect_language(path: &str) -> Language {
    let ext = std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "py" => Language::Python,
        "ts" | "tsx" => Language::TypeScript,
        "js" | "jsx" => Language::JavaScript,
        // go, java, rb, c, h, cpp, hpp, cs, swift, kt, lua, sh, bash, rs are
        // recognized for discovery's extension set but have no extractor.
        "go" | "java" | "rb" | "c" | "h" | "cpp" | "hpp" | "cs" | "swift" | "kt" | "lua"
        | "sh" | "bash" | "rs" => Language::Other,
        _ => Language::Other,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    Class,
    Function,
    Interface,
    TypeAlias,
    Import,
}

impl CodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeKind::Class => "class",
            CodeKind::Function => "function",
            CodeKind::Interface => "interface",
            CodeKind::TypeAlias => "type_alias",
            CodeKind::Import => "import",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefDraft {
    pub target_name: String,
    pub kind: String,
    pub line: u32,
}

/// A parsed code node awaiting insertion; `qualified_name` is computed during
/// extraction (`parent.qualified_name + "." + name`), body_hash is the first
/// 16 hex chars of SHA-256 over the node's byte span.
#[derive(Debug, Clone)]
pub struct CodeNodeDraft {
    pub kind: CodeKind,
    pub name: String,
    pub qualified_name: String,
    pub start_line: u32,
    pub end_line: u32,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub body_hash: String,
    pub children: Vec<CodeNodeDraft>,
    pub refs: Vec<RefDraft>,
}

/// Parse `source` (already read as UTF-8) for `language`, returning top-level
/// nodes with children populated. Unsupported languages and parser failures
/// both return an empty forest rather than an error: the file is still
/// "known", just contributes nothing (§4.4).
pub fn parse_file(source: &str, language: Language) -> Vec<CodeNodeDraft> {
    match language {
        Language::Python => parse_with(source, tree_sitter_python::language(), extract_python_node),
        Language::TypeScript => parse_with(
            source,
            tree_sitter_typescript::language_typescript(),
            extract_ts_node,
        ),
        Language::JavaScript => parse_with(
            source,
            tree_sitter_typescript::language_typescript(),
            extract_ts_node,
        ),
        Language::Other => Vec::new(),
    }
}

fn parse_with(
    source: &str,
    language: tree_sitter::Language,
    extract: fn(&Node, &str, &str) -> Option<CodeNodeDraft>,
) -> Vec<CodeNodeDraft> {
    let mut parser = Parser::new();
    if parser.set_language(language).is_err() {
        return Vec::new();
    }
    let tree = match parser.parse(source, None) {
        Some(t) => t,
        None => return Vec::new(),
    };

    let root = tree.root_node();
    let mut out = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if let Some(node) = extract(&child, source, "") {
            out.push(node);
        }
    }
    out
}

fn body_hash(node: &Node, source: &str) -> String {
    let bytes = &source.as_bytes()[node.start_byte()..node.end_byte()];
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    hex::encode(digest)[..16].to_string()
}

fn line_range(node: &Node) -> (u32, u32) {
    (
        node.start_position().row as u32 + 1,
        node.end_position().row as u32 + 1,
    )
}

fn qualify(parent_qualified: &str, name: &str) -> String {
    if parent_qualified.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent_qualified, name)
    }
}

fn first_line_of(node: &Node, source: &str) -> String {
    node.utf8_text(source.as_bytes())
        .unwrap_or("")
        .lines()
        .next()
        .unwrap_or("")
        .trim_end_matches(':')
        .trim_end_matches('{')
        .trim()
        .to_string()
}

// --------------------------------------------------------------- python

fn extract_python_node(node: &Node, source: &str, parent_qualified: &str) -> Option<CodeNodeDraft> {
    match node.kind() {
        "function_definition" | "decorated_definition" => {
            let def_node = if node.kind() == "decorated_definition" {
                node.child_by_field_name("definition").unwrap_or(*node)
            } else {
                *node
            };
            match def_node.kind() {
                "function_definition" => {
                    extract_python_function(node, &def_node, source, parent_qualified)
                }
                "class_definition" => {
                    extract_python_class(node, &def_node, source, parent_qualified)
                }
                _ => None,
            }
        }
        "class_definition" => extract_python_class(node, node, source, parent_qualified),
        "import_statement" | "import_from_statement" => {
            let (start_line, end_line) = line_range(node);
            let text = node.utf8_text(source.as_bytes()).unwrap_or("").trim().to_string();
            Some(CodeNodeDraft {
                kind: CodeKind::Import,
                name: text.clone(),
                qualified_name: qualify(parent_qualified, &text),
                signature: Some(text),
                docstring: None,
                body_hash: body_hash(node, source),
                start_line,
                end_line,
                children: Vec::new(),
                refs: Vec::new(),
            })
        }
        _ => None,
    }
}

/// `outer` is the span to record (covers decorators when wrapped in a
/// `decorated_definition`); `def_node` is the plain `function_definition` to
/// read the name/body/docstring from.
fn extract_python_function(
    outer: &Node,
    def_node: &Node,
    source: &str,
    parent_qualified: &str,
) -> Option<CodeNodeDraft> {
    let name = def_node
        .child_by_field_name("name")?
        .utf8_text(source.as_bytes())
        .ok()?
        .to_string();
    let (start_line, end_line) = line_range(outer);
    let docstring = python_docstring(def_node, source);
    Some(CodeNodeDraft {
        kind: CodeKind::Function,
        qualified_name: qualify(parent_qualified, &name),
        signature: Some(first_line_of(def_node, source)),
        docstring,
        body_hash: body_hash(outer, source),
        start_line,
        end_line,
        children: Vec::new(),
        refs: Vec::new(),
        name,
    })
}

/// Same `outer`/`def_node` split as [`extract_python_function`], covering
/// both a bare `class_definition` (where `outer == def_node`) and one wrapped
/// in a `decorated_definition` (e.g. `@dataclass`).
fn extract_python_class(
    outer: &Node,
    def_node: &Node,
    source: &str,
    parent_qualified: &str,
) -> Option<CodeNodeDraft> {
    let name = def_node
        .child_by_field_name("name")?
        .utf8_text(source.as_bytes())
        .ok()?
        .to_string();
    let (start_line, end_line) = line_range(outer);
    let qualified_name = qualify(parent_qualified, &name);
    let docstring = python_docstring(def_node, source);

    let mut children = Vec::new();
    if let Some(body) = def_node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            if let Some(child) = extract_python_node(&member, source, &qualified_name) {
                children.push(child);
            }
        }
    }

    Some(CodeNodeDraft {
        kind: CodeKind::Class,
        name,
        qualified_name,
        signature: Some(first_line_of(def_node, source)),
        docstring,
        body_hash: body_hash(outer, source),
        start_line,
        end_line,
        children,
        refs: Vec::new(),
    })
}

fn python_docstring(def_node: &Node, source: &str) -> Option<String> {
    let body = def_node.child_by_field_name("body")?;
    let mut cursor = body.walk();
    for stmt in body.children(&mut cursor) {
        if stmt.kind() == "expression_statement" {
            if let Some(string_node) = stmt.named_child(0) {
                if string_node.kind() == "string" {
                    let raw = string_node.utf8_text(source.as_bytes()).ok()?;
                    return Some(strip_quotes(raw));
                }
            }
        }
        break;
    }
    None
}

fn strip_quotes(raw: &str) -> String {
    raw.trim()
        .trim_start_matches("\"\"\"")
        .trim_end_matches("\"\"\"")
        .trim_start_matches("'''")
        .trim_end_matches("'''")
        .trim_start_matches('"')
        .trim_end_matches('"')
        .trim_start_matches('\'')
        .trim_end_matches('\'')
        .trim()
        .to_string()
}

// ----------------------------------------------------- typescript/javascript

fn extract_ts_node(node: &Node, source: &str, parent_qualified: &str) -> Option<CodeNodeDraft> {
    match node.kind() {
        "function_declaration" => {
            let name = node
                .child_by_field_name("name")?
                .utf8_text(source.as_bytes())
                .ok()?
                .to_string();
            let (start_line, end_line) = line_range(node);
            Some(CodeNodeDraft {
                kind: CodeKind::Function,
                qualified_name: qualify(parent_qualified, &name),
                signature: Some(first_line_of(node, source)),
                docstring: None,
                body_hash: body_hash(node, source),
                start_line,
                end_line,
                children: Vec::new(),
                refs: Vec::new(),
                name,
            })
        }
        "class_declaration" => {
            let name = node
                .child_by_field_name("name")?
                .utf8_text(source.as_bytes())
                .ok()?
                .to_string();
            let (start_line, end_line) = line_range(node);
            let qualified_name = qualify(parent_qualified, &name);

            let mut children = Vec::new();
            if let Some(body) = node.child_by_field_name("body") {
                let mut cursor = body.walk();
                for member in body.children(&mut cursor) {
                    if let Some(child) = extract_ts_class_member(&member, source, &qualified_name) {
                        children.push(child);
                    }
                }
            }

            Some(CodeNodeDraft {
                kind: CodeKind::Class,
                name,
                qualified_name,
                signature: Some(first_line_of(node, source)),
                docstring: None,
                body_hash: body_hash(node, source),
                start_line,
                end_line,
                children,
                refs: Vec::new(),
            })
        }
        "interface_declaration" => {
            let name = node
                .child_by_field_name("name")?
                .utf8_text(source.as_bytes())
                .ok()?
                .to_string();
            let (start_line, end_line) = line_range(node);
            Some(CodeNodeDraft {
                kind: CodeKind::Interface,
                qualified_name: qualify(parent_qualified, &name),
                signature: Some(first_line_of(node, source)),
                docstring: None,
                body_hash: body_hash(node, source),
                start_line,
                end_line,
                children: Vec::new(),
                refs: Vec::new(),
                name,
            })
        }
        "type_alias_declaration" => {
            let name = node
                .child_by_field_name("name")?
                .utf8_text(source.as_bytes())
                .ok()?
                .to_string();
            let (start_line, end_line) = line_range(node);
            Some(CodeNodeDraft {
                kind: CodeKind::TypeAlias,
                qualified_name: qualify(parent_qualified, &name),
                signature: Some(first_line_of(node, source)),
                docstring: None,
                body_hash: body_hash(node, source),
                start_line,
                end_line,
                children: Vec::new(),
                refs: Vec::new(),
                name,
            })
        }
        "import_statement" => {
            let (start_line, end_line) = line_range(node);
            let text = node.utf8_text(source.as_bytes()).unwrap_or("").trim().to_string();
            Some(CodeNodeDraft {
                kind: CodeKind::Import,
                name: text.clone(),
                qualified_name: qualify(parent_qualified, &text),
                signature: Some(text),
                docstring: None,
                body_hash: body_hash(node, source),
                start_line,
                end_line,
                children: Vec::new(),
                refs: Vec::new(),
            })
        }
        "lexical_declaration" | "variable_declaration" => extract_ts_arrow_const(node, source, parent_qualified),
        "export_statement" => {
            let mut cursor = node.walk();
            let inner = node.children(&mut cursor).find(|c| {
                matches!(
                    c.kind(),
                    "function_declaration"
                        | "class_declaration"
                        | "interface_declaration"
                        | "type_alias_declaration"
                        | "lexical_declaration"
                        | "variable_declaration"
                )
            })?;
            let mut draft = extract_ts_node(&inner, source, parent_qualified)?;
            let (start_line, end_line) = line_range(node);
            draft.start_line = start_line;
            draft.end_line = end_line;
            draft.body_hash = body_hash(node, source);
            Some(draft)
        }
        _ => None,
    }
}

fn extract_ts_class_member(node: &Node, source: &str, parent_qualified: &str) -> Option<CodeNodeDraft> {
    if node.kind() != "method_definition" {
        return None;
    }
    let name = node
        .child_by_field_name("name")?
        .utf8_text(source.as_bytes())
        .ok()?
        .to_string();
    let (start_line, end_line) = line_range(node);
    Some(CodeNodeDraft {
        kind: CodeKind::Function,
        qualified_name: qualify(parent_qualified, &name),
        signature: Some(first_line_of(node, source)),
        docstring: None,
        body_hash: body_hash(node, source),
        start_line,
        end_line,
        children: Vec::new(),
        refs: Vec::new(),
        name,
    })
}

/// `const foo = (...) => {...}` at top level: treated as a function node.
fn extract_ts_arrow_const(node: &Node, source: &str, parent_qualified: &str) -> Option<CodeNodeDraft> {
    let mut cursor = node.walk();
    for declarator in node.children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let value = declarator.child_by_field_name("value")?;
        if value.kind() != "arrow_function" {
            continue;
        }
        let name = declarator
            .child_by_field_name("name")?
            .utf8_text(source.as_bytes())
            .ok()?
            .to_string();
        let (start_line, end_line) = line_range(node);
        return Some(CodeNodeDraft {
            kind: CodeKind::Function,
            qualified_name: qualify(parent_qualified, &name),
            signature: Some(first_line_of(node, source)),
            docstring: None,
            body_hash: body_hash(node, source),
            start_line,
            end_line,
            children: Vec::new(),
            refs: Vec::new(),
            name,
        });
    }
    None
}

/// Validates the file is readable UTF-8 source before parsing; used by the
/// code indexer to turn a raw I/O/encoding error into [`CoreError::ParseFailure`].
pub fn read_source(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CoreError::ParseFailure {
        path: path.to_string_lossy().into_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_extensions() {
        assert_eq!(detect_language("a.py"), Language::Python);
        assert_eq!(detect_language("a.ts"), Language::TypeScript);
        assert_eq!(detect_language("a.tsx"), Language::TypeScript);
        assert_eq!(detect_language("a.js"), Language::JavaScript);
        assert_eq!(detect_language("a.rs"), Language::Other);
        assert_eq!(detect_language("a.unknownext"), Language::Other);
    }

    #[test]
    fn other_language_returns_empty_forest() {
        let nodes = parse_file("fn main() {}", Language::Other);
        assert!(nodes.is_empty());
    }

    #[test]
    fn python_class_with_methods() {
        let src = "class Calculator:\n    def add(self, a, b):\n        return a + b\n\n    def subtract(self, a, b):\n        return a - b\n";
        let nodes = parse_file(src, Language::Python);
        assert_eq!(nodes.len(), 1);
        let class = &nodes[0];
        assert_eq!(class.kind, CodeKind::Class);
        assert_eq!(class.name, "Calculator");
        assert_eq!(class.children.len(), 2);
        assert_eq!(class.children[0].qualified_name, "Calculator.add");
        assert_eq!(class.children[1].qualified_name, "Calculator.subtract");
    }

    #[test]
    fn python_top_level_function() {
        let src = "def read_file(path):\n    return open(path).read()\n";
        let nodes = parse_file(src, Language::Python);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, CodeKind::Function);
        assert_eq!(nodes[0].name, "read_file");
    }

    #[test]
    fn python_docstring_is_captured() {
        let src = "def greet(name):\n    \"\"\"Say hello to someone.\"\"\"\n    return f\"hi {name}\"\n";
        let nodes = parse_file(src, Language::Python);
        assert_eq!(nodes[0].docstring.as_deref(), Some("Say hello to someone."));
    }

    #[test]
    fn python_decorated_class_is_extracted_with_methods() {
        let src = "@dataclass\nclass Point:\n    def dist(self):\n        return 0\n";
        let nodes = parse_file(src, Language::Python);
        assert_eq!(nodes.len(), 1);
        let class = &nodes[0];
        assert_eq!(class.kind, CodeKind::Class);
        assert_eq!(class.name, "Point");
        assert_eq!(class.children.len(), 1);
        assert_eq!(class.children[0].qualified_name, "Point.dist");
    }

    #[test]
    fn python_decorated_function_is_still_extracted() {
        let src = "@staticmethod\ndef add(a, b):\n    return a + b\n";
        let nodes = parse_file(src, Language::Python);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].kind, CodeKind::Function);
        assert_eq!(nodes[0].name, "add");
    }

    #[test]
    fn typescript_interface_and_function() {
        let src = "interface User {\n  id: string;\n}\n\nfunction greet(u: User) {\n  return u.id;\n}\n";
        let nodes = parse_file(src, Language::TypeScript);
        assert!(nodes.iter().any(|n| n.kind == CodeKind::Interface && n.name == "User"));
        assert!(nodes.iter().any(|n| n.kind == CodeKind::Function && n.name == "greet"));
    }

    #[test]
    fn typescript_exported_declarations_are_extracted() {
        let src = "export function greet(u) {\n  return u;\n}\n\nexport class Widget {\n  render() {}\n}\n\nexport interface Props {\n  id: string;\n}\n\nexport type Id = string;\n\nexport const make = () => {\n  return 1;\n};\n";
        let nodes = parse_file(src, Language::TypeScript);
        assert!(nodes.iter().any(|n| n.kind == CodeKind::Function && n.name == "greet"));
        assert!(nodes.iter().any(|n| n.kind == CodeKind::Class && n.name == "Widget"));
        assert!(nodes.iter().any(|n| n.kind == CodeKind::Interface && n.name == "Props"));
        assert!(nodes.iter().any(|n| n.kind == CodeKind::TypeAlias && n.name == "Id"));
        assert!(nodes.iter().any(|n| n.kind == CodeKind::Function && n.name == "make"));
    }

    #[test]
    fn body_hash_is_16_hex_chars() {
        let src = "def f():\n    pass\n";
        let nodes = parse_file(src, Language::Python);
        assert_eq!(nodes[0].body_hash.len(), 16);
        assert!(nodes[0].body_hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
