// A1 - autonomous single-transaction EVM exploit agent
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! A whitespace/regex pseudo-parser over Solidity source text: pragma/import extraction,
//! contract-level entity extraction (inheritance, functions, events, modifiers, rough
//! state-variable list), a dependency graph, transitive-closure extraction, and a source
//! sanitizer.
//!
//! Covers comment stripping, whitespace normalization, and multi-file source merging, plus
//! dependency-graph/closure extraction (inheritance + usage scanning, minimal-extraction,
//! unused-contract pruning) over the same parsed entity model.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Kind of Solidity top-level entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// `contract`.
    Contract,
    /// `abstract contract`.
    AbstractContract,
    /// `interface`.
    Interface,
    /// `library`.
    Library,
}

/// One `import` statement, in any of the three supported forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStatement {
    /// The imported file path.
    pub path: String,
    /// Imported names and optional aliases, e.g. `[("IERC20", None), ("SafeMath", Some("SM"))]`.
    /// Empty for a plain (non-`{}`) import.
    pub names: Vec<(String, Option<String>)>,
    /// Whole-module alias for `import "path" as Alias;`.
    pub module_alias: Option<String>,
}

/// One parsed top-level Solidity entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Entity name.
    pub name: String,
    /// Entity kind.
    pub kind: EntityKind,
    /// Parent names from the `is` clause, base name only (constructor args stripped).
    pub inherits: Vec<String>,
    /// Function names declared directly in this entity.
    pub functions: Vec<String>,
    /// Event names declared directly in this entity.
    pub events: Vec<String>,
    /// Modifier names declared directly in this entity.
    pub modifiers: Vec<String>,
    /// A rough (heuristic) list of top-level state variable declarations.
    pub state_vars: Vec<String>,
    /// 1-based source line the entity's declaration starts on.
    pub start_line: usize,
    /// 1-based source line the entity's closing brace is on.
    pub end_line: usize,
    /// The entity's full source text, declaration through closing brace, inclusive.
    pub source: String,
}

/// Pragma + imports + entities for one source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedSource {
    /// The `pragma solidity` version string, if present.
    pub pragma: Option<String>,
    /// Import statements, in source order.
    pub imports: Vec<ImportStatement>,
    /// Entities keyed by name, in source order via `entity_order`.
    pub entities: BTreeMap<String, Entity>,
    /// Entity names in the order they appear in source (`BTreeMap` above is name-sorted).
    pub entity_order: Vec<String>,
}

/// Inheritance and usage edges derived from a [`ParsedSource`].
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Entity name -> parent entity names.
    pub inheritance: BTreeMap<String, Vec<String>>,
    /// Entity name -> names of other entities referenced in its body.
    pub usages: BTreeMap<String, Vec<String>>,
}

static PRAGMA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"pragma\s+solidity\s+([^;]+);").unwrap());
static NAMED_IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s*\{([^}]+)\}\s*from\s*"([^"]+)"\s*;"#).unwrap());
static ALIASED_IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"import\s+"([^"]+)"\s+as\s+(\w+)\s*;"#).unwrap());
static PLAIN_IMPORT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"import\s+"([^"]+)"\s*;"#).unwrap());
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(abstract\s+contract|contract|interface|library)\s+(\w+)(\s+is\s+([^{]+))?\{").unwrap()
});
static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bfunction\s+(\w+)\s*\(").unwrap());
static EVENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bevent\s+(\w+)\s*\(").unwrap());
static MODIFIER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bmodifier\s+(\w+)\s*\(").unwrap());
static STATE_VAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(mapping\s*\([^;{}]+\)|[A-Za-z_][\w\[\]]*)(\s+(public|private|internal|constant|immutable))*\s+(\w+)\s*(=[^;]*)?;$",
    )
    .unwrap()
});
static NEW_CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnew\s+([A-Z]\w*)\s*\(").unwrap());
static TYPE_DECL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]\w*)\s+(?:public\s+|private\s+|internal\s+|immutable\s+)*\w+\s*[;=]").unwrap());
static CAST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z]\w*)\s*\(\s*(?:payable\s*\()?address\s*\(").unwrap());
static STATIC_CALL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z]\w*)\.\w+\s*\(").unwrap());

fn first_ident(s: &str) -> Option<String> {
    let ident: String =
        s.trim().chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
    if ident.is_empty() {
        None
    } else {
        Some(ident)
    }
}

/// Splits an `is` clause into base parent names, respecting parenthesized constructor args so
/// `Base(arg1, arg2), Other` yields `["Base", "Other"]` rather than splitting inside the args.
fn parse_inherits(text: &str) -> Vec<String> {
    let mut parents = vec![];
    let mut depth = 0i32;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                if let Some(name) = first_ident(&current) {
                    parents.push(name);
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if let Some(name) = first_ident(&current) {
        parents.push(name);
    }
    parents
}

/// Extracts the `pragma solidity` version string, if any.
pub fn extract_pragma(code: &str) -> Option<String> {
    PRAGMA_RE.captures(code).map(|c| c[1].trim().to_string())
}

/// Extracts all three supported `import` forms, in source order.
pub fn extract_imports(code: &str) -> Vec<ImportStatement> {
    let mut spans: Vec<(usize, usize, ImportStatement)> = vec![];

    for m in NAMED_IMPORT_RE.captures_iter(code) {
        let whole = m.get(0).unwrap();
        let names = m[1]
            .split(',')
            .filter_map(|piece| {
                let piece = piece.trim();
                if piece.is_empty() {
                    return None;
                }
                if let Some((name, alias)) = piece.split_once(" as ") {
                    Some((name.trim().to_string(), Some(alias.trim().to_string())))
                } else {
                    Some((piece.to_string(), None))
                }
            })
            .collect();
        spans.push((
            whole.start(),
            whole.end(),
            ImportStatement { path: m[2].to_string(), names, module_alias: None },
        ));
    }

    for m in ALIASED_IMPORT_RE.captures_iter(code) {
        let whole = m.get(0).unwrap();
        if spans.iter().any(|(s, e, _)| whole.start() < *e && whole.end() > *s) {
            continue;
        }
        spans.push((
            whole.start(),
            whole.end(),
            ImportStatement { path: m[1].to_string(), names: vec![], module_alias: Some(m[2].to_string()) },
        ));
    }

    for m in PLAIN_IMPORT_RE.captures_iter(code) {
        let whole = m.get(0).unwrap();
        if spans.iter().any(|(s, e, _)| whole.start() < *e && whole.end() > *s) {
            continue;
        }
        spans.push((
            whole.start(),
            whole.end(),
            ImportStatement { path: m[1].to_string(), names: vec![], module_alias: None },
        ));
    }

    spans.sort_by_key(|(s, _, _)| *s);
    spans.into_iter().map(|(_, _, import)| import).collect()
}

/// Extracts bare entity names (`contract|interface|library|abstract contract Foo`), without the
/// rest of [`Entity`]'s detail.
pub fn extract_contract_names(code: &str) -> Vec<String> {
    ENTITY_RE.captures_iter(code).map(|c| c[2].to_string()).collect()
}

fn line_of(code: &str, byte_offset: usize) -> usize {
    code[..byte_offset].matches('\n').count() + 1
}

/// Scans forward from `open_brace_idx` (which must point at `{`) for the matching close brace,
/// skipping over line comments, block comments, and string/char literals so braces inside them
/// are not counted.
fn find_matching_brace(bytes: &[u8], open_brace_idx: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut i = open_brace_idx;
    #[derive(PartialEq)]
    enum State {
        Normal,
        LineComment,
        BlockComment,
        Str(u8),
    }
    let mut state = State::Normal;
    while i < bytes.len() {
        let b = bytes[i];
        match state {
            State::Normal => match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                    state = State::LineComment;
                    i += 1;
                }
                b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'*' => {
                    state = State::BlockComment;
                    i += 1;
                }
                b'"' | b'\'' => state = State::Str(b),
                _ => {}
            },
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if b == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    state = State::Normal;
                    i += 1;
                }
            }
            State::Str(quote) => {
                if b == b'\\' {
                    i += 1;
                } else if b == quote {
                    state = State::Normal;
                }
            }
        }
        i += 1;
    }
    None
}

fn extract_state_vars(body: &str) -> Vec<String> {
    let mut depth = 0i32;
    let mut vars = vec![];
    for line in body.lines() {
        let trimmed = line.trim();
        if depth == 0 && !trimmed.is_empty() {
            if let Some(m) = STATE_VAR_RE.find(trimmed) {
                vars.push(m.as_str().trim_end_matches(';').trim().to_string());
            }
        }
        depth += line.matches('{').count() as i32;
        depth -= line.matches('}').count() as i32;
    }
    vars
}

fn scan_usages(body: &str, self_name: &str, known_entities: &HashSet<String>) -> Vec<String> {
    let mut found = HashSet::new();
    for re in [&*NEW_CALL_RE, &*TYPE_DECL_RE, &*CAST_RE, &*STATIC_CALL_RE] {
        for m in re.captures_iter(body) {
            let name = &m[1];
            if name != self_name && known_entities.contains(name) {
                found.insert(name.to_string());
            }
        }
    }
    let mut out: Vec<String> = found.into_iter().collect();
    out.sort();
    out
}

/// Parses `code` into pragma, imports, and entities (with functions/events/modifiers/state vars
/// and line ranges), but without resolving usages (see [`dependency_graph`] for that, since usage
/// resolution needs the full set of entity names first).
pub fn parse(code: &str) -> ParsedSource {
    let pragma = extract_pragma(code);
    let imports = extract_imports(code);
    let bytes = code.as_bytes();

    let mut entities = BTreeMap::new();
    let mut entity_order = vec![];

    for m in ENTITY_RE.captures_iter(code) {
        let whole = m.get(0).unwrap();
        let kind = match &m[1] {
            "contract" => EntityKind::Contract,
            "interface" => EntityKind::Interface,
            "library" => EntityKind::Library,
            _ => EntityKind::AbstractContract,
        };
        let name = m[2].to_string();
        let inherits = m.get(4).map(|g| parse_inherits(g.as_str())).unwrap_or_default();
        let open_brace_idx = whole.end() - 1;
        let Some(close_idx) = find_matching_brace(bytes, open_brace_idx) else { continue };

        let body = &code[open_brace_idx + 1..close_idx];
        let functions = FUNCTION_RE.captures_iter(body).map(|c| c[1].to_string()).collect();
        let events = EVENT_RE.captures_iter(body).map(|c| c[1].to_string()).collect();
        let modifiers = MODIFIER_RE.captures_iter(body).map(|c| c[1].to_string()).collect();
        let state_vars = extract_state_vars(body);
        let start_line = line_of(code, whole.start());
        let end_line = line_of(code, close_idx);
        let source = code[whole.start()..=close_idx].to_string();

        entity_order.push(name.clone());
        entities.insert(
            name.clone(),
            Entity {
                name,
                kind,
                inherits,
                functions,
                events,
                modifiers,
                state_vars,
                start_line,
                end_line,
                source,
            },
        );
    }

    ParsedSource { pragma, imports, entities, entity_order }
}

/// Builds the inheritance + usage dependency graph over `parsed`'s entities.
pub fn dependency_graph(parsed: &ParsedSource) -> DependencyGraph {
    let known: HashSet<String> = parsed.entities.keys().cloned().collect();
    let mut inheritance = BTreeMap::new();
    let mut usages = BTreeMap::new();

    for (name, entity) in &parsed.entities {
        inheritance.insert(name.clone(), entity.inherits.clone());
        let body_start = entity.source.find('{').map(|i| i + 1).unwrap_or(0);
        let body = &entity.source[body_start..];
        usages.insert(name.clone(), scan_usages(body, name, &known));
    }

    DependencyGraph { inheritance, usages }
}

/// The transitive closure of `target` (inclusive) over inheritance and usage edges.
pub fn required_contracts(graph: &DependencyGraph, target: &str) -> HashSet<String> {
    let mut visited = HashSet::new();
    let mut stack = vec![target.to_string()];
    while let Some(name) = stack.pop() {
        if !visited.insert(name.clone()) {
            continue;
        }
        if let Some(parents) = graph.inheritance.get(&name) {
            stack.extend(parents.iter().cloned());
        }
        if let Some(uses) = graph.usages.get(&name) {
            stack.extend(uses.iter().cloned());
        }
    }
    visited
}

fn topo_visit(
    name: &str,
    required: &HashSet<String>,
    graph: &DependencyGraph,
    visited: &mut HashSet<String>,
    visiting: &mut HashSet<String>,
    order: &mut Vec<String>,
) {
    if visited.contains(name) || !required.contains(name) {
        return;
    }
    if !visiting.insert(name.to_string()) {
        return; // cycle guard: skip the revisited node
    }
    if let Some(parents) = graph.inheritance.get(name) {
        for p in parents {
            topo_visit(p, required, graph, visited, visiting, order);
        }
    }
    if let Some(uses) = graph.usages.get(name) {
        for u in uses {
            topo_visit(u, required, graph, visited, visiting, order);
        }
    }
    visiting.remove(name);
    visited.insert(name.to_string());
    order.push(name.to_string());
}

/// Serializes just `target`'s transitive closure, in topological order (dependencies precede
/// dependents), cycles broken by skipping the revisited node.
pub fn extract_minimal(parsed: &ParsedSource, target: &str) -> Option<String> {
    if !parsed.entities.contains_key(target) {
        return None;
    }
    let graph = dependency_graph(parsed);
    let required = required_contracts(&graph, target);

    let mut visited = HashSet::new();
    let mut visiting = HashSet::new();
    let mut order = vec![];
    topo_visit(target, &required, &graph, &mut visited, &mut visiting, &mut order);

    let parts: Vec<&str> =
        order.iter().filter_map(|name| parsed.entities.get(name)).map(|e| e.source.as_str()).collect();
    Some(parts.join("\n\n"))
}

/// `allEntities \ union(required(entryPoint) for entryPoint in entryPoints)`.
pub fn unused_contracts(parsed: &ParsedSource, entry_points: &[&str]) -> HashSet<String> {
    let graph = dependency_graph(parsed);
    let mut required = HashSet::new();
    for entry in entry_points {
        required.extend(required_contracts(&graph, entry));
    }
    parsed.entities.keys().filter(|name| !required.contains(*name)).cloned().collect()
}

fn remove_comments(code: &str) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(code.len());
    let bytes = code.as_bytes();
    let mut i = 0;
    #[derive(PartialEq)]
    enum State {
        Normal,
        Line,
        Block,
        Str(u8),
    }
    let mut state = State::Normal;
    while i < bytes.len() {
        let b = bytes[i];
        match state {
            State::Normal => {
                if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    state = State::Line;
                    i += 2;
                    continue;
                } else if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
                    state = State::Block;
                    i += 2;
                    continue;
                } else if b == b'"' || b == b'\'' {
                    state = State::Str(b);
                    out.push(b);
                } else {
                    out.push(b);
                }
            }
            State::Line => {
                if b == b'\n' {
                    state = State::Normal;
                    out.push(b'\n');
                }
            }
            State::Block => {
                if b == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    state = State::Normal;
                    i += 2;
                    continue;
                }
            }
            State::Str(quote) => {
                out.push(b);
                if b == b'\\' {
                    i += 1;
                    if i < bytes.len() {
                        out.push(bytes[i]);
                    }
                } else if b == quote {
                    state = State::Normal;
                }
            }
        }
        i += 1;
    }
    String::from_utf8(out).expect("byte-for-byte copy of a valid &str stays valid UTF-8")
}

fn remove_imports(code: &str) -> String {
    let re = Regex::new(r"(?m)^import\s+.*?;\n?").unwrap();
    re.replace_all(code, "").into_owned()
}

fn normalize_whitespace(code: &str) -> String {
    let mut lines: Vec<String> = code.lines().map(|l| l.trim_end().to_string()).collect();

    let mut result: Vec<String> = vec![];
    let mut prev_blank = false;
    for line in lines.drain(..) {
        let is_blank = line.trim().is_empty();
        if is_blank {
            if !prev_blank {
                result.push(line);
            }
            prev_blank = true;
        } else {
            result.push(line);
            prev_blank = false;
        }
    }

    while result.first().is_some_and(|l| l.trim().is_empty()) {
        result.remove(0);
    }
    while result.last().is_some_and(|l| l.trim().is_empty()) {
        result.pop();
    }

    result.join("\n")
}

/// Options for [`sanitize`].
#[derive(Debug, Clone, Copy)]
pub struct SanitizeOptions {
    /// Strip line, block, and NatSpec comments.
    pub remove_comments: bool,
    /// Strip `import` statements.
    pub remove_imports: bool,
    /// Trim trailing whitespace and collapse blank-line runs.
    pub normalize_whitespace: bool,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self { remove_comments: true, remove_imports: false, normalize_whitespace: true }
    }
}

/// Cleans Solidity source per `options`.
pub fn sanitize(code: &str, options: SanitizeOptions) -> String {
    let mut out = code.to_string();
    if options.remove_comments {
        out = remove_comments(&out);
    }
    if options.remove_imports {
        out = remove_imports(&out);
    }
    if options.normalize_whitespace {
        out = normalize_whitespace(&out);
    }
    out
}

/// Flattens multiple named sources into one file: a single (highest-version) pragma, imports and
/// per-file pragmas stripped, contract names de-duplicated in first-seen order, and
/// `main_contract`'s file (if named) emitted last.
pub fn merge_sources(sources: &[(String, String)], main_contract: Option<&str>) -> String {
    let mut pragmas: Vec<String> = sources.iter().filter_map(|(_, code)| extract_pragma(code)).collect();
    pragmas.sort();
    pragmas.dedup();
    pragmas.sort_by(|a, b| b.cmp(a));

    let mut parts = vec![];
    if let Some(p) = pragmas.first() {
        parts.push(format!("pragma solidity {p};\n"));
    }

    let mut order: Vec<&(String, String)> = sources.iter().collect();
    if let Some(main) = main_contract {
        if let Some(pos) = order.iter().position(|(path, _)| path.contains(main)) {
            let entry = order.remove(pos);
            order.push(entry);
        }
    }

    let pragma_strip_re = Regex::new(r"pragma\s+solidity\s+[^;]+;").unwrap();
    let import_strip_re = Regex::new(r"(?m)^import\s+.*?;").unwrap();

    let mut seen = HashSet::new();
    for (path, code) in order {
        let mut stripped = pragma_strip_re.replace_all(code, "").into_owned();
        stripped = import_strip_re.replace_all(&stripped, "").into_owned();

        let names = extract_contract_names(&stripped);
        let new_names: Vec<&String> = names.iter().filter(|n| !seen.contains(*n)).collect();
        if new_names.is_empty() {
            continue;
        }
        for n in &new_names {
            seen.insert((*n).clone());
        }
        let normalized = normalize_whitespace(&stripped);
        if !normalized.trim().is_empty() {
            parts.push(format!("// From: {path}\n{normalized}"));
        }
    }

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
pragma solidity ^0.8.19;

import "./IBase.sol";
import {IERC20, IERC20 as IToken} from "./IERC20.sol";

interface IBase {
    function ping() external;
}

contract Base is IBase {
    uint256 public value;

    function ping() external override {
        value = 1;
    }
}

contract Child is Base("seed") {
    address public owner;

    constructor() {
        owner = address(new Base());
    }
}
"#;

    #[test]
    fn extracts_pragma() {
        assert_eq!(extract_pragma(SAMPLE), Some("^0.8.19".to_string()));
    }

    #[test]
    fn extracts_all_import_forms() {
        let imports = extract_imports(SAMPLE);
        assert_eq!(imports.len(), 2);
        assert_eq!(imports[0].path, "./IBase.sol");
        assert_eq!(imports[1].names.len(), 2);
        assert_eq!(imports[1].names[1].1.as_deref(), Some("IToken"));
    }

    #[test]
    fn parses_entities_with_inheritance_and_bodies() {
        let parsed = parse(SAMPLE);
        assert_eq!(parsed.entities.len(), 3);
        let child = &parsed.entities["Child"];
        assert_eq!(child.inherits, vec!["Base".to_string()]);
        assert!(child.start_line < child.end_line);
    }

    #[test]
    fn required_contracts_includes_inheritance_and_usage() {
        let parsed = parse(SAMPLE);
        let graph = dependency_graph(&parsed);
        let required = required_contracts(&graph, "Child");
        assert!(required.contains("Child"));
        assert!(required.contains("Base"));
    }

    #[test]
    fn extract_minimal_orders_dependencies_first() {
        let parsed = parse(SAMPLE);
        let minimal = extract_minimal(&parsed, "Child").unwrap();
        let base_pos = minimal.find("contract Base").unwrap();
        let child_pos = minimal.find("contract Child").unwrap();
        assert!(base_pos < child_pos);
    }

    #[test]
    fn unused_contracts_excludes_reachable_set() {
        let parsed = parse(SAMPLE);
        let unused = unused_contracts(&parsed, &["Child"]);
        assert!(!unused.contains("Child"));
        assert!(!unused.contains("Base"));
    }

    #[test]
    fn sanitize_strips_comments_and_normalizes_blank_lines() {
        let code = "contract A {\n    // comment\n    uint x;\n\n\n    uint y;\n}\n";
        let out = sanitize(code, SanitizeOptions::default());
        assert!(!out.contains("// comment"));
        assert!(!out.contains("\n\n\n"));
    }

    #[test]
    fn merge_sources_dedupes_and_orders_main_last() {
        let a = ("A.sol".to_string(), "pragma solidity ^0.8.0;\ncontract A {}\n".to_string());
        let b = ("B.sol".to_string(), "pragma solidity ^0.8.19;\ncontract B {}\n".to_string());
        let merged = merge_sources(&[a, b], Some("B.sol"));
        assert!(merged.starts_with("pragma solidity ^0.8.19;"));
        assert!(merged.find("contract A").unwrap() < merged.find("contract B").unwrap());
    }
}
