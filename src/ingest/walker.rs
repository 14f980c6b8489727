//! AST walker over one parsed Java compilation unit.
//!
//! Emits one `TypeDecl` per top-level and nested class/interface declaration,
//! flattened into a single output list, each carrying its methods, fields,
//! and call edges. Nested types are discovered by recursive descent into each
//! type's body and keep the outer type's package.
//!
//! Source excerpts are reconstructed by brace-depth scanning from the
//! declaration's start line: a character-by-character net `{`/`}` count that
//! stops at the first return to zero. Excerpts are documentation enrichment
//! only and never feed semantic decisions.

use crate::error::{JavelinError, Result};
use crate::ingest::annotations::{collect_annotations, collect_modifiers};
use crate::ingest::imports::{collect_imports, ImportTable};
use crate::ingest::symbols::{CallResolver, SymbolTable};
use crate::model::{
    Annotation, CallEdge, FieldDecl, MethodDecl, ParamDecl, TypeDecl, TypeKind,
};
use ropey::Rope;
use std::path::Path;

/// Parse one Java source file into its flattened type declarations.
///
/// For a file with N top-level and nested type declarations this emits
/// exactly N `TypeDecl` records with N distinct qualified names. Every call
/// edge's source endpoint references a method emitted here.
pub fn parse_compilation_unit(path: &Path, source: &[u8]) -> Result<Vec<TypeDecl>> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&tree_sitter_java::language())
        .map_err(|e| JavelinError::Parse {
            file: path.to_path_buf(),
            message: format!("Failed to set Java language: {:?}", e),
        })?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| JavelinError::Parse {
            file: path.to_path_buf(),
            message: "Parse failed - no tree returned".to_string(),
        })?;

    let text = std::str::from_utf8(source)?;
    let rope = Rope::from_str(text);
    let root = tree.root_node();

    let package = package_name(root, source).unwrap_or_default();
    let imports = collect_imports(root, source);

    let ctx = WalkContext {
        source,
        rope: &rope,
        package: &package,
        imports: &imports,
        path: &path.to_string_lossy(),
    };

    let mut types = Vec::new();
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if is_type_declaration(child.kind()) {
            walk_type(child, &ctx, "", &mut types);
        }
    }

    Ok(types)
}

/// Shared per-file state threaded through the recursive walk.
struct WalkContext<'a> {
    source: &'a [u8],
    rope: &'a Rope,
    package: &'a str,
    imports: &'a ImportTable,
    path: &'a str,
}

fn is_type_declaration(kind: &str) -> bool {
    matches!(kind, "class_declaration" | "interface_declaration")
}

/// Extract the package declaration from the compilation unit root.
fn package_name(root: tree_sitter::Node, source: &[u8]) -> Option<String> {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() == "package_declaration" {
            let mut package_cursor = child.walk();
            for part in child.children(&mut package_cursor) {
                if matches!(part.kind(), "scoped_identifier" | "identifier") {
                    return part.utf8_text(source).ok().map(|s| s.to_string());
                }
            }
        }
    }
    None
}

/// Walk one type declaration and recurse into nested declarations.
///
/// `outer` is the dotted chain of enclosing simple names, empty for
/// top-level types.
fn walk_type(node: tree_sitter::Node, ctx: &WalkContext, outer: &str, types: &mut Vec<TypeDecl>) {
    let Some(simple_name) = node
        .child_by_field_name("name")
        .and_then(|n| n.utf8_text(ctx.source).ok())
        .map(|s| s.to_string())
    else {
        return;
    };

    let kind = if node.kind() == "interface_declaration" {
        TypeKind::Interface
    } else {
        TypeKind::Class
    };

    let local_path = if outer.is_empty() {
        simple_name.clone()
    } else {
        format!("{}.{}", outer, simple_name)
    };
    let qualified_name = if ctx.package.is_empty() {
        local_path.clone()
    } else {
        format!("{}.{}", ctx.package, local_path)
    };

    let (superclass, interfaces) = supertype_references(node, ctx.source, kind);
    let annotations = collect_annotations(node, ctx.source);
    let excerpt = extract_excerpt(ctx.rope, node.start_position().row);

    let mut decl = TypeDecl {
        qualified_name,
        simple_name: simple_name.clone(),
        package: ctx.package.to_string(),
        kind,
        superclass,
        interfaces,
        declared_at: ctx.path.to_string(),
        excerpt,
        annotations,
        methods: Vec::new(),
        fields: Vec::new(),
        calls: Vec::new(),
    };

    let mut nested = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        // First pass: fields, so the symbol table sees them for every method.
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            if member.kind() == "field_declaration" {
                extract_fields(member, ctx.source, &mut decl.fields);
            }
        }

        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "method_declaration" => {
                    extract_method(member, ctx, &mut decl, false);
                }
                "constructor_declaration" => {
                    extract_method(member, ctx, &mut decl, true);
                }
                kind if is_type_declaration(kind) => nested.push(member),
                _ => {}
            }
        }
    }

    if has_accessor_marker(&decl.annotations) {
        synthesize_accessors(&mut decl);
    }

    types.push(decl);

    for member in nested {
        walk_type(member, ctx, &local_path, types);
    }
}

/// Superclass and interface references as written in source.
fn supertype_references(
    node: tree_sitter::Node,
    source: &[u8],
    kind: TypeKind,
) -> (Option<String>, Vec<String>) {
    let mut superclass = None;
    let mut interfaces = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "superclass" => {
                let mut type_cursor = child.walk();
                for part in child.named_children(&mut type_cursor) {
                    if let Ok(text) = part.utf8_text(source) {
                        superclass = Some(text.to_string());
                    }
                }
            }
            "super_interfaces" | "extends_interfaces" => {
                collect_type_list(child, source, &mut interfaces);
            }
            _ => {}
        }
    }

    // Interfaces have no superclass; their extends list lands in interfaces.
    if kind == TypeKind::Interface {
        superclass = None;
    }

    (superclass, interfaces)
}

fn collect_type_list(node: tree_sitter::Node, source: &[u8], out: &mut Vec<String>) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "type_list" {
            let mut list_cursor = child.walk();
            for entry in child.named_children(&mut list_cursor) {
                if let Ok(text) = entry.utf8_text(source) {
                    out.push(text.to_string());
                }
            }
        }
    }
}

/// One `FieldDecl` per declarator: `int a, b;` yields two fields.
fn extract_fields(node: tree_sitter::Node, source: &[u8], fields: &mut Vec<FieldDecl>) {
    let type_name = node
        .child_by_field_name("type")
        .and_then(|n| n.utf8_text(source).ok())
        .unwrap_or_default()
        .to_string();
    let modifiers = collect_modifiers(node, source);
    let annotations = collect_annotations(node, source);

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "variable_declarator" {
            if let Some(name) = child
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source).ok())
            {
                fields.push(FieldDecl {
                    name: name.to_string(),
                    type_name: type_name.clone(),
                    modifiers: modifiers.clone(),
                    annotations: annotations.clone(),
                });
            }
        }
    }
}

/// Extract one method or constructor and its call edges.
fn extract_method(
    node: tree_sitter::Node,
    ctx: &WalkContext,
    decl: &mut TypeDecl,
    is_constructor: bool,
) {
    let name = if is_constructor {
        decl.simple_name.clone()
    } else {
        match node
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(ctx.source).ok())
        {
            Some(name) => name.to_string(),
            None => return,
        }
    };

    let return_type = if is_constructor {
        decl.simple_name.clone()
    } else {
        node.child_by_field_name("type")
            .and_then(|n| n.utf8_text(ctx.source).ok())
            .unwrap_or("void")
            .to_string()
    };

    let parameters = extract_parameters(node, ctx.source);
    let method = MethodDecl {
        name: name.clone(),
        return_type,
        parameters: parameters.clone(),
        modifiers: collect_modifiers(node, ctx.source),
        annotations: collect_annotations(node, ctx.source),
        excerpt: extract_excerpt(ctx.rope, node.start_position().row),
        is_constructor,
        generated: false,
        line: node.start_position().row + 1,
    };

    if let Some(body) = node.child_by_field_name("body") {
        let locals = collect_locals(body, ctx.source);
        let table = SymbolTable::build(&decl.fields, &parameters, &locals);
        let resolver = CallResolver::new(&table, ctx.imports, &decl.qualified_name, ctx.package);

        let mut invocations = Vec::new();
        collect_invocations(body, ctx.source, &mut invocations);

        let mut ordinal = 0;
        for (qualifier, member, line) in invocations {
            if let Some((target_type, target_method)) =
                resolver.resolve(qualifier.as_deref(), &member)
            {
                decl.calls.push(CallEdge {
                    source_type: decl.qualified_name.clone(),
                    source_method: name.clone(),
                    target_type,
                    target_method,
                    ordinal,
                    line,
                });
                ordinal += 1;
            }
        }
    }

    decl.methods.push(method);
}

/// Parameters in declaration order.
fn extract_parameters(node: tree_sitter::Node, source: &[u8]) -> Vec<ParamDecl> {
    let mut parameters = Vec::new();

    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.children(&mut cursor) {
            if !matches!(param.kind(), "formal_parameter" | "spread_parameter") {
                continue;
            }
            let type_name = param
                .child_by_field_name("type")
                .and_then(|n| n.utf8_text(source).ok())
                .unwrap_or_default()
                .to_string();
            if let Some(name) = param
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source).ok())
            {
                parameters.push(ParamDecl {
                    name: name.to_string(),
                    type_name,
                });
            }
        }
    }

    parameters
}

/// Every local declaration anywhere in the method body, including nested
/// blocks and control-flow bodies. Visibility is flow-insensitive: the whole
/// method sees each local regardless of declaration order.
fn collect_locals(node: tree_sitter::Node, source: &[u8]) -> Vec<(String, String)> {
    let mut locals = Vec::new();
    collect_locals_into(node, source, &mut locals);
    locals
}

fn collect_locals_into(node: tree_sitter::Node, source: &[u8], locals: &mut Vec<(String, String)>) {
    if node.kind() == "local_variable_declaration" {
        let type_name = node
            .child_by_field_name("type")
            .and_then(|n| n.utf8_text(source).ok())
            .unwrap_or_default()
            .to_string();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "variable_declarator" {
                if let Some(name) = child
                    .child_by_field_name("name")
                    .and_then(|n| n.utf8_text(source).ok())
                {
                    locals.push((name.to_string(), type_name.clone()));
                }
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_locals_into(child, source, locals);
    }
}

/// Method invocations in source (pre-order) position, as
/// (qualifier, member, line).
fn collect_invocations(
    node: tree_sitter::Node,
    source: &[u8],
    out: &mut Vec<(Option<String>, String, usize)>,
) {
    if node.kind() == "method_invocation" {
        let qualifier = node
            .child_by_field_name("object")
            .and_then(|n| n.utf8_text(source).ok())
            .map(|s| s.to_string());
        if let Some(member) = node
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok())
        {
            out.push((qualifier, member.to_string(), node.start_position().row + 1));
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_invocations(child, source, out);
    }
}

/// Reconstruct a source excerpt by brace-depth scanning.
///
/// Scans character by character from the start of `start_row` (0-based),
/// keeping a net `{`/`}` count, and stops at the first return to zero. A
/// `;` before any opening brace ends the excerpt (abstract methods,
/// interface members).
pub fn extract_excerpt(rope: &Rope, start_row: usize) -> String {
    if start_row >= rope.len_lines() {
        return String::new();
    }

    let start_char = rope.line_to_char(start_row);
    let mut excerpt = String::new();
    let mut depth: i64 = 0;
    let mut opened = false;

    for ch in rope.chars_at(start_char) {
        excerpt.push(ch);
        match ch {
            '{' => {
                depth += 1;
                opened = true;
            }
            '}' => {
                depth -= 1;
                if opened && depth == 0 {
                    break;
                }
            }
            ';' if !opened => break,
            _ => {}
        }
    }

    excerpt
}

/// Whether the type carries an accessor-generation marker.
fn has_accessor_marker(annotations: &[Annotation]) -> bool {
    let has = |name: &str| annotations.iter().any(|a| a.name == name);
    has("Data") || (has("Getter") && has("Setter"))
}

/// Synthesize getter/setter methods for every field plus
/// `equals`/`hashCode`/`toString`, flagged generated with no excerpt, so
/// downstream consumers see the complete method surface.
fn synthesize_accessors(decl: &mut TypeDecl) {
    let fields: Vec<(String, String)> = decl
        .fields
        .iter()
        .map(|f| (f.name.clone(), f.type_name.clone()))
        .collect();

    for (name, type_name) in &fields {
        decl.methods.push(generated_method(
            format!("get{}", capitalize(name)),
            type_name.clone(),
            Vec::new(),
        ));
        decl.methods.push(generated_method(
            format!("set{}", capitalize(name)),
            "void".to_string(),
            vec![ParamDecl {
                name: name.clone(),
                type_name: type_name.clone(),
            }],
        ));
    }

    decl.methods.push(generated_method(
        "equals".to_string(),
        "boolean".to_string(),
        vec![ParamDecl {
            name: "other".to_string(),
            type_name: "Object".to_string(),
        }],
    ));
    decl.methods.push(generated_method(
        "hashCode".to_string(),
        "int".to_string(),
        Vec::new(),
    ));
    decl.methods.push(generated_method(
        "toString".to_string(),
        "String".to_string(),
        Vec::new(),
    ));
}

fn generated_method(name: String, return_type: String, parameters: Vec<ParamDecl>) -> MethodDecl {
    MethodDecl {
        name,
        return_type,
        parameters,
        modifiers: vec!["public".to_string()],
        annotations: Vec::new(),
        excerpt: String::new(),
        is_constructor: false,
        generated: true,
        line: 0,
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &[u8]) -> Vec<TypeDecl> {
        parse_compilation_unit(Path::new("Test.java"), source).expect("parse")
    }

    #[test]
    fn test_simple_class() {
        let types = parse(b"package com.example;\n\npublic class Greeter {}\n");
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].qualified_name, "com.example.Greeter");
        assert_eq!(types[0].simple_name, "Greeter");
        assert_eq!(types[0].kind, TypeKind::Class);
        assert_eq!(types[0].package, "com.example");
    }

    #[test]
    fn test_default_package() {
        let types = parse(b"class Greeter {}\n");
        assert_eq!(types[0].qualified_name, "Greeter");
        assert_eq!(types[0].package, "");
    }

    #[test]
    fn test_nested_types_flattened() {
        let source = b"package p;\nclass Outer {\n  class Inner {\n    class Innermost {}\n  }\n}\n";
        let types = parse(source);
        let names: Vec<&str> = types.iter().map(|t| t.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["p.Outer", "p.Outer.Inner", "p.Outer.Inner.Innermost"]);
        // Nested types carry the outer type's package.
        assert!(types.iter().all(|t| t.package == "p"));
    }

    #[test]
    fn test_type_count_matches_declarations() {
        let source = b"package p;\nclass A { static class B {} }\ninterface C {}\n";
        let types = parse(source);
        assert_eq!(types.len(), 3);
        let mut names: Vec<&str> = types.iter().map(|t| t.qualified_name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_supertypes_recorded() {
        let source = b"package p;\nclass A extends Base implements Runnable, Closeable {}\n";
        let types = parse(source);
        assert_eq!(types[0].superclass.as_deref(), Some("Base"));
        assert_eq!(types[0].interfaces, vec!["Runnable", "Closeable"]);
    }

    #[test]
    fn test_interface_extends_lands_in_interfaces() {
        let source = b"package p;\ninterface A extends B, C {}\n";
        let types = parse(source);
        assert_eq!(types[0].superclass, None);
        assert_eq!(types[0].interfaces, vec!["B", "C"]);
    }

    #[test]
    fn test_methods_and_fields() {
        let source = b"package p;\nclass A {\n  private int count;\n  public int count() { return count; }\n  A() {}\n}\n";
        let types = parse(source);
        assert_eq!(types[0].fields.len(), 1);
        assert_eq!(types[0].fields[0].name, "count");
        assert_eq!(types[0].methods.len(), 2);
        assert!(types[0].methods.iter().any(|m| m.is_constructor));
    }

    #[test]
    fn test_multi_declarator_field() {
        let source = b"package p;\nclass A { int a, b; }\n";
        let types = parse(source);
        assert_eq!(types[0].fields.len(), 2);
    }

    #[test]
    fn test_self_call_edge() {
        let source = b"package p;\nclass A {\n  void run() { helper(); }\n  void helper() {}\n}\n";
        let types = parse(source);
        assert_eq!(types[0].calls.len(), 1);
        let edge = &types[0].calls[0];
        assert_eq!(edge.source_type, "p.A");
        assert_eq!(edge.source_method, "run");
        assert_eq!(edge.target_type, "p.A");
        assert_eq!(edge.target_method, "helper");
        assert_eq!(edge.ordinal, 0);
    }

    #[test]
    fn test_field_qualified_call_edge() {
        let source = b"package p;\nimport com.example.UserService;\nclass A {\n  private UserService users;\n  void run() { users.load(); }\n}\n";
        let types = parse(source);
        assert_eq!(types[0].calls.len(), 1);
        assert_eq!(types[0].calls[0].target_type, "UserService");
        assert_eq!(types[0].calls[0].target_method, "load");
    }

    #[test]
    fn test_local_visible_before_declaration() {
        // Flow-insensitive table: the local declared after the call site
        // still attributes the earlier invocation.
        let source = b"package p;\nclass A {\n  void run() {\n    svc.load();\n    UserService svc = make();\n  }\n  UserService make() { return null; }\n}\n";
        let types = parse(source);
        let edge = types[0]
            .calls
            .iter()
            .find(|c| c.target_method == "load")
            .expect("load edge");
        assert_eq!(edge.target_type, "UserService");
    }

    #[test]
    fn test_unknown_qualifier_stub_edge() {
        let source = b"package p;\nclass A {\n  void run() { mystery.call(); }\n}\n";
        let types = parse(source);
        assert_eq!(types[0].calls.len(), 1);
        // Lowercase unknown: literal text kept as stub target.
        assert_eq!(types[0].calls[0].target_type, "mystery");
    }

    #[test]
    fn test_ordinals_preserve_source_order() {
        let source = b"package p;\nclass A {\n  void run() { first(); second(); third(); }\n  void first() {}\n  void second() {}\n  void third() {}\n}\n";
        let types = parse(source);
        let methods: Vec<&str> = types[0]
            .calls
            .iter()
            .map(|c| c.target_method.as_str())
            .collect();
        assert_eq!(methods, vec!["first", "second", "third"]);
        let ordinals: Vec<usize> = types[0].calls.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
    }

    #[test]
    fn test_accessor_marker_synthesizes_seven_methods() {
        let source = b"package p;\n@Data\nclass User {\n  private String name;\n  private int age;\n}\n";
        let types = parse(source);
        let generated: Vec<&MethodDecl> =
            types[0].methods.iter().filter(|m| m.generated).collect();
        assert_eq!(generated.len(), 7);
        let names: Vec<&str> = generated.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"getName"));
        assert!(names.contains(&"setAge"));
        assert!(names.contains(&"equals"));
        assert!(names.contains(&"hashCode"));
        assert!(names.contains(&"toString"));
        assert!(generated.iter().all(|m| m.excerpt.is_empty()));
    }

    #[test]
    fn test_excerpt_brace_depth_scan() {
        let source = "class A {\n  void run() {\n    if (true) { x(); }\n  }\n}\ntrailing";
        let rope = Rope::from_str(source);
        let excerpt = extract_excerpt(&rope, 0);
        assert!(excerpt.ends_with('}'));
        assert!(!excerpt.contains("trailing"));
        assert_eq!(
            excerpt.matches('{').count(),
            excerpt.matches('}').count()
        );
    }

    #[test]
    fn test_enum_declarations_skipped() {
        let source = b"package p;\nenum Color { RED }\nclass A {}\n";
        let types = parse(source);
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].simple_name, "A");
    }
}
