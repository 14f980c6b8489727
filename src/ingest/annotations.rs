//! Annotation extraction and payload normalization.
//!
//! Java annotation arguments arrive in several shapes: marker (`@Service`),
//! single value (`@Service("users")`), named pairs
//! (`@RequestMapping(value = "/api", method = RequestMethod.GET)`), and
//! arrays (`@Select({"...", "..."})`). Every shape is normalized into one
//! tagged map at ingestion: the single unnamed value lands under `value`,
//! array elements are comma-joined, string literals are unquoted.

use crate::model::Annotation;
use std::collections::BTreeMap;

/// Collect the annotations attached to a declaration node.
///
/// Annotations live inside the declaration's `modifiers` child alongside
/// keyword modifiers.
pub fn collect_annotations(node: tree_sitter::Node, source: &[u8]) -> Vec<Annotation> {
    let mut annotations = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "modifiers" {
            continue;
        }
        let mut modifier_cursor = child.walk();
        for modifier in child.children(&mut modifier_cursor) {
            match modifier.kind() {
                "marker_annotation" => {
                    if let Some(name) = annotation_name(modifier, source) {
                        annotations.push(Annotation::marker(&name));
                    }
                }
                "annotation" => {
                    if let Some(annotation) = extract_annotation(modifier, source) {
                        annotations.push(annotation);
                    }
                }
                _ => {}
            }
        }
    }

    annotations
}

/// Collect the keyword modifiers (`public`, `static`, ...) of a declaration.
pub fn collect_modifiers(node: tree_sitter::Node, source: &[u8]) -> Vec<String> {
    let mut modifiers = Vec::new();

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "modifiers" {
            continue;
        }
        let mut modifier_cursor = child.walk();
        for modifier in child.children(&mut modifier_cursor) {
            if matches!(modifier.kind(), "marker_annotation" | "annotation") {
                continue;
            }
            if let Ok(text) = modifier.utf8_text(source) {
                modifiers.push(text.to_string());
            }
        }
    }

    modifiers
}

/// Extract an annotation with its argument list.
fn extract_annotation(node: tree_sitter::Node, source: &[u8]) -> Option<Annotation> {
    let name = annotation_name(node, source)?;
    let mut args = BTreeMap::new();

    if let Some(arguments) = node.child_by_field_name("arguments") {
        let mut cursor = arguments.walk();
        for argument in arguments.named_children(&mut cursor) {
            if argument.kind() == "element_value_pair" {
                let key = argument
                    .child_by_field_name("key")
                    .and_then(|n| n.utf8_text(source).ok())
                    .unwrap_or("value");
                if let Some(value) = argument.child_by_field_name("value") {
                    args.insert(key.to_string(), normalize_value(value, source));
                }
            } else {
                // Single unnamed value: normalized under the `value` key.
                args.insert("value".to_string(), normalize_value(argument, source));
            }
        }
    }

    Some(Annotation {
        name,
        args,
    })
}

/// Simple annotation name, with any package qualifier stripped.
fn annotation_name(node: tree_sitter::Node, source: &[u8]) -> Option<String> {
    let name_node = node.child_by_field_name("name")?;
    let text = name_node.utf8_text(source).ok()?;
    Some(text.rsplit('.').next().unwrap_or(text).to_string())
}

/// Normalize one annotation argument value to a plain string.
fn normalize_value(node: tree_sitter::Node, source: &[u8]) -> String {
    match node.kind() {
        "string_literal" => unquote(node.utf8_text(source).unwrap_or_default()),
        "element_value_array_initializer" => {
            let mut parts = Vec::new();
            let mut cursor = node.walk();
            for element in node.named_children(&mut cursor) {
                parts.push(normalize_value(element, source));
            }
            parts.join(",")
        }
        _ => node.utf8_text(source).unwrap_or_default().to_string(),
    }
}

/// Strip the surrounding quotes from a string literal.
fn unquote(text: &str) -> String {
    text.trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_type_node(tree: &tree_sitter::Tree) -> tree_sitter::Node<'_> {
        let root = tree.root_node();
        let mut cursor = root.walk();
        let node = root
            .children(&mut cursor)
            .find(|n| n.kind() == "class_declaration" || n.kind() == "interface_declaration")
            .expect("type declaration");
        node
    }

    fn parse(source: &[u8]) -> tree_sitter::Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::language())
            .expect("load Java grammar");
        parser.parse(source, None).expect("parse")
    }

    #[test]
    fn test_marker_annotation() {
        let source = b"@Service\nclass UserService {}\n";
        let tree = parse(source);
        let annotations = collect_annotations(first_type_node(&tree), source);
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].name, "Service");
        assert!(annotations[0].args.is_empty());
    }

    #[test]
    fn test_single_value_normalized_under_value_key() {
        let source = b"@Service(\"users\")\nclass UserService {}\n";
        let tree = parse(source);
        let annotations = collect_annotations(first_type_node(&tree), source);
        assert_eq!(annotations[0].value(), Some("users"));
    }

    #[test]
    fn test_named_pairs() {
        let source =
            b"@RequestMapping(value = \"/api\", method = RequestMethod.GET)\nclass C {}\n";
        let tree = parse(source);
        let annotations = collect_annotations(first_type_node(&tree), source);
        assert_eq!(annotations[0].value(), Some("/api"));
        assert_eq!(annotations[0].get("method"), Some("RequestMethod.GET"));
    }

    #[test]
    fn test_array_value_comma_joined() {
        let source = b"@Select({\"SELECT 1\", \"SELECT 2\"})\nclass C {}\n";
        let tree = parse(source);
        let annotations = collect_annotations(first_type_node(&tree), source);
        assert_eq!(annotations[0].value(), Some("SELECT 1,SELECT 2"));
    }

    #[test]
    fn test_qualified_annotation_name_stripped() {
        let source = b"@org.springframework.stereotype.Service\nclass C {}\n";
        let tree = parse(source);
        let annotations = collect_annotations(first_type_node(&tree), source);
        assert_eq!(annotations[0].name, "Service");
    }
}
