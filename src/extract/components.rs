//! Component (bean) classification from stereotype annotations.

use crate::model::{Component, ComponentKind, TypeDecl};

/// Stereotype annotation names, checked in classification priority order:
/// service > repository > controller > configuration > generic.
const STEREOTYPES: &[(&str, ComponentKind)] = &[
    ("Service", ComponentKind::Service),
    ("Repository", ComponentKind::Repository),
    ("RestController", ComponentKind::Controller),
    ("Controller", ComponentKind::Controller),
    ("Configuration", ComponentKind::Configuration),
    ("Component", ComponentKind::Generic),
];

/// Classify a type's component kind from its stereotype annotations.
pub fn classify(decl: &TypeDecl) -> Option<ComponentKind> {
    for (name, kind) in STEREOTYPES {
        if decl.annotations.iter().any(|a| a.name == *name) {
            return Some(*kind);
        }
    }
    None
}

/// Derive managed components from a batch of type declarations.
pub fn extract_components(types: &[TypeDecl]) -> Vec<Component> {
    types
        .iter()
        .filter_map(|decl| {
            let kind = classify(decl)?;
            Some(Component {
                name: bean_name(decl),
                kind,
                owner_type: decl.qualified_name.clone(),
                scope: bean_scope(decl),
            })
        })
        .collect()
}

/// Bean name: the stereotype annotation's value when given, else the simple
/// type name with a lower-cased first letter.
fn bean_name(decl: &TypeDecl) -> String {
    for (name, _) in STEREOTYPES {
        if let Some(annotation) = decl.annotations.iter().find(|a| a.name == *name) {
            if let Some(value) = annotation.value() {
                if !value.is_empty() {
                    return value.to_string();
                }
            }
        }
    }
    decapitalize(&decl.simple_name)
}

/// Bean scope from a `Scope` annotation, defaulting to `singleton`.
fn bean_scope(decl: &TypeDecl) -> String {
    decl.annotations
        .iter()
        .find(|a| a.name == "Scope")
        .and_then(|a| a.value())
        .unwrap_or("singleton")
        .to_string()
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::walker::parse_compilation_unit;
    use std::path::Path;

    fn parse(source: &[u8]) -> Vec<TypeDecl> {
        parse_compilation_unit(Path::new("Test.java"), source).expect("parse")
    }

    #[test]
    fn test_service_classification() {
        let types = parse(b"package p;\n@Service\nclass UserService {}\n");
        let components = extract_components(&types);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].kind, ComponentKind::Service);
        assert_eq!(components[0].name, "userService");
        assert_eq!(components[0].owner_type, "p.UserService");
        assert_eq!(components[0].scope, "singleton");
    }

    #[test]
    fn test_priority_service_over_component() {
        let types = parse(b"package p;\n@Component\n@Service\nclass A {}\n");
        let components = extract_components(&types);
        assert_eq!(components[0].kind, ComponentKind::Service);
    }

    #[test]
    fn test_rest_controller_is_controller() {
        let types = parse(b"package p;\n@RestController\nclass ApiController {}\n");
        let components = extract_components(&types);
        assert_eq!(components[0].kind, ComponentKind::Controller);
    }

    #[test]
    fn test_explicit_bean_name() {
        let types = parse(b"package p;\n@Service(\"users\")\nclass UserService {}\n");
        let components = extract_components(&types);
        assert_eq!(components[0].name, "users");
    }

    #[test]
    fn test_scope_annotation() {
        let types = parse(b"package p;\n@Component\n@Scope(\"prototype\")\nclass A {}\n");
        let components = extract_components(&types);
        assert_eq!(components[0].scope, "prototype");
    }

    #[test]
    fn test_unannotated_type_is_not_a_component() {
        let types = parse(b"package p;\nclass Plain {}\n");
        assert!(extract_components(&types).is_empty());
    }
}
