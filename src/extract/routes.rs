//! HTTP route derivation from controller types.

use crate::extract::components::classify;
use crate::model::{Annotation, ComponentKind, MethodDecl, Route, TypeDecl};

/// Method-level mapping annotations with their implied HTTP method.
const METHOD_MAPPINGS: &[(&str, &str)] = &[
    ("GetMapping", "GET"),
    ("PostMapping", "POST"),
    ("PutMapping", "PUT"),
    ("DeleteMapping", "DELETE"),
    ("PatchMapping", "PATCH"),
];

/// Derive routes from a batch of type declarations.
///
/// Only controller-classified types contribute routes. The class-level
/// `RequestMapping` prefix and the method-level path are concatenated with
/// exactly one separator when both are non-empty, defaulting to `/` when both
/// are empty.
pub fn extract_routes(types: &[TypeDecl]) -> Vec<Route> {
    let mut routes = Vec::new();

    for decl in types {
        if classify(decl) != Some(ComponentKind::Controller) {
            continue;
        }

        let prefix = decl
            .annotations
            .iter()
            .find(|a| a.name == "RequestMapping")
            .and_then(|a| a.value())
            .map(first_path)
            .unwrap_or_default();

        for method in &decl.methods {
            if let Some((http_method, path)) = method_mapping(method) {
                routes.push(Route {
                    full_path: join_paths(&prefix, &path),
                    http_method,
                    path,
                    owner_type: decl.qualified_name.clone(),
                    handler_method: method.name.clone(),
                });
            }
        }
    }

    routes
}

/// The mapping annotation of a handler method, as (HTTP method, path).
fn method_mapping(method: &MethodDecl) -> Option<(String, String)> {
    for annotation in &method.annotations {
        for (name, http_method) in METHOD_MAPPINGS {
            if annotation.name == *name {
                return Some((http_method.to_string(), annotation_path(annotation)));
            }
        }
        if annotation.name == "RequestMapping" {
            let http_method = annotation
                .get("method")
                .map(request_method_name)
                .unwrap_or_else(|| "GET".to_string());
            return Some((http_method, annotation_path(annotation)));
        }
    }
    None
}

fn annotation_path(annotation: &Annotation) -> String {
    annotation
        .value()
        .or_else(|| annotation.get("path"))
        .map(first_path)
        .unwrap_or_default()
}

/// Annotation path values may be arrays; the first element wins.
fn first_path(value: &str) -> String {
    value.split(',').next().unwrap_or("").trim().to_string()
}

/// `RequestMethod.POST` → `POST`.
fn request_method_name(value: &str) -> String {
    value.rsplit('.').next().unwrap_or(value).to_string()
}

/// Join a class-level prefix and a method-level path with exactly one
/// separator.
fn join_paths(prefix: &str, path: &str) -> String {
    match (prefix.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (false, true) => prefix.to_string(),
        (true, false) => path.to_string(),
        (false, false) => format!(
            "{}/{}",
            prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        ),
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
    fn test_class_prefix_joined_with_method_path() {
        let source = b"package p;\n@RestController\n@RequestMapping(\"/api\")\nclass UserController {\n  @GetMapping(\"/users/{id}\")\n  String one(String id) { return \"\"; }\n}\n";
        let routes = extract_routes(&parse(source));
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].full_path, "/api/users/{id}");
        assert_eq!(routes[0].http_method, "GET");
        assert_eq!(routes[0].path, "/users/{id}");
        assert_eq!(routes[0].handler_method, "one");
    }

    #[test]
    fn test_exactly_one_separator() {
        let source = b"package p;\n@RestController\n@RequestMapping(\"/api/\")\nclass C {\n  @GetMapping(\"/users\")\n  String all() { return \"\"; }\n}\n";
        let routes = extract_routes(&parse(source));
        assert_eq!(routes[0].full_path, "/api/users");
    }

    #[test]
    fn test_both_empty_defaults_to_root() {
        let source = b"package p;\n@RestController\nclass C {\n  @GetMapping\n  String index() { return \"\"; }\n}\n";
        let routes = extract_routes(&parse(source));
        assert_eq!(routes[0].full_path, "/");
    }

    #[test]
    fn test_request_mapping_with_method() {
        let source = b"package p;\n@Controller\nclass C {\n  @RequestMapping(value = \"/save\", method = RequestMethod.POST)\n  void save() {}\n}\n";
        let routes = extract_routes(&parse(source));
        assert_eq!(routes[0].http_method, "POST");
        assert_eq!(routes[0].full_path, "/save");
    }

    #[test]
    fn test_non_controller_types_produce_no_routes() {
        let source = b"package p;\n@Service\nclass S {\n  @GetMapping(\"/x\")\n  String x() { return \"\"; }\n}\n";
        assert!(extract_routes(&parse(source)).is_empty());
    }

    #[test]
    fn test_delete_mapping() {
        let source = b"package p;\n@RestController\nclass C {\n  @DeleteMapping(\"/users/{id}\")\n  void remove(String id) {}\n}\n";
        let routes = extract_routes(&parse(source));
        assert_eq!(routes[0].http_method, "DELETE");
    }
}
