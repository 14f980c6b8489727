//! Call-target attribution through the per-method symbol table.

use javelin::ingest::walker::parse_compilation_unit;
use javelin::model::{CallEdge, TypeDecl};
use std::path::Path;

fn parse(source: &[u8]) -> Vec<TypeDecl> {
    parse_compilation_unit(Path::new("Test.java"), source).expect("parse")
}

fn calls(source: &[u8]) -> Vec<CallEdge> {
    parse(source).into_iter().flat_map(|t| t.calls).collect()
}

#[test]
fn test_symbol_table_is_flow_insensitive() {
    // A local declared after the call site still attributes the earlier
    // invocation: the table is built from the whole method body before any
    // call is resolved.
    let source = b"package p;\nclass A {\n  void run() {\n    if (ready()) {\n      svc.load();\n    }\n    UserService svc = null;\n  }\n  boolean ready() { return true; }\n}\n";
    let edges = calls(source);
    let load = edges.iter().find(|e| e.target_method == "load").unwrap();
    assert_eq!(load.target_type, "UserService");
}

#[test]
fn test_local_shadows_field() {
    let source = b"package p;\nclass A {\n  private OldService svc;\n  void run() {\n    NewService svc = null;\n    svc.call();\n  }\n}\n";
    let edges = calls(source);
    assert_eq!(edges[0].target_type, "NewService");
}

#[test]
fn test_parameter_shadows_field() {
    let source = b"package p;\nclass A {\n  private OldService svc;\n  void run(NewService svc) {\n    svc.call();\n  }\n}\n";
    let edges = calls(source);
    assert_eq!(edges[0].target_type, "NewService");
}

#[test]
fn test_generic_field_type_is_stripped() {
    let source = b"package p;\nclass A {\n  private Repo<User> repo;\n  void run() { repo.fetch(); }\n}\n";
    let edges = calls(source);
    assert_eq!(edges[0].target_type, "Repo");
}

#[test]
fn test_unqualified_call_targets_enclosing_type() {
    let source = b"package p;\nclass A {\n  void run() { helper(); this.other(); }\n  void helper() {}\n  void other() {}\n}\n";
    let edges = calls(source);
    assert!(edges.iter().all(|e| e.target_type == "p.A"));
    assert_eq!(edges.len(), 2);
}

#[test]
fn test_static_call_through_import() {
    let source = b"package p;\nimport com.shop.util.Clock;\nclass A {\n  void run() { Clock.now(); }\n}\n";
    let edges = calls(source);
    assert_eq!(edges[0].target_type, "com.shop.util.Clock");
    assert_eq!(edges[0].target_method, "now");
}

#[test]
fn test_capitalized_unimported_qualifier_uses_current_package() {
    let source = b"package p;\nclass A {\n  void run() { Helper.go(); }\n}\n";
    let edges = calls(source);
    assert_eq!(edges[0].target_type, "p.Helper");
}

#[test]
fn test_system_out_rewrite() {
    // println itself is filtered as logging noise; flush shows the qualifier
    // rewrite.
    let source = b"package p;\nclass A {\n  void run() { System.out.flush(); }\n}\n";
    let edges = calls(source);
    assert_eq!(edges[0].target_type, "java.io.PrintStream");
    assert_eq!(edges[0].target_method, "flush");
}

#[test]
fn test_denylisted_members_are_dropped_and_ordinals_stay_dense() {
    let source = b"package p;\nclass A {\n  void run() {\n    first();\n    list.stream();\n    second();\n  }\n  void first() {}\n  void second() {}\n}\n";
    let edges = calls(source);
    let targets: Vec<&str> = edges.iter().map(|e| e.target_method.as_str()).collect();
    assert_eq!(targets, vec!["first", "second"]);
    let ordinals: Vec<usize> = edges.iter().map(|e| e.ordinal).collect();
    assert_eq!(ordinals, vec![0, 1]);
}

#[test]
fn test_unknown_lowercase_qualifier_keeps_literal_stub() {
    let source = b"package p;\nclass A {\n  void run() { mystery.call(); }\n}\n";
    let edges = calls(source);
    assert_eq!(edges[0].target_type, "mystery");
    assert_eq!(edges[0].target_method, "call");
}

#[test]
fn test_attribution_is_deterministic() {
    let source = b"package p;\nimport com.a.B;\nclass A {\n  private B b;\n  void run() { b.go(); Helper.go(); helper(); }\n  void helper() {}\n}\n";
    let first = calls(source);
    let second = calls(source);
    assert_eq!(first, second);
}
