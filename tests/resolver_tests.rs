//! Dependency resolution against the committed graph.

use javelin::extract::run_extractors;
use javelin::ingest::walker::parse_compilation_unit;
use javelin::model::TypeDecl;
use javelin::resolve::DependencyResolver;
use javelin::store::GraphStore;
use std::path::Path;

fn parse(name: &str, source: &[u8]) -> Vec<TypeDecl> {
    parse_compilation_unit(Path::new(name), source).expect("parse")
}

fn fixture() -> Vec<Vec<TypeDecl>> {
    vec![
        parse(
            "OrderService.java",
            b"package com.shop;\n@Service\npublic class OrderService {\n  @Autowired\n  private PricingService pricing;\n  private AuditService audit;\n  OrderService(AuditService audit) { this.audit = audit; }\n}\n",
        ),
        parse(
            "PricingService.java",
            b"package com.shop;\n@Service\npublic class PricingService {}\n",
        ),
        parse(
            "AuditService.java",
            b"package com.shop;\n@Service\npublic class AuditService {\n  private Notifier notifier;\n  @Autowired\n  void setNotifier(Notifier notifier) { this.notifier = notifier; }\n}\n",
        ),
        parse(
            "Notifier.java",
            b"package com.shop;\n@Component\npublic class Notifier {}\n",
        ),
    ]
}

fn seed(store: &mut GraphStore, order: &[usize], files: &[Vec<TypeDecl>]) {
    for &i in order {
        store.upsert_types(&files[i]).unwrap();
        store.upsert_framework(&run_extractors(&files[i])).unwrap();
    }
}

#[test]
fn test_all_three_injection_kinds() {
    let files = fixture();
    let mut store = GraphStore::open_in_memory("demo").unwrap();
    seed(&mut store, &[0, 1, 2, 3], &files);

    let inserted = DependencyResolver::new(&mut store).run().unwrap();
    assert_eq!(inserted, 3);

    let edges = store.dependencies().unwrap();
    assert!(edges.contains(&(
        "orderService".to_string(),
        "pricingService".to_string(),
        "field".to_string(),
        "pricing".to_string()
    )));
    assert!(edges.contains(&(
        "orderService".to_string(),
        "auditService".to_string(),
        "constructor".to_string(),
        "audit".to_string()
    )));
    assert!(edges.contains(&(
        "auditService".to_string(),
        "notifier".to_string(),
        "setter".to_string(),
        "setNotifier".to_string()
    )));
}

#[test]
fn test_resolution_is_order_independent() {
    let files = fixture();
    let orders: [&[usize]; 3] = [&[0, 1, 2, 3], &[3, 2, 1, 0], &[2, 0, 3, 1]];

    let mut results = Vec::new();
    for order in orders {
        let mut store = GraphStore::open_in_memory("demo").unwrap();
        seed(&mut store, order, &files);
        DependencyResolver::new(&mut store).run().unwrap();
        results.push(store.dependencies().unwrap());
    }

    assert_eq!(results[0], results[1]);
    assert_eq!(results[1], results[2]);
}

#[test]
fn test_target_seen_after_source() {
    // The dependency target is committed after the depending type; the
    // deferred pass still wires it.
    let files = fixture();
    let mut store = GraphStore::open_in_memory("demo").unwrap();
    seed(&mut store, &[0], &files);

    // Nothing to wire yet: PricingService is not in the store.
    assert_eq!(DependencyResolver::new(&mut store).run().unwrap(), 0);

    seed(&mut store, &[1, 2, 3], &files);
    assert_eq!(DependencyResolver::new(&mut store).run().unwrap(), 3);
}

#[test]
fn test_resolver_rerun_adds_nothing() {
    let files = fixture();
    let mut store = GraphStore::open_in_memory("demo").unwrap();
    seed(&mut store, &[0, 1, 2, 3], &files);

    assert_eq!(DependencyResolver::new(&mut store).run().unwrap(), 3);
    assert_eq!(DependencyResolver::new(&mut store).run().unwrap(), 0);
    assert_eq!(store.dependencies().unwrap().len(), 3);
}
