//! On-disk store behavior: persistence across reopens, natural-key merging,
//! concurrent read handles.

use javelin::extract::run_extractors;
use javelin::ingest::walker::parse_compilation_unit;
use javelin::model::TypeDecl;
use javelin::store::GraphStore;
use std::path::Path;

fn parse(source: &[u8]) -> Vec<TypeDecl> {
    parse_compilation_unit(Path::new("Test.java"), source).expect("parse")
}

#[test]
fn test_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("graph.db");
    let types = parse(b"package p;\n@Service\nclass A {\n  void run() {}\n}\n");

    {
        let mut store = GraphStore::open(&db, "demo").unwrap();
        store.upsert_types(&types).unwrap();
        store.upsert_framework(&run_extractors(&types)).unwrap();
    }

    let store = GraphStore::open(&db, "demo").unwrap();
    let counts = store.counts().unwrap();
    assert_eq!(counts.types, 1);
    assert_eq!(counts.methods, 1);
    assert_eq!(counts.components, 1);
    assert_eq!(store.type_names().unwrap(), vec!["p.A"]);
}

#[test]
fn test_overloads_merge_on_owner_and_name() {
    let mut store = GraphStore::open_in_memory("demo").unwrap();
    let types = parse(b"package p;\nclass A {\n  void f(int x) {}\n  void f(String x) {}\n}\n");

    store.upsert_types(&types).unwrap();
    // Overloads share the (owner, name) key; the later declaration wins.
    assert_eq!(store.counts().unwrap().methods, 1);
}

#[test]
fn test_changed_batch_updates_in_place() {
    let mut store = GraphStore::open_in_memory("demo").unwrap();

    let before = parse(b"package p;\nclass A {\n  private int count;\n}\n");
    store.upsert_types(&before).unwrap();

    let after = parse(b"package p;\nclass A {\n  private long count;\n  void run() {}\n}\n");
    store.upsert_types(&after).unwrap();

    let counts = store.counts().unwrap();
    assert_eq!(counts.types, 1);
    assert_eq!(counts.fields, 1);
    assert_eq!(counts.methods, 1);
}

#[test]
fn test_concurrent_read_handle() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("graph.db");

    let mut writer = GraphStore::open(&db, "demo").unwrap();
    let types = parse(b"package p;\nclass A {}\nclass B {}\n");
    writer.upsert_types(&types).unwrap();

    // WAL mode: a second handle reads committed data while the writer stays
    // open.
    let reader = GraphStore::open(&db, "demo").unwrap();
    assert_eq!(reader.counts().unwrap().types, 2);

    writer.upsert_types(&parse(b"package p;\nclass C {}\n")).unwrap();
    assert_eq!(reader.counts().unwrap().types, 3);
}

#[test]
fn test_route_key_is_full_path_and_method() {
    let mut store = GraphStore::open_in_memory("demo").unwrap();
    let source = b"package p;\n@RestController\nclass C {\n  @GetMapping(\"/items\")\n  String all() { return \"\"; }\n  @PostMapping(\"/items\")\n  String add() { return \"\"; }\n}\n";
    let types = parse(source);
    store.upsert_types(&types).unwrap();
    store.upsert_framework(&run_extractors(&types)).unwrap();

    // Same path, different HTTP methods: two distinct routes.
    assert_eq!(store.counts().unwrap().routes, 2);
}

#[test]
fn test_shared_method_path_across_controllers() {
    let mut store = GraphStore::open_in_memory("demo").unwrap();
    let users = b"package p;\n@RestController\n@RequestMapping(\"/users\")\nclass UserController {\n  @GetMapping(\"/{id}\")\n  String one(String id) { return \"\"; }\n}\n";
    let orders = b"package p;\n@RestController\n@RequestMapping(\"/orders\")\nclass OrderController {\n  @GetMapping(\"/{id}\")\n  String one(String id) { return \"\"; }\n}\n";

    let mut types = parse(users);
    types.extend(parse(orders));
    store.upsert_types(&types).unwrap();
    store.upsert_framework(&run_extractors(&types)).unwrap();

    // Both controllers map "/{id}" at the method level; the class-level
    // prefixes keep them distinct rows.
    assert_eq!(store.counts().unwrap().routes, 2);
}
