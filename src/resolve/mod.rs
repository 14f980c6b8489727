//! Deferred component-dependency resolution.
//!
//! Runs after persistence, against the committed graph, so every wiring
//! decision sees the full component set regardless of the order files were
//! scanned in. Three passes derive dependency edges from injection sites:
//! annotated fields, constructors, and annotated setters. The passes are
//! independent and commutative; each edge merges on its
//! (source, target, kind, site) key, so re-running the resolver never
//! duplicates an edge.

use crate::error::Result;
use crate::ingest::symbols::strip_generics;
use crate::model::{Annotation, ComponentDependency, InjectionKind};
use crate::store::{GraphStore, MethodSite};
use log::{debug, warn};
use std::collections::HashMap;

/// Annotations that mark a field or method as an injection site.
const INJECTION_MARKERS: &[&str] = &["Autowired", "Resource", "Inject"];

/// Component lookup by owning type, qualified or simple.
struct ComponentIndex {
    by_qualified: HashMap<String, String>,
    by_simple: HashMap<String, String>,
}

impl ComponentIndex {
    fn load(store: &GraphStore) -> Result<Self> {
        let mut by_qualified = HashMap::new();
        let mut by_simple = HashMap::new();
        // component_index is sorted by name, so simple-name collisions
        // resolve to the same winner on every run.
        for (name, owner_type) in store.component_index()? {
            let simple = owner_type.rsplit('.').next().unwrap_or(&owner_type);
            by_simple.entry(simple.to_string()).or_insert(name.clone());
            by_qualified.insert(owner_type, name);
        }
        Ok(Self {
            by_qualified,
            by_simple,
        })
    }

    /// Component owned by the given type, by qualified name.
    fn owner(&self, owner_type: &str) -> Option<&str> {
        self.by_qualified.get(owner_type).map(|s| s.as_str())
    }

    /// Component whose owning type matches a declared type reference.
    /// Generic arguments are stripped; a bare simple name matches the sole
    /// component with that simple type name.
    fn target(&self, type_reference: &str) -> Option<&str> {
        let base = strip_generics(type_reference);
        if let Some(name) = self.by_qualified.get(base) {
            return Some(name);
        }
        let simple = base.rsplit('.').next().unwrap_or(base);
        self.by_simple.get(simple).map(|s| s.as_str())
    }
}

/// Resolves component wiring from persisted injection sites.
pub struct DependencyResolver<'a> {
    store: &'a mut GraphStore,
}

impl<'a> DependencyResolver<'a> {
    /// Create a resolver over an open store.
    pub fn new(store: &'a mut GraphStore) -> Self {
        Self { store }
    }

    /// Run all three passes. A failing pass is logged and skipped; the
    /// others still run. Returns the number of newly inserted edges.
    pub fn run(&mut self) -> Result<usize> {
        let index = ComponentIndex::load(self.store)?;
        let mut inserted = 0;

        match self.field_pass(&index) {
            Ok(count) => inserted += count,
            Err(e) => warn!("field injection pass failed: {}", e),
        }
        match self.constructor_pass(&index) {
            Ok(count) => inserted += count,
            Err(e) => warn!("constructor injection pass failed: {}", e),
        }
        match self.setter_pass(&index) {
            Ok(count) => inserted += count,
            Err(e) => warn!("setter injection pass failed: {}", e),
        }

        debug!("resolver inserted {} dependency edges", inserted);
        Ok(inserted)
    }

    /// Fields on component types carrying an injection marker.
    fn field_pass(&mut self, index: &ComponentIndex) -> Result<usize> {
        let sites = self.store.component_fields()?;
        let mut inserted = 0;

        for site in sites {
            if !has_marker(&site.annotations) {
                continue;
            }
            let (Some(source), Some(target)) =
                (index.owner(&site.owner_type), index.target(&site.field_type))
            else {
                continue;
            };
            let dep = ComponentDependency {
                source: source.to_string(),
                target: target.to_string(),
                kind: InjectionKind::Field,
                site: site.field_name.clone(),
            };
            if self.store.merge_dependency(&dep)? {
                inserted += 1;
            }
        }

        Ok(inserted)
    }

    /// Constructor parameters of component types. A constructor wires its
    /// parameters when it carries a marker, or when it is the type's only
    /// constructor.
    fn constructor_pass(&mut self, index: &ComponentIndex) -> Result<usize> {
        let sites = self.store.component_constructors()?;
        let mut per_owner: HashMap<&str, usize> = HashMap::new();
        for site in &sites {
            *per_owner.entry(site.owner_type.as_str()).or_default() += 1;
        }

        let mut inserted = 0;
        for site in &sites {
            let sole = per_owner.get(site.owner_type.as_str()) == Some(&1);
            if !sole && !has_marker(&site.annotations) {
                continue;
            }
            inserted += self.wire_parameters(index, site, InjectionKind::Constructor)?;
        }

        Ok(inserted)
    }

    /// Single-parameter `set*` methods carrying an injection marker.
    fn setter_pass(&mut self, index: &ComponentIndex) -> Result<usize> {
        let sites = self.store.component_setters()?;
        let mut inserted = 0;

        for site in &sites {
            if site.parameters.len() != 1 || !has_marker(&site.annotations) {
                continue;
            }
            inserted += self.wire_parameters(index, site, InjectionKind::Setter)?;
        }

        Ok(inserted)
    }

    fn wire_parameters(
        &mut self,
        index: &ComponentIndex,
        site: &MethodSite,
        kind: InjectionKind,
    ) -> Result<usize> {
        let Some(source) = index.owner(&site.owner_type) else {
            return Ok(0);
        };

        let mut inserted = 0;
        for param in &site.parameters {
            let Some(target) = index.target(&param.type_name) else {
                continue;
            };
            let site_name = match kind {
                InjectionKind::Setter => site.method_name.clone(),
                _ => param.name.clone(),
            };
            let dep = ComponentDependency {
                source: source.to_string(),
                target: target.to_string(),
                kind,
                site: site_name,
            };
            if self.store.merge_dependency(&dep)? {
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}

fn has_marker(annotations: &[Annotation]) -> bool {
    annotations
        .iter()
        .any(|a| INJECTION_MARKERS.contains(&a.name.as_str()))
}
