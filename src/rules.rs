//! Optional per-project extraction rules.
//!
//! A rule attaches a documentation note to stored declarations of a given
//! element kind. Rules are additive enrichment only: they never change what
//! is extracted, filtered, or resolved. The provider is constructed once at
//! pipeline start and passed by reference; there is no ambient singleton.

/// One enrichment rule for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRule {
    /// Element kind the rule applies to (`class`, `interface`).
    pub element_kind: String,
    /// Note appended to the stored excerpt of matching declarations.
    pub note: String,
}

/// Source of extraction rules.
pub trait RuleProvider {
    /// The rule for a project and element kind, if any.
    fn lookup(&self, project: &str, element_kind: &str) -> Option<&ExtractionRule>;
}

/// Default provider with no rules.
pub struct NoRules;

impl RuleProvider for NoRules {
    fn lookup(&self, _project: &str, _element_kind: &str) -> Option<&ExtractionRule> {
        None
    }
}

/// Fixed in-memory rule set for one project.
pub struct StaticRules {
    project: String,
    rules: Vec<ExtractionRule>,
}

impl StaticRules {
    /// Build a provider from a fixed rule list.
    pub fn new(project: &str, rules: Vec<ExtractionRule>) -> Self {
        Self {
            project: project.to_string(),
            rules,
        }
    }
}

impl RuleProvider for StaticRules {
    fn lookup(&self, project: &str, element_kind: &str) -> Option<&ExtractionRule> {
        if project != self.project {
            return None;
        }
        self.rules.iter().find(|r| r.element_kind == element_kind)
    }
}
