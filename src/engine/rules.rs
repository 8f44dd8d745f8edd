//! The rule registry: pattern → route → chain bindings, grouped into sets.
//!
//! Within one set the first matching rule wins, so overlapping patterns make
//! registration order load-bearing; strict mode rejects that as a
//! configuration error. Sets are evaluated independently of each other: one
//! item may compile under several rules, one per set (a post is built once
//! for its page and once for its feed snapshot).

use crate::engine::compiler::Chain;
use crate::engine::context::{BuildContext, DataAccess};
use crate::engine::error::BuildError;
use crate::engine::item::Item;
use crate::engine::pattern::{Identifier, Pattern};
use crate::engine::route::Route;
use anyhow::Result;
use std::sync::Arc;

/// A pattern bound to an output route and a compiler chain.
pub struct Rule {
    pub name: &'static str,
    pub pattern: Pattern,
    pub access: DataAccess,
    /// `None` for snapshot-only rules that write no output file.
    pub route: Option<Route>,
    pub chain: Chain,
}

impl Rule {
    pub fn new(name: &'static str, pattern: Pattern, chain: Chain) -> Self {
        Self {
            name,
            pattern,
            access: DataAccess::SelfOnly,
            route: None,
            chain,
        }
    }

    pub fn routed(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }

    pub fn with_access(mut self, access: DataAccess) -> Self {
        self.access = access;
        self
    }
}

/// An ordered set of rules; the first matching rule wins within a set.
pub struct RuleSet {
    pub name: &'static str,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Pairwise static overlap check. Ambiguity is a property of the pattern
    /// set alone, independent of registration order and of the item set.
    pub fn ambiguities(&self) -> Vec<BuildError> {
        let mut errors = Vec::new();
        for (i, a) in self.rules.iter().enumerate() {
            for b in &self.rules[i + 1..] {
                if a.pattern.overlaps(&b.pattern) {
                    errors.push(BuildError::AmbiguousRule {
                        set: self.name.to_owned(),
                        first: a.pattern.to_string(),
                        second: b.pattern.to_string(),
                    });
                }
            }
        }
        errors
    }

    /// First matching rule and its captures, in registration order.
    pub fn matched(&self, id: &Identifier) -> Option<(&Rule, Vec<String>)> {
        self.rules
            .iter()
            .find_map(|rule| rule.pattern.captures(id).map(|caps| (rule, caps)))
    }
}

/// All rule sets of a site.
#[derive(Default)]
pub struct Registry {
    pub sets: Vec<RuleSet>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, set: RuleSet) -> Self {
        self.sets.push(set);
        self
    }

    /// Overlap errors across every set (strict mode validation).
    pub fn ambiguities(&self) -> Vec<BuildError> {
        self.sets.iter().flat_map(RuleSet::ambiguities).collect()
    }

    /// Match every item against every set: at most one job per item × set,
    /// with output routes resolved up front so the planner can check for
    /// collisions before anything runs.
    pub fn plan<'a>(&'a self, items: &[Arc<Item>]) -> Result<Vec<Job<'a>>> {
        let mut jobs = Vec::new();
        for item in items {
            for set in &self.sets {
                if let Some((rule, captures)) = set.matched(&item.id) {
                    let route = rule
                        .route
                        .as_ref()
                        .map(|route| route.resolve(&item.id, &captures))
                        .transpose()?;
                    jobs.push(Job {
                        item: Arc::clone(item),
                        set: set.name,
                        rule,
                        captures,
                        route,
                    });
                }
            }
        }
        Ok(jobs)
    }
}

/// One planned item × rule compilation.
pub struct Job<'a> {
    pub item: Arc<Item>,
    pub set: &'static str,
    pub rule: &'a Rule,
    pub captures: Vec<String>,
    /// Resolved output path, `None` for snapshot-only rules.
    pub route: Option<String>,
}

impl Job<'_> {
    pub fn run(&self, ctx: &BuildContext) -> Result<String, BuildError> {
        let label = format!("{}:{}", self.set, self.rule.name);
        self.rule.chain.run(&label, &self.item, &self.captures, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::metadata::Metadata;

    fn item(id: &str) -> Arc<Item> {
        Arc::new(Item::new(
            Identifier::new(id),
            String::new(),
            Metadata::new(),
        ))
    }

    fn glob(p: &str) -> Pattern {
        Pattern::glob(p).unwrap()
    }

    #[test]
    fn test_first_matching_rule_wins_within_a_set() {
        let set = RuleSet::new("pages")
            .rule(Rule::new("specific", Pattern::list(["posts/a.md"]), Chain::new()))
            .rule(Rule::new("general", glob("posts/*.md"), Chain::new()));

        let (rule, _) = set.matched(&Identifier::new("posts/a.md")).unwrap();
        assert_eq!(rule.name, "specific");

        let (rule, _) = set.matched(&Identifier::new("posts/b.md")).unwrap();
        assert_eq!(rule.name, "general");
    }

    #[test]
    fn test_ambiguity_detected_regardless_of_order() {
        let forward = RuleSet::new("pages")
            .rule(Rule::new("a", Pattern::list(["posts/a.md"]), Chain::new()))
            .rule(Rule::new("b", glob("posts/*.md"), Chain::new()));
        let backward = RuleSet::new("pages")
            .rule(Rule::new("b", glob("posts/*.md"), Chain::new()))
            .rule(Rule::new("a", Pattern::list(["posts/a.md"]), Chain::new()));

        assert_eq!(forward.ambiguities().len(), 1);
        assert_eq!(backward.ambiguities().len(), 1);
    }

    #[test]
    fn test_disjoint_patterns_are_not_ambiguous() {
        let set = RuleSet::new("pages")
            .rule(Rule::new("posts", glob("posts/*.md"), Chain::new()))
            .rule(Rule::new("pages", glob("pages/*.md"), Chain::new()));
        assert!(set.ambiguities().is_empty());
    }

    #[test]
    fn test_independent_sets_each_match_the_same_item() {
        let registry = Registry::new()
            .set(RuleSet::new("pages").rule(Rule::new("posts", glob("posts/*.md"), Chain::new())))
            .set(RuleSet::new("teasers").rule(Rule::new("teasers", glob("posts/*.md"), Chain::new())));

        let items = vec![item("posts/a.md")];
        let jobs = registry.plan(&items).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].set, "pages");
        assert_eq!(jobs[1].set, "teasers");
    }

    #[test]
    fn test_plan_resolves_routes_up_front() {
        let registry = Registry::new().set(
            RuleSet::new("pages").rule(
                Rule::new("posts", glob("posts/*.md"), Chain::new())
                    .routed(Route::FromCaptures("posts/{0}/index.html".to_owned())),
            ),
        );

        let items = vec![item("posts/hello.md")];
        let jobs = registry.plan(&items).unwrap();
        assert_eq!(jobs[0].route.as_deref(), Some("posts/hello/index.html"));
    }

    #[test]
    fn test_unmatched_items_produce_no_jobs() {
        let registry = Registry::new()
            .set(RuleSet::new("pages").rule(Rule::new("posts", glob("posts/*.md"), Chain::new())));
        let items = vec![item("assets/logo.svg")];
        assert!(registry.plan(&items).unwrap().is_empty());
    }
}
