//! Ordered compiler chains.
//!
//! A chain is a sequence of steps applied to one item under one rule. Each
//! transformation step receives the previous step's output plus a read handle
//! on the build context; a capture step snapshots the content at that point
//! so later consumers (feed, listings) can reuse it without recomputation.

use crate::engine::context::BuildContext;
use crate::engine::error::BuildError;
use crate::engine::item::Item;
use anyhow::{Context as _, Result};

/// Read-only context handed to each transformation step.
pub struct StepCx<'a> {
    pub item: &'a Item,
    /// Wildcard captures from the matched pattern, in pattern order.
    pub captures: &'a [String],
    pub ctx: &'a BuildContext,
}

type TransformFn = Box<dyn Fn(&StepCx<'_>, String) -> Result<String> + Send + Sync>;

/// One step: a named transformation, or a snapshot capture marker.
pub enum Step {
    Transform { name: &'static str, run: TransformFn },
    Capture(&'static str),
}

/// An ordered sequence of steps.
#[derive(Default)]
pub struct Chain {
    steps: Vec<Step>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named transformation step.
    pub fn then(
        mut self,
        name: &'static str,
        run: impl Fn(&StepCx<'_>, String) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        self.steps.push(Step::Transform {
            name,
            run: Box::new(run),
        });
        self
    }

    /// Append a snapshot capture of the content at this point.
    pub fn capture(mut self, name: &'static str) -> Self {
        self.steps.push(Step::Capture(name));
        self
    }

    /// Run the chain over `item`, starting from its raw body.
    ///
    /// A failing step aborts only this item × rule pair; the error carries
    /// the identifier and the zero-based step index.
    pub fn run(
        &self,
        rule: &str,
        item: &Item,
        captures: &[String],
        ctx: &BuildContext,
    ) -> Result<String, BuildError> {
        let cx = StepCx {
            item,
            captures,
            ctx,
        };
        let mut content = item.body.clone();
        for (index, step) in self.steps.iter().enumerate() {
            match step {
                Step::Transform { name, run } => {
                    content = run(&cx, content).with_context(|| format!("step `{name}`")).map_err(
                        |source| BuildError::CompilerStep {
                            id: item.id.clone(),
                            rule: rule.to_owned(),
                            step: index,
                            source,
                        },
                    )?;
                }
                Step::Capture(name) => ctx.snapshots().capture(&item.id, name, &content),
            }
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::metadata::Metadata;
    use crate::engine::pattern::Identifier;
    use anyhow::bail;
    use rustc_hash::FxHashMap;
    use std::sync::Arc;

    fn ctx_with(items: Vec<Arc<Item>>) -> BuildContext {
        BuildContext::new(items, FxHashMap::default())
    }

    fn item(id: &str, body: &str) -> Item {
        Item::new(Identifier::new(id), body.to_owned(), Metadata::new())
    }

    #[test]
    fn test_steps_run_in_order() {
        let chain = Chain::new()
            .then("upper", |_, content| Ok(content.to_uppercase()))
            .then("wrap", |_, content| Ok(format!("<p>{content}</p>")));

        let item = item("a.md", "hi");
        let ctx = ctx_with(vec![]);
        let out = chain.run("test", &item, &[], &ctx).unwrap();
        assert_eq!(out, "<p>HI</p>");
    }

    #[test]
    fn test_capture_snapshots_mid_chain_content() {
        let chain = Chain::new()
            .then("render", |_, content| Ok(format!("<p>{content}</p>")))
            .capture("content")
            .then("chrome", |_, content| Ok(format!("<html>{content}</html>")));

        let item = item("a.md", "body");
        let ctx = ctx_with(vec![]);
        let page = chain.run("test", &item, &[], &ctx).unwrap();

        // The page carries the chrome; the snapshot stopped before it.
        assert_eq!(page, "<html><p>body</p></html>");
        let snap = ctx.snapshots().load(&item.id, "content").unwrap();
        assert_eq!(&*snap, "<p>body</p>");
    }

    #[test]
    fn test_step_failure_reports_identifier_and_index() {
        let chain = Chain::new()
            .then("ok", |_, content| Ok(content))
            .then("boom", |_, _| bail!("renderer crashed"));

        let item = item("posts/bad.md", "x");
        let ctx = ctx_with(vec![]);
        let err = chain.run("posts", &item, &[], &ctx).unwrap_err();

        match err {
            BuildError::CompilerStep { id, rule, step, .. } => {
                assert_eq!(id.as_str(), "posts/bad.md");
                assert_eq!(rule, "posts");
                assert_eq!(step, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_steps_can_read_pattern_captures() {
        let chain = Chain::new().then("slug", |cx, _| Ok(cx.captures.join("-")));

        let item = item("posts/hello.md", "");
        let ctx = ctx_with(vec![]);
        let out = chain
            .run("posts", &item, &["hello".to_owned()], &ctx)
            .unwrap();
        assert_eq!(out, "hello");
    }
}
