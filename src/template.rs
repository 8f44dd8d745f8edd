//! Template substitution collaborator.
//!
//! Templates are plain files with `$field$` placeholders and
//! `$for(field)$ ... $endfor$` loops over sub-lists. The engine only depends
//! on the `apply(template_id, context, content)` surface; the substitution
//! itself is deliberately minimal.
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `$title$` | insert the `title` field (absent fields render empty) |
//! | `$body$` | insert the content passed to `apply` |
//! | `$for(posts)$...$endfor$` | repeat for each sub-context in `posts` |
//! | `$$` | a literal `$` |

use anyhow::{Context as _, Result, anyhow, bail};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A rendered field value: text, or a list of sub-contexts for `$for$`.
#[derive(Debug, Clone)]
pub enum Value {
    Text(String),
    List(Vec<TemplateContext>),
}

/// Field name → value mapping handed to [`Templates::apply`].
pub type TemplateContext = BTreeMap<String, Value>;

/// Loaded template files, keyed by file stem.
#[derive(Default)]
pub struct Templates {
    templates: FxHashMap<String, String>,
}

impl Templates {
    /// Load every file in `dir` (non-recursive), keyed by file stem.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut templates = FxHashMap::default();
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read templates dir {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let body = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read template {}", path.display()))?;
            templates.insert(stem.to_owned(), body);
        }
        Ok(Self { templates })
    }

    /// Register a template body directly (scaffolding, tests).
    pub fn insert(&mut self, id: impl Into<String>, body: impl Into<String>) {
        self.templates.insert(id.into(), body.into());
    }

    /// Apply template `id` with `context`; `$body$` expands to `content`.
    pub fn apply(&self, id: &str, context: &TemplateContext, content: &str) -> Result<String> {
        let template = self
            .templates
            .get(id)
            .ok_or_else(|| anyhow!("unknown template `{id}`"))?;
        let mut context = context.clone();
        context.insert("body".to_owned(), Value::Text(content.to_owned()));
        render(template, &context)
    }
}

const ENDFOR: &str = "$endfor$";

fn render(template: &str, context: &TemplateContext) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('$') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        // `$$` escapes a literal dollar.
        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        let Some(end) = after.find('$') else {
            bail!("unterminated `$` placeholder");
        };
        let token = &after[..end];
        rest = &after[end + 1..];

        if let Some(field) = token.strip_prefix("for(").and_then(|t| t.strip_suffix(')')) {
            let Some(stop) = rest.find(ENDFOR) else {
                bail!("`$for({field})$` without `{ENDFOR}`");
            };
            let inner = &rest[..stop];
            rest = &rest[stop + ENDFOR.len()..];
            if let Some(Value::List(list)) = context.get(field) {
                for sub in list {
                    out.push_str(&render(inner, sub)?);
                }
            }
        } else {
            match context.get(token) {
                Some(Value::Text(text)) => out.push_str(text),
                Some(Value::List(_)) => {
                    bail!("field `{token}` is a list; use `$for({token})$`")
                }
                // Absent fields render empty so templates can reference
                // optional metadata.
                None => {}
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_owned())
    }

    fn templates_with(id: &str, body: &str) -> Templates {
        let mut t = Templates::default();
        t.insert(id, body);
        t
    }

    #[test]
    fn test_field_substitution() {
        let t = templates_with("post", "<h1>$title$</h1>$body$");
        let mut cx = TemplateContext::new();
        cx.insert("title".to_owned(), text("Hello"));

        let out = t.apply("post", &cx, "<p>content</p>").unwrap();
        assert_eq!(out, "<h1>Hello</h1><p>content</p>");
    }

    #[test]
    fn test_absent_field_renders_empty() {
        let t = templates_with("post", "<h1>$title$</h1>");
        let out = t.apply("post", &TemplateContext::new(), "").unwrap();
        assert_eq!(out, "<h1></h1>");
    }

    #[test]
    fn test_for_loop_over_sub_contexts() {
        let t = templates_with("index", "<ul>$for(posts)$<li>$title$</li>$endfor$</ul>");
        let mut cx = TemplateContext::new();
        let posts = vec![
            TemplateContext::from([("title".to_owned(), text("First"))]),
            TemplateContext::from([("title".to_owned(), text("Second"))]),
        ];
        cx.insert("posts".to_owned(), Value::List(posts));

        let out = t.apply("index", &cx, "").unwrap();
        assert_eq!(out, "<ul><li>First</li><li>Second</li></ul>");
    }

    #[test]
    fn test_for_over_absent_field_renders_nothing() {
        let t = templates_with("index", "<ul>$for(posts)$<li>x</li>$endfor$</ul>");
        let out = t.apply("index", &TemplateContext::new(), "").unwrap();
        assert_eq!(out, "<ul></ul>");
    }

    #[test]
    fn test_dollar_escape() {
        let t = templates_with("page", "price: $$5");
        let out = t.apply("page", &TemplateContext::new(), "").unwrap();
        assert_eq!(out, "price: $5");
    }

    #[test]
    fn test_unknown_template_errors() {
        let t = Templates::default();
        assert!(t.apply("missing", &TemplateContext::new(), "").is_err());
    }

    #[test]
    fn test_list_in_scalar_position_errors() {
        let t = templates_with("page", "$posts$");
        let mut cx = TemplateContext::new();
        cx.insert("posts".to_owned(), Value::List(Vec::new()));
        assert!(t.apply("page", &cx, "").is_err());
    }
}
