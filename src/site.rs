//! Default site wiring: the rule sets of a blog.
//!
//! # Content Layout
//!
//! | Source | Rule | Output |
//! |--------|------|--------|
//! | `index.md` | `index` | `index.html` (post listing, full-set access) |
//! | `posts/*.md` | `posts` | `posts/<slug>/index.html` + content snapshot |
//! | `posts/*.md` | `post-teasers` | teaser snapshot only (independent set) |
//! | `pages/*.md` | `pages` | `pages/<name>.html` |
//!
//! The post chain externalizes URLs *before* its content snapshot and
//! internalizes *after* templating: the snapshot carries absolute links for
//! the feed while the written page stays root-relative.

use crate::config::SiteConfig;
use crate::engine::{
    BuildContext, Chain, DataAccess, Item, Pattern, Registry, Route, Rule, RuleSet,
};
use crate::log;
use crate::render::DocumentRenderer;
use crate::template::{TemplateContext, Templates, Value};
use crate::urls;
use crate::utils::date::DateTimeUtc;
use anyhow::Result;
use std::sync::Arc;

/// Snapshot of a post's rendered body with absolute URLs, before page chrome.
pub const CONTENT_SNAPSHOT: &str = "content";

/// Snapshot of a post's shortened plain-text body used in listings.
pub const TEASER_SNAPSHOT: &str = "teaser";

/// Maximum teaser length in characters.
const TEASER_LEN: usize = 280;

/// The registry plus everything phase 2 needs to synthesize outputs.
pub struct SitePlan {
    pub registry: Registry,
    /// Items whose snapshots feed the syndication pipeline.
    pub feed_source: Pattern,
    pub templates: &'static Templates,
}

/// Build the rule sets for the default blog layout.
pub fn rules(
    config: &'static SiteConfig,
    renderer: &'static dyn DocumentRenderer,
    templates: &'static Templates,
) -> Result<SitePlan> {
    let ext = &config.build.content_ext;
    let publish_ext = &config.build.publish_ext;
    let root: &'static str = config.base.url.as_deref().unwrap_or_default();

    let posts_pattern = Pattern::glob(&format!("posts/*.{ext}"))?;
    let pages_pattern = Pattern::glob(&format!("pages/*.{ext}"))?;
    let index_pattern = Pattern::list([format!("index.{ext}")]);

    let index_rule = Rule::new(
        "index",
        index_pattern,
        Chain::new()
            .then("render", move |cx, _| renderer.render(cx.item))
            .then("externalize-urls", move |_, html| {
                urls::externalize(&html, root)
            })
            .then("post-listing", {
                let posts = posts_pattern.clone();
                move |cx, html| {
                    let mut context = item_context(cx.item, config);
                    context.insert(
                        "posts".to_owned(),
                        Value::List(listing_context(&posts, cx.ctx)),
                    );
                    templates.apply("index", &context, &html)
                }
            })
            .then("internalize-urls", move |_, html| {
                urls::internalize(&html, root)
            }),
    )
    .routed(Route::Constant(format!("index.{publish_ext}")))
    .with_access(DataAccess::FullSet);

    let posts_rule = Rule::new(
        "posts",
        posts_pattern.clone(),
        Chain::new()
            .then("render", move |cx, _| renderer.render(cx.item))
            .then("externalize-urls", move |_, html| {
                urls::externalize(&html, root)
            })
            .capture(CONTENT_SNAPSHOT)
            .then("post-template", move |cx, html| {
                templates.apply("post", &item_context(cx.item, config), &html)
            })
            .then("internalize-urls", move |_, html| {
                urls::internalize(&html, root)
            }),
    )
    .routed(Route::FromCaptures(format!("posts/{{0}}/index.{publish_ext}")));

    let pages_rule = Rule::new(
        "pages",
        pages_pattern,
        Chain::new()
            .then("render", move |cx, _| renderer.render(cx.item))
            .then("externalize-urls", move |_, html| {
                urls::externalize(&html, root)
            })
            .then("page-template", move |cx, html| {
                templates.apply("page", &item_context(cx.item, config), &html)
            })
            .then("internalize-urls", move |_, html| {
                urls::internalize(&html, root)
            }),
    )
    .routed(Route::SetExtension(publish_ext.clone()));

    // Snapshot-only rule in its own set: the same post compiles once for its
    // page and once for the listing teaser, without re-rendering twice per
    // consumer.
    let teaser_rule = Rule::new(
        "post-teasers",
        posts_pattern.clone(),
        Chain::new()
            .then("render", move |cx, _| renderer.render(cx.item))
            .then("externalize-urls", move |_, html| {
                urls::externalize(&html, root)
            })
            .then("teaser", |_, html| Ok(teaser_of(&html)))
            .capture(TEASER_SNAPSHOT),
    );

    let registry = Registry::new()
        .set(
            RuleSet::new("site")
                .rule(index_rule)
                .rule(posts_rule)
                .rule(pages_rule),
        )
        .set(RuleSet::new("teasers").rule(teaser_rule));

    Ok(SitePlan {
        registry,
        feed_source: posts_pattern,
        templates,
    })
}

// ============================================================================
// Template contexts
// ============================================================================

/// Per-item template context: item metadata plus site-wide fields.
pub fn item_context(item: &Item, config: &SiteConfig) -> TemplateContext {
    let mut cx = TemplateContext::new();
    cx.insert(
        "site_title".to_owned(),
        Value::Text(config.base.title.clone()),
    );
    cx.insert(
        "copyright".to_owned(),
        Value::Text(config.base.copyright.clone()),
    );

    for field in ["title", "date", "author", "summary"] {
        if let Some(value) = item.meta.get(field) {
            cx.insert(field.to_owned(), Value::Text(value.to_owned()));
        }
    }

    let tags: Vec<TemplateContext> = item
        .meta
        .list(&config.build.tags.field, config.tag_delimiter())
        .into_iter()
        .map(|tag| TemplateContext::from([("name".to_owned(), Value::Text(tag))]))
        .collect();
    if !tags.is_empty() {
        cx.insert("tags".to_owned(), Value::List(tags));
    }

    cx
}

/// Listing sub-contexts for every routed item matching `pattern`, newest
/// first.
pub fn listing_context(pattern: &Pattern, ctx: &BuildContext) -> Vec<TemplateContext> {
    let mut posts: Vec<&Arc<Item>> = ctx
        .items()
        .iter()
        .filter(|item| pattern.matches(&item.id))
        .collect();
    posts.sort_by(|a, b| date_of(b).cmp(&date_of(a)));
    listing_entries(posts.into_iter(), ctx)
}

/// Render a per-tag listing page from the configured tag template.
pub fn render_tag_page(
    tag: &str,
    posts: &[Arc<Item>],
    ctx: &BuildContext,
    templates: &Templates,
    config: &SiteConfig,
) -> Result<String> {
    let mut context = TemplateContext::new();
    context.insert(
        "site_title".to_owned(),
        Value::Text(config.base.title.clone()),
    );
    context.insert("tag".to_owned(), Value::Text(tag.to_owned()));
    context.insert(
        "posts".to_owned(),
        Value::List(listing_entries(posts.iter(), ctx)),
    );
    templates.apply(&config.build.tags.template, &context, "")
}

fn listing_entries<'a>(
    posts: impl Iterator<Item = &'a Arc<Item>>,
    ctx: &BuildContext,
) -> Vec<TemplateContext> {
    posts
        .filter_map(|item| {
            // Items without a routed page have nothing to link to.
            let url = ctx.route_of(&item.id).map(page_href)?;

            let mut cx = TemplateContext::new();
            cx.insert("title".to_owned(), Value::Text(item.title().to_owned()));
            cx.insert("url".to_owned(), Value::Text(url));
            if let Some(date) = item.meta.get("date") {
                cx.insert("date".to_owned(), Value::Text(date.to_owned()));
            }
            match ctx.snapshots().load(&item.id, TEASER_SNAPSHOT) {
                Ok(teaser) => {
                    cx.insert("teaser".to_owned(), Value::Text(teaser.to_string()));
                }
                Err(err) => log!("listing"; "no teaser for `{}`: {err}", item.id),
            }
            Some(cx)
        })
        .collect()
}

/// Date metadata used for chronological ordering; unparsable dates sort as
/// absent.
pub fn date_of(item: &Item) -> Option<DateTimeUtc> {
    item.meta.date("date").ok()
}

/// Root-relative href of a routed page; a trailing `index.html` collapses to
/// its directory.
pub fn page_href(route: &str) -> String {
    let pretty = route.strip_suffix("index.html").unwrap_or(route);
    format!("/{pretty}")
}

// ============================================================================
// Teasers
// ============================================================================

/// Plain-text teaser of rendered HTML, truncated on a character boundary.
fn teaser_of(html: &str) -> String {
    let text = strip_tags(html);
    let mut chars = text.chars();
    let teaser: String = chars.by_ref().take(TEASER_LEN).collect();
    if chars.next().is_some() {
        format!("{}…", teaser.trim_end())
    } else {
        teaser
    }
}

/// Drop markup, keep text, collapse whitespace.
fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Identifier, Metadata};
    use rustc_hash::FxHashMap;

    #[test]
    fn test_page_href() {
        assert_eq!(page_href("posts/hello/index.html"), "/posts/hello/");
        assert_eq!(page_href("pages/about.html"), "/pages/about.html");
        assert_eq!(page_href("index.html"), "/");
    }

    #[test]
    fn test_teaser_strips_markup_and_truncates() {
        let html = "<p>Hello <b>world</b></p>";
        assert_eq!(teaser_of(html), "Hello world");

        let long = format!("<p>{}</p>", "word ".repeat(200));
        let teaser = teaser_of(&long);
        assert!(teaser.ends_with('…'));
        assert!(teaser.chars().count() <= TEASER_LEN + 1);
    }

    #[test]
    fn test_strip_tags_collapses_whitespace() {
        assert_eq!(strip_tags("<p>a</p>\n  <p>b</p>"), "a b");
    }

    #[test]
    fn test_item_context_carries_metadata() {
        let mut meta = Metadata::new();
        meta.insert("title", "Hello");
        meta.insert("date", "2024-01-01");
        meta.insert("tags", "rust, builds");
        let item = Item::new(Identifier::new("posts/a.md"), String::new(), meta);

        let config = SiteConfig::default();
        let cx = item_context(&item, &config);

        assert!(matches!(cx.get("title"), Some(Value::Text(t)) if t == "Hello"));
        assert!(matches!(cx.get("tags"), Some(Value::List(tags)) if tags.len() == 2));
    }

    #[test]
    fn test_listing_skips_unrouted_items() {
        let item = Arc::new(Item::new(
            Identifier::new("posts/a.md"),
            String::new(),
            Metadata::new(),
        ));
        let ctx = BuildContext::new(vec![Arc::clone(&item)], FxHashMap::default());

        let entries = listing_entries([&item].into_iter(), &ctx);
        assert!(entries.is_empty());
    }

    #[test]
    fn test_listing_orders_newest_first() {
        let make = |id: &str, date: &str| {
            let mut meta = Metadata::new();
            meta.insert("title", id);
            meta.insert("date", date);
            Arc::new(Item::new(Identifier::new(id), String::new(), meta))
        };
        let items = vec![
            make("posts/old.md", "2023-01-01"),
            make("posts/new.md", "2024-01-01"),
        ];
        let routes: FxHashMap<Identifier, String> = items
            .iter()
            .map(|item| (item.id.clone(), format!("{}.html", item.id)))
            .collect();
        let ctx = BuildContext::new(items, routes);

        let pattern = Pattern::glob("posts/*.md").unwrap();
        let entries = listing_context(&pattern, &ctx);
        let titles: Vec<_> = entries
            .iter()
            .map(|cx| match cx.get("title") {
                Some(Value::Text(t)) => t.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(titles, vec!["posts/new.md", "posts/old.md"]);
    }
}
