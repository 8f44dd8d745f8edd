//! Syndication feed assembly and RSS output.
//!
//! Feed entries combine an item's metadata with its designated content
//! snapshot - never the page-rendered output, which would drag site chrome
//! into the feed. The snapshot is captured after URL externalization, so
//! entry bodies already carry the absolute links feed readers require.

use crate::config::SiteConfig;
use crate::engine::{BuildContext, Item};
use crate::log;
use crate::utils::date::DateTimeUtc;
use anyhow::{Context as _, Result, anyhow};
use regex::Regex;
use rss::{ChannelBuilder, GuidBuilder, ItemBuilder, validation::Validate};
use std::fs;
use std::sync::{Arc, LazyLock};

/// Derived, feed-specific view of one item.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub title: String,
    pub url: String,
    pub date: DateTimeUtc,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub content: Arc<str>,
}

/// Assemble feed entries from `items`, newest first; ties keep input order.
///
/// Items with a missing or unparsable date, a missing content snapshot
/// (their producer chain failed), or no routed page are skipped with a
/// warning rather than failing the whole feed.
pub fn assemble(
    items: &[Arc<Item>],
    snapshot: &str,
    limit: Option<usize>,
    ctx: &BuildContext,
    config: &SiteConfig,
) -> Vec<FeedEntry> {
    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let date = match item.meta.date("date") {
            Ok(date) => date,
            Err(err) => {
                log!("feed"; "skipping `{}`: {err}", item.id);
                continue;
            }
        };
        let content = match ctx.snapshots().load(&item.id, snapshot) {
            Ok(content) => content,
            Err(err) => {
                log!("feed"; "skipping `{}`: {err}", item.id);
                continue;
            }
        };
        let Some(route) = ctx.route_of(&item.id) else {
            log!("feed"; "skipping `{}`: no routed page", item.id);
            continue;
        };

        entries.push(FeedEntry {
            title: item.title().to_owned(),
            url: absolute_url(route, config),
            date,
            author: feed_author(item, config),
            summary: item.meta.get("summary").map(str::to_owned),
            content,
        });
    }

    // Stable sort: equal dates keep input order.
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

/// Absolute URL for a routed page: base url + pretty path (a trailing
/// `index.html` collapses to its directory), percent-encoded per segment.
pub fn absolute_url(route: &str, config: &SiteConfig) -> String {
    let base = config
        .base
        .url
        .as_deref()
        .unwrap_or_default()
        .trim_end_matches('/');
    let pretty = route.strip_suffix("index.html").unwrap_or(route);
    let encoded = urlencoding::encode(pretty).replace("%2F", "/");
    format!("{base}/{encoded}")
}

/// Feed authors must be in `email (Name)` form. An author that already has
/// that shape (item metadata first, site config second) is used as-is;
/// anything else is combined with the configured email.
fn feed_author(item: &Item, config: &SiteConfig) -> Option<String> {
    static RE_VALID_AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\s*\([^)]+\)$").unwrap()
    });

    let author = item.meta.get("author").unwrap_or(&config.base.author);
    if author.is_empty() {
        return None;
    }
    if RE_VALID_AUTHOR.is_match(author) {
        return Some(author.to_owned());
    }
    Some(format!("{} ({author})", config.base.email))
}

/// Serialize entries as RSS 2.0 and write to the configured feed path.
pub fn write(entries: &[FeedEntry], config: &SiteConfig) -> Result<()> {
    let items: Vec<rss::Item> = entries
        .iter()
        .map(|entry| {
            ItemBuilder::default()
                .title(entry.title.clone())
                .link(entry.url.clone())
                .guid(
                    GuidBuilder::default()
                        .permalink(true)
                        .value(entry.url.clone())
                        .build(),
                )
                .description(entry.summary.clone())
                .content(entry.content.to_string())
                .pub_date(entry.date.to_rfc2822())
                .author(entry.author.clone())
                .build()
        })
        .collect();

    let channel = ChannelBuilder::default()
        .title(config.base.title.clone())
        .link(config.base.url.clone().unwrap_or_default())
        .description(config.base.description.clone())
        .language(config.base.language.clone())
        .generator("weft".to_string())
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("feed validation: {e}"))?;

    let path = config.build.output.join(&config.build.feed.path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, channel.to_string())
        .with_context(|| format!("Failed to write feed to {}", path.display()))?;

    log!("feed"; "{} entries", entries.len());
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Identifier, Metadata};
    use rustc_hash::FxHashMap;

    fn post(id: &str, date: Option<&str>) -> Arc<Item> {
        let mut meta = Metadata::new();
        meta.insert("title", id);
        if let Some(date) = date {
            meta.insert("date", date);
        }
        Arc::new(Item::new(Identifier::new(id), String::new(), meta))
    }

    fn context_for(items: &[Arc<Item>]) -> BuildContext {
        let routes: FxHashMap<Identifier, String> = items
            .iter()
            .map(|item| (item.id.clone(), format!("{}/index.html", item.id)))
            .collect();
        let ctx = BuildContext::new(items.to_vec(), routes);
        for item in items {
            ctx.snapshots()
                .capture(&item.id, "content", "<p>snapshot</p>");
        }
        ctx
    }

    fn config() -> SiteConfig {
        let mut config = SiteConfig::default();
        config.base.url = Some("https://example.com".to_owned());
        config
    }

    #[test]
    fn test_entries_sorted_by_date_descending() {
        let items = vec![
            post("three", Some("2024-03-01")),
            post("one", Some("2024-01-01")),
            post("two", Some("2024-02-01")),
        ];
        let ctx = context_for(&items);

        let entries = assemble(&items, "content", None, &ctx, &config());
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["three", "two", "one"]);
    }

    #[test]
    fn test_date_ties_keep_input_order() {
        let items = vec![
            post("first", Some("2024-01-01")),
            post("second", Some("2024-01-01")),
        ];
        let ctx = context_for(&items);

        let entries = assemble(&items, "content", None, &ctx, &config());
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[test]
    fn test_undated_items_are_skipped() {
        let items = vec![post("dated", Some("2024-01-01")), post("undated", None)];
        let ctx = context_for(&items);

        let entries = assemble(&items, "content", None, &ctx, &config());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "dated");
    }

    #[test]
    fn test_content_comes_from_snapshot() {
        let items = vec![post("a", Some("2024-01-01"))];
        let ctx = context_for(&items);

        let entries = assemble(&items, "content", None, &ctx, &config());
        assert_eq!(&*entries[0].content, "<p>snapshot</p>");
    }

    #[test]
    fn test_missing_snapshot_skips_entry() {
        let items = vec![post("a", Some("2024-01-01"))];
        let routes: FxHashMap<Identifier, String> = items
            .iter()
            .map(|item| (item.id.clone(), "a/index.html".to_owned()))
            .collect();
        let ctx = BuildContext::new(items.clone(), routes);

        let entries = assemble(&items, "content", None, &ctx, &config());
        assert!(entries.is_empty());
    }

    #[test]
    fn test_limit_truncates_after_sorting() {
        let items = vec![
            post("old", Some("2023-01-01")),
            post("new", Some("2024-01-01")),
        ];
        let ctx = context_for(&items);

        let entries = assemble(&items, "content", Some(1), &ctx, &config());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "new");
    }

    #[test]
    fn test_feed_author_normalized_to_email_name_form() {
        let config = config();
        let item = post("a", Some("2024-01-01"));
        // Config author is the default placeholder; gets the email prefix.
        let author = feed_author(&item, &config).unwrap();
        assert_eq!(author, "author@noreply.weft (<YOUR_NAME>)");

        // An already well-formed metadata author passes through.
        let mut meta = Metadata::new();
        meta.insert("author", "alice@example.com (Alice)");
        meta.insert("date", "2024-01-01");
        let item = Item::new(Identifier::new("b"), String::new(), meta);
        assert_eq!(
            feed_author(&item, &config).as_deref(),
            Some("alice@example.com (Alice)")
        );
    }

    #[test]
    fn test_absolute_url_collapses_index_html() {
        let config = config();
        assert_eq!(
            absolute_url("posts/hello/index.html", &config),
            "https://example.com/posts/hello/"
        );
        assert_eq!(
            absolute_url("pages/about.html", &config),
            "https://example.com/pages/about.html"
        );
    }

    #[test]
    fn test_write_produces_valid_rss() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.base.title = "Test Feed".to_owned();
        config.base.description = "Testing".to_owned();
        config.build.output = dir.path().to_path_buf();

        let items = vec![post("a", Some("2024-01-01"))];
        let ctx = context_for(&items);
        let entries = assemble(&items, "content", None, &ctx, &config);

        write(&entries, &config).unwrap();
        let xml = std::fs::read_to_string(dir.path().join("feed.xml")).unwrap();
        assert!(xml.contains("<rss"));
        assert!(xml.contains("Test Feed"));
        assert!(xml.contains("https://example.com/a/"));
    }
}
