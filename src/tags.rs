//! Tag aggregation: the tag → items reverse index and tag path segments.
//!
//! The index is built once per run by a single pass over all matched items
//! and is read-only afterwards. Each tag also gets a sanitized path segment
//! used to synthesize its listing page route; two distinct tags landing on
//! the same segment is a fatal configuration error.

use crate::engine::error::BuildError;
use crate::engine::item::Item;
use deunicode::deunicode;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Reverse index from tag string to the items carrying that tag.
///
/// Buckets keep discovery order as built; callers re-sort before rendering.
#[derive(Debug, Default)]
pub struct TagIndex {
    buckets: BTreeMap<String, Vec<Arc<Item>>>,
}

impl TagIndex {
    /// Single pass over `items`, splitting the `field` metadata value on
    /// `delimiter`. Each item lands once per distinct tag, in discovery
    /// order.
    pub fn build(items: &[Arc<Item>], field: &str, delimiter: char) -> Self {
        let mut buckets: BTreeMap<String, Vec<Arc<Item>>> = BTreeMap::new();
        for item in items {
            for tag in item.meta.list(field, delimiter) {
                let bucket = buckets.entry(tag).or_default();
                if !bucket.iter().any(|existing| existing.id == item.id) {
                    bucket.push(Arc::clone(item));
                }
            }
        }
        Self { buckets }
    }

    /// Re-sort every bucket with `cmp` (typically date descending).
    pub fn sort_by(&mut self, mut cmp: impl FnMut(&Arc<Item>, &Arc<Item>) -> std::cmp::Ordering) {
        for bucket in self.buckets.values_mut() {
            bucket.sort_by(&mut cmp);
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn get(&self, tag: &str) -> Option<&[Arc<Item>]> {
        self.buckets.get(tag).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Arc<Item>])> {
        self.buckets
            .iter()
            .map(|(tag, bucket)| (tag.as_str(), bucket.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Sanitize a tag into a deterministic, safe path segment: ASCII
/// transliteration, lowercase, whitespace → hyphen, everything else outside
/// `[a-z0-9-_.]` stripped, hyphen runs collapsed.
pub fn sanitize(tag: &str) -> String {
    let ascii = deunicode(tag.trim());
    let mut segment = String::with_capacity(ascii.len());
    let mut last_hyphen = false;
    for c in ascii.chars() {
        let mapped = match c {
            c if c.is_ascii_alphanumeric() => Some(c.to_ascii_lowercase()),
            c if c.is_whitespace() => Some('-'),
            '-' | '_' | '.' => Some(c),
            _ => None,
        };
        match mapped {
            Some('-') if last_hyphen => {}
            Some(c) => {
                last_hyphen = c == '-';
                segment.push(c);
            }
            None => {}
        }
    }
    segment.trim_matches('-').to_owned()
}

/// Map every tag in the index to its sanitized segment, collecting every
/// collision between distinct tags.
pub fn segments(index: &TagIndex) -> Result<FxHashMap<String, String>, Vec<BuildError>> {
    let mut by_segment: FxHashMap<String, String> = FxHashMap::default();
    let mut out = FxHashMap::default();
    let mut collisions = Vec::new();

    for tag in index.tags() {
        let segment = sanitize(tag);
        if let Some(first) = by_segment.get(&segment) {
            collisions.push(BuildError::TagCollision {
                segment: segment.clone(),
                first: first.clone(),
                second: tag.to_owned(),
            });
            continue;
        }
        by_segment.insert(segment.clone(), tag.to_owned());
        out.insert(tag.to_owned(), segment);
    }

    if collisions.is_empty() {
        Ok(out)
    } else {
        Err(collisions)
    }
}

/// Expand the per-tag route template (`tags/{tag}/index.html`).
pub fn route_for(template: &str, segment: &str) -> String {
    template.replace("{tag}", segment)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::metadata::Metadata;
    use crate::engine::pattern::Identifier;

    fn item(id: &str, tags: &str) -> Arc<Item> {
        let mut meta = Metadata::new();
        if !tags.is_empty() {
            meta.insert("tags", tags);
        }
        Arc::new(Item::new(Identifier::new(id), String::new(), meta))
    }

    #[test]
    fn test_index_groups_by_tag_in_discovery_order() {
        let items = vec![item("posts/1.md", "a, b"), item("posts/2.md", "b")];
        let index = TagIndex::build(&items, "tags", ',');

        let a: Vec<_> = index.get("a").unwrap().iter().map(|i| i.id.as_str()).collect();
        let b: Vec<_> = index.get("b").unwrap().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(a, vec!["posts/1.md"]);
        assert_eq!(b, vec!["posts/1.md", "posts/2.md"]);
    }

    #[test]
    fn test_item_never_appears_under_absent_tag() {
        let items = vec![item("posts/1.md", "a"), item("posts/2.md", "b")];
        let index = TagIndex::build(&items, "tags", ',');

        assert!(
            index
                .get("b")
                .unwrap()
                .iter()
                .all(|i| i.id.as_str() != "posts/1.md")
        );
    }

    #[test]
    fn test_duplicate_tag_on_one_item_counts_once() {
        let items = vec![item("posts/1.md", "rust, rust")];
        let index = TagIndex::build(&items, "tags", ',');
        assert_eq!(index.get("rust").unwrap().len(), 1);
    }

    #[test]
    fn test_untagged_items_are_absent() {
        let items = vec![item("posts/1.md", "")];
        let index = TagIndex::build(&items, "tags", ',');
        assert!(index.is_empty());
    }

    #[test]
    fn test_sort_by_reorders_buckets() {
        let older = {
            let mut m = Metadata::new();
            m.insert("tags", "x");
            m.insert("date", "2023-01-01");
            Arc::new(Item::new(Identifier::new("posts/old.md"), String::new(), m))
        };
        let newer = {
            let mut m = Metadata::new();
            m.insert("tags", "x");
            m.insert("date", "2024-01-01");
            Arc::new(Item::new(Identifier::new("posts/new.md"), String::new(), m))
        };

        let mut index = TagIndex::build(&[older, newer], "tags", ',');
        index.sort_by(|a, b| b.meta.date("date").ok().cmp(&a.meta.date("date").ok()));

        let x: Vec<_> = index.get("x").unwrap().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(x, vec!["posts/new.md", "posts/old.md"]);
    }

    #[test]
    fn test_sanitize_is_deterministic_and_safe() {
        assert_eq!(sanitize("Build Systems"), "build-systems");
        assert_eq!(sanitize("  Rust  "), "rust");
        assert_eq!(sanitize("C++"), "c");
        assert_eq!(sanitize("naïve"), "naive");
        assert_eq!(sanitize("a   b"), "a-b");
        assert_eq!(sanitize("Build Systems"), sanitize("Build Systems"));
    }

    #[test]
    fn test_segment_collision_between_distinct_tags() {
        let items = vec![item("posts/1.md", "Build Systems, build systems")];
        let index = TagIndex::build(&items, "tags", ',');

        let errs = segments(&index).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert!(matches!(errs[0], BuildError::TagCollision { .. }));
    }

    #[test]
    fn test_segments_without_collision() {
        let items = vec![item("posts/1.md", "rust, builds")];
        let index = TagIndex::build(&items, "tags", ',');
        let map = segments(&index).unwrap();
        assert_eq!(map["rust"], "rust");
        assert_eq!(map["builds"], "builds");
    }

    #[test]
    fn test_route_template_expansion() {
        assert_eq!(
            route_for("tags/{tag}/index.html", "build-systems"),
            "tags/build-systems/index.html"
        );
    }
}
