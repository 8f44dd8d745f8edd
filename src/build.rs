//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── discover items, plan jobs
//!     │
//!     ├── validate structure ──► pattern ambiguity, tag segment
//!     │                          collisions, route collisions
//!     │                          (fatal; nothing is written)
//!     │
//!     ├── phase 1 ──► self-contained item × rule chains, in parallel;
//!     │               failures isolated per item × rule
//!     │
//!     └── phase 2 ──► tag index installed, then aggregate chains,
//!                     tag pages, feed, sitemap, manifest
//! ```
//!
//! The run exits non-zero listing every collected error, not just the first.

use crate::config::SiteConfig;
use crate::content;
use crate::engine::{
    BuildContext, BuildError, DataAccess, Identifier, Job,
};
use crate::feed;
use crate::log;
use crate::manifest::{self, PageRecord};
use crate::render::{self, DocumentRenderer};
use crate::site::{self, SitePlan};
use crate::sitemap::{self, UrlEntry};
use crate::tags::{self, TagIndex};
use crate::template::Templates;
use crate::utils::minify::{MinifyKind, minify};
use anyhow::{Context as _, Result, bail};
use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::borrow::Cow;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Build the site, or only validate it when `check_only` is set.
pub fn build_site(config: &'static SiteConfig, check_only: bool) -> Result<()> {
    let templates: &'static Templates =
        Box::leak(Box::new(Templates::load(&config.build.templates)?));
    let renderer: &'static dyn DocumentRenderer = Box::leak(render::from_config(config));
    let plan = site::rules(config, renderer, templates)?;
    run(config, &plan, check_only)
}

/// Execute a site plan against the discovered content.
pub fn run(config: &'static SiteConfig, plan: &SitePlan, check_only: bool) -> Result<()> {
    let items = content::discover(config)?;
    log!("content"; "found {} items", items.len());

    // ========================================================================
    // Structural validation - fatal before anything is written
    // ========================================================================

    let mut errors: Vec<BuildError> = Vec::new();

    if config.build.strict_patterns {
        errors.extend(plan.registry.ambiguities());
    }

    let jobs = plan.registry.plan(&items)?;

    let matched = matched_items(&jobs, &items);
    let mut tag_index = TagIndex::build(&matched, &config.build.tags.field, config.tag_delimiter());
    let tag_segments = match tags::segments(&tag_index) {
        Ok(map) => map,
        Err(mut collisions) => {
            errors.append(&mut collisions);
            FxHashMap::default()
        }
    };

    // Every planned output path, including synthesized ones, is claimed
    // before compilation so collisions surface with both identifiers.
    let mut by_route: FxHashMap<String, Identifier> = FxHashMap::default();
    let mut routes: FxHashMap<Identifier, String> = FxHashMap::default();
    for job in &jobs {
        let Some(route) = &job.route else { continue };
        claim(&mut by_route, route.clone(), job.item.id.clone(), &mut errors);
        routes
            .entry(job.item.id.clone())
            .or_insert_with(|| route.clone());
    }
    if config.build.tags.enable {
        for (tag, segment) in &tag_segments {
            let route = tags::route_for(&config.build.tags.route, segment);
            claim(
                &mut by_route,
                route,
                Identifier::new(format!("tag:{tag}")),
                &mut errors,
            );
        }
    }
    if config.build.feed.enable {
        let route = config.build.feed.path.to_string_lossy().into_owned();
        claim(&mut by_route, route, Identifier::new("feed"), &mut errors);
    }
    if config.build.sitemap.enable {
        let route = config.build.sitemap.path.to_string_lossy().into_owned();
        claim(&mut by_route, route, Identifier::new("sitemap"), &mut errors);
    }
    if config.build.manifest.enable {
        let route = config.build.manifest.path.to_string_lossy().into_owned();
        claim(&mut by_route, route, Identifier::new("manifest"), &mut errors);
    }

    if !errors.is_empty() {
        return report(0, errors);
    }
    if check_only {
        log!("check"; "{} items, {} jobs, {} tags - ok", items.len(), jobs.len(), tag_segments.len());
        return Ok(());
    }

    if config.build.clean && config.build.output.exists() {
        fs::remove_dir_all(&config.build.output).with_context(|| {
            format!(
                "Failed to clear output directory: {}",
                config.build.output.display()
            )
        })?;
    }

    let ctx = BuildContext::new(items.clone(), routes);

    // ========================================================================
    // Phase 1: self-contained chains, in parallel
    // ========================================================================

    let (self_jobs, full_jobs): (Vec<&Job<'_>>, Vec<&Job<'_>>) = jobs
        .iter()
        .partition(|job| job.rule.access == DataAccess::SelfOnly);

    log!("compile"; "building {} items", self_jobs.len());
    let collected: Mutex<Vec<BuildError>> = Mutex::new(Vec::new());
    let written = AtomicUsize::new(0);

    self_jobs.par_iter().for_each(|job| {
        match run_job(job, &ctx, config) {
            Ok(true) => {
                written.fetch_add(1, Ordering::Relaxed);
            }
            Ok(false) => {}
            Err(err) => collected.lock().push(err),
        }
    });

    let mut errors = collected.into_inner();
    let mut written = written.load(Ordering::Relaxed);

    // ========================================================================
    // Phase 2: aggregation - every producer has finished
    // ========================================================================

    tag_index.sort_by(|a, b| site::date_of(b).cmp(&site::date_of(a)));
    ctx.set_tags(tag_index);

    for job in &full_jobs {
        match run_job(job, &ctx, config) {
            Ok(true) => written += 1,
            Ok(false) => {}
            Err(err) => errors.push(err),
        }
    }

    if config.build.tags.enable {
        written += build_tag_pages(plan, &ctx, &tag_segments, config, &mut errors)?;
    }

    if config.build.feed.enable {
        let posts: Vec<Arc<_>> = items
            .iter()
            .filter(|item| plan.feed_source.matches(&item.id))
            .cloned()
            .collect();
        let entries = feed::assemble(
            &posts,
            site::CONTENT_SNAPSHOT,
            config.build.feed.limit,
            &ctx,
            config,
        );
        feed::write(&entries, config)?;
        written += 1;
    }

    let (sitemap_entries, manifest_records) = derived_outputs(&jobs, config);
    sitemap::write(&sitemap_entries, config)?;
    manifest::write(&manifest_records, config)?;

    report(written, errors)
}

/// Run one job and write its output when routed. `Ok(true)` means a file was
/// written.
fn run_job(job: &Job<'_>, ctx: &BuildContext, config: &SiteConfig) -> Result<bool, BuildError> {
    let content = job.run(ctx)?;
    match &job.route {
        Some(route) => {
            write_output(route, content.as_bytes(), config)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Render and write one listing page per tag.
fn build_tag_pages(
    plan: &SitePlan,
    ctx: &BuildContext,
    tag_segments: &FxHashMap<String, String>,
    config: &SiteConfig,
    errors: &mut Vec<BuildError>,
) -> Result<usize> {
    let index = ctx.tags()?;
    let mut written = 0;

    for (tag, bucket) in index.iter() {
        let Some(segment) = tag_segments.get(tag) else {
            continue;
        };
        let route = tags::route_for(&config.build.tags.route, segment);
        match site::render_tag_page(tag, bucket, ctx, plan.templates, config) {
            Ok(html) => match write_output(&route, html.as_bytes(), config) {
                Ok(()) => written += 1,
                Err(err) => errors.push(err),
            },
            Err(source) => errors.push(BuildError::CompilerStep {
                id: Identifier::new(format!("tag:{segment}")),
                rule: "tag-pages".to_owned(),
                step: 0,
                source,
            }),
        }
    }

    Ok(written)
}

/// Sitemap entries and manifest records for every routed page.
fn derived_outputs(jobs: &[Job<'_>], config: &SiteConfig) -> (Vec<UrlEntry>, Vec<PageRecord>) {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut urls = Vec::new();
    let mut records = Vec::new();

    for job in jobs {
        let Some(route) = job.route.as_deref() else {
            continue;
        };
        if !seen.insert(route) {
            continue;
        }
        let date = site::date_of(&job.item).map(|d| d.to_ymd());
        urls.push(UrlEntry {
            loc: feed::absolute_url(route, config),
            lastmod: date.clone(),
        });
        records.push(PageRecord {
            url: site::page_href(route),
            title: job.item.meta.get("title").map(str::to_owned),
            date,
            tags: job
                .item
                .meta
                .list(&config.build.tags.field, config.tag_delimiter()),
        });
    }

    (urls, records)
}

/// Claim an output route; a second claim by a different identifier is a
/// collision.
fn claim(
    by_route: &mut FxHashMap<String, Identifier>,
    route: String,
    id: Identifier,
    errors: &mut Vec<BuildError>,
) {
    match by_route.get(&route) {
        Some(first) if *first != id => errors.push(BuildError::RouteCollision {
            route,
            first: first.clone(),
            second: id,
        }),
        Some(_) => {}
        None => {
            by_route.insert(route, id);
        }
    }
}

/// Items matched by at least one rule, in discovery order.
fn matched_items(
    jobs: &[Job<'_>],
    items: &[Arc<crate::engine::Item>],
) -> Vec<Arc<crate::engine::Item>> {
    let matched: FxHashSet<&Identifier> = jobs.iter().map(|job| &job.item.id).collect();
    items
        .iter()
        .filter(|item| matched.contains(&item.id))
        .cloned()
        .collect()
}

/// Write one output file under the output directory, minifying by kind.
fn write_output(route: &str, content: &[u8], config: &SiteConfig) -> Result<(), BuildError> {
    let path = config.build.output.join(route);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BuildError::Write {
            route: route.to_owned(),
            source,
        })?;
    }

    let kind = if route.ends_with(&format!(".{}", config.build.publish_ext)) {
        Some(MinifyKind::Html)
    } else if route.ends_with(".xml") {
        Some(MinifyKind::Xml)
    } else {
        None
    };
    let content = match kind {
        Some(kind) => minify(kind, content, config.build.minify),
        None => Cow::Borrowed(content),
    };

    fs::write(&path, &*content).map_err(|source| BuildError::Write {
        route: route.to_owned(),
        source,
    })
}

/// Final per-run report: every collected error, then the aggregate status.
fn report(written: usize, errors: Vec<BuildError>) -> Result<()> {
    if errors.is_empty() {
        log!("build"; "done: {written} files written");
        return Ok(());
    }
    for err in &errors {
        log!("error"; "{err}");
    }
    bail!("build finished with {} error(s)", errors.len());
}

// ============================================================================
// Tests
// ============================================================================
