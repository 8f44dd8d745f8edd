//! Site scaffolding for `weft init`.

use crate::config::SiteConfig;
use crate::log;
use anyhow::{Context as _, Result};
use std::fs;
use std::path::Path;

const SAMPLE_CONFIG: &str = r#"[base]
title = "My Site"
description = "A site built with weft"
author = "Your Name"
# Required for feed/sitemap generation:
# url = "https://example.com"

[build]
content = "content"
output = "public"
templates = "templates"

# Pipe content bodies through an external renderer, e.g.:
# [build.renderer]
# command = ["pandoc", "--from", "markdown", "--to", "html"]

[build.feed]
enable = false

[build.tags]
enable = true
"#;

const SAMPLE_POST: &str = r#"---
title: Hello World
date: 2026-01-01
tags: meta
---
<p>Welcome to your new site.</p>
"#;

const SAMPLE_INDEX: &str = "<p>Latest posts:</p>\n";

const POST_TEMPLATE: &str = r#"<html>
<head><title>$title$ - $site_title$</title></head>
<body>
<article>
<h1>$title$</h1>
<p class="meta">$date$ $for(tags)$#$name$ $endfor$</p>
$body$
</article>
</body>
</html>
"#;

const PAGE_TEMPLATE: &str = r#"<html>
<head><title>$title$ - $site_title$</title></head>
<body>
$body$
</body>
</html>
"#;

const INDEX_TEMPLATE: &str = r#"<html>
<head><title>$site_title$</title></head>
<body>
$body$
<ul>
$for(posts)$<li><a href="$url$">$title$</a> <span>$date$</span><p>$teaser$</p></li>
$endfor$</ul>
</body>
</html>
"#;

const TAG_TEMPLATE: &str = r#"<html>
<head><title>$tag$ - $site_title$</title></head>
<body>
<h1>Posts tagged $tag$</h1>
<ul>
$for(posts)$<li><a href="$url$">$title$</a></li>
$endfor$</ul>
</body>
</html>
"#;

/// Create a new site skeleton at the configured root.
pub fn new_site(config: &'static SiteConfig) -> Result<()> {
    let root = config.get_root();

    write_new(&root.join("weft.toml"), SAMPLE_CONFIG)?;
    write_new(&root.join("content/index.md"), SAMPLE_INDEX)?;
    write_new(&root.join("content/posts/hello-world.md"), SAMPLE_POST)?;
    fs::create_dir_all(root.join("content/pages"))?;
    write_new(&root.join("templates/post.html"), POST_TEMPLATE)?;
    write_new(&root.join("templates/page.html"), PAGE_TEMPLATE)?;
    write_new(&root.join("templates/index.html"), INDEX_TEMPLATE)?;
    write_new(&root.join("templates/tag.html"), TAG_TEMPLATE)?;

    log!("init"; "site created at {}", root.display());
    Ok(())
}

fn write_new(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
