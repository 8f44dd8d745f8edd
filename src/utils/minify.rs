//! HTML and XML minification for written output.

use std::borrow::Cow;

/// Content kind for minification.
#[derive(Debug, Clone, Copy)]
pub enum MinifyKind {
    Html,
    Xml,
}

/// Minify `content` when `enabled`; borrowed passthrough otherwise.
pub fn minify(kind: MinifyKind, content: &[u8], enabled: bool) -> Cow<'_, [u8]> {
    if !enabled {
        return Cow::Borrowed(content);
    }
    match kind {
        MinifyKind::Html => Cow::Owned(minify_html_bytes(content)),
        MinifyKind::Xml => Cow::Owned(minify_xml_bytes(content)),
    }
}

fn minify_html_bytes(html: &[u8]) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;
    minify_html::minify(html, &cfg)
}

/// XML needs no structural minifier: strip indentation and blank lines.
fn minify_xml_bytes(xml: &[u8]) -> Vec<u8> {
    let xml = std::str::from_utf8(xml).unwrap_or_default();
    xml.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("")
        .into_bytes()
}
