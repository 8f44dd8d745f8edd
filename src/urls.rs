//! Context-dependent URL rewriting.
//!
//! The same compiled fragment serves two audiences: in-site pages keep
//! root-relative links so deployments stay portable, while feed readers
//! require absolute URLs. [`externalize`] prefixes the configured site root
//! onto any non-external `href`/`src`; [`internalize`] strips that prefix
//! back off. Both passes are idempotent on input already in target form, and
//! third-party URLs pass through untouched.
//!
//! The post chain runs externalize before its content snapshot and
//! internalize after final templating, so one compiled artifact feeds both
//! the HTML page pipeline and the syndication pipeline.

use anyhow::{Result, bail};
use quick_xml::{
    Reader, Writer,
    events::{BytesStart, Event},
};
use std::borrow::Cow;
use std::io::Cursor;
use std::str;

/// Prefix every non-external `href`/`src` with `site_root`.
pub fn externalize(html: &str, site_root: &str) -> Result<String> {
    let root = site_root.trim_end_matches('/');
    rewrite_links(html, &|url| {
        if is_external(url) || url.starts_with('#') || has_root_prefix(url, root) {
            None
        } else {
            Some(format!("{root}/{}", url.trim_start_matches('/')))
        }
    })
}

/// Strip the `site_root` prefix back to a root-relative URL.
pub fn internalize(html: &str, site_root: &str) -> Result<String> {
    let root = site_root.trim_end_matches('/');
    rewrite_links(html, &|url| {
        if !has_root_prefix(url, root) {
            return None;
        }
        let rest = &url[root.len()..];
        Some(if rest.is_empty() {
            "/".to_owned()
        } else {
            rest.to_owned()
        })
    })
}

/// True for `root`, `root/...`, `root#...`, `root?...` — but not for a
/// different host that merely starts with the same characters.
fn has_root_prefix(url: &str, root: &str) -> bool {
    url.strip_prefix(root).is_some_and(|rest| {
        rest.is_empty() || rest.starts_with('/') || rest.starts_with('#') || rest.starts_with('?')
    })
}

/// A link is external when it carries a scheme (`https:`, `mailto:`, ...) or
/// is protocol-relative (`//cdn.example`).
pub fn is_external(link: &str) -> bool {
    if link.starts_with("//") {
        return true;
    }
    link.find(':').is_some_and(|pos| {
        pos > 0
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Stream the document through quick-xml, mapping `href`/`src` attribute
/// values; `map` returns `None` to leave a URL untouched.
fn rewrite_links(html: &str, map: &dyn Fn(&str) -> Option<String>) -> Result<String> {
    let mut reader = Reader::from_reader(html.as_bytes());
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);
    let mut writer = Writer::new(Cursor::new(Vec::with_capacity(html.len())));

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) => {
                writer.write_event(Event::Start(rewrite_elem(&elem, map)?))?;
            }
            Ok(Event::Empty(elem)) => {
                writer.write_event(Event::Empty(rewrite_elem(&elem, map)?))?;
            }
            Ok(Event::Eof) => break,
            Ok(event) => writer.write_event(event)?,
            Err(e) => bail!(
                "HTML parse error at position {}: {e:?}",
                reader.error_position()
            ),
        }
    }

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes)?)
}

/// Rebuild an element with mapped link attributes (avoids duplication when
/// pushing onto the original).
fn rewrite_elem(
    elem: &BytesStart<'_>,
    map: &dyn Fn(&str) -> Option<String>,
) -> Result<BytesStart<'static>> {
    let tag = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    let mut new_elem = BytesStart::new(tag);
    for attr in elem.attributes() {
        let attr = attr?;
        let key = attr.key.as_ref().to_vec();
        let value: Cow<'_, [u8]> = if matches!(attr.key.as_ref(), b"href" | b"src") {
            let url = str::from_utf8(&attr.value)?;
            match map(url) {
                Some(mapped) => Cow::Owned(mapped.into_bytes()),
                None => attr.value.clone(),
            }
        } else {
            attr.value.clone()
        };
        new_elem.push_attribute((key.as_slice(), value.as_ref()));
    }
    Ok(new_elem)
}

// ============================================================================
// Tests
// ============================================================================
