//! Output route resolution.

use crate::engine::pattern::Identifier;
use anyhow::{Result, bail};

/// How a rule maps a matched identifier to an output path.
///
/// Resolution is deterministic and side-effect-free; collisions between
/// distinct identifiers are detected by the planner before anything is
/// written.
#[derive(Debug, Clone)]
pub enum Route {
    /// Swap the content extension for the publish extension (the default).
    SetExtension(String),
    /// A single fixed output path, for single named resources.
    Constant(String),
    /// Template over pattern captures: `posts/{0}/index.html`.
    FromCaptures(String),
}

impl Route {
    pub fn resolve(&self, id: &Identifier, captures: &[String]) -> Result<String> {
        match self {
            Self::SetExtension(ext) => Ok(swap_extension(id.as_str(), ext)),
            Self::Constant(path) => Ok(path.clone()),
            Self::FromCaptures(template) => expand(template, captures),
        }
    }
}

/// Replace the final segment's extension, leaving directory dots alone.
fn swap_extension(path: &str, ext: &str) -> String {
    let (dir, file) = path.rsplit_once('/').map_or(("", path), |(d, f)| (d, f));
    let stem = file.rsplit_once('.').map_or(file, |(s, _)| s);
    if dir.is_empty() {
        format!("{stem}.{ext}")
    } else {
        format!("{dir}/{stem}.{ext}")
    }
}

/// Expand `{n}` placeholders against the pattern captures.
fn expand(template: &str, captures: &[String]) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('}') else {
            bail!("unclosed `{{` in route template `{template}`");
        };
        let key = &rest[open + 1..open + close];
        let Ok(index) = key.parse::<usize>() else {
            bail!("route template `{template}`: `{{{key}}}` is not a capture index");
        };
        let Some(value) = captures.get(index) else {
            bail!(
                "route template `{template}` references capture {index}, but the pattern produced {}",
                captures.len()
            );
        };
        out.push_str(value);
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        Identifier::new(s)
    }

    #[test]
    fn test_set_extension() {
        let route = Route::SetExtension("html".to_owned());
        assert_eq!(
            route.resolve(&id("pages/about.md"), &[]).unwrap(),
            "pages/about.html"
        );
    }

    #[test]
    fn test_set_extension_ignores_directory_dots() {
        let route = Route::SetExtension("html".to_owned());
        assert_eq!(
            route.resolve(&id("v1.2/notes.md"), &[]).unwrap(),
            "v1.2/notes.html"
        );
    }

    #[test]
    fn test_constant() {
        let route = Route::Constant("index.html".to_owned());
        assert_eq!(route.resolve(&id("index.md"), &[]).unwrap(), "index.html");
    }

    #[test]
    fn test_from_captures() {
        let route = Route::FromCaptures("posts/{0}/index.html".to_owned());
        assert_eq!(
            route
                .resolve(&id("posts/hello.md"), &["hello".to_owned()])
                .unwrap(),
            "posts/hello/index.html"
        );
    }

    #[test]
    fn test_from_captures_out_of_range() {
        let route = Route::FromCaptures("posts/{1}.html".to_owned());
        assert!(route.resolve(&id("posts/x.md"), &["x".to_owned()]).is_err());
    }

    #[test]
    fn test_from_captures_rejects_non_index_key() {
        let route = Route::FromCaptures("tags/{tag}.html".to_owned());
        assert!(route.resolve(&id("x.md"), &[]).is_err());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let route = Route::FromCaptures("posts/{0}/index.html".to_owned());
        let a = route.resolve(&id("posts/x.md"), &["x".to_owned()]).unwrap();
        let b = route.resolve(&id("posts/x.md"), &["x".to_owned()]).unwrap();
        assert_eq!(a, b);
    }
}
