//! Document rendering collaborator.
//!
//! The markdown-to-HTML parser is an external program configured under
//! `[build.renderer]`; the engine pipes an item's body to its stdin and reads
//! rendered HTML from stdout. An empty command means the content is already
//! publishable markup and passes through untouched.

use crate::config::SiteConfig;
use crate::engine::Item;
use crate::utils::command::run_with_input;
use anyhow::{Context as _, Result};

/// Renders an item body into publishable HTML.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, item: &Item) -> Result<String>;
}

/// Pipes the body through a configured external command.
pub struct CommandRenderer {
    command: Vec<String>,
}

impl DocumentRenderer for CommandRenderer {
    fn render(&self, item: &Item) -> Result<String> {
        let output = run_with_input(&self.command, &item.body, None)
            .with_context(|| format!("rendering `{}`", item.id))?;
        String::from_utf8(output.stdout).context("renderer produced invalid UTF-8")
    }
}

/// Passes the body through unchanged (pre-rendered content, tests).
pub struct Passthrough;

impl DocumentRenderer for Passthrough {
    fn render(&self, item: &Item) -> Result<String> {
        Ok(item.body.clone())
    }
}

/// Select the renderer from config: an empty command means passthrough.
pub fn from_config(config: &SiteConfig) -> Box<dyn DocumentRenderer> {
    let command = &config.build.renderer.command;
    if command.is_empty() {
        Box::new(Passthrough)
    } else {
        Box::new(CommandRenderer {
            command: command.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Identifier, Metadata};

    fn item(body: &str) -> Item {
        Item::new(Identifier::new("a.md"), body.to_owned(), Metadata::new())
    }

    #[test]
    fn test_passthrough_returns_body() {
        let out = Passthrough.render(&item("<p>already html</p>")).unwrap();
        assert_eq!(out, "<p>already html</p>");
    }

    #[test]
    fn test_command_renderer_pipes_body() {
        let renderer = CommandRenderer {
            command: vec!["cat".to_owned()],
        };
        let out = renderer.render(&item("body text")).unwrap();
        assert_eq!(out, "body text");
    }

    #[test]
    fn test_command_renderer_failure_names_item() {
        let renderer = CommandRenderer {
            command: vec!["false".to_owned()],
        };
        let err = renderer.render(&item("x")).unwrap_err();
        assert!(format!("{err:#}").contains("a.md"));
    }
}
