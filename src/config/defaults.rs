//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }

    pub fn email() -> String {
        "author@noreply.weft".into()
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn templates() -> PathBuf {
        "templates".into()
    }

    pub fn content_ext() -> String {
        "md".into()
    }

    pub fn publish_ext() -> String {
        "html".into()
    }

    pub mod renderer {
        pub fn command() -> Vec<String> {
            Vec::new()
        }
    }

    pub mod feed {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "feed.xml".into()
        }

        pub fn limit() -> Option<usize> {
            None
        }
    }

    pub mod tags {
        pub fn field() -> String {
            "tags".into()
        }

        pub fn delimiter() -> String {
            ",".into()
        }

        pub fn route() -> String {
            "tags/{tag}/index.html".into()
        }

        pub fn template() -> String {
            "tag".into()
        }
    }

    pub mod sitemap {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "sitemap.xml".into()
        }
    }

    pub mod manifest {
        use std::path::PathBuf;

        pub fn path() -> PathBuf {
            "site.json".into()
        }
    }
}
