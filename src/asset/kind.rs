//! File classification by extension.

use std::fmt;
use std::path::Path;

/// How a source file is turned into its output artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Raster/vector images, copied byte-for-byte.
    ImagePassthrough,
    /// JavaScript, minified and optionally bundled.
    Script,
    /// CSS, minified.
    Stylesheet,
    /// HTML, minified.
    Markup,
    /// Anything else, copied byte-for-byte.
    GenericPassthrough,
}

impl Strategy {
    pub const ALL: [Self; 5] = [
        Self::ImagePassthrough,
        Self::Script,
        Self::Stylesheet,
        Self::Markup,
        Self::GenericPassthrough,
    ];

    /// Classify a path by its lowercased extension. Content is never read.
    pub fn classify(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "svg" | "ico" | "bmp" | "tiff" => {
                Self::ImagePassthrough
            }
            "js" | "mjs" | "cjs" => Self::Script,
            "css" => Self::Stylesheet,
            "html" | "htm" => Self::Markup,
            _ => Self::GenericPassthrough,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ImagePassthrough => "image",
            Self::Script => "script",
            Self::Stylesheet => "style",
            Self::Markup => "markup",
            Self::GenericPassthrough => "copy",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::ImagePassthrough => 0,
            Self::Script => 1,
            Self::Stylesheet => 2,
            Self::Markup => 3,
            Self::GenericPassthrough => 4,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(name: &str) -> Strategy {
        Strategy::classify(Path::new(name))
    }

    #[test]
    fn test_images() {
        for name in [
            "a.png", "a.jpg", "a.jpeg", "a.gif", "a.webp", "a.svg", "a.ico", "a.bmp", "a.tiff",
        ] {
            assert_eq!(classify(name), Strategy::ImagePassthrough, "{name}");
        }
    }

    #[test]
    fn test_pipelines() {
        assert_eq!(classify("app.js"), Strategy::Script);
        assert_eq!(classify("mod.mjs"), Strategy::Script);
        assert_eq!(classify("legacy.cjs"), Strategy::Script);
        assert_eq!(classify("site.css"), Strategy::Stylesheet);
        assert_eq!(classify("index.html"), Strategy::Markup);
        assert_eq!(classify("old.htm"), Strategy::Markup);
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert_eq!(classify("LOGO.PNG"), Strategy::ImagePassthrough);
        assert_eq!(classify("App.JS"), Strategy::Script);
        assert_eq!(classify("Index.HTML"), Strategy::Markup);
    }

    #[test]
    fn test_default_is_passthrough() {
        assert_eq!(classify("robots.txt"), Strategy::GenericPassthrough);
        assert_eq!(classify("font.woff2"), Strategy::GenericPassthrough);
        assert_eq!(classify("Makefile"), Strategy::GenericPassthrough);
        assert_eq!(classify(".htaccess"), Strategy::GenericPassthrough);
        assert_eq!(classify("app.ts"), Strategy::GenericPassthrough);
    }

    #[test]
    fn test_only_last_extension_counts() {
        assert_eq!(classify("app.min.js"), Strategy::Script);
        assert_eq!(classify("style.css.map"), Strategy::GenericPassthrough);
    }

    #[test]
    fn test_index_is_dense() {
        for (i, strategy) in Strategy::ALL.iter().enumerate() {
            assert_eq!(strategy.index(), i);
        }
    }
}
