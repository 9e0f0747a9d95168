//! Parser configuration.

use url::Url;

use crate::vocab;

/// Configuration for a feed parser.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Category scheme that identifies the type-name category.
    pub type_scheme: String,

    /// Link relation prefix that identifies navigation links.
    pub nav_rel_prefix: String,

    /// Maximum nesting depth for inline expansions and complex values.
    pub max_depth: usize,

    /// Base address relative references resolve against, absent an `xml:base`.
    pub base: Option<Url>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            type_scheme: vocab::SCHEME_DEFAULT.to_string(),
            nav_rel_prefix: vocab::RELATED_REL_PREFIX.to_string(),
            max_depth: 32,
            base: None,
        }
    }
}

impl ParseOptions {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the category scheme that carries the entry type name.
    #[must_use]
    pub fn type_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.type_scheme = scheme.into();
        self
    }

    /// Sets the link relation prefix for navigation links.
    #[must_use]
    pub fn nav_rel_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.nav_rel_prefix = prefix.into();
        self
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the document base address.
    #[must_use]
    pub fn base(mut self, base: Url) -> Self {
        self.base = Some(base);
        self
    }
}
