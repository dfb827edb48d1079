//! Title and body filters applied before a record is created.

use std::sync::LazyLock;

use regex::Regex;

/// Script and style blocks, content included.
static BLOCK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("Invalid block regex")
});

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("Invalid tag regex"));

/// Transforms the flattened title or body text of a record.
pub trait TextFilter {
    fn apply(&self, text: String) -> String;
}

impl<F> TextFilter for F
where
    F: Fn(String) -> String,
{
    fn apply(&self, text: String) -> String {
        self(text)
    }
}

/// Removes script and style blocks and every remaining tag, then trims.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripMarkup;

impl TextFilter for StripMarkup {
    fn apply(&self, text: String) -> String {
        let without_blocks = BLOCK_REGEX.replace_all(&text, "");
        TAG_REGEX.replace_all(&without_blocks, "").trim().to_string()
    }
}

/// Leaves text unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl TextFilter for PassThrough {
    fn apply(&self, text: String) -> String {
        text
    }
}
