//! Low-level regex helpers over untrusted HTML fragments.
//!
//! Feed bodies are arbitrary, frequently malformed HTML, so nothing here builds
//! a DOM. Every helper works on the first match only and never recurses:
//! removing a block removes the first occurrence and leaves later ones intact.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

macro_rules! cached_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect("hard-coded pattern compiles"))
        }
    };
}

cached_regex!(figure_re, r"(?is)<figure\b[^>]*>.*?</figure\s*>");
cached_regex!(iframe_re, r"(?is)<iframe\b[^>]*>.*?</iframe\s*>");
cached_regex!(pre_re, r"(?is)<pre\b[^>]*>.*?</pre\s*>");
cached_regex!(heading_re, r"(?is)<h[1-6]\b[^>]*>.*?</h[1-6]\s*>");
cached_regex!(paragraph_re, r"(?is)<p\b[^>]*>(.*?)</p\s*>");
cached_regex!(
    img_src_re,
    r#"(?is)<img\b[^>]*?\ssrc\s*=\s*(?:"([^"]+)"|'([^']+)'|([^\s"'>]+))"#
);
// A tag opens with a name, `/name`, `!` (comments, doctypes) or `?`; a bare `<` is text
cached_regex!(tag_re, r"(?s)<(?:/?([a-zA-Z][a-zA-Z0-9]*)|[!?])[^>]*>");
cached_regex!(entity_re, r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});");

/// Block-level regions that can be cut out of a body before extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    /// `<figure>...</figure>` media blocks
    Figure,
    /// `<iframe>...</iframe>` embeds
    Iframe,
    /// `<pre>...</pre>` preformatted/code blocks
    Pre,
    /// `<h1>` through `<h6>`
    Heading,
}

impl Block {
    fn regex(self) -> &'static Regex {
        match self {
            Block::Figure => figure_re(),
            Block::Iframe => iframe_re(),
            Block::Pre => pre_re(),
            Block::Heading => heading_re(),
        }
    }
}

/// Removes the first occurrence of `block` from `html`.
///
/// Returns `Cow::Borrowed` when the block does not occur.
pub fn remove_first(html: &str, block: Block) -> Cow<'_, str> {
    block.regex().replace(html, "")
}

/// Removes the first occurrence of each block, in the order given.
pub fn remove_blocks(html: &str, blocks: &[Block]) -> String {
    let mut out = html.to_string();
    for &block in blocks {
        let next = match remove_first(&out, block) {
            Cow::Borrowed(_) => continue,
            Cow::Owned(s) => s,
        };
        out = next;
    }
    out
}

/// Returns the first `<figure>` block, tags included.
pub fn first_figure(html: &str) -> Option<&str> {
    figure_re().find(html).map(|m| m.as_str())
}

/// Returns the inner HTML of the first `<p>` block.
pub fn first_paragraph(html: &str) -> Option<&str> {
    paragraph_re()
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Returns the `src` of the first `<img>` with a non-empty source.
pub fn first_image_src(html: &str) -> Option<&str> {
    let caps = img_src_re().captures(html)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().trim())
        .filter(|src| !src.is_empty())
}

/// Tags that separate words when removed. Inline tags (`<em>`, `<a>`, ...)
/// are removed without inserting a space so `Hel<em>lo</em>` stays one word.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "iframe", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Strips every tag from `html` and decodes common character references.
///
/// Whitespace is not normalized here; callers pair this with
/// [`collapse_whitespace`](crate::util::collapse_whitespace).
pub fn strip_tags(html: &str) -> String {
    let text = tag_re().replace_all(html, |caps: &Captures<'_>| {
        let is_block = caps
            .get(1)
            .map(|name| {
                let name = name.as_str().to_ascii_lowercase();
                BLOCK_TAGS.contains(&name.as_str())
            })
            .unwrap_or(false);
        if is_block {
            " "
        } else {
            ""
        }
    });
    decode_entities(&text).into_owned()
}

/// Decodes the HTML character references feeds commonly leave in bodies.
///
/// Unknown named references are left untouched.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    entity_re().replace_all(text, |caps: &Captures<'_>| {
        let raw = &caps[0];
        let name = &caps[1];
        if let Some(num) = name.strip_prefix('#') {
            let code = match num.strip_prefix(&['x', 'X'][..]) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse::<u32>().ok(),
            };
            return code
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| raw.to_string());
        }
        named_entity(name).unwrap_or(raw).to_string()
    })
}

/// Replacement text for the named HTML references feeds commonly use.
///
/// Covers the XML five plus typographic entities that are invalid in XML
/// but show up in RSS text anyway.
pub fn named_entity(name: &str) -> Option<&'static str> {
    let decoded = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "hellip" => "\u{2026}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "copy" => "\u{a9}",
        _ => return None,
    };
    Some(decoded)
}
