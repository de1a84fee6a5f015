use super::markup::{first_paragraph, remove_blocks, strip_tags, Block};
use crate::util::{collapse_whitespace, truncate_chars};

/// Regions cut from the body before looking for the summary paragraph.
const SUMMARY_STRIP_ORDER: &[Block] = &[Block::Figure, Block::Iframe, Block::Pre, Block::Heading];

/// Regions cut from the body before rendering plain text.
const CONTENT_STRIP_ORDER: &[Block] = &[Block::Figure, Block::Iframe];

/// Strips tags, collapses whitespace and trims.
fn to_text(html: &str) -> String {
    collapse_whitespace(&strip_tags(html)).into_owned()
}

/// Extracts a bounded summary from the first paragraph of a post body.
///
/// The first figure, iframe, `<pre>` and heading block are removed (in that
/// order, one of each) before the first `<p>` is located. The paragraph's
/// text is truncated to `max_chars` characters with `...` appended when
/// longer.
///
/// Returns an empty string when the body has no paragraph (or only empty
/// ones); the caller then falls back to [`fallback_description`].
///
/// # Examples
///
/// ```
/// use blogwire::extract::extract_summary;
///
/// let body = "<h1>Title</h1><p>First   <em>real</em> paragraph.</p><p>Second.</p>";
/// assert_eq!(extract_summary(body, 200), "First real paragraph.");
/// assert_eq!(extract_summary("<div>no paragraphs</div>", 200), "");
/// ```
pub fn extract_summary(body: &str, max_chars: usize) -> String {
    let cleaned = remove_blocks(body, SUMMARY_STRIP_ORDER);
    let Some(paragraph) = first_paragraph(&cleaned) else {
        return String::new();
    };
    let text = to_text(paragraph);
    truncate_chars(&text, max_chars).into_owned()
}

/// Derives a summary from the feed's own `description` field.
///
/// Tags are stripped, whitespace collapsed, and the result truncated to
/// `max_chars` characters with `...` appended when longer.
pub fn fallback_description(description: &str, max_chars: usize) -> String {
    let text = to_text(description);
    truncate_chars(&text, max_chars).into_owned()
}

/// Renders a post body as plain text.
///
/// The first figure and the first iframe are removed; every other tag is
/// stripped and whitespace collapsed. Unlike the summary, the result is not
/// length-bounded.
pub fn to_plain_text(body: &str) -> String {
    to_text(&remove_blocks(body, CONTENT_STRIP_ORDER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_skips_leading_regions() {
        let body = r#"
            <figure><img src="hero.jpg"><figcaption><p>Caption para</p></figcaption></figure>
            <iframe src="https://video.example.com"><p>Fallback para</p></iframe>
            <pre><p>code para</p></pre>
            <h2><p>heading para</p></h2>
            <p>The   actual
               summary.</p>"#;
        assert_eq!(extract_summary(body, 200), "The actual summary.");
    }

    #[test]
    fn test_summary_second_figure_is_not_removed() {
        // Only the first figure is stripped; a paragraph inside the second one wins
        let body = "<figure>one</figure><figure><p>inside second</p></figure><p>outside</p>";
        assert_eq!(extract_summary(body, 200), "inside second");
    }

    #[test]
    fn test_summary_truncates_to_max_chars() {
        let body = format!("<p>{}</p>", "x".repeat(250));
        let summary = extract_summary(&body, 200);
        assert_eq!(summary.len(), 203);
        assert_eq!(&summary[..200], "x".repeat(200));
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_summary_exactly_max_chars_not_truncated() {
        let body = format!("<p>{}</p>", "y".repeat(200));
        assert_eq!(extract_summary(&body, 200), "y".repeat(200));
    }

    #[test]
    fn test_summary_keeps_comparison_operators() {
        assert_eq!(
            extract_summary("<p>if x < 5 and y > 3 then go</p>", 200),
            "if x < 5 and y > 3 then go"
        );
    }

    #[test]
    fn test_summary_without_paragraph_is_empty() {
        assert_eq!(extract_summary("<div>Just a div</div>", 200), "");
        assert_eq!(extract_summary("", 200), "");
    }

    #[test]
    fn test_summary_decodes_entities() {
        assert_eq!(
            extract_summary("<p>Fish &amp; chips&hellip;</p>", 200),
            "Fish & chips\u{2026}"
        );
    }

    #[test]
    fn test_fallback_description_strips_and_truncates() {
        let description = format!("<b>Bold</b> {}", "z".repeat(300));
        let result = fallback_description(&description, 200);
        assert_eq!(result.chars().count(), 203);
        assert!(result.starts_with("Bold zzz"));
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_fallback_description_short_text_untouched() {
        assert_eq!(fallback_description("A <i>short</i> blurb", 200), "A short blurb");
    }

    #[test]
    fn test_plain_text_removes_first_figure_and_iframe() {
        let body = r#"<figure><img src="a.jpg"><figcaption>Cap</figcaption></figure>
            <h1>Heading</h1><p>Para one.</p><iframe src="x">embed</iframe><p>Para two.</p>"#;
        assert_eq!(to_plain_text(body), "Heading Para one. Para two.");
    }

    #[test]
    fn test_plain_text_keeps_code_blocks() {
        let body = "<p>Run:</p><pre><code>cargo   build</code></pre>";
        assert_eq!(to_plain_text(body), "Run: cargo build");
    }
}
