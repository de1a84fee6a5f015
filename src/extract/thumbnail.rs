use super::markup::{first_figure, first_image_src};

/// Picks a representative image for a post.
///
/// Tried in order, first hit wins:
///
/// 1. the first image inside the body's first `<figure>`
/// 2. the first image anywhere in the body
/// 3. the first image in the feed's `description`
///
/// # Examples
///
/// ```
/// use blogwire::extract::extract_thumbnail;
///
/// let body = r#"<img src="inline.png"><figure><img src="hero.png"></figure>"#;
/// assert_eq!(extract_thumbnail(body, ""), Some("hero.png".to_string()));
/// assert_eq!(extract_thumbnail("<p>text</p>", ""), None);
/// ```
pub fn extract_thumbnail(body: &str, description: &str) -> Option<String> {
    first_figure(body)
        .and_then(first_image_src)
        .or_else(|| first_image_src(body))
        .or_else(|| first_image_src(description))
        .map(str::to_string)
}
