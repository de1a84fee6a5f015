use crate::extract::markup::{decode_entities, named_entity};
use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;
use std::borrow::Cow;
use thiserror::Error;

/// SEC-003: Maximum element nesting depth accepted in a feed document.
const MAX_FEED_DEPTH: usize = 64;

/// Errors raised for malformed feed documents.
///
/// Only top-level structural problems are errors. Items with missing fields
/// are returned with those fields empty.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(String),

    /// The document has an Atom root but could not be read as Atom.
    #[error("Atom parse error: {0}")]
    Atom(String),

    /// SEC-003: Element nesting exceeds the safety limit.
    #[error("Feed nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),
}

/// One feed item with its fields as the feed wrote them.
///
/// Missing fields are empty strings or an empty list, never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawItem {
    pub title: String,
    pub link: String,
    /// Publication date exactly as written in the feed.
    pub pub_date: String,
    /// Short description; frequently HTML.
    pub description: String,
    pub author: String,
    pub categories: Vec<String>,
    /// Full HTML body (`content:encoded`, falling back to `description`).
    pub content: String,
    pub guid: String,
}

/// Parses a raw feed document into items.
///
/// RSS 2.0 and RSS 1.0 (RDF) documents are read with a streaming XML reader
/// so every field is kept verbatim. Documents with an Atom `<feed>` root are
/// handed to `feed-rs`.
///
/// A well-formed document without an item collection (an empty channel, an
/// HTML page, an empty body) yields an empty `Vec`.
///
/// # Errors
///
/// - [`ParseError::Xml`] - the document is not well-formed XML
/// - [`ParseError::Atom`] - an Atom document `feed-rs` rejects
/// - [`ParseError::MaxDepthExceeded`] - pathologically nested input
///
/// # Security
///
/// quick-xml (0.37) never expands `<!ENTITY>` declarations, so XXE payloads
/// either fail to unescape or stay literal.
pub fn parse(raw: &[u8]) -> Result<Vec<RawItem>, ParseError> {
    match root_element(raw)? {
        Some(root) if root == b"feed" => parse_atom(raw),
        Some(_) => parse_rss(raw),
        None => Ok(Vec::new()),
    }
}

/// Local name of the document's root element, if there is one.
fn root_element(raw: &[u8]) -> Result<Option<Vec<u8>>, ParseError> {
    let mut reader = Reader::from_reader(raw);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(Some(e.local_name().as_ref().to_vec()));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
}

/// Item child elements we keep. Anything else inside an item is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    PubDate,
    DcDate,
    Description,
    Author,
    DcCreator,
    Category,
    Content,
    Guid,
}

impl Field {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"pubDate" => Some(Field::PubDate),
            b"dc:date" => Some(Field::DcDate),
            b"description" => Some(Field::Description),
            b"author" => Some(Field::Author),
            b"dc:creator" => Some(Field::DcCreator),
            b"category" => Some(Field::Category),
            b"content:encoded" => Some(Field::Content),
            b"guid" => Some(Field::Guid),
            _ => None,
        }
    }
}

impl RawItem {
    fn set(&mut self, field: Field, text: String) {
        let value = text.trim().to_string();
        match field {
            Field::Title => self.title = value,
            Field::Link => self.link = value,
            Field::PubDate => self.pub_date = value,
            // RSS 1.0 date only when no pubDate was given
            Field::DcDate if self.pub_date.is_empty() => self.pub_date = value,
            Field::DcDate => {}
            Field::Description => self.description = value,
            Field::Author => self.author = value,
            Field::DcCreator if self.author.is_empty() => self.author = value,
            Field::DcCreator => {}
            Field::Category if !value.is_empty() => self.categories.push(value),
            Field::Category => {}
            Field::Content => self.content = text,
            Field::Guid => self.guid = value,
        }
    }

    fn finish(mut self) -> Self {
        if self.content.trim().is_empty() {
            self.content = self.description.clone();
        }
        self
    }
}

/// Unescapes element text, accepting the HTML named references that feeds
/// use even though XML does not define them (`&nbsp;`, `&hellip;`).
///
/// A reference neither XML nor [`named_entity`] knows makes quick-xml give
/// up on the whole text; the known references are then decoded by hand and
/// the unknown one stays literal.
fn unescape_text<'a>(text: &'a BytesText<'a>) -> Cow<'a, str> {
    match text.unescape_with(named_entity) {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(error = %e, "Unknown entity in feed text, decoding leniently");
            let raw = String::from_utf8_lossy(text);
            Cow::Owned(decode_entities(&raw).into_owned())
        }
    }
}

fn parse_rss(raw: &[u8]) -> Result<Vec<RawItem>, ParseError> {
    let mut reader = Reader::from_reader(raw);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut buf = Vec::new();
    let mut depth: usize = 0;
    // Open item and the depth of its <item> element
    let mut item: Option<(usize, RawItem)> = None;
    // Field currently being read and the text collected so far
    let mut field: Option<(Field, String)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth > MAX_FEED_DEPTH {
                    return Err(ParseError::MaxDepthExceeded(MAX_FEED_DEPTH));
                }

                match item.as_ref().map(|(d, _)| *d) {
                    None if e.local_name().as_ref() == b"item" => {
                        item = Some((depth, RawItem::default()));
                    }
                    Some(item_depth) if depth == item_depth + 1 => {
                        field = Field::from_name(e.name().as_ref()).map(|f| (f, String::new()));
                    }
                    _ => {}
                }
            }
            Ok(Event::End(_)) => {
                match item.as_ref().map(|(d, _)| *d) {
                    Some(item_depth) if depth == item_depth + 1 => {
                        if let (Some((_, current)), Some((f, text))) = (item.as_mut(), field.take())
                        {
                            current.set(f, text);
                        }
                    }
                    Some(item_depth) if depth == item_depth => {
                        if let Some((_, done)) = item.take() {
                            items.push(done.finish());
                        }
                    }
                    _ => {}
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(t)) => {
                if let Some((_, text)) = field.as_mut() {
                    text.push_str(&unescape_text(&t));
                }
            }
            Ok(Event::CData(c)) => {
                if let Some((_, text)) = field.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(items)
}

fn parse_atom(raw: &[u8]) -> Result<Vec<RawItem>, ParseError> {
    let feed = feed_rs::parser::parse(raw).map_err(|e| ParseError::Atom(e.to_string()))?;

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let description = entry.summary.map(|s| s.content).unwrap_or_default();
            let content = entry.content.and_then(|c| c.body).unwrap_or_default();
            RawItem {
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                link: entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default(),
                pub_date: entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_default(),
                author: entry
                    .authors
                    .first()
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                categories: entry
                    .categories
                    .into_iter()
                    .map(|c| c.term)
                    .filter(|t| !t.trim().is_empty())
                    .collect(),
                guid: entry.id,
                description,
                content,
            }
            .finish()
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/"
     xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:atom="http://www.w3.org/2005/Atom">
<channel>
    <title>Example Blog</title>
    <link>https://blog.example.com</link>
    <atom:link href="https://blog.example.com/rss.xml" rel="self"/>
    <item>
        <title>First &amp; Foremost</title>
        <link>https://blog.example.com/first</link>
        <pubDate>Mon, 02 Jun 2025 09:30:00 +0000</pubDate>
        <description>&lt;p&gt;Short &lt;b&gt;intro&lt;/b&gt;&lt;/p&gt;</description>
        <dc:creator>Jane Doe</dc:creator>
        <category>rust</category>
        <category><![CDATA[web]]></category>
        <content:encoded><![CDATA[<figure><img src="a.png"></figure><p>Body</p>]]></content:encoded>
        <guid isPermaLink="false">post-1</guid>
    </item>
    <item>
        <title>Bare</title>
    </item>
</channel>
</rss>"#;

    #[test]
    fn test_parse_rss_fields() {
        let items = parse(RSS.as_bytes()).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.title, "First & Foremost");
        assert_eq!(first.link, "https://blog.example.com/first");
        assert_eq!(first.pub_date, "Mon, 02 Jun 2025 09:30:00 +0000");
        assert_eq!(first.description, "<p>Short <b>intro</b></p>");
        assert_eq!(first.author, "Jane Doe");
        assert_eq!(first.categories, vec!["rust".to_string(), "web".to_string()]);
        assert_eq!(first.content, r#"<figure><img src="a.png"></figure><p>Body</p>"#);
        assert_eq!(first.guid, "post-1");
    }

    #[test]
    fn test_missing_fields_default_empty() {
        let items = parse(RSS.as_bytes()).unwrap();
        assert_eq!(
            items[1],
            RawItem {
                title: "Bare".to_string(),
                ..RawItem::default()
            }
        );
    }

    #[test]
    fn test_content_falls_back_to_description() {
        let rss = r#"<rss><channel><item>
            <description><![CDATA[<p>Only a description</p>]]></description>
        </item></channel></rss>"#;
        let items = parse(rss.as_bytes()).unwrap();
        assert_eq!(items[0].content, "<p>Only a description</p>");
    }

    #[test]
    fn test_author_beats_dc_creator() {
        let rss = r#"<rss><channel><item>
            <dc:creator>Creator</dc:creator>
            <author>jane@example.com (Jane)</author>
        </item></channel></rss>"#;
        let items = parse(rss.as_bytes()).unwrap();
        assert_eq!(items[0].author, "jane@example.com (Jane)");
    }

    #[test]
    fn test_nested_elements_in_item_ignored() {
        let rss = r#"<rss xmlns:media="http://search.yahoo.com/mrss/"><channel><item>
            <media:group><title>not the title</title></media:group>
            <title>Real title</title>
            <enclosure url="https://cdn.example.com/a.mp3" type="audio/mpeg"/>
        </item></channel></rss>"#;
        let items = parse(rss.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Real title");
    }

    #[test]
    fn test_rss1_rdf_items() {
        let rdf = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns="http://purl.org/rss/1.0/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel rdf:about="https://example.com/"><title>RDF</title></channel>
  <item rdf:about="https://example.com/a">
    <title>RDF item</title>
    <link>https://example.com/a</link>
    <dc:date>2025-06-02T07:30:00Z</dc:date>
  </item>
</rdf:RDF>"#;
        let items = parse(rdf.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].pub_date, "2025-06-02T07:30:00Z");
    }

    #[test]
    fn test_atom_feed() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Blog</title>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <updated>2025-06-02T07:30:00Z</updated>
  <entry>
    <title>Atom entry</title>
    <link href="https://atom.example.com/entry"/>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2025-06-02T07:30:00Z</updated>
    <author><name>Ann</name></author>
    <category term="rust"/>
    <summary>Summary text</summary>
    <content type="html">&lt;p&gt;Atom body&lt;/p&gt;</content>
  </entry>
</feed>"#;
        let items = parse(atom.as_bytes()).unwrap();
        assert_eq!(items.len(), 1);
        let entry = &items[0];
        assert_eq!(entry.title, "Atom entry");
        assert_eq!(entry.link, "https://atom.example.com/entry");
        assert_eq!(entry.guid, "urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a");
        assert_eq!(entry.author, "Ann");
        assert_eq!(entry.categories, vec!["rust".to_string()]);
        assert_eq!(entry.description, "Summary text");
        assert!(entry.content.contains("Atom body"));
        assert!(entry.pub_date.starts_with("2025-06-02T07:30:00"));
    }

    #[test]
    fn test_empty_channel_is_empty() {
        let empty = r#"<?xml version="1.0"?><rss version="2.0"><channel></channel></rss>"#;
        assert!(parse(empty.as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_no_item_collection_is_empty() {
        assert!(parse(b"<html><body><p>Not a feed</p></body></html>")
            .unwrap()
            .is_empty());
        assert!(parse(b"").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_xml_error() {
        let result = parse(b"<rss><channel><item></channel></rss>");
        assert!(matches!(result, Err(ParseError::Xml(_))));
        assert!(parse(b"<not valid xml").is_err());
    }

    #[test]
    fn test_deeply_nested_rejected() {
        let mut doc = String::from("<rss>");
        for _ in 0..MAX_FEED_DEPTH + 1 {
            doc.push_str("<x>");
        }
        for _ in 0..MAX_FEED_DEPTH + 1 {
            doc.push_str("</x>");
        }
        doc.push_str("</rss>");
        assert!(matches!(
            parse(doc.as_bytes()),
            Err(ParseError::MaxDepthExceeded(_))
        ));
    }

    #[test]
    fn test_xxe_entity_not_expanded() {
        let malicious = r#"<?xml version="1.0"?>
<!DOCTYPE rss [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>
<rss><channel><item><title>&xxe;</title></item></channel></rss>"#;
        match parse(malicious.as_bytes()) {
            Ok(items) => {
                for item in &items {
                    assert!(!item.title.contains("root:"), "XXE expansion detected");
                }
            }
            Err(_) => {
                // Rejection is also acceptable
            }
        }
    }

    #[test]
    fn test_html_entities_in_escaped_description() {
        let xml = r#"<rss version="2.0"><channel><item>
            <title>Caf&eacute; &amp; more</title>
            <description>&lt;p&gt;Hello&nbsp;world&lt;/p&gt;</description>
        </item></channel></rss>"#;
        let items = parse(xml.as_bytes()).unwrap();
        assert_eq!(items[0].description, "<p>Hello world</p>");
        assert_eq!(items[0].content, "<p>Hello world</p>");
        // Unknown references stay literal, known ones are still decoded
        assert_eq!(items[0].title, "Caf&eacute; & more");
    }

    #[test]
    fn test_unknown_entity_does_not_block_markup_unescape() {
        let xml = r#"<rss><channel><item>
            <description>&lt;p&gt;Fish &amp;amp; chips&trade;&lt;/p&gt;</description>
        </item></channel></rss>"#;
        let items = parse(xml.as_bytes()).unwrap();
        assert_eq!(items[0].description, "<p>Fish &amp; chips&trade;</p>");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let first = parse(RSS.as_bytes()).unwrap();
        let second = parse(RSS.as_bytes()).unwrap();
        assert_eq!(first, second);
    }
}
