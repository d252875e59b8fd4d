//! HTML content extraction
//!
//! This module turns a fetched HTML page into:
//! - A [`Document`] (title, visible body text, domain, word count)
//! - The set of same-host links to follow
//!
//! Parsing is best effort: html5ever repairs malformed markup, so only a
//! page that cannot be attributed to a host or that is clearly binary is
//! rejected.

use crate::storage::Document;
use crate::url::{extract_domain, resolve_link};
use crate::SumiError;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text is never part of the document content
const SKIPPED_ELEMENTS: [&str; 2] = ["script", "style"];

/// A page split into its document and outgoing links
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub document: Document,

    /// Same-host links, deduplicated, in document order
    pub links: Vec<Url>,
}

/// Parses a page once and extracts both its document and links
///
/// # Errors
///
/// Returns [`SumiError::Parse`] if the page URL has no host or the body
/// contains NUL bytes.
///
/// # Example
///
/// ```
/// use sumi_index::crawler::parse_page;
/// use url::Url;
///
/// let url = Url::parse("http://example.com/x").unwrap();
/// let html = r#"<html><head><title>Test</title></head>
///     <body><p>Hello</p><a href="/about">About</a></body></html>"#;
///
/// let page = parse_page(&url, html).unwrap();
/// assert_eq!(page.document.title, "Test");
/// assert_eq!(page.links[0].as_str(), "http://example.com/about");
/// ```
pub fn parse_page(url: &Url, html: &str) -> Result<ParsedPage, SumiError> {
    let domain = check_page(url, html)?;
    let parsed = Html::parse_document(html);

    Ok(ParsedPage {
        document: build_document(url, domain, &parsed),
        links: collect_links(&parsed, url),
    })
}

/// Extracts the document of a page
pub fn extract_document(url: &Url, html: &str) -> Result<Document, SumiError> {
    let domain = check_page(url, html)?;
    let parsed = Html::parse_document(html);
    Ok(build_document(url, domain, &parsed))
}

/// Extracts the same-host links of a page
///
/// Links are resolved against `base`, normalized with
/// [`resolve_link`](crate::url::resolve_link) and deduplicated on the
/// normalized form, keeping the first occurrence.
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let parsed = Html::parse_document(html);
    collect_links(&parsed, base)
}

fn check_page(url: &Url, html: &str) -> Result<String, SumiError> {
    let domain = extract_domain(url).ok_or_else(|| SumiError::Parse {
        url: url.to_string(),
        message: "page URL has no host".to_string(),
    })?;

    if html.contains('\0') {
        return Err(SumiError::Parse {
            url: url.to_string(),
            message: "body contains binary data".to_string(),
        });
    }

    Ok(domain)
}

fn build_document(url: &Url, domain: String, parsed: &Html) -> Document {
    let content = extract_body_text(parsed);
    let word_count = content.split_whitespace().count() as u32;

    Document {
        url: url.to_string(),
        title: extract_title(parsed),
        content,
        domain,
        word_count,
    }
}

/// Raw text of the first `<title>`, whitespace kept as written
fn extract_title(parsed: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return String::new();
    };

    parsed
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>())
        .unwrap_or_default()
}

/// Visible text of `<body>` with whitespace runs collapsed
fn extract_body_text(parsed: &Html) -> String {
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = parsed.select(&selector).next() else {
        return String::new();
    };

    let mut raw = String::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().filter_map(ElementRef::wrap).any(|element| {
            SKIPPED_ELEMENTS.contains(&element.value().name())
        });
        if !hidden {
            raw.push_str(text);
        }
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_links(parsed: &Html, base: &Url) -> Vec<Url> {
    let Ok(selector) = Selector::parse("a[href], area[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in parsed.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if let Some(link) = resolve_link(href, base) {
            if seen.insert(link.as_str().to_string()) {
                links.push(link);
            }
        }
    }

    links
}
