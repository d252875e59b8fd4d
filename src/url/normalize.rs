use crate::{UrlError, UrlResult};
use url::{ParseError, Url};

/// Resolves an href found on `base` into a crawlable same-host URL
///
/// # Resolution Rules
///
/// 1. Trim the href; empty hrefs are skipped
/// 2. Absolute hrefs are parsed as-is; relative ones inherit scheme and host
///    from `base` and resolve against its path (RFC 3986)
/// 3. Hrefs that fail to parse are skipped
/// 4. Only `http` and `https` results are kept (drops `mailto:`, `javascript:`, ...)
/// 5. Links whose host or port differs from `base` are dropped
/// 6. The fragment is removed; an empty path becomes `/`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_index::url::resolve_link;
///
/// let base = Url::parse("http://example.com/x").unwrap();
/// let link = resolve_link("/about", &base).unwrap();
/// assert_eq!(link.as_str(), "http://example.com/about");
///
/// assert!(resolve_link("http://other.com/y", &base).is_none());
/// ```
pub fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let mut resolved = match Url::parse(href) {
        Ok(absolute) => absolute,
        Err(ParseError::RelativeUrlWithoutBase) => base.join(href).ok()?,
        Err(_) => return None,
    };

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    if !same_host(&resolved, base) {
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved)
}

/// Returns true if both URLs point at the same host and explicit port
///
/// Default ports are elided by the `url` crate, so `http://a.com:80/` and
/// `http://a.com/` compare equal.
pub fn same_host(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port() == b.port()
}

/// Parses and validates a seed URL before it enters the frontier
///
/// Seeds must be absolute `http`/`https` URLs with a host. The fragment is
/// dropped so seeds line up with links discovered during the crawl.
pub fn normalize_seed_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);
    Ok(url)
}
