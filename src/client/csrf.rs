use scraper::{Html, Selector};
use tracing::{debug, warn};

/// Header the token is echoed in when the page does not name one
pub const DEFAULT_CSRF_HEADER: &str = "X-CSRF-TOKEN";

/// Anti-forgery token discovered on a page, and the header it is sent back in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken {
    pub header: String,
    pub token: String,
}

/// Looks for the page's CSRF token: `meta[name="_csrf"]` first, then a hidden
/// `input[name="_csrf"]`. The header name comes from `meta[name="_csrf_header"]`.
pub fn find_csrf_token(html: &str) -> Option<CsrfToken> {
    let document = Html::parse_document(html);

    let token = match select_attr(&document, r#"meta[name="_csrf"]"#, "content") {
        Some(token) => {
            debug!("CSRF token loaded from meta tag");
            Some(token)
        }
        None => select_attr(&document, r#"input[name="_csrf"]"#, "value").map(|token| {
            debug!("CSRF token loaded from input");
            token
        }),
    };

    let Some(token) = token.filter(|token| !token.is_empty()) else {
        warn!("CSRF token not found");
        return None;
    };

    let header = select_attr(&document, r#"meta[name="_csrf_header"]"#, "content")
        .filter(|header| !header.is_empty())
        .unwrap_or_else(|| DEFAULT_CSRF_HEADER.to_owned());

    debug!(prefix = %token.chars().take(10).collect::<String>(), "CSRF token");
    Some(CsrfToken { header, token })
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(str::to_owned)
}
