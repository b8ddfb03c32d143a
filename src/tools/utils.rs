use crate::browser::BrowserSession;
use crate::dom::{DomTree, NodeId, structural_selector};
use crate::error::Result;
use crate::geometry::ScrollTarget;

const PASSTHROUGH_SCHEMES: &[&str] =
    &["http://", "https://", "file://", "data:", "about:", "chrome://", "chrome-extension://"];

/// Turn a loosely typed address into something the browser can load.
///
/// Known schemes and relative paths are kept, local hosts get `http://`,
/// anything with a dot gets `https://`, and a bare word becomes `https://www.<word>.com`.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();

    let keep = PASSTHROUGH_SCHEMES.iter().any(|s| url.starts_with(s))
        || ["/", "./", "../"].iter().any(|p| url.starts_with(p));
    if keep {
        url.to_string()
    } else if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
        format!("http://{}", url)
    } else if url.contains('.') {
        format!("https://{}", url)
    } else {
        format!("https://www.{}.com", url)
    }
}

/// Navigate first when the caller named a page; otherwise work on the current one
pub fn open_if_requested(session: &BrowserSession, url: Option<&str>) -> Result<Option<String>> {
    let Some(url) = url else { return Ok(None) };
    let normalized = normalize_url(url);
    session.navigate(&normalized)?;
    session.wait_for_navigation()?;
    log::info!("Opened {}", normalized);
    Ok(Some(normalized))
}

/// Selector the live page can use to address a scroll target; `None` for the document
pub fn target_selector(tree: &DomTree, target: ScrollTarget) -> Option<String> {
    match target {
        ScrollTarget::Document => None,
        ScrollTarget::Node(node) => selector_or_root(tree, node),
    }
}

fn selector_or_root(tree: &DomTree, node: NodeId) -> Option<String> {
    if node == tree.root() { None } else { structural_selector(tree, node) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;

    #[test]
    fn test_normalize_url_keeps_schemes_and_paths() {
        assert_eq!(normalize_url("https://example.com/a"), "https://example.com/a");
        assert_eq!(normalize_url("about:blank"), "about:blank");
        assert_eq!(normalize_url("data:text/html,<p>x</p>"), "data:text/html,<p>x</p>");
        assert_eq!(normalize_url("../up"), "../up");
    }

    #[test]
    fn test_normalize_url_fills_in_scheme() {
        assert_eq!(normalize_url("  news.example.org  "), "https://news.example.org");
        assert_eq!(normalize_url("localhost:8080"), "http://localhost:8080");
        assert_eq!(normalize_url("127.0.0.1"), "http://127.0.0.1");
        assert_eq!(normalize_url("wikipedia"), "https://www.wikipedia.com");
    }

    #[test]
    fn test_target_selector() {
        let mut tree = DomTree::new(800.0, 600.0);
        let body = tree.body();
        let feed = tree.append(body, ElementNode::new("div").with_attribute("id", "feed")).unwrap();

        assert_eq!(target_selector(&tree, ScrollTarget::Document), None);
        assert_eq!(target_selector(&tree, ScrollTarget::Node(feed)).as_deref(), Some("#feed"));
        assert_eq!(target_selector(&tree, ScrollTarget::Node(tree.root())), None);
    }
}
