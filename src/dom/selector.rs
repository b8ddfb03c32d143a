use crate::dom::tree::{DomTree, NodeId};

/// Build a structural CSS selector that locates `node` in the document.
///
/// Walks up from the node, emitting one compound selector per level. An element
/// id anchors the path and stops the walk; otherwise the walk ends at `body`.
/// Segments carry the first class token, and an `:nth-child()` index whenever a
/// sibling shares the tag.
pub fn structural_selector(tree: &DomTree, node: NodeId) -> Option<String> {
    tree.get(node)?;

    if node == tree.root() {
        return Some("html".to_string());
    }

    let mut segments = Vec::new();
    let mut current = node;
    let mut anchored = false;

    while current != tree.body() {
        let element = tree.get(current)?;

        if let Some(id) = element.id() {
            segments.push(format!("#{}", css_escape(id)));
            anchored = true;
            break;
        }

        let mut segment = element.tag_name.clone();
        if let Some(class) = element.first_class() {
            segment.push('.');
            segment.push_str(&css_escape(class));
        }

        let parent = tree.parent(current)?;
        let siblings = tree.children(parent);
        let same_tag = siblings
            .iter()
            .filter(|s| tree.get(**s).is_some_and(|e| e.tag_name == element.tag_name))
            .count();
        if same_tag > 1 {
            if let Some(position) = siblings.iter().position(|s| *s == current) {
                segment.push_str(&format!(":nth-child({})", position + 1));
            }
        }

        segments.push(segment);
        current = parent;

        // Nodes under <head> or directly under <html> never reach <body>
        if current == tree.root() {
            segments.push("html".to_string());
            anchored = true;
            break;
        }
    }

    if !anchored {
        segments.push("body".to_string());
    }

    segments.reverse();
    Some(segments.join(" > "))
}

/// Escape characters that would break an identifier in a selector
fn css_escape(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for (i, ch) in ident.chars().enumerate() {
        let needs_escape = !(ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii())
            || (i == 0 && ch.is_ascii_digit());
        if needs_escape {
            if ch.is_ascii_digit() {
                out.push_str(&format!("\\{:x} ", ch as u32));
            } else {
                out.push('\\');
                out.push(ch);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;

    #[test]
    fn test_selector_with_nth_child_and_class() {
        let mut tree = DomTree::new(800.0, 600.0);
        let body = tree.body();
        let list = tree.append(body, ElementNode::new("ul").with_attribute("class", "feed compact")).unwrap();
        tree.append(list, ElementNode::new("li")).unwrap();
        let second = tree.append(list, ElementNode::new("li").with_attribute("class", "row")).unwrap();

        assert_eq!(
            structural_selector(&tree, second).as_deref(),
            Some("body > ul.feed > li.row:nth-child(2)")
        );
    }

    #[test]
    fn test_selector_stops_at_id() {
        let mut tree = DomTree::new(800.0, 600.0);
        let body = tree.body();
        let app = tree.append(body, ElementNode::new("div").with_attribute("id", "app")).unwrap();
        let panel = tree.append(app, ElementNode::new("section")).unwrap();

        assert_eq!(structural_selector(&tree, panel).as_deref(), Some("#app > section"));
        assert_eq!(structural_selector(&tree, app).as_deref(), Some("#app"));
    }

    #[test]
    fn test_selector_for_roots_and_stale_nodes() {
        let mut tree = DomTree::new(800.0, 600.0);
        let body = tree.body();
        assert_eq!(structural_selector(&tree, tree.root()).as_deref(), Some("html"));
        assert_eq!(structural_selector(&tree, body).as_deref(), Some("body"));

        let gone = tree.append(body, ElementNode::new("div")).unwrap();
        tree.detach(gone);
        assert!(structural_selector(&tree, gone).is_none());
    }

    #[test]
    fn test_css_escape() {
        assert_eq!(css_escape("main-content"), "main-content");
        assert_eq!(css_escape("a:b"), "a\\:b");
        assert_eq!(css_escape("1col"), "\\31 col");
    }
}
