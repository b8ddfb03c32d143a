use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attribute marking nodes that belong to the picker's own UI.
///
/// Anything carrying it (or living under something carrying it) is transparent
/// to hit-testing.
pub const PICKER_UI_ATTR: &str = "data-region-picker";

/// Represents a rendered element in the document model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// Lowercase tag name (e.g., "div", "li", "main")
    pub tag_name: String,

    /// Element attributes (e.g., id, class, role)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Text owned directly by this element (not by its children)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Border box in viewport coordinates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    /// Computed `overflow-x`
    #[serde(default)]
    pub overflow_x: Overflow,

    /// Computed `overflow-y`
    #[serde(default)]
    pub overflow_y: Overflow,

    /// Scroll position and extents of the element's scrolling box
    #[serde(default)]
    pub scroll: ScrollMetrics,

    /// Stacking order; higher paints on top
    #[serde(default)]
    pub z_index: i32,
}

/// Bounding box coordinates for an element
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Computed overflow style on one axis
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Clip,
    Scroll,
    Auto,
}

impl Overflow {
    /// Parse a CSS `overflow-*` value; unknown values behave like `visible`
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "hidden" => Self::Hidden,
            "clip" => Self::Clip,
            "scroll" => Self::Scroll,
            "auto" | "overlay" => Self::Auto,
            _ => Self::Visible,
        }
    }

    /// Whether the style lets the user scroll on this axis
    pub fn allows_scrolling(self) -> bool {
        matches!(self, Self::Scroll | Self::Auto)
    }
}

/// Scroll state of an element's scrolling box, in CSS pixels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScrollMetrics {
    #[serde(default)]
    pub scroll_top: f64,
    #[serde(default)]
    pub scroll_left: f64,
    #[serde(default)]
    pub scroll_height: f64,
    #[serde(default)]
    pub scroll_width: f64,
    #[serde(default)]
    pub client_height: f64,
    #[serde(default)]
    pub client_width: f64,
}

impl ScrollMetrics {
    /// Largest reachable `scroll_top`
    pub fn max_scroll_top(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    /// Whether the viewport bottom sits within `tolerance` pixels of the content end
    pub fn at_bottom(&self, tolerance: f64) -> bool {
        self.scroll_top + self.client_height >= self.scroll_height - tolerance
    }
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into().to_ascii_lowercase(),
            attributes: HashMap::new(),
            text_content: None,
            bounding_box: None,
            overflow_x: Overflow::Visible,
            overflow_y: Overflow::Visible,
            scroll: ScrollMetrics::default(),
            z_index: 0,
        }
    }

    /// Builder method: set attributes
    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builder method: add one attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set bounding box
    pub fn with_bounding_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bounding_box = Some(BoundingBox { x, y, width, height });
        self
    }

    /// Builder method: set overflow on both axes
    pub fn with_overflow(mut self, overflow: Overflow) -> Self {
        self.overflow_x = overflow;
        self.overflow_y = overflow;
        self
    }

    /// Builder method: set scroll metrics
    pub fn with_scroll(mut self, scroll: ScrollMetrics) -> Self {
        self.scroll = scroll;
        self
    }

    /// Builder method: set stacking order
    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().any(|c| c == class_name)
    }

    /// Whitespace-separated class tokens, in source order
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace())
            .into_iter()
            .flatten()
    }

    /// First class token, if the element has any class at all
    pub fn first_class(&self) -> Option<&str> {
        self.classes().next()
    }

    /// Get element ID
    pub fn id(&self) -> Option<&String> {
        self.attributes.get("id").filter(|id| !id.is_empty())
    }

    /// ARIA role attribute
    pub fn role(&self) -> Option<&str> {
        self.attributes.get("role").map(String::as_str)
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Whether this element is part of the picker's own chrome
    pub fn is_picker_ui(&self) -> bool {
        self.attributes.contains_key(PICKER_UI_ATTR)
    }

    /// Block-level elements break rendered text onto a new line
    pub fn is_block(&self) -> bool {
        matches!(
            self.tag_name.as_str(),
            "address"
                | "article"
                | "aside"
                | "blockquote"
                | "br"
                | "dd"
                | "div"
                | "dl"
                | "dt"
                | "figcaption"
                | "figure"
                | "footer"
                | "form"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "header"
                | "hr"
                | "li"
                | "main"
                | "nav"
                | "ol"
                | "p"
                | "pre"
                | "section"
                | "table"
                | "tr"
                | "ul"
        )
    }
}

impl BoundingBox {
    /// Create a new BoundingBox
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Check if the bounding box is visible (has non-zero dimensions)
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Calculate the area of the bounding box
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Check if a point lies inside the box (edges inclusive)
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    /// Overlapping region of two boxes, if any
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        (right > left && bottom > top).then(|| BoundingBox::new(left, top, right - left, bottom - top))
    }

    /// Smallest box covering both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        BoundingBox::new(left, top, right - left, bottom - top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node_creation() {
        let mut attrs = HashMap::new();
        attrs.insert("id".to_string(), "feed".to_string());
        attrs.insert("class".to_string(), "list dense".to_string());

        let element = ElementNode::new("UL")
            .with_attributes(attrs)
            .with_text("Items")
            .with_bounding_box(0.0, 0.0, 300.0, 600.0)
            .with_overflow(Overflow::Auto)
            .with_z_index(3);

        assert_eq!(element.tag_name, "ul");
        assert_eq!(element.id(), Some(&"feed".to_string()));
        assert_eq!(element.text_content, Some("Items".to_string()));
        assert_eq!(element.overflow_y, Overflow::Auto);
        assert_eq!(element.z_index, 3);
    }

    #[test]
    fn test_classes() {
        let element = ElementNode::new("div").with_attribute("class", "  card  p-4 shadow ");

        assert!(element.has_class("card"));
        assert!(element.has_class("shadow"));
        assert!(!element.has_class("hidden"));
        assert_eq!(element.first_class(), Some("card"));

        let bare = ElementNode::new("div");
        assert_eq!(bare.first_class(), None);
        assert_eq!(bare.classes().count(), 0);
    }

    #[test]
    fn test_empty_id_is_ignored() {
        let element = ElementNode::new("div").with_attribute("id", "");
        assert!(element.id().is_none());
    }

    #[test]
    fn test_picker_ui_marker() {
        let overlay = ElementNode::new("div").with_attribute(PICKER_UI_ATTR, "overlay");
        assert!(overlay.is_picker_ui());
        assert!(!ElementNode::new("div").is_picker_ui());
    }

    #[test]
    fn test_overflow_parse() {
        assert_eq!(Overflow::parse("auto"), Overflow::Auto);
        assert_eq!(Overflow::parse("overlay"), Overflow::Auto);
        assert_eq!(Overflow::parse(" scroll "), Overflow::Scroll);
        assert_eq!(Overflow::parse("hidden"), Overflow::Hidden);
        assert_eq!(Overflow::parse("inherit"), Overflow::Visible);
        assert!(Overflow::Scroll.allows_scrolling());
        assert!(!Overflow::Hidden.allows_scrolling());
    }

    #[test]
    fn test_scroll_metrics() {
        let metrics = ScrollMetrics {
            scroll_top: 895.0,
            scroll_height: 1500.0,
            client_height: 600.0,
            ..Default::default()
        };
        assert_eq!(metrics.max_scroll_top(), 900.0);
        assert!(metrics.at_bottom(10.0));
        assert!(!metrics.at_bottom(2.0));
    }

    #[test]
    fn test_serialization() {
        let element = ElementNode::new("section")
            .with_text("Body")
            .with_bounding_box(1.0, 2.0, 3.0, 4.0)
            .with_overflow(Overflow::Scroll);

        let json = serde_json::to_string(&element).unwrap();
        let deserialized: ElementNode = serde_json::from_str(&json).unwrap();

        assert_eq!(element, deserialized);
    }

    #[test]
    fn test_bounding_box() {
        let bbox = BoundingBox::new(10.0, 20.0, 100.0, 50.0);

        assert!(bbox.is_visible());
        assert_eq!(bbox.area(), 5000.0);
        assert!(bbox.contains(10.0, 20.0));
        assert!(bbox.contains(110.0, 70.0));
        assert!(!bbox.contains(111.0, 70.0));

        let invisible_bbox = BoundingBox::new(0.0, 0.0, 0.0, 0.0);
        assert!(!invisible_bbox.is_visible());
    }

    #[test]
    fn test_intersection_and_union() {
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BoundingBox::new(50.0, 50.0, 100.0, 100.0);

        assert_eq!(a.intersection(&b), Some(BoundingBox::new(50.0, 50.0, 50.0, 50.0)));
        assert_eq!(a.union(&b), BoundingBox::new(0.0, 0.0, 150.0, 150.0));

        let far = BoundingBox::new(500.0, 500.0, 10.0, 10.0);
        assert!(a.intersection(&far).is_none());
    }
}
