//! Render-tree snapshots taken through the page driver.
//!
//! The read-only checks (font size, aspect ratio) work on a flat snapshot of
//! elements in document order, captured with one evaluation. Parents are
//! referenced by index, so ancestor walks never touch the page again.
//!
//! Snapshots carry computed styles and box metrics but no text: the page
//! only reports how an element's text classifies. Markup of the few
//! elements a check reports is fetched afterwards with [`fetch_markup`].
//!
//! Every script sent to the page starts with a `// probar-mobile:<op>` line.
//! Browsers treat it as a comment; the mock driver uses it to route calls.

use crate::config::DEFAULT_EXCLUDED_TERMS;
use crate::driver::{evaluate_as, PageDriver};
use crate::result::AuditResult;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Marker prefix of every script produced by this crate
pub const SCRIPT_MARKER: &str = "// probar-mobile:";

/// Prefix `body` with the marker line for `op`
#[must_use]
pub fn tagged_script(op: &str, body: &str) -> String {
    format!("{SCRIPT_MARKER}{op}\n{body}")
}

/// Extract the operation tag of a script produced by [`tagged_script`]
#[must_use]
pub fn script_op(script: &str) -> Option<&str> {
    script
        .lines()
        .next()
        .and_then(|line| line.strip_prefix(SCRIPT_MARKER))
        .map(str::trim)
}

/// Image-specific measurements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageSnapshot {
    /// Whether the element carries a `src` attribute
    pub has_src_attribute: bool,
    /// Resolved `src` property
    pub src: String,
    /// Source actually selected by the browser
    pub current_src: String,
    /// Rendered width
    pub width: f64,
    /// Rendered height
    pub height: f64,
    /// Intrinsic width
    pub natural_width: f64,
    /// Intrinsic height
    pub natural_height: f64,
}

impl ImageSnapshot {
    /// Image with a source and the given rendered and natural sizes
    #[must_use]
    pub fn new(src: impl Into<String>, rendered: (f64, f64), natural: (f64, f64)) -> Self {
        let src = src.into();
        Self {
            has_src_attribute: true,
            current_src: src.clone(),
            src,
            width: rendered.0,
            height: rendered.1,
            natural_width: natural.0,
            natural_height: natural.1,
        }
    }

    /// The URL the browser displays, preferring `currentSrc`
    #[must_use]
    pub fn effective_src(&self) -> &str {
        if self.current_src.is_empty() {
            &self.src
        } else {
            &self.current_src
        }
    }
}

/// How an element's trimmed `textContent` classifies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSample {
    /// No text after trimming
    Empty,
    /// Text containing an excluded term
    Excluded,
    /// Any other text
    Readable,
}

impl TextSample {
    /// Classify `text` the way the snapshot script does
    #[must_use]
    pub fn classify<S: AsRef<str>>(text: &str, excluded_terms: &[S]) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        let lowercase = trimmed.to_lowercase();
        if excluded_terms
            .iter()
            .any(|term| lowercase.contains(&term.as_ref().to_lowercase()))
        {
            Self::Excluded
        } else {
            Self::Readable
        }
    }
}

/// One element with the computed styles and box metrics the checks read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementSnapshot {
    /// Lowercase tag name
    pub tag: String,
    /// Index of the parent element in the snapshot
    pub parent: Option<usize>,
    /// Computed `font-size`
    pub font_size: Option<String>,
    /// Computed `text-indent`
    pub text_indent: Option<String>,
    /// Computed `display`
    pub display: String,
    /// Computed `opacity`
    pub opacity: String,
    /// Computed `visibility`
    pub visibility: String,
    /// Computed `overflow`
    pub overflow: String,
    /// Computed `position`
    pub position: String,
    /// Computed `object-fit`
    pub object_fit: String,
    /// `offsetWidth`, absent for elements without a layout box API (SVG)
    pub offset_width: Option<f64>,
    /// `offsetHeight`, absent for elements without a layout box API (SVG)
    pub offset_height: Option<f64>,
    /// Whether `offsetParent` is non-null
    pub has_offset_parent: bool,
    /// Text classification, only sampled for small-font elements
    pub text: Option<TextSample>,
    /// `outerHTML`, only sent for images
    pub outer_html: Option<String>,
    /// Image measurements for `img` elements
    pub image: Option<ImageSnapshot>,
}

impl ElementSnapshot {
    /// A visible, in-flow element with a 16px font and a 100×20 box
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            parent: None,
            font_size: Some("16px".to_string()),
            text_indent: Some("0px".to_string()),
            display: "block".to_string(),
            opacity: "1".to_string(),
            visibility: "visible".to_string(),
            overflow: "visible".to_string(),
            position: "static".to_string(),
            object_fit: "fill".to_string(),
            offset_width: Some(100.0),
            offset_height: Some(20.0),
            has_offset_parent: true,
            text: None,
            outer_html: None,
            image: None,
        }
    }

    /// Set the parent index
    #[must_use]
    pub const fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the computed font size
    #[must_use]
    pub fn with_font_size(mut self, font_size: impl Into<String>) -> Self {
        self.font_size = Some(font_size.into());
        self
    }

    /// Set the computed text indent
    #[must_use]
    pub fn with_text_indent(mut self, indent: impl Into<String>) -> Self {
        self.text_indent = Some(indent.into());
        self
    }

    /// Set the text classification
    #[must_use]
    pub const fn with_text(mut self, text: TextSample) -> Self {
        self.text = Some(text);
        self
    }

    /// Set markup, with text classified against the default excluded terms
    #[must_use]
    pub fn with_content(mut self, text: &str, outer_html: impl Into<String>) -> Self {
        self.text = Some(TextSample::classify(text, &DEFAULT_EXCLUDED_TERMS));
        self.outer_html = Some(outer_html.into());
        self
    }

    /// Set the layout box
    #[must_use]
    pub const fn with_box(mut self, width: f64, height: f64) -> Self {
        self.offset_width = Some(width);
        self.offset_height = Some(height);
        self
    }

    /// Set the computed `display`
    #[must_use]
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    /// Set the computed `opacity`
    #[must_use]
    pub fn with_opacity(mut self, opacity: impl Into<String>) -> Self {
        self.opacity = opacity.into();
        self
    }

    /// Set the computed `visibility`
    #[must_use]
    pub fn with_visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = visibility.into();
        self
    }

    /// Set the computed `overflow`
    #[must_use]
    pub fn with_overflow(mut self, overflow: impl Into<String>) -> Self {
        self.overflow = overflow.into();
        self
    }

    /// Set the computed `position`
    #[must_use]
    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = position.into();
        self
    }

    /// Set the computed `object-fit`
    #[must_use]
    pub fn with_object_fit(mut self, object_fit: impl Into<String>) -> Self {
        self.object_fit = object_fit.into();
        self
    }

    /// Mark the element as out of flow (`offsetParent === null`)
    #[must_use]
    pub const fn detached(mut self) -> Self {
        self.has_offset_parent = false;
        self
    }

    /// Attach image measurements
    #[must_use]
    pub fn with_image(mut self, image: ImageSnapshot) -> Self {
        self.image = Some(image);
        self
    }

    /// `html` and `body` never have an offset parent
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self.tag.as_str(), "html" | "body")
    }

    /// Whether `opacity` computes to zero
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        parse_css_float(&self.opacity) == Some(0.0)
    }

    /// Whether either box dimension is zero
    #[must_use]
    pub fn has_empty_box(&self) -> bool {
        self.offset_width == Some(0.0) || self.offset_height == Some(0.0)
    }
}

/// Rules deciding whether an ancestor hides its descendants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occlusion {
    /// Treat `visibility: hidden` as hiding
    pub check_visibility: bool,
    /// Out-of-flow ancestors with `position: fixed` still show their content
    pub exempt_fixed: bool,
}

impl Occlusion {
    /// Rules applied to text ancestors
    pub const TEXT: Self = Self {
        check_visibility: true,
        exempt_fixed: false,
    };

    /// Rules applied to image ancestors
    pub const IMAGE: Self = Self {
        check_visibility: false,
        exempt_fixed: true,
    };

    /// Whether `element` hides everything inside it
    #[must_use]
    pub fn hides(&self, element: &ElementSnapshot) -> bool {
        let out_of_flow = !element.is_root()
            && !element.has_offset_parent
            && !(self.exempt_fixed && element.position == "fixed");

        out_of_flow
            || element.display == "none"
            || element.is_transparent()
            || (self.check_visibility && element.visibility == "hidden")
            || (element.has_empty_box() && element.overflow == "hidden")
    }
}

/// Flat, document-ordered snapshot of the render tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomSnapshot {
    /// Elements in document order
    pub elements: Vec<ElementSnapshot>,
}

impl DomSnapshot {
    /// Empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot holding `html` (index 0) and `body` (index 1)
    #[must_use]
    pub fn with_document() -> Self {
        let mut snapshot = Self::new();
        let html = snapshot.push(
            ElementSnapshot::new("html")
                .with_box(1024.0, 768.0)
                .detached(),
        );
        snapshot.push(
            ElementSnapshot::new("body")
                .with_parent(html)
                .with_box(1024.0, 768.0)
                .detached(),
        );
        snapshot
    }

    /// Index of `body` in a snapshot built by [`Self::with_document`]
    pub const BODY: usize = 1;

    /// Append an element and return its index
    pub fn push(&mut self, element: ElementSnapshot) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    /// Element by index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ElementSnapshot> {
        self.elements.get(index)
    }

    /// Ancestors of `index`, nearest first
    #[must_use]
    pub fn ancestors(&self, index: usize) -> Ancestors<'_> {
        Ancestors {
            snapshot: self,
            next: self.get(index).and_then(|e| e.parent),
        }
    }

    /// Whether `ancestor` is `index` itself or one of its ancestors
    #[must_use]
    pub fn contains(&self, ancestor: usize, index: usize) -> bool {
        ancestor == index || self.ancestors(index).any(|(i, _)| i == ancestor)
    }

    /// Capture the snapshot from the live page
    pub async fn capture<D>(driver: &mut D, scope: SnapshotScope<'_>) -> AuditResult<Self>
    where
        D: PageDriver + ?Sized,
    {
        evaluate_as(driver, &snapshot_script(scope), "DOM snapshot").await
    }

    /// The snapshot as the page transmits it: markup only for images
    #[must_use]
    pub fn without_markup(&self) -> Self {
        let elements = self
            .elements
            .iter()
            .map(|element| {
                let mut element = element.clone();
                if element.tag != "img" {
                    element.outer_html = None;
                }
                element
            })
            .collect();
        Self { elements }
    }

    /// Images and their ancestors, reindexed, as [`SnapshotScope::Images`] captures
    #[must_use]
    pub fn image_scope(&self) -> Self {
        let mut keep = vec![false; self.elements.len()];
        for (index, element) in self.elements.iter().enumerate() {
            if element.tag == "img" {
                keep[index] = true;
                for (ancestor, _) in self.ancestors(index) {
                    keep[ancestor] = true;
                }
            }
        }

        let mut remap = vec![None; self.elements.len()];
        let mut scoped = Self::new();
        for (index, element) in self.elements.iter().enumerate() {
            if !keep[index] {
                continue;
            }
            let mut element = element.clone();
            element.parent = element.parent.and_then(|p| remap.get(p).copied().flatten());
            element.text = None;
            remap[index] = Some(scoped.push(element));
        }
        scoped
    }
}

/// Which elements a snapshot covers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapshotScope<'a> {
    /// Every element; text below `threshold_px` is classified against the terms
    Text {
        /// Font size below which text is sampled
        threshold_px: f64,
        /// Terms reported as [`TextSample::Excluded`]
        excluded_terms: &'a [String],
    },
    /// Only images and their ancestors, without text
    Images,
}

impl SnapshotScope<'_> {
    /// Marker operation of the capture script
    #[must_use]
    pub const fn op(&self) -> &'static str {
        match self {
            Self::Text { .. } => "snapshot",
            Self::Images => "snapshot-images",
        }
    }
}

/// Iterator over ancestors, see [`DomSnapshot::ancestors`]
#[derive(Debug)]
pub struct Ancestors<'a> {
    snapshot: &'a DomSnapshot,
    next: Option<usize>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (usize, &'a ElementSnapshot);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let element = self.snapshot.get(index)?;
        self.next = element.parent;
        Some((index, element))
    }
}

/// Script capturing a [`DomSnapshot`] of `scope`
#[must_use]
pub fn snapshot_script(scope: SnapshotScope<'_>) -> String {
    let (threshold, terms, select) = match scope {
        SnapshotScope::Text {
            threshold_px,
            excluded_terms,
        } => {
            let lowercase: Vec<String> = excluded_terms.iter().map(|t| t.to_lowercase()).collect();
            (threshold_px, lowercase, "const nodes = all;")
        }
        SnapshotScope::Images => (
            0.0,
            Vec::new(),
            r"const keep = new Set();
  all.forEach((el) => {
    if (el.tagName.toLowerCase() !== 'img') return;
    for (let n = el; n; n = n.parentElement) keep.add(n);
  });
  const nodes = all.filter((el) => keep.has(el));",
        ),
    };
    let terms = serde_json::to_string(&terms).unwrap_or_else(|_| "[]".to_string());

    let body = r"(() => {
  const threshold = __THRESHOLD__;
  const terms = __TERMS__;
  const all = Array.from(document.querySelectorAll('*'));
  __SELECT__
  const index = new Map();
  nodes.forEach((el, i) => index.set(el, i));
  const metric = (value) => (typeof value === 'number' ? value : null);
  const classify = (el) => {
    const text = (el.textContent || '').trim();
    if (!text) return 'empty';
    const lower = text.toLowerCase();
    return terms.some((term) => lower.includes(term)) ? 'excluded' : 'readable';
  };
  const elements = nodes.map((el) => {
    const styles = window.getComputedStyle(el);
    const tag = el.tagName.toLowerCase();
    const small = tag !== 'img' && parseFloat(styles.fontSize) < threshold;
    const entry = {
      tag,
      parent: el.parentElement && index.has(el.parentElement) ? index.get(el.parentElement) : null,
      fontSize: styles.fontSize || null,
      textIndent: styles.textIndent || null,
      display: styles.display,
      opacity: styles.opacity,
      visibility: styles.visibility,
      overflow: styles.overflow,
      position: styles.position,
      objectFit: styles.objectFit,
      offsetWidth: metric(el.offsetWidth),
      offsetHeight: metric(el.offsetHeight),
      hasOffsetParent: el.offsetParent !== null,
      text: small ? classify(el) : null,
      outerHtml: tag === 'img' ? el.outerHTML : null,
      image: null,
    };
    if (tag === 'img') {
      entry.image = {
        hasSrcAttribute: el.hasAttribute('src'),
        src: el.src || '',
        currentSrc: el.currentSrc || '',
        width: el.width || 0,
        height: el.height || 0,
        naturalWidth: el.naturalWidth || 0,
        naturalHeight: el.naturalHeight || 0,
      };
    }
    return entry;
  });
  return { elements };
})()";

    tagged_script(
        scope.op(),
        &body
            .replace("__THRESHOLD__", &threshold.to_string())
            .replace("__TERMS__", &terms)
            .replace("__SELECT__", select),
    )
}

#[derive(Debug, Deserialize)]
struct MarkupReply {
    markup: Vec<Option<String>>,
}

/// Script reading `outerHTML` of elements by their index in a text-scope snapshot
#[must_use]
pub fn markup_script(indices: &[usize]) -> String {
    let list = indices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    tagged_script(
        &format!("markup:{list}"),
        &format!(
            r"(() => {{
  const all = document.querySelectorAll('*');
  return {{ markup: [{list}].map((i) => (all[i] ? all[i].outerHTML : null)) }};
}})()"
        ),
    )
}

/// Fetch `outerHTML` for elements of a [`SnapshotScope::Text`] snapshot.
///
/// The page must not have changed since the snapshot was captured. Entries
/// are `None` for indices the page no longer has.
pub async fn fetch_markup<D>(driver: &mut D, indices: &[usize]) -> AuditResult<Vec<Option<String>>>
where
    D: PageDriver + ?Sized,
{
    if indices.is_empty() {
        return Ok(Vec::new());
    }
    let reply: MarkupReply = evaluate_as(driver, &markup_script(indices), "element markup").await?;
    Ok(reply.markup)
}

fn float_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
            .expect("float prefix pattern is valid")
    })
}

fn int_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[+-]?\d+").expect("int prefix pattern is valid")
    })
}

/// Leading number of a CSS value, the way `parseFloat` reads it
#[must_use]
pub fn parse_css_float(value: &str) -> Option<f64> {
    let matched = float_prefix().find(value.trim_start())?.as_str();
    match matched.trim_start_matches('+') {
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        number => number.parse().ok(),
    }
}

/// Leading integer of a CSS value, the way `parseInt` reads it
#[must_use]
pub fn parse_css_int(value: &str) -> Option<f64> {
    int_prefix()
        .find(value.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_parse_css_float() {
            assert_eq!(parse_css_float("11.5px"), Some(11.5));
            assert_eq!(parse_css_float("  12px"), Some(12.0));
            assert_eq!(parse_css_float(".5em"), Some(0.5));
            assert_eq!(parse_css_float("-3px"), Some(-3.0));
            assert_eq!(parse_css_float("0"), Some(0.0));
            assert_eq!(parse_css_float("auto"), None);
            assert_eq!(parse_css_float(""), None);
        }

        #[test]
        fn test_parse_css_int_truncates() {
            assert_eq!(parse_css_int("-9999.7px"), Some(-9999.0));
            assert_eq!(parse_css_int("0px"), Some(0.0));
            assert_eq!(parse_css_int("normal"), None);
        }
    }

    mod script_tests {
        use super::*;

        #[test]
        fn test_script_op_roundtrip() {
            let script = tagged_script("tree-hide:3", "(() => 1)()");
            assert_eq!(script_op(&script), Some("tree-hide:3"));
            assert_eq!(script_op("document.title"), None);
        }

        #[test]
        fn test_snapshot_script_embeds_threshold_and_terms() {
            let terms = vec!["©".to_string(), "Copyright".to_string()];
            let script = snapshot_script(SnapshotScope::Text {
                threshold_px: 12.0,
                excluded_terms: &terms,
            });
            assert_eq!(script_op(&script), Some("snapshot"));
            assert!(script.contains("const threshold = 12;"));
            assert!(script.contains(r#"const terms = ["©","copyright"];"#));
            assert!(script.contains("const nodes = all;"));
            assert!(!script.contains("__"));
        }

        #[test]
        fn test_snapshot_script_sends_classification_not_text() {
            let script = snapshot_script(SnapshotScope::Text {
                threshold_px: 12.0,
                excluded_terms: &[],
            });
            assert!(script.contains("text: small ? classify(el) : null"));
            assert!(script.contains("outerHtml: tag === 'img' ? el.outerHTML : null"));
        }

        #[test]
        fn test_image_scope_script() {
            let script = snapshot_script(SnapshotScope::Images);
            assert_eq!(script_op(&script), Some("snapshot-images"));
            assert!(script.contains("const threshold = 0;"));
            assert!(script.contains("const terms = [];"));
            assert!(script.contains("all.filter((el) => keep.has(el))"));
        }

        #[test]
        fn test_markup_script_lists_indices() {
            let script = markup_script(&[4, 17]);
            assert_eq!(script_op(&script), Some("markup:4,17"));
            assert!(script.contains("[4,17].map"));
        }
    }

    mod text_sample_tests {
        use super::*;

        #[test]
        fn test_classify() {
            let terms = ["copyright", "policy"];
            assert_eq!(TextSample::classify("   ", &terms), TextSample::Empty);
            assert_eq!(TextSample::classify("Copyright 2024", &terms), TextSample::Excluded);
            assert_eq!(TextSample::classify(" Privacy POLICY ", &terms), TextSample::Excluded);
            assert_eq!(TextSample::classify("Hello", &terms), TextSample::Readable);
        }

        #[test]
        fn test_custom_terms() {
            let terms = vec!["Hello".to_string()];
            assert_eq!(TextSample::classify("hello world", &terms), TextSample::Excluded);
            assert_eq!(TextSample::classify("© Acme", &terms), TextSample::Readable);
        }
    }

    mod snapshot_tests {
        use super::*;

        fn page_with_image() -> DomSnapshot {
            let mut snapshot = DomSnapshot::with_document();
            let figure = snapshot.push(ElementSnapshot::new("figure").with_parent(DomSnapshot::BODY));
            snapshot.push(
                ElementSnapshot::new("p")
                    .with_parent(DomSnapshot::BODY)
                    .with_font_size("10px")
                    .with_content("Hello", "<p>Hello</p>"),
            );
            snapshot.push(
                ElementSnapshot::new("img")
                    .with_parent(figure)
                    .with_content("", "<img src=\"a.png\">"),
            );
            snapshot
        }

        #[test]
        fn test_without_markup_keeps_images_only() {
            let sent = page_with_image().without_markup();
            assert_eq!(sent.elements[3].outer_html, None);
            assert_eq!(sent.elements[3].text, Some(TextSample::Readable));
            assert_eq!(sent.elements[4].outer_html.as_deref(), Some("<img src=\"a.png\">"));
        }

        #[test]
        fn test_image_scope_keeps_ancestor_chain() {
            let scoped = page_with_image().image_scope();
            let tags: Vec<&str> = scoped.elements.iter().map(|e| e.tag.as_str()).collect();
            assert_eq!(tags, ["html", "body", "figure", "img"]);
            let chain: Vec<usize> = scoped.ancestors(3).map(|(i, _)| i).collect();
            assert_eq!(chain, vec![2, 1, 0]);
            assert!(scoped.elements.iter().all(|e| e.text.is_none()));
        }

        #[test]
        fn test_image_scope_of_imageless_page_is_empty() {
            let mut snapshot = DomSnapshot::with_document();
            snapshot.push(ElementSnapshot::new("p").with_parent(DomSnapshot::BODY));
            assert!(snapshot.image_scope().elements.is_empty());
        }

        #[test]
        fn test_ancestors_nearest_first() {
            let mut snapshot = DomSnapshot::with_document();
            let div = snapshot.push(ElementSnapshot::new("div").with_parent(DomSnapshot::BODY));
            let span = snapshot.push(ElementSnapshot::new("span").with_parent(div));

            let chain: Vec<usize> = snapshot.ancestors(span).map(|(i, _)| i).collect();
            assert_eq!(chain, vec![div, DomSnapshot::BODY, 0]);
            assert!(snapshot.contains(div, span));
            assert!(snapshot.contains(span, span));
            assert!(!snapshot.contains(span, div));
        }

        #[test]
        fn test_decodes_camel_case_with_missing_fields() {
            let value = serde_json::json!({
                "elements": [
                    { "tag": "html", "parent": null, "offsetWidth": 375, "hasOffsetParent": false },
                    { "tag": "svg", "parent": 0, "offsetWidth": null, "fontSize": "10px" }
                ]
            });
            let snapshot: DomSnapshot = serde_json::from_value(value).unwrap();
            assert_eq!(snapshot.elements.len(), 2);
            assert_eq!(snapshot.elements[0].offset_width, Some(375.0));
            assert_eq!(snapshot.elements[1].offset_width, None);
            assert_eq!(snapshot.elements[1].font_size.as_deref(), Some("10px"));
        }
    }

    mod occlusion_tests {
        use super::*;

        #[test]
        fn test_display_none_hides() {
            let el = ElementSnapshot::new("div").with_display("none");
            assert!(Occlusion::TEXT.hides(&el));
            assert!(Occlusion::IMAGE.hides(&el));
        }

        #[test]
        fn test_visibility_only_hides_text() {
            let el = ElementSnapshot::new("div").with_visibility("hidden");
            assert!(Occlusion::TEXT.hides(&el));
            assert!(!Occlusion::IMAGE.hides(&el));
        }

        #[test]
        fn test_fixed_position_exempt_for_images() {
            let el = ElementSnapshot::new("div").with_position("fixed").detached();
            assert!(Occlusion::TEXT.hides(&el));
            assert!(!Occlusion::IMAGE.hides(&el));
        }

        #[test]
        fn test_collapsed_box_needs_hidden_overflow() {
            let collapsed = ElementSnapshot::new("div").with_box(0.0, 40.0);
            assert!(!Occlusion::TEXT.hides(&collapsed));
            assert!(Occlusion::TEXT.hides(&collapsed.with_overflow("hidden")));
        }

        #[test]
        fn test_root_without_offset_parent_is_visible() {
            let body = ElementSnapshot::new("body").detached();
            assert!(!Occlusion::TEXT.hides(&body));
        }
    }
}
