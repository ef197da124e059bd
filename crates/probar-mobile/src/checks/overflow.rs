//! Horizontal overflow detection.
//!
//! A page overflows when `body.scrollWidth > body.clientWidth`. The culprit
//! is found by narrowing: hide a candidate, re-measure, and descend into the
//! candidate whose removal clears the overflow. Every mutation made during
//! the search is reverted before the verdict is returned.

use super::{CheckOutcome, Evidence};
use crate::dom::tagged_script;
use crate::driver::{evaluate_as, PageDriver};
use crate::result::{AuditError, AuditResult};
use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::Deserialize;

/// Handle of an element registered during one search
pub type NodeId = u32;

/// Mutable view of the rendered element tree used by the narrowing search
#[async_trait]
pub trait RenderTree: Send {
    /// The `<body>` element
    async fn root(&mut self) -> AuditResult<NodeId>;

    /// Whether the page currently scrolls horizontally
    async fn overflows(&mut self) -> AuditResult<bool>;

    /// Set `display: none`, remembering the inline value
    async fn hide(&mut self, node: NodeId) -> AuditResult<()>;

    /// Restore the inline `display` saved by [`RenderTree::hide`]
    async fn show(&mut self, node: NodeId) -> AuditResult<()>;

    /// Set `min-height: 1px`, remembering the inline value
    async fn pin_min_height(&mut self, node: NodeId) -> AuditResult<()>;

    /// Restore the inline `min-height` saved by [`RenderTree::pin_min_height`]
    async fn unpin_min_height(&mut self, node: NodeId) -> AuditResult<()>;

    /// First element child
    async fn first_child(&mut self, node: NodeId) -> AuditResult<Option<NodeId>>;

    /// Next element sibling
    async fn next_sibling(&mut self, node: NodeId) -> AuditResult<Option<NodeId>>;

    /// Opening tag with attributes, without descendants or closing tag
    async fn opening_tag(&mut self, node: NodeId) -> AuditResult<String>;
}

/// Find the innermost element whose removal clears the overflow.
///
/// Returns `None` when the page does not overflow or no single element
/// resolves it. Pinned `min-height` values are restored innermost first,
/// also when the search itself fails.
pub async fn find_culprit<T>(tree: &mut T) -> AuditResult<Option<NodeId>>
where
    T: RenderTree + ?Sized,
{
    let mut pinned = Vec::new();
    let search = narrow(tree, &mut pinned).await;

    let mut restored = Ok(());
    for node in pinned.into_iter().rev() {
        if let Err(e) = tree.unpin_min_height(node).await {
            if restored.is_ok() {
                restored = Err(e);
            }
        }
    }

    let culprit = search?;
    restored?;
    Ok(culprit)
}

async fn narrow<T>(tree: &mut T, pinned: &mut Vec<NodeId>) -> AuditResult<Option<NodeId>>
where
    T: RenderTree + ?Sized,
{
    let mut culprit = None;
    let mut candidate = Some(tree.root().await?);

    while let Some(node) = candidate {
        if !tree.overflows().await? {
            break;
        }

        tree.hide(node).await?;
        let measured = tree.overflows().await;
        tree.show(node).await?;
        let resolved = !measured?;

        if resolved {
            culprit = Some(node);
            // Keeps the parent's box from collapsing while children are hidden
            tree.pin_min_height(node).await?;
            pinned.push(node);
            candidate = tree.first_child(node).await?;
        } else {
            candidate = tree.next_sibling(node).await?;
        }
    }

    Ok(culprit)
}

async fn inspect<T>(tree: &mut T) -> AuditResult<CheckOutcome>
where
    T: RenderTree + ?Sized,
{
    if !tree.overflows().await? {
        return Ok(CheckOutcome::pass());
    }

    match find_culprit(tree).await? {
        Some(node) => {
            let tag = tree.opening_tag(node).await?;
            Ok(CheckOutcome::fail(vec![Evidence::Markup(tag)]))
        }
        None => {
            tracing::debug!("page overflows but no single element resolves it");
            Ok(CheckOutcome::pass())
        }
    }
}

/// Detect horizontal overflow on the current page
pub async fn detect<D>(driver: &mut D) -> AuditResult<CheckOutcome>
where
    D: PageDriver + ?Sized,
{
    let mut tree = LiveRenderTree::new(driver);
    let outcome = inspect(&mut tree).await;
    let released = tree.release().await;
    let outcome = outcome?;
    released?;
    Ok(outcome)
}

// =============================================================================
// Live page
// =============================================================================

/// Registry kept in the page while a search runs
const REGISTRY: &str = "window.__probarMobileTree";

#[derive(Debug, Deserialize)]
struct NodeReply {
    node: Option<NodeId>,
}

#[derive(Debug, Deserialize)]
struct OverflowReply {
    overflows: bool,
}

#[derive(Debug, Deserialize)]
struct TagReply {
    tag: String,
}

/// Script for one tree operation; `body` sees `reg`, `register`, `arg` and `el`
#[must_use]
pub fn tree_script(op: &str, node: Option<NodeId>, body: &str) -> String {
    let tag = node.map_or_else(|| format!("tree-{op}"), |id| format!("tree-{op}:{id}"));
    let arg = node.map_or_else(|| "null".to_string(), |id| id.to_string());
    let prelude = format!(
        r"(() => {{
  const reg = {REGISTRY} || ({REGISTRY} = {{ nodes: [], display: {{}}, minHeight: {{}} }});
  const register = (el) => {{
    if (!el) return null;
    let id = reg.nodes.indexOf(el);
    if (id < 0) {{ id = reg.nodes.length; reg.nodes.push(el); }}
    return id;
  }};
  const arg = {arg};
  const el = arg === null ? null : reg.nodes[arg];
"
    );
    tagged_script(&tag, &format!("{prelude}{body}\n}})()"))
}

/// [`RenderTree`] backed by scripts evaluated in the live page
#[derive(Debug)]
pub struct LiveRenderTree<'a, D: ?Sized> {
    driver: &'a mut D,
}

impl<'a, D> LiveRenderTree<'a, D>
where
    D: PageDriver + ?Sized,
{
    /// Wrap a driver
    pub fn new(driver: &'a mut D) -> Self {
        Self { driver }
    }

    /// Drop the in-page node registry
    pub async fn release(&mut self) -> AuditResult<()> {
        let script = tagged_script(
            "tree-release",
            &format!("(() => {{ delete {REGISTRY}; return {{ ok: true }}; }})()"),
        );
        self.ack(&script).await
    }

    async fn ack(&mut self, script: &str) -> AuditResult<()> {
        evaluate_as::<IgnoredAny, _>(&mut *self.driver, script, "tree acknowledgement")
            .await
            .map(|_| ())
    }

    async fn node(&mut self, script: &str) -> AuditResult<Option<NodeId>> {
        let reply: NodeReply = evaluate_as(&mut *self.driver, script, "tree node").await?;
        Ok(reply.node)
    }
}

#[async_trait]
impl<D> RenderTree for LiveRenderTree<'_, D>
where
    D: PageDriver + ?Sized,
{
    async fn root(&mut self) -> AuditResult<NodeId> {
        let script = tree_script(
            "root",
            None,
            r"  reg.nodes = []; reg.display = {}; reg.minHeight = {};
  return { node: register(document.body) };",
        );
        self.node(&script)
            .await?
            .ok_or_else(|| AuditError::evaluation("document has no body"))
    }

    async fn overflows(&mut self) -> AuditResult<bool> {
        let script = tree_script(
            "overflows",
            None,
            r"  const body = document.body;
  return { overflows: !!body && body.scrollWidth > body.clientWidth };",
        );
        let reply: OverflowReply = evaluate_as(&mut *self.driver, &script, "overflow state").await?;
        Ok(reply.overflows)
    }

    async fn hide(&mut self, node: NodeId) -> AuditResult<()> {
        let script = tree_script(
            "hide",
            Some(node),
            r"  reg.display[arg] = el.style.display;
  el.style.display = 'none';
  return { ok: true };",
        );
        self.ack(&script).await
    }

    async fn show(&mut self, node: NodeId) -> AuditResult<()> {
        let script = tree_script(
            "show",
            Some(node),
            r"  el.style.display = reg.display[arg] || '';
  delete reg.display[arg];
  return { ok: true };",
        );
        self.ack(&script).await
    }

    async fn pin_min_height(&mut self, node: NodeId) -> AuditResult<()> {
        let script = tree_script(
            "pin",
            Some(node),
            r"  reg.minHeight[arg] = el.style.minHeight;
  el.style.minHeight = '1px';
  return { ok: true };",
        );
        self.ack(&script).await
    }

    async fn unpin_min_height(&mut self, node: NodeId) -> AuditResult<()> {
        let script = tree_script(
            "unpin",
            Some(node),
            r"  el.style.minHeight = reg.minHeight[arg] || '';
  delete reg.minHeight[arg];
  return { ok: true };",
        );
        self.ack(&script).await
    }

    async fn first_child(&mut self, node: NodeId) -> AuditResult<Option<NodeId>> {
        let script = tree_script(
            "first-child",
            Some(node),
            "  return { node: register(el.firstElementChild) };",
        );
        self.node(&script).await
    }

    async fn next_sibling(&mut self, node: NodeId) -> AuditResult<Option<NodeId>> {
        let script = tree_script(
            "next-sibling",
            Some(node),
            "  return { node: register(el.nextElementSibling) };",
        );
        self.node(&script).await
    }

    async fn opening_tag(&mut self, node: NodeId) -> AuditResult<String> {
        let script = tree_script(
            "opening-tag",
            Some(node),
            r"  const clone = el.cloneNode(false);
  clone.style.removeProperty('min-height');
  if (reg.display[arg] !== undefined) clone.style.display = reg.display[arg];
  if ((clone.getAttribute('style') || '').trim() === '') clone.removeAttribute('style');
  const html = clone.outerHTML;
  const close = html.lastIndexOf('</');
  return { tag: close > 0 ? html.slice(0, close) : html };",
        );
        let reply: TagReply = evaluate_as(&mut *self.driver, &script, "opening tag").await?;
        Ok(reply.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::script_op;
    use crate::mock::{MockDriver, MockLayout, MockPage};

    /// body > div.wrapper > (p, table.wide > td)
    fn nested_layout() -> (MockLayout, NodeId, NodeId) {
        let mut layout = MockLayout::new(375.0);
        let wrapper = layout.add(0, "div", 375.0);
        layout.set_attribute(wrapper, "class", "wrapper");
        layout.add(wrapper, "p", 300.0);
        let table = layout.add(wrapper, "table", 900.0);
        layout.set_attribute(table, "class", "wide");
        layout.add(table, "td", 200.0);
        (layout, wrapper, table)
    }

    mod search_tests {
        use super::*;

        #[tokio::test]
        async fn test_no_overflow_has_no_culprit() {
            let mut layout = MockLayout::new(375.0);
            layout.add(0, "div", 300.0);
            assert_eq!(find_culprit(&mut layout).await.unwrap(), None);
            assert!(!layout.overflows_now());
        }

        #[tokio::test]
        async fn test_narrows_to_innermost_resolving_element() {
            let (mut layout, _, table) = nested_layout();
            assert_eq!(find_culprit(&mut layout).await.unwrap(), Some(table));
        }

        #[tokio::test]
        async fn test_pinned_state_is_restored() {
            let (mut layout, wrapper, table) = nested_layout();
            find_culprit(&mut layout).await.unwrap();
            for node in [0, wrapper, table] {
                assert!(!layout.is_hidden(node));
                assert!(!layout.is_pinned(node));
            }
        }

        #[tokio::test]
        async fn test_advances_past_siblings_that_do_not_resolve() {
            let mut layout = MockLayout::new(375.0);
            layout.add(0, "header", 200.0);
            layout.add(0, "nav", 300.0);
            let wide = layout.add(0, "img", 800.0);
            assert_eq!(find_culprit(&mut layout).await.unwrap(), Some(wide));
        }

        #[tokio::test]
        async fn test_two_offenders_leave_parent_as_culprit() {
            let mut layout = MockLayout::new(375.0);
            let main = layout.add(0, "main", 375.0);
            layout.add(main, "pre", 600.0);
            layout.add(main, "table", 700.0);
            assert_eq!(find_culprit(&mut layout).await.unwrap(), Some(main));
        }
    }

    mod detect_tests {
        use super::*;

        #[tokio::test]
        async fn test_clean_page_passes() {
            let mut driver = MockDriver::with_page(MockPage::new());
            let outcome = detect(&mut driver).await.unwrap();
            assert!(outcome.success);
            assert!(outcome.evidence.is_empty());
        }

        #[tokio::test]
        async fn test_single_wide_element_reports_opening_tag() {
            let mut layout = MockLayout::new(375.0);
            let wide = layout.add(0, "div", 1200.0);
            layout.set_attribute(wide, "style", "width:1200px");
            layout.add(wide, "span", 100.0);
            let mut driver = MockDriver::with_page(MockPage::new().with_layout(layout));

            let outcome = detect(&mut driver).await.unwrap();
            assert!(!outcome.success);
            assert_eq!(
                outcome.evidence,
                vec![Evidence::Markup("<div style=\"width:1200px\">".to_string())]
            );
            assert!(driver.was_called("tree-release"));
        }

        #[tokio::test]
        async fn test_repeated_detection_is_identical() {
            let (layout, _, _) = nested_layout();
            let mut driver = MockDriver::with_page(MockPage::new().with_layout(layout));
            let first = detect(&mut driver).await.unwrap();
            let second = detect(&mut driver).await.unwrap();
            assert_eq!(first, second);
            assert_eq!(
                first.evidence,
                vec![Evidence::Markup("<table class=\"wide\">".to_string())]
            );
        }

        #[tokio::test]
        async fn test_failure_mid_search_still_unpins() {
            let (layout, wrapper, _) = nested_layout();
            let mut driver = MockDriver::with_page(MockPage::new().with_layout(layout));
            driver.fail_on(None, "tree-first-child");

            assert!(detect(&mut driver).await.is_err());
            let layout = &driver.current_page().layout;
            assert!(!layout.is_pinned(0));
            assert!(!layout.is_pinned(wrapper));
            assert!(driver.was_called("tree-unpin"));
            assert!(driver.was_called("tree-release"));
        }
    }

    #[test]
    fn test_tree_scripts_are_tagged() {
        let script = tree_script("hide", Some(7), "  return { ok: true };");
        assert_eq!(script_op(&script), Some("tree-hide:7"));
        assert!(script.contains("const arg = 7;"));

        let script = tree_script("overflows", None, "  return {};");
        assert_eq!(script_op(&script), Some("tree-overflows"));
        assert!(script.contains("const arg = null;"));
    }
}
