//! Scripted in-memory pages for unit tests.
//!
//! [`MockDriver`] answers the scripts produced by this crate by routing on
//! their `// probar-mobile:<op>` marker line. Each emulated device can see
//! its own [`MockPage`]; devices without one see the default page.

use crate::checks::overflow::{NodeId, RenderTree};
use crate::checks::viewport::ViewportMeta;
use crate::dom::{script_op, DomSnapshot, SCRIPT_MARKER};
use crate::driver::PageDriver;
use crate::emulation::DeviceDescriptor;
use crate::result::{AuditError, AuditResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;

/// User agent the mock reports for its automation layer
pub const MOCK_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) HeadlessChrome/120.0.0.0";

// =============================================================================
// Layout
// =============================================================================

#[derive(Debug, Clone)]
struct LayoutNode {
    tag: String,
    width: f64,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<(String, String)>,
    hidden: bool,
    pinned: bool,
}

/// In-memory element tree with fixed widths.
///
/// The page overflows while any visible node is wider than the viewport.
/// Node `0` is the body and always exists.
#[derive(Debug, Clone)]
pub struct MockLayout {
    viewport_width: f64,
    nodes: Vec<LayoutNode>,
}

impl Default for MockLayout {
    fn default() -> Self {
        Self::new(375.0)
    }
}

impl MockLayout {
    /// Layout with only a body as wide as the viewport
    #[must_use]
    pub fn new(viewport_width: f64) -> Self {
        Self {
            viewport_width,
            nodes: vec![LayoutNode {
                tag: "body".to_string(),
                width: viewport_width,
                parent: None,
                children: Vec::new(),
                attributes: Vec::new(),
                hidden: false,
                pinned: false,
            }],
        }
    }

    /// Append an element under `parent`
    pub fn add(&mut self, parent: NodeId, tag: impl Into<String>, width: f64) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(LayoutNode {
            tag: tag.into(),
            width,
            parent: Some(parent),
            children: Vec::new(),
            attributes: Vec::new(),
            hidden: false,
            pinned: false,
        });
        if let Some(node) = self.nodes.get_mut(parent as usize) {
            node.children.push(id);
        }
        id
    }

    /// Set an attribute rendered in the opening tag
    pub fn set_attribute(&mut self, node: NodeId, name: impl Into<String>, value: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(node as usize) {
            node.attributes.push((name.into(), value.into()));
        }
    }

    /// Whether the node currently has `display: none` forced
    #[must_use]
    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.nodes.get(node as usize).is_some_and(|n| n.hidden)
    }

    /// Whether the node currently has its `min-height` pinned
    #[must_use]
    pub fn is_pinned(&self, node: NodeId) -> bool {
        self.nodes.get(node as usize).is_some_and(|n| n.pinned)
    }

    fn is_visible(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            match self.nodes.get(id as usize) {
                Some(n) if n.hidden => return false,
                Some(n) => current = n.parent,
                None => return false,
            }
        }
        true
    }

    /// Whether any visible node is wider than the viewport
    #[must_use]
    pub fn overflows_now(&self) -> bool {
        (0..self.nodes.len() as NodeId)
            .any(|id| self.is_visible(id) && self.node(id).is_ok_and(|n| n.width > self.viewport_width))
    }

    fn node(&self, id: NodeId) -> AuditResult<&LayoutNode> {
        self.nodes
            .get(id as usize)
            .ok_or_else(|| AuditError::evaluation(format!("unknown node {id}")))
    }

    fn node_mut(&mut self, id: NodeId) -> AuditResult<&mut LayoutNode> {
        self.nodes
            .get_mut(id as usize)
            .ok_or_else(|| AuditError::evaluation(format!("unknown node {id}")))
    }

    fn render_opening_tag(&self, id: NodeId) -> AuditResult<String> {
        let node = self.node(id)?;
        let attributes: String = node
            .attributes
            .iter()
            .map(|(name, value)| format!(" {name}=\"{value}\""))
            .collect();
        Ok(format!("<{}{attributes}>", node.tag))
    }

    fn sibling_after(&self, id: NodeId) -> AuditResult<Option<NodeId>> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(None);
        };
        let siblings = &self.node(parent)?.children;
        Ok(siblings
            .iter()
            .position(|&s| s == id)
            .and_then(|i| siblings.get(i + 1))
            .copied())
    }

    /// Answer one `tree-*` operation the way the page script would
    fn apply(&mut self, op: &str, node: Option<NodeId>) -> AuditResult<Value> {
        let target = || node.ok_or_else(|| AuditError::evaluation(format!("{op} needs a node")));
        match op {
            "tree-root" => Ok(json!({ "node": 0 })),
            "tree-overflows" => Ok(json!({ "overflows": self.overflows_now() })),
            "tree-hide" => {
                self.node_mut(target()?)?.hidden = true;
                Ok(json!({ "ok": true }))
            }
            "tree-show" => {
                self.node_mut(target()?)?.hidden = false;
                Ok(json!({ "ok": true }))
            }
            "tree-pin" => {
                self.node_mut(target()?)?.pinned = true;
                Ok(json!({ "ok": true }))
            }
            "tree-unpin" => {
                self.node_mut(target()?)?.pinned = false;
                Ok(json!({ "ok": true }))
            }
            "tree-first-child" => {
                let child = self.node(target()?)?.children.first().copied();
                Ok(json!({ "node": child }))
            }
            "tree-next-sibling" => Ok(json!({ "node": self.sibling_after(target()?)? })),
            "tree-opening-tag" => Ok(json!({ "tag": self.render_opening_tag(target()?)? })),
            "tree-release" => Ok(json!({ "ok": true })),
            other => Err(AuditError::evaluation(format!("unsupported tree op: {other}"))),
        }
    }
}

#[async_trait]
impl RenderTree for MockLayout {
    async fn root(&mut self) -> AuditResult<NodeId> {
        Ok(0)
    }

    async fn overflows(&mut self) -> AuditResult<bool> {
        Ok(self.overflows_now())
    }

    async fn hide(&mut self, node: NodeId) -> AuditResult<()> {
        self.node_mut(node)?.hidden = true;
        Ok(())
    }

    async fn show(&mut self, node: NodeId) -> AuditResult<()> {
        self.node_mut(node)?.hidden = false;
        Ok(())
    }

    async fn pin_min_height(&mut self, node: NodeId) -> AuditResult<()> {
        self.node_mut(node)?.pinned = true;
        Ok(())
    }

    async fn unpin_min_height(&mut self, node: NodeId) -> AuditResult<()> {
        self.node_mut(node)?.pinned = false;
        Ok(())
    }

    async fn first_child(&mut self, node: NodeId) -> AuditResult<Option<NodeId>> {
        Ok(self.node(node)?.children.first().copied())
    }

    async fn next_sibling(&mut self, node: NodeId) -> AuditResult<Option<NodeId>> {
        self.sibling_after(node)
    }

    async fn opening_tag(&mut self, node: NodeId) -> AuditResult<String> {
        self.render_opening_tag(node)
    }
}

// =============================================================================
// Page
// =============================================================================

/// Everything the checks can observe on one rendered page
#[derive(Debug, Clone)]
pub struct MockPage {
    /// Answer to the `snapshot` script
    pub snapshot: DomSnapshot,
    /// Answer to the `viewport` script
    pub viewport: ViewportMeta,
    /// Tree behind the `tree-*` scripts
    pub layout: MockLayout,
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPage {
    /// A page that passes every check
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: DomSnapshot::with_document(),
            viewport: ViewportMeta::with_content("width=device-width, initial-scale=1"),
            layout: MockLayout::default(),
        }
    }

    /// Replace the element snapshot
    #[must_use]
    pub fn with_snapshot(mut self, snapshot: DomSnapshot) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Replace the viewport meta tag
    #[must_use]
    pub fn with_viewport(mut self, viewport: ViewportMeta) -> Self {
        self.viewport = viewport;
        self
    }

    /// Replace the layout
    #[must_use]
    pub fn with_layout(mut self, layout: MockLayout) -> Self {
        self.layout = layout;
        self
    }
}

// =============================================================================
// Driver
// =============================================================================

#[derive(Debug, Clone)]
struct InjectedFailure {
    device: Option<String>,
    op_prefix: String,
}

/// Mock driver for unit testing
#[derive(Debug)]
pub struct MockDriver {
    page: MockPage,
    device_pages: HashMap<String, MockPage>,
    responses: HashMap<String, Value>,
    failures: Vec<InjectedFailure>,
    user_agent: String,
    /// Every device applied, in order
    pub emulated: Vec<DeviceDescriptor>,
    /// Call history for verification
    pub call_history: Vec<String>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Driver showing a clean page on every device
    #[must_use]
    pub fn new() -> Self {
        Self::with_page(MockPage::new())
    }

    /// Driver showing `page` on every device
    #[must_use]
    pub fn with_page(page: MockPage) -> Self {
        Self {
            page,
            device_pages: HashMap::new(),
            responses: HashMap::new(),
            failures: Vec::new(),
            user_agent: MOCK_USER_AGENT.to_string(),
            emulated: Vec::new(),
            call_history: Vec::new(),
        }
    }

    /// Show `page` while the named device is emulated
    #[must_use]
    pub fn with_device_page(mut self, device: impl Into<String>, page: MockPage) -> Self {
        self.device_pages.insert(device.into(), page);
        self
    }

    /// Override the default user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Answer scripts tagged `op` with a fixed value.
    ///
    /// `op` may be given with or without the marker prefix.
    pub fn respond(&mut self, op: &str, value: Value) {
        let op = op.strip_prefix(SCRIPT_MARKER).unwrap_or(op);
        self.responses.insert(op.to_string(), value);
    }

    /// Fail operations starting with `op_prefix`, on one device or all.
    ///
    /// `"emulate"` makes emulation itself fail.
    pub fn fail_on(&mut self, device: Option<&str>, op_prefix: &str) {
        self.failures.push(InjectedFailure {
            device: device.map(str::to_string),
            op_prefix: op_prefix.to_string(),
        });
    }

    /// The device applied last
    #[must_use]
    pub fn current_device(&self) -> Option<&DeviceDescriptor> {
        self.emulated.last()
    }

    /// The page visible under the current device
    #[must_use]
    pub fn current_page(&self) -> &MockPage {
        self.current_device()
            .and_then(|d| self.device_pages.get(&d.name))
            .unwrap_or(&self.page)
    }

    fn current_page_mut(&mut self) -> &mut MockPage {
        let name = self.emulated.last().map(|d| d.name.clone());
        match name {
            Some(name) if self.device_pages.contains_key(&name) => self
                .device_pages
                .get_mut(&name)
                .unwrap_or(&mut self.page),
            _ => &mut self.page,
        }
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    fn injected_failure(&self, device: Option<&str>, op: &str) -> bool {
        self.failures.iter().any(|f| {
            op.starts_with(&f.op_prefix)
                && f.device
                    .as_deref()
                    .map_or(true, |name| device == Some(name))
        })
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn emulate(&mut self, device: &DeviceDescriptor) -> AuditResult<()> {
        self.call_history.push(format!("emulate:{}", device.name));
        if self.injected_failure(Some(device.name.as_str()), "emulate") {
            return Err(AuditError::EmulationError {
                device: device.name.clone(),
                message: "injected failure".to_string(),
            });
        }
        self.emulated.push(device.clone());
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> AuditResult<Value> {
        let op = script_op(script)
            .ok_or_else(|| AuditError::evaluation("script carries no operation marker"))?
            .to_string();
        self.call_history.push(op.clone());

        let device = self.current_device().map(|d| d.name.clone());
        if self.injected_failure(device.as_deref(), &op) {
            return Err(AuditError::evaluation(format!("injected failure in {op}")));
        }

        if let Some(value) = self.responses.get(&op) {
            return Ok(value.clone());
        }

        let page = self.current_page_mut();
        match op.as_str() {
            "snapshot" => Ok(serde_json::to_value(page.snapshot.without_markup())?),
            "snapshot-images" => Ok(serde_json::to_value(
                page.snapshot.image_scope().without_markup(),
            )?),
            request if request.starts_with("markup:") => {
                let markup: Vec<Option<String>> = request["markup:".len()..]
                    .split(',')
                    .filter(|index| !index.is_empty())
                    .map(|index| {
                        index
                            .parse::<usize>()
                            .map(|i| page.snapshot.get(i).and_then(|e| e.outer_html.clone()))
                            .map_err(|e| AuditError::evaluation(format!("bad index in {request}: {e}")))
                    })
                    .collect::<AuditResult<_>>()?;
                Ok(json!({ "markup": markup }))
            }
            "viewport" => Ok(serde_json::to_value(&page.viewport)?),
            tree if tree.starts_with("tree-") => {
                let (name, node) = match tree.split_once(':') {
                    Some((name, id)) => {
                        let id = id.parse::<NodeId>().map_err(|e| {
                            AuditError::evaluation(format!("bad node id in {tree}: {e}"))
                        })?;
                        (name, Some(id))
                    }
                    None => (tree, None),
                };
                page.layout.apply(name, node)
            }
            other => Err(AuditError::evaluation(format!("no mock answer for {other}"))),
        }
    }

    async fn default_user_agent(&mut self) -> AuditResult<String> {
        self.call_history.push("default_user_agent".to_string());
        Ok(self.user_agent.clone())
    }
}
