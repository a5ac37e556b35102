//! Terminal host - Paints the host tree as an indented outline.
//!
//! `TerminalHost` keeps its nodes in a [`MemoryHost`] and draws them with
//! crossterm. Each attached node gets one row; text inherits the style
//! attributes (`bold`, `dim`, `italic`, `underline`) of its ancestors.
//!
//! Painting records which node owns which row, so mouse clicks coming back
//! from crossterm can be routed to that node's `click` listeners.
//!
//! # Example
//!
//! ```ignore
//! let mut host = TerminalHost::new();
//! let container = host.create_container("root");
//! let mut renderer = Renderer::new(host);
//! renderer.render(app, container);
//! renderer.flush()?;
//! renderer.host_mut().paint(&mut std::io::stdout(), container)?;
//! ```

use std::io::Write;

use bitflags::bitflags;
use crossterm::cursor::MoveTo;
use crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEventKind, MouseButton, MouseEventKind};
use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{Clear, ClearType};

use super::memory::{MemoryHost, NodeId};
use super::{HostAdapter, HostError};
use crate::element::{Event, Listener, NODE_VALUE, PropValue, TEXT_ELEMENT};

/// Columns of indentation per tree level.
pub const INDENT: u16 = 2;

// =============================================================================
// Attributes
// =============================================================================

bitflags! {
    /// Text attributes resolved from boolean props.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Attr: u8 {
        const NONE = 0;
        const BOLD = 1 << 0;
        const DIM = 1 << 1;
        const ITALIC = 1 << 2;
        const UNDERLINE = 1 << 3;
    }
}

const ATTR_PROPS: [(&str, Attr, Attribute); 4] = [
    ("bold", Attr::BOLD, Attribute::Bold),
    ("dim", Attr::DIM, Attribute::Dim),
    ("italic", Attr::ITALIC, Attribute::Italic),
    ("underline", Attr::UNDERLINE, Attribute::Underlined),
];

// =============================================================================
// Hit Rows
// =============================================================================

/// Row-to-node map filled while painting.
#[derive(Debug, Default)]
pub struct HitRows {
    rows: Vec<NodeId>,
}

impl HitRows {
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Claim the next row for `node`.
    pub fn push(&mut self, node: NodeId) -> u16 {
        self.rows.push(node);
        u16::try_from(self.rows.len() - 1).unwrap_or(u16::MAX)
    }

    pub fn get(&self, row: u16) -> Option<NodeId> {
        self.rows.get(usize::from(row)).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One painted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub node: NodeId,
    pub column: u16,
    pub label: String,
    pub attrs: Attr,
}

// =============================================================================
// Terminal Host
// =============================================================================

/// Terminal adapter over a [`MemoryHost`] node tree.
///
/// Inherits the inner tree's storage policy: removed nodes are never
/// reclaimed, so a long-lived host grows with every node it ever created.
#[derive(Debug, Default)]
pub struct TerminalHost {
    tree: MemoryHost,
    hit_rows: HitRows,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_container(&mut self, element_type: &str) -> NodeId {
        self.tree.create_container(element_type)
    }

    pub fn tree(&self) -> &MemoryHost {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut MemoryHost {
        &mut self.tree
    }

    pub fn hit_rows(&self) -> &HitRows {
        &self.hit_rows
    }

    /// Lay out everything attached below `root` (the root itself is not drawn).
    pub fn layout(&self, root: NodeId) -> Vec<Line> {
        self.tree
            .subtree(root)
            .into_iter()
            .skip(1)
            .map(|(node, depth)| Line {
                node,
                column: u16::try_from(depth - 1)
                    .unwrap_or(u16::MAX)
                    .saturating_mul(INDENT),
                label: self.label(node),
                attrs: self.inherited_attrs(node),
            })
            .collect()
    }

    /// Clear the screen and draw the tree under `root`.
    pub fn paint<W: Write>(&mut self, out: &mut W, root: NodeId) -> Result<(), HostError> {
        let lines = self.layout(root);
        self.hit_rows.clear();

        queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
        for line in &lines {
            let row = self.hit_rows.push(line.node);
            queue!(out, MoveTo(line.column, row))?;
            for (_, flag, attribute) in ATTR_PROPS {
                if line.attrs.contains(flag) {
                    queue!(out, SetAttribute(attribute))?;
                }
            }
            queue!(out, Print(&line.label), SetAttribute(Attribute::Reset))?;
        }
        out.flush()?;

        tracing::debug!(rows = lines.len(), "painted host tree");
        Ok(())
    }

    /// Route a crossterm event into the tree under `root`.
    ///
    /// A left mouse press is delivered as `click` to the node painted on that
    /// row and bubbles to its ancestors. A key press is broadcast as
    /// `keydown` with the key name as detail. Returns how many listeners ran.
    pub fn route_event(&self, root: NodeId, event: &CrosstermEvent) -> usize {
        match event {
            CrosstermEvent::Mouse(mouse) => match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => self
                    .hit_rows
                    .get(mouse.row)
                    .map_or(0, |node| self.tree.dispatch_bubbling(node, &Event::new("click"))),
                _ => 0,
            },
            CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => {
                let event = Event::new("keydown").with_detail(key_name(key.code));
                self.tree.broadcast(root, &event)
            }
            _ => 0,
        }
    }

    fn label(&self, node: NodeId) -> String {
        let element_type = self.tree.element_type(node).unwrap_or_default();
        if element_type == TEXT_ELEMENT {
            return self
                .tree
                .property(node, NODE_VALUE)
                .map(PropValue::to_string)
                .unwrap_or_default();
        }
        match self.tree.property(node, "id").filter(|id| !id.is_empty()) {
            Some(id) => format!("{element_type}#{id}"),
            None => element_type.to_string(),
        }
    }

    fn inherited_attrs(&self, node: NodeId) -> Attr {
        let mut attrs = Attr::NONE;
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            for (name, flag, _) in ATTR_PROPS {
                if self.tree.property(id, name).and_then(PropValue::as_bool) == Some(true) {
                    attrs |= flag;
                }
            }
            cursor = self.tree.parent(id);
        }
        attrs
    }
}

/// Key name in the same vocabulary as DOM `KeyboardEvent.key`.
pub fn key_name(code: KeyCode) -> String {
    match code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::Esc => "Escape".to_string(),
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::Home => "Home".to_string(),
        KeyCode::End => "End".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        _ => "Unidentified".to_string(),
    }
}

// =============================================================================
// Adapter
// =============================================================================

impl HostAdapter for TerminalHost {
    type Node = NodeId;

    fn create_node(&mut self, element_type: &str) -> Result<NodeId, HostError> {
        self.tree.create_node(element_type)
    }

    fn set_property(
        &mut self,
        node: &NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        self.tree.set_property(node, name, value)
    }

    fn add_listener(
        &mut self,
        node: &NodeId,
        event_type: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        self.tree.add_listener(node, event_type, listener)
    }

    fn remove_listener(
        &mut self,
        node: &NodeId,
        event_type: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        self.tree.remove_listener(node, event_type, listener)
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.tree.append_child(parent, child)
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.tree.remove_child(parent, child)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers, MouseEvent};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sample(host: &mut TerminalHost) -> (NodeId, NodeId, NodeId) {
        let root = host.create_container("root");
        let div = host.create_node("div").unwrap();
        host.set_property(&div, "bold", &true.into()).unwrap();
        host.set_property(&div, "id", &"app".into()).unwrap();
        let text = host.create_node(TEXT_ELEMENT).unwrap();
        host.set_property(&text, NODE_VALUE, &"Click".into()).unwrap();
        host.append_child(&div, &text).unwrap();
        host.append_child(&root, &div).unwrap();
        (root, div, text)
    }

    #[test]
    fn test_layout_indents_and_inherits() {
        let mut host = TerminalHost::new();
        let (root, div, text) = sample(&mut host);

        let lines = host.layout(root);
        assert_eq!(
            lines,
            vec![
                Line {
                    node: div,
                    column: 0,
                    label: "div#app".to_string(),
                    attrs: Attr::BOLD,
                },
                Line {
                    node: text,
                    column: INDENT,
                    label: "Click".to_string(),
                    attrs: Attr::BOLD,
                },
            ]
        );
    }

    #[test]
    fn test_paint_writes_labels_and_hit_rows() {
        let mut host = TerminalHost::new();
        let (root, div, text) = sample(&mut host);

        let mut out = Vec::new();
        host.paint(&mut out, root).unwrap();
        let painted = String::from_utf8_lossy(&out);

        assert!(painted.contains("div#app"));
        assert!(painted.contains("Click"));
        assert_eq!(host.hit_rows().len(), 2);
        assert_eq!(host.hit_rows().get(0), Some(div));
        assert_eq!(host.hit_rows().get(1), Some(text));
        assert_eq!(host.hit_rows().get(2), None);
    }

    #[test]
    fn test_click_routes_to_painted_row() {
        let mut host = TerminalHost::new();
        let (root, div, _) = sample(&mut host);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let listener = Listener::new(move |event| log.borrow_mut().push(event.event_type.clone()));
        host.add_listener(&div, "click", &listener).unwrap();
        host.paint(&mut Vec::new(), root).unwrap();

        // Row 1 is the text node; the click bubbles to the div.
        let click = CrosstermEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 4,
            row: 1,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(host.route_event(root, &click), 1);
        assert_eq!(seen.borrow().as_slice(), ["click"]);

        let miss = CrosstermEvent::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 9,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(host.route_event(root, &miss), 0);
    }

    #[test]
    fn test_key_broadcast() {
        let mut host = TerminalHost::new();
        let (root, div, _) = sample(&mut host);

        let keys = Rc::new(RefCell::new(Vec::new()));
        let log = keys.clone();
        let listener = Listener::new(move |event: &Event| {
            log.borrow_mut().push(event.detail.clone());
        });
        host.add_listener(&div, "keydown", &listener).unwrap();

        let enter = CrosstermEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(host.route_event(root, &enter), 1);
        assert_eq!(keys.borrow().as_slice(), [Some(PropValue::from("Enter"))]);
    }

    #[test]
    fn test_key_name() {
        assert_eq!(key_name(KeyCode::Char('q')), "q");
        assert_eq!(key_name(KeyCode::Up), "ArrowUp");
        assert_eq!(key_name(KeyCode::F(5)), "F5");
        assert_eq!(key_name(KeyCode::CapsLock), "Unidentified");
    }
}
