//! Grid Navigation
//!
//! Arrow-key state machine for GRID and TREEGRID widgets. The navigator is
//! rebuilt from the tree on every key press: grid, sections, rows, cells.
//! Resolving a key is pure; applying the result moves the roving tab stop,
//! requests focus or dispatches an expand/collapse/activation event.

use parallax_dom::{Key, KeyboardInput};

use crate::arena::NodeId;
use crate::capability::{self, KeyContext, KeyOutcome};
use crate::focus::{self, TabIndex};
use crate::role::Role;
use crate::scene::{SceneEvent, SceneGraph};
use crate::tree::AccessibilityTree;

/// One row of a grid
#[derive(Debug, Clone)]
pub struct GridRow {
    pub node: NodeId,
    /// Nesting depth; `aria-level`, 0 when unset
    pub level: i32,
    /// `None` when the row is not expandable
    pub expanded: Option<bool>,
    pub cells: Vec<NodeId>,
}

/// A TABLEHEAD, TABLEBODY or TABLEFOOT and its rows
#[derive(Debug, Clone)]
pub struct GridSection {
    pub node: NodeId,
    pub rows: Vec<GridRow>,
}

/// Focus position inside a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPosition {
    pub section: usize,
    pub row: usize,
    /// `None` when the row itself is focused
    pub col: Option<usize>,
}

/// What a key press resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum GridMove {
    /// Key not applicable here
    Unhandled,
    /// Key consumed, focus stays put
    Stay,
    Focus(NodeId),
    Dispatch(NodeId, SceneEvent),
}

/// Snapshot of a grid's structure
#[derive(Debug, Clone)]
pub struct GridNavigator {
    grid: NodeId,
    tree_grid: bool,
    sections: Vec<GridSection>,
}

impl GridNavigator {
    /// Build from a GRID or TREEGRID node
    pub fn build(tree: &AccessibilityTree, grid: NodeId) -> Option<Self> {
        let role = tree.role(grid).filter(Role::is_grid)?;
        let sections = tree
            .children(grid)
            .iter()
            .filter(|s| tree.role(**s).is_some_and(|r| r.is_section()))
            .map(|&section| GridSection {
                node: section,
                rows: tree
                    .children(section)
                    .iter()
                    .filter(|r| tree.role(**r) == Some(Role::Row))
                    .map(|&row| {
                        let attrs = tree.attributes(row);
                        GridRow {
                            node: row,
                            level: attrs.and_then(|a| a.level()).unwrap_or(0),
                            expanded: attrs.and_then(|a| a.expanded()),
                            cells: tree
                                .children(row)
                                .iter()
                                .copied()
                                .filter(|c| tree.role(*c).is_some_and(|r| r.is_cell()))
                                .collect(),
                        }
                    })
                    .collect(),
            })
            .collect();
        Some(Self { grid, tree_grid: role == Role::TreeGrid, sections })
    }

    /// Navigator for the grid enclosing `node`
    pub fn containing(tree: &AccessibilityTree, node: NodeId) -> Option<Self> {
        std::iter::once(node)
            .chain(tree.ancestors(node))
            .find(|n| tree.role(*n).is_some_and(|r| r.is_grid()))
            .and_then(|grid| Self::build(tree, grid))
    }

    pub fn grid(&self) -> NodeId {
        self.grid
    }

    pub fn is_tree_grid(&self) -> bool {
        self.tree_grid
    }

    pub fn sections(&self) -> &[GridSection] {
        &self.sections
    }

    pub fn row(&self, section: usize, row: usize) -> Option<&GridRow> {
        self.sections.get(section)?.rows.get(row)
    }

    /// Locate a row or cell
    pub fn position_of(&self, node: NodeId) -> Option<GridPosition> {
        self.sections.iter().enumerate().find_map(|(s, section)| {
            section.rows.iter().enumerate().find_map(|(r, row)| {
                if row.node == node {
                    return Some(GridPosition { section: s, row: r, col: None });
                }
                row.cells
                    .iter()
                    .position(|c| *c == node)
                    .map(|c| GridPosition { section: s, row: r, col: Some(c) })
            })
        })
    }

    pub fn node_at(&self, pos: GridPosition) -> Option<NodeId> {
        let row = self.row(pos.section, pos.row)?;
        match pos.col {
            Some(col) => row.cells.get(col).copied(),
            None => Some(row.node),
        }
    }

    /// Resolve a key press at `pos`
    pub fn resolve(
        &self,
        tree: &AccessibilityTree,
        scene: &dyn SceneGraph,
        pos: GridPosition,
        key: &Key,
    ) -> GridMove {
        let Some(row) = self.row(pos.section, pos.row) else {
            return GridMove::Unhandled;
        };
        match (key, pos.col) {
            (Key::ArrowUp, col) => self.vertical(tree, scene, pos, col, Direction::Backward),
            (Key::ArrowDown, col) => self.vertical(tree, scene, pos, col, Direction::Forward),
            (Key::Home, _) => focus_or_stay(row.cells.first().copied()),
            (Key::End, _) => focus_or_stay(row.cells.last().copied()),

            // Row focused
            (Key::ArrowRight, None) => match row.expanded {
                Some(false) if self.tree_grid => GridMove::Dispatch(row.node, SceneEvent::ExpandRow),
                Some(_) if !self.tree_grid => GridMove::Dispatch(row.node, SceneEvent::KeyboardClick),
                _ => focus_or_stay(row.cells.first().copied()),
            },
            (Key::ArrowLeft, None) => match row.expanded {
                Some(true) if self.tree_grid => GridMove::Dispatch(row.node, SceneEvent::CollapseRow),
                Some(_) if !self.tree_grid => GridMove::Dispatch(row.node, SceneEvent::KeyboardClick),
                _ if self.tree_grid => focus_or_stay(self.parent_row(pos)),
                _ => GridMove::Stay,
            },

            // Cell focused
            (Key::ArrowRight, Some(col)) => focus_or_stay(row.cells.get(col + 1).copied()),
            (Key::ArrowLeft, Some(0)) => {
                let row_focusable = tree.attributes(row.node).is_some_and(|a| TabIndex::of(a).is_defined());
                focus_or_stay(Some(row.node).filter(|_| row_focusable))
            }
            (Key::ArrowLeft, Some(col)) => focus_or_stay(row.cells.get(col - 1).copied()),

            _ => GridMove::Unhandled,
        }
    }

    /// Nearest preceding row with a strictly lower level
    fn parent_row(&self, pos: GridPosition) -> Option<NodeId> {
        let level = self.row(pos.section, pos.row)?.level;
        let same_section = self.sections[pos.section].rows[..pos.row].iter().rev();
        let earlier = self.sections[..pos.section].iter().rev().flat_map(|s| s.rows.iter().rev());
        same_section.chain(earlier).find(|r| r.level < level).map(|r| r.node)
    }

    fn rows_from(&self, pos: GridPosition, direction: Direction) -> Vec<&GridRow> {
        let flat: Vec<(usize, usize, &GridRow)> = self
            .sections
            .iter()
            .enumerate()
            .flat_map(|(s, section)| section.rows.iter().enumerate().map(move |(r, row)| (s, r, row)))
            .collect();
        let Some(here) = flat.iter().position(|(s, r, _)| *s == pos.section && *r == pos.row) else {
            return Vec::new();
        };
        match direction {
            Direction::Forward => flat[here + 1..].iter().map(|(_, _, row)| *row).collect(),
            Direction::Backward => flat[..here].iter().rev().map(|(_, _, row)| *row).collect(),
        }
    }

    /// Up/Down: nearest visible row that can take focus, across sections
    fn vertical(
        &self,
        tree: &AccessibilityTree,
        scene: &dyn SceneGraph,
        pos: GridPosition,
        col: Option<usize>,
        direction: Direction,
    ) -> GridMove {
        let target = self.rows_from(pos, direction).into_iter().find_map(|row| {
            if !focus::is_visible(tree, scene, row.node) {
                return None;
            }
            match col {
                Some(col) => row.cells.get(col).copied(),
                None => tree
                    .attributes(row.node)
                    .is_some_and(|a| TabIndex::of(a).is_defined())
                    .then_some(row.node),
            }
        });
        focus_or_stay(target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

fn focus_or_stay(target: Option<NodeId>) -> GridMove {
    target.map_or(GridMove::Stay, GridMove::Focus)
}

/// Key handler for rows and cells
pub fn handle_key(ctx: &mut KeyContext<'_>, node: NodeId, input: &KeyboardInput) -> KeyOutcome {
    let Some(nav) = GridNavigator::containing(ctx.tree, node) else {
        return KeyOutcome::Ignored;
    };
    let Some(pos) = nav.position_of(node) else {
        return KeyOutcome::Ignored;
    };

    let step = nav.resolve(ctx.tree, &*ctx.scene, pos, &input.key);
    tracing::trace!("Grid key {:?} at {:?}: {:?}", input.key, pos, step);
    match step {
        GridMove::Unhandled => KeyOutcome::Ignored,
        GridMove::Stay => KeyOutcome::Handled,
        GridMove::Focus(target) => {
            capability::rove(ctx.tree, node, target);
            ctx.focus(target);
            KeyOutcome::Handled
        }
        GridMove::Dispatch(target, event) => {
            ctx.dispatch(target, event);
            KeyOutcome::Handled
        }
    }
}
