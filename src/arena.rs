//! AST node storage (spec.md §3, §9).
//!
//! Nodes live in a single arena addressed by [`NodeId`]. Forward references
//! create a `NoName` placeholder at a fixed arena slot; when the real
//! definition is later declared, [`Arena::redefine`] overwrites that slot's
//! [`NodeKind`] in place rather than allocating a new node, so every
//! existing reference to the placeholder's `NodeId` transparently becomes a
//! reference to the real definition (spec.md §9 "Cyclic node graphs").

use crate::interner::{LiteralId, SymbolId};
use crate::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// One element inside a production: an optional variable binding and an
/// optional action, attached to the resolved head (`left`).
#[derive(Debug, Clone)]
pub struct ProdElem {
    pub left: NodeId,
    pub var: Option<SymbolId>,
    pub action: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Placeholder for an as-yet-undefined terminal/nonterminal reference.
    NoName { sym: SymbolId },
    Grammar {
        sym: SymbolId,
        start: Option<NodeId>,
        decls: Vec<NodeId>,
    },
    /// Parser rule ("terminal" in this system's confusing convention).
    Rule {
        sym: SymbolId,
        ntype: Option<NodeId>,
        prods: Vec<NodeId>,
        /// Back-pointer to the pre-transformation rule, for diagnostics
        /// raised against rules synthesized by left-factoring/direct
        /// recursion elimination (spec.md §4.6).
        orig: Option<NodeId>,
    },
    /// Lexer regex class ("nonterminal" in this system's convention).
    RegDef {
        sym: SymbolId,
        ntype: Option<NodeId>,
        body: NodeId,
    },
    Prod {
        elems: Vec<ProdElem>,
    },
    Alt { left: NodeId, right: NodeId },
    Cat { left: NodeId, right: NodeId },
    Kleene { inner: NodeId },
    Plus { inner: NodeId },
    Repeat { inner: NodeId, lb: i64, ub: i64 },
    Class { neg: bool, members: Vec<NodeId> },
    Range { lo: u8, hi: u8 },
    Char { byte: u8 },
    StrLit { lit: LiteralId },
    Epsilon,
    /// Opaque type-expression bytes, passed through verbatim to emission.
    Type { bytes: Vec<u8> },
    /// Opaque action-code bytes plus the `VARID`s it was seen to reference.
    Action { bytes: Vec<u8>, deps: Vec<SymbolId> },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub pos: Position,
    pub kind: NodeKind,
    /// Walker mark used by the resolution-validation pass.
    pub resolved: bool,
    /// Walker mark used by AST dumping to avoid revisiting shared nodes.
    pub pprinted: bool,
}

pub struct Arena {
    nodes: Vec<Node>,
    pub epsilon: NodeId,
}

impl Arena {
    pub fn new() -> Self {
        let mut arena = Self {
            nodes: Vec::new(),
            epsilon: NodeId(0),
        };
        let id = arena.alloc(NodeKind::Epsilon, Position::synthetic());
        arena.epsilon = id;
        arena
    }

    pub fn alloc(&mut self, kind: NodeKind, pos: Position) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            pos,
            kind,
            resolved: false,
            pprinted: false,
        });
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn pos(&self, id: NodeId) -> Position {
        self.nodes[id.0].pos.clone()
    }

    /// Overwrite `id`'s kind/position in place. Used to turn a `NoName`
    /// placeholder into its real definition without disturbing any
    /// already-taken reference to `id`.
    pub fn redefine(&mut self, id: NodeId, kind: NodeKind, pos: Position) {
        let node = &mut self.nodes[id.0];
        node.kind = kind;
        node.pos = pos;
    }

    pub fn is_epsilon(&self, id: NodeId) -> bool {
        id == self.epsilon
    }

    /// Reset a walker mark across every node. Stages must not rely on
    /// marks left behind by an earlier stage (spec.md §5).
    pub fn reset_resolved_marks(&mut self) {
        for node in &mut self.nodes {
            node.resolved = false;
        }
    }

    pub fn reset_pprint_marks(&mut self) {
        for node in &mut self.nodes {
            node.pprinted = false;
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_is_a_stable_singleton() {
        let arena = Arena::new();
        assert!(arena.is_epsilon(arena.epsilon));
        assert!(matches!(arena.kind(arena.epsilon), NodeKind::Epsilon));
    }

    #[test]
    fn redefine_preserves_node_id_identity() {
        let mut arena = Arena::new();
        let sym = SymbolId(0);
        let placeholder = arena.alloc(NodeKind::NoName { sym }, Position::synthetic());
        assert!(matches!(arena.kind(placeholder), NodeKind::NoName { .. }));

        arena.redefine(
            placeholder,
            NodeKind::Rule {
                sym,
                ntype: None,
                prods: Vec::new(),
                orig: None,
            },
            Position::synthetic(),
        );
        assert!(matches!(arena.kind(placeholder), NodeKind::Rule { .. }));
    }
}
