//! AST dump rendering for the `-d`/`-t` pipeline options (spec.md §6),
//! grounded on the teacher crate's `ptree`-based tree printing
//! (`src/ast_node.rs`'s `TreeItem` impl for `ASTNode`) and on
//! `original_source/zebu/node.go`'s `walkdump`/`walkstring` labels.

use std::borrow::Cow;
use std::io;

use ptree::{Style, TreeItem};

use crate::arena::{Arena, NodeId, NodeKind};
use crate::interner::{LiteralTable, SymbolTable};

#[derive(Clone)]
pub struct DumpNode<'a> {
    arena: &'a Arena,
    symbols: &'a SymbolTable,
    literals: &'a LiteralTable,
    id: NodeId,
}

impl<'a> DumpNode<'a> {
    pub fn new(arena: &'a Arena, symbols: &'a SymbolTable, literals: &'a LiteralTable, id: NodeId) -> Self {
        Self { arena, symbols, literals, id }
    }

    fn label(&self) -> String {
        match self.arena.kind(self.id) {
            NodeKind::NoName { sym } => format!("NONAME {}", self.symbols.get(*sym).name),
            NodeKind::Grammar { sym, .. } => format!("GRAMMAR {}", self.symbols.get(*sym).name),
            NodeKind::Rule { sym, .. } => format!("RULE {}", self.symbols.get(*sym).name),
            NodeKind::RegDef { sym, .. } => format!("REGDEF {}", self.symbols.get(*sym).name),
            NodeKind::Prod { .. } => "PROD".to_string(),
            NodeKind::Alt { .. } => "ALT".to_string(),
            NodeKind::Cat { .. } => "CAT".to_string(),
            NodeKind::Kleene { .. } => "KLEENE *".to_string(),
            NodeKind::Plus { .. } => "PLUS +".to_string(),
            NodeKind::Repeat { lb, ub, .. } => format!("REPEAT {{{},{}}}", lb, ub),
            NodeKind::Class { neg, .. } => format!("CLASS{}", if *neg { " neg" } else { "" }),
            NodeKind::Range { lo, hi } => format!("RANGE {}-{}", *lo as char, *hi as char),
            NodeKind::Char { byte } => format!("CHAR {}", *byte as char),
            NodeKind::StrLit { lit } => format!("STRLIT '{}'", self.literals.get(*lit).content),
            NodeKind::Epsilon => "EPSILON".to_string(),
            NodeKind::Type { .. } => "TYPE".to_string(),
            NodeKind::Action { deps, .. } => format!("ACTION deps={}", deps.len()),
        }
    }

    fn child_ids(&self) -> Vec<NodeId> {
        match self.arena.kind(self.id) {
            NodeKind::Grammar { decls, .. } => decls.clone(),
            NodeKind::Rule { prods, .. } => prods.clone(),
            NodeKind::RegDef { body, .. } => vec![*body],
            NodeKind::Prod { elems } => elems.iter().map(|e| e.left).collect(),
            NodeKind::Alt { left, right } | NodeKind::Cat { left, right } => vec![*left, *right],
            NodeKind::Kleene { inner } | NodeKind::Plus { inner } | NodeKind::Repeat { inner, .. } => vec![*inner],
            NodeKind::Class { members, .. } => members.clone(),
            _ => Vec::new(),
        }
    }
}

impl<'a> TreeItem for DumpNode<'a> {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, _style: &Style) -> io::Result<()> {
        write!(f, "{}", self.label())
    }

    fn children(&self) -> Cow<[Self::Child]> {
        let kids: Vec<DumpNode<'a>> = self
            .child_ids()
            .into_iter()
            .map(|id| DumpNode::new(self.arena, self.symbols, self.literals, id))
            .collect();
        Cow::Owned(kids)
    }
}

pub fn dump_tree(arena: &Arena, symbols: &SymbolTable, literals: &LiteralTable, root: NodeId) -> io::Result<()> {
    let node = DumpNode::new(arena, symbols, literals, root);
    ptree::print_tree(&node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use crate::util::Log;
    use std::rc::Rc;

    #[test]
    fn dump_tree_renders_without_error() {
        let out = parse_file(Rc::from("g.llg"), "grammar g; start: 'x' | ;", Log::None);
        assert!(!out.diagnostics.has_errors());
        let root = out.root.unwrap();
        assert!(dump_tree(&out.arena, &out.symbols, &out.literals, root).is_ok());
    }
}
