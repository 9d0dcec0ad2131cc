//! Interning tables for grammars, symbols, and string literals (spec.md §4.1).
//!
//! Handles are assigned per `(name, grammar)` pair and are never fused: two
//! distinct pairs always get distinct ids, and re-interning the same pair
//! always returns the id already assigned to it.

use std::collections::HashMap;
use std::rc::Rc;

use crate::arena::NodeId;
use crate::lexer::token::TokenKind;
use crate::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrammarId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LiteralId(pub usize);

#[derive(Debug, Clone)]
pub struct Grammar {
    pub name: Rc<str>,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: Rc<str>,
    pub pos: Position,
    pub grammar: GrammarId,
    pub lexical: TokenKind,
    pub defn: Option<NodeId>,
    /// In-scope flag for a `VARID` symbol while the parser walks the
    /// production that bound it (spec.md §4.3 "variable-id scoping").
    pub defv: bool,
}

#[derive(Debug, Clone)]
pub struct Literal {
    pub content: Rc<str>,
    pub grammar: GrammarId,
    pub defn: Option<NodeId>,
}

/// Names preloaded with a fixed lexical kind before any source is read
/// (spec.md §4.1).
const RESERVED_KEYWORDS: &[(&str, TokenKind)] = &[
    ("grammar", TokenKind::Grammar),
    ("import", TokenKind::Import),
    ("keyword", TokenKind::Keyword),
    ("extend", TokenKind::Extend),
    ("inherit", TokenKind::Inherit),
    ("override", TokenKind::Override),
    ("delete", TokenKind::Delete),
    ("modify", TokenKind::Modify),
];

pub struct GrammarTable {
    grammars: Vec<Grammar>,
    by_name: HashMap<Rc<str>, GrammarId>,
    pub local: GrammarId,
}

impl GrammarTable {
    pub fn new() -> Self {
        let mut table = Self {
            grammars: Vec::new(),
            by_name: HashMap::new(),
            local: GrammarId(0),
        };
        table.local = table.lookup("_");
        table
    }

    pub fn lookup(&mut self, name: &str) -> GrammarId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let name: Rc<str> = Rc::from(name);
        let id = GrammarId(self.grammars.len());
        self.grammars.push(Grammar { name: name.clone() });
        self.by_name.insert(name, id);
        id
    }

    pub fn get(&self, id: GrammarId) -> &Grammar {
        &self.grammars[id.0]
    }
}

pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_key: HashMap<(Rc<str>, GrammarId), SymbolId>,
}

impl SymbolTable {
    pub fn new(local: GrammarId) -> Self {
        let mut table = Self {
            symbols: Vec::new(),
            by_key: HashMap::new(),
        };
        for (name, kind) in RESERVED_KEYWORDS {
            let id = table.lookup_in(name, local);
            table.symbols[id.0].lexical = *kind;
        }
        table
    }

    /// `lookup(name) -> Symbol` against the local (implicit) grammar.
    pub fn lookup_local(&mut self, name: &str, local: GrammarId) -> SymbolId {
        self.lookup_in(name, local)
    }

    /// `lookup(name, grammar) -> Symbol`.
    pub fn lookup_in(&mut self, name: &str, grammar: GrammarId) -> SymbolId {
        let key_name: Rc<str> = Rc::from(name);
        if let Some(id) = self.by_key.get(&(key_name.clone(), grammar)) {
            return *id;
        }
        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol {
            name: key_name.clone(),
            pos: Position::synthetic(),
            grammar,
            lexical: TokenKind::Name,
            defn: None,
            defv: false,
        });
        self.by_key.insert((key_name, grammar), id);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }
}

pub struct LiteralTable {
    literals: Vec<Literal>,
    by_key: HashMap<(Rc<str>, GrammarId), LiteralId>,
}

impl LiteralTable {
    pub fn new() -> Self {
        Self {
            literals: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    pub fn lookup_in(&mut self, content: &str, grammar: GrammarId) -> LiteralId {
        let key_content: Rc<str> = Rc::from(content);
        if let Some(id) = self.by_key.get(&(key_content.clone(), grammar)) {
            return *id;
        }
        let id = LiteralId(self.literals.len());
        self.literals.push(Literal {
            content: key_content.clone(),
            grammar,
            defn: None,
        });
        self.by_key.insert((key_content, grammar), id);
        id
    }

    pub fn get(&self, id: LiteralId) -> &Literal {
        &self.literals[id.0]
    }

    pub fn get_mut(&mut self, id: LiteralId) -> &mut Literal {
        &mut self.literals[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_and_grammar_returns_same_handle() {
        let mut grammars = GrammarTable::new();
        let g = grammars.local;
        let mut symbols = SymbolTable::new(g);
        let a = symbols.lookup_in("start", g);
        let b = symbols.lookup_in("start", g);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_grammars_never_fuse_handles() {
        let mut grammars = GrammarTable::new();
        let g1 = grammars.local;
        let g2 = grammars.lookup("other");
        let mut symbols = SymbolTable::new(g1);
        let a = symbols.lookup_in("start", g1);
        let b = symbols.lookup_in("start", g2);
        assert_ne!(a, b);
    }

    #[test]
    fn reserved_keywords_carry_their_lexical_kind() {
        let mut grammars = GrammarTable::new();
        let g = grammars.local;
        let mut symbols = SymbolTable::new(g);
        let id = symbols.lookup_in("import", g);
        assert_eq!(symbols.get(id).lexical, TokenKind::Import);
    }

    #[test]
    fn literals_intern_by_content_and_grammar() {
        let mut grammars = GrammarTable::new();
        let mut lits = LiteralTable::new();
        let g = grammars.local;
        let a = lits.lookup_in("x", g);
        let b = lits.lookup_in("x", g);
        let c = lits.lookup_in("y", g);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
