//! Recursive-descent parser for grammar source (spec.md §4.3), grounded on
//! `original_source/zebu/parse.go`'s per-construct dispatch functions
//! (`parseRule`, `parseProd`, `parseRegdef`, ...). Declarations are
//! resolved as they're parsed: a forward reference allocates a `NoName`
//! placeholder which a later matching declaration overwrites in place
//! (spec.md §9; see [`crate::arena::Arena::redefine`]).

pub mod action;
pub mod regex;

use std::rc::Rc;

use crate::arena::{Arena, NodeId, NodeKind, ProdElem};
use crate::diagnostics::{Category, Diagnostics};
use crate::interner::{GrammarId, GrammarTable, LiteralTable, SymbolId, SymbolTable};
use crate::lexer::token::{Token, TokenKind};
use crate::lexer::Lexer;
use crate::position::Position;
use crate::util::Log;

pub struct ParseOutput {
    pub arena: Arena,
    pub grammars: GrammarTable,
    pub symbols: SymbolTable,
    pub literals: LiteralTable,
    pub diagnostics: Diagnostics,
    pub root: Option<NodeId>,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    tok: Token,
    symbols: SymbolTable,
    literals: LiteralTable,
    grammars: GrammarTable,
    arena: Arena,
    diags: Diagnostics,
    log: Log,
    varid_scope: Vec<SymbolId>,
}

/// Parse a whole grammar file. The public entry point the pipeline drives.
pub fn parse_file(file: Rc<str>, src: &str, log: Log) -> ParseOutput {
    let mut grammars = GrammarTable::new();
    let local = grammars.local;
    let mut symbols = SymbolTable::new(local);
    let literals = LiteralTable::new();
    let arena = Arena::new();
    let mut lexer = Lexer::new(file, src, log);
    let mut diags = Diagnostics::new();
    let first = lexer.next(&mut symbols, &mut literals, local, &mut diags);

    let mut parser = Parser {
        lexer,
        tok: first,
        symbols,
        literals,
        grammars,
        arena,
        diags,
        log,
        varid_scope: Vec::new(),
    };
    let root = parser.parse_grammar();
    ParseOutput {
        arena: parser.arena,
        grammars: parser.grammars,
        symbols: parser.symbols,
        literals: parser.literals,
        diagnostics: parser.diags,
        root,
    }
}

impl<'a> Parser<'a> {
    fn local(&self) -> GrammarId {
        self.grammars.local
    }

    fn bump(&mut self) -> Token {
        let next = self
            .lexer
            .next(&mut self.symbols, &mut self.literals, self.local(), &mut self.diags);
        std::mem::replace(&mut self.tok, next)
    }

    fn at_punct(&self, b: u8) -> bool {
        matches!(self.tok.kind, TokenKind::Punct(p) if p == b)
    }

    /// Consume an expected punctuation mark, recording a diagnostic and
    /// leaving the token stream positioned for recovery when it's absent.
    fn expect_punct(&mut self, b: u8) {
        if self.at_punct(b) {
            self.bump();
        } else {
            self.diags.push(
                self.tok.pos.clone(),
                Category::Syntactic,
                format!("expected '{}', found {}", b as char, self.tok.kind),
            );
        }
    }

    fn log(&self, msg: impl std::fmt::Display) {
        self.log.trace(Log::Verbose, msg);
    }

    /// Skip tokens until `;` or EOF, the original's declaration-level error
    /// recovery strategy (`original_source/zebu/parse.go`'s `parseDecl`).
    fn recover_to_semicolon(&mut self) {
        while !self.at_punct(b';') && self.tok.kind != TokenKind::Eof {
            self.bump();
        }
        if self.at_punct(b';') {
            self.bump();
        }
    }

    fn reference(&mut self, sym: SymbolId, pos: Position) -> NodeId {
        if let Some(id) = self.symbols.get(sym).defn {
            return id;
        }
        let id = self.arena.alloc(NodeKind::NoName { sym }, pos);
        self.symbols.get_mut(sym).defn = Some(id);
        id
    }

    fn declare(&mut self, sym: SymbolId, pos: Position, make: impl FnOnce() -> NodeKind) -> Option<NodeId> {
        match self.symbols.get(sym).defn {
            None => {
                let id = self.arena.alloc(make(), pos);
                self.symbols.get_mut(sym).defn = Some(id);
                Some(id)
            }
            Some(id) if matches!(self.arena.kind(id), NodeKind::NoName { .. }) => {
                self.arena.redefine(id, make(), pos);
                Some(id)
            }
            Some(id) => {
                let prev = self.arena.pos(id);
                self.diags.push(
                    pos,
                    Category::Resolution,
                    format!("'{}' already defined at {}", self.symbols.get(sym).name, prev),
                );
                None
            }
        }
    }

    fn parse_grammar(&mut self) -> Option<NodeId> {
        if self.tok.kind != TokenKind::Grammar {
            self.diags.push(
                self.tok.pos.clone(),
                Category::Syntactic,
                "expected 'grammar' at the start of the file",
            );
            return None;
        }
        let grammar_pos = self.tok.pos.clone();
        self.bump();
        let name_sym = match self.tok.kind {
            TokenKind::Terminal | TokenKind::Nonterminal => {
                let s = self.tok.sym().unwrap();
                self.bump();
                s
            }
            _ => {
                self.diags.push(self.tok.pos.clone(), Category::Syntactic, "expected grammar name");
                self.symbols.lookup_in("_", self.local())
            }
        };
        self.expect_punct(b';');

        let mut decls = Vec::new();
        while self.tok.kind != TokenKind::Eof {
            if let Some(id) = self.parse_decl() {
                decls.push(id);
            }
        }

        let start = decls.iter().copied().find(|&id| match self.arena.kind(id) {
            NodeKind::Rule { sym, .. } => &*self.symbols.get(*sym).name == "start",
            _ => false,
        });
        if start.is_none() {
            self.diags.push(grammar_pos.clone(), Category::Structural, "grammar must define a start rule.");
        }
        Some(
            self.arena
                .alloc(NodeKind::Grammar { sym: name_sym, start, decls }, grammar_pos),
        )
    }

    fn parse_decl(&mut self) -> Option<NodeId> {
        self.log(format!("decl at {}", self.tok.pos));
        match self.tok.kind {
            TokenKind::Terminal => self.parse_rule(),
            TokenKind::Nonterminal => self.parse_regdef(),
            TokenKind::Import
            | TokenKind::Keyword
            | TokenKind::Extend
            | TokenKind::Inherit
            | TokenKind::Override
            | TokenKind::Delete
            | TokenKind::Modify => {
                self.diags.push(
                    self.tok.pos.clone(),
                    Category::Syntactic,
                    format!("'{}' declarations are not yet supported", self.tok.kind),
                );
                self.recover_to_semicolon();
                None
            }
            _ => {
                self.diags.push(
                    self.tok.pos.clone(),
                    Category::Syntactic,
                    format!("expected a rule or regdef, found {}", self.tok.kind),
                );
                self.recover_to_semicolon();
                None
            }
        }
    }

    fn parse_rule(&mut self) -> Option<NodeId> {
        let pos = self.tok.pos.clone();
        let sym = self.tok.sym().unwrap();
        self.bump();

        let ntype = if self.at_punct(b'=') {
            Some(self.parse_type())
        } else {
            None
        };

        let id = self.declare(sym, pos, || NodeKind::Rule {
            sym,
            ntype,
            prods: Vec::new(),
            orig: None,
        });
        self.expect_punct(b':');

        let mut prods = vec![self.parse_prod()];
        while self.at_punct(b'|') {
            self.bump();
            prods.push(self.parse_prod());
        }
        self.expect_punct(b';');

        if let Some(id) = id {
            if let NodeKind::Rule { prods: slot, .. } = &mut self.arena.get_mut(id).kind {
                *slot = prods;
            }
        }
        id
    }

    fn parse_regdef(&mut self) -> Option<NodeId> {
        let pos = self.tok.pos.clone();
        let sym = self.tok.sym().unwrap();
        self.bump();

        let ntype = if self.at_punct(b'=') {
            Some(self.parse_type())
        } else {
            None
        };
        self.expect_punct(b':');
        let body = self.parse_regex_alt();
        self.expect_punct(b';');

        self.declare(sym, pos, || NodeKind::RegDef { sym, ntype, body })
    }

    fn starts_element(&self) -> bool {
        matches!(
            self.tok.kind,
            TokenKind::Terminal | TokenKind::Nonterminal | TokenKind::StrLit
        )
    }

    fn parse_prod(&mut self) -> NodeId {
        let pos = self.tok.pos.clone();
        let saved_scope = std::mem::take(&mut self.varid_scope);
        let mut elems = Vec::new();
        while self.starts_element() {
            elems.push(self.parse_element());
        }
        if elems.is_empty() {
            elems.push(ProdElem {
                left: self.arena.epsilon,
                var: None,
                action: None,
            });
        }
        self.varid_scope = saved_scope;
        self.arena.alloc(NodeKind::Prod { elems }, pos)
    }

    fn parse_element(&mut self) -> ProdElem {
        let pos = self.tok.pos.clone();
        let left = match self.tok.kind {
            TokenKind::Terminal | TokenKind::Nonterminal => {
                let sym = self.tok.sym().unwrap();
                self.bump();
                self.reference(sym, pos.clone())
            }
            TokenKind::StrLit => {
                let lit = self.tok.lit().unwrap();
                self.bump();
                self.arena.alloc(NodeKind::StrLit { lit }, pos.clone())
            }
            _ => unreachable!("parse_element called without starts_element guard"),
        };

        let mut var = None;
        if self.at_punct(b'=') {
            self.bump();
            if self.tok.kind == TokenKind::VarId {
                let s = self.tok.sym().unwrap();
                let var_pos = self.tok.pos.clone();
                if self.varid_scope.contains(&s) {
                    self.diags.push(
                        var_pos,
                        Category::Resolution,
                        format!("'${}' already bound in this production", self.symbols.get(s).name),
                    );
                } else {
                    self.varid_scope.push(s);
                }
                var = Some(s);
                self.bump();
            } else {
                self.diags.push(
                    self.tok.pos.clone(),
                    Category::Syntactic,
                    "expected a variable id after '='",
                );
            }
        }

        let action = if self.at_punct(b'{') {
            Some(self.parse_action())
        } else {
            None
        };

        ProdElem { left, var, action }
    }

    fn parse_action(&mut self) -> NodeId {
        let pos = self.tok.pos.clone();
        // `self.tok` is the `{` token; the lexer's cursor already sits
        // right after that byte, so the raw reader picks up from there.
        let (bytes, deps) = action::capture_braces(
            &mut self.lexer,
            &mut self.symbols,
            self.local(),
            &mut self.diags,
            pos.clone(),
        );
        let id = self.arena.alloc(NodeKind::Action { bytes, deps }, pos);
        self.bump();
        id
    }

    /// Reads the raw bytes of a type expression, stopping just before the
    /// next `:` and pushing it back for the caller's `expect_punct(b':')`
    /// (`original_source/zebu/parse.go`'s `parseType`). `self.tok` is the
    /// `=` that introduced the type; the lexer's cursor already sits right
    /// after that byte, so raw reading picks up from there.
    fn parse_type(&mut self) -> NodeId {
        let pos = self.tok.pos.clone();
        let mut bytes = Vec::new();
        loop {
            match self.lexer.getc_raw() {
                Some((b':', p)) => {
                    self.lexer.putc_raw(b':', p);
                    break;
                }
                Some((b, _)) if b.is_ascii_whitespace() => {}
                Some((b, _)) => bytes.push(b),
                None => {
                    self.diags.push(pos.clone(), Category::Syntactic, "unterminated type expression");
                    break;
                }
            }
        }
        let id = self.arena.alloc(NodeKind::Type { bytes }, pos);
        self.bump();
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::NodeKind;

    fn parse(src: &str) -> ParseOutput {
        parse_file(Rc::from("g.llg"), src, Log::None)
    }

    #[test]
    fn declares_a_rule_and_resolves_the_start_rule() {
        let out = parse("grammar g; start: 'x' ;");
        assert!(!out.diagnostics.has_errors());
        let root = out.root.expect("parsed grammar node");
        match out.arena.kind(root) {
            NodeKind::Grammar { start, decls, .. } => {
                assert!(start.is_some());
                assert_eq!(decls.len(), 1);
            }
            _ => panic!("expected grammar node"),
        }
    }

    #[test]
    fn forward_reference_resolves_once_the_real_rule_is_declared() {
        let out = parse("grammar g; start: a ; a: 'x' ;");
        assert!(!out.diagnostics.has_errors());
        let root = out.root.unwrap();
        let decls = match out.arena.kind(root) {
            NodeKind::Grammar { decls, .. } => decls.clone(),
            _ => panic!(),
        };
        let start_rule = decls[0];
        let prods = match out.arena.kind(start_rule) {
            NodeKind::Rule { prods, .. } => prods.clone(),
            _ => panic!(),
        };
        let elem0 = match out.arena.kind(prods[0]) {
            NodeKind::Prod { elems } => elems[0].left,
            _ => panic!(),
        };
        assert!(matches!(out.arena.kind(elem0), NodeKind::Rule { .. }));
    }

    #[test]
    fn redefinition_is_rejected() {
        let out = parse("grammar g; start: 'x' ; start: 'y' ;");
        assert!(out.diagnostics.has_errors());
    }

    #[test]
    fn empty_production_gets_a_single_epsilon_element() {
        let out = parse("grammar g; start: 'x' | ;");
        let root = out.root.unwrap();
        let decls = match out.arena.kind(root) {
            NodeKind::Grammar { decls, .. } => decls.clone(),
            _ => panic!(),
        };
        let prods = match out.arena.kind(decls[0]) {
            NodeKind::Rule { prods, .. } => prods.clone(),
            _ => panic!(),
        };
        let elem = match out.arena.kind(prods[1]) {
            NodeKind::Prod { elems } => elems[0].left,
            _ => panic!(),
        };
        assert!(out.arena.is_epsilon(elem));
    }

    #[test]
    fn action_captures_body_and_records_varid_dependency() {
        let out = parse("grammar g; start: 'x' = $v { use($v); } ;");
        assert!(!out.diagnostics.has_errors());
        let root = out.root.unwrap();
        let decls = match out.arena.kind(root) {
            NodeKind::Grammar { decls, .. } => decls.clone(),
            _ => panic!(),
        };
        let prods = match out.arena.kind(decls[0]) {
            NodeKind::Rule { prods, .. } => prods.clone(),
            _ => panic!(),
        };
        let action = match out.arena.kind(prods[0]) {
            NodeKind::Prod { elems } => elems[0].action.unwrap(),
            _ => panic!(),
        };
        match out.arena.kind(action) {
            NodeKind::Action { bytes, deps } => {
                assert_eq!(String::from_utf8(bytes.clone()).unwrap(), " use($v); ");
                assert_eq!(deps.len(), 1);
            }
            _ => panic!("expected action node"),
        }
    }
}
