//! The regex sub-grammar used by `regdef` bodies (spec.md §4.3, §6),
//! grounded on `original_source/zebu/parse.go`'s `parseAlt/parseCat/
//! parseKleene/parseRepeat/parseClass` precedence ladder, tightest-binding
//! first: class/group/atom, then repeat (`* + {m,n}`), then concatenation,
//! then alternation (`|`).
//!
//! Character class bodies are read with [`crate::lexer::Lexer::scan_class_char`]
//! straight off the lexer's cursor rather than through the ordinary token
//! stream, since `[a-z]` has no use for identifier/punctuation tokenization.

use crate::arena::{NodeId, NodeKind};
use crate::diagnostics::Category;
use crate::lexer::token::TokenKind;

use super::Parser;

impl<'a> Parser<'a> {
    pub(super) fn parse_regex_alt(&mut self) -> NodeId {
        let mut left = self.parse_regex_cat();
        while self.at_punct(b'|') {
            let pos = self.tok.pos.clone();
            self.bump();
            let right = self.parse_regex_cat();
            left = self.arena.alloc(NodeKind::Alt { left, right }, pos);
        }
        left
    }

    fn starts_regex_atom(&self) -> bool {
        matches!(self.tok.kind, TokenKind::Nonterminal | TokenKind::StrLit)
            || self.at_punct(b'[')
            || self.at_punct(b'(')
    }

    fn parse_regex_cat(&mut self) -> NodeId {
        let pos = self.tok.pos.clone();
        let mut left = self.parse_regex_repeat();
        while self.starts_regex_atom() {
            let right = self.parse_regex_repeat();
            left = self.arena.alloc(NodeKind::Cat { left, right }, pos.clone());
        }
        left
    }

    fn parse_regex_repeat(&mut self) -> NodeId {
        let inner = self.parse_regex_atom();
        loop {
            if self.at_punct(b'*') {
                let pos = self.tok.pos.clone();
                self.bump();
                return self.arena.alloc(NodeKind::Kleene { inner }, pos);
            }
            if self.at_punct(b'+') {
                let pos = self.tok.pos.clone();
                self.bump();
                return self.arena.alloc(NodeKind::Plus { inner }, pos);
            }
            if self.at_punct(b'{') {
                let pos = self.tok.pos.clone();
                self.bump();
                let lb = self.expect_numlit();
                let ub = if self.at_punct(b',') {
                    self.bump();
                    self.expect_numlit()
                } else {
                    lb
                };
                self.expect_punct(b'}');
                return self.arena.alloc(NodeKind::Repeat { inner, lb, ub }, pos);
            }
            return inner;
        }
    }

    fn expect_numlit(&mut self) -> i64 {
        match self.tok.num() {
            Some(n) => {
                self.bump();
                n
            }
            None => {
                self.diags.push(
                    self.tok.pos.clone(),
                    Category::Syntactic,
                    "expected an integer repeat bound",
                );
                0
            }
        }
    }

    fn parse_regex_atom(&mut self) -> NodeId {
        let pos = self.tok.pos.clone();
        if self.at_punct(b'[') {
            return self.parse_class();
        }
        if self.at_punct(b'(') {
            self.bump();
            let inner = self.parse_regex_alt();
            self.expect_punct(b')');
            return inner;
        }
        match self.tok.kind {
            TokenKind::Nonterminal => {
                let sym = self.tok.sym().unwrap();
                self.bump();
                self.reference(sym, pos)
            }
            TokenKind::StrLit => {
                let lit = self.tok.lit().unwrap();
                self.bump();
                self.arena.alloc(NodeKind::StrLit { lit }, pos)
            }
            _ => {
                self.diags.push(
                    pos.clone(),
                    Category::Syntactic,
                    format!("expected a regex atom, found {}", self.tok.kind),
                );
                self.arena.epsilon
            }
        }
    }

    fn parse_class(&mut self) -> NodeId {
        let pos = self.tok.pos.clone();
        // `self.tok` is `[`; the lexer's cursor already sits right after
        // that byte, so class scanning reads straight from there.
        let neg = match self.lexer.getc_raw() {
            Some((b'^', _)) => true,
            Some((b, p)) => {
                self.lexer.putc_raw(b, p);
                false
            }
            None => false,
        };

        let mut members = Vec::new();
        while let Some(lo_tok) = self.lexer.scan_class_char(&mut self.diags) {
            let lo = lo_tok.byte().unwrap();
            let lo_pos = lo_tok.pos.clone();
            match self.lexer.getc_raw() {
                Some((b'-', _)) => match self.lexer.scan_class_char(&mut self.diags) {
                    Some(hi_tok) => {
                        let hi = hi_tok.byte().unwrap();
                        members.push(self.arena.alloc(NodeKind::Range { lo, hi }, lo_pos));
                    }
                    None => {
                        members.push(self.arena.alloc(NodeKind::Char { byte: lo }, lo_pos.clone()));
                        members.push(self.arena.alloc(NodeKind::Char { byte: b'-' }, lo_pos));
                    }
                },
                Some((b, p)) => {
                    self.lexer.putc_raw(b, p);
                    members.push(self.arena.alloc(NodeKind::Char { byte: lo }, lo_pos));
                }
                None => {
                    members.push(self.arena.alloc(NodeKind::Char { byte: lo }, lo_pos));
                }
            }
        }
        if members.is_empty() {
            self.diags.push(pos.clone(), Category::Syntactic, "empty character class");
        }
        // re-enter normal tokenization at the ']' the scan loop left behind.
        self.bump();
        self.expect_punct(b']');
        self.arena.alloc(NodeKind::Class { neg, members }, pos)
    }
}
