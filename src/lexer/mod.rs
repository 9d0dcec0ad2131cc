//! Hand-written lexer (spec.md §4.2), grounded on the scanner in
//! `original_source/zebu/lex.go`. Character class bodies (`[...]`) are not
//! tokenized through [`Lexer::next`] at all: the regex parser reads their
//! contents directly off the lexer's cursor via [`Lexer::scan_class_char`],
//! since `-` and escapes inside a class mean something other than ordinary
//! punctuation.
//!
//! A single pushback slot lets the scanner peek one byte ahead without a
//! buffered reader, mirroring the original's `ch1` cell.

pub mod token;

use std::rc::Rc;

use crate::diagnostics::{Category, Diagnostics};
use crate::interner::{GrammarId, LiteralTable, SymbolTable};
use crate::lexer::token::{Payload, Token, TokenKind};
use crate::position::Position;
use crate::util::Log;

/// Identifiers longer than this overflow the scratch buffer; spec.md §4.2
/// treats this as a fatal lexical error rather than silent truncation.
const MAX_IDENT_LEN: usize = 512;

pub struct Lexer<'a> {
    src: &'a [u8],
    file: Rc<str>,
    offset: usize,
    line: usize,
    column: usize,
    pushback: Option<(u8, usize, usize)>,
    log: Log,
}

impl<'a> Lexer<'a> {
    pub fn new(file: Rc<str>, src: &'a str, log: Log) -> Self {
        Self {
            src: src.as_bytes(),
            file,
            offset: 0,
            line: 1,
            column: 1,
            pushback: None,
            log,
        }
    }

    fn here(&self) -> Position {
        Position::new(self.file.clone(), self.line, self.column)
    }

    fn advance_cursor(&mut self, b: u8) {
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    fn getc(&mut self) -> Option<(u8, usize, usize)> {
        if let Some((b, line, column)) = self.pushback.take() {
            self.line = line;
            self.column = column;
            self.advance_cursor(b);
            return Some((b, line, column));
        }
        if self.offset >= self.src.len() {
            return None;
        }
        let b = self.src[self.offset];
        self.offset += 1;
        let (line, column) = (self.line, self.column);
        self.advance_cursor(b);
        Some((b, line, column))
    }

    fn putc(&mut self, b: u8, line: usize, column: usize) {
        self.pushback = Some((b, line, column));
        self.line = line;
        self.column = column;
    }

    /// Read one raw byte from the underlying source, bypassing
    /// tokenization entirely. Used by the action/type reader to capture a
    /// balanced `{ ... }` block verbatim (spec.md §4.3 "action capture").
    pub fn getc_raw(&mut self) -> Option<(u8, Position)> {
        self.getc()
            .map(|(b, line, column)| (b, Position::new(self.file.clone(), line, column)))
    }

    pub fn putc_raw(&mut self, b: u8, pos: Position) {
        self.putc(b, pos.line, pos.column);
    }

    pub fn current_pos(&self) -> Position {
        self.here()
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.getc() {
                None => return,
                Some((b, line, column)) => match b {
                    b' ' | b'\t' | b'\r' | b'\n' => continue,
                    b'/' => {
                        let next = self.getc();
                        match next {
                            Some((b'/', ..)) => {
                                while let Some((c, ..)) = self.getc() {
                                    if c == b'\n' {
                                        break;
                                    }
                                }
                            }
                            Some((b'*', ..)) => {
                                let mut prev = 0u8;
                                loop {
                                    match self.getc() {
                                        None => break,
                                        Some((c, ..)) => {
                                            if prev == b'*' && c == b'/' {
                                                break;
                                            }
                                            prev = c;
                                        }
                                    }
                                }
                            }
                            Some((c, l2, c2)) => {
                                self.putc(c, l2, c2);
                                self.putc(b'/', line, column);
                                return;
                            }
                            None => {
                                self.putc(b'/', line, column);
                                return;
                            }
                        }
                    }
                    _ => {
                        self.putc(b, line, column);
                        return;
                    }
                },
            }
        }
    }

    fn escape(&mut self, diags: &mut Diagnostics, pos: Position) -> u8 {
        match self.getc() {
            Some((b'n', ..)) => b'\n',
            Some((b't', ..)) => b'\t',
            Some((b'\\', ..)) => b'\\',
            Some((b'\'', ..)) => b'\'',
            Some((b, ..)) => {
                diags.push(
                    pos,
                    Category::Lexical,
                    format!("unknown escape sequence '\\{}'", b as char),
                );
                b
            }
            None => {
                diags.push(pos, Category::Lexical, "unterminated escape at end of file");
                0
            }
        }
    }

    /// Scan one character in class mode: a plain byte or an escape of
    /// `\n \t \\ ]`. Returns `None` (pushing the byte back) on `]`, the
    /// class terminator; callers decide range (`-`) handling themselves by
    /// peeking with [`Lexer::getc_raw`].
    pub fn scan_class_char(&mut self, diags: &mut Diagnostics) -> Option<Token> {
        let (b, line, column) = self.getc()?;
        let pos = Position::new(self.file.clone(), line, column);
        if b == b']' {
            self.putc(b, line, column);
            return None;
        }
        if b == b'\\' {
            let v = self.escape(diags, pos.clone());
            return Some(Token::new(pos, TokenKind::CharLit, Payload::Byte(v)));
        }
        Some(Token::new(pos, TokenKind::CharLit, Payload::Byte(b)))
    }

    fn scan_strlit(&mut self, diags: &mut Diagnostics, pos: Position) -> String {
        let mut out = String::new();
        loop {
            match self.getc() {
                None => {
                    diags.push(pos.clone(), Category::Lexical, "unterminated string literal");
                    break;
                }
                Some((b'\'', ..)) => break,
                Some((b'\\', ..)) => {
                    let v = self.escape(diags, pos.clone());
                    out.push(v as char);
                }
                Some((b, ..)) => out.push(b as char),
            }
        }
        out
    }

    fn scan_ident(&mut self, first: u8, diags: &mut Diagnostics) -> String {
        let mut buf = vec![first];
        loop {
            match self.getc() {
                Some((b, line, column)) if b.is_ascii_alphanumeric() || b == b'_' => {
                    if buf.len() >= MAX_IDENT_LEN {
                        diags.push(
                            self.here(),
                            Category::Lexical,
                            format!("identifier exceeds {} bytes", MAX_IDENT_LEN),
                        );
                        self.putc(b, line, column);
                        break;
                    }
                    buf.push(b);
                }
                Some((b, line, column)) => {
                    self.putc(b, line, column);
                    break;
                }
                None => break,
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn scan_number(&mut self, first: u8) -> i64 {
        let mut n = (first - b'0') as i64;
        loop {
            match self.getc() {
                Some((b, ..)) if b.is_ascii_digit() => n = n * 10 + (b - b'0') as i64,
                Some((b, line, column)) => {
                    self.putc(b, line, column);
                    break;
                }
                None => break,
            }
        }
        n
    }

    /// Produce the next ordinary token. Character class bodies bypass this
    /// entirely in favor of [`Lexer::scan_class_char`]; callers only return
    /// here once they've consumed the class's closing `]`.
    pub fn next(
        &mut self,
        symbols: &mut SymbolTable,
        literals: &mut LiteralTable,
        local: GrammarId,
        diags: &mut Diagnostics,
    ) -> Token {
        self.skip_whitespace_and_comments();
        let (b, line, column) = match self.getc() {
            Some(t) => t,
            None => return Token::new(self.here(), TokenKind::Eof, Payload::None),
        };
        let pos = Position::new(self.file.clone(), line, column);
        self.log.trace(Log::Verbose, format!("lex {} at {}", b as char, pos));

        if b == b'$' {
            let (first, ..) = match self.getc() {
                Some(t) => t,
                None => {
                    diags.push(pos.clone(), Category::Lexical, "expected name after '$'");
                    return Token::new(pos, TokenKind::Eof, Payload::None);
                }
            };
            let name = self.scan_ident(first, diags);
            let sym = symbols.lookup_in(&name, local);
            return Token::new(pos, TokenKind::VarId, Payload::Sym(sym));
        }
        if b == b'\'' {
            let content = self.scan_strlit(diags, pos.clone());
            let lit = literals.lookup_in(&content, local);
            return Token::new(pos, TokenKind::StrLit, Payload::Lit(lit));
        }
        if b.is_ascii_digit() {
            let n = self.scan_number(b);
            return Token::new(pos, TokenKind::NumLit, Payload::Num(n));
        }
        if b.is_ascii_alphabetic() || b == b'_' {
            let name = self.scan_ident(b, diags);
            let sym = symbols.lookup_in(&name, local);
            let preset = symbols.get(sym).lexical;
            let kind = match preset {
                TokenKind::Name => {
                    let inferred = if name.as_bytes()[0].is_ascii_uppercase() {
                        TokenKind::Nonterminal
                    } else {
                        TokenKind::Terminal
                    };
                    symbols.get_mut(sym).lexical = inferred;
                    inferred
                }
                other => other,
            };
            return Token::new(pos, kind, Payload::Sym(sym));
        }
        // Single-character punctuation. `[` is returned like any other
        // punct; the caller switches to scan_class_char for the class body
        // and comes back here only after its closing `]`.
        Token::new(pos, TokenKind::Punct(b), Payload::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interner::GrammarTable;

    fn lex_all(src: &str) -> Vec<TokenKind> {
        let mut grammars = GrammarTable::new();
        let local = grammars.local;
        let mut symbols = SymbolTable::new(local);
        let mut literals = LiteralTable::new();
        let mut diags = Diagnostics::new();
        let mut lexer = Lexer::new(Rc::from("g.llg"), src, Log::None);
        let mut kinds = Vec::new();
        loop {
            let tok = lexer.next(&mut symbols, &mut literals, local, &mut diags);
            if tok.kind == TokenKind::Eof {
                break;
            }
            kinds.push(tok.kind);
        }
        kinds
    }

    #[test]
    fn skips_line_and_block_comments() {
        let kinds = lex_all("// comment\nstart /* block */ ;");
        assert_eq!(
            kinds,
            vec![TokenKind::Terminal, TokenKind::Punct(b';')]
        );
    }

    #[test]
    fn classifies_identifiers_by_leading_case() {
        let kinds = lex_all("start Digit");
        assert_eq!(kinds, vec![TokenKind::Terminal, TokenKind::Nonterminal]);
    }

    #[test]
    fn reserved_keyword_keeps_its_own_kind() {
        let kinds = lex_all("grammar");
        assert_eq!(kinds, vec![TokenKind::Grammar]);
    }

    #[test]
    fn string_literal_unescapes_known_escapes() {
        let mut grammars = GrammarTable::new();
        let local = grammars.local;
        let mut symbols = SymbolTable::new(local);
        let mut literals = LiteralTable::new();
        let mut diags = Diagnostics::new();
        let mut lexer = Lexer::new(Rc::from("g.llg"), "'a\\nb'", Log::None);
        let tok = lexer.next(&mut symbols, &mut literals, local, &mut diags);
        let lit = tok.lit().expect("strlit payload");
        assert_eq!(&*literals.get(lit).content, "a\nb");
    }

    #[test]
    fn varid_interns_name_without_the_dollar_sign() {
        let mut grammars = GrammarTable::new();
        let local = grammars.local;
        let mut symbols = SymbolTable::new(local);
        let mut literals = LiteralTable::new();
        let mut diags = Diagnostics::new();
        let mut lexer = Lexer::new(Rc::from("g.llg"), "$count", Log::None);
        let tok = lexer.next(&mut symbols, &mut literals, local, &mut diags);
        assert_eq!(tok.kind, TokenKind::VarId);
        let sym = tok.sym().unwrap();
        assert_eq!(&*symbols.get(sym).name, "count");
    }
}
