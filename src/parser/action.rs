//! Raw `{ ... }` block capture for actions and type annotations (spec.md
//! §4.3). Grounded on `original_source/zebu/parse.go`'s `parseAction`,
//! adapted away from that function's rule-lifting trick: here the captured
//! bytes are stashed directly on the production element instead of being
//! synthesized into a brand-new epsilon-bearing rule.
//!
//! Capture bypasses normal tokenization and reads the underlying source
//! byte-by-byte so that arbitrary target-language syntax inside the braces
//! (including nested braces and `'...'` string literals) passes through
//! unexamined, except for `$name` occurrences, which are scanned out as
//! action dependencies.

use crate::diagnostics::{Category, Diagnostics};
use crate::interner::{GrammarId, SymbolId, SymbolTable};
use crate::lexer::Lexer;
use crate::position::Position;

/// Captures a `{ ... }` block whose opening brace has already been
/// consumed by the caller. Returns the verbatim body bytes (braces
/// excluded) and the `$name`s referenced inside it, in order of first
/// appearance.
pub fn capture_braces(
    lexer: &mut Lexer,
    symbols: &mut SymbolTable,
    local: GrammarId,
    diags: &mut Diagnostics,
    opened_at: Position,
) -> (Vec<u8>, Vec<SymbolId>) {
    let mut bytes = Vec::new();
    let mut deps = Vec::new();
    let mut depth = 1u32;

    loop {
        match lexer.getc_raw() {
            None => {
                diags.push(opened_at.clone(), Category::Syntactic, "unterminated action block");
                break;
            }
            Some((b'{', _)) => {
                depth += 1;
                bytes.push(b'{');
            }
            Some((b'}', _)) => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                bytes.push(b'}');
            }
            Some((b'\'', _)) => {
                bytes.push(b'\'');
                copy_quoted_literal(lexer, &mut bytes);
            }
            Some((b'$', _)) => {
                bytes.push(b'$');
                let name = copy_dollar_name(lexer, &mut bytes);
                if !name.is_empty() {
                    deps.push(symbols.lookup_in(&name, local));
                }
            }
            Some((b, _)) => bytes.push(b),
        }
    }

    (bytes, deps)
}

fn copy_quoted_literal(lexer: &mut Lexer, bytes: &mut Vec<u8>) {
    loop {
        match lexer.getc_raw() {
            None => break,
            Some((b'\\', _)) => {
                bytes.push(b'\\');
                if let Some((escaped, _)) = lexer.getc_raw() {
                    bytes.push(escaped);
                }
            }
            Some((b'\'', _)) => {
                bytes.push(b'\'');
                break;
            }
            Some((b, _)) => bytes.push(b),
        }
    }
}

fn copy_dollar_name(lexer: &mut Lexer, bytes: &mut Vec<u8>) -> String {
    let mut name = Vec::new();
    loop {
        match lexer.getc_raw() {
            Some((b, _)) if b.is_ascii_alphanumeric() || b == b'_' => {
                name.push(b);
            }
            Some((b, pos)) => {
                lexer.putc_raw(b, pos);
                break;
            }
            None => break,
        }
    }
    bytes.extend_from_slice(&name);
    String::from_utf8_lossy(&name).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interner::GrammarTable;
    use std::rc::Rc;

    #[test]
    fn captures_nested_braces_and_dollar_deps() {
        let mut grammars = GrammarTable::new();
        let local = grammars.local;
        let mut symbols = SymbolTable::new(local);
        let mut diags = Diagnostics::new();
        let mut lexer = Lexer::new(Rc::from("g.llg"), "a = { if $x { $y } };", crate::util::Log::None);
        // consume up through the opening '{' like the parser would.
        while let Some((b, _)) = lexer.getc_raw() {
            if b == b'{' {
                break;
            }
        }
        let (bytes, deps) =
            capture_braces(&mut lexer, &mut symbols, local, &mut diags, Position::synthetic());
        assert_eq!(String::from_utf8(bytes).unwrap(), " if $x { $y } ");
        assert_eq!(deps.len(), 2);
        assert_eq!(&*symbols.get(deps[0]).name, "x");
        assert_eq!(&*symbols.get(deps[1]).name, "y");
    }
}
