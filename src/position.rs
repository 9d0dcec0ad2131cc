use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// A location in a grammar source file.
///
/// Positions are immutable once created; the lexer stamps one onto every
/// token and most AST nodes carry the position of the token that introduced
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub file: Rc<str>,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(file: Rc<str>, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }

    /// A placeholder position for synthesized nodes that have no direct
    /// source location (e.g. the shared epsilon singleton).
    pub fn synthetic() -> Self {
        Self {
            file: Rc::from("<synthetic>"),
            line: 0,
            column: 0,
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_as_file_line_col() {
        let pos = Position::new(Rc::from("g.llg"), 3, 7);
        assert_eq!(pos.to_string(), "g.llg:3:7");
    }
}
