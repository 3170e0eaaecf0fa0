//! Parsing CRA assembly source.
//!
//! Parsing happens in two stages:
//! - [`split_line`] and [`split_source`] carve source lines into statement texts,
//!   handling `;` separators, `..` comments and quoted strings.
//! - [`parse_stmt`] parses one statement text into its typed form ([`Parsed`]),
//!   evaluating expressions against the current [`AssemblerContext`] and [`SymbolTable`].
//!
//! Unlike a conventional parser, statements are parsed once per assembler pass,
//! since the meaning of a statement (e.g., the size of `DC LABEL`) can depend
//! on which symbols have been defined so far.

pub mod lex;
mod expr;
mod stmt;

use crate::asm::{AssemblerContext, Pass, SymbolTable};
use crate::ast::{Parsed, Rejected, Statement, StmtKind};
use crate::err::StmtErr;

use self::lex::Token;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum SplitState {
    Text,
    Quote,
    /// Just past a period which might start a `..` comment.
    Period,
}

/// Splits a source line into the texts of its statements.
///
/// Statements are separated by `;`, and a `..` starts a comment
/// running to the end of the line. Neither applies inside a quoted run.
///
/// # Example
/// ```
/// use cosmac_asm::parse::split_line;
///
/// assert_eq!(split_line("LDI 5;PLO R2 .. set up R2"), ["LDI 5", "PLO R2 "]);
/// assert_eq!(split_line("DC T';'"), ["DC T';'"]);
/// ```
pub fn split_line(line: &str) -> Vec<&str> {
    let mut stmts = vec![];
    let mut start = 0;
    let mut state = SplitState::Text;

    for (i, c) in line.char_indices() {
        if state == SplitState::Period {
            if c == '.' {
                stmts.push(&line[start..i - 1]);
                return stmts;
            }
            state = SplitState::Text;
        }

        match (state, c) {
            (SplitState::Text, '\'') => state = SplitState::Quote,
            (SplitState::Text, '.')  => state = SplitState::Period,
            (SplitState::Text, ';')  => {
                stmts.push(&line[start..i]);
                start = i + 1;
            },
            (SplitState::Quote, '\'') => state = SplitState::Text,
            _ => {}
        }
    }

    if start < line.len() {
        stmts.push(&line[start..]);
    }
    stmts
}

/// Splits a whole source text into its statements, in order.
///
/// Each statement is tagged with its 1-based line number.
pub fn split_source(src: &str) -> Vec<Statement> {
    src.lines()
        .enumerate()
        .flat_map(|(i, line)| {
            split_line(line).into_iter()
                .map(move |text| Statement::new(text, i + 1))
        })
        .collect()
}

/// Parses a single statement.
///
/// Symbols are resolved against `symbols`, and `*` and page checks use `ctx.pc`
/// (which should be the address at the start of the statement).
///
/// # Example
/// ```
/// use cosmac_asm::asm::{AssemblerContext, SymbolTable};
/// use cosmac_asm::ast::{Nucleus, Operand};
/// use cosmac_asm::isa;
/// use cosmac_asm::parse::parse_stmt;
///
/// let ctx = AssemblerContext::default();
/// let syms = SymbolTable::new();
///
/// let stmt = parse_stmt("START: GLO R3", &ctx, &syms).unwrap();
/// assert_eq!(stmt.label.as_deref(), Some("START"));
/// assert_eq!(stmt.nucleus, Nucleus::Instr(isa::lookup("GLO").unwrap(), Some(Operand::Nibble(3))));
/// assert_eq!(stmt.size(), 1);
/// ```
pub fn parse_stmt(text: &str, ctx: &AssemblerContext, symbols: &SymbolTable) -> Result<Parsed, Rejected> {
    let mut parser = Parser::new(text, ctx, symbols);
    match parser.statement() {
        Ok(nucleus) => Ok(Parsed {
            label: parser.label,
            nucleus,
            data: parser.data,
        }),
        Err(error) => Err(Rejected {
            error,
            label: parser.label,
            kind: parser.kind,
            size: parser.size.wrapping_add(parser.data.len() as u16),
        }),
    }
}

/// A cursor over one statement's text.
///
/// The grammar itself is split between the `expr` and `stmt` submodules.
struct Parser<'a> {
    text: &'a str,
    pos: usize,
    ctx: &'a AssemblerContext,
    symbols: &'a SymbolTable,

    // Results accumulated so far.
    label: Option<String>,
    kind: StmtKind,
    size: u16,
    data: Vec<u8>,
}
impl<'a> Parser<'a> {
    fn new(text: &'a str, ctx: &'a AssemblerContext, symbols: &'a SymbolTable) -> Self {
        Parser { text, pos: 0, ctx, symbols, label: None, kind: StmtKind::Nop, size: 0, data: vec![] }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    /// Consumes `c` if it is the next character.
    fn eat(&mut self, c: char) -> bool {
        let matched = self.peek() == Some(c);
        if matched {
            self.pos += c.len_utf8();
        }
        matched
    }

    /// Skips whitespace, returning whether the end of the statement was reached.
    fn skip_space(&mut self) -> bool {
        let rest = &self.text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
        self.pos == self.text.len()
    }

    /// The result of a reference to a symbol with no value yet.
    ///
    /// The first pass carries on with `pending`. The second pass reports the symbol as undefined.
    fn unresolved<T>(&self, pending: T) -> Result<T, StmtErr> {
        match self.ctx.pass {
            Pass::First  => Ok(pending),
            Pass::Second => Err(StmtErr::UndefinedSymbol),
        }
    }

    fn token(&mut self) -> Result<Token, StmtErr> {
        lex::next_token(self.text, &mut self.pos)
    }

    /// Reads the token at the cursor without consuming it.
    fn peek_token(&self) -> (Result<Token, StmtErr>, usize) {
        let mut pos = self.pos;
        let tk = lex::next_token(self.text, &mut pos);
        (tk, pos)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::Statement;

    use super::{split_line, split_source};

    #[test]
    fn test_split_semicolon() {
        assert_eq!(split_line("INC R1;DEC R2"), ["INC R1", "DEC R2"]);
        assert_eq!(split_line("INC R1;"), ["INC R1"]);
        assert_eq!(split_line(";INC R1"), ["", "INC R1"]);
        assert_eq!(split_line("MOV R1 ; this is a comment"), ["MOV R1 ", " this is a comment"]);
    }

    #[test]
    fn test_split_comment() {
        assert_eq!(split_line("LDI 5 .. load"), ["LDI 5 "]);
        assert_eq!(split_line(".. whole line"), [""]);
        assert_eq!(split_line("INC R1;DEC R2..x;y"), ["INC R1", "DEC R2"]);

        // a lone period is ordinary text
        assert_eq!(split_line("LDI A.0(X);NOP"), ["LDI A.0(X)", "NOP"]);
        assert_eq!(split_line("X.;Y"), ["X.", "Y"]);
    }

    #[test]
    fn test_split_quotes() {
        assert_eq!(split_line("DC T';'"), ["DC T';'"]);
        assert_eq!(split_line("DC T'..';NOP"), ["DC T'..'", "NOP"]);
        assert_eq!(split_line("DC T'it''s';NOP"), ["DC T'it''s'", "NOP"]);
        // unterminated quotes are the lexer's problem
        assert_eq!(split_line("DC T'abc;NOP"), ["DC T'abc;NOP"]);
    }

    #[test]
    fn test_split_empty() {
        assert!(split_line("").is_empty());
        assert_eq!(split_line("   "), ["   "]);
    }

    #[test]
    fn test_split_source() {
        let stmts = split_source("A: NOP\n\nINC R1;DEC R1\r\n.. done");
        let pairs: Vec<_> = stmts.iter()
            .map(|Statement { line, text, .. }| (*line, text.as_str()))
            .collect();

        assert_eq!(pairs, [(1, "A: NOP"), (3, "INC R1"), (3, "DEC R1"), (4, "")]);
    }
}
