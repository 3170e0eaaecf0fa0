//! Tokenizing CRA statement text.
//!
//! CRA statements are not tokenized up front. The parser pulls one [`Token`]
//! at a time from the cursor with [`next_token`], because how the remaining text
//! is read depends on what came before it (e.g., `A.0(` or a datalist).
//!
//! The lexer never skips whitespace: a space (or any punctuation) at the cursor
//! is read as [`Token::Empty`] without moving the cursor.

use logos::{Lexer, Logos};

use crate::err::StmtErr;

/// A unit of information in a CRA statement.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token {
    /// No token could be read at the cursor.
    Empty,
    /// A string constant (e.g., `T'HELLO'`, `T'IT''S'`).
    Str(String),
    /// A binary constant (e.g., `B'1011'`).
    Bin(u16),
    /// A hex constant (e.g., `#1F`, `X'1F'`).
    Hex(u16),
    /// A decimal constant (e.g., `D'1234'`, `1234`).
    Dec(u16),
    /// An identifier, uppercased.
    ///
    /// This can be a label, a mnemonic, a register (`R5`), a symbol,
    /// or an unprefixed hex constant (`1F`).
    Text(String),
}
impl Token {
    /// The value of this token, if it is a numeric constant.
    pub fn constant(&self) -> Option<u16> {
        match *self {
            Token::Bin(v) | Token::Hex(v) | Token::Dec(v) => Some(v),
            _ => None,
        }
    }
}

/// A run of text which forms one token, before it is validated.
#[derive(Debug, Logos, PartialEq, Eq)]
#[logos(error = RawErr)]
enum Raw {
    // These regexes collect whatever would be one discernable unit,
    // including invalid ones (e.g., `12AB`, `#XYZ`, `Q'..'`).
    // The classifiers below decide what the unit actually is.

    /// A prefix and a quoted run. This holds the quoted text with `''` unescaped.
    #[regex(r"#?[0-9A-Za-z]*'", lex_quoted)]
    Quoted(String),

    #[regex(r"#[0-9A-Za-z]*")]
    #[regex(r"[0-9A-Za-z]+")]
    Run,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
enum RawErr {
    Unclosed,
    #[default]
    Unmatched,
}

fn lex_quoted(lx: &mut Lexer<'_, Raw>) -> Result<String, RawErr> {
    let rem = lx.remainder();
    let mut buf = String::new();

    let mut chars = rem.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        // '' is an escaped quote, anything else closes the run
        if c == '\'' && chars.next_if(|&(_, c)| c == '\'').is_none() {
            lx.bump(i + 1);
            return Ok(buf);
        }
        buf.push(c);
    }

    lx.bump(rem.len());
    Err(RawErr::Unclosed)
}

/// Reads the token at the cursor, advancing the cursor past it.
///
/// # Example
/// ```
/// use cosmac_asm::parse::lex::{next_token, Token};
///
/// let text = "B'1011' X";
/// let mut pos = 0;
/// assert_eq!(next_token(text, &mut pos), Ok(Token::Bin(0b1011)));
/// assert_eq!(pos, 7);
/// // whitespace isn't skipped:
/// assert_eq!(next_token(text, &mut pos), Ok(Token::Empty));
/// assert_eq!(pos, 7);
/// ```
pub fn next_token(text: &str, pos: &mut usize) -> Result<Token, StmtErr> {
    let mut lx = Raw::lexer(&text[*pos..]);

    match lx.next() {
        None | Some(Err(RawErr::Unmatched)) => Ok(Token::Empty),
        Some(Err(RawErr::Unclosed)) => {
            *pos += lx.span().end;
            Err(StmtErr::MissingTrailingQuote)
        },
        Some(Ok(raw)) => {
            *pos += lx.span().end;
            match raw {
                Raw::Quoted(body) => {
                    let (prefix, _) = lx.slice().split_once('\'').unwrap_or((lx.slice(), ""));
                    classify_quoted(prefix, body)
                },
                Raw::Run => classify_run(lx.slice()),
            }
        }
    }
}

fn classify_run(run: &str) -> Result<Token, StmtErr> {
    if let Some(hex) = run.strip_prefix('#') {
        parse_radix(hex, 16, 4)
            .map(Token::Hex)
            .ok_or(StmtErr::InvalidHexConstant)
    } else if run.starts_with(|c: char| c.is_ascii_digit()) {
        parse_radix(run, 10, 5)
            .map(Token::Dec)
            .ok_or(StmtErr::InvalidDecimalConstant)
    } else {
        Ok(Token::Text(run.to_ascii_uppercase()))
    }
}

fn classify_quoted(prefix: &str, body: String) -> Result<Token, StmtErr> {
    let mut chars = prefix.chars();

    match (chars.next(), chars.next()) {
        (Some('#'), _) => Err(StmtErr::InvalidHexConstant),
        (Some(c), None) if c.is_ascii_alphabetic() => match c.to_ascii_uppercase() {
            'B' => parse_radix(&body, 2, 8).map(Token::Bin).ok_or(StmtErr::InvalidBinaryConstant),
            'D' => parse_radix(&body, 10, 5).map(Token::Dec).ok_or(StmtErr::InvalidDecimalConstant),
            'X' => parse_radix(&body, 16, 4).map(Token::Hex).ok_or(StmtErr::InvalidHexConstant),
            'T' if body.is_empty() => Err(StmtErr::MissingTrailingQuote),
            'T' => Ok(Token::Str(body)),
            _ => Err(StmtErr::InvalidSyntax),
        },
        (Some(c), _) if c.is_ascii_alphabetic() => Err(StmtErr::InvalidSyntax),
        // a bare quote or a digit run running into a quote
        _ => Err(StmtErr::InvalidDecimalConstant),
    }
}

/// Parses 1 to `max_len` digits of the given radix into a 16-bit value.
fn parse_radix(digits: &str, radix: u32, max_len: usize) -> Option<u16> {
    let valid = (1..=max_len).contains(&digits.len())
        && digits.chars().all(|c| c.is_digit(radix));
    if !valid {
        return None;
    }

    u32::from_str_radix(digits, radix).ok()
        .and_then(|v| u16::try_from(v).ok())
}

/// Reads an identifier as an unprefixed hex constant (1 to 4 hex digits), if it looks like one.
pub(crate) fn bare_hex(ident: &str) -> Option<u16> {
    parse_radix(ident, 16, 4)
}
