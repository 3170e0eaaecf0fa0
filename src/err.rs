//! Error interface for this crate.
//!
//! Statement-level diagnostics are all [`StmtErr`] values.
//! They never abort an assembly run. They are attached to the statement
//! (and source line) which produced them and counted by the assembler.
//!
//! Run-level failures live in [`crate::asm::AsmErr`].

use std::borrow::Cow;

/// Unified error interface for all errors in this crate.
///
/// Note that the [`Display`] implementation is used for a brief message,
/// where as [`Error::help`] is used for any clarifying messages.
///
/// [`Display`]: std::fmt::Display
pub trait Error: std::error::Error {
    /// The 1-based source line where this error occurred, if known.
    fn line(&self) -> Option<usize> {
        None
    }

    /// A clarifying message to help aid someone in how to fix the message.
    ///
    /// By default this is `None`.
    fn help(&self) -> Option<Cow<str>> {
        None
    }
}

/// Any error raised while lexing or parsing a single statement.
///
/// A statement carries at most one of these.
/// Once one is raised, the rest of the statement is skipped.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum StmtErr {
    /// The mnemonic is not in the instruction catalog (or a comma was forgotten before a datalist).
    UnrecognizedMnemonic,
    /// A label was defined more than once.
    PreviouslyDefinedSymbol,
    /// A `B'...'` constant has no digits, more than 8 digits, or digits other than 0 and 1.
    InvalidBinaryConstant,
    /// A `+` or `-` was not followed by a constant.
    MissingConst,
    /// A symbol has no definition by the end of the first pass.
    UndefinedSymbol,
    /// The statement ended where an expression was required.
    ExpectedExpression,
    /// A `#...` or `X'...'` constant is not 1 to 4 hex digits.
    InvalidHexConstant,
    /// A quoted run was never closed (or a `T'` string is empty).
    MissingTrailingQuote,
    /// An `A.` address form was not `A.0(` or `A.1(`.
    PeriodError,
    /// The statement does not start with a letter or a comma.
    BadStart,
    /// A short branch targets a different page than the byte following the branch.
    BranchOutOfPage,
    /// A register operand is malformed, or is R0 where R0 is not allowed.
    InvalidRegister,
    /// An I/O device operand is malformed.
    InvalidDevice,
    /// A decimal constant is malformed or does not fit in 16 bits.
    InvalidDecimalConstant,
    /// An address form is missing its closing parenthesis.
    MissingParen,
    /// Any other unexpected text.
    InvalidSyntax,
}
impl StmtErr {
    /// The error number used by the original CRA assembler, if it had one.
    ///
    /// ```
    /// use cosmac_asm::err::StmtErr;
    ///
    /// assert_eq!(StmtErr::BranchOutOfPage.code(), Some(14));
    /// assert_eq!(StmtErr::InvalidSyntax.code(), None);
    /// ```
    pub fn code(&self) -> Option<u8> {
        match self {
            StmtErr::UnrecognizedMnemonic    => Some(1),
            StmtErr::PreviouslyDefinedSymbol => Some(2),
            StmtErr::InvalidBinaryConstant   => Some(4),
            StmtErr::MissingConst            => Some(6),
            StmtErr::UndefinedSymbol         => Some(7),
            StmtErr::ExpectedExpression      => Some(8),
            StmtErr::InvalidHexConstant      => Some(9),
            StmtErr::MissingTrailingQuote    => Some(10),
            StmtErr::PeriodError             => Some(11),
            StmtErr::BadStart                => Some(12),
            StmtErr::BranchOutOfPage         => Some(14),
            StmtErr::InvalidRegister         => Some(15),
            StmtErr::InvalidDevice           => Some(16),
            StmtErr::InvalidDecimalConstant  => None,
            StmtErr::MissingParen            => None,
            StmtErr::InvalidSyntax           => None,
        }
    }
}
impl std::fmt::Display for StmtErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StmtErr::UnrecognizedMnemonic    => f.write_str("Invalid mnemonic or missing comma"),
            StmtErr::PreviouslyDefinedSymbol => f.write_str("Previously defined symbol"),
            StmtErr::InvalidBinaryConstant   => f.write_str("Invalid binary constant"),
            StmtErr::MissingConst            => f.write_str("A constant was expected"),
            StmtErr::UndefinedSymbol         => f.write_str("Undefined symbol"),
            StmtErr::ExpectedExpression      => f.write_str("An expression was expected"),
            StmtErr::InvalidHexConstant      => f.write_str("Invalid hex constant"),
            StmtErr::MissingTrailingQuote    => f.write_str("Missing end quote"),
            StmtErr::PeriodError             => f.write_str("Invalid '.'"),
            StmtErr::BadStart                => f.write_str("Invalid char at start of statement"),
            StmtErr::BranchOutOfPage         => f.write_str("Branch out of page"),
            StmtErr::InvalidRegister         => f.write_str("Invalid register number"),
            StmtErr::InvalidDevice           => f.write_str("Invalid device number"),
            StmtErr::InvalidDecimalConstant  => f.write_str("Invalid decimal constant"),
            StmtErr::MissingParen            => f.write_str("Missing closing parentheses"),
            StmtErr::InvalidSyntax           => f.write_str("Syntax error"),
        }
    }
}
impl std::error::Error for StmtErr {}
impl Error for StmtErr {
    fn help(&self) -> Option<Cow<str>> {
        match self {
            StmtErr::UnrecognizedMnemonic    => Some("data following a label or instruction must be introduced by a comma".into()),
            StmtErr::PreviouslyDefinedSymbol => Some("labels must be unique within a file, try renaming one of the labels".into()),
            StmtErr::InvalidBinaryConstant   => Some("a binary constant is B' followed by 1 to 8 digits 0-1".into()),
            StmtErr::MissingConst            => Some("only a constant may follow + or -".into()),
            StmtErr::UndefinedSymbol         => Some("try defining this symbol with a label or an EQU".into()),
            StmtErr::ExpectedExpression      => None,
            StmtErr::InvalidHexConstant      => Some("a hex constant is # or X' followed by 1 to 4 digits 0-9, A-F".into()),
            StmtErr::MissingTrailingQuote    => Some("add a quote to the end of the string".into()),
            StmtErr::PeriodError             => Some("only A.0( and A.1( may contain a period".into()),
            StmtErr::BadStart                => Some("a statement starts with a label, a mnemonic, or a comma".into()),
            StmtErr::BranchOutOfPage         => Some("try a long branch (LBR, LBZ, ...) instead".into()),
            StmtErr::InvalidRegister         => Some("this must be R0-RF (R1-RF for LDN)".into()),
            StmtErr::InvalidDevice           => Some("expected a device number".into()),
            StmtErr::InvalidDecimalConstant  => Some(format!("a decimal constant is at most 5 digits 0-9 and at most {}", u16::MAX).into()),
            StmtErr::MissingParen            => Some("add a ) to close the address expression".into()),
            StmtErr::InvalidSyntax           => None,
        }
    }
}
