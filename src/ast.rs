//! Components relating to the typed intermediate form of a statement.
//!
//! A statement's text is parsed (once per pass) into either:
//! - a [`Parsed`] statement (a label, a [`Nucleus`], and any trailing datalist bytes), or
//! - a [`Rejected`] statement (the error plus whatever could be salvaged).
//!
//! The assembler keeps one [`Statement`] record per statement across both passes.

use crate::err::StmtErr;
use crate::isa::Instruction;

/// How many bytes an evaluated expression needs.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Width {
    /// Fits in one byte.
    One,
    /// Needs two bytes (constants above `0xFF`, `*`, and any `+`/`-` expression).
    Two,
    /// Must be emitted as two bytes, even where one byte is normally expected.
    ///
    /// This is produced by the `A(...)` form.
    ForceTwo,
}

/// The result of evaluating an expression.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Value {
    /// The 16-bit value.
    pub value: u16,
    /// The width the value requires.
    pub width: Width,
}
impl Value {
    pub(crate) fn new(value: u16, width: Width) -> Self {
        Value { value, width }
    }
}

/// An operand, ready to be encoded with its instruction.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Operand {
    /// A register or device number, OR'd into the opcode.
    Nibble(u8),
    /// One byte following the opcode.
    Byte(u8),
    /// Two bytes following the opcode (high byte first).
    Word(u16),
}

/// The kind of a statement.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum StmtKind {
    /// Nothing but (optionally) a label and a datalist.
    #[default]
    Nop,
    /// `DC`
    Dc,
    /// `LABEL = expr`
    Equ,
    /// `ORG`
    Org,
    /// `PAGE`
    Page,
    /// `END`
    End,
    /// A machine instruction.
    Instr,
    /// Any statement that failed to assemble.
    Error,
}

/// The body of a successfully parsed statement.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Nucleus {
    /// Empty statement, label-only statement, or datalist-only statement.
    Nop,
    /// `DC datalist`
    Dc,
    /// `LABEL = expr`
    Equ(u16),
    /// `ORG expr`
    Org(u16),
    /// `PAGE`
    Page,
    /// `END`
    End,
    /// A machine instruction and its operand.
    Instr(&'static Instruction, Option<Operand>),
}

/// A successfully parsed statement.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Parsed {
    /// The label (or EQU name) of the statement.
    pub label: Option<String>,
    /// What the statement does.
    pub nucleus: Nucleus,
    /// The bytes of the statement's datalist, if any.
    pub data: Vec<u8>,
}
impl Parsed {
    /// The kind of this statement.
    pub fn kind(&self) -> StmtKind {
        match self.nucleus {
            Nucleus::Nop      => StmtKind::Nop,
            Nucleus::Dc       => StmtKind::Dc,
            Nucleus::Equ(_)   => StmtKind::Equ,
            Nucleus::Org(_)   => StmtKind::Org,
            Nucleus::Page     => StmtKind::Page,
            Nucleus::End      => StmtKind::End,
            Nucleus::Instr(..) => StmtKind::Instr,
        }
    }

    /// The number of bytes this statement occupies in memory.
    pub fn size(&self) -> u16 {
        let instr = match self.nucleus {
            Nucleus::Instr(instr, operand) => instr.encoded_len(operand),
            _ => 0,
        };
        // datalists are bounded by the statement text, which can't approach 64K
        instr.wrapping_add(self.data.len() as u16)
    }

    /// The object bytes of this statement.
    ///
    /// ```
    /// use cosmac_asm::asm::{AssemblerContext, SymbolTable};
    /// use cosmac_asm::parse::parse_stmt;
    ///
    /// let ctx = AssemblerContext::default();
    /// let syms = SymbolTable::new();
    ///
    /// let stmt = parse_stmt("LDI #2A,T'OK'", &ctx, &syms).unwrap();
    /// assert_eq!(stmt.encode(), [0xF8, 0x2A, b'O', b'K']);
    /// ```
    pub fn encode(&self) -> Vec<u8> {
        let mut out = match self.nucleus {
            Nucleus::Instr(instr, operand) => instr.encode(operand),
            _ => vec![],
        };
        out.extend_from_slice(&self.data);
        out
    }
}

/// A statement which failed to parse.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Rejected {
    /// Why the statement failed.
    pub error: StmtErr,
    /// The statement's label (or EQU name), if it was read before the failure.
    pub label: Option<String>,
    /// What the statement was recognized as before the failure.
    ///
    /// This is [`StmtKind::Nop`] if the failure happened before that was known.
    pub kind: StmtKind,
    /// The number of bytes the statement was known to occupy before the failure.
    pub size: u16,
}

/// A statement of the program and everything the assembler learned about it.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Statement {
    /// The 1-based source line the statement was found on.
    pub line: usize,
    /// The text of the statement, with comments and separators removed.
    pub text: String,
    /// The statement's label.
    pub label: Option<String>,
    /// The statement's kind. This is [`StmtKind::Error`] if `error` is set.
    pub kind: StmtKind,
    /// The statement's address, computed by the second pass.
    pub addr: u16,
    /// The statement's size, computed by the first pass.
    pub size: u16,
    /// The statement's object bytes, computed by the second pass.
    pub bytes: Vec<u8>,
    /// The statement's error, if any.
    pub error: Option<StmtErr>,
}
impl Statement {
    /// Creates a new statement which has yet to be assembled.
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Statement { line, text: text.into(), ..Default::default() }
    }

    /// Records the result of parsing this statement.
    pub(crate) fn record(&mut self, result: &Result<Parsed, Rejected>) {
        match result {
            Ok(p) => {
                self.label.clone_from(&p.label);
                self.kind = p.kind();
                self.error = None;
            },
            Err(r) => {
                self.label.clone_from(&r.label);
                self.fail(r.error);
            },
        }
    }

    /// Marks this statement as failed.
    pub(crate) fn fail(&mut self, error: StmtErr) {
        self.kind = StmtKind::Error;
        self.error = Some(error);
        self.bytes.clear();
    }
}
