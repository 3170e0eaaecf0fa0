//! Assembling CRA source text into object code.
//!
//! Assembly is done in two passes over the statements of the program:
//! - The first pass lays out the program, computing every statement's size
//!   and defining every label in the [`SymbolTable`].
//! - The second pass parses every statement again (now with all symbols known),
//!   generates object bytes, and collects diagnostics.
//!
//! The assembler module notably consists of:
//! - [`assemble`] and [`assemble_with`]: The main functions which assemble source text into an [`Assembly`].
//! - [`SymbolTable`]: the symbol table built by the first pass
//! - [`Assembly`]: the result of an assembly run: listing lines, statements, symbols, and diagnostics
//!
//! Statement errors do not stop assembly. They are recorded on their statement
//! and listing line. Only exceeding the error ceiling ([`AsmFlags::error_limit`])
//! aborts a run, with an [`AsmErr`].

pub mod listing;
mod symbols;

pub use symbols::{Symbol, SymbolTable};

use crate::ast::{Nucleus, Statement, StmtKind};
use crate::err::StmtErr;
use crate::parse::{parse_stmt, split_source};

/// Which pass the assembler is currently on.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum Pass {
    /// Layout: statement sizes and symbol addresses.
    #[default]
    First,
    /// Code generation.
    Second,
}

/// The state of an assembler run, as seen by the parser.
///
/// This is reset at the start of each pass.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct AssemblerContext {
    /// The program counter at the start of the current statement.
    pub pc: u16,
    /// The current pass.
    pub pass: Pass,
    /// The number of statement errors found so far.
    pub error_count: u32,
}

/// Configuration for an assembler run.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct AsmFlags {
    /// The maximum number of statement errors allowed before the run is aborted.
    pub error_limit: u32,
    /// The program counter at the start of each pass.
    pub origin: u16,
}
impl Default for AsmFlags {
    fn default() -> Self {
        Self { error_limit: 100, origin: 0 }
    }
}

/// Kinds of errors which abort an assembler run.
///
/// See [`AsmErr`] for this error type with line information included.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum AsmErrKind {
    /// More errors than the given limit were found.
    ErrorLimit(u32),
}
impl std::fmt::Display for AsmErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ErrorLimit(limit) => write!(f, "too many errors (more than {limit})"),
        }
    }
}

/// Error which aborted an assembler run.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct AsmErr {
    /// The kind of error.
    pub kind: AsmErrKind,
    /// The 1-based source line the assembler was on when it stopped.
    pub line: usize,
}
impl AsmErr {
    /// Creates a new [`AsmErr`].
    pub fn new(kind: AsmErrKind, line: usize) -> Self {
        AsmErr { kind, line }
    }
}
impl std::fmt::Display for AsmErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}
impl std::error::Error for AsmErr {}
impl crate::err::Error for AsmErr {
    fn line(&self) -> Option<usize> {
        Some(self.line)
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self.kind {
            AsmErrKind::ErrorLimit(_) => Some("fix the errors reported so far and assemble again".into()),
        }
    }
}

/// Non-fatal diagnostics about the program as a whole.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum AsmWarning {
    /// The source ended without an `END` directive.
    MissingEnd,
}
impl std::fmt::Display for AsmWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnd => f.write_str("Missing END directive"),
        }
    }
}

/// The assembled form of one source line.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ListingLine {
    /// The 1-based line number.
    pub line: usize,
    /// The text of the line.
    pub source: String,
    /// The program counter at the start of the line.
    pub addr: u16,
    /// The object bytes of every statement on the line, in order.
    pub bytes: Vec<u8>,
    /// The errors of every statement on the line, in order.
    pub errors: Vec<StmtErr>,
}
impl ListingLine {
    fn new(line: usize, source: &str, addr: u16) -> Self {
        ListingLine { line, source: source.to_string(), addr, bytes: vec![], errors: vec![] }
    }
}

/// The result of an assembler run.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Assembly {
    lines: Vec<ListingLine>,
    statements: Vec<Statement>,
    symbols: SymbolTable,
    error_count: u32,
    warnings: Vec<AsmWarning>,
}
impl Assembly {
    /// The listing, one entry per source line up to (and including) the `END` directive.
    pub fn lines(&self) -> &[ListingLine] {
        &self.lines
    }

    /// Every statement of the program, as left by the second pass.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// The final symbol table.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// The number of statement errors.
    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Diagnostics about the program as a whole.
    pub fn warnings(&self) -> &[AsmWarning] {
        &self.warnings
    }

    /// Whether the program assembled without any errors.
    pub fn is_ok(&self) -> bool {
        self.error_count == 0
    }

    /// The memory image of the program, as `(address, byte)` pairs in program order.
    ///
    /// If the program writes an address more than once, the address appears more than once.
    pub fn memory(&self) -> impl Iterator<Item=(u16, u8)> + '_ {
        self.statements.iter()
            .flat_map(|stmt| {
                stmt.bytes.iter()
                    .enumerate()
                    .map(|(i, &b)| (stmt.addr.wrapping_add(i as u16), b))
            })
    }
}

/// Assembles source text with the default [`AsmFlags`].
///
/// # Example
/// ```
/// use cosmac_asm::asm::assemble;
///
/// let src = "
///     ORG #10
/// START: LDI A.1(MSG); PHI R2
///     BR START
/// MSG: DC T'HI'
///     END
/// ";
/// let asm = assemble(src).unwrap();
/// assert!(asm.is_ok());
/// assert_eq!(asm.symbols().value_of("MSG"), Some(0x0015));
///
/// let image: Vec<_> = asm.memory().collect();
/// assert_eq!(image[0], (0x0010, 0xF8));
/// ```
pub fn assemble(src: &str) -> Result<Assembly, AsmErr> {
    assemble_with(src, AsmFlags::default())
}

/// Assembles source text.
///
/// This only fails if the program has more errors than `flags.error_limit`.
/// Statement errors are otherwise reported through the returned [`Assembly`].
pub fn assemble_with(src: &str, flags: AsmFlags) -> Result<Assembly, AsmErr> {
    let mut asm = Assembler::new(src, flags);
    asm.first_pass();
    let lines = asm.second_pass(src)?;

    log::debug!(
        "assembled {} statements: {} errors, {} warnings, {} symbols",
        asm.stmts.len(), asm.ctx.error_count, asm.warnings.len(), asm.symbols.len()
    );
    Ok(Assembly {
        lines,
        error_count: asm.ctx.error_count,
        statements: asm.stmts,
        symbols: asm.symbols,
        warnings: asm.warnings,
    })
}

struct Assembler {
    flags: AsmFlags,
    ctx: AssemblerContext,
    symbols: SymbolTable,
    stmts: Vec<Statement>,
    warnings: Vec<AsmWarning>,
}
impl Assembler {
    fn new(src: &str, flags: AsmFlags) -> Self {
        Assembler {
            flags,
            ctx: AssemblerContext::default(),
            symbols: SymbolTable::new(),
            stmts: split_source(src),
            warnings: vec![],
        }
    }

    fn start_pass(&mut self, pass: Pass) {
        log::debug!("starting {pass:?} pass at {:04X}", self.flags.origin);
        self.ctx = AssemblerContext { pc: self.flags.origin, pass, error_count: 0 };
    }

    fn first_pass(&mut self) {
        self.start_pass(Pass::First);
        let mut ended = false;

        for (site, stmt) in self.stmts.iter_mut().enumerate() {
            let result = parse_stmt(&stmt.text, &self.ctx, &self.symbols);
            stmt.record(&result);
            let pc = self.ctx.pc;

            match result {
                Ok(parsed) => {
                    stmt.size = parsed.size();
                    if let Some(label) = &parsed.label {
                        let value = match parsed.nucleus {
                            Nucleus::Equ(value) => value,
                            _ => pc,
                        };
                        define(&mut self.symbols, label, value, site);
                    }

                    match parsed.nucleus {
                        Nucleus::Equ(_) => {},
                        Nucleus::Org(addr) => set_pc(&mut self.ctx, addr),
                        Nucleus::Page => set_pc(&mut self.ctx, next_page(pc)),
                        Nucleus::End => {
                            ended = true;
                            break;
                        },
                        _ => self.ctx.pc = pc.wrapping_add(stmt.size),
                    }
                },
                Err(rejected) => {
                    stmt.size = rejected.size;
                    if let Some(label) = &rejected.label {
                        // a broken EQU has no value to give its name
                        match rejected.kind {
                            StmtKind::Equ => { self.symbols.declare(label, site); },
                            _ => define(&mut self.symbols, label, pc, site),
                        }
                    }
                    self.ctx.pc = pc.wrapping_add(stmt.size);
                },
            }
        }

        if !ended {
            log::warn!("{}", AsmWarning::MissingEnd);
            self.warnings.push(AsmWarning::MissingEnd);
        }
    }

    fn second_pass(&mut self, src: &str) -> Result<Vec<ListingLine>, AsmErr> {
        self.start_pass(Pass::Second);
        let source: Vec<_> = src.lines().collect();
        let mut lines: Vec<ListingLine> = vec![];
        let mut ended = false;

        for (site, stmt) in self.stmts.iter_mut().enumerate() {
            // list every line up to this statement's, including lines without statements
            while lines.len() < stmt.line {
                let n = lines.len() + 1;
                let text = source.get(n - 1).copied().unwrap_or_default();
                lines.push(ListingLine::new(n, text, self.ctx.pc));
            }

            let pc = self.ctx.pc;
            stmt.addr = pc;
            let result = parse_stmt(&stmt.text, &self.ctx, &self.symbols);
            stmt.record(&result);

            let redefined = stmt.label.as_deref()
                .and_then(|label| self.symbols.get(label))
                .is_some_and(|sym| sym.is_duplicate() && sym.site() != site);

            match result {
                Ok(_) if redefined => stmt.fail(StmtErr::PreviouslyDefinedSymbol),
                Ok(parsed) => match parsed.nucleus {
                    Nucleus::Equ(value) => {
                        if let Some(label) = &parsed.label {
                            log::trace!("bound {label} to {value:04X}");
                            self.symbols.rebind(label, value);
                        }
                    },
                    Nucleus::Org(addr) => set_pc(&mut self.ctx, addr),
                    Nucleus::Page => set_pc(&mut self.ctx, next_page(pc)),
                    Nucleus::End => ended = true,
                    _ => {
                        stmt.bytes = parsed.encode();
                        let len = stmt.bytes.len() as u16;
                        if len != stmt.size {
                            log::debug!("line {}: statement is {len} bytes, but was laid out as {}", stmt.line, stmt.size);
                        }
                        if let Some(line) = lines.last_mut() {
                            line.bytes.extend_from_slice(&stmt.bytes);
                        }
                        self.ctx.pc = pc.wrapping_add(len);
                    },
                },
                Err(_) => {},
            }

            if let Some(err) = stmt.error {
                self.ctx.pc = pc.wrapping_add(stmt.size);
                if let Some(line) = lines.last_mut() {
                    line.errors.push(err);
                }

                self.ctx.error_count += 1;
                if self.ctx.error_count > self.flags.error_limit {
                    log::error!("stopping at line {}: more than {} errors", stmt.line, self.flags.error_limit);
                    return Err(AsmErr::new(AsmErrKind::ErrorLimit(self.flags.error_limit), stmt.line));
                }
            }

            if ended {
                break;
            }
        }

        // without an END, the rest of the source is listed too
        if !ended {
            for (i, text) in source.iter().enumerate().skip(lines.len()) {
                lines.push(ListingLine::new(i + 1, text, self.ctx.pc));
            }
        }
        Ok(lines)
    }
}

fn define(symbols: &mut SymbolTable, label: &str, value: u16, site: usize) {
    match symbols.define(label, value, site) {
        true  => log::trace!("defined {label} as {value:04X}"),
        false => log::trace!("{label} is already defined"),
    }
}

fn set_pc(ctx: &mut AssemblerContext, addr: u16) {
    log::debug!("set program counter to {addr:04X}");
    ctx.pc = addr;
}

/// The start of the page after the one `pc` is in.
fn next_page(pc: u16) -> u16 {
    pc.wrapping_add(0x100) & 0xFF00
}
