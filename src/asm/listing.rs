//! Text renderings of an assembler run.
//!
//! - [`ListingLine`] displays as one or more listing rows followed by its errors:
//!   ```text
//!   0010 B2            ;0002 START: LDI A.1(MSG); PHI R2
//!   >>> Undefined symbol
//!   ```
//! - [`SymbolTable`] displays as a symbol dump.
//! - [`Assembly`] displays as the full listing, the diagnostic summary and the symbol dump.

use std::fmt;

use super::{Assembly, ListingLine, SymbolTable};

/// The most object bytes shown on one listing row.
const BYTES_PER_ROW: usize = 7;
/// Symbol names in the dump are padded or cut to this many characters.
const NAME_LEN: usize = 8;

impl fmt::Display for ListingLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rows = self.bytes.chunks(BYTES_PER_ROW);

        let first = rows.next().unwrap_or_default();
        write!(f, "{:04X} {:<w$};{:04}", self.addr, hex(first), self.line, w = 2 * BYTES_PER_ROW)?;
        if !self.source.is_empty() {
            write!(f, " {}", self.source)?;
        }

        for (i, row) in rows.enumerate() {
            let addr = self.addr.wrapping_add(((i + 1) * BYTES_PER_ROW) as u16);
            write!(f, "\n{addr:04X} {:<w$};", hex(row), w = 2 * BYTES_PER_ROW)?;
        }
        for err in &self.errors {
            write!(f, "\n>>> {err}")?;
        }
        Ok(())
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

impl fmt::Display for SymbolTable {
    /// Prints the symbol dump, one symbol per line in definition order.
    ///
    /// ```
    /// use cosmac_asm::asm::assemble;
    ///
    /// let asm = assemble("COUNTER = D'300'\nLOOPSTART: NOP\n END").unwrap();
    /// assert_eq!(asm.symbols().to_string(), "\
    /// Symbol   Hex    Dec
    /// COUNTER  012C   300
    /// LOOPSTAR 0000     0
    /// ");
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<NAME_LEN$} Hex    Dec", "Symbol")?;
        for (name, sym) in self.iter() {
            let name: String = name.chars().take(NAME_LEN).collect();
            match sym.value() {
                Some(v) => writeln!(f, "{name:<NAME_LEN$} {v:04X} {v:>5}")?,
                None    => writeln!(f, "{name:<NAME_LEN$} ????")?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        for warning in &self.warnings {
            writeln!(f, "{warning}")?;
        }
        writeln!(f, "{} errors", self.error_count)?;
        writeln!(f)?;
        write!(f, "{}", self.symbols)
    }
}
