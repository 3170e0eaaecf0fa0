//! Evaluating CRA expressions.
//!
//! ```text
//! expr   := 'A' ['.' ('0' | '1')] '(' simple ')' | simple
//! simple := ('*' | constant | string | symbol) [('+' | '-') constant]
//! ```

use crate::ast::{Value, Width};
use crate::err::StmtErr;

use super::lex::{bare_hex, Token};
use super::Parser;

/// Which part of the inner value an address form selects.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum AddrPart {
    /// `A(...)`
    Whole,
    /// `A.0(...)`
    Low,
    /// `A.1(...)`
    High,
}

fn width_of(value: u16) -> Width {
    match value > 0xFF {
        true  => Width::Two,
        false => Width::One,
    }
}

impl Parser<'_> {
    /// Evaluates an expression at the cursor.
    pub(super) fn expr(&mut self) -> Result<Value, StmtErr> {
        if self.skip_space() {
            return Err(StmtErr::ExpectedExpression);
        }
        match self.address_form()? {
            Some(value) => Ok(value),
            None => self.simple(),
        }
    }

    /// Evaluates an `A(...)`, `A.0(...)` or `A.1(...)` form at the cursor.
    ///
    /// This is `None` (and the cursor is untouched) if the text at the cursor
    /// is not an address form, e.g. a symbol that starts with `A`.
    fn address_form(&mut self) -> Result<Option<Value>, StmtErr> {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        if !matches!(bytes.get(start), Some(b'A' | b'a')) || start + 1 >= bytes.len() {
            return Ok(None);
        }

        let mut aux = start + 1;
        let mut part = AddrPart::Whole;
        if bytes.get(aux) == Some(&b'.') {
            part = match bytes.get(aux + 1) {
                Some(b'0') => AddrPart::Low,
                Some(b'1') => AddrPart::High,
                _ => return Err(StmtErr::PeriodError),
            };
            aux += 2;
        }
        while bytes.get(aux).is_some_and(u8::is_ascii_whitespace) {
            aux += 1;
        }
        if bytes.get(aux) != Some(&b'(') {
            return match part {
                AddrPart::Whole => Ok(None),
                _ => Err(StmtErr::PeriodError),
            };
        }

        self.pos = aux + 1;
        let inner = self.simple()?;
        self.skip_space();
        if !self.eat(')') {
            return Err(StmtErr::MissingParen);
        }

        let value = match part {
            AddrPart::Whole => Value::new(inner.value, Width::ForceTwo),
            AddrPart::Low   => Value::new(inner.value & 0xFF, Width::One),
            AddrPart::High  => Value::new(inner.value >> 8, Width::One),
        };
        Ok(Some(value))
    }

    /// Evaluates a simple expression (a term with an optional constant offset).
    fn simple(&mut self) -> Result<Value, StmtErr> {
        if self.skip_space() {
            return Err(StmtErr::ExpectedExpression);
        }

        let (value, mut width) = if self.eat('*') {
            (self.ctx.pc, Width::Two)
        } else {
            match self.token()? {
                Token::Text(name) => self.resolve(&name)?,
                Token::Str(s) => (s.chars().next().map_or(0, |c| u16::from(c as u8)), Width::One),
                tk => match tk.constant() {
                    Some(v) => (v, width_of(v)),
                    None => return Err(StmtErr::ExpectedExpression),
                },
            }
        };

        self.skip_space();
        let value = match self.peek() {
            Some(op @ ('+' | '-')) => {
                self.pos += 1;
                self.skip_space();
                let offset = self.token()?
                    .constant()
                    .ok_or(StmtErr::MissingConst)?;

                width = Width::Two;
                match op {
                    '+' => value.wrapping_add(offset),
                    _   => value.wrapping_sub(offset),
                }
            },
            _ => value,
        };

        Ok(Value::new(value, width))
    }

    /// Finds the value of an identifier used as a term.
    fn resolve(&self, name: &str) -> Result<(u16, Width), StmtErr> {
        // a declared symbol shadows the hex reading of its name, even without a value
        if let Some(sym) = self.symbols.get(name) {
            return match sym.value() {
                Some(value) => Ok((value, Width::One)),
                None => self.unresolved((0, Width::One)),
            };
        }

        match bare_hex(name) {
            Some(value) => Ok((value, width_of(value))),
            // forward reference, resolved next pass
            None => self.unresolved((0, Width::One)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::asm::{AssemblerContext, Pass, SymbolTable};
    use crate::ast::{Value, Width};
    use crate::err::StmtErr;
    use crate::parse::Parser;

    fn symbols() -> SymbolTable {
        let mut syms = SymbolTable::new();
        syms.define("LABEL", 0x1234, 0);
        syms.define("SMALL", 0x12, 1);
        syms.define("ADDR", 0x0300, 2);
        syms
    }
    fn eval_in(text: &str, pass: Pass, pc: u16) -> Result<Value, StmtErr> {
        let ctx = AssemblerContext { pc, pass, error_count: 0 };
        let syms = symbols();
        Parser::new(text, &ctx, &syms).expr()
    }
    fn eval(text: &str) -> Result<Value, StmtErr> {
        eval_in(text, Pass::Second, 0x0100)
    }
    fn val(value: u16, width: Width) -> Result<Value, StmtErr> {
        Ok(Value::new(value, width))
    }

    #[test]
    fn test_constants() {
        assert_eq!(eval("5"), val(5, Width::One));
        assert_eq!(eval("#FF"), val(0xFF, Width::One));
        assert_eq!(eval("#100"), val(0x100, Width::Two));
        assert_eq!(eval("B'1011'"), val(0x0B, Width::One));
        assert_eq!(eval("D'1234'"), val(0x04D2, Width::Two));
        assert_eq!(eval("T'AB'"), val(u16::from(b'A'), Width::One));
        assert_eq!(eval("  X'1F'"), val(0x1F, Width::One));
    }

    #[test]
    fn test_symbols() {
        // bare symbols are always one byte wide
        assert_eq!(eval("LABEL"), val(0x1234, Width::One));
        assert_eq!(eval("small"), val(0x12, Width::One));

        // undefined symbols which look like hex are hex
        assert_eq!(eval("FF"), val(0xFF, Width::One));
        assert_eq!(eval("1F"), Err(StmtErr::InvalidDecimalConstant));
        assert_eq!(eval("BEEF"), val(0xBEEF, Width::Two));

        assert_eq!(eval("NOWHERE"), Err(StmtErr::UndefinedSymbol));
        assert_eq!(eval_in("NOWHERE", Pass::First, 0), val(0, Width::One));
    }

    #[test]
    fn test_pc() {
        assert_eq!(eval_in("*", Pass::Second, 0x0042), val(0x42, Width::Two));
        assert_eq!(eval_in("*+2", Pass::Second, 0x0042), val(0x44, Width::Two));
        assert_eq!(eval_in("* - 3", Pass::Second, 0x0001), val(0xFFFE, Width::Two));
    }

    #[test]
    fn test_offsets() {
        assert_eq!(eval("SMALL+1"), val(0x13, Width::Two));
        assert_eq!(eval("LABEL-#34"), val(0x1200, Width::Two));
        assert_eq!(eval("2+2"), val(4, Width::Two));
        assert_eq!(eval("SMALL+"), Err(StmtErr::MissingConst));
        assert_eq!(eval("SMALL+LABEL"), Err(StmtErr::MissingConst));
        assert_eq!(eval("SMALL+#XY"), Err(StmtErr::InvalidHexConstant));
    }

    #[test]
    fn test_address_forms() {
        assert_eq!(eval("A(LABEL)"), val(0x1234, Width::ForceTwo));
        assert_eq!(eval("A(SMALL)"), val(0x12, Width::ForceTwo));
        assert_eq!(eval("A.0(LABEL)"), val(0x34, Width::One));
        assert_eq!(eval("a.1(LABEL)"), val(0x12, Width::One));
        assert_eq!(eval("A.1 ( LABEL + 1 )"), val(0x12, Width::One));
        assert_eq!(eval("A.0(*)"), val(0x00, Width::One));

        // symbols which begin with A are not address forms
        assert_eq!(eval("ADDR"), val(0x0300, Width::One));
        assert_eq!(eval("A"), val(0xA, Width::One));
    }

    #[test]
    fn test_address_form_errors() {
        assert_eq!(eval("A.2(LABEL)"), Err(StmtErr::PeriodError));
        assert_eq!(eval("A.0 LABEL"), Err(StmtErr::PeriodError));
        assert_eq!(eval("A."), Err(StmtErr::PeriodError));
        assert_eq!(eval("A(LABEL"), Err(StmtErr::MissingParen));
        assert_eq!(eval("A(LABEL,"), Err(StmtErr::MissingParen));
        assert_eq!(eval("A()"), Err(StmtErr::ExpectedExpression));
    }

    #[test]
    fn test_missing() {
        assert_eq!(eval(""), Err(StmtErr::ExpectedExpression));
        assert_eq!(eval("   "), Err(StmtErr::ExpectedExpression));
        assert_eq!(eval(",5"), Err(StmtErr::ExpectedExpression));
    }
}
