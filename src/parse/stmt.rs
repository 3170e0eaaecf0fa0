//! The CRA statement grammar.
//!
//! ```text
//! stmt     := [',' datalist]
//!           | IDENT ':' [',' datalist | body]
//!           | IDENT '=' expr
//!           | body
//! body     := 'DC' datalist | 'END' | 'PAGE' | 'ORG' expr
//!           | MNEMONIC [operand] [',' datalist]
//! datalist := (string | expr) (',' (string | expr))*
//! ```

use crate::asm::Pass;
use crate::ast::{Nucleus, Operand, StmtKind, Width};
use crate::err::StmtErr;
use crate::isa::{self, OperandShape};

use super::lex::{bare_hex, Token};
use super::Parser;

impl Parser<'_> {
    /// Parses the whole statement.
    pub(super) fn statement(&mut self) -> Result<Nucleus, StmtErr> {
        if self.skip_space() {
            return Ok(Nucleus::Nop);
        }
        if self.eat(',') {
            self.datalist()?;
            return Ok(Nucleus::Nop);
        }
        if !self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            return Err(StmtErr::BadStart);
        }
        let Ok(Token::Text(mut word)) = self.token() else {
            return Err(StmtErr::BadStart);
        };

        if self.eat(':') {
            self.label = Some(word);
            if self.skip_space() {
                return Ok(Nucleus::Nop);
            }
            if self.eat(',') {
                self.datalist()?;
                return Ok(Nucleus::Nop);
            }
            word = match self.token() {
                Ok(Token::Text(w)) => w,
                _ => return Err(StmtErr::UnrecognizedMnemonic),
            };
        } else {
            self.skip_space();
            if self.eat('=') {
                self.label = Some(word);
                self.kind = StmtKind::Equ;
                return Ok(Nucleus::Equ(self.expr()?.value));
            }
        }

        self.skip_space();
        match &*word {
            "DC" => {
                self.kind = StmtKind::Dc;
                self.datalist()?;
                Ok(Nucleus::Dc)
            },
            "END" => {
                self.kind = StmtKind::End;
                self.bare(Nucleus::End)
            },
            "PAGE" => {
                self.kind = StmtKind::Page;
                self.bare(Nucleus::Page)
            },
            "ORG" => {
                self.kind = StmtKind::Org;
                Ok(Nucleus::Org(self.expr()?.value))
            },
            _ => self.instruction(&word),
        }
    }

    /// Finishes a directive which takes no operand.
    fn bare(&mut self, nucleus: Nucleus) -> Result<Nucleus, StmtErr> {
        match self.token() {
            Ok(Token::Empty) => Ok(nucleus),
            _ => Err(StmtErr::InvalidSyntax),
        }
    }

    fn instruction(&mut self, mnemonic: &str) -> Result<Nucleus, StmtErr> {
        let instr = isa::lookup(mnemonic).ok_or(StmtErr::UnrecognizedMnemonic)?;
        self.kind = StmtKind::Instr;
        self.size = u16::from(instr.size);

        let operand = match instr.shape {
            OperandShape::None => None,
            OperandShape::Reg => {
                let reg = self.register()?;
                Some(Operand::Nibble(reg.unwrap_or(0)))
            },
            OperandShape::RegNonZero => match self.register()? {
                Some(0) => return Err(StmtErr::InvalidRegister),
                reg => Some(Operand::Nibble(reg.unwrap_or(1))),
            },
            OperandShape::IoDevice => {
                let dev = self.device()?;
                Some(Operand::Nibble(dev.unwrap_or(0)))
            },
            OperandShape::Expr => {
                let value = self.expr()?;
                match value.width {
                    // LDI A(LABEL) takes three bytes
                    Width::ForceTwo => {
                        self.size += 1;
                        Some(Operand::Word(value.value))
                    },
                    _ => Some(Operand::Byte(value.value as u8)),
                }
            },
            OperandShape::Addr8 => {
                let value = self.expr()?.value;
                let same_page = self.ctx.pc.wrapping_add(1) & 0xFF00 == value & 0xFF00;
                if !same_page && self.ctx.pass == Pass::Second {
                    return Err(StmtErr::BranchOutOfPage);
                }
                Some(Operand::Byte(value as u8))
            },
            OperandShape::Addr16 => Some(Operand::Word(self.expr()?.value)),
        };

        if !self.skip_space() {
            if !self.eat(',') {
                return Err(StmtErr::InvalidSyntax);
            }
            self.datalist()?;
        }
        Ok(Nucleus::Instr(instr, operand))
    }

    /// Reads a register operand (`R0`-`RF`, a constant, or a symbol).
    ///
    /// This is `None` if it refers to a symbol which is not yet defined on the first pass.
    fn register(&mut self) -> Result<Option<u8>, StmtErr> {
        let tk = self.token()?;
        if let Some(v) = tk.constant() {
            return Ok(Some(v as u8 & 0xF));
        }
        let Token::Text(name) = tk else {
            return Err(StmtErr::InvalidRegister);
        };

        if let Some(reg) = self.symbol_nibble(&name, 0xF) {
            return reg;
        }
        if let Some(digit) = name.strip_prefix('R').filter(|d| d.len() == 1) {
            return u8::from_str_radix(digit, 16)
                .map(Some)
                .map_err(|_| StmtErr::InvalidRegister);
        }
        self.unresolved_nibble(&name, 0xF)
    }

    /// Reads an I/O device operand (a constant or a symbol).
    ///
    /// This is `None` if it refers to a symbol which is not yet defined on the first pass.
    fn device(&mut self) -> Result<Option<u8>, StmtErr> {
        let tk = self.token()?;
        if let Some(v) = tk.constant() {
            return Ok(Some(v as u8 & 0x7));
        }
        let Token::Text(name) = tk else {
            return Err(StmtErr::InvalidDevice);
        };

        match self.symbol_nibble(&name, 0x7) {
            Some(dev) => dev,
            None => self.unresolved_nibble(&name, 0x7),
        }
    }

    /// Reads a declared symbol as a nibble operand.
    ///
    /// This is `None` if no symbol of that name was declared.
    fn symbol_nibble(&self, name: &str, mask: u8) -> Option<Result<Option<u8>, StmtErr>> {
        let sym = self.symbols.get(name)?;
        Some(match sym.value() {
            Some(v) => Ok(Some(v as u8 & mask)),
            None => self.unresolved(None),
        })
    }

    fn unresolved_nibble(&self, name: &str, mask: u8) -> Result<Option<u8>, StmtErr> {
        match bare_hex(name) {
            Some(v) => Ok(Some(v as u8 & mask)),
            None => self.unresolved(None),
        }
    }

    /// Reads a datalist into `self.data`.
    ///
    /// Strings contribute one byte per character. Expressions contribute
    /// one byte, or two bytes (high first) if they are wider than one byte.
    fn datalist(&mut self) -> Result<(), StmtErr> {
        while !self.skip_space() {
            match self.peek_token() {
                (Ok(Token::Str(s)), end) => {
                    self.data.extend(s.chars().map(|c| c as u8));
                    self.pos = end;
                },
                _ => {
                    let value = self.expr()?;
                    match value.width {
                        Width::One => self.data.push(value.value as u8),
                        _ => self.data.extend(value.value.to_be_bytes()),
                    }
                },
            }

            if !self.skip_space() && !self.eat(',') {
                return Err(StmtErr::InvalidSyntax);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::asm::{AssemblerContext, Pass, SymbolTable};
    use crate::ast::{Nucleus, Operand, Parsed, Rejected, StmtKind};
    use crate::err::StmtErr;
    use crate::isa;
    use crate::parse::parse_stmt;

    fn symbols() -> SymbolTable {
        let mut syms = SymbolTable::new();
        syms.define("LABEL", 0x1234, 0);
        syms.define("NEAR", 0x0120, 1);
        syms.define("FAR", 0x0230, 2);
        syms.define("SP", 2, 3);
        syms.define("ZERO", 0, 4);
        syms.define("KBD", 0x0B, 5);
        syms
    }
    fn parse_in(text: &str, pass: Pass) -> Result<Parsed, Rejected> {
        let ctx = AssemblerContext { pc: 0x0100, pass, error_count: 0 };
        parse_stmt(text, &ctx, &symbols())
    }
    fn parse(text: &str) -> Result<Parsed, Rejected> {
        parse_in(text, Pass::Second)
    }
    fn bytes(text: &str) -> Vec<u8> {
        parse(text).unwrap().encode()
    }
    fn instr(mnemonic: &str, operand: Option<Operand>) -> Nucleus {
        Nucleus::Instr(isa::lookup(mnemonic).unwrap(), operand)
    }
    fn assert_stmt_fail(text: &str, error: StmtErr) {
        assert_eq!(parse(text).unwrap_err().error, error, "{text:?}");
    }

    #[test]
    fn test_empty_and_labels() {
        let p = parse("   ").unwrap();
        assert_eq!((p.kind(), p.size()), (StmtKind::Nop, 0));
        assert_eq!(p.label, None);

        let p = parse("LOOP:").unwrap();
        assert_eq!((p.kind(), p.label.as_deref()), (StmtKind::Nop, Some("LOOP")));

        let p = parse("loop: inc r1").unwrap();
        assert_eq!(p.label.as_deref(), Some("LOOP"));
        assert_eq!(p.nucleus, instr("INC", Some(Operand::Nibble(1))));

        let p = parse("TABLE: ,1,2").unwrap();
        assert_eq!((p.kind(), p.label.as_deref()), (StmtKind::Nop, Some("TABLE")));
        assert_eq!(p.data, [1, 2]);
    }

    #[test]
    fn test_datalist_only() {
        let p = parse(",T'HI',#1234,5").unwrap();
        assert_eq!(p.kind(), StmtKind::Nop);
        assert_eq!(p.label, None);
        assert_eq!(p.encode(), [b'H', b'I', 0x12, 0x34, 5]);
    }

    #[test]
    fn test_equ() {
        let p = parse("COUNT = #10").unwrap();
        assert_eq!(p.label.as_deref(), Some("COUNT"));
        assert_eq!(p.nucleus, Nucleus::Equ(0x10));
        assert_eq!(p.size(), 0);

        let p = parse("HERE=*").unwrap();
        assert_eq!(p.nucleus, Nucleus::Equ(0x0100));

        let r = parse("BAD = NOWHERE").unwrap_err();
        assert_eq!(r.error, StmtErr::UndefinedSymbol);
        assert_eq!((r.label.as_deref(), r.kind), (Some("BAD"), StmtKind::Equ));
        assert_stmt_fail("BAD =", StmtErr::ExpectedExpression);
    }

    #[test]
    fn test_directives() {
        assert_eq!(parse("ORG #200").unwrap().nucleus, Nucleus::Org(0x200));
        assert_eq!(parse("ORG LABEL").unwrap().nucleus, Nucleus::Org(0x1234));
        assert_eq!(parse("END").unwrap().nucleus, Nucleus::End);
        assert_eq!(parse("  PAGE  ").unwrap().nucleus, Nucleus::Page);

        let p = parse("MSG: DC T'OK',A(LABEL),LABEL").unwrap();
        assert_eq!(p.kind(), StmtKind::Dc);
        assert_eq!(p.encode(), [b'O', b'K', 0x12, 0x34, 0x34]);

        assert_stmt_fail("END START", StmtErr::InvalidSyntax);
        assert_stmt_fail("PAGE 2", StmtErr::InvalidSyntax);
        assert_stmt_fail("ORG", StmtErr::ExpectedExpression);
    }

    #[test]
    fn test_bad_starts() {
        assert_stmt_fail("5 NOP", StmtErr::BadStart);
        assert_stmt_fail(":NOP", StmtErr::BadStart);
        assert_stmt_fail("B'101'", StmtErr::BadStart);
        assert_stmt_fail("MOV R1", StmtErr::UnrecognizedMnemonic);
        assert_stmt_fail("L: 5", StmtErr::UnrecognizedMnemonic);
        assert_stmt_fail("L: X = 5", StmtErr::UnrecognizedMnemonic);
        // forgot the comma before a datalist
        assert_stmt_fail("L: 1,2", StmtErr::UnrecognizedMnemonic);
    }

    #[test]
    fn test_registers() {
        assert_eq!(bytes("GLO R0"), [0x80]);
        assert_eq!(bytes("PHI RF"), [0xBF]);
        assert_eq!(bytes("SEP 3"), [0xD3]);
        assert_eq!(bytes("SEX SP"), [0xE2]);
        assert_eq!(bytes("STR A"), [0x5A]);
        assert_eq!(bytes("INC #1F"), [0x1F]);
        assert_eq!(bytes("LDN R1"), [0x01]);

        assert_stmt_fail("INC RG", StmtErr::InvalidRegister);
        assert_stmt_fail("INC", StmtErr::InvalidRegister);
        assert_stmt_fail("INC T'A'", StmtErr::InvalidRegister);
        assert_stmt_fail("INC R10", StmtErr::UndefinedSymbol);
        assert_stmt_fail("LDN R0", StmtErr::InvalidRegister);
        assert_stmt_fail("LDN ZERO", StmtErr::InvalidRegister);
    }

    #[test]
    fn test_register_forward_ref() {
        // only the second pass complains about undefined registers
        let p = parse_in("LDN LATER", Pass::First).unwrap();
        assert_eq!(p.size(), 1);
        assert_stmt_fail("LDN LATER", StmtErr::UndefinedSymbol);
    }

    #[test]
    fn test_devices() {
        assert_eq!(bytes("OUT 4"), [0x64]);
        assert_eq!(bytes("INP 7"), [0x6F]);
        assert_eq!(bytes("INP KBD"), [0x6B]);
        // no range check
        assert_eq!(bytes("OUT 0"), [0x60]);
        assert_eq!(bytes("OUT 9"), [0x61]);

        assert_stmt_fail("OUT", StmtErr::InvalidDevice);
        assert_stmt_fail("OUT PORT", StmtErr::UndefinedSymbol);
    }

    #[test]
    fn test_immediates() {
        assert_eq!(bytes("LDI 5"), [0xF8, 0x05]);
        assert_eq!(bytes("LDI A.0(LABEL)"), [0xF8, 0x34]);
        assert_eq!(bytes("LDI A.1(LABEL)"), [0xF8, 0x12]);
        // wide values are truncated...
        assert_eq!(bytes("ADI LABEL+1"), [0xFC, 0x35]);
        // ...except for A(...), which emits a whole word
        let p = parse("LDI A(LABEL)").unwrap();
        assert_eq!(p.size(), 3);
        assert_eq!(p.encode(), [0xF8, 0x12, 0x34]);

        assert_stmt_fail("LDI", StmtErr::ExpectedExpression);
    }

    #[test]
    fn test_branches() {
        assert_eq!(bytes("BR NEAR"), [0x30, 0x20]);
        assert_eq!(bytes("BZ *"), [0x32, 0x00]);
        assert_eq!(bytes("LBR LABEL"), [0xC0, 0x12, 0x34]);
        assert_eq!(bytes("NBR"), [0x38, 0x00]);
        assert_eq!(bytes("SKP"), [0x38]);

        assert_stmt_fail("BR FAR", StmtErr::BranchOutOfPage);
        // the page check is off for the first pass
        let p = parse_in("BR FAR", Pass::First).unwrap();
        assert_eq!(p.size(), 2);
    }

    #[test]
    fn test_branch_page_edge() {
        // the page is that of the byte after the opcode
        let ctx = AssemblerContext { pc: 0x01FF, pass: Pass::Second, error_count: 0 };
        let syms = symbols();
        assert!(parse_stmt("BR #0210", &ctx, &syms).is_ok());
        assert_eq!(parse_stmt("BR #01F0", &ctx, &syms).unwrap_err().error, StmtErr::BranchOutOfPage);
    }

    #[test]
    fn test_trailing() {
        let p = parse("LDI 1,2,A(LABEL)").unwrap();
        assert_eq!(p.encode(), [0xF8, 0x01, 0x02, 0x12, 0x34]);
        assert_eq!(p.size(), 5);

        assert_eq!(bytes("SEQ , T'A''B'"), [0x7B, b'A', b'\'', b'B']);

        assert_stmt_fail("NOP 5", StmtErr::InvalidSyntax);
        assert_stmt_fail("LDI 1 2", StmtErr::InvalidSyntax);
        assert_stmt_fail("DC 1 2", StmtErr::InvalidSyntax);
        assert_stmt_fail("DC T'A'+1", StmtErr::InvalidSyntax);
    }

    #[test]
    fn test_partial_info() {
        let r = parse("HERE: LDI 1,2,NOWHERE").unwrap_err();
        assert_eq!(r.error, StmtErr::UndefinedSymbol);
        assert_eq!(r.label.as_deref(), Some("HERE"));
        assert_eq!(r.size, 3);

        assert_eq!(r.kind, StmtKind::Instr);

        let r = parse("LBR NOWHERE").unwrap_err();
        assert_eq!(r.size, 3);

        let r = parse("MOV R1").unwrap_err();
        assert_eq!((r.kind, r.size), (StmtKind::Nop, 0));
    }

    #[test]
    fn test_lexer_errors_surface() {
        assert_stmt_fail("LDI B'102'", StmtErr::InvalidBinaryConstant);
        assert_stmt_fail("DC T'oops", StmtErr::MissingTrailingQuote);
        assert_stmt_fail("LDI X'FFFFF'", StmtErr::InvalidHexConstant);
        assert_stmt_fail("LDI 70000", StmtErr::InvalidDecimalConstant);
    }
}
