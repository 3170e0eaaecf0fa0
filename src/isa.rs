//! The CDP1802 instruction catalog.
//!
//! Every instruction the assembler knows about is listed exactly once in [`INSTRUCTIONS`].
//! The two lookup directions are derived from that list when they are first used:
//! - [`lookup`] maps a mnemonic to its catalog entry (one-to-one),
//! - [`decode`] maps any opcode byte back to its canonical entry (many-to-one).
//!
//! When several mnemonics share an opcode (e.g., `BDF`, `BPZ`, `BGE`),
//! the one listed first wins the reverse direction.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::ast::Operand;

/// The kind of operand an instruction takes.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum OperandShape {
    /// No operand.
    None,
    /// A register `R0`-`RF`, OR'd into the low nibble of the opcode.
    Reg,
    /// A register `R1`-`RF`, OR'd into the low nibble of the opcode (`R0` would encode `IDL`).
    RegNonZero,
    /// An I/O device `1`-`7`, OR'd into the low 3 bits of the opcode.
    IoDevice,
    /// An immediate byte following the opcode.
    Expr,
    /// The low byte of a branch target on the same page, following the opcode.
    Addr8,
    /// A full 16-bit address following the opcode, high byte first.
    Addr16,
}

/// A single entry of the instruction catalog.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    /// The assembler mnemonic (e.g., `LDI`).
    pub mnemonic: &'static str,
    /// A short human-readable name.
    pub name: &'static str,
    /// The opcode with a zero operand nibble.
    pub opcode: u8,
    /// What operand the instruction takes.
    pub shape: OperandShape,
    /// Number of machine cycles to execute.
    pub cycles: u8,
    /// Number of bytes the instruction occupies.
    pub size: u8,
    /// Register-transfer description of the operation.
    pub operation: &'static str,
}

macro_rules! catalog {
    ($($mn:literal $op:literal $shape:ident $cycles:literal $size:literal $name:literal $desc:literal;)+) => {
        &[$(
            Instruction {
                mnemonic: $mn,
                name: $name,
                opcode: $op,
                shape: OperandShape::$shape,
                cycles: $cycles,
                size: $size,
                operation: $desc,
            }
        ),+]
    };
}

/// All instructions of the CDP1802, by class of operation.
///
/// Order matters for aliases: the first mnemonic listed for an opcode
/// is the one [`decode`] reports.
pub static INSTRUCTIONS: &[Instruction] = catalog! {
    // register operations
    "INC"  0x10 Reg        2 1 "INCREMENT REG N"  "R(N)+1";
    "DEC"  0x20 Reg        2 1 "DECREMENT REG N"  "R(N)-1";
    "IRX"  0x60 None       2 1 "INCREMENT REG X"  "R(X)+1";
    "GLO"  0x80 Reg        2 1 "GET LOW REG N"    "R(N).0->D";
    "PLO"  0xA0 Reg        2 1 "PUT LOW REG N"    "D->R(N).0";
    "GHI"  0x90 Reg        2 1 "GET HIGH REG N"   "R(N).1->D";
    "PHI"  0xB0 Reg        2 1 "PUT HIGH REG N"   "D->R(N).1";
    // memory reference
    "LDN"  0x00 RegNonZero 2 1 "LOAD VIA N"                 "M(R(N))->D; FOR N NOT 0";
    "LDA"  0x40 Reg        2 1 "LOAD ADVANCE"               "M(R(N))->D; R(N)+1";
    "LDX"  0xF0 None       2 1 "LOAD VIA X"                 "M(R(X))->D";
    "LDXA" 0x72 None       2 1 "LOAD VIA X AND ADVANCE"     "M(R(X))->D; R(X)+1";
    "LDI"  0xF8 Expr       2 2 "LOAD IMMEDIATE"             "M(R(P))->D; R(P)+1";
    "STR"  0x50 Reg        2 1 "STORE VIA N"                "D->M(R(N))";
    "STXD" 0x73 None       2 1 "STORE VIA X AND DECREMENT"  "D->M(R(X)); R(X)-1";
    // logic operations
    "OR"   0xF1 None       2 1 "OR"                         "M(R(X)) OR D->D";
    "ORI"  0xF9 Expr       2 2 "OR IMMEDIATE"               "M(R(P)) OR D->D; R(P)+1";
    "XOR"  0xF3 None       2 1 "EXCLUSIVE OR"               "M(R(X)) XOR D->D";
    "XRI"  0xFB Expr       2 2 "EXCLUSIVE OR IMMEDIATE"     "M(R(P)) XOR D->D; R(P)+1";
    "AND"  0xF2 None       2 1 "AND"                        "M(R(X)) AND D->D";
    "ANI"  0xFA Expr       2 2 "AND IMMEDIATE"              "M(R(P)) AND D->D; R(P)+1";
    "SHR"  0xF6 None       2 1 "SHIFT RIGHT"                "SHIFT D RIGHT, LSB(D)->DF, 0->MSB(D)";
    "SHRC" 0x76 None       2 1 "SHIFT RIGHT WITH CARRY"     "SHIFT D RIGHT, LSB(D)->DF, DF->MSB(D)";
    "RSHR" 0x76 None       2 1 "RING SHIFT RIGHT"           "SHIFT D RIGHT, LSB(D)->DF, DF->MSB(D)";
    "SHL"  0xFE None       2 1 "SHIFT LEFT"                 "SHIFT D LEFT, MSB(D)->DF, 0->LSB(D)";
    "SHLC" 0x7E None       2 1 "SHIFT LEFT WITH CARRY"      "SHIFT D LEFT, MSB(D)->DF, DF->LSB(D)";
    "RSHL" 0x7E None       2 1 "RING SHIFT LEFT"            "SHIFT D LEFT, MSB(D)->DF, DF->LSB(D)";
    // arithmetic operations
    "ADD"  0xF4 None       2 1 "ADD"                                    "M(R(X))+D->DF, D";
    "ADI"  0xFC Expr       2 2 "ADD IMMEDIATE"                          "M(R(P))+D->DF, D; R(P)+1";
    "ADC"  0x74 None       2 1 "ADD WITH CARRY"                         "M(R(X))+D+DF->DF, D";
    "ADCI" 0x7C Expr       2 2 "ADD WITH CARRY, IMMEDIATE"              "M(R(P))+D+DF->DF, D; R(P)+1";
    "SD"   0xF5 None       2 1 "SUBTRACT D"                             "M(R(X))-D->DF, D";
    "SDI"  0xFD Expr       2 2 "SUBTRACT D IMMEDIATE"                   "M(R(P))-D->DF, D; R(P)+1";
    "SDB"  0x75 None       2 1 "SUBTRACT D WITH BORROW"                 "M(R(X))-D-(NOT DF)->DF, D";
    "SDBI" 0x7D Expr       2 2 "SUBTRACT D WITH BORROW, IMMEDIATE"      "M(R(P))-D-(NOT DF)->DF, D; R(P)+1";
    "SM"   0xF7 None       2 1 "SUBTRACT MEMORY"                        "D-M(R(X))->DF, D";
    "SMI"  0xFF Expr       2 2 "SUBTRACT MEMORY IMMEDIATE"              "D-M(R(P))->DF, D; R(P)+1";
    "SMB"  0x77 None       2 1 "SUBTRACT MEMORY WITH BORROW"            "D-M(R(X))-(NOT DF)->DF, D";
    "SMBI" 0x7F Expr       2 2 "SUBTRACT MEMORY WITH BORROW, IMMEDIATE" "D-M(R(P))-(NOT DF)->DF, D; R(P)+1";
    // short branch
    "BR"   0x30 Addr8      2 2 "SHORT BRANCH"                      "M(R(P))->R(P).0";
    "NBR"  0x38 None       2 2 "NO SHORT BRANCH (SEE SKP)"         "R(P)+1";
    "BZ"   0x32 Addr8      2 2 "SHORT BRANCH IF D=0"               "IF D=0, M(R(P))->R(P).0; ELSE R(P)+1";
    "BNZ"  0x3A Addr8      2 2 "SHORT BRANCH IF D NOT 0"           "IF D NOT 0, M(R(P))->R(P).0; ELSE R(P)+1";
    "BDF"  0x33 Addr8      2 2 "SHORT BRANCH IF DF=1"              "IF DF=1, M(R(P))->R(P).0; ELSE R(P)+1";
    "BPZ"  0x33 Addr8      2 2 "SHORT BRANCH IF POS OR ZERO"       "IF DF=1, M(R(P))->R(P).0; ELSE R(P)+1";
    "BGE"  0x33 Addr8      2 2 "SHORT BRANCH IF EQUAL OR GREATER"  "IF DF=1, M(R(P))->R(P).0; ELSE R(P)+1";
    "BNF"  0x3B Addr8      2 2 "SHORT BRANCH IF DF=0"              "IF DF=0, M(R(P))->R(P).0; ELSE R(P)+1";
    "BM"   0x3B Addr8      2 2 "SHORT BRANCH IF MINUS"             "IF DF=0, M(R(P))->R(P).0; ELSE R(P)+1";
    "BL"   0x3B Addr8      2 2 "SHORT BRANCH IF LESS"              "IF DF=0, M(R(P))->R(P).0; ELSE R(P)+1";
    "BQ"   0x31 Addr8      2 2 "SHORT BRANCH IF Q=1"               "IF Q=1, M(R(P))->R(P).0; ELSE R(P)+1";
    "BNQ"  0x39 Addr8      2 2 "SHORT BRANCH IF Q=0"               "IF Q=0, M(R(P))->R(P).0; ELSE R(P)+1";
    "B1"   0x34 Addr8      2 2 "SHORT BRANCH IF EF1=1"             "IF EF1=1, M(R(P))->R(P).0; ELSE R(P)+1";
    "BN1"  0x3C Addr8      2 2 "SHORT BRANCH IF EF1=0"             "IF EF1=0, M(R(P))->R(P).0; ELSE R(P)+1";
    "B2"   0x35 Addr8      2 2 "SHORT BRANCH IF EF2=1"             "IF EF2=1, M(R(P))->R(P).0; ELSE R(P)+1";
    "BN2"  0x3D Addr8      2 2 "SHORT BRANCH IF EF2=0"             "IF EF2=0, M(R(P))->R(P).0; ELSE R(P)+1";
    "B3"   0x36 Addr8      2 2 "SHORT BRANCH IF EF3=1"             "IF EF3=1, M(R(P))->R(P).0; ELSE R(P)+1";
    "BN3"  0x3E Addr8      2 2 "SHORT BRANCH IF EF3=0"             "IF EF3=0, M(R(P))->R(P).0; ELSE R(P)+1";
    "B4"   0x37 Addr8      2 2 "SHORT BRANCH IF EF4=1"             "IF EF4=1, M(R(P))->R(P).0; ELSE R(P)+1";
    "BN4"  0x3F Addr8      2 2 "SHORT BRANCH IF EF4=0"             "IF EF4=0, M(R(P))->R(P).0; ELSE R(P)+1";
    // skip
    "SKP"  0x38 None       2 1 "SHORT SKIP (SEE NBR)"  "R(P)+1";
    "LSKP" 0xC8 None       3 1 "LONG SKIP (SEE NLBR)"  "R(P)+2";
    "LSZ"  0xCE None       3 1 "LONG SKIP IF D=0"      "IF D=0, R(P)+2; ELSE CONTINUE";
    "LSNZ" 0xC6 None       3 1 "LONG SKIP IF D NOT 0"  "IF D NOT 0, R(P)+2; ELSE CONTINUE";
    "LSDF" 0xCF None       3 1 "LONG SKIP IF DF=1"     "IF DF=1, R(P)+2; ELSE CONTINUE";
    "LSNF" 0xC7 None       3 1 "LONG SKIP IF DF=0"     "IF DF=0, R(P)+2; ELSE CONTINUE";
    "LSQ"  0xCD None       3 1 "LONG SKIP IF Q=1"      "IF Q=1, R(P)+2; ELSE CONTINUE";
    "LSNQ" 0xC5 None       3 1 "LONG SKIP IF Q=0"      "IF Q=0, R(P)+2; ELSE CONTINUE";
    "LSIE" 0xCC None       3 1 "LONG SKIP IF IE=1"     "IF IE=1, R(P)+2; ELSE CONTINUE";
    // long branch
    "LBR"  0xC0 Addr16     3 3 "LONG BRANCH"                "M(R(P))->R(P).1; M(R(P)+1)->R(P).0";
    "NLBR" 0xC8 Addr16     3 3 "NO LONG BRANCH (SEE LSKP)"  "R(P)+2";
    "LBZ"  0xC2 Addr16     3 3 "LONG BRANCH IF D=0"         "IF D=0, M(R(P))->R(P).1; M(R(P)+1)->R(P).0; ELSE R(P)+2";
    "LBNZ" 0xCA Addr16     3 3 "LONG BRANCH IF D NOT 0"     "IF D NOT 0, M(R(P))->R(P).1; M(R(P)+1)->R(P).0; ELSE R(P)+2";
    "LBDF" 0xC3 Addr16     3 3 "LONG BRANCH IF DF=1"        "IF DF=1, M(R(P))->R(P).1; M(R(P)+1)->R(P).0; ELSE R(P)+2";
    "LBNF" 0xCB Addr16     3 3 "LONG BRANCH IF DF=0"        "IF DF=0, M(R(P))->R(P).1; M(R(P)+1)->R(P).0; ELSE R(P)+2";
    "LBQ"  0xC1 Addr16     3 3 "LONG BRANCH IF Q=1"         "IF Q=1, M(R(P))->R(P).1; M(R(P)+1)->R(P).0; ELSE R(P)+2";
    "LBNQ" 0xC9 Addr16     3 3 "LONG BRANCH IF Q=0"         "IF Q=0, M(R(P))->R(P).1; M(R(P)+1)->R(P).0; ELSE R(P)+2";
    // control
    "IDL"  0x00 None       2 1 "IDLE"               "WAIT FOR DMA OR INTERRUPT; M(R(0))->BUS";
    "NOP"  0xC4 None       3 1 "NO OPERATION"       "CONTINUE";
    "SEP"  0xD0 Reg        2 1 "SET P"              "N->P";
    "SEX"  0xE0 Reg        2 1 "SET X"              "N->X";
    "SEQ"  0x7B None       2 1 "SET Q"              "1->Q";
    "REQ"  0x7A None       2 1 "RESET Q"            "0->Q";
    "SAV"  0x78 None       2 1 "SAVE"               "T->M(R(X))";
    "MARK" 0x79 None       2 1 "PUSH X,P TO STACK"  "(X,P)->T; (X,P)->M(R(2)) THEN P->X; R(2)-1";
    "RET"  0x70 None       2 1 "RETURN"             "M(R(X))->(X,P); R(X)+1; 1->IE";
    "DIS"  0x71 None       2 1 "DISABLE"            "M(R(X))->(X,P); R(X)+1; 0->IE";
    // input-output
    "OUT"  0x60 IoDevice   2 1 "OUTPUT N"  "M(R(X))->BUS; R(X)+1; N LINES = N";
    "INP"  0x68 IoDevice   2 1 "INPUT N"   "BUS->M(R(X)); BUS->D; N LINES = N";
};

static BY_MNEMONIC: Lazy<HashMap<&'static str, &'static Instruction>> = Lazy::new(|| {
    INSTRUCTIONS.iter()
        .map(|i| (i.mnemonic, i))
        .collect()
});

static BY_OPCODE: Lazy<[Option<&'static Instruction>; 256]> = Lazy::new(|| {
    let mut table = [None; 256];
    for instr in INSTRUCTIONS {
        for byte in instr.opcodes() {
            table[usize::from(byte)].get_or_insert(instr);
        }
    }
    table
});

impl Instruction {
    /// Every opcode byte this instruction can assemble to.
    pub fn opcodes(&self) -> std::ops::RangeInclusive<u8> {
        match self.shape {
            OperandShape::Reg        => self.opcode..=self.opcode | 0x0F,
            OperandShape::RegNonZero => self.opcode + 1..=self.opcode | 0x0F,
            OperandShape::IoDevice   => self.opcode + 1..=self.opcode | 0x07,
            _ => self.opcode..=self.opcode,
        }
    }

    /// The number of bytes this instruction occupies with the given operand.
    ///
    /// This is the catalog size, except for an immediate operand written with
    /// the `A(...)` form, which takes an extra byte.
    pub fn encoded_len(&self, operand: Option<Operand>) -> u16 {
        match (self.shape, operand) {
            (OperandShape::Expr, Some(Operand::Word(_))) => u16::from(self.size) + 1,
            _ => u16::from(self.size),
        }
    }

    /// Produces the object bytes for this instruction.
    ///
    /// The result always has [`Instruction::encoded_len`] bytes
    /// (e.g., `NBR` is padded with the byte it skips over).
    ///
    /// ```
    /// use cosmac_asm::ast::Operand;
    /// use cosmac_asm::isa;
    ///
    /// let inc = isa::lookup("INC").unwrap();
    /// assert_eq!(inc.encode(Some(Operand::Nibble(5))), [0x15]);
    ///
    /// let lbr = isa::lookup("LBR").unwrap();
    /// assert_eq!(lbr.encode(Some(Operand::Word(0x1234))), [0xC0, 0x12, 0x34]);
    /// ```
    pub fn encode(&self, operand: Option<Operand>) -> Vec<u8> {
        let len = usize::from(self.encoded_len(operand));
        let mut out = Vec::with_capacity(len);

        match operand {
            None => out.push(self.opcode),
            Some(Operand::Nibble(n)) => out.push(self.opcode | n),
            Some(Operand::Byte(b)) => out.extend([self.opcode, b]),
            Some(Operand::Word(w)) => {
                out.push(self.opcode);
                out.extend(w.to_be_bytes());
            }
        }
        out.resize(len, 0);
        out
    }
}

/// Finds the catalog entry for a mnemonic (case insensitive).
pub fn lookup(mnemonic: &str) -> Option<&'static Instruction> {
    BY_MNEMONIC.get(&*mnemonic.to_ascii_uppercase()).copied()
}

/// Finds the canonical catalog entry for an opcode byte.
///
/// This is `None` only for `0x68`, which the CDP1802 does not define.
///
/// ```
/// use cosmac_asm::isa;
///
/// assert_eq!(isa::decode(0x33).unwrap().mnemonic, "BDF");
/// assert_eq!(isa::decode(0x15).unwrap().mnemonic, "INC");
/// assert!(isa::decode(0x68).is_none());
/// ```
pub fn decode(opcode: u8) -> Option<&'static Instruction> {
    BY_OPCODE[usize::from(opcode)]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::ast::Operand;

    use super::{decode, lookup, OperandShape, INSTRUCTIONS};

    #[test]
    fn test_mnemonics_unique() {
        let mut seen = HashSet::new();
        for instr in INSTRUCTIONS {
            assert!(seen.insert(instr.mnemonic), "{} listed twice", instr.mnemonic);
        }
    }

    #[test]
    fn test_lookup() {
        let ldi = lookup("LDI").unwrap();
        assert_eq!(ldi.opcode, 0xF8);
        assert_eq!(ldi.shape, OperandShape::Expr);
        assert_eq!(ldi.size, 2);

        assert_eq!(lookup("ldn").unwrap().shape, OperandShape::RegNonZero);
        assert_eq!(lookup("BGE").unwrap().opcode, 0x33);
        assert_eq!(lookup("RSHL").unwrap().opcode, 0x7E);
        assert!(lookup("MOV").is_none());
        assert!(lookup("ADDI").is_none());
    }

    #[test]
    fn test_decode_every_byte() {
        for byte in 0..=255u8 {
            match decode(byte) {
                Some(instr) => assert!(instr.opcodes().contains(&byte), "{byte:02X} decoded to {}", instr.mnemonic),
                None => assert_eq!(byte, 0x68),
            }
        }
    }

    #[test]
    fn test_decode_canonical() {
        let name = |b| decode(b).map(|i| i.mnemonic);
        assert_eq!(name(0x00), Some("IDL"));
        assert_eq!(name(0x01), Some("LDN"));
        assert_eq!(name(0x38), Some("NBR"));
        assert_eq!(name(0x3B), Some("BNF"));
        assert_eq!(name(0x60), Some("IRX"));
        assert_eq!(name(0x63), Some("OUT"));
        assert_eq!(name(0x6F), Some("INP"));
        assert_eq!(name(0x76), Some("SHRC"));
        assert_eq!(name(0x7A), Some("REQ"));
        assert_eq!(name(0x7B), Some("SEQ"));
        assert_eq!(name(0x7C), Some("ADCI"));
        assert_eq!(name(0x7E), Some("SHLC"));
        assert_eq!(name(0xC8), Some("LSKP"));
        assert_eq!(name(0xEF), Some("SEX"));
    }

    #[test]
    fn test_encode() {
        let ldi = lookup("LDI").unwrap();
        assert_eq!(ldi.encode(Some(Operand::Byte(0x2A))), [0xF8, 0x2A]);
        assert_eq!(ldi.encode(Some(Operand::Word(0x0130))), [0xF8, 0x01, 0x30]);
        assert_eq!(ldi.encoded_len(Some(Operand::Word(0x0130))), 3);

        // a long branch keeps its size whatever the operand width
        let lbr = lookup("LBR").unwrap();
        assert_eq!(lbr.encoded_len(Some(Operand::Word(0))), 3);

        assert_eq!(lookup("NBR").unwrap().encode(None), [0x38, 0x00]);
        assert_eq!(lookup("OUT").unwrap().encode(Some(Operand::Nibble(4))), [0x64]);
        assert_eq!(lookup("BR").unwrap().encode(Some(Operand::Byte(0x10))), [0x30, 0x10]);
    }
}
