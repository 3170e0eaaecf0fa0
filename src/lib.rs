//! A two-pass assembler for the RCA CDP1802 (COSMAC),
//! using the "Level I" syntax of the CRA assembler, including its quirks.
//!
//! # Usage
//!
//! To convert source code to object code, it is assembled:
//! ```
//! use cosmac_asm::asm::assemble;
//!
//! let code = "
//!        ORG #0100
//! START: LDI A.1(DATA); PHI R2 .. point R2 at DATA
//!        LDI A.0(DATA); PLO R2
//!        SEX R2
//!        OUT 1
//!        BR START
//! DATA:  ,T'OK'
//!        END
//! ";
//! let asm = assemble(code).unwrap();
//! assert_eq!(asm.error_count(), 0);
//!
//! // The object code, keyed by address:
//! let image: Vec<(u16, u8)> = asm.memory().collect();
//! assert_eq!(image[..2], [(0x0100, 0xF8), (0x0101, 0x01)]);
//!
//! // The listing and symbol dump:
//! println!("{asm}");
//! ```
//!
//! Statement errors do not stop assembly. They are reported per source line:
//! ```
//! use cosmac_asm::asm::assemble;
//! use cosmac_asm::err::StmtErr;
//!
//! let asm = assemble("LDI NOWHERE\nEND").unwrap();
//! assert_eq!(asm.error_count(), 1);
//! assert_eq!(asm.lines()[0].errors, [StmtErr::UndefinedSymbol]);
//! ```
//!
//! The pieces of the assembler can also be used separately.
//! See the [`parse`] module for splitting and parsing statements,
//! and the [`isa`] module for the instruction catalog.
#![warn(missing_docs)]

pub mod parse;
pub mod ast;
pub mod asm;
pub mod isa;
pub mod err;
