//! Fetching and decoding machine instructions for disassembly.
//!
//! `fetch_instruction` consumes bytes one at a time from the front of a
//! buffer, using the decoder to learn how long the instruction is, and
//! returns the raw bytes. `decode_instruction` re-walks a fetched
//! buffer into a `Decoded` ready for rendering.

use std::fmt;

use crate::decoder::{decode_modrm, Decoder, Modrm};
use crate::ins::{
    instruction_prefix, repeat_prefix, sreg_prefix, InsDef, OperandFlag, NEAR_JMP, SHORT_JMP,
};
#[cfg(test)]
use crate::ins::ModrmClass;

/// At most two prefixes before the opcode.
pub const MAX_PREFIXES: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchError {
    /// End of input before the instruction was complete.
    Eof,
    TooManyPrefixes,
    UnknownOpcode(u8),
    UnknownOpcode2(u8, u8),
    NoModrmMatch(u8, u8),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Eof => write!(f, "unexpected end of file: instruction incomplete"),
            FetchError::TooManyPrefixes => write!(f, "instruction has too many prefixes"),
            FetchError::UnknownOpcode(op) => write!(f, "unknown opcode: {op:#04x}"),
            FetchError::UnknownOpcode2(op1, op2) => {
                write!(f, "unknown second opcode: {op1:#04x} {op2:#04x}")
            }
            FetchError::NoModrmMatch(op, modrm) => write!(
                f,
                "no instruction matching ModR/M value: opcode {op:#04x} ModR/M {modrm:#04x}"
            ),
        }
    }
}

impl std::error::Error for FetchError {}

struct ByteSource<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl ByteSource<'_> {
    fn next(&mut self) -> Result<u8, FetchError> {
        let b = *self.bytes.get(self.pos).ok_or(FetchError::Eof)?;
        self.pos += 1;
        Ok(b)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }
}

/// Fetch one complete encoded instruction from the front of `bytes`,
/// returning the raw bytes consumed.
pub fn fetch_instruction(dec: &Decoder, bytes: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut src = ByteSource { bytes, pos: 0 };
    let mut buf = Vec::with_capacity(8);

    // prefixes
    loop {
        match src.peek() {
            Some(b) if instruction_prefix(b) => {
                if buf.len() == MAX_PREFIXES {
                    return Err(FetchError::TooManyPrefixes);
                }
                buf.push(src.next()?);
            }
            Some(_) => break,
            None => return Err(FetchError::Eof),
        }
    }

    let opcode1 = src.next()?;
    buf.push(opcode1);

    // the two jumps whose whole layout is known without the table
    if opcode1 == SHORT_JMP {
        buf.push(src.next()?);
        return Ok(buf);
    }
    if opcode1 == NEAR_JMP {
        buf.push(src.next()?);
        buf.push(src.next()?);
        return Ok(buf);
    }

    let page = dec
        .page(opcode1)
        .ok_or(FetchError::UnknownOpcode(opcode1))?;

    let slot = if page.has_opcode2 {
        let opcode2 = src.next()?;
        buf.push(opcode2);
        page.opcode2_slot(opcode2)
            .expect("page has second opcode")
            .ok_or(FetchError::UnknownOpcode2(opcode1, opcode2))?
    } else {
        page.single_slot().expect("page has a slot")
    };

    let def = if slot.has_modrm {
        let byte = src.next()?;
        buf.push(byte);
        let modrm = decode_modrm(byte);
        for _ in 0..modrm.disp_size {
            buf.push(src.next()?);
        }
        slot.find_modrm(byte)
            .ok_or(FetchError::NoModrmMatch(opcode1, byte))?
    } else {
        slot.no_modrm_def().expect("slot holds one instruction")
    };

    if def.oper1 == OperandFlag::Indir || def.oper2 == OperandFlag::Indir {
        buf.push(src.next()?);
        buf.push(src.next()?);
    }

    for _ in 0..def.imm1 + def.imm2 + def.imm3 {
        buf.push(src.next()?);
    }

    Ok(buf)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    MultipleRepeatPrefix,
    MultipleSregPrefix,
    NoOpcode,
    NoOpcode2,
    NoModrm,
    NoDisplacement,
    NoImmediate,
    NoMatch,
    Surplus,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecodeError::MultipleRepeatPrefix => "multiple repeat prefixes",
            DecodeError::MultipleSregPrefix => "multiple segment overrides",
            DecodeError::NoOpcode => "buffer holds no opcode",
            DecodeError::NoOpcode2 => "buffer ends before second opcode",
            DecodeError::NoModrm => "buffer ends before ModR/M byte",
            DecodeError::NoDisplacement => "buffer ends before displacement",
            DecodeError::NoImmediate => "buffer ends before immediate",
            DecodeError::NoMatch => "no instruction matches the buffer",
            DecodeError::Surplus => "surplus bytes after instruction",
        };
        f.write_str(s)
    }
}

impl std::error::Error for DecodeError {}

/// A decoded instruction, ready for rendering or for advancing a
/// disassembly cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub def: &'static InsDef,
    pub opcode1: u8,
    /// Repeat prefix byte, if present.
    pub rep: Option<u8>,
    /// Segment override prefix byte, if present.
    pub sreg_override: Option<u8>,
    pub lock: bool,
    pub modrm: Option<Modrm>,
    /// Direct address of an `Indir` operand.
    pub indir: Option<u16>,
    pub imm1: u16,
    pub imm2: u16,
    pub imm3: u16,
    pub len: usize,
}

/// Decode a fetched instruction buffer.
pub fn decode_instruction(dec: &Decoder, bytes: &[u8]) -> Result<Decoded, DecodeError> {
    let mut pos = 0;
    let mut rep = None;
    let mut sreg_override = None;
    let mut lock = false;

    while pos < bytes.len() && instruction_prefix(bytes[pos]) {
        let b = bytes[pos];
        if repeat_prefix(b) {
            if rep.replace(b).is_some() {
                return Err(DecodeError::MultipleRepeatPrefix);
            }
        } else if sreg_prefix(b) {
            if sreg_override.replace(b).is_some() {
                return Err(DecodeError::MultipleSregPrefix);
            }
        } else if b == 0xF0 {
            lock = true;
        }
        pos += 1;
    }

    let opcode1 = *bytes.get(pos).ok_or(DecodeError::NoOpcode)?;
    pos += 1;

    let page = dec.page(opcode1).ok_or(DecodeError::NoMatch)?;

    let slot = if page.has_opcode2 {
        let opcode2 = *bytes.get(pos).ok_or(DecodeError::NoOpcode2)?;
        pos += 1;
        page.opcode2_slot(opcode2)
            .map_err(|_| DecodeError::NoMatch)?
            .ok_or(DecodeError::NoMatch)?
    } else {
        page.single_slot().map_err(|_| DecodeError::NoMatch)?
    };

    let (def, modrm) = if slot.has_modrm {
        let byte = *bytes.get(pos).ok_or(DecodeError::NoModrm)?;
        pos += 1;
        let mut modrm = decode_modrm(byte);
        match modrm.disp_size {
            1 => {
                let b = *bytes.get(pos).ok_or(DecodeError::NoDisplacement)?;
                modrm.disp = b as u16;
                pos += 1;
            }
            2 => {
                if pos + 2 > bytes.len() {
                    return Err(DecodeError::NoDisplacement);
                }
                modrm.disp = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]);
                pos += 2;
            }
            _ => {}
        }
        let def = slot.find_modrm(byte).ok_or(DecodeError::NoMatch)?;
        (def, Some(modrm))
    } else {
        let def = slot.no_modrm_def().map_err(|_| DecodeError::NoMatch)?;
        (def, None)
    };

    let mut take = |size: u8| -> Result<u16, DecodeError> {
        match size {
            0 => Ok(0),
            1 => {
                let b = *bytes.get(pos).ok_or(DecodeError::NoImmediate)?;
                pos += 1;
                Ok(b as u16)
            }
            _ => {
                if pos + 2 > bytes.len() {
                    return Err(DecodeError::NoImmediate);
                }
                let w = u16::from_le_bytes([bytes[pos], bytes[pos + 1]]);
                pos += 2;
                Ok(w)
            }
        }
    };

    let indir = if def.oper1 == OperandFlag::Indir || def.oper2 == OperandFlag::Indir {
        Some(take(2)?)
    } else {
        None
    };

    let imm1 = take(def.imm1)?;
    let imm2 = take(def.imm2)?;
    let imm3 = take(def.imm3)?;

    if pos != bytes.len() {
        return Err(DecodeError::Surplus);
    }

    Ok(Decoded {
        def,
        opcode1,
        rep,
        sreg_override,
        lock,
        modrm,
        indir,
        imm1,
        imm2,
        imm3,
        len: bytes.len(),
    })
}

/// A ModR/M byte that the given row matches; used by tests to exercise
/// every row.
#[cfg(test)]
pub(crate) fn example_modrm(def: &InsDef) -> u8 {
    match def.modrm {
        ModrmClass::Ccc => def.opcode2,
        ModrmClass::Rmn => 0,
        // mod 00, rm 001: a memory operand with no displacement
        ModrmClass::Rmc | ModrmClass::Mmc => (def.reg << 3) | 0x01,
        ModrmClass::Rrm | ModrmClass::Rmr => 0xC1,
        ModrmClass::Reg => 0xC0 | (def.reg << 3) | def.reg,
        // rm 010 avoids the rm-constrained classes
        ModrmClass::Ssi | ModrmClass::Sis | ModrmClass::Sic => 0xC2 | (def.reg << 3),
        ModrmClass::Ssc | ModrmClass::Stc => 0xC0 | (def.reg << 3),
        ModrmClass::Stk => 0xC1 | (def.reg << 3),
    }
}

/// A complete byte sequence the given row decodes from.
#[cfg(test)]
pub(crate) fn example_encoding(def: &InsDef) -> Vec<u8> {
    let mut bytes = Vec::new();
    let opcode1 = if def.opcode_inc {
        def.opcode1 + 1
    } else {
        def.opcode1
    };
    bytes.push(opcode1);
    if def.has_opcode2() {
        bytes.push(def.opcode2);
    }
    if def.modrm != ModrmClass::Rmn {
        let byte = example_modrm(def);
        bytes.push(byte);
        for _ in 0..decode_modrm(byte).disp_size {
            bytes.push(0);
        }
    }
    if def.oper1 == OperandFlag::Indir || def.oper2 == OperandFlag::Indir {
        bytes.extend([0x34, 0x12]);
    }
    for _ in 0..def.imm1 + def.imm2 + def.imm3 {
        bytes.push(0x10);
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::decoder::build_decoder;
    use crate::ins::{is_alternative, Mnemonic, INSTRUCTION_TABLE};

    fn decoder() -> Decoder {
        build_decoder().unwrap()
    }

    #[test]
    fn fetch_single_byte_instruction() {
        let dec = decoder();
        assert_eq!(fetch_instruction(&dec, &[0x90, 0xCB]).unwrap(), [0x90]);
        assert_eq!(fetch_instruction(&dec, &[0xCB]).unwrap(), [0xCB]);
    }

    #[test]
    fn fetch_immediates() {
        let dec = decoder();
        // MOV AX, 1234h
        assert_eq!(
            fetch_instruction(&dec, &[0xB8, 0x34, 0x12, 0x90]).unwrap(),
            [0xB8, 0x34, 0x12]
        );
        // INT 21h
        assert_eq!(
            fetch_instruction(&dec, &[0xCD, 0x21]).unwrap(),
            [0xCD, 0x21]
        );
    }

    #[test]
    fn fetch_jump_special_cases() {
        let dec = decoder();
        assert_eq!(
            fetch_instruction(&dec, &[0xEB, 0xFE]).unwrap(),
            [0xEB, 0xFE]
        );
        assert_eq!(
            fetch_instruction(&dec, &[0xE9, 0x34, 0x12]).unwrap(),
            [0xE9, 0x34, 0x12]
        );
        assert_eq!(fetch_instruction(&dec, &[0xE9, 0x34]), Err(FetchError::Eof));
    }

    #[test]
    fn fetch_modrm_displacements() {
        let dec = decoder();
        // MOV AX, [BX+SI]
        assert_eq!(
            fetch_instruction(&dec, &[0x8B, 0x00]).unwrap(),
            [0x8B, 0x00]
        );
        // MOV AX, [1234h]: mod 00 rm 110 direct address
        assert_eq!(
            fetch_instruction(&dec, &[0x8B, 0x06, 0x34, 0x12]).unwrap(),
            [0x8B, 0x06, 0x34, 0x12]
        );
        // MOV AX, [BP+12h]
        assert_eq!(
            fetch_instruction(&dec, &[0x8B, 0x46, 0x12]).unwrap(),
            [0x8B, 0x46, 0x12]
        );
        // MOV AX, [BP+1234h]
        assert_eq!(
            fetch_instruction(&dec, &[0x8B, 0x86, 0x34, 0x12]).unwrap(),
            [0x8B, 0x86, 0x34, 0x12]
        );
    }

    #[test]
    fn fetch_prefix_cap() {
        let dec = decoder();
        assert_eq!(
            fetch_instruction(&dec, &[0xF3, 0xA4]).unwrap(),
            [0xF3, 0xA4]
        );
        assert_eq!(
            fetch_instruction(&dec, &[0xF3, 0x26, 0xA4]).unwrap(),
            [0xF3, 0x26, 0xA4]
        );
        assert_eq!(
            fetch_instruction(&dec, &[0xF3, 0x26, 0x2E, 0xA4]),
            Err(FetchError::TooManyPrefixes)
        );
    }

    #[test]
    fn fetch_error_kinds() {
        let dec = decoder();
        assert_eq!(fetch_instruction(&dec, &[]), Err(FetchError::Eof));
        assert_eq!(
            fetch_instruction(&dec, &[0x64]),
            Err(FetchError::UnknownOpcode(0x64))
        );
        assert_eq!(
            fetch_instruction(&dec, &[0xD4, 0x0B]),
            Err(FetchError::UnknownOpcode2(0xD4, 0x0B))
        );
        // FF /7 has no instruction
        assert_eq!(
            fetch_instruction(&dec, &[0xFF, 0xF8]),
            Err(FetchError::NoModrmMatch(0xFF, 0xF8))
        );
        assert_eq!(fetch_instruction(&dec, &[0xB8, 0x01]), Err(FetchError::Eof));
    }

    #[test]
    fn fetch_indirect_operand() {
        let dec = decoder();
        // MOV AL, [1234h]
        assert_eq!(
            fetch_instruction(&dec, &[0xA0, 0x34, 0x12]).unwrap(),
            [0xA0, 0x34, 0x12]
        );
    }

    #[test]
    fn decode_populates_fields() {
        let dec = decoder();
        let buf = fetch_instruction(&dec, &[0x26, 0x8B, 0x46, 0x12]).unwrap();
        let d = decode_instruction(&dec, &buf).unwrap();
        assert_eq!(d.def.op, Mnemonic::Mov);
        assert_eq!(d.sreg_override, Some(0x26));
        assert_eq!(d.rep, None);
        let modrm = d.modrm.unwrap();
        assert_eq!((modrm.mode, modrm.reg, modrm.rm), (1, 0, 6));
        assert_eq!(modrm.disp, 0x12);
        assert_eq!(d.len, 4);
    }

    #[test]
    fn decode_rejects_duplicate_prefixes() {
        let dec = decoder();
        assert_eq!(
            decode_instruction(&dec, &[0xF3, 0xF2, 0xA4]),
            Err(DecodeError::MultipleRepeatPrefix)
        );
        assert_eq!(
            decode_instruction(&dec, &[0x26, 0x2E, 0xA4]),
            Err(DecodeError::MultipleSregPrefix)
        );
    }

    #[test]
    fn decode_rejects_surplus() {
        let dec = decoder();
        assert_eq!(
            decode_instruction(&dec, &[0x90, 0x90]),
            Err(DecodeError::Surplus)
        );
    }

    #[test]
    fn decode_far_call_immediates() {
        let dec = decoder();
        // CALL 1234h:5678h is 9A 78 56 34 12
        let buf = fetch_instruction(&dec, &[0x9A, 0x78, 0x56, 0x34, 0x12]).unwrap();
        let d = decode_instruction(&dec, &buf).unwrap();
        assert_eq!(d.def.op, Mnemonic::Call);
        assert_eq!(d.imm1, 0x5678);
        assert_eq!(d.imm2, 0x1234);
    }

    #[test]
    fn fetch_is_deterministic() {
        let dec = decoder();
        let bytes = [0xF3, 0x8B, 0x86, 0x34, 0x12, 0x90];
        let a = fetch_instruction(&dec, &bytes).unwrap();
        let b = fetch_instruction(&dec, &bytes).unwrap();
        assert_eq!(a, b);
    }

    /// Every non-alternative row in the table has a byte sequence that
    /// fetches and decodes back to that row.
    #[test]
    fn decoder_covers_every_canonical_row() {
        let dec = decoder();
        for def in INSTRUCTION_TABLE {
            if def.wait_prefix {
                continue;
            }
            let opcode1 = if def.opcode_inc {
                def.opcode1 + 1
            } else {
                def.opcode1
            };
            if is_alternative(def, opcode1) {
                continue;
            }
            let bytes = example_encoding(def);
            let buf = fetch_instruction(&dec, &bytes)
                .unwrap_or_else(|e| panic!("fetch {:?}: {e}", def.op));
            assert_eq!(buf, bytes, "{:?}", def.op);
            let d = decode_instruction(&dec, &buf)
                .unwrap_or_else(|e| panic!("decode {:?}: {e}", def.op));
            assert_eq!(d.def, def, "{:?}", def.op);
        }
    }
}
