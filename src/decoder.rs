//! The instruction decoder structure: a two-level dispatch from first
//! opcode, through an optional second opcode, to an ordered list of
//! table rows discriminated by their ModR/M class.
//!
//! Built once from the static table; immutable and freely shared
//! afterwards.

use anyhow::{anyhow, bail, ensure, Result};

use crate::ins::{is_alternative, InsDef, ModrmClass, INSTRUCTION_TABLE};

/// A decoded ModR/M byte with its displacement size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modrm {
    pub mode: u8,
    pub reg: u8,
    pub rm: u8,
    pub disp_size: u8,
    pub disp: u16,
}

pub fn decode_modrm(byte: u8) -> Modrm {
    let mode = byte >> 6;
    let rm = byte & 0x07;
    let disp_size = match mode {
        0 => {
            if rm == 6 {
                2
            } else {
                0
            }
        }
        1 => 1,
        2 => 2,
        _ => 0,
    };
    Modrm {
        mode,
        reg: (byte >> 3) & 0x07,
        rm,
        disp_size,
        disp: 0,
    }
}

/// Rows sharing one second opcode (or all rows of a one-opcode page),
/// in table order so that the first ModR/M match wins.
#[derive(Debug)]
pub struct OpcodeSlot {
    pub opcode2: u8,
    pub has_modrm: bool,
    defs: Vec<&'static InsDef>,
}

impl OpcodeSlot {
    /// The single row of a slot that carries no ModR/M byte.
    pub fn no_modrm_def(&self) -> Result<&'static InsDef> {
        ensure!(!self.has_modrm, "opcode slot carries a ModR/M byte");
        self.defs
            .first()
            .copied()
            .ok_or_else(|| anyhow!("opcode slot has no instruction"))
    }

    /// First row in table order whose class accepts the byte.
    pub fn find_modrm(&self, byte: u8) -> Option<&'static InsDef> {
        self.defs
            .iter()
            .copied()
            .find(|&def| match_modrm(def, byte))
    }
}

/// Rows sharing a first opcode.
#[derive(Debug)]
pub struct OpcodePage {
    pub opcode_inc: bool,
    pub opcode_base: u8,
    pub has_opcode2: bool,
    slots: Vec<OpcodeSlot>,
}

impl OpcodePage {
    pub fn opcode2_slot(&self, opcode2: u8) -> Result<Option<&OpcodeSlot>> {
        ensure!(self.has_opcode2, "opcode page has no second opcode");
        Ok(self.slots.iter().find(|s| s.opcode2 == opcode2))
    }

    pub fn single_slot(&self) -> Result<&OpcodeSlot> {
        ensure!(!self.has_opcode2, "opcode page takes a second opcode");
        self.slots
            .first()
            .ok_or_else(|| anyhow!("opcode page has no slot"))
    }
}

/// Decoding information indexed by first opcode.
#[derive(Debug)]
pub struct Decoder {
    pages: Vec<Option<OpcodePage>>,
}

impl Decoder {
    pub fn page(&self, opcode1: u8) -> Option<&OpcodePage> {
        self.pages[opcode1 as usize].as_ref()
    }
}

/// Build the decoder from the static table, synthesising the eight
/// register encodings of incrementing opcodes and skipping alternative
/// and wait-prefixed forms. Table inconsistencies are fatal.
pub fn build_decoder() -> Result<Decoder> {
    let mut dec = Decoder {
        pages: (0..0x100).map(|_| None).collect(),
    };

    for def in INSTRUCTION_TABLE {
        if def.wait_prefix {
            // encoded as FWAIT followed by the no-wait form
            continue;
        }
        if def.opcode_inc {
            for reg in 0..8 {
                add_decoding(&mut dec, def, def.opcode1 + reg)?;
            }
        } else {
            add_decoding(&mut dec, def, def.opcode1)?;
        }
    }

    Ok(dec)
}

fn add_decoding(dec: &mut Decoder, def: &'static InsDef, opcode1: u8) -> Result<()> {
    if is_alternative(def, opcode1) {
        return Ok(());
    }

    let index = opcode1 as usize;
    match &dec.pages[index] {
        None => {
            dec.pages[index] = Some(OpcodePage {
                opcode_inc: def.opcode_inc,
                opcode_base: def.opcode1,
                has_opcode2: def.has_opcode2(),
                slots: Vec::new(),
            });
        }
        Some(page) => {
            if def.opcode_inc != page.opcode_inc {
                bail!(
                    "decoding conflict: opcode {opcode1:#04x}: opcode_inc {} vs {}",
                    page.opcode_inc,
                    def.opcode_inc
                );
            }
            if def.opcode_inc {
                bail!("multiple definitions for incrementing opcode {opcode1:#04x}");
            }
            if page.opcode_base != def.opcode1 {
                bail!("decoding conflict: base opcode for opcode {opcode1:#04x}");
            }
            if page.has_opcode2 != def.has_opcode2() {
                bail!("decoding conflict: opcode {opcode1:#04x}: has_opcode2 inconsistent");
            }
        }
    }
    let page = dec.pages[index].as_mut().expect("page just ensured");

    let has_modrm = def.modrm != ModrmClass::Rmn;
    let slot_index = if page.has_opcode2 {
        page.slots.iter().position(|s| s.opcode2 == def.opcode2)
    } else {
        // at most one slot
        (!page.slots.is_empty()).then_some(0)
    };

    let slot = match slot_index {
        Some(i) => {
            let slot = &mut page.slots[i];
            if slot.has_modrm != has_modrm {
                bail!(
                    "decoding conflict: ModR/M byte for opcodes {opcode1:#04x} {:#04x}",
                    def.opcode2
                );
            }
            slot
        }
        None => {
            page.slots.push(OpcodeSlot {
                opcode2: def.opcode2,
                has_modrm,
                defs: Vec::new(),
            });
            page.slots.last_mut().expect("slot just pushed")
        }
    };

    if !slot.defs.is_empty() && !slot.has_modrm {
        bail!(
            "decoding conflict: opcodes {opcode1:#04x} {:#04x}: \
             second instruction despite no ModR/M byte",
            def.opcode2
        );
    }
    slot.defs.push(def);
    Ok(())
}

fn match_modrm(def: &InsDef, byte: u8) -> bool {
    if def.modrm == ModrmClass::Ccc {
        return byte == def.opcode2;
    }

    let modrm = decode_modrm(byte);
    match def.modrm {
        ModrmClass::Rmn => false,
        ModrmClass::Rrm | ModrmClass::Rmr => true,
        ModrmClass::Rmc => def.reg == modrm.reg,
        ModrmClass::Reg => modrm.mode == 3 && modrm.rm == modrm.reg,
        ModrmClass::Mmc => modrm.mode != 3 && def.reg == modrm.reg,
        ModrmClass::Ssi | ModrmClass::Sis | ModrmClass::Sic => {
            modrm.mode == 3 && def.reg == modrm.reg
        }
        ModrmClass::Ssc | ModrmClass::Stc => {
            modrm.mode == 3 && def.reg == modrm.reg && modrm.rm == 0
        }
        ModrmClass::Stk => modrm.mode == 3 && def.reg == modrm.reg && modrm.rm == 1,
        ModrmClass::Ccc => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ins::Mnemonic;

    #[test]
    fn modrm_fields_and_disp_sizes() {
        let m = decode_modrm(0x00);
        assert_eq!((m.mode, m.reg, m.rm, m.disp_size), (0, 0, 0, 0));
        // mod 00 rm 110 is a direct address
        let m = decode_modrm(0x06);
        assert_eq!((m.mode, m.rm, m.disp_size), (0, 6, 2));
        let m = decode_modrm(0x46);
        assert_eq!((m.mode, m.rm, m.disp_size), (1, 6, 1));
        let m = decode_modrm(0x86);
        assert_eq!((m.mode, m.rm, m.disp_size), (2, 6, 2));
        let m = decode_modrm(0xC1);
        assert_eq!((m.mode, m.reg, m.rm, m.disp_size), (3, 0, 1, 0));
        let m = decode_modrm(0xFF);
        assert_eq!((m.mode, m.reg, m.rm), (3, 7, 7));
    }

    #[test]
    fn build_succeeds_on_static_table() {
        let dec = build_decoder().unwrap();
        assert!(dec.page(0x90).is_some());
        assert!(dec.page(0x26).is_none()); // prefix, not an opcode
        assert!(dec.page(0x64).is_none()); // not 8086/80186
    }

    #[test]
    fn nop_owns_0x90_and_xchg_the_rest() {
        let dec = build_decoder().unwrap();
        let nop = dec.page(0x90).unwrap();
        assert!(!nop.opcode_inc);
        let def = nop.single_slot().unwrap().no_modrm_def().unwrap();
        assert_eq!(def.op, Mnemonic::Nop);

        let xchg = dec.page(0x93).unwrap();
        assert!(xchg.opcode_inc);
        assert_eq!(xchg.opcode_base, 0x90);
        let def = xchg.single_slot().unwrap().no_modrm_def().unwrap();
        assert_eq!(def.op, Mnemonic::Xchg);
    }

    #[test]
    fn canonical_jcc_wins() {
        let dec = build_decoder().unwrap();
        let page = dec.page(0x74).unwrap();
        let def = page.single_slot().unwrap().no_modrm_def().unwrap();
        assert_eq!(def.op, Mnemonic::Je);
    }

    #[test]
    fn group_slot_matches_by_reg_field() {
        let dec = build_decoder().unwrap();
        let slot = dec.page(0xF7).unwrap().single_slot().unwrap();
        assert!(slot.has_modrm);
        // mod 11, reg 011 (NEG), rm 001
        assert_eq!(slot.find_modrm(0xD9).unwrap().op, Mnemonic::Neg);
        // reg 100 -> MUL
        assert_eq!(slot.find_modrm(0xE1).unwrap().op, Mnemonic::Mul);
        // reg 001 has no row on F7
        assert!(slot.find_modrm(0xC8).is_none());
    }

    #[test]
    fn fpu_classes_discriminate() {
        let dec = build_decoder().unwrap();
        let d9 = dec.page(0xD9).unwrap().single_slot().unwrap();
        // FLD m32: mod 00 reg 000
        assert_eq!(d9.find_modrm(0x06).unwrap().op, Mnemonic::Fld);
        // FLD ST(2): mod 11 reg 000 rm 010
        let fld = d9.find_modrm(0xC2).unwrap();
        assert_eq!(fld.op, Mnemonic::Fld);
        assert_eq!(fld.modrm, ModrmClass::Sic);
        // FCHS: E0
        assert_eq!(d9.find_modrm(0xE0).unwrap().op, Mnemonic::Fchs);
        // FABS: E1
        assert_eq!(d9.find_modrm(0xE1).unwrap().op, Mnemonic::Fabs);
        // FLDPI: EB by exact byte
        assert_eq!(d9.find_modrm(0xEB).unwrap().op, Mnemonic::Fldpi);

        let de = dec.page(0xDE).unwrap().single_slot().unwrap();
        assert_eq!(de.find_modrm(0xD9).unwrap().op, Mnemonic::Fcompp);
        assert_eq!(de.find_modrm(0xC1).unwrap().op, Mnemonic::Faddp);

        // FNINIT by exact byte; FINIT is the wait-prefixed form and
        // absent from the decoder
        let db = dec.page(0xDB).unwrap().single_slot().unwrap();
        assert_eq!(db.find_modrm(0xE3).unwrap().op, Mnemonic::Fninit);
    }

    #[test]
    fn aam_uses_second_opcode() {
        let dec = build_decoder().unwrap();
        let page = dec.page(0xD4).unwrap();
        assert!(page.has_opcode2);
        let slot = page.opcode2_slot(0x0A).unwrap().unwrap();
        assert_eq!(slot.no_modrm_def().unwrap().op, Mnemonic::Aam);
        assert!(page.opcode2_slot(0x0B).unwrap().is_none());
    }

    #[test]
    fn every_non_alternative_row_is_reachable() {
        let dec = build_decoder().unwrap();
        for def in INSTRUCTION_TABLE {
            if def.wait_prefix {
                continue;
            }
            let opcode1 = if def.opcode_inc {
                // pick a synthesized register encoding that is not the
                // NOP collision
                def.opcode1 + 1
            } else {
                def.opcode1
            };
            if is_alternative(def, opcode1) {
                continue;
            }
            let page = dec.page(opcode1).unwrap_or_else(|| {
                panic!("no page for {:?} at {opcode1:#04x}", def.op)
            });
            let slot = if page.has_opcode2 {
                page.opcode2_slot(def.opcode2).unwrap().unwrap()
            } else {
                page.single_slot().unwrap()
            };
            if slot.has_modrm {
                let byte = crate::fetch::example_modrm(def);
                let found = slot.find_modrm(byte).unwrap_or_else(|| {
                    panic!("no match for {:?} with {byte:#04x}", def.op)
                });
                assert_eq!(found, def, "first match for {:?}", def.op);
            } else {
                assert_eq!(slot.no_modrm_def().unwrap(), def);
            }
        }
    }
}
