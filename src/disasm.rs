//! Rendering decoded instructions as assembly text, and the plain
//! disassembly loop over a byte buffer.

use anyhow::{anyhow, Result};

use std::io::Write;

use crate::decoder::{Decoder, Modrm};
use crate::fetch::{decode_instruction, fetch_instruction, Decoded};
use crate::ins::{
    sreg_override_name, Mnemonic, OperandFlag, REG16_NAMES, REG8_NAMES, SREG_NAMES,
};

/// Assembler-style hex: upper-case digits, `h` suffix, a leading zero
/// when the first digit is a letter.
fn hex(value: u16, width: usize) -> String {
    let digits = format!("{value:0width$X}");
    if digits.as_bytes()[0].is_ascii_alphabetic() {
        format!("0{digits}h")
    } else {
        format!("{digits}h")
    }
}

fn mem_operand(modrm: &Modrm, sreg_override: Option<u8>) -> String {
    let prefix = match sreg_override {
        Some(b) => format!("{}:", sreg_override_name(b)),
        None => String::new(),
    };
    if modrm.mode == 0 && modrm.rm == 6 {
        return format!("{prefix}[{}]", hex(modrm.disp, 4));
    }
    let base = ["BX+SI", "BX+DI", "BP+SI", "BP+DI", "SI", "DI", "BP", "BX"][modrm.rm as usize];
    match modrm.mode {
        0 => format!("{prefix}[{base}]"),
        1 => {
            // one-byte displacements are signed
            let disp = modrm.disp as u8 as i8;
            if disp < 0 {
                format!("{prefix}[{base}-{}]", hex(-(disp as i16) as u16, 2))
            } else {
                format!("{prefix}[{base}+{}]", hex(disp as u16, 2))
            }
        }
        _ => format!("{prefix}[{base}+{}]", hex(modrm.disp, 4)),
    }
}

struct OperandRender<'a> {
    dec: &'a Decoded,
    addr: u32,
    imm_taken: usize,
}

impl OperandRender<'_> {
    fn next_imm(&mut self) -> u16 {
        let value = match self.imm_taken {
            0 => self.dec.imm1,
            1 => self.dec.imm2,
            _ => self.dec.imm3,
        };
        self.imm_taken += 1;
        value
    }

    fn imm_size(&self) -> u8 {
        match self.imm_taken {
            0 => self.dec.def.imm1,
            1 => self.dec.def.imm2,
            _ => self.dec.def.imm3,
        }
    }

    fn operand(&mut self, flag: OperandFlag) -> Option<String> {
        use OperandFlag as F;
        let modrm = self.dec.modrm;
        Some(match flag {
            F::None => return None,
            F::Al => "AL".to_string(),
            F::Cl => "CL".to_string(),
            F::Ax => "AX".to_string(),
            F::Dx => "DX".to_string(),
            F::One => "1".to_string(),
            F::Three => "3".to_string(),
            F::St => "ST".to_string(),
            F::Sti => format!("ST({})", modrm.map(|m| m.rm).unwrap_or(0)),
            F::Rm8 => {
                let m = modrm?;
                if m.mode == 3 {
                    REG8_NAMES[m.rm as usize].to_string()
                } else {
                    mem_operand(&m, self.dec.sreg_override)
                }
            }
            F::Rm16 => {
                let m = modrm?;
                if m.mode == 3 {
                    REG16_NAMES[m.rm as usize].to_string()
                } else {
                    mem_operand(&m, self.dec.sreg_override)
                }
            }
            F::Mem | F::Mem16 | F::Mem32 | F::Mem64 | F::Mem80 => {
                let m = modrm?;
                if m.mode == 3 {
                    REG16_NAMES[m.rm as usize].to_string()
                } else {
                    mem_operand(&m, self.dec.sreg_override)
                }
            }
            F::Reg8 => match modrm {
                Some(m) => REG8_NAMES[m.reg as usize].to_string(),
                None => REG8_NAMES[(self.dec.opcode1 & 7) as usize].to_string(),
            },
            F::Reg16 => match modrm {
                Some(m) => REG16_NAMES[m.reg as usize].to_string(),
                None => REG16_NAMES[(self.dec.opcode1 & 7) as usize].to_string(),
            },
            F::Sreg => match modrm {
                Some(m) => SREG_NAMES[(m.reg & 3) as usize].to_string(),
                None => SREG_NAMES[self.dec.def.reg as usize].to_string(),
            },
            F::Indir => format!("[{}]", hex(self.dec.indir.unwrap_or(0), 4)),
            F::Imm => hex(self.next_imm(), 4),
            F::Imm8 => hex(self.next_imm(), 2),
            F::Jump => {
                let size = self.imm_size();
                let disp = self.next_imm();
                let disp = if size == 1 {
                    disp as u8 as i8 as i32
                } else {
                    disp as i16 as i32
                };
                let target = self.addr as i32 + self.dec.len as i32 + disp;
                hex(target as u16, 4)
            }
            F::Far => {
                let offset = self.next_imm();
                let seg = self.next_imm();
                format!("{}:{}", hex(seg, 4), hex(offset, 4))
            }
        })
    }
}

/// Render one decoded instruction at the given address.
pub fn render_assembly(addr: u32, dec: &Decoded) -> String {
    let mut line = String::new();
    if dec.lock {
        line.push_str("LOCK ");
    }
    if let Some(rep) = dec.rep {
        let uses_z_flag = matches!(
            dec.def.op,
            Mnemonic::Cmpsb | Mnemonic::Cmpsw | Mnemonic::Scasb | Mnemonic::Scasw
        );
        line.push_str(match (rep, uses_z_flag) {
            (0xF2, _) => "REPNE ",
            (0xF3, true) => "REPE ",
            _ => "REP ",
        });
    }
    line.push_str(&dec.def.op.name());

    let mut render = OperandRender {
        dec,
        addr,
        imm_taken: 0,
    };
    let mut first = true;
    for flag in [dec.def.oper1, dec.def.oper2, dec.def.oper3] {
        if let Some(text) = render.operand(flag) {
            line.push_str(if first { " " } else { ", " });
            line.push_str(&text);
            first = false;
        }
    }
    line
}

/// Disassemble a whole buffer, one line per instruction.
pub fn disassemble<W: Write>(
    decoder: &Decoder,
    bytes: &[u8],
    origin: u32,
    print_hex: bool,
    output: &mut W,
) -> Result<()> {
    let mut pos = 0usize;
    let mut addr = origin;
    while pos < bytes.len() {
        let buf = fetch_instruction(decoder, &bytes[pos..]).map_err(|e| {
            anyhow!(
                "{addr:04x}: error fetching instruction: {e}: {}",
                hex_bytes(&bytes[pos..bytes.len().min(pos + 8)])
            )
        })?;
        let dec = decode_instruction(decoder, &buf)
            .map_err(|e| anyhow!("{addr:04x}: error decoding instruction: {e}"))?;
        if print_hex {
            write!(output, "{addr:04x}: {:24}", hex_bytes(&buf))?;
        }
        writeln!(output, "{}", render_assembly(addr, &dec))?;
        pos += dec.len;
        addr += dec.len as u32;
    }
    Ok(())
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
