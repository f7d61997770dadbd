//! The static x86 instruction table: one row per encoding, for the
//! 8086/8088 base set, the 80186 additions and the 8087 coprocessor.
//!
//! Rows are matched by the decoder in table order; the first row whose
//! ModR/M class accepts the byte wins. Alternative spellings of the
//! same encoding (`JZ` for `JE`, `RET` for `RETN`, ...) are present so
//! the table describes the full assembly language, and are skipped when
//! the decoder is built so that disassembly picks the canonical form.

/// Instruction mnemonics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Aaa, Aad, Aam, Aas, Adc, Add, And, Bound, Call, Cbw, Clc, Cld, Cli, Cmc,
    Cmp, Cmps, Cmpsb, Cmpsw, Cwd, Daa, Das, Dec, Div, Enter, Hlt, Idiv, Imul,
    In, Inc, Ins, Insb, Insw, Int, Int3, Into, Iret, Iretw, Ja, Jae, Jb, Jbe,
    Jc, Jcxz, Je, Jg, Jge, Jl, Jle, Jmp, Jna, Jnae, Jnb, Jnbe, Jnc, Jne, Jng,
    Jnge, Jnl, Jnle, Jno, Jnp, Jns, Jnz, Jo, Jp, Jpe, Jpo, Js, Jz, Lahf, Lds,
    Lea, Leave, Les, Lods, Lodsb, Lodsw, Loop, Loope, Loopne, Loopnz, Loopz,
    Mov, Movs, Movsb, Movsw, Mul, Neg, Nop, Not, Or, Out, Outs, Outsb, Outsw,
    Pop, Popa, Popaw, Popf, Popfw, Push, Pusha, Pushaw, Pushf, Pushfw, Rcl,
    Rcr, Ret, Retf, Retn, Rol, Ror, Sahf, Sal, Sar, Sbb, Scas, Scasb, Scasw,
    Shl, Shr, Stc, Std, Sti, Stos, Stosb, Stosw, Sub, Test, Wait, Xchg, Xlatb,
    Xor,
    // 8087
    F2xm1, Fabs, Fadd, Faddp, Fbld, Fbstp, Fchs, Fclex, Fcom, Fcomp, Fcompp,
    Fdisi, Fdiv, Fdivp, Fdivr, Fdivrp, Feni, Ffree, Fiadd, Ficom, Ficomp,
    Fidiv, Fidivr, Fild, Fimul, Finit, Fist, Fistp, Fisub, Fisubr, Fld, Fld1,
    Fldcw, Fldenv, Fldl2e, Fldl2t, Fldlg2, Fldln2, Fldpi, Fldz, Fmul, Fmulp,
    Fnclex, Fndisi, Fneni, Fninit, Fnop, Fnsave, Fnstcw, Fnstenv, Fnstsw,
    Fpatan, Fprem, Fptan, Frndint, Frstor, Fsave, Fscale, Fsqrt, Fst, Fstcw,
    Fstenv, Fstp, Fstsw, Fsub, Fsubp, Fsubr, Fsubrp, Ftst, Fwait, Fxam, Fxch,
    Fxtract, Fyl2x, Fyl2xp1,
}

impl Mnemonic {
    /// Assembly spelling, upper case.
    pub fn name(self) -> String {
        format!("{self:?}").to_ascii_uppercase()
    }
}

/// What an operand position holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandFlag {
    None,
    /// Register or memory via ModR/M.
    Rm8,
    Rm16,
    /// Fixed registers.
    Al,
    Cl,
    Ax,
    Dx,
    /// Register from the ModR/M reg field, or from the low opcode bits
    /// for incrementing opcodes.
    Reg8,
    Reg16,
    /// Segment register; from the ModR/M reg field, or from the row's
    /// `reg` for the one-byte PUSH/POP encodings.
    Sreg,
    /// Memory only, via ModR/M.
    Mem,
    Mem16,
    Mem32,
    Mem64,
    Mem80,
    /// Direct 16-bit memory address following the opcode.
    Indir,
    /// Immediates.
    Imm,
    Imm8,
    One,
    Three,
    /// PC-relative jump displacement.
    Jump,
    /// Far pointer immediate, offset then segment.
    Far,
    /// 8087 stack top and stack element.
    St,
    Sti,
}

/// How a row matches a ModR/M byte.
///
/// | class | match condition |
/// |-------|-----------------|
/// | RMN   | no ModR/M byte |
/// | RRM, RMR | any ModR/M |
/// | RMC   | `reg == row.reg` |
/// | REG   | `mod == 3 && rm == reg` |
/// | MMC   | `mod != 3 && reg == row.reg` |
/// | SSI, SIS, SIC | `mod == 3 && reg == row.reg` |
/// | SSC, STC | `mod == 3 && reg == row.reg && rm == 0` |
/// | STK   | `mod == 3 && reg == row.reg && rm == 1` |
/// | CCC   | the whole byte equals `row.opcode2` |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModrmClass {
    Rmn,
    Rrm,
    Rmr,
    Rmc,
    Reg,
    Mmc,
    Ssi,
    Sis,
    Sic,
    Ssc,
    Stc,
    Stk,
    Ccc,
}

/// One instruction encoding.
#[derive(Debug, PartialEq, Eq)]
pub struct InsDef {
    pub op: Mnemonic,
    pub oper1: OperandFlag,
    pub oper2: OperandFlag,
    pub oper3: OperandFlag,
    /// 1 or 2 opcode bytes.
    pub opcodes: u8,
    pub opcode1: u8,
    /// Second opcode byte, or the exact ModR/M byte for class CCC.
    pub opcode2: u8,
    /// The low 3 bits of opcode1 encode a register.
    pub opcode_inc: bool,
    pub modrm: ModrmClass,
    /// Required ModR/M reg field for the constrained classes; segment
    /// register number for the one-byte PUSH/POP sreg rows.
    pub reg: u8,
    pub imm1: u8,
    pub imm2: u8,
    pub imm3: u8,
    /// Encoded as the FWAIT opcode followed by the no-wait form.
    pub wait_prefix: bool,
}

impl InsDef {
    pub fn has_opcode2(&self) -> bool {
        self.opcodes > 1
    }
}

macro_rules! row {
    ($op:ident, $o1:ident, $o2:ident, $o3:ident, $ops:expr, $op1:expr, $op2:expr,
     $inc:expr, $modrm:ident, $reg:expr, $i1:expr, $i2:expr, $i3:expr, $wait:expr) => {
        InsDef {
            op: Mnemonic::$op,
            oper1: OperandFlag::$o1,
            oper2: OperandFlag::$o2,
            oper3: OperandFlag::$o3,
            opcodes: $ops,
            opcode1: $op1,
            opcode2: $op2,
            opcode_inc: $inc,
            modrm: ModrmClass::$modrm,
            reg: $reg,
            imm1: $i1,
            imm2: $i2,
            imm3: $i3,
            wait_prefix: $wait,
        }
    };
}

#[rustfmt::skip]
pub static INSTRUCTION_TABLE: &[InsDef] = &[
    // mnemonic  o1     o2     o3    ops op1   op2   inc    modrm reg i1 i2 i3 wait
    row!(Add,    Rm8,   Reg8,  None, 1, 0x00, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Add,    Rm16,  Reg16, None, 1, 0x01, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Add,    Reg8,  Rm8,   None, 1, 0x02, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Add,    Reg16, Rm16,  None, 1, 0x03, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Add,    Al,    Imm8,  None, 1, 0x04, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Add,    Ax,    Imm,   None, 1, 0x05, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Push,   Sreg,  None,  None, 1, 0x06, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Pop,    Sreg,  None,  None, 1, 0x07, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Or,     Rm8,   Reg8,  None, 1, 0x08, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Or,     Rm16,  Reg16, None, 1, 0x09, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Or,     Reg8,  Rm8,   None, 1, 0x0A, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Or,     Reg16, Rm16,  None, 1, 0x0B, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Or,     Al,    Imm8,  None, 1, 0x0C, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Or,     Ax,    Imm,   None, 1, 0x0D, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Push,   Sreg,  None,  None, 1, 0x0E, 0x00, false, Rmn, 1, 0, 0, 0, false),
    row!(Pop,    Sreg,  None,  None, 1, 0x0F, 0x00, false, Rmn, 1, 0, 0, 0, false),
    row!(Adc,    Rm8,   Reg8,  None, 1, 0x10, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Adc,    Rm16,  Reg16, None, 1, 0x11, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Adc,    Reg8,  Rm8,   None, 1, 0x12, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Adc,    Reg16, Rm16,  None, 1, 0x13, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Adc,    Al,    Imm8,  None, 1, 0x14, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Adc,    Ax,    Imm,   None, 1, 0x15, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Push,   Sreg,  None,  None, 1, 0x16, 0x00, false, Rmn, 2, 0, 0, 0, false),
    row!(Pop,    Sreg,  None,  None, 1, 0x17, 0x00, false, Rmn, 2, 0, 0, 0, false),
    row!(Sbb,    Rm8,   Reg8,  None, 1, 0x18, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Sbb,    Rm16,  Reg16, None, 1, 0x19, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Sbb,    Reg8,  Rm8,   None, 1, 0x1A, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Sbb,    Reg16, Rm16,  None, 1, 0x1B, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Sbb,    Al,    Imm8,  None, 1, 0x1C, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Sbb,    Ax,    Imm,   None, 1, 0x1D, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Push,   Sreg,  None,  None, 1, 0x1E, 0x00, false, Rmn, 3, 0, 0, 0, false),
    row!(Pop,    Sreg,  None,  None, 1, 0x1F, 0x00, false, Rmn, 3, 0, 0, 0, false),
    row!(And,    Rm8,   Reg8,  None, 1, 0x20, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(And,    Rm16,  Reg16, None, 1, 0x21, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(And,    Reg8,  Rm8,   None, 1, 0x22, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(And,    Reg16, Rm16,  None, 1, 0x23, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(And,    Al,    Imm8,  None, 1, 0x24, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(And,    Ax,    Imm,   None, 1, 0x25, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Daa,    None,  None,  None, 1, 0x27, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Sub,    Rm8,   Reg8,  None, 1, 0x28, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Sub,    Rm16,  Reg16, None, 1, 0x29, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Sub,    Reg8,  Rm8,   None, 1, 0x2A, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Sub,    Reg16, Rm16,  None, 1, 0x2B, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Sub,    Al,    Imm8,  None, 1, 0x2C, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Sub,    Ax,    Imm,   None, 1, 0x2D, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Das,    None,  None,  None, 1, 0x2F, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Xor,    Rm8,   Reg8,  None, 1, 0x30, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Xor,    Rm16,  Reg16, None, 1, 0x31, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Xor,    Reg8,  Rm8,   None, 1, 0x32, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Xor,    Reg16, Rm16,  None, 1, 0x33, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Xor,    Al,    Imm8,  None, 1, 0x34, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Xor,    Ax,    Imm,   None, 1, 0x35, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Aaa,    None,  None,  None, 1, 0x37, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Cmp,    Rm8,   Reg8,  None, 1, 0x38, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Cmp,    Rm16,  Reg16, None, 1, 0x39, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Cmp,    Reg8,  Rm8,   None, 1, 0x3A, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Cmp,    Reg16, Rm16,  None, 1, 0x3B, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Cmp,    Al,    Imm8,  None, 1, 0x3C, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Cmp,    Ax,    Imm,   None, 1, 0x3D, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Aas,    None,  None,  None, 1, 0x3F, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Inc,    Reg16, None,  None, 1, 0x40, 0x00, true,  Rmn, 0, 0, 0, 0, false),
    row!(Dec,    Reg16, None,  None, 1, 0x48, 0x00, true,  Rmn, 0, 0, 0, 0, false),
    row!(Push,   Reg16, None,  None, 1, 0x50, 0x00, true,  Rmn, 0, 0, 0, 0, false),
    row!(Pop,    Reg16, None,  None, 1, 0x58, 0x00, true,  Rmn, 0, 0, 0, 0, false),
    row!(Pushaw, None,  None,  None, 1, 0x60, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Pusha,  None,  None,  None, 1, 0x60, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Popaw,  None,  None,  None, 1, 0x61, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Popa,   None,  None,  None, 1, 0x61, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Bound,  Reg16, Mem32, None, 1, 0x62, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Push,   Imm,   None,  None, 1, 0x68, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Imul,   Reg16, Rm16,  Imm,  1, 0x69, 0x00, false, Rrm, 0, 2, 0, 0, false),
    row!(Push,   Imm8,  None,  None, 1, 0x6A, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Imul,   Reg16, Rm16,  Imm8, 1, 0x6B, 0x00, false, Rrm, 0, 1, 0, 0, false),
    row!(Insb,   None,  None,  None, 1, 0x6C, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Ins,    None,  None,  None, 1, 0x6C, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Insw,   None,  None,  None, 1, 0x6D, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Outsb,  None,  None,  None, 1, 0x6E, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Outs,   None,  None,  None, 1, 0x6E, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Outsw,  None,  None,  None, 1, 0x6F, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Jo,     Jump,  None,  None, 1, 0x70, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jno,    Jump,  None,  None, 1, 0x71, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jb,     Jump,  None,  None, 1, 0x72, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jc,     Jump,  None,  None, 1, 0x72, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jnae,   Jump,  None,  None, 1, 0x72, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jae,    Jump,  None,  None, 1, 0x73, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jnb,    Jump,  None,  None, 1, 0x73, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jnc,    Jump,  None,  None, 1, 0x73, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Je,     Jump,  None,  None, 1, 0x74, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jz,     Jump,  None,  None, 1, 0x74, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jne,    Jump,  None,  None, 1, 0x75, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jnz,    Jump,  None,  None, 1, 0x75, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jbe,    Jump,  None,  None, 1, 0x76, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jna,    Jump,  None,  None, 1, 0x76, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Ja,     Jump,  None,  None, 1, 0x77, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jnbe,   Jump,  None,  None, 1, 0x77, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Js,     Jump,  None,  None, 1, 0x78, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jns,    Jump,  None,  None, 1, 0x79, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jpe,    Jump,  None,  None, 1, 0x7A, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jp,     Jump,  None,  None, 1, 0x7A, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jpo,    Jump,  None,  None, 1, 0x7B, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jnp,    Jump,  None,  None, 1, 0x7B, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jl,     Jump,  None,  None, 1, 0x7C, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jnge,   Jump,  None,  None, 1, 0x7C, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jge,    Jump,  None,  None, 1, 0x7D, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jnl,    Jump,  None,  None, 1, 0x7D, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jle,    Jump,  None,  None, 1, 0x7E, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jng,    Jump,  None,  None, 1, 0x7E, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jg,     Jump,  None,  None, 1, 0x7F, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jnle,   Jump,  None,  None, 1, 0x7F, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Add,    Rm8,   Imm8,  None, 1, 0x80, 0x00, false, Rmc, 0, 1, 0, 0, false),
    row!(Or,     Rm8,   Imm8,  None, 1, 0x80, 0x00, false, Rmc, 1, 1, 0, 0, false),
    row!(Adc,    Rm8,   Imm8,  None, 1, 0x80, 0x00, false, Rmc, 2, 1, 0, 0, false),
    row!(Sbb,    Rm8,   Imm8,  None, 1, 0x80, 0x00, false, Rmc, 3, 1, 0, 0, false),
    row!(And,    Rm8,   Imm8,  None, 1, 0x80, 0x00, false, Rmc, 4, 1, 0, 0, false),
    row!(Sub,    Rm8,   Imm8,  None, 1, 0x80, 0x00, false, Rmc, 5, 1, 0, 0, false),
    row!(Xor,    Rm8,   Imm8,  None, 1, 0x80, 0x00, false, Rmc, 6, 1, 0, 0, false),
    row!(Cmp,    Rm8,   Imm8,  None, 1, 0x80, 0x00, false, Rmc, 7, 1, 0, 0, false),
    row!(Add,    Rm16,  Imm,   None, 1, 0x81, 0x00, false, Rmc, 0, 2, 0, 0, false),
    row!(Or,     Rm16,  Imm,   None, 1, 0x81, 0x00, false, Rmc, 1, 2, 0, 0, false),
    row!(Adc,    Rm16,  Imm,   None, 1, 0x81, 0x00, false, Rmc, 2, 2, 0, 0, false),
    row!(Sbb,    Rm16,  Imm,   None, 1, 0x81, 0x00, false, Rmc, 3, 2, 0, 0, false),
    row!(And,    Rm16,  Imm,   None, 1, 0x81, 0x00, false, Rmc, 4, 2, 0, 0, false),
    row!(Sub,    Rm16,  Imm,   None, 1, 0x81, 0x00, false, Rmc, 5, 2, 0, 0, false),
    row!(Xor,    Rm16,  Imm,   None, 1, 0x81, 0x00, false, Rmc, 6, 2, 0, 0, false),
    row!(Cmp,    Rm16,  Imm,   None, 1, 0x81, 0x00, false, Rmc, 7, 2, 0, 0, false),
    row!(Add,    Rm16,  Imm8,  None, 1, 0x83, 0x00, false, Rmc, 0, 1, 0, 0, false),
    row!(Or,     Rm16,  Imm8,  None, 1, 0x83, 0x00, false, Rmc, 1, 1, 0, 0, false),
    row!(Adc,    Rm16,  Imm8,  None, 1, 0x83, 0x00, false, Rmc, 2, 1, 0, 0, false),
    row!(Sbb,    Rm16,  Imm8,  None, 1, 0x83, 0x00, false, Rmc, 3, 1, 0, 0, false),
    row!(And,    Rm16,  Imm8,  None, 1, 0x83, 0x00, false, Rmc, 4, 1, 0, 0, false),
    row!(Sub,    Rm16,  Imm8,  None, 1, 0x83, 0x00, false, Rmc, 5, 1, 0, 0, false),
    row!(Xor,    Rm16,  Imm8,  None, 1, 0x83, 0x00, false, Rmc, 6, 1, 0, 0, false),
    row!(Cmp,    Rm16,  Imm8,  None, 1, 0x83, 0x00, false, Rmc, 7, 1, 0, 0, false),
    row!(Test,   Rm8,   Reg8,  None, 1, 0x84, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Test,   Rm16,  Reg16, None, 1, 0x85, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Xchg,   Rm8,   Reg8,  None, 1, 0x86, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Xchg,   Rm16,  Reg16, None, 1, 0x87, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Mov,    Rm8,   Reg8,  None, 1, 0x88, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Mov,    Rm16,  Reg16, None, 1, 0x89, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Mov,    Reg8,  Rm8,   None, 1, 0x8A, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Mov,    Reg16, Rm16,  None, 1, 0x8B, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Mov,    Rm16,  Sreg,  None, 1, 0x8C, 0x00, false, Rmr, 0, 0, 0, 0, false),
    row!(Lea,    Reg16, Mem,   None, 1, 0x8D, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Mov,    Sreg,  Rm16,  None, 1, 0x8E, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Pop,    Rm16,  None,  None, 1, 0x8F, 0x00, false, Rmc, 0, 0, 0, 0, false),
    row!(Nop,    None,  None,  None, 1, 0x90, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Xchg,   Ax,    Reg16, None, 1, 0x90, 0x00, true,  Rmn, 0, 0, 0, 0, false),
    row!(Xchg,   Reg16, Ax,    None, 1, 0x90, 0x00, true,  Rmn, 0, 0, 0, 0, false),
    row!(Cbw,    None,  None,  None, 1, 0x98, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Cwd,    None,  None,  None, 1, 0x99, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Call,   Far,   None,  None, 1, 0x9A, 0x00, false, Rmn, 0, 2, 2, 0, false),
    row!(Fwait,  None,  None,  None, 1, 0x9B, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Wait,   None,  None,  None, 1, 0x9B, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Pushfw, None,  None,  None, 1, 0x9C, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Pushf,  None,  None,  None, 1, 0x9C, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Popfw,  None,  None,  None, 1, 0x9D, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Popf,   None,  None,  None, 1, 0x9D, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Sahf,   None,  None,  None, 1, 0x9E, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Lahf,   None,  None,  None, 1, 0x9F, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Mov,    Al,    Indir, None, 1, 0xA0, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Mov,    Ax,    Indir, None, 1, 0xA1, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Mov,    Indir, Al,    None, 1, 0xA2, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Mov,    Indir, Ax,    None, 1, 0xA3, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Movsb,  None,  None,  None, 1, 0xA4, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Movs,   None,  None,  None, 1, 0xA4, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Movsw,  None,  None,  None, 1, 0xA5, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Cmpsb,  None,  None,  None, 1, 0xA6, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Cmps,   None,  None,  None, 1, 0xA6, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Cmpsw,  None,  None,  None, 1, 0xA7, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Test,   Al,    Imm8,  None, 1, 0xA8, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Test,   Ax,    Imm,   None, 1, 0xA9, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Stosb,  None,  None,  None, 1, 0xAA, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Stos,   None,  None,  None, 1, 0xAA, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Stosw,  None,  None,  None, 1, 0xAB, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Lodsb,  None,  None,  None, 1, 0xAC, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Lods,   None,  None,  None, 1, 0xAC, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Lodsw,  None,  None,  None, 1, 0xAD, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Scasb,  None,  None,  None, 1, 0xAE, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Scas,   None,  None,  None, 1, 0xAE, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Scasw,  None,  None,  None, 1, 0xAF, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Mov,    Reg8,  Imm8,  None, 1, 0xB0, 0x00, true,  Rmn, 0, 1, 0, 0, false),
    row!(Mov,    Reg16, Imm,   None, 1, 0xB8, 0x00, true,  Rmn, 0, 2, 0, 0, false),
    row!(Rol,    Rm8,   Imm8,  None, 1, 0xC0, 0x00, false, Rmc, 0, 1, 0, 0, false),
    row!(Ror,    Rm8,   Imm8,  None, 1, 0xC0, 0x00, false, Rmc, 1, 1, 0, 0, false),
    row!(Rcl,    Rm8,   Imm8,  None, 1, 0xC0, 0x00, false, Rmc, 2, 1, 0, 0, false),
    row!(Rcr,    Rm8,   Imm8,  None, 1, 0xC0, 0x00, false, Rmc, 3, 1, 0, 0, false),
    row!(Shl,    Rm8,   Imm8,  None, 1, 0xC0, 0x00, false, Rmc, 4, 1, 0, 0, false),
    row!(Sal,    Rm8,   Imm8,  None, 1, 0xC0, 0x00, false, Rmc, 4, 1, 0, 0, false),
    row!(Shr,    Rm8,   Imm8,  None, 1, 0xC0, 0x00, false, Rmc, 5, 1, 0, 0, false),
    row!(Sar,    Rm8,   Imm8,  None, 1, 0xC0, 0x00, false, Rmc, 7, 1, 0, 0, false),
    row!(Rol,    Rm16,  Imm8,  None, 1, 0xC1, 0x00, false, Rmc, 0, 1, 0, 0, false),
    row!(Ror,    Rm16,  Imm8,  None, 1, 0xC1, 0x00, false, Rmc, 1, 1, 0, 0, false),
    row!(Rcl,    Rm16,  Imm8,  None, 1, 0xC1, 0x00, false, Rmc, 2, 1, 0, 0, false),
    row!(Rcr,    Rm16,  Imm8,  None, 1, 0xC1, 0x00, false, Rmc, 3, 1, 0, 0, false),
    row!(Shl,    Rm16,  Imm8,  None, 1, 0xC1, 0x00, false, Rmc, 4, 1, 0, 0, false),
    row!(Sal,    Rm16,  Imm8,  None, 1, 0xC1, 0x00, false, Rmc, 4, 1, 0, 0, false),
    row!(Shr,    Rm16,  Imm8,  None, 1, 0xC1, 0x00, false, Rmc, 5, 1, 0, 0, false),
    row!(Sar,    Rm16,  Imm8,  None, 1, 0xC1, 0x00, false, Rmc, 7, 1, 0, 0, false),
    row!(Retn,   Imm,   None,  None, 1, 0xC2, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Ret,    Imm,   None,  None, 1, 0xC2, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Retn,   None,  None,  None, 1, 0xC3, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Ret,    None,  None,  None, 1, 0xC3, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Les,    Reg16, Mem32, None, 1, 0xC4, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Lds,    Reg16, Mem32, None, 1, 0xC5, 0x00, false, Rrm, 0, 0, 0, 0, false),
    row!(Mov,    Rm8,   Imm8,  None, 1, 0xC6, 0x00, false, Rmc, 0, 1, 0, 0, false),
    row!(Mov,    Rm16,  Imm,   None, 1, 0xC7, 0x00, false, Rmc, 0, 2, 0, 0, false),
    row!(Enter,  Imm,   Imm8,  None, 1, 0xC8, 0x00, false, Rmn, 0, 2, 1, 0, false),
    row!(Leave,  None,  None,  None, 1, 0xC9, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Retf,   Imm,   None,  None, 1, 0xCA, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Retf,   None,  None,  None, 1, 0xCB, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Int3,   None,  None,  None, 1, 0xCC, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Int,    Three, None,  None, 1, 0xCC, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Int,    Imm8,  None,  None, 1, 0xCD, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Into,   None,  None,  None, 1, 0xCE, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Iretw,  None,  None,  None, 1, 0xCF, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Iret,   None,  None,  None, 1, 0xCF, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Rol,    Rm8,   One,   None, 1, 0xD0, 0x00, false, Rmc, 0, 0, 0, 0, false),
    row!(Ror,    Rm8,   One,   None, 1, 0xD0, 0x00, false, Rmc, 1, 0, 0, 0, false),
    row!(Rcl,    Rm8,   One,   None, 1, 0xD0, 0x00, false, Rmc, 2, 0, 0, 0, false),
    row!(Rcr,    Rm8,   One,   None, 1, 0xD0, 0x00, false, Rmc, 3, 0, 0, 0, false),
    row!(Shl,    Rm8,   One,   None, 1, 0xD0, 0x00, false, Rmc, 4, 0, 0, 0, false),
    row!(Sal,    Rm8,   One,   None, 1, 0xD0, 0x00, false, Rmc, 4, 0, 0, 0, false),
    row!(Shr,    Rm8,   One,   None, 1, 0xD0, 0x00, false, Rmc, 5, 0, 0, 0, false),
    row!(Sar,    Rm8,   One,   None, 1, 0xD0, 0x00, false, Rmc, 7, 0, 0, 0, false),
    row!(Rol,    Rm16,  One,   None, 1, 0xD1, 0x00, false, Rmc, 0, 0, 0, 0, false),
    row!(Ror,    Rm16,  One,   None, 1, 0xD1, 0x00, false, Rmc, 1, 0, 0, 0, false),
    row!(Rcl,    Rm16,  One,   None, 1, 0xD1, 0x00, false, Rmc, 2, 0, 0, 0, false),
    row!(Rcr,    Rm16,  One,   None, 1, 0xD1, 0x00, false, Rmc, 3, 0, 0, 0, false),
    row!(Shl,    Rm16,  One,   None, 1, 0xD1, 0x00, false, Rmc, 4, 0, 0, 0, false),
    row!(Sal,    Rm16,  One,   None, 1, 0xD1, 0x00, false, Rmc, 4, 0, 0, 0, false),
    row!(Shr,    Rm16,  One,   None, 1, 0xD1, 0x00, false, Rmc, 5, 0, 0, 0, false),
    row!(Sar,    Rm16,  One,   None, 1, 0xD1, 0x00, false, Rmc, 7, 0, 0, 0, false),
    row!(Rol,    Rm8,   Cl,    None, 1, 0xD2, 0x00, false, Rmc, 0, 0, 0, 0, false),
    row!(Ror,    Rm8,   Cl,    None, 1, 0xD2, 0x00, false, Rmc, 1, 0, 0, 0, false),
    row!(Rcl,    Rm8,   Cl,    None, 1, 0xD2, 0x00, false, Rmc, 2, 0, 0, 0, false),
    row!(Rcr,    Rm8,   Cl,    None, 1, 0xD2, 0x00, false, Rmc, 3, 0, 0, 0, false),
    row!(Shl,    Rm8,   Cl,    None, 1, 0xD2, 0x00, false, Rmc, 4, 0, 0, 0, false),
    row!(Sal,    Rm8,   Cl,    None, 1, 0xD2, 0x00, false, Rmc, 4, 0, 0, 0, false),
    row!(Shr,    Rm8,   Cl,    None, 1, 0xD2, 0x00, false, Rmc, 5, 0, 0, 0, false),
    row!(Sar,    Rm8,   Cl,    None, 1, 0xD2, 0x00, false, Rmc, 7, 0, 0, 0, false),
    row!(Rol,    Rm16,  Cl,    None, 1, 0xD3, 0x00, false, Rmc, 0, 0, 0, 0, false),
    row!(Ror,    Rm16,  Cl,    None, 1, 0xD3, 0x00, false, Rmc, 1, 0, 0, 0, false),
    row!(Rcl,    Rm16,  Cl,    None, 1, 0xD3, 0x00, false, Rmc, 2, 0, 0, 0, false),
    row!(Rcr,    Rm16,  Cl,    None, 1, 0xD3, 0x00, false, Rmc, 3, 0, 0, 0, false),
    row!(Shl,    Rm16,  Cl,    None, 1, 0xD3, 0x00, false, Rmc, 4, 0, 0, 0, false),
    row!(Sal,    Rm16,  Cl,    None, 1, 0xD3, 0x00, false, Rmc, 4, 0, 0, 0, false),
    row!(Shr,    Rm16,  Cl,    None, 1, 0xD3, 0x00, false, Rmc, 5, 0, 0, 0, false),
    row!(Sar,    Rm16,  Cl,    None, 1, 0xD3, 0x00, false, Rmc, 7, 0, 0, 0, false),
    row!(Aam,    None,  None,  None, 2, 0xD4, 0x0A, false, Rmn, 0, 0, 0, 0, false),
    row!(Aad,    None,  None,  None, 2, 0xD5, 0x0A, false, Rmn, 0, 0, 0, 0, false),
    row!(Xlatb,  None,  None,  None, 1, 0xD7, 0x00, false, Rmn, 0, 0, 0, 0, false),
    // 8087: memory forms, then stack forms
    row!(Fadd,   Mem32, None,  None, 1, 0xD8, 0x00, false, Mmc, 0, 0, 0, 0, false),
    row!(Fmul,   Mem32, None,  None, 1, 0xD8, 0x00, false, Mmc, 1, 0, 0, 0, false),
    row!(Fcom,   Mem32, None,  None, 1, 0xD8, 0x00, false, Mmc, 2, 0, 0, 0, false),
    row!(Fcomp,  Mem32, None,  None, 1, 0xD8, 0x00, false, Mmc, 3, 0, 0, 0, false),
    row!(Fsub,   Mem32, None,  None, 1, 0xD8, 0x00, false, Mmc, 4, 0, 0, 0, false),
    row!(Fsubr,  Mem32, None,  None, 1, 0xD8, 0x00, false, Mmc, 5, 0, 0, 0, false),
    row!(Fdiv,   Mem32, None,  None, 1, 0xD8, 0x00, false, Mmc, 6, 0, 0, 0, false),
    row!(Fdivr,  Mem32, None,  None, 1, 0xD8, 0x00, false, Mmc, 7, 0, 0, 0, false),
    row!(Fadd,   St,    Sti,   None, 1, 0xD8, 0x00, false, Ssi, 0, 0, 0, 0, false),
    row!(Fmul,   St,    Sti,   None, 1, 0xD8, 0x00, false, Ssi, 1, 0, 0, 0, false),
    row!(Fcom,   Sti,   None,  None, 1, 0xD8, 0x00, false, Sic, 2, 0, 0, 0, false),
    row!(Fcomp,  Sti,   None,  None, 1, 0xD8, 0x00, false, Sic, 3, 0, 0, 0, false),
    row!(Fsub,   St,    Sti,   None, 1, 0xD8, 0x00, false, Ssi, 4, 0, 0, 0, false),
    row!(Fsubr,  St,    Sti,   None, 1, 0xD8, 0x00, false, Ssi, 5, 0, 0, 0, false),
    row!(Fdiv,   St,    Sti,   None, 1, 0xD8, 0x00, false, Ssi, 6, 0, 0, 0, false),
    row!(Fdivr,  St,    Sti,   None, 1, 0xD8, 0x00, false, Ssi, 7, 0, 0, 0, false),
    row!(Fld,    Mem32, None,  None, 1, 0xD9, 0x00, false, Mmc, 0, 0, 0, 0, false),
    row!(Fst,    Mem32, None,  None, 1, 0xD9, 0x00, false, Mmc, 2, 0, 0, 0, false),
    row!(Fstp,   Mem32, None,  None, 1, 0xD9, 0x00, false, Mmc, 3, 0, 0, 0, false),
    row!(Fldenv, Mem,   None,  None, 1, 0xD9, 0x00, false, Mmc, 4, 0, 0, 0, false),
    row!(Fldcw,  Mem16, None,  None, 1, 0xD9, 0x00, false, Mmc, 5, 0, 0, 0, false),
    row!(Fnstenv, Mem,  None,  None, 1, 0xD9, 0x00, false, Mmc, 6, 0, 0, 0, false),
    row!(Fstenv, Mem,   None,  None, 1, 0xD9, 0x00, false, Mmc, 6, 0, 0, 0, true),
    row!(Fnstcw, Mem16, None,  None, 1, 0xD9, 0x00, false, Mmc, 7, 0, 0, 0, false),
    row!(Fstcw,  Mem16, None,  None, 1, 0xD9, 0x00, false, Mmc, 7, 0, 0, 0, true),
    row!(Fld,    Sti,   None,  None, 1, 0xD9, 0x00, false, Sic, 0, 0, 0, 0, false),
    row!(Fxch,   Sti,   None,  None, 1, 0xD9, 0x00, false, Sic, 1, 0, 0, 0, false),
    row!(Fnop,   None,  None,  None, 1, 0xD9, 0xD0, false, Ccc, 2, 0, 0, 0, false),
    row!(Fchs,   None,  None,  None, 1, 0xD9, 0x00, false, Ssc, 4, 0, 0, 0, false),
    row!(Fabs,   None,  None,  None, 1, 0xD9, 0x00, false, Stk, 4, 0, 0, 0, false),
    row!(Ftst,   None,  None,  None, 1, 0xD9, 0xE4, false, Ccc, 4, 0, 0, 0, false),
    row!(Fxam,   None,  None,  None, 1, 0xD9, 0xE5, false, Ccc, 4, 0, 0, 0, false),
    row!(Fld1,   None,  None,  None, 1, 0xD9, 0x00, false, Ssc, 5, 0, 0, 0, false),
    row!(Fldl2t, None,  None,  None, 1, 0xD9, 0x00, false, Stk, 5, 0, 0, 0, false),
    row!(Fldl2e, None,  None,  None, 1, 0xD9, 0xEA, false, Ccc, 5, 0, 0, 0, false),
    row!(Fldpi,  None,  None,  None, 1, 0xD9, 0xEB, false, Ccc, 5, 0, 0, 0, false),
    row!(Fldlg2, None,  None,  None, 1, 0xD9, 0xEC, false, Ccc, 5, 0, 0, 0, false),
    row!(Fldln2, None,  None,  None, 1, 0xD9, 0xED, false, Ccc, 5, 0, 0, 0, false),
    row!(Fldz,   None,  None,  None, 1, 0xD9, 0xEE, false, Ccc, 5, 0, 0, 0, false),
    row!(F2xm1,  None,  None,  None, 1, 0xD9, 0x00, false, Ssc, 6, 0, 0, 0, false),
    row!(Fyl2x,  None,  None,  None, 1, 0xD9, 0x00, false, Stk, 6, 0, 0, 0, false),
    row!(Fptan,  None,  None,  None, 1, 0xD9, 0xF2, false, Ccc, 6, 0, 0, 0, false),
    row!(Fpatan, None,  None,  None, 1, 0xD9, 0xF3, false, Ccc, 6, 0, 0, 0, false),
    row!(Fxtract, None, None,  None, 1, 0xD9, 0xF4, false, Ccc, 6, 0, 0, 0, false),
    row!(Fprem,  None,  None,  None, 1, 0xD9, 0x00, false, Ssc, 7, 0, 0, 0, false),
    row!(Fyl2xp1, None, None,  None, 1, 0xD9, 0x00, false, Stk, 7, 0, 0, 0, false),
    row!(Fsqrt,  None,  None,  None, 1, 0xD9, 0xFA, false, Ccc, 7, 0, 0, 0, false),
    row!(Frndint, None, None,  None, 1, 0xD9, 0xFC, false, Ccc, 7, 0, 0, 0, false),
    row!(Fscale, None,  None,  None, 1, 0xD9, 0xFD, false, Ccc, 7, 0, 0, 0, false),
    row!(Fiadd,  Mem32, None,  None, 1, 0xDA, 0x00, false, Mmc, 0, 0, 0, 0, false),
    row!(Fimul,  Mem32, None,  None, 1, 0xDA, 0x00, false, Mmc, 1, 0, 0, 0, false),
    row!(Ficom,  Mem32, None,  None, 1, 0xDA, 0x00, false, Mmc, 2, 0, 0, 0, false),
    row!(Ficomp, Mem32, None,  None, 1, 0xDA, 0x00, false, Mmc, 3, 0, 0, 0, false),
    row!(Fisub,  Mem32, None,  None, 1, 0xDA, 0x00, false, Mmc, 4, 0, 0, 0, false),
    row!(Fisubr, Mem32, None,  None, 1, 0xDA, 0x00, false, Mmc, 5, 0, 0, 0, false),
    row!(Fidiv,  Mem32, None,  None, 1, 0xDA, 0x00, false, Mmc, 6, 0, 0, 0, false),
    row!(Fidivr, Mem32, None,  None, 1, 0xDA, 0x00, false, Mmc, 7, 0, 0, 0, false),
    row!(Fild,   Mem32, None,  None, 1, 0xDB, 0x00, false, Mmc, 0, 0, 0, 0, false),
    row!(Fist,   Mem32, None,  None, 1, 0xDB, 0x00, false, Mmc, 2, 0, 0, 0, false),
    row!(Fistp,  Mem32, None,  None, 1, 0xDB, 0x00, false, Mmc, 3, 0, 0, 0, false),
    row!(Fld,    Mem80, None,  None, 1, 0xDB, 0x00, false, Mmc, 5, 0, 0, 0, false),
    row!(Fstp,   Mem80, None,  None, 1, 0xDB, 0x00, false, Mmc, 7, 0, 0, 0, false),
    row!(Fneni,  None,  None,  None, 1, 0xDB, 0x00, false, Ssc, 4, 0, 0, 0, false),
    row!(Feni,   None,  None,  None, 1, 0xDB, 0x00, false, Ssc, 4, 0, 0, 0, true),
    row!(Fndisi, None,  None,  None, 1, 0xDB, 0x00, false, Stk, 4, 0, 0, 0, false),
    row!(Fdisi,  None,  None,  None, 1, 0xDB, 0x00, false, Stk, 4, 0, 0, 0, true),
    row!(Fnclex, None,  None,  None, 1, 0xDB, 0xE2, false, Ccc, 4, 0, 0, 0, false),
    row!(Fclex,  None,  None,  None, 1, 0xDB, 0xE2, false, Ccc, 4, 0, 0, 0, true),
    row!(Fninit, None,  None,  None, 1, 0xDB, 0xE3, false, Ccc, 4, 0, 0, 0, false),
    row!(Finit,  None,  None,  None, 1, 0xDB, 0xE3, false, Ccc, 4, 0, 0, 0, true),
    row!(Fadd,   Mem64, None,  None, 1, 0xDC, 0x00, false, Mmc, 0, 0, 0, 0, false),
    row!(Fmul,   Mem64, None,  None, 1, 0xDC, 0x00, false, Mmc, 1, 0, 0, 0, false),
    row!(Fcom,   Mem64, None,  None, 1, 0xDC, 0x00, false, Mmc, 2, 0, 0, 0, false),
    row!(Fcomp,  Mem64, None,  None, 1, 0xDC, 0x00, false, Mmc, 3, 0, 0, 0, false),
    row!(Fsub,   Mem64, None,  None, 1, 0xDC, 0x00, false, Mmc, 4, 0, 0, 0, false),
    row!(Fsubr,  Mem64, None,  None, 1, 0xDC, 0x00, false, Mmc, 5, 0, 0, 0, false),
    row!(Fdiv,   Mem64, None,  None, 1, 0xDC, 0x00, false, Mmc, 6, 0, 0, 0, false),
    row!(Fdivr,  Mem64, None,  None, 1, 0xDC, 0x00, false, Mmc, 7, 0, 0, 0, false),
    row!(Fadd,   Sti,   St,    None, 1, 0xDC, 0x00, false, Sis, 0, 0, 0, 0, false),
    row!(Fmul,   Sti,   St,    None, 1, 0xDC, 0x00, false, Sis, 1, 0, 0, 0, false),
    row!(Fsubr,  Sti,   St,    None, 1, 0xDC, 0x00, false, Sis, 4, 0, 0, 0, false),
    row!(Fsub,   Sti,   St,    None, 1, 0xDC, 0x00, false, Sis, 5, 0, 0, 0, false),
    row!(Fdivr,  Sti,   St,    None, 1, 0xDC, 0x00, false, Sis, 6, 0, 0, 0, false),
    row!(Fdiv,   Sti,   St,    None, 1, 0xDC, 0x00, false, Sis, 7, 0, 0, 0, false),
    row!(Fld,    Mem64, None,  None, 1, 0xDD, 0x00, false, Mmc, 0, 0, 0, 0, false),
    row!(Fst,    Mem64, None,  None, 1, 0xDD, 0x00, false, Mmc, 2, 0, 0, 0, false),
    row!(Fstp,   Mem64, None,  None, 1, 0xDD, 0x00, false, Mmc, 3, 0, 0, 0, false),
    row!(Frstor, Mem,   None,  None, 1, 0xDD, 0x00, false, Mmc, 4, 0, 0, 0, false),
    row!(Fnsave, Mem,   None,  None, 1, 0xDD, 0x00, false, Mmc, 6, 0, 0, 0, false),
    row!(Fsave,  Mem,   None,  None, 1, 0xDD, 0x00, false, Mmc, 6, 0, 0, 0, true),
    row!(Fnstsw, Mem16, None,  None, 1, 0xDD, 0x00, false, Mmc, 7, 0, 0, 0, false),
    row!(Fstsw,  Mem16, None,  None, 1, 0xDD, 0x00, false, Mmc, 7, 0, 0, 0, true),
    row!(Ffree,  Sti,   None,  None, 1, 0xDD, 0x00, false, Sic, 0, 0, 0, 0, false),
    row!(Fst,    Sti,   None,  None, 1, 0xDD, 0x00, false, Sic, 2, 0, 0, 0, false),
    row!(Fstp,   Sti,   None,  None, 1, 0xDD, 0x00, false, Sic, 3, 0, 0, 0, false),
    row!(Fiadd,  Mem16, None,  None, 1, 0xDE, 0x00, false, Mmc, 0, 0, 0, 0, false),
    row!(Fimul,  Mem16, None,  None, 1, 0xDE, 0x00, false, Mmc, 1, 0, 0, 0, false),
    row!(Ficom,  Mem16, None,  None, 1, 0xDE, 0x00, false, Mmc, 2, 0, 0, 0, false),
    row!(Ficomp, Mem16, None,  None, 1, 0xDE, 0x00, false, Mmc, 3, 0, 0, 0, false),
    row!(Fisub,  Mem16, None,  None, 1, 0xDE, 0x00, false, Mmc, 4, 0, 0, 0, false),
    row!(Fisubr, Mem16, None,  None, 1, 0xDE, 0x00, false, Mmc, 5, 0, 0, 0, false),
    row!(Fidiv,  Mem16, None,  None, 1, 0xDE, 0x00, false, Mmc, 6, 0, 0, 0, false),
    row!(Fidivr, Mem16, None,  None, 1, 0xDE, 0x00, false, Mmc, 7, 0, 0, 0, false),
    row!(Faddp,  Sti,   St,    None, 1, 0xDE, 0x00, false, Sis, 0, 0, 0, 0, false),
    row!(Fmulp,  Sti,   St,    None, 1, 0xDE, 0x00, false, Sis, 1, 0, 0, 0, false),
    row!(Fcompp, None,  None,  None, 1, 0xDE, 0x00, false, Stk, 3, 0, 0, 0, false),
    row!(Fsubrp, Sti,   St,    None, 1, 0xDE, 0x00, false, Sis, 4, 0, 0, 0, false),
    row!(Fsubp,  Sti,   St,    None, 1, 0xDE, 0x00, false, Sis, 5, 0, 0, 0, false),
    row!(Fdivrp, Sti,   St,    None, 1, 0xDE, 0x00, false, Sis, 6, 0, 0, 0, false),
    row!(Fdivp,  Sti,   St,    None, 1, 0xDE, 0x00, false, Sis, 7, 0, 0, 0, false),
    row!(Fild,   Mem16, None,  None, 1, 0xDF, 0x00, false, Mmc, 0, 0, 0, 0, false),
    row!(Fist,   Mem16, None,  None, 1, 0xDF, 0x00, false, Mmc, 2, 0, 0, 0, false),
    row!(Fistp,  Mem16, None,  None, 1, 0xDF, 0x00, false, Mmc, 3, 0, 0, 0, false),
    row!(Fbld,   Mem80, None,  None, 1, 0xDF, 0x00, false, Mmc, 4, 0, 0, 0, false),
    row!(Fild,   Mem64, None,  None, 1, 0xDF, 0x00, false, Mmc, 5, 0, 0, 0, false),
    row!(Fbstp,  Mem80, None,  None, 1, 0xDF, 0x00, false, Mmc, 6, 0, 0, 0, false),
    row!(Fistp,  Mem64, None,  None, 1, 0xDF, 0x00, false, Mmc, 7, 0, 0, 0, false),
    row!(Loopne, Jump,  None,  None, 1, 0xE0, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Loopnz, Jump,  None,  None, 1, 0xE0, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Loope,  Jump,  None,  None, 1, 0xE1, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Loopz,  Jump,  None,  None, 1, 0xE1, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Loop,   Jump,  None,  None, 1, 0xE2, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Jcxz,   Jump,  None,  None, 1, 0xE3, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(In,     Al,    Imm8,  None, 1, 0xE4, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(In,     Ax,    Imm8,  None, 1, 0xE5, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Out,    Imm8,  Al,    None, 1, 0xE6, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Out,    Imm8,  Ax,    None, 1, 0xE7, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(Call,   Jump,  None,  None, 1, 0xE8, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Jmp,    Jump,  None,  None, 1, 0xE9, 0x00, false, Rmn, 0, 2, 0, 0, false),
    row!(Jmp,    Far,   None,  None, 1, 0xEA, 0x00, false, Rmn, 0, 2, 2, 0, false),
    row!(Jmp,    Jump,  None,  None, 1, 0xEB, 0x00, false, Rmn, 0, 1, 0, 0, false),
    row!(In,     Al,    Dx,    None, 1, 0xEC, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(In,     Ax,    Dx,    None, 1, 0xED, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Out,    Dx,    Al,    None, 1, 0xEE, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Out,    Dx,    Ax,    None, 1, 0xEF, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Hlt,    None,  None,  None, 1, 0xF4, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Cmc,    None,  None,  None, 1, 0xF5, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Test,   Rm8,   Imm8,  None, 1, 0xF6, 0x00, false, Rmc, 0, 1, 0, 0, false),
    row!(Not,    Rm8,   None,  None, 1, 0xF6, 0x00, false, Rmc, 2, 0, 0, 0, false),
    row!(Neg,    Rm8,   None,  None, 1, 0xF6, 0x00, false, Rmc, 3, 0, 0, 0, false),
    row!(Mul,    Rm8,   None,  None, 1, 0xF6, 0x00, false, Rmc, 4, 0, 0, 0, false),
    row!(Imul,   Rm8,   None,  None, 1, 0xF6, 0x00, false, Rmc, 5, 0, 0, 0, false),
    row!(Div,    Rm8,   None,  None, 1, 0xF6, 0x00, false, Rmc, 6, 0, 0, 0, false),
    row!(Idiv,   Rm8,   None,  None, 1, 0xF6, 0x00, false, Rmc, 7, 0, 0, 0, false),
    row!(Test,   Rm16,  Imm,   None, 1, 0xF7, 0x00, false, Rmc, 0, 2, 0, 0, false),
    row!(Not,    Rm16,  None,  None, 1, 0xF7, 0x00, false, Rmc, 2, 0, 0, 0, false),
    row!(Neg,    Rm16,  None,  None, 1, 0xF7, 0x00, false, Rmc, 3, 0, 0, 0, false),
    row!(Mul,    Rm16,  None,  None, 1, 0xF7, 0x00, false, Rmc, 4, 0, 0, 0, false),
    row!(Imul,   Rm16,  None,  None, 1, 0xF7, 0x00, false, Rmc, 5, 0, 0, 0, false),
    row!(Div,    Rm16,  None,  None, 1, 0xF7, 0x00, false, Rmc, 6, 0, 0, 0, false),
    row!(Idiv,   Rm16,  None,  None, 1, 0xF7, 0x00, false, Rmc, 7, 0, 0, 0, false),
    row!(Clc,    None,  None,  None, 1, 0xF8, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Stc,    None,  None,  None, 1, 0xF9, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Cli,    None,  None,  None, 1, 0xFA, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Sti,    None,  None,  None, 1, 0xFB, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Cld,    None,  None,  None, 1, 0xFC, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Std,    None,  None,  None, 1, 0xFD, 0x00, false, Rmn, 0, 0, 0, 0, false),
    row!(Inc,    Rm8,   None,  None, 1, 0xFE, 0x00, false, Rmc, 0, 0, 0, 0, false),
    row!(Dec,    Rm8,   None,  None, 1, 0xFE, 0x00, false, Rmc, 1, 0, 0, 0, false),
    row!(Inc,    Rm16,  None,  None, 1, 0xFF, 0x00, false, Rmc, 0, 0, 0, 0, false),
    row!(Dec,    Rm16,  None,  None, 1, 0xFF, 0x00, false, Rmc, 1, 0, 0, 0, false),
    row!(Call,   Rm16,  None,  None, 1, 0xFF, 0x00, false, Rmc, 2, 0, 0, 0, false),
    row!(Call,   Mem32, None,  None, 1, 0xFF, 0x00, false, Mmc, 3, 0, 0, 0, false),
    row!(Jmp,    Rm16,  None,  None, 1, 0xFF, 0x00, false, Rmc, 4, 0, 0, 0, false),
    row!(Jmp,    Mem32, None,  None, 1, 0xFF, 0x00, false, Mmc, 5, 0, 0, 0, false),
    row!(Push,   Rm16,  None,  None, 1, 0xFF, 0x00, false, Rmc, 6, 0, 0, 0, false),
];

/// Short jump whose single displacement byte the fetcher reads without
/// consulting the table structure.
pub const SHORT_JMP: u8 = 0xEB;
/// Near jump with a two-byte displacement, likewise special-cased.
pub const NEAR_JMP: u8 = 0xE9;

/// Mnemonics whose every row is an alternative spelling of a canonical
/// encoding; the decoder skips them so disassembly picks the canonical
/// form.
static ALTERNATIVE_MNEMONICS: &[Mnemonic] = &[
    Mnemonic::Cmps,   // CMPSB/CMPSW
    Mnemonic::Wait,   // FWAIT, which usually occurs among FPU code
    Mnemonic::Ins,    // INSB/INSW
    Mnemonic::Jc,     // JB
    Mnemonic::Jna,    // JBE
    Mnemonic::Jnb,    // JAE
    Mnemonic::Jnc,    // JAE
    Mnemonic::Jnae,   // JB
    Mnemonic::Jnbe,   // JA
    Mnemonic::Jng,    // JLE
    Mnemonic::Jnge,   // JL
    Mnemonic::Jnl,    // JGE
    Mnemonic::Jnle,   // JG
    Mnemonic::Jnp,    // JPO
    Mnemonic::Jnz,    // JNE
    Mnemonic::Jp,     // JPE
    Mnemonic::Jz,     // JE
    Mnemonic::Iret,   // IRETW
    Mnemonic::Lods,   // LODSB/LODSW
    Mnemonic::Loopnz, // LOOPNE
    Mnemonic::Loopz,  // LOOPE
    Mnemonic::Movs,   // MOVSB/MOVSW
    Mnemonic::Outs,   // OUTSB/OUTSW
    Mnemonic::Popa,   // POPAW
    Mnemonic::Popf,   // POPFW
    Mnemonic::Pusha,  // PUSHAW
    Mnemonic::Pushf,  // PUSHFW
    Mnemonic::Ret,    // RETN
    Mnemonic::Sal,    // SHL
    Mnemonic::Scas,   // SCASB/SCASW
    Mnemonic::Stos,   // STOSB/STOSW
];

/// Is this row an alternative form that must not be in the decoder?
/// `opcode1` is the synthesized opcode for incrementing rows.
pub fn is_alternative(def: &InsDef, opcode1: u8) -> bool {
    if def.op == Mnemonic::Xchg {
        if opcode1 == 0x90 {
            return true; // XCHG AX, AX -> NOP
        }
        if def.oper1 == OperandFlag::Reg16 && def.oper2 == OperandFlag::Ax {
            return true; // XCHG r16, AX -> XCHG AX, r16
        }
        return false;
    }
    if def.op == Mnemonic::Int && def.oper1 == OperandFlag::Three {
        return true; // prefer the dedicated INT3 opcode
    }
    if def.op == Mnemonic::Lea && def.oper2 == OperandFlag::Indir {
        return true; // LEA r16, [addr] -> MOV r16, addr
    }
    ALTERNATIVE_MNEMONICS.contains(&def.op)
}

pub fn sreg_prefix(byte: u8) -> bool {
    matches!(byte, 0x26 | 0x2E | 0x36 | 0x3E)
}

pub fn repeat_prefix(byte: u8) -> bool {
    matches!(byte, 0xF2 | 0xF3)
}

/// Any instruction prefix: segment override, REP family, LOCK, or
/// operand/address size.
pub fn instruction_prefix(byte: u8) -> bool {
    sreg_prefix(byte) || repeat_prefix(byte) || matches!(byte, 0xF0 | 0x66 | 0x67)
}

/// Segment register name for the override prefix byte.
pub fn sreg_override_name(byte: u8) -> &'static str {
    match byte {
        0x26 => "ES",
        0x2E => "CS",
        0x36 => "SS",
        0x3E => "DS",
        _ => "",
    }
}

pub const REG8_NAMES: [&str; 8] = ["AL", "CL", "DL", "BL", "AH", "CH", "DH", "BH"];
pub const REG16_NAMES: [&str; 8] = ["AX", "CX", "DX", "BX", "SP", "BP", "SI", "DI"];
pub const SREG_NAMES: [&str; 4] = ["ES", "CS", "SS", "DS"];
