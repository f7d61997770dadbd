//! Resolving the fixups that can be completed at link time, once the
//! physical segments have their final sizes: external symbol values and
//! absolute jump offsets within groups. Run-time physical segment
//! addresses are left for the image builder.

use anyhow::{bail, ensure, Result};
use log::{debug, trace};

use crate::fixup::{ExternalKind, Fixup, FixupKind};
use crate::program::Program;

/// Check that every external symbol has been defined, then fill in
/// external values and convert group-absolute jumps to PC-relative
/// displacements.
pub fn resolve_fixups(prog: &mut Program) -> Result<()> {
    debug!("resolve fixups");

    let undefined = report_undefined_symbols(prog);
    if undefined > 0 {
        bail!("Link errors: {undefined}");
    }

    for i in 0..prog.fixups.count() {
        let fix = prog.fixups.get(i).clone();
        match fix.kind {
            FixupKind::External { sym, kind } => resolve_external(prog, &fix, sym, kind)?,
            FixupKind::GroupAbsJump { .. } => resolve_group_absolute_jump(prog, &fix)?,
            _ => {}
        }
    }
    Ok(())
}

/// Report each unresolved external on stderr; return the count.
fn report_undefined_symbols(prog: &Program) -> usize {
    let mut errors = 0;
    for sym in prog.symbols.undefined() {
        eprintln!("Unresolved external: {}", sym.name);
        errors += 1;
    }
    errors
}

/// Fill in the value of the symbol or, for a jump, its PC-relative
/// displacement from the end of the instruction.
fn resolve_external(
    prog: &mut Program,
    fix: &Fixup,
    sym_id: usize,
    kind: ExternalKind,
) -> Result<()> {
    let sym = prog.symbols.get(sym_id).clone();
    let seg = prog.segs.seg_mut(fix.holding_seg)?;

    if seg.hi < 2 || fix.holding_offset as u32 > seg.hi - 2 {
        bail!("external reference offset beyond segment: {}", sym.name);
    }

    let held = seg.read_word(fix.holding_offset)?;
    if held != 0 {
        bail!(
            "location of external reference does not hold 0: \
             seg {}, offset {:#06x}, value {held:#06x}",
            fix.holding_seg,
            fix.holding_offset
        );
    }

    // this fixup carries a 16-bit offset within one segment; an
    // inter-segment reference needs a segment or group address fixup
    ensure!(
        sym.seg == fix.holding_seg,
        "inter-segment external fixup: {}",
        sym.name
    );

    let value = match kind {
        ExternalKind::Jump => {
            // displacement is relative to the end of the instruction,
            // which ends with this 16-bit field
            let instr_end = fix.holding_offset as i32 + 2;
            let disp = sym.offset as i32 - instr_end;
            trace!(
                "displacement from {instr_end:#06x} to symbol {:#06x} = {disp}",
                sym.offset
            );
            disp as u16
        }
        ExternalKind::Data => sym.offset,
    };
    seg.write_word(fix.holding_offset, value)
}

/// An absolute jump target within a group's physical segment, e.g.
/// `JMP CS:1234h`, becomes a displacement relative to the end of the
/// jump instruction.
fn resolve_group_absolute_jump(prog: &mut Program, fix: &Fixup) -> Result<()> {
    let seg = prog.segs.seg_mut(fix.holding_seg)?;
    let target = seg.read_word(fix.holding_offset)?;
    let disp = target as i32 - (fix.holding_offset as i32 + 2);
    // conservative sanity ceiling, well inside the signed 16-bit range
    if disp <= -10000 || disp >= 10000 {
        bail!("displacement to group absolute offset is out of 16-bit range");
    }
    seg.write_word(fix.holding_offset, disp as u16)
}
