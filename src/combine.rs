//! Incorporating one module's segments, symbols and fixups into the
//! accumulating program.
//!
//! Private segments are appended with fresh program ids. Public
//! segments whose name is already present are combined: the module's
//! content lands at the end of the program segment, and every offset,
//! symbol and fixup of the module is rewritten into program
//! coordinates.

use anyhow::{bail, ensure, Result};
use log::debug;

use crate::fixup::FixupKind;
use crate::program::{Program, Start};
use crate::segment::SEGMENT_CAP;

/// Merge a module `Program` into the program being linked.
pub fn incorporate_module(prog: &mut Program, mut module: Program) -> Result<()> {
    debug!("incorporate module: {}", module.name);

    // groups join the program by name
    let mut group_map = Vec::with_capacity(module.groups.count());
    for (_, group) in module.groups.iter() {
        let id = match prog.groups.find(&group.name) {
            Some(id) => id,
            None => prog.groups.add(&group.name),
        };
        group_map.push(id);
    }

    // segments: fresh slots for new names, combination for known public
    // names; remember each module segment's base within its program
    // segment so that symbols and fixups can be rebased
    let module_segs = module.segs.count();
    let mut seg_map = Vec::with_capacity(module_segs);
    let mut seg_base = Vec::with_capacity(module_segs);
    for modno in 0..module_segs {
        let mut mseg = module
            .segs
            .take(modno)
            .expect("module segment list has no holes");
        mseg.group = mseg.group.map(|g| group_map[g]);

        let existing = prog.segs.find(&mseg.name);
        let (progno, base) = match existing {
            Some(progno) => {
                let pseg = prog.segs.seg_mut(progno)?;
                if !(pseg.public && mseg.public) {
                    bail!("duplicate segment name: {}", mseg.name);
                }
                match (pseg.group, mseg.group) {
                    (Some(a), Some(b)) if a != b => {
                        bail!("segment '{}' belongs to conflicting groups", mseg.name)
                    }
                    (None, Some(b)) => pseg.group = Some(b),
                    _ => {}
                }

                let base = if mseg.has_data() {
                    ensure!(
                        pseg.space == 0,
                        "cannot combine initialised data in '{}' with uninitialised space in '{}'",
                        mseg.name,
                        pseg.name
                    );
                    pseg.align_hi(mseg.p2align);
                    let base = pseg.hi;
                    pseg.write(base + mseg.lo, &mseg.data[mseg.lo as usize..])?;
                    base
                } else if mseg.space > 0 {
                    pseg.align_space(mseg.p2align);
                    let base = pseg.end();
                    ensure!(
                        base + mseg.space <= SEGMENT_CAP,
                        "combined segment '{}' is too big",
                        pseg.name
                    );
                    pseg.space += mseg.space;
                    base
                } else {
                    pseg.end()
                };

                pseg.p2align = pseg.p2align.max(mseg.p2align);
                pseg.stack |= mseg.stack;
                debug!(
                    "combine public segment '{}' at base {base:#x} in program segment {progno}",
                    mseg.name
                );
                (progno, base)
            }
            None => {
                let progno = prog.segs.add(mseg);
                (progno, 0)
            }
        };
        seg_map.push(progno);
        seg_base.push(base);
    }

    // symbols, in module id order so fixup ids can be remapped
    let mut sym_map = Vec::with_capacity(module.symbols.count());
    for (_, sym) in module.symbols.iter() {
        let progno = seg_map[sym.seg];
        let id = if sym.defined {
            let offset = sym.offset as u32 + seg_base[sym.seg];
            ensure!(
                offset < SEGMENT_CAP,
                "public symbol out of 16-bit range: {}",
                sym.name
            );
            prog.symbols.insert_public(&sym.name, progno, offset as u16)?
        } else {
            prog.symbols.insert_extern(&sym.name, progno)
        };
        sym_map.push(id);
    }

    // fixups move to program coordinates
    for fix in module.fixups.iter() {
        let holding_seg = seg_map[fix.holding_seg];
        let holding_offset = fix.holding_offset as u32 + seg_base[fix.holding_seg];
        ensure!(
            holding_offset + 2 <= SEGMENT_CAP,
            "fixup offset out of 16-bit range in segment '{}'",
            prog.segs.seg(holding_seg)?.name
        );
        let holding_offset = holding_offset as u16;

        let kind = match fix.kind {
            FixupKind::Offset { addressed_seg } => {
                // the stored value is an offset into the addressed
                // segment; shift it by that segment's merge base
                let base = seg_base[addressed_seg];
                if base != 0 {
                    let seg = prog.segs.seg_mut(holding_seg)?;
                    let value = seg.read_word(holding_offset)? as u32 + base;
                    ensure!(value < SEGMENT_CAP, "offset out of 16-bit range");
                    seg.write_word(holding_offset, value as u16)?;
                }
                FixupKind::Offset {
                    addressed_seg: seg_map[addressed_seg],
                }
            }
            FixupKind::External { sym, kind } => FixupKind::External {
                sym: sym_map[sym],
                kind,
            },
            FixupKind::GroupAbsJump { group } => FixupKind::GroupAbsJump {
                group: group_map[group],
            },
            FixupKind::Segment {
                addressed_seg,
                addressed_base,
                holding_seg_addr,
            } => {
                let base = addressed_base as u32 + seg_base[addressed_seg];
                ensure!(base < SEGMENT_CAP, "segment base out of 16-bit range");
                FixupKind::Segment {
                    addressed_seg: seg_map[addressed_seg],
                    addressed_base: base as u16,
                    holding_seg_addr,
                }
            }
            FixupKind::Group {
                group,
                holding_seg_addr,
            } => FixupKind::Group {
                group: group_map[group],
                holding_seg_addr,
            },
        };
        prog.fixups.push(crate::fixup::Fixup {
            holding_seg,
            holding_offset,
            kind,
        });
    }

    // the program has exactly one entry point
    if let Some(start) = module.start {
        ensure!(
            prog.start.is_none(),
            "start address defined in more than one module: {}",
            module.name
        );
        let offset = start.offset as u32 + seg_base[start.segno];
        ensure!(offset < SEGMENT_CAP, "start offset out of 16-bit range");
        prog.start = Some(Start {
            segno: seg_map[start.segno],
            offset: offset as u16,
        });
    }

    Ok(())
}
