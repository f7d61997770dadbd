//! Consolidating the segments of each group into one physical segment,
//! and determining the program stack segment.
//!
//! A single pass over program segments in id order. The first live
//! segment of a group becomes the group's main segment; every later
//! member is appended to it and its slot nulled. Everything referring
//! into a moved segment is rewritten: fixup holding coordinates, stored
//! offset values, symbol definitions, and the program start and stack.

use anyhow::{bail, ensure, Result};
use log::{debug, trace};

use crate::fixup::FixupKind;
use crate::program::{Program, StackPlace};
use crate::segment::{SegmentId, SEGMENT_CAP};

pub fn consolidate_groups_and_stack(prog: &mut Program) -> Result<()> {
    debug!("consolidate segments into groups and determine stack segment");

    for segno in 0..prog.segs.count() {
        // the slot may have been nulled by an earlier consolidation
        let Some(seg) = prog.segs.get(segno) else {
            continue;
        };
        let is_stack = seg.stack;
        let group = seg.group;
        if is_stack {
            set_stack(prog, segno, 0)?;
        }
        if group.is_some() {
            build_group(prog, segno)?;
        }
    }
    Ok(())
}

/// Make the given segment the program's stack segment.
fn set_stack(prog: &mut Program, segno: SegmentId, offset: u32) -> Result<()> {
    ensure!(prog.stack.is_none(), "multiple stack segments");
    let seg = prog.segs.seg(segno)?;
    let size = if seg.has_data() { seg.hi } else { seg.space };
    ensure!(size <= 0xFFFF, "stack segment too big");
    ensure!(offset <= 0xFFFF, "stack offset out of 16-bit range");
    debug!(
        "stack segment: {segno}: {}; offset {offset:#06x}, size {size:#06x}",
        seg.name
    );
    prog.stack = Some(StackPlace {
        segno,
        offset: offset as u16,
        size: size as u16,
    });
    Ok(())
}

/// Consolidate every later member of this segment's group into it.
fn build_group(prog: &mut Program, main_segno: SegmentId) -> Result<()> {
    let main = prog.segs.seg(main_segno)?;
    let groupno = main.group.expect("main segment has a group");
    debug!(
        "build group {groupno}: {}; main segment {main_segno}: {}",
        prog.groups.name(groupno),
        main.name
    );

    prog.groups.set_main_segno(groupno, main_segno);

    for segno in main_segno + 1..prog.segs.count() {
        let Some(seg) = prog.segs.get(segno) else {
            continue;
        };
        if seg.group != Some(groupno) {
            continue;
        }
        debug!("consolidate into group: segment {segno}: {}", seg.name);
        if seg.has_data() || seg.space > 0 {
            join_segments(prog, main_segno, segno)?;
        }
        prog.segs.remove(segno);
    }
    Ok(())
}

/// Append `source` to `dest`, rewriting offsets into the source to be
/// offsets into the destination, across the whole program.
fn join_segments(prog: &mut Program, destno: SegmentId, sourceno: SegmentId) -> Result<()> {
    let (dest, source) = prog.segs.pair_mut(destno, sourceno)?;

    if source.has_data() {
        ensure!(
            dest.space == 0,
            "cannot group initialised data in '{}' on top of uninitialised space in '{}'",
            source.name,
            dest.name
        );
        ensure!(
            source.space == 0,
            "segment '{}' has both data and space",
            source.name
        );
        dest.align_hi(source.p2align);
    } else {
        dest.align_space(source.p2align);
    }

    if source.p2align > dest.p2align {
        dest.p2align = source.p2align;
    }

    // base of the source within the destination
    let base = dest.end();

    if let Some(start) = prog.start {
        if start.segno == sourceno {
            let offset = start.offset as u32 + base;
            ensure!(offset < SEGMENT_CAP, "start offset out of 16-bit range");
            prog.start = Some(crate::program::Start {
                segno: destno,
                offset: offset as u16,
            });
            debug!("redefine start address: segment {destno}, offset {offset:#06x}");
        }
    }

    match prog.stack {
        Some(stack) if stack.segno == sourceno => {
            let offset = stack.offset as u32 + base;
            ensure!(offset <= 0xFFFF, "stack offset out of 16-bit range");
            prog.stack = Some(StackPlace {
                segno: destno,
                offset: offset as u16,
                ..stack
            });
        }
        _ => {
            // a stack segment consolidated before its own turn in the
            // outer pass is discovered here, at its base in the main
            if prog.segs.seg(sourceno)?.stack {
                set_stack(prog, sourceno, base)?;
                if let Some(stack) = &mut prog.stack {
                    stack.segno = destno;
                }
            }
        }
    }

    update_fixups(prog, sourceno, destno, base)?;
    update_symbols(prog, sourceno, destno, base)?;

    // move the source's bytes and space onto the end of the main segment
    let (dest, source) = prog.segs.pair_mut(destno, sourceno)?;
    if source.has_data() {
        let lo = source.lo as usize;
        let hi = source.hi as usize;
        let bytes = std::mem::take(&mut source.data);
        dest.write(base + source.lo, &bytes[lo..hi])?;
    }
    dest.space += source.space;

    let size = dest.end();
    ensure!(
        size <= SEGMENT_CAP,
        "consolidated segment '{}' is too big: {size:#x} bytes",
        dest.name
    );
    Ok(())
}

/// Rewrite every program fixup for the move of `source` into `dest` at
/// `base`: stored offsets into the source gain the base, and fixups
/// held in the source move to destination coordinates.
fn update_fixups(
    prog: &mut Program,
    sourceno: SegmentId,
    destno: SegmentId,
    base: u32,
) -> Result<()> {
    trace!("update fixups to consolidate seg {sourceno} into seg {destno} at base {base:#06x}");

    for i in 0..prog.fixups.count() {
        let fix = prog.fixups.get(i).clone();
        let value = prog
            .segs
            .seg(fix.holding_seg)?
            .read_word(fix.holding_offset)?;

        match fix.kind {
            FixupKind::Offset { addressed_seg } => {
                if addressed_seg == sourceno {
                    // the stored offset was relative to the source;
                    // make it relative to the main segment
                    let new_value = value as u32 + base;
                    ensure!(new_value < SEGMENT_CAP, "offset out of 16-bit range");
                    prog.segs
                        .seg_mut(fix.holding_seg)?
                        .write_word(fix.holding_offset, new_value as u16)?;
                    match &mut prog.fixups.get_mut(i).kind {
                        FixupKind::Offset { addressed_seg } => *addressed_seg = destno,
                        _ => unreachable!(),
                    }
                }
            }
            FixupKind::External { .. } => {
                // externals are filled in by the resolver; until then
                // the location must hold zero
                if value != 0 {
                    bail!(
                        "location of external reference does not hold 0: \
                         seg {}, offset {:#06x}, value {value:#06x}",
                        fix.holding_seg,
                        fix.holding_offset
                    );
                }
            }
            FixupKind::GroupAbsJump { .. } => {
                // the absolute target stays until the resolve stage
            }
            FixupKind::Segment { addressed_seg, .. } => {
                if value != 0 {
                    bail!(
                        "location of segment reference does not hold 0: \
                         seg {}, offset {:#06x}, value {value:#06x}",
                        fix.holding_seg,
                        fix.holding_offset
                    );
                }
                if addressed_seg == sourceno {
                    match &mut prog.fixups.get_mut(i).kind {
                        FixupKind::Segment {
                            addressed_seg,
                            addressed_base,
                            ..
                        } => {
                            *addressed_seg = destno;
                            let new_base = *addressed_base as u32 + base;
                            ensure!(
                                new_base < SEGMENT_CAP,
                                "segment base out of 16-bit range"
                            );
                            *addressed_base = new_base as u16;
                        }
                        _ => unreachable!(),
                    }
                }
            }
            FixupKind::Group { .. } => {
                if value != 0 {
                    bail!(
                        "location of group reference does not hold 0: \
                         seg {}, offset {:#06x}, value {value:#06x}",
                        fix.holding_seg,
                        fix.holding_offset
                    );
                }
            }
        }

        // a fixup held in the source segment moves with its bytes
        if fix.holding_seg == sourceno {
            let new_offset = fix.holding_offset as u32 + base;
            ensure!(new_offset < SEGMENT_CAP, "offset out of 16-bit range");
            let fix = prog.fixups.get_mut(i);
            fix.holding_seg = destno;
            fix.holding_offset = new_offset as u16;
        }
    }
    Ok(())
}

/// Labels defined in the source become labels in the main segment.
/// Undefined externals carry only the segment change.
fn update_symbols(
    prog: &mut Program,
    sourceno: SegmentId,
    destno: SegmentId,
    base: u32,
) -> Result<()> {
    for i in 0..prog.symbols.count() {
        let sym = prog.symbols.get_mut(i);
        if sym.seg != sourceno {
            continue;
        }
        sym.seg = destno;
        if sym.defined {
            let offset = sym.offset as u32 + base;
            ensure!(
                offset < SEGMENT_CAP,
                "offset out of 16-bit range: {}",
                sym.name
            );
            sym.offset = offset as u16;
        }
    }
    Ok(())
}
