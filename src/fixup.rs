//! Fixups: recorded intents to adjust two bytes in a segment once
//! layout or resolution information becomes known.

use crate::group::GroupId;
use crate::segment::SegmentId;
use crate::symbol::SymbolId;

/// Whether an external use is a data offset or a PC-relative jump.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExternalKind {
    Data,
    Jump,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FixupKind {
    /// The stored 16-bit value is an offset into `addressed_seg`; it is
    /// adjusted by the new base when that segment is merged into
    /// another.
    Offset { addressed_seg: SegmentId },
    /// Fill with a symbol's final offset (data) or its PC-relative
    /// displacement from end of instruction (jump).
    External { sym: SymbolId, kind: ExternalKind },
    /// The stored value is an absolute offset in the group; replaced
    /// with a PC-relative displacement after consolidation.
    GroupAbsJump { group: GroupId },
    /// Paragraph address of a segment, filled at image build and listed
    /// in the EXE relocation table.
    Segment {
        addressed_seg: SegmentId,
        addressed_base: u16,
        holding_seg_addr: u16,
    },
    /// Like `Segment`, but the paragraph is that of the group's main
    /// segment.
    Group {
        group: GroupId,
        holding_seg_addr: u16,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fixup {
    pub holding_seg: SegmentId,
    pub holding_offset: u16,
    pub kind: FixupKind,
}

impl Fixup {
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            FixupKind::Offset { .. } => "offset",
            FixupKind::External { .. } => "external",
            FixupKind::GroupAbsJump { .. } => "group absolute jump",
            FixupKind::Segment { .. } => "segment address",
            FixupKind::Group { .. } => "group address",
        }
    }

    /// Resolved at load time, so listed in the EXE relocation table.
    pub fn is_load_time(&self) -> bool {
        matches!(
            self.kind,
            FixupKind::Segment { .. } | FixupKind::Group { .. }
        )
    }
}

/// Append-only fixup log. Holding coordinates and payloads are mutated
/// in place by the consolidator, resolver and image builder.
#[derive(Clone, Debug, Default)]
pub struct Fixups {
    fixups: Vec<Fixup>,
}

impl Fixups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.fixups.len()
    }

    pub fn get(&self, index: usize) -> &Fixup {
        &self.fixups[index]
    }

    pub fn get_mut(&mut self, index: usize) -> &mut Fixup {
        &mut self.fixups[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fixup> {
        self.fixups.iter()
    }

    pub fn push(&mut self, fixup: Fixup) -> usize {
        self.fixups.push(fixup);
        self.fixups.len() - 1
    }

    fn add(&mut self, holding_seg: SegmentId, holding_offset: u16, kind: FixupKind) -> usize {
        self.fixups.push(Fixup {
            holding_seg,
            holding_offset,
            kind,
        });
        self.fixups.len() - 1
    }

    pub fn add_offset(
        &mut self,
        holding_seg: SegmentId,
        holding_offset: u16,
        addressed_seg: SegmentId,
    ) -> usize {
        self.add(holding_seg, holding_offset, FixupKind::Offset { addressed_seg })
    }

    pub fn add_external(
        &mut self,
        holding_seg: SegmentId,
        holding_offset: u16,
        sym: SymbolId,
        kind: ExternalKind,
    ) -> usize {
        self.add(holding_seg, holding_offset, FixupKind::External { sym, kind })
    }

    pub fn add_group_abs_jump(
        &mut self,
        holding_seg: SegmentId,
        holding_offset: u16,
        group: GroupId,
    ) -> usize {
        self.add(holding_seg, holding_offset, FixupKind::GroupAbsJump { group })
    }

    pub fn add_segment(
        &mut self,
        holding_seg: SegmentId,
        holding_offset: u16,
        addressed_seg: SegmentId,
    ) -> usize {
        self.add(
            holding_seg,
            holding_offset,
            FixupKind::Segment {
                addressed_seg,
                addressed_base: 0,
                holding_seg_addr: 0,
            },
        )
    }

    pub fn add_group(
        &mut self,
        holding_seg: SegmentId,
        holding_offset: u16,
        group: GroupId,
    ) -> usize {
        self.add(
            holding_seg,
            holding_offset,
            FixupKind::Group {
                group,
                holding_seg_addr: 0,
            },
        )
    }

    /// Count of fixups resolved at load time (`Segment` and `Group`).
    pub fn load_time_count(&self) -> usize {
        self.fixups.iter().filter(|f| f.is_load_time()).count()
    }
}
