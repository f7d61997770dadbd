//! Processing one object module into a segmented `Program`.
//!
//! Object module structure, as containers of records:
//!
//! ```text
//! BEGIN_GROUP             ; begin group definition
//!     ORDINAL byte        ; group number
//!     NAME string         ; group name
//! END_GROUP
//!
//! BEGIN_SEGMENT           ; begin segment definition
//!     ORDINAL byte        ; segment number
//!     NAME string         ; segment name
//!     GROUPNO byte        ; (optional) segment's group number
//!     PUBLIC              ; (optional) the segment is public
//!     STACK               ; (optional) the segment is a stack segment
//!     P2ALIGN byte        ; (optional) alignment of segment in image
//! END_SEGMENT
//!
//! OPEN_SEGMENT byte       ; open segment n to add code and data
//!     CODE | DS | DB | DW | DD | DQ | DT | SPACE | ORG | P2ALIGN
//!     BEGIN_OFFSET         POS SEGNO            END_OFFSET
//!     BEGIN_EXTRN_USE      POS ID [JUMP]        END_EXTRN_USE
//!     BEGIN_GROUP_ABS_JUMP POS GROUPNO          END_GROUP_ABS_JUMP
//!     BEGIN_SEG_ADDR       POS SEGNO            END_SEG_ADDR
//!     BEGIN_GROUP_ADDR     POS GROUPNO          END_GROUP_ADDR
//! CLOSE_SEGMENT byte
//!
//! CASED                   ; (optional) case-sensitive symbols
//! BEGIN_EXTRN_DEF  ID NAME SEGNO    END_EXTRN_DEF
//! BEGIN_PUBLIC     NAME SEGNO OFFSET END_PUBLIC
//! BEGIN_START      SEGNO OFFSET      END_START
//! ```

use anyhow::{anyhow, bail, ensure, Result};
use log::trace;

use crate::fixup::ExternalKind;
use crate::p2aligned;
use crate::program::{Program, Start};
use crate::record::{ObjectFile, Record, RecordType};
use crate::segment::{Segment, SegmentId, MAX_NAME};

/// Process an object file's records into a `Program` for the module.
pub fn build_module(
    ofile: &ObjectFile,
    case_sensitive: bool,
    module_name: &str,
) -> Result<Program> {
    let mut loader = Loader {
        ofile,
        pos: 0,
        module_name,
        program: Program::new(module_name, case_sensitive),
        open_segno: None,
        cased: false,
    };

    while loader.pos < ofile.len() {
        loader.root_record()?;
        loader.pos += 1;
    }

    ensure!(
        loader.cased == case_sensitive,
        "case sensitivity mismatch between linker options and module: {module_name}"
    );

    Ok(loader.program)
}

struct Loader<'a> {
    ofile: &'a ObjectFile,
    pos: usize,
    module_name: &'a str,
    program: Program,
    open_segno: Option<SegmentId>,
    cased: bool,
}

impl Loader<'_> {
    fn rec(&self) -> &Record {
        self.ofile.record(self.pos)
    }

    /// Advance to the next record of the current container; error if
    /// the file ends first. Returns an owned record so the caller can
    /// go on to mutate the program being built.
    fn advance(&mut self, container: &str) -> Result<Record> {
        self.pos += 1;
        if self.pos >= self.ofile.len() {
            bail!("{}: {container} open at end of file", self.module_name);
        }
        trace!("{}: {}", self.module_name, self.rec().dump_line());
        Ok(self.rec().clone())
    }

    fn name_field(&self, rec: &Record, what: &str) -> Result<String> {
        let data = rec.data()?;
        ensure!(data.len() <= MAX_NAME, "{what} name too long");
        let name = String::from_utf8(data.to_vec())
            .map_err(|_| anyhow!("{what} name is not valid text"))?;
        Ok(name)
    }

    fn root_record(&mut self) -> Result<()> {
        trace!("{}: {}", self.module_name, self.rec().dump_line());
        match self.rec().rtype {
            RecordType::BeginGroup => self.define_group(),
            RecordType::BeginSegment => self.define_segment(),
            RecordType::OpenSegment => self.segment_fragment(),
            RecordType::BeginExternDef => self.define_external(),
            RecordType::BeginPublic => self.define_public(),
            RecordType::BeginStart => self.define_start(),
            RecordType::Cased => {
                self.cased = true;
                Ok(())
            }
            other => bail!(
                "{}: unexpected root object record type: {}",
                self.module_name,
                other.name()
            ),
        }
    }

    fn define_group(&mut self) -> Result<()> {
        let mut ordinal = None;
        let mut name = None;
        loop {
            let rec = self.advance("group definition")?;
            match rec.rtype {
                RecordType::EndGroup => {
                    let ordinal = ordinal
                        .ok_or_else(|| anyhow!("group definition lacks ordinal"))?
                        as usize;
                    let count = self.program.groups.count();
                    ensure!(ordinal >= count, "group redefined");
                    ensure!(ordinal == count, "unexpected ordinal in group definition");
                    let name: String =
                        name.ok_or_else(|| anyhow!("group definition lacks name"))?;
                    ensure!(!name.is_empty(), "group definition lacks name");
                    ensure!(
                        self.program.groups.find(&name).is_none(),
                        "duplicate group name: {name}"
                    );
                    self.program.groups.add(&name);
                    return Ok(());
                }
                RecordType::Ordinal => ordinal = Some(rec.byte()?),
                RecordType::Name => name = Some(self.name_field(&rec, "group")?),
                other => bail!(
                    "invalid object record type in group definition: {}",
                    other.name()
                ),
            }
        }
    }

    fn define_segment(&mut self) -> Result<()> {
        let mut ordinal = None;
        let mut name: Option<String> = None;
        let mut groupno = None;
        let mut public = false;
        let mut stack = false;
        let mut p2align = 4u8;
        loop {
            let rec = self.advance("segment definition")?;
            match rec.rtype {
                RecordType::EndSegment => {
                    let ordinal = ordinal
                        .ok_or_else(|| anyhow!("segment definition lacks ordinal"))?
                        as usize;
                    let count = self.program.segs.count();
                    let name = name.ok_or_else(|| anyhow!("segment definition lacks name"))?;
                    if ordinal < count {
                        bail!(
                            "segment {ordinal}: {} redefined as {name}",
                            self.program.segs.seg(ordinal)?.name
                        );
                    }
                    ensure!(ordinal == count, "unexpected ordinal in segment definition");
                    ensure!(!name.is_empty(), "segment definition lacks name");
                    ensure!(
                        self.program.segs.find(&name).is_none(),
                        "duplicate segment name: {name}"
                    );
                    if let Some(g) = groupno {
                        ensure!(
                            (g as usize) < self.program.groups.count(),
                            "segment: {name}: group number out of range: {g}"
                        );
                    }
                    ensure!(p2align <= 4, "segment: {name}: alignment out of range");
                    let mut seg =
                        Segment::new(&name, public, stack, groupno.map(|g| g as usize));
                    seg.p2align = p2align;
                    self.program.segs.add(seg);
                    return Ok(());
                }
                RecordType::Ordinal => ordinal = Some(rec.byte()?),
                RecordType::Name => name = Some(self.name_field(&rec, "segment")?),
                RecordType::GroupNo => groupno = Some(rec.byte()?),
                RecordType::Public => public = true,
                RecordType::Stack => stack = true,
                RecordType::P2Align => p2align = rec.byte()?,
                other => bail!(
                    "invalid object record type in segment definition: {}",
                    other.name()
                ),
            }
        }
    }

    fn segment_fragment(&mut self) -> Result<()> {
        let segno = self.rec().byte()? as usize;
        ensure!(
            segno < self.program.segs.count(),
            "invalid ordinal segment number: {segno}"
        );
        self.open_segno = Some(segno);
        loop {
            let rec = self.advance("segment fragment")?;
            let seg = self.program.segs.seg_mut(segno)?;
            match rec.rtype {
                RecordType::CloseSegment => {
                    ensure!(
                        rec.byte()? as usize == segno,
                        "open/close segment number mismatch"
                    );
                    ensure!(
                        !(seg.has_data() && seg.space > 0),
                        "segment has both initialised and uninitialised data: {segno} {}",
                        seg.name
                    );
                    self.open_segno = None;
                    return Ok(());
                }
                RecordType::Code | RecordType::Ds => seg.load_data(rec.data()?)?,
                RecordType::Db => seg.load_num(rec.byte()? as u64, 1)?,
                RecordType::Dw => seg.load_num(rec.word()? as u64, 2)?,
                RecordType::Dd => seg.load_num(rec.dword()? as u64, 4)?,
                RecordType::Dq => seg.load_num(rec.qword()?, 8)?,
                RecordType::Dt => seg.load_num(rec.qword()?, 10)?,
                RecordType::Space => seg.load_space(rec.word()?)?,
                RecordType::Org => seg.pc = rec.word()? as u32,
                RecordType::P2Align => {
                    let align = rec.byte()?;
                    ensure!(
                        align <= seg.p2align,
                        "cannot align data to 2^{align} in segment '{}' of alignment 2^{}",
                        seg.name,
                        seg.p2align
                    );
                    seg.pc = p2aligned(seg.pc, align);
                }
                RecordType::BeginOffset => self.offset_fixup()?,
                RecordType::BeginExternUse => self.extern_use()?,
                RecordType::BeginGroupAbsJump => self.group_abs_jump()?,
                RecordType::BeginSegAddr => self.segment_addr_use()?,
                RecordType::BeginGroupAddr => self.group_addr_use()?,
                other => bail!(
                    "invalid object record type in segment fragment: {}",
                    other.name()
                ),
            }
        }
    }

    fn holding_segno(&self) -> SegmentId {
        // only called from within a fragment
        self.open_segno.expect("no open segment")
    }

    fn offset_fixup(&mut self) -> Result<()> {
        let mut pos = None;
        let mut segno = None;
        loop {
            let rec = self.advance("offset information")?;
            match rec.rtype {
                RecordType::EndOffset => {
                    let pos =
                        pos.ok_or_else(|| anyhow!("offset information does not specify position"))?;
                    let segno = segno.ok_or_else(|| {
                        anyhow!("offset information does not specify segment number")
                    })?;
                    self.program
                        .fixups
                        .add_offset(self.holding_segno(), pos, segno);
                    return Ok(());
                }
                RecordType::Pos => pos = Some(rec.word()?),
                RecordType::SegNo => {
                    let n = rec.byte()? as usize;
                    ensure!(
                        n < self.program.segs.count(),
                        "undefined segment number: {n}"
                    );
                    segno = Some(n);
                }
                other => bail!(
                    "invalid object record type in offset information: {}",
                    other.name()
                ),
            }
        }
    }

    fn extern_use(&mut self) -> Result<()> {
        let mut pos = None;
        let mut id = None;
        let mut jump = false;
        loop {
            let rec = self.advance("extern use")?;
            match rec.rtype {
                RecordType::EndExternUse => {
                    let pos =
                        pos.ok_or_else(|| anyhow!("external use does not specify position"))?;
                    let id =
                        id.ok_or_else(|| anyhow!("external use does not specify symbol ID"))?
                            as usize;
                    ensure!(id < self.program.symbols.count(), "external use ID out of range");
                    let kind = if jump {
                        ExternalKind::Jump
                    } else {
                        ExternalKind::Data
                    };
                    self.program
                        .fixups
                        .add_external(self.holding_segno(), pos, id, kind);
                    return Ok(());
                }
                RecordType::Pos => pos = Some(rec.word()?),
                RecordType::Id => id = Some(rec.word()?),
                RecordType::Jump => jump = true,
                other => bail!(
                    "invalid object record type in extern use: {}",
                    other.name()
                ),
            }
        }
    }

    fn group_abs_jump(&mut self) -> Result<()> {
        let mut pos = None;
        let mut groupno = None;
        loop {
            let rec = self.advance("group absolute jump")?;
            match rec.rtype {
                RecordType::EndGroupAbsJump => {
                    let pos = pos
                        .ok_or_else(|| anyhow!("group absolute jump does not specify position"))?;
                    let groupno = groupno.ok_or_else(|| {
                        anyhow!("group absolute jump does not specify group number")
                    })? as usize;
                    ensure!(
                        groupno < self.program.groups.count(),
                        "group number out of range"
                    );
                    self.program
                        .fixups
                        .add_group_abs_jump(self.holding_segno(), pos, groupno);
                    return Ok(());
                }
                RecordType::Pos => pos = Some(rec.word()?),
                RecordType::GroupNo => groupno = Some(rec.byte()?),
                other => bail!(
                    "invalid object record type in group absolute jump: {}",
                    other.name()
                ),
            }
        }
    }

    fn segment_addr_use(&mut self) -> Result<()> {
        let mut pos = None;
        let mut segno = None;
        loop {
            let rec = self.advance("segment address use")?;
            match rec.rtype {
                RecordType::EndSegAddr => {
                    let pos = pos
                        .ok_or_else(|| anyhow!("segment address use does not specify position"))?;
                    let segno = segno.ok_or_else(|| {
                        anyhow!("segment address use does not specify segment number")
                    })?;
                    self.program
                        .fixups
                        .add_segment(self.holding_segno(), pos, segno);
                    return Ok(());
                }
                RecordType::Pos => pos = Some(rec.word()?),
                RecordType::SegNo => {
                    let n = rec.byte()? as usize;
                    ensure!(
                        n < self.program.segs.count(),
                        "undefined segment number: {n}"
                    );
                    segno = Some(n);
                }
                other => bail!(
                    "invalid object record type in segment address use: {}",
                    other.name()
                ),
            }
        }
    }

    fn group_addr_use(&mut self) -> Result<()> {
        let mut pos = None;
        let mut groupno = None;
        loop {
            let rec = self.advance("group address use")?;
            match rec.rtype {
                RecordType::EndGroupAddr => {
                    let pos = pos
                        .ok_or_else(|| anyhow!("group address use does not specify position"))?;
                    let groupno = groupno.ok_or_else(|| {
                        anyhow!("group address use does not specify group number")
                    })?;
                    self.program
                        .fixups
                        .add_group(self.holding_segno(), pos, groupno);
                    return Ok(());
                }
                RecordType::Pos => pos = Some(rec.word()?),
                RecordType::GroupNo => {
                    let n = rec.byte()? as usize;
                    ensure!(
                        n < self.program.groups.count(),
                        "undefined group number: {n}"
                    );
                    groupno = Some(n);
                }
                other => bail!(
                    "invalid object record type in group address use: {}",
                    other.name()
                ),
            }
        }
    }

    fn define_external(&mut self) -> Result<()> {
        let mut id = None;
        let mut name: Option<String> = None;
        let mut segno = None;
        loop {
            let rec = self.advance("external symbol definition")?;
            match rec.rtype {
                RecordType::EndExternDef => {
                    let id = id.ok_or_else(|| {
                        anyhow!("{}: external symbol definition lacks ID", self.module_name)
                    })? as usize;
                    let name = name.ok_or_else(|| {
                        anyhow!("{}: external symbol definition lacks name", self.module_name)
                    })?;
                    ensure!(
                        !name.is_empty(),
                        "{}: external symbol definition lacks name",
                        self.module_name
                    );
                    ensure!(
                        self.program.symbols.lookup(&name).is_none(),
                        "{}: duplicate external symbol: {name}",
                        self.module_name
                    );
                    ensure!(
                        self.program.symbols.next_id() == id,
                        "{}: external symbol out of sequence: {name}",
                        self.module_name
                    );
                    let segno = segno.ok_or_else(|| {
                        anyhow!(
                            "{}: external symbol definition lacks segment",
                            self.module_name
                        )
                    })?;
                    self.program.symbols.insert_extern(&name, segno);
                    return Ok(());
                }
                RecordType::Id => id = Some(rec.word()?),
                RecordType::Name => name = Some(self.name_field(&rec, "external")?),
                RecordType::SegNo => {
                    let n = rec.byte()? as usize;
                    ensure!(
                        n < self.program.segs.count(),
                        "undefined segment number: {n}"
                    );
                    segno = Some(n);
                }
                other => bail!(
                    "{}: invalid object record type in external symbol definition: {}",
                    self.module_name,
                    other.name()
                ),
            }
        }
    }

    fn define_public(&mut self) -> Result<()> {
        let mut name: Option<String> = None;
        let mut segno = None;
        let mut offset = None;
        loop {
            let rec = self.advance("public symbol definition")?;
            match rec.rtype {
                RecordType::EndPublic => {
                    let name = name.ok_or_else(|| {
                        anyhow!("{}: public symbol definition lacks name", self.module_name)
                    })?;
                    ensure!(
                        !name.is_empty(),
                        "{}: public symbol definition lacks name",
                        self.module_name
                    );
                    let segno = segno.ok_or_else(|| {
                        anyhow!("{}: public symbol definition lacks segment", self.module_name)
                    })?;
                    let offset = offset.ok_or_else(|| {
                        anyhow!("{}: public symbol definition lacks offset", self.module_name)
                    })?;
                    ensure!(
                        self.program.symbols.lookup(&name).is_none(),
                        "{}: duplicate public symbol: {name}",
                        self.module_name
                    );
                    self.program.symbols.insert_public(&name, segno, offset)?;
                    return Ok(());
                }
                RecordType::Name => name = Some(self.name_field(&rec, "public")?),
                RecordType::SegNo => {
                    let n = rec.byte()? as usize;
                    ensure!(
                        n < self.program.segs.count(),
                        "undefined segment number: {n}"
                    );
                    segno = Some(n);
                }
                RecordType::Offset => offset = Some(rec.word()?),
                other => bail!(
                    "{}: invalid object record type in public symbol definition: {}",
                    self.module_name,
                    other.name()
                ),
            }
        }
    }

    fn define_start(&mut self) -> Result<()> {
        let mut segno = None;
        let mut offset = None;
        loop {
            let rec = self.advance("start definition")?;
            match rec.rtype {
                RecordType::EndStart => {
                    let segno = segno.ok_or_else(|| {
                        anyhow!("{}: start definition lacks segment", self.module_name)
                    })?;
                    let offset = offset.ok_or_else(|| {
                        anyhow!("{}: start definition lacks offset", self.module_name)
                    })?;
                    ensure!(
                        self.program.start.is_none(),
                        "{}: start address redefined",
                        self.module_name
                    );
                    self.program.start = Some(Start { segno, offset });
                    return Ok(());
                }
                RecordType::SegNo => {
                    let n = rec.byte()? as usize;
                    ensure!(
                        n < self.program.segs.count(),
                        "undefined segment number: {n}"
                    );
                    segno = Some(n);
                }
                RecordType::Offset => offset = Some(rec.word()?),
                other => bail!(
                    "{}: invalid object record type in start definition: {}",
                    self.module_name,
                    other.name()
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fixup::FixupKind;
    use crate::record::RecordType as T;

    fn segment_def(
        o: &mut ObjectFile,
        ordinal: u8,
        name: &str,
        public: bool,
        stack: bool,
        group: Option<u8>,
        p2align: Option<u8>,
    ) {
        o.signal(T::BeginSegment).unwrap();
        o.byte(T::Ordinal, ordinal).unwrap();
        o.data(T::Name, name.as_bytes()).unwrap();
        if let Some(g) = group {
            o.byte(T::GroupNo, g).unwrap();
        }
        if public {
            o.signal(T::Public).unwrap();
        }
        if stack {
            o.signal(T::Stack).unwrap();
        }
        if let Some(a) = p2align {
            o.byte(T::P2Align, a).unwrap();
        }
        o.signal(T::EndSegment).unwrap();
    }

    fn simple_module() -> ObjectFile {
        let mut o = ObjectFile::new();
        o.signal(T::BeginGroup).unwrap();
        o.byte(T::Ordinal, 0).unwrap();
        o.data(T::Name, b"DGROUP").unwrap();
        o.signal(T::EndGroup).unwrap();
        segment_def(&mut o, 0, "CODE", true, false, None, Some(4));
        segment_def(&mut o, 1, "DATA", true, false, Some(0), Some(4));
        o.byte(T::OpenSegment, 0).unwrap();
        o.data(T::Code, &[0xB8, 0x00, 0x00]).unwrap();
        o.signal(T::BeginOffset).unwrap();
        o.word(T::Pos, 1).unwrap();
        o.byte(T::SegNo, 1).unwrap();
        o.signal(T::EndOffset).unwrap();
        o.byte(T::CloseSegment, 0).unwrap();
        o.byte(T::OpenSegment, 1).unwrap();
        o.word(T::Dw, 0x1234).unwrap();
        o.byte(T::CloseSegment, 1).unwrap();
        o.signal(T::BeginPublic).unwrap();
        o.data(T::Name, b"value").unwrap();
        o.byte(T::SegNo, 1).unwrap();
        o.word(T::Offset, 0).unwrap();
        o.signal(T::EndPublic).unwrap();
        o.signal(T::BeginStart).unwrap();
        o.byte(T::SegNo, 0).unwrap();
        o.word(T::Offset, 0).unwrap();
        o.signal(T::EndStart).unwrap();
        o
    }

    #[test]
    fn builds_segments_symbols_and_fixups() {
        let module = build_module(&simple_module(), false, "a.obj").unwrap();
        assert_eq!(module.segs.count(), 2);
        assert_eq!(module.groups.count(), 1);
        let code = module.segs.seg(0).unwrap();
        assert!(code.public);
        assert_eq!(code.hi, 3);
        let data = module.segs.seg(1).unwrap();
        assert_eq!(data.group, Some(0));
        assert_eq!(data.data, [0x34, 0x12]);
        assert_eq!(module.symbols.count(), 1);
        assert_eq!(module.fixups.count(), 1);
        let fix = module.fixups.get(0);
        assert_eq!(fix.holding_seg, 0);
        assert_eq!(fix.holding_offset, 1);
        assert_eq!(fix.kind, FixupKind::Offset { addressed_seg: 1 });
        assert_eq!(module.start, Some(Start { segno: 0, offset: 0 }));
    }

    #[test]
    fn ordinal_out_of_sequence_is_rejected() {
        let mut o = ObjectFile::new();
        segment_def(&mut o, 1, "CODE", false, false, None, None);
        let err = build_module(&o, false, "a.obj").unwrap_err();
        assert!(err.to_string().contains("unexpected ordinal"));
    }

    #[test]
    fn redefined_ordinal_is_rejected() {
        let mut o = ObjectFile::new();
        segment_def(&mut o, 0, "CODE", false, false, None, None);
        segment_def(&mut o, 0, "DATA", false, false, None, None);
        let err = build_module(&o, false, "a.obj").unwrap_err();
        assert!(err.to_string().contains("redefined"));
    }

    #[test]
    fn extern_ids_must_be_sequential() {
        let mut o = ObjectFile::new();
        segment_def(&mut o, 0, "CODE", false, false, None, None);
        o.signal(T::BeginExternDef).unwrap();
        o.word(T::Id, 1).unwrap();
        o.data(T::Name, b"FOO").unwrap();
        o.byte(T::SegNo, 0).unwrap();
        o.signal(T::EndExternDef).unwrap();
        let err = build_module(&o, false, "a.obj").unwrap_err();
        assert!(err.to_string().contains("out of sequence"));
    }

    #[test]
    fn case_mismatch_is_rejected() {
        let mut o = ObjectFile::new();
        o.signal(T::Cased).unwrap();
        let err = build_module(&o, false, "a.obj").unwrap_err();
        assert!(err.to_string().contains("case sensitivity mismatch"));
        assert!(build_module(&o, true, "a.obj").is_ok());
    }

    #[test]
    fn data_and_space_in_one_fragment_is_rejected() {
        let mut o = ObjectFile::new();
        segment_def(&mut o, 0, "MIXED", false, false, None, None);
        o.byte(T::OpenSegment, 0).unwrap();
        o.byte(T::Db, 1).unwrap();
        o.word(T::Space, 16).unwrap();
        o.byte(T::CloseSegment, 0).unwrap();
        let err = build_module(&o, false, "a.obj").unwrap_err();
        assert!(err
            .to_string()
            .contains("both initialised and uninitialised"));
    }

    #[test]
    fn unterminated_container_is_rejected() {
        let mut o = ObjectFile::new();
        o.signal(T::BeginGroup).unwrap();
        o.byte(T::Ordinal, 0).unwrap();
        let err = build_module(&o, false, "a.obj").unwrap_err();
        assert!(err.to_string().contains("open at end of file"));
    }

    #[test]
    fn fragment_alignment_cannot_exceed_segment_alignment() {
        let mut o = ObjectFile::new();
        segment_def(&mut o, 0, "CODE", false, false, None, Some(1));
        o.byte(T::OpenSegment, 0).unwrap();
        o.byte(T::P2Align, 2).unwrap();
        o.byte(T::CloseSegment, 0).unwrap();
        let err = build_module(&o, false, "a.obj").unwrap_err();
        assert!(err.to_string().contains("cannot align data"));
    }

    #[test]
    fn org_moves_location_counter() {
        let mut o = ObjectFile::new();
        segment_def(&mut o, 0, "CODE", true, false, None, Some(4));
        o.byte(T::OpenSegment, 0).unwrap();
        o.word(T::Org, 0x100).unwrap();
        o.data(T::Code, &[0xC3]).unwrap();
        o.byte(T::CloseSegment, 0).unwrap();
        let module = build_module(&o, false, "a.obj").unwrap();
        let code = module.segs.seg(0).unwrap();
        assert_eq!(code.lo, 0x100);
        assert_eq!(code.hi, 0x101);
        assert_eq!(code.data[0x100], 0xC3);
    }

    #[test]
    fn long_name_is_rejected() {
        let mut o = ObjectFile::new();
        let long = "X".repeat(32);
        segment_def(&mut o, 0, &long, false, false, None, None);
        let err = build_module(&o, false, "a.obj").unwrap_err();
        assert!(err.to_string().contains("name too long"));
    }
}
