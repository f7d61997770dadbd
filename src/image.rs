//! Building the program image: paragraph layout of the consolidated
//! segments, and resolution of the load-time segment and group address
//! fixups against the assigned paragraph bases.

use anyhow::{anyhow, bail, ensure, Result};
use log::{debug, trace};

use crate::fixup::FixupKind;
use crate::p2aligned;
use crate::program::Program;
use crate::segment::SegmentId;

/// Image growth happens in these units.
pub const IMAGE_ALLOCATION_UNIT: u32 = 16 * 1024;
/// Should be enough for anyone.
pub const MAX_IMAGE: u32 = 640 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageStart {
    /// Paragraph address of the start segment within the image.
    pub seg: u16,
    pub offset: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageStack {
    /// Paragraph address of the stack base within the image.
    pub seg: u16,
    pub size: u16,
}

/// The laid-out program: initialised bytes `lo..hi` plus `space`
/// trailing uninitialised bytes the loader must provide.
#[derive(Clone, Debug, Default)]
pub struct Image {
    pub data: Vec<u8>,
    pub lo: u32,
    pub hi: u32,
    pub start: Option<ImageStart>,
    pub stack: Option<ImageStack>,
    pub space: u32,
}

impl Image {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_allocated(&mut self, size: u32) -> Result<()> {
        ensure!(
            self.space == 0,
            "internal error: allocating image data after uninitialised space"
        );
        ensure!(size <= MAX_IMAGE, "exceeding maximum image size");
        if size as usize > self.data.len() {
            let rounded = size.div_ceil(IMAGE_ALLOCATION_UNIT) * IMAGE_ALLOCATION_UNIT;
            self.data.resize(rounded as usize, 0);
        }
        Ok(())
    }

    pub fn write(&mut self, pos: u32, bytes: &[u8]) -> Result<()> {
        let size = bytes.len() as u32;
        if pos > MAX_IMAGE || MAX_IMAGE - pos < size {
            bail!("exceeding maximum image size");
        }
        if bytes.is_empty() {
            return Ok(());
        }
        self.ensure_allocated(pos + size)?;
        self.data[pos as usize..(pos + size) as usize].copy_from_slice(bytes);
        if self.hi == 0 || pos < self.lo {
            self.lo = pos;
        }
        if pos + size > self.hi {
            self.hi = pos + size;
        }
        Ok(())
    }

    /// Pad the initialised data up to `2^p2align` with zeros.
    fn pad_data(&mut self, p2align: u8) -> Result<()> {
        let new_hi = p2aligned(self.hi, p2align);
        self.ensure_allocated(new_hi)?;
        self.hi = new_hi;
        Ok(())
    }
}

/// Lay out the consolidated program, giving every live segment a
/// paragraph base, then resolve `Segment` and `Group` fixups against
/// those bases. The fixups are updated in place with their holding
/// paragraph addresses for the EXE relocation table.
pub fn build_image(prog: &mut Program) -> Result<Image> {
    build_image_with_bases(prog).map(|(image, _)| image)
}

/// As `build_image`, also returning each segment's byte base in the
/// image (indexed by `SegmentId`; nulled slots hold zero).
pub fn build_image_with_bases(prog: &mut Program) -> Result<(Image, Vec<u32>)> {
    debug!("build image");

    ensure!(prog.segs.first_proper().is_some(), "no segments");
    check_start(prog)?;

    let mut image = Image::new();
    let mut bases = vec![0u32; prog.segs.count()];

    let live: Vec<SegmentId> = prog.segs.iter().map(|(i, _)| i).collect();
    for segno in live {
        add_image_segment(&mut image, prog, segno, &mut bases)?;
    }

    ensure!(image.start.is_some(), "no start address in program image");

    resolve_load_time_fixups(&mut image, prog, &bases)?;

    Ok((image, bases))
}

fn check_start(prog: &Program) -> Result<()> {
    let start = prog.start.ok_or_else(|| anyhow!("no start address"))?;
    let seg = prog
        .segs
        .get(start.segno)
        .ok_or_else(|| anyhow!("the start offset is outside the start segment"))?;
    ensure!(
        (start.offset as u32) < seg.hi,
        "the start offset is outside the start segment"
    );
    Ok(())
}

fn add_image_segment(
    image: &mut Image,
    prog: &Program,
    segno: SegmentId,
    bases: &mut [u32],
) -> Result<()> {
    let seg = prog.segs.seg(segno)?;
    debug!("add segment/group to image: {}", seg.name);

    // a segment placed in the image begins at its own offset 0, so its
    // base must be a paragraph address
    if image.hi > 0 {
        ensure!(
            seg.p2align >= 4,
            "cannot place segment in image: not paragraph-aligned: {}",
            seg.name
        );
    }

    if seg.has_data() {
        ensure!(
            image.space == 0,
            "cannot place initialised segment/group after uninitialised space"
        );
        image.pad_data(seg.p2align)?;

        if let Some(start) = prog.start.filter(|s| s.segno == segno) {
            image.start = Some(ImageStart {
                seg: (image.hi / 16) as u16,
                offset: start.offset,
            });
        }

        if let Some(stack) = prog.stack.filter(|s| s.segno == segno) {
            image.stack = Some(image_stack(image.hi, stack.offset, stack.size)?);
        }

        bases[segno] = image.hi;
        trace!("segment {segno} '{}' base {:#07x}", seg.name, image.hi);
        image.write(image.hi + seg.lo, &seg.data[seg.lo as usize..seg.hi as usize])?;

        if seg.space > 0 {
            // trailing space already includes the alignment padding on
            // top of the segment's own hi
            ensure!(
                image.space == 0,
                "more than one segment with trailing uninitialised space"
            );
            image.space = seg.space;
        }
    } else if seg.space > 0 {
        let top = image.hi + image.space;
        let base = p2aligned(top, seg.p2align);
        image.space += base - top;

        ensure!(
            prog.start.map(|s| s.segno) != Some(segno),
            "start segment is uninitialised data"
        );

        if let Some(stack) = prog.stack.filter(|s| s.segno == segno) {
            image.stack = Some(image_stack(base, stack.offset, stack.size)?);
        }

        bases[segno] = base;
        trace!("space segment {segno} '{}' base {base:#07x}", seg.name);
        image.space += seg.space;
    }

    Ok(())
}

/// Initial SS is the paragraph of the stack base; initial SP is the
/// stack size.
fn image_stack(image_address: u32, offset: u16, size: u16) -> Result<ImageStack> {
    ensure!(
        image_address % 16 == 0,
        "stack image address is not paragraph-aligned"
    );
    ensure!(offset % 16 == 0, "stack offset is not paragraph-aligned");
    Ok(ImageStack {
        seg: ((image_address + offset as u32) / 16) as u16,
        size,
    })
}

/// Fill every `Segment` and `Group` fixup location with the addressed
/// paragraph address, and record the holding paragraph address for the
/// EXE relocation table.
fn resolve_load_time_fixups(image: &mut Image, prog: &mut Program, bases: &[u32]) -> Result<()> {
    debug!("resolve segment and group fixups");

    for i in 0..prog.fixups.count() {
        let fix = prog.fixups.get(i).clone();
        let addressed_base = match fix.kind {
            FixupKind::Segment {
                addressed_seg,
                addressed_base,
                ..
            } => bases[addressed_seg] + addressed_base as u32,
            FixupKind::Group { group, .. } => {
                let segno = prog.groups.main_segno(group).ok_or_else(|| {
                    anyhow!(
                        "group has no valid segment: {group}: {}",
                        prog.groups.name(group)
                    )
                })?;
                bases[segno]
            }
            _ => continue,
        };

        let holding_base = bases[fix.holding_seg];
        ensure!(
            holding_base % 16 == 0,
            "holding segment is not paragraph-aligned"
        );
        let holding_seg_addr = (holding_base / 16) as u16;

        ensure!(
            addressed_base % 16 == 0,
            "addressed segment is not paragraph-aligned"
        );
        let addressed_seg_addr = addressed_base / 16;
        ensure!(
            addressed_seg_addr <= 0xFFFF,
            "addressed segment is out of 16-bit range"
        );

        let image_addr = holding_base + fix.holding_offset as u32;
        ensure!(
            image.hi >= image_addr + 2,
            "fixup location beyond program image"
        );
        let held = crate::read_word_le(&image.data, image_addr as usize);
        ensure!(
            held == 0,
            "location of {} reference does not hold 0: image address {image_addr:#07x}, value {held:#06x}",
            fix.type_name()
        );
        crate::write_word_le(&mut image.data, image_addr as usize, addressed_seg_addr as u16);

        match &mut prog.fixups.get_mut(i).kind {
            FixupKind::Segment {
                holding_seg_addr: addr,
                ..
            }
            | FixupKind::Group {
                holding_seg_addr: addr,
                ..
            } => *addr = holding_seg_addr,
            _ => unreachable!(),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::program::{Start, StackPlace};
    use crate::segment::Segment;

    #[test]
    fn new_image_is_empty() {
        let image = Image::new();
        assert_eq!(image.lo, 0);
        assert_eq!(image.hi, 0);
        assert_eq!(image.space, 0);
        assert!(image.start.is_none());
        assert!(image.stack.is_none());
    }

    #[test]
    fn allocation_grows_in_units() {
        let mut image = Image::new();
        image.ensure_allocated(0).unwrap();
        assert!(image.data.is_empty());

        image.ensure_allocated(10_000).unwrap();
        assert_eq!(image.data.len() as u32, IMAGE_ALLOCATION_UNIT);
        assert!(image.data.iter().all(|&b| b == 0));

        image.ensure_allocated(8_000).unwrap();
        assert_eq!(image.data.len() as u32, IMAGE_ALLOCATION_UNIT);

        image.ensure_allocated(50_000).unwrap();
        assert_eq!(image.data.len() as u32, 4 * IMAGE_ALLOCATION_UNIT);

        assert!(image.ensure_allocated(MAX_IMAGE + 1).is_err());
    }

    #[test]
    fn write_tracks_lo_and_hi() {
        let mut image = Image::new();
        image.write(32, &[b'*'; 23]).unwrap();
        assert_eq!(image.data.len() as u32, IMAGE_ALLOCATION_UNIT);
        assert_eq!(image.lo, 32);
        assert_eq!(image.hi, 55);

        let big = vec![b'-'; (IMAGE_ALLOCATION_UNIT + IMAGE_ALLOCATION_UNIT / 2) as usize];
        image.write(16, &big).unwrap();
        assert_eq!(image.data.len() as u32, 2 * IMAGE_ALLOCATION_UNIT);
        assert_eq!(image.lo, 16);
        assert_eq!(image.hi, 16 + big.len() as u32);

        image.write(image.hi, &[b'*'; 23]).unwrap();
        assert_eq!(image.hi, 16 + big.len() as u32 + 23);
    }

    #[test]
    fn pad_data_aligns_hi() {
        let mut image = Image::new();
        image.pad_data(4).unwrap();
        assert_eq!(image.hi, 0);

        image.write(7, &[1; 15]).unwrap();
        assert_eq!(image.hi, 22);
        image.pad_data(4).unwrap();
        assert_eq!(image.hi, 32);
        image.pad_data(4).unwrap();
        assert_eq!(image.hi, 32);
    }

    fn prog_with_code(code: &[u8]) -> (Program, SegmentId) {
        let mut prog = Program::new("PROG", false);
        let mut seg = Segment::new("CODE", false, false, None);
        seg.load_data(code).unwrap();
        let segno = prog.segs.add(seg);
        prog.start = Some(Start { segno, offset: 0 });
        (prog, segno)
    }

    #[test]
    fn single_segment_layout() {
        let (mut prog, _) = prog_with_code(&[0x90, 0xC3]);
        let image = build_image(&mut prog).unwrap();
        assert_eq!(image.lo, 0);
        assert_eq!(image.hi, 2);
        assert_eq!(&image.data[..2], &[0x90, 0xC3]);
        assert_eq!(image.start, Some(ImageStart { seg: 0, offset: 0 }));
        assert!(image.stack.is_none());
        assert_eq!(image.space, 0);
    }

    #[test]
    fn bases_are_paragraph_aligned_and_disjoint() {
        let mut prog = Program::new("PROG", false);
        let mut a = Segment::new("A", false, false, None);
        a.load_data(&[1; 18]).unwrap();
        let a = prog.segs.add(a);
        let mut b = Segment::new("B", false, false, None);
        b.load_data(&[2; 5]).unwrap();
        b.p2align = 4;
        let b = prog.segs.add(b);
        let mut c = Segment::new("C", false, false, None);
        c.load_data(&[3; 7]).unwrap();
        c.p2align = 4;
        prog.segs.add(c);
        prog.start = Some(Start { segno: a, offset: 0 });

        let (image, bases) = build_image_with_bases(&mut prog).unwrap();
        // A 0..18, pad to 32; B 32..37, pad to 48; C 48..55
        assert_eq!(image.hi, 55);
        assert_eq!(image.data[0], 1);
        assert_eq!(image.data[32], 2);
        assert_eq!(image.data[48], 3);
        assert_eq!(image.data[18], 0);

        // every live segment starts on a paragraph boundary and the
        // occupied intervals do not overlap
        let mut prev_end = 0;
        for (segno, seg) in prog.segs.iter() {
            assert_eq!(bases[segno] % 16, 0);
            assert!(bases[segno] >= prev_end);
            prev_end = bases[segno] + seg.end();
        }
        let _ = b;
    }

    #[test]
    fn unaligned_second_segment_is_refused() {
        let mut prog = Program::new("PROG", false);
        let mut a = Segment::new("A", false, false, None);
        a.load_data(&[1; 4]).unwrap();
        let a = prog.segs.add(a);
        let mut b = Segment::new("B", false, false, None);
        b.load_data(&[2; 4]).unwrap();
        b.p2align = 0;
        prog.segs.add(b);
        prog.start = Some(Start { segno: a, offset: 0 });

        let err = build_image(&mut prog).unwrap_err();
        assert!(err.to_string().contains("not paragraph-aligned"));
    }

    #[test]
    fn missing_start_is_refused() {
        let mut prog = Program::new("PROG", false);
        let mut a = Segment::new("A", false, false, None);
        a.load_data(&[1; 4]).unwrap();
        prog.segs.add(a);
        let err = build_image(&mut prog).unwrap_err();
        assert!(err.to_string().contains("no start address"));
    }

    #[test]
    fn start_beyond_segment_is_refused() {
        let (mut prog, segno) = prog_with_code(&[0x90]);
        prog.start = Some(Start { segno, offset: 4 });
        let err = build_image(&mut prog).unwrap_err();
        assert!(err.to_string().contains("outside the start segment"));
    }

    #[test]
    fn start_in_space_segment_is_refused() {
        let mut prog = Program::new("PROG", false);
        let mut a = Segment::new("A", false, false, None);
        a.load_data(&[1; 4]).unwrap();
        let a = prog.segs.add(a);
        let mut b = Segment::new("B", false, false, None);
        b.load_space(0x20).unwrap();
        let b = prog.segs.add(b);
        prog.start = Some(Start { segno: b, offset: 0 });
        let _ = a;

        let err = build_image(&mut prog).unwrap_err();
        assert!(err.to_string().contains("outside the start segment"));
    }

    #[test]
    fn stack_in_space_segment_sets_ss() {
        let mut prog = Program::new("PROG", false);
        let mut code = Segment::new("CODE", false, false, None);
        code.load_data(&[0x90; 18]).unwrap();
        let c = prog.segs.add(code);
        let mut stack = Segment::new("STACK", false, true, None);
        stack.load_space(0x100).unwrap();
        let s = prog.segs.add(stack);
        prog.start = Some(Start { segno: c, offset: 0 });
        prog.stack = Some(StackPlace {
            segno: s,
            offset: 0,
            size: 0x100,
        });

        let image = build_image(&mut prog).unwrap();
        // code 0..18; space starts at its paragraph base 32
        assert_eq!(image.hi, 18);
        assert_eq!(image.space, (32 - 18) + 0x100);
        assert_eq!(
            image.stack,
            Some(ImageStack {
                seg: 2,
                size: 0x100
            })
        );
    }

    #[test]
    fn initialised_after_space_is_refused() {
        let mut prog = Program::new("PROG", false);
        let mut a = Segment::new("A", false, false, None);
        a.load_data(&[1; 4]).unwrap();
        let a = prog.segs.add(a);
        let mut b = Segment::new("B", false, false, None);
        b.load_space(0x20).unwrap();
        prog.segs.add(b);
        let mut c = Segment::new("C", false, false, None);
        c.load_data(&[3; 4]).unwrap();
        c.p2align = 4;
        prog.segs.add(c);
        prog.start = Some(Start { segno: a, offset: 0 });

        let err = build_image(&mut prog).unwrap_err();
        assert!(err.to_string().contains("after uninitialised space"));
    }

    #[test]
    fn segment_fixup_is_resolved_against_bases() {
        let mut prog = Program::new("PROG", false);
        let mut code = Segment::new("CODE", false, false, None);
        // B8 00 00: MOV AX, seg DATA with zeroed imm16
        code.load_data(&[0xB8, 0x00, 0x00]).unwrap();
        let c = prog.segs.add(code);
        let mut data = Segment::new("DATA", false, false, None);
        data.load_data(&[0xAA; 4]).unwrap();
        data.p2align = 4;
        let d = prog.segs.add(data);
        prog.start = Some(Start { segno: c, offset: 0 });
        prog.fixups.add_segment(c, 1, d);

        let image = build_image(&mut prog).unwrap();
        // DATA paragraph base is 16/16 = 1
        assert_eq!(&image.data[1..3], &[0x01, 0x00]);
        match prog.fixups.get(0).kind {
            FixupKind::Segment {
                holding_seg_addr, ..
            } => assert_eq!(holding_seg_addr, 0),
            _ => panic!("wrong kind"),
        }
    }

    #[test]
    fn group_fixup_uses_main_segment_base() {
        let mut prog = Program::new("PROG", false);
        let mut code = Segment::new("CODE", false, false, None);
        code.load_data(&[0xB8, 0x00, 0x00]).unwrap();
        let c = prog.segs.add(code);
        let mut data = Segment::new("DATA", false, false, Some(0));
        data.load_data(&[0xAA; 4]).unwrap();
        data.p2align = 4;
        let d = prog.segs.add(data);
        let g = prog.groups.add("DGROUP");
        prog.groups.set_main_segno(g, d);
        prog.start = Some(Start { segno: c, offset: 0 });
        prog.fixups.add_group(c, 1, g);

        let image = build_image(&mut prog).unwrap();
        assert_eq!(&image.data[1..3], &[0x01, 0x00]);
    }

    #[test]
    fn nonzero_fixup_location_is_refused() {
        let mut prog = Program::new("PROG", false);
        let mut code = Segment::new("CODE", false, false, None);
        code.load_data(&[0xB8, 0x01, 0x00]).unwrap();
        let c = prog.segs.add(code);
        prog.start = Some(Start { segno: c, offset: 0 });
        prog.fixups.add_segment(c, 1, c);

        let err = build_image(&mut prog).unwrap_err();
        assert!(err.to_string().contains("does not hold 0"));
    }
}
