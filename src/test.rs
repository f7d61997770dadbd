//! End-to-end link scenarios driving the whole pipeline from object
//! records to executable bytes.

use rstest::rstest;

use crate::exe::load_exe;
use crate::linker::{link_modules, OutputFormat};
use crate::record::{ObjectFile, RecordType as T};

struct SegAttrs<'a> {
    name: &'a str,
    public: bool,
    stack: bool,
    group: Option<u8>,
    p2align: u8,
}

fn define_segment(o: &mut ObjectFile, ordinal: u8, attrs: &SegAttrs) {
    o.signal(T::BeginSegment).unwrap();
    o.byte(T::Ordinal, ordinal).unwrap();
    o.data(T::Name, attrs.name.as_bytes()).unwrap();
    if let Some(g) = attrs.group {
        o.byte(T::GroupNo, g).unwrap();
    }
    if attrs.public {
        o.signal(T::Public).unwrap();
    }
    if attrs.stack {
        o.signal(T::Stack).unwrap();
    }
    o.byte(T::P2Align, attrs.p2align).unwrap();
    o.signal(T::EndSegment).unwrap();
}

fn define_group(o: &mut ObjectFile, ordinal: u8, name: &str) {
    o.signal(T::BeginGroup).unwrap();
    o.byte(T::Ordinal, ordinal).unwrap();
    o.data(T::Name, name.as_bytes()).unwrap();
    o.signal(T::EndGroup).unwrap();
}

fn define_start(o: &mut ObjectFile, segno: u8, offset: u16) {
    o.signal(T::BeginStart).unwrap();
    o.byte(T::SegNo, segno).unwrap();
    o.word(T::Offset, offset).unwrap();
    o.signal(T::EndStart).unwrap();
}

/// A COM program whose segment content comes out verbatim.
#[test]
fn com_hello_scenario() {
    const CODE: [u8; 13] = [
        0xB4, 0x09, 0xBA, 0x09, 0x01, 0xCD, 0x21, 0xB4, 0x00, 0xCD, 0x21, 0x24, 0x0A,
    ];

    let mut o = ObjectFile::new();
    define_segment(
        &mut o,
        0,
        &SegAttrs {
            name: "CODE",
            public: true,
            stack: false,
            group: None,
            p2align: 4,
        },
    );
    o.byte(T::OpenSegment, 0).unwrap();
    o.word(T::Org, 0x100).unwrap();
    o.data(T::Code, &CODE).unwrap();
    o.byte(T::CloseSegment, 0).unwrap();
    define_start(&mut o, 0, 0x100);

    let objects = vec![("hello.obj".to_string(), o)];
    let result = link_modules(&objects, OutputFormat::Com, false, "HELLO.COM").unwrap();
    assert_eq!(result.bytes, CODE);
}

/// Two modules contribute segments to one group; the program start is
/// in a separate code segment that addresses the group.
#[test]
fn exe_with_stack_and_group_scenario() {
    // module a: DGROUP data and the code with a group address fixup
    let mut a = ObjectFile::new();
    define_group(&mut a, 0, "DGROUP");
    define_segment(
        &mut a,
        0,
        &SegAttrs {
            name: "DATA1",
            public: true,
            stack: false,
            group: Some(0),
            p2align: 4,
        },
    );
    define_segment(
        &mut a,
        1,
        &SegAttrs {
            name: "CODE",
            public: true,
            stack: false,
            group: None,
            p2align: 4,
        },
    );
    a.byte(T::OpenSegment, 0).unwrap();
    a.data(T::Ds, &[0x11; 16]).unwrap();
    a.byte(T::CloseSegment, 0).unwrap();
    a.byte(T::OpenSegment, 1).unwrap();
    // MOV AX, DGROUP; MOV DS, AX; padding to one paragraph
    a.data(T::Code, &[0xB8, 0x00, 0x00]).unwrap();
    a.signal(T::BeginGroupAddr).unwrap();
    a.word(T::Pos, 1).unwrap();
    a.byte(T::GroupNo, 0).unwrap();
    a.signal(T::EndGroupAddr).unwrap();
    a.data(T::Code, &[0x8E, 0xD8]).unwrap();
    a.data(T::Code, &[0x90; 11]).unwrap();
    a.byte(T::CloseSegment, 1).unwrap();
    define_start(&mut a, 1, 0);

    // module b: more DGROUP data and the stack
    let mut b = ObjectFile::new();
    define_group(&mut b, 0, "DGROUP");
    define_segment(
        &mut b,
        0,
        &SegAttrs {
            name: "DATA2",
            public: true,
            stack: false,
            group: Some(0),
            p2align: 4,
        },
    );
    define_segment(
        &mut b,
        1,
        &SegAttrs {
            name: "STACK",
            public: true,
            stack: true,
            group: None,
            p2align: 4,
        },
    );
    b.byte(T::OpenSegment, 0).unwrap();
    b.data(T::Ds, &[0x22; 16]).unwrap();
    b.byte(T::CloseSegment, 0).unwrap();
    b.byte(T::OpenSegment, 1).unwrap();
    b.word(T::Space, 0x100).unwrap();
    b.byte(T::CloseSegment, 1).unwrap();

    let objects = vec![("a.obj".to_string(), a), ("b.obj".to_string(), b)];
    let result = link_modules(&objects, OutputFormat::Exe, false, "A.EXE").unwrap();

    let exe = load_exe(&result.bytes).unwrap();
    assert_eq!(exe.header.reloc_items, 1);
    // DGROUP holds two 16-byte members, so CODE lands at paragraph 2
    assert_eq!(exe.header.init_cs, 2);
    assert_eq!(exe.header.init_ip, 0);
    assert_eq!(exe.header.min_alloc, 0x100 / 16);
    assert_eq!(exe.header.init_sp, 0x100);
    // stack base is the paragraph after DGROUP and CODE
    assert_eq!(exe.header.init_ss, 3);

    // the group paragraph was patched into MOV AX, imm16 in the image
    assert_eq!(&exe.image[0x20..0x23], &[0xB8, 0x00, 0x00]);
    // relocation entry points at the patched word
    assert_eq!(exe.reloc_table[0].segment, 2);
    assert_eq!(exe.reloc_table[0].offset, 1);
}

/// An absolute jump target within a group becomes PC-relative.
#[test]
fn group_absolute_jump_scenario() {
    let mut o = ObjectFile::new();
    define_group(&mut o, 0, "CGROUP");
    define_segment(
        &mut o,
        0,
        &SegAttrs {
            name: "CODE",
            public: true,
            stack: false,
            group: Some(0),
            p2align: 4,
        },
    );
    o.byte(T::OpenSegment, 0).unwrap();
    o.data(T::Code, &[0xE9, 0x34, 0x12]).unwrap();
    o.signal(T::BeginGroupAbsJump).unwrap();
    o.word(T::Pos, 1).unwrap();
    o.byte(T::GroupNo, 0).unwrap();
    o.signal(T::EndGroupAbsJump).unwrap();
    o.data(T::Code, &[0x90; 13]).unwrap();
    o.byte(T::CloseSegment, 0).unwrap();
    define_start(&mut o, 0, 0);

    let objects = vec![("jump.obj".to_string(), o)];
    let result = link_modules(&objects, OutputFormat::Bin, false, "A.BIN").unwrap();
    // 0x1234 - (1 + 2) = 0x1231
    assert_eq!(&result.bytes[1..3], &[0x31, 0x12]);
}

/// A reference to a symbol no module defines fails the link.
#[test]
fn undefined_external_scenario() {
    let mut a = ObjectFile::new();
    define_segment(
        &mut a,
        0,
        &SegAttrs {
            name: "CODE",
            public: true,
            stack: false,
            group: None,
            p2align: 4,
        },
    );
    a.signal(T::BeginExternDef).unwrap();
    a.word(T::Id, 0).unwrap();
    a.data(T::Name, b"FOO").unwrap();
    a.byte(T::SegNo, 0).unwrap();
    a.signal(T::EndExternDef).unwrap();
    a.byte(T::OpenSegment, 0).unwrap();
    a.data(T::Code, &[0xE8, 0x00, 0x00]).unwrap();
    a.signal(T::BeginExternUse).unwrap();
    a.word(T::Pos, 1).unwrap();
    a.word(T::Id, 0).unwrap();
    a.signal(T::Jump).unwrap();
    a.signal(T::EndExternUse).unwrap();
    a.byte(T::CloseSegment, 0).unwrap();
    define_start(&mut a, 0, 0);

    let mut b = ObjectFile::new();
    define_segment(
        &mut b,
        0,
        &SegAttrs {
            name: "MORE",
            public: false,
            stack: false,
            group: None,
            p2align: 4,
        },
    );
    b.byte(T::OpenSegment, 0).unwrap();
    b.byte(T::Db, 0x42).unwrap();
    b.byte(T::CloseSegment, 0).unwrap();

    let objects = vec![("a.obj".to_string(), a), ("b.obj".to_string(), b)];
    let err = link_modules(&objects, OutputFormat::Bin, false, "A.BIN").unwrap_err();
    assert_eq!(err.to_string(), "Link errors: 1");
}

/// Externals resolve across modules, for data and for jumps.
#[test]
fn cross_module_externals_resolve() {
    // module a: CODE with a jump to the external label "entry"
    let mut a = ObjectFile::new();
    define_segment(
        &mut a,
        0,
        &SegAttrs {
            name: "CODE",
            public: true,
            stack: false,
            group: None,
            p2align: 4,
        },
    );
    a.signal(T::BeginExternDef).unwrap();
    a.word(T::Id, 0).unwrap();
    a.data(T::Name, b"entry").unwrap();
    a.byte(T::SegNo, 0).unwrap();
    a.signal(T::EndExternDef).unwrap();
    a.byte(T::OpenSegment, 0).unwrap();
    a.data(T::Code, &[0xE8, 0x00, 0x00]).unwrap();
    a.signal(T::BeginExternUse).unwrap();
    a.word(T::Pos, 1).unwrap();
    a.word(T::Id, 0).unwrap();
    a.signal(T::Jump).unwrap();
    a.signal(T::EndExternUse).unwrap();
    a.data(T::Code, &[0x90; 13]).unwrap();
    a.byte(T::CloseSegment, 0).unwrap();
    define_start(&mut a, 0, 0);

    // module b: the tail of CODE defining "entry" at its offset 0
    let mut b = ObjectFile::new();
    define_segment(
        &mut b,
        0,
        &SegAttrs {
            name: "CODE",
            public: true,
            stack: false,
            group: None,
            p2align: 4,
        },
    );
    b.byte(T::OpenSegment, 0).unwrap();
    b.data(T::Code, &[0xC3]).unwrap();
    b.byte(T::CloseSegment, 0).unwrap();
    b.signal(T::BeginPublic).unwrap();
    b.data(T::Name, b"ENTRY").unwrap();
    b.byte(T::SegNo, 0).unwrap();
    b.word(T::Offset, 0).unwrap();
    b.signal(T::EndPublic).unwrap();

    let objects = vec![("a.obj".to_string(), a), ("b.obj".to_string(), b)];
    let result = link_modules(&objects, OutputFormat::Bin, false, "A.BIN").unwrap();

    // b's fragment lands at offset 16; displacement 16 - 3 = 13
    assert_eq!(&result.bytes[..3], &[0xE8, 0x0D, 0x00]);
    assert_eq!(result.bytes[16], 0xC3);
}

/// Linking the same inputs twice produces byte-identical output.
#[rstest]
#[case(OutputFormat::Bin)]
#[case(OutputFormat::Exe)]
fn relink_is_idempotent(#[case] format: OutputFormat) {
    fn build() -> ObjectFile {
        let mut o = ObjectFile::new();
        define_group(&mut o, 0, "CGROUP");
        define_segment(
            &mut o,
            0,
            &SegAttrs {
                name: "MAIN",
                public: true,
                stack: false,
                group: Some(0),
                p2align: 4,
            },
        );
        define_segment(
            &mut o,
            1,
            &SegAttrs {
                name: "AUX",
                public: false,
                stack: false,
                group: Some(0),
                p2align: 0,
            },
        );
        o.byte(T::OpenSegment, 0).unwrap();
        o.data(T::Code, &[0xB4, 0x4C, 0xCD, 0x21]).unwrap();
        o.byte(T::CloseSegment, 0).unwrap();
        o.byte(T::OpenSegment, 1).unwrap();
        o.word(T::Dw, 0xBEEF).unwrap();
        o.byte(T::CloseSegment, 1).unwrap();
        define_start(&mut o, 0, 0);
        o
    }

    let first = link_modules(
        &[("m.obj".to_string(), build())],
        format,
        false,
        "OUT",
    )
    .unwrap();
    let second = link_modules(
        &[("m.obj".to_string(), build())],
        format,
        false,
        "OUT",
    )
    .unwrap();
    assert_eq!(first.bytes, second.bytes);
    assert!(!first.bytes.is_empty());
}

/// The object file survives a save/load round trip through its on-disk
/// form and still links to the same output.
#[test]
fn object_round_trip_then_link() {
    let mut o = ObjectFile::new();
    define_segment(
        &mut o,
        0,
        &SegAttrs {
            name: "CODE",
            public: true,
            stack: false,
            group: None,
            p2align: 4,
        },
    );
    o.byte(T::OpenSegment, 0).unwrap();
    o.word(T::Org, 0x100).unwrap();
    o.data(T::Code, &[0xC3]).unwrap();
    o.byte(T::CloseSegment, 0).unwrap();
    define_start(&mut o, 0, 0x100);

    let mut bytes = Vec::new();
    o.write(&mut bytes).unwrap();
    let reloaded = ObjectFile::read(&mut std::io::Cursor::new(&bytes)).unwrap();
    assert_eq!(reloaded, o);

    let direct = link_modules(
        &[("m.obj".to_string(), o)],
        OutputFormat::Com,
        false,
        "A.COM",
    )
    .unwrap();
    let through_disk = link_modules(
        &[("m.obj".to_string(), reloaded)],
        OutputFormat::Com,
        false,
        "A.COM",
    )
    .unwrap();
    assert_eq!(direct.bytes, through_disk.bytes);
    assert_eq!(direct.bytes, [0xC3]);
}

/// A COM program with load-time segment fixups is refused.
#[test]
fn com_with_segment_fixup_is_refused() {
    let mut o = ObjectFile::new();
    define_segment(
        &mut o,
        0,
        &SegAttrs {
            name: "CODE",
            public: true,
            stack: false,
            group: None,
            p2align: 4,
        },
    );
    o.byte(T::OpenSegment, 0).unwrap();
    o.word(T::Org, 0x100).unwrap();
    o.data(T::Code, &[0xB8, 0x00, 0x00]).unwrap();
    o.signal(T::BeginSegAddr).unwrap();
    o.word(T::Pos, 0x101).unwrap();
    o.byte(T::SegNo, 0).unwrap();
    o.signal(T::EndSegAddr).unwrap();
    o.byte(T::CloseSegment, 0).unwrap();
    define_start(&mut o, 0, 0x100);

    let err = link_modules(
        &[("m.obj".to_string(), o)],
        OutputFormat::Com,
        false,
        "A.COM",
    )
    .unwrap_err();
    assert!(err.to_string().contains("segment fixups"));
}
