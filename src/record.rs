//! The relocatable object format: a flat stream of typed records.
//!
//! A file is the 4-byte signature, a 2-byte version, then concatenated
//! records. Each record is a 1-byte type followed by a payload whose
//! shape depends on the type: nothing, a little-endian number of 1/2/4/8
//! bytes, or a 1-byte length and that many raw bytes. Containers are
//! expressed with explicit `Begin*`/`End*` records; nothing is
//! length-prefixed at the container level. Container semantics are
//! enforced by the module loader, not here.

use anyhow::{anyhow, bail, ensure, Result};
use num_enum::{IntoPrimitive, TryFromPrimitive};

use std::io::{Read, Write};

pub const SIGNATURE: [u8; 4] = [0x43, 0xD0, 0xAB, 0x1F];
pub const VERSION: [u8; 2] = [0x00, 0x00];

/// Object record types.
///
/// There is no symbol table container record, only `BeginPublic`
/// definitions and `BeginExternDef` requirements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum RecordType {
    /// An instruction in a segment.
    Code,
    /// String of bytes in a segment.
    Ds,
    /// Byte data in a segment.
    Db,
    /// Word data (16-bit) in a segment.
    Dw,
    /// Doubleword data (32-bit) in a segment.
    Dd,
    /// Quadword data (64-bit) in a segment.
    Dq,
    /// Ten-byte data in a segment (stored as a quadword, zero-extended).
    Dt,
    /// Set the location counter in the open segment.
    Org,
    /// Top level: begin segment definition.
    BeginSegment,
    EndSegment,
    /// Ordinal number of an object in a set, e.g. segment number.
    Ordinal,
    /// Name of the current object.
    Name,
    /// Top level: make a segment current for code and data.
    OpenSegment,
    CloseSegment,
    /// Top level: begin group definition (ordinal, name).
    BeginGroup,
    EndGroup,
    /// Group number of the current object.
    GroupNo,
    /// Begin fixup: a label offset in segment data that may be relocated.
    BeginOffset,
    EndOffset,
    /// 2-byte position in some data.
    Pos,
    /// 1-byte length.
    Len1,
    /// Segment number in the current object.
    SegNo,
    /// Flag the segment being defined as public.
    Public,
    /// Begin fixup: use of an external symbol at POS in the open segment.
    BeginExternUse,
    EndExternUse,
    /// Numeric ID of the current object.
    Id,
    /// The external use is a jump, not a data displacement.
    Jump,
    /// Top level: begin external symbol requirement (id, name, segno).
    BeginExternDef,
    EndExternDef,
    /// Top level: begin public symbol definition (name, segno, offset).
    BeginPublic,
    EndPublic,
    /// Word (16-bit) offset belonging to the containing object.
    Offset,
    /// Begin fixup: jump to an absolute offset in a group.
    BeginGroupAbsJump,
    EndGroupAbsJump,
    /// Top level: begin program start address (segno, offset).
    BeginStart,
    EndStart,
    /// Flag the segment being defined as the stack segment.
    Stack,
    /// Begin fixup: segment address of segment SEGNO at POS.
    BeginSegAddr,
    EndSegAddr,
    /// Begin fixup: segment address of group GROUPNO at POS.
    BeginGroupAddr,
    EndGroupAddr,
    /// Alignment power of the segment being defined, or of the location
    /// counter in the open segment.
    P2Align,
    /// Allocate uninitialised space in the open segment.
    Space,
    /// Symbols in this module are case-sensitive.
    Cased,
}

/// The payload shape that follows a record's type byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordShape {
    /// The type byte signals its whole meaning, no payload.
    Signal,
    Byte,
    Word,
    Dword,
    Qword,
    /// A length byte, then that many bytes of data.
    Data,
}

impl RecordType {
    pub fn shape(self) -> RecordShape {
        use RecordShape::*;
        match self {
            RecordType::Code | RecordType::Ds | RecordType::Name => Data,
            RecordType::Db
            | RecordType::Ordinal
            | RecordType::OpenSegment
            | RecordType::CloseSegment
            | RecordType::GroupNo
            | RecordType::Len1
            | RecordType::SegNo
            | RecordType::P2Align => Byte,
            RecordType::Dw
            | RecordType::Org
            | RecordType::Pos
            | RecordType::Id
            | RecordType::Offset
            | RecordType::Space => Word,
            RecordType::Dd => Dword,
            RecordType::Dq | RecordType::Dt => Qword,
            _ => Signal,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RecordType::Code => "CODE",
            RecordType::Ds => "DS",
            RecordType::Db => "DB",
            RecordType::Dw => "DW",
            RecordType::Dd => "DD",
            RecordType::Dq => "DQ",
            RecordType::Dt => "DT",
            RecordType::Org => "ORG",
            RecordType::BeginSegment => "BEGIN_SEGMENT",
            RecordType::EndSegment => "END_SEGMENT",
            RecordType::Ordinal => "ORDINAL",
            RecordType::Name => "NAME",
            RecordType::OpenSegment => "OPEN_SEGMENT",
            RecordType::CloseSegment => "CLOSE_SEGMENT",
            RecordType::BeginGroup => "BEGIN_GROUP",
            RecordType::EndGroup => "END_GROUP",
            RecordType::GroupNo => "GROUPNO",
            RecordType::BeginOffset => "BEGIN_OFFSET",
            RecordType::EndOffset => "END_OFFSET",
            RecordType::Pos => "POS",
            RecordType::Len1 => "LEN1",
            RecordType::SegNo => "SEGNO",
            RecordType::Public => "PUBLIC",
            RecordType::BeginExternUse => "BEGIN_EXTRN_USE",
            RecordType::EndExternUse => "END_EXTRN_USE",
            RecordType::Id => "ID",
            RecordType::Jump => "JUMP",
            RecordType::BeginExternDef => "BEGIN_EXTRN_DEF",
            RecordType::EndExternDef => "END_EXTRN_DEF",
            RecordType::BeginPublic => "BEGIN_PUBLIC",
            RecordType::EndPublic => "END_PUBLIC",
            RecordType::Offset => "OFFSET",
            RecordType::BeginGroupAbsJump => "BEGIN_GROUP_ABS_JUMP",
            RecordType::EndGroupAbsJump => "END_GROUP_ABS_JUMP",
            RecordType::BeginStart => "BEGIN_START",
            RecordType::EndStart => "END_START",
            RecordType::Stack => "STACK",
            RecordType::BeginSegAddr => "BEGIN_SEG_ADDR",
            RecordType::EndSegAddr => "END_SEG_ADDR",
            RecordType::BeginGroupAddr => "BEGIN_GROUP_ADDR",
            RecordType::EndGroupAddr => "END_GROUP_ADDR",
            RecordType::P2Align => "P2ALIGN",
            RecordType::Space => "SPACE",
            RecordType::Cased => "CASED",
        }
    }
}

/// Payload of one record, matching its type's shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordBody {
    Signal,
    Byte(u8),
    Word(u16),
    Dword(u32),
    Qword(u64),
    Data(Vec<u8>),
}

impl RecordBody {
    fn shape(&self) -> RecordShape {
        match self {
            RecordBody::Signal => RecordShape::Signal,
            RecordBody::Byte(_) => RecordShape::Byte,
            RecordBody::Word(_) => RecordShape::Word,
            RecordBody::Dword(_) => RecordShape::Dword,
            RecordBody::Qword(_) => RecordShape::Qword,
            RecordBody::Data(_) => RecordShape::Data,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub rtype: RecordType,
    pub body: RecordBody,
}

impl Record {
    pub fn byte(&self) -> Result<u8> {
        match self.body {
            RecordBody::Byte(b) => Ok(b),
            _ => Err(anyhow!("{} record does not hold a byte", self.rtype.name())),
        }
    }

    pub fn word(&self) -> Result<u16> {
        match self.body {
            RecordBody::Word(w) => Ok(w),
            _ => Err(anyhow!("{} record does not hold a word", self.rtype.name())),
        }
    }

    pub fn dword(&self) -> Result<u32> {
        match self.body {
            RecordBody::Dword(d) => Ok(d),
            _ => Err(anyhow!("{} record does not hold a dword", self.rtype.name())),
        }
    }

    pub fn qword(&self) -> Result<u64> {
        match self.body {
            RecordBody::Qword(q) => Ok(q),
            _ => Err(anyhow!("{} record does not hold a qword", self.rtype.name())),
        }
    }

    pub fn data(&self) -> Result<&[u8]> {
        match &self.body {
            RecordBody::Data(d) => Ok(d),
            _ => Err(anyhow!("{} record does not hold data", self.rtype.name())),
        }
    }

    /// Render the record the way the object dumper prints it.
    pub fn dump_line(&self) -> String {
        let tag = format!("{:02x}: {}", u8::from(self.rtype), self.rtype.name());
        match &self.body {
            RecordBody::Signal => tag,
            RecordBody::Byte(b) => format!("{tag}: 0x{b:02x}"),
            RecordBody::Word(w) => format!("{tag}: 0x{w:04x}"),
            RecordBody::Dword(d) => format!("{tag}: 0x{d:08x}"),
            RecordBody::Qword(q) => format!("{tag}: 0x{q:016x}"),
            RecordBody::Data(data) => {
                let mut line = format!("{tag}: {}:", data.len());
                for b in data {
                    line.push_str(&format!(" {b:02x}"));
                }
                if self.rtype != RecordType::Code && printable(data) {
                    line.push_str(": ");
                    for &b in data {
                        let c = b as char;
                        line.push(if c.is_ascii_graphic() || c == ' ' { c } else { '.' });
                    }
                }
                line
            }
        }
    }
}

fn printable(data: &[u8]) -> bool {
    !data.is_empty()
        && data
            .iter()
            .all(|&b| b.is_ascii_graphic() || b" \t\n\r\x08".contains(&b))
}

/// An object file: an append-only record store with indexed access.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectFile {
    records: Vec<Record>,
}

impl ObjectFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, index: usize) -> &Record {
        &self.records[index]
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    fn push(&mut self, rtype: RecordType, body: RecordBody) -> Result<()> {
        ensure!(
            rtype.shape() == body.shape(),
            "record {} does not take a {:?} payload",
            rtype.name(),
            body.shape()
        );
        self.records.push(Record { rtype, body });
        Ok(())
    }

    pub fn signal(&mut self, rtype: RecordType) -> Result<()> {
        self.push(rtype, RecordBody::Signal)
    }

    pub fn byte(&mut self, rtype: RecordType, value: u8) -> Result<()> {
        self.push(rtype, RecordBody::Byte(value))
    }

    pub fn word(&mut self, rtype: RecordType, value: u16) -> Result<()> {
        self.push(rtype, RecordBody::Word(value))
    }

    pub fn dword(&mut self, rtype: RecordType, value: u32) -> Result<()> {
        self.push(rtype, RecordBody::Dword(value))
    }

    pub fn qword(&mut self, rtype: RecordType, value: u64) -> Result<()> {
        self.push(rtype, RecordBody::Qword(value))
    }

    pub fn data(&mut self, rtype: RecordType, bytes: &[u8]) -> Result<()> {
        ensure!(
            bytes.len() <= 0xff,
            "object record data length exceeds 1-byte length field: {}",
            bytes.len()
        );
        self.push(rtype, RecordBody::Data(bytes.to_vec()))
    }

    pub fn write<W: Write>(&self, output: &mut W) -> Result<()> {
        output.write_all(&SIGNATURE)?;
        output.write_all(&VERSION)?;
        for rec in &self.records {
            output.write_all(&[u8::from(rec.rtype)])?;
            match &rec.body {
                RecordBody::Signal => {}
                RecordBody::Byte(b) => output.write_all(&[*b])?,
                RecordBody::Word(w) => bincode::serialize_into(&mut *output, w)?,
                RecordBody::Dword(d) => bincode::serialize_into(&mut *output, d)?,
                RecordBody::Qword(q) => bincode::serialize_into(&mut *output, q)?,
                RecordBody::Data(data) => {
                    // enforced at emit time
                    debug_assert!(data.len() <= 0xff);
                    output.write_all(&[data.len() as u8])?;
                    output.write_all(data)?;
                }
            }
        }
        Ok(())
    }

    pub fn read<R: Read>(input: &mut R) -> Result<Self> {
        let mut sig = [0u8; 4];
        input
            .read_exact(&mut sig)
            .map_err(|_| anyhow!("error reading object file signature"))?;
        ensure!(sig == SIGNATURE, "not a recognised object file");
        let mut ver = [0u8; 2];
        input
            .read_exact(&mut ver)
            .map_err(|_| anyhow!("error reading object file version"))?;
        ensure!(ver == VERSION, "incompatible object file version");

        let mut ofile = ObjectFile::new();
        let mut type_byte = [0u8; 1];
        loop {
            if input.read(&mut type_byte)? == 0 {
                break;
            }
            let rtype = RecordType::try_from(type_byte[0])
                .map_err(|_| anyhow!("unknown object record type: {}", type_byte[0]))?;
            let body = match rtype.shape() {
                RecordShape::Signal => RecordBody::Signal,
                RecordShape::Byte => {
                    let mut b = [0u8; 1];
                    input.read_exact(&mut b).map_err(unexpected_eof)?;
                    RecordBody::Byte(b[0])
                }
                RecordShape::Word => {
                    RecordBody::Word(bincode::deserialize_from(&mut *input).map_err(short_record)?)
                }
                RecordShape::Dword => {
                    RecordBody::Dword(bincode::deserialize_from(&mut *input).map_err(short_record)?)
                }
                RecordShape::Qword => {
                    RecordBody::Qword(bincode::deserialize_from(&mut *input).map_err(short_record)?)
                }
                RecordShape::Data => {
                    let mut len = [0u8; 1];
                    input.read_exact(&mut len).map_err(unexpected_eof)?;
                    let mut data = vec![0u8; len[0] as usize];
                    input.read_exact(&mut data).map_err(unexpected_eof)?;
                    RecordBody::Data(data)
                }
            };
            ofile.records.push(Record { rtype, body });
        }
        Ok(ofile)
    }

    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.write(&mut file)
            .map_err(|e| anyhow!("writing object file {}: {e}", path.display()))
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let mut file = std::io::BufReader::new(std::fs::File::open(path)?);
        Self::read(&mut file).map_err(|e| anyhow!("{}: {e}", path.display()))
    }
}

fn unexpected_eof(_: std::io::Error) -> anyhow::Error {
    anyhow!("unexpected end of object file")
}

fn short_record(_: bincode::Error) -> anyhow::Error {
    anyhow!("unexpected end of object file")
}

/// Split a long byte span into emittable `Code`/`Ds` records.
pub fn emit_data_span(ofile: &mut ObjectFile, rtype: RecordType, bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        bail!("empty data span");
    }
    for chunk in bytes.chunks(0xff) {
        ofile.data(rtype, chunk)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    fn sample() -> ObjectFile {
        let mut o = ObjectFile::new();
        o.signal(RecordType::BeginSegment).unwrap();
        o.byte(RecordType::Ordinal, 0).unwrap();
        o.data(RecordType::Name, b"CODE").unwrap();
        o.signal(RecordType::Public).unwrap();
        o.byte(RecordType::P2Align, 4).unwrap();
        o.signal(RecordType::EndSegment).unwrap();
        o.byte(RecordType::OpenSegment, 0).unwrap();
        o.word(RecordType::Org, 0x100).unwrap();
        o.data(RecordType::Code, &[0xB4, 0x09]).unwrap();
        o.word(RecordType::Dw, 0x1234).unwrap();
        o.dword(RecordType::Dd, 0xDEAD_BEEF).unwrap();
        o.qword(RecordType::Dq, 0x0102_0304_0506_0708).unwrap();
        o.byte(RecordType::CloseSegment, 0).unwrap();
        o
    }

    #[test]
    fn round_trip_records() {
        let ofile = sample();
        let mut buf = Vec::new();
        ofile.write(&mut buf).unwrap();
        assert_eq!(&buf[..4], &SIGNATURE);
        assert_eq!(&buf[4..6], &VERSION);
        let back = ObjectFile::read(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(back, ofile);

        // a second serialisation is byte-identical
        let mut buf2 = Vec::new();
        back.write(&mut buf2).unwrap();
        assert_eq!(buf, buf2);
    }

    #[test]
    fn numeric_payloads_are_little_endian() {
        let mut o = ObjectFile::new();
        o.word(RecordType::Pos, 0x0102).unwrap();
        let mut buf = Vec::new();
        o.write(&mut buf).unwrap();
        assert_eq!(&buf[6..], &[u8::from(RecordType::Pos), 0x02, 0x01]);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mut o = ObjectFile::new();
        assert!(o.byte(RecordType::Pos, 1).is_err());
        assert!(o.word(RecordType::Public, 1).is_err());
        assert!(o.signal(RecordType::Name).is_err());
    }

    #[test]
    fn oversize_data_is_rejected() {
        let mut o = ObjectFile::new();
        assert!(o.data(RecordType::Ds, &[0u8; 256]).is_err());
        assert!(o.data(RecordType::Ds, &[0u8; 255]).is_ok());
    }

    #[test]
    fn long_span_is_split() {
        let mut o = ObjectFile::new();
        emit_data_span(&mut o, RecordType::Ds, &[7u8; 300]).unwrap();
        assert_eq!(o.len(), 2);
        assert_eq!(o.record(0).data().unwrap().len(), 255);
        assert_eq!(o.record(1).data().unwrap().len(), 45);
    }

    #[test]
    fn bad_signature_is_rejected() {
        let bytes = [0x43, 0xD0, 0xAB, 0x20, 0x00, 0x00];
        assert!(ObjectFile::read(&mut Cursor::new(&bytes)).is_err());
    }

    #[test]
    fn bad_version_is_rejected() {
        let bytes = [0x43, 0xD0, 0xAB, 0x1F, 0x01, 0x00];
        assert!(ObjectFile::read(&mut Cursor::new(&bytes)).is_err());
    }

    #[test]
    fn truncated_record_is_rejected() {
        let mut full = Vec::new();
        let mut o = ObjectFile::new();
        o.word(RecordType::Pos, 0x1234).unwrap();
        o.write(&mut full).unwrap();
        let truncated = &full[..full.len() - 1];
        assert!(ObjectFile::read(&mut Cursor::new(truncated)).is_err());
    }

    #[test]
    fn dump_lines() {
        let mut o = ObjectFile::new();
        o.data(RecordType::Name, b"DGROUP").unwrap();
        o.signal(RecordType::Cased).unwrap();
        assert_eq!(
            o.record(0).dump_line(),
            "0b: NAME: 6: 44 47 52 4f 55 50: DGROUP"
        );
        assert_eq!(o.record(1).dump_line(), "2b: CASED");
    }
}
