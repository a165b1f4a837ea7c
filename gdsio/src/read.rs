//!
//! # Gdsio Reading & Parsing
//!

// Std-Lib Imports
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::mem;
use std::path::Path;

// Crates.io
use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, trace};
use num_traits::FromPrimitive;

// Local Imports
use crate::data::*;
use crate::error::{GdsContext, GdsError, GdsResult};

///
/// # GdsReader
///
/// Decodes binary [GdsRecord]s from any [Read] source, typically a buffered [File].
/// Tracks its byte-position for error reporting.
///
pub struct GdsReader<R: Read> {
    /// Data source
    src: R,
    /// Bytes consumed so far
    pos: u64,
}
impl GdsReader<BufReader<File>> {
    /// Create a [GdsReader], opening [File] at path `fname`
    pub fn open(fname: impl AsRef<Path>) -> GdsResult<Self> {
        let file = File::open(fname)?;
        Ok(Self::new(BufReader::new(file)))
    }
}
impl<R: Read> GdsReader<R> {
    /// Create a [GdsReader] of `src`
    pub fn new(src: R) -> Self {
        Self { src, pos: 0 }
    }
    /// Read the next record-header.
    fn read_record_header(&mut self) -> GdsResult<GdsRecordHeader> {
        // The 16-bit record-size, in bytes, includes the four header bytes
        let len = self.src.read_u16::<BigEndian>()?;
        if len < 4 || len % 2 != 0 {
            return Err(GdsError::RecordLen(len.into()));
        }
        let rtype = self.src.read_u8()?;
        let dtype = self.src.read_u8()?;
        self.pos += 4;

        let rtype: GdsRecordType =
            FromPrimitive::from_u8(rtype).ok_or(GdsError::InvalidRecordType(rtype))?;
        if !rtype.valid() {
            return Err(GdsError::InvalidRecordType(rtype as u8));
        }
        let dtype: GdsDataType =
            FromPrimitive::from_u8(dtype).ok_or(GdsError::InvalidDataType(dtype))?;
        Ok(GdsRecordHeader {
            rtype,
            dtype,
            len: len - 4,
        })
    }
    /// Read the next binary-encoded [GdsRecord].
    pub fn read_record(&mut self) -> GdsResult<GdsRecord> {
        let header = self.read_record_header()?;
        self.read_record_content(&header)
    }
    /// Decode the content following `header`.
    /// Records outside the hierarchy-relevant set are consumed and returned as [GdsRecord::Skipped].
    fn read_record_content(&mut self, header: &GdsRecordHeader) -> GdsResult<GdsRecord> {
        use GdsDataType::{NoData, Str, F64, I16};
        let len = header.len;
        let record = match (header.rtype, header.dtype, len) {
            // Library-Level Records
            (GdsRecordType::Header, I16, 2) => GdsRecord::Header {
                version: self.read_i16(len)?[0],
            },
            (GdsRecordType::BgnLib, I16, 24) => GdsRecord::BgnLib {
                dates: self.read_i16(len)?,
            },
            (GdsRecordType::LibName, Str, _) => GdsRecord::LibName(self.read_str(len)?),
            (GdsRecordType::Units, F64, 16) => {
                let v = self.read_f64(len)?;
                GdsRecord::Units(v[0], v[1])
            }
            (GdsRecordType::EndLib, NoData, 0) => GdsRecord::EndLib,

            // Structure (Cell) Level Records
            (GdsRecordType::BgnStruct, I16, 24) => GdsRecord::BgnStruct {
                dates: self.read_i16(len)?,
            },
            (GdsRecordType::StructName, Str, _) => GdsRecord::StructName(self.read_str(len)?),
            (GdsRecordType::EndStruct, NoData, 0) => GdsRecord::EndStruct,

            // Element-Level Records
            (GdsRecordType::Boundary, NoData, 0) => GdsRecord::Boundary,
            (GdsRecordType::Path, NoData, 0) => GdsRecord::Path,
            (GdsRecordType::StructRef, NoData, 0) => GdsRecord::StructRef,
            (GdsRecordType::ArrayRef, NoData, 0) => GdsRecord::ArrayRef,
            (GdsRecordType::Text, NoData, 0) => GdsRecord::Text,
            (GdsRecordType::Node, NoData, 0) => GdsRecord::Node,
            (GdsRecordType::Box, NoData, 0) => GdsRecord::Box,
            (GdsRecordType::EndElement, NoData, 0) => GdsRecord::EndElement,
            (GdsRecordType::StructRefName, Str, _) => {
                GdsRecord::StructRefName(self.read_str(len)?)
            }
            (GdsRecordType::ColRow, I16, 4) => {
                let d = self.read_i16(len)?;
                GdsRecord::ColRow {
                    cols: d[0],
                    rows: d[1],
                }
            }
            (GdsRecordType::PropAttr, I16, 2) => GdsRecord::PropAttr(self.read_i16(len)?[0]),
            (GdsRecordType::PropValue, Str, _) => GdsRecord::PropValue(self.read_str(len)?),

            // Any of the above with a mismatched data-type or length is invalid
            (
                GdsRecordType::Header
                | GdsRecordType::BgnLib
                | GdsRecordType::LibName
                | GdsRecordType::Units
                | GdsRecordType::EndLib
                | GdsRecordType::BgnStruct
                | GdsRecordType::StructName
                | GdsRecordType::EndStruct
                | GdsRecordType::Boundary
                | GdsRecordType::Path
                | GdsRecordType::StructRef
                | GdsRecordType::ArrayRef
                | GdsRecordType::Text
                | GdsRecordType::Node
                | GdsRecordType::Box
                | GdsRecordType::EndElement
                | GdsRecordType::StructRefName
                | GdsRecordType::ColRow
                | GdsRecordType::PropAttr
                | GdsRecordType::PropValue,
                _,
                _,
            ) => return Err(GdsError::RecordDecode(header.rtype, header.dtype, len)),

            // Everything else: consume its content without decoding
            (rtype, _, _) => {
                self.skip(len)?;
                trace!("Skipped {:?} record of {} bytes", rtype, len);
                GdsRecord::Skipped(rtype)
            }
        };
        Ok(record)
    }
    /// Read `len` bytes into a new vector
    fn read_bytes(&mut self, len: u16) -> io::Result<Vec<u8>> {
        let mut rv = vec![0; len.into()];
        self.src.read_exact(&mut rv)?;
        self.pos += u64::from(len);
        Ok(rv)
    }
    /// Read `len` bytes and convert to `String`, stripping any NUL padding
    fn read_str(&mut self, len: u16) -> GdsResult<String> {
        let mut data = self.read_bytes(len)?;
        while data.last() == Some(&0x00) {
            data.pop();
        }
        Ok(std::str::from_utf8(&data)?.to_string())
    }
    /// Read `len/2` i16s from `len` bytes
    fn read_i16(&mut self, len: u16) -> io::Result<Vec<i16>> {
        let mut rv = vec![0; usize::from(len) / 2];
        self.src.read_i16_into::<BigEndian>(&mut rv)?;
        self.pos += u64::from(len);
        Ok(rv)
    }
    /// Read `len/8` f64s from `len` bytes, decoding GDS's float-format along the way
    fn read_f64(&mut self, len: u16) -> io::Result<Vec<f64>> {
        let mut u64s = vec![0; usize::from(len) / 8];
        self.src.read_u64_into::<BigEndian>(&mut u64s)?;
        self.pos += u64::from(len);
        Ok(u64s.into_iter().map(GdsFloat64::decode).collect())
    }
    /// Consume and discard `len` bytes
    fn skip(&mut self, len: u16) -> io::Result<()> {
        let skipped = io::copy(&mut (&mut self.src).take(len.into()), &mut io::sink())?;
        if skipped < u64::from(len) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "GDS record content ended early",
            ));
        }
        self.pos += skipped;
        Ok(())
    }
    /// Get the current byte position
    #[inline(always)]
    pub fn pos(&self) -> u64 {
        self.pos
    }
}

///
/// # GdsParser
///
/// A peekable iterator which loads [GdsRecord]s one at a time,
/// and assembles them into a [GdsLibrary] tree.
///
pub struct GdsParser<R: Read> {
    /// Record source
    rdr: GdsReader<R>,
    /// Next record, stored for peeking
    nxt: GdsRecord,
    /// Number of records read
    numread: usize,
    /// Context Stack
    ctx_stack: Vec<GdsContext>,
}
impl GdsParser<BufReader<File>> {
    /// Create a new [GdsParser] for the file at path `fname`
    pub fn open(fname: impl AsRef<Path>) -> GdsResult<Self> {
        let rdr = GdsReader::open(fname)?;
        Self::new(rdr)
    }
}
impl<'b> GdsParser<&'b [u8]> {
    /// Create a new [GdsParser] over in-memory `bytes`
    pub fn from_bytes(bytes: &'b [u8]) -> GdsResult<Self> {
        Self::new(GdsReader::new(bytes))
    }
}
impl<R: Read> GdsParser<R> {
    /// Create a new [GdsParser], decoding the first record to initialize our "peeker"
    pub fn new(mut rdr: GdsReader<R>) -> GdsResult<Self> {
        let nxt = rdr.read_record()?;
        Ok(Self {
            rdr,
            nxt,
            numread: 1,
            ctx_stack: Vec::new(),
        })
    }
    /// Advance our iterator and return the next element
    fn next(&mut self) -> GdsResult<GdsRecord> {
        if self.nxt == GdsRecord::EndLib {
            // Once we reach [EndLib], keep returning it forever
            return Ok(GdsRecord::EndLib);
        }
        let mut rv = self.rdr.read_record()?;
        mem::swap(&mut rv, &mut self.nxt);
        self.numread += 1;
        Ok(rv)
    }
    /// Peek at our next record, without advancing
    pub fn peek(&self) -> &GdsRecord {
        &self.nxt
    }
    /// Parse a [GdsLibrary]. Generally the start-state when reading a GDS file.
    pub fn parse_lib(&mut self) -> GdsResult<GdsLibrary> {
        self.ctx_stack.push(GdsContext::Library);
        let mut lib = GdsLibrary::default();
        lib.version = match self.next()? {
            GdsRecord::Header { version } => version,
            _ => return self.fail("Invalid library: missing GDS HEADER record"),
        };
        match self.next()? {
            GdsRecord::BgnLib { .. } => (),
            _ => return self.fail("Invalid library: missing GDS BGNLIB record"),
        };
        loop {
            let r = self.next()?;
            match r {
                GdsRecord::EndLib => break,
                GdsRecord::LibName(d) => lib.name = d,
                GdsRecord::Units(d0, d1) => lib.units = GdsUnits(d0, d1),
                GdsRecord::BgnStruct { .. } => {
                    let strukt = self.parse_struct()?;
                    lib.structs.push(strukt);
                }
                GdsRecord::Skipped(rtype) if rtype.is_lib_header_extra() => {
                    debug!("Ignoring library-level {:?} record", rtype);
                }
                _ => return self.invalid(r),
            };
        }
        self.ctx_stack.pop();
        debug!(
            "Parsed library {:?}: {} structs in {} records",
            lib.name,
            lib.structs.len(),
            self.numread
        );
        Ok(lib)
    }
    /// Parse a cell ([GdsStruct]).
    /// Starts *after* its [GdsRecord::BgnStruct] has been consumed.
    fn parse_struct(&mut self) -> GdsResult<GdsStruct> {
        self.ctx_stack.push(GdsContext::Struct);
        let mut strukt = match self.next()? {
            GdsRecord::StructName(d) => GdsStruct::new(d),
            _ => return self.fail("Missing Gds StructName"),
        };
        loop {
            let r = self.next()?;
            match r {
                GdsRecord::EndStruct => break,
                GdsRecord::StructRef => strukt.refs.push(self.parse_ref(GdsContext::StructRef)?),
                GdsRecord::ArrayRef => strukt.refs.push(self.parse_ref(GdsContext::ArrayRef)?),
                GdsRecord::Boundary
                | GdsRecord::Path
                | GdsRecord::Text
                | GdsRecord::Node
                | GdsRecord::Box => {
                    self.skip_element()?;
                    strukt.other_elems += 1;
                }
                _ => return self.invalid(r),
            };
        }
        self.ctx_stack.pop();
        trace!(
            "Parsed struct {:?} with {} references",
            strukt.name,
            strukt.refs.len()
        );
        Ok(strukt)
    }
    /// Parse a [GdsRef], from either an `SREF` or `AREF` element.
    /// Placement records (`XY`, `STRANS` and friends) are consumed and dropped.
    fn parse_ref(&mut self, ctx: GdsContext) -> GdsResult<GdsRef> {
        self.ctx_stack.push(ctx);
        let mut name: Option<String> = None;
        let mut kind = GdsRefKind::Single;
        let mut properties = Vec::new();
        loop {
            let r = self.next()?;
            match r {
                GdsRecord::EndElement => break,
                GdsRecord::StructRefName(d) => name = Some(d),
                GdsRecord::ColRow { cols, rows } if ctx == GdsContext::ArrayRef => {
                    kind = GdsRefKind::Array { cols, rows }
                }
                GdsRecord::PropAttr(attr) => properties.push(self.parse_property(attr)?),
                GdsRecord::Skipped(
                    GdsRecordType::Xy
                    | GdsRecordType::Strans
                    | GdsRecordType::Mag
                    | GdsRecordType::Angle
                    | GdsRecordType::ElemFlags
                    | GdsRecordType::Plex,
                ) => (),
                _ => return self.invalid(r),
            };
        }
        let name = match name {
            Some(name) => name,
            None => return self.fail("Cell reference without SNAME"),
        };
        if ctx == GdsContext::ArrayRef && kind == GdsRefKind::Single {
            return self.fail("Array reference without COLROW");
        }
        self.ctx_stack.pop();
        Ok(GdsRef {
            name,
            kind,
            properties,
        })
    }
    /// Consume a non-reference element, through its [GdsRecord::EndElement].
    fn skip_element(&mut self) -> GdsResult<()> {
        self.ctx_stack.push(GdsContext::Element);
        loop {
            let r = self.next()?;
            match r {
                GdsRecord::EndElement => break,
                GdsRecord::PropAttr(attr) => {
                    self.parse_property(attr)?;
                }
                GdsRecord::Skipped(_) => (),
                _ => return self.invalid(r),
            };
        }
        self.ctx_stack.pop();
        Ok(())
    }
    /// Parse a [GdsProperty].
    /// Numeric attribute `attr` is collected beforehand, as its record is the indication to parse an (attr, value) pair.
    fn parse_property(&mut self, attr: i16) -> GdsResult<GdsProperty> {
        self.ctx_stack.push(GdsContext::Property);
        // `PropAttr` records must *immediately* be followed by `PropValue`
        let value = match self.next()? {
            GdsRecord::PropValue(v) => v,
            _ => return self.fail("Gds Property without PropValue"),
        };
        self.ctx_stack.pop();
        Ok(GdsProperty { attr, value })
    }
    /// Error helper for an invalid record
    fn invalid<T>(&mut self, record: GdsRecord) -> GdsResult<T> {
        Err(GdsError::Parse {
            msg: "Invalid GDS Record".into(),
            record,
            recordnum: self.numread,
            bytepos: self.rdr.pos(),
            ctx: self.ctx_stack.clone(),
        })
    }
    /// Error helper. Create a Parse error
    fn err(&mut self, msg: impl Into<String>) -> GdsError {
        GdsError::Parse {
            msg: msg.into(),
            record: self.peek().clone(),
            recordnum: self.numread,
            bytepos: self.rdr.pos(),
            ctx: self.ctx_stack.clone(),
        }
    }
    /// Return failure
    fn fail<T>(&mut self, msg: impl Into<String>) -> GdsResult<T> {
        Err(self.err(msg))
    }
}
