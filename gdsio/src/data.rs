//!
//! # Gdsio Data Model
//!

// Std-Lib Imports
use std::io::Write;
use std::ops::{Add, AddAssign};
use std::path::Path;

// Crates.io
use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};

// Local Imports
use crate::error::GdsResult;
use crate::read::GdsParser;
use crate::write::GdsWriter;

/// Property attribute number under which stream-out flows record instance names.
pub const INST_NAME_ATTR: i16 = 61;

///
/// # Gds Record Types
///
/// In the numeric-order specified by GDSII, for automatic [FromPrimitive] conversions.
///
#[derive(FromPrimitive, Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum GdsRecordType {
    Header = 0x00,
    BgnLib,
    LibName,
    Units,
    EndLib,
    BgnStruct,
    StructName, // STRNAME
    EndStruct,
    Boundary,
    Path,
    StructRef,
    ArrayRef,
    Text,
    Layer,
    DataType,
    Width,
    Xy,
    EndElement,
    StructRefName, // SNAME
    ColRow,
    TextNode, // "Not currently used"
    Node,
    TextType,
    Presentation,
    Spacing, // "Discontinued"
    String,
    Strans,
    Mag,
    Angle,
    Uinteger, // "No longer used"
    Ustring,  // "No longer used"
    RefLibs,
    Fonts,
    PathType,
    Generations,
    AttrTable,
    StypTable, // "Unreleased Feature"
    StrType,   // "Unreleased Feature"
    ElemFlags,
    ElemKey,  // "Unreleased Feature"
    LinkType, // "Unreleased Feature"
    LinkKeys, // "Unreleased Feature"
    Nodetype,
    PropAttr,
    PropValue,
    Box,
    BoxType,
    Plex,
    BeginExtn, // "Only occurs in CustomPlus"
    EndExtn,   // "Only occurs in CustomPlus"
    TapeNum,
    TapeCode,
    StrClass, // "Only for Calma internal use"
    Reserved, // "Reserved for future use"
    Format,
    Mask,
    EndMasks,
    LibDirSize,
    SrfName,
    LibSecur,
}
impl GdsRecordType {
    /// Boolean indication of valid record types.
    /// Deprecated and never-released types are all deemed invalid.
    pub fn valid(&self) -> bool {
        !matches!(
            self,
            Self::TextNode
                | Self::Spacing
                | Self::Uinteger
                | Self::Ustring
                | Self::StypTable
                | Self::StrType
                | Self::ElemKey
                | Self::LinkType
                | Self::LinkKeys
                | Self::StrClass
                | Self::Reserved
        )
    }
    /// Boolean indication of record types which may appear between a library's `BGNLIB` and its first struct,
    /// but carry nothing of hierarchical interest.
    pub fn is_lib_header_extra(&self) -> bool {
        matches!(
            self,
            Self::LibDirSize
                | Self::SrfName
                | Self::LibSecur
                | Self::RefLibs
                | Self::Fonts
                | Self::AttrTable
                | Self::Generations
                | Self::Format
                | Self::Mask
                | Self::EndMasks
        )
    }
}

/// # Gds DataType Enumeration
/// In order as decoded from 16-bit integers in binary data
#[derive(FromPrimitive, Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum GdsDataType {
    NoData = 0,
    BitArray = 1,
    I16 = 2,
    I32 = 3,
    F32 = 4,
    F64 = 5,
    Str = 6,
}

/// # Gds Record Header
/// Decoded contents of a record's four header bytes,
/// including its record-type, data-type, and length in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GdsRecordHeader {
    pub rtype: GdsRecordType,
    pub dtype: GdsDataType,
    /// Content length, *excluding* the four header bytes
    pub len: u16,
}

///
/// # Gds Record Enumeration
///
/// Decoded records which matter to a library's hierarchy,
/// plus the [GdsRecord::Skipped] variant for any other valid record,
/// whose content is consumed but never decoded.
///
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum GdsRecord {
    Header { version: i16 },
    BgnLib { dates: Vec<i16> },
    LibName(String),
    Units(f64, f64),
    EndLib,
    BgnStruct { dates: Vec<i16> },
    StructName(String),
    EndStruct,
    Boundary,
    Path,
    StructRef,
    ArrayRef,
    Text,
    Node,
    Box,
    StructRefName(String),
    ColRow { cols: i16, rows: i16 },
    Xy(Vec<i32>),
    PropAttr(i16),
    PropValue(String),
    EndElement,
    Skipped(GdsRecordType),
}

/// # Gds Floating Point
/// ## GDSII's Home-Grown Floating-Point Format
///
/// GDSII predates IEEE754, and stores its reals as an excess-64, base-16 exponent and a 56-bit mantissa.
///
/// The [GdsFloat64] struct is not used as a data-store, but largely a namespace
/// for the `encode` and `decode` operations to and from IEEE754 double-precision format.
///
pub struct GdsFloat64;
impl GdsFloat64 {
    /// Decode GDSII's eight-byte representation, stored as a `u64`, to `f64`
    pub fn decode(val: u64) -> f64 {
        let neg = (val & 0x8000_0000_0000_0000) != 0;
        let exp: i32 = ((val & 0x7F00_0000_0000_0000) >> 56) as i32 - 64;
        // Mantissa occupies the low seven bytes, normalized to the range (1/16, 1)
        let mantissa = (val & 0x00FF_FFFF_FFFF_FFFF) as f64 / 2f64.powi(56);
        let magnitude = mantissa * 16f64.powi(exp);
        if neg {
            -magnitude
        } else {
            magnitude
        }
    }
    /// Encode `f64` to GDSII's eight bytes, stored as `u64`.
    pub fn encode(val: f64) -> u64 {
        if val == 0.0 {
            return 0;
        }
        let (sign, val) = if val < 0.0 { (0x80u8, -val) } else { (0u8, val) };
        let fexp = 0.25 * val.log2();
        let mut exponent = fexp.ceil() as i32;
        if fexp == fexp.ceil() {
            exponent += 1;
        }
        let mantissa = (val * 16_f64.powi(14 - exponent)).round() as u64;
        let top = sign | (64 + exponent) as u8;
        ((top as u64) << 56) | (mantissa & 0x00FF_FFFF_FFFF_FFFF)
    }
}

/// # Gds Units
///
/// The two reals of a library's `UNITS` record:
/// the size of a database-unit in user-units, and the size of a database-unit in meters.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct GdsUnits(pub f64, pub f64);
impl Default for GdsUnits {
    /// Default values for GDS Units:
    /// * DB-Unit = 1nm
    /// * User-Unit = 1µm (1000x the DB-Unit)
    fn default() -> Self {
        Self(1e-3, 1e-9)
    }
}

/// # Gds Property
/// GDSII BNF:
/// ```text
/// PROPATTR PROPVALUE
/// ```
#[derive(Default, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GdsProperty {
    /// Attribute Number
    pub attr: i16,
    /// Attribute Value
    pub value: String,
}

/// # Gds Reference Kinds
/// Single placements (`SREF`) and two-dimensional arrays (`AREF`).
#[derive(Default, Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum GdsRefKind {
    #[default]
    Single,
    Array {
        cols: i16,
        rows: i16,
    },
}

///
/// # Gds Cell Reference
///
/// One placement of a cell inside another, whether a single instance or an array.
/// Placement geometry is not retained.
///
/// GDSII BNF:
/// ```text
/// SREF [ELFLAGS] [PLEX] SNAME [<strans>] XY
/// AREF [ELFLAGS] [PLEX] SNAME [<strans>] COLROW XY
/// ```
///
#[derive(Default, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GdsRef {
    /// Referenced Struct (Cell) Name
    pub name: String,
    /// Single or Array
    #[serde(default)]
    pub kind: GdsRefKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<GdsProperty>,
}
impl GdsRef {
    /// Create a single-instance reference to cell `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Create an array reference to cell `name`
    pub fn array(name: impl Into<String>, cols: i16, rows: i16) -> Self {
        Self {
            name: name.into(),
            kind: GdsRefKind::Array { cols, rows },
            properties: Vec::new(),
        }
    }
    /// Builder-style property addition
    pub fn with_property(mut self, attr: i16, value: impl Into<String>) -> Self {
        self.properties.push(GdsProperty {
            attr,
            value: value.into(),
        });
        self
    }
    /// Get the value of the first property numbered `attr`, if any
    pub fn property(&self, attr: i16) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.attr == attr)
            .map(|p| p.value.as_str())
    }
    /// Get our instance name, if one is attached as a non-empty [INST_NAME_ATTR] property
    pub fn inst_name(&self) -> Option<&str> {
        self.property(INST_NAME_ATTR).filter(|s| !s.is_empty())
    }
}

/// # Gds Summary Stats
///
/// Summary statistics for a [GdsLibrary] or [GdsStruct].
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct GdsStats {
    pub structs: usize,
    pub struct_refs: usize,
    pub array_refs: usize,
    /// Geometric and text elements, skipped on read
    pub other_elems: usize,
}
impl Add for GdsStats {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            structs: self.structs + rhs.structs,
            struct_refs: self.struct_refs + rhs.struct_refs,
            array_refs: self.array_refs + rhs.array_refs,
            other_elems: self.other_elems + rhs.other_elems,
        }
    }
}
impl AddAssign for GdsStats {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

///
/// # Gds Struct (Cell) Definition
///
/// GDSII BNF:
/// ```text
/// BGNSTR STRNAME [STRCLASS] {<element>}* ENDSTR
/// ```
///
#[derive(Default, Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GdsStruct {
    /// Struct Name
    pub name: String,
    /// Cell References, in stream order
    pub refs: Vec<GdsRef>,
    /// Number of non-reference elements
    #[serde(default)]
    pub other_elems: usize,
}
impl GdsStruct {
    /// Create a new and empty [GdsStruct]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
    /// Count and return our element statistics
    pub fn stats(&self) -> GdsStats {
        let arrays = self
            .refs
            .iter()
            .filter(|r| matches!(r.kind, GdsRefKind::Array { .. }))
            .count();
        GdsStats {
            structs: 1,
            struct_refs: self.refs.len() - arrays,
            array_refs: arrays,
            other_elems: self.other_elems,
        }
    }
}

///
/// # Gds Library
///
/// The Library is GDSII's primary idiom for a suite of layout-cells.
/// A Library generally corresponds one-to-one with a `.gds` file.
///
/// GDSII BNF:
/// ```text
/// HEADER BGNLIB [LIBDIRSIZE] [SRFNAME] [LIBSECUR] LIBNAME [REFLIBS] [FONTS] [ATTRTABLE] [GENERATIONS] [<FormatType>]
/// UNITS {<structure>}* ENDLIB
/// ```
///
#[derive(Default, Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GdsLibrary {
    /// Library Name
    pub name: String,
    /// GDSII Stream Version
    pub version: i16,
    /// Spatial Units
    pub units: GdsUnits,
    /// Struct Definitions, in stream order
    pub structs: Vec<GdsStruct>,
}
impl GdsLibrary {
    /// Create a new and empty [GdsLibrary]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 3,
            ..Default::default()
        }
    }
    /// Read a GDS loaded from file at path `fname`
    pub fn open(fname: impl AsRef<Path>) -> GdsResult<GdsLibrary> {
        GdsParser::open(fname)?.parse_lib()
    }
    /// Read a [GdsLibrary] from byte-slice `bytes`
    pub fn from_bytes(bytes: &[u8]) -> GdsResult<GdsLibrary> {
        GdsParser::from_bytes(bytes)?.parse_lib()
    }
    /// Get the struct named `name`, if defined
    pub fn get(&self, name: &str) -> Option<&GdsStruct> {
        self.structs.iter().find(|s| s.name == name)
    }
    /// Collect and return the library's aggregate statistics
    pub fn stats(&self) -> GdsStats {
        let mut stats = GdsStats::default();
        for strukt in self.structs.iter() {
            stats += strukt.stats();
        }
        stats
    }
    /// Save to file `fname`
    pub fn save(&self, fname: impl AsRef<Path>) -> GdsResult<()> {
        let mut wr = GdsWriter::open(fname)?;
        wr.write_lib(self)
    }
    /// Write to destination `dest`
    pub fn write(&self, dest: impl Write) -> GdsResult<()> {
        let mut wr = GdsWriter::new(dest);
        wr.write_lib(self)
    }
}

#[cfg(any(test, feature = "selftest"))]
/// Check `lib` matches across a write-read round-trip cycle
pub fn roundtrip(lib: &GdsLibrary) -> GdsResult<()> {
    use std::io::{Read, Seek, SeekFrom};
    use tempfile::tempfile;

    // Write to a temporary file
    let mut file = tempfile()?;
    lib.write(&mut file)?;

    // Rewind to the file-start, and read it back
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    let lib2 = GdsLibrary::from_bytes(&bytes)?;

    // And check the two line up
    assert_eq!(*lib, lib2);
    Ok(())
}
