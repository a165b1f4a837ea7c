//!
//! # Gdsio Byte-Encoding and Writing
//!

// Std-Lib Imports
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// Crates.io
use byteorder::{BigEndian, WriteBytesExt};
use log::debug;

// Local Imports
use crate::data::*;
use crate::error::{GdsError, GdsResult};

/// Modification & access dates written to every `BGNLIB` and `BGNSTR`.
/// Hierarchy data carries no dates, so all twelve fields are zero.
const BLANK_DATES: [i16; 12] = [0; 12];

/// # Gds Writing Helper
///
/// Writes the hierarchy-level content of a [GdsLibrary]:
/// its header records, structs, and cell references.
/// References are placed at the origin, as placement geometry is not retained.
pub struct GdsWriter<'wr> {
    /// Write Destination
    dest: Box<dyn Write + 'wr>,
}
impl<'wr> GdsWriter<'wr> {
    /// Create new [GdsWriter] with destination file `fname`
    pub fn open(fname: impl AsRef<Path>) -> GdsResult<Self> {
        let file = BufWriter::new(File::create(fname)?);
        Ok(Self::new(file))
    }
    /// Create a new [GdsWriter] to destination `dest`
    pub fn new(dest: impl Write + 'wr) -> Self {
        Self {
            dest: Box::new(dest),
        }
    }
    /// Write a [GdsLibrary] to the destination, in GDSII's required record order
    pub fn write_lib(&mut self, lib: &GdsLibrary) -> GdsResult<()> {
        self.write_records(&[
            GdsRecord::Header {
                version: lib.version,
            },
            GdsRecord::BgnLib {
                dates: BLANK_DATES.to_vec(),
            },
            GdsRecord::LibName(lib.name.clone()),
            GdsRecord::Units(lib.units.0, lib.units.1),
        ])?;
        for strukt in lib.structs.iter() {
            self.write_struct(strukt)?;
        }
        self.write_record(&GdsRecord::EndLib)?;
        self.dest.flush()?;
        debug!(
            "Wrote library {:?} with {} structs",
            lib.name,
            lib.structs.len()
        );
        Ok(())
    }
    /// Write [GdsStruct] `strukt` to the destination
    pub fn write_struct(&mut self, strukt: &GdsStruct) -> GdsResult<()> {
        self.write_records(&[
            GdsRecord::BgnStruct {
                dates: BLANK_DATES.to_vec(),
            },
            GdsRecord::StructName(strukt.name.clone()),
        ])?;
        for r in strukt.refs.iter() {
            self.write_ref(r)?;
        }
        self.write_record(&GdsRecord::EndStruct)
    }
    /// Write [GdsRef] `r` as an `SREF` or `AREF` element
    pub fn write_ref(&mut self, r: &GdsRef) -> GdsResult<()> {
        match r.kind {
            GdsRefKind::Single => self.write_records(&[
                GdsRecord::StructRef,
                GdsRecord::StructRefName(r.name.clone()),
                GdsRecord::Xy(vec![0, 0]),
            ])?,
            GdsRefKind::Array { cols, rows } => self.write_records(&[
                GdsRecord::ArrayRef,
                GdsRecord::StructRefName(r.name.clone()),
                GdsRecord::ColRow { cols, rows },
                GdsRecord::Xy(vec![0; 6]),
            ])?,
        };
        for prop in r.properties.iter() {
            self.write_record(&GdsRecord::PropAttr(prop.attr))?;
            self.write_record(&GdsRecord::PropValue(prop.value.clone()))?;
        }
        self.write_record(&GdsRecord::EndElement)
    }
    /// Helper to write a sequence of [GdsRecord]s
    fn write_records(&mut self, records: &[GdsRecord]) -> GdsResult<()> {
        for r in records {
            self.write_record(r)?;
        }
        Ok(())
    }
    /// Encode into bytes and write onto `dest`
    pub fn write_record(&mut self, record: &GdsRecord) -> GdsResult<()> {
        // GDS allows even-length strings only; odd ones get a padding byte
        let gds_strlen = |s: &str| -> usize { s.len() + s.len() % 2 };
        use GdsDataType::{NoData, Str, F64, I16, I32};
        let (rtype, dtype, len) = match record {
            GdsRecord::Header { .. } => (GdsRecordType::Header, I16, 2),
            GdsRecord::BgnLib { .. } => (GdsRecordType::BgnLib, I16, 24),
            GdsRecord::LibName(s) => (GdsRecordType::LibName, Str, gds_strlen(s)),
            GdsRecord::Units(_, _) => (GdsRecordType::Units, F64, 16),
            GdsRecord::EndLib => (GdsRecordType::EndLib, NoData, 0),
            GdsRecord::BgnStruct { .. } => (GdsRecordType::BgnStruct, I16, 24),
            GdsRecord::StructName(s) => (GdsRecordType::StructName, Str, gds_strlen(s)),
            GdsRecord::EndStruct => (GdsRecordType::EndStruct, NoData, 0),
            GdsRecord::Boundary => (GdsRecordType::Boundary, NoData, 0),
            GdsRecord::Path => (GdsRecordType::Path, NoData, 0),
            GdsRecord::StructRef => (GdsRecordType::StructRef, NoData, 0),
            GdsRecord::ArrayRef => (GdsRecordType::ArrayRef, NoData, 0),
            GdsRecord::Text => (GdsRecordType::Text, NoData, 0),
            GdsRecord::Node => (GdsRecordType::Node, NoData, 0),
            GdsRecord::Box => (GdsRecordType::Box, NoData, 0),
            GdsRecord::StructRefName(s) => (GdsRecordType::StructRefName, Str, gds_strlen(s)),
            GdsRecord::ColRow { .. } => (GdsRecordType::ColRow, I16, 4),
            GdsRecord::Xy(d) => (GdsRecordType::Xy, I32, 4 * d.len()),
            GdsRecord::PropAttr(_) => (GdsRecordType::PropAttr, I16, 2),
            GdsRecord::PropValue(s) => (GdsRecordType::PropValue, Str, gds_strlen(s)),
            GdsRecord::EndElement => (GdsRecordType::EndElement, NoData, 0),
            GdsRecord::Skipped(rtype) => {
                return Err(GdsError::Str(format!(
                    "Cannot encode skipped {:?} record",
                    rtype
                )))
            }
        };
        // Header bytes. Total length includes the four header bytes.
        match u16::try_from(len + 4) {
            Ok(val) => self.dest.write_u16::<BigEndian>(val)?,
            Err(_) => return Err(GdsError::RecordLen(len)),
        };
        self.dest.write_u8(rtype as u8)?;
        self.dest.write_u8(dtype as u8)?;

        // Data portion, organized by data-type
        match record {
            GdsRecord::EndLib
            | GdsRecord::EndStruct
            | GdsRecord::Boundary
            | GdsRecord::Path
            | GdsRecord::StructRef
            | GdsRecord::ArrayRef
            | GdsRecord::Text
            | GdsRecord::Node
            | GdsRecord::Box
            | GdsRecord::EndElement
            | GdsRecord::Skipped(_) => (),

            GdsRecord::Header { version: d } | GdsRecord::PropAttr(d) => {
                self.dest.write_i16::<BigEndian>(*d)?
            }
            GdsRecord::Units(d0, d1) => {
                self.dest.write_u64::<BigEndian>(GdsFloat64::encode(*d0))?;
                self.dest.write_u64::<BigEndian>(GdsFloat64::encode(*d1))?;
            }
            GdsRecord::ColRow { cols, rows } => {
                self.dest.write_i16::<BigEndian>(*cols)?;
                self.dest.write_i16::<BigEndian>(*rows)?;
            }
            GdsRecord::BgnLib { dates: d } | GdsRecord::BgnStruct { dates: d } => {
                for val in d.iter() {
                    self.dest.write_i16::<BigEndian>(*val)?;
                }
            }
            GdsRecord::Xy(d) => {
                for val in d.iter() {
                    self.dest.write_i32::<BigEndian>(*val)?;
                }
            }
            GdsRecord::LibName(s)
            | GdsRecord::StructName(s)
            | GdsRecord::StructRefName(s)
            | GdsRecord::PropValue(s) => {
                self.dest.write_all(s.as_bytes())?;
                if s.len() % 2 != 0 {
                    self.dest.write_u8(0x00)?;
                }
            }
        };
        Ok(())
    }
}
