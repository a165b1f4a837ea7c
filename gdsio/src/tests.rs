use crate::*;

/// Sample library: `top` instantiates `mid` twice (once as an array) and `mid` instantiates `leaf`
fn sample_lib() -> GdsLibrary {
    let mut lib = GdsLibrary::new("sample");
    let mut top = GdsStruct::new("top");
    top.refs.push(GdsRef::new("mid").with_property(INST_NAME_ATTR, "xmid"));
    top.refs.push(GdsRef::array("mid", 4, 2));
    let mut mid = GdsStruct::new("mid");
    mid.refs.push(GdsRef::new("leaf"));
    lib.structs.push(top);
    lib.structs.push(mid);
    lib.structs.push(GdsStruct::new("leaf"));
    lib
}

/// Encode `records` into bytes via a [GdsWriter]
fn encode(records: &[GdsRecord]) -> GdsResult<Vec<u8>> {
    let mut bytes = Vec::new();
    {
        let mut wr = GdsWriter::new(&mut bytes);
        for r in records {
            wr.write_record(r)?;
        }
    }
    Ok(bytes)
}

/// Hand-encode a record that [GdsRecord] does not model, e.g. geometry
fn raw_record(rtype: GdsRecordType, dtype: GdsDataType, data: &[u8]) -> Vec<u8> {
    let len = (data.len() + 4) as u16;
    let mut rv = len.to_be_bytes().to_vec();
    rv.push(rtype as u8);
    rv.push(dtype as u8);
    rv.extend_from_slice(data);
    rv
}

/// Library-level opening records
fn lib_header() -> Vec<GdsRecord> {
    vec![
        GdsRecord::Header { version: 600 },
        GdsRecord::BgnLib {
            dates: vec![0; 12],
        },
        GdsRecord::LibName("hand".into()),
        GdsRecord::Units(1e-3, 1e-9),
    ]
}

#[test]
fn floats() {
    // Conversions between IEEE and GDSII floating-point formats
    assert_eq!(GdsFloat64::encode(0.0), 0);
    assert_eq!(GdsFloat64::decode(0), 0.0);
    for val in [1.0, 1e-3, 1e-9, -0.69, 1e-11] {
        assert_eq!(GdsFloat64::decode(GdsFloat64::encode(val)), val);
    }
    // Sign lives in the most-significant bit
    assert_eq!(GdsFloat64::encode(-1.0) >> 63, 1);
}
#[test]
fn it_round_trips() -> GdsResult<()> {
    roundtrip(&sample_lib())
}
#[test]
fn it_saves_and_opens() -> GdsResult<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("sample.gds");
    let lib = sample_lib();
    lib.save(&path)?;
    let lib2 = GdsLibrary::open(&path)?;
    assert_eq!(lib2.name, "sample");
    assert_eq!(lib2.version, 3);
    assert_eq!(lib2.units, GdsUnits::default());
    assert_eq!(lib2.structs, lib.structs);
    Ok(())
}
#[test]
fn stats() {
    let stats = sample_lib().stats();
    assert_eq!(
        stats,
        GdsStats {
            structs: 3,
            struct_refs: 2,
            array_refs: 1,
            other_elems: 0,
        }
    );
}
#[test]
fn it_finds_structs_and_names() {
    let lib = sample_lib();
    let top = lib.get("top").unwrap();
    assert_eq!(top.refs[0].inst_name(), Some("xmid"));
    assert_eq!(top.refs[1].inst_name(), None);
    assert_eq!(top.refs[1].kind, GdsRefKind::Array { cols: 4, rows: 2 });
    assert!(lib.get("nope").is_none());
    // Empty instance-name properties don't count
    let r = GdsRef::new("x").with_property(INST_NAME_ATTR, "");
    assert_eq!(r.inst_name(), None);
    assert_eq!(r.property(INST_NAME_ATTR), Some(""));
}
#[test]
fn it_skips_geometry() -> GdsResult<()> {
    use GdsDataType::{BitArray, NoData, I16, I32};
    let mut bytes = encode(&lib_header())?;
    bytes.extend(encode(&[
        GdsRecord::BgnStruct {
            dates: vec![0; 12],
        },
        GdsRecord::StructName("cell".into()),
        GdsRecord::Boundary,
    ])?);
    // Boundary content: LAYER, DATATYPE, XY, and a property
    bytes.extend(raw_record(GdsRecordType::Layer, I16, &[0, 5]));
    bytes.extend(raw_record(GdsRecordType::DataType, I16, &[0, 0]));
    bytes.extend(raw_record(GdsRecordType::Xy, I32, &[0; 40]));
    bytes.extend(encode(&[
        GdsRecord::PropAttr(1),
        GdsRecord::PropValue("poly".into()),
        GdsRecord::EndElement,
        GdsRecord::StructRef,
    ])?);
    // Reference with ELFLAGS and STRANS ahead of its SNAME
    bytes.extend(raw_record(GdsRecordType::ElemFlags, BitArray, &[0, 0]));
    bytes.extend(encode(&[GdsRecord::StructRefName("sub".into())])?);
    bytes.extend(raw_record(GdsRecordType::Strans, BitArray, &[0x80, 0]));
    bytes.extend(raw_record(GdsRecordType::Angle, GdsDataType::F64, &[0; 8]));
    bytes.extend(encode(&[
        GdsRecord::Xy(vec![10, 20]),
        GdsRecord::EndElement,
        GdsRecord::Text,
    ])?);
    bytes.extend(raw_record(GdsRecordType::Layer, I16, &[0, 1]));
    bytes.extend(raw_record(GdsRecordType::String, GdsDataType::Str, b"label\0"));
    bytes.extend(encode(&[GdsRecord::EndElement, GdsRecord::EndStruct])?);
    bytes.extend(raw_record(GdsRecordType::EndLib, NoData, &[]));

    let lib = GdsLibrary::from_bytes(&bytes)?;
    assert_eq!(lib.name, "hand");
    assert_eq!(lib.version, 600);
    assert_eq!(lib.structs.len(), 1);
    let cell = &lib.structs[0];
    assert_eq!(cell.name, "cell");
    assert_eq!(cell.refs, vec![GdsRef::new("sub")]);
    assert_eq!(cell.other_elems, 2);
    assert_eq!(lib.stats().other_elems, 2);
    Ok(())
}
#[test]
fn it_ignores_lib_header_extras() -> GdsResult<()> {
    let mut bytes = encode(&lib_header()[..2])?;
    bytes.extend(raw_record(GdsRecordType::Generations, GdsDataType::I16, &[0, 3]));
    bytes.extend(encode(&lib_header()[2..])?);
    bytes.extend(encode(&[GdsRecord::EndLib])?);
    let lib = GdsLibrary::from_bytes(&bytes)?;
    assert_eq!(lib.name, "hand");
    assert!(lib.structs.is_empty());
    Ok(())
}
#[test]
fn it_rejects_bad_record_length() {
    let bytes = [0x00, 0x03, 0x00, 0x02];
    let err = GdsLibrary::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, GdsError::RecordLen(3)), "{:?}", err);
}
#[test]
fn it_rejects_invalid_record_types() {
    // `SPACING` is a discontinued record type
    let bytes = raw_record(GdsRecordType::Spacing, GdsDataType::I16, &[0, 0]);
    let err = GdsLibrary::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, GdsError::InvalidRecordType(0x18)), "{:?}", err);
    // Record type numbers past the end of the list
    let bytes = [0x00, 0x04, 0xFF, 0x00];
    let err = GdsLibrary::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, GdsError::InvalidRecordType(0xFF)), "{:?}", err);
}
#[test]
fn it_rejects_mistyped_records() {
    // A HEADER with string-typed content
    let bytes = raw_record(GdsRecordType::Header, GdsDataType::Str, b"ab");
    let err = GdsLibrary::from_bytes(&bytes).unwrap_err();
    assert!(
        matches!(
            err,
            GdsError::RecordDecode(GdsRecordType::Header, GdsDataType::Str, 2)
        ),
        "{:?}",
        err
    );
}
#[test]
fn it_fails_on_truncated_streams() -> GdsResult<()> {
    let mut bytes = Vec::new();
    sample_lib().write(&mut bytes)?;
    bytes.truncate(bytes.len() - 10);
    let err = GdsLibrary::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, GdsError::Io(_)), "{:?}", err);
    Ok(())
}
#[test]
fn it_requires_a_header() -> GdsResult<()> {
    let bytes = encode(&[GdsRecord::LibName("x".into()), GdsRecord::EndLib])?;
    let err = GdsLibrary::from_bytes(&bytes).unwrap_err();
    match err {
        GdsError::Parse { msg, ctx, .. } => {
            assert!(msg.contains("HEADER"));
            assert_eq!(ctx, vec![GdsContext::Library]);
        }
        _ => panic!("Unexpected error {:?}", err),
    }
    Ok(())
}
#[test]
fn it_requires_ref_names() -> GdsResult<()> {
    let mut records = lib_header();
    records.extend([
        GdsRecord::BgnStruct {
            dates: vec![0; 12],
        },
        GdsRecord::StructName("cell".into()),
        GdsRecord::StructRef,
        GdsRecord::Xy(vec![0, 0]),
        GdsRecord::EndElement,
        GdsRecord::EndStruct,
        GdsRecord::EndLib,
    ]);
    let bytes = encode(&records)?;
    let err = GdsLibrary::from_bytes(&bytes).unwrap_err();
    match err {
        GdsError::Parse { msg, ctx, .. } => {
            assert!(msg.contains("SNAME"));
            assert_eq!(
                ctx,
                vec![
                    GdsContext::Library,
                    GdsContext::Struct,
                    GdsContext::StructRef
                ]
            );
        }
        _ => panic!("Unexpected error {:?}", err),
    }
    Ok(())
}
#[test]
fn it_rejects_unterminated_structs() -> GdsResult<()> {
    let mut records = lib_header();
    records.extend([
        GdsRecord::BgnStruct {
            dates: vec![0; 12],
        },
        GdsRecord::StructName("cell".into()),
        GdsRecord::EndLib,
    ]);
    let bytes = encode(&records)?;
    let err = GdsLibrary::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, GdsError::Parse { .. }), "{:?}", err);
    Ok(())
}
#[test]
fn it_cannot_encode_skipped_records() {
    let err = encode(&[GdsRecord::Skipped(GdsRecordType::Layer)]).unwrap_err();
    assert!(matches!(err, GdsError::Str(_)), "{:?}", err);
}
#[test]
fn records_serialize() {
    // Records are serde-serializable, e.g. for dumping to JSON
    let json = serde_json::to_string(&GdsRecord::StructRefName("leaf".into())).unwrap();
    assert_eq!(json, r#"{"StructRefName":"leaf"}"#);
}
