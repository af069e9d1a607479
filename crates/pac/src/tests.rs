use super::*;
use proptest::prelude::*;
use std::fs;
use tempdir::TempDir;

fn sample_archive() -> Vec<u8> {
    let mut builder = Builder::new("COURSE01");
    builder
        .add("AEND_TEX_08", FileKind::Gim, vec![0x11; 20])
        .expect("failed to add texture");
    builder
        .add("CAR_BODY", FileKind::Smd, vec![0x22; 16])
        .expect("failed to add model");
    builder
        .add("SOUND", FileKind::Other(6), vec![0x33; 3])
        .expect("failed to add other entry");
    builder.finish().expect("failed to build archive")
}

#[test]
fn build_writes_header_table_and_aligned_payloads() {
    let bytes = sample_archive();

    assert_eq!(bytes[0..4], MAGIC);
    assert_eq!(LittleEndian::read_u32(&bytes[4..8]), 3);
    assert_eq!(LittleEndian::read_u32(&bytes[8..12]), 0);
    assert_eq!(LittleEndian::read_u32(&bytes[12..16]), 0x20);
    assert_eq!(&bytes[16..24], b"COURSE01");

    // header + 3 records, then 20 -> 32, 16 -> 16, 3 -> 16 bytes of payload
    assert_eq!(bytes.len(), 128 + 32 + 16 + 16);
    assert_eq!(bytes.len() % ALIGNMENT, 0);

    let archive = Archive::parse(bytes).expect("failed to parse built archive");
    let offsets: Vec<u32> = archive.entries().iter().map(|e| e.offset).collect();
    assert_eq!(offsets, vec![128, 160, 176]);
    assert!(offsets.iter().all(|&o| o as usize % ALIGNMENT == 0));
}

#[test]
fn parse_round_trips_entries() {
    let archive = Archive::parse(sample_archive()).expect("failed to parse archive");

    assert_eq!(archive.name(), "COURSE01");
    assert_eq!(archive.unknowns(), (0, 0x20));
    assert_eq!(archive.entries().len(), 3);

    let texture = &archive.entries()[0];
    assert_eq!(texture.name, "AEND_TEX_08");
    assert_eq!(texture.kind, FileKind::Gim);
    assert_eq!(texture.extra, 0);
    assert_eq!(texture.file_name(), "AEND_TEX_08.gim");
    assert_eq!(archive.read(0), Some(&[0x11u8; 20][..]));

    let model = &archive.entries()[1];
    assert_eq!(model.kind, FileKind::Smd);
    assert_eq!(model.extra, 1);
    assert_eq!(model.file_name(), "CAR_BODY.smd");

    let other = &archive.entries()[2];
    assert_eq!(other.file_name(), "SOUND.006");
    assert_eq!(archive.read(2), Some(&[0x33u8; 3][..]));
    assert_eq!(archive.read(3), None);
}

#[test]
fn file_kind_extension_round_trip() {
    for kind in [
        FileKind::Gim,
        FileKind::Smd,
        FileKind::Other(6),
        FileKind::Other(0x1F),
    ] {
        assert_eq!(FileKind::from_extension(&kind.extension()), kind);
    }
    assert_eq!(FileKind::from_extension("GIM"), FileKind::Gim);
    assert_eq!(FileKind::from_extension("png"), FileKind::Other(6));
}

#[test]
fn names_are_limited_to_sixteen_bytes() {
    let mut builder = Builder::new("A_VERY_LONG_ARCHIVE_NAME");
    assert!(matches!(
        builder.add("SEVENTEEN_CHARS_X", FileKind::Gim, Vec::new()),
        Err(Error::NameTooLong { max: 16, .. })
    ));
    builder
        .add("SIXTEEN_CHARS_XX", FileKind::Gim, vec![1])
        .expect("sixteen bytes fit");

    let archive = Archive::parse(builder.finish().expect("failed to build"))
        .expect("failed to parse");
    assert_eq!(archive.name(), "A_VERY_LONG_ARCH");
    assert_eq!(archive.entries()[0].name, "SIXTEEN_CHARS_XX");
}

#[test]
fn parse_rejects_malformed_archives() {
    assert!(matches!(
        Archive::parse(b"NRes".to_vec()),
        Err(Error::InvalidMagic { got }) if &got == b"NRes"
    ));

    let mut bytes = sample_archive();
    LittleEndian::write_u32(&mut bytes[4..8], 1000);
    assert!(matches!(
        Archive::parse(bytes),
        Err(Error::TableOutOfBounds {
            entry_count: 1000,
            ..
        })
    ));

    let mut bytes = sample_archive();
    LittleEndian::write_u32(&mut bytes[HEADER_SIZE + 20..HEADER_SIZE + 24], 0x1000);
    assert!(matches!(
        Archive::parse(bytes),
        Err(Error::EntryOutOfBounds { index: 0, .. })
    ));
}

#[test]
fn extract_and_rebuild_through_directory() {
    let tmp = TempDir::new("pac").expect("failed to create temp dir");
    let archive_path = tmp.path().join("COURSE01.PAC");
    fs::write(&archive_path, sample_archive()).expect("failed to write archive");

    let archive = Archive::open(&archive_path).expect("failed to open archive");
    let dir = extract_dir_for(&archive_path);
    assert_eq!(dir, tmp.path().join("COURSE01.PAC_"));

    let written = archive.extract_to(&dir).expect("failed to extract");
    assert_eq!(written.len(), 3);
    assert_eq!(
        fs::read(dir.join("AEND_TEX_08.gim")).expect("missing texture"),
        vec![0x11; 20]
    );

    let (builder, file_name) = Builder::from_dir(&dir).expect("failed to collect directory");
    assert_eq!(file_name, "COURSE01.PAC");
    assert_eq!(builder.len(), 3);

    let rebuilt = Archive::parse(builder.finish().expect("failed to rebuild"))
        .expect("failed to parse rebuilt archive");
    let mut names: Vec<String> = rebuilt.entries().iter().map(EntryMeta::file_name).collect();
    names.sort();
    assert_eq!(names, vec!["AEND_TEX_08.gim", "CAR_BODY.smd", "SOUND.006"]);
    for (index, entry) in rebuilt.entries().iter().enumerate() {
        let original = archive
            .entries()
            .iter()
            .position(|e| e.name == entry.name)
            .expect("entry survives rebuild");
        assert_eq!(rebuilt.read(index), archive.read(original));
        assert_eq!(entry.extra, archive.entries()[original].extra);
    }
}

#[test]
fn from_dir_requires_pac_suffix() {
    let tmp = TempDir::new("pac").expect("failed to create temp dir");
    let dir = tmp.path().join("COURSE01");
    fs::create_dir(&dir).expect("failed to create dir");

    assert!(matches!(
        Builder::from_dir(&dir),
        Err(Error::InvalidDirectoryName { .. })
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn parse_archive_is_panic_free_on_random_bytes(data in proptest::collection::vec(any::<u8>(), 0..1024)) {
        let mut data = data;
        if data.len() >= 4 {
            data[0..4].copy_from_slice(&MAGIC);
        }
        if let Ok(archive) = Archive::parse(data) {
            for index in 0..archive.entries().len() {
                prop_assert!(archive.read(index).is_some());
            }
        }
    }
}
