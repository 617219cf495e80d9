use cfb::CompoundFile;
use encoding_rs::WINDOWS_1251;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use md77_reader::md77::codec::crypto;
use md77_reader::{MdError, MdReader, ReaderOptions, StorageEntry, DEFAULT_METADATA_STREAM};
use std::io::{Cursor, Write};
use std::path::PathBuf;

type Container = Cursor<Vec<u8>>;

const METADATA_TEXT: &str = r#"{{"MainDataContDef","7015","10009","7503"},
{"SbCnts",{"25","Контрагенты",""}},
{"Documents",{"1001","Документ","",{"Head Fields",{"1010","Контрагент","","S","0","0","0","25"}}}}}"#;

const OTHER_METADATA_TEXT: &str = r#"{{"Registers",{"77","Остатки",""}}}"#;

fn cp1251(text: &str) -> Vec<u8> {
    WINDOWS_1251.encode(text).0.into_owned()
}

fn zlib(payload: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(payload).unwrap();
    encoder.finish().unwrap()
}

fn encrypt(plain: &[u8], nonce: u32) -> Vec<u8> {
    let mut data = vec![0x25, 0x77];
    data.extend_from_slice(&nonce.to_le_bytes());
    data.extend_from_slice(&[0, 0]);
    let mut body = plain.to_vec();
    crypto::apply_keystream(&mut body, nonce);
    data.extend_from_slice(&body);
    data
}

/// Build an in-memory compound file. Paths use the platform's backslashes;
/// parent storages are created as needed.
fn build_container(streams: &[(&str, Vec<u8>)]) -> Container {
    let mut file = CompoundFile::create(Cursor::new(Vec::new())).unwrap();
    for (path, data) in streams {
        let mut cfb_path = PathBuf::from("/");
        let parts: Vec<&str> = path.split('\\').collect();
        for storage in &parts[..parts.len() - 1] {
            cfb_path.push(storage);
            if !file.exists(&cfb_path) {
                file.create_storage(&cfb_path).unwrap();
            }
        }
        cfb_path.push(parts[parts.len() - 1]);

        let mut stream = file.create_stream(&cfb_path).unwrap();
        stream.write_all(data).unwrap();
        stream.flush().unwrap();
    }
    file.flush().unwrap();

    let mut inner = file.into_inner();
    inner.set_position(0);
    inner
}

fn standard_container() -> Container {
    build_container(&[
        (DEFAULT_METADATA_STREAM, zlib(&cp1251(METADATA_TEXT))),
        ("Metadata\\Container.Contents", zlib(&cp1251(r#"{"Type","Документ"}"#))),
        ("Metadata\\Empty", Vec::new()),
        ("Metadata\\Binary", (0u8..48).collect()),
        ("Alt\\Main MetaData Stream", cp1251(OTHER_METADATA_TEXT)),
        ("GUIDData", cp1251(r#"{"Guid"}"#)),
    ])
}

fn open(container: Container) -> MdReader<Container> {
    MdReader::from_reader(container, ReaderOptions::default()).unwrap()
}

fn find<'a>(entries: &'a [StorageEntry], name: &str) -> &'a StorageEntry {
    entries
        .iter()
        .find(|e| e.name == name)
        .unwrap_or_else(|| panic!("entry {} not found", name))
}

#[test]
fn enumerates_storages_and_streams() {
    let reader = open(standard_container());
    let entries = reader.entries();
    assert_eq!(entries.len(), 3);

    let metadata = find(entries, "Metadata");
    assert!(metadata.is_container);
    assert_eq!(metadata.path, "Metadata");
    assert_eq!(metadata.children.len(), 4);

    let stream = find(&metadata.children, "Main MetaData Stream");
    assert!(!stream.is_container);
    assert_eq!(stream.path, DEFAULT_METADATA_STREAM);
    assert_eq!(stream.size, zlib(&cp1251(METADATA_TEXT)).len() as u64);
    assert!(stream.children.is_empty());

    let guid = find(entries, "GUIDData");
    assert_eq!(guid.path, "GUIDData");
    assert_eq!(guid.size, 8);
}

#[test]
fn loads_compressed_metadata() {
    let mut reader = open(standard_container());
    assert!(reader.metadata().is_none());

    let tree = reader.load_metadata().unwrap();
    assert_eq!(tree.indices().types.len(), 2);
    assert_eq!(tree.indices().reference_of(b"1010"), Some(&b"25"[..]));
    assert_eq!(tree.object(b"1001").unwrap().first_value(), b"1001");
    assert!(reader.metadata().is_some());
}

#[test]
fn loads_encrypted_and_prefixed_metadata() {
    let mut prefixed = vec![0u8; 8];
    prefixed.extend(zlib(&cp1251(METADATA_TEXT)));

    for raw in [encrypt(&zlib(&cp1251(METADATA_TEXT)), 0x0BAD_F00D), prefixed] {
        let mut reader = open(build_container(&[(DEFAULT_METADATA_STREAM, raw)]));
        let tree = reader.load_metadata().unwrap();
        assert!(tree.object(b"25").is_some());
        assert!(tree.dump().contains("\"1010\" // ref: 25 (SC)"));
    }
}

#[test]
fn metadata_stream_text_is_an_annotated_dump() {
    let mut reader = open(standard_container());
    let text = reader.read_stream_text(DEFAULT_METADATA_STREAM).unwrap();

    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("=== METADATA STRUCTURE ==="));
    assert_eq!(lines.next(), Some("{...}"));
    let document_line = text.lines().find(|l| l.contains("1001")).unwrap();
    assert!(document_line.ends_with("\"1001\" // object: DT"));
    assert!(text.contains("\"Документ\""));

    assert!(reader.metadata().unwrap().object(b"1001").is_some());
}

#[test]
fn rereading_metadata_replaces_the_tree() {
    let mut reader = open(standard_container());
    reader.load_metadata().unwrap();
    assert!(reader.metadata().unwrap().object(b"1001").is_some());

    reader.read_stream_text("Alt\\Main MetaData Stream").unwrap();
    let tree = reader.metadata().unwrap();
    assert!(tree.object(b"1001").is_none());
    assert!(tree.object(b"77").is_some());
    assert_eq!(tree.indices().types.len(), 1);
}

#[test]
fn other_streams_are_shown_as_text() {
    let mut reader = open(standard_container());
    assert_eq!(
        reader.read_stream_text("Metadata\\Container.Contents").unwrap(),
        r#"{"Type","Документ"}"#
    );
    assert_eq!(reader.read_stream_text("GUIDData").unwrap(), r#"{"Guid"}"#);
    assert_eq!(reader.read_stream_text("Metadata\\Empty").unwrap(), "<empty stream>");
    assert!(reader.metadata().is_none());
}

#[test]
fn undecodable_stream_is_shown_as_hex() {
    let mut reader = open(standard_container());
    let text = reader.read_stream_text("Metadata\\Binary").unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Unknown data format (raw)."));
    let hex = lines.next().unwrap();
    assert!(hex.starts_with("HEX: 00 01 02"));
    assert!(hex.ends_with("1e 1f"));
}

#[test]
fn unrecognized_metadata_is_an_error_for_loading() {
    let binary: Vec<u8> = (0u8..48).collect();
    let mut reader = open(build_container(&[(DEFAULT_METADATA_STREAM, binary)]));

    let err = reader.load_metadata().unwrap_err();
    assert!(matches!(err, MdError::UnrecognizedStream { ref preview } if preview.starts_with("00 01")));
    assert!(reader.metadata().is_none());

    let text = reader.read_stream_text(DEFAULT_METADATA_STREAM).unwrap();
    assert!(text.starts_with("Unknown data format (raw).\nHEX: 00 01"));
}

#[test]
fn decoded_metadata_without_root_is_an_error() {
    let mut reader = open(build_container(&[(DEFAULT_METADATA_STREAM, zlib(b"no braces at all"))]));
    assert!(matches!(reader.load_metadata(), Err(MdError::NoRootElement)));
}

#[test]
fn custom_metadata_stream_path() {
    let options = ReaderOptions {
        metadata_stream: "Alt\\Main MetaData Stream".to_string(),
    };
    let mut reader = MdReader::from_reader(standard_container(), options).unwrap();
    assert!(reader.load_metadata().unwrap().object(b"77").is_some());
}

#[test]
fn missing_stream_is_reported() {
    let mut reader = open(standard_container());
    for path in ["Metadata\\Nope", "Metadata", "Nope\\Main MetaData Stream"] {
        assert!(matches!(
            reader.read_stream_text(path),
            Err(MdError::StreamNotFound(ref p)) if p == path
        ));
    }
}

#[test]
fn unopenable_container_is_fatal() {
    let err = MdReader::open("/nonexistent/1Cv7.md", ReaderOptions::default()).err().unwrap();
    assert!(matches!(err, MdError::OpenContainer { ref path, .. } if path.ends_with("1Cv7.md")));
    assert!(err.to_string().starts_with("Cannot open container /nonexistent/1Cv7.md"));

}

#[test]
fn non_compound_reader_is_fatal() {
    let err = MdReader::from_reader(Cursor::new(b"not a compound file".to_vec()), ReaderOptions::default())
        .err()
        .unwrap();
    assert!(matches!(err, MdError::InvalidContainer(_)));
    let message = err.to_string();
    assert!(message.starts_with("Cannot open container from reader: "));
    assert!(!message.contains("Custom {"));
}
