use super::*;
use std::io::Cursor;

#[test]
fn file_and_bytes_digests_agree() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("a.jpg");
    std::fs::write(&path, b"hello world").unwrap();

    assert_eq!(sha256_file(&path).unwrap(), sha256_hex(b"hello world"));
}

#[test]
fn streaming_spans_chunk_boundaries() {
    // Three and a half chunks of patterned data
    let data: Vec<u8> = (0..(CHUNK_SIZE * 7 / 2)).map(|i| (i % 251) as u8).collect();
    let mut cursor = Cursor::new(data.clone());
    assert_eq!(sha256_reader(&mut cursor).unwrap(), sha256_hex(&data));
}

#[test]
fn empty_input_has_known_digest() {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    assert_eq!(
        sha256_reader(&mut cursor).unwrap(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn missing_file_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(sha256_file(&tmp.path().join("nope.jpg")).is_err());
}
