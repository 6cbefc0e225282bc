//! The `.mar` zip container.

use super::common::base_builder;
use std::io::{Cursor, Read, Write};
use threatlang::{read_archive, write_archive, AssetBuilder, LangError};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const ICON: &[u8] = b"0123456789";

fn icon_lang() -> threatlang::Lang {
    base_builder()
        .asset(AssetBuilder::new("A", "System").svg_icon(ICON))
        .license("Apache-2.0")
        .build()
        .expect("build should succeed")
}

#[test]
fn archive_round_trip_preserves_everything() {
    let lang = icon_lang();
    let mut buffer = Cursor::new(Vec::new());
    write_archive(&mut buffer, &lang).expect("write should succeed");

    buffer.set_position(0);
    let read_back = read_archive(buffer).expect("read should succeed");
    assert_eq!(read_back.license(), Some("Apache-2.0"));
    assert!(read_back.notice().is_none());
    assert_eq!(
        read_back.asset("A").expect("asset").local_svg_icon(),
        Some(ICON)
    );
    assert_eq!(read_back, lang);
}

#[test]
fn archive_entry_layout_is_fixed() {
    let mut buffer = Cursor::new(Vec::new());
    write_archive(&mut buffer, &icon_lang()).expect("write should succeed");

    buffer.set_position(0);
    let mut archive = ZipArchive::new(buffer).expect("open zip");
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).expect("entry").name().to_string())
        .collect();
    assert_eq!(names, ["langspec.json", "icons/", "icons/A.svg", "LICENSE"]);

    // The document entry is pretty-printed UTF-8 JSON.
    let mut entry = archive.by_name("langspec.json").expect("entry");
    let mut text = String::new();
    entry.read_to_string(&mut text).expect("read entry");
    assert!(text.starts_with("{\n  \"formatVersion\": \"1.0.0\""));
}

/// Builds an archive from raw entries for reader-side tests.
fn raw_archive(entries: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    for (name, bytes) in entries {
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("start entry");
        zip.write_all(bytes).expect("write entry");
    }
    zip.finish().expect("finish zip");
    buffer.set_position(0);
    buffer
}

fn minimal_langspec() -> Vec<u8> {
    let lang = base_builder()
        .asset(AssetBuilder::new("A", "System"))
        .build()
        .expect("build should succeed");
    threatlang::serialize(&lang).expect("serialize").into_bytes()
}

#[test]
fn missing_langspec_is_rejected() {
    let archive = raw_archive(&[("LICENSE", b"Apache-2.0")]);
    assert!(matches!(
        read_archive(archive),
        Err(LangError::ArchiveMissingLangSpec)
    ));
}

#[test]
fn unknown_entries_are_ignored() {
    let langspec = minimal_langspec();
    let archive = raw_archive(&[
        ("README.md", b"ignored".as_slice()),
        ("langspec.json", &langspec),
        ("docs/guide.txt", b"also ignored"),
    ]);
    let lang = read_archive(archive).expect("read should succeed");
    assert!(lang.asset("A").is_some());
}

#[test]
fn icons_attach_by_asset_name() {
    let langspec = minimal_langspec();
    let archive = raw_archive(&[
        ("langspec.json", &langspec),
        ("icons/A.svg", ICON),
        ("icons/A.png", b"png bytes".as_slice()),
        // No matching asset: silently dropped.
        ("icons/Missing.svg", b"x".as_slice()),
        // Not an identifier base name: skipped.
        ("icons/not-an-id.svg", b"x".as_slice()),
        // Not an icon extension: skipped.
        ("icons/A.jpeg", b"x".as_slice()),
    ]);
    let lang = read_archive(archive).expect("read should succeed");
    let asset = lang.asset("A").expect("asset");
    assert_eq!(asset.local_svg_icon(), Some(ICON));
    assert_eq!(asset.local_png_icon(), Some(b"png bytes".as_slice()));
}

#[test]
fn notice_round_trips() {
    let lang = base_builder()
        .asset(AssetBuilder::new("A", "System"))
        .notice("NOTICE text")
        .build()
        .expect("build should succeed");
    let mut buffer = Cursor::new(Vec::new());
    write_archive(&mut buffer, &lang).expect("write should succeed");
    buffer.set_position(0);
    let read_back = read_archive(buffer).expect("read should succeed");
    assert_eq!(read_back.notice(), Some("NOTICE text"));
    assert_eq!(read_back, lang);
}

#[test]
fn corrupt_container_is_a_zip_error() {
    let result = read_archive(Cursor::new(b"not a zip file".to_vec()));
    assert!(matches!(result, Err(LangError::Zip(_))));
}
