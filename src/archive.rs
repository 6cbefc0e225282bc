//! The `.mar` archive codec.
//!
//! A `.mar` file is a standard zip container holding `langspec.json`, per-asset
//! icons under `icons/`, and optional `LICENSE`/`NOTICE` texts. The reader
//! ignores unknown entries and icons whose base name is not an identifier; the
//! writer emits only local (never inherited) icons.

use crate::error::LangError;
use crate::lang::Lang;
use crate::parse;
use crate::primitives::is_identifier;
use crate::serialize;
use std::io::{Read, Seek, Write};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

enum IconKind {
    Svg,
    Png,
}

/// Reads a language from a `.mar` archive.
///
/// # Errors
///
/// Returns [`LangError::ArchiveMissingLangSpec`] if the container has no
/// `langspec.json` entry, any JSON or linking error from the contained
/// document, and I/O or zip errors unchanged.
pub fn read_archive<R: Read + Seek>(reader: R) -> Result<Lang, LangError> {
    let mut archive = ZipArchive::new(reader)?;
    let mut langspec: Option<String> = None;
    let mut icons: Vec<(String, IconKind, Vec<u8>)> = Vec::new();
    let mut license: Option<String> = None;
    let mut notice: Option<String> = None;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        match name.as_str() {
            "langspec.json" => {
                let mut text = String::new();
                entry.read_to_string(&mut text)?;
                langspec = Some(text);
            }
            "LICENSE" => {
                let mut text = String::new();
                entry.read_to_string(&mut text)?;
                license = Some(text);
            }
            "NOTICE" => {
                let mut text = String::new();
                entry.read_to_string(&mut text)?;
                notice = Some(text);
            }
            _ => {
                if let Some((asset, kind)) = icon_entry(&name) {
                    let mut bytes = Vec::new();
                    entry.read_to_end(&mut bytes)?;
                    icons.push((asset, kind, bytes));
                } else {
                    log::debug!("ignoring archive entry \"{}\"", name);
                }
            }
        }
    }

    let langspec = langspec.ok_or(LangError::ArchiveMissingLangSpec)?;
    let mut builder = parse::parse(&langspec)?;
    for (asset, kind, bytes) in icons {
        match kind {
            IconKind::Svg => builder.attach_svg_icon(&asset, bytes),
            IconKind::Png => builder.attach_png_icon(&asset, bytes),
        }
    }
    if let Some(license) = license {
        builder = builder.license(license);
    }
    if let Some(notice) = notice {
        builder = builder.notice(notice);
    }
    builder.build()
}

/// Splits an `icons/<Asset>.(svg|png)` entry name into the asset name and icon
/// kind. Entries with other extensions or non-identifier base names are
/// skipped.
fn icon_entry(name: &str) -> Option<(String, IconKind)> {
    let file_name = name.strip_prefix("icons/")?;
    let (base, kind) = match file_name.rsplit_once('.') {
        Some((base, "svg")) => (base, IconKind::Svg),
        Some((base, "png")) => (base, IconKind::Png),
        _ => return None,
    };
    if !is_identifier(base) {
        return None;
    }
    Some((base.to_string(), kind))
}

/// Writes a language to a `.mar` archive.
///
/// Entry order: `langspec.json`, an explicit `icons/` directory entry, each
/// asset's local SVG then PNG icon, then `LICENSE` and `NOTICE` when present.
///
/// # Errors
///
/// I/O and zip errors propagate unchanged.
pub fn write_archive<W: Write + Seek>(writer: W, lang: &Lang) -> Result<(), LangError> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default();

    zip.start_file("langspec.json", options)?;
    zip.write_all(serialize::serialize(lang)?.as_bytes())?;

    zip.add_directory("icons", options)?;
    for asset in lang.assets() {
        if let Some(bytes) = asset.local_svg_icon() {
            zip.start_file(format!("icons/{}.svg", asset.name()), options)?;
            zip.write_all(bytes)?;
        }
        if let Some(bytes) = asset.local_png_icon() {
            zip.start_file(format!("icons/{}.png", asset.name()), options)?;
            zip.write_all(bytes)?;
        }
    }

    if let Some(license) = lang.license() {
        zip.start_file("LICENSE", options)?;
        zip.write_all(license.as_bytes())?;
    }
    if let Some(notice) = lang.notice() {
        zip.start_file("NOTICE", options)?;
        zip.write_all(notice.as_bytes())?;
    }

    zip.finish()?;
    log::debug!("wrote archive for language \"{}\"", lang.defines().get("id").unwrap_or(""));
    Ok(())
}
