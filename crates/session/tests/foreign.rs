use std::io::{Cursor, Write};

use deltahub_archive::unpack;
use deltahub_manifest::Converter;
use deltahub_manifest::error::ErrorKind as ManifestErrorKind;
use deltahub_model::{ChapterKey, Game, SlotId};
use deltahub_session::error::ErrorKind;
use deltahub_session::{ImportSource, MatchKind, export, import, import_blocking, import_with};
use rstest::rstest;
use time::macros::datetime;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const METADATA: &str = r#"{
    "metadata": {
        "packageID": "com.example.sprites",
        "name": "Sprite Swap",
        "version": "3.0.0",
        "author": ["Alice", "Bob"],
        "description": "Swaps a sprite",
        "tags": ["customization"]
    },
    "deltaruneTargetVersion": "1.04"
}"#;

const MANIFEST: &str = r#"<modding>
    <patch chapter="1" source="patches/chapter1.xdelta" target="chapter1_windows/data.win" type="xdelta"/>
    <patch chapter="1" source="files/x.png" target="chapter1_windows/sprites/x.png" type="override"/>
</modding>"#;

fn zip_of(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (path, contents) in files {
        writer.start_file(*path, SimpleFileOptions::default()).unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn foreign_archive(prefix: &str) -> Vec<u8> {
    let path = |name: &str| format!("{prefix}{name}");
    let names = [
        path("deltamodInfo.json"),
        path("modding.xml"),
        path("patches/chapter1.xdelta"),
        path("files/x.png"),
    ];
    zip_of(&[
        (names[0].as_str(), METADATA),
        (names[1].as_str(), MANIFEST),
        (names[2].as_str(), "delta bytes"),
        (names[3].as_str(), "png bytes"),
    ])
}

#[rstest]
#[case("")]
#[case("Sprite Swap/")]
#[tokio::test]
async fn foreign_import_scenario(#[case] prefix: &str) {
    let imported = import(foreign_archive(prefix)).await.unwrap();
    assert_eq!(imported.source, ImportSource::Foreign);

    let package = imported.session.package();
    assert_eq!(package.key.as_deref(), Some("com_example_sprites"));
    assert_eq!(package.name, "Sprite Swap");
    assert_eq!(package.author, "Alice, Bob");
    assert_eq!(package.game, Game::Deltarune);
    assert_eq!(package.game_version, "1.04");
    assert!(package.is_local_mod);

    let chapter = package.chapter(&ChapterKey::new("1")).unwrap();
    let data = chapter.data_file.as_ref().unwrap();
    assert_eq!((data.url.as_str(), data.version.as_str()), ("chapter1.xdelta", "3.0.0"));
    assert_eq!(chapter.extra_files.len(), 1);
    assert_eq!(chapter.extra_files[0].key, "sprites_x_png");
    assert_eq!(chapter.extra_files[0].url, "extra_file_sprites_x_png.zip");

    let data_slot = SlotId::data_file("1");
    let extra_slot = SlotId::extra("1", "sprites_x_png");
    assert_eq!(imported.mapping[&data_slot].path, format!("{prefix}patches/chapter1.xdelta"));
    assert_eq!(imported.mapping[&data_slot].kind, MatchKind::Exact);
    assert_eq!(imported.mapping[&extra_slot].path, format!("{prefix}files/x.png"));
    assert_eq!(
        imported.session.slots().get(&extra_slot).map(|payload| payload.bytes.as_slice()),
        Some(&b"png bytes"[..])
    );
}

#[tokio::test]
async fn foreign_import_exports_canonical_archive() {
    let imported = import(foreign_archive("")).await.unwrap();
    let blob = export(&imported.session).await.unwrap();
    let unpacked = unpack(&blob).unwrap();

    assert!(!unpacked.is_foreign_format);
    let config = unpacked.config.as_ref().unwrap();
    assert_eq!(config, &imported.session.package().stripped());
    assert!(!unpacked.text("mod_config.json").unwrap().contains("files/x.png"));

    assert_eq!(unpacked.file("chapter_1/chapter1.xdelta"), Some(&b"delta bytes"[..]));
    let nested = unpack(unpacked.file("chapter_1/extra_file_sprites_x_png.zip").unwrap()).unwrap();
    assert_eq!(nested.file("sprites/x.png"), Some(&b"png bytes"[..]));

    // Importing the exported archive now goes through the canonical config.
    let reimported = import(blob).await.unwrap();
    assert_eq!(reimported.source, ImportSource::Canonical);
    assert_eq!(reimported.session.package(), config);
}

#[tokio::test]
async fn conversion_is_idempotent_for_fixed_package_id() {
    let first = import_with(foreign_archive(""), Converter::at(datetime!(2024-01-01 00:00 UTC))).await.unwrap();
    let second = import_with(foreign_archive(""), Converter::at(datetime!(2024-02-01 00:00 UTC))).await.unwrap();
    let (first, second) = (first.session.package(), second.session.package());
    assert_eq!(first.key, second.key);
    assert_eq!(first.name, second.name);
    assert_eq!(first.game, second.game);
    assert_eq!(first.files, second.files);
}

#[test]
fn foreign_marker_takes_precedence() {
    let blob = zip_of(&[
        ("mod_config.json", r#"{"name": "Canonical"}"#),
        ("meta.json", r#"{"metadata": {"name": "Foreign", "demoMod": true}}"#),
    ]);
    let imported = import_blocking(&blob, &Converter::new()).unwrap();
    assert_eq!(imported.source, ImportSource::Foreign);
    assert_eq!(imported.session.package().name, "Foreign");
    assert_eq!(imported.session.package().game, Game::DeltaruneDemo);
}

#[test]
fn unrecognized_archive_is_rejected() {
    let blob = zip_of(&[("readme.txt", "hello")]);
    let err = import_blocking(&blob, &Converter::new()).unwrap_err();
    assert_eq!(*err, ErrorKind::UnrecognizedPackage);
}

#[test]
fn malformed_metadata_is_rejected() {
    let blob = zip_of(&[("deltamodInfo.json", "{ this is not json")]);
    let err = import_blocking(&blob, &Converter::new()).unwrap_err();
    assert_eq!(*err, ErrorKind::Manifest(ManifestErrorKind::MalformedMetadata));
}

#[test]
fn invalid_blob_is_rejected() {
    let err = import_blocking(b"not an archive", &Converter::new()).unwrap_err();
    assert!(matches!(&*err, ErrorKind::Archive(_)));
}
