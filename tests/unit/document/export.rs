use super::*;
use crate::document::model::{FrameImage, FrameRecord};
use crate::render::patch_encoder::{EncodedStill, StillFormat};
use std::path::PathBuf;

fn two_frame_doc() -> AnimationDocument {
    let png = EncodedStill {
        format: StillFormat::Png,
        bytes: vec![0x89, b'P', b'N', b'G'],
    };
    let jpg = EncodedStill {
        format: StillFormat::Jpeg,
        bytes: vec![0xff, 0xd8],
    };
    let frame = |index: u32, image: FrameImage| FrameRecord {
        index,
        delay: 100,
        image,
        width: 1,
        height: 1,
        x: 0,
        y: 0,
        disposal: Disposal::DoNotDispose,
    };
    AnimationDocument::assemble(
        1,
        1,
        200,
        0,
        vec![
            frame(0, FrameImage::DataUrl(png.to_data_url())),
            frame(1, FrameImage::Blob(jpg)),
        ],
        None,
    )
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("unit_export").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn archive_writes_manifest_and_frame_files() {
    let dir = scratch_dir("archive");
    let manifest = export_archive(&two_frame_doc(), &dir).unwrap();

    assert_eq!(manifest.frame_count, 2);
    assert_eq!(manifest.frames[0].image, "frame_0000.png");
    assert_eq!(manifest.frames[1].image, "frame_0001.jpg");
    assert_eq!(
        std::fs::read(dir.join("frame_0000.png")).unwrap(),
        vec![0x89, b'P', b'N', b'G']
    );
    assert_eq!(
        std::fs::read(dir.join("frame_0001.jpg")).unwrap(),
        vec![0xff, 0xd8]
    );

    let on_disk: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.join(MANIFEST_FILE_NAME)).unwrap()).unwrap();
    assert_eq!(on_disk["frameCount"], 2);
    assert_eq!(on_disk["frames"][1]["image"], "frame_0001.jpg");
    assert_eq!(on_disk["frames"][1]["disposal"], 1);
}

#[test]
fn write_json_creates_parent_dirs() {
    let dir = scratch_dir("json");
    let path = dir.join("nested").join("doc.json");
    let doc = two_frame_doc();
    write_json(&doc, &path).unwrap();

    let back = AnimationDocument::from_reader(std::fs::File::open(&path).unwrap()).unwrap();
    assert_eq!(back, doc);
    assert_eq!(to_json_string(&doc).unwrap(), std::fs::read_to_string(&path).unwrap());
}

#[test]
fn filesystem_failures_are_io_errors() {
    let dir = scratch_dir("io_errors");
    std::fs::create_dir_all(&dir).unwrap();
    let blocker = dir.join("not_a_dir");
    std::fs::write(&blocker, b"file").unwrap();
    let doc = two_frame_doc();

    let err = export_archive(&doc, blocker.join("archive")).unwrap_err();
    assert!(matches!(err, GifDocError::Io(_)), "{err}");

    let err = write_json(&doc, blocker.join("doc.json")).unwrap_err();
    assert!(matches!(err, GifDocError::Io(_)), "{err}");
}
