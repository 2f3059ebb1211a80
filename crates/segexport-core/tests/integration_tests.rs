//! Integration tests for segexport-core
//!
//! These tests drive whole exports through the public API and decode the
//! results again with `Container::parse`.

use std::fs;
use std::sync::atomic::AtomicBool;

use segexport_core::image::MockImage;
use segexport_core::{
    Container, Error, ExportOptions, Exporter, ImageSource, InputFormat, OutputTarget, Permissions,
    ReadFailurePolicy, export_to_target, open_image,
};

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(bytes[offset..offset + 8].try_into().unwrap())
}

/// Two regions, one user symbol and one generated label.
fn sample_image() -> MockImage {
    MockImage::builder()
        .name("sample")
        .filled_region("B", 0x2000, 0x100, Permissions::READ_WRITE, 0xBB)
        .filled_region("A", 0x1000, 0x1000, Permissions::READ_EXECUTE, 0xAA)
        .symbol(0x1050, "init_fn")
        .generated_symbol(0x2010, "FUN_2010")
        .build()
}

fn export(image: &MockImage, options: ExportOptions) -> segexport_core::Result<Vec<u8>> {
    let shutdown = AtomicBool::new(false);
    Exporter::new(options)
        .export(image, &shutdown)
        .map(|stream| stream.into_bytes())
}

mod layout_tests {
    use super::*;

    #[test]
    fn test_sample_layout() {
        let bytes = export(&sample_image(), ExportOptions::default()).unwrap();

        // Region table sorted by start
        assert_eq!(read_u64(&bytes, 0), 2);
        assert_eq!(read_u64(&bytes, 8), 0x1000);
        assert_eq!(read_u64(&bytes, 16), 0x2000);
        assert_eq!(read_u64(&bytes, 24), 5);
        assert_eq!(read_u64(&bytes, 32), 0x2000);
        assert_eq!(read_u64(&bytes, 40), 0x2100);
        assert_eq!(read_u64(&bytes, 48), 6);

        // Data section
        let data_start = 56;
        let data_end = data_start + 0x1000 + 0x100;
        assert!(bytes[data_start..data_start + 0x1000].iter().all(|&b| b == 0xAA));
        assert!(bytes[data_start + 0x1000..data_end].iter().all(|&b| b == 0xBB));

        // Symbol table: the generated label is skipped
        assert_eq!(read_u64(&bytes, data_end), 1);
        assert_eq!(read_u64(&bytes, data_end + 8), 16);
        assert_eq!(read_u64(&bytes, data_end + 16), 0x1050);
        assert_eq!(&bytes[data_end + 24..data_end + 32], b"init_fn\0");
        assert_eq!(bytes.len(), data_end + 32);
    }

    #[test]
    fn test_empty_program() {
        let image = MockImage::builder().build();
        let bytes = export(&image, ExportOptions::default()).unwrap();
        assert_eq!(bytes, vec![0u8; 24]);
    }

    #[test]
    fn test_uninitialized_regions_are_skipped() {
        let image = MockImage::builder()
            .uninitialized("__bss", 0x3000, 0x1000, Permissions::READ_WRITE)
            .filled_region("__text", 0x1000, 0x10, Permissions::READ_EXECUTE, 0x90)
            .build();

        let bytes = export(&image, ExportOptions::default()).unwrap();
        let container = Container::parse(&bytes).unwrap();
        assert_eq!(container.regions.len(), 1);
        assert_eq!(container.regions[0].header.start, 0x1000);
    }

    #[test]
    fn test_export_is_deterministic() {
        let image = sample_image();
        let first = export(&image, ExportOptions::default()).unwrap();
        let second = export(&image, ExportOptions::default()).unwrap();
        assert_eq!(first, second);
    }
}

mod decode_tests {
    use super::*;

    #[test]
    fn test_decode_sample() {
        let bytes = export(&sample_image(), ExportOptions::default()).unwrap();
        let container = Container::parse(&bytes).unwrap();

        assert_eq!(container.total_size, bytes.len());
        assert_eq!(container.data_size(), 0x1100);
        assert_eq!(container.symbol_address("init_fn"), Some(0x1050));
        assert_eq!(container.symbol_address("FUN_2010"), None);

        let region = container.region_containing(0x1050).unwrap();
        assert_eq!(region.header.flags(), Some(Permissions::READ_EXECUTE));
        assert_eq!(region.data.len(), 0x1000);

        let summary = container.summary();
        assert_eq!(summary.region_count, 2);
        assert_eq!(summary.symbol_payload_size, 16);
    }

    #[test]
    fn test_decode_rejects_truncated() {
        let bytes = export(&sample_image(), ExportOptions::default()).unwrap();
        let result = Container::parse(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(Error::MalformedContainer { .. })));
    }
}

mod read_failure_tests {
    use super::*;

    fn failing_image() -> MockImage {
        MockImage::builder()
            .filled_region("ok", 0x1000, 0x10, Permissions::READ, 0x11)
            .failing_region("bad", 0x2000, 0x20, Permissions::READ_WRITE)
            .build()
    }

    #[test]
    fn test_zero_fill_keeps_container_aligned() {
        let bytes = export(&failing_image(), ExportOptions::default()).unwrap();
        let container = Container::parse(&bytes).unwrap();

        assert_eq!(container.regions.len(), 2);
        assert!(container.regions[1].data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_drop_region_removes_header() {
        let options = ExportOptions::new().with_read_failure_policy(ReadFailurePolicy::DropRegion);
        let bytes = export(&failing_image(), options).unwrap();
        let container = Container::parse(&bytes).unwrap();

        assert_eq!(container.regions.len(), 1);
        assert_eq!(container.regions[0].header.start, 0x1000);
    }

    #[test]
    fn test_omit_reports_misalignment() {
        let options = ExportOptions::new().with_read_failure_policy(ReadFailurePolicy::Omit);
        let shutdown = AtomicBool::new(false);
        let stream = Exporter::new(options)
            .export(&failing_image(), &shutdown)
            .unwrap();

        assert!(!stream.summary.is_aligned());
        assert_eq!(stream.summary.read_failures.len(), 1);
        // Header still claims 0x20 bytes that are missing from the data section
        assert!(Container::parse(&stream.bytes).is_err());
    }
}

mod target_tests {
    use super::*;

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segments.bin");
        let target = OutputTarget::File(path.clone());
        let shutdown = AtomicBool::new(false);

        let summary =
            export_to_target(&sample_image(), &target, &ExportOptions::default(), &shutdown)
                .unwrap();

        let written = fs::read(&path).unwrap();
        assert_eq!(written.len(), summary.total_size);
        assert_eq!(summary.symbols_exported, 1);
        assert_eq!(summary.symbols_default_skipped, 1);
    }

    #[test]
    fn test_cancelled_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("segments.bin");
        let target = OutputTarget::File(path.clone());
        let shutdown = AtomicBool::new(true);

        let result =
            export_to_target(&sample_image(), &target, &ExportOptions::default(), &shutdown);

        assert!(result.unwrap_err().is_cancelled());
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_target_fails_before_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::File(dir.path().to_path_buf());
        let shutdown = AtomicBool::new(false);

        let result =
            export_to_target(&sample_image(), &target, &ExportOptions::default(), &shutdown);
        assert!(matches!(result, Err(Error::OutputTarget(_))));
    }
}

mod manifest_tests {
    use super::*;

    #[test]
    fn test_manifest_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("text.bin"), [0xC3u8; 0x10]).unwrap();
        fs::write(dir.path().join("data.bin"), [0x01u8; 0x08]).unwrap();

        let manifest = dir.path().join("kext.json");
        fs::write(
            &manifest,
            r#"{
                "regions": [
                    { "name": "__DATA", "start": "0x2000", "end": "0x2007",
                      "permissions": "rw-", "file": "data.bin" },
                    { "name": "__TEXT", "start": "0x1000", "end": "0x100f",
                      "permissions": "r-x", "file": "text.bin" },
                    { "name": "__bss", "start": "0x3000", "end": "0x3fff",
                      "permissions": "rw-", "initialized": false }
                ],
                "symbols": [
                    { "address": "0x1000", "name": "_start" },
                    { "address": "0x1008", "name": "LAB_1008", "source": "default" },
                    { "address": "0x2000", "name": "_config", "source": "imported" }
                ]
            }"#,
        )
        .unwrap();

        let image = open_image(&manifest, InputFormat::Auto).unwrap();
        assert_eq!(image.name(), "kext");

        let shutdown = AtomicBool::new(false);
        let stream = Exporter::new(ExportOptions::default())
            .export(&*image, &shutdown)
            .unwrap();
        let container = Container::parse(&stream.bytes).unwrap();

        assert_eq!(container.regions.len(), 2);
        assert_eq!(container.regions[0].data, &[0xC3u8; 0x10][..]);
        assert_eq!(container.regions[1].data, &[0x01u8; 0x08][..]);
        assert_eq!(container.symbols.len(), 2);
        assert_eq!(container.symbol_address("_config"), Some(0x2000));
        assert!(stream.summary.read_failures.is_empty());
    }

    #[test]
    fn test_missing_input_is_no_program() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_image(&dir.path().join("absent.json"), InputFormat::Auto);
        assert!(matches!(result, Err(Error::NoProgram(_))));
    }
}
