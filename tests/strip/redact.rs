//! Redaction over synthetic in-memory images.

use debugstrip::formats::pe::directories::DebugType;
use debugstrip::formats::pe::{ImageModel, PeImage};
use debugstrip::strip::{self, RangeKind};
use debugstrip::{redact, redact_in_place, redact_with_report, StripError};

use crate::common::*;

fn two_entry_image() -> (Vec<u8>, Layout) {
    PeBuilder::new()
        .entry(Entry::rsds(r"C:\build\app.pdb"))
        .entry(Entry::new(13, vec![0xA1; 0x30]))
        .build()
}

fn expected_ranges(layout: &Layout, entries: usize) -> Vec<(usize, usize)> {
    let mut ranges = vec![
        (layout.descriptor_offset, 8),
        (layout.directory_offset, entries * 28),
    ];
    ranges.extend(layout.payloads.iter().copied());
    ranges
}

#[test]
fn test_redact_pe32_removes_all_debug_bytes() {
    let (original, layout) = two_entry_image();
    let stripped = redact(original.clone()).unwrap();

    assert_eq!(stripped.len(), original.len());
    assert_only_changed(&original, &stripped, &expected_ranges(&layout, 2));
}

#[test]
fn test_descriptor_reads_back_as_zero() {
    let (original, _) = two_entry_image();
    assert!(PeImage::parse(&original).unwrap().has_debug_info());

    let stripped = redact(original).unwrap();
    let image = PeImage::parse(&stripped).unwrap();
    assert!(!image.has_debug_info());

    // Other directories keep their values
    let import = image.data_directory(1).unwrap();
    assert_eq!(import.virtual_address, 0x2300);
    assert_eq!(import.size, 0x40);
}

#[test]
fn test_redact_pe32plus() {
    let (original, layout) = PeBuilder::new()
        .pe32plus()
        .entry(Entry::rsds("app.pdb"))
        .build();

    // Slot 6 sits 112 + 48 bytes into the PE32+ optional header
    assert_eq!(layout.descriptor_offset, E_LFANEW + 4 + 20 + 112 + 48);

    let (stripped, plan) = redact_with_report(original.clone()).unwrap();
    assert_eq!(plan.ranges()[0].offset, layout.descriptor_offset);
    assert_only_changed(&original, &stripped, &expected_ranges(&layout, 1));
}

#[test]
fn test_report_describes_removed_records() {
    let (original, layout) = two_entry_image();
    let (_, plan) = redact_with_report(original).unwrap();

    assert_eq!(plan.signature_offset, Some(E_LFANEW));
    assert_eq!(plan.directory_offset, RDATA_OFFSET);
    assert_eq!(plan.entries.len(), 2);
    assert_eq!(plan.entries[0].entry.debug_type, DebugType::CodeView);
    assert_eq!(plan.entries[1].entry.debug_type, DebugType::Pogo);
    assert_eq!(
        plan.pdb_paths().collect::<Vec<_>>(),
        vec![r"C:\build\app.pdb"]
    );
    assert_eq!(
        plan.total_len(),
        8 + 2 * 28 + layout.payloads[0].1 + layout.payloads[1].1
    );

    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["entries"][0]["codeview"]["format"], "Rsds");
    assert_eq!(json["entries"][0]["codeview"]["age"], 7);
}

#[test]
fn test_applying_plan_again_changes_nothing() {
    let (original, _) = two_entry_image();
    let image = PeImage::parse(&original).unwrap();
    let plan = strip::plan(&image, &original).unwrap();

    let mut once = original.clone();
    plan.apply(&mut once).unwrap();
    let mut twice = once.clone();
    plan.apply(&mut twice).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_second_redact_leaves_output_identical() {
    let (original, _) = two_entry_image();
    let mut stripped = redact(original).unwrap();
    let snapshot = stripped.clone();

    // The descriptor is gone, so there is nothing left to find
    assert!(matches!(
        redact_in_place(&mut stripped),
        Err(StripError::NoDebugDirectory)
    ));
    assert_eq!(stripped, snapshot);
}

#[test]
fn test_entry_count_truncates_partial_record() {
    let (original, layout) = PeBuilder::new()
        .entry(Entry::rsds("a.pdb"))
        .entry(Entry::new(16, vec![0x33; 0x20]))
        .directory_size(2 * 28 + 10)
        .build();

    let (stripped, plan) = redact_with_report(original.clone()).unwrap();
    assert_eq!(plan.entries.len(), 2);
    // The trailing partial record is not zeroed
    assert_only_changed(&original, &stripped, &expected_ranges(&layout, 2));
    assert_eq!(
        &stripped[RDATA_OFFSET + 56..RDATA_OFFSET + 66],
        &[RDATA_FILL; 10]
    );
}

#[test]
fn test_missing_debug_directory() {
    let (original, _) = PeBuilder::new().build();
    let mut data = original.clone();
    assert!(matches!(
        redact_in_place(&mut data),
        Err(StripError::NoDebugDirectory)
    ));
    assert_eq!(data, original);
}

#[test]
fn test_debug_slot_not_declared() {
    // Only six directories, so slot 6 does not exist
    let (original, _) = PeBuilder::new()
        .entry(Entry::rsds("a.pdb"))
        .number_of_rva_and_sizes(6)
        .build();
    assert!(matches!(
        redact(original),
        Err(StripError::NoDebugDirectory)
    ));
}

#[test]
fn test_directory_too_small_for_a_record() {
    let (original, _) = PeBuilder::new()
        .entry(Entry::rsds("a.pdb"))
        .directory_size(20)
        .build();
    assert!(matches!(redact(original), Err(StripError::NoEntries)));
}

#[test]
fn test_unmapped_directory_rva() {
    let (original, _) = PeBuilder::new()
        .entry(Entry::rsds("a.pdb"))
        .debug_rva(0x8000)
        .build();
    assert!(matches!(
        redact(original),
        Err(StripError::NullOffset { rva: 0x8000 })
    ));
}

#[test]
fn test_zero_sized_entry_is_skipped() {
    let (original, layout) = PeBuilder::new()
        .entry(Entry::new(16, Vec::new()))
        .entry(Entry::rsds("b.pdb"))
        .build();

    let (stripped, plan) = redact_with_report(original.clone()).unwrap();
    let empty = plan
        .ranges()
        .iter()
        .find(|r| {
            r.kind
                == RangeKind::EntryRawData {
                    index: 0,
                    debug_type: DebugType::Repro,
                }
        })
        .unwrap();
    assert!(empty.is_empty());
    assert_only_changed(&original, &stripped, &expected_ranges(&layout, 2));
}

#[test]
fn test_payload_past_end_of_file_is_rejected() {
    let (mut original, _) = PeBuilder::new().entry(Entry::rsds("a.pdb")).build();
    let len = original.len() as u32;
    put_u32(&mut original, RDATA_OFFSET + 24, len - 4);

    let mut data = original.clone();
    assert!(matches!(
        redact_in_place(&mut data),
        Err(StripError::OutOfBounds { .. })
    ));
    // Validation happens before the first write
    assert_eq!(data, original);
}

#[test]
fn test_invalid_images() {
    assert!(matches!(redact(Vec::new()), Err(StripError::EmptyData)));
    assert!(matches!(
        redact(vec![0x41; 0x200]),
        Err(StripError::Parse(_))
    ));

    let (mut truncated, _) = PeBuilder::new().entry(Entry::rsds("a.pdb")).build();
    truncated.truncate(0x100);
    assert!(matches!(redact(truncated), Err(StripError::Parse(_))));
}
