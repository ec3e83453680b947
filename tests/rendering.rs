use chrono::{TimeZone, Utc};
use sha2::{Digest, Sha256};
use waste_report::{FontResolver, ReportBuilder, ReportPayload, ReportRenderer};

const SAMPLE: &str = include_str!("fixtures/sample_payload.json");

fn renderer() -> ReportRenderer {
    ReportBuilder::new()
        .with_font_resolver(FontResolver::builtin_only())
        .build()
}

fn sample() -> ReportPayload {
    ReportPayload::from_json(SAMPLE).expect("sample payload parses")
}

fn render_sample_pdf() -> Vec<u8> {
    let timestamp = Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap();
    renderer()
        .render_at(&sample(), timestamp)
        .expect("render sample pdf")
        .bytes
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            else {
                break;
            };
            let start_index = offset + start_pos + start.len();
            let Some(end_pos) = data[start_index..]
                .windows(end.len())
                .position(|window| window == end)
            else {
                break;
            };
            for byte in &mut data[start_index..start_index + end_pos] {
                if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                    *byte = b'0';
                }
            }
            offset = start_index + end_pos + end.len();
        }
    }

    let mut normalized = bytes.to_vec();
    for tag in [&b"/CreationDate("[..], b"/ModDate(", b"/Producer("] {
        scrub_segment(&mut normalized, tag, b')');
    }
    scrub_segment(&mut normalized, b"/ID[", b']');
    for (start, end) in [
        (&b"<xmp:CreateDate>"[..], &b"</xmp:CreateDate>"[..]),
        (b"<xmp:ModifyDate>", b"</xmp:ModifyDate>"),
        (b"<xmp:MetadataDate>", b"</xmp:MetadataDate>"),
        (b"<xmpMM:DocumentID>", b"</xmpMM:DocumentID>"),
        (b"<xmpMM:InstanceID>", b"</xmpMM:InstanceID>"),
        (b"<xmpMM:VersionID>", b"</xmpMM:VersionID>"),
    ] {
        scrub_xml(&mut normalized, start, end);
    }
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    Sha256::digest(&normalized).into()
}

#[test]
fn renders_non_empty_output() {
    let bytes = render_sample_pdf();
    assert!(bytes.starts_with(b"%PDF"), "output should be a PDF document");
    assert!(bytes.len() > 1024, "rendered PDF should hold the report pages");
}

#[test]
fn rendering_is_deterministic() {
    let bytes_a = render_sample_pdf();
    let bytes_b = render_sample_pdf();

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");
    assert_eq!(
        normalized_hash(&bytes_a),
        normalized_hash(&bytes_b),
        "normalized PDF bytes should be identical"
    );
}

#[test]
fn pdf_and_dry_run_agree_on_page_count() {
    let renderer = renderer();
    let payload = sample();
    let report = renderer.render(&payload).expect("render sample pdf");
    let recorded = renderer.dry_run(&payload).expect("dry run");
    assert_eq!(report.page_count, recorded.pages().len());
    assert!(report.filename.starts_with("waste_report_riverside_campus_"));
    assert!(report.filename.ends_with(".pdf"));
}

#[test]
fn sample_report_follows_the_section_order() {
    let recorded = renderer().dry_run(&sample()).expect("dry run");
    let first_page = |needle: &str| {
        recorded
            .pages_containing(needle)
            .first()
            .copied()
            .unwrap_or_else(|| panic!("no page mentions {needle:?}"))
    };

    let order = [
        first_page("Reporting period"),
        first_page("Key indicators"),
        first_page("Branch Performance"),
        first_page("Performance Summary"),
        first_page("Q1 2024 compared with Q1 2023"),
        first_page("Weight by category"),
        first_page("Monthly Waste by Year"),
        first_page("Main Materials Detail"),
        first_page("Sub Materials Detail"),
        first_page("Material flows by destination"),
        first_page("Waste Diversion Detail"),
    ];
    assert!(
        order.windows(2).all(|pair| pair[0] < pair[1]),
        "sections out of order: {order:?}"
    );
    // Two branches, one page each.
    assert_eq!(recorded.pages_containing("Diversion rate vs target").len(), 2);
}

#[test]
fn failed_comparison_renders_no_comparison_pages() {
    let mut value: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
    value["comparison_data"] = serde_json::json!({ "error": "comparison query timed out" });
    let payload = ReportPayload::from_value(value).unwrap();

    let full = renderer().dry_run(&sample()).unwrap();
    let degraded = renderer().dry_run(&payload).unwrap();
    assert!(degraded.pages_containing("Period Comparison").is_empty());
    assert!(degraded.pages_containing("Monthly Waste by Year").is_empty());
    assert!(degraded.pages_containing("comparison query timed out").is_empty());
    assert!(degraded.pages().len() < full.pages().len());
}

#[test]
fn failed_sections_render_a_message_page() {
    let mut value: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
    value["main_materials_data"] = serde_json::json!({ "error": "warehouse offline" });
    value["waste_diversion_data"] = serde_json::json!({ "error": "no weighbridge data" });
    let payload = ReportPayload::from_value(value).unwrap();

    let recorded = renderer().dry_run(&payload).unwrap();
    let materials = recorded.pages_containing("warehouse offline");
    assert_eq!(materials.len(), 1);
    assert!(recorded.pages_containing("Main Materials Detail").is_empty());

    let diversion = recorded.pages_containing("no weighbridge data");
    assert_eq!(diversion.len(), 1);
    assert!(recorded.pages_containing("Waste Diversion Detail").is_empty());
}

#[test]
fn malformed_payload_is_an_error() {
    let err = renderer().render_json(r#"{"location": "Riverside"}"#).unwrap_err();
    assert!(matches!(err, waste_report::ReportError::Payload(_)));
}
