//! Integration tests for generating deployment XForms

mod common;

use common::{FakeConverter, MINIMAL_XFORM};
use odk_relay::core::transform::{generate_updated_xform, rewrite_bindings, InstanceRewrite};
use odk_relay::domain::{GeodataCategory, XFormId};
use tempfile::TempDir;

#[tokio::test]
async fn test_spreadsheet_is_converted_and_bound() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("survey.xlsx");
    std::fs::write(&input, b"spreadsheet bytes").unwrap();
    let xform_path = dir.path().join("42").join("form-42.xml");

    let converter = FakeConverter::new(MINIMAL_XFORM);
    let category = GeodataCategory::new("buildings").unwrap();

    let updated = generate_updated_xform(&converter, &input, &xform_path, "xlsx", &category)
        .await
        .unwrap();

    assert_eq!(updated.form_id.as_str(), "form-42");
    assert_eq!(updated.report.change_count(), 2);

    let written = std::fs::read_to_string(&xform_path).unwrap();
    assert_eq!(written, updated.report.xml);
    assert!(written.contains(r#"<data id="form-42" version="1">"#));
    assert!(written.contains(r#"src="jr://file/buildings.geojson""#));
    assert!(!written.contains("features.geojson"));
    // untouched parts survive byte for byte
    assert!(written.starts_with("<?xml version=\"1.0\"?>\n<h:html"));
    assert!(written.contains("<h:title>survey</h:title>"));
}

#[tokio::test]
async fn test_xform_input_skips_conversion() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("upload.xml");
    std::fs::write(&input, MINIMAL_XFORM).unwrap();
    let xform_path = dir.path().join("roads.xml");

    // would write garbage if it were called
    let converter = FakeConverter::new("not xml");
    let category = GeodataCategory::new("roads").unwrap();

    let updated = generate_updated_xform(&converter, &input, &xform_path, ".XML", &category)
        .await
        .unwrap();

    assert!(updated.report.xml.contains(r#"<data id="roads" version="1">"#));
    assert!(updated.report.xml.contains("jr://file/roads.geojson"));
}

#[tokio::test]
async fn test_empty_conversion_output_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("survey.xls");
    std::fs::write(&input, b"x").unwrap();

    let converter = FakeConverter::new("");
    let category = GeodataCategory::new("buildings").unwrap();

    let err = generate_updated_xform(
        &converter,
        &input,
        &dir.path().join("survey.xml"),
        "xls",
        &category,
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("is empty!"));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_second_rewrite_changes_nothing() {
    let form_id = XFormId::new("form-42").unwrap();
    let category = GeodataCategory::new("buildings").unwrap();

    let first = rewrite_bindings(MINIMAL_XFORM, &form_id, &category).unwrap();
    let second = rewrite_bindings(&first.xml, &form_id, &category).unwrap();

    assert_eq!(second.xml, first.xml);
    assert_eq!(second.change_count(), 0);
    assert!(second
        .instances
        .iter()
        .all(|i| matches!(i, InstanceRewrite::Rewritten { .. })));
}

#[test]
fn test_instance_without_xforms_namespace_is_reported() {
    let xml = r#"<h:html xmlns:h="http://www.w3.org/1999/xhtml">
<h:head><h:model>
<h:instance><h:data id="survey"/></h:instance>
</h:model></h:head></h:html>"#;

    let report = rewrite_bindings(
        xml,
        &XFormId::new("form-42").unwrap(),
        &GeodataCategory::new("buildings").unwrap(),
    )
    .unwrap();

    assert_eq!(report.xml, xml);
    assert_eq!(report.skipped().count(), 1);
}
