use data_release_core::metadata::{load_metadata, MetadataError};
use std::fs::write;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn loads_typed_fields_and_keeps_unknown_keys() {
    let file = NamedTempFile::new().unwrap();
    write(
        file.path(),
        r#"{
            "title": "Immune state geometry",
            "upload_type": "software",
            "description": "Code and processed tables",
            "creators": [
                {"name": "Doe, Jane", "affiliation": "Institute", "orcid": "0000-0002-1825-0097"},
                {"name": "Roe, Rick", "gnd": "12345"}
            ],
            "license": "MIT",
            "keywords": ["scATAC"]
        }"#,
    )
    .unwrap();

    let metadata = load_metadata(file.path()).expect("metadata should load");

    assert_eq!(metadata.title.as_deref(), Some("Immune state geometry"));
    assert_eq!(metadata.upload_type.as_deref(), Some("software"));
    assert_eq!(metadata.creators.len(), 2);
    assert_eq!(metadata.creators[0].orcid.as_deref(), Some("0000-0002-1825-0097"));
    assert_eq!(metadata.creators[1].extra["gnd"], "12345");
    assert_eq!(metadata.extra["license"], "MIT");

    // Unknown keys survive the trip back to JSON.
    let sent = serde_json::to_value(&metadata).unwrap();
    assert_eq!(sent["keywords"][0], "scATAC");
    assert_eq!(sent["creators"][1]["gnd"], "12345");
    assert!(sent.get("version").is_none());
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempdir().unwrap();
    let err = load_metadata(dir.path().join(".zenodo.json")).unwrap_err();
    assert!(matches!(err, MetadataError::NotFound { .. }));
}

#[test]
fn non_object_json_is_invalid() {
    let file = NamedTempFile::new().unwrap();
    write(file.path(), "[1, 2, 3]").unwrap();

    let err = load_metadata(file.path()).unwrap_err();
    assert!(matches!(err, MetadataError::Invalid { .. }));
}

#[test]
fn malformed_json_is_invalid() {
    let file = NamedTempFile::new().unwrap();
    write(file.path(), "{ \"title\": ").unwrap();

    let err = load_metadata(file.path()).unwrap_err();
    assert!(matches!(err, MetadataError::Invalid { .. }));
}
