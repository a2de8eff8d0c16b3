use data_release_core::contract::{
    Deposition, DepositionFile, MockArchive, MockReleaseSource, PublishedRecord, Release,
    ReleaseAsset, ReleaseRef,
};
use data_release_core::error::ApiError;
use data_release_core::metadata::MetadataError;
use data_release_core::publish::{publish_release, PublishError, PublishRequest};
use data_release_core::release_info::ReleaseInfo;
use mockall::Sequence;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn status_error(url: &str, status: u16) -> ApiError {
    ApiError::Status {
        url: url.to_string(),
        status: reqwest::StatusCode::from_u16(status).unwrap(),
        body: "simulated failure".to_string(),
    }
}

/// Scratch workspace holding a metadata file; staging and output live inside it.
fn workspace() -> (TempDir, PublishRequest) {
    let dir = tempdir().unwrap();
    let metadata_path = dir.path().join(".zenodo.json");
    std::fs::write(
        &metadata_path,
        r#"{"title": "Release under test", "upload_type": "dataset"}"#,
    )
    .unwrap();

    let mut request = PublishRequest::new(ReleaseRef::new("octo", "analysis", "v1.2.0"));
    request.metadata_path = metadata_path;
    request.staging_dir = dir.path().join("releases");
    request.release_info_path = dir.path().join("zenodo_release.json");
    (dir, request)
}

fn release_with(names: &[&str]) -> Release {
    Release {
        tag_name: "v1.2.0".into(),
        name: None,
        assets: names
            .iter()
            .map(|n| ReleaseAsset {
                name: n.to_string(),
                browser_download_url: format!("https://github.example/dl/{n}"),
                size: 4,
            })
            .collect(),
    }
}

fn source_downloading(names: &'static [&'static str]) -> MockReleaseSource {
    let mut source = MockReleaseSource::new();
    source
        .expect_fetch_release()
        .times(1)
        .returning(move |_| Ok(release_with(names)));
    source
        .expect_download_asset()
        .times(names.len())
        .returning(|asset, dir| {
            let path = dir.join(&asset.name);
            std::fs::write(&path, b"data").unwrap();
            Ok(path)
        });
    source
}

fn uploaded(path: &Path) -> DepositionFile {
    DepositionFile {
        id: format!("file-{}", path.display()),
        filename: path.file_name().unwrap().to_string_lossy().into_owned(),
        filesize: 4,
    }
}

#[tokio::test]
async fn happy_path_runs_every_step_in_order_and_saves_release_info() {
    let (_dir, request) = workspace();
    let mut seq = Sequence::new();

    let mut source = MockReleaseSource::new();
    source
        .expect_fetch_release()
        .withf(|r| r.owner == "octo" && r.repo == "analysis" && r.tag == "v1.2.0")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(release_with(&["code.zip", "tables.tar.gz"])));
    for name in ["code.zip", "tables.tar.gz"] {
        source
            .expect_download_asset()
            .withf(move |asset, _| asset.name == name)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|asset, dir| {
                let path = dir.join(&asset.name);
                std::fs::write(&path, b"data").unwrap();
                Ok(path)
            });
    }

    let mut archive = MockArchive::new();
    archive
        .expect_create_deposition()
        .withf(|m| m.title.as_deref() == Some("Release under test"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| {
            Ok(Deposition {
                id: 900,
                bucket_url: Some("https://zenodo.example/api/files/b".into()),
            })
        });
    for name in ["code.zip", "tables.tar.gz"] {
        archive
            .expect_upload_file()
            .withf(move |id, path| *id == 900 && path.ends_with(name))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, path| Ok(uploaded(&path)));
    }
    archive
        .expect_publish()
        .withf(|id| *id == 900)
        .times(1)
        .in_sequence(&mut seq)
        .returning(|id| {
            Ok(PublishedRecord {
                deposition_id: id,
                record_id: 901,
                doi: Some("10.5281/zenodo.901".into()),
                record_url: "https://zenodo.org/records/901".into(),
            })
        });

    let report = publish_release(&request, &source, &archive)
        .await
        .expect("pipeline should succeed");

    assert_eq!(report.record.record_id, 901);
    assert_eq!(report.uploaded.len(), 2);
    assert_eq!(report.uploaded[0].filename, "code.zip");
    assert_eq!(report.uploaded[1].filename, "tables.tar.gz");
    assert!(request.staging_dir.join("code.zip").exists());

    let saved = ReleaseInfo::load(&request.release_info_path).unwrap();
    assert_eq!(saved, report.info);
    assert_eq!(saved.deposition_id, 900);
    assert_eq!(saved.record_id, 901);
    assert_eq!(saved.doi.as_deref(), Some("10.5281/zenodo.901"));
    assert_eq!(saved.url, "https://zenodo.org/records/901");
    assert_eq!(saved.tag, "v1.2.0");
}

#[tokio::test]
async fn missing_metadata_stops_before_any_remote_call() {
    let (dir, mut request) = workspace();
    request.metadata_path = dir.path().join("absent.json");

    let mut source = MockReleaseSource::new();
    source.expect_fetch_release().never();
    let mut archive = MockArchive::new();
    archive.expect_create_deposition().never();

    let err = publish_release(&request, &source, &archive)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PublishError::Metadata(MetadataError::NotFound { .. })
    ));
}

#[tokio::test]
async fn failing_release_lookup_prevents_deposition() {
    let (_dir, request) = workspace();

    let mut source = MockReleaseSource::new();
    source
        .expect_fetch_release()
        .times(1)
        .returning(|_| Err(status_error("https://api.github.example/release", 404)));
    source.expect_download_asset().never();
    let mut archive = MockArchive::new();
    archive.expect_create_deposition().never();

    let err = publish_release(&request, &source, &archive)
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::FetchRelease { .. }));
}

#[tokio::test]
async fn failing_asset_download_prevents_deposition_creation() {
    let (_dir, request) = workspace();

    let mut source = MockReleaseSource::new();
    source
        .expect_fetch_release()
        .times(1)
        .returning(|_| Ok(release_with(&["first.zip", "second.zip"])));
    source
        .expect_download_asset()
        .times(1)
        .returning(|asset, _| Err(status_error(&asset.browser_download_url, 502)));
    let mut archive = MockArchive::new();
    archive.expect_create_deposition().never();
    archive.expect_upload_file().never();
    archive.expect_publish().never();

    let err = publish_release(&request, &source, &archive)
        .await
        .unwrap_err();

    match err {
        PublishError::DownloadAsset { asset, .. } => assert_eq!(asset, "first.zip"),
        other => panic!("expected download failure, got {other:?}"),
    }
    assert!(!request.release_info_path.exists());
}

#[tokio::test]
async fn failing_deposition_creation_prevents_uploads() {
    let (_dir, request) = workspace();
    let source = source_downloading(&["code.zip"]);

    let mut archive = MockArchive::new();
    archive
        .expect_create_deposition()
        .times(1)
        .returning(|_| Err(status_error("https://zenodo.example/api/deposit/depositions", 401)));
    archive.expect_upload_file().never();
    archive.expect_publish().never();

    let err = publish_release(&request, &source, &archive)
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::CreateDeposition(_)));
    assert!(!request.release_info_path.exists());
}

#[tokio::test]
async fn failing_upload_prevents_remaining_uploads_and_publish() {
    let (_dir, request) = workspace();
    let source = source_downloading(&["a.zip", "b.zip"]);

    let mut archive = MockArchive::new();
    archive
        .expect_create_deposition()
        .times(1)
        .returning(|_| Ok(Deposition { id: 3, bucket_url: None }));
    archive
        .expect_upload_file()
        .times(1)
        .returning(|_, _| Err(status_error("https://zenodo.example/api/deposit/depositions/3/files", 500)));
    archive.expect_publish().never();

    let err = publish_release(&request, &source, &archive)
        .await
        .unwrap_err();

    match err {
        PublishError::UploadFile {
            deposition_id,
            path,
            ..
        } => {
            assert_eq!(deposition_id, 3);
            assert_eq!(path.file_name().unwrap(), "a.zip");
        }
        other => panic!("expected upload failure, got {other:?}"),
    }
    assert!(!request.release_info_path.exists());
}

#[tokio::test]
async fn failing_publish_leaves_no_release_info() {
    let (_dir, request) = workspace();
    let source = source_downloading(&["a.zip"]);

    let mut archive = MockArchive::new();
    archive
        .expect_create_deposition()
        .times(1)
        .returning(|_| Ok(Deposition { id: 3, bucket_url: None }));
    archive
        .expect_upload_file()
        .times(1)
        .returning(|_, path| Ok(uploaded(&path)));
    archive
        .expect_publish()
        .times(1)
        .returning(|_| Err(status_error("https://zenodo.example/api/deposit/depositions/3/actions/publish", 400)));

    let err = publish_release(&request, &source, &archive)
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::Publish { deposition_id: 3, .. }));
    assert!(!request.release_info_path.exists());
}

#[tokio::test]
async fn release_without_assets_has_nothing_to_upload() {
    let (_dir, request) = workspace();
    let source = source_downloading(&[]);
    let mut archive = MockArchive::new();
    archive.expect_create_deposition().never();

    let err = publish_release(&request, &source, &archive)
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::NoFiles { .. }));
}

#[tokio::test]
async fn skip_download_uploads_already_staged_files_without_lookup() {
    let (_dir, mut request) = workspace();
    request.skip_download = true;
    std::fs::create_dir_all(request.staging_dir.join("nested")).unwrap();
    std::fs::write(request.staging_dir.join("b.zip"), b"b").unwrap();
    std::fs::write(request.staging_dir.join("a.zip"), b"a").unwrap();

    let mut source = MockReleaseSource::new();
    source.expect_fetch_release().never();
    source.expect_download_asset().never();

    let mut archive = MockArchive::new();
    archive
        .expect_create_deposition()
        .times(1)
        .returning(|_| Ok(Deposition { id: 11, bucket_url: None }));
    archive
        .expect_upload_file()
        .times(2)
        .returning(|_, path| Ok(uploaded(&path)));
    archive.expect_publish().times(1).returning(|id| {
        Ok(PublishedRecord {
            deposition_id: id,
            record_id: 12,
            doi: None,
            record_url: "https://sandbox.zenodo.org/records/12".into(),
        })
    });

    let report = publish_release(&request, &source, &archive).await.unwrap();

    let names: Vec<_> = report.uploaded.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(names, ["a.zip", "b.zip"]);
    assert_eq!(report.info.doi, None);
}

#[tokio::test]
async fn skip_download_with_no_staging_dir_fails_before_deposition() {
    let (_dir, mut request) = workspace();
    request.skip_download = true;

    let mut source = MockReleaseSource::new();
    source.expect_fetch_release().never();
    let mut archive = MockArchive::new();
    archive.expect_create_deposition().never();

    let err = publish_release(&request, &source, &archive)
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::NoFiles { .. }));
}
