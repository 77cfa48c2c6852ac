use std::io;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream;

use whisper_gateway::infrastructure::storage::{TempAudioFile, UploadError, upload_suffix};

fn chunks(parts: &[&'static [u8]]) -> futures::stream::BoxStream<'static, io::Result<Bytes>> {
    let items: Vec<io::Result<Bytes>> = parts.iter().map(|p| Ok(Bytes::from_static(p))).collect();
    stream::iter(items).boxed()
}

fn entries(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn given_chunked_upload_when_spooling_then_file_holds_all_bytes() {
    let dir = tempfile::tempdir().unwrap();

    let audio = TempAudioFile::spool(Some(dir.path()), "clip.wav", chunks(&[b"RIFF".as_slice(), b"data".as_slice()]))
        .await
        .unwrap();

    assert_eq!(audio.size(), 8);
    assert_eq!(std::fs::read(audio.path()).unwrap(), b"RIFFdata");
    assert!(audio.path().starts_with(dir.path()));
    assert_eq!(
        audio.path().extension().and_then(|e| e.to_str()),
        Some("wav")
    );
}

#[tokio::test]
async fn given_spooled_file_when_dropped_then_file_is_removed() {
    let dir = tempfile::tempdir().unwrap();

    let audio = TempAudioFile::spool(Some(dir.path()), "clip.mp3", chunks(&[b"abc".as_slice()]))
        .await
        .unwrap();
    let path = audio.path().to_path_buf();
    assert!(path.exists());
    drop(audio);

    assert!(!path.exists());
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn given_spooled_file_when_closed_then_file_is_removed() {
    let dir = tempfile::tempdir().unwrap();

    let audio = TempAudioFile::spool(Some(dir.path()), "clip", chunks(&[b"abc".as_slice()]))
        .await
        .unwrap();
    let path = audio.path().to_path_buf();

    audio.close().unwrap();

    assert!(!path.exists());
}

#[tokio::test]
async fn given_failing_stream_when_spooling_then_returns_write_error_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let items: Vec<io::Result<Bytes>> = vec![
        Ok(Bytes::from_static(b"partial")),
        Err(io::Error::other("connection reset")),
    ];

    let result = TempAudioFile::spool(Some(dir.path()), "clip.wav", stream::iter(items).boxed()).await;

    assert!(matches!(result, Err(UploadError::Write(_))));
    assert_eq!(entries(dir.path()), 0);
}

#[tokio::test]
async fn given_missing_directory_when_spooling_then_returns_create_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");

    let result = TempAudioFile::spool(Some(&missing), "clip.wav", chunks(&[b"abc".as_slice()])).await;

    assert!(matches!(result, Err(UploadError::Create(_))));
}

#[test]
fn given_filenames_when_deriving_suffix_then_extension_or_default_is_used() {
    assert_eq!(upload_suffix("clip.wav"), ".wav");
    assert_eq!(upload_suffix("archive.tar.gz"), ".gz");
    assert_eq!(upload_suffix("recording"), ".audio");
    assert_eq!(upload_suffix(".bashrc"), ".audio");
}
