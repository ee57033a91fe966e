mod common;

use std::io;

use common::FakeEngine;
use dicom_session::ingest::{ByteSource, NamedBuffer};
use dicom_session::{
    Gesture, Metadata, Notification, ReadError, SessionConfig, SessionError, Viewer,
};
use futures::StreamExt;
use futures::channel::mpsc;

enum Input {
    Readable(NamedBuffer),
    Unreadable(&'static str),
}

impl ByteSource for Input {
    fn name(&self) -> String {
        match self {
            Input::Readable(buffer) => buffer.name.clone(),
            Input::Unreadable(name) => name.to_string(),
        }
    }

    async fn read_all(self) -> io::Result<Vec<u8>> {
        match self {
            Input::Readable(buffer) => buffer.read_all().await,
            Input::Unreadable(_) => Err(io::Error::new(io::ErrorKind::InvalidData, "not binary")),
        }
    }
}

fn files(series: &str, count: usize) -> Vec<NamedBuffer> {
    (0..count)
        .map(|i| NamedBuffer::new(format!("{series}-{i}.dcm"), series.as_bytes().to_vec()))
        .collect()
}

fn viewer() -> Viewer<FakeEngine, Vec<Notification>> {
    Viewer::new(FakeEngine::new(), Vec::new(), SessionConfig::default()).unwrap()
}

#[tokio::test]
async fn opening_24_files_reports_the_total() {
    let mut viewer = viewer();
    let metadata = viewer.open(files("a", 24)).await.unwrap();

    assert_eq!(metadata, Metadata::new(0, 24));
    assert_eq!(viewer.sink().len(), 1);
    assert!(viewer.sink()[0].message.contains("24"));
    assert_eq!(viewer.sink()[0].action, "Close");
}

#[tokio::test]
async fn unreadable_file_never_reaches_the_engine() {
    let mut viewer = viewer();
    let inputs = vec![
        Input::Readable(NamedBuffer::new("one.dcm", b"a".to_vec())),
        Input::Unreadable("two.dcm"),
        Input::Readable(NamedBuffer::new("three.dcm", b"a".to_vec())),
    ];
    let error = viewer.open(inputs).await.unwrap_err();

    assert!(matches!(error, SessionError::Read(ReadError::Io { .. })));
    assert!(viewer.session().hierarchy().is_none());
    assert_eq!(viewer.session().metadata(), Metadata::empty());
    assert!(viewer.session().engine().unwrap().calls.is_empty());

    let message = &viewer.sink()[0].message;
    assert!(message.starts_with("⚠️ Could not load files"));
    assert!(message.contains("two.dcm"));
}

#[tokio::test]
async fn unreadable_file_keeps_previous_study() {
    let mut viewer = viewer();
    viewer.open(files("a", 4)).await.unwrap();
    viewer.gesture(Gesture::Scroll { delta_y: -1.0 }).unwrap();
    let before = viewer.session().metadata();

    let empty = NamedBuffer::new("empty.dcm", Vec::new());
    assert!(viewer.open([empty]).await.is_err());
    assert_eq!(viewer.session().metadata(), before);
    assert_eq!(viewer.session().hierarchy().unwrap().instance_count(), 4);
    assert_eq!(viewer.sink().len(), 2);
}

#[tokio::test]
async fn decode_failure_is_reported() {
    let mut viewer = viewer();
    let mut inputs = files("a", 2);
    inputs.push(NamedBuffer::new("bad.dcm", b"corrupt".to_vec()));

    assert!(matches!(
        viewer.open(inputs).await,
        Err(SessionError::Decode(_))
    ));
    assert!(viewer.sink()[0].message.contains("File 2 is not a readable DICOM file"));
}

#[tokio::test]
async fn applied_gestures_are_silent_and_rejections_are_reported() {
    let mut viewer = viewer();
    assert!(viewer.gesture(Gesture::ResetFilter).is_err());
    assert_eq!(viewer.sink().len(), 1);
    assert_eq!(viewer.sink()[0].message, "⚠️ No files loaded");

    viewer.open(files("a", 3)).await.unwrap();
    viewer.gesture(Gesture::Scroll { delta_y: -1.0 }).unwrap();
    viewer.gesture(Gesture::Slider { position: 3 }).unwrap();
    assert_eq!(viewer.sink().len(), 2);
    assert_eq!(viewer.session().metadata(), Metadata::new(2, 3));
}

#[tokio::test]
async fn notifications_can_go_through_a_channel() {
    let (sender, receiver) = mpsc::unbounded();
    let mut viewer = Viewer::new(FakeEngine::new(), sender, SessionConfig::default()).unwrap();
    viewer.open(files("a", 2)).await.unwrap();
    drop(viewer);

    let received: Vec<Notification> = receiver.collect().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].message, "✅ 2 files successfully loaded");
}
