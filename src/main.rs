use std::path::PathBuf;

use dicom_session::{
    DicomEngine, Gesture, Notification, Orientation, PngSurface, Viewer, ViewerConfig,
    ingest::sources_from_directory,
};
use tracing_subscriber::EnvFilter;

const FRAME_PATH: &str = "slice.png";

/// Loads every ".dcm" file of a directory and writes the centre slice of each
/// orientation as PNG.
///
/// Usage: `dicom-session [DIRECTORY] [CONFIG.toml]`
#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let directory = PathBuf::from(args.next().unwrap_or_else(|| "dicom".to_string()));
    let config = match args.next() {
        Some(path) => ViewerConfig::load(path).expect("should have read the configuration"),
        None => ViewerConfig::default(),
    };

    let engine = DicomEngine::new(PngSurface::new(FRAME_PATH), config.engine);
    let mut viewer = Viewer::new(engine, Vec::<Notification>::new(), config.session)
        .expect("should have initialized the viewer");

    let sources =
        sources_from_directory(&directory).expect("should have listed files from directory");
    let loaded = viewer.open(sources).await;
    for notification in viewer.sink() {
        println!("{}", notification.message);
    }
    if loaded.is_err() {
        return;
    }

    for (orientation, file) in [
        (Orientation::Axial, "axial.png"),
        (Orientation::Coronal, "coronal.png"),
        (Orientation::Sagittal, "sagittal.png"),
    ] {
        viewer
            .gesture(Gesture::PickOrientation(orientation))
            .expect("should have changed orientation");
        let total = viewer.session().metadata().total();
        if total == 0 {
            println!("No {orientation:?} view available");
            continue;
        }
        viewer
            .gesture(Gesture::Slider {
                position: total / 2 + 1,
            })
            .expect("should have rendered the centre slice");
        std::fs::copy(FRAME_PATH, file).expect("should have written the slice");
        println!("Wrote {file} ({orientation:?} slice {} of {total})", total / 2 + 1);
    }
}
