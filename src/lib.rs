//! # DICOM session library
//!
//! This crate keeps a DICOM viewer consistent while the user loads files,
//! browses the patient/study/series/instance tree and scrolls through slices
//! in axial, coronal or sagittal orientation.
//!
//! The pieces, from the bottom up:
//!  - [`ingest`] reads file-like inputs into byte buffers, all or nothing
//!  - [`hierarchy`] is the typed patient → study → series → instance index
//!  - [`engine`] defines the decoding/rendering capability and ships
//!    [`DicomEngine`], built on dicom-rs and an in-memory volume
//!  - [`session`] is the state machine owning the engine and every snapshot
//!    the UI shows
//!  - [`navigation`] maps wheel, slider, tree and orientation input onto the
//!    session
//!  - [`notification`] turns load outcomes into user-facing messages
//!  - [`viewer`] ties the above together for one view
//!
//! The session only talks to the engine through the [`Engine`] trait, so it
//! can be driven by any decoder, including fakes in tests.
//!
//! # Examples
//!
//! ## Loading a directory and scrolling
//!
//! ```no_run
//! # use dicom_session::{DicomEngine, FrameBuffer, Gesture, Viewer, ViewerConfig, Notification};
//! # use dicom_session::ingest::sources_from_directory;
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ViewerConfig::default();
//! let engine = DicomEngine::new(FrameBuffer::new(), config.engine);
//! let mut viewer = Viewer::new(engine, Vec::<Notification>::new(), config.session)?;
//!
//! let metadata = viewer.open(sources_from_directory("dicom")?).await?;
//! println!("{} slices loaded", metadata.total());
//!
//! // scroll down one slice
//! viewer.gesture(Gesture::Scroll { delta_y: -100.0 })?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod enums;
pub mod error;
pub mod hierarchy;
pub mod ingest;
mod interpolator;
pub mod metadata;
pub mod navigation;
pub mod notification;
pub mod session;
pub mod viewer;
pub mod volume;

pub use config::{EngineConfig, SessionConfig, ViewerConfig};
pub use engine::{DicomEngine, Engine, FrameBuffer, PngSurface, Surface};
pub use enums::{FailurePolicy, Interpolation, Orientation, SortBy};
pub use error::{DecodeError, InvalidOperation, ReadError, SessionError};
pub use hierarchy::{Hierarchy, SeriesKey};
pub use metadata::Metadata;
pub use navigation::{Gesture, GestureOutcome, Navigator};
pub use notification::{Notification, NotificationSink};
pub use session::{Session, SessionState};
pub use viewer::Viewer;
