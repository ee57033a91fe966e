//! The decoding and rendering capability the session drives.
//!
//! The session only talks to an engine through [`Engine`], so it can run
//! against [`DicomEngine`] or against a fake in tests.

use std::future::Future;

use crate::enums::Orientation;
use crate::error::DecodeError;
use crate::hierarchy::{Hierarchy, SeriesKey};
use crate::metadata::Metadata;

mod dicom_engine;
mod surface;

pub use dicom_engine::{DecodedInstance, DicomEngine};
pub use surface::{FrameBuffer, PngSurface, Surface};

pub trait Engine {
    /// Decodes a batch and replaces the whole dataset with it.
    ///
    /// A successful load also clears the series filter and goes back to the
    /// axial orientation. On error the previous dataset must still be in
    /// place.
    fn decode_and_load(
        &mut self,
        buffers: Vec<Vec<u8>>,
    ) -> impl Future<Output = Result<(), DecodeError>>;

    /// Renders the slice at `index` of the current navigable range
    fn render_at(&mut self, index: usize);

    fn render_next(&mut self);

    fn render_previous(&mut self);

    fn metadata(&self) -> Metadata;

    fn hierarchy(&self) -> Hierarchy;

    fn set_series_filter(&mut self, series: &SeriesKey);

    fn reset_filter(&mut self);

    fn set_orientation(&mut self, orientation: Orientation);
}
