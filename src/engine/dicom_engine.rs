use std::cmp::Ordering;
use std::sync::Arc;

use dicom::core::Tag;
use dicom::object::{DefaultDicomObject, from_reader};
use dicom::pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption};
use dicom_dictionary_std::tags;
use futures::channel::oneshot;
use image::GrayImage;
use ndarray::{Array2, s};
use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use web_time::Instant;

use super::{Engine, Surface};
use crate::config::EngineConfig;
use crate::enums::{Orientation, SortBy};
use crate::error::DecodeError;
use crate::hierarchy::{Hierarchy, HierarchyBuilder, InstanceRecord, SeriesAttributes, SeriesKey};
use crate::metadata::Metadata;
use crate::volume::Volume;

const PREAMBLE_LEN: usize = 128;
const DEFAULT_SPACING: (f32, f32, f32) = (1.0, 1.0, 1.0);

/// One parsed file: where it belongs in the hierarchy and its first frame
#[derive(Debug, Clone)]
pub struct DecodedInstance {
    pub record: InstanceRecord,
    pub sort_key: Option<f32>,
    /// (column spacing, row spacing, slice thickness)
    pub spacing: Option<(f32, f32, f32)>,
    pub pixels: Array2<u16>,
}

impl DecodedInstance {
    /// Parses a file with or without its 128 byte preamble.
    ///
    /// `index` is the position of the buffer in its batch and only ends up
    /// in error messages.
    pub fn from_bytes(index: usize, bytes: &[u8], sort_by: SortBy) -> Result<Self, DecodeError> {
        let offset = if bytes.len() >= PREAMBLE_LEN + 4
            && &bytes[PREAMBLE_LEN..PREAMBLE_LEN + 4] == b"DICM"
        {
            PREAMBLE_LEN
        } else {
            0
        };
        let object = from_reader(&bytes[offset..]).map_err(|err| DecodeError::Parse {
            index,
            message: err.to_string(),
        })?;

        let required = |tag: Tag, attribute: &'static str| {
            attribute_text(&object, tag).ok_or(DecodeError::MissingAttribute { index, attribute })
        };
        let record = InstanceRecord {
            patient_id: attribute_text(&object, tags::PATIENT_ID)
                .unwrap_or_else(|| "Unknown".to_string()),
            study_instance_uid: required(tags::STUDY_INSTANCE_UID, "StudyInstanceUID")?,
            series_instance_uid: required(tags::SERIES_INSTANCE_UID, "SeriesInstanceUID")?,
            sop_instance_uid: required(tags::SOP_INSTANCE_UID, "SOPInstanceUID")?,
            instance_number: attribute_int(&object, tags::INSTANCE_NUMBER),
            series: SeriesAttributes {
                series_number: attribute_int(&object, tags::SERIES_NUMBER),
                series_date: attribute_text(&object, tags::SERIES_DATE).unwrap_or_default(),
                series_time: attribute_text(&object, tags::SERIES_TIME).unwrap_or_default(),
                modality: attribute_text(&object, tags::MODALITY).unwrap_or_default(),
                body_part_examined: attribute_text(&object, tags::BODY_PART_EXAMINED)
                    .unwrap_or_default(),
            },
        };

        let pixels = decode_first_frame(&object).map_err(|message| DecodeError::PixelData {
            index,
            message,
        })?;

        Ok(Self {
            record,
            sort_key: sort_key(&object, sort_by),
            spacing: spacing(&object),
            pixels,
        })
    }
}

fn attribute_text(object: &DefaultDicomObject, tag: Tag) -> Option<String> {
    object
        .element(tag)
        .ok()
        .and_then(|element| element.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn attribute_int(object: &DefaultDicomObject, tag: Tag) -> Option<i32> {
    object.element(tag).ok()?.to_int::<i32>().ok()
}

fn sort_key(object: &DefaultDicomObject, sort_by: SortBy) -> Option<f32> {
    match sort_by {
        SortBy::ImagePositionPatient => object
            .element(tags::IMAGE_POSITION_PATIENT)
            .ok()?
            .to_multi_float32()
            .ok()?
            .get(2)
            .copied(),
        SortBy::TablePosition => object
            .element(tags::TABLE_POSITION)
            .ok()?
            .to_float32()
            .ok(),
        SortBy::InstanceNumber => attribute_int(object, tags::INSTANCE_NUMBER).map(|n| n as f32),
        SortBy::None => None,
    }
}

fn spacing(object: &DefaultDicomObject) -> Option<(f32, f32, f32)> {
    let pixel_spacing = object
        .element(tags::PIXEL_SPACING)
        .ok()?
        .to_multi_float32()
        .ok()?;
    let slice_thickness = object
        .element(tags::SLICE_THICKNESS)
        .ok()?
        .to_float32()
        .ok()?;
    // Pixel Spacing is (row spacing, column spacing)
    Some((*pixel_spacing.get(1)?, *pixel_spacing.first()?, slice_thickness))
}

fn decode_first_frame(object: &DefaultDicomObject) -> Result<Array2<u16>, String> {
    let pixel_data = object.decode_pixel_data().map_err(|err| err.to_string())?;
    let options = ConvertOptions::new().with_voi_lut(VoiLutOption::First);
    pixel_data
        .to_ndarray_with_options::<u16>(&options)
        .map(|arr| arr.slice_move(s![0, .., .., 0]))
        .map_err(|err| err.to_string())
}

/// Decodes a whole batch; the first failing buffer fails it
fn decode_all(buffers: &[Vec<u8>], sort_by: SortBy) -> Result<Vec<DecodedInstance>, DecodeError> {
    buffers
        .par_iter()
        .enumerate()
        .map(|(index, bytes)| DecodedInstance::from_bytes(index, bytes, sort_by))
        .collect()
}

/// Orders sort keys; instances without a key come first in input order
fn compare_sort_keys(a: Option<f32>, b: Option<f32>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ordering = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// [`Engine`] backed by dicom-rs decoding and an in-memory volume.
///
/// Axial navigation walks the instances of the active range one by one;
/// coronal and sagittal views reformat the range stacked as a volume. Any
/// change of filter or orientation resets the position to the first slice.
pub struct DicomEngine<S> {
    config: EngineConfig,
    surface: S,
    /// Pool running the bulk decode, the global rayon pool when unset
    thread_pool: Option<Arc<ThreadPool>>,
    instances: Vec<DecodedInstance>,
    hierarchy: Hierarchy,
    filter: Option<SeriesKey>,
    orientation: Orientation,
    /// Indices into `instances`, filtered and sorted
    range: Vec<usize>,
    volume: Option<Volume>,
    current_index: usize,
}

impl<S: Surface> DicomEngine<S> {
    pub fn new(surface: S, config: EngineConfig) -> Self {
        Self {
            config,
            surface,
            thread_pool: None,
            instances: Vec::new(),
            hierarchy: Hierarchy::default(),
            filter: None,
            orientation: Orientation::Axial,
            range: Vec::new(),
            volume: None,
            current_index: 0,
        }
    }

    /// Runs decoding on `pool` instead of the global rayon pool
    pub fn with_thread_pool(mut self, pool: Arc<ThreadPool>) -> Self {
        self.thread_pool = Some(pool);
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Replaces the dataset with instances that are already decoded
    pub fn load_instances(&mut self, instances: Vec<DecodedInstance>) {
        let mut builder = HierarchyBuilder::new();
        for instance in &instances {
            builder.add(&instance.record);
        }
        self.hierarchy = builder.build();
        self.instances = instances;
        self.filter = None;
        self.orientation = Orientation::Axial;
        self.current_index = 0;
        self.update_range();
    }

    fn total(&self) -> usize {
        match self.orientation {
            Orientation::Axial => self.range.len(),
            orientation => self
                .volume
                .as_ref()
                .map_or(0, |volume| volume.slice_count(orientation)),
        }
    }

    fn update_range(&mut self) {
        let instances = &self.instances;
        self.range = (0..instances.len())
            .filter(|&i| match &self.filter {
                Some(series) => instances[i].record.series_instance_uid == series.as_str(),
                None => true,
            })
            .collect();

        if !matches!(self.config.sort_by, SortBy::None) {
            let descending = matches!(self.config.sort_by, SortBy::ImagePositionPatient);
            self.range.sort_by(|&a, &b| {
                compare_sort_keys(instances[a].sort_key, instances[b].sort_key, descending)
            });
        }

        self.volume = None;
        self.ensure_volume();
    }

    fn ensure_volume(&mut self) {
        if self.orientation == Orientation::Axial || self.volume.is_some() {
            return;
        }
        let slices: Vec<_> = self.range.iter().map(|&i| &self.instances[i].pixels).collect();
        let spacing = self
            .range
            .iter()
            .find_map(|&i| self.instances[i].spacing)
            .unwrap_or(DEFAULT_SPACING);
        self.volume = Volume::from_slices(&slices, spacing);
        if self.volume.is_none() && !slices.is_empty() {
            warn!(
                "Cannot reformat {} slices of differing sizes, {:?} view is empty",
                slices.len(),
                self.orientation
            );
        }
    }

    fn frame_at(&self, index: usize) -> Option<GrayImage> {
        match self.orientation {
            Orientation::Axial => {
                let instance = &self.instances[*self.range.get(index)?];
                Volume::slice_to_image(&instance.pixels.view())
            }
            orientation => self.volume.as_ref()?.get_image_from_axis(
                index,
                orientation,
                self.config.interpolation,
            ),
        }
    }

    fn draw_current(&mut self) {
        if self.total() == 0 {
            self.surface.clear();
            return;
        }
        match self.frame_at(self.current_index) {
            Some(frame) => {
                debug!(
                    "Rendering {:?} slice {} of {}",
                    self.orientation,
                    self.current_index,
                    self.total()
                );
                self.surface.present(&frame);
            }
            None => warn!("Could not build frame at {}", self.current_index),
        }
    }
}

impl<S: Surface> Engine for DicomEngine<S> {
    async fn decode_and_load(&mut self, buffers: Vec<Vec<u8>>) -> Result<(), DecodeError> {
        if buffers.is_empty() {
            return Err(DecodeError::Empty);
        }
        let start = Instant::now();
        let sort_by = self.config.sort_by;
        let (sender, receiver) = oneshot::channel();
        let job = move || {
            if sender.send(decode_all(&buffers, sort_by)).is_err() {
                debug!("Load was abandoned, dropping decoded files");
            }
        };
        match &self.thread_pool {
            Some(pool) => pool.spawn(job),
            None => rayon::spawn(job),
        }

        let instances = receiver.await.map_err(|_| DecodeError::Interrupted)??;
        info!(
            "Decoding {} files has taken: {} ms",
            instances.len(),
            start.elapsed().as_millis()
        );

        self.load_instances(instances);
        Ok(())
    }

    fn render_at(&mut self, index: usize) {
        if index >= self.total() {
            info!("Image at index {} not found", index);
            return;
        }
        self.current_index = index;
        self.draw_current();
    }

    fn render_next(&mut self) {
        if self.current_index + 1 >= self.total() {
            debug!("Next image after {} not found", self.current_index);
            return;
        }
        self.current_index += 1;
        self.draw_current();
    }

    fn render_previous(&mut self) {
        if self.current_index == 0 {
            debug!("Already at the first image");
            return;
        }
        self.current_index -= 1;
        self.draw_current();
    }

    fn metadata(&self) -> Metadata {
        Metadata::new(self.current_index, self.total())
    }

    fn hierarchy(&self) -> Hierarchy {
        self.hierarchy.clone()
    }

    fn set_series_filter(&mut self, series: &SeriesKey) {
        self.filter = Some(series.clone());
        self.current_index = 0;
        self.update_range();
        if self.range.is_empty() {
            warn!("Series {} has no images", series);
        }
        self.draw_current();
    }

    fn reset_filter(&mut self) {
        self.filter = None;
        self.current_index = 0;
        self.update_range();
        self.draw_current();
    }

    fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
        self.current_index = 0;
        self.ensure_volume();
        self.draw_current();
    }
}
