#![allow(dead_code)]

use dicom_session::engine::Engine;
use dicom_session::hierarchy::{HierarchyBuilder, InstanceRecord};
use dicom_session::{DecodeError, Hierarchy, Metadata, Orientation, SeriesKey};

pub const SAGITTAL_SLICES: usize = 16;
pub const CORONAL_SLICES: usize = 12;

/// Engine double: every buffer is one slice whose bytes name its series.
/// A buffer reading `corrupt` fails the batch and one reading `stall` never
/// lets it finish.
#[derive(Default)]
pub struct FakeEngine {
    slices: Vec<String>,
    hierarchy: Hierarchy,
    filter: Option<SeriesKey>,
    orientation: Orientation,
    current: usize,
    pub calls: Vec<String>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn total(&self) -> usize {
        match self.orientation {
            Orientation::Axial => match &self.filter {
                Some(series) => self
                    .slices
                    .iter()
                    .filter(|slice| slice.as_str() == series.as_str())
                    .count(),
                None => self.slices.len(),
            },
            Orientation::Sagittal => SAGITTAL_SLICES,
            Orientation::Coronal => CORONAL_SLICES,
        }
    }
}

impl Engine for FakeEngine {
    async fn decode_and_load(&mut self, buffers: Vec<Vec<u8>>) -> Result<(), DecodeError> {
        self.calls.push(format!("decode_and_load({})", buffers.len()));
        if buffers.iter().any(|buffer| buffer.as_slice() == b"stall") {
            futures::future::pending::<()>().await;
        }

        let mut slices = Vec::new();
        for (index, buffer) in buffers.iter().enumerate() {
            let series = String::from_utf8_lossy(buffer).to_string();
            if series == "corrupt" {
                return Err(DecodeError::Parse {
                    index,
                    message: "unexpected preamble".to_string(),
                });
            }
            slices.push(series);
        }

        let mut builder = HierarchyBuilder::new();
        for (index, series) in slices.iter().enumerate() {
            builder.add(&InstanceRecord {
                patient_id: "patient".to_string(),
                study_instance_uid: "study".to_string(),
                series_instance_uid: series.clone(),
                sop_instance_uid: format!("sop-{index}"),
                instance_number: Some(index as i32 + 1),
                ..Default::default()
            });
        }
        self.hierarchy = builder.build();
        self.slices = slices;
        self.filter = None;
        self.orientation = Orientation::Axial;
        self.current = 0;
        Ok(())
    }

    fn render_at(&mut self, index: usize) {
        self.calls.push(format!("render_at({index})"));
        if index < self.total() {
            self.current = index;
        }
    }

    fn render_next(&mut self) {
        self.calls.push("render_next".to_string());
        if self.current + 1 < self.total() {
            self.current += 1;
        }
    }

    fn render_previous(&mut self) {
        self.calls.push("render_previous".to_string());
        self.current = self.current.saturating_sub(1);
    }

    fn metadata(&self) -> Metadata {
        Metadata::new(self.current, self.total())
    }

    fn hierarchy(&self) -> Hierarchy {
        self.hierarchy.clone()
    }

    fn set_series_filter(&mut self, series: &SeriesKey) {
        self.calls.push(format!("set_series_filter({series})"));
        self.filter = Some(series.clone());
        self.current = 0;
    }

    fn reset_filter(&mut self) {
        self.calls.push("reset_filter".to_string());
        self.filter = None;
        self.current = 0;
    }

    fn set_orientation(&mut self, orientation: Orientation) {
        self.calls.push(format!("set_orientation({orientation:?})"));
        self.orientation = orientation;
        self.current = 0;
    }
}

/// `count` buffers all belonging to `series`
pub fn buffers(series: &str, count: usize) -> Vec<Vec<u8>> {
    vec![series.as_bytes().to_vec(); count]
}
