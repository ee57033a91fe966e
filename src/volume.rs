use crate::enums::Interpolation;
use crate::enums::Orientation;
use crate::interpolator::Interpolator;

use image::GrayImage;
use ndarray::Array2;
use ndarray::Array3;
use ndarray::ArrayView2;
use ndarray::s;
use rayon::prelude::*;

/// Slices of one navigable range stacked along depth, used for reformatted views
#[derive(Debug, Default)]
pub struct Volume {
    data: Array3<u16>,
    spacing: (f32, f32, f32),
    interpolated_dim: (u32, u32, u32),
}

impl Volume {
    pub fn new(data: Array3<u16>, spacing: (f32, f32, f32)) -> Self {
        let original_dim = data.dim();
        Self {
            data,
            spacing,
            interpolated_dim: Interpolator::get_isotropic_dimensions(spacing, original_dim),
        }
    }

    /// Stacks equally sized slices; returns `None` for an empty or ragged set
    pub fn from_slices(slices: &[&Array2<u16>], spacing: (f32, f32, f32)) -> Option<Self> {
        let first_dim = slices.first()?.dim();
        if slices.iter().any(|slice| slice.dim() != first_dim) {
            return None;
        }

        let (height, width) = first_dim;
        let mut data = Array3::<u16>::zeros((slices.len(), height, width));
        for (i, slice) in slices.iter().enumerate() {
            data.slice_mut(s![i, .., ..]).assign(*slice);
        }

        Some(Self::new(data, spacing))
    }

    /// Get the dimensions of the volume (depth, height, width)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn spacing(&self) -> (f32, f32, f32) {
        self.spacing
    }

    /// Number of addressable slices along the axis of `orientation`
    pub fn slice_count(&self, orientation: Orientation) -> usize {
        let dim = self.data.dim();
        match orientation {
            Orientation::Axial => dim.0,
            Orientation::Coronal => dim.1,
            Orientation::Sagittal => dim.2,
        }
    }

    #[inline]
    fn normalize_to_u8(value: f32) -> u8 {
        ((value / 65535.0) * 255.0).clamp(0.0, 255.0) as u8
    }

    pub fn get_slice_from_axis(
        &self,
        index: usize,
        orientation: Orientation,
    ) -> Option<ArrayView2<'_, u16>> {
        if index >= self.slice_count(orientation) {
            return None;
        }
        let slice = match orientation {
            Orientation::Axial => self.data.slice(s![index, .., ..]),
            Orientation::Coronal => self.data.slice(s![.., index, ..]),
            Orientation::Sagittal => self.data.slice(s![.., .., index]),
        };
        Some(slice)
    }

    fn get_output_dimensions(&self, orientation: Orientation) -> (u32, u32) {
        // Always (width, height)
        match orientation {
            Orientation::Axial => (self.interpolated_dim.2, self.interpolated_dim.1),
            Orientation::Coronal => (self.interpolated_dim.2, self.interpolated_dim.0),
            Orientation::Sagittal => (self.interpolated_dim.1, self.interpolated_dim.0),
        }
    }

    pub fn slice_to_image(slice: &ArrayView2<'_, u16>) -> Option<GrayImage> {
        let (height, width) = slice.dim();
        let pixel_data: Vec<u8> = slice
            .iter()
            .map(|&v| Self::normalize_to_u8(v as f32))
            .collect();
        GrayImage::from_raw(width as u32, height as u32, pixel_data)
    }

    pub fn get_image_from_axis(
        &self,
        index: usize,
        orientation: Orientation,
        interpolation: Interpolation,
    ) -> Option<GrayImage> {
        let slice = self.get_slice_from_axis(index, orientation)?;

        match interpolation {
            Interpolation::None => Self::slice_to_image(&slice),
            // Axial slices are already isotropic in-plane
            Interpolation::Bilinear if orientation == Orientation::Axial => {
                Self::slice_to_image(&slice)
            }
            Interpolation::Bilinear => {
                let (width, height) = self.get_output_dimensions(orientation);
                Self::interpolate_slice(&slice, width, height)
            }
        }
    }

    fn interpolate_slice(slice: &ArrayView2<'_, u16>, width: u32, height: u32) -> Option<GrayImage> {
        let (slice_height, slice_width) = slice.dim();

        let pixel_data: Vec<u8> = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| {
                (0..width).map(move |x| {
                    // Normalized coordinates with half-pixel offset
                    let norm_x = (x as f32 + 0.5) / width as f32;
                    let norm_y = (y as f32 + 0.5) / height as f32;

                    let src_x = norm_x * slice_width as f32 - 0.5;
                    let src_y = norm_y * slice_height as f32 - 0.5;

                    let src_x = src_x.max(0.0).min((slice_width - 1) as f32);
                    let src_y = src_y.max(0.0).min((slice_height - 1) as f32);

                    let value = Interpolator::bilinear_interpolate(slice, src_y, src_x);
                    Self::normalize_to_u8(value)
                })
            })
            .collect();

        GrayImage::from_raw(width, height, pixel_data)
    }
}
