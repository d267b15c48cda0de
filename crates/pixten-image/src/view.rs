use pixten_tensor::{Buffer, DataType, Samples, StridedLayout, TensorDescriptor};

use crate::{
    error::ImageError,
    image::{broadcast_values, check_coords, fill_values, Image},
    index::{IndexSpec, Selection, SpatialIndex, Subscript, TensorIndex},
    physdims::PixelSize,
};

/// The result of indexing an image.
///
/// A regular view is an [`Image`] sharing the buffer of its source. An
/// irregular view addresses arbitrary samples of the source buffer; reading
/// and writing through it touches the source, while [`View::to_image`] copies
/// the selected samples into a new buffer.
#[derive(Clone, Debug)]
pub enum View {
    /// Pixels and tensor elements reachable with strides.
    Regular(Image),
    /// Pixels or tensor elements gathered from explicit offsets.
    Irregular(GatheredView),
}

/// Explicit offsets into a shared buffer.
#[derive(Clone, Debug)]
pub struct GatheredView {
    buffer: Buffer,
    data_type: DataType,
    sizes: Vec<usize>,
    tensor: TensorDescriptor,
    pixel_offsets: Vec<usize>,
    tensor_offsets: Vec<isize>,
    color_space: String,
    pixel_size: PixelSize,
}

enum SpatialSelection {
    PerAxis(Vec<Selection>),
    Linear(Selection),
}

fn shifted(base: usize, delta: isize) -> Result<usize, ImageError> {
    base.checked_add_signed(delta)
        .ok_or_else(|| ImageError::invalid_index("the selection lies before the buffer start"))
}

impl Image {
    /// Index the pixels with one `IndexSpec` per axis.
    ///
    /// A single `IndexSpec` on a multi-axis image indexes the pixels in linear order.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the number of specs is neither 1 nor the
    /// dimensionality, `IndexOutOfBounds` for indices past an axis and
    /// `NotForged` for a raw image.
    ///
    /// # Examples
    ///
    /// ```
    /// use pixten_image::Image;
    ///
    /// let image = Image::from_vec(&[4, 3], vec![0u8; 12]).unwrap();
    /// let mut view = image.at([0..=1, 0..=1]).unwrap();
    /// assert!(view.is_regular());
    ///
    /// view.set_sample(&[0, 0], 0, 7.0).unwrap();
    /// assert_eq!(image.get_sample(&[0, 0], 0).unwrap(), 7.0);
    /// ```
    pub fn at<I: Into<IndexSpec>>(
        &self,
        specs: impl IntoIterator<Item = I>,
    ) -> Result<View, ImageError> {
        self.at_subscript(&Subscript::new().pixels(specs))
    }

    /// Index the pixels in linear order, axis 0 fastest.
    pub fn at_linear(&self, spec: impl Into<IndexSpec>) -> Result<View, ImageError> {
        self.at_subscript(&Subscript::new().spatial(SpatialIndex::Linear(spec.into())))
    }

    /// Select the pixels set in a binary scalar mask of the same sizes.
    pub fn at_mask(&self, mask: &Image) -> Result<View, ImageError> {
        self.at_subscript(&Subscript::new().spatial(SpatialIndex::Mask(mask.clone())))
    }

    /// Select tensor elements of every pixel.
    pub fn at_tensor(&self, index: TensorIndex) -> Result<View, ImageError> {
        self.at_subscript(&Subscript::new().tensor(index))
    }

    /// Resolve a full index expression.
    ///
    /// The view is regular when the tensor and every spatial selection are
    /// strided; linear selections also need the pixels to be reachable with a
    /// single stride. Lists and masks never give a regular view, so the image
    /// made from them owns its samples.
    pub fn at_subscript(&self, subscript: &Subscript) -> Result<View, ImageError> {
        let buffer = self.buffer()?.clone();

        let (tensor_selection, tensor) = match &subscript.tensor {
            Some(index) => index.resolve(&self.tensor)?,
            None => (IndexSpec::All.resolve(self.tensor.elements())?, self.tensor),
        };
        let color_space = if tensor.elements() == self.tensor.elements() {
            self.color_space.clone()
        } else {
            String::new()
        };

        let spatial = self.resolve_spatial(subscript.spatial.as_ref())?;

        if let Selection::Strided {
            start: tensor_start,
            step: tensor_step,
            ..
        } = tensor_selection
        {
            let tensor_stride = self.layout.tensor_stride;
            let regular = match &spatial {
                SpatialSelection::PerAxis(axes) => {
                    self.strided_axes(axes).map(|(sizes, strides, delta)| {
                        (sizes, strides, delta, self.strided_pixel_size(axes))
                    })
                }
                SpatialSelection::Linear(Selection::Strided { start, step, count }) => {
                    self.layout.linear_stride().map(|stride| {
                        (
                            vec![*count],
                            vec![stride * step],
                            stride * *start as isize,
                            PixelSize::default(),
                        )
                    })
                }
                SpatialSelection::Linear(Selection::Gathered(_)) => None,
            };
            if let Some((sizes, strides, delta, pixel_size)) = regular {
                let offset = shifted(
                    self.layout.offset,
                    delta + tensor_start as isize * tensor_stride,
                )?;
                return Ok(View::Regular(Image {
                    buffer: Some(buffer),
                    data_type: self.data_type,
                    layout: StridedLayout {
                        sizes,
                        strides,
                        tensor_stride: tensor_stride * tensor_step,
                        offset,
                    },
                    tensor,
                    color_space,
                    pixel_size,
                }));
            }
        }

        let (sizes, pixel_offsets, pixel_size) = match &spatial {
            SpatialSelection::PerAxis(axes) => (
                axes.iter().map(Selection::len).collect(),
                self.gathered_axes(axes)?,
                self.pixel_size.clone(),
            ),
            SpatialSelection::Linear(selection) => {
                let all = self.layout.pixel_offsets();
                let offsets = selection
                    .indices()
                    .into_iter()
                    .map(|i| {
                        all.get(i).copied().ok_or(ImageError::IndexOutOfBounds {
                            index: i,
                            size: all.len(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                (vec![selection.len()], offsets, PixelSize::default())
            }
        };
        let tensor_offsets = tensor_selection
            .indices()
            .into_iter()
            .map(|t| t as isize * self.layout.tensor_stride)
            .collect();

        Ok(View::Irregular(GatheredView {
            buffer,
            data_type: self.data_type,
            sizes,
            tensor,
            pixel_offsets,
            tensor_offsets,
            color_space,
            pixel_size,
        }))
    }

    fn resolve_spatial(
        &self,
        index: Option<&SpatialIndex>,
    ) -> Result<SpatialSelection, ImageError> {
        let n = self.dimensionality();
        match index {
            None => Ok(SpatialSelection::PerAxis(
                self.sizes()
                    .iter()
                    .map(|&size| IndexSpec::All.resolve(size))
                    .collect::<Result<_, _>>()?,
            )),
            Some(SpatialIndex::PerAxis(specs)) if specs.len() == n => {
                Ok(SpatialSelection::PerAxis(
                    specs
                        .iter()
                        .zip(self.sizes())
                        .map(|(spec, &size)| spec.resolve(size))
                        .collect::<Result<_, _>>()?,
                ))
            }
            Some(SpatialIndex::PerAxis(specs)) if specs.len() == 1 => Ok(
                SpatialSelection::Linear(specs[0].resolve(self.number_of_pixels())?),
            ),
            Some(SpatialIndex::PerAxis(specs)) => Err(ImageError::dimension_mismatch(format!(
                "{} index specs for a {n}-dimensional image",
                specs.len()
            ))),
            Some(SpatialIndex::Linear(spec)) => Ok(SpatialSelection::Linear(
                spec.resolve(self.number_of_pixels())?,
            )),
            Some(SpatialIndex::Mask(mask)) => {
                if !mask.data_type().kind().is_binary() || mask.is_complex() || !mask.is_scalar()
                {
                    return Err(ImageError::dimension_mismatch(format!(
                        "a mask must be a binary scalar image, got {} with {}",
                        mask.data_type(),
                        mask.tensor()
                    )));
                }
                if mask.sizes() != self.sizes() {
                    return Err(ImageError::dimension_mismatch(format!(
                        "mask sizes {:?} differ from image sizes {:?}",
                        mask.sizes(),
                        self.sizes()
                    )));
                }
                let flags = mask.to_vec::<bool>()?;
                Ok(SpatialSelection::Linear(
                    IndexSpec::Mask(flags).resolve(self.number_of_pixels())?,
                ))
            }
        }
    }

    /// Sizes, strides and origin shift for per-axis strided selections.
    fn strided_axes(&self, axes: &[Selection]) -> Option<(Vec<usize>, Vec<isize>, isize)> {
        let mut sizes = Vec::with_capacity(axes.len());
        let mut strides = Vec::with_capacity(axes.len());
        let mut delta = 0isize;
        for (selection, &stride) in axes.iter().zip(&self.layout.strides) {
            let Selection::Strided { start, step, count } = *selection else {
                return None;
            };
            sizes.push(count);
            strides.push(stride * step);
            delta += start as isize * stride;
        }
        Some((sizes, strides, delta))
    }

    /// Pixel size of a strided selection: every axis grows by its step.
    fn strided_pixel_size(&self, axes: &[Selection]) -> PixelSize {
        let mut pixel_size = self.pixel_size.clone();
        for (axis, selection) in axes.iter().enumerate() {
            if let Selection::Strided { step, .. } = *selection {
                if step.unsigned_abs() > 1 {
                    pixel_size.scale(axis, step.unsigned_abs() as f64);
                }
            }
        }
        pixel_size
    }

    /// Offsets of the selected pixels, in linear order of the selection.
    fn gathered_axes(&self, axes: &[Selection]) -> Result<Vec<usize>, ImageError> {
        let contributions: Vec<Vec<isize>> = axes
            .iter()
            .zip(&self.layout.strides)
            .map(|(selection, &stride)| {
                selection
                    .indices()
                    .into_iter()
                    .map(|i| i as isize * stride)
                    .collect()
            })
            .collect();
        let count: usize = contributions.iter().map(Vec::len).product();
        let mut coords = vec![0usize; contributions.len()];
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            let delta: isize = coords
                .iter()
                .zip(&contributions)
                .map(|(&c, axis)| axis[c])
                .sum();
            offsets.push(shifted(self.layout.offset, delta)?);
            for (c, axis) in coords.iter_mut().zip(&contributions) {
                *c += 1;
                if *c < axis.len() {
                    break;
                }
                *c = 0;
            }
        }
        Ok(offsets)
    }
}

impl GatheredView {
    fn samples_per_value(&self) -> usize {
        self.data_type.samples_per_value()
    }

    fn sample_offsets(&self) -> Vec<usize> {
        let parts = self.samples_per_value();
        let mut out =
            Vec::with_capacity(self.pixel_offsets.len() * self.tensor_offsets.len() * parts);
        for &pixel in &self.pixel_offsets {
            for &t in &self.tensor_offsets {
                for part in 0..parts {
                    out.push(
                        pixel
                            .checked_add_signed(t + part as isize)
                            .unwrap_or(usize::MAX),
                    );
                }
            }
        }
        out
    }

    fn sample_offset(&self, coords: &[usize], tensor_index: usize) -> Result<usize, ImageError> {
        check_coords(&self.sizes, coords)?;
        let linear = coords
            .iter()
            .zip(&self.sizes)
            .rev()
            .fold(0, |acc, (&c, &size)| acc * size + c);
        let tensor = self
            .tensor_offsets
            .get(tensor_index)
            .ok_or(ImageError::IndexOutOfBounds {
                index: tensor_index,
                size: self.tensor_offsets.len(),
            })?;
        let pixel = self
            .pixel_offsets
            .get(linear)
            .ok_or(ImageError::IndexOutOfBounds {
                index: linear,
                size: self.pixel_offsets.len(),
            })?;
        shifted(*pixel, *tensor)
    }

    /// Copy the selected samples into an image with a private buffer.
    pub fn to_image(&self) -> Result<Image, ImageError> {
        let samples = self.buffer.read().gather(&self.sample_offsets())?;
        log::debug!(
            "materializing an irregular view of {} pixels",
            self.pixel_offsets.len()
        );
        let mut image = Image::raw(&self.sizes, self.tensor, self.data_type)?;
        image.forge();
        image.write_canonical(&samples)?;
        image.color_space = self.color_space.clone();
        image.pixel_size = self.pixel_size.clone();
        Ok(image)
    }
}

impl View {
    /// Whether the view is an image aliasing the source through strides.
    pub fn is_regular(&self) -> bool {
        matches!(self, View::Regular(_))
    }

    /// Sizes of the selected pixel grid.
    pub fn sizes(&self) -> &[usize] {
        match self {
            View::Regular(image) => image.sizes(),
            View::Irregular(view) => &view.sizes,
        }
    }

    /// The tensor of the selected elements.
    pub fn tensor(&self) -> &TensorDescriptor {
        match self {
            View::Regular(image) => image.tensor(),
            View::Irregular(view) => &view.tensor,
        }
    }

    /// The data type of the source.
    pub fn data_type(&self) -> DataType {
        match self {
            View::Regular(image) => image.data_type(),
            View::Irregular(view) => view.data_type,
        }
    }

    /// Number of selected pixels.
    pub fn number_of_pixels(&self) -> usize {
        self.sizes().iter().product()
    }

    /// Read one sample of the view, the real part for complex data.
    pub fn get_sample(&self, coords: &[usize], tensor_index: usize) -> Result<f64, ImageError> {
        match self {
            View::Regular(image) => image.get_sample(coords, tensor_index),
            View::Irregular(view) => {
                let offset = view.sample_offset(coords, tensor_index)?;
                Ok(view.buffer.read().get_f64(offset)?)
            }
        }
    }

    /// Write one sample into the source buffer.
    pub fn set_sample(
        &mut self,
        coords: &[usize],
        tensor_index: usize,
        value: f64,
    ) -> Result<(), ImageError> {
        match self {
            View::Regular(image) => image.set_sample(coords, tensor_index, value),
            View::Irregular(view) => {
                let offset = view.sample_offset(coords, tensor_index)?;
                let mut samples = view.buffer.write();
                samples.set_f64(offset, value)?;
                if view.data_type.is_complex() {
                    samples.set_f64(offset + 1, 0.0)?;
                }
                Ok(())
            }
        }
    }

    /// Set every selected sample to `value`.
    pub fn fill(&mut self, value: f64) -> Result<(), ImageError> {
        match self {
            View::Regular(image) => image.fill(value),
            View::Irregular(view) => {
                let values = fill_values(
                    view.pixel_offsets.len() * view.tensor_offsets.len(),
                    view.data_type.is_complex(),
                    value,
                );
                let samples = Samples::from_f64(view.data_type.kind(), values);
                Ok(view.buffer.write().scatter(&view.sample_offsets(), &samples)?)
            }
        }
    }

    /// Copy the samples of `source` into the selected samples.
    ///
    /// `source` follows the same rules as in [`Image::assign`] and may alias
    /// the viewed buffer.
    pub fn assign(&mut self, source: &Image) -> Result<(), ImageError> {
        match self {
            View::Regular(image) => image.assign(source),
            View::Irregular(view) => {
                let values = broadcast_values(
                    source,
                    &view.sizes,
                    view.tensor_offsets.len(),
                    view.data_type.is_complex(),
                )?;
                let samples = Samples::from_f64(view.data_type.kind(), values);
                Ok(view.buffer.write().scatter(&view.sample_offsets(), &samples)?)
            }
        }
    }

    /// The view as an image: aliasing for regular views, a private copy for
    /// irregular ones.
    pub fn to_image(&self) -> Result<Image, ImageError> {
        match self {
            View::Regular(image) => Ok(image.clone()),
            View::Irregular(view) => view.to_image(),
        }
    }

    /// Convert the view into an image, see [`View::to_image`].
    pub fn into_image(self) -> Result<Image, ImageError> {
        match self {
            View::Regular(image) => Ok(image),
            View::Irregular(view) => view.to_image(),
        }
    }
}
