use pixten_tensor::{
    Buffer, DataType, Sample, Samples, StridedLayout, TensorDescriptor, TensorError, TensorShape,
};

use crate::{error::ImageError, physdims::PixelSize};

/// An N-dimensional image whose pixels hold a tensor of samples.
///
/// The samples live in a shared [`Buffer`]. Cloning an image, taking a
/// regular view or reshaping it all produce images that alias the same
/// buffer: writes through one are visible through all of them. Use
/// [`Image::copy`] to obtain an image with a private buffer.
///
/// An image without a buffer is *raw*. It carries sizes, tensor and data type
/// but no samples until [`Image::forge`] allocates them.
///
/// # Examples
///
/// ```
/// use pixten_image::Image;
///
/// let image = Image::from_vec(&[3, 2], vec![1u8, 2, 3, 4, 5, 6]).unwrap();
/// assert_eq!(image.sizes(), &[3, 2]);
/// assert_eq!(image.get_sample(&[1, 1], 0).unwrap(), 5.0);
///
/// let alias = image.clone();
/// assert!(alias.aliases(&image));
/// assert!(!image.copy().unwrap().aliases(&image));
/// ```
#[derive(Clone, Debug)]
pub struct Image {
    pub(crate) buffer: Option<Buffer>,
    pub(crate) data_type: DataType,
    pub(crate) layout: StridedLayout,
    pub(crate) tensor: TensorDescriptor,
    pub(crate) color_space: String,
    pub(crate) pixel_size: PixelSize,
}

fn check_sizes(sizes: &[usize]) -> Result<(), ImageError> {
    match sizes.iter().position(|&size| size == 0) {
        Some(axis) => Err(ImageError::dimension_mismatch(format!(
            "axis {axis} has size zero"
        ))),
        None => Ok(()),
    }
}

impl Image {
    /// Create a raw image: all properties set but no buffer allocated.
    ///
    /// # Arguments
    ///
    /// * `sizes` - The size of each spatial axis, possibly none.
    /// * `tensor` - The tensor stored at every pixel.
    /// * `data_type` - The sample kind and complex flag.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if any size is zero.
    pub fn raw(
        sizes: &[usize],
        tensor: TensorDescriptor,
        data_type: DataType,
    ) -> Result<Self, ImageError> {
        check_sizes(sizes)?;
        Ok(Self {
            buffer: None,
            data_type,
            layout: StridedLayout::normal(sizes, tensor.elements(), data_type.is_complex()),
            tensor,
            color_space: String::new(),
            pixel_size: PixelSize::default(),
        })
    }

    /// Create a forged image with all samples set to zero.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if any size is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use pixten_image::Image;
    /// use pixten_tensor::{DataType, Kind, TensorDescriptor};
    ///
    /// let image = Image::new(
    ///     &[4, 3],
    ///     TensorDescriptor::vector(3).unwrap(),
    ///     DataType::real(Kind::UInt16),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(image.number_of_pixels(), 12);
    /// assert_eq!(image.tensor_elements(), 3);
    /// assert_eq!(image.strides(), &[9, 3]);
    /// ```
    pub fn new(
        sizes: &[usize],
        tensor: TensorDescriptor,
        data_type: DataType,
    ) -> Result<Self, ImageError> {
        let mut image = Self::raw(sizes, tensor, data_type)?;
        image.forge();
        Ok(image)
    }

    /// Create a scalar image from samples given in linear order (axis 0 fastest).
    ///
    /// The data type is inferred from `T`.
    ///
    /// # Errors
    ///
    /// Returns `DataLengthMismatch` if `data` does not hold one sample per pixel.
    pub fn from_vec<T: Sample>(sizes: &[usize], data: Vec<T>) -> Result<Self, ImageError> {
        let expected: usize = sizes.iter().product();
        if data.len() != expected {
            return Err(ImageError::DataLengthMismatch(data.len(), expected));
        }
        let image = Self::new(sizes, TensorDescriptor::scalar(), DataType::real(T::KIND))?;
        image.write_canonical(&T::into_samples(data))?;
        Ok(image)
    }

    /// Create a scalar complex image from `[real, imaginary]` pairs in linear order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConversion` (through the tensor error) for non-float
    /// `T` and `DataLengthMismatch` for a wrong number of values.
    pub fn from_complex_vec<T: Sample>(
        sizes: &[usize],
        data: Vec<[T; 2]>,
    ) -> Result<Self, ImageError> {
        let data_type = DataType::complex(T::KIND)?;
        let expected: usize = sizes.iter().product();
        if data.len() != expected {
            return Err(ImageError::DataLengthMismatch(data.len(), expected));
        }
        let image = Self::new(sizes, TensorDescriptor::scalar(), data_type)?;
        let data: Vec<T> = data.into_iter().flatten().collect();
        image.write_canonical(&T::into_samples(data))?;
        Ok(image)
    }

    /// Create an image from one array per tensor element, each in linear order.
    ///
    /// # Errors
    ///
    /// Returns `DataLengthMismatch` if the number of planes differs from the
    /// number of tensor elements or a plane does not hold one sample per pixel.
    pub fn from_tensor_planes<T: Sample>(
        sizes: &[usize],
        tensor: TensorDescriptor,
        planes: Vec<Vec<T>>,
    ) -> Result<Self, ImageError> {
        if planes.len() != tensor.elements() {
            return Err(ImageError::DataLengthMismatch(
                planes.len(),
                tensor.elements(),
            ));
        }
        let pixels: usize = sizes.iter().product();
        if let Some(plane) = planes.iter().find(|plane| plane.len() != pixels) {
            return Err(ImageError::DataLengthMismatch(plane.len(), pixels));
        }
        let mut data = Vec::with_capacity(pixels * planes.len());
        for p in 0..pixels {
            data.extend(planes.iter().map(|plane| plane[p]));
        }
        let image = Self::new(sizes, tensor, DataType::real(T::KIND))?;
        image.write_canonical(&T::into_samples(data))?;
        Ok(image)
    }

    /// Allocate a zeroed buffer with normal strides. Does nothing if forged.
    pub fn forge(&mut self) {
        if self.buffer.is_some() {
            return;
        }
        self.layout = StridedLayout::normal(
            &self.layout.sizes,
            self.tensor.elements(),
            self.data_type.is_complex(),
        );
        let len = self.layout.number_of_pixels()
            * self.tensor.elements()
            * self.data_type.samples_per_value();
        log::debug!("allocating {len} {} samples", self.data_type.kind());
        self.buffer = Some(Buffer::zeros(self.data_type.kind(), len));
    }

    /// Release the buffer, making the image raw. Other aliases keep it alive.
    pub fn strip(&mut self) {
        self.buffer = None;
    }

    /// Whether the image has a buffer.
    pub fn is_forged(&self) -> bool {
        self.buffer.is_some()
    }

    /// A copy of the image with a private buffer and normal strides.
    ///
    /// # Errors
    ///
    /// Returns `NotForged` for a raw image.
    pub fn copy(&self) -> Result<Image, ImageError> {
        let samples = self.read_canonical()?;
        let mut image = Self::raw(&self.layout.sizes, self.tensor, self.data_type)?;
        image.forge();
        image.write_canonical(&samples)?;
        image.color_space = self.color_space.clone();
        image.pixel_size = self.pixel_size.clone();
        Ok(image)
    }

    /// A copy of the image converted to another data type and tensor.
    ///
    /// Samples saturate to the target kind. Real data converted to complex gets
    /// a zero imaginary part. Converting complex data to a real type is not
    /// performed: the data type is left unchanged and a warning is logged.
    ///
    /// # Arguments
    ///
    /// * `data_type` - The target data type.
    /// * `tensor` - The target tensor, or `None` to keep the current one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` (through the tensor error) if the target tensor
    /// has a different number of elements, and `NotForged` for a raw image.
    pub fn convert(
        &self,
        data_type: DataType,
        tensor: Option<TensorDescriptor>,
    ) -> Result<Image, ImageError> {
        let tensor = match tensor {
            Some(t) if t.elements() != self.tensor.elements() => {
                return Err(TensorError::invalid_shape(format!(
                    "cannot convert {} elements into a {t}",
                    self.tensor.elements()
                ))
                .into());
            }
            Some(t) => t,
            None => self.tensor,
        };
        let data_type = if self.data_type.is_complex() && !data_type.is_complex() {
            log::warn!(
                "converting {} to {data_type} would drop the imaginary part, keeping {}",
                self.data_type,
                self.data_type
            );
            self.data_type
        } else {
            data_type
        };

        let samples = self.read_canonical()?;
        let samples = if data_type.is_complex() && !self.data_type.is_complex() {
            Samples::from_f64(
                data_type.kind(),
                samples.to_f64_vec().into_iter().flat_map(|v| [v, 0.0]),
            )
        } else {
            samples.convert(data_type.kind())
        };

        let mut image = Self::raw(&self.layout.sizes, tensor, data_type)?;
        image.forge();
        image.write_canonical(&samples)?;
        image.color_space = self.color_space.clone();
        image.pixel_size = self.pixel_size.clone();
        Ok(image)
    }

    /// Size of each spatial axis.
    pub fn sizes(&self) -> &[usize] {
        &self.layout.sizes
    }

    /// Size of one spatial axis.
    pub fn size(&self, axis: usize) -> Option<usize> {
        self.layout.sizes.get(axis).copied()
    }

    /// Number of spatial axes.
    pub fn dimensionality(&self) -> usize {
        self.layout.dimensionality()
    }

    /// Number of pixels.
    pub fn number_of_pixels(&self) -> usize {
        self.layout.number_of_pixels()
    }

    /// Stride of each spatial axis, in samples.
    pub fn strides(&self) -> &[isize] {
        &self.layout.strides
    }

    /// Stride between tensor elements, in samples.
    pub fn tensor_stride(&self) -> isize {
        self.layout.tensor_stride
    }

    /// Offset of the origin pixel in the buffer, in samples.
    pub fn offset(&self) -> usize {
        self.layout.offset
    }

    /// Sizes, strides, tensor stride and origin offset.
    pub fn layout(&self) -> &StridedLayout {
        &self.layout
    }

    /// The tensor stored at every pixel.
    pub fn tensor(&self) -> &TensorDescriptor {
        &self.tensor
    }

    /// Number of tensor elements per pixel.
    pub fn tensor_elements(&self) -> usize {
        self.tensor.elements()
    }

    /// Whether every pixel holds a single value.
    pub fn is_scalar(&self) -> bool {
        self.tensor.is_scalar()
    }

    /// The sample kind and complex flag.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Whether the samples are complex.
    pub fn is_complex(&self) -> bool {
        self.data_type.is_complex()
    }

    /// The color space name, empty when unset.
    pub fn color_space(&self) -> &str {
        &self.color_space
    }

    /// Set the color space name.
    pub fn set_color_space(&mut self, color_space: impl Into<String>) {
        self.color_space = color_space.into();
    }

    /// The physical size of a pixel.
    pub fn pixel_size(&self) -> &PixelSize {
        &self.pixel_size
    }

    /// Set the physical size of a pixel.
    pub fn set_pixel_size(&mut self, pixel_size: PixelSize) {
        self.pixel_size = pixel_size;
    }

    /// Reinterpret the tensor with another shape, keeping its elements.
    ///
    /// With `size` set to `None` the size is inferred from the number of
    /// tensor elements.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` (through the tensor error) if the shape and size
    /// do not describe the current number of tensor elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use pixten_image::Image;
    /// use pixten_tensor::TensorShape;
    ///
    /// let mut image = Image::from_vec(&[4, 3], vec![0u8; 12]).unwrap();
    /// image.set_tensor_shape(TensorShape::Diagonal, None).unwrap();
    /// assert_eq!(image.tensor().rows(), 1);
    /// assert!(image.set_tensor_shape(TensorShape::Diagonal, Some((3, 3))).is_err());
    /// ```
    pub fn set_tensor_shape(
        &mut self,
        shape: TensorShape,
        size: Option<(usize, usize)>,
    ) -> Result<(), ImageError> {
        let elements = self.tensor.elements();
        let tensor = match size {
            Some((rows, cols)) => TensorDescriptor::new(shape, rows, cols)?,
            None => TensorDescriptor::from_elements(shape, elements)?,
        };
        if tensor.elements() != elements {
            return Err(TensorError::invalid_shape(format!(
                "a {tensor} cannot hold {elements} tensor elements"
            ))
            .into());
        }
        self.tensor = tensor;
        Ok(())
    }

    /// Replace the tensor, allocating a new buffer if the number of tensor
    /// elements changes. The color space is reset.
    pub fn reforge_tensor(&mut self, tensor: TensorDescriptor) {
        let keep = self.is_forged() && tensor.elements() == self.tensor.elements();
        self.tensor = tensor;
        if !keep {
            self.buffer = None;
            self.forge();
        }
        self.color_space.clear();
    }

    /// Whether both images share the same buffer.
    pub fn aliases(&self, other: &Image) -> bool {
        match (&self.buffer, &other.buffer) {
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Read one sample, the real part for complex images.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` for coordinates or a tensor index out of
    /// range and `DimensionMismatch` for the wrong number of coordinates.
    pub fn get_sample(&self, coords: &[usize], tensor_index: usize) -> Result<f64, ImageError> {
        let offset = self.sample_offset(coords, tensor_index)?;
        Ok(self.buffer()?.read().get_f64(offset)?)
    }

    /// Read one value as `[real, imaginary]`; real images give a zero imaginary part.
    pub fn get_complex_sample(
        &self,
        coords: &[usize],
        tensor_index: usize,
    ) -> Result<[f64; 2], ImageError> {
        let offset = self.sample_offset(coords, tensor_index)?;
        let samples = self.buffer()?.read();
        let re = samples.get_f64(offset)?;
        let im = if self.is_complex() {
            samples.get_f64(offset + 1)?
        } else {
            0.0
        };
        Ok([re, im])
    }

    /// Write one sample, saturating to the sample kind.
    ///
    /// Complex images get a zero imaginary part.
    pub fn set_sample(
        &mut self,
        coords: &[usize],
        tensor_index: usize,
        value: f64,
    ) -> Result<(), ImageError> {
        let offset = self.sample_offset(coords, tensor_index)?;
        let mut samples = self.buffer()?.write();
        samples.set_f64(offset, value)?;
        if self.is_complex() {
            samples.set_f64(offset + 1, 0.0)?;
        }
        Ok(())
    }

    /// Write one complex value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConversion` for real images.
    pub fn set_complex_sample(
        &mut self,
        coords: &[usize],
        tensor_index: usize,
        value: [f64; 2],
    ) -> Result<(), ImageError> {
        if !self.is_complex() {
            return Err(ImageError::invalid_conversion(format!(
                "cannot write a complex value into a {} image",
                self.data_type
            )));
        }
        let offset = self.sample_offset(coords, tensor_index)?;
        let mut samples = self.buffer()?.write();
        samples.set_f64(offset, value[0])?;
        samples.set_f64(offset + 1, value[1])?;
        Ok(())
    }

    /// Set every sample of every pixel to `value`.
    pub fn fill(&mut self, value: f64) -> Result<(), ImageError> {
        let values = fill_values(
            self.number_of_pixels() * self.tensor.elements(),
            self.is_complex(),
            value,
        );
        self.write_canonical(&Samples::from_f64(self.data_type.kind(), values))
    }

    /// Copy the samples of `source` into this image.
    ///
    /// A raw image becomes a copy of `source`. A forged image keeps its data
    /// type: `source` must have the same sizes or a single pixel, and the same
    /// number of tensor elements or a single one. Both images may alias.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` for incompatible sizes and
    /// `InvalidConversion` when assigning complex samples to a real image.
    pub fn assign(&mut self, source: &Image) -> Result<(), ImageError> {
        if !self.is_forged() {
            *self = source.copy()?;
            return Ok(());
        }
        let values = broadcast_values(
            source,
            &self.layout.sizes,
            self.tensor.elements(),
            self.is_complex(),
        )?;
        self.write_canonical(&Samples::from_f64(self.data_type.kind(), values))
    }

    /// All samples in canonical order: pixels in linear order, then tensor
    /// elements, then complex parts.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConversion` if `T` does not match the sample kind.
    pub fn to_vec<T: Sample>(&self) -> Result<Vec<T>, ImageError> {
        let samples = self.read_canonical()?;
        T::as_slice(&samples)
            .map(<[T]>::to_vec)
            .ok_or_else(|| self.kind_mismatch::<T>())
    }

    /// Run `f` on the whole buffer as a typed slice.
    ///
    /// Use [`Image::layout`] to locate the samples of this image in it.
    ///
    /// # Errors
    ///
    /// Returns `NotForged` for a raw image and `InvalidConversion` if `T` does
    /// not match the sample kind.
    pub fn with_samples<T: Sample, R>(&self, f: impl FnOnce(&[T]) -> R) -> Result<R, ImageError> {
        let samples = self.buffer()?.read();
        let slice = T::as_slice(&samples).ok_or_else(|| self.kind_mismatch::<T>())?;
        Ok(f(slice))
    }

    /// Run `f` on the whole buffer as a mutable typed slice.
    pub fn with_samples_mut<T: Sample, R>(
        &mut self,
        f: impl FnOnce(&mut [T]) -> R,
    ) -> Result<R, ImageError> {
        let err = self.kind_mismatch::<T>();
        let mut samples = self.buffer()?.write();
        let slice = T::as_mut_slice(&mut samples).ok_or(err)?;
        Ok(f(slice))
    }

    fn kind_mismatch<T: Sample>(&self) -> ImageError {
        ImageError::invalid_conversion(format!(
            "requested {} samples from a {} image",
            T::KIND,
            self.data_type.kind()
        ))
    }

    pub(crate) fn buffer(&self) -> Result<&Buffer, ImageError> {
        self.buffer.as_ref().ok_or(ImageError::NotForged)
    }

    pub(crate) fn require_forged(&self) -> Result<(), ImageError> {
        self.buffer().map(|_| ())
    }

    pub(crate) fn check_coords(&self, coords: &[usize]) -> Result<(), ImageError> {
        check_coords(&self.layout.sizes, coords)
    }

    fn sample_offset(&self, coords: &[usize], tensor_index: usize) -> Result<usize, ImageError> {
        self.check_coords(coords)?;
        let elements = self.tensor.elements();
        if tensor_index >= elements {
            return Err(ImageError::IndexOutOfBounds {
                index: tensor_index,
                size: elements,
            });
        }
        Ok(self.layout.offset(coords, tensor_index, 0)?)
    }

    fn canonical_offsets(&self) -> Vec<usize> {
        let tensor: Vec<usize> = (0..self.tensor.elements()).collect();
        self.layout
            .sample_offsets(&tensor, self.data_type.samples_per_value())
    }

    pub(crate) fn read_canonical(&self) -> Result<Samples, ImageError> {
        let offsets = self.canonical_offsets();
        Ok(self.buffer()?.read().gather(&offsets)?)
    }

    pub(crate) fn write_canonical(&self, samples: &Samples) -> Result<(), ImageError> {
        let offsets = self.canonical_offsets();
        Ok(self.buffer()?.write().scatter(&offsets, samples)?)
    }
}

pub(crate) fn check_coords(sizes: &[usize], coords: &[usize]) -> Result<(), ImageError> {
    if coords.len() != sizes.len() {
        return Err(ImageError::dimension_mismatch(format!(
            "expected {} coordinates, got {}",
            sizes.len(),
            coords.len()
        )));
    }
    match coords.iter().zip(sizes).find(|&(&c, &size)| c >= size) {
        Some((&index, &size)) => Err(ImageError::IndexOutOfBounds { index, size }),
        None => Ok(()),
    }
}

pub(crate) fn fill_values(count: usize, complex: bool, value: f64) -> Vec<f64> {
    if complex {
        [value, 0.0].repeat(count)
    } else {
        vec![value; count]
    }
}

/// Values of `source` in the canonical order of a destination with the given
/// sizes, tensor elements and complex flag, broadcasting single pixels and
/// single tensor elements.
pub(crate) fn broadcast_values(
    source: &Image,
    sizes: &[usize],
    elements: usize,
    complex: bool,
) -> Result<Vec<f64>, ImageError> {
    let single_pixel = source.number_of_pixels() == 1;
    if !single_pixel && source.sizes() != sizes {
        return Err(ImageError::dimension_mismatch(format!(
            "cannot assign an image of sizes {:?} to sizes {sizes:?}",
            source.sizes()
        )));
    }
    let source_elements = source.tensor_elements();
    if source_elements != elements && source_elements != 1 {
        return Err(ImageError::dimension_mismatch(format!(
            "cannot assign {source_elements} tensor elements to {elements}"
        )));
    }
    if source.is_complex() && !complex {
        return Err(ImageError::invalid_conversion(format!(
            "cannot assign {} samples to a real image",
            source.data_type()
        )));
    }

    let values = source.read_canonical()?.to_f64_vec();
    let parts = source.data_type().samples_per_value();
    let pixels: usize = sizes.iter().product();
    let mut out = Vec::with_capacity(pixels * elements * if complex { 2 } else { 1 });
    for p in 0..pixels {
        let sp = if single_pixel { 0 } else { p };
        for t in 0..elements {
            let st = if source_elements == 1 { 0 } else { t };
            let base = (sp * source_elements + st) * parts;
            out.push(values[base]);
            if complex {
                out.push(if parts == 2 { values[base + 1] } else { 0.0 });
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixten_tensor::Kind;

    #[test]
    fn new_image_is_zeroed() -> Result<(), ImageError> {
        let image = Image::new(
            &[2, 3],
            TensorDescriptor::vector(2)?,
            DataType::complex(Kind::Float32)?,
        )?;
        assert!(image.is_forged());
        assert_eq!(image.buffer()?.len(), 2 * 2 * 6);
        assert_eq!(image.tensor_stride(), 2);
        assert_eq!(image.strides(), &[12, 4]);
        assert_eq!(image.get_complex_sample(&[1, 2], 1)?, [0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn raw_then_forge() -> Result<(), ImageError> {
        let mut image = Image::raw(&[5], TensorDescriptor::scalar(), Kind::Int8.into())?;
        assert!(!image.is_forged());
        assert_eq!(image.get_sample(&[0], 0), Err(ImageError::NotForged));
        image.forge();
        image.set_sample(&[4], 0, -200.0)?;
        assert_eq!(image.get_sample(&[4], 0)?, -128.0);
        image.strip();
        assert!(!image.is_forged());
        Ok(())
    }

    #[test]
    fn zero_size_rejected() {
        assert!(matches!(
            Image::new(&[3, 0], TensorDescriptor::scalar(), Kind::UInt8.into()),
            Err(ImageError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn from_vec_linear_order() -> Result<(), ImageError> {
        let image = Image::from_vec(&[2, 3], vec![0i32, 1, 2, 3, 4, 5])?;
        assert_eq!(image.get_sample(&[1, 0], 0)?, 1.0);
        assert_eq!(image.get_sample(&[0, 1], 0)?, 2.0);
        assert_eq!(image.to_vec::<i32>()?, vec![0, 1, 2, 3, 4, 5]);
        assert!(matches!(
            image.to_vec::<u8>(),
            Err(ImageError::InvalidConversion(_))
        ));
        assert_eq!(
            Image::from_vec(&[2, 3], vec![0u8; 5]).err(),
            Some(ImageError::DataLengthMismatch(5, 6))
        );
        Ok(())
    }

    #[test]
    fn from_tensor_planes_interleaves() -> Result<(), ImageError> {
        let image = Image::from_tensor_planes(
            &[2],
            TensorDescriptor::vector(3)?,
            vec![vec![1u8, 2], vec![3, 4], vec![5, 6]],
        )?;
        assert_eq!(image.get_sample(&[1], 2)?, 6.0);
        assert_eq!(image.to_vec::<u8>()?, vec![1, 3, 5, 2, 4, 6]);
        Ok(())
    }

    #[test]
    fn from_complex_vec_pairs() -> Result<(), ImageError> {
        let image = Image::from_complex_vec(&[2], vec![[1.0f64, -1.0], [2.0, 0.5]])?;
        assert!(image.is_complex());
        assert_eq!(image.get_complex_sample(&[1], 0)?, [2.0, 0.5]);
        assert!(Image::from_complex_vec(&[1], vec![[1u8, 2]]).is_err());
        Ok(())
    }

    #[test]
    fn set_tensor_shape_scenarios() -> Result<(), ImageError> {
        let mut scalar = Image::new(&[4, 3], TensorDescriptor::scalar(), Kind::UInt8.into())?;
        scalar.set_tensor_shape(TensorShape::Diagonal, None)?;
        assert_eq!((scalar.tensor().rows(), scalar.tensor().cols()), (1, 1));
        assert!(matches!(
            scalar.set_tensor_shape(TensorShape::Diagonal, Some((3, 3))),
            Err(ImageError::Tensor(TensorError::InvalidShape(_)))
        ));

        let mut vector = Image::new(&[4, 3], TensorDescriptor::vector(3)?, Kind::UInt8.into())?;
        vector.set_tensor_shape(TensorShape::Diagonal, None)?;
        let lut = vector.tensor().lookup()?;
        assert_eq!((vector.tensor().rows(), vector.tensor().cols()), (3, 3));
        assert_eq!(lut.get(0, 0)?, Some(0));
        assert_eq!(lut.get(0, 1)?, None);
        Ok(())
    }

    #[test]
    fn reforge_tensor_resets_color_space() -> Result<(), ImageError> {
        let mut image = Image::new(&[2, 2], TensorDescriptor::vector(3)?, Kind::UInt8.into())?;
        image.set_color_space("RGB");
        let alias = image.clone();

        image.reforge_tensor(TensorDescriptor::new(TensorShape::RowVector, 1, 3)?);
        assert!(image.aliases(&alias));
        assert_eq!(image.color_space(), "");

        image.set_color_space("Lab");
        image.reforge_tensor(TensorDescriptor::scalar());
        assert!(!image.aliases(&alias));
        assert_eq!(image.color_space(), "");
        assert_eq!(image.strides(), &[2, 1]);
        Ok(())
    }

    #[test]
    fn copy_is_private() -> Result<(), ImageError> {
        let mut image = Image::from_vec(&[3], vec![1.0f32, 2.0, 3.0])?;
        image.set_color_space("gray");
        let copy = image.copy()?;
        image.set_sample(&[0], 0, 9.0)?;
        assert_eq!(copy.get_sample(&[0], 0)?, 1.0);
        assert_eq!(copy.color_space(), "gray");
        assert!(!copy.aliases(&image));
        Ok(())
    }

    #[test]
    fn convert_coerces() -> Result<(), ImageError> {
        let image = Image::from_vec(&[3], vec![-1.5f64, 100.0, 300.0])?;
        let bytes = image.convert(Kind::UInt8.into(), None)?;
        assert_eq!(bytes.to_vec::<u8>()?, vec![0, 100, 255]);

        let complex = image.convert(DataType::complex(Kind::Float32)?, None)?;
        assert_eq!(complex.get_complex_sample(&[1], 0)?, [100.0, 0.0]);

        // complex to real keeps the complex data type
        let back = complex.convert(Kind::Int16.into(), None)?;
        assert_eq!(back.data_type(), DataType::complex(Kind::Float32)?);

        assert!(matches!(
            image.convert(Kind::UInt8.into(), Some(TensorDescriptor::vector(2)?)),
            Err(ImageError::Tensor(TensorError::InvalidShape(_)))
        ));
        Ok(())
    }

    #[test]
    fn float32_samples_round() -> Result<(), ImageError> {
        let mut image = Image::new(&[2], TensorDescriptor::scalar(), Kind::Float32.into())?;
        image.set_sample(&[1], 0, 0.1)?;
        approx::assert_relative_eq!(image.get_sample(&[1], 0)?, 0.1, epsilon = 1e-6);

        let complex = image.convert(DataType::complex(Kind::Float64)?, None)?;
        let [re, im] = complex.get_complex_sample(&[1], 0)?;
        approx::assert_relative_eq!(re, 0.1, epsilon = 1e-6);
        approx::assert_relative_eq!(im, 0.0);
        Ok(())
    }

    #[test]
    fn assign_broadcasts() -> Result<(), ImageError> {
        let mut image = Image::new(&[2, 2], TensorDescriptor::vector(2)?, Kind::UInt16.into())?;
        let value = Image::from_vec(&[], vec![7u8])?;
        image.assign(&value)?;
        assert_eq!(image.to_vec::<u16>()?, vec![7; 8]);

        let wrong = Image::from_vec(&[3], vec![1u8, 2, 3])?;
        assert!(matches!(
            image.assign(&wrong),
            Err(ImageError::DimensionMismatch(_))
        ));

        let mut raw = Image::raw(&[1], TensorDescriptor::scalar(), Kind::Binary.into())?;
        raw.assign(&wrong)?;
        assert!(raw.is_forged());
        assert_eq!(raw.sizes(), &[3]);
        assert_eq!(raw.data_type().kind(), Kind::UInt8);
        assert!(!raw.aliases(&wrong));
        Ok(())
    }

    #[test]
    fn fill_complex_clears_imaginary() -> Result<(), ImageError> {
        let mut image = Image::from_complex_vec(&[2], vec![[1.0f32, 1.0], [2.0, 2.0]])?;
        image.fill(3.0)?;
        assert_eq!(image.to_vec::<f32>()?, vec![3.0, 0.0, 3.0, 0.0]);
        Ok(())
    }

    #[test]
    fn typed_buffer_access() -> Result<(), ImageError> {
        let mut image = Image::from_vec(&[2, 2], vec![1u8, 2, 3, 4])?;
        let sum = image.with_samples(|s: &[u8]| s.iter().map(|&v| v as u32).sum::<u32>())?;
        assert_eq!(sum, 10);
        image.with_samples_mut(|s: &mut [u8]| s.iter_mut().for_each(|v| *v *= 2))?;
        assert_eq!(image.to_vec::<u8>()?, vec![2, 4, 6, 8]);
        assert!(image.with_samples(|_: &[f32]| ()).is_err());
        Ok(())
    }

    #[test]
    fn sample_bounds() -> Result<(), ImageError> {
        let image = Image::new(&[2, 2], TensorDescriptor::vector(2)?, Kind::UInt8.into())?;
        assert_eq!(
            image.get_sample(&[2, 0], 0),
            Err(ImageError::IndexOutOfBounds { index: 2, size: 2 })
        );
        assert_eq!(
            image.get_sample(&[0, 0], 2),
            Err(ImageError::IndexOutOfBounds { index: 2, size: 2 })
        );
        assert!(matches!(
            image.get_sample(&[0], 0),
            Err(ImageError::DimensionMismatch(_))
        ));
        Ok(())
    }
}
