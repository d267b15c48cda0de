use pixten_tensor::{StridedLayout, TensorDescriptor, TensorShape};

use crate::{error::ImageError, image::Image, physdims::PixelSize};

/// Metadata-only reshaping. The buffer is shared, never copied, except by
/// [`Image::flatten`] when no single stride covers the pixels.
impl Image {
    /// Reorder, drop and insert spatial axes.
    ///
    /// `order` lists the current axes in their new position; `None` inserts a
    /// singleton axis. Axes of size 1 may be left out, all others must appear
    /// exactly once.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` for out-of-range or repeated axes and for
    /// omitted axes larger than 1, and `NotForged` for a raw image.
    ///
    /// # Examples
    ///
    /// ```
    /// use pixten_image::Image;
    ///
    /// let mut image = Image::from_vec(&[4, 3], vec![0u8; 12]).unwrap();
    /// image.permute(&[Some(1), None, Some(0)]).unwrap();
    /// assert_eq!(image.sizes(), &[3, 1, 4]);
    /// ```
    pub fn permute(&mut self, order: &[Option<usize>]) -> Result<&mut Self, ImageError> {
        self.require_forged()?;
        let n = self.dimensionality();
        let mut used = vec![false; n];
        for &axis in order.iter().flatten() {
            if axis >= n {
                return Err(ImageError::dimension_mismatch(format!(
                    "axis {axis} does not exist in a {n}-dimensional image"
                )));
            }
            if used[axis] {
                return Err(ImageError::dimension_mismatch(format!(
                    "axis {axis} appears more than once"
                )));
            }
            used[axis] = true;
        }
        if let Some(axis) = (0..n).find(|&a| !used[a] && self.layout.sizes[a] > 1) {
            return Err(ImageError::dimension_mismatch(format!(
                "axis {axis} of size {} cannot be dropped",
                self.layout.sizes[axis]
            )));
        }

        let (sizes, strides) = order
            .iter()
            .map(|axis| match *axis {
                Some(a) => (self.layout.sizes[a], self.layout.strides[a]),
                None => (1, 0),
            })
            .unzip();
        self.layout.sizes = sizes;
        self.layout.strides = strides;
        self.pixel_size = self.pixel_size.permute(order);
        Ok(self)
    }

    /// Reorder the axes; every axis larger than 1 must be listed.
    pub fn permute_axes(&mut self, order: &[usize]) -> Result<&mut Self, ImageError> {
        let order: Vec<Option<usize>> = order.iter().copied().map(Some).collect();
        self.permute(&order)
    }

    /// Swap two axes.
    pub fn swap_axes(&mut self, a: usize, b: usize) -> Result<&mut Self, ImageError> {
        let n = self.dimensionality();
        if a >= n || b >= n {
            return Err(ImageError::dimension_mismatch(format!(
                "cannot swap axes {a} and {b} of a {n}-dimensional image"
            )));
        }
        let mut order: Vec<usize> = (0..n).collect();
        order.swap(a, b);
        self.permute_axes(&order)
    }

    /// Remove every axis of size 1.
    pub fn squeeze(&mut self) -> Result<&mut Self, ImageError> {
        let order: Vec<Option<usize>> = (0..self.dimensionality())
            .filter(|&a| self.layout.sizes[a] > 1)
            .map(Some)
            .collect();
        self.permute(&order)
    }

    /// Insert an axis of size 1 before `axis`.
    pub fn add_singleton(&mut self, axis: usize) -> Result<&mut Self, ImageError> {
        let n = self.dimensionality();
        if axis > n {
            return Err(ImageError::dimension_mismatch(format!(
                "cannot insert axis {axis} into a {n}-dimensional image"
            )));
        }
        let mut order: Vec<Option<usize>> = (0..n).map(Some).collect();
        order.insert(axis, None);
        self.permute(&order)
    }

    /// Append singleton axes until the image has `dimensionality` axes.
    pub fn expand_dimensionality(
        &mut self,
        dimensionality: usize,
    ) -> Result<&mut Self, ImageError> {
        let n = self.dimensionality();
        let order: Vec<Option<usize>> = (0..n)
            .map(Some)
            .chain(std::iter::repeat(None).take(dimensionality.saturating_sub(n)))
            .collect();
        self.permute(&order)
    }

    /// Broadcast a singleton axis to `size` pixels with a zero stride.
    ///
    /// All pixels along the axis alias the same samples.
    pub fn expand_singleton(&mut self, axis: usize, size: usize) -> Result<&mut Self, ImageError> {
        self.require_forged()?;
        if self.size(axis) != Some(1) {
            return Err(ImageError::dimension_mismatch(format!(
                "axis {axis} is not a singleton axis"
            )));
        }
        if size == 0 {
            return Err(ImageError::dimension_mismatch("cannot expand to size zero"));
        }
        self.layout.sizes[axis] = size;
        self.layout.strides[axis] = 0;
        Ok(self)
    }

    /// Reverse the axes flagged in `axes`.
    pub fn mirror(&mut self, axes: &[bool]) -> Result<&mut Self, ImageError> {
        self.require_forged()?;
        let n = self.dimensionality();
        if axes.len() != n {
            return Err(ImageError::dimension_mismatch(format!(
                "{} mirror flags for a {n}-dimensional image",
                axes.len()
            )));
        }
        for axis in (0..n).filter(|&a| axes[a]) {
            let stride = self.layout.strides[axis];
            let last = self.layout.sizes[axis] as isize - 1;
            self.layout.offset = self
                .layout
                .offset
                .checked_add_signed(last * stride)
                .ok_or_else(|| ImageError::dimension_mismatch("mirrored origin before buffer"))?;
            self.layout.strides[axis] = -stride;
        }
        Ok(self)
    }

    /// Make the image one-dimensional.
    ///
    /// When a single stride covers all pixels the buffer is shared and pixels
    /// appear in storage order. Otherwise the image is first copied into a new
    /// buffer with normal strides.
    pub fn flatten(&mut self) -> Result<&mut Self, ImageError> {
        self.require_forged()?;
        let (stride, start) = match self.layout.simple_stride() {
            Some(simple) => simple,
            None => {
                log::debug!("flattening {:?} strides needs a copy", self.layout.strides);
                *self = self.copy()?;
                self.layout.simple_stride().ok_or_else(|| {
                    ImageError::dimension_mismatch("normal strides are not simple")
                })?
            }
        };
        let n = self.dimensionality();
        self.pixel_size = if self.pixel_size.is_isotropic(n) {
            PixelSize::isotropic(self.pixel_size.get(0))
        } else {
            PixelSize::default()
        };
        let pixels = self.number_of_pixels();
        self.layout.sizes = vec![pixels];
        self.layout.strides = vec![stride as isize];
        self.layout.offset = start;
        Ok(self)
    }

    /// Turn the tensor into a new spatial axis inserted before `axis`.
    ///
    /// The image becomes scalar.
    pub fn tensor_to_spatial(&mut self, axis: usize) -> Result<&mut Self, ImageError> {
        let elements = self.tensor_elements();
        let tensor_stride = self.layout.tensor_stride;
        self.add_singleton(axis)?;
        self.layout.sizes[axis] = elements;
        self.layout.strides[axis] = tensor_stride;
        self.layout.tensor_stride = self.data_type.samples_per_value() as isize;
        if elements != 1 {
            self.color_space.clear();
        }
        self.tensor = TensorDescriptor::scalar();
        Ok(self)
    }

    /// Turn a spatial axis into the tensor of a scalar image.
    ///
    /// With `size` set the tensor is a `rows x cols` column-major matrix,
    /// otherwise a column vector.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the image is not scalar, the axis does
    /// not exist or `rows * cols` differs from the axis size.
    pub fn spatial_to_tensor(
        &mut self,
        axis: usize,
        size: Option<(usize, usize)>,
    ) -> Result<&mut Self, ImageError> {
        self.require_forged()?;
        if !self.is_scalar() {
            return Err(ImageError::dimension_mismatch(format!(
                "the image already holds a {}",
                self.tensor
            )));
        }
        let n = self.dimensionality();
        let Some(length) = self.size(axis) else {
            return Err(ImageError::dimension_mismatch(format!(
                "axis {axis} does not exist in a {n}-dimensional image"
            )));
        };
        let tensor = match size {
            Some((rows, cols)) if rows * cols != length => {
                return Err(ImageError::dimension_mismatch(format!(
                    "a {rows}x{cols} tensor cannot hold the {length} pixels of axis {axis}"
                )));
            }
            Some((rows, cols)) => TensorDescriptor::matrix(rows, cols)?,
            None => TensorDescriptor::vector(length)?,
        };
        let tensor_stride = self.layout.strides[axis];
        let order: Vec<Option<usize>> = (0..n).filter(|&a| a != axis).map(Some).collect();
        self.layout.sizes[axis] = 1;
        self.permute(&order)?;
        self.layout.tensor_stride = tensor_stride;
        self.tensor = tensor;
        if length != 1 {
            self.color_space.clear();
        }
        Ok(self)
    }

    /// View the real part of a complex image.
    pub fn real(&mut self) -> Result<&mut Self, ImageError> {
        self.complex_part(0)
    }

    /// View the imaginary part of a complex image.
    pub fn imaginary(&mut self) -> Result<&mut Self, ImageError> {
        self.complex_part(1)
    }

    fn complex_part(&mut self, part: usize) -> Result<&mut Self, ImageError> {
        self.require_forged()?;
        if !self.is_complex() {
            return Err(ImageError::invalid_conversion(format!(
                "a {} image has no complex parts",
                self.data_type
            )));
        }
        self.data_type = self.data_type.to_real();
        self.layout.offset += part;
        Ok(self)
    }

    /// View the diagonal of a square matrix tensor as a column vector.
    pub fn tensor_diagonal(&mut self) -> Result<&mut Self, ImageError> {
        self.require_forged()?;
        let tensor = self.tensor;
        if !tensor.is_square() {
            return Err(ImageError::dimension_mismatch(format!(
                "a {tensor} has no diagonal"
            )));
        }
        let n = tensor.rows();
        if let TensorShape::ColumnMajorMatrix | TensorShape::RowMajorMatrix = tensor.shape() {
            self.layout.tensor_stride *= n as isize + 1;
        }
        if n != tensor.elements() {
            self.color_space.clear();
        }
        self.tensor = TensorDescriptor::vector(n)?;
        Ok(self)
    }

    /// Transpose the tensor of every pixel. Storage is untouched.
    pub fn transpose_tensor(&mut self) -> Result<&mut Self, ImageError> {
        self.tensor = self.tensor.transpose();
        Ok(self)
    }

    /// Whether the image has normal strides over a buffer of its own size.
    pub fn has_normal_strides(&self) -> bool {
        let normal = StridedLayout::normal(
            &self.layout.sizes,
            self.tensor.elements(),
            self.is_complex(),
        );
        self.layout == normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{index::IndexSpec, physdims::PhysicalQuantity};
    use pixten_tensor::{DataType, Kind};

    fn ramp(sizes: &[usize]) -> Result<Image, ImageError> {
        let n: usize = sizes.iter().product();
        Image::from_vec(sizes, (0..n as i16).collect())
    }

    #[test]
    fn permute_and_inverse_restore() -> Result<(), ImageError> {
        let mut image = ramp(&[4, 3, 2])?;
        let original = image.clone();
        image.permute(&[Some(2), Some(0), None, Some(1)])?;
        assert_eq!(image.sizes(), &[2, 4, 1, 3]);
        assert!(image.aliases(&original));
        assert_eq!(image.get_sample(&[1, 3, 0, 2], 0)?, original.get_sample(&[3, 2, 1], 0)?);

        image.permute(&[Some(1), Some(3), Some(0)])?;
        assert_eq!(image.sizes(), original.sizes());
        assert_eq!(image.strides(), original.strides());
        assert!(image.aliases(&original));
        Ok(())
    }

    #[test]
    fn permute_rejects_bad_orders() -> Result<(), ImageError> {
        let mut image = ramp(&[4, 1, 3])?;
        for order in [
            vec![Some(0), Some(0), Some(2)],
            vec![Some(0), Some(3)],
            vec![Some(0), Some(1)],
        ] {
            assert!(matches!(
                image.permute(&order),
                Err(ImageError::DimensionMismatch(_))
            ));
        }
        image.permute(&[Some(2), Some(0)])?;
        assert_eq!(image.sizes(), &[3, 4]);

        let mut raw = Image::raw(&[2], TensorDescriptor::scalar(), Kind::UInt8.into())?;
        assert!(matches!(raw.squeeze(), Err(ImageError::NotForged)));
        Ok(())
    }

    #[test]
    fn singletons() -> Result<(), ImageError> {
        let mut image = ramp(&[4, 3])?;
        image.add_singleton(1)?;
        assert_eq!(image.sizes(), &[4, 1, 3]);
        image.expand_dimensionality(5)?;
        assert_eq!(image.sizes(), &[4, 1, 3, 1, 1]);
        image.squeeze()?;
        assert_eq!(image.sizes(), &[4, 3]);
        image.swap_axes(0, 1)?;
        assert_eq!(image.sizes(), &[3, 4]);
        assert!(image.add_singleton(3).is_err());
        Ok(())
    }

    #[test]
    fn expand_singleton_broadcasts() -> Result<(), ImageError> {
        let mut row = ramp(&[3, 1])?;
        row.expand_singleton(1, 4)?;
        assert_eq!(row.sizes(), &[3, 4]);
        assert_eq!(row.get_sample(&[2, 3], 0)?, 2.0);
        assert!(row.expand_singleton(0, 2).is_err());
        Ok(())
    }

    #[test]
    fn mirror_reverses() -> Result<(), ImageError> {
        let mut image = ramp(&[3, 2])?;
        let original = image.clone();
        image.mirror(&[true, false])?;
        assert_eq!(image.get_sample(&[0, 1], 0)?, original.get_sample(&[2, 1], 0)?);
        assert_eq!(image.to_vec::<i16>()?, vec![2, 1, 0, 5, 4, 3]);
        assert!(image.mirror(&[true]).is_err());
        Ok(())
    }

    #[test]
    fn flatten_shares_or_copies() -> Result<(), ImageError> {
        let mut image = ramp(&[3, 2])?;
        let original = image.clone();
        image.flatten()?;
        assert!(image.aliases(&original));
        assert_eq!(image.sizes(), &[6]);
        // storage order: axis 1 varies fastest in a normal image
        assert_eq!(image.to_vec::<i16>()?, vec![0, 3, 1, 4, 2, 5]);

        let mut region = original
            .at([IndexSpec::range(0, 2, 2), IndexSpec::All])?
            .into_image()?;
        assert!(region.aliases(&original));
        region.flatten()?;
        assert!(!region.aliases(&original));
        assert_eq!(region.to_vec::<i16>()?, vec![0, 3, 2, 5]);
        Ok(())
    }

    #[test]
    fn flatten_keeps_isotropic_pixel_size() -> Result<(), ImageError> {
        let mut image = ramp(&[3, 2])?;
        image.set_pixel_size(PixelSize::isotropic(PhysicalQuantity::new(2.0, "um")));
        image.flatten()?;
        assert_eq!(image.pixel_size().get(0).magnitude, 2.0);

        let mut image = ramp(&[3, 2])?;
        image.set_pixel_size(PixelSize::from_vec(vec![
            PhysicalQuantity::new(2.0, "um"),
            PhysicalQuantity::new(3.0, "um"),
        ]));
        image.flatten()?;
        assert!(image.pixel_size().get(0).is_pixel());
        Ok(())
    }

    #[test]
    fn tensor_spatial_round_trip() -> Result<(), ImageError> {
        let image = Image::from_tensor_planes(
            &[2, 2],
            TensorDescriptor::vector(3)?,
            vec![vec![1u8, 2, 3, 4], vec![5, 6, 7, 8], vec![9, 10, 11, 12]],
        )?;
        let mut spatial = image.clone();
        spatial.set_color_space("RGB");
        spatial.tensor_to_spatial(2)?;
        assert_eq!(spatial.sizes(), &[2, 2, 3]);
        assert!(spatial.is_scalar());
        assert_eq!(spatial.color_space(), "");
        assert_eq!(spatial.get_sample(&[1, 0, 2], 0)?, 10.0);

        spatial.spatial_to_tensor(2, None)?;
        assert_eq!(spatial.sizes(), &[2, 2]);
        assert_eq!(spatial.tensor_elements(), 3);
        assert_eq!(spatial.strides(), image.strides());
        assert_eq!(spatial.tensor_stride(), image.tensor_stride());
        assert!(spatial.aliases(&image));
        Ok(())
    }

    #[test]
    fn spatial_to_tensor_checks() -> Result<(), ImageError> {
        let mut image = ramp(&[6, 2])?;
        assert!(matches!(
            image.spatial_to_tensor(0, Some((2, 2))),
            Err(ImageError::DimensionMismatch(_))
        ));
        image.spatial_to_tensor(0, Some((2, 3)))?;
        assert_eq!(image.tensor().shape(), TensorShape::ColumnMajorMatrix);
        assert_eq!(image.sizes(), &[2]);
        assert_eq!(image.get_sample(&[1], 4)?, 10.0);
        assert!(matches!(
            image.spatial_to_tensor(0, None),
            Err(ImageError::DimensionMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn complex_parts() -> Result<(), ImageError> {
        let image = Image::from_complex_vec(&[2], vec![[1.0f32, -1.0], [2.0, -2.0]])?;
        let mut im = image.clone();
        im.imaginary()?;
        assert_eq!(im.data_type(), DataType::real(Kind::Float32));
        assert_eq!(im.to_vec::<f32>()?, vec![-1.0, -2.0]);
        im.set_sample(&[1], 0, 5.0)?;
        assert_eq!(image.get_complex_sample(&[1], 0)?, [2.0, 5.0]);

        let mut re = image.clone();
        re.real()?;
        assert_eq!(re.to_vec::<f32>()?, vec![1.0, 2.0]);
        assert!(re.real().is_err());
        Ok(())
    }

    #[test]
    fn diagonal_of_matrix_tensor() -> Result<(), ImageError> {
        let planes: Vec<Vec<i32>> = (0..9).map(|v| vec![v]).collect();
        let mut image = Image::from_tensor_planes(&[1], TensorDescriptor::matrix(3, 3)?, planes)?;
        image.tensor_diagonal()?;
        assert_eq!(image.tensor_elements(), 3);
        assert_eq!(image.to_vec::<i32>()?, vec![0, 4, 8]);

        let mut vector = Image::new(&[1], TensorDescriptor::vector(3)?, Kind::UInt8.into())?;
        assert!(vector.tensor_diagonal().is_err());
        Ok(())
    }

    #[test]
    fn transpose_tensor_metadata() -> Result<(), ImageError> {
        let mut image = Image::new(&[2], TensorDescriptor::matrix(2, 3)?, Kind::UInt8.into())?;
        image.set_sample(&[0], 1, 7.0)?;
        image.transpose_tensor()?;
        assert_eq!(image.tensor().shape(), TensorShape::RowMajorMatrix);
        assert_eq!((image.tensor().rows(), image.tensor().cols()), (3, 2));
        assert_eq!(image.get_sample(&[0], 1)?, 7.0);
        assert!(image.has_normal_strides());
        Ok(())
    }
}
