//! Strided addressing of pixels, tensor elements and complex parts in a buffer.

use crate::error::TensorError;

/// Compute the normal strides for an image of the given sizes.
///
/// Samples are ordered from fastest to slowest varying as: complex part,
/// tensor element, spatial axis 1, spatial axis 0, then axes 2 and up. The
/// returned tensor stride is the number of samples per tensor element.
///
/// # Arguments
///
/// * `sizes` - The spatial sizes of the image.
/// * `elements` - The number of tensor elements per pixel.
/// * `complex` - Whether each value takes two samples.
///
/// # Example
///
/// ```
/// use pixten_tensor::normal_strides;
///
/// let (strides, tensor_stride) = normal_strides(&[4, 3], 2, false);
/// assert_eq!(tensor_stride, 1);
/// assert_eq!(strides, vec![6, 2]);
/// ```
pub fn normal_strides(sizes: &[usize], elements: usize, complex: bool) -> (Vec<isize>, isize) {
    let tensor_stride: isize = if complex { 2 } else { 1 };
    let mut step = tensor_stride * elements as isize;
    let mut strides = vec![0; sizes.len()];
    for axis in storage_order(sizes.len()) {
        strides[axis] = step;
        step *= sizes[axis] as isize;
    }
    (strides, tensor_stride)
}

fn storage_order(dimensionality: usize) -> impl Iterator<Item = usize> {
    let leading: &'static [usize] = match dimensionality {
        0 => &[],
        1 => &[0],
        _ => &[1, 0],
    };
    leading.iter().copied().chain(2..dimensionality.max(2))
}

fn shifted(base: usize, delta: isize) -> usize {
    // Out-of-range addresses become unreachable offsets that fail bounds checks.
    base.checked_add_signed(delta).unwrap_or(usize::MAX)
}

/// Sizes, strides and origin offset locating the samples of an image.
///
/// All strides and offsets are expressed in samples; the imaginary part of a
/// complex value sits one sample after its real part.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StridedLayout {
    /// Size of each spatial axis.
    pub sizes: Vec<usize>,
    /// Distance in samples between neighbors along each spatial axis.
    pub strides: Vec<isize>,
    /// Distance in samples between consecutive tensor elements.
    pub tensor_stride: isize,
    /// Offset of the first sample of the origin pixel.
    pub offset: usize,
}

impl StridedLayout {
    /// The normal layout for a freshly allocated buffer.
    pub fn normal(sizes: &[usize], elements: usize, complex: bool) -> Self {
        let (strides, tensor_stride) = normal_strides(sizes, elements, complex);
        Self {
            sizes: sizes.to_vec(),
            strides,
            tensor_stride,
            offset: 0,
        }
    }

    /// Number of spatial axes.
    pub fn dimensionality(&self) -> usize {
        self.sizes.len()
    }

    /// Number of pixels addressed by the layout.
    pub fn number_of_pixels(&self) -> usize {
        self.sizes.iter().product()
    }

    /// Offset of the first sample of the pixel at `coords`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if the number of coordinates does not match the
    /// dimensionality and `IndexOutOfBounds` for a coordinate past its axis.
    pub fn pixel_offset(&self, coords: &[usize]) -> Result<usize, TensorError> {
        if coords.len() != self.sizes.len() {
            return Err(TensorError::invalid_shape(format!(
                "expected {} coordinates, got {}",
                self.sizes.len(),
                coords.len()
            )));
        }
        let mut delta = 0isize;
        for ((&c, &size), &stride) in coords.iter().zip(&self.sizes).zip(&self.strides) {
            if c >= size {
                return Err(TensorError::index_out_of_bounds(c, size));
            }
            delta += c as isize * stride;
        }
        Ok(shifted(self.offset, delta))
    }

    /// Offset of a single sample: pixel, tensor element and complex part.
    ///
    /// The tensor index and the complex part are not range checked.
    pub fn offset(
        &self,
        coords: &[usize],
        tensor_index: usize,
        complex_part: usize,
    ) -> Result<usize, TensorError> {
        let pixel = self.pixel_offset(coords)?;
        Ok(shifted(
            pixel,
            tensor_index as isize * self.tensor_stride + complex_part as isize,
        ))
    }

    /// Coordinates of the pixel at position `linear` in linear order.
    ///
    /// Axis 0 varies fastest.
    pub fn coordinates(&self, linear: usize) -> Result<Vec<usize>, TensorError> {
        let count = self.number_of_pixels();
        if linear >= count {
            return Err(TensorError::index_out_of_bounds(linear, count));
        }
        let mut rest = linear;
        Ok(self
            .sizes
            .iter()
            .map(|&size| {
                let c = rest % size;
                rest /= size;
                c
            })
            .collect())
    }

    /// Offsets of every pixel, in linear order.
    pub fn pixel_offsets(&self) -> Vec<usize> {
        let count = self.number_of_pixels();
        let mut out = Vec::with_capacity(count);
        let mut coords = vec![0usize; self.sizes.len()];
        let mut delta = 0isize;
        for _ in 0..count {
            out.push(shifted(self.offset, delta));
            for axis in 0..coords.len() {
                coords[axis] += 1;
                delta += self.strides[axis];
                if coords[axis] < self.sizes[axis] {
                    break;
                }
                delta -= self.strides[axis] * self.sizes[axis] as isize;
                coords[axis] = 0;
            }
        }
        out
    }

    /// The stride that visits every pixel in linear order, if there is one.
    ///
    /// Singleton axes are ignored. A layout of at most one pixel has stride 1.
    pub fn linear_stride(&self) -> Option<isize> {
        let mut axes = self
            .sizes
            .iter()
            .zip(&self.strides)
            .filter(|&(&size, _)| size > 1);
        let Some((&size, &stride)) = axes.next() else {
            return Some(1);
        };
        let mut expected = stride * size as isize;
        for (&size, &stride) in axes {
            if stride != expected {
                return None;
            }
            expected = stride * size as isize;
        }
        Some(stride)
    }

    /// A positive stride and a start offset such that the pixels occupy exactly
    /// `start + k * stride` for `k` in `0..number_of_pixels()`, in any order.
    ///
    /// Returns `None` when the pixels are not evenly spaced or when a
    /// broadcast (zero stride) axis repeats pixels.
    pub fn simple_stride(&self) -> Option<(usize, usize)> {
        let mut axes: Vec<(usize, isize)> = self
            .sizes
            .iter()
            .copied()
            .zip(self.strides.iter().copied())
            .filter(|&(size, _)| size > 1)
            .collect();
        if axes.is_empty() {
            return Some((1, self.offset));
        }
        if axes.iter().any(|&(_, stride)| stride == 0) {
            return None;
        }
        axes.sort_by_key(|&(_, stride)| stride.unsigned_abs());
        let step = axes[0].1.unsigned_abs();
        let mut expected = step;
        let mut lowest = 0isize;
        for &(size, stride) in &axes {
            if stride.unsigned_abs() != expected {
                return None;
            }
            expected *= size;
            if stride < 0 {
                lowest += stride * (size as isize - 1);
            }
        }
        self.offset
            .checked_add_signed(lowest)
            .map(|start| (step, start))
    }

    /// Offsets of the selected samples in canonical order: pixels in linear
    /// order, then the listed tensor elements, then `parts` complex parts.
    pub fn sample_offsets(&self, tensor_indices: &[usize], parts: usize) -> Vec<usize> {
        let pixels = self.pixel_offsets();
        let mut out = Vec::with_capacity(pixels.len() * tensor_indices.len() * parts);
        for pixel in pixels {
            for &t in tensor_indices {
                let element = shifted(pixel, t as isize * self.tensor_stride);
                for part in 0..parts {
                    out.push(shifted(element, part as isize));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_strides_ordering() {
        assert_eq!(normal_strides(&[], 3, false), (vec![], 1));
        assert_eq!(normal_strides(&[5], 1, true), (vec![2], 2));
        assert_eq!(normal_strides(&[4, 3], 1, false), (vec![3, 1], 1));
        assert_eq!(normal_strides(&[4, 3, 2], 3, true), (vec![18, 6, 72], 2));
    }

    #[test]
    fn offset_composes() -> Result<(), TensorError> {
        let layout = StridedLayout::normal(&[4, 3], 3, true);
        assert_eq!(layout.offset(&[0, 0], 0, 0)?, 0);
        assert_eq!(layout.offset(&[0, 0], 1, 1)?, 3);
        assert_eq!(layout.offset(&[0, 1], 0, 0)?, 6);
        assert_eq!(layout.offset(&[1, 0], 2, 0)?, 22);
        assert!(layout.offset(&[4, 0], 0, 0).is_err());
        assert!(layout.offset(&[0], 0, 0).is_err());
        Ok(())
    }

    #[test]
    fn linear_order_axis_zero_fastest() -> Result<(), TensorError> {
        let layout = StridedLayout::normal(&[2, 3], 1, false);
        assert_eq!(layout.coordinates(1)?, vec![1, 0]);
        assert_eq!(layout.coordinates(2)?, vec![0, 1]);
        assert_eq!(layout.pixel_offsets(), vec![0, 3, 1, 4, 2, 5]);
        assert!(layout.coordinates(6).is_err());
        Ok(())
    }

    #[test]
    fn linear_stride_of_views() {
        let normal = StridedLayout::normal(&[4, 3], 1, false);
        assert_eq!(normal.linear_stride(), None);

        let column = StridedLayout {
            sizes: vec![4, 1],
            strides: vec![3, 1],
            tensor_stride: 1,
            offset: 1,
        };
        assert_eq!(column.linear_stride(), Some(3));

        let transposed = StridedLayout {
            sizes: vec![3, 4],
            strides: vec![1, 3],
            tensor_stride: 1,
            offset: 0,
        };
        assert_eq!(transposed.linear_stride(), Some(1));
    }

    #[test]
    fn simple_stride_any_order() {
        let normal = StridedLayout::normal(&[4, 3], 2, false);
        assert_eq!(normal.simple_stride(), Some((2, 0)));

        let mirrored = StridedLayout {
            sizes: vec![4, 3],
            strides: vec![3, -1],
            tensor_stride: 1,
            offset: 2,
        };
        assert_eq!(mirrored.simple_stride(), Some((1, 0)));

        let broadcast = StridedLayout {
            sizes: vec![4, 3],
            strides: vec![0, 1],
            tensor_stride: 1,
            offset: 0,
        };
        assert_eq!(broadcast.simple_stride(), None);

        let gapped = StridedLayout {
            sizes: vec![2, 2],
            strides: vec![4, 1],
            tensor_stride: 1,
            offset: 0,
        };
        assert_eq!(gapped.simple_stride(), None);
    }

    #[test]
    fn sample_offsets_canonical_order() {
        let layout = StridedLayout::normal(&[2], 2, true);
        assert_eq!(layout.sample_offsets(&[1], 2), vec![2, 3, 6, 7]);
        assert_eq!(layout.sample_offsets(&[0, 1], 1), vec![0, 2, 4, 6]);
    }
}
