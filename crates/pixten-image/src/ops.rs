use crate::{error::ImageError, image::Image, index::IndexSpec};

/// Concatenate images along a spatial axis.
///
/// All images must have the same dimensionality, the same sizes along every
/// other axis and the same number of tensor elements. The output data type is
/// the concatenation join of all input data types; the tensor, pixel size and
/// color space are taken from the first image, the color space only if all
/// images agree on it.
///
/// # Arguments
///
/// * `images` - The images to concatenate, in order.
/// * `axis` - The axis to concatenate along.
///
/// # Errors
///
/// Returns `DimensionMismatch` for incompatible images or an empty list and
/// `NotForged` if any image is raw.
///
/// # Example
///
/// ```
/// use pixten_image::{ops, Image};
/// use pixten_tensor::Kind;
///
/// let a = Image::from_vec(&[2, 2], vec![1u8, 2, 3, 4]).unwrap();
/// let b = Image::from_vec(&[1, 2], vec![-1i8, -2]).unwrap();
/// let c = ops::concatenate(&[&a, &b], 0).unwrap();
///
/// assert_eq!(c.sizes(), &[3, 2]);
/// assert_eq!(c.data_type().kind(), Kind::Float32);
/// assert_eq!(c.to_vec::<f32>().unwrap(), vec![1.0, 2.0, -1.0, 3.0, 4.0, -2.0]);
/// ```
pub fn concatenate(images: &[&Image], axis: usize) -> Result<Image, ImageError> {
    let Some((first, rest)) = images.split_first() else {
        return Err(ImageError::dimension_mismatch("nothing to concatenate"));
    };
    first.require_forged()?;
    let n = first.dimensionality();
    if axis >= n {
        return Err(ImageError::dimension_mismatch(format!(
            "cannot concatenate along axis {axis} of a {n}-dimensional image"
        )));
    }

    let mut data_type = first.data_type();
    let mut length = first.sizes()[axis];
    for image in rest {
        image.require_forged()?;
        let compatible = image.dimensionality() == n
            && image.tensor_elements() == first.tensor_elements()
            && (0..n).all(|a| a == axis || image.sizes()[a] == first.sizes()[a]);
        if !compatible {
            return Err(ImageError::dimension_mismatch(format!(
                "cannot concatenate sizes {:?} ({}) with {:?} ({}) along axis {axis}",
                first.sizes(),
                first.tensor(),
                image.sizes(),
                image.tensor()
            )));
        }
        data_type = data_type.join_for_concatenation(image.data_type());
        length += image.sizes()[axis];
    }

    let mut sizes = first.sizes().to_vec();
    sizes[axis] = length;
    let mut output = Image::new(&sizes, *first.tensor(), data_type)?;
    output.set_pixel_size(first.pixel_size().clone());
    if rest.iter().all(|image| image.color_space() == first.color_space()) {
        output.set_color_space(first.color_space());
    }

    let mut start = 0;
    for image in images {
        let size = image.sizes()[axis];
        let specs = (0..n).map(|a| {
            if a == axis {
                IndexSpec::range(start, start + size - 1, 1)
            } else {
                IndexSpec::All
            }
        });
        output.at(specs)?.assign(image)?;
        start += size;
    }
    log::debug!(
        "concatenated {} images along axis {axis} into {sizes:?}",
        images.len()
    );
    Ok(output)
}
