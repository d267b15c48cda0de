use std::ops::{RangeFull, RangeInclusive};

use pixten_tensor::{TensorDescriptor, TensorError, TensorShape};

use crate::{error::ImageError, image::Image};

/// A position along an axis, counted from its start or from its end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    /// The index counted from the start of the axis.
    At(usize),
    /// `end - k`, where `end` is the last valid index of the axis.
    FromEnd(usize),
}

impl Position {
    /// The last valid index of an axis.
    pub const END: Position = Position::FromEnd(0);

    pub(crate) fn resolve(self, size: usize) -> Result<usize, ImageError> {
        match self {
            Position::At(index) if index < size => Ok(index),
            Position::At(index) => Err(ImageError::IndexOutOfBounds { index, size }),
            Position::FromEnd(k) => size.checked_sub(k + 1).ok_or_else(|| {
                ImageError::invalid_index(format!(
                    "end - {k} lies before the start of an axis of size {size}"
                ))
            }),
        }
    }
}

impl From<usize> for Position {
    fn from(index: usize) -> Self {
        Position::At(index)
    }
}

/// Selection of indices along one axis.
///
/// Range stops are inclusive. A range whose start lies after its stop runs
/// backward.
///
/// # Examples
///
/// ```
/// use pixten_image::{IndexSpec, Position};
///
/// let all: IndexSpec = (..).into();
/// let first_two: IndexSpec = (0..=1).into();
/// let last = IndexSpec::Single(Position::END);
/// let odd = IndexSpec::range(1, Position::END, 2);
/// assert_eq!(all, IndexSpec::All);
/// assert_eq!(first_two, IndexSpec::range(0, 1, 1));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum IndexSpec {
    /// Every index.
    All,
    /// One index; the axis is kept with size 1.
    Single(Position),
    /// Every `step`-th index from `start` to `stop` included.
    Range {
        /// First index.
        start: Position,
        /// Last index, included when reached by the step.
        stop: Position,
        /// Distance between selected indices, at least 1.
        step: usize,
    },
    /// Explicit indices, in order, repetitions allowed. Always gathered.
    List(Vec<usize>),
    /// One flag per index, selecting those set. Always gathered.
    Mask(Vec<bool>),
}

impl IndexSpec {
    /// A range from `start` to `stop`, inclusive, every `step` indices.
    pub fn range(start: impl Into<Position>, stop: impl Into<Position>, step: usize) -> Self {
        IndexSpec::Range {
            start: start.into(),
            stop: stop.into(),
            step,
        }
    }

    fn uses_end(&self) -> bool {
        match self {
            IndexSpec::Single(p) => matches!(p, Position::FromEnd(_)),
            IndexSpec::Range { start, stop, .. } => {
                matches!(start, Position::FromEnd(_)) || matches!(stop, Position::FromEnd(_))
            }
            _ => false,
        }
    }

    fn is_empty_selection(&self) -> bool {
        match self {
            IndexSpec::List(indices) => indices.is_empty(),
            IndexSpec::Mask(mask) => !mask.contains(&true),
            _ => false,
        }
    }

    /// Resolve against an axis of `size` indices.
    pub(crate) fn resolve(&self, size: usize) -> Result<Selection, ImageError> {
        match self {
            IndexSpec::All => Ok(Selection::Strided {
                start: 0,
                step: 1,
                count: size,
            }),
            IndexSpec::Single(position) => Ok(Selection::Strided {
                start: position.resolve(size)?,
                step: 1,
                count: 1,
            }),
            IndexSpec::Range { start, stop, step } => {
                if *step == 0 {
                    return Err(ImageError::invalid_index("range step must be at least 1"));
                }
                let start = start.resolve(size)?;
                let stop = stop.resolve(size)?;
                let (distance, direction) = if start <= stop {
                    (stop - start, 1)
                } else {
                    (start - stop, -1)
                };
                Ok(Selection::Strided {
                    start,
                    step: direction * *step as isize,
                    count: distance / step + 1,
                })
            }
            IndexSpec::List(indices) => {
                if indices.is_empty() {
                    return Err(ImageError::invalid_index("empty index list"));
                }
                if let Some(&index) = indices.iter().find(|&&i| i >= size) {
                    return Err(ImageError::IndexOutOfBounds { index, size });
                }
                Ok(Selection::Gathered(indices.clone()))
            }
            IndexSpec::Mask(mask) => {
                if mask.len() != size {
                    return Err(ImageError::dimension_mismatch(format!(
                        "mask of length {} for an axis of size {size}",
                        mask.len()
                    )));
                }
                let indices: Vec<usize> = mask
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &set)| set.then_some(i))
                    .collect();
                if indices.is_empty() {
                    return Err(ImageError::invalid_index("mask selects no index"));
                }
                Ok(Selection::Gathered(indices))
            }
        }
    }

    /// Whether the indices are given explicitly, as a list or a mask.
    pub(crate) fn is_explicit(&self) -> bool {
        matches!(self, IndexSpec::List(_) | IndexSpec::Mask(_))
    }

    fn resolve_tensor(&self, size: usize) -> Result<Selection, ImageError> {
        if self.uses_end() {
            return Err(ImageError::invalid_index(
                "end positions cannot be used in a tensor subscript",
            ));
        }
        if self.is_empty_selection() {
            return Err(TensorError::invalid_shape("empty tensor selection").into());
        }
        self.resolve(size)
    }
}

impl From<usize> for IndexSpec {
    fn from(index: usize) -> Self {
        IndexSpec::Single(Position::At(index))
    }
}

impl From<Position> for IndexSpec {
    fn from(position: Position) -> Self {
        IndexSpec::Single(position)
    }
}

impl From<RangeInclusive<usize>> for IndexSpec {
    fn from(range: RangeInclusive<usize>) -> Self {
        let (start, stop) = range.into_inner();
        IndexSpec::range(start, stop, 1)
    }
}

impl From<RangeFull> for IndexSpec {
    fn from(_: RangeFull) -> Self {
        IndexSpec::All
    }
}

impl From<Vec<usize>> for IndexSpec {
    fn from(indices: Vec<usize>) -> Self {
        IndexSpec::List(indices)
    }
}

impl From<Vec<bool>> for IndexSpec {
    fn from(mask: Vec<bool>) -> Self {
        IndexSpec::Mask(mask)
    }
}

/// Indices selected along one axis.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Selection {
    /// `count` indices `start + k * step`.
    Strided {
        start: usize,
        step: isize,
        count: usize,
    },
    /// Arbitrary indices.
    Gathered(Vec<usize>),
}

impl Selection {
    /// Storage indices found through a tensor lookup: strided when they form
    /// an arithmetic progression with a non-zero step.
    pub(crate) fn from_storage_indices(indices: Vec<usize>) -> Self {
        let step = match indices.as_slice() {
            [first, second, ..] => *second as isize - *first as isize,
            _ => 1,
        };
        let progression = step != 0
            && indices
                .windows(2)
                .all(|w| w[1] as isize - w[0] as isize == step);
        match indices.first() {
            Some(&start) if progression => Selection::Strided {
                start,
                step,
                count: indices.len(),
            },
            _ => Selection::Gathered(indices),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Selection::Strided { count, .. } => *count,
            Selection::Gathered(indices) => indices.len(),
        }
    }

    pub(crate) fn indices(&self) -> Vec<usize> {
        match self {
            Selection::Strided { start, step, count } => (0..*count)
                .map(|k| (*start as isize + k as isize * step) as usize)
                .collect(),
            Selection::Gathered(indices) => indices.clone(),
        }
    }
}

/// Selection of tensor elements.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorIndex {
    /// Storage indices of the tensor elements. The result is a column vector.
    Elements(IndexSpec),
    /// Rows and columns of the tensor seen as a matrix. The result is a
    /// column-major matrix.
    Matrix(IndexSpec, IndexSpec),
}

impl TensorIndex {
    /// Storage indices selected and the tensor describing them.
    pub(crate) fn resolve(
        &self,
        tensor: &TensorDescriptor,
    ) -> Result<(Selection, TensorDescriptor), ImageError> {
        match self {
            TensorIndex::Elements(spec) => {
                let selection = spec.resolve_tensor(tensor.elements())?;
                let descriptor = TensorDescriptor::vector(selection.len())?;
                Ok((selection, descriptor))
            }
            TensorIndex::Matrix(row_spec, col_spec) => {
                let rows = row_spec.resolve_tensor(tensor.rows())?.indices();
                let cols = col_spec.resolve_tensor(tensor.cols())?.indices();
                let lookup = tensor.lookup()?;
                let mut indices = Vec::with_capacity(rows.len() * cols.len());
                for &col in &cols {
                    for &row in &rows {
                        let index = lookup.get(row, col)?.ok_or(TensorError::NonStoredElement {
                            row,
                            col,
                            shape: tensor.shape(),
                        })?;
                        indices.push(index);
                    }
                }
                let descriptor =
                    TensorDescriptor::new(TensorShape::ColumnMajorMatrix, rows.len(), cols.len())?;
                let selection = if row_spec.is_explicit() || col_spec.is_explicit() {
                    Selection::Gathered(indices)
                } else {
                    Selection::from_storage_indices(indices)
                };
                Ok((selection, descriptor))
            }
        }
    }
}

/// Selection of pixels.
#[derive(Clone, Debug)]
pub enum SpatialIndex {
    /// One `IndexSpec` per axis. A single `IndexSpec` on a multi-axis image
    /// indexes the pixels in linear order.
    PerAxis(Vec<IndexSpec>),
    /// Indices into the pixels in linear order (axis 0 fastest).
    Linear(IndexSpec),
    /// A binary scalar image of the same sizes selecting the set pixels.
    Mask(Image),
}

/// A full index expression: tensor and spatial parts, each optional.
///
/// # Examples
///
/// ```
/// use pixten_image::{IndexSpec, Subscript, TensorIndex};
///
/// let subscript = Subscript::new()
///     .tensor(TensorIndex::Elements(IndexSpec::from(1)))
///     .pixels([0..=1, 2..=3]);
/// assert!(subscript.tensor.is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Subscript {
    /// Tensor elements to select, all when `None`.
    pub tensor: Option<TensorIndex>,
    /// Pixels to select, all when `None`.
    pub spatial: Option<SpatialIndex>,
}

impl Subscript {
    /// An empty subscript selecting everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select tensor elements.
    pub fn tensor(mut self, index: TensorIndex) -> Self {
        self.tensor = Some(index);
        self
    }

    /// Select pixels.
    pub fn spatial(mut self, index: SpatialIndex) -> Self {
        self.spatial = Some(index);
        self
    }

    /// Select pixels with one `IndexSpec` per axis.
    pub fn pixels<I: Into<IndexSpec>>(self, specs: impl IntoIterator<Item = I>) -> Self {
        self.spatial(SpatialIndex::PerAxis(
            specs.into_iter().map(Into::into).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_ranges() -> Result<(), ImageError> {
        assert_eq!(
            IndexSpec::range(1, Position::END, 2).resolve(6)?,
            Selection::Strided {
                start: 1,
                step: 2,
                count: 3
            }
        );
        assert_eq!(
            IndexSpec::range(Position::END, 0, 1).resolve(4)?.indices(),
            vec![3, 2, 1, 0]
        );
        assert_eq!(IndexSpec::from(0..=1).resolve(4)?.len(), 2);
        assert!(matches!(
            IndexSpec::range(0, 2, 0).resolve(4),
            Err(ImageError::InvalidIndex(_))
        ));
        assert_eq!(
            IndexSpec::from(4).resolve(4),
            Err(ImageError::IndexOutOfBounds { index: 4, size: 4 })
        );
        assert!(matches!(
            IndexSpec::Single(Position::FromEnd(4)).resolve(4),
            Err(ImageError::InvalidIndex(_))
        ));
        Ok(())
    }

    #[test]
    fn lists_always_gather() -> Result<(), ImageError> {
        assert_eq!(
            IndexSpec::from(vec![5, 3, 1]).resolve(6)?,
            Selection::Gathered(vec![5, 3, 1])
        );
        assert_eq!(
            IndexSpec::from(vec![0, 2]).resolve(6)?,
            Selection::Gathered(vec![0, 2])
        );
        assert_eq!(
            IndexSpec::from(vec![0, 1, 3]).resolve(6)?,
            Selection::Gathered(vec![0, 1, 3])
        );
        assert_eq!(
            IndexSpec::from(vec![2, 2]).resolve(6)?,
            Selection::Gathered(vec![2, 2])
        );
        Ok(())
    }

    #[test]
    fn masks() -> Result<(), ImageError> {
        let mask = IndexSpec::from(vec![true, false, true, false]);
        assert_eq!(mask.resolve(4)?, Selection::Gathered(vec![0, 2]));
        assert_eq!(
            IndexSpec::from(vec![false, true, true]).resolve(3)?,
            Selection::Gathered(vec![1, 2])
        );
        assert!(matches!(
            mask.resolve(3),
            Err(ImageError::DimensionMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn tensor_elements() -> Result<(), ImageError> {
        let tensor = TensorDescriptor::vector(5)?;
        let (selection, descriptor) =
            TensorIndex::Elements(IndexSpec::from(vec![4, 0])).resolve(&tensor)?;
        assert_eq!(selection.indices(), vec![4, 0]);
        assert_eq!(descriptor.elements(), 2);

        assert!(matches!(
            TensorIndex::Elements(IndexSpec::Single(Position::END)).resolve(&tensor),
            Err(ImageError::InvalidIndex(_))
        ));
        assert!(matches!(
            TensorIndex::Elements(IndexSpec::List(vec![])).resolve(&tensor),
            Err(ImageError::Tensor(TensorError::InvalidShape(_)))
        ));
        Ok(())
    }

    #[test]
    fn tensor_matrix_through_lookup() -> Result<(), ImageError> {
        let symmetric = TensorDescriptor::new(TensorShape::Symmetric, 3, 3)?;
        let (selection, descriptor) =
            TensorIndex::Matrix(IndexSpec::from(0), IndexSpec::All).resolve(&symmetric)?;
        assert_eq!(selection.indices(), vec![0, 3, 4]);
        assert_eq!((descriptor.rows(), descriptor.cols()), (1, 3));

        let full = TensorDescriptor::new(TensorShape::ColumnMajorMatrix, 2, 2)?;
        let (selection, _) =
            TensorIndex::Matrix(IndexSpec::All, IndexSpec::from(1)).resolve(&full)?;
        assert_eq!(
            selection,
            Selection::Strided {
                start: 2,
                step: 1,
                count: 2
            }
        );
        let rows = IndexSpec::from(vec![0, 1]);
        let (selection, _) = TensorIndex::Matrix(rows, IndexSpec::from(1)).resolve(&full)?;
        assert_eq!(selection, Selection::Gathered(vec![2, 3]));

        let diagonal = TensorDescriptor::new(TensorShape::Diagonal, 3, 3)?;
        assert_eq!(
            TensorIndex::Matrix(IndexSpec::from(0), IndexSpec::from(1)).resolve(&diagonal),
            Err(ImageError::Tensor(TensorError::NonStoredElement {
                row: 0,
                col: 1,
                shape: TensorShape::Diagonal
            }))
        );
        Ok(())
    }
}
