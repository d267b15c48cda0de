//! Tensor shapes: element counts, size inference and storage lookup tables.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::error::TensorError;

/// Storage convention for the tensor held by every pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TensorShape {
    /// A column vector, `rows` elements.
    #[default]
    ColumnVector,
    /// A row vector, `cols` elements.
    RowVector,
    /// A full matrix stored column by column.
    ColumnMajorMatrix,
    /// A full matrix stored row by row.
    RowMajorMatrix,
    /// A square matrix storing only its diagonal.
    Diagonal,
    /// A square symmetric matrix storing the diagonal and the upper triangle.
    Symmetric,
    /// A square matrix whose strict lower triangle is zero and not stored.
    UpperTriangular,
    /// A square matrix whose strict upper triangle is zero and not stored.
    LowerTriangular,
}

impl TensorShape {
    /// All shapes.
    pub const ALL: [TensorShape; 8] = [
        TensorShape::ColumnVector,
        TensorShape::RowVector,
        TensorShape::ColumnMajorMatrix,
        TensorShape::RowMajorMatrix,
        TensorShape::Diagonal,
        TensorShape::Symmetric,
        TensorShape::UpperTriangular,
        TensorShape::LowerTriangular,
    ];

    /// The canonical name of the shape.
    pub fn name(self) -> &'static str {
        match self {
            TensorShape::ColumnVector => "column vector",
            TensorShape::RowVector => "row vector",
            TensorShape::ColumnMajorMatrix => "column-major matrix",
            TensorShape::RowMajorMatrix => "row-major matrix",
            TensorShape::Diagonal => "diagonal matrix",
            TensorShape::Symmetric => "symmetric matrix",
            TensorShape::UpperTriangular => "upper triangular matrix",
            TensorShape::LowerTriangular => "lower triangular matrix",
        }
    }

    /// Shapes that only describe square matrices.
    pub fn is_square_only(self) -> bool {
        matches!(
            self,
            TensorShape::Diagonal
                | TensorShape::Symmetric
                | TensorShape::UpperTriangular
                | TensorShape::LowerTriangular
        )
    }
}

impl std::fmt::Display for TensorShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for TensorShape {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TensorShape::ALL
            .into_iter()
            .find(|shape| shape.name() == s)
            .ok_or_else(|| TensorError::UnknownShapeName(s.to_string()))
    }
}

fn triangular_number(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Number of stored elements for a tensor of the given shape and size.
///
/// # Errors
///
/// Returns `InvalidShape` if a size is zero, if a square-only shape is given
/// `rows != cols`, or if a vector shape is given the wrong orientation.
///
/// # Example
///
/// ```
/// use pixten_tensor::{element_count, TensorShape};
///
/// assert_eq!(element_count(TensorShape::ColumnMajorMatrix, 2, 3).unwrap(), 6);
/// assert_eq!(element_count(TensorShape::Diagonal, 3, 3).unwrap(), 3);
/// assert_eq!(element_count(TensorShape::Symmetric, 3, 3).unwrap(), 6);
/// assert!(element_count(TensorShape::Symmetric, 2, 3).is_err());
/// ```
pub fn element_count(shape: TensorShape, rows: usize, cols: usize) -> Result<usize, TensorError> {
    if rows == 0 || cols == 0 {
        return Err(TensorError::invalid_shape(format!(
            "a {shape} cannot have {rows} rows and {cols} columns"
        )));
    }
    if shape.is_square_only() && rows != cols {
        return Err(TensorError::invalid_shape(format!(
            "a {shape} must be square, got {rows}x{cols}"
        )));
    }
    match shape {
        TensorShape::ColumnVector if cols != 1 => Err(TensorError::invalid_shape(format!(
            "a column vector has one column, got {cols}"
        ))),
        TensorShape::RowVector if rows != 1 => Err(TensorError::invalid_shape(format!(
            "a row vector has one row, got {rows}"
        ))),
        TensorShape::ColumnVector
        | TensorShape::RowVector
        | TensorShape::ColumnMajorMatrix
        | TensorShape::RowMajorMatrix => Ok(rows * cols),
        TensorShape::Diagonal => Ok(rows),
        TensorShape::Symmetric | TensorShape::UpperTriangular | TensorShape::LowerTriangular => {
            Ok(triangular_number(rows))
        }
    }
}

/// The (rows, cols) size of a tensor of the given shape storing `elements` elements.
///
/// Full matrices are taken square when `elements` is a perfect square and as a
/// single column otherwise.
///
/// # Errors
///
/// Returns `InvalidShape` if `elements` is zero or, for symmetric and
/// triangular shapes, not a triangular number.
pub fn infer_size(shape: TensorShape, elements: usize) -> Result<(usize, usize), TensorError> {
    if elements == 0 {
        return Err(TensorError::invalid_shape(format!(
            "a {shape} needs at least one element"
        )));
    }
    match shape {
        TensorShape::ColumnVector => Ok((elements, 1)),
        TensorShape::RowVector => Ok((1, elements)),
        TensorShape::ColumnMajorMatrix | TensorShape::RowMajorMatrix => {
            let n = integer_sqrt(elements);
            if n * n == elements {
                Ok((n, n))
            } else {
                Ok((elements, 1))
            }
        }
        TensorShape::Diagonal => Ok((elements, elements)),
        TensorShape::Symmetric | TensorShape::UpperTriangular | TensorShape::LowerTriangular => {
            let n = (integer_sqrt(8 * elements + 1) - 1) / 2;
            if triangular_number(n) == elements {
                Ok((n, n))
            } else {
                Err(TensorError::invalid_shape(format!(
                    "{elements} elements cannot form a {shape}"
                )))
            }
        }
    }
}

fn integer_sqrt(value: usize) -> usize {
    let mut n = (value as f64).sqrt() as usize;
    while n * n > value {
        n -= 1;
    }
    while (n + 1) * (n + 1) <= value {
        n += 1;
    }
    n
}

/// Mapping from a (row, col) tensor position to its storage index.
///
/// Positions that are not physically stored map to `None`. Tables are shared:
/// cloning is a reference count increment.
#[derive(Clone, Debug, PartialEq)]
pub struct TensorLookup {
    shape: TensorShape,
    rows: usize,
    cols: usize,
    table: Arc<[Option<usize>]>,
}

impl TensorLookup {
    /// Number of rows of the described matrix.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns of the described matrix.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The shape the table was built for.
    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    /// Storage index of element (row, col), `None` when it is not stored.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` if `row >= rows` or `col >= cols`.
    pub fn get(&self, row: usize, col: usize) -> Result<Option<usize>, TensorError> {
        if row >= self.rows {
            return Err(TensorError::index_out_of_bounds(row, self.rows));
        }
        if col >= self.cols {
            return Err(TensorError::index_out_of_bounds(col, self.cols));
        }
        Ok(self.table[col * self.rows + row])
    }
}

type LookupKey = (TensorShape, usize, usize);

static LOOKUP_CACHE: OnceLock<Mutex<HashMap<LookupKey, Arc<[Option<usize>]>>>> = OnceLock::new();

/// Build (or fetch from the cache) the lookup table for a tensor shape.
///
/// Symmetric and triangular shapes store the diagonal first, followed by the
/// strict upper triangle column by column; a lower triangular matrix is
/// numbered as the transpose of an upper triangular one.
///
/// # Errors
///
/// Returns `InvalidShape` if the size is inconsistent with the shape.
///
/// # Example
///
/// ```
/// use pixten_tensor::{build_lookup, TensorShape};
///
/// let lut = build_lookup(TensorShape::Symmetric, 3, 3).unwrap();
/// assert_eq!(lut.get(0, 1).unwrap(), lut.get(1, 0).unwrap());
/// assert_eq!(lut.get(2, 2).unwrap(), Some(2));
/// ```
pub fn build_lookup(
    shape: TensorShape,
    rows: usize,
    cols: usize,
) -> Result<TensorLookup, TensorError> {
    element_count(shape, rows, cols)?;

    let cache = LOOKUP_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
    let table = cache
        .entry((shape, rows, cols))
        .or_insert_with(|| {
            log::trace!("building tensor lookup table for {rows}x{cols} {shape}");
            compute_lookup(shape, rows, cols).into()
        })
        .clone();

    Ok(TensorLookup {
        shape,
        rows,
        cols,
        table,
    })
}

fn compute_lookup(shape: TensorShape, rows: usize, cols: usize) -> Vec<Option<usize>> {
    let mut table = vec![None; rows * cols];
    let at = |row: usize, col: usize| col * rows + row;
    let mut index = 0;
    match shape {
        TensorShape::ColumnVector | TensorShape::RowVector | TensorShape::ColumnMajorMatrix => {
            for (i, entry) in table.iter_mut().enumerate() {
                *entry = Some(i);
            }
        }
        TensorShape::RowMajorMatrix => {
            for row in 0..rows {
                for col in 0..cols {
                    table[at(row, col)] = Some(index);
                    index += 1;
                }
            }
        }
        TensorShape::Diagonal => {
            for i in 0..rows {
                table[at(i, i)] = Some(i);
            }
        }
        TensorShape::Symmetric | TensorShape::UpperTriangular | TensorShape::LowerTriangular => {
            for i in 0..rows {
                table[at(i, i)] = Some(index);
                index += 1;
            }
            for col in 1..cols {
                for row in 0..col {
                    match shape {
                        TensorShape::Symmetric => {
                            table[at(row, col)] = Some(index);
                            table[at(col, row)] = Some(index);
                        }
                        TensorShape::UpperTriangular => table[at(row, col)] = Some(index),
                        _ => table[at(col, row)] = Some(index),
                    }
                    index += 1;
                }
            }
        }
    }
    table
}

/// Shape, size and element count of the tensor stored at every pixel.
///
/// The three are always mutually consistent: every constructor validates them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TensorDescriptor {
    shape: TensorShape,
    rows: usize,
    cols: usize,
    elements: usize,
}

impl Default for TensorDescriptor {
    fn default() -> Self {
        Self::scalar()
    }
}

impl TensorDescriptor {
    /// A scalar: a 1x1 column vector.
    pub const fn scalar() -> Self {
        Self {
            shape: TensorShape::ColumnVector,
            rows: 1,
            cols: 1,
            elements: 1,
        }
    }

    /// A column vector with `n` elements.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if `n` is zero.
    pub fn vector(n: usize) -> Result<Self, TensorError> {
        Self::new(TensorShape::ColumnVector, n, 1)
    }

    /// A full column-major matrix.
    ///
    /// Single-row and single-column matrices are described as vectors.
    pub fn matrix(rows: usize, cols: usize) -> Result<Self, TensorError> {
        let shape = if cols == 1 {
            TensorShape::ColumnVector
        } else if rows == 1 {
            TensorShape::RowVector
        } else {
            TensorShape::ColumnMajorMatrix
        };
        Self::new(shape, rows, cols)
    }

    /// A tensor of the given shape and size.
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` when the size does not fit the shape.
    pub fn new(shape: TensorShape, rows: usize, cols: usize) -> Result<Self, TensorError> {
        let elements = element_count(shape, rows, cols)?;
        Ok(Self {
            shape,
            rows,
            cols,
            elements,
        })
    }

    /// A tensor of the given shape holding `elements` elements, size inferred.
    pub fn from_elements(shape: TensorShape, elements: usize) -> Result<Self, TensorError> {
        let (rows, cols) = infer_size(shape, elements)?;
        Self::new(shape, rows, cols)
    }

    /// A tensor from its sizes: `[]` is a scalar, `[n]` a vector, `[m, n]` a matrix.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedRank` for more than two sizes.
    pub fn from_sizes(sizes: &[usize]) -> Result<Self, TensorError> {
        match *sizes {
            [] => Ok(Self::scalar()),
            [n] => Self::vector(n),
            [rows, cols] => Self::matrix(rows, cols),
            _ => Err(TensorError::UnsupportedRank(sizes.len())),
        }
    }

    /// The storage convention.
    pub fn shape(&self) -> TensorShape {
        self.shape
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored elements, `T`.
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Sizes of the tensor: empty for a scalar, one for a vector, two for a matrix.
    pub fn sizes(&self) -> Vec<usize> {
        if self.is_scalar() {
            vec![]
        } else if self.is_vector() {
            vec![self.elements]
        } else {
            vec![self.rows, self.cols]
        }
    }

    /// A single element.
    pub fn is_scalar(&self) -> bool {
        self.elements == 1
    }

    /// A row or column vector with more than one element.
    pub fn is_vector(&self) -> bool {
        matches!(
            self.shape,
            TensorShape::ColumnVector | TensorShape::RowVector
        ) && self.elements > 1
    }

    /// The tensor is a square matrix (a scalar counts as one).
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Only the diagonal is stored.
    pub fn is_diagonal(&self) -> bool {
        self.shape == TensorShape::Diagonal
    }

    /// A symmetric matrix.
    pub fn is_symmetric(&self) -> bool {
        self.shape == TensorShape::Symmetric
    }

    /// An upper or lower triangular matrix.
    pub fn is_triangular(&self) -> bool {
        matches!(
            self.shape,
            TensorShape::UpperTriangular | TensorShape::LowerTriangular
        )
    }

    /// The lookup table for this tensor.
    pub fn lookup(&self) -> Result<TensorLookup, TensorError> {
        build_lookup(self.shape, self.rows, self.cols)
    }

    /// Storage index of element (row, col).
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfBounds` outside the matrix and `NonStoredElement`
    /// for elements without storage.
    pub fn index(&self, row: usize, col: usize) -> Result<usize, TensorError> {
        self.lookup()?
            .get(row, col)?
            .ok_or(TensorError::NonStoredElement {
                row,
                col,
                shape: self.shape,
            })
    }

    /// Change the shape keeping the number of elements, inferring the size.
    pub fn with_shape(&self, shape: TensorShape) -> Result<Self, TensorError> {
        Self::from_elements(shape, self.elements)
    }

    /// The transposed tensor. Only metadata changes, storage order is kept.
    pub fn transpose(&self) -> Self {
        let (shape, rows, cols) = match self.shape {
            TensorShape::ColumnVector => (TensorShape::RowVector, self.cols, self.rows),
            TensorShape::RowVector => (TensorShape::ColumnVector, self.cols, self.rows),
            TensorShape::ColumnMajorMatrix => (TensorShape::RowMajorMatrix, self.cols, self.rows),
            TensorShape::RowMajorMatrix => (TensorShape::ColumnMajorMatrix, self.cols, self.rows),
            TensorShape::Diagonal | TensorShape::Symmetric => (self.shape, self.rows, self.cols),
            TensorShape::UpperTriangular => (TensorShape::LowerTriangular, self.rows, self.cols),
            TensorShape::LowerTriangular => (TensorShape::UpperTriangular, self.rows, self.cols),
        };
        Self {
            shape,
            rows,
            cols,
            elements: self.elements,
        }
    }
}

impl std::fmt::Display for TensorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_scalar() {
            write!(f, "scalar, 1 element")
        } else {
            write!(
                f,
                "{}x{} {}, {} elements",
                self.rows, self.cols, self.shape, self.elements
            )
        }
    }
}
