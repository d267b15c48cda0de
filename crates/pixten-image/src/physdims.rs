/// A magnitude with its units, e.g. the physical extent of a pixel.
///
/// # Examples
///
/// ```
/// use pixten_image::PhysicalQuantity;
///
/// let q = PhysicalQuantity::new(0.25, "um");
/// assert_eq!(q.to_string(), "0.25 um");
/// assert!(PhysicalQuantity::pixel().is_pixel());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhysicalQuantity {
    /// The numeric value.
    pub magnitude: f64,
    /// The units, `px` for a dimensionless pixel.
    pub units: String,
}

impl PhysicalQuantity {
    /// Create a new quantity.
    pub fn new(magnitude: f64, units: impl Into<String>) -> Self {
        Self {
            magnitude,
            units: units.into(),
        }
    }

    /// One pixel, the size of an axis without physical calibration.
    pub fn pixel() -> Self {
        Self::new(1.0, "px")
    }

    /// Whether the quantity is one pixel.
    pub fn is_pixel(&self) -> bool {
        self.magnitude == 1.0 && self.units == "px"
    }
}

impl Default for PhysicalQuantity {
    fn default() -> Self {
        Self::pixel()
    }
}

impl std::fmt::Display for PhysicalQuantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.magnitude, self.units)
    }
}

/// Physical size of a pixel along each spatial axis.
///
/// Axes past the last stored quantity repeat it; an empty pixel size is one
/// pixel along every axis.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelSize {
    sizes: Vec<PhysicalQuantity>,
}

impl PixelSize {
    /// The same quantity along every axis.
    pub fn isotropic(size: PhysicalQuantity) -> Self {
        Self { sizes: vec![size] }
    }

    /// One quantity per axis.
    pub fn from_vec(sizes: Vec<PhysicalQuantity>) -> Self {
        Self { sizes }
    }

    /// The quantity along `axis`.
    pub fn get(&self, axis: usize) -> PhysicalQuantity {
        self.sizes
            .get(axis)
            .or_else(|| self.sizes.last())
            .cloned()
            .unwrap_or_default()
    }

    /// Set the quantity along `axis`, repeating the last one to fill the gap.
    pub fn set(&mut self, axis: usize, size: PhysicalQuantity) {
        if axis >= self.sizes.len() {
            let fill = self.get(axis);
            self.sizes.resize(axis + 1, fill);
        }
        self.sizes[axis] = size;
    }

    /// Multiply the magnitude along `axis` by `factor`.
    ///
    /// Axes past `axis` keep their value. An undefined pixel size stays
    /// undefined.
    pub fn scale(&mut self, axis: usize, factor: f64) {
        if self.sizes.is_empty() {
            return;
        }
        if self.sizes.len() < axis + 2 {
            let fill = self.get(axis + 1);
            self.sizes.resize(axis + 2, fill);
        }
        self.sizes[axis].magnitude *= factor;
    }

    /// Whether any axis carries a physical calibration.
    pub fn is_defined(&self) -> bool {
        self.sizes.iter().any(|q| !q.is_pixel())
    }

    /// Whether every one of the first `dimensionality` axes has the same size.
    pub fn is_isotropic(&self, dimensionality: usize) -> bool {
        let first = self.get(0);
        (1..dimensionality).all(|axis| self.get(axis) == first)
    }

    /// Reorder the quantities the way the axes are reordered.
    ///
    /// `None` entries are new axes and get one pixel.
    pub(crate) fn permute(&self, order: &[Option<usize>]) -> Self {
        if self.sizes.is_empty() {
            return Self::default();
        }
        Self {
            sizes: order
                .iter()
                .map(|axis| axis.map(|a| self.get(a)).unwrap_or_default())
                .collect(),
        }
    }
}
