use crate::Scalar;
use serde::{Deserialize, Serialize};

/// Error thrown during density field construction.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum DensityFieldError {
    /// Wrong data length.
    /// (provided, expected)
    #[error("wrong density data length: got {0}, expected {1}")]
    WrongDataLength(usize, usize),
    /// Field has no pixels.
    #[error("density field must have positive dimensions")]
    EmptyField,
}

/// Per-pixel scalar ink density map over the analysis extent.
///
/// Values are in `[0, 1]`, stored row-major, one per analysis pixel; higher
/// means more visual weight at that location. Built once per invocation and
/// immutable thereafter.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityField {
    width: usize,
    height: usize,
    data: Vec<Scalar>,
}

impl DensityField {
    /// Create new density field.
    ///
    /// # Arguments
    /// * `width` - Columns.
    /// * `height` - Rows.
    /// * `data` - Row-major density samples in `[0, 1]`.
    ///
    /// # Returns
    /// Density field or error.
    ///
    /// # Examples
    /// ```
    /// use lowpoly_core::prelude::*;
    ///
    /// assert!(DensityField::new(2, 2, vec![0.0, 1.0, 0.0, 1.0]).is_ok());
    /// assert_eq!(
    ///     DensityField::new(1, 2, vec![0.0, 1.0, 0.0, 1.0]),
    ///     Err(DensityFieldError::WrongDataLength(4, 2)),
    /// );
    /// ```
    pub fn new(width: usize, height: usize, data: Vec<Scalar>) -> Result<Self, DensityFieldError> {
        if width == 0 || height == 0 {
            return Err(DensityFieldError::EmptyField);
        }
        if data.len() != width * height {
            return Err(DensityFieldError::WrongDataLength(
                data.len(),
                width * height,
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Returns width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns values buffer.
    pub fn values(&self) -> &[Scalar] {
        &self.data
    }

    /// Returns density at a fractional position, bilinearly interpolated
    /// between the four surrounding samples. Coordinates are clamped to the
    /// valid index range.
    ///
    /// # Examples
    /// ```
    /// use lowpoly_core::prelude::*;
    ///
    /// let field = DensityField::new(2, 1, vec![0.0, 1.0]).unwrap();
    /// assert_eq!(field.value_at(0.5, 0.0), 0.5);
    /// assert_eq!(field.value_at(-3.0, 0.0), 0.0);
    /// assert_eq!(field.value_at(10.0, 10.0), 1.0);
    /// ```
    pub fn value_at(&self, x: Scalar, y: Scalar) -> Scalar {
        let cx = x.clamp(0.0, (self.width - 1) as Scalar);
        let cy = y.clamp(0.0, (self.height - 1) as Scalar);
        let x0 = cx.floor() as usize;
        let y0 = cy.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = (cx - x0 as Scalar).clamp(0.0, 1.0);
        let ty = (cy - y0 as Scalar).clamp(0.0, 1.0);
        let at = |xx: usize, yy: usize| self.data[yy * self.width + xx];
        at(x0, y0) * (1.0 - tx) * (1.0 - ty)
            + at(x1, y0) * tx * (1.0 - ty)
            + at(x0, y1) * (1.0 - tx) * ty
            + at(x1, y1) * tx * ty
    }
}
