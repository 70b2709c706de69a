//! Scaling and matrix products.

use std::collections::BTreeMap;

use num_complex::Complex64;

use super::{Factorization, Layout, Matrix, MatrixResult, NumberType, Storage};
use crate::error::MatrixError;

impl Matrix {
    /// Multiply every entry by a real scalar. Layout and number type are kept.
    pub fn scale(&self, factor: f64) -> Matrix {
        let storage = match &self.storage {
            Storage::Dense(data) => Storage::Dense(data.iter().map(|x| x * factor).collect()),
            Storage::Diagonal(data) => Storage::Diagonal(data.iter().map(|x| x * factor).collect()),
            Storage::Sparse(map) => Storage::Sparse(map.as_ref().map(|m| {
                m.iter()
                    .map(|(&k, &v)| (k, v * factor))
                    .filter(|(_, v)| *v != Complex64::default())
                    .collect()
            })),
        };
        Matrix {
            storage,
            factorization: Factorization::None,
            factor: None,
            ..self.clone()
        }
    }

    /// Multiply every entry by a complex scalar; a real matrix is promoted.
    pub fn scale_complex(&self, factor: Complex64) -> Matrix {
        let promoted = self.as_complex_matrix();
        let scale_pairs = |data: &[f64]| -> Vec<f64> {
            data.chunks(2)
                .flat_map(|pair| {
                    let z = Complex64::new(pair[0], pair[1]) * factor;
                    [z.re, z.im]
                })
                .collect()
        };
        let storage = match &promoted.storage {
            Storage::Dense(data) => Storage::Dense(scale_pairs(data)),
            Storage::Diagonal(data) => Storage::Diagonal(scale_pairs(data)),
            Storage::Sparse(map) => Storage::Sparse(map.as_ref().map(|m| {
                m.iter()
                    .map(|(&k, &v)| (k, v * factor))
                    .filter(|(_, v)| *v != Complex64::default())
                    .collect::<BTreeMap<_, _>>()
            })),
        };
        Matrix { storage, ..promoted }
    }

    /// Matrix product `self * rhs`.
    ///
    /// The result is complex if either operand is. A diagonal matrix times a
    /// vector takes a direct element-wise path; diagonal times diagonal stays
    /// diagonal; everything else goes through a dense product.
    pub fn multiply(&self, rhs: &Matrix) -> MatrixResult<Matrix> {
        if self.columns != rhs.rows {
            return Err(MatrixError::DimensionMismatch {
                expected: format!("{} rows on the right-hand side", self.columns),
                actual: format!("{}x{}", rhs.rows, rhs.columns),
            });
        }
        let number = self.number.promote(rhs.number);

        match (self.layout, rhs.layout) {
            (Layout::Diagonal, Layout::Diagonal) => {
                let mut out = Matrix::new(self.rows, self.rows, Layout::Diagonal, number)?;
                for i in 0..self.rows {
                    out.write(i, i, self.entry(i, i) * rhs.entry(i, i))?;
                }
                Ok(out.with_tolerance(self.tolerance))
            }
            (Layout::Diagonal, _) if rhs.is_vector() => {
                let mut out = Matrix::new(self.rows, 1, Layout::General, number)?;
                for i in 0..self.rows {
                    out.write(i, 0, self.entry(i, i) * rhs.entry(i, 0))?;
                }
                Ok(out.with_tolerance(self.tolerance))
            }
            _ => match number {
                NumberType::Real => {
                    let product = self.to_dense_real()? * rhs.to_dense_real()?;
                    Ok(Matrix::from_dense_real(&product, self.tolerance))
                }
                NumberType::Complex => {
                    let product = self.to_dense_complex() * rhs.to_dense_complex();
                    Ok(Matrix::from_dense_complex(&product, self.tolerance))
                }
            },
        }
    }
}
