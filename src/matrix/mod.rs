//! Numeric matrix engine.
//!
//! A single [`Matrix`] type covers every shape the network model needs. The
//! storage layout and number type are tags on the value rather than separate
//! types, so the assembly code can promote, convert and compare matrices
//! freely:
//!
//! | Layout | Backing |
//! |--------|---------|
//! | `General` | dense, column-major |
//! | `Symmetric` / `PositiveDefinite` | dense, writes mirrored |
//! | `Diagonal` | main diagonal only, square |
//! | `Sparse` | coordinate map, allocated on first write |
//!
//! Complex dense and diagonal backings interleave real and imaginary parts,
//! so they are twice as long as the real backing of the same shape.
//!
//! Solving and factorization live in [`solve`](self::solve); products and
//! scaling in [`ops`](self::ops).

mod ops;
mod solve;

use std::collections::BTreeMap;

use approx::relative_eq;
use nalgebra::linalg::{Cholesky, LU};
use nalgebra::{DMatrix, Dyn};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::MatrixError;

/// Result type for matrix engine operations.
pub type MatrixResult<T> = std::result::Result<T, MatrixError>;

/// Default relative tolerance used by equality and symmetry checks.
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-9;

/// Storage layout tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    General,
    Diagonal,
    Sparse,
    Symmetric,
    PositiveDefinite,
}

/// Number type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberType {
    Real,
    Complex,
}

impl NumberType {
    /// Complex if either operand is complex.
    pub fn promote(self, other: NumberType) -> NumberType {
        match (self, other) {
            (NumberType::Real, NumberType::Real) => NumberType::Real,
            _ => NumberType::Complex,
        }
    }

    /// Backing values per logical entry.
    fn width(self) -> usize {
        match self {
            NumberType::Real => 1,
            NumberType::Complex => 2,
        }
    }
}

/// Which factorization, if any, was last stored in the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Factorization {
    None,
    Lu,
    Cholesky,
    Qr,
}

#[derive(Debug, Clone)]
enum Storage {
    Dense(Vec<f64>),
    Diagonal(Vec<f64>),
    Sparse(Option<BTreeMap<(usize, usize), Complex64>>),
}

#[derive(Debug, Clone)]
enum StoredFactor {
    RealLu(LU<f64, Dyn, Dyn>),
    ComplexLu(LU<Complex64, Dyn, Dyn>),
    RealCholesky(Cholesky<f64, Dyn>),
    ComplexCholesky(Cholesky<Complex64, Dyn>),
}

/// A real or complex matrix with a storage layout tag.
#[derive(Debug, Clone)]
pub struct Matrix {
    rows: usize,
    columns: usize,
    layout: Layout,
    number: NumberType,
    factorization: Factorization,
    storage: Storage,
    factor: Option<StoredFactor>,
    tolerance: f64,
}

impl Matrix {
    /// Create a zero matrix.
    ///
    /// Diagonal, symmetric and positive-definite layouts must be square.
    pub fn new(rows: usize, columns: usize, layout: Layout, number: NumberType) -> MatrixResult<Self> {
        let square_only = matches!(
            layout,
            Layout::Diagonal | Layout::Symmetric | Layout::PositiveDefinite
        );
        if square_only && rows != columns {
            return Err(MatrixError::shapes((rows, rows), (rows, columns)));
        }

        let storage = match layout {
            Layout::General | Layout::Symmetric | Layout::PositiveDefinite => {
                Storage::Dense(vec![0.0; rows * columns * number.width()])
            }
            Layout::Diagonal => Storage::Diagonal(vec![0.0; rows * number.width()]),
            Layout::Sparse => Storage::Sparse(None),
        };

        Ok(Self {
            rows,
            columns,
            layout,
            number,
            factorization: Factorization::None,
            storage,
            factor: None,
            tolerance: DEFAULT_RELATIVE_TOLERANCE,
        })
    }

    /// Real general zero matrix.
    pub fn zeros(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            layout: Layout::General,
            number: NumberType::Real,
            factorization: Factorization::None,
            storage: Storage::Dense(vec![0.0; rows * columns]),
            factor: None,
            tolerance: DEFAULT_RELATIVE_TOLERANCE,
        }
    }

    /// Real general matrix from row slices. All rows must have equal length.
    pub fn from_rows(rows: &[Vec<f64>]) -> MatrixResult<Self> {
        let columns = rows.first().map_or(0, |r| r.len());
        let mut m = Self::zeros(rows.len(), columns);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns {
                return Err(MatrixError::shapes((rows.len(), columns), (rows.len(), row.len())));
            }
            for (j, &v) in row.iter().enumerate() {
                m.write(i, j, Complex64::new(v, 0.0))?;
            }
        }
        Ok(m)
    }

    /// Real column vector.
    pub fn column_vector(values: &[f64]) -> Self {
        Self {
            storage: Storage::Dense(values.to_vec()),
            ..Self::zeros(values.len(), 1)
        }
    }

    /// Complex column vector.
    pub fn complex_column_vector(values: &[Complex64]) -> Self {
        let data = values.iter().flat_map(|z| [z.re, z.im]).collect();
        Self {
            number: NumberType::Complex,
            storage: Storage::Dense(data),
            ..Self::zeros(values.len(), 1)
        }
    }

    /// Real diagonal matrix.
    pub fn diagonal(values: &[f64]) -> Self {
        Self {
            layout: Layout::Diagonal,
            storage: Storage::Diagonal(values.to_vec()),
            ..Self::zeros(values.len(), values.len())
        }
    }

    /// Set the relative tolerance used by `==` and the symmetry test.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn number_type(&self) -> NumberType {
        self.number
    }

    pub fn factorization(&self) -> Factorization {
        self.factorization
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.columns
    }

    pub fn is_vector(&self) -> bool {
        self.columns == 1
    }

    pub fn is_complex(&self) -> bool {
        self.number == NumberType::Complex
    }

    /// Length of the backing array; `None` for a sparse matrix (or one
    /// whose map has not been allocated yet).
    pub fn backing_len(&self) -> Option<usize> {
        match &self.storage {
            Storage::Dense(data) | Storage::Diagonal(data) => Some(data.len()),
            Storage::Sparse(map) => map.as_ref().map(|m| m.len()),
        }
    }

    /// Number of stored entries in a sparse map.
    pub fn sparse_entries(&self) -> usize {
        match &self.storage {
            Storage::Sparse(Some(map)) => map.len(),
            _ => 0,
        }
    }

    fn check_bounds(&self, row: usize, column: usize) -> MatrixResult<()> {
        if row >= self.rows || column >= self.columns {
            return Err(MatrixError::IndexOutOfBounds {
                row,
                column,
                rows: self.rows,
                columns: self.columns,
            });
        }
        Ok(())
    }

    /// Raw entry regardless of number type. Caller checks bounds.
    fn entry(&self, row: usize, column: usize) -> Complex64 {
        let w = self.number.width();
        let read = |data: &[f64], idx: usize| match self.number {
            NumberType::Real => Complex64::new(data[idx], 0.0),
            NumberType::Complex => Complex64::new(data[w * idx], data[w * idx + 1]),
        };
        match &self.storage {
            Storage::Dense(data) => read(data, column * self.rows + row),
            Storage::Diagonal(data) => {
                if row == column {
                    read(data, row)
                } else {
                    Complex64::new(0.0, 0.0)
                }
            }
            Storage::Sparse(map) => map
                .as_ref()
                .and_then(|m| m.get(&(row, column)).copied())
                .unwrap_or_default(),
        }
    }

    /// Raw write honouring the layout. Drops any stored factorization.
    fn write(&mut self, row: usize, column: usize, value: Complex64) -> MatrixResult<()> {
        self.check_bounds(row, column)?;
        self.factor = None;
        self.factorization = Factorization::None;
        if self.layout == Layout::PositiveDefinite {
            self.layout = Layout::Symmetric;
        }

        let rows = self.rows;
        let number = self.number;
        let store = |data: &mut Vec<f64>, idx: usize| match number {
            NumberType::Real => data[idx] = value.re,
            NumberType::Complex => {
                data[2 * idx] = value.re;
                data[2 * idx + 1] = value.im;
            }
        };

        match (&mut self.storage, self.layout) {
            (Storage::Dense(data), Layout::Symmetric) => {
                store(data, column * rows + row);
                store(data, row * rows + column);
            }
            (Storage::Dense(data), _) => store(data, column * rows + row),
            (Storage::Diagonal(data), _) => {
                if row == column {
                    store(data, row);
                } else if value != Complex64::default() {
                    return Err(MatrixError::illegal(format!(
                        "cannot write off-diagonal entry ({}, {}) of a diagonal matrix",
                        row, column
                    )));
                }
            }
            (Storage::Sparse(map), _) => {
                let map = map.get_or_insert_with(BTreeMap::new);
                if value == Complex64::default() {
                    map.remove(&(row, column));
                } else {
                    map.insert((row, column), value);
                }
            }
        }
        Ok(())
    }

    /// Real element. Fails for complex matrices.
    pub fn get(&self, row: usize, column: usize) -> MatrixResult<f64> {
        self.check_bounds(row, column)?;
        match self.number {
            NumberType::Real => Ok(self.entry(row, column).re),
            NumberType::Complex => Err(MatrixError::type_mismatch(
                "real element requested from a complex matrix",
            )),
        }
    }

    /// Complex element. Fails for real matrices.
    pub fn get_complex(&self, row: usize, column: usize) -> MatrixResult<Complex64> {
        self.check_bounds(row, column)?;
        match self.number {
            NumberType::Complex => Ok(self.entry(row, column)),
            NumberType::Real => Err(MatrixError::type_mismatch(
                "complex element requested from a real matrix",
            )),
        }
    }

    /// Set a real value (stored with zero imaginary part in a complex matrix).
    pub fn set(&mut self, row: usize, column: usize, value: f64) -> MatrixResult<()> {
        self.write(row, column, Complex64::new(value, 0.0))
    }

    /// Set a complex value. Fails for real matrices.
    pub fn set_complex(&mut self, row: usize, column: usize, value: Complex64) -> MatrixResult<()> {
        if self.number == NumberType::Real {
            return Err(MatrixError::type_mismatch("complex value written to a real matrix"));
        }
        self.write(row, column, value)
    }

    /// Add a real value to an element.
    pub fn add(&mut self, row: usize, column: usize, value: f64) -> MatrixResult<()> {
        self.check_bounds(row, column)?;
        let current = self.entry(row, column);
        self.write(row, column, current + Complex64::new(value, 0.0))
    }

    /// Copy of this matrix with complex storage (imaginary parts zero).
    pub fn as_complex_matrix(&self) -> Matrix {
        let storage = match (&self.storage, self.number) {
            (storage, NumberType::Complex) => storage.clone(),
            (Storage::Dense(data), NumberType::Real) => Storage::Dense(widen(data)),
            (Storage::Diagonal(data), NumberType::Real) => Storage::Diagonal(widen(data)),
            (Storage::Sparse(map), NumberType::Real) => Storage::Sparse(map.clone()),
        };
        Matrix {
            rows: self.rows,
            columns: self.columns,
            layout: self.layout,
            number: NumberType::Complex,
            factorization: Factorization::None,
            storage,
            factor: None,
            tolerance: self.tolerance,
        }
    }

    /// Copy of this matrix with real storage. Fails if any imaginary part is non-zero.
    pub fn as_real_matrix(&self) -> MatrixResult<Matrix> {
        if self.number == NumberType::Real {
            return Ok(self.clone());
        }
        let narrow = |data: &[f64]| -> MatrixResult<Vec<f64>> {
            data.chunks(2)
                .map(|pair| {
                    if pair[1] != 0.0 {
                        Err(MatrixError::type_mismatch("matrix has non-zero imaginary parts"))
                    } else {
                        Ok(pair[0])
                    }
                })
                .collect()
        };
        let storage = match &self.storage {
            Storage::Dense(data) => Storage::Dense(narrow(data)?),
            Storage::Diagonal(data) => Storage::Diagonal(narrow(data)?),
            Storage::Sparse(map) => {
                if map.iter().flat_map(|m| m.values()).any(|z| z.im != 0.0) {
                    return Err(MatrixError::type_mismatch("matrix has non-zero imaginary parts"));
                }
                Storage::Sparse(map.clone())
            }
        };
        Ok(Matrix {
            number: NumberType::Real,
            factorization: Factorization::None,
            storage,
            factor: None,
            ..self.clone()
        })
    }

    /// Dense general copy with the same number type.
    pub fn as_general_matrix(&self) -> Matrix {
        self.dense_general(self.rows, self.columns, |row, column| self.entry(row, column))
    }

    /// Transposed general copy.
    pub fn transpose(&self) -> Matrix {
        self.dense_general(self.columns, self.rows, |row, column| self.entry(column, row))
    }

    /// Column-major general matrix of the given shape filled from `value`.
    fn dense_general(&self, rows: usize, columns: usize, value: impl Fn(usize, usize) -> Complex64) -> Matrix {
        let mut data = vec![0.0; rows * columns * self.number.width()];
        for column in 0..columns {
            for row in 0..rows {
                let z = value(row, column);
                let idx = column * rows + row;
                match self.number {
                    NumberType::Real => data[idx] = z.re,
                    NumberType::Complex => {
                        data[2 * idx] = z.re;
                        data[2 * idx + 1] = z.im;
                    }
                }
            }
        }
        Matrix {
            rows,
            columns,
            layout: Layout::General,
            number: self.number,
            factorization: Factorization::None,
            storage: Storage::Dense(data),
            factor: None,
            tolerance: self.tolerance,
        }
    }

    /// Real values of a dense/diagonal/sparse real matrix as an nalgebra matrix.
    fn to_dense_real(&self) -> MatrixResult<DMatrix<f64>> {
        if self.number == NumberType::Complex {
            return Err(MatrixError::type_mismatch("real view requested of a complex matrix"));
        }
        Ok(DMatrix::from_fn(self.rows, self.columns, |r, c| self.entry(r, c).re))
    }

    /// Complex values of any matrix as an nalgebra matrix.
    fn to_dense_complex(&self) -> DMatrix<Complex64> {
        DMatrix::from_fn(self.rows, self.columns, |r, c| self.entry(r, c))
    }

    fn from_dense_real(m: &DMatrix<f64>, tolerance: f64) -> Matrix {
        Matrix {
            storage: Storage::Dense(m.as_slice().to_vec()),
            tolerance,
            ..Self::zeros(m.nrows(), m.ncols())
        }
    }

    fn from_dense_complex(m: &DMatrix<Complex64>, tolerance: f64) -> Matrix {
        Matrix {
            number: NumberType::Complex,
            storage: Storage::Dense(m.as_slice().iter().flat_map(|z| [z.re, z.im]).collect()),
            tolerance,
            ..Self::zeros(m.nrows(), m.ncols())
        }
    }

    /// Square, and every (i, j)/(j, i) pair equal within the relative tolerance.
    pub fn is_symmetric(&self) -> bool {
        if !self.is_square() {
            return false;
        }
        for i in 0..self.rows {
            for j in (i + 1)..self.columns {
                if !complex_close(self.entry(i, j), self.entry(j, i), self.tolerance) {
                    return false;
                }
            }
        }
        true
    }

    /// Square, real diagonal, and every (i, j) entry the conjugate of (j, i)
    /// within the relative tolerance. Same as [`is_symmetric`](Self::is_symmetric)
    /// for real matrices.
    pub fn is_hermitian(&self) -> bool {
        if !self.is_square() {
            return false;
        }
        for i in 0..self.rows {
            let d = self.entry(i, i);
            if d.im.abs() > self.tolerance * d.norm() {
                return false;
            }
            for j in (i + 1)..self.columns {
                if !complex_close(self.entry(i, j), self.entry(j, i).conj(), self.tolerance) {
                    return false;
                }
            }
        }
        true
    }
}

impl PartialEq for Matrix {
    /// Tags, shape and factorization must match exactly; entries within
    /// the left operand's relative tolerance.
    fn eq(&self, other: &Self) -> bool {
        if self.layout != other.layout
            || self.number != other.number
            || self.factorization != other.factorization
            || self.rows != other.rows
            || self.columns != other.columns
        {
            return false;
        }
        let tol = self.tolerance;
        match (&self.storage, &other.storage) {
            (Storage::Dense(a), Storage::Dense(b)) | (Storage::Diagonal(a), Storage::Diagonal(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|(x, y)| relative_eq!(*x, *y, epsilon = f64::EPSILON, max_relative = tol))
            }
            (Storage::Sparse(a), Storage::Sparse(b)) => {
                let keys: std::collections::BTreeSet<&(usize, usize)> =
                    a.iter().chain(b.iter()).flat_map(|m| m.keys()).collect();
                keys.into_iter()
                    .all(|&(r, c)| complex_close(self.entry(r, c), other.entry(r, c), tol))
            }
            _ => false,
        }
    }
}

fn widen(data: &[f64]) -> Vec<f64> {
    data.iter().flat_map(|&x| [x, 0.0]).collect()
}

fn complex_close(a: Complex64, b: Complex64, tol: f64) -> bool {
    relative_eq!(a.re, b.re, epsilon = f64::EPSILON, max_relative = tol)
        && relative_eq!(a.im, b.im, epsilon = f64::EPSILON, max_relative = tol)
}
