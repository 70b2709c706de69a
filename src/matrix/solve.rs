//! Factorizations and linear solves.
//!
//! Dense systems go through nalgebra's LU and Cholesky decompositions,
//! sparse systems through rsparse's QR solver over the coordinate map.

use num_complex::Complex64;
use rsparse::data::Trpl;

use super::{Factorization, Layout, Matrix, MatrixResult, NumberType, Storage, StoredFactor};
use crate::error::MatrixError;

impl Matrix {
    fn require_square(&self) -> MatrixResult<()> {
        if !self.is_square() {
            return Err(MatrixError::shapes((self.rows, self.rows), (self.rows, self.columns)));
        }
        Ok(())
    }

    fn require_rhs(&self, b: &Matrix) -> MatrixResult<()> {
        if !b.is_vector() || b.rows != self.rows {
            return Err(MatrixError::shapes((self.rows, 1), (b.rows, b.columns)));
        }
        Ok(())
    }

    /// LU-factor the matrix in place and keep the factors for later solves.
    pub fn factor_lu(&mut self) -> MatrixResult<()> {
        self.require_square()?;
        if self.layout == Layout::Sparse {
            return Err(MatrixError::unsupported("LU of a sparse matrix; use solve_sparse"));
        }
        let factor = match self.number {
            NumberType::Real => {
                let lu = self.to_dense_real()?.lu();
                if !lu.is_invertible() {
                    return Err(MatrixError::SingularPivot);
                }
                StoredFactor::RealLu(lu)
            }
            NumberType::Complex => {
                let lu = self.to_dense_complex().lu();
                if !lu.is_invertible() {
                    return Err(MatrixError::SingularPivot);
                }
                StoredFactor::ComplexLu(lu)
            }
        };
        self.factor = Some(factor);
        self.factorization = Factorization::Lu;
        Ok(())
    }

    /// Solve `A·x = b` for a dense square `A` and a column vector `b`.
    ///
    /// A stored LU factorization is reused when it matches the promoted
    /// number type of the solve; otherwise a fresh one is computed.
    pub fn solve_general(&self, b: &Matrix) -> MatrixResult<Matrix> {
        self.require_square()?;
        self.require_rhs(b)?;
        if self.layout == Layout::Sparse {
            return Err(MatrixError::unsupported("dense solve of a sparse matrix; use solve_sparse"));
        }

        let number = self.number.promote(b.number);
        let stored = match (&self.factor, self.factorization) {
            (Some(factor), Factorization::Lu) => Some(factor),
            _ => None,
        };

        match number {
            NumberType::Real => {
                let rhs = b.to_dense_real()?;
                let x = match stored {
                    Some(StoredFactor::RealLu(lu)) => {
                        log::debug!("reusing stored real LU factorization");
                        lu.solve(&rhs)
                    }
                    _ => self.to_dense_real()?.lu().solve(&rhs),
                };
                let x = x.ok_or(MatrixError::SingularPivot)?;
                Ok(Matrix::from_dense_real(&x, self.tolerance))
            }
            NumberType::Complex => {
                let rhs = b.to_dense_complex();
                let x = match stored {
                    Some(StoredFactor::ComplexLu(lu)) => {
                        log::debug!("reusing stored complex LU factorization");
                        lu.solve(&rhs)
                    }
                    _ => self.to_dense_complex().lu().solve(&rhs),
                };
                let x = x.ok_or(MatrixError::SingularPivot)?;
                Ok(Matrix::from_dense_complex(&x, self.tolerance))
            }
        }
    }

    /// Solve a sparse square system by QR factorization.
    ///
    /// Only real operands are supported, and `b` must be a general column
    /// vector. Afterwards the matrix is tagged as QR-factored.
    pub fn solve_sparse(&mut self, b: &Matrix) -> MatrixResult<Matrix> {
        if self.layout != Layout::Sparse {
            return Err(MatrixError::illegal("solve_sparse requires a sparse matrix"));
        }
        self.require_square()?;
        self.require_rhs(b)?;
        if self.number == NumberType::Complex || b.number == NumberType::Complex {
            return Err(MatrixError::unsupported("complex sparse solve"));
        }
        if b.layout != Layout::General {
            return Err(MatrixError::illegal("right-hand side must be a general vector"));
        }

        let map = match &self.storage {
            Storage::Sparse(Some(map)) if !map.is_empty() => map,
            _ => return Err(MatrixError::SingularPivot),
        };

        // An empty row or column is structurally singular; it would also
        // shrink the triplet matrix's inferred shape.
        let n = self.rows;
        let mut row_used = vec![false; n];
        let mut column_used = vec![false; n];
        let mut triplets = Trpl::new();
        for (&(r, c), z) in map {
            row_used[r] = true;
            column_used[c] = true;
            triplets.append(r, c, z.re);
        }
        if row_used.iter().chain(&column_used).any(|used| !used) {
            return Err(MatrixError::SingularPivot);
        }

        let a = triplets.to_sprs();
        let mut x: Vec<f64> = (0..n).map(|i| b.entry(i, 0).re).collect();
        rsparse::qrsol(&a, &mut x, 0);
        if x.iter().any(|v| !v.is_finite()) {
            return Err(MatrixError::SingularPivot);
        }

        self.factor = None;
        self.factorization = Factorization::Qr;
        Ok(Matrix::column_vector(&x).with_tolerance(self.tolerance))
    }

    /// Check positive definiteness by attempting a Cholesky factorization.
    ///
    /// Diagonal matrices are decided directly from their entries, which must
    /// be real and non-negative. Any other real matrix must first be
    /// symmetric, a complex one Hermitian (a complex-symmetric matrix with
    /// non-real off-diagonal entries is rejected). With `overwrite`, a
    /// successful factor is stored and the layout retagged `PositiveDefinite`.
    pub fn test_positive_definite(&mut self, overwrite: bool) -> bool {
        if self.layout == Layout::Diagonal {
            return (0..self.rows).all(|i| {
                let z = self.entry(i, i);
                z.re >= 0.0 && z.im == 0.0
            });
        }
        if !self.is_hermitian() {
            return false;
        }

        let factor = match self.number {
            NumberType::Real => self
                .to_dense_real()
                .ok()
                .and_then(|m| m.cholesky())
                .map(StoredFactor::RealCholesky),
            NumberType::Complex => self
                .to_dense_complex()
                .cholesky()
                .map(StoredFactor::ComplexCholesky),
        };

        match factor {
            Some(factor) => {
                if overwrite {
                    if self.layout != Layout::Sparse {
                        self.layout = Layout::PositiveDefinite;
                    }
                    self.factor = Some(factor);
                    self.factorization = Factorization::Cholesky;
                }
                true
            }
            None => false,
        }
    }

    /// Solve `A·x = b` with a Cholesky factor stored by
    /// [`test_positive_definite`](Self::test_positive_definite).
    pub fn solve_cholesky(&self, b: &Matrix) -> MatrixResult<Matrix> {
        self.require_rhs(b)?;
        match (&self.factor, self.factorization) {
            (Some(StoredFactor::RealCholesky(chol)), Factorization::Cholesky) => {
                let x = chol.solve(&b.to_dense_real()?);
                Ok(Matrix::from_dense_real(&x, self.tolerance))
            }
            (Some(StoredFactor::ComplexCholesky(chol)), Factorization::Cholesky) => {
                let rhs = b.to_dense_complex();
                let x = chol.solve(&rhs);
                Ok(Matrix::from_dense_complex(&x, self.tolerance))
            }
            _ => Err(MatrixError::illegal("no stored Cholesky factorization")),
        }
    }

    /// Complex solve convenience for callers holding plain vectors.
    pub fn solve_complex_vector(&self, b: &[Complex64]) -> MatrixResult<Vec<Complex64>> {
        let x = self.solve_general(&Matrix::complex_column_vector(b))?;
        Ok((0..x.rows).map(|i| x.entry(i, 0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spd() -> Matrix {
        Matrix::from_rows(&[
            vec![4.0, 1.0, 0.5],
            vec![1.0, 3.0, 0.25],
            vec![0.5, 0.25, 2.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_solve_general_real() {
        // 2x + y = 5, x + 3y = 6 -> x = 1.8, y = 1.4
        let a = Matrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 3.0]]).unwrap();
        let b = Matrix::column_vector(&[5.0, 6.0]);
        let x = a.solve_general(&b).unwrap();
        assert_relative_eq!(x.get(0, 0).unwrap(), 1.8, max_relative = 1e-12);
        assert_relative_eq!(x.get(1, 0).unwrap(), 1.4, max_relative = 1e-12);
    }

    #[test]
    fn test_solve_general_complex_promotion() {
        let a = Matrix::from_rows(&[vec![2.0, 0.0], vec![0.0, 4.0]]).unwrap();
        let b = Matrix::complex_column_vector(&[Complex64::new(2.0, 2.0), Complex64::new(0.0, 8.0)]);
        let x = a.solve_general(&b).unwrap();
        assert_eq!(x.number_type(), NumberType::Complex);
        let x0 = x.get_complex(0, 0).unwrap();
        let x1 = x.get_complex(1, 0).unwrap();
        assert_relative_eq!(x0.re, 1.0, max_relative = 1e-12);
        assert_relative_eq!(x0.im, 1.0, max_relative = 1e-12);
        assert_relative_eq!(x1.im, 2.0, max_relative = 1e-12);
    }

    #[test]
    fn test_stored_lu_reused_for_matching_type() {
        let mut a = spd();
        a.factor_lu().unwrap();
        assert_eq!(a.factorization(), Factorization::Lu);

        let b = Matrix::column_vector(&[1.0, 2.0, 3.0]);
        let reused = a.solve_general(&b).unwrap();
        let fresh = spd().solve_general(&b).unwrap();
        assert_eq!(reused, fresh);

        // Complex right-hand side cannot use the real factors but still solves
        let bc = b.as_complex_matrix();
        let xc = a.solve_general(&bc).unwrap();
        assert_eq!(xc.as_real_matrix().unwrap(), fresh);
    }

    #[test]
    fn test_write_drops_factorization() {
        let mut a = spd();
        a.factor_lu().unwrap();
        a.set(0, 0, 5.0).unwrap();
        assert_eq!(a.factorization(), Factorization::None);
    }

    #[test]
    fn test_singular_system_reports_pivot() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        let b = Matrix::column_vector(&[1.0, 2.0]);
        assert_eq!(a.solve_general(&b).unwrap_err(), MatrixError::SingularPivot);

        let mut a = a;
        assert_eq!(a.factor_lu().unwrap_err(), MatrixError::SingularPivot);
    }

    #[test]
    fn test_solve_preconditions() {
        let rect = Matrix::zeros(2, 3);
        let b = Matrix::column_vector(&[1.0, 2.0]);
        assert!(matches!(rect.solve_general(&b), Err(MatrixError::DimensionMismatch { .. })));

        let a = spd();
        let not_vector = Matrix::zeros(3, 2);
        assert!(matches!(a.solve_general(&not_vector), Err(MatrixError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_solve_sparse() {
        let mut a = Matrix::new(3, 3, Layout::Sparse, NumberType::Real).unwrap();
        a.set(0, 0, 4.0).unwrap();
        a.set(0, 1, 1.0).unwrap();
        a.set(1, 0, 1.0).unwrap();
        a.set(1, 1, 3.0).unwrap();
        a.set(2, 2, 2.0).unwrap();
        let b = Matrix::column_vector(&[1.0, 2.0, 4.0]);

        let x = a.solve_sparse(&b).unwrap();
        let dense = a.as_general_matrix().solve_general(&b).unwrap();
        assert_eq!(x.with_tolerance(1e-9), dense);
        assert_eq!(a.factorization(), Factorization::Qr);
    }

    #[test]
    fn test_complex_sparse_unsupported() {
        let mut a = Matrix::new(2, 2, Layout::Sparse, NumberType::Complex).unwrap();
        a.set(0, 0, 1.0).unwrap();
        a.set(1, 1, 1.0).unwrap();
        let b = Matrix::column_vector(&[1.0, 1.0]);
        assert!(matches!(a.solve_sparse(&b), Err(MatrixError::Unsupported { .. })));
    }

    #[test]
    fn test_sparse_rhs_must_be_general() {
        let mut a = Matrix::new(2, 2, Layout::Sparse, NumberType::Real).unwrap();
        a.set(0, 0, 1.0).unwrap();
        a.set(1, 1, 1.0).unwrap();
        let mut b = Matrix::new(2, 1, Layout::Sparse, NumberType::Real).unwrap();
        b.set(0, 0, 1.0).unwrap();
        assert!(matches!(a.solve_sparse(&b), Err(MatrixError::IllegalArgument { .. })));
    }

    #[test]
    fn test_sparse_empty_row_is_singular() {
        let mut a = Matrix::new(3, 3, Layout::Sparse, NumberType::Real).unwrap();
        a.set(0, 0, 1.0).unwrap();
        a.set(1, 1, 1.0).unwrap();
        let b = Matrix::column_vector(&[1.0, 1.0, 1.0]);
        assert_eq!(a.solve_sparse(&b).unwrap_err(), MatrixError::SingularPivot);
    }

    #[test]
    fn test_positive_definite_dense() {
        let mut a = spd();
        assert!(a.test_positive_definite(false));
        assert_eq!(a.layout(), Layout::General);

        assert!(a.test_positive_definite(true));
        assert_eq!(a.layout(), Layout::PositiveDefinite);
        assert_eq!(a.factorization(), Factorization::Cholesky);

        let b = Matrix::column_vector(&[1.0, 2.0, 3.0]);
        let x = a.solve_cholesky(&b).unwrap();
        assert_eq!(x.with_tolerance(1e-9), spd().solve_general(&b).unwrap());
    }

    #[test]
    fn test_indefinite_and_asymmetric_fail() {
        let mut indefinite = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
        assert!(!indefinite.test_positive_definite(true));
        assert_eq!(indefinite.factorization(), Factorization::None);

        let mut asymmetric = Matrix::from_rows(&[vec![4.0, 1.0], vec![0.0, 4.0]]).unwrap();
        assert!(!asymmetric.test_positive_definite(false));
    }

    #[test]
    fn test_diagonal_positive_definite_checked_directly() {
        let mut d = Matrix::diagonal(&[1.0, -0.5, 2.0]);
        assert!(!d.test_positive_definite(true));
        assert_eq!(d.factorization(), Factorization::None);

        let mut ok = Matrix::diagonal(&[1.0, 0.5]).as_complex_matrix();
        assert!(ok.test_positive_definite(false));
    }

    #[test]
    fn test_complex_cholesky_requires_hermitian() {
        let mut hermitian = Matrix::new(2, 2, Layout::General, NumberType::Complex).unwrap();
        hermitian.set_complex(0, 0, Complex64::new(4.0, 0.0)).unwrap();
        hermitian.set_complex(0, 1, Complex64::new(1.0, 1.0)).unwrap();
        hermitian.set_complex(1, 0, Complex64::new(1.0, -1.0)).unwrap();
        hermitian.set_complex(1, 1, Complex64::new(3.0, 0.0)).unwrap();
        assert!(hermitian.is_hermitian());
        assert!(!hermitian.is_symmetric());
        assert!(hermitian.test_positive_definite(true));

        // [[4, 1+i], [1-i, 3]] x = [5+i, 4-i] -> x = [1, 1]
        let b = Matrix::complex_column_vector(&[Complex64::new(5.0, 1.0), Complex64::new(4.0, -1.0)]);
        let x = hermitian.solve_cholesky(&b).unwrap();
        for i in 0..2 {
            let xi = x.get_complex(i, 0).unwrap();
            assert_relative_eq!(xi.re, 1.0, max_relative = 1e-12);
            assert!(xi.im.abs() < 1e-12);
        }

        // Complex symmetric, not Hermitian
        let mut symmetric = Matrix::new(2, 2, Layout::Symmetric, NumberType::Complex).unwrap();
        symmetric.set_complex(0, 0, Complex64::new(4.0, 0.0)).unwrap();
        symmetric.set_complex(0, 1, Complex64::new(1.0, 1.0)).unwrap();
        symmetric.set_complex(1, 1, Complex64::new(3.0, 0.0)).unwrap();
        assert!(symmetric.is_symmetric());
        assert!(!symmetric.test_positive_definite(true));
        assert_eq!(symmetric.factorization(), Factorization::None);

        let mut diagonal = Matrix::new(2, 2, Layout::Diagonal, NumberType::Complex).unwrap();
        diagonal.set_complex(0, 0, Complex64::new(1.0, 0.5)).unwrap();
        diagonal.set_complex(1, 1, Complex64::new(1.0, 0.0)).unwrap();
        assert!(!diagonal.test_positive_definite(false));
    }
}
