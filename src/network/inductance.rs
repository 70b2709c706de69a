//! Inductance matrix assembly.

use super::NetworkModel;
use crate::error::{CoilnetError, Result};
use crate::inductance::InductanceIntegrator;
use crate::matrix::{Layout, Matrix, NumberType};

impl NetworkModel {
    /// Assemble the self/mutual inductance matrix of the winding segments,
    /// indexed by [`segment_index`](Self::segment_index).
    ///
    /// The result must factor by Cholesky; it is stored tagged
    /// positive-definite with its factor.
    pub fn inductance_matrix(&mut self) -> Result<&Matrix> {
        if self.inductance.is_none() {
            let matrix = self.assemble_inductance()?;
            self.inductance = Some(matrix);
        }
        self.inductance.as_ref().ok_or(CoilnetError::InductanceNotPositiveDefinite)
    }

    /// The last assembled inductance matrix, if any.
    pub fn inductance(&self) -> Option<&Matrix> {
        self.inductance.as_ref()
    }

    fn assemble_inductance(&self) -> Result<Matrix> {
        let n = self.winding_count();
        if n == 0 {
            return Err(CoilnetError::EmptyModel);
        }
        let integrator = InductanceIntegrator::new(&self.core, &self.config);
        let prepared = self
            .winding_segments()
            .map(|s| integrator.prepare(s))
            .collect::<Result<Vec<_>>>()?;

        let mut m = Matrix::new(n, n, Layout::Symmetric, NumberType::Real)?
            .with_tolerance(self.config.matrix_tolerance);
        for i in 0..n {
            for j in i..n {
                m.set(i, j, integrator.mutual(&prepared[i], &prepared[j])?)?;
            }
        }

        if !m.test_positive_definite(true) {
            log::warn!("{}x{} inductance matrix failed the Cholesky test", n, n);
            return Err(CoilnetError::InductanceNotPositiveDefinite);
        }
        log::info!("assembled {}x{} inductance matrix", n, n);
        Ok(m)
    }
}
