use crate::StrError;
use russell_lab::{Matrix, Vector};
use russell_sparse::CooMatrix;

/// Defines the assembly interface of the global Jacobian (stiffness) matrix
///
/// This is the seam between the contact engine and the global solver: the engine only
/// adds values at (row, column) positions given by global equation numbers.
pub trait GlobalJacobian {
    /// Adds a value to the (i, j) entry
    fn add_entry(&mut self, i: usize, j: usize, value: f64) -> Result<(), StrError>;
}

impl GlobalJacobian for CooMatrix {
    fn add_entry(&mut self, i: usize, j: usize, value: f64) -> Result<(), StrError> {
        self.put(i, j, value)
    }
}

impl GlobalJacobian for Matrix {
    fn add_entry(&mut self, i: usize, j: usize, value: f64) -> Result<(), StrError> {
        let (nrow, ncol) = self.dims();
        if i >= nrow || j >= ncol {
            return Err("index of global Jacobian entry is out of bounds");
        }
        let current = self.get(i, j);
        self.set(i, j, current + value);
        Ok(())
    }
}

/// Adds the local residual of a contact pair into the global residual vector
///
/// The entries mapped to prescribed equations are skipped.
///
/// # Input
///
/// * `rr_global` -- global residual (one entry per equation)
/// * `r_local` -- local residual of the pair
/// * `local_to_global` -- global equation number of each local entry
/// * `prescribed` -- flags of the prescribed equations (one per equation)
///
/// Panics if a global equation number does not fit `rr_global` or `prescribed`.
#[inline]
pub fn assemble_vector(rr_global: &mut Vector, r_local: &Vector, local_to_global: &[usize], prescribed: &[bool]) {
    let n_equation_local = r_local.dim();
    for l in 0..n_equation_local {
        let g = local_to_global[l];
        if !prescribed[g] {
            rr_global[g] += r_local[l];
        }
    }
}

/// Adds the local Jacobian of a contact pair into the global Jacobian
///
/// The rows and columns mapped to prescribed equations are skipped. Returns an error if the
/// global Jacobian rejects an entry (e.g., out of bounds or capacity exceeded).
///
/// # Input
///
/// * `kk_global` -- global Jacobian
/// * `kk_local` -- local (square) Jacobian of the pair
/// * `local_to_global` -- global equation number of each local row and column
/// * `prescribed` -- flags of the prescribed equations (one per equation)
pub fn assemble_matrix(
    kk_global: &mut dyn GlobalJacobian,
    kk_local: &Matrix,
    local_to_global: &[usize],
    prescribed: &[bool],
) -> Result<(), StrError> {
    let n_equation_local = kk_local.dims().0;
    for l in 0..n_equation_local {
        let g = local_to_global[l];
        if !prescribed[g] {
            for ll in 0..n_equation_local {
                let gg = local_to_global[ll];
                if !prescribed[gg] {
                    kk_global.add_entry(g, gg, kk_local.get(l, ll))?;
                }
            }
        }
    }
    Ok(())
}

/// Replaces a square matrix K by (K + Kᵀ)/2
pub fn symmetrize(kk: &mut Matrix) {
    let n = kk.dims().0;
    for i in 0..n {
        for j in (i + 1)..n {
            let v = (kk.get(i, j) + kk.get(j, i)) / 2.0;
            kk.set(i, j, v);
            kk.set(j, i, v);
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
