use super::N_DISP;
use crate::StrError;

/// Holds the global equation numbers of the unknowns of a surface node
#[derive(Clone, Debug, PartialEq)]
pub struct NodeDofs {
    /// Equations of the displacement components (ux, uy, uz)
    pub u: [usize; 3],

    /// Equation of the fluid pressure (porous surfaces only)
    pub p: Option<usize>,

    /// Equations of the solute concentrations, one per solute of the surface material
    pub c: Vec<usize>,
}

impl NodeDofs {
    /// Allocates DOFs numbered sequentially, node by node: ux, uy, uz, [p], [c₀, c₁, ...]
    ///
    /// # Input
    ///
    /// * `npoint` -- number of nodes
    /// * `first` -- first equation number
    /// * `porous` -- allocates the pressure DOF
    /// * `nsolute` -- number of concentration DOFs
    ///
    /// # Output
    ///
    /// Returns the DOFs and the next free equation number.
    pub fn sequential(npoint: usize, first: usize, porous: bool, nsolute: usize) -> (Vec<NodeDofs>, usize) {
        let mut next = first;
        let mut all = Vec::with_capacity(npoint);
        for _ in 0..npoint {
            let u = [next, next + 1, next + 2];
            next += N_DISP;
            let p = if porous {
                next += 1;
                Some(next - 1)
            } else {
                None
            };
            let c: Vec<usize> = (0..nsolute).map(|k| next + k).collect();
            next += nsolute;
            all.push(NodeDofs { u, p, c });
        }
        (all, next)
    }

    /// Returns the pressure equation or an error
    pub fn p_eq(&self) -> Result<usize, StrError> {
        self.p.ok_or("node has no pressure DOF")
    }

    /// Returns the equation of the k-th concentration or an error
    pub fn c_eq(&self, k: usize) -> Result<usize, StrError> {
        self.c.get(k).copied().ok_or("node has no such concentration DOF")
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::NodeDofs;

    #[test]
    fn sequential_works() {
        let (dofs, next) = NodeDofs::sequential(2, 0, false, 0);
        assert_eq!(next, 6);
        assert_eq!(dofs[1].u, [3, 4, 5]);
        assert_eq!(dofs[1].p, None);
        assert_eq!(dofs[1].p_eq().err(), Some("node has no pressure DOF"));

        let (dofs, next) = NodeDofs::sequential(2, 10, true, 2);
        assert_eq!(next, 22);
        assert_eq!(
            dofs[0],
            NodeDofs {
                u: [10, 11, 12],
                p: Some(13),
                c: vec![14, 15]
            }
        );
        assert_eq!(dofs[1].u, [16, 17, 18]);
        assert_eq!(dofs[1].p_eq(), Ok(19));
        assert_eq!(dofs[1].c_eq(1), Ok(21));
        assert_eq!(dofs[1].c_eq(2).err(), Some("node has no such concentration DOF"));
    }
}
