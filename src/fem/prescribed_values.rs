use crate::StrError;
use russell_lab::Vector;
use std::collections::HashMap;

/// Holds essential boundary conditions given by equation number
pub struct Essential {
    /// Maps an equation number to its prescribed value as a function of time
    pub all: HashMap<usize, fn(f64) -> f64>,
}

impl Essential {
    /// Allocates a new instance
    pub fn new() -> Self {
        Essential { all: HashMap::new() }
    }

    /// Sets essential boundary condition at the given equations
    pub fn at(&mut self, equations: &[usize], f: fn(f64) -> f64) -> &mut Self {
        for eq in equations {
            self.all.insert(*eq, f);
        }
        self
    }

    /// Returns the number of prescribed equations
    pub fn size(&self) -> usize {
        self.all.len()
    }
}

/// Holds a collection of prescribed (primary) values
///
/// Besides the essential boundary conditions, the ambient (free-draining) values returned by
/// the contact interfaces are prescribed during each step.
pub struct PrescribedValues {
    /// Essential boundary conditions, sorted by equation number
    pub essential: Vec<(usize, fn(f64) -> f64)>,

    /// Ambient values of the current step
    pub ambient: Vec<(usize, f64)>,

    /// Marks the prescribed equations (essential or ambient); one flag per equation
    pub flags: Vec<bool>,

    /// Equation numbers with a true flag (the essential ones first, then the ambient ones)
    pub equations: Vec<usize>,
}

impl PrescribedValues {
    /// Allocates a new instance
    pub fn new(n_equation: usize, essential: &Essential) -> Result<Self, StrError> {
        let mut all: Vec<(usize, fn(f64) -> f64)> = essential.all.iter().map(|(eq, f)| (*eq, *f)).collect();
        all.sort_by_key(|(eq, _)| *eq);
        if all.iter().any(|(eq, _)| *eq >= n_equation) {
            return Err("prescribed equation is out of bounds");
        }
        let mut prescribed = PrescribedValues {
            essential: all,
            ambient: Vec::new(),
            flags: vec![false; n_equation],
            equations: Vec::new(),
        };
        prescribed.set_ambient(Vec::new())?;
        Ok(prescribed)
    }

    /// Replaces the ambient values and updates the flags
    ///
    /// Essential conditions take precedence over ambient values at the same equation.
    pub fn set_ambient(&mut self, ambient: Vec<(usize, f64)>) -> Result<(), StrError> {
        let n_equation = self.flags.len();
        if ambient.iter().any(|(eq, _)| *eq >= n_equation) {
            return Err("ambient equation is out of bounds");
        }
        self.flags.iter_mut().for_each(|f| *f = false);
        self.equations.clear();
        for (eq, _) in &self.essential {
            self.flags[*eq] = true;
            self.equations.push(*eq);
        }
        self.ambient.clear();
        for (eq, value) in ambient {
            if !self.flags[eq] {
                self.flags[eq] = true;
                self.equations.push(eq);
                self.ambient.push((eq, value));
            }
        }
        Ok(())
    }

    /// Sets all prescribed values in the solution vector
    pub fn apply(&self, uu: &mut Vector, time: f64) {
        for (eq, f) in &self.essential {
            uu[*eq] = f(time);
        }
        for (eq, value) in &self.ambient {
            uu[*eq] = *value;
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{Essential, PrescribedValues};
    use russell_lab::{vec_approx_eq, Vector};

    #[test]
    fn new_handles_errors() {
        let mut essential = Essential::new();
        essential.at(&[3], |_| 0.0);
        assert_eq!(
            PrescribedValues::new(3, &essential).err(),
            Some("prescribed equation is out of bounds")
        );
        let mut prescribed = PrescribedValues::new(4, &essential).unwrap();
        assert_eq!(
            prescribed.set_ambient(vec![(4, 0.0)]).err(),
            Some("ambient equation is out of bounds")
        );
    }

    #[test]
    fn prescribed_values_work() {
        let mut essential = Essential::new();
        essential.at(&[3, 0], |t| -0.15 * t).at(&[1], |_| 2.0);
        assert_eq!(essential.size(), 3);
        let mut prescribed = PrescribedValues::new(5, &essential).unwrap();
        assert_eq!(prescribed.flags, &[true, true, false, true, false]);
        assert_eq!(prescribed.equations, &[0, 1, 3]);

        // essential conditions win over ambient values
        prescribed.set_ambient(vec![(4, 7.0), (1, 9.0)]).unwrap();
        assert_eq!(prescribed.flags, &[true, true, false, true, true]);
        assert_eq!(prescribed.equations, &[0, 1, 3, 4]);
        assert_eq!(prescribed.ambient, &[(4, 7.0)]);

        // the ambient equations come after the essential ones
        prescribed.set_ambient(vec![(2, 1.0)]).unwrap();
        assert_eq!(prescribed.equations, &[0, 1, 3, 2]);
        prescribed.set_ambient(vec![(4, 7.0), (1, 9.0)]).unwrap();

        let mut uu = Vector::new(5);
        prescribed.apply(&mut uu, 2.0);
        vec_approx_eq(&uu, &[-0.3, 2.0, 0.0, -0.3, 7.0], 1e-15);

        // the ambient set changes from step to step
        prescribed.set_ambient(Vec::new()).unwrap();
        assert_eq!(prescribed.flags, &[true, true, false, true, false]);
        assert_eq!(prescribed.equations, &[0, 1, 3]);
    }
}
