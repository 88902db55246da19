use crate::StrError;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Holds the configuration parameters of a sliding contact interface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Name of the interface (used in diagnostics)
    pub name: String,

    /// Normal penalty factor ε_n (scale factor if `auto_penalty` is enabled)
    pub epsn: f64,

    /// Fluid pressure penalty factor ε_p (scale factor if `auto_penalty` is enabled)
    pub epsp: f64,

    /// Solute concentration penalty factor ε_c (scale factor if `auto_penalty` is enabled)
    pub epsc: f64,

    /// Estimates the penalty factors from the material and the facet size
    pub auto_penalty: bool,

    /// Enables augmented Lagrangian iterations (otherwise, pure penalty with λ ≡ 0)
    pub augmented_lagrangian: bool,

    /// Tolerance on the relative change of the norm of multipliers (zero disables the check)
    pub atol: f64,

    /// Tolerance on the normal gap (zero disables the check)
    pub gtol: f64,

    /// Tolerance on the fluid pressure gap (zero disables the check)
    pub ptol: f64,

    /// Tolerance on the concentration gaps (zero disables the check)
    pub ctol: f64,

    /// Search tolerance: how far outside the parametric domain a projection may fall
    pub stol: f64,

    /// Minimum number of augmentations
    pub naug_min: usize,

    /// Maximum number of augmentations
    pub naug_max: usize,

    /// Segment update period
    ///
    /// Projections may move to other facets only during the first `n_seg_up` iterations of a step.
    /// Afterwards, points stay on the facet found previously. Zero means always update segments.
    pub n_seg_up: usize,

    /// Swaps the roles of the surfaces and accumulates both contributions
    pub two_pass: bool,

    /// Symmetrizes the contact stiffness as (K + Kᵀ)/2
    pub symmetric_stiffness: bool,

    /// Higher-order (geometric) stiffness multiplier (0 or 1)
    pub knmult: f64,

    /// Maximum distance between a point and its projection
    pub search_radius: f64,

    /// Ambient fluid pressure applied to free-draining nodes
    pub ambient_pressure: f64,

    /// Ambient solute concentration applied to free-draining nodes
    pub ambient_concentration: f64,

    /// Universal gas constant R
    pub gas_constant: f64,

    /// Absolute temperature T
    pub temperature: f64,

    /// Prints augmentation statistics
    pub verbose: bool,
}

impl Config {
    /// Allocates a new instance with default values
    pub fn new() -> Self {
        Config {
            name: "contact".to_string(),
            epsn: 1.0,
            epsp: 1.0,
            epsc: 1.0,
            auto_penalty: false,
            augmented_lagrangian: false,
            atol: 0.01,
            gtol: 0.0,
            ptol: 0.0,
            ctol: 0.0,
            stol: 0.01,
            naug_min: 0,
            naug_max: 10,
            n_seg_up: 0,
            two_pass: false,
            symmetric_stiffness: false,
            knmult: 1.0,
            search_radius: 1.0,
            ambient_pressure: 0.0,
            ambient_concentration: 0.0,
            gas_constant: 8.314,
            temperature: 298.0,
            verbose: false,
        }
    }

    /// Sets the name of the interface
    pub fn set_name(&mut self, name: &str) -> Result<&mut Self, StrError> {
        if name.is_empty() {
            return Err("name must not be empty");
        }
        self.name = name.to_string();
        Ok(self)
    }

    /// Sets the normal penalty factor
    pub fn set_penalty(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("normal penalty factor must be > 0.0");
        }
        self.epsn = value;
        Ok(self)
    }

    /// Sets the fluid pressure penalty factor
    pub fn set_pressure_penalty(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("pressure penalty factor must be ≥ 0.0");
        }
        self.epsp = value;
        Ok(self)
    }

    /// Sets the concentration penalty factor
    pub fn set_concentration_penalty(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("concentration penalty factor must be ≥ 0.0");
        }
        self.epsc = value;
        Ok(self)
    }

    /// Enables or disables the automatic estimation of penalty factors
    pub fn set_auto_penalty(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.auto_penalty = flag;
        Ok(self)
    }

    /// Enables or disables the augmented Lagrangian iterations
    pub fn set_augmented_lagrangian(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.augmented_lagrangian = flag;
        Ok(self)
    }

    /// Sets the augmentation tolerances (zero disables the corresponding check)
    ///
    /// # Input
    ///
    /// * `atol` -- relative change of the norm of multipliers
    /// * `gtol` -- normal gap
    /// * `ptol` -- fluid pressure gap
    /// * `ctol` -- concentration gaps
    pub fn set_augmentation_tolerances(
        &mut self,
        atol: f64,
        gtol: f64,
        ptol: f64,
        ctol: f64,
    ) -> Result<&mut Self, StrError> {
        if atol < 0.0 || gtol < 0.0 || ptol < 0.0 || ctol < 0.0 {
            return Err("augmentation tolerances must be ≥ 0.0");
        }
        self.atol = atol;
        self.gtol = gtol;
        self.ptol = ptol;
        self.ctol = ctol;
        Ok(self)
    }

    /// Sets the search tolerance
    pub fn set_search_tolerance(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 {
            return Err("search tolerance must be ≥ 0.0");
        }
        self.stol = value;
        Ok(self)
    }

    /// Sets the minimum and maximum number of augmentations
    pub fn set_augmentation_limits(&mut self, naug_min: usize, naug_max: usize) -> Result<&mut Self, StrError> {
        if naug_min > naug_max {
            return Err("naug_min must be ≤ naug_max");
        }
        self.naug_min = naug_min;
        self.naug_max = naug_max;
        Ok(self)
    }

    /// Sets the segment update period (zero means always update segments)
    pub fn set_n_seg_up(&mut self, value: usize) -> Result<&mut Self, StrError> {
        self.n_seg_up = value;
        Ok(self)
    }

    /// Enables or disables the two-pass algorithm
    pub fn set_two_pass(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.two_pass = flag;
        Ok(self)
    }

    /// Enables or disables the symmetrization of the contact stiffness
    pub fn set_symmetric_stiffness(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.symmetric_stiffness = flag;
        Ok(self)
    }

    /// Sets the higher-order stiffness multiplier
    pub fn set_knmult(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value < 0.0 || value > 1.0 {
            return Err("knmult must be in [0, 1]");
        }
        self.knmult = value;
        Ok(self)
    }

    /// Sets the search radius
    pub fn set_search_radius(&mut self, value: f64) -> Result<&mut Self, StrError> {
        if value <= 0.0 {
            return Err("search radius must be > 0.0");
        }
        self.search_radius = value;
        Ok(self)
    }

    /// Sets the ambient pressure and concentration of free-draining nodes
    pub fn set_ambient(&mut self, pressure: f64, concentration: f64) -> Result<&mut Self, StrError> {
        if concentration < 0.0 {
            return Err("ambient concentration must be ≥ 0.0");
        }
        self.ambient_pressure = pressure;
        self.ambient_concentration = concentration;
        Ok(self)
    }

    /// Sets the universal gas constant and the absolute temperature
    pub fn set_gas_constant_and_temperature(&mut self, rr: f64, tt: f64) -> Result<&mut Self, StrError> {
        if rr <= 0.0 {
            return Err("gas constant must be > 0.0");
        }
        if tt <= 0.0 {
            return Err("absolute temperature must be > 0.0");
        }
        self.gas_constant = rr;
        self.temperature = tt;
        Ok(self)
    }

    /// Enables or disables the printing of augmentation statistics
    pub fn set_verbose(&mut self, flag: bool) -> Result<&mut Self, StrError> {
        self.verbose = flag;
        Ok(self)
    }

    /// Returns R·T
    #[inline]
    pub fn rt(&self) -> f64 {
        self.gas_constant * self.temperature
    }

    /// Returns true if projections may move to other facets at the given iteration
    #[inline]
    pub fn update_segments(&self, iteration: usize) -> bool {
        self.n_seg_up == 0 || iteration < self.n_seg_up
    }

    /// Validates all data
    ///
    /// Returns a message with the inconsistent data, or returns None if everything is all right.
    /// This is useful after reading a configuration from a file (bypassing the setters).
    pub fn validate(&self) -> Option<String> {
        if self.name.is_empty() {
            return Some("name must not be empty".to_string());
        }
        if self.epsn <= 0.0 {
            return Some(format!("epsn = {:?} is incorrect; it must be > 0.0", self.epsn));
        }
        if self.epsp < 0.0 {
            return Some(format!("epsp = {:?} is incorrect; it must be ≥ 0.0", self.epsp));
        }
        if self.epsc < 0.0 {
            return Some(format!("epsc = {:?} is incorrect; it must be ≥ 0.0", self.epsc));
        }
        if self.atol < 0.0 || self.gtol < 0.0 || self.ptol < 0.0 || self.ctol < 0.0 {
            return Some("augmentation tolerances must be ≥ 0.0".to_string());
        }
        if self.stol < 0.0 {
            return Some(format!("stol = {:?} is incorrect; it must be ≥ 0.0", self.stol));
        }
        if self.naug_min > self.naug_max {
            return Some(format!(
                "naug_min = {} is incorrect; it must be ≤ naug_max = {}",
                self.naug_min, self.naug_max
            ));
        }
        if self.knmult < 0.0 || self.knmult > 1.0 {
            return Some(format!("knmult = {:?} is incorrect; it must be in [0, 1]", self.knmult));
        }
        if self.search_radius <= 0.0 {
            return Some(format!(
                "search_radius = {:?} is incorrect; it must be > 0.0",
                self.search_radius
            ));
        }
        if self.ambient_concentration < 0.0 {
            return Some(format!(
                "ambient_concentration = {:?} is incorrect; it must be ≥ 0.0",
                self.ambient_concentration
            ));
        }
        if self.gas_constant <= 0.0 || self.temperature <= 0.0 {
            return Some("gas constant and temperature must be > 0.0".to_string());
        }
        None // all good
    }

    /// Reads a JSON file containing the configuration
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn read_json<P>(full_path: &P) -> Result<Self, StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        let input = File::open(path).map_err(|_| "cannot open file")?;
        let buffered = BufReader::new(input);
        let config: Config = serde_json::from_reader(buffered).map_err(|_| "cannot parse JSON file")?;
        Ok(config)
    }

    /// Writes a JSON file with the configuration
    ///
    /// # Input
    ///
    /// * `full_path` -- may be a String, &str, or Path
    pub fn write_json<P>(&self, full_path: &P) -> Result<(), StrError>
    where
        P: AsRef<OsStr> + ?Sized,
    {
        let path = Path::new(full_path).to_path_buf();
        if let Some(p) = path.parent() {
            fs::create_dir_all(p).map_err(|_| "cannot create directory")?;
        }
        let mut file = File::create(&path).map_err(|_| "cannot create file")?;
        serde_json::to_writer_pretty(&mut file, &self).map_err(|_| "cannot write file")?;
        Ok(())
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Contact interface configuration\n")?;
        write!(f, "===============================\n")?;
        write!(f, "name = {:?}\n", self.name)?;
        write!(f, "epsn = {:?}\n", self.epsn)?;
        write!(f, "epsp = {:?}\n", self.epsp)?;
        write!(f, "epsc = {:?}\n", self.epsc)?;
        write!(f, "auto_penalty = {:?}\n", self.auto_penalty)?;
        write!(f, "augmented_lagrangian = {:?}\n", self.augmented_lagrangian)?;
        write!(f, "atol = {:?}\n", self.atol)?;
        write!(f, "gtol = {:?}\n", self.gtol)?;
        write!(f, "ptol = {:?}\n", self.ptol)?;
        write!(f, "ctol = {:?}\n", self.ctol)?;
        write!(f, "stol = {:?}\n", self.stol)?;
        write!(f, "naug_min = {:?}\n", self.naug_min)?;
        write!(f, "naug_max = {:?}\n", self.naug_max)?;
        write!(f, "n_seg_up = {:?}\n", self.n_seg_up)?;
        write!(f, "two_pass = {:?}\n", self.two_pass)?;
        write!(f, "symmetric_stiffness = {:?}\n", self.symmetric_stiffness)?;
        write!(f, "knmult = {:?}\n", self.knmult)?;
        write!(f, "search_radius = {:?}\n", self.search_radius)?;
        write!(f, "ambient_pressure = {:?}\n", self.ambient_pressure)?;
        write!(f, "ambient_concentration = {:?}\n", self.ambient_concentration)?;
        write!(f, "gas_constant = {:?}\n", self.gas_constant)?;
        write!(f, "temperature = {:?}\n", self.temperature)?;
        write!(f, "verbose = {:?}\n", self.verbose)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::base::DEFAULT_TEST_DIR;
    use crate::StrError;

    #[test]
    fn new_works() -> Result<(), StrError> {
        let mut config = Config::new();
        assert_eq!(config.validate(), None);
        config
            .set_name("patch")?
            .set_penalty(1000.0)?
            .set_pressure_penalty(10.0)?
            .set_concentration_penalty(5.0)?
            .set_auto_penalty(true)?
            .set_augmented_lagrangian(true)?
            .set_augmentation_tolerances(0.0, 1e-7, 1e-6, 1e-5)?
            .set_search_tolerance(0.05)?
            .set_augmentation_limits(1, 5)?
            .set_n_seg_up(3)?
            .set_two_pass(true)?
            .set_symmetric_stiffness(true)?
            .set_knmult(0.0)?
            .set_search_radius(0.5)?
            .set_ambient(1.0, 2.0)?
            .set_gas_constant_and_temperature(8.0, 300.0)?
            .set_verbose(false)?;
        assert_eq!(config.validate(), None);
        assert_eq!(config.rt(), 2400.0);
        assert_eq!(config.update_segments(0), true);
        assert_eq!(config.update_segments(2), true);
        assert_eq!(config.update_segments(3), false);
        config.set_n_seg_up(0)?;
        assert_eq!(config.update_segments(100), true);
        Ok(())
    }

    #[test]
    fn display_works() {
        let config = Config::new();
        let out = format!("{}", config);
        assert!(out.starts_with(
            "Contact interface configuration\n\
             ===============================\n\
             name = \"contact\"\n\
             epsn = 1.0\n"
        ));
        assert!(out.ends_with("verbose = false\n"));
    }

    #[test]
    fn setters_capture_errors() {
        let mut config = Config::new();
        assert_eq!(config.set_name("").err(), Some("name must not be empty"));
        assert_eq!(config.set_penalty(0.0).err(), Some("normal penalty factor must be > 0.0"));
        assert_eq!(
            config.set_pressure_penalty(-1.0).err(),
            Some("pressure penalty factor must be ≥ 0.0")
        );
        assert_eq!(
            config.set_concentration_penalty(-1.0).err(),
            Some("concentration penalty factor must be ≥ 0.0")
        );
        assert_eq!(
            config.set_augmentation_tolerances(0.0, -1.0, 0.0, 0.0).err(),
            Some("augmentation tolerances must be ≥ 0.0")
        );
        assert_eq!(
            config.set_search_tolerance(-0.1).err(),
            Some("search tolerance must be ≥ 0.0")
        );
        assert_eq!(
            config.set_augmentation_limits(3, 2).err(),
            Some("naug_min must be ≤ naug_max")
        );
        assert_eq!(config.set_knmult(2.0).err(), Some("knmult must be in [0, 1]"));
        assert_eq!(config.set_search_radius(0.0).err(), Some("search radius must be > 0.0"));
        assert_eq!(
            config.set_ambient(0.0, -1.0).err(),
            Some("ambient concentration must be ≥ 0.0")
        );
        assert_eq!(
            config.set_gas_constant_and_temperature(0.0, 1.0).err(),
            Some("gas constant must be > 0.0")
        );
        assert_eq!(
            config.set_gas_constant_and_temperature(1.0, 0.0).err(),
            Some("absolute temperature must be > 0.0")
        );
    }

    #[test]
    fn validate_captures_errors() {
        let mut config = Config::new();
        config.epsn = -1.0;
        assert_eq!(
            config.validate(),
            Some("epsn = -1.0 is incorrect; it must be > 0.0".to_string())
        );
        config.epsn = 1.0;
        config.naug_min = 5;
        config.naug_max = 2;
        assert_eq!(
            config.validate(),
            Some("naug_min = 5 is incorrect; it must be ≤ naug_max = 2".to_string())
        );
        config.naug_max = 5;
        config.knmult = -0.5;
        assert_eq!(
            config.validate(),
            Some("knmult = -0.5 is incorrect; it must be in [0, 1]".to_string())
        );
        config.knmult = 1.0;
        config.search_radius = 0.0;
        assert_eq!(
            config.validate(),
            Some("search_radius = 0.0 is incorrect; it must be > 0.0".to_string())
        );
    }

    #[test]
    fn read_and_write_json_work() -> Result<(), StrError> {
        let mut config = Config::new();
        config.set_name("json")?.set_penalty(123.0)?.set_two_pass(true)?;
        let path = format!("{}/config_read_and_write_json_work.json", DEFAULT_TEST_DIR);
        config.write_json(&path)?;
        let read = Config::read_json(&path)?;
        assert_eq!(read, config);
        assert_eq!(
            Config::read_json("/tmp/pmcontact/__not_found__.json").err(),
            Some("cannot open file")
        );
        Ok(())
    }
}
