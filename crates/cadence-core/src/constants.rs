//! Unit-system constant bundle.
//!
//! Physics packages take a [`PhysicalConstants`] at construction and
//! read coupling constants from it rather than hard-coding unit-system
//! values. The bundle is built from the simulation's base units
//! expressed in SI (metres, kilograms, seconds).

/// Gravitational constant in SI units, m³ kg⁻¹ s⁻² (CODATA 2018).
const G_SI: f64 = 6.674_30e-11;

/// Speed of light in SI units, m s⁻¹.
const C_SI: f64 = 299_792_458.0;

/// Physical constants scaled into a chosen unit system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicalConstants {
    unit_length_m: f64,
    unit_mass_kg: f64,
    unit_time_s: f64,
    g: f64,
    c: f64,
}

impl PhysicalConstants {
    /// Build constants for a unit system whose base units are
    /// `unit_length_m` metres, `unit_mass_kg` kilograms, and
    /// `unit_time_s` seconds.
    pub fn new(unit_length_m: f64, unit_mass_kg: f64, unit_time_s: f64) -> Self {
        let g = G_SI / unit_length_m.powi(3) * unit_mass_kg * unit_time_s.powi(2);
        let c = C_SI / unit_length_m * unit_time_s;
        Self {
            unit_length_m,
            unit_mass_kg,
            unit_time_s,
            g,
            c,
        }
    }

    /// SI units: metre, kilogram, second.
    pub fn si() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    /// CGS units: centimetre, gram, second.
    pub fn cgs() -> Self {
        Self::new(0.01, 0.001, 1.0)
    }

    /// The gravitational constant in the chosen unit system.
    pub fn g(&self) -> f64 {
        self.g
    }

    /// The speed of light in the chosen unit system.
    pub fn speed_of_light(&self) -> f64 {
        self.c
    }

    /// Metres per unit length.
    pub fn unit_length_m(&self) -> f64 {
        self.unit_length_m
    }

    /// Kilograms per unit mass.
    pub fn unit_mass_kg(&self) -> f64 {
        self.unit_mass_kg
    }

    /// Seconds per unit time.
    pub fn unit_time_s(&self) -> f64 {
        self.unit_time_s
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::si()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn si_constants_are_unscaled() {
        let c = PhysicalConstants::si();
        assert_relative_eq!(c.g(), 6.674_30e-11);
        assert_relative_eq!(c.speed_of_light(), 299_792_458.0);
    }

    #[test]
    fn cgs_gravitational_constant() {
        let c = PhysicalConstants::cgs();
        assert_relative_eq!(c.g(), 6.674_30e-8, max_relative = 1e-12);
        assert_relative_eq!(c.speed_of_light(), 2.997_924_58e10, max_relative = 1e-12);
    }

    #[test]
    fn galactic_scale_units() {
        // kpc, solar mass, Myr.
        let kpc = 3.085_677_581e19;
        let msun = 1.988_47e30;
        let myr = 3.155_76e13;
        let c = PhysicalConstants::new(kpc, msun, myr);
        // G in these units is about 4.5e-12 kpc^3 Msun^-1 Myr^-2.
        assert!((4.0e-12..5.0e-12).contains(&c.g()));
    }
}
