//! Noise-model vocabulary.
//!
//! Each abbreviation token maps to the model identifier(s) the estimation
//! engine understands, plus any auxiliary settings that identifier needs.

use std::fmt;

/// A noise-model token as written in an abbreviation string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoiseModel {
    White,
    FlickerGgm,
    RandomWalkGgm,
    Ggm,
    /// GGM with flicker-like fixed shape (`kappa = -1`, `1-phi = 0.02`).
    FlickerCompatibleGgm,
    /// Power-law noise, approximated by GGM with a tiny fixed `1-phi`.
    PowerLaw,
    Matern,
    Ar1,
    VaryingAnnual,
    VaryingSemiAnnual,
}

impl NoiseModel {
    /// Vocabulary in lookup order.
    pub const ALL: [NoiseModel; 10] = [
        NoiseModel::FlickerCompatibleGgm,
        NoiseModel::Matern,
        NoiseModel::Ggm,
        NoiseModel::PowerLaw,
        NoiseModel::FlickerGgm,
        NoiseModel::White,
        NoiseModel::RandomWalkGgm,
        NoiseModel::Ar1,
        NoiseModel::VaryingAnnual,
        NoiseModel::VaryingSemiAnnual,
    ];

    pub fn abbreviation(self) -> &'static str {
        match self {
            NoiseModel::White => "WN",
            NoiseModel::FlickerGgm => "FN",
            NoiseModel::RandomWalkGgm => "RW",
            NoiseModel::Ggm => "GGM",
            NoiseModel::FlickerCompatibleGgm => "fGGM",
            NoiseModel::PowerLaw => "PL",
            NoiseModel::Matern => "MT",
            NoiseModel::Ar1 => "AR1",
            NoiseModel::VaryingAnnual => "VA",
            NoiseModel::VaryingSemiAnnual => "VSA",
        }
    }

    pub fn from_abbreviation(abbr: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.abbreviation() == abbr)
    }

    /// Model identifier used in the trend engine's `NoiseModels` line.
    pub fn engine_name(self) -> &'static str {
        match self {
            NoiseModel::White => "White",
            NoiseModel::FlickerGgm => "FlickerGGM",
            NoiseModel::RandomWalkGgm => "RandomWalkGGM",
            NoiseModel::Ggm | NoiseModel::FlickerCompatibleGgm | NoiseModel::PowerLaw => "GGM",
            NoiseModel::Matern => "Matern",
            NoiseModel::Ar1 => "ARMA",
            NoiseModel::VaryingAnnual => "VaryingAnnual",
            NoiseModel::VaryingSemiAnnual => "VaryingSemiAnnual",
        }
    }

    /// Needs the engine-wide default `GGM_1mphi`.
    pub fn needs_fixed_one_minus_phi(self) -> bool {
        matches!(
            self,
            NoiseModel::PowerLaw | NoiseModel::FlickerGgm | NoiseModel::RandomWalkGgm
        )
    }

    pub fn is_varying_seasonal(self) -> bool {
        matches!(self, NoiseModel::VaryingAnnual | NoiseModel::VaryingSemiAnnual)
    }

    /// Members of the family that pins the GGM spectral index.
    pub fn conflicts_with_ggm(self) -> bool {
        matches!(
            self,
            NoiseModel::PowerLaw | NoiseModel::FlickerGgm | NoiseModel::RandomWalkGgm
        )
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations_round_trip() {
        for model in NoiseModel::ALL {
            assert_eq!(NoiseModel::from_abbreviation(model.abbreviation()), Some(model));
        }
        assert_eq!(NoiseModel::from_abbreviation("ggm"), None);
    }

    #[test]
    fn power_law_runs_through_ggm() {
        assert_eq!(NoiseModel::PowerLaw.engine_name(), "GGM");
        assert!(NoiseModel::PowerLaw.needs_fixed_one_minus_phi());
        assert!(!NoiseModel::FlickerCompatibleGgm.needs_fixed_one_minus_phi());
    }
}
