pub mod errors;

pub use errors::{ExitStatus, SansError, SansErrorCategory, SansResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Role a measurement plays in a SANS reduction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum ProcessType {
    DarkCurrent,
    EmptyBeam,
    Transmission,
    EmptyContainer,
    Water,
    Solvent,
    #[default]
    Sample,
}

impl ProcessType {
    pub const ALL: [ProcessType; 7] = [
        Self::DarkCurrent,
        Self::EmptyBeam,
        Self::Transmission,
        Self::EmptyContainer,
        Self::Water,
        Self::Solvent,
        Self::Sample,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DarkCurrent => "DarkCurrent",
            Self::EmptyBeam => "EmptyBeam",
            Self::Transmission => "Transmission",
            Self::EmptyContainer => "EmptyContainer",
            Self::Water => "Water",
            Self::Solvent => "Solvent",
            Self::Sample => "Sample",
        }
    }

    /// Position in the calibration chain; later processes depend on earlier ones.
    pub const fn index(self) -> usize {
        match self {
            Self::DarkCurrent => 0,
            Self::EmptyBeam => 1,
            Self::Transmission => 2,
            Self::EmptyContainer => 3,
            Self::Water => 4,
            Self::Solvent => 5,
            Self::Sample => 6,
        }
    }

    pub const fn bit(self) -> u8 {
        1 << self.index()
    }

    /// Only these may be given several comma-separated runs in mono or kinetic mode.
    pub const fn allows_run_listing(self) -> bool {
        matches!(self, Self::Sample | Self::Transmission)
    }
}

impl Display for ProcessType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for ProcessType {
    type Err = SansError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|process| process.as_str() == value)
            .ok_or_else(|| {
                SansError::validation(
                    "VALIDATION.PROCESS_TYPE",
                    format!(
                        "unknown process type '{}'; expected one of {}",
                        value,
                        Self::ALL
                            .iter()
                            .map(|process| process.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AcquisitionMode {
    Mono,
    Kinetic,
    Tof,
}

impl AcquisitionMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mono => "MONO",
            Self::Kinetic => "KINETIC",
            Self::Tof => "TOF",
        }
    }
}

impl Display for AcquisitionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NormaliseBy {
    None,
    Time,
    #[default]
    Monitor,
}

impl NormaliseBy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Time => "Time",
            Self::Monitor => "Monitor",
        }
    }
}

impl Display for NormaliseBy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for NormaliseBy {
    type Err = SansError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "None" => Ok(Self::None),
            "Time" => Ok(Self::Time),
            "Monitor" => Ok(Self::Monitor),
            other => Err(SansError::validation(
                "VALIDATION.NORMALISE_BY",
                format!("unknown normalisation '{}'; expected None, Time or Monitor", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{NormaliseBy, ProcessType};
    use crate::domain::SansErrorCategory;

    #[test]
    fn process_type_parses_its_own_names() {
        for process in ProcessType::ALL {
            assert_eq!(process.as_str().parse::<ProcessType>(), Ok(process));
        }
    }

    #[test]
    fn unknown_process_type_is_a_validation_error() {
        let error = "Background".parse::<ProcessType>().expect_err("should fail");
        assert_eq!(error.category(), SansErrorCategory::Validation);
        assert!(error.message().contains("EmptyContainer"));
    }

    #[test]
    fn process_indices_follow_calibration_order() {
        let indices: Vec<usize> = ProcessType::ALL.iter().map(|p| p.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(ProcessType::Sample.allows_run_listing());
        assert!(!ProcessType::Water.allows_run_listing());
    }

    #[test]
    fn normalise_by_defaults_to_monitor() {
        assert_eq!(NormaliseBy::default(), NormaliseBy::Monitor);
        assert_eq!("Time".parse::<NormaliseBy>(), Ok(NormaliseBy::Time));
    }
}
