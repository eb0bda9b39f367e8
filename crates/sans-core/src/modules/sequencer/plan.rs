use super::CorrectionStep;
use crate::domain::ProcessType;

const DARK_CURRENT: u8 = ProcessType::DarkCurrent.bit();
const EMPTY_BEAM: u8 = ProcessType::EmptyBeam.bit();
const TRANSMISSION: u8 = ProcessType::Transmission.bit();
const EMPTY_CONTAINER: u8 = ProcessType::EmptyContainer.bit();
const WATER: u8 = ProcessType::Water.bit();
const SOLVENT: u8 = ProcessType::Solvent.bit();
const SAMPLE: u8 = ProcessType::Sample.bit();

const ALL: u8 = DARK_CURRENT | EMPTY_BEAM | TRANSMISSION | EMPTY_CONTAINER | WATER | SOLVENT | SAMPLE;
const NONE: u8 = 0;
const SCATTERING: u8 = WATER | SOLVENT | SAMPLE;

/// One row of the correction chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChainEntry {
    pub step: CorrectionStep,
    /// Process types that run this step.
    pub applies_to: u8,
    /// Process types whose reduction ends after this step.
    pub stops_after: u8,
    /// Branch depth in the decision tree; one progress report per level.
    pub level: u8,
}

const fn entry(step: CorrectionStep, applies_to: u8, stops_after: u8, level: u8) -> ChainEntry {
    ChainEntry {
        step,
        applies_to,
        stops_after,
        level,
    }
}

pub(crate) const CHAIN: [ChainEntry; 16] = [
    entry(CorrectionStep::Normalise, ALL, DARK_CURRENT, 0),
    entry(CorrectionStep::DarkCurrent, ALL & !DARK_CURRENT, NONE, 1),
    entry(CorrectionStep::BeamCentre, EMPTY_BEAM, NONE, 1),
    entry(CorrectionStep::BeamWidth, EMPTY_BEAM, NONE, 1),
    entry(CorrectionStep::IncidentFlux, EMPTY_BEAM, EMPTY_BEAM, 1),
    entry(
        CorrectionStep::DirectBeam,
        TRANSMISSION | EMPTY_CONTAINER | SCATTERING,
        NONE,
        2,
    ),
    entry(CorrectionStep::CalculateTransmission, TRANSMISSION, TRANSMISSION, 2),
    entry(CorrectionStep::Transmission, EMPTY_CONTAINER | SCATTERING, NONE, 3),
    entry(CorrectionStep::SolidAngle, EMPTY_CONTAINER, EMPTY_CONTAINER, 3),
    entry(CorrectionStep::Container, SCATTERING, NONE, 4),
    entry(CorrectionStep::Masks, SCATTERING, NONE, 4),
    entry(CorrectionStep::Parallax, SCATTERING, NONE, 4),
    entry(CorrectionStep::Thickness, SCATTERING, NONE, 4),
    entry(CorrectionStep::Sensitivity, WATER, WATER, 4),
    entry(CorrectionStep::FlatField, SOLVENT | SAMPLE, SOLVENT, 5),
    entry(CorrectionStep::Solvent, SAMPLE, SAMPLE, 6),
];

/// Chain rows a process type walks through, in order, up to its stop marker.
pub(crate) fn chain_for(process: ProcessType) -> Vec<ChainEntry> {
    let bit = process.bit();
    let mut entries = Vec::new();
    for entry in CHAIN {
        if entry.applies_to & bit == 0 {
            continue;
        }
        entries.push(entry);
        if entry.stops_after & bit != 0 {
            break;
        }
    }
    entries
}

/// Ordered correction steps of a process type.
pub fn plan_for(process: ProcessType) -> Vec<CorrectionStep> {
    chain_for(process)
        .into_iter()
        .map(|entry| entry.step)
        .collect()
}
