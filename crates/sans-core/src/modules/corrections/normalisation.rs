use crate::common::constants::{PANEL_GROUPED_DEAD_TIME, monitor_ids};
use crate::domain::{NormaliseBy, SansError, SansResult};
use crate::modules::CorrectionContext;
use crate::workspace::Workspace;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Normalises by monitor counts or acquisition time, then masks both monitors.
pub fn apply_normalisation(
    workspace: &mut Workspace,
    normalise_by: NormaliseBy,
    context: &CorrectionContext,
) -> SansResult<()> {
    let [monitor_id, duration_id] = monitor_ids(context.instrument());
    match normalise_by {
        NormaliseBy::Monitor => {
            let monitor = workspace.extract_spectrum(monitor_id)?;
            if monitor.spectra[0].y.first().copied().unwrap_or(0.0) == 0.0 {
                return Err(SansError::measurement(
                    "MEASUREMENT.ZERO_MONITOR",
                    format!(
                        "normalise to monitor requested, but monitor {} of '{}' has 0 counts",
                        monitor_id, workspace.name
                    ),
                ));
            }
            workspace.divide(&monitor)?;
        }
        NormaliseBy::Time => {
            let duration = workspace.extract_spectrum(duration_id)?;
            workspace.divide(&duration)?;
            apply_dead_time(workspace, context)?;
        }
        NormaliseBy::None => {}
    }
    workspace.mask_detector_ids(&[monitor_id, duration_id]);
    Ok(())
}

/// Non-paralysable dead-time correction on count rates, pooled per detector group.
pub fn apply_dead_time(workspace: &mut Workspace, context: &CorrectionContext) -> SansResult<()> {
    let Some(tau) = workspace.instrument.number_parameter("tau") else {
        info!("no tau available in the instrument parameters, skipping dead time correction");
        return Ok(());
    };
    let groups = if PANEL_GROUPED_DEAD_TIME.contains(&context.instrument()) {
        panel_groups(workspace)
    } else if let Some(pattern) = workspace.instrument.string_parameter("grouping") {
        parse_grouping_pattern(pattern, workspace.number_histograms())?
    } else {
        warn!("no grouping available in the instrument parameters, dead time correction will be performed detector-wise");
        workspace
            .spectra
            .iter()
            .enumerate()
            .filter(|(_, spectrum)| !spectrum.monitor)
            .map(|(index, _)| vec![index])
            .collect()
    };

    let bins = workspace.blocksize();
    for group in groups {
        for bin in 0..bins {
            let rate: f64 = group
                .iter()
                .map(|index| workspace.spectra[*index].y[bin])
                .sum();
            let live_fraction = 1.0 - rate * tau;
            if live_fraction <= 0.0 {
                return Err(SansError::measurement(
                    "MEASUREMENT.DEAD_TIME",
                    format!(
                        "count rate {} with tau {} saturates the detector group starting at index {} of '{}'",
                        rate, tau, group[0], workspace.name
                    ),
                ));
            }
            for index in &group {
                let spectrum = &mut workspace.spectra[*index];
                spectrum.y[bin] /= live_fraction;
                spectrum.e[bin] /= live_fraction;
            }
        }
    }
    Ok(())
}

/// Workspace indices of the detector pixels of each panel.
fn panel_groups(workspace: &Workspace) -> Vec<Vec<usize>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, spectrum) in workspace.spectra.iter().enumerate() {
        if !spectrum.monitor {
            groups
                .entry(spectrum.component.as_str())
                .or_default()
                .push(index);
        }
    }
    groups.into_values().collect()
}

/// Parses a grouping pattern of workspace indices: groups are comma separated,
/// `a-b` is an inclusive range and `a+b` joins indices into one group.
pub fn parse_grouping_pattern(pattern: &str, histograms: usize) -> SansResult<Vec<Vec<usize>>> {
    let invalid = |token: &str| {
        SansError::validation(
            "VALIDATION.GROUPING_PATTERN",
            format!("invalid token '{}' in grouping pattern '{}'", token, pattern),
        )
    };
    let mut groups = Vec::new();
    for group_token in pattern.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let mut group = Vec::new();
        for part in group_token.split('+').map(str::trim) {
            match part.split_once('-') {
                Some((start, end)) => {
                    let start: usize = start.trim().parse().map_err(|_| invalid(part))?;
                    let end: usize = end.trim().parse().map_err(|_| invalid(part))?;
                    if end < start {
                        return Err(invalid(part));
                    }
                    group.extend(start..=end);
                }
                None => group.push(part.parse().map_err(|_| invalid(part))?),
            }
        }
        if let Some(index) = group.iter().find(|index| **index >= histograms) {
            return Err(SansError::validation(
                "VALIDATION.GROUPING_PATTERN",
                format!(
                    "grouping pattern '{}' refers to index {} but the workspace has {} spectra",
                    pattern, index, histograms
                ),
            ));
        }
        groups.push(group);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::{apply_normalisation, parse_grouping_pattern};
    use crate::domain::{AcquisitionMode, NormaliseBy, ProcessType, SansErrorCategory};
    use crate::modules::CorrectionContext;
    use crate::workspace::{DetectorGrid, Workspace};

    fn context(instrument: &str) -> CorrectionContext {
        CorrectionContext::new(
            ProcessType::Sample,
            instrument,
            AcquisitionMode::Mono,
            1,
            1,
            true,
        )
        .expect("context")
    }

    fn pixel(ws: &Workspace) -> f64 {
        ws.detectors().next().map(|s| s.y[0]).expect("pixel")
    }

    #[test]
    fn monitor_normalisation_divides_and_masks_monitors() {
        let mut ws = DetectorGrid::new("D11", 2, 2)
            .uniform_counts(50.0)
            .monitor_counts(10.0)
            .build("sample");
        apply_normalisation(&mut ws, NormaliseBy::Monitor, &context("D11")).expect("normalised");
        assert_eq!(pixel(&ws), 5.0);
        assert!(ws.spectrum_by_detector_id(100000).is_some_and(|s| s.masked));
        assert!(ws.spectrum_by_detector_id(100001).is_some_and(|s| s.masked));
    }

    #[test]
    fn zero_monitor_is_a_measurement_error() {
        let mut ws = DetectorGrid::new("D33", 2, 2).monitor_counts(0.0).build("sample");
        let error = apply_normalisation(&mut ws, NormaliseBy::Monitor, &context("D33"))
            .expect_err("zero monitor");
        assert_eq!(error.category(), SansErrorCategory::Measurement);
        assert_eq!(error.placeholder(), "MEASUREMENT.ZERO_MONITOR");
    }

    #[test]
    fn time_normalisation_applies_detector_wise_dead_time() {
        let mut ws = DetectorGrid::new("D11", 2, 2)
            .uniform_counts(100.0)
            .duration(10.0)
            .build("sample");
        ws.instrument = ws.instrument.clone().with_number_parameter("tau", 0.01);
        apply_normalisation(&mut ws, NormaliseBy::Time, &context("D11")).expect("normalised");
        // rate 10 per pixel, live fraction 0.9
        assert!((pixel(&ws) - 10.0 / 0.9).abs() < 1e-12);
    }

    #[test]
    fn panel_grouped_dead_time_pools_the_panel_rate() {
        let mut ws = DetectorGrid::new("D33", 2, 2)
            .uniform_counts(1.0)
            .build("sample");
        ws.instrument = ws.instrument.clone().with_number_parameter("tau", 0.1);
        apply_normalisation(&mut ws, NormaliseBy::Time, &context("D33")).expect("normalised");
        // four pixels at rate 1 share one group
        assert!((pixel(&ws) - 1.0 / 0.6).abs() < 1e-12);
    }

    #[test]
    fn no_normalisation_still_masks_monitors() {
        let mut ws = DetectorGrid::new("D11", 2, 2).uniform_counts(3.0).build("sample");
        apply_normalisation(&mut ws, NormaliseBy::None, &context("D11")).expect("normalised");
        assert_eq!(pixel(&ws), 3.0);
        assert_eq!(ws.masked_count(), 2);
    }

    #[test]
    fn grouping_pattern_supports_ranges_and_sums() {
        let groups = parse_grouping_pattern("0-2, 3+5,4", 6).expect("pattern");
        assert_eq!(groups, vec![vec![0, 1, 2], vec![3, 5], vec![4]]);
        assert!(parse_grouping_pattern("0-9", 6).is_err());
        assert!(parse_grouping_pattern("a", 6).is_err());
    }
}
