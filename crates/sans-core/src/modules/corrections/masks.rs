use crate::domain::SansResult;
use crate::workspace::Workspace;
use tracing::debug;

/// Applies the default (edge) mask and the beam-stop mask.
pub fn apply_masks(
    workspace: &mut Workspace,
    edge_mask: Option<&Workspace>,
    beam_stop_mask: Option<&Workspace>,
) -> SansResult<()> {
    for mask in [edge_mask, beam_stop_mask].into_iter().flatten() {
        let masked = workspace.copy_mask_from(mask);
        debug!(mask = %mask.name, masked, "applied mask");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::apply_masks;
    use crate::workspace::{DetectorGrid, Workspace};

    fn mask_with(ids: &[i64]) -> Workspace {
        let mut mask = DetectorGrid::new("D11", 3, 3).build("mask");
        mask.mask_detector_ids(ids);
        mask
    }

    #[test]
    fn both_masks_accumulate() {
        let mut ws = DetectorGrid::new("D11", 3, 3).uniform_counts(4.0).build("sample");
        apply_masks(&mut ws, Some(&mask_with(&[0, 1])), Some(&mask_with(&[1, 4]))).expect("masked");
        assert_eq!(ws.masked_count(), 3);
        assert_eq!(ws.spectrum_by_detector_id(4).map(|s| s.total_counts()), Some(0.0));
    }

    #[test]
    fn missing_masks_change_nothing() {
        let mut ws = DetectorGrid::new("D11", 3, 3).build("sample");
        apply_masks(&mut ws, None, None).expect("no-op");
        assert_eq!(ws.masked_count(), 0);
    }
}
