/// Run-length encode a flat binary mask.
///
/// Counts alternate between runs of zeros and runs of ones, starting with
/// zeros; a mask that starts with a one gets a leading `0` count. Any
/// non-zero value counts as one.
pub fn mask_to_rle(values: &[f64]) -> Vec<f64> {
    let mut counts = Vec::new();
    let mut current = false;
    let mut run = 0u64;

    for v in values {
        let bit = *v != 0.0;
        if bit != current {
            counts.push(run as f64);
            current = bit;
            run = 0;
        }
        run += 1;
    }
    counts.push(run as f64);
    counts
}

/// Encode `[flat mask..., xtl, ytl, xbr, ybr]` into `[rle..., xtl, ytl, xbr, ybr]`.
///
/// Returns `None` when the trailing bounding box is missing.
pub(crate) fn encode_mask(mask: &[f64]) -> Option<Vec<f64>> {
    let split = mask.len().checked_sub(4)?;
    let (flat, bbox) = mask.split_at(split);
    let mut out = mask_to_rle(flat);
    out.extend_from_slice(bbox);
    Some(out)
}
