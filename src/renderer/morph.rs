//! Selection and packing of morph target influences.

use crate::renderer::MAX_MORPH_TARGETS;
use std::cmp::Ordering;

/// An influence weight and the index of its morph target.
pub type ActiveInfluence = (f32, usize);

/// Picks the `max` largest influences, largest first.
///
/// The sort is stable: among equal weights (`-0.0` and `0.0` included), lower
/// target indices come first. NaN weights compare equal to everything.
pub fn select_influences(influences: &[f32], max: usize) -> Vec<ActiveInfluence> {
    let mut active: Vec<ActiveInfluence> = influences
        .iter()
        .copied()
        .enumerate()
        .map(|(i, w)| (w, i))
        .collect();

    active.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    active.truncate(max);
    active
}

/// Writes the selected weights, in order, into the fixed-size uniform array.
///
/// Slots past the selection are zeroed.
pub fn pack_influences(selected: &[ActiveInfluence]) -> [f32; MAX_MORPH_TARGETS] {
    let mut packed = [0.0; MAX_MORPH_TARGETS];

    for (slot, (weight, _)) in packed.iter_mut().zip(selected.iter()) {
        *slot = *weight;
    }

    packed
}
