//! Ratio statistics over selected windows
//!
//! All rates are `Option<f64>`: `None` means the window held no usable
//! data, which downstream must keep distinguishable from a real 0.0.
//! Divisions are floating-point and unrounded; rounding, if any, is a
//! display concern.

use crate::features::window::QueryFilter;
use crate::{GameAppearance, PitchEvent, PlateAppearance};

/// Mean hits per game over the selected games
///
/// `None` for an empty selection (no prior games at all). A partial
/// window still averages over the games that exist.
pub fn hits_per_game(games: &[&GameAppearance]) -> Option<f64> {
    if games.is_empty() {
        return None;
    }
    let total: u32 = games.iter().map(|g| g.hits).sum();
    Some(f64::from(total) / games.len() as f64)
}

/// Hits per plate appearance over the selection, restricted by the filter
///
/// Typically filtered to one pitcher handedness. `None` when no plate
/// appearance in the selection passes the filter.
pub fn hits_per_pa(pas: &[&PlateAppearance], filter: &QueryFilter) -> Option<f64> {
    let selected: Vec<&&PlateAppearance> =
        pas.iter().filter(|pa| filter.matches_pa(pa)).collect();
    if selected.is_empty() {
        return None;
    }
    let hits = selected.iter().filter(|pa| pa.hit).count();
    Some(hits as f64 / selected.len() as f64)
}

/// Hits allowed per out recorded over the filtered pitch events
///
/// Outs are inferred as decided plate-appearance outcomes minus hits.
/// `None` when outs <= 0: an exact zero and a negative count from a data
/// anomaly both map to null, never a division by zero or a negative rate.
pub fn hits_per_out(events: &[&PitchEvent], filter: &QueryFilter) -> Option<f64> {
    let mut decided: i64 = 0;
    let mut hits: i64 = 0;

    for event in events.iter().filter(|e| filter.matches_event(e)) {
        if event.is_decided() {
            decided += 1;
            if event.is_hit() {
                hits += 1;
            }
        }
    }

    let outs = decided - hits;
    if outs <= 0 {
        return None;
    }
    Some(hits as f64 / outs as f64)
}
