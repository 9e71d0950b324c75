//! Removal of coincident stations and detection of closed body caps.
//!
//! Two stations are degenerate when the RMS distance between their matching
//! points is below a tolerance relative to the local size of the geometry:
//! the larger chord of the pair for wings, the largest bounding-box extent
//! for bodies. The sweep never drops the first or the last station, and the
//! result has no degenerate neighbor pair, so re-running it removes nothing.

use serde::{Deserialize, Serialize};

use crate::geometry::metrics::rms_distance;
use crate::io::flat_plate::{Station, StationGrid, StationKind};
use crate::mesh_error::WakeMeshError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Station spacing below this fraction of the local extent is degenerate.
    pub relative_tolerance: f64,
    /// RMS ring radius (about the ring's first point) at or below which a
    /// body station is a closed cap.
    pub cap_tolerance: f64,
}

impl Default for FilterOptions {
    fn default() -> Self {
        FilterOptions {
            relative_tolerance: 1e-6,
            cap_tolerance: 1e-7,
        }
    }
}

/// What the filter changed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    /// Original indices of the dropped stations, ascending.
    pub removed: Vec<usize>,
    /// The first body station is a single point.
    pub nose_closed: bool,
    /// The last body station is a single point.
    pub tail_closed: bool,
}

/// Drop degenerate stations from `grid` in place.
pub fn filter_stations(
    grid: &mut StationGrid,
    opts: &FilterOptions,
) -> Result<FilterReport, WakeMeshError> {
    let n = grid.num_i();
    if n < 2 {
        return Err(WakeMeshError::Format(format!(
            "need at least 2 stations, got {n}"
        )));
    }

    let positions: Vec<Vec<[f64; 3]>> = grid.stations.iter().map(Station::positions).collect();
    let body_scale = grid.bounding_box().map_or(0.0, |b| b.max_extent());
    let degenerate = |a: usize, b: usize| {
        let scale = match grid.kind {
            StationKind::Wing => grid.stations[a].chord().max(grid.stations[b].chord()),
            StationKind::Body => body_scale,
        };
        rms_distance(&positions[a], &positions[b]) <= opts.relative_tolerance * scale
    };

    let mut kept = vec![0usize];
    for i in 1..n - 1 {
        let last = kept[kept.len() - 1];
        if !degenerate(last, i) {
            kept.push(i);
        }
    }
    // the final station always survives; retire interior stations it collapses onto
    while kept.len() > 1 && kept.last().is_some_and(|&last| degenerate(last, n - 1)) {
        kept.pop();
    }
    if kept.last().is_some_and(|&last| degenerate(last, n - 1)) {
        return Err(WakeMeshError::Format(
            "fewer than 2 distinct stations after removing degenerate ones".into(),
        ));
    }
    kept.push(n - 1);

    let removed: Vec<usize> = (0..n).filter(|i| !kept.contains(i)).collect();
    if !removed.is_empty() {
        let mut index = 0;
        grid.stations.retain(|_| {
            let keep = kept.binary_search(&index).is_ok();
            index += 1;
            keep
        });
        log::debug!("Removed {} degenerate stations: {:?}", removed.len(), removed);
    }

    let (nose_closed, tail_closed) = match grid.kind {
        StationKind::Wing => (false, false),
        StationKind::Body => {
            let closed = |s: &Station| is_closed_ring(s, opts.cap_tolerance);
            (
                grid.stations.first().is_some_and(closed),
                grid.stations.last().is_some_and(closed),
            )
        }
    };
    if nose_closed || tail_closed {
        log::debug!("Closed caps: nose = {nose_closed}, tail = {tail_closed}");
    }

    Ok(FilterReport {
        removed,
        nose_closed,
        tail_closed,
    })
}

/// Whether every point of the ring sits on its first point.
pub fn is_closed_ring(station: &Station, tolerance: f64) -> bool {
    let positions = station.positions();
    let Some(&first) = positions.first() else {
        return false;
    };
    let apex = vec![first; positions.len()];
    rms_distance(&positions, &apex) <= tolerance
}
