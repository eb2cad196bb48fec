//! Least-cost depression breaching
//!
//! Removes depressions by carving channels from pit cells toward lower
//! terrain instead of raising them, which preserves more of the original
//! surface than filling.
//!
//! 1. Identify pit cells (no lower D8 neighbour, not on an outlet)
//! 2. For each pit, run Dijkstra inside a `(2d+1)²` window around the pit to
//!    find the least-cost path to a lower cell or an outlet (grid edge or
//!    nodata boundary)
//! 3. Lower cells along the path so the pit drains monotonically
//! 4. Optionally fill whatever could not be breached (Priority-Flood)
//!
//! Reference:
//! Lindsay, J.B. (2016). Efficient hybrid breaching-filling sink removal
//! methods for flow path enforcement in digital elevation models.
//! *Hydrological Processes*, 30(6), 846–857.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use ndarray::Array2;
use stochvuln_core::raster::{d8, Raster};
use stochvuln_core::{Error, Result};

/// Parameters for least-cost breaching
#[derive(Debug, Clone)]
pub struct BreachParams {
    /// Search radius around each pit, in cells. Pits with no outlet inside
    /// this window are left for the fill pass.
    pub max_dist: usize,

    /// Maximum amount (elevation units) any single cell may be lowered.
    /// Default: f64::MAX (no limit)
    pub max_depth: f64,

    /// Elevation decrement enforced between successive cells of a carved
    /// channel and between filled cells. `None` (default) derives it from
    /// the DEM's elevation range, see [`default_flat_increment`].
    pub flat_increment: Option<f64>,

    /// Fill depressions that could not be breached (default true), giving a
    /// surface where every cell drains to an outlet.
    pub fill_remaining: bool,
}

impl Default for BreachParams {
    fn default() -> Self {
        Self {
            max_dist: 128,
            max_depth: f64::MAX,
            flat_increment: None,
            fill_remaining: true,
        }
    }
}

/// Smallest step that still survives a round trip through 32-bit floats.
///
/// With `d` integer digits in the largest absolute elevation the step is
/// `10^(d - 7)`: 1e-6 below 10, 1e-4 for a DEM topping out at a few hundred
/// metres, 1e-3 in the thousands. An f32 near `10^d` has a spacing just
/// under that, so consecutive channel cells stay distinct when the breached
/// surface is stored as Float32.
pub fn default_flat_increment(max_abs_elevation: f64) -> f64 {
    let digits = if max_abs_elevation.is_finite() && max_abs_elevation >= 1.0 {
        max_abs_elevation.log10().floor() as i32 + 1
    } else {
        1
    };
    10f64.powi(digits - 7)
}

/// Cell for the Dijkstra / Priority-Flood queues
#[derive(Debug, Clone)]
struct QueueCell {
    cost: f64,
    row: usize,
    col: usize,
}

impl PartialEq for QueueCell {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Eq for QueueCell {}

impl PartialOrd for QueueCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueCell {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: lower cost = higher priority
        other.cost.partial_cmp(&self.cost).unwrap_or(Ordering::Equal)
    }
}

/// Neighbours of (row, col) inside the grid, with their D8 distance factor
fn neighbours(
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
) -> impl Iterator<Item = (usize, usize, f64)> {
    (1..=8u8).filter_map(move |dir| {
        d8::step(row, col, dir, rows, cols).map(|(r, c)| (r, c, d8::DISTANCES[dir as usize]))
    })
}

/// Whether water can leave the grid at this cell (edge or next to nodata)
fn is_outlet(z: &Array2<f64>, valid: &Array2<bool>, row: usize, col: usize) -> bool {
    let (rows, cols) = z.dim();
    if row == 0 || col == 0 || row == rows - 1 || col == cols - 1 {
        return true;
    }
    neighbours(row, col, rows, cols).any(|(r, c, _)| !valid[(r, c)])
}

fn is_pit(z: &Array2<f64>, valid: &Array2<bool>, row: usize, col: usize) -> bool {
    if !valid[(row, col)] || is_outlet(z, valid, row, col) {
        return false;
    }
    let (rows, cols) = z.dim();
    let zc = z[(row, col)];
    neighbours(row, col, rows, cols).all(|(r, c, _)| z[(r, c)] >= zc)
}

/// Breach depressions in a DEM.
///
/// # Arguments
/// * `dem` - Input DEM raster
/// * `params` - Breach parameters
///
/// # Returns
/// A new raster on the DEM's grid with depressions breached (and, with
/// `fill_remaining`, any residual depressions filled). Nodata is preserved.
pub fn breach_depressions(dem: &Raster<f64>, params: BreachParams) -> Result<Raster<f64>> {
    if params.max_dist == 0 {
        return Err(Error::invalid_param("max_dist", params.max_dist, "must be >= 1 cell"));
    }
    if let Some(eps) = params.flat_increment {
        if !eps.is_finite() || eps < 0.0 {
            return Err(Error::invalid_param("flat_increment", eps, "must be finite and >= 0"));
        }
    }

    let (rows, cols) = dem.shape();

    let valid = dem.valid_mask();
    let mut output = dem.data().mapv(|v| if dem.is_nodata(v) { f64::NAN } else { v });

    let eps = params.flat_increment.unwrap_or_else(|| {
        let max_abs = output
            .iter()
            .filter(|v| !v.is_nan())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        default_flat_increment(max_abs)
    });

    // A window wider than the grid reaches nothing more
    let max_dist = params.max_dist.min(rows.max(cols));

    // Lowest pits first, so carving from one pit can drain the ones above it
    let mut pits: Vec<(usize, usize)> = Vec::new();
    for row in 1..rows.saturating_sub(1) {
        for col in 1..cols.saturating_sub(1) {
            if is_pit(&output, &valid, row, col) {
                pits.push((row, col));
            }
        }
    }
    pits.sort_by(|a, b| {
        output[*a]
            .partial_cmp(&output[*b])
            .unwrap_or(Ordering::Equal)
    });

    let win = 2 * max_dist + 1;
    let win_len = win * win;
    let mut cost = vec![f64::MAX; win_len];
    let mut prev = vec![usize::MAX; win_len];
    let mut visited = vec![false; win_len];
    let mut touched: Vec<usize> = Vec::new();

    for &(pit_row, pit_col) in &pits {
        // An earlier breach may already have drained this pit
        if !is_pit(&output, &valid, pit_row, pit_col) {
            continue;
        }
        let pit_elev = output[(pit_row, pit_col)];

        // Window origin in grid coordinates (may be negative)
        let r0 = pit_row as isize - max_dist as isize;
        let c0 = pit_col as isize - max_dist as isize;
        let local = |r: usize, c: usize| -> usize {
            ((r as isize - r0) as usize) * win + (c as isize - c0) as usize
        };
        let in_window = |r: usize, c: usize| -> bool {
            r.abs_diff(pit_row) <= max_dist && c.abs_diff(pit_col) <= max_dist
        };

        for &i in &touched {
            cost[i] = f64::MAX;
            prev[i] = usize::MAX;
            visited[i] = false;
        }
        touched.clear();

        let start = local(pit_row, pit_col);
        cost[start] = 0.0;
        touched.push(start);

        let mut heap = BinaryHeap::new();
        heap.push(QueueCell {
            cost: 0.0,
            row: pit_row,
            col: pit_col,
        });

        let mut target: Option<(usize, usize)> = None;

        while let Some(cell) = heap.pop() {
            let li = local(cell.row, cell.col);
            if visited[li] {
                continue;
            }
            visited[li] = true;

            if li != start {
                let z = output[(cell.row, cell.col)];
                if z < pit_elev || is_outlet(&output, &valid, cell.row, cell.col) {
                    target = Some((cell.row, cell.col));
                    break;
                }
            }

            for (nr, nc, dist) in neighbours(cell.row, cell.col, rows, cols) {
                if !valid[(nr, nc)] || !in_window(nr, nc) {
                    continue;
                }
                let ni = local(nr, nc);
                if visited[ni] {
                    continue;
                }

                // Carving depth, plus a small distance term so shorter
                // channels win among equally deep ones
                let nz = output[(nr, nc)];
                let carve = (nz - pit_elev).max(0.0);
                let new_cost = cell.cost + (carve + eps) * dist;

                if new_cost < cost[ni] {
                    if cost[ni] == f64::MAX {
                        touched.push(ni);
                    }
                    cost[ni] = new_cost;
                    prev[ni] = li;
                    heap.push(QueueCell {
                        cost: new_cost,
                        row: nr,
                        col: nc,
                    });
                }
            }
        }

        let Some((target_row, target_col)) = target else {
            continue;
        };

        // Trace back from the target to the pit (exclusive)
        let mut path: Vec<(usize, usize)> = Vec::new();
        let mut trace = local(target_row, target_col);
        while trace != start && trace != usize::MAX {
            let r = (trace / win) as isize + r0;
            let c = (trace % win) as isize + c0;
            path.push((r as usize, c as usize));
            trace = prev[trace];
        }
        path.reverse();

        let target_elev = output[(target_row, target_col)];
        let n_steps = path.len();
        for (step, &(r, c)) in path.iter().enumerate() {
            let is_target = step + 1 == n_steps;
            let target_z = if target_elev < pit_elev {
                // Interpolate down to the lower target; the target keeps its value
                if is_target {
                    continue;
                }
                let frac = (step + 1) as f64 / n_steps as f64;
                pit_elev + frac * (target_elev - pit_elev)
            } else {
                // Outlet at or above the pit: cut a descending channel through it
                pit_elev - (step + 1) as f64 * eps
            };

            // Only lower, never raise
            let z = output[(r, c)];
            if z > target_z && z - target_z <= params.max_depth {
                output[(r, c)] = target_z;
            }
        }
    }

    if params.fill_remaining {
        fill_residual_depressions(&mut output, &valid, eps);
    }

    let mut result = dem.with_same_meta::<f64>(rows, cols);
    result.set_nodata(Some(f64::NAN));
    *result.data_mut() = output;

    Ok(result)
}

/// Priority-Flood from all outlets, raising enclosed cells to their spill
/// elevation plus `eps` per step.
fn fill_residual_depressions(output: &mut Array2<f64>, valid: &Array2<bool>, eps: f64) {
    let (rows, cols) = output.dim();
    let mut queued = Array2::<bool>::from_elem((rows, cols), false);
    let mut heap = BinaryHeap::new();

    for row in 0..rows {
        for col in 0..cols {
            if !valid[(row, col)] {
                queued[(row, col)] = true;
                continue;
            }
            if is_outlet(output, valid, row, col) {
                heap.push(QueueCell {
                    cost: output[(row, col)],
                    row,
                    col,
                });
                queued[(row, col)] = true;
            }
        }
    }

    while let Some(cell) = heap.pop() {
        for (nr, nc, _) in neighbours(cell.row, cell.col, rows, cols) {
            if queued[(nr, nc)] {
                continue;
            }
            queued[(nr, nc)] = true;

            let nz = output[(nr, nc)];
            let filled = if nz < cell.cost + eps { cell.cost + eps } else { nz };
            output[(nr, nc)] = filled;
            heap.push(QueueCell { cost: filled, row: nr, col: nc });
        }
    }
}
