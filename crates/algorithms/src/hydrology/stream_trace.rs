//! D8 path tracing to a stream network
//!
//! Shared by HAND and downslope distance: every cell follows its D8 flow
//! path until the first stream cell, and the result is cached along the path
//! so each cell is walked at most once.

use stochvuln_core::raster::{d8, Raster};
use stochvuln_core::Result;

use super::flow_direction;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Trace {
    Unknown,
    /// Path ends in a pit, at the grid edge or at nodata
    Dead,
    Reached { stream: usize, distance: f64 },
}

/// Stream cell reached from each cell and the flow-path length to it
#[derive(Debug)]
pub(crate) struct StreamTrace {
    cols: usize,
    states: Vec<Trace>,
}

impl StreamTrace {
    /// `(stream_row, stream_col, distance)` for the cell, if it drains to a stream
    pub(crate) fn get(&self, row: usize, col: usize) -> Option<(usize, usize, f64)> {
        match self.states[row * self.cols + col] {
            Trace::Reached { stream, distance } => {
                Some((stream / self.cols, stream % self.cols, distance))
            }
            _ => None,
        }
    }
}

/// Whether a streams raster marks this value as a stream cell (valid and > 0)
pub(crate) fn is_stream_value(streams: &Raster<f64>, value: f64) -> bool {
    !streams.is_nodata(value) && value > 0.0
}

/// Trace every valid DEM cell downslope to the first stream cell.
///
/// Distances are in map units (D8 step length times cell size).
pub(crate) fn trace_to_streams(dem: &Raster<f64>, streams: &Raster<f64>) -> Result<StreamTrace> {
    dem.ensure_same_shape(streams)?;

    let (rows, cols) = dem.shape();
    let cell_size = dem.cell_size();
    let fdir = flow_direction(dem)?;

    let mut states = vec![Trace::Unknown; rows * cols];
    for row in 0..rows {
        for col in 0..cols {
            let s = unsafe { streams.get_unchecked(row, col) };
            let z = unsafe { dem.get_unchecked(row, col) };
            if is_stream_value(streams, s) && !dem.is_nodata(z) {
                states[row * cols + col] = Trace::Reached {
                    stream: row * cols + col,
                    distance: 0.0,
                };
            }
        }
    }

    let mut path: Vec<(usize, f64)> = Vec::new();
    for start_row in 0..rows {
        for start_col in 0..cols {
            if states[start_row * cols + start_col] != Trace::Unknown {
                continue;
            }
            if dem.is_nodata(unsafe { dem.get_unchecked(start_row, start_col) }) {
                continue;
            }

            path.clear();
            let (mut row, mut col) = (start_row, start_col);
            let end = loop {
                let idx = row * cols + col;
                if states[idx] != Trace::Unknown {
                    break states[idx];
                }
                // Strictly descending D8 paths cannot revisit a cell
                if path.len() > rows * cols {
                    break Trace::Dead;
                }

                let dir = unsafe { fdir.get_unchecked(row, col) };
                match d8::step(row, col, dir, rows, cols) {
                    Some((nr, nc)) => {
                        path.push((idx, d8::DISTANCES[dir as usize] * cell_size));
                        row = nr;
                        col = nc;
                    }
                    None => {
                        path.push((idx, 0.0));
                        break Trace::Dead;
                    }
                }
            };

            match end {
                Trace::Reached { stream, distance } => {
                    let mut acc = distance;
                    for &(idx, step) in path.iter().rev() {
                        acc += step;
                        states[idx] = Trace::Reached { stream, distance: acc };
                    }
                }
                _ => {
                    for &(idx, _) in &path {
                        states[idx] = Trace::Dead;
                    }
                }
            }
        }
    }

    Ok(StreamTrace { cols, states })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_caches_whole_path() {
        // Plane draining to the NW corner, which is the only stream cell
        let mut dem = Raster::new(4, 4);
        for row in 0..4 {
            for col in 0..4 {
                dem.set(row, col, (row + col) as f64).unwrap();
            }
        }
        let mut streams = Raster::filled(4, 4, 0.0);
        streams.set(0, 0, 1.0).unwrap();

        let trace = trace_to_streams(&dem, &streams).unwrap();
        for row in 0..4 {
            for col in 0..4 {
                let (sr, sc, _) = trace.get(row, col).unwrap();
                assert_eq!((sr, sc), (0, 0));
            }
        }
    }

    #[test]
    fn test_stream_value_rules() {
        let streams = Raster::filled(1, 1, 0.0);
        assert!(is_stream_value(&streams, 1.0));
        assert!(is_stream_value(&streams, 0.5));
        assert!(!is_stream_value(&streams, 0.0));
        assert!(!is_stream_value(&streams, -3.0));
        assert!(!is_stream_value(&streams, f64::NAN));
    }
}
