//! D8 neighbour encoding shared by flow routing algorithms
//!
//! ```text
//!   4  3  2
//!   5  0  1
//!   6  7  8
//! ```
//! `0` marks a pit or flat cell with no downslope neighbour.

/// Direction offsets `(row_offset, col_offset)` indexed by code; index 0 is unused
pub const OFFSETS: [(isize, isize); 9] = [
    (0, 0),   // 0: no flow / pit
    (0, 1),   // 1: E
    (-1, 1),  // 2: NE
    (-1, 0),  // 3: N
    (-1, -1), // 4: NW
    (0, -1),  // 5: W
    (1, -1),  // 6: SW
    (1, 0),   // 7: S
    (1, 1),   // 8: SE
];

/// Distance multipliers per code: cardinal 1, diagonal sqrt(2)
pub const DISTANCES: [f64; 9] = [
    0.0,
    1.0,
    std::f64::consts::SQRT_2,
    1.0,
    std::f64::consts::SQRT_2,
    1.0,
    std::f64::consts::SQRT_2,
    1.0,
    std::f64::consts::SQRT_2,
];

/// Cell reached by stepping once in direction `dir`, or `None` when the step
/// leaves a `rows` x `cols` grid or `dir` is not a flow code.
pub fn step(row: usize, col: usize, dir: u8, rows: usize, cols: usize) -> Option<(usize, usize)> {
    if dir == 0 || dir > 8 {
        return None;
    }
    let (dr, dc) = OFFSETS[dir as usize];
    let nr = row as isize + dr;
    let nc = col as isize + dc;
    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
        return None;
    }
    Some((nr as usize, nc as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_inside_and_outside() {
        assert_eq!(step(1, 1, 1, 3, 3), Some((1, 2)));
        assert_eq!(step(1, 1, 4, 3, 3), Some((0, 0)));
        assert_eq!(step(0, 0, 3, 3, 3), None);
        assert_eq!(step(2, 2, 8, 3, 3), None);
        assert_eq!(step(1, 1, 0, 3, 3), None);
    }
}
