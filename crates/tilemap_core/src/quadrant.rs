//! Conversion between the sparse plane and the four-quadrant array layout
//!
//! The plane is split by the sign of each axis. Every quadrant is stored as
//! rows of cells indexed from zero, so negative coordinates are mirrored with
//! `-v - 1` and the origin row/column belongs to the non-negative side:
//!
//! | Quadrant | x      | y      | row      | column   |
//! |----------|--------|--------|----------|----------|
//! | 0        | x >= 0 | y >= 0 | y        | x        |
//! | 1        | x < 0  | y >= 0 | y        | -x - 1   |
//! | 2        | x < 0  | y < 0  | -y - 1   | -x - 1   |
//! | 3        | x >= 0 | y < 0  | -y - 1   | x        |

use serde_json::Value;

use crate::error::value_kind;
use crate::{CoordinatePlane, FormatError};

/// Number of quadrants in a map file
pub const QUADRANT_COUNT: usize = 4;

/// One quadrant: rows of optional tile indices. Rows may be ragged.
pub type QuadrantRows = Vec<Vec<Option<u32>>>;

/// One of the four sign partitions of the plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// x >= 0, y >= 0
    PositivePositive = 0,
    /// x < 0, y >= 0
    NegativePositive = 1,
    /// x < 0, y < 0
    NegativeNegative = 2,
    /// x >= 0, y < 0
    PositiveNegative = 3,
}

impl Quadrant {
    pub const ALL: [Quadrant; QUADRANT_COUNT] = [
        Quadrant::PositivePositive,
        Quadrant::NegativePositive,
        Quadrant::NegativeNegative,
        Quadrant::PositiveNegative,
    ];

    /// Index of this quadrant in the file
    pub fn index(self) -> usize {
        self as usize
    }

    fn mirrors_x(self) -> bool {
        matches!(
            self,
            Quadrant::NegativePositive | Quadrant::NegativeNegative
        )
    }

    fn mirrors_y(self) -> bool {
        matches!(
            self,
            Quadrant::NegativeNegative | Quadrant::PositiveNegative
        )
    }
}

/// Location of a plane coordinate inside the quadrant arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuadrantCell {
    pub quadrant: Quadrant,
    pub row: u32,
    pub col: u32,
}

/// Mirror a negative axis value onto `0..`. `-1` maps to `0`.
#[inline]
fn mirror(v: i32) -> u32 {
    // v + 1 cannot overflow for v < 0, and -(v + 1) fits for every negative i32
    (-(v + 1)) as u32
}

#[inline]
fn unmirror(v: u32) -> Option<i32> {
    i32::try_from(v).ok().map(|v| -v - 1)
}

/// Find where a plane coordinate is stored
pub fn to_quadrant(x: i32, y: i32) -> QuadrantCell {
    let quadrant = match (x >= 0, y >= 0) {
        (true, true) => Quadrant::PositivePositive,
        (false, true) => Quadrant::NegativePositive,
        (false, false) => Quadrant::NegativeNegative,
        (true, false) => Quadrant::PositiveNegative,
    };
    let col = if x >= 0 { x as u32 } else { mirror(x) };
    let row = if y >= 0 { y as u32 } else { mirror(y) };
    QuadrantCell { quadrant, row, col }
}

/// Recover the plane coordinate of a quadrant cell.
///
/// Returns `None` only when an index lies outside the `i32` range.
pub fn from_quadrant(cell: QuadrantCell) -> Option<(i32, i32)> {
    let x = if cell.quadrant.mirrors_x() {
        unmirror(cell.col)?
    } else {
        i32::try_from(cell.col).ok()?
    };
    let y = if cell.quadrant.mirrors_y() {
        unmirror(cell.row)?
    } else {
        i32::try_from(cell.row).ok()?
    };
    Some((x, y))
}

/// The four quadrant arrays of a map file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuadrantSet {
    pub quadrants: [QuadrantRows; QUADRANT_COUNT],
}

impl QuadrantSet {
    /// Rows of one quadrant
    pub fn rows(&self, quadrant: Quadrant) -> &QuadrantRows {
        &self.quadrants[quadrant.index()]
    }

    /// Build a set from structured data.
    ///
    /// The top level must be an array. Missing quadrants and `null` quadrants
    /// or rows are read as empty; cells must be `null` or a non-negative
    /// integer that fits a tile index.
    pub fn from_value(value: &Value) -> Result<Self, FormatError> {
        let Value::Array(quadrants) = value else {
            return Err(FormatError::MalformedQuadrants(format!(
                "expected an array of {} quadrants, found {}",
                QUADRANT_COUNT,
                value_kind(value)
            )));
        };

        let mut set = QuadrantSet::default();
        for (q, quadrant) in quadrants.iter().take(QUADRANT_COUNT).enumerate() {
            let rows = match quadrant {
                Value::Null => continue,
                Value::Array(rows) => rows,
                other => {
                    return Err(FormatError::MalformedQuadrants(format!(
                        "quadrant {} is {}, expected an array of rows",
                        q,
                        value_kind(other)
                    )))
                }
            };

            let out = &mut set.quadrants[q];
            for (r, row) in rows.iter().enumerate() {
                let cells = match row {
                    Value::Null => {
                        out.push(Vec::new());
                        continue;
                    }
                    Value::Array(cells) => cells,
                    other => {
                        return Err(FormatError::MalformedQuadrants(format!(
                            "quadrant {} row {} is {}, expected an array",
                            q,
                            r,
                            value_kind(other)
                        )))
                    }
                };

                let row_out = cells
                    .iter()
                    .enumerate()
                    .map(|(c, cell)| {
                        cell_from_value(cell).ok_or_else(|| {
                            FormatError::MalformedQuadrants(format!(
                                "quadrant {} row {} column {} is {}, expected null or a tile index",
                                q,
                                r,
                                c,
                                value_kind(cell)
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                out.push(row_out);
            }
        }
        Ok(set)
    }
}

/// `Some(None)` for null, `Some(Some(tile))` for a valid index, `None` if invalid
fn cell_from_value(value: &Value) -> Option<Option<u32>> {
    match value {
        Value::Null => Some(None),
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return u32::try_from(v).ok().map(Some);
            }
            // JSON5 readers may hand back integral floats such as `5.0`
            let f = n.as_f64()?;
            if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
                Some(Some(f as u32))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Serialize a plane into the four quadrant arrays.
///
/// Rows and columns grow on demand. Quadrants without tiles, and rows without
/// any cells, are filled with a single empty cell so every quadrant and row
/// is a non-empty array.
pub fn encode(plane: &CoordinatePlane) -> QuadrantSet {
    let mut set = QuadrantSet::default();

    for ((x, y), tile) in plane.iter() {
        let cell = to_quadrant(x, y);
        let rows = &mut set.quadrants[cell.quadrant.index()];
        let (row, col) = (cell.row as usize, cell.col as usize);

        if rows.len() <= row {
            rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut rows[row];
        if cells.len() <= col {
            cells.resize(col + 1, None);
        }
        cells[col] = Some(tile);
    }

    for rows in set.quadrants.iter_mut() {
        if rows.is_empty() {
            rows.push(vec![None]);
        }
        for row in rows.iter_mut().filter(|row| row.is_empty()) {
            row.push(None);
        }
    }

    set
}

/// Rebuild the plane from quadrant arrays. Never fails.
pub fn decode(set: &QuadrantSet) -> CoordinatePlane {
    let mut plane = CoordinatePlane::new();

    for quadrant in Quadrant::ALL {
        for (row, cells) in set.rows(quadrant).iter().enumerate() {
            let Ok(row) = u32::try_from(row) else {
                break;
            };
            for (col, cell) in cells.iter().enumerate() {
                let Some(tile) = *cell else {
                    continue;
                };
                let Ok(col) = u32::try_from(col) else {
                    break;
                };
                if let Some((x, y)) = from_quadrant(QuadrantCell { quadrant, row, col }) {
                    plane.set(x, y, Some(tile));
                }
            }
        }
    }

    plane
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn plane_of(tiles: &[((i32, i32), u32)]) -> CoordinatePlane {
        tiles.iter().copied().collect()
    }

    #[test]
    fn test_quadrant_table() {
        let cases = [
            ((0, 0), Quadrant::PositivePositive, 0, 0),
            ((3, 2), Quadrant::PositivePositive, 2, 3),
            ((-1, 0), Quadrant::NegativePositive, 0, 0),
            ((-4, 5), Quadrant::NegativePositive, 5, 3),
            ((-1, -1), Quadrant::NegativeNegative, 0, 0),
            ((-2, -3), Quadrant::NegativeNegative, 2, 1),
            ((0, -1), Quadrant::PositiveNegative, 0, 0),
            ((7, -2), Quadrant::PositiveNegative, 1, 7),
        ];
        for ((x, y), quadrant, row, col) in cases {
            let cell = to_quadrant(x, y);
            assert_eq!(cell, QuadrantCell { quadrant, row, col }, "at ({}, {})", x, y);
            assert_eq!(from_quadrant(cell), Some((x, y)));
        }
    }

    #[test]
    fn test_extreme_coordinates() {
        for (x, y) in [
            (i32::MIN, i32::MIN),
            (i32::MAX, i32::MIN),
            (i32::MIN, i32::MAX),
            (i32::MAX, i32::MAX),
        ] {
            assert_eq!(from_quadrant(to_quadrant(x, y)), Some((x, y)));
        }
        // Indices beyond i32 have no plane coordinate
        let cell = QuadrantCell {
            quadrant: Quadrant::PositivePositive,
            row: u32::MAX,
            col: 0,
        };
        assert_eq!(from_quadrant(cell), None);
    }

    #[test]
    fn test_encode_empty_plane() {
        let set = encode(&CoordinatePlane::new());
        for rows in &set.quadrants {
            assert_eq!(rows, &vec![vec![None]]);
        }
        assert!(decode(&set).is_empty());
    }

    #[test]
    fn test_encode_fills_gap_rows() {
        let plane = plane_of(&[((1, 2), 9)]);
        let set = encode(&plane);
        assert_eq!(
            set.rows(Quadrant::PositivePositive),
            &vec![vec![None], vec![None], vec![None, Some(9)]]
        );
        assert_eq!(set.rows(Quadrant::NegativeNegative), &vec![vec![None]]);
    }

    #[test]
    fn test_encode_does_not_touch_input() {
        let plane = plane_of(&[((-3, -3), 1), ((2, 0), 4)]);
        let copy = plane.clone();
        let _ = encode(&plane);
        assert_eq!(plane, copy);
    }

    #[test]
    fn test_round_trip_axes() {
        let plane = plane_of(&[
            ((0, 0), 1),
            ((0, -1), 2),
            ((-1, 0), 3),
            ((-1, -1), 4),
            ((0, 5), 5),
            ((5, 0), 6),
            ((-5, 0), 7),
            ((0, -5), 8),
            ((12, -7), 0),
        ]);
        assert_eq!(decode(&encode(&plane)), plane);
    }

    #[test]
    fn test_decode_first_row() {
        let value = json!([[[5, null, 2]], [[null]], [[null]], [[null]]]);
        let set = QuadrantSet::from_value(&value).unwrap();
        let plane = decode(&set);

        assert_eq!(plane.get(0, 0), Some(5));
        assert_eq!(plane.get(2, 0), Some(2));
        assert_eq!(plane.get(1, 0), None);
        assert!(!plane.contains(1, 0));
        assert_eq!(plane.len(), 2);

        let again = decode(&encode(&plane));
        assert_eq!(again, plane);
    }

    #[test]
    fn test_decode_tolerates_missing_structure() {
        // Only two quadrants, a null row, a null quadrant and a ragged row
        let value = json!([[null, [], [null, 3]], null]);
        let set = QuadrantSet::from_value(&value).unwrap();
        let plane = decode(&set);
        assert_eq!(plane.len(), 1);
        assert_eq!(plane.get(1, 2), Some(3));

        let empty = QuadrantSet::from_value(&json!([])).unwrap();
        assert!(decode(&empty).is_empty());
    }

    #[test]
    fn test_decode_ignores_extra_quadrants() {
        let value = json!([[[1]], [[null]], [[null]], [[null]], [[99]]]);
        let plane = decode(&QuadrantSet::from_value(&value).unwrap());
        assert_eq!(plane.len(), 1);
        assert_eq!(plane.get(0, 0), Some(1));
    }

    #[test]
    fn test_decode_every_quadrant() {
        let value = json!([[[1]], [[null, 2]], [[null], [3]], [[4]]]);
        let plane = decode(&QuadrantSet::from_value(&value).unwrap());
        assert_eq!(plane.get(0, 0), Some(1));
        assert_eq!(plane.get(-2, 0), Some(2));
        assert_eq!(plane.get(-1, -2), Some(3));
        assert_eq!(plane.get(0, -1), Some(4));
    }

    #[test]
    fn test_from_value_rejects_non_arrays() {
        assert!(matches!(
            QuadrantSet::from_value(&json!({"a": 1})),
            Err(FormatError::MalformedQuadrants(_))
        ));
        assert!(matches!(
            QuadrantSet::from_value(&json!([[[1]], "x"])),
            Err(FormatError::MalformedQuadrants(_))
        ));
        assert!(matches!(
            QuadrantSet::from_value(&json!([[[-1]]])),
            Err(FormatError::MalformedQuadrants(_))
        ));
        assert!(matches!(
            QuadrantSet::from_value(&json!([[["3"]]])),
            Err(FormatError::MalformedQuadrants(_))
        ));
    }

    #[test]
    fn test_from_value_accepts_integral_floats() {
        let set = QuadrantSet::from_value(&json!([[[5.0, null]]])).unwrap();
        assert_eq!(set.rows(Quadrant::PositivePositive)[0], vec![Some(5), None]);
        assert!(QuadrantSet::from_value(&json!([[[1.5]]])).is_err());
    }

    proptest! {
        #[test]
        fn quadrant_mapping_is_bijective(x in any::<i32>(), y in any::<i32>()) {
            let cell = to_quadrant(x, y);
            prop_assert_eq!(from_quadrant(cell), Some((x, y)));
        }

        #[test]
        fn quadrant_inverse_is_bijective(q in 0usize..4, row in 0u32..=i32::MAX as u32, col in 0u32..=i32::MAX as u32) {
            let cell = QuadrantCell { quadrant: Quadrant::ALL[q], row, col };
            let (x, y) = from_quadrant(cell).unwrap();
            prop_assert_eq!(to_quadrant(x, y), cell);
        }

        #[test]
        fn round_trip_preserves_plane(
            tiles in prop::collection::hash_map((-40i32..40, -40i32..40), 0u32..500, 0..64)
        ) {
            let plane: CoordinatePlane = tiles.into_iter().collect();
            prop_assert_eq!(decode(&encode(&plane)), plane);
        }
    }
}
