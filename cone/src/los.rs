//! Grid line of sight.
//!
//! A modified Bresenham raster walk that, whenever the ray crosses a cell
//! boundary away from the major axis, also inspects the diagonal-adjacent
//! cell the ray cut through. Which of the two candidates is inspected
//! falls out of the error accumulator: entering near-side below the
//! midpoint, far-side above it, and neither when the ray passes exactly
//! through the corner.

/// Returns true when no occluded cell lies on the raster from `a` to `b`.
///
/// `occluded` is queried for every visited cell including the endpoint
/// `b`; `a` itself is never queried. Trivially true for identical or
/// 8-adjacent endpoints.
pub fn is_in_view<F>(a: (usize, usize), b: (usize, usize), occluded: F) -> bool
where
    F: Fn(usize, usize) -> bool,
{
    let (mut x, mut y) = (a.0 as isize, a.1 as isize);
    let (x2, y2) = (b.0 as isize, b.1 as isize);

    if (x - x2).abs() <= 1 && (y - y2).abs() <= 1 {
        return true;
    }

    let xstep = if x2 > x { 1 } else { -1 };
    let ystep = if y2 > y { 1 } else { -1 };
    let dx = (x2 - x).abs();
    let dy = (y2 - y).abs();
    let ddx = 2 * dx;
    let ddy = 2 * dy;

    if dx >= dy {
        let mut error = dx;
        let mut errorprev = error;
        for _ in 0..dx {
            x += xstep;
            error += ddy;
            if error > ddx {
                y += ystep;
                error -= ddx;
                if error + errorprev < ddx {
                    if occluded(x as usize, (y - ystep) as usize) {
                        return false;
                    }
                } else if error + errorprev > ddx {
                    if occluded((x - xstep) as usize, y as usize) {
                        return false;
                    }
                }
            }
            if occluded(x as usize, y as usize) {
                return false;
            }
            errorprev = error;
        }
    } else {
        let mut error = dy;
        let mut errorprev = error;
        for _ in 0..dy {
            y += ystep;
            error += ddx;
            if error > ddy {
                x += xstep;
                error -= ddy;
                if error + errorprev < ddy {
                    if occluded((x - xstep) as usize, y as usize) {
                        return false;
                    }
                } else if error + errorprev > ddy {
                    if occluded(x as usize, (y - ystep) as usize) {
                        return false;
                    }
                }
            }
            if occluded(x as usize, y as usize) {
                return false;
            }
            errorprev = error;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::is_in_view;

    fn blocked(cells: &[(usize, usize)]) -> impl Fn(usize, usize) -> bool + '_ {
        move |i, j| cells.contains(&(i, j))
    }

    #[test]
    fn test_trivial_cases() {
        let wall = blocked(&[(1, 1)]);
        assert!(is_in_view((1, 1), (1, 1), &wall));
        assert!(is_in_view((0, 0), (1, 1), &wall));
        assert!(is_in_view((2, 2), (1, 1), &wall));
    }

    #[test]
    fn test_straight_row() {
        assert!(!is_in_view((3, 0), (3, 4), blocked(&[(3, 2)])));
        assert!(is_in_view((3, 0), (3, 4), blocked(&[(2, 2)])));
        // The endpoint itself counts.
        assert!(!is_in_view((3, 0), (3, 4), blocked(&[(3, 4)])));
    }

    /// Cells the ray from (0,0) to (2,4) cuts through, including the two
    /// it only clips while changing column.
    #[test]
    fn test_corner_cells_inspected() {
        for cell in [(0, 1), (1, 1), (1, 2), (1, 3), (2, 3), (2, 4)] {
            assert!(
                !is_in_view((0, 0), (2, 4), blocked(&[cell])),
                "{cell:?} should occlude"
            );
        }
        // Cells on the far side of the crossed boundaries do not block.
        for cell in [(0, 2), (1, 4), (2, 2), (0, 3)] {
            assert!(
                is_in_view((0, 0), (2, 4), blocked(&[cell])),
                "{cell:?} should not occlude"
            );
        }
    }

    /// The transposed ray exercises the row-major branch the same way.
    #[test]
    fn test_corner_cells_inspected_row_major() {
        for cell in [(1, 0), (1, 1), (2, 1), (3, 1), (3, 2), (4, 2)] {
            assert!(
                !is_in_view((0, 0), (4, 2), blocked(&[cell])),
                "{cell:?} should occlude"
            );
        }
        for cell in [(2, 0), (4, 1), (2, 2), (3, 0)] {
            assert!(
                is_in_view((0, 0), (4, 2), blocked(&[cell])),
                "{cell:?} should not occlude"
            );
        }
    }

    /// A ray through the exact corner between four cells skips both
    /// diagonal-adjacent cells.
    #[test]
    fn test_exact_corner_squeezes_through() {
        assert!(is_in_view((0, 0), (2, 2), blocked(&[(0, 1), (1, 0), (1, 2), (2, 1)])));
        assert!(!is_in_view((0, 0), (2, 2), blocked(&[(1, 1)])));
    }

    /// On the main diagonal the spike cells are primary steps of the
    /// walk, so either one occludes on its own.
    #[test]
    fn test_diagonal_spikes() {
        assert!(!is_in_view((0, 0), (3, 3), blocked(&[(1, 1), (2, 2)])));
        assert!(!is_in_view((0, 0), (3, 3), blocked(&[(2, 2)])));
        assert!(!is_in_view((0, 0), (3, 3), blocked(&[(1, 1)])));
        assert!(is_in_view((0, 0), (3, 3), blocked(&[])));
        assert!(is_in_view((0, 0), (3, 3), blocked(&[(1, 2), (2, 1)])));
    }

    /// Visibility is symmetric for non-occluded endpoints.
    #[test]
    fn test_symmetry() {
        let walls: &[&[(usize, usize)]] = &[
            &[(1, 1)],
            &[(1, 2)],
            &[(2, 3)],
            &[(0, 2), (3, 1)],
            &[(1, 3), (2, 1), (3, 3)],
        ];
        let corners = [(0, 0), (0, 4), (4, 0), (4, 4), (2, 4), (4, 1), (0, 3)];
        for wall in walls {
            for &a in &corners {
                for &b in &corners {
                    if wall.contains(&a) || wall.contains(&b) {
                        continue;
                    }
                    assert_eq!(
                        is_in_view(a, b, blocked(wall)),
                        is_in_view(b, a, blocked(wall)),
                        "asymmetric between {a:?} and {b:?} over {wall:?}"
                    );
                }
            }
        }
    }
}
