//! Tile rasterization for the shape tools

/// Bresenham's line algorithm - every tile from `start` to `end`, both included.
///
/// Each step advances x when `2 * err > -dy` and y when `2 * err < dx`, so
/// diagonal steps are taken where both hold.
pub fn line_tiles(start: (i32, i32), end: (i32, i32)) -> Vec<(i32, i32)> {
    // i64 keeps deltas between extreme coordinates from overflowing
    let (x0, y0) = (start.0 as i64, start.1 as i64);
    let (x1, y1) = (end.0 as i64, end.1 as i64);

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    let mut points = Vec::with_capacity(dx.max(dy) as usize + 1);
    let (mut x, mut y) = (x0, y0);

    loop {
        points.push((x as i32, y as i32));

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }

    points
}

/// Every tile of the axis-aligned rectangle spanned by two corners, inclusive
pub fn rect_tiles(a: (i32, i32), b: (i32, i32)) -> Vec<(i32, i32)> {
    let (min_x, max_x) = (a.0.min(b.0), a.0.max(b.0));
    let (min_y, max_y) = (a.1.min(b.1), a.1.max(b.1));

    let mut tiles = Vec::new();
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            tiles.push((x, y));
        }
    }
    tiles
}
