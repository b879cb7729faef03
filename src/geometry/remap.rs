//! Percentage-preserving remap
//!
//! Maps the crossing coordinate from the source monitor's edge onto the
//! destination monitor so that the relative position along the edge is kept.

use super::{Edge, Point, Rect};

/// Remaps a crossing at `along` on `src`'s `edge` into a point strictly
/// inside `dst`.
///
/// The extents of the two monitors along the crossed edge must overlap;
/// otherwise the monitors are not adjacent on that edge and `None` is
/// returned. The overlap is a validity gate only: the mapping itself is
/// proportional over the full source edge, so "80% down the source" always
/// lands at "80% down the destination" regardless of how the monitors are
/// offset.
pub fn remap_across(src: &Rect, dst: &Rect, edge: Edge, along: f64) -> Option<Point> {
    let (ov_start, ov_end, src_start, src_end, dst_start, dst_end) =
        if edge.is_vertical_boundary() {
            (
                src.top.max(dst.top),
                src.bottom.min(dst.bottom),
                src.top,
                src.bottom,
                dst.top,
                dst.bottom,
            )
        } else {
            (
                src.left.max(dst.left),
                src.right.min(dst.right),
                src.left,
                src.right,
                dst.left,
                dst.right,
            )
        };

    let src_len = src_end - src_start;
    let dst_len = dst_end - dst_start;
    if ov_end - ov_start <= 0 || src_len <= 0 || dst_len <= 0 {
        return None;
    }

    let pct = ((along - f64::from(src_start)) / f64::from(src_len)).clamp(0.0, 1.0);

    // Nearest integer, ties away from zero, then keep the point inside the
    // destination band so the OS cannot attribute it to a neighbor.
    let mapped = dst_start + (pct * f64::from(dst_len)).round() as i32;
    let mapped = mapped.min(dst_end - 2).max(dst_start + 1);

    // One pixel inside the destination from the mirror edge: landing exactly
    // on the boundary can re-trigger a crossing and oscillate.
    let out = match edge {
        Edge::Right => Point::new(dst.left + 1, mapped),
        Edge::Left => Point::new(dst.right - 2, mapped),
        Edge::Bottom => Point::new(mapped, dst.top + 1),
        Edge::Top => Point::new(mapped, dst.bottom - 2),
    };
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_height_pair_keeps_coordinate() {
        let a = Rect::new(0, 0, 1920, 1080);
        let b = Rect::new(1920, 0, 3840, 1080);
        let p = remap_across(&a, &b, Edge::Right, 864.0).unwrap();
        assert_eq!(p, Point::new(1921, 864));
    }

    #[test]
    fn test_taller_destination_scales_percentage() {
        let a = Rect::new(0, 0, 1920, 1080);
        let b = Rect::new(1920, 0, 3840, 2160);
        // 80% of 1080 maps to 80% of 2160.
        let p = remap_across(&a, &b, Edge::Right, 864.0).unwrap();
        assert_eq!(p, Point::new(1921, 1728));
    }

    #[test]
    fn test_left_and_vertical_exits_inset_from_mirror_edge() {
        let a = Rect::new(1920, 0, 3840, 1080);
        let b = Rect::new(0, 0, 1920, 1080);
        let p = remap_across(&a, &b, Edge::Left, 540.0).unwrap();
        assert_eq!(p, Point::new(1918, 540));

        let top = Rect::new(0, 0, 1920, 1080);
        let below = Rect::new(0, 1080, 1920, 2160);
        let p = remap_across(&top, &below, Edge::Bottom, 960.0).unwrap();
        assert_eq!(p, Point::new(960, 1081));

        let p = remap_across(&below, &top, Edge::Top, 960.0).unwrap();
        assert_eq!(p, Point::new(960, 1078));
    }

    #[test]
    fn test_non_adjacent_monitors_rejected() {
        // Edge coordinates line up but the vertical extents only touch, so
        // the overlap length is zero.
        let a = Rect::new(0, 0, 1920, 1080);
        let b = Rect::new(1920, 1080, 3840, 2160);
        assert!(remap_across(&a, &b, Edge::Right, 1080.0).is_none());
    }

    #[test]
    fn test_zero_extent_rejected() {
        let a = Rect::new(0, 0, 1920, 1080);
        let degenerate = Rect::new(1920, 300, 1920, 800);
        assert!(remap_across(&a, &degenerate, Edge::Right, 500.0).is_none());
    }

    #[test]
    fn test_result_clamped_to_interior_band() {
        let a = Rect::new(0, 0, 1920, 1080);
        let b = Rect::new(1920, 0, 3840, 1080);
        let top = remap_across(&a, &b, Edge::Right, 0.0).unwrap();
        assert_eq!(top.y, 1);
        let bottom = remap_across(&a, &b, Edge::Right, 1080.0).unwrap();
        assert_eq!(bottom.y, 1078);
    }

    #[test]
    fn test_hit_outside_source_edge_is_clamped() {
        let a = Rect::new(0, 0, 1920, 1080);
        let b = Rect::new(1920, 200, 3840, 900);
        let p = remap_across(&a, &b, Edge::Right, -50.0).unwrap();
        assert_eq!(p.y, 201);
    }

    #[test]
    fn test_mapped_point_strictly_inside_destination() {
        let sources = [Rect::new(0, 0, 1920, 1080), Rect::new(0, -400, 2560, 1040)];
        let dests = [
            Rect::new(1920, 0, 3840, 2160),
            Rect::new(2560, -1000, 4480, 440),
        ];
        for (src, dst) in sources.iter().zip(dests.iter()) {
            for step in 0..=20 {
                let along =
                    f64::from(src.top) + f64::from(src.height()) * f64::from(step) / 20.0;
                let p = remap_across(src, dst, Edge::Right, along).unwrap();
                assert!(p.x > dst.left && p.x < dst.right - 1, "x inside for {along}");
                assert!(p.y > dst.top && p.y < dst.bottom - 1, "y inside for {along}");
            }
        }
    }

    #[test]
    fn test_percentage_preserved_within_one_destination_pixel() {
        let src = Rect::new(0, 0, 1920, 1080);
        let dst = Rect::new(1920, 0, 3840, 1440);
        let dst_len = f64::from(dst.height());
        for h in (0..=1080).step_by(27) {
            let p = remap_across(&src, &dst, Edge::Right, f64::from(h)).unwrap();
            let src_pct = f64::from(h) / 1080.0;
            let dst_pct = f64::from(p.y - dst.top) / dst_len;
            // The clamp to the interior band perturbs the extremes by at most
            // two destination pixels; everywhere else rounding dominates.
            assert!(
                (dst_pct - src_pct).abs() <= 2.0 / dst_len + 1e-9,
                "pct drift at h={h}: {src_pct} vs {dst_pct}"
            );
        }
    }

    #[test]
    fn test_round_trip_between_equal_extents() {
        let a = Rect::new(0, 0, 1920, 1080);
        let b = Rect::new(1920, 0, 3840, 1080);
        for h in (1..1080).step_by(37) {
            let over = remap_across(&a, &b, Edge::Right, f64::from(h)).unwrap();
            let back = remap_across(&b, &a, Edge::Left, f64::from(over.y)).unwrap();
            assert!(
                (back.y - h).abs() <= 1,
                "round trip drifted: {h} -> {} -> {}",
                over.y,
                back.y
            );
        }
    }
}
