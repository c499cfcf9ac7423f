//! Landmark geometry: eye aspect ratio and gaze ratio
//!
//! Pure functions over pixel-space landmark positions. Degenerate geometry
//! (a collapsed eye span) must never leak a division-by-zero or NaN into the
//! state machine — NaN comparisons would silently defeat every threshold
//! check downstream.

/// Spans below this are treated as degenerate.
pub const GEOMETRY_EPSILON: f64 = 1e-6;

/// Euclidean distance between two 2-D points.
pub fn euclidean_distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

/// Eye aspect ratio over six landmarks ordered corner, upper-outer,
/// upper-inner, corner, lower-inner, lower-outer:
/// `(‖p1-p5‖ + ‖p2-p4‖) / (2·‖p0-p3‖)`.
///
/// Returns `None` when the corner-to-corner span is degenerate.
pub fn eye_aspect_ratio(points: &[[f64; 2]; 6]) -> Option<f64> {
    let vertical_a = euclidean_distance(points[1], points[5]);
    let vertical_b = euclidean_distance(points[2], points[4]);
    let horizontal = euclidean_distance(points[0], points[3]);

    if horizontal < GEOMETRY_EPSILON {
        return None;
    }

    let ear = (vertical_a + vertical_b) / (2.0 * horizontal);
    ear.is_finite().then_some(ear)
}

/// Normalized horizontal iris position between the eye corners:
/// ~0 toward one corner, ~1 toward the other, ~0.5 centered.
///
/// A zero-width eye yields the centered fallback (0.5) rather than an
/// unbounded value.
pub fn gaze_ratio(corner_left: [f64; 2], corner_right: [f64; 2], iris: [f64; 2]) -> f64 {
    let width = corner_right[0] - corner_left[0];
    if width.abs() < GEOMETRY_EPSILON {
        return 0.5;
    }
    let ratio = (iris[0] - corner_left[0]) / width;
    if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn eye(open: f64) -> [[f64; 2]; 6] {
        // Width 40 px, symmetric vertical opening
        [
            [0.0, 0.0],
            [10.0, -open / 2.0],
            [30.0, -open / 2.0],
            [40.0, 0.0],
            [30.0, open / 2.0],
            [10.0, open / 2.0],
        ]
    }

    #[test]
    fn test_ear_tracks_opening() {
        let open = eye_aspect_ratio(&eye(12.0)).unwrap();
        let closed = eye_aspect_ratio(&eye(2.0)).unwrap();
        assert!(open > closed);
        assert!((open - 12.0 / 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_ear_degenerate_span() {
        let mut points = eye(10.0);
        points[3] = points[0]; // corners coincide
        assert_eq!(eye_aspect_ratio(&points), None);
    }

    #[test]
    fn test_gaze_positions() {
        let l = [100.0, 50.0];
        let r = [140.0, 50.0];
        assert!((gaze_ratio(l, r, [120.0, 50.0]) - 0.5).abs() < 1e-9);
        assert!(gaze_ratio(l, r, [104.0, 50.0]) < 0.25);
        assert!(gaze_ratio(l, r, [136.0, 50.0]) > 0.75);
    }

    #[test]
    fn test_gaze_zero_width_eye_is_centered() {
        let p = [100.0, 50.0];
        assert_eq!(gaze_ratio(p, p, [120.0, 50.0]), 0.5);
    }

    proptest! {
        #[test]
        fn prop_gaze_is_bounded(lx in -1000.0f64..1000.0, width in -50.0f64..50.0, ix in -2000.0f64..2000.0) {
            let g = gaze_ratio([lx, 0.0], [lx + width, 0.0], [ix, 0.0]);
            prop_assert!((0.0..=1.0).contains(&g));
        }

        #[test]
        fn prop_ear_non_negative(open in 0.0f64..100.0, width in 1.0f64..200.0) {
            let points = [
                [0.0, 0.0],
                [width * 0.25, -open / 2.0],
                [width * 0.75, -open / 2.0],
                [width, 0.0],
                [width * 0.75, open / 2.0],
                [width * 0.25, open / 2.0],
            ];
            let ear = eye_aspect_ratio(&points).unwrap();
            prop_assert!(ear >= 0.0);
            prop_assert!(ear.is_finite());
        }
    }
}
