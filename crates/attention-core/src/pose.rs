//! Head pose estimation from six canonical landmarks
//!
//! Projects a generic 3-D face template (not per-viewer calibrated) against
//! the observed nose/eye/mouth/chin positions and recovers yaw and pitch.
//! Accuracy is secondary to stability: a solve that fails or diverges
//! carries the previous yaw forward and reports the head as focused, so
//! transient solver jitter never raises a false distraction flag.

use tracing::trace;

/// Generic 3-D face template, arbitrary units, +y down to match image
/// coordinates: nose tip, left eye corner, right eye corner, left mouth
/// corner, right mouth corner, chin.
const FACE_MODEL: [[f64; 3]; 6] = [
    [0.0, 0.0, 0.0],
    [-30.0, -30.0, -30.0],
    [30.0, -30.0, -30.0],
    [-30.0, 30.0, -30.0],
    [30.0, 30.0, -30.0],
    [0.0, 60.0, -50.0],
];

/// Initial camera-distance guess for the solver, in template units
const INITIAL_DISTANCE: f64 = 300.0;

/// Accept a solve only if the RMS reprojection error is below this (pixels)
const MAX_RMS_REPROJECTION_PX: f64 = 30.0;

const SOLVER_ITERATIONS: usize = 50;

/// Head orientation for one frame (degrees).
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadPose {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
    /// False when the solver failed and the yaw is carried forward
    pub converged: bool,
}

impl HeadPose {
    /// Whether the head is turned away from the screen. A non-converged
    /// pose is never flagged (fail open).
    pub fn not_focused(&self, yaw_limit_deg: f64, pitch_limit_deg: f64) -> bool {
        self.converged && (self.yaw.abs() > yaw_limit_deg || self.pitch.abs() > pitch_limit_deg)
    }
}

/// Perspective pose estimator with per-session yaw carry-forward.
#[derive(Debug, Clone, Default)]
pub struct PoseEstimator {
    last_yaw: f64,
}

impl PoseEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimate the head pose from the six pose landmarks (pixel
    /// coordinates, same order as the face template). Camera intrinsics are
    /// approximated from the frame: focal length = width, principal point =
    /// frame center, zero distortion.
    pub fn estimate(&mut self, image_points: &[[f64; 2]; 6], width: u32, height: u32) -> HeadPose {
        let focal = width as f64;
        let cx = width as f64 / 2.0;
        let cy = height as f64 / 2.0;

        match solve_pnp(&FACE_MODEL, image_points, focal, cx, cy) {
            Some(rotation) => {
                let (pitch, yaw, roll) = euler_angles_deg(&rotation);
                self.last_yaw = yaw;
                HeadPose {
                    yaw,
                    pitch,
                    roll,
                    converged: true,
                }
            }
            None => {
                trace!(last_yaw = self.last_yaw, "pose solve failed, carrying yaw forward");
                HeadPose {
                    yaw: self.last_yaw,
                    pitch: 0.0,
                    roll: 0.0,
                    converged: false,
                }
            }
        }
    }
}

/// Rotation vector (axis * angle) to rotation matrix.
fn rodrigues(rvec: [f64; 3]) -> [[f64; 3]; 3] {
    let theta = (rvec[0] * rvec[0] + rvec[1] * rvec[1] + rvec[2] * rvec[2]).sqrt();
    if theta < 1e-12 {
        return [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    }
    let k = [rvec[0] / theta, rvec[1] / theta, rvec[2] / theta];
    let (s, c) = theta.sin_cos();
    let v = 1.0 - c;

    [
        [
            c + k[0] * k[0] * v,
            k[0] * k[1] * v - k[2] * s,
            k[0] * k[2] * v + k[1] * s,
        ],
        [
            k[1] * k[0] * v + k[2] * s,
            c + k[1] * k[1] * v,
            k[1] * k[2] * v - k[0] * s,
        ],
        [
            k[2] * k[0] * v - k[1] * s,
            k[2] * k[1] * v + k[0] * s,
            c + k[2] * k[2] * v,
        ],
    ]
}

/// Project the template under pose `p = [rx, ry, rz, tx, ty, tz]` and return
/// per-point residuals against the observations. `None` if a point lands
/// behind the camera.
fn residuals(
    model: &[[f64; 3]; 6],
    observed: &[[f64; 2]; 6],
    p: &[f64; 6],
    focal: f64,
    cx: f64,
    cy: f64,
) -> Option<[f64; 12]> {
    let r = rodrigues([p[0], p[1], p[2]]);
    let mut out = [0.0; 12];

    for (i, m) in model.iter().enumerate() {
        let x = r[0][0] * m[0] + r[0][1] * m[1] + r[0][2] * m[2] + p[3];
        let y = r[1][0] * m[0] + r[1][1] * m[1] + r[1][2] * m[2] + p[4];
        let z = r[2][0] * m[0] + r[2][1] * m[1] + r[2][2] * m[2] + p[5];
        if z < 1.0 {
            return None;
        }
        let u = focal * x / z + cx;
        let v = focal * y / z + cy;
        if !u.is_finite() || !v.is_finite() {
            return None;
        }
        out[2 * i] = u - observed[i][0];
        out[2 * i + 1] = v - observed[i][1];
    }
    Some(out)
}

/// Solve a 6x6 linear system by Gaussian elimination with partial pivoting.
fn solve6(mut a: [[f64; 6]; 6], mut b: [f64; 6]) -> Option<[f64; 6]> {
    for col in 0..6 {
        let pivot = (col..6).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..6 {
            let factor = a[row][col] / a[col][col];
            for k in col..6 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; 6];
    for row in (0..6).rev() {
        let mut sum = b[row];
        for k in (row + 1)..6 {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Iterative perspective pose solve: Gauss-Newton over a rotation vector and
/// translation, numeric Jacobian, ridge-damped normal equations. Returns the
/// rotation matrix, or `None` when the geometry is degenerate or the solve
/// does not reach an acceptable reprojection error.
fn solve_pnp(
    model: &[[f64; 3]; 6],
    observed: &[[f64; 2]; 6],
    focal: f64,
    cx: f64,
    cy: f64,
) -> Option<[[f64; 3]; 3]> {
    if observed.iter().flatten().any(|v| !v.is_finite()) {
        return None;
    }

    // Degenerate observations: all points collapsed onto one spot
    let spread = observed
        .iter()
        .flat_map(|a| observed.iter().map(move |b| {
            let dx = a[0] - b[0];
            let dy = a[1] - b[1];
            (dx * dx + dy * dy).sqrt()
        }))
        .fold(0.0, f64::max);
    if spread < 1e-3 {
        return None;
    }

    let mut p = [0.0, 0.0, 0.0, 0.0, 0.0, INITIAL_DISTANCE];

    for _ in 0..SOLVER_ITERATIONS {
        let r = residuals(model, observed, &p, focal, cx, cy)?;

        // Numeric Jacobian, forward differences
        let mut jac = [[0.0; 6]; 12];
        for k in 0..6 {
            let h = 1e-5 * (1.0 + p[k].abs());
            let mut pk = p;
            pk[k] += h;
            let rk = residuals(model, observed, &pk, focal, cx, cy)?;
            for row in 0..12 {
                jac[row][k] = (rk[row] - r[row]) / h;
            }
        }

        // Normal equations with a small ridge for conditioning
        let mut jtj = [[0.0; 6]; 6];
        let mut jtr = [0.0; 6];
        for row in 0..12 {
            for i in 0..6 {
                jtr[i] += jac[row][i] * r[row];
                for j in 0..6 {
                    jtj[i][j] += jac[row][i] * jac[row][j];
                }
            }
        }
        for (i, row) in jtj.iter_mut().enumerate() {
            row[i] += 1e-6 * (1.0 + row[i].abs());
        }

        let delta = solve6(jtj, jtr.map(|v| -v))?;
        for k in 0..6 {
            p[k] += delta[k];
        }

        let step = delta.iter().map(|v| v * v).sum::<f64>().sqrt();
        if step < 1e-9 {
            break;
        }
    }

    let r = residuals(model, observed, &p, focal, cx, cy)?;
    let rms = (r.iter().map(|v| v * v).sum::<f64>() / r.len() as f64).sqrt();
    if !rms.is_finite() || rms > MAX_RMS_REPROJECTION_PX || p[5] <= 0.0 {
        return None;
    }

    Some(rodrigues([p[0], p[1], p[2]]))
}

/// Decompose a rotation matrix into (pitch, yaw, roll) degrees.
fn euler_angles_deg(r: &[[f64; 3]; 3]) -> (f64, f64, f64) {
    let sy = (r[0][0] * r[0][0] + r[1][0] * r[1][0]).sqrt();

    let (pitch, yaw, roll) = if sy > 1e-6 {
        (
            r[2][1].atan2(r[2][2]),
            (-r[2][0]).atan2(sy),
            r[1][0].atan2(r[0][0]),
        )
    } else {
        ((-r[1][2]).atan2(r[1][1]), (-r[2][0]).atan2(sy), 0.0)
    };

    (pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}
