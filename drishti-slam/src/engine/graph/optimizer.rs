//! Graph optimization using the Gauss-Newton method.
//!
//! # Algorithm
//!
//! The pose graph optimization minimizes:
//!
//! ```text
//! F(x) = Σ e(xi, xj, zij)ᵀ · Ωij · e(xi, xj, zij)  +  e_pᵀ · Ω_p · e_p
//! ```
//!
//! with the edge error taken on the SE(2) manifold:
//!
//! ```text
//! e(xi, xj, zij) = t2v(Z⁻¹ · Xi⁻¹ · Xj)
//!   e_t = Rzᵀ (Riᵀ (tj - ti) - tz)
//!   e_θ = wrap(θj - θi - θz)
//! ```
//!
//! Each iteration linearizes every edge, accumulates the normal equations
//! `H Δ = b` (dense, 3 rows per vertex), solves them with an LU
//! decomposition and adds Δ to every vertex.

use log::{debug, info, warn};
use nalgebra::{DMatrix, DVector, Matrix2, Matrix3, Vector3};

use super::pose_graph::{PoseGraph, edge_error};
use crate::config::OptimizerConfig;
use crate::core::math::normalize_angle;
use crate::core::types::Pose2D;
use crate::error::{Result, SlamError};

/// Result of graph optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationSummary {
    /// Number of iterations performed.
    pub iterations: usize,

    /// Mean absolute edge error before the first iteration.
    pub initial_error: f64,

    /// Mean absolute edge error after the last iteration.
    pub final_error: f64,

    /// Whether the error reached the tolerance.
    pub converged: bool,

    /// Iterations whose linear solve failed or produced non-finite values.
    pub unstable_iterations: usize,
}

/// Gauss-Newton solver over a [`PoseGraph`].
#[derive(Debug, Clone, Default)]
pub struct GaussNewton {
    config: OptimizerConfig,
}

impl GaussNewton {
    pub fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Optimize the pose graph in place.
    ///
    /// Fails with [`SlamError::ConvergenceFailure`] only when every
    /// iteration was numerically unstable and the tolerance was never met.
    pub fn optimize(&self, graph: &mut PoseGraph) -> Result<OptimizationSummary> {
        let initial_error = graph.mean_edge_error();

        if graph.num_edges() == 0 || graph.num_vertices() == 0 {
            return Ok(OptimizationSummary {
                iterations: 0,
                initial_error,
                final_error: initial_error,
                converged: true,
                unstable_iterations: 0,
            });
        }

        if graph.prior().is_none() {
            warn!(
                "Prior vertex {} not in graph; optimization is gauge-free",
                graph.config().prior_vertex_id
            );
        }

        let mut summary = OptimizationSummary {
            iterations: 0,
            initial_error,
            final_error: initial_error,
            converged: false,
            unstable_iterations: 0,
        };

        for iteration in 1..=self.config.backend_max_iterations {
            summary.iterations = iteration;

            let (h, b) = build_linear_system(graph);
            let (delta, stable) = solve(h, &b);
            if !stable {
                summary.unstable_iterations += 1;
                warn!("Gauss-Newton iteration {iteration}: numerical instability, step zeroed");
            }
            apply_update(graph, &delta);

            summary.final_error = graph.mean_edge_error();
            debug!(
                "Gauss-Newton iteration {}: mean edge error {:.6e}",
                iteration, summary.final_error
            );

            if summary.final_error <= self.config.backend_tolerance {
                summary.converged = true;
                break;
            }
        }

        if !summary.converged && summary.unstable_iterations == summary.iterations {
            return Err(SlamError::ConvergenceFailure {
                iterations: summary.iterations,
            });
        }

        if summary.converged {
            info!(
                "Pose graph optimized: {} vertices, {} edges, error {:.4e} -> {:.4e} in {} iterations",
                graph.num_vertices(),
                graph.num_edges(),
                summary.initial_error,
                summary.final_error,
                summary.iterations
            );
        } else {
            warn!(
                "Pose graph did not converge after {} iterations (error {:.4e}, tolerance {:.1e})",
                summary.iterations, summary.final_error, self.config.backend_tolerance
            );
        }

        Ok(summary)
    }
}

/// Derivative of Rᵀ(θ) with respect to θ.
fn rotation_transpose_derivative(theta: f64) -> Matrix2<f64> {
    let (s, c) = theta.sin_cos();
    Matrix2::new(-s, c, -c, -s)
}

/// Closed-form Jacobians (A = ∂e/∂xi, B = ∂e/∂xj) of the edge error.
fn edge_jacobians(xi: &Pose2D, xj: &Pose2D, measurement: &Pose2D) -> (Matrix3<f64>, Matrix3<f64>) {
    let rz_t = measurement.rotation_matrix().transpose();
    let ri_t = xi.rotation_matrix().transpose();
    let dt = xj.translation() - xi.translation();

    let rot = rz_t * ri_t;
    let d_theta = rz_t * rotation_transpose_derivative(xi.theta) * dt;

    let mut a: Matrix3<f64> = Matrix3::zeros();
    a.fixed_view_mut::<2, 2>(0, 0).copy_from(&(-rot));
    a.fixed_view_mut::<2, 1>(0, 2).copy_from(&d_theta);
    a[(2, 2)] = -1.0;

    let mut b: Matrix3<f64> = Matrix3::zeros();
    b.fixed_view_mut::<2, 2>(0, 0).copy_from(&rot);
    b[(2, 2)] = 1.0;

    (a, b)
}

/// Accumulate `H` and `b` over all edges and the prior factor.
fn build_linear_system(graph: &PoseGraph) -> (DMatrix<f64>, DVector<f64>) {
    let dim = graph.num_vertices() * 3;
    let mut h = DMatrix::<f64>::zeros(dim, dim);
    let mut b = DVector::<f64>::zeros(dim);
    let poses = graph.poses();

    for edge in graph.edges() {
        let (Some(i), Some(j)) = (graph.position_of(edge.from), graph.position_of(edge.to)) else {
            continue;
        };
        let (xi, xj) = (&poses[i], &poses[j]);

        let e = edge_error(xi, xj, &edge.measurement).to_vector();
        let (a, bj) = edge_jacobians(xi, xj, &edge.measurement);
        let omega = edge.information.to_matrix();

        let (si, sj) = (3 * i, 3 * j);
        let at_omega = a.transpose() * omega;
        let bt_omega = bj.transpose() * omega;

        add_block(&mut h, si, si, &(at_omega * a));
        add_block(&mut h, si, sj, &(at_omega * bj));
        add_block(&mut h, sj, si, &(bt_omega * a));
        add_block(&mut h, sj, sj, &(bt_omega * bj));

        add_segment(&mut b, si, &(-(at_omega * e)));
        add_segment(&mut b, sj, &(-(bt_omega * e)));
    }

    if let Some(prior) = graph.prior() {
        let x0 = &poses[prior.index];
        let rp_t = prior.anchor.rotation_matrix().transpose();
        let dt = rp_t * (x0.translation() - prior.anchor.translation());
        let e = Vector3::new(dt.x, dt.y, normalize_angle(x0.theta - prior.anchor.theta));

        let mut jac: Matrix3<f64> = Matrix3::identity();
        jac.fixed_view_mut::<2, 2>(0, 0).copy_from(&rp_t);
        let omega = prior.information.to_matrix();
        let jt_omega = jac.transpose() * omega;

        let s = 3 * prior.index;
        add_block(&mut h, s, s, &(jt_omega * jac + Matrix3::identity()));
        add_segment(&mut b, s, &(-(jt_omega * e)));
    }

    (h, b)
}

fn add_block(h: &mut DMatrix<f64>, row: usize, col: usize, block: &Matrix3<f64>) {
    let mut view = h.fixed_view_mut::<3, 3>(row, col);
    view += block;
}

fn add_segment(b: &mut DVector<f64>, row: usize, segment: &Vector3<f64>) {
    let mut view = b.fixed_rows_mut::<3>(row);
    view += segment;
}

/// Solve `H Δ = b`. A failed solve yields a zero step; non-finite
/// components are zeroed. The flag is false in either case.
fn solve(h: DMatrix<f64>, b: &DVector<f64>) -> (DVector<f64>, bool) {
    let Some(mut delta) = h.lu().solve(b) else {
        return (DVector::zeros(b.len()), false);
    };

    let mut stable = true;
    for value in delta.iter_mut() {
        if !value.is_finite() {
            *value = 0.0;
            stable = false;
        }
    }
    (delta, stable)
}

/// Add Δ to every vertex and re-wrap the headings.
fn apply_update(graph: &mut PoseGraph, delta: &DVector<f64>) {
    for (k, pose) in graph.poses_mut().iter_mut().enumerate() {
        let base = 3 * k;
        *pose = Pose2D::new(
            pose.x + delta[base],
            pose.y + delta[base + 1],
            pose.theta + delta[base + 2],
        );
    }
}
