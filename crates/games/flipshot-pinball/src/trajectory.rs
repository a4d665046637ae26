//! Forward-simulated flight preview with swept collision and reflection.

use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};

use flipshot_core::ids::SurfaceId;
use flipshot_core::math::Vec3;

use crate::config::TableConfig;
use crate::surface::SweepQuery;

/// Integration and bounce tuning for a prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryParams {
    pub gravity: Vec3,
    pub step_size: f32,
    pub step_count: usize,
    pub probe_radius: f32,
    pub friction_loss: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub reflect_offset: f32,
}

impl TrajectoryParams {
    pub fn from_config(config: &TableConfig) -> Self {
        let t = &config.trajectory;
        Self {
            gravity: config.physics.gravity,
            step_size: t.step_size,
            step_count: t.step_count,
            probe_radius: config.probe_radius(),
            friction_loss: t.friction_loss,
            min_speed: t.min_speed,
            max_speed: t.max_speed,
            reflect_offset: t.reflect_offset,
        }
    }
}

/// Predicted bounce off a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    pub surface: SurfaceId,
    pub point: Vec3,
    pub normal: Vec3,
    pub speed_in: f32,
    pub speed_out: f32,
}

/// One vertex of the predicted polyline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub position: Vec3,
    /// Set when this vertex is an impact point.
    pub reflection: Option<Reflection>,
}

/// Fraction of speed kept through a bounce off a surface with `friction`.
pub fn energy_retention(friction: f32, friction_loss: f32) -> f32 {
    (1.0 - friction.max(0.0) * friction_loss).clamp(0.0, 1.0)
}

/// Lazy sample sequence. Yields the start point followed by one vertex per
/// integration step, at most `step_count` items in total.
#[derive(Debug, Clone)]
pub struct Trajectory<'a, Q: ?Sized> {
    query: &'a Q,
    params: TrajectoryParams,
    position: Vec3,
    velocity: Vec3,
    emitted: usize,
}

impl<Q: SweepQuery + ?Sized> Trajectory<'_, Q> {
    fn integrate(&mut self) -> TrajectorySample {
        let dt = self.params.step_size;
        self.velocity += self.params.gravity * dt;
        let motion = self.velocity * dt;

        let Some(hit) = self
            .query
            .sweep_sphere(self.position, self.params.probe_radius, motion)
        else {
            self.position += motion;
            return TrajectorySample {
                position: self.position,
                reflection: None,
            };
        };

        let speed_in = self.velocity.length();
        let direction = self.velocity.reflect(hit.normal).normalize_or_zero();
        let speed_out = (speed_in * energy_retention(hit.friction, self.params.friction_loss))
            .clamp(self.params.min_speed, self.params.max_speed);
        self.velocity = direction * speed_out;
        self.position = hit.point + direction * self.params.reflect_offset;

        TrajectorySample {
            position: hit.point,
            reflection: Some(Reflection {
                surface: hit.surface,
                point: hit.point,
                normal: hit.normal,
                speed_in,
                speed_out,
            }),
        }
    }
}

impl<Q: SweepQuery + ?Sized> Iterator for Trajectory<'_, Q> {
    type Item = TrajectorySample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted >= self.params.step_count {
            return None;
        }
        let sample = if self.emitted == 0 {
            TrajectorySample {
                position: self.position,
                reflection: None,
            }
        } else {
            self.integrate()
        };
        self.emitted += 1;
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.params.step_count.saturating_sub(self.emitted);
        (left, Some(left))
    }
}

impl<Q: SweepQuery + ?Sized> ExactSizeIterator for Trajectory<'_, Q> {}
impl<Q: SweepQuery + ?Sized> FusedIterator for Trajectory<'_, Q> {}

/// Stateless predictor; every call starts a fresh sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPredictor {
    params: TrajectoryParams,
}

impl TrajectoryPredictor {
    pub fn new(params: TrajectoryParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrajectoryParams {
        &self.params
    }

    pub fn predict<'a, Q: SweepQuery + ?Sized>(
        &self,
        query: &'a Q,
        position: Vec3,
        velocity: Vec3,
    ) -> Trajectory<'a, Q> {
        Trajectory {
            query,
            params: self.params,
            position,
            velocity,
            emitted: 0,
        }
    }

    /// Collected polyline for rendering.
    pub fn predict_points<Q: SweepQuery + ?Sized>(
        &self,
        query: &Q,
        position: Vec3,
        velocity: Vec3,
    ) -> Vec<Vec3> {
        self.predict(query, position, velocity)
            .map(|s| s.position)
            .collect()
    }
}
