//! Static level geometry and the swept-sphere probe run against it.

use serde::{Deserialize, Serialize};

use flipshot_core::ids::{PaddleId, SurfaceId};
use flipshot_core::math::{EPSILON, Vec3};

/// Collision shape of a static surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Infinite plane; the normal points toward the playable side.
    Plane { point: Vec3, normal: Vec3 },
    Sphere { center: Vec3, radius: f32 },
    /// Axis-aligned box.
    Box { center: Vec3, half_extents: Vec3 },
}

impl Shape {
    /// Signed distance from `point` to the shape surface plus the outward
    /// normal at the closest feature.
    pub fn distance_and_normal(&self, point: Vec3) -> (f32, Vec3) {
        match self {
            Self::Plane {
                point: origin,
                normal,
            } => {
                let n = normal.normalize_or_zero();
                ((point - *origin).dot(n), n)
            },
            Self::Sphere { center, radius } => {
                let offset = point - *center;
                let len = offset.length();
                let n = if len < EPSILON { Vec3::Y } else { offset / len };
                (len - radius, n)
            },
            Self::Box {
                center,
                half_extents,
            } => box_distance(point - *center, *half_extents),
        }
    }
}

fn box_distance(local: Vec3, half: Vec3) -> (f32, Vec3) {
    let q = Vec3::new(
        local.x.abs() - half.x,
        local.y.abs() - half.y,
        local.z.abs() - half.z,
    );
    let outside = Vec3::new(q.x.max(0.0), q.y.max(0.0), q.z.max(0.0));
    let outside_len = outside.length();
    if outside_len > 0.0 {
        let n = Vec3::new(
            outside.x * local.x.signum(),
            outside.y * local.y.signum(),
            outside.z * local.z.signum(),
        ) / outside_len;
        return (outside_len, n);
    }
    // Inside: push out through the nearest face.
    if q.x >= q.y && q.x >= q.z {
        (q.x, Vec3::new(local.x.signum(), 0.0, 0.0))
    } else if q.y >= q.z {
        (q.y, Vec3::new(0.0, local.y.signum(), 0.0))
    } else {
        (q.z, Vec3::new(0.0, 0.0, local.z.signum()))
    }
}

/// What a surface is, as far as the table logic cares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SurfaceKind {
    Ground,
    Wall,
    /// Gives balls a passive knock of `kick` on contact.
    Bumper { kick: f32 },
    Paddle(PaddleId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub id: SurfaceId,
    pub kind: SurfaceKind,
    pub shape: Shape,
    /// Surface friction; higher friction loses more speed on a bounce.
    pub friction: f32,
}

/// Result of a swept-sphere query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    pub surface: SurfaceId,
    pub kind: SurfaceKind,
    /// Fraction of the motion vector travelled before contact, in `[0, 1]`.
    pub fraction: f32,
    /// Probe center at the moment of contact.
    pub point: Vec3,
    /// Surface normal at the contact, facing the probe.
    pub normal: Vec3,
    pub friction: f32,
}

/// Swept-volume intersection query against level geometry.
pub trait SweepQuery {
    /// Nearest hit of a sphere of `radius` moving from `origin` by `motion`.
    fn sweep_sphere(&self, origin: Vec3, radius: f32, motion: Vec3) -> Option<SweepHit>;
}

/// Collection of static surfaces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSet {
    surfaces: Vec<Surface>,
}

impl SurfaceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a surface and return its id.
    pub fn add(&mut self, kind: SurfaceKind, shape: Shape, friction: f32) -> SurfaceId {
        let id = SurfaceId(self.surfaces.len() as u64 + 1);
        self.surfaces.push(Surface {
            id,
            kind,
            shape,
            friction,
        });
        id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter()
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl SweepQuery for SurfaceSet {
    fn sweep_sphere(&self, origin: Vec3, radius: f32, motion: Vec3) -> Option<SweepHit> {
        let mut best: Option<SweepHit> = None;
        for surface in &self.surfaces {
            let Some((fraction, normal)) = sweep_shape(&surface.shape, origin, radius, motion)
            else {
                continue;
            };
            if best.is_none_or(|b| fraction < b.fraction) {
                best = Some(SweepHit {
                    surface: surface.id,
                    kind: surface.kind,
                    fraction,
                    point: origin + motion * fraction,
                    normal,
                    friction: surface.friction,
                });
            }
        }
        best
    }
}

/// Time of impact (fraction of `motion`) and contact normal for one shape.
///
/// A probe that already touches a shape counts as a hit at fraction 0 only
/// while it moves into the shape, so a probe can always leave a surface.
fn sweep_shape(shape: &Shape, origin: Vec3, radius: f32, motion: Vec3) -> Option<(f32, Vec3)> {
    match shape {
        Shape::Plane { point, normal } => {
            let n = normal.normalize_or_zero();
            let approach = motion.dot(n);
            if approach >= 0.0 {
                return None;
            }
            let d0 = (origin - *point).dot(n) - radius;
            if d0 < 0.0 {
                // Overlapping already; only count it while the center is on the
                // playable side.
                return ((origin - *point).dot(n) >= 0.0).then_some((0.0, n));
            }
            let t = -d0 / approach;
            (t <= 1.0).then_some((t, n))
        },
        Shape::Sphere {
            center,
            radius: sphere_radius,
        } => sweep_sphere_sphere(origin, motion, *center, radius + sphere_radius),
        Shape::Box {
            center,
            half_extents,
        } => {
            let expanded = Vec3::new(
                half_extents.x + radius,
                half_extents.y + radius,
                half_extents.z + radius,
            );
            sweep_point_box(origin - *center, motion, expanded)
        },
    }
}

fn sweep_sphere_sphere(
    origin: Vec3,
    motion: Vec3,
    center: Vec3,
    combined: f32,
) -> Option<(f32, Vec3)> {
    let offset = origin - center;
    let c = offset.length_squared() - combined * combined;
    if c <= 0.0 {
        let n = offset.normalize_or_zero();
        return (motion.dot(offset) < 0.0).then_some((0.0, n));
    }
    let a = motion.length_squared();
    if a < EPSILON * EPSILON {
        return None;
    }
    let b = offset.dot(motion);
    if b >= 0.0 {
        return None;
    }
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / a;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let n = (origin + motion * t - center).normalize_or_zero();
    Some((t, n))
}

/// Slab test of a point against an axis-aligned box centered at the origin.
fn sweep_point_box(local: Vec3, motion: Vec3, half: Vec3) -> Option<(f32, Vec3)> {
    let inside = local.x.abs() <= half.x && local.y.abs() <= half.y && local.z.abs() <= half.z;
    if inside {
        let (_, n) = box_distance(local, half);
        return (motion.dot(n) < 0.0).then_some((0.0, n));
    }

    let origin = local.to_array();
    let dir = motion.to_array();
    let extent = half.to_array();
    let mut t_enter = 0.0f32;
    let mut t_exit = 1.0f32;
    let mut enter_axis = None;

    for axis in 0..3 {
        if dir[axis].abs() < EPSILON {
            if origin[axis].abs() > extent[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir[axis];
        let mut t0 = (-extent[axis] - origin[axis]) * inv;
        let mut t1 = (extent[axis] - origin[axis]) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        if t0 > t_enter {
            t_enter = t0;
            enter_axis = Some(axis);
        }
        t_exit = t_exit.min(t1);
        if t_enter > t_exit {
            return None;
        }
    }

    let axis = enter_axis?;
    let mut n = Vec3::ZERO;
    n[axis] = -dir[axis].signum();
    Some((t_enter, n))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> SurfaceSet {
        let mut set = SurfaceSet::new();
        set.add(
            SurfaceKind::Ground,
            Shape::Plane {
                point: Vec3::ZERO,
                normal: Vec3::Y,
            },
            0.2,
        );
        set
    }

    #[test]
    fn plane_hit_fraction() {
        let set = floor();
        let hit = set
            .sweep_sphere(Vec3::new(0.0, 2.0, 0.0), 0.5, Vec3::new(0.0, -3.0, 0.0))
            .expect("should hit floor");
        assert!((hit.fraction - 0.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec3::Y);
        assert!((hit.point.y - 0.5).abs() < 1e-5);
        assert_eq!(hit.kind, SurfaceKind::Ground);
    }

    #[test]
    fn plane_miss_when_moving_away_or_short() {
        let set = floor();
        assert!(
            set.sweep_sphere(Vec3::new(0.0, 2.0, 0.0), 0.5, Vec3::new(0.0, 1.0, 0.0))
                .is_none()
        );
        assert!(
            set.sweep_sphere(Vec3::new(0.0, 2.0, 0.0), 0.5, Vec3::new(0.0, -1.0, 0.0))
                .is_none()
        );
    }

    #[test]
    fn overlapping_probe_can_leave() {
        let set = floor();
        let start = Vec3::new(0.0, 0.4, 0.0);
        assert!(set.sweep_sphere(start, 0.5, Vec3::new(1.0, 0.5, 0.0)).is_none());
        let hit = set.sweep_sphere(start, 0.5, Vec3::new(0.0, -0.1, 0.0));
        assert_eq!(hit.map(|h| h.fraction), Some(0.0));
    }

    #[test]
    fn sphere_hit_normal_points_back() {
        let mut set = SurfaceSet::new();
        set.add(
            SurfaceKind::Bumper { kick: 5.0 },
            Shape::Sphere {
                center: Vec3::new(5.0, 0.0, 0.0),
                radius: 1.0,
            },
            0.0,
        );
        let hit = set
            .sweep_sphere(Vec3::ZERO, 0.5, Vec3::new(10.0, 0.0, 0.0))
            .expect("should hit bumper");
        assert!((hit.fraction - 0.35).abs() < 1e-4);
        assert!((hit.normal.x + 1.0).abs() < 1e-4);
    }

    #[test]
    fn thin_box_is_not_tunneled() {
        let mut set = SurfaceSet::new();
        set.add(
            SurfaceKind::Wall,
            Shape::Box {
                center: Vec3::new(5.0, 0.0, 0.0),
                half_extents: Vec3::new(0.01, 1.0, 1.0),
            },
            0.1,
        );
        // Fast enough to skip the wall entirely in one discrete step.
        let hit = set
            .sweep_sphere(Vec3::ZERO, 0.1, Vec3::new(20.0, 0.0, 0.0))
            .expect("swept probe must catch thin wall");
        assert_eq!(hit.normal, Vec3::new(-1.0, 0.0, 0.0));
        assert!(hit.point.x < 5.0);
    }

    #[test]
    fn nearest_surface_wins() {
        let mut set = floor();
        let wall = set.add(
            SurfaceKind::Wall,
            Shape::Plane {
                point: Vec3::new(0.0, 0.0, 1.0),
                normal: Vec3::new(0.0, 0.0, -1.0),
            },
            0.3,
        );
        let hit = set
            .sweep_sphere(Vec3::new(0.0, 5.0, 0.0), 0.25, Vec3::new(0.0, -1.0, 2.0))
            .expect("hits wall first");
        assert_eq!(hit.surface, wall);
        assert_eq!(set.get(wall).map(|s| s.friction), Some(0.3));
    }

    #[test]
    fn box_distance_inside_and_outside() {
        let shape = Shape::Box {
            center: Vec3::ZERO,
            half_extents: Vec3::new(1.0, 1.0, 1.0),
        };
        let (d, n) = shape.distance_and_normal(Vec3::new(3.0, 0.0, 0.0));
        assert!((d - 2.0).abs() < 1e-5);
        assert_eq!(n, Vec3::new(1.0, 0.0, 0.0));
        let (d, n) = shape.distance_and_normal(Vec3::new(0.0, 0.0, -0.8));
        assert!((d + 0.2).abs() < 1e-5);
        assert_eq!(n, Vec3::new(0.0, 0.0, -1.0));
    }
}
