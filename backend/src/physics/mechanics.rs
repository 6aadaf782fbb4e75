//! 2D mechanics
//!
//! Point masses are advanced with a fixed-step update
//!
//! ```text
//! a  = ΣF / m
//! p' = p + v·dt + ½·a·dt²
//! v' = v + a·dt
//! ```
//!
//! Coordinates are y-up: gravity pulls towards −y.
//!
//! Besides the live per-tick update, this module has closed-form motion
//! series (projectile, simple harmonic motion) used for analysis panels.

use super::vector::Vec2;
use super::PhysicsError;
use crate::rng::SharedRng;
use serde::{Deserialize, Serialize};

/// Standard gravity (m/s²)
pub const STANDARD_GRAVITY: f64 = 9.81;

/// Mass assumed by the projectile series (kg)
pub const PROJECTILE_MASS: f64 = 1.0;

/// Absolute tolerance for the momentum-conservation diagnostic (kg·m/s)
pub const MOMENTUM_TOLERANCE: f64 = 1e-6;

/// Half-width of the random velocity nudge for coincident objects (m/s)
const SEPARATION_NUDGE: f64 = 0.1;

fn standard_gravity() -> f64 {
    STANDARD_GRAVITY
}

fn elastic() -> f64 {
    1.0
}

/// A point mass on the bench
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanicalObject {
    pub id: String,
    pub position: Vec2,
    pub velocity: Vec2,
    #[serde(default)]
    pub acceleration: Vec2,
    /// kg
    pub mass: f64,
    /// Contact radius (m); zero disables contacts for this object
    #[serde(default)]
    pub radius: f64,
}

impl MechanicalObject {
    pub fn new(id: impl Into<String>, position: Vec2, velocity: Vec2, mass: f64) -> Self {
        Self {
            id: id.into(),
            position,
            velocity,
            acceleration: Vec2::ZERO,
            mass,
            radius: 0.0,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn momentum(&self) -> Vec2 {
        self.velocity * self.mass
    }
}

/// Ideal spring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    /// Stiffness (N/m)
    pub k: f64,
    /// Rest length (m)
    pub rest_length: f64,
}

/// Force acting on bench objects each tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForceGenerator {
    /// Uniform gravity on every object
    Gravity {
        #[serde(default = "standard_gravity")]
        g: f64,
    },
    /// Kinetic friction along the surface (x axis), normal force `m·g`
    ///
    /// Within one step it can bring an object to rest but never reverse it.
    KineticFriction {
        mu: f64,
        #[serde(default = "standard_gravity")]
        g: f64,
    },
    /// Spring joining one object to a fixed anchor
    Spring {
        object_id: String,
        anchor: Vec2,
        k: f64,
        rest_length: f64,
    },
}

impl ForceGenerator {
    /// Force this generator applies to `object` over a step of `dt`
    pub fn force_on(&self, object: &MechanicalObject, dt: f64) -> Vec2 {
        match self {
            ForceGenerator::Gravity { g } => gravitational_force(object.mass, *g),
            ForceGenerator::KineticFriction { mu, g } => {
                let vx = object.velocity.x;
                if vx == 0.0 {
                    return Vec2::ZERO;
                }
                let stopping = object.mass * vx.abs() / dt;
                let magnitude = (mu * object.mass * g).min(stopping);
                Vec2::new(-vx.signum() * magnitude, 0.0)
            }
            ForceGenerator::Spring {
                object_id,
                anchor,
                k,
                rest_length,
            } if *object_id == object.id => spring_force(
                &Spring {
                    k: *k,
                    rest_length: *rest_length,
                },
                object.position,
                *anchor,
            ),
            ForceGenerator::Spring { .. } => Vec2::ZERO,
        }
    }
}

/// Mechanical sub-state of the bench
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MechanicsBench {
    #[serde(default)]
    pub objects: Vec<MechanicalObject>,
    #[serde(default)]
    pub forces: Vec<ForceGenerator>,
    /// Coefficient of restitution for contacts
    #[serde(default = "elastic")]
    pub restitution: f64,
}

impl Default for MechanicsBench {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            forces: Vec::new(),
            restitution: elastic(),
        }
    }
}

/// Velocities of a colliding pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityPair {
    pub v1: Vec2,
    pub v2: Vec2,
}

/// Outcome of a two-body collision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionResult {
    pub object1: String,
    pub object2: String,
    pub point: Vec2,
    pub velocity_before: VelocityPair,
    /// True post-collision velocities
    pub velocity_after: VelocityPair,
    /// Post-collision velocities as an instrument would read them
    pub measured_after: VelocityPair,
    pub restitution: f64,
    /// Diagnostic only; momentum is not enforced
    pub momentum_conserved: bool,
    /// Objects were coincident and were nudged apart at random
    pub degenerate: bool,
}

/// Instrument view of one object after a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectReading {
    pub id: String,
    pub position: Vec2,
    pub velocity: Vec2,
}

/// Everything one mechanics tick produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MechanicsStep {
    pub objects: Vec<ObjectReading>,
    pub collisions: Vec<CollisionResult>,
}

/// Full time series of a motion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionAnalysis {
    pub object_id: String,
    pub time_points: Vec<f64>,
    pub positions: Vec<Vec2>,
    pub velocities: Vec<Vec2>,
    pub accelerations: Vec<Vec2>,
    pub kinetic_energy: Vec<f64>,
    pub potential_energy: Vec<f64>,
    pub total_energy: Vec<f64>,
}

/// Advance one object by `dt` under the given forces
///
/// # Errors
///
/// `InvalidParameter` if the mass or `dt` is not positive.
pub fn integrate(
    object: &MechanicalObject,
    forces: &[Vec2],
    dt: f64,
) -> Result<MechanicalObject, PhysicsError> {
    if !(object.mass > 0.0) {
        return Err(PhysicsError::InvalidParameter(format!(
            "object {} must have positive mass",
            object.id
        )));
    }
    if !(dt > 0.0) {
        return Err(PhysicsError::InvalidParameter(
            "timestep must be positive".to_string(),
        ));
    }

    let total: Vec2 = forces.iter().copied().sum();
    let acceleration = total / object.mass;

    Ok(MechanicalObject {
        position: object.position + object.velocity * dt + acceleration * (0.5 * dt * dt),
        velocity: object.velocity + acceleration * dt,
        acceleration,
        ..object.clone()
    })
}

/// Weight of a mass, pointing down (−y)
pub fn gravitational_force(mass: f64, g: f64) -> Vec2 {
    Vec2::new(0.0, -mass * g)
}

/// Kinetic friction of magnitude `μ·N` opposing the velocity
pub fn friction_force(velocity: Vec2, normal_force: f64, mu: f64) -> Vec2 {
    let speed = velocity.length();
    if speed == 0.0 {
        return Vec2::ZERO;
    }
    -(velocity / speed) * (mu * normal_force)
}

/// Hooke's law force pulling `position` towards rest length from `anchor`
pub fn spring_force(spring: &Spring, position: Vec2, anchor: Vec2) -> Vec2 {
    let offset = position - anchor;
    let distance = offset.length();
    if distance == 0.0 {
        return Vec2::ZERO;
    }
    let magnitude = -spring.k * (distance - spring.rest_length);
    offset / distance * magnitude
}

pub fn kinetic_energy(mass: f64, velocity: Vec2) -> f64 {
    0.5 * mass * velocity.dot(velocity)
}

pub fn potential_energy(mass: f64, height: f64, g: f64) -> f64 {
    mass * g * height
}

pub fn elastic_potential_energy(k: f64, displacement: f64) -> f64 {
    0.5 * k * displacement * displacement
}

/// Post-collision velocities, or `None` for coincident objects
///
/// The impulse `J = (1 + e)(v_rel · n) / (1/m1 + 1/m2)` acts along the
/// line of centres `n`. Objects already separating are left untouched.
pub fn collision_velocities(
    object1: &MechanicalObject,
    object2: &MechanicalObject,
    restitution: f64,
) -> Option<VelocityPair> {
    let offset = object2.position - object1.position;
    let distance = offset.length();
    if distance == 0.0 {
        return None;
    }

    let normal = offset / distance;
    let approach = (object1.velocity - object2.velocity).dot(normal);
    if approach <= 0.0 {
        return Some(VelocityPair {
            v1: object1.velocity,
            v2: object2.velocity,
        });
    }

    let impulse = (1.0 + restitution) * approach / (1.0 / object1.mass + 1.0 / object2.mass);
    Some(VelocityPair {
        v1: object1.velocity - normal * (impulse / object1.mass),
        v2: object2.velocity + normal * (impulse / object2.mass),
    })
}

/// Compare total momentum before and after a collision
pub fn momentum_conserved(
    object1: &MechanicalObject,
    object2: &MechanicalObject,
    after: &VelocityPair,
) -> bool {
    let before = object1.momentum() + object2.momentum();
    let after = after.v1 * object1.mass + after.v2 * object2.mass;
    (before.x - after.x).abs() < MOMENTUM_TOLERANCE && (before.y - after.y).abs() < MOMENTUM_TOLERANCE
}

fn sample_count(total_time: f64, dt: f64) -> Result<usize, PhysicsError> {
    if !(dt > 0.0) || !(total_time >= 0.0) {
        return Err(PhysicsError::InvalidParameter(
            "series needs positive timestep and non-negative duration".to_string(),
        ));
    }
    // Sample i is taken at i·dt, so no error accumulates across the series
    Ok((total_time / dt + 1e-9).floor() as usize)
}

/// Mechanics engine producing instrument readings
#[derive(Debug, Clone)]
pub struct MechanicsEngine {
    rng: SharedRng,
    precision: f64,
}

impl MechanicsEngine {
    pub fn new(rng: SharedRng, precision: f64) -> Self {
        Self { rng, precision }
    }

    pub fn set_precision(&mut self, precision: f64) {
        self.precision = precision;
    }

    fn noisy(&self, value: f64) -> f64 {
        self.rng.borrow_mut().measurement_noise(value, self.precision)
    }

    fn noisy_vec(&self, value: Vec2) -> Vec2 {
        let x = self.noisy(value.x);
        let y = self.noisy(value.y);
        Vec2::new(x, y)
    }

    /// Resolve a collision between two objects
    ///
    /// Coincident objects have no line of centres; they are nudged apart with
    /// small random velocity offsets instead.
    pub fn simulate_elastic_collision(
        &self,
        object1: &MechanicalObject,
        object2: &MechanicalObject,
        restitution: f64,
    ) -> CollisionResult {
        let point = (object1.position + object2.position) * 0.5;
        let velocity_before = VelocityPair {
            v1: object1.velocity,
            v2: object2.velocity,
        };

        let (velocity_after, degenerate) = match collision_velocities(object1, object2, restitution) {
            Some(after) => (after, false),
            None => {
                let nudge = {
                    let mut rng = self.rng.borrow_mut();
                    let x = rng.range(-SEPARATION_NUDGE, SEPARATION_NUDGE);
                    let y = rng.range(-SEPARATION_NUDGE, SEPARATION_NUDGE);
                    Vec2::new(x, y)
                };
                let after = VelocityPair {
                    v1: object1.velocity + nudge,
                    v2: object2.velocity - nudge,
                };
                (after, true)
            }
        };

        let momentum_conserved = momentum_conserved(object1, object2, &velocity_after);
        let measured_after = VelocityPair {
            v1: self.noisy_vec(velocity_after.v1),
            v2: self.noisy_vec(velocity_after.v2),
        };

        CollisionResult {
            object1: object1.id.clone(),
            object2: object2.id.clone(),
            point,
            velocity_before,
            velocity_after,
            measured_after,
            restitution,
            momentum_conserved,
            degenerate,
        }
    }

    /// Advance every bench object by one tick
    ///
    /// Forces are evaluated on the pre-step state of each object, then
    /// overlapping pairs (by contact radius) are resolved in index order and
    /// their true post-collision velocities written back.
    pub fn step_bench(&self, bench: &mut MechanicsBench, dt: f64) -> Result<MechanicsStep, PhysicsError> {
        let mut advanced = Vec::with_capacity(bench.objects.len());
        for object in &bench.objects {
            let forces: Vec<Vec2> = bench.forces.iter().map(|f| f.force_on(object, dt)).collect();
            advanced.push(integrate(object, &forces, dt)?);
        }

        let mut step = MechanicsStep::default();
        for i in 0..advanced.len() {
            for j in (i + 1)..advanced.len() {
                let reach = advanced[i].radius + advanced[j].radius;
                if reach <= 0.0 || advanced[i].position.distance(advanced[j].position) > reach {
                    continue;
                }
                let collision =
                    self.simulate_elastic_collision(&advanced[i], &advanced[j], bench.restitution);
                advanced[i].velocity = collision.velocity_after.v1;
                advanced[j].velocity = collision.velocity_after.v2;
                step.collisions.push(collision);
            }
        }

        for object in &advanced {
            step.objects.push(ObjectReading {
                id: object.id.clone(),
                position: self.noisy_vec(object.position),
                velocity: self.noisy_vec(object.velocity),
            });
        }

        bench.objects = advanced;
        Ok(step)
    }

    /// Closed-form projectile series with no drag
    ///
    /// Positions and velocities are exact; energies are instrument readings.
    pub fn simulate_projectile_motion(
        &self,
        initial_position: Vec2,
        initial_velocity: Vec2,
        gravity: f64,
        total_time: f64,
        timestep: f64,
    ) -> Result<MotionAnalysis, PhysicsError> {
        let samples = sample_count(total_time, timestep)?;
        let mut analysis = MotionAnalysis {
            object_id: "projectile".to_string(),
            ..Default::default()
        };

        for i in 0..=samples {
            let t = i as f64 * timestep;
            let position = Vec2::new(
                initial_position.x + initial_velocity.x * t,
                initial_position.y + initial_velocity.y * t - 0.5 * gravity * t * t,
            );
            let velocity = Vec2::new(initial_velocity.x, initial_velocity.y - gravity * t);

            let ke = kinetic_energy(PROJECTILE_MASS, velocity);
            let pe = potential_energy(PROJECTILE_MASS, position.y, gravity);

            analysis.time_points.push(t);
            analysis.positions.push(position);
            analysis.velocities.push(velocity);
            analysis.accelerations.push(Vec2::new(0.0, -gravity));
            analysis.kinetic_energy.push(self.noisy(ke));
            analysis.potential_energy.push(self.noisy(pe));
            analysis.total_energy.push(self.noisy(ke + pe));
        }

        Ok(analysis)
    }

    /// Closed-form simple harmonic motion of a mass on a spring
    pub fn simulate_simple_harmonic_motion(
        &self,
        spring: &Spring,
        mass: f64,
        initial_displacement: f64,
        total_time: f64,
        timestep: f64,
    ) -> Result<MotionAnalysis, PhysicsError> {
        if !(mass > 0.0) || !(spring.k > 0.0) {
            return Err(PhysicsError::InvalidParameter(
                "oscillator needs positive mass and stiffness".to_string(),
            ));
        }
        let samples = sample_count(total_time, timestep)?;
        let omega = (spring.k / mass).sqrt();
        let amplitude = initial_displacement;

        let mut analysis = MotionAnalysis {
            object_id: "harmonic_oscillator".to_string(),
            ..Default::default()
        };

        for i in 0..=samples {
            let t = i as f64 * timestep;
            let phase = omega * t;
            let x = amplitude * phase.cos();
            let v = -amplitude * omega * phase.sin();
            let a = -omega * omega * x;

            let ke = 0.5 * mass * v * v;
            let pe = elastic_potential_energy(spring.k, x);

            analysis.time_points.push(t);
            analysis.positions.push(Vec2::new(x, 0.0));
            analysis.velocities.push(Vec2::new(v, 0.0));
            analysis.accelerations.push(Vec2::new(a, 0.0));
            analysis.kinetic_energy.push(self.noisy(ke));
            analysis.potential_energy.push(self.noisy(pe));
            analysis.total_energy.push(self.noisy(ke + pe));
        }

        Ok(analysis)
    }
}
