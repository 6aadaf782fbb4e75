//! Geometric optics
//!
//! Every element is a plane at `x = position.x`, limited to
//! `|y − position.y| ≤ aperture / 2`. A trace repeatedly picks the nearest
//! element the ray can interact with, bends or reflects it, and attenuates
//! its intensity by the element's factor.
//!
//! # Critical Invariants
//!
//! - Intensity along a trace never increases (every factor is ≤ 1)
//! - Measured intensities are reported beside the true ones and never fed
//!   back into the trace
//! - An interface that would need `|sin θ2| > 1` (total internal reflection)
//!   is treated as not intersected

use super::vector::Vec2;
use super::PhysicsError;
use crate::rng::SharedRng;
use serde::{Deserialize, Serialize};

/// Default iteration cap for a single trace
pub const MAX_INTERSECTIONS: usize = 10;

/// A ray below this intensity is considered extinguished
pub const MIN_INTENSITY: f64 = 0.01;

/// Hits closer than this to the ray origin are ignored (self-intersection)
pub const MIN_SEGMENT: f64 = 0.001;

pub const LENS_TRANSMISSION: f64 = 0.95;
pub const INTERFACE_TRANSMISSION: f64 = 0.95;
pub const MIRROR_REFLECTANCE: f64 = 0.90;

/// Screen samples for an interference pattern
pub const INTERFERENCE_SAMPLES: usize = 100;

/// Cauchy coefficients for borosilicate crown glass, `B` in nm²
pub const CROWN_GLASS: CauchyMaterial = CauchyMaterial {
    a: 1.5046,
    b: 4200.0,
};

fn default_wavelength() -> f64 {
    550.0
}

fn full_intensity() -> f64 {
    1.0
}

fn default_aperture() -> f64 {
    50.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpticalRay {
    pub id: String,
    pub origin: Vec2,
    pub direction: Vec2,
    #[serde(default = "default_wavelength")]
    pub wavelength_nm: f64,
    #[serde(default = "full_intensity")]
    pub intensity: f64,
}

impl OpticalRay {
    pub fn new(id: impl Into<String>, origin: Vec2, direction: Vec2) -> Self {
        Self {
            id: id.into(),
            origin,
            direction: direction.normalized(),
            wavelength_nm: default_wavelength(),
            intensity: full_intensity(),
        }
    }
}

/// What the element does to a ray
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpticalKind {
    /// Thin lens; negative focal length diverges
    Lens { focal_length: f64 },
    /// Plane mirror; `orientation` is the angle of its surface line
    Mirror,
    /// Boundary between two media, `n1` for `x < position.x`, `n2` beyond
    Interface { n1: f64, n2: f64 },
}

/// An element on the optical bench
///
/// A missing `orientation` defaults per kind, so a deserialized mirror
/// stands upright like one built with [`OpticalElement::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawOpticalElement")]
pub struct OpticalElement {
    pub id: String,
    pub position: Vec2,
    /// Radians
    pub orientation: f64,
    /// Full aperture height
    pub aperture: f64,
    #[serde(flatten)]
    pub kind: OpticalKind,
}

#[derive(Deserialize)]
struct RawOpticalElement {
    id: String,
    position: Vec2,
    #[serde(default)]
    orientation: Option<f64>,
    #[serde(default = "default_aperture")]
    aperture: f64,
    #[serde(flatten)]
    kind: OpticalKind,
}

impl From<RawOpticalElement> for OpticalElement {
    fn from(raw: RawOpticalElement) -> Self {
        let mut element = OpticalElement::new(raw.id, raw.position, raw.kind).with_aperture(raw.aperture);
        if let Some(orientation) = raw.orientation {
            element.orientation = orientation;
        }
        element
    }
}

impl OpticalElement {
    pub fn new(id: impl Into<String>, position: Vec2, kind: OpticalKind) -> Self {
        let orientation = match kind {
            OpticalKind::Mirror => std::f64::consts::FRAC_PI_2,
            _ => 0.0,
        };
        Self {
            id: id.into(),
            position,
            orientation,
            aperture: default_aperture(),
            kind,
        }
    }

    pub fn with_aperture(mut self, aperture: f64) -> Self {
        self.aperture = aperture;
        self
    }

    pub fn with_orientation(mut self, orientation: f64) -> Self {
        self.orientation = orientation;
        self
    }
}

/// Direction of the ray leaving an element, as an angle (radians)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "angle", rename_all = "snake_case")]
pub enum Outgoing {
    Refracted(f64),
    Reflected(f64),
}

impl Outgoing {
    pub fn angle(self) -> f64 {
        match self {
            Outgoing::Refracted(a) | Outgoing::Reflected(a) => a,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RayIntersection {
    pub element_id: String,
    pub point: Vec2,
    /// Direction angle of the incoming ray (radians)
    pub angle_incident: f64,
    pub outgoing: Outgoing,
    pub intensity_after: f64,
    pub measured_intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceTermination {
    /// Nothing left in the ray's path
    Escaped,
    /// Intensity fell below [`MIN_INTENSITY`]
    Extinguished,
    /// Iteration cap reached
    IterationCap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RayTraceResult {
    pub ray_id: String,
    pub intersections: Vec<RayIntersection>,
    pub final_direction: Vec2,
    pub final_intensity: f64,
    pub termination: TraceTermination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Real,
    Virtual,
    /// Object at the focal point; the image is at infinity
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFormation {
    pub kind: ImageKind,
    pub image_distance: Option<f64>,
    pub image_position: Option<Vec2>,
    pub magnification: Option<f64>,
    /// Signed; negative for an inverted image
    pub image_height: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterferenceSample {
    pub position: f64,
    pub intensity: f64,
    pub measured_intensity: f64,
}

/// `n(λ) = A + B / λ²`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CauchyMaterial {
    pub a: f64,
    pub b: f64,
}

impl CauchyMaterial {
    pub fn refractive_index(&self, wavelength_nm: f64) -> Result<f64, PhysicsError> {
        if !(wavelength_nm > 0.0) {
            return Err(PhysicsError::InvalidParameter(format!(
                "wavelength must be positive, got {wavelength_nm} nm"
            )));
        }
        Ok(self.a + self.b / (wavelength_nm * wavelength_nm))
    }
}

/// Refractive index of crown glass at the given wavelength
pub fn refractive_index_for_wavelength(wavelength_nm: f64) -> Result<f64, PhysicsError> {
    CROWN_GLASS.refractive_index(wavelength_nm)
}

/// Snell's law, angles measured from the normal
///
/// Returns `None` on total internal reflection.
///
/// # Example
///
/// ```
/// use virtual_lab_core_rs::physics::optics::snell_refraction;
///
/// let theta2 = snell_refraction(0.5, 1.0, 1.5).unwrap();
/// assert!((1.5 * theta2.sin() - 0.5_f64.sin()).abs() < 1e-12);
/// assert!(snell_refraction(1.2, 1.5, 1.0).is_none());
/// ```
pub fn snell_refraction(theta1: f64, n1: f64, n2: f64) -> Option<f64> {
    let sin_theta2 = n1 / n2 * theta1.sin();
    if sin_theta2.abs() > 1.0 {
        return None;
    }
    Some(sin_theta2.asin())
}

/// Thin-lens deflection: `θ' = θ − h/f` for a ray travelling towards +x
pub fn lens_deflection(angle: f64, height: f64, focal_length: f64, travelling_right: bool) -> f64 {
    let bend = height / focal_length;
    if travelling_right {
        angle - bend
    } else {
        angle + bend
    }
}

/// Reflection about a mirror surface at `orientation`
pub fn mirror_reflection(angle: f64, orientation: f64) -> f64 {
    2.0 * orientation - angle
}

/// Hit point of the ray with the element's plane, inside its aperture
fn plane_hit(origin: Vec2, direction: Vec2, element: &OpticalElement) -> Option<(Vec2, f64)> {
    if direction.x == 0.0 {
        return None;
    }
    let t = (element.position.x - origin.x) / direction.x;
    if t <= 0.0 {
        return None;
    }
    let point = origin + direction * t;
    if (point.y - element.position.y).abs() > element.aperture / 2.0 {
        return None;
    }
    let distance = origin.distance(point);
    if distance <= MIN_SEGMENT {
        return None;
    }
    Some((point, distance))
}

/// Outgoing direction and attenuation at a hit, `None` on total internal reflection
fn interact(direction: Vec2, point: Vec2, element: &OpticalElement) -> Option<(Outgoing, Vec2, f64)> {
    let angle = direction.angle();
    let rightward = direction.x > 0.0;

    match element.kind {
        OpticalKind::Lens { focal_length } => {
            let height = point.y - element.position.y;
            let out = lens_deflection(angle, height, focal_length, rightward);
            Some((Outgoing::Refracted(out), Vec2::from_angle(out), LENS_TRANSMISSION))
        }
        OpticalKind::Mirror => {
            let out = mirror_reflection(angle, element.orientation);
            Some((Outgoing::Reflected(out), Vec2::from_angle(out), MIRROR_REFLECTANCE))
        }
        OpticalKind::Interface { n1, n2 } => {
            let (from, to) = if rightward { (n1, n2) } else { (n2, n1) };
            let unit = direction.normalized();
            let incidence = unit.y.asin();
            let refracted = snell_refraction(incidence, from, to)?;
            let sign = if rightward { 1.0 } else { -1.0 };
            let out_direction = Vec2::new(sign * refracted.cos(), refracted.sin());
            Some((
                Outgoing::Refracted(out_direction.angle()),
                out_direction,
                INTERFACE_TRANSMISSION,
            ))
        }
    }
}

/// Nearest element the ray interacts with
fn next_hit<'a>(
    origin: Vec2,
    direction: Vec2,
    elements: &'a [OpticalElement],
) -> Option<(&'a OpticalElement, Vec2, Outgoing, Vec2, f64)> {
    let mut best: Option<(f64, &OpticalElement, Vec2, Outgoing, Vec2, f64)> = None;
    for element in elements {
        let Some((point, distance)) = plane_hit(origin, direction, element) else {
            continue;
        };
        if best.as_ref().is_some_and(|b| distance >= b.0) {
            continue;
        }
        if let Some((outgoing, out_direction, factor)) = interact(direction, point, element) {
            best = Some((distance, element, point, outgoing, out_direction, factor));
        }
    }
    best.map(|(_, element, point, outgoing, dir, factor)| (element, point, outgoing, dir, factor))
}

/// Optics engine producing instrument readings
#[derive(Debug, Clone)]
pub struct OpticsEngine {
    rng: SharedRng,
    precision: f64,
}

impl OpticsEngine {
    pub fn new(rng: SharedRng, precision: f64) -> Self {
        Self { rng, precision }
    }

    pub fn set_precision(&mut self, precision: f64) {
        self.precision = precision;
    }

    fn noisy(&self, value: f64) -> f64 {
        self.rng.borrow_mut().measurement_noise(value, self.precision)
    }

    /// Trace one ray through the elements
    ///
    /// Draws two noise samples per intersection, in trace order.
    pub fn trace_ray(
        &self,
        ray: &OpticalRay,
        elements: &[OpticalElement],
        max_intersections: usize,
    ) -> RayTraceResult {
        let mut origin = ray.origin;
        let mut direction = ray.direction;
        let mut intensity = ray.intensity;
        let mut intersections = Vec::new();
        let mut termination = TraceTermination::IterationCap;

        for _ in 0..max_intersections {
            let Some((element, point, outgoing, out_direction, factor)) =
                next_hit(origin, direction, elements)
            else {
                termination = TraceTermination::Escaped;
                break;
            };

            let intensity_after = intensity * factor;
            intersections.push(RayIntersection {
                element_id: element.id.clone(),
                point,
                angle_incident: direction.angle(),
                outgoing,
                intensity_after,
                measured_intensity: self.noisy(intensity_after),
            });

            origin = point;
            direction = out_direction;
            intensity = intensity_after;

            if intensity < MIN_INTENSITY {
                termination = TraceTermination::Extinguished;
                break;
            }
        }

        RayTraceResult {
            ray_id: ray.id.clone(),
            intersections,
            final_direction: direction,
            final_intensity: intensity,
            termination,
        }
    }

    /// Trace every ray in order with the default cap
    pub fn trace_all(&self, rays: &[OpticalRay], elements: &[OpticalElement]) -> Vec<RayTraceResult> {
        rays.iter()
            .map(|ray| self.trace_ray(ray, elements, MAX_INTERSECTIONS))
            .collect()
    }

    /// Thin-lens image of an object, with noisy magnification and height
    pub fn simulate_image_formation(
        &self,
        object_position: Vec2,
        object_height: f64,
        lens: &OpticalElement,
    ) -> Result<ImageFormation, PhysicsError> {
        let mut image = image_formation(object_position, object_height, lens)?;
        image.magnification = image.magnification.map(|m| self.noisy(m));
        image.image_height = image.image_height.map(|h| self.noisy(h));
        Ok(image)
    }

    pub fn simulate_double_slit_interference(
        &self,
        wavelength: f64,
        slit_separation: f64,
        screen_distance: f64,
        screen_width: f64,
    ) -> Result<Vec<InterferenceSample>, PhysicsError> {
        if !(wavelength > 0.0) || !(screen_distance > 0.0) {
            return Err(PhysicsError::InvalidParameter(
                "interference needs positive wavelength and screen distance".to_string(),
            ));
        }

        let samples = (0..INTERFERENCE_SAMPLES)
            .map(|i| {
                let position = (i as f64 / INTERFERENCE_SAMPLES as f64 - 0.5) * screen_width;
                let intensity =
                    interference_intensity(position, wavelength, slit_separation, screen_distance);
                InterferenceSample {
                    position,
                    intensity,
                    measured_intensity: self.noisy(intensity),
                }
            })
            .collect();
        Ok(samples)
    }
}

/// Thin-lens image, `1/f = 1/d_o + 1/d_i`
///
/// The image lands on the far side of the lens when real and on the
/// object's side when virtual.
pub fn image_formation(
    object_position: Vec2,
    object_height: f64,
    lens: &OpticalElement,
) -> Result<ImageFormation, PhysicsError> {
    let OpticalKind::Lens { focal_length } = lens.kind else {
        return Err(PhysicsError::InvalidParameter(format!(
            "{} is not a lens",
            lens.id
        )));
    };

    let object_distance = (object_position.x - lens.position.x).abs();
    if object_distance == 0.0 || focal_length == 0.0 {
        return Err(PhysicsError::InvalidParameter(
            "object distance and focal length must be non-zero".to_string(),
        ));
    }

    if (object_distance - focal_length).abs() < 1e-9 {
        return Ok(ImageFormation {
            kind: ImageKind::None,
            image_distance: None,
            image_position: None,
            magnification: None,
            image_height: None,
        });
    }

    let image_distance = 1.0 / (1.0 / focal_length - 1.0 / object_distance);
    let magnification = -image_distance / object_distance;
    let far_side = if object_position.x <= lens.position.x { 1.0 } else { -1.0 };

    let kind = if image_distance > 0.0 {
        ImageKind::Real
    } else {
        ImageKind::Virtual
    };
    let image_position = Vec2::new(
        lens.position.x + far_side * image_distance,
        lens.position.y + magnification * (object_position.y - lens.position.y),
    );

    Ok(ImageFormation {
        kind,
        image_distance: Some(image_distance),
        image_position: Some(image_position),
        magnification: Some(magnification),
        image_height: Some(object_height * magnification),
    })
}

/// Two-slit intensity `cos²(φ/2)` at screen offset `y`, same length unit throughout
pub fn interference_intensity(y: f64, wavelength: f64, slit_separation: f64, screen_distance: f64) -> f64 {
    let path_difference = slit_separation * y / screen_distance;
    let phase = 2.0 * std::f64::consts::PI * path_difference / wavelength;
    (phase / 2.0).cos().powi(2)
}
