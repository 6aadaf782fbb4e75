//! Ray tracing, thin-lens imaging and interference

use proptest::prelude::*;
use virtual_lab_core_rs::physics::optics::{
    image_formation, interference_intensity, lens_deflection, mirror_reflection,
    refractive_index_for_wavelength, snell_refraction, ImageKind, TraceTermination,
    LENS_TRANSMISSION, MAX_INTERSECTIONS, MIN_INTENSITY,
};
use virtual_lab_core_rs::physics::{OpticalElement, OpticalKind, OpticalRay, OpticsEngine};
use virtual_lab_core_rs::{rng, PhysicsError, Vec2};

fn engine(precision: f64) -> OpticsEngine {
    OpticsEngine::new(rng::shared(21), precision)
}

fn glass_to_air() -> OpticalElement {
    OpticalElement::new(
        "surface",
        Vec2::new(10.0, 0.0),
        OpticalKind::Interface { n1: 1.5, n2: 1.0 },
    )
}

fn lens_train(count: usize) -> Vec<OpticalElement> {
    (0..count)
        .map(|i| {
            OpticalElement::new(
                format!("L{}", i),
                Vec2::new(10.0 * (i + 1) as f64, 0.0),
                OpticalKind::Lens { focal_length: 100.0 },
            )
        })
        .collect()
}

// ============================================================================
// Refraction and reflection
// ============================================================================

#[test]
fn test_snell_law_holds() {
    let theta2 = snell_refraction(0.3, 1.0, 1.33).unwrap();
    assert!((1.33 * theta2.sin() - 0.3_f64.sin()).abs() < 1e-12);
    assert!(theta2 < 0.3);
}

#[test]
fn test_total_internal_reflection_past_critical_angle() {
    let critical = (1.0_f64 / 1.5).asin();
    assert!(snell_refraction(critical - 0.01, 1.5, 1.0).is_some());
    assert!(snell_refraction(critical + 0.01, 1.5, 1.0).is_none());
}

#[test]
fn test_lens_and_mirror_helpers() {
    // A ray above the axis bends down towards the focus
    assert!((lens_deflection(0.0, 2.0, 10.0, true) + 0.2).abs() < 1e-12);
    assert!((lens_deflection(0.0, 2.0, 10.0, false) - 0.2).abs() < 1e-12);
    assert!((mirror_reflection(0.0, std::f64::consts::FRAC_PI_2) - std::f64::consts::PI).abs() < 1e-12);
}

#[test]
fn test_blue_bends_more_than_red() {
    let blue = refractive_index_for_wavelength(400.0).unwrap();
    let red = refractive_index_for_wavelength(700.0).unwrap();
    assert!(blue > red);
    assert!(refractive_index_for_wavelength(0.0).is_err());
}

// ============================================================================
// Tracing
// ============================================================================

#[test]
fn test_trace_refracts_through_interface() {
    let ray = OpticalRay::new("r", Vec2::ZERO, Vec2::from_angle(0.5));
    let trace = engine(0.0).trace_ray(&ray, &[glass_to_air()], MAX_INTERSECTIONS);

    assert_eq!(trace.intersections.len(), 1);
    assert_eq!(trace.termination, TraceTermination::Escaped);
    let expected = (1.5 * 0.5_f64.sin()).asin();
    assert!((trace.final_direction.angle() - expected).abs() < 1e-9);
}

#[test]
fn test_total_internal_reflection_is_not_an_intersection() {
    let ray = OpticalRay::new("r", Vec2::ZERO, Vec2::from_angle(0.8));
    let trace = engine(0.0).trace_ray(&ray, &[glass_to_air()], MAX_INTERSECTIONS);

    assert!(trace.intersections.is_empty());
    assert_eq!(trace.termination, TraceTermination::Escaped);
    assert_eq!(trace.final_intensity, 1.0);
}

#[test]
fn test_intensity_never_increases() {
    let ray = OpticalRay::new("r", Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0));
    let trace = engine(0.05).trace_ray(&ray, &lens_train(5), MAX_INTERSECTIONS);

    assert_eq!(trace.intersections.len(), 5);
    let mut last = ray.intensity;
    for hit in &trace.intersections {
        assert!(hit.intensity_after <= last);
        last = hit.intensity_after;
    }
    assert!((trace.final_intensity - LENS_TRANSMISSION.powi(5)).abs() < 1e-12);
}

#[test]
fn test_noise_does_not_feed_back_into_trace() {
    let ray = OpticalRay::new("r", Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0));
    let exact = engine(0.0).trace_ray(&ray, &lens_train(4), MAX_INTERSECTIONS);
    let noisy = engine(0.2).trace_ray(&ray, &lens_train(4), MAX_INTERSECTIONS);

    for (a, b) in exact.intersections.iter().zip(&noisy.intersections) {
        assert_eq!(a.point, b.point);
        assert_eq!(a.intensity_after, b.intensity_after);
    }
    assert_eq!(exact.final_direction, noisy.final_direction);
    assert!(noisy
        .intersections
        .iter()
        .any(|hit| hit.measured_intensity != hit.intensity_after));
}

#[test]
fn test_facing_mirrors_hit_the_iteration_cap() {
    let mirrors = [
        OpticalElement::new("left", Vec2::new(0.0, 0.0), OpticalKind::Mirror),
        OpticalElement::new("right", Vec2::new(10.0, 0.0), OpticalKind::Mirror),
    ];
    let ray = OpticalRay::new("r", Vec2::new(5.0, 0.0), Vec2::new(1.0, 0.0));

    let capped = engine(0.0).trace_ray(&ray, &mirrors, MAX_INTERSECTIONS);
    assert_eq!(capped.termination, TraceTermination::IterationCap);
    assert_eq!(capped.intersections.len(), MAX_INTERSECTIONS);
    assert_eq!(capped.intersections[0].element_id, "right");
    assert_eq!(capped.intersections[1].element_id, "left");

    let long = engine(0.0).trace_ray(&ray, &mirrors, 1_000);
    assert_eq!(long.termination, TraceTermination::Extinguished);
    assert!(long.final_intensity < MIN_INTENSITY);
    assert_eq!(long.intersections.len(), 44);
}

#[test]
fn test_ray_outside_aperture_escapes() {
    let narrow = OpticalElement::new("L", Vec2::new(10.0, 0.0), OpticalKind::Lens { focal_length: 5.0 })
        .with_aperture(1.0);
    let ray = OpticalRay::new("r", Vec2::new(0.0, 3.0), Vec2::new(1.0, 0.0));
    let trace = engine(0.0).trace_ray(&ray, &[narrow], MAX_INTERSECTIONS);
    assert!(trace.intersections.is_empty());
}

#[test]
fn test_trace_all_is_reproducible() {
    let rays = [
        OpticalRay::new("a", Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0)),
        OpticalRay::new("b", Vec2::new(0.0, -2.0), Vec2::new(1.0, 0.1)),
    ];
    let elements = lens_train(3);
    let first = engine(0.05).trace_all(&rays, &elements);
    let second = engine(0.05).trace_all(&rays, &elements);

    assert_eq!(first, second);
    assert_eq!(first[0].ray_id, "a");
    assert_eq!(first[1].ray_id, "b");
}

#[test]
fn test_ray_json_defaults() {
    let ray: OpticalRay =
        serde_json::from_str(r#"{"id": "r", "origin": {"x": 0, "y": 0}, "direction": {"x": 1, "y": 0}}"#).unwrap();
    assert_eq!(ray.wavelength_nm, 550.0);
    assert_eq!(ray.intensity, 1.0);

    let mirror: OpticalElement =
        serde_json::from_str(r#"{"id": "m", "position": {"x": 5, "y": 0}, "type": "mirror"}"#).unwrap();
    assert_eq!(mirror.kind, OpticalKind::Mirror);
    assert_eq!(mirror.aperture, 50.0);
    assert_eq!(mirror.orientation, std::f64::consts::FRAC_PI_2);
}

proptest! {
    #[test]
    fn prop_trace_intensity_bounded(y in -10.0f64..10.0, slope in -0.3f64..0.3, lenses in 0usize..8) {
        let ray = OpticalRay::new("r", Vec2::new(0.0, y), Vec2::new(1.0, slope));
        let trace = engine(0.1).trace_ray(&ray, &lens_train(lenses), MAX_INTERSECTIONS);

        let mut last = 1.0;
        for hit in &trace.intersections {
            prop_assert!(hit.intensity_after <= last);
            last = hit.intensity_after;
        }
        prop_assert!(trace.final_intensity <= 1.0);
        prop_assert!(trace.intersections.len() <= MAX_INTERSECTIONS);
    }
}

// ============================================================================
// Imaging and interference
// ============================================================================

fn lens() -> OpticalElement {
    OpticalElement::new("L", Vec2::ZERO, OpticalKind::Lens { focal_length: 10.0 })
}

#[test]
fn test_real_inverted_image() {
    let image = image_formation(Vec2::new(-30.0, 0.0), 2.0, &lens()).unwrap();
    assert_eq!(image.kind, ImageKind::Real);
    assert!((image.image_distance.unwrap() - 15.0).abs() < 1e-9);
    assert!((image.magnification.unwrap() + 0.5).abs() < 1e-12);
    assert!((image.image_height.unwrap() + 1.0).abs() < 1e-12);
    assert!((image.image_position.unwrap().x - 15.0).abs() < 1e-9);
}

#[test]
fn test_virtual_upright_image_inside_focus() {
    let image = image_formation(Vec2::new(-5.0, 0.0), 1.0, &lens()).unwrap();
    assert_eq!(image.kind, ImageKind::Virtual);
    assert!((image.magnification.unwrap() - 2.0).abs() < 1e-12);
    assert!((image.image_position.unwrap().x + 10.0).abs() < 1e-9);
}

#[test]
fn test_object_at_focus_has_no_image() {
    let image = image_formation(Vec2::new(-10.0, 0.0), 1.0, &lens()).unwrap();
    assert_eq!(image.kind, ImageKind::None);
    assert!(image.image_distance.is_none());
}

#[test]
fn test_image_needs_a_lens() {
    let mirror = OpticalElement::new("M", Vec2::ZERO, OpticalKind::Mirror);
    assert!(matches!(
        image_formation(Vec2::new(-5.0, 0.0), 1.0, &mirror),
        Err(PhysicsError::InvalidParameter(_))
    ));
}

#[test]
fn test_noisy_image_keeps_geometry() {
    let truth = image_formation(Vec2::new(-30.0, 0.0), 2.0, &lens()).unwrap();
    let measured = engine(0.05)
        .simulate_image_formation(Vec2::new(-30.0, 0.0), 2.0, &lens())
        .unwrap();
    assert_eq!(measured.kind, truth.kind);
    assert_eq!(measured.image_distance, truth.image_distance);
    assert_ne!(measured.magnification, truth.magnification);
}

#[test]
fn test_interference_fringes() {
    let (wavelength, d, screen) = (500e-9, 1e-4, 1.0);
    assert!((interference_intensity(0.0, wavelength, d, screen) - 1.0).abs() < 1e-12);

    let first_minimum = wavelength * screen / (2.0 * d);
    assert!(interference_intensity(first_minimum, wavelength, d, screen) < 1e-12);

    let first_maximum = wavelength * screen / d;
    assert!((interference_intensity(first_maximum, wavelength, d, screen) - 1.0).abs() < 1e-9);
}

#[test]
fn test_double_slit_pattern() {
    let samples = engine(0.0)
        .simulate_double_slit_interference(500e-9, 1e-4, 1.0, 0.02)
        .unwrap();
    assert_eq!(samples.len(), 100);
    assert_eq!(samples[50].position, 0.0);
    assert!((samples[50].intensity - 1.0).abs() < 1e-12);
    assert!(samples.iter().all(|s| (0.0..=1.0 + 1e-12).contains(&s.intensity)));

    assert!(engine(0.0)
        .simulate_double_slit_interference(0.0, 1e-4, 1.0, 0.02)
        .is_err());
}
