//! Integration tests for the SPH fluid solver and its boundary handling.

use glam::Vec3;
use marrow::physics::{ParticleSystem, SphParams};

fn inside_box(position: Vec3, params: &SphParams) -> bool {
    (0..3).all(|axis| {
        position[axis] >= params.box_min[axis] && position[axis] <= params.box_max[axis]
    })
}

#[test]
fn blob_spawns_requested_count_inside_the_box() {
    let params = SphParams::default();
    let system = ParticleSystem::new(250, params);
    assert_eq!(system.particle_count(), 250);
    for p in system.particles() {
        assert!(inside_box(p.position, &params));
    }
}

#[test]
fn densities_are_positive_after_a_step() {
    let mut system = ParticleSystem::new(64, SphParams::default());
    system.update(0.001);
    for (i, p) in system.particles().iter().enumerate() {
        // self-contribution alone already makes density strictly positive
        assert!(p.density > 0.0, "particle {i} density {}", p.density);
    }
}

#[test]
fn pressure_never_pulls() {
    let mut system = ParticleSystem::new(64, SphParams::default());
    for _ in 0..20 {
        system.update(0.002);
    }
    for p in system.particles() {
        assert!(p.pressure >= 0.0);
    }
}

#[test]
fn hard_boundary_holds_with_soft_penalty_disabled() {
    let mut system = ParticleSystem::new(200, SphParams::default());
    system.soft_boundary = false;

    for frame in 0..300 {
        system.update(0.004);
        for (i, p) in system.particles().iter().enumerate() {
            assert!(
                inside_box(p.position, &system.params),
                "particle {i} escaped at frame {frame}: {:?}",
                p.position
            );
        }
    }
}

#[test]
fn hard_boundary_holds_with_soft_penalty_enabled() {
    let mut system = ParticleSystem::new(200, SphParams::default());
    assert!(system.soft_boundary);

    for _ in 0..300 {
        system.update(0.004);
    }
    for p in system.particles() {
        assert!(inside_box(p.position, &system.params));
    }
}

#[test]
fn falling_blob_loses_height() {
    let params = SphParams::default();
    let mut system = ParticleSystem::new(125, params);
    let initial_mean_y: f32 =
        system.particles().iter().map(|p| p.position.y).sum::<f32>() / 125.0;

    for _ in 0..100 {
        system.update(0.004);
    }

    let mean_y: f32 = system.particles().iter().map(|p| p.position.y).sum::<f32>() / 125.0;
    assert!(
        mean_y < initial_mean_y,
        "blob should fall under gravity ({initial_mean_y} -> {mean_y})"
    );
}

#[test]
fn reset_reseeds_the_blob_at_rest() {
    let mut system = ParticleSystem::new(64, SphParams::default());
    for _ in 0..100 {
        system.update(0.004);
    }
    system.reset();

    assert_eq!(system.particle_count(), 64);
    for p in system.particles() {
        assert!(inside_box(p.position, &system.params));
        assert_eq!(p.velocity, Vec3::ZERO);
    }
}

#[test]
fn simulation_state_stays_finite() {
    let mut system = ParticleSystem::new(100, SphParams::default());
    for _ in 0..200 {
        system.update(0.004);
    }
    for p in system.particles() {
        assert!(p.position.is_finite());
        assert!(p.velocity.is_finite());
        assert!(p.density.is_finite());
        assert!(p.pressure.is_finite());
    }
}
