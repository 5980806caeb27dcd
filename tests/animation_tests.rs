//! Integration tests for channel evaluation, extrapolation, and pose
//! plumbing.

use marrow::animation::channel::Span;
use marrow::animation::keyframe::TangentRule;
use marrow::animation::{AnimationClip, AnimationPlayer, Channel, Extrapolation, Keyframe, Pose};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

fn key(time: f32, value: f32, rule: TangentRule) -> Keyframe {
    let mut k = Keyframe::new(time, value);
    k.rule_in = rule;
    k.rule_out = rule;
    k
}

fn smooth_channel(samples: &[(f32, f32)]) -> Channel {
    let keys = samples
        .iter()
        .map(|&(t, v)| key(t, v, TangentRule::Smooth))
        .collect();
    Channel::from_keys(keys, Extrapolation::Constant, Extrapolation::Constant)
}

// ============================================================================
// Basic evaluation
// ============================================================================

#[test]
fn empty_channel_evaluates_to_zero() {
    let channel = Channel::new();
    assert!(approx(channel.evaluate(0.0), 0.0));
    assert!(approx(channel.evaluate(123.0), 0.0));
}

#[test]
fn single_key_channel_is_constant() {
    let channel = Channel::from_keys(
        vec![key(1.0, 42.0, TangentRule::Flat)],
        Extrapolation::Constant,
        Extrapolation::Constant,
    );
    assert!(approx(channel.evaluate(-10.0), 42.0));
    assert!(approx(channel.evaluate(1.0), 42.0));
    assert!(approx(channel.evaluate(10.0), 42.0));
}

#[test]
fn evaluation_hits_every_key_exactly() {
    let samples = [(0.0, 1.0), (0.5, -2.0), (1.25, 4.0), (3.0, 0.5)];
    let channel = smooth_channel(&samples);
    for (t, v) in samples {
        assert!(
            approx(channel.evaluate(t), v),
            "key at t={t} expected {v}, got {}",
            channel.evaluate(t)
        );
    }
}

#[test]
fn flat_flat_midpoint_is_exact_average() {
    let channel = Channel::from_keys(
        vec![key(0.0, 0.0, TangentRule::Flat), key(1.0, 10.0, TangentRule::Flat)],
        Extrapolation::Constant,
        Extrapolation::Constant,
    );
    // symmetric cubic with zero end derivatives passes through the average
    assert!(approx(channel.evaluate(0.5), 5.0));
}

#[test]
fn evaluation_is_continuous_at_interior_keys() {
    let channel = smooth_channel(&[(0.0, 0.0), (1.0, 3.0), (2.0, -1.0), (3.0, 2.0)]);
    let eps = 1e-4;
    for t in [1.0, 2.0] {
        let at = channel.evaluate(t);
        assert!((channel.evaluate(t - eps) - at).abs() < 1e-2);
        assert!((channel.evaluate(t + eps) - at).abs() < 1e-2);
    }
}

#[test]
fn coincident_key_times_stay_finite() {
    let channel = Channel::from_keys(
        vec![
            key(0.0, 1.0, TangentRule::Linear),
            key(1.0, 2.0, TangentRule::Linear),
            key(1.0, 5.0, TangentRule::Linear),
            key(2.0, 3.0, TangentRule::Linear),
        ],
        Extrapolation::Constant,
        Extrapolation::Constant,
    );
    for i in 0..=40 {
        let t = -1.0 + 0.1 * i as f32;
        assert!(channel.evaluate(t).is_finite(), "non-finite at t={t}");
    }
}

// ============================================================================
// Span lookup
// ============================================================================

#[test]
fn find_span_matches_brute_force_scan() {
    let times = [0.0, 0.7, 1.3, 2.0, 2.1, 5.0];
    let keys: Vec<Keyframe> = times
        .iter()
        .map(|&t| key(t, t * 2.0, TangentRule::Linear))
        .collect();
    let channel = Channel::from_keys(keys, Extrapolation::Constant, Extrapolation::Constant);

    let brute_force = |t: f32| -> Span {
        if t < times[0] {
            return Span::BeforeFirst;
        }
        if t >= times[times.len() - 1] {
            return Span::AfterLast;
        }
        for i in 0..times.len() - 1 {
            if t >= times[i] && t < times[i + 1] {
                return Span::Between(i);
            }
        }
        unreachable!()
    };

    for i in 0..=700 {
        let t = -1.0 + 0.01 * i as f32;
        assert_eq!(channel.find_span(t), brute_force(t), "mismatch at t={t}");
    }
}

#[test]
fn find_span_boundary_cases() {
    let channel = smooth_channel(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
    assert_eq!(channel.find_span(-0.01), Span::BeforeFirst);
    assert_eq!(channel.find_span(0.0), Span::Between(0));
    assert_eq!(channel.find_span(1.0), Span::Between(1));
    assert_eq!(channel.find_span(1.99), Span::Between(1));
    assert_eq!(channel.find_span(2.0), Span::AfterLast);
    assert_eq!(channel.find_span(100.0), Span::AfterLast);
}

// ============================================================================
// Extrapolation
// ============================================================================

#[test]
fn constant_extrapolation_holds_boundary_values() {
    let channel = Channel::from_keys(
        vec![key(0.0, 2.0, TangentRule::Flat), key(1.0, 8.0, TangentRule::Flat)],
        Extrapolation::Constant,
        Extrapolation::Constant,
    );
    assert!(approx(channel.evaluate(-5.0), 2.0));
    assert!(approx(channel.evaluate(6.0), 8.0));
}

#[test]
fn linear_extrapolation_follows_edge_tangent() {
    // linear rule between (0,0) and (1,2) gives slope 2 at both edges
    let channel = Channel::from_keys(
        vec![key(0.0, 0.0, TangentRule::Linear), key(1.0, 2.0, TangentRule::Linear)],
        Extrapolation::Linear,
        Extrapolation::Linear,
    );
    assert!(approx(channel.evaluate(2.0), 4.0));
    assert!(approx(channel.evaluate(-1.0), -2.0));
}

#[test]
fn cycle_extrapolation_is_periodic() {
    let channel = Channel::from_keys(
        vec![
            key(0.0, 1.0, TangentRule::Smooth),
            key(0.6, 4.0, TangentRule::Smooth),
            key(2.0, 1.0, TangentRule::Smooth),
        ],
        Extrapolation::Cycle,
        Extrapolation::Cycle,
    );
    let span = 2.0;
    for t in [0.1, 0.3, 0.9, 1.5] {
        assert!(
            approx(channel.evaluate(t + span), channel.evaluate(t)),
            "period invariance broken at t={t}"
        );
        assert!(
            approx(channel.evaluate(t - span), channel.evaluate(t)),
            "negative-side period invariance broken at t={t}"
        );
    }
    // one full span past the last key lands back on the first key's value
    assert!(approx(channel.evaluate(2.0 + span), channel.evaluate(0.0)));
}

#[test]
fn cycle_offset_extrapolation_ramps() {
    // first 0, last 3: each forward cycle lifts the curve by 3
    let channel = Channel::from_keys(
        vec![key(0.0, 0.0, TangentRule::Linear), key(1.0, 3.0, TangentRule::Linear)],
        Extrapolation::CycleOffset,
        Extrapolation::CycleOffset,
    );
    assert!(approx(channel.evaluate(1.5), channel.evaluate(0.5) + 3.0));
    assert!(approx(channel.evaluate(2.5), channel.evaluate(0.5) + 6.0));
    assert!(approx(channel.evaluate(-0.5), channel.evaluate(0.5) - 3.0));
}

#[test]
fn bounce_extrapolation_mirrors_alternate_cycles() {
    let channel = Channel::from_keys(
        vec![key(0.0, 0.0, TangentRule::Linear), key(1.0, 1.0, TangentRule::Linear)],
        Extrapolation::Bounce,
        Extrapolation::Bounce,
    );
    // first bounce cycle runs backwards
    assert!(approx(channel.evaluate(1.25), channel.evaluate(0.75)));
    // second cycle runs forwards again
    assert!(approx(channel.evaluate(2.25), channel.evaluate(0.25)));
}

#[test]
fn unknown_extrapolation_behaves_as_constant() {
    let channel = Channel::from_keys(
        vec![key(0.0, 1.0, TangentRule::Flat), key(1.0, 2.0, TangentRule::Flat)],
        Extrapolation::Unknown,
        Extrapolation::Unknown,
    );
    assert!(approx(channel.evaluate(-3.0), 1.0));
    assert!(approx(channel.evaluate(9.0), 2.0));
}

// ============================================================================
// Pose and clip
// ============================================================================

#[test]
fn dof_clamps_to_limits() {
    let mut pose = Pose::for_joint_count(1);
    let dof = pose.dof_mut(3).unwrap();
    dof.set_min_max(-1.0, 1.0);
    dof.set_value(5.0);
    assert!(approx(dof.value(), 1.0));
    dof.set_value(-5.0);
    assert!(approx(dof.value(), -1.0));
}

#[test]
fn pose_out_of_range_reads_are_zero() {
    let pose = Pose::for_joint_count(0);
    assert!(approx(pose.value(99), 0.0));
}

#[test]
fn clip_evaluation_resizes_short_pose() {
    let channels = vec![
        Channel::from_keys(
            vec![key(0.0, 7.0, TangentRule::Flat)],
            Extrapolation::Constant,
            Extrapolation::Constant,
        );
        6
    ];
    let clip = AnimationClip::new(0.0, 1.0, channels);

    let mut pose = Pose::new();
    clip.evaluate(0.0, &mut pose);
    assert_eq!(pose.len(), 6);
    for i in 0..6 {
        assert!(approx(pose.value(i), 7.0));
    }
}

#[test]
fn player_rewinds_to_clip_start() {
    let clip = AnimationClip::new(-2.5, 4.0, Vec::new());
    let mut player = AnimationPlayer::new();
    player.time = 100.0;
    player.set_clip(clip);
    assert!(approx(player.time, -2.5));
}

#[test]
fn player_without_clip_is_a_no_op() {
    let mut player = AnimationPlayer::new();
    player.update(0.016, None);
    assert!(approx(player.time, 0.0));
}
