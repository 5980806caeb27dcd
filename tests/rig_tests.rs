//! Integration tests for the joint hierarchy, pose application, and
//! linear-blend skinning.

use glam::{Mat4, Vec3};
use marrow::animation::Pose;
use marrow::io::TextTokenizer;
use marrow::rig::{Joint, Rig, Skeleton, Skin};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}

/// root → child → grandchild chain with the given offsets.
fn chain(offsets: &[Vec3]) -> Skeleton {
    let mut skeleton = Skeleton::new();
    let mut parent = None;
    for (i, &offset) in offsets.iter().enumerate() {
        let mut joint = Joint::new(format!("joint{i}"));
        joint.offset = offset;
        parent = Some(skeleton.add_joint(joint, parent));
    }
    skeleton.populate_joint_list();
    skeleton
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn zero_rotation_world_matrices_are_cumulative_offsets() {
    let offsets = [
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 2.0, 0.0),
        Vec3::new(0.0, 0.0, 3.0),
    ];
    let mut skeleton = chain(&offsets);
    skeleton.update();

    let mut cumulative = Vec3::ZERO;
    for (i, &offset) in offsets.iter().enumerate() {
        cumulative += offset;
        let world = skeleton.world_matrix(i);
        assert!(
            approx_vec3(world.transform_point3(Vec3::ZERO), cumulative),
            "joint {i} translated to {:?}, expected {cumulative:?}",
            world.transform_point3(Vec3::ZERO)
        );
        // rotation part stays identity
        assert!(approx_vec3(world.transform_vector3(Vec3::X), Vec3::X));
    }
}

#[test]
fn rotation_propagates_to_children() {
    // rotate the root 90° about z; the child hangs one unit along x
    let mut skeleton = chain(&[Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)]);
    skeleton
        .joint_mut(0)
        .unwrap()
        .set_pose(0.0, 0.0, std::f32::consts::FRAC_PI_2);
    skeleton.update();

    let child_origin = skeleton.world_matrix(1).transform_point3(Vec3::ZERO);
    assert!(approx_vec3(child_origin, Vec3::new(0.0, 1.0, 0.0)));
}

#[test]
fn local_matrix_applies_z_then_y_then_x() {
    let mut skeleton = chain(&[Vec3::ZERO]);
    let (rx, ry, rz) = (0.3, -0.7, 1.1);
    skeleton.joint_mut(0).unwrap().set_pose(rx, ry, rz);
    skeleton.update();

    let expected =
        Mat4::from_rotation_z(rz) * Mat4::from_rotation_y(ry) * Mat4::from_rotation_x(rx);
    let world = skeleton.world_matrix(0);
    for col in 0..4 {
        assert!(approx_vec3(
            world.col(col).truncate(),
            expected.col(col).truncate()
        ));
    }
}

#[test]
fn joint_limits_clamp_pose_values() {
    let mut skeleton = chain(&[Vec3::ZERO]);
    let joint = skeleton.joint_mut(0).unwrap();
    joint.rotation[0].set_min_max(-0.5, 0.5);
    joint.set_pose(2.0, 0.0, 0.0);
    assert!(approx(joint.rotation[0].value(), 0.5));
}

#[test]
fn find_joint_uses_flattened_order() {
    let skeleton = chain(&[Vec3::ZERO, Vec3::X, Vec3::Y]);
    assert_eq!(skeleton.find_joint("joint0"), Some(0));
    assert_eq!(skeleton.find_joint("joint2"), Some(2));
    assert_eq!(skeleton.find_joint("missing"), None);
}

// ============================================================================
// Pose application
// ============================================================================

#[test]
fn apply_pose_routes_root_translation_and_rotations() {
    let mut rig = Rig::new(chain(&[Vec3::ZERO, Vec3::X]), None);

    let mut pose = Pose::for_joint_count(2);
    pose.set(0, 1.0); // root translation
    pose.set(1, 2.0);
    pose.set(2, 3.0);
    pose.set(3 + 3, 0.25); // joint 1 rotation x
    rig.apply_pose(&pose);

    let root_origin = rig.skeleton.world_matrix(0).transform_point3(Vec3::ZERO);
    assert!(approx_vec3(root_origin, Vec3::new(1.0, 2.0, 3.0)));
    assert!(approx(rig.skeleton.joint(1).unwrap().rotation[0].value(), 0.25));
}

#[test]
fn short_pose_leaves_trailing_joints_at_rest() {
    let mut rig = Rig::new(chain(&[Vec3::ZERO, Vec3::X, Vec3::Y]), None);
    let pose = Pose::for_joint_count(0); // 3 DOFs, root translation only
    rig.apply_pose(&pose);
    for i in 0..3 {
        let joint = rig.skeleton.joint(i).unwrap();
        assert!(approx(joint.rotation[0].value(), 0.0));
    }
}

// ============================================================================
// Skinning
// ============================================================================

const SINGLE_JOINT_SKIN: &str = "
positions 2 {
    0.0 1.0 0.0
    1.0 1.0 0.0
}
normals 2 {
    0.0 0.0 1.0
    0.0 0.0 1.0
}
skinweights 2 {
    1 0 1.0
    1 0 1.0
}
triangles 0 {
}
bindings 1 {
    matrix {
        1.0 0.0 0.0
        0.0 1.0 0.0
        0.0 0.0 1.0
        0.0 0.0 0.0
    }
}
";

#[test]
fn fully_bound_vertex_follows_its_joint_exactly() {
    let mut tokenizer = TextTokenizer::new(SINGLE_JOINT_SKIN);
    let mut skin = Skin::load(&mut tokenizer).unwrap();

    let mut skeleton = chain(&[Vec3::new(0.5, 0.0, 0.0)]);
    skeleton
        .joint_mut(0)
        .unwrap()
        .set_pose(0.0, 0.0, std::f32::consts::FRAC_PI_2);
    skeleton.update();

    skin.update(Some(&skeleton));

    let world = skeleton.world_matrix(0);
    // identity binding, so the deformed vertex is world · bind position
    let expected = world.transform_point3(Vec3::new(0.0, 1.0, 0.0));
    assert!(approx_vec3(skin.positions()[0], expected));

    let expected_normal = world.transform_vector3(Vec3::Z).normalize();
    assert!(approx_vec3(skin.normals()[0], expected_normal));
}

#[test]
fn split_vertex_normal_blends_per_joint_inverse_transposes() {
    // a vertex weighted across two differently-rotated joints must blend
    // each joint's inverse-transpose separately, not invert the blended
    // skinning matrix
    let source = "
positions 1 { 0.0 0.0 0.0 }
normals 1 { 0.0 0.0 1.0 }
skinweights 1 { 2 0 0.5 1 0.5 }
triangles 0 { }
bindings 2 {
    matrix { 1 0 0  0 1 0  0 0 1  0 0 0 }
    matrix { 1 0 0  0 1 0  0 0 1  0 0 0 }
}
";
    let mut tokenizer = TextTokenizer::new(source);
    let mut skin = Skin::load(&mut tokenizer).unwrap();

    let mut skeleton = chain(&[Vec3::ZERO, Vec3::ZERO]);
    skeleton.joint_mut(0).unwrap().set_pose(0.0, 1.2, 0.0);
    skeleton.joint_mut(1).unwrap().set_pose(1.0, 0.0, 0.4);
    skeleton.update();

    skin.update(Some(&skeleton));

    // identity bindings, so each skinning matrix is the joint's world matrix
    let n0 = skeleton
        .world_matrix(0)
        .inverse()
        .transpose()
        .transform_vector3(Vec3::Z);
    let n1 = skeleton
        .world_matrix(1)
        .inverse()
        .transpose()
        .transform_vector3(Vec3::Z);
    let expected = (0.5 * n0 + 0.5 * n1).normalize();

    assert!(
        approx_vec3(skin.normals()[0], expected),
        "got {:?}, expected {expected:?}",
        skin.normals()[0]
    );
}

#[test]
fn skin_without_skeleton_stays_at_bind_pose() {
    let mut tokenizer = TextTokenizer::new(SINGLE_JOINT_SKIN);
    let mut skin = Skin::load(&mut tokenizer).unwrap();
    skin.update(None);
    assert!(approx_vec3(skin.positions()[0], Vec3::new(0.0, 1.0, 0.0)));
    assert!(approx_vec3(skin.positions()[1], Vec3::new(1.0, 1.0, 0.0)));
}

#[test]
fn weight_quantization_error_is_bounded() {
    let mut tokenizer = TextTokenizer::new(SINGLE_JOINT_SKIN);
    let skin = Skin::load(&mut tokenizer).unwrap();
    let vertex = skin.vertex(0).unwrap();
    assert!((vertex.weight(0) - 1.0).abs() <= 1.0 / 255.0);
}

#[test]
fn split_weights_quantize_within_a_step() {
    let source = "
positions 1 { 0.0 0.0 0.0 }
normals 1 { 0.0 1.0 0.0 }
skinweights 1 {
    2 0 0.3 1 0.7
}
triangles 0 { }
bindings 2 {
    matrix { 1 0 0  0 1 0  0 0 1  0 0 0 }
    matrix { 1 0 0  0 1 0  0 0 1  0 0 0 }
}
";
    let mut tokenizer = TextTokenizer::new(source);
    let skin = Skin::load(&mut tokenizer).unwrap();
    let vertex = skin.vertex(0).unwrap();
    assert!((vertex.weight(0) - 0.3).abs() <= 1.0 / 255.0);
    assert!((vertex.weight(1) - 0.7).abs() <= 1.0 / 255.0);
}

#[test]
fn binding_matrix_rows_become_columns() {
    // translation row (0.5, 0, 0) must land in the matrix's fourth column
    let source = "
positions 1 { 0.0 0.0 0.0 }
normals 1 { 0.0 1.0 0.0 }
skinweights 1 { 1 0 1.0 }
triangles 0 { }
bindings 1 {
    matrix {
        1.0 0.0 0.0
        0.0 1.0 0.0
        0.0 0.0 1.0
        0.5 0.0 0.0
    }
}
";
    let mut tokenizer = TextTokenizer::new(source);
    let skin = Skin::load(&mut tokenizer).unwrap();
    let binding = skin.binding(0).unwrap();
    assert!(approx_vec3(binding.col(3).truncate(), Vec3::new(0.5, 0.0, 0.0)));
    assert!(approx(binding.col(3).w, 1.0));
}
