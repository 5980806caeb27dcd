//! A single node in the skeleton's rotation hierarchy.

use glam::{Mat4, Vec3};

use crate::animation::pose::Dof;

/// A ball joint: a parent-relative translation offset plus a 3-DOF Euler
/// rotation, stored as an arena node (parent/children are indices into the
/// owning [`Skeleton`]'s joint vector, never pointers).
///
/// [`Skeleton`]: crate::rig::Skeleton
#[derive(Debug, Clone)]
pub struct Joint {
    pub name: String,

    /// Parent-relative translation.
    pub offset: Vec3,

    /// Display bounds for the (external) bone-box renderer.
    pub box_min: Vec3,
    pub box_max: Vec3,

    /// Rotation DOFs around x, y, z in radians, clamped by the file's
    /// rot limits.
    pub rotation: [Dof; 3],

    // derived, recomputed every Skeleton::update
    pub(crate) local_matrix: Mat4,
    pub(crate) world_matrix: Mat4,

    // arena links
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
}

impl Joint {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            offset: Vec3::ZERO,
            box_min: Vec3::splat(-0.1),
            box_max: Vec3::splat(0.1),
            rotation: [Dof::new(); 3],
            local_matrix: Mat4::IDENTITY,
            world_matrix: Mat4::IDENTITY,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Sets all three rotation DOFs (clamped by their limits).
    pub fn set_pose(&mut self, x: f32, y: f32, z: f32) {
        self.rotation[0].set_value(x);
        self.rotation[1].set_value(y);
        self.rotation[2].set_value(z);
    }

    pub fn set_offset(&mut self, x: f32, y: f32, z: f32) {
        self.offset = Vec3::new(x, y, z);
    }

    /// Recomputes the local matrix: `T(offset) · Rz · Ry · Rx`.
    /// The Z,Y,X application order is fixed and must match the load-time
    /// convention; pose data is authored against it.
    pub(crate) fn update_local_matrix(&mut self) {
        self.local_matrix = Mat4::from_translation(self.offset)
            * Mat4::from_rotation_z(self.rotation[2].value())
            * Mat4::from_rotation_y(self.rotation[1].value())
            * Mat4::from_rotation_x(self.rotation[0].value());
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Mat4 {
        &self.local_matrix
    }

    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[usize] {
        &self.children
    }
}
