//! Flat DOF arrays that carry evaluated animation values to a rig.

use log::warn;

/// A single scalar degree of freedom with clamp limits.
///
/// Values written through [`Dof::set_value`] are clamped into `[min, max]`.
/// Fresh DOFs carry wide-open limits so unconstrained channels pass through
/// untouched.
#[derive(Debug, Clone, Copy)]
pub struct Dof {
    value: f32,
    min: f32,
    max: f32,
}

/// Default limit magnitude for unconstrained DOFs (radians or meters).
const DOF_LIMIT: f32 = 100_000.0;

impl Dof {
    #[must_use]
    pub fn new() -> Self {
        Self {
            value: 0.0,
            min: -DOF_LIMIT,
            max: DOF_LIMIT,
        }
    }

    /// Sets the value, clamped to the DOF's limits.
    #[inline]
    pub fn set_value(&mut self, value: f32) {
        self.value = value.clamp(self.min, self.max);
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Replaces the clamp limits and re-clamps the current value.
    pub fn set_min_max(&mut self, min: f32, max: f32) {
        self.min = min;
        self.max = max;
        self.value = self.value.clamp(min, max);
    }

    #[inline]
    #[must_use]
    pub fn min(&self) -> f32 {
        self.min
    }

    #[inline]
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }
}

impl Default for Dof {
    fn default() -> Self {
        Self::new()
    }
}

/// A pose is a flat array of DOF values index-mapped to a rig.
///
/// Layout: DOFs 0..2 are the root translation (x, y, z); DOFs
/// `(3 + 3i)..(3 + 3i + 2)` are the rotation (x, y, z) of joint `i` in the
/// skeleton's flattened joint-list order. The indices are meaningless if
/// that ordering changes after load.
#[derive(Debug, Clone, Default)]
pub struct Pose {
    dofs: Vec<Dof>,
}

impl Pose {
    #[must_use]
    pub fn new() -> Self {
        Self { dofs: Vec::new() }
    }

    /// Creates a pose sized for a skeleton with `joint_count` joints:
    /// 3 root-translation DOFs plus 3 rotation DOFs per joint.
    #[must_use]
    pub fn for_joint_count(joint_count: usize) -> Self {
        Self {
            dofs: vec![Dof::new(); 3 + joint_count * 3],
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dofs.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dofs.is_empty()
    }

    /// Resizes the pose; a grown tail is zero-filled with open limits.
    pub fn resize(&mut self, len: usize) {
        self.dofs.resize(len, Dof::new());
    }

    /// Writes `value` into DOF `index` (clamped by its limits).
    /// Out-of-range indices are logged and ignored.
    pub fn set(&mut self, index: usize, value: f32) {
        if let Some(dof) = self.dofs.get_mut(index) {
            dof.set_value(value);
        } else {
            warn!("Pose::set - DOF index {index} out of range (len {})", self.dofs.len());
        }
    }

    /// Reads DOF `index`, or 0.0 when out of range.
    #[must_use]
    pub fn value(&self, index: usize) -> f32 {
        self.dofs.get(index).map_or(0.0, Dof::value)
    }

    #[must_use]
    pub fn dof(&self, index: usize) -> Option<&Dof> {
        self.dofs.get(index)
    }

    #[must_use]
    pub fn dof_mut(&mut self, index: usize) -> Option<&mut Dof> {
        self.dofs.get_mut(index)
    }
}
