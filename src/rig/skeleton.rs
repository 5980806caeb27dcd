//! Joint arena, hierarchy update, and the `.skel` loader.

use glam::Mat4;
use log::{debug, warn};

use crate::errors::{MarrowError, Result};
use crate::io::Tokenizer;
use crate::rig::joint::Joint;

/// Maximum joint-tree depth we expect in practice. The recursive loader and
/// traversal are bounded by this; it is an implicit invariant of the asset
/// format, not an enforced limit.
const MAX_EXPECTED_DEPTH: usize = 50;

/// Owns the joint tree as a flat arena and drives the per-frame transform
/// propagation.
///
/// Joints are stored in load order, which is pre-order (parents before
/// children) because the loader pushes each joint before descending into
/// its children. `joint_order` is the flattened pre-order list built once
/// after load; [`Pose`] DOF indices are defined against it and become
/// meaningless if it changes.
///
/// [`Pose`]: crate::animation::Pose
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    joints: Vec<Joint>,
    root: Option<usize>,
    joint_order: Vec<usize>,
}

impl Skeleton {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of joints in the flattened list.
    #[inline]
    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joint_order.len()
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<usize> {
        self.root
    }

    /// Joint by flattened (pre-order) index.
    #[must_use]
    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joint_order
            .get(index)
            .and_then(|&arena| self.joints.get(arena))
    }

    /// Mutable joint by flattened index (UI DOF editing, pose application).
    #[must_use]
    pub fn joint_mut(&mut self, index: usize) -> Option<&mut Joint> {
        let arena = *self.joint_order.get(index)?;
        self.joints.get_mut(arena)
    }

    /// World matrix of the joint at flattened index `index`, identity when
    /// out of range.
    #[must_use]
    pub fn world_matrix(&self, index: usize) -> Mat4 {
        self.joint(index).map_or_else(
            || {
                warn!("Skeleton::world_matrix - joint index {index} out of range");
                Mat4::IDENTITY
            },
            |joint| joint.world_matrix,
        )
    }

    /// Flattened index of the first joint with the given name.
    #[must_use]
    pub fn find_joint(&self, name: &str) -> Option<usize> {
        self.joint_order
            .iter()
            .position(|&arena| self.joints[arena].name == name)
    }

    /// Attaches a joint to the arena under `parent` (or as root when
    /// `parent` is `None`). Used by the loader and by tests that build
    /// hierarchies programmatically. Call [`Skeleton::populate_joint_list`]
    /// once the tree is complete.
    pub fn add_joint(&mut self, mut joint: Joint, parent: Option<usize>) -> usize {
        let index = self.joints.len();
        joint.parent = parent;
        self.joints.push(joint);
        match parent {
            Some(p) => self.joints[p].children.push(index),
            None => self.root = Some(index),
        }
        index
    }

    /// Rebuilds the flattened pre-order joint list. Built once after load;
    /// pose DOF indices are defined against this ordering.
    pub fn populate_joint_list(&mut self) {
        self.joint_order.clear();
        if let Some(root) = self.root {
            self.collect_preorder(root);
        }
    }

    fn collect_preorder(&mut self, index: usize) {
        self.joint_order.push(index);
        // children vec is cloned to sidestep the borrow on self; joint
        // fan-out is small and this runs once per load
        let children = self.joints[index].children.clone();
        for child in children {
            self.collect_preorder(child);
        }
    }

    /// Recomputes every joint's local and world matrix, parents before
    /// children. A skeleton without a root is a logged no-op.
    pub fn update(&mut self) {
        if self.root.is_none() {
            debug!("Skeleton::update - no root joint");
            return;
        }

        // joint_order is pre-order, so a parent's world matrix is always
        // final before any of its children are visited
        for i in 0..self.joint_order.len() {
            let arena = self.joint_order[i];
            let parent_world = match self.joints[arena].parent {
                Some(p) => self.joints[p].world_matrix,
                None => Mat4::IDENTITY,
            };
            let joint = &mut self.joints[arena];
            joint.update_local_matrix();
            joint.world_matrix = parent_world * joint.local_matrix;
        }
    }

    /// Loads a nested `balljoint` tree from the token stream and builds the
    /// flattened joint list.
    pub fn load<T: Tokenizer>(tokenizer: &mut T) -> Result<Self> {
        let mut skeleton = Skeleton::new();

        if !tokenizer.find_token("balljoint") {
            return Err(MarrowError::parse("skeleton: no balljoint found"));
        }
        skeleton.load_joint(tokenizer, None, 0)?;
        skeleton.populate_joint_list();

        debug!(
            "Skeleton::load - loaded {} joints",
            skeleton.joint_count()
        );
        Ok(skeleton)
    }

    /// Parses one `balljoint [name] { ... }` block, recursing into child
    /// balljoints. Recursion depth equals tree depth (< ~50 in practice).
    fn load_joint<T: Tokenizer>(
        &mut self,
        tokenizer: &mut T,
        parent: Option<usize>,
        depth: usize,
    ) -> Result<usize> {
        if depth > MAX_EXPECTED_DEPTH {
            warn!("Skeleton::load - joint tree deeper than {MAX_EXPECTED_DEPTH} levels");
        }

        // optional name token before the opening brace
        let mut name = String::new();
        match tokenizer.get_token() {
            Some(tok) if tok == "{" => {}
            Some(tok) => {
                name = tok;
                if !tokenizer.find_token("{") {
                    return Err(MarrowError::parse("balljoint: missing '{'"));
                }
            }
            None => return Err(MarrowError::parse("balljoint: unexpected end of input")),
        }

        let index = self.add_joint(Joint::new(name), parent);

        loop {
            let Some(token) = tokenizer.get_token() else {
                return Err(MarrowError::parse("balljoint: unexpected end of input"));
            };

            match token.as_str() {
                "offset" => {
                    let (x, y, z) = read_vec3(tokenizer);
                    self.joints[index].set_offset(x, y, z);
                }
                "boxmin" => {
                    let (x, y, z) = read_vec3(tokenizer);
                    self.joints[index].box_min = glam::Vec3::new(x, y, z);
                }
                "boxmax" => {
                    let (x, y, z) = read_vec3(tokenizer);
                    self.joints[index].box_max = glam::Vec3::new(x, y, z);
                }
                "rotxlimit" => {
                    let (min, max) = (tokenizer.get_float(), tokenizer.get_float());
                    self.joints[index].rotation[0].set_min_max(min, max);
                }
                "rotylimit" => {
                    let (min, max) = (tokenizer.get_float(), tokenizer.get_float());
                    self.joints[index].rotation[1].set_min_max(min, max);
                }
                "rotzlimit" => {
                    let (min, max) = (tokenizer.get_float(), tokenizer.get_float());
                    self.joints[index].rotation[2].set_min_max(min, max);
                }
                "pose" => {
                    let (x, y, z) = read_vec3(tokenizer);
                    self.joints[index].set_pose(x, y, z);
                }
                "balljoint" => {
                    self.load_joint(tokenizer, Some(index), depth + 1)?;
                }
                "}" => return Ok(index),
                _ => {
                    warn!("Skeleton::load - unrecognised token: {token}");
                    tokenizer.skip_line();
                }
            }
        }
    }
}

fn read_vec3<T: Tokenizer>(tokenizer: &mut T) -> (f32, f32, f32) {
    (
        tokenizer.get_float(),
        tokenizer.get_float(),
        tokenizer.get_float(),
    )
}
