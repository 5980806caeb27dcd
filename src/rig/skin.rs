//! Smooth skin: bind-pose mesh, per-vertex joint weights, and the
//! linear-blend deformation pass.

use glam::{Mat4, Vec3};
use log::{debug, warn};

use crate::errors::{MarrowError, Result};
use crate::io::Tokenizer;
use crate::rig::skeleton::Skeleton;

/// Upper bound on joint attachments per vertex. File data may declare more;
/// the loader keeps the first four and warns.
pub const MAX_ATTACHMENTS: usize = 4;

/// Per-vertex skinning data: up to [`MAX_ATTACHMENTS`] joint indices with
/// weights quantized to u8 (`w * 255`, rounded). Quantization bounds the
/// per-weight error to 1/255 and keeps the vertex record at 9 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkinVertex {
    pub joints: [u8; MAX_ATTACHMENTS],
    pub weights: [u8; MAX_ATTACHMENTS],
    pub count: u8,
}

impl SkinVertex {
    /// Weight of attachment slot `i` as a float in `[0, 1]`.
    #[inline]
    #[must_use]
    pub fn weight(&self, i: usize) -> f32 {
        f32::from(self.weights[i]) / 255.0
    }
}

/// A deformable mesh bound to a skeleton.
///
/// Holds the undeformed bind-pose buffers, the per-joint binding matrices,
/// and the output buffers the deformation pass writes into. The skinning
/// matrix for joint `i` is `W_i · B_i⁻¹` (world times inverse binding);
/// vertices are blended across their attachments with quantized weights.
#[derive(Debug, Clone, Default)]
pub struct Skin {
    // bind-pose inputs
    bind_positions: Vec<Vec3>,
    bind_normals: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    bindings: Vec<Mat4>,
    vertices: Vec<SkinVertex>,

    // per-frame outputs
    skinning_matrices: Vec<Mat4>,
    normal_matrices: Vec<Mat4>,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl Skin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.bind_positions.len()
    }

    #[inline]
    #[must_use]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Deformed positions from the last [`Skin::update`].
    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Deformed unit normals from the last [`Skin::update`].
    #[inline]
    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    #[inline]
    #[must_use]
    pub fn vertex(&self, index: usize) -> Option<&SkinVertex> {
        self.vertices.get(index)
    }

    #[inline]
    #[must_use]
    pub fn binding(&self, joint: usize) -> Option<&Mat4> {
        self.bindings.get(joint)
    }

    /// Recomputes the skinning matrices from the skeleton's current world
    /// matrices and deforms every vertex.
    ///
    /// With no skeleton the mesh passes through undeformed. A binding
    /// matrix that fails to invert (near-zero determinant) falls back to
    /// the world matrix alone, logged once per update.
    pub fn update(&mut self, skeleton: Option<&Skeleton>) {
        let Some(skeleton) = skeleton else {
            self.positions.clone_from(&self.bind_positions);
            self.normals.clone_from(&self.bind_normals);
            return;
        };

        self.skinning_matrices.clear();
        self.skinning_matrices.reserve(self.bindings.len());
        self.normal_matrices.clear();
        self.normal_matrices.reserve(self.bindings.len());
        for (i, binding) in self.bindings.iter().enumerate() {
            let world = skeleton.world_matrix(i);
            let skinning = if binding.determinant().abs() < f32::EPSILON {
                warn!("Skin::update - binding matrix {i} is singular, skipping inverse");
                world
            } else {
                world * binding.inverse()
            };
            // normals go through the per-joint inverse transpose; non-uniform
            // scale in a skinning matrix would otherwise shear them
            let normal = if skinning.determinant().abs() < f32::EPSILON {
                warn!("Skin::update - skinning matrix {i} is singular, skipping inverse");
                skinning
            } else {
                skinning.inverse().transpose()
            };
            self.skinning_matrices.push(skinning);
            self.normal_matrices.push(normal);
        }

        self.positions.resize(self.bind_positions.len(), Vec3::ZERO);
        self.normals.resize(self.bind_normals.len(), Vec3::ZERO);

        for (v, vertex) in self.vertices.iter().enumerate() {
            let mut position = Vec3::ZERO;
            let mut normal = Vec3::ZERO;
            for a in 0..vertex.count as usize {
                let joint = vertex.joints[a] as usize;
                let Some(matrix) = self.skinning_matrices.get(joint) else {
                    warn!("Skin::update - vertex {v} references missing joint {joint}");
                    continue;
                };
                let weight = vertex.weight(a);
                position += matrix.transform_point3(self.bind_positions[v]) * weight;
                normal += self.normal_matrices[joint].transform_vector3(self.bind_normals[v])
                    * weight;
            }

            self.positions[v] = position;
            self.normals[v] = normal.normalize_or_zero();
        }
    }

    /// Reads the `.skin` sections (positions, normals, skinweights,
    /// triangles, bindings) from the token stream. Sections may appear in
    /// any order; unknown sections are skipped line by line.
    pub fn load<T: Tokenizer>(tokenizer: &mut T) -> Result<Self> {
        let mut skin = Skin::new();

        while let Some(token) = tokenizer.get_token() {
            match token.as_str() {
                "positions" => skin.load_positions(tokenizer)?,
                "normals" => skin.load_normals(tokenizer)?,
                "skinweights" => skin.load_skinweights(tokenizer)?,
                "triangles" => skin.load_triangles(tokenizer)?,
                "bindings" => skin.load_bindings(tokenizer)?,
                _ => {
                    warn!("Skin::load - unrecognised section: {token}");
                    tokenizer.skip_line();
                }
            }
        }

        if skin.bind_positions.is_empty() {
            return Err(MarrowError::Load("skin has no positions".into()));
        }
        if skin.bind_normals.len() != skin.bind_positions.len() {
            warn!(
                "Skin::load - {} normals for {} positions",
                skin.bind_normals.len(),
                skin.bind_positions.len()
            );
            skin.bind_normals.resize(skin.bind_positions.len(), Vec3::Y);
        }
        if skin.vertices.len() != skin.bind_positions.len() {
            warn!(
                "Skin::load - {} skinweight records for {} positions",
                skin.vertices.len(),
                skin.bind_positions.len()
            );
            skin.vertices
                .resize(skin.bind_positions.len(), SkinVertex::default());
        }

        // start out at the bind pose
        skin.positions.clone_from(&skin.bind_positions);
        skin.normals.clone_from(&skin.bind_normals);

        debug!(
            "Skin::load - {} vertices, {} triangles, {} bindings",
            skin.bind_positions.len(),
            skin.triangles.len(),
            skin.bindings.len()
        );
        Ok(skin)
    }

    fn load_positions<T: Tokenizer>(&mut self, tokenizer: &mut T) -> Result<()> {
        let count = read_section_count(tokenizer, "positions")?;
        self.bind_positions.reserve(count);
        for _ in 0..count {
            self.bind_positions.push(Vec3::new(
                tokenizer.get_float(),
                tokenizer.get_float(),
                tokenizer.get_float(),
            ));
        }
        expect_close(tokenizer, "positions")
    }

    fn load_normals<T: Tokenizer>(&mut self, tokenizer: &mut T) -> Result<()> {
        let count = read_section_count(tokenizer, "normals")?;
        self.bind_normals.reserve(count);
        for _ in 0..count {
            self.bind_normals.push(
                Vec3::new(
                    tokenizer.get_float(),
                    tokenizer.get_float(),
                    tokenizer.get_float(),
                )
                .normalize_or_zero(),
            );
        }
        expect_close(tokenizer, "normals")
    }

    fn load_skinweights<T: Tokenizer>(&mut self, tokenizer: &mut T) -> Result<()> {
        let count = read_section_count(tokenizer, "skinweights")?;
        self.vertices.reserve(count);
        for v in 0..count {
            let mut vertex = SkinVertex::default();
            let attachments = tokenizer.get_int();
            if attachments < 0 {
                return Err(MarrowError::parse(format!(
                    "skinweights: vertex {v} declares {attachments} attachments"
                )));
            }
            let attachments = attachments as usize;
            if attachments > MAX_ATTACHMENTS {
                warn!(
                    "Skin::load - vertex {v} has {attachments} attachments, keeping first {MAX_ATTACHMENTS}"
                );
            }
            for a in 0..attachments {
                let joint = tokenizer.get_int();
                let weight = tokenizer.get_float();
                if a >= MAX_ATTACHMENTS {
                    continue;
                }
                vertex.joints[a] = joint.clamp(0, 255) as u8;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    vertex.weights[a] = (weight.clamp(0.0, 1.0) * 255.0).round() as u8;
                }
            }
            vertex.count = attachments.min(MAX_ATTACHMENTS) as u8;
            self.vertices.push(vertex);
        }
        expect_close(tokenizer, "skinweights")
    }

    fn load_triangles<T: Tokenizer>(&mut self, tokenizer: &mut T) -> Result<()> {
        let count = read_section_count(tokenizer, "triangles")?;
        self.triangles.reserve(count);
        for _ in 0..count {
            let a = tokenizer.get_int();
            let b = tokenizer.get_int();
            let c = tokenizer.get_int();
            if a < 0 || b < 0 || c < 0 {
                warn!("Skin::load - negative triangle index, dropping triangle");
                continue;
            }
            #[allow(clippy::cast_sign_loss)]
            self.triangles.push([a as u32, b as u32, c as u32]);
        }
        expect_close(tokenizer, "triangles")
    }

    /// Binding matrices arrive as 3×4 float blocks; each file row is one
    /// basis vector, so rows become matrix columns (a/b/c/d layout).
    fn load_bindings<T: Tokenizer>(&mut self, tokenizer: &mut T) -> Result<()> {
        let count = read_section_count(tokenizer, "bindings")?;
        self.bindings.reserve(count);
        for _ in 0..count {
            if !tokenizer.find_token("matrix") || !tokenizer.find_token("{") {
                return Err(MarrowError::parse("bindings: missing matrix block"));
            }
            let mut rows = [Vec3::ZERO; 4];
            for row in &mut rows {
                *row = Vec3::new(
                    tokenizer.get_float(),
                    tokenizer.get_float(),
                    tokenizer.get_float(),
                );
            }
            if !tokenizer.find_token("}") {
                return Err(MarrowError::parse("bindings: unterminated matrix block"));
            }
            self.bindings.push(Mat4::from_cols(
                rows[0].extend(0.0),
                rows[1].extend(0.0),
                rows[2].extend(0.0),
                rows[3].extend(1.0),
            ));
        }
        expect_close(tokenizer, "bindings")
    }
}

fn read_section_count<T: Tokenizer>(tokenizer: &mut T, section: &str) -> Result<usize> {
    let count = tokenizer.get_int();
    if count < 0 {
        return Err(MarrowError::parse(format!(
            "{section}: negative count {count}"
        )));
    }
    if !tokenizer.find_token("{") {
        return Err(MarrowError::parse(format!("{section}: missing '{{'")));
    }
    #[allow(clippy::cast_sign_loss)]
    Ok(count as usize)
}

fn expect_close<T: Tokenizer>(tokenizer: &mut T, section: &str) -> Result<()> {
    if tokenizer.find_token("}") {
        Ok(())
    } else {
        Err(MarrowError::parse(format!("{section}: missing '}}'")))
    }
}
