//! `StaticObject` — the on-disk binary mesh format (§6: "Mesh binary: a
//! `StaticObject` serialized with header + positions + compressed
//! normals+tangents + texcoords + vertex colors (if present) + sorted
//! indices + bounding box").
//!
//! Grounded on the teacher's `resources/mesh.rs` vertex-attribute layout
//! (position / normal / tangent / uv / color streams) and `core/geometry.rs`
//! (bounding-box accumulation), generalised from a GPU vertex-buffer layout
//! into a compact on-disk format: the teacher keeps normals and tangents as
//! two separate `Vec3`s for direct GPU upload, this format instead packs
//! them into one quantized "QTangent" quaternion per vertex (GLOSSARY
//! "compact tangent frame"), the way the teacher's own compressed-normal
//! helper in `core/geometry.rs` quantizes per-vertex attributes to `i16`
//! snorm lanes for its own `Vertex` struct.

use std::io::{self, Read, Write};

use glam::{Mat3, Quat, Vec2, Vec3};

/// Lower bound enforced when biasing a tangent-frame quaternion's `w` away
/// from zero, so the encoded sign bit ([`CompressedTangentFrame`]) never
/// collides with an exactly-zero `w`.
const QTANGENT_BIAS: f32 = 1.0 / 32767.0;

/// A normal + tangent (+ implicit bitangent) basis packed into one
/// quantized quaternion, with handedness folded into the sign of `w`
/// (§4.7: "tangent sign is preserved").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressedTangentFrame {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub w: i16,
}

impl CompressedTangentFrame {
    /// Builds the orthonormal basis `(tangent, bitangent, normal)`,
    /// converts it to a quaternion, biases `w` away from zero, and folds
    /// `handedness` (`+1` or `-1`, the tangent-space bitangent sign) into
    /// the sign of the quantized `w` lane.
    #[must_use]
    pub fn encode(normal: Vec3, tangent: Vec3, handedness: f32) -> Self {
        let normal = normal.normalize_or_zero();
        let tangent = tangent.normalize_or_zero();
        let bitangent = normal.cross(tangent) * handedness.signum();

        let basis = Mat3::from_cols(tangent, bitangent, normal);
        let mut q = Quat::from_mat3(&basis);
        if q.w < 0.0 {
            q = -q;
        }
        if q.w < QTANGENT_BIAS {
            q = Quat::from_xyzw(q.x, q.y, q.z, QTANGENT_BIAS).normalize();
        }
        if handedness < 0.0 {
            q = -q;
        }

        Self {
            x: quantize(q.x),
            y: quantize(q.y),
            z: quantize(q.z),
            w: quantize(q.w),
        }
    }

    /// Recovers the approximate normal, tangent, and handedness sign.
    #[must_use]
    pub fn decode(self) -> (Vec3, Vec3, f32) {
        let q = Quat::from_xyzw(
            dequantize(self.x),
            dequantize(self.y),
            dequantize(self.z),
            dequantize(self.w),
        );
        let handedness = if q.w < 0.0 { -1.0 } else { 1.0 };
        let basis = Mat3::from_quat(q.normalize());
        (basis.z_axis, basis.x_axis, handedness)
    }

    pub fn write_to(self, w: &mut impl Write) -> io::Result<()> {
        w.write_all(&self.x.to_le_bytes())?;
        w.write_all(&self.y.to_le_bytes())?;
        w.write_all(&self.z.to_le_bytes())?;
        w.write_all(&self.w.to_le_bytes())
    }

    pub fn read_from(r: &mut impl Read) -> io::Result<Self> {
        let mut read_i16 = || -> io::Result<i16> {
            let mut b = [0u8; 2];
            r.read_exact(&mut b)?;
            Ok(i16::from_le_bytes(b))
        };
        Ok(Self { x: read_i16()?, y: read_i16()?, z: read_i16()?, w: read_i16()? })
    }
}

fn quantize(v: f32) -> i16 {
    (v.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

fn dequantize(v: i16) -> f32 {
    v as f32 / i16::MAX as f32
}

/// Per vertex-color slot usage flags (§4.7 step 2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VertexColorSlot {
    pub is_used: bool,
    pub has_alpha: bool,
}

/// Axis-aligned bounding box (§4.7 step 5).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn from_positions(positions: &[Vec3]) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for &p in positions {
            min = min.min(p);
            max = max.max(p);
        }
        if positions.is_empty() {
            min = Vec3::ZERO;
            max = Vec3::ZERO;
        }
        Self { min, max }
    }
}

/// The full on-disk mesh binary (§6).
#[derive(Debug, Clone, PartialEq)]
pub struct StaticObject {
    pub positions: Vec<Vec3>,
    pub tangent_frames: Vec<CompressedTangentFrame>,
    /// `(u, 1-v)` per §4.7 step 3.
    pub texcoords: Vec<Vec2>,
    /// Up to N slots, each with one RGBA8 color per vertex; empty if the
    /// source carried no vertex colors.
    pub vertex_colors: Vec<Vec<[u8; 4]>>,
    /// Triangle index triples, already sorted by the sum-of-indices
    /// heuristic (§4.7 step 4).
    pub indices: Vec<u32>,
    pub bounds: BoundingBox,
}

impl StaticObject {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn triangle_index_count(&self) -> usize {
        self.indices.len()
    }

    /// Sorts the triangle list by the sum of each triangle's three vertex
    /// indices (§4.7 step 4: "a coarse cache-reuse heuristic").
    pub fn sort_triangles_by_index_sum(indices: &mut Vec<u32>) {
        let mut triangles: Vec<[u32; 3]> = indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
        triangles.sort_by_key(|t| t[0] as u64 + t[1] as u64 + t[2] as u64);
        *indices = triangles.into_iter().flatten().collect();
    }

    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        w.write_all(&(self.vertex_count() as u32).to_le_bytes())?;
        w.write_all(&(self.triangle_index_count() as u32).to_le_bytes())?;
        w.write_all(&(self.vertex_colors.len() as u32).to_le_bytes())?;

        for p in &self.positions {
            for v in [p.x, p.y, p.z] {
                w.write_all(&v.to_le_bytes())?;
            }
        }
        for frame in &self.tangent_frames {
            frame.write_to(w)?;
        }
        for uv in &self.texcoords {
            w.write_all(&uv.x.to_le_bytes())?;
            w.write_all(&uv.y.to_le_bytes())?;
        }
        for slot in &self.vertex_colors {
            for color in slot {
                w.write_all(color)?;
            }
        }
        for &index in &self.indices {
            w.write_all(&index.to_le_bytes())?;
        }
        for v in [self.bounds.min.x, self.bounds.min.y, self.bounds.min.z, self.bounds.max.x, self.bounds.max.y, self.bounds.max.z] {
            w.write_all(&v.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn read_from(r: &mut impl Read) -> io::Result<Self> {
        let mut u32buf = [0u8; 4];
        let mut read_u32 = |r: &mut dyn Read| -> io::Result<u32> {
            r.read_exact(&mut u32buf)?;
            Ok(u32::from_le_bytes(u32buf))
        };
        let vertex_count = read_u32(r)? as usize;
        let index_count = read_u32(r)? as usize;
        let color_slot_count = read_u32(r)? as usize;

        let mut read_f32 = |r: &mut dyn Read| -> io::Result<f32> {
            let mut b = [0u8; 4];
            r.read_exact(&mut b)?;
            Ok(f32::from_le_bytes(b))
        };

        let mut positions = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            positions.push(Vec3::new(read_f32(r)?, read_f32(r)?, read_f32(r)?));
        }

        let mut tangent_frames = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            tangent_frames.push(CompressedTangentFrame::read_from(r)?);
        }

        let mut texcoords = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            texcoords.push(Vec2::new(read_f32(r)?, read_f32(r)?));
        }

        let mut vertex_colors = Vec::with_capacity(color_slot_count);
        for _ in 0..color_slot_count {
            let mut slot = Vec::with_capacity(vertex_count);
            for _ in 0..vertex_count {
                let mut color = [0u8; 4];
                r.read_exact(&mut color)?;
                slot.push(color);
            }
            vertex_colors.push(slot);
        }

        let mut indices = Vec::with_capacity(index_count);
        for _ in 0..index_count {
            indices.push(read_u32(r)?);
        }

        let min = Vec3::new(read_f32(r)?, read_f32(r)?, read_f32(r)?);
        let max = Vec3::new(read_f32(r)?, read_f32(r)?, read_f32(r)?);

        Ok(Self { positions, tangent_frames, texcoords, vertex_colors, indices, bounds: BoundingBox { min, max } })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tangent_frame_round_trips_normal_and_tangent_within_tolerance() {
        let normal = Vec3::new(0.0, 1.0, 0.0);
        let tangent = Vec3::new(1.0, 0.0, 0.0);
        let encoded = CompressedTangentFrame::encode(normal, tangent, 1.0);
        let (decoded_normal, decoded_tangent, handedness) = encoded.decode();
        assert!((decoded_normal - normal).length() < 0.01);
        assert!((decoded_tangent - tangent).length() < 0.01);
        assert_eq!(handedness, 1.0);
    }

    #[test]
    fn tangent_frame_preserves_negative_handedness() {
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let tangent = Vec3::new(1.0, 0.0, 0.0);
        let encoded = CompressedTangentFrame::encode(normal, tangent, -1.0);
        let (_, _, handedness) = encoded.decode();
        assert_eq!(handedness, -1.0);
    }

    #[test]
    fn triangle_sort_orders_by_index_sum() {
        let mut indices = vec![5, 6, 7, 0, 1, 2, 3, 1, 2];
        StaticObject::sort_triangles_by_index_sum(&mut indices);
        assert_eq!(indices, vec![0, 1, 2, 3, 1, 2, 5, 6, 7]);
    }

    #[test]
    fn bounding_box_covers_all_positions() {
        let bounds = BoundingBox::from_positions(&[Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, -5.0, 0.0)]);
        assert_eq!(bounds.min, Vec3::new(-1.0, -5.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 0.0, 2.0));
    }

    #[test]
    fn binary_round_trips() {
        let mesh = StaticObject {
            positions: vec![Vec3::ZERO, Vec3::ONE],
            tangent_frames: vec![
                CompressedTangentFrame::encode(Vec3::Y, Vec3::X, 1.0),
                CompressedTangentFrame::encode(Vec3::Y, Vec3::X, -1.0),
            ],
            texcoords: vec![Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0)],
            vertex_colors: vec![vec![[255, 0, 0, 255], [0, 255, 0, 128]]],
            indices: vec![0, 1, 0],
            bounds: BoundingBox { min: Vec3::ZERO, max: Vec3::ONE },
        };
        let mut bytes = Vec::new();
        mesh.write_to(&mut bytes).unwrap();
        let back = StaticObject::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(mesh, back);
    }
}
