//! CPU geometry and scene decoding.
//!
//! [`RawGeometry`] is the intermediate representation every mesh passes
//! through before GPU upload. The decoders in this module turn glTF/GLB and
//! STL data into [`SceneNode`] trees, preserving node names so the
//! choreography can find sub-nodes later.
//!
//! | Format   | Extensions      | Notes                                   |
//! |----------|-----------------|-----------------------------------------|
//! | glTF     | `.gltf`, `.glb` | Node hierarchy, names, base colours      |
//! | STL      | `.stl`          | Single node named after the file stem    |

use std::io::{Read, Seek};
use std::path::Path;

use glam::Vec3;
use gltf::mesh::util::ReadIndices;

use crate::error::AssetError;
use crate::mesh::Vertex3d;
use crate::scene_graph::{NodeMesh, SceneNode, Transform};

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";
const DEFAULT_COLOR: [f32; 4] = [0.8, 0.8, 0.8, 1.0];

/// Raw geometry data before GPU upload.
#[derive(Clone, Debug, Default)]
pub struct RawGeometry {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Axis-aligned bounds as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Append another geometry, rebasing its indices.
    pub fn append(&mut self, other: RawGeometry) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.indices.extend(other.indices.into_iter().map(|i| i + base));
    }

    /// A flat disc in the XY plane facing +Z, built as a triangle fan.
    pub fn disc(radius: f32, segments: u32) -> Self {
        let segments = segments.max(3);
        let normal = [0.0, 0.0, 1.0];
        let mut vertices = Vec::with_capacity(segments as usize + 1);
        vertices.push(Vertex3d::new([0.0, 0.0, 0.0], normal, [0.5, 0.5]));
        for i in 0..segments {
            let theta = i as f32 / segments as f32 * std::f32::consts::TAU;
            let (s, c) = theta.sin_cos();
            vertices.push(Vertex3d::new(
                [c * radius, s * radius, 0.0],
                normal,
                [0.5 + c * 0.5, 0.5 - s * 0.5],
            ));
        }
        let mut indices = Vec::with_capacity(segments as usize * 3);
        for i in 0..segments {
            let a = 1 + i;
            let b = 1 + (i + 1) % segments;
            indices.extend_from_slice(&[0, a, b]);
        }
        Self { vertices, indices }
    }

    /// Recompute smooth normals by accumulating area-weighted face normals.
    pub fn recalculate_normals(&mut self) {
        for v in &mut self.vertices {
            v.normal = [0.0; 3];
        }
        for tri in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p0 = Vec3::from(self.vertices[i0].position);
            let p1 = Vec3::from(self.vertices[i1].position);
            let p2 = Vec3::from(self.vertices[i2].position);
            let face = (p1 - p0).cross(p2 - p0);
            for i in [i0, i1, i2] {
                let n = Vec3::from(self.vertices[i].normal) + face;
                self.vertices[i].normal = n.into();
            }
        }
        for v in &mut self.vertices {
            v.normal = Vec3::from(v.normal).normalize_or_zero().into();
        }
    }
}

/// Decode a scene from a file, picking the format from its extension.
pub fn load_scene_file(path: &Path) -> Result<SceneNode, AssetError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("asset")
        .to_string();

    match ext.as_str() {
        "gltf" | "glb" => {
            let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let (doc, buffers) = import_gltf(&bytes, path.parent())?;
            scene_from_gltf(&name, &doc, &buffers)
        }
        "stl" => {
            let file = std::fs::File::open(path).map_err(|source| AssetError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let mut reader = std::io::BufReader::new(file);
            let geometry = parse_stl(&mut reader)?;
            Ok(SceneNode::new(name).with_mesh(NodeMesh::new(geometry, DEFAULT_COLOR)))
        }
        _ => Err(AssetError::UnknownFormat(ext)),
    }
}

/// Decode a GLB (or embedded glTF) document from bytes.
pub fn load_scene_gltf_bytes(name: &str, bytes: &[u8]) -> Result<SceneNode, AssetError> {
    let (doc, buffers) = import_gltf(bytes, None)?;
    scene_from_gltf(name, &doc, &buffers)
}

/// Parse a glTF/GLB document and load its buffers, resolving external URIs
/// against `base`.
///
/// Required extensions are checked before validation, which would otherwise
/// reject Draco as a generic unsupported extension.
fn import_gltf(
    bytes: &[u8],
    base: Option<&Path>,
) -> Result<(gltf::Document, Vec<gltf::buffer::Data>), AssetError> {
    let unchecked = gltf::Gltf::from_slice_without_validation(bytes)?;
    if unchecked
        .extensions_required()
        .any(|ext| ext == DRACO_EXTENSION)
    {
        return Err(AssetError::UnsupportedCompression(DRACO_EXTENSION.to_string()));
    }

    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, base, blob)?;
    Ok((document, buffers))
}

/// Decode an STL mesh from bytes into a single node.
pub fn load_scene_stl_bytes(name: &str, bytes: &[u8]) -> Result<SceneNode, AssetError> {
    let mut cursor = std::io::Cursor::new(bytes);
    let geometry = parse_stl(&mut cursor)?;
    Ok(SceneNode::new(name).with_mesh(NodeMesh::new(geometry, DEFAULT_COLOR)))
}

fn parse_stl<R: Read + Seek>(reader: &mut R) -> Result<RawGeometry, AssetError> {
    let stl =
        stl_io::read_stl(reader).map_err(|e| AssetError::Parse(format!("STL: {e}")))?;

    let mut vertices = Vec::with_capacity(stl.faces.len() * 3);
    let mut indices = Vec::with_capacity(stl.faces.len() * 3);
    for (i, face) in stl.faces.iter().enumerate() {
        let normal: [f32; 3] = face.normal.into();
        for &vertex_idx in &face.vertices {
            let position: [f32; 3] = stl.vertices[vertex_idx].into();
            vertices.push(Vertex3d::new(position, normal, [0.0, 0.0]));
        }
        let base = (i * 3) as u32;
        indices.extend_from_slice(&[base, base + 1, base + 2]);
    }
    Ok(RawGeometry::new(vertices, indices))
}

fn scene_from_gltf(
    name: &str,
    doc: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<SceneNode, AssetError> {
    let scene = doc
        .default_scene()
        .or_else(|| doc.scenes().next())
        .ok_or(AssetError::MissingScene)?;

    let mut root = SceneNode::new(name);
    for node in scene.nodes() {
        root.children.push(node_from_gltf(&node, buffers)?);
    }
    Ok(root)
}

fn node_from_gltf(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
) -> Result<SceneNode, AssetError> {
    let (t, r, s) = node.transform().decomposed();
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node{}", node.index()));
    let mut out = SceneNode::new(name).with_transform(Transform::from_decomposed(t, r, s));

    if let Some(mesh) = node.mesh() {
        let mut geometry = RawGeometry::default();
        let mut color = None;
        for prim in mesh.primitives() {
            let reader = prim.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals: Vec<[f32; 3]> = match reader.read_normals() {
                Some(it) => it.collect(),
                None => vec![[0.0, 1.0, 0.0]; positions.len()],
            };
            let uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
                Some(it) => it.into_f32().collect(),
                None => vec![[0.0, 0.0]; positions.len()],
            };
            let indices: Vec<u32> = match reader.read_indices() {
                Some(ReadIndices::U8(it)) => it.map(u32::from).collect(),
                Some(ReadIndices::U16(it)) => it.map(u32::from).collect(),
                Some(ReadIndices::U32(it)) => it.collect(),
                None => (0..positions.len() as u32).collect(),
            };
            let vertices = positions
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    Vertex3d::new(
                        *p,
                        normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                        uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                    )
                })
                .collect();
            geometry.append(RawGeometry::new(vertices, indices));
            color.get_or_insert(prim.material().pbr_metallic_roughness().base_color_factor());
        }
        if !geometry.is_empty() {
            out.mesh = Some(NodeMesh::new(geometry, color.unwrap_or(DEFAULT_COLOR)));
        }
    }

    for child in node.children() {
        out.children.push(node_from_gltf(&child, buffers)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disc_is_a_closed_fan() {
        let disc = RawGeometry::disc(5.0, 64);
        assert_eq!(disc.vertices.len(), 65);
        assert_eq!(disc.indices.len(), 64 * 3);
        let (min, max) = disc.bounds();
        assert!((max.x - 5.0).abs() < 1e-4);
        assert!((min.y + 5.0).abs() < 1e-3);
        assert_eq!(*disc.indices.last().unwrap(), 1);
    }

    #[test]
    fn append_rebases_indices() {
        let mut a = RawGeometry::disc(1.0, 3);
        let b = RawGeometry::disc(1.0, 3);
        a.append(b);
        assert_eq!(a.vertices.len(), 8);
        assert_eq!(a.indices[9], 4);
    }

    #[test]
    fn recalculated_normals_face_the_viewer() {
        let mut disc = RawGeometry::disc(1.0, 8);
        disc.recalculate_normals();
        for v in &disc.vertices {
            assert!((v.normal[2] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_scene_file(Path::new("room.fbx")).unwrap_err();
        assert!(matches!(err, AssetError::UnknownFormat(ext) if ext == "fbx"));
    }

    #[test]
    fn invalid_glb_bytes_fail_to_import() {
        let err = load_scene_gltf_bytes("cube", b"not a glb").unwrap_err();
        assert!(matches!(err, AssetError::Gltf(_)));
    }

    #[test]
    fn draco_compressed_documents_are_rejected_by_name() {
        let json = br#"{
            "asset": { "version": "2.0" },
            "extensionsUsed": ["KHR_draco_mesh_compression"],
            "extensionsRequired": ["KHR_draco_mesh_compression"],
            "scenes": [{ "nodes": [] }],
            "scene": 0
        }"#;
        let err = load_scene_gltf_bytes("room", json).unwrap_err();
        assert!(
            matches!(&err, AssetError::UnsupportedCompression(ext) if ext == DRACO_EXTENSION),
            "{err:?}"
        );
    }

    #[test]
    fn document_without_scenes_is_missing_a_scene() {
        let err = load_scene_gltf_bytes("empty", br#"{"asset":{"version":"2.0"}}"#).unwrap_err();
        assert!(matches!(err, AssetError::MissingScene), "{err:?}");
    }

    #[test]
    fn plain_document_loads_its_named_nodes() {
        let json = br#"{
            "asset": { "version": "2.0" },
            "nodes": [{ "name": "mailbox", "translation": [0.0, 1.0, 0.0] }],
            "scenes": [{ "nodes": [0] }],
            "scene": 0
        }"#;
        let root = load_scene_gltf_bytes("room", json).unwrap();
        assert_eq!(root.name, "room");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "mailbox");
        assert_eq!(root.children[0].transform.position, Vec3::new(0.0, 1.0, 0.0));
    }
}
