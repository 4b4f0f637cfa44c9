//! WASM bindings for the Qubicle mesher.
//!
//! Provides JavaScript-accessible functions for meshing `.qb` files.

use wasm_bindgen::prelude::*;
use qb_mesher::{mesh_qb, MeshError, MeshOptions, VolumeMesh};

/// One meshed volume returned to JavaScript.
///
/// Contains vertex data ready for use with Three.js BufferGeometry.
#[wasm_bindgen]
pub struct QbMeshResult {
    name: String,
    position: [i32; 3],
    positions: Vec<f32>,
    indices: Vec<u32>,
    uvs: Vec<f32>,
    colors: Vec<f32>,
    material_ids: Vec<u32>,
    atlas_size: u32,
    quad_count: usize,
}

#[wasm_bindgen]
impl QbMeshResult {
    /// Volume name as stored in the file.
    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.name.clone()
    }

    /// Volume placement in model space (x, y, z).
    #[wasm_bindgen(getter)]
    pub fn position(&self) -> Vec<i32> {
        self.position.to_vec()
    }

    /// Get vertex positions (3 floats per vertex).
    #[wasm_bindgen(getter)]
    pub fn positions(&self) -> Vec<f32> {
        self.positions.clone()
    }

    /// Get triangle indices (two triangles per quad).
    #[wasm_bindgen(getter)]
    pub fn indices(&self) -> Vec<u32> {
        self.indices.clone()
    }

    /// Get atlas UV coordinates (2 floats per vertex).
    /// Returns empty array if UVs were not generated.
    #[wasm_bindgen(getter)]
    pub fn uvs(&self) -> Vec<f32> {
        self.uvs.clone()
    }

    /// Get per-vertex RGBA colors (4 floats per vertex).
    #[wasm_bindgen(getter)]
    pub fn colors(&self) -> Vec<f32> {
        self.colors.clone()
    }

    /// Get per-vertex material IDs.
    #[wasm_bindgen(getter)]
    pub fn material_ids(&self) -> Vec<u32> {
        self.material_ids.clone()
    }

    /// Atlas side length in texels, 0 without UVs.
    #[wasm_bindgen(getter)]
    pub fn atlas_size(&self) -> u32 {
        self.atlas_size
    }

    /// Number of quads (two triangles each).
    #[wasm_bindgen(getter)]
    pub fn quad_count(&self) -> usize {
        self.quad_count
    }

    /// Number of vertices in the mesh.
    #[wasm_bindgen(getter)]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Whether the mesh is empty (no geometry).
    #[wasm_bindgen(getter)]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl From<VolumeMesh> for QbMeshResult {
    fn from(volume: VolumeMesh) -> Self {
        let mesh = &volume.mesh;
        let colors = mesh.vertex_colors().into_iter().flatten().collect();
        // Materials are per quad; repeat them on every corner.
        let material_ids = mesh
            .material_ids()
            .into_iter()
            .flat_map(|m| std::iter::repeat(m).take(4))
            .collect();

        Self {
            name: volume.name,
            position: volume.position.to_array(),
            positions: mesh.positions_flat().to_vec(),
            indices: mesh.triangle_indices(),
            uvs: mesh.uvs_flat().to_vec(),
            colors,
            material_ids,
            atlas_size: mesh.atlas_size,
            quad_count: mesh.quad_count(),
        }
    }
}

fn mesh_results(bytes: &[u8], options: &MeshOptions) -> Result<Vec<QbMeshResult>, MeshError> {
    let meshes = mesh_qb(bytes, options)?;
    log(&format!("[wasm_qb_mesher] meshed {} volumes", meshes.len()));
    Ok(meshes.into_iter().map(QbMeshResult::from).collect())
}

/// Mesh every volume of a `.qb` file.
///
/// Returns an array of `QbMeshResult`, one per volume, or a single merged
/// result when `merge_volumes` is set.
///
/// # Example (JavaScript)
/// ```javascript
/// const bytes = new Uint8Array(await file.arrayBuffer());
/// for (const volume of mesh_qb_bytes(bytes, true, false)) {
///   geometry.setAttribute('position', new THREE.BufferAttribute(new Float32Array(volume.positions), 3));
/// }
/// ```
#[wasm_bindgen]
pub fn mesh_qb_bytes(bytes: &[u8], generate_uvs: bool, merge_volumes: bool) -> Result<js_sys::Array, JsValue> {
    log(&format!("[wasm_qb_mesher] mesh_qb_bytes len={}", bytes.len()));
    let options = MeshOptions {
        generate_uvs,
        merge_volumes,
        ..Default::default()
    };

    let results = mesh_results(bytes, &options).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let array = js_sys::Array::new();
    for result in results {
        array.push(&JsValue::from(result));
    }
    Ok(array)
}

// Logging support

thread_local! {
    static LOG_ENABLED: std::cell::Cell<bool> = std::cell::Cell::new(false);
}

/// Enable or disable console logging.
#[wasm_bindgen]
pub fn set_log_enabled(enabled: bool) {
    LOG_ENABLED.with(|flag| flag.set(enabled));
}

fn log(message: &str) {
    if LOG_ENABLED.with(|enabled| enabled.get()) {
        web_sys::console::log_1(&message.into());
    }
}

/// Get the version of the mesher library.
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
