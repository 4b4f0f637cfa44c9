#![cfg(target_arch = "wasm32")]

use wasm_bindgen_test::*;
use wasm_qb_mesher::mesh_qb_bytes;

fn single_voxel_file() -> Vec<u8> {
    let mut bytes = Vec::new();
    for word in [0x0101_0000u32, 0, 0, 0, 0, 1] {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    bytes.push(1);
    bytes.push(b'v');
    for word in [1u32, 1, 1, 0, 0, 0, 0x00FF_0000] {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    bytes
}

#[wasm_bindgen_test]
fn meshes_uncompressed_file() {
    let array = mesh_qb_bytes(&single_voxel_file(), true, false).unwrap();
    assert_eq!(array.length(), 1);
    assert!(array.get(0).is_object());
}

#[wasm_bindgen_test]
fn garbage_is_rejected() {
    let err = mesh_qb_bytes(&[1, 2, 3], true, false).unwrap_err();
    assert!(err.as_string().unwrap().contains("header"));
}
