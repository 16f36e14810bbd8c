//! GLB container assembly.

use gltf_json as json;

const JSON_CHUNK: u32 = 0x4E4F534A;
const BIN_CHUNK: u32 = 0x004E4942;

/// Wrap a document and its binary buffer into a GLB file
pub(crate) fn assemble_glb(mut root: json::Root, buffer_data: &[u8]) -> Vec<u8> {
    root.buffers[0].byte_length = buffer_data.len().into();

    let json_string = json::serialize::to_string(&root).expect("Failed to serialize JSON");
    let json_bytes = json_string.as_bytes();

    // Chunks are padded to 4 bytes: JSON with spaces, BIN with zeros
    let json_padding = (4 - json_bytes.len() % 4) % 4;
    let bin_padding = (4 - buffer_data.len() % 4) % 4;
    let json_length = json_bytes.len() + json_padding;
    let bin_length = buffer_data.len() + bin_padding;
    let total_length = 12 + 8 + json_length + 8 + bin_length;

    let mut glb = Vec::with_capacity(total_length);
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&(total_length as u32).to_le_bytes());

    glb.extend_from_slice(&(json_length as u32).to_le_bytes());
    glb.extend_from_slice(&JSON_CHUNK.to_le_bytes());
    glb.extend_from_slice(json_bytes);
    glb.extend(std::iter::repeat_n(b' ', json_padding));

    glb.extend_from_slice(&(bin_length as u32).to_le_bytes());
    glb.extend_from_slice(&BIN_CHUNK.to_le_bytes());
    glb.extend_from_slice(buffer_data);
    glb.extend(std::iter::repeat_n(0u8, bin_padding));

    glb
}
