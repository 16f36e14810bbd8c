//! Geometry, skin and clip data for the test rig.

/// Height of one strip row (and the bone spacing)
pub const ROW_HEIGHT: f32 = 1.0;

/// Skin joint order: children before parents, so the exporter has to sort
pub const JOINT_NAMES: [&str; 3] = ["Head", "Root", "Spine"];

/// Skin joint indices
const HEAD: u8 = 0;
const ROOT: u8 = 1;
const SPINE: u8 = 2;

/// A vertical strip: 4 rows of 2 vertices, 3 quads
pub(crate) struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub joints: Vec<[u8; 4]>,
    pub weights: Vec<[f32; 4]>,
    pub indices: Vec<u16>,
}

/// Keyframes of one animation channel
pub(crate) struct ChannelData {
    /// Node the channel targets
    pub node: u32,
    pub times: Vec<f32>,
    pub output: ChannelOutput,
    pub step: bool,
}

pub(crate) enum ChannelOutput {
    Translation(Vec<[f32; 3]>),
    Rotation(Vec<[f32; 4]>),
}

pub(crate) fn create_mesh_data() -> MeshData {
    let mut mesh = MeshData {
        positions: Vec::new(),
        normals: Vec::new(),
        uvs: Vec::new(),
        joints: Vec::new(),
        weights: Vec::new(),
        indices: Vec::new(),
    };

    // (joints, weights) per row, bottom to top
    let skinning = [
        ([ROOT, 0, 0, 0], [1.0, 0.0, 0.0, 0.0]),
        ([ROOT, SPINE, 0, 0], [0.5, 0.5, 0.0, 0.0]),
        ([SPINE, HEAD, 0, 0], [0.5, 0.5, 0.0, 0.0]),
        ([HEAD, 0, 0, 0], [1.0, 0.0, 0.0, 0.0]),
    ];

    for (row, (joints, weights)) in skinning.into_iter().enumerate() {
        let y = row as f32 * ROW_HEIGHT;
        for column in 0..2 {
            let x = column as f32;
            mesh.positions.push([x, y, 0.0]);
            mesh.normals.push([0.0, 0.0, 1.0]);
            mesh.uvs.push([x, 1.0 - row as f32 / 3.0]);
            mesh.joints.push(joints);
            mesh.weights.push(weights);
        }
    }

    for row in 0..3u16 {
        let i = row * 2;
        mesh.indices.extend_from_slice(&[i, i + 1, i + 3, i, i + 3, i + 2]);
    }

    mesh
}

/// The "Nod" clip: Spine rotates, Head bobs and snaps, Root is untouched
pub(crate) fn create_channels(spine_node: u32, head_node: u32) -> Vec<ChannelData> {
    let quarter_turn = std::f32::consts::FRAC_PI_4.sin();
    vec![
        ChannelData {
            node: spine_node,
            times: vec![0.0, 0.5, 1.0],
            output: ChannelOutput::Rotation(vec![
                [0.0, 0.0, 0.0, 1.0],
                [quarter_turn, 0.0, 0.0, quarter_turn],
                [0.0, 0.0, 0.0, 1.0],
            ]),
            step: false,
        },
        ChannelData {
            node: head_node,
            times: vec![0.0, 1.0],
            output: ChannelOutput::Translation(vec![[0.0, ROW_HEIGHT, 0.0], [0.0, 1.5, 0.0]]),
            step: false,
        },
        ChannelData {
            node: head_node,
            times: vec![0.0, 0.25],
            output: ChannelOutput::Rotation(vec![
                [0.0, 0.0, 0.0, 1.0],
                [0.0, quarter_turn, 0.0, quarter_turn],
            ]),
            step: true,
        },
    ]
}
