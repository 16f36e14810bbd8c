//! glTF JSON for the test rig.

use super::buffer::BufferBuilder;
use super::rig_data::{ChannelOutput, ROW_HEIGHT, create_channels, create_mesh_data};
use gltf_json as json;
use json::accessor::Type;
use json::validation::Checked::Valid;

// Node indices
const ARMATURE_NODE: u32 = 0;
const ROOT_NODE: u32 = 1;
const SPINE_NODE: u32 = 2;
const HEAD_NODE: u32 = 3;
const MESH_NODE: u32 = 4;

fn node(name: &str, translation: [f32; 3], children: &[u32]) -> json::Node {
    json::Node {
        camera: None,
        children: (!children.is_empty())
            .then(|| children.iter().map(|&c| json::Index::new(c)).collect()),
        extensions: Default::default(),
        extras: Default::default(),
        matrix: None,
        mesh: None,
        name: Some(name.to_string()),
        rotation: None,
        scale: None,
        translation: Some(translation),
        skin: None,
        weights: None,
    }
}

/// Build the document and its binary buffer
pub(crate) fn build_document() -> (json::Root, Vec<u8>) {
    let mut buffer = BufferBuilder::default();

    // Mesh
    let mesh_data = create_mesh_data();
    let positions = buffer.push_f32(&mesh_data.positions, Type::Vec3);
    let normals = buffer.push_f32(&mesh_data.normals, Type::Vec3);
    let uvs = buffer.push_f32(&mesh_data.uvs, Type::Vec2);
    let joints = buffer.push_joints(&mesh_data.joints);
    let weights = buffer.push_f32(&mesh_data.weights, Type::Vec4);
    let indices = buffer.push_indices(&mesh_data.indices);

    let mut attributes = std::collections::BTreeMap::new();
    attributes.insert(Valid(json::mesh::Semantic::Positions), positions);
    attributes.insert(Valid(json::mesh::Semantic::Normals), normals);
    attributes.insert(Valid(json::mesh::Semantic::TexCoords(0)), uvs);
    attributes.insert(Valid(json::mesh::Semantic::Joints(0)), joints);
    attributes.insert(Valid(json::mesh::Semantic::Weights(0)), weights);

    let meshes = vec![json::Mesh {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("Strip".to_string()),
        primitives: vec![json::mesh::Primitive {
            attributes,
            extensions: Default::default(),
            extras: Default::default(),
            indices: Some(indices),
            material: None,
            mode: Valid(json::mesh::Mode::Triangles),
            targets: None,
        }],
        weights: None,
    }];

    // Nodes: a non-joint armature above the bone chain, then the mesh
    let mut mesh_node = node("StripMesh", [0.0; 3], &[]);
    mesh_node.translation = None;
    mesh_node.mesh = Some(json::Index::new(0));
    mesh_node.skin = Some(json::Index::new(0));
    let nodes = vec![
        node("Armature", [5.0, 0.0, 0.0], &[ROOT_NODE]),
        node("Root", [0.0, 0.0, 0.0], &[SPINE_NODE]),
        node("Spine", [0.0, ROW_HEIGHT, 0.0], &[HEAD_NODE]),
        node("Head", [0.0, ROW_HEIGHT, 0.0], &[]),
        mesh_node,
    ];

    let skins = vec![json::Skin {
        extensions: Default::default(),
        extras: Default::default(),
        inverse_bind_matrices: None,
        joints: vec![
            json::Index::new(HEAD_NODE),
            json::Index::new(ROOT_NODE),
            json::Index::new(SPINE_NODE),
        ],
        name: Some("Rig".to_string()),
        skeleton: Some(json::Index::new(ROOT_NODE)),
    }];

    // Animation
    let mut samplers = Vec::new();
    let mut channels = Vec::new();
    for channel in create_channels(SPINE_NODE, HEAD_NODE) {
        let input = buffer.push_times(&channel.times);
        let (output, path) = match &channel.output {
            ChannelOutput::Translation(values) => (
                buffer.push_f32(values, Type::Vec3),
                json::animation::Property::Translation,
            ),
            ChannelOutput::Rotation(values) => (
                buffer.push_f32(values, Type::Vec4),
                json::animation::Property::Rotation,
            ),
        };
        let interpolation = if channel.step {
            json::animation::Interpolation::Step
        } else {
            json::animation::Interpolation::Linear
        };

        samplers.push(json::animation::Sampler {
            input,
            interpolation: Valid(interpolation),
            output,
            extensions: Default::default(),
            extras: Default::default(),
        });
        channels.push(json::animation::Channel {
            sampler: json::Index::new(samplers.len() as u32 - 1),
            target: json::animation::Target {
                node: json::Index::new(channel.node),
                path: Valid(path),
                extensions: Default::default(),
                extras: Default::default(),
            },
            extensions: Default::default(),
            extras: Default::default(),
        });
    }

    let animations = vec![json::Animation {
        channels,
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("Nod".to_string()),
        samplers,
    }];

    let scenes = vec![json::Scene {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some("Scene".to_string()),
        nodes: vec![json::Index::new(ARMATURE_NODE), json::Index::new(MESH_NODE)],
    }];

    // Byte length is set by assemble_glb
    let buffers = vec![json::Buffer {
        byte_length: 0u64.into(),
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        uri: None,
    }];

    let root = json::Root {
        accessors: buffer.accessors,
        animations,
        asset: json::Asset {
            copyright: None,
            extensions: Default::default(),
            extras: Default::default(),
            generator: Some("page-export-test".to_string()),
            min_version: None,
            version: "2.0".to_string(),
        },
        buffers,
        buffer_views: buffer.views,
        cameras: Vec::new(),
        extensions: Default::default(),
        extras: Default::default(),
        extensions_required: Vec::new(),
        extensions_used: Vec::new(),
        images: Vec::new(),
        materials: Vec::new(),
        meshes,
        nodes,
        samplers: Vec::new(),
        scene: Some(json::Index::new(0)),
        scenes,
        skins,
        textures: Vec::new(),
    };

    (root, buffer.data)
}
