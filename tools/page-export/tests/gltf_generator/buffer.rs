//! Binary buffer packing for the test GLB.

use gltf_json as json;
use json::accessor::{ComponentType, GenericComponentType, Type};
use json::validation::Checked::Valid;

/// One GLB binary chunk plus the views and accessors describing it
#[derive(Default)]
pub(crate) struct BufferBuilder {
    pub data: Vec<u8>,
    pub views: Vec<json::buffer::View>,
    pub accessors: Vec<json::Accessor>,
}

impl BufferBuilder {
    /// Append `bytes` as a new view and return an accessor over it
    fn push(
        &mut self,
        bytes: &[u8],
        count: usize,
        component: ComponentType,
        type_: Type,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
    ) -> json::Index<json::Accessor> {
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        while self.data.len() % 4 != 0 {
            self.data.push(0);
        }

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: bytes.len().into(),
            byte_offset: Some(offset.into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: None,
        });

        let to_json =
            |v: Vec<f32>| json::Value::Array(v.into_iter().map(json::Value::from).collect());
        let (min, max) = match bounds {
            Some((min, max)) => (Some(to_json(min)), Some(to_json(max))),
            None => (None, None),
        };
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: count.into(),
            component_type: Valid(GenericComponentType(component)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min,
            max,
            name: None,
            normalized: false,
            sparse: None,
        });
        json::Index::new(self.accessors.len() as u32 - 1)
    }

    /// Float vectors of width `N`, with min/max bounds
    ///
    /// glTF requires bounds on positions and animation inputs; other float
    /// accessors may carry them too.
    pub fn push_f32<const N: usize>(
        &mut self,
        values: &[[f32; N]],
        type_: Type,
    ) -> json::Index<json::Accessor> {
        let mut min = vec![f32::INFINITY; N];
        let mut max = vec![f32::NEG_INFINITY; N];
        for element in values {
            for (i, &v) in element.iter().enumerate() {
                min[i] = min[i].min(v);
                max[i] = max[i].max(v);
            }
        }
        let floats = values.as_flattened();
        self.push(
            bytemuck::cast_slice(floats),
            values.len(),
            ComponentType::F32,
            type_,
            Some((min, max)),
        )
    }

    /// Keyframe times
    pub fn push_times(&mut self, times: &[f32]) -> json::Index<json::Accessor> {
        let scalars: Vec<[f32; 1]> = times.iter().map(|&t| [t]).collect();
        self.push_f32(&scalars, Type::Scalar)
    }

    pub fn push_joints(&mut self, joints: &[[u8; 4]]) -> json::Index<json::Accessor> {
        self.push(
            joints.as_flattened(),
            joints.len(),
            ComponentType::U8,
            Type::Vec4,
            None,
        )
    }

    pub fn push_indices(&mut self, indices: &[u16]) -> json::Index<json::Accessor> {
        self.push(
            bytemuck::cast_slice(indices),
            indices.len(),
            ComponentType::U16,
            Type::Scalar,
            None,
        )
    }
}
