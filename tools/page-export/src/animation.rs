//! Animation converter (glTF -> .anim)
//!
//! Each skin joint targeted by the clip becomes an animated bone with one
//! frame per distinct keyframe time of its channels. Properties without a
//! channel hold the joint's rest value; properties keyed at other times
//! are interpolated the way their sampler says.

use anyhow::{Context, Result, bail};
use glam::{Mat4, Quat, Vec3};
use gltf::animation::{Interpolation, util::ReadOutputs};
use page_common::{Animation, AnimationBone, Frame};
use std::ops::{Add, Mul};
use std::path::Path;

use crate::skeleton::{JointNode, build_skeleton, select_skin};
use crate::write_asset;

// ============================================================================
// Keyframe curves
// ============================================================================

/// A value that can be keyframed
trait Keyed: Copy + Add<Output = Self> + Mul<f32, Output = Self> {
    fn interpolate(self, other: Self, t: f32) -> Self;

    fn normalized(self) -> Self {
        self
    }
}

impl Keyed for Vec3 {
    fn interpolate(self, other: Self, t: f32) -> Self {
        self.lerp(other, t)
    }
}

impl Keyed for Quat {
    fn interpolate(self, other: Self, t: f32) -> Self {
        self.slerp(other, t)
    }

    fn normalized(self) -> Self {
        self.normalize()
    }
}

/// One sampler's keyframes
#[derive(Debug, Clone)]
struct Curve<T> {
    times: Vec<f32>,
    /// For cubic splines: in-tangent, value, out-tangent per key
    values: Vec<T>,
    interpolation: Interpolation,
}

impl<T: Keyed> Curve<T> {
    fn new(times: Vec<f32>, values: Vec<T>, interpolation: Interpolation) -> Result<Self> {
        let per_key = match interpolation {
            Interpolation::CubicSpline => 3,
            _ => 1,
        };
        if times.is_empty() || values.len() != times.len() * per_key {
            bail!(
                "Sampler has {} keyframes but {} output values ({:?})",
                times.len(),
                values.len(),
                interpolation
            );
        }
        Ok(Self {
            times,
            values,
            interpolation,
        })
    }

    fn value(&self, key: usize) -> T {
        match self.interpolation {
            Interpolation::CubicSpline => self.values[key * 3 + 1],
            _ => self.values[key],
        }
    }

    /// Value at `time`, clamped to the first and last keys
    fn sample(&self, time: f32) -> T {
        let next = self.times.partition_point(|&k| k <= time);
        if next == 0 {
            return self.value(0);
        }
        if next == self.times.len() {
            return self.value(next - 1);
        }

        let (k0, k1) = (next - 1, next);
        let (t0, t1) = (self.times[k0], self.times[k1]);
        if time == t0 {
            return self.value(k0);
        }
        let dt = t1 - t0;
        let s = ((time - t0) / dt).clamp(0.0, 1.0);

        match self.interpolation {
            Interpolation::Step => self.value(k0),
            Interpolation::Linear => self.value(k0).interpolate(self.value(k1), s),
            Interpolation::CubicSpline => {
                let out_tangent = self.values[k0 * 3 + 2];
                let in_tangent = self.values[k1 * 3];
                let (s2, s3) = (s * s, s * s * s);
                let blended = self.value(k0) * (2.0 * s3 - 3.0 * s2 + 1.0)
                    + out_tangent * ((s3 - 2.0 * s2 + s) * dt)
                    + self.value(k1) * (-2.0 * s3 + 3.0 * s2)
                    + in_tangent * ((s3 - s2) * dt);
                blended.normalized()
            }
        }
    }
}

/// Curves of one joint; `None` where the clip leaves a property alone
#[derive(Debug, Default)]
struct JointCurves {
    translation: Option<Curve<Vec3>>,
    rotation: Option<Curve<Quat>>,
    scale: Option<Curve<Vec3>>,
}

impl JointCurves {
    fn is_empty(&self) -> bool {
        self.translation.is_none() && self.rotation.is_none() && self.scale.is_none()
    }

    /// Sorted, distinct keyframe times over all curves
    fn key_times(&self) -> Vec<f32> {
        let mut times: Vec<f32> = [
            self.translation.as_ref().map(|c| c.times.as_slice()),
            self.rotation.as_ref().map(|c| c.times.as_slice()),
            self.scale.as_ref().map(|c| c.times.as_slice()),
        ]
        .into_iter()
        .flatten()
        .flatten()
        .copied()
        .collect();
        times.sort_by(f32::total_cmp);
        times.dedup();
        times
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Pick an animation by index, or the first one
fn select_animation(
    document: &gltf::Document,
    index: Option<usize>,
) -> Result<gltf::Animation<'_>> {
    if let Some(idx) = index {
        document
            .animations()
            .nth(idx)
            .with_context(|| format!("Animation index {} not found in glTF", idx))
    } else {
        document
            .animations()
            .next()
            .context("No animations found in glTF file")
    }
}

/// Read every translation/rotation/scale channel targeting `node`
fn joint_curves(
    animation: &gltf::Animation,
    node: usize,
    buffers: &[gltf::buffer::Data],
) -> Result<JointCurves> {
    let mut curves = JointCurves::default();

    for channel in animation.channels() {
        if channel.target().node().index() != node {
            continue;
        }
        let interpolation = channel.sampler().interpolation();
        let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
        let times: Vec<f32> = reader
            .read_inputs()
            .context("Animation channel has no keyframe times")?
            .collect();
        let outputs = reader
            .read_outputs()
            .context("Animation channel has no output values")?;

        match outputs {
            ReadOutputs::Translations(iter) => {
                let values = iter.map(Vec3::from_array).collect();
                curves.translation = Some(Curve::new(times, values, interpolation)?);
            }
            ReadOutputs::Rotations(iter) => {
                let values = iter.into_f32().map(Quat::from_array).collect();
                curves.rotation = Some(Curve::new(times, values, interpolation)?);
            }
            ReadOutputs::Scales(iter) => {
                let values = iter.map(Vec3::from_array).collect();
                curves.scale = Some(Curve::new(times, values, interpolation)?);
            }
            ReadOutputs::MorphTargetWeights(_) => {
                tracing::debug!("Ignoring morph target weights channel on node {}", node);
            }
        }
    }

    Ok(curves)
}

/// Move a frame sampled in the joint node's space into the bone's space,
/// which also carries the nodes between the joint and its parent bone
fn in_bone_space(joint: &JointNode, frame: Frame) -> Frame {
    if joint.offset == Mat4::IDENTITY {
        return frame;
    }
    let local =
        Mat4::from_scale_rotation_translation(frame.scale, frame.orientation, frame.position);
    let (scale, orientation, position) = (joint.offset * local).to_scale_rotation_translation();
    Frame {
        time: frame.time,
        position,
        orientation,
        scale,
    }
}

/// Convert a glTF animation clip to an in-memory animation
///
/// Bones follow the order of the skin's skeleton; joints the clip never
/// targets are left out.
pub fn convert_gltf_animation_to_memory(
    input: &Path,
    animation_index: Option<usize>,
    skin_index: Option<usize>,
) -> Result<Animation> {
    let (document, buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    // Get the skin (needed for bone order)
    let skin = select_skin(&document, skin_index)?;
    let animation = select_animation(&document, animation_index)?;
    let (skeleton, joint_nodes) = build_skeleton(&document, &skin)?;
    let nodes: Vec<gltf::Node> = document.nodes().collect();

    let mut bones = Vec::new();
    for (bone, joint) in skeleton.bones.iter().zip(&joint_nodes) {
        let node = joint.index;
        let curves = joint_curves(&animation, node, &buffers)
            .with_context(|| format!("Failed to read channels of bone '{}'", bone.name))?;
        if curves.is_empty() {
            tracing::debug!("Bone '{}' is not animated", bone.name);
            continue;
        }

        let (t, r, s) = nodes[node].transform().decomposed();
        let rest_t = Vec3::from_array(t);
        let rest_r = Quat::from_array(r);
        let rest_s = Vec3::from_array(s);

        let frames = curves
            .key_times()
            .into_iter()
            .map(|time| {
                let frame = Frame {
                    time,
                    position: curves.translation.as_ref().map_or(rest_t, |c| c.sample(time)),
                    orientation: curves.rotation.as_ref().map_or(rest_r, |c| c.sample(time)),
                    scale: curves.scale.as_ref().map_or(rest_s, |c| c.sample(time)),
                };
                in_bone_space(joint, frame)
            })
            .collect();

        bones.push(AnimationBone {
            name: bone.name.clone(),
            frames,
        });
    }

    if bones.is_empty() {
        bail!(
            "Animation '{}' has no channels targeting joints of the skin",
            animation.name().unwrap_or("unnamed")
        );
    }

    Ok(Animation::new(bones))
}

/// Convert a glTF animation clip to a PAGEanim file
pub fn convert_gltf_animation(
    input: &Path,
    output: &Path,
    animation_index: Option<usize>,
    skin_index: Option<usize>,
) -> Result<Animation> {
    let animation = convert_gltf_animation_to_memory(input, animation_index, skin_index)?;

    write_asset(&animation, output)?;

    tracing::info!(
        "Exported animation: {} bones, {} frames ({:.2}s)",
        animation.bones.len(),
        animation.frame_count(),
        animation.duration
    );

    Ok(animation)
}

/// List available animations in a glTF file
pub fn list_animations(input: &Path) -> Result<()> {
    let (document, buffers, _images) =
        gltf::import(input).with_context(|| format!("Failed to load glTF: {:?}", input))?;

    let animations: Vec<_> = document.animations().collect();
    if animations.is_empty() {
        tracing::info!("No animations found in {:?}", input);
        return Ok(());
    }

    tracing::info!("Animations in {:?}:", input);
    for (i, anim) in animations.iter().enumerate() {
        let name = anim.name().unwrap_or("unnamed");
        let channel_count = anim.channels().count();

        // Calculate duration
        let max_time = anim
            .channels()
            .filter_map(|channel| {
                let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
                reader.read_inputs().and_then(|times| times.last())
            })
            .fold(0.0f32, f32::max);

        tracing::info!(
            "  [{}] '{}': {} channels, {:.2}s",
            i,
            name,
            channel_count,
            max_time
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(times: &[f32], values: &[f32]) -> Curve<Vec3> {
        Curve::new(
            times.to_vec(),
            values.iter().map(|&x| Vec3::new(x, 0.0, 0.0)).collect(),
            Interpolation::Linear,
        )
        .unwrap()
    }

    #[test]
    fn test_linear_sampling() {
        let curve = linear(&[0.0, 1.0, 3.0], &[0.0, 2.0, 6.0]);
        assert_eq!(curve.sample(1.0).x, 2.0);
        assert_eq!(curve.sample(0.5).x, 1.0);
        assert_eq!(curve.sample(2.0).x, 4.0);
        // Clamped outside the key range
        assert_eq!(curve.sample(-1.0).x, 0.0);
        assert_eq!(curve.sample(9.0).x, 6.0);
    }

    #[test]
    fn test_step_sampling() {
        let curve = Curve::new(
            vec![0.0, 1.0],
            vec![Vec3::ZERO, Vec3::ONE],
            Interpolation::Step,
        )
        .unwrap();
        assert_eq!(curve.sample(0.99), Vec3::ZERO);
        assert_eq!(curve.sample(1.0), Vec3::ONE);
    }

    #[test]
    fn test_cubic_spline_passes_through_keys() {
        // Zero tangents: keys are hit exactly and the midpoint is halfway
        let values = vec![
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::splat(2.0),
            Vec3::ZERO,
        ];
        let curve = Curve::new(vec![0.0, 1.0], values, Interpolation::CubicSpline).unwrap();
        assert_eq!(curve.sample(0.0), Vec3::ZERO);
        assert_eq!(curve.sample(1.0), Vec3::splat(2.0));
        assert!((curve.sample(0.5) - Vec3::ONE).length() < 1e-6);
    }

    #[test]
    fn test_rotation_slerp_stays_normalized() {
        let curve = Curve::new(
            vec![0.0, 1.0],
            vec![Quat::IDENTITY, Quat::from_rotation_y(1.5)],
            Interpolation::Linear,
        )
        .unwrap();
        let mid = curve.sample(0.5);
        assert!((mid.length() - 1.0).abs() < 1e-5);
        assert!(mid.abs_diff_eq(Quat::from_rotation_y(0.75), 1e-5), "{:?}", mid);
    }

    #[test]
    fn test_curve_rejects_mismatched_outputs() {
        assert!(Curve::new(vec![0.0, 1.0], vec![Vec3::ZERO], Interpolation::Linear).is_err());
        assert!(Curve::new(vec![0.0], vec![Vec3::ZERO], Interpolation::CubicSpline).is_err());
        assert!(Curve::<Vec3>::new(vec![], vec![], Interpolation::Linear).is_err());
    }

    #[test]
    fn test_frames_follow_intermediate_nodes() {
        let frame = Frame {
            time: 0.5,
            position: Vec3::new(1.0, 0.0, 0.0),
            orientation: Quat::IDENTITY,
            scale: Vec3::ONE,
        };

        let direct = JointNode {
            index: 3,
            offset: Mat4::IDENTITY,
        };
        assert_eq!(in_bone_space(&direct, frame), frame);

        // A helper node between the joints turns a quarter about Z and lifts
        let helper = JointNode {
            index: 3,
            offset: Mat4::from_rotation_translation(
                Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
                Vec3::new(0.0, 2.0, 0.0),
            ),
        };
        let moved = in_bone_space(&helper, frame);
        assert_eq!(moved.time, 0.5);
        assert!((moved.position - Vec3::new(0.0, 3.0, 0.0)).length() < 1e-5);
        assert!(
            moved
                .orientation
                .abs_diff_eq(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2), 1e-5)
        );
        assert!((moved.scale - Vec3::ONE).length() < 1e-5);
    }

    #[test]
    fn test_key_times_are_merged() {
        let curves = JointCurves {
            translation: Some(linear(&[0.0, 0.5, 1.0], &[0.0, 1.0, 2.0])),
            rotation: Some(
                Curve::new(
                    vec![0.0, 0.25, 1.0],
                    vec![Quat::IDENTITY; 3],
                    Interpolation::Linear,
                )
                .unwrap(),
            ),
            scale: None,
        };
        assert_eq!(curves.key_times(), vec![0.0, 0.25, 0.5, 1.0]);
    }
}
