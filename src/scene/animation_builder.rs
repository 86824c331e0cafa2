//! Animation Builder (§4.8 "Animation", generic fallback path only — the
//! FBX back-end is explicitly out of scope, §1: "all third-party codecs
//! are opaque libraries behind thin adapters", and this crate only speaks
//! glTF).
//!
//! Grounded on the teacher's (deleted) runtime animation mixer's keyframe
//! track shape — `{time, value}` pairs per channel — generalised into the
//! `CopyRaw` boundary-guarantee algorithm §4.8 specifies: every track must
//! start at `ratio=0` and end at `ratio=1` regardless of what the source
//! actually sampled.

use crate::skeleton::Skeleton;

/// One keyframe, time already normalized to `ratio = time / duration`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Key<T> {
    pub ratio: f32,
    pub value: T,
}

/// A source channel's raw, un-padded keyframes plus the joint name it
/// targets (matched against the skeleton by name equality, §4.8).
pub struct SourceChannel<T> {
    pub joint_name: String,
    pub keys: Vec<(f32, T)>,
}

/// Applies the `CopyRaw` boundary guarantees (§4.8) to one channel's keys,
/// given the animation's total `duration` (seconds) and an `identity`
/// value to synthesize missing endpoint keys from.
#[must_use]
pub fn copy_raw<T: Copy>(keys: &[(f32, T)], duration: f32, identity: T) -> Vec<Key<T>> {
    if keys.is_empty() {
        return vec![Key { ratio: 0.0, value: identity }, Key { ratio: 1.0, value: identity }];
    }
    if keys.len() == 1 {
        return vec![Key { ratio: 0.0, value: keys[0].1 }, Key { ratio: 1.0, value: keys[0].1 }];
    }

    let duration = duration.max(f32::EPSILON);
    let mut out: Vec<Key<T>> = Vec::with_capacity(keys.len() + 2);

    if keys[0].0 > 0.0 {
        out.push(Key { ratio: 0.0, value: keys[0].1 });
    }
    for &(time, value) in keys {
        out.push(Key { ratio: (time / duration).clamp(0.0, 1.0), value });
    }
    if keys.last().unwrap().0 < duration {
        out.push(Key { ratio: 1.0, value: keys.last().unwrap().1 });
    }
    out
}

/// One joint's padded animation track, ready to be laid out SoA-wide
/// (§4.8: "Pad joint count to the next multiple of four").
pub struct JointTrack<T> {
    pub translation: Vec<Key<T>>,
}

/// Builds one track per skeleton joint, matching each by name against the
/// source channels; joints with no matching channel get identity keys at
/// `t=0`/`t=1` (§4.8: "Missing joints get identity keys"). Track count is
/// padded to the next multiple of four by appending identity-only tracks.
pub fn build_padded_tracks<T: Copy>(
    skeleton: &Skeleton,
    channels: &[SourceChannel<T>],
    duration: f32,
    identity: T,
) -> Vec<Vec<Key<T>>> {
    let mut tracks: Vec<Vec<Key<T>>> = skeleton
        .joint_names
        .iter()
        .map(|name| {
            channels
                .iter()
                .find(|c| &c.joint_name == name)
                .map(|c| copy_raw(&c.keys, duration, identity))
                .unwrap_or_else(|| vec![Key { ratio: 0.0, value: identity }, Key { ratio: 1.0, value: identity }])
        })
        .collect();

    let padded_len = tracks.len().div_ceil(4) * 4;
    while tracks.len() < padded_len {
        tracks.push(vec![Key { ratio: 0.0, value: identity }, Key { ratio: 1.0, value: identity }]);
    }
    tracks
}

/// One flattened key ready for the final sort (§4.8: "sort keys primarily
/// by previous-key-time, secondarily by track index").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortableKey {
    pub previous_key_time: f32,
    pub track_index: usize,
    pub ratio: f32,
}

/// Sorts a flattened key list by `(previous_key_time, track_index)`
/// (§4.8 final step).
pub fn sort_keys(mut keys: Vec<SortableKey>) -> Vec<SortableKey> {
    keys.sort_by(|a, b| {
        a.previous_key_time
            .partial_cmp(&b.previous_key_time)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.track_index.cmp(&b.track_index))
    });
    keys
}

/// Returns whether a foreign animation's first channel's bone name matches
/// one of `skeleton`'s joint names (§4.6 dedup key: "Skeleton: ... matched
/// against remaining animations by comparing each animation's first
/// channel's bone name to the skeleton's joint names").
#[must_use]
pub fn matches_skeleton(first_channel_joint_name: &str, skeleton: &Skeleton) -> bool {
    skeleton.joint_index(first_channel_joint_name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_keys_yields_identity_boundaries() {
        let keys = copy_raw::<f32>(&[], 1.0, 0.0);
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].ratio, 0.0);
        assert_eq!(keys[1].ratio, 1.0);
    }

    #[test]
    fn single_key_is_held_across_full_range() {
        let keys = copy_raw(&[(0.5, 7.0)], 1.0, 0.0);
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].value, 7.0);
        assert_eq!(keys[1].value, 7.0);
    }

    #[test]
    fn multi_key_boundaries_are_zero_and_one() {
        let keys = copy_raw(&[(0.2, 1.0), (0.8, 2.0)], 1.0, 0.0);
        assert_eq!(keys.first().unwrap().ratio, 0.0);
        assert_eq!(keys.last().unwrap().ratio, 1.0);
    }

    #[test]
    fn track_count_pads_to_multiple_of_four() {
        let skeleton = Skeleton::build(
            vec!["a".into(), "b".into(), "c".into()],
            vec![-1, 0, 1],
            &[crate::hierarchy::LocalTransform::IDENTITY; 3],
            Vec::new(),
        );
        let tracks = build_padded_tracks::<f32>(&skeleton, &[], 1.0, 0.0);
        assert_eq!(tracks.len(), 4);
    }

    #[test]
    fn sort_orders_by_previous_key_time_then_track_index() {
        let keys = vec![
            SortableKey { previous_key_time: 0.5, track_index: 0, ratio: 0.5 },
            SortableKey { previous_key_time: 0.0, track_index: 1, ratio: 0.0 },
            SortableKey { previous_key_time: 0.0, track_index: 0, ratio: 0.0 },
        ];
        let sorted = sort_keys(keys);
        assert_eq!(sorted[0].track_index, 0);
        assert_eq!(sorted[1].track_index, 1);
        assert_eq!(sorted[2].previous_key_time, 0.5);
    }
}
