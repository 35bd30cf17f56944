//! Curve minimization.
//!
//! Each curve is optimized on its own, in four passes that each produce a new
//! keyframe list:
//!
//! 1. Active curves that start with an activation after time 0 get an
//!    inactive keyframe at time 0. A curve that starts with a deactivation
//!    gets no head keyframe. The asymmetry is kept for output compatibility
//!    with existing clips.
//! 2. Interior members of runs of three or more equal values are removed.
//!    The first and last keyframe of a run stay so interpolation boundaries
//!    are preserved.
//! 3. Two equal keyframes collapse to the first.
//! 4. A single keyframe holding the channel default drops the whole curve.

use serde::Serialize;

use crate::curve::{Channel, Curve, KeyValue, Keyframe};

/// Curve and keyframe totals around an optimization run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OptimizeStats {
    pub curves_before: usize,
    pub keyframes_before: usize,
    pub curves_after: usize,
    pub keyframes_after: usize,
}

/// Optimize one curve. `None` means the curve contributes nothing and is dropped.
pub fn optimize_curve(curve: Curve) -> Option<Curve> {
    let Curve {
        object,
        channel,
        keyframes,
    } = curve;
    if keyframes.is_empty() {
        return None;
    }
    let keyframes = insert_default_head(channel, keyframes);
    let keyframes = compress_plateaus(keyframes);
    let keyframes = collapse_pair(keyframes);
    prune_singleton(keyframes).map(|keyframes| Curve {
        object,
        channel,
        keyframes,
    })
}

/// Optimize every curve, dropping the ones that vanish.
pub fn optimize_curves(curves: Vec<Curve>) -> (Vec<Curve>, OptimizeStats) {
    let mut stats = OptimizeStats {
        curves_before: curves.len(),
        keyframes_before: curves.iter().map(Curve::len).sum(),
        ..OptimizeStats::default()
    };
    let optimized: Vec<Curve> = curves.into_iter().filter_map(optimize_curve).collect();
    stats.curves_after = optimized.len();
    stats.keyframes_after = optimized.iter().map(Curve::len).sum();
    (optimized, stats)
}

fn insert_default_head(channel: Channel, keyframes: Vec<Keyframe>) -> Vec<Keyframe> {
    if channel != Channel::Active {
        return keyframes;
    }
    match keyframes.first() {
        Some(first)
            if first.frame > 0 && first.value == (KeyValue::Active { active: true }) =>
        {
            let head = Keyframe::new(0, 0.0, KeyValue::Active { active: false });
            std::iter::once(head).chain(keyframes).collect()
        }
        _ => keyframes,
    }
}

fn compress_plateaus(keyframes: Vec<Keyframe>) -> Vec<Keyframe> {
    let n = keyframes.len();
    keyframes
        .iter()
        .enumerate()
        .filter(|&(i, k)| {
            let interior = i > 0 && i + 1 < n;
            !(interior && k.equals(&keyframes[i - 1]) && keyframes[i + 1].equals(k))
        })
        .map(|(_, k)| *k)
        .collect()
}

fn collapse_pair(mut keyframes: Vec<Keyframe>) -> Vec<Keyframe> {
    if keyframes.len() == 2 && keyframes[0].equals(&keyframes[1]) {
        keyframes.truncate(1);
    }
    keyframes
}

fn prune_singleton(keyframes: Vec<Keyframe>) -> Option<Vec<Keyframe>> {
    match keyframes.len() {
        0 => None,
        1 if keyframes[0].value.is_default() => None,
        _ => Some(keyframes),
    }
}
