//! Curve timeline: groups transform records into per-object, per-channel curves.

use hashbrown::HashMap;
use log::error;

use crate::curve::{Channel, Curve, KeyValue, Keyframe};
use crate::display_list::{DisplayList, TransformRecord};
use crate::document::DocumentMeta;
use crate::error::{Anomaly, ConvertError};
use crate::ids::ObjectId;
use crate::object_index::ObjectIndex;
use crate::optimizer::{optimize_curves, OptimizeStats};

#[derive(Clone, Debug)]
pub struct Timeline {
    pub frame_rate: f64,
    pub frame_count: u32,
    curves: Vec<Curve>,
    index: HashMap<(ObjectId, Channel), usize>,
}

impl Timeline {
    pub fn new(meta: &DocumentMeta) -> Self {
        Self {
            frame_rate: meta.frame_rate,
            frame_count: meta.frame_count,
            curves: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Curve for `(object, channel)`, created on first use.
    pub fn ensure_curve(&mut self, object: ObjectId, channel: Channel) -> &mut Curve {
        let curves = &mut self.curves;
        let i = *self.index.entry((object, channel)).or_insert_with(|| {
            curves.push(Curve::new(object, channel));
            curves.len() - 1
        });
        &mut self.curves[i]
    }

    /// Add a keyframe to an existing curve.
    pub fn add_curve_keyframe(
        &mut self,
        object: ObjectId,
        keyframe: Keyframe,
    ) -> Result<(), ConvertError> {
        let channel = keyframe.value.channel();
        let i = *self
            .index
            .get(&(object, channel))
            .ok_or(ConvertError::MissingCurveTarget { object, channel })?;
        self.curves[i].insert(keyframe);
        Ok(())
    }

    pub fn curve(&self, object: ObjectId, channel: Channel) -> Option<&Curve> {
        self.index.get(&(object, channel)).map(|&i| &self.curves[i])
    }

    /// Curves in creation order.
    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    pub fn keyframe_count(&self) -> usize {
        self.curves.iter().map(Curve::len).sum()
    }

    pub fn start_time(&self) -> f64 {
        0.0
    }

    pub fn stop_time(&self) -> f64 {
        (self.frame_count as f64 - 1.0) / self.frame_rate
    }

    /// Optimize every curve in place of the current set.
    pub fn optimize(&mut self) -> OptimizeStats {
        let (curves, stats) = optimize_curves(std::mem::take(&mut self.curves));
        self.index = curves
            .iter()
            .enumerate()
            .map(|(i, c)| ((c.object, c.channel), i))
            .collect();
        self.curves = curves;
        stats
    }
}

/// Derive keyframes for every record. Unresolvable slots abort the build;
/// keyframes that cannot be routed are logged and dropped.
pub fn build_timeline(
    display_list: &DisplayList,
    objects: &ObjectIndex,
    meta: &DocumentMeta,
) -> Result<(Timeline, Vec<Anomaly>), ConvertError> {
    let mut timeline = Timeline::new(meta);
    let mut anomalies = Vec::new();

    for record in &display_list.records {
        let object = objects.resolve(record.slot)?;
        let time = meta.time_of(record.frame);
        let mut values = record_values(record, meta.unit_divisor);

        if object.needs_variant_curve() {
            let variant = record.occupant.and_then(|occupant| {
                display_list
                    .slots
                    .get(record.slot)
                    .and_then(|slot| slot.variant_of(occupant))
            });
            if let Some(index) = variant {
                values.push(KeyValue::VariantIndex {
                    index: index as u32,
                });
            }
        }

        for value in values {
            timeline.ensure_curve(object.id, value.channel());
            let keyframe = Keyframe::new(record.frame, time, value);
            if let Err(err) = timeline.add_curve_keyframe(object.id, keyframe) {
                error!("<anim> {err}; keyframe discarded");
                anomalies.push(Anomaly::new(record.frame, &err));
            }
        }
    }
    Ok((timeline, anomalies))
}

fn record_values(record: &TransformRecord, unit_divisor: f64) -> Vec<KeyValue> {
    let mut values = Vec::with_capacity(5);
    if let Some(m) = &record.matrix {
        let (x, y) = m.translation(unit_divisor);
        // engine y axis points up; `0.0 - y` keeps a zero offset positive
        values.push(KeyValue::Position { x, y: 0.0 - y });
        let (sx, sy) = m.scale();
        values.push(KeyValue::Scale { x: sx, y: sy });
        values.push(KeyValue::Rotation {
            degrees: m.rotation_degrees(),
        });
    }
    values.push(KeyValue::Active {
        active: record.occupant.is_some(),
    });
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::Affine;
    use crate::config::Config;
    use crate::display_list::simulate;
    use crate::document::{Document, Edit, Occupant};
    use crate::ids::{OccupantId, SlotId};

    fn sprite(id: u16) -> Occupant {
        Occupant::Sprite {
            id: OccupantId(id),
            frame_count: 1,
            matrix: None,
        }
    }

    fn build(meta: DocumentMeta, edits: Vec<Edit>) -> (Timeline, ObjectIndex) {
        let dl = simulate(&Document::new(meta.clone(), edits), &Config::default());
        let objects = ObjectIndex::build(&dl.slots);
        let (timeline, anomalies) = build_timeline(&dl, &objects, &meta).unwrap();
        assert!(anomalies.is_empty());
        (timeline, objects)
    }

    #[test]
    fn matrix_records_feed_geometry_channels() {
        let meta = DocumentMeta::new(10.0, 2);
        let (timeline, objects) = build(
            meta,
            vec![
                Edit::define(sprite(1)),
                Edit::place(0, 1, Some(Affine::new(0.0, 2.0, -2.0, 0.0, 20.0, 40.0))),
            ],
        );
        let obj = objects.resolve(SlotId(0)).unwrap().id;
        let pos = timeline.curve(obj, Channel::Position).unwrap();
        assert_eq!(
            pos.keyframes[0].value,
            KeyValue::Position {
                x: 20.0 * 0.05,
                y: -(40.0 * 0.05)
            }
        );
        let scale = timeline.curve(obj, Channel::Scale).unwrap();
        assert_eq!(scale.keyframes[0].value, KeyValue::Scale { x: 2.0, y: 2.0 });
        let rot = timeline.curve(obj, Channel::Rotation).unwrap();
        assert_eq!(rot.keyframes[0].value, KeyValue::Rotation { degrees: -90.0 });
        assert!(timeline.curve(obj, Channel::VariantIndex).is_none());
        assert_eq!(timeline.curves().len(), 4);
    }

    #[test]
    fn vacate_and_place_share_a_frame() {
        let meta = DocumentMeta::new(10.0, 12);
        let mut edits = vec![
            Edit::define(sprite(1)),
            Edit::define(sprite(2)),
            Edit::place(0, 1, None),
        ];
        edits.extend(std::iter::repeat(Edit::AdvanceFrame).take(10));
        edits.push(Edit::place(0, 2, None));
        let (timeline, objects) = build(meta, edits);
        let obj = objects.resolve(SlotId(0)).unwrap().id;

        // the place record overwrites the vacate at frame 10
        let active = timeline.curve(obj, Channel::Active).unwrap();
        let values: Vec<(u32, KeyValue)> =
            active.keyframes.iter().map(|k| (k.frame, k.value)).collect();
        assert_eq!(
            values,
            vec![
                (0, KeyValue::Active { active: true }),
                (10, KeyValue::Active { active: true }),
            ]
        );
        let variant = timeline.curve(obj, Channel::VariantIndex).unwrap();
        assert_eq!(variant.keyframes[1].time, 1.0);
        assert_eq!(
            variant.keyframes[1].value,
            KeyValue::VariantIndex { index: 1 }
        );
    }

    #[test]
    fn unrouted_keyframe_reports_missing_curve() {
        let mut timeline = Timeline::new(&DocumentMeta::new(24.0, 1));
        let err = timeline
            .add_curve_keyframe(
                ObjectId(3),
                Keyframe::new(0, 0.0, KeyValue::Active { active: true }),
            )
            .unwrap_err();
        assert_eq!(
            err,
            ConvertError::MissingCurveTarget {
                object: ObjectId(3),
                channel: Channel::Active
            }
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn zero_vertical_offset_is_not_negative() {
        let meta = DocumentMeta::new(10.0, 1);
        let (timeline, objects) = build(
            meta,
            vec![
                Edit::define(sprite(1)),
                Edit::place(0, 1, Some(Affine::translate(10.0, 0.0))),
            ],
        );
        let obj = objects.resolve(SlotId(0)).unwrap().id;
        let pos = timeline.curve(obj, Channel::Position).unwrap();
        match pos.keyframes[0].value {
            KeyValue::Position { y, .. } => assert!(y.is_sign_positive()),
            other => panic!("unexpected value {other:?}"),
        }
        let json = serde_json::to_string(&pos.keyframes[0].value).unwrap();
        assert_eq!(json, r#"{"x":0.5,"y":0.0}"#);
    }

    #[test]
    fn clip_bounds_follow_frame_count() {
        let timeline = Timeline::new(&DocumentMeta::new(24.0, 49));
        assert_eq!(timeline.start_time(), 0.0);
        assert_eq!(timeline.stop_time(), 2.0);
    }

    #[test]
    fn optimize_rebuilds_lookup() {
        let meta = DocumentMeta::new(10.0, 3);
        let (mut timeline, objects) = build(
            meta,
            vec![
                Edit::define(sprite(1)),
                Edit::place(0, 1, None),
                Edit::AdvanceFrame,
                Edit::modify(0, Affine::translate(10.0, 0.0)),
            ],
        );
        let obj = objects.resolve(SlotId(0)).unwrap().id;
        let stats = timeline.optimize();
        assert_eq!(stats.curves_before, 4);
        // scale, rotation and active are constant defaults
        assert_eq!(stats.curves_after, 1);
        assert_eq!(timeline.curve(obj, Channel::Position).unwrap().len(), 2);
        assert!(timeline.curve(obj, Channel::Active).is_none());
    }
}
