//! Export adapter: maps optimized curves onto the clip output contract and
//! into the target engine's clip template.
//!
//! No decisions are made here; curves are translated structurally. A
//! template lacking the expected sections is a configuration error.

use log::info;
use serde::Serialize;
use serde_json::{json, Map, Value as JsonValue};

use crate::config::{Config, PropertyBinding};
use crate::curve::{Channel, KeyValue};
use crate::document::DocumentMeta;
use crate::error::ConvertError;
use crate::object_index::ObjectIndex;
use crate::timeline::Timeline;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipMeta {
    pub name: String,
    pub sample_rate: f64,
    pub start_time: f64,
    pub stop_time: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportedKey {
    pub time: f64,
    pub value: KeyValue,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedCurve {
    pub object_path: String,
    pub channel: Channel,
    pub keyframes: Vec<ExportedKey>,
    /// Property descriptor for Active / Variant-Index curves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<PropertyBinding>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClipExport {
    pub meta: ClipMeta,
    pub curves: Vec<ExportedCurve>,
}

/// Build the output contract from an optimized timeline.
pub fn export_clip(
    timeline: &Timeline,
    objects: &ObjectIndex,
    meta: &DocumentMeta,
    cfg: &Config,
) -> Result<ClipExport, ConvertError> {
    let clip_meta = ClipMeta {
        name: cfg.clip_name.clone().unwrap_or_else(|| meta.alias.clone()),
        sample_rate: timeline.frame_rate,
        start_time: timeline.start_time(),
        stop_time: timeline.stop_time(),
    };

    let mut curves = Vec::with_capacity(timeline.curves().len());
    for curve in timeline.curves() {
        let object = objects
            .get(curve.object)
            .ok_or(ConvertError::UnknownObject(curve.object))?;
        let binding = match curve.channel {
            Channel::Active => Some(cfg.active_binding.clone()),
            Channel::VariantIndex => Some(cfg.variant_binding.clone()),
            _ => None,
        };
        curves.push(ExportedCurve {
            object_path: object.path.clone(),
            channel: curve.channel,
            keyframes: curve
                .keyframes
                .iter()
                .map(|k| ExportedKey {
                    time: k.time,
                    value: k.value,
                })
                .collect(),
            binding,
        });
    }
    Ok(ClipExport {
        meta: clip_meta,
        curves,
    })
}

/// Export the clip as serde_json::Value (stable schema for serialization).
pub fn export_clip_json(clip: &ClipExport) -> JsonValue {
    serde_json::to_value(clip).unwrap_or(JsonValue::Null)
}

const CURVE_SECTIONS: [&str; 5] = [
    "m_EditorCurves",
    "m_PositionCurves",
    "m_ScaleCurves",
    "m_EulerCurves",
    "m_FloatCurves",
];

fn section_for(channel: Channel) -> &'static str {
    match channel {
        Channel::Position => "m_PositionCurves",
        Channel::Scale => "m_ScaleCurves",
        Channel::Rotation => "m_EulerCurves",
        Channel::Active | Channel::VariantIndex => "m_FloatCurves",
    }
}

/// Fill the `AnimationClip` section of a clip template with `clip`.
pub fn apply_template(clip: &ClipExport, mut template: JsonValue) -> Result<JsonValue, ConvertError> {
    let anim = template
        .get_mut("AnimationClip")
        .and_then(JsonValue::as_object_mut)
        .ok_or_else(|| ConvertError::Template("missing 'AnimationClip' section".into()))?;

    anim.insert("m_Name".into(), json!(clip.meta.name));
    anim.insert("m_SampleRate".into(), json!(clip.meta.sample_rate));
    let settings = anim
        .get_mut("m_AnimationClipSettings")
        .and_then(JsonValue::as_object_mut)
        .ok_or_else(|| ConvertError::Template("missing 'm_AnimationClipSettings' section".into()))?;
    settings.insert("m_StartTime".into(), json!(clip.meta.start_time));
    settings.insert("m_StopTime".into(), json!(clip.meta.stop_time));
    info!(
        "<anim> writing header m_Name: {}, m_SampleRate: {}, m_StartTime: {}, m_StopTime: {}",
        clip.meta.name, clip.meta.sample_rate, clip.meta.start_time, clip.meta.stop_time
    );

    let mut sections: Map<String, JsonValue> = CURVE_SECTIONS
        .iter()
        .map(|s| (s.to_string(), JsonValue::Array(Vec::new())))
        .collect();
    for curve in &clip.curves {
        if let Some(JsonValue::Array(list)) = sections.get_mut(section_for(curve.channel)) {
            list.push(curve_dump(curve));
        }
    }
    anim.extend(sections);
    Ok(template)
}

fn curve_dump(curve: &ExportedCurve) -> JsonValue {
    let keys: Vec<JsonValue> = curve
        .keyframes
        .iter()
        .map(|k| key_dump(curve.channel, k))
        .collect();
    let mut dump = json!({
        "curve": {
            "serializedVersion": 2,
            "m_PreInfinity": 2,
            "m_PostInfinity": 2,
            "m_RotationOrder": 4,
            "m_Curve": keys,
        },
        "path": curve.object_path,
    });
    if let (Some(binding), Some(obj)) = (&curve.binding, dump.as_object_mut()) {
        obj.insert("attribute".into(), json!(binding.attribute));
        obj.insert("classID".into(), json!(binding.class_id));
        obj.insert(
            "script".into(),
            binding.script.clone().unwrap_or_else(|| json!({ "fileID": 0 })),
        );
    }
    dump
}

fn key_dump(channel: Channel, key: &ExportedKey) -> JsonValue {
    if channel.is_stepped() {
        return json!({
            "serializedVersion": 2,
            "time": key.time,
            "value": key.value.scalar().unwrap_or(0.0),
            "inSlope": "Infinity",
            "outSlope": "Infinity",
            "tangentMode": 103,
        });
    }
    let (x, y, z) = match key.value {
        KeyValue::Position { x, y } | KeyValue::Scale { x, y } => (x, y, 0.0),
        KeyValue::Rotation { degrees } => (0.0, 0.0, degrees),
        _ => (0.0, 0.0, 0.0),
    };
    json!({
        "serializedVersion": 2,
        "time": key.time,
        "value": { "x": x, "y": y, "z": z },
        "inSlope": { "x": 0, "y": 0, "z": 0 },
        "outSlope": { "x": 0, "y": 0, "z": 0 },
        "tangentMode": 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> ClipExport {
        ClipExport {
            meta: ClipMeta {
                name: "walk".into(),
                sample_rate: 24.0,
                start_time: 0.0,
                stop_time: 0.5,
            },
            curves: vec![
                ExportedCurve {
                    object_path: "tail".into(),
                    channel: Channel::Rotation,
                    keyframes: vec![ExportedKey {
                        time: 0.0,
                        value: KeyValue::Rotation { degrees: 45.0 },
                    }],
                    binding: None,
                },
                ExportedCurve {
                    object_path: "tail".into(),
                    channel: Channel::Active,
                    keyframes: vec![
                        ExportedKey {
                            time: 0.0,
                            value: KeyValue::Active { active: false },
                        },
                        ExportedKey {
                            time: 0.25,
                            value: KeyValue::Active { active: true },
                        },
                    ],
                    binding: Some(PropertyBinding::active()),
                },
            ],
        }
    }

    fn template() -> JsonValue {
        json!({
            "AnimationClip": {
                "m_Name": "template",
                "m_SampleRate": 60,
                "m_AnimationClipSettings": { "m_StartTime": 0, "m_StopTime": 1 },
                "m_PositionCurves": [ { "stale": true } ],
            }
        })
    }

    #[test]
    fn template_gets_header_and_curve_sections() {
        let out = apply_template(&clip(), template()).unwrap();
        let anim = &out["AnimationClip"];
        assert_eq!(anim["m_Name"], json!("walk"));
        assert_eq!(anim["m_SampleRate"], json!(24.0));
        assert_eq!(anim["m_AnimationClipSettings"]["m_StopTime"], json!(0.5));
        assert_eq!(anim["m_PositionCurves"], json!([]));
        assert_eq!(anim["m_EditorCurves"], json!([]));

        let euler = &anim["m_EulerCurves"][0];
        assert_eq!(euler["path"], json!("tail"));
        assert_eq!(euler["curve"]["m_Curve"][0]["value"]["z"], json!(45.0));
        assert!(euler.get("attribute").is_none());

        let float = &anim["m_FloatCurves"][0];
        assert_eq!(float["attribute"], json!("m_IsActive"));
        assert_eq!(float["classID"], json!(1));
        assert_eq!(float["script"], json!({ "fileID": 0 }));
        let keys = float["curve"]["m_Curve"].as_array().unwrap();
        assert_eq!(keys[1]["value"], json!(1.0));
        assert_eq!(keys[1]["tangentMode"], json!(103));
        assert_eq!(keys[1]["inSlope"], json!("Infinity"));
    }

    #[test]
    fn missing_sections_are_configuration_errors() {
        let err = apply_template(&clip(), json!({ "Other": {} })).unwrap_err();
        assert!(matches!(err, ConvertError::Template(_)));
        assert!(err.is_fatal());
        let err = apply_template(&clip(), json!({ "AnimationClip": {} })).unwrap_err();
        assert!(matches!(err, ConvertError::Template(_)));
    }

    #[test]
    fn output_contract_json_shape() {
        let value = export_clip_json(&clip());
        assert_eq!(value["meta"]["sampleRate"], json!(24.0));
        assert_eq!(value["curves"][1]["objectPath"], json!("tail"));
        assert_eq!(value["curves"][1]["channel"], json!("active"));
        assert_eq!(value["curves"][1]["keyframes"][1]["value"], json!({ "active": true }));
        assert!(value["curves"][0].get("binding").is_none());
    }
}
