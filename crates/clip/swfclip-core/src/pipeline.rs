//! End-to-end conversion driver.

use log::{debug, info, warn};

use crate::config::Config;
use crate::display_list::{simulate, DisplayList};
use crate::document::Document;
use crate::error::{Anomaly, ConvertError};
use crate::export::{export_clip, ClipExport};
use crate::geometry::{plan_geometry, GeometryRequest};
use crate::object_index::ObjectIndex;
use crate::optimizer::OptimizeStats;
use crate::timeline::{build_timeline, Timeline};

/// Everything a conversion produced, kept for adapters and diagnostics.
#[derive(Clone, Debug)]
pub struct Conversion {
    pub display_list: DisplayList,
    pub objects: ObjectIndex,
    /// Optimized timeline.
    pub timeline: Timeline,
    pub clip: ClipExport,
    pub geometry: Vec<GeometryRequest>,
    pub anomalies: Vec<Anomaly>,
    pub stats: OptimizeStats,
}

/// Simulate, build curves, optimize and export a document.
pub fn convert(doc: &Document, cfg: &Config) -> Result<Conversion, ConvertError> {
    doc.meta.validate()?;
    info!(
        "<anim> converting '{}': {} frames at {} fps",
        doc.meta.alias, doc.meta.frame_count, doc.meta.frame_rate
    );

    let display_list = simulate(doc, cfg);
    for entry in display_list.occupants.sorted() {
        match entry.depth {
            Some(depth) => debug!("<swf> {} ends at {}", entry.occupant.nametag(), depth),
            None => debug!("<swf> {} ends off stage", entry.occupant.nametag()),
        }
    }
    let objects = ObjectIndex::build(&display_list.slots);
    let (mut timeline, timeline_anomalies) = build_timeline(&display_list, &objects, &doc.meta)?;

    let stats = timeline.optimize();
    info!(
        "<anim> optimized {} curves / {} keyframes into {} curves / {} keyframes",
        stats.curves_before, stats.keyframes_before, stats.curves_after, stats.keyframes_after
    );

    let clip = export_clip(&timeline, &objects, &doc.meta, cfg)?;
    let geometry = plan_geometry(&display_list.slots, cfg.geometry_mode);

    let mut anomalies = display_list.anomalies.clone();
    anomalies.extend(timeline_anomalies);
    if !anomalies.is_empty() {
        warn!("<anim> {} anomalies recovered during conversion", anomalies.len());
    }

    Ok(Conversion {
        display_list,
        objects,
        timeline,
        clip,
        geometry,
        anomalies,
        stats,
    })
}
