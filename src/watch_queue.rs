//! The process-wide watch correlator: gathers a watch's SEL, WWP, and WOU
//! components as they arrive in any order and emits the composite record
//! once all three are present.

use crate::parsers::Wwp;
use crate::vtec::VtecSegment;
use crate::watch::{Watch, WatchKind};
use chrono::{DateTime, Datelike, Utc};
use log::warn;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Keyed by `(phenomena, number)`. `findWatch` and `createWatch` are folded
/// into a single lookup-or-insert under the same lock so two component
/// products for the same watch can never race into creating two `Watch`es.
pub struct WatchQueue {
    watches: Mutex<HashMap<(WatchKind, u32), Watch>>,
}

impl Default for WatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchQueue {
    pub fn new() -> Self {
        WatchQueue {
            watches: Mutex::new(HashMap::new()),
        }
    }

    /// Attaches a SEL narrative to the watch, returning the completed
    /// `Watch` if this delivery was the one that completed it.
    pub async fn submit_sel(
        &self,
        kind: WatchKind,
        number: u32,
        issued: DateTime<Utc>,
        narrative: String,
    ) -> Option<Watch> {
        let mut watches = self.watches.lock().await;
        let watch = watches
            .entry((kind, number))
            .or_insert_with(|| Watch::new(kind, number, issued));
        watch.sel = Some(narrative);
        watch.is_complete().then(|| watch.clone())
    }

    /// Attaches a WWP probability/attribute record, returning the completed
    /// `Watch` if this delivery was the one that completed it.
    pub async fn submit_wwp(&self, issued: DateTime<Utc>, wwp: Wwp) -> Option<Watch> {
        let kind = WatchKind::from_code(&wwp.phenomena)?;
        let number = wwp.number;
        let mut watches = self.watches.lock().await;
        let watch = watches
            .entry((kind, number))
            .or_insert_with(|| Watch::new(kind, number, issued));
        watch.wwp = Some(wwp);
        watch.is_complete().then(|| watch.clone())
    }

    /// Attaches a WOU's geographic VTEC segments, returning the completed
    /// `Watch` if this delivery was the one that completed it.
    pub async fn submit_wou(
        &self,
        kind: WatchKind,
        number: u32,
        issued: DateTime<Utc>,
        text: String,
        segments: Vec<VtecSegment>,
    ) -> Option<Watch> {
        if segments.is_empty() {
            warn!(
                "WOU for {}A{:04}{} carried no VTEC segments",
                kind.code(),
                number,
                issued.year()
            );
        }
        let mut watches = self.watches.lock().await;
        let watch = watches
            .entry((kind, number))
            .or_insert_with(|| Watch::new(kind, number, issued));
        watch.wou = Some(text);
        watch.segments = segments;
        watch.is_complete().then(|| watch.clone())
    }
}
