//! Merges incoming [`VtecSegment`]s into their parent [`VtecProduct`] and the
//! per-UGC edges that track which zones were under an event when.

use crate::error::VtecError;
use crate::geo::Geometry;
use crate::parsers::ZoneKind;
use crate::vtec::VtecSegment;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The persisted parent event a key's segments accumulate into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VtecProduct {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// The end time observed on the segment that created this parent. Frozen
    /// at creation; never updated afterward, even as `end` moves later.
    pub end_initial: DateTime<Utc>,
    pub issued: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub event_number: u32,
    pub action: String,
    pub phenomena: String,
    pub significance: char,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Geometry>,
    pub wfo: String,
    pub children: u32,
}

/// State carried on a `vtec_ugc` edge from a parent event to a single zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UgcEdge {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub issued: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub action: String,
}

/// Storage collaborator the aggregator needs. Implementations back this with
/// whatever graph/relational store is in use; the aggregator only needs
/// lookup-or-create and upsert semantics.
#[async_trait::async_trait]
pub trait VtecStore {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn get_vtec_product(&self, id: &str) -> Result<Option<VtecProduct>, Self::Error>;
    async fn create_vtec_product(&self, product: &VtecProduct) -> Result<(), Self::Error>;
    async fn update_vtec_product(&self, product: &VtecProduct) -> Result<(), Self::Error>;
    async fn create_segment(&self, segment: &VtecSegment) -> Result<(), Self::Error>;
    async fn relate_text_product_segment(
        &self,
        product_id: &str,
        segment_id: &str,
    ) -> Result<(), Self::Error>;
    async fn relate_vtec_product_segment(
        &self,
        parent_id: &str,
        segment_id: &str,
    ) -> Result<(), Self::Error>;
    async fn get_ugc_edge(&self, parent_id: &str, ugc_id: &str) -> Result<Option<UgcEdge>, Self::Error>;
    async fn put_ugc_edge(
        &self,
        parent_id: &str,
        ugc_id: &str,
        edge: &UgcEdge,
    ) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum AggregatorError<E> {
    #[error(transparent)]
    Vtec(#[from] VtecError),
    #[error("store error: {0}")]
    Store(E),
}

fn zone_kind_char(kind: ZoneKind) -> char {
    match kind {
        ZoneKind::County => 'C',
        ZoneKind::Zone => 'Z',
    }
}

/// Merges one segment into its parent event, per the merge protocol: lookup
/// or create, verify consistency, assign the segment's id, apply the
/// monotone and latest-wins field merges, persist the segment and its
/// edges, and upsert every UGC edge the segment touches.
///
/// Returns the parent's post-merge state. On a consistency mismatch, the
/// segment is not persisted and the parent is left untouched.
pub async fn merge_segment<S: VtecStore>(
    store: &S,
    product_id: &str,
    mut segment: VtecSegment,
) -> Result<VtecProduct, AggregatorError<S::Error>> {
    let key = format!(
        "{}{}{}{:04}{}",
        segment.wfo,
        segment.phenomena,
        segment.significance,
        segment.event_number,
        segment.issued.year(),
    );

    let existing = store
        .get_vtec_product(&key)
        .await
        .map_err(AggregatorError::Store)?;

    // 000000T0000Z sentinel: start inherits from the parent (or, on first
    // creation, from this segment's issuance); end inherits from the UGC
    // expiry.
    let start = segment
        .start
        .unwrap_or_else(|| existing.as_ref().map(|p| p.start).unwrap_or(segment.issued));
    let end = segment.end.unwrap_or(segment.expires);
    segment.start = Some(start);
    segment.end = Some(end);

    let is_new = existing.is_none();
    let mut parent = match existing {
        Some(parent) => parent,
        None => VtecProduct {
            id: key.clone(),
            start,
            end,
            end_initial: end,
            issued: segment.issued,
            expires: segment.expires,
            event_number: segment.event_number,
            action: segment.action.clone(),
            phenomena: segment.phenomena.clone(),
            significance: segment.significance,
            polygon: segment.polygon.clone(),
            wfo: segment.wfo.clone(),
            children: 0,
        },
    };

    if parent.wfo != segment.wfo {
        return Err(VtecError::WfoMismatch {
            event_id: key,
            parent: parent.wfo,
            segment: segment.wfo,
        }
        .into());
    }
    if parent.event_number != segment.event_number {
        return Err(VtecError::EtnMismatch {
            event_id: key,
            parent: parent.event_number,
            segment: segment.event_number,
        }
        .into());
    }
    if parent.phenomena != segment.phenomena {
        return Err(VtecError::PhenomenaMismatch {
            event_id: key,
            parent: parent.phenomena,
            segment: segment.phenomena,
        }
        .into());
    }
    if parent.significance != segment.significance {
        return Err(VtecError::SignificanceMismatch {
            event_id: key,
            parent: parent.significance.to_string(),
            segment: segment.significance.to_string(),
        }
        .into());
    }

    segment.id = Some(format!("{}{}", parent.id, parent.children));
    parent.children += 1;

    parent.start = parent.start.min(start);
    parent.issued = parent.issued.min(segment.issued);
    parent.end = parent.end.max(end);
    parent.expires = parent.expires.max(segment.expires);
    parent.action = segment.action.clone();
    parent.polygon = segment.polygon.clone();

    let segment_id = segment.id.clone().unwrap();

    store
        .create_segment(&segment)
        .await
        .map_err(AggregatorError::Store)?;
    store
        .relate_text_product_segment(product_id, &segment_id)
        .await
        .map_err(AggregatorError::Store)?;
    store
        .relate_vtec_product_segment(&parent.id, &segment_id)
        .await
        .map_err(AggregatorError::Store)?;

    for state in &segment.ugc.states {
        for zone in &state.zones {
            let ugc_id = format!("ugc:{}{}{}", state.name, zone_kind_char(state.kind), zone);

            match store
                .get_ugc_edge(&parent.id, &ugc_id)
                .await
                .map_err(AggregatorError::Store)?
            {
                Some(mut edge) => {
                    edge.start = edge.start.min(start);
                    edge.end = edge.end.max(end);
                    edge.expires = edge.expires.max(parent.expires);
                    edge.action = segment.action.clone();
                    store
                        .put_ugc_edge(&parent.id, &ugc_id, &edge)
                        .await
                        .map_err(AggregatorError::Store)?;
                }
                None => {
                    let edge = UgcEdge {
                        start,
                        end,
                        issued: parent.issued,
                        expires: parent.expires,
                        action: segment.action.clone(),
                    };
                    store
                        .put_ugc_edge(&parent.id, &ugc_id, &edge)
                        .await
                        .map_err(AggregatorError::Store)?;
                }
            }
        }
    }

    if is_new {
        store
            .create_vtec_product(&parent)
            .await
            .map_err(AggregatorError::Store)?;
    } else {
        store
            .update_vtec_product(&parent)
            .await
            .map_err(AggregatorError::Store)?;
    }

    Ok(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Awips, Product, Wmo};
    use crate::vtec::parse_vtec_segments;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        products: Mutex<HashMap<String, VtecProduct>>,
        edges: Mutex<HashMap<(String, String), UgcEdge>>,
        segment_count: Mutex<usize>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("memory store error")]
    struct MemoryError;

    #[async_trait::async_trait]
    impl VtecStore for MemoryStore {
        type Error = MemoryError;

        async fn get_vtec_product(&self, id: &str) -> Result<Option<VtecProduct>, Self::Error> {
            Ok(self.products.lock().unwrap().get(id).cloned())
        }

        async fn create_vtec_product(&self, product: &VtecProduct) -> Result<(), Self::Error> {
            let mut products = self.products.lock().unwrap();
            assert!(
                !products.contains_key(&product.id),
                "create_vtec_product called on an existing id: {}",
                product.id
            );
            products.insert(product.id.clone(), product.clone());
            Ok(())
        }

        async fn update_vtec_product(&self, product: &VtecProduct) -> Result<(), Self::Error> {
            let mut products = self.products.lock().unwrap();
            assert!(
                products.contains_key(&product.id),
                "update_vtec_product called on a missing id: {}",
                product.id
            );
            products.insert(product.id.clone(), product.clone());
            Ok(())
        }

        async fn create_segment(&self, _segment: &VtecSegment) -> Result<(), Self::Error> {
            *self.segment_count.lock().unwrap() += 1;
            Ok(())
        }

        async fn relate_text_product_segment(
            &self,
            _product_id: &str,
            _segment_id: &str,
        ) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn relate_vtec_product_segment(
            &self,
            _parent_id: &str,
            _segment_id: &str,
        ) -> Result<(), Self::Error> {
            Ok(())
        }

        async fn get_ugc_edge(
            &self,
            parent_id: &str,
            ugc_id: &str,
        ) -> Result<Option<UgcEdge>, Self::Error> {
            Ok(self
                .edges
                .lock()
                .unwrap()
                .get(&(parent_id.to_string(), ugc_id.to_string()))
                .cloned())
        }

        async fn put_ugc_edge(
            &self,
            parent_id: &str,
            ugc_id: &str,
            edge: &UgcEdge,
        ) -> Result<(), Self::Error> {
            self.edges
                .lock()
                .unwrap()
                .insert((parent_id.to_string(), ugc_id.to_string()), edge.clone());
            Ok(())
        }
    }

    fn product(text: &str) -> Product {
        Product {
            id: "KILNTOR202405151800".to_string(),
            group: "KILNTOR202405151800".to_string(),
            text: text.to_string(),
            wmo: Wmo {
                original: "WFUS51 KILN 151800".to_string(),
                datatype: "WFUS51".to_string(),
                wfo: "KILN".to_string(),
                issued: Utc.with_ymd_and_hms(2024, 5, 15, 18, 0, 0).unwrap(),
                bbb: None,
            },
            awips: Awips {
                original: "TORILN".to_string(),
                product: "TOR".to_string(),
                wfo: "ILN".to_string(),
            },
            bil: None,
            issued: Utc.with_ymd_and_hms(2024, 5, 15, 18, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn first_segment_creates_parent_with_zero_then_one_children() {
        let store = MemoryStore::default();
        let text = "TORILN\n/O.NEW.KILN.TO.W.0023.240515T1815Z-240515T1900Z/\nOHC035-151900-\n$$\n";
        let segments = parse_vtec_segments(&product(text)).unwrap();
        assert_eq!(segments.len(), 1);

        let parent = merge_segment(&store, "KILNTOR202405151800", segments.into_iter().next().unwrap())
            .await
            .unwrap();

        assert_eq!(parent.id, "ILNTOW00232024");
        assert_eq!(parent.children, 1);
        assert_eq!(parent.end_initial, parent.end);
    }

    #[tokio::test]
    async fn con_update_extends_end_but_freezes_end_initial() {
        let store = MemoryStore::default();
        let new_text = "TORILN\n/O.NEW.KILN.TO.W.0023.240515T1815Z-240515T1900Z/\nOHC035-151900-\n$$\n";
        let con_text = "TORILN\n/O.CON.KILN.TO.W.0023.240515T1815Z-240515T1945Z/\nOHC035-151945-\n$$\n";

        let new_segment = parse_vtec_segments(&product(new_text)).unwrap().remove(0);
        let first = merge_segment(&store, "p1", new_segment).await.unwrap();

        let con_segment = parse_vtec_segments(&product(con_text)).unwrap().remove(0);
        let second = merge_segment(&store, "p2", con_segment).await.unwrap();

        assert_eq!(second.children, 2);
        assert_eq!(second.action, "CON");
        assert_eq!(second.end_initial, first.end_initial);
        assert!(second.end > first.end);
    }

    #[tokio::test]
    async fn wfo_mismatch_is_rejected_and_parent_untouched() {
        let store = MemoryStore::default();
        let new_text = "TORILN\n/O.NEW.KILN.TO.W.0023.240515T1815Z-240515T1900Z/\nOHC035-151900-\n$$\n";
        let mismatched_text =
            "TORJKL\n/O.CON.KJKL.TO.W.0023.240515T1815Z-240515T1945Z/\nOHC035-151945-\n$$\n";

        let new_segment = parse_vtec_segments(&product(new_text)).unwrap().remove(0);
        let first = merge_segment(&store, "p1", new_segment).await.unwrap();

        let bad_segment = parse_vtec_segments(&product(mismatched_text)).unwrap().remove(0);
        let err = merge_segment(&store, "p2", bad_segment).await.unwrap_err();
        assert!(matches!(err, AggregatorError::Vtec(VtecError::WfoMismatch { .. })));

        let unchanged = store.get_vtec_product(&first.id).await.unwrap().unwrap();
        assert_eq!(unchanged.children, first.children);
    }
}
