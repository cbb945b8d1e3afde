//! Adapts the generic JSON graph [`Store`] (§6's six operations) into the
//! typed [`VtecStore`] the aggregator needs, and provides the handful of
//! extra lookups/writes the pipeline needs that aren't part of the VTEC
//! merge protocol (the `text_products` collision ordinal, watch and MCD
//! persistence). This is the emitter's interface-adapter layer: it is the
//! only place that knows the table/edge names from §6's catalogue.

use crate::aggregator::{UgcEdge, VtecProduct, VtecStore};
use crate::emitter::Store;
use crate::parsers::Mcd;
use crate::vtec::VtecSegment;
use crate::watch::Watch;
use serde_json::json;

/// Wraps any [`Store`] implementation, giving it the typed read/write shape
/// the VTEC aggregator and the pipeline need.
pub struct GraphStore<S> {
    store: S,
}

impl<S: Store> GraphStore<S> {
    pub fn new(store: S) -> Self {
        GraphStore { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// The collision ordinal for `group`: the count of existing
    /// `text_products` rows sharing it, per §4.1 step 5.
    pub async fn next_seq(&self, group: &str) -> Result<u32, S::Error> {
        let rows = self
            .store
            .query(
                "SELECT count() AS count FROM text_products WHERE group = $group GROUP ALL",
                json!({ "group": group }),
            )
            .await?;
        let count = rows
            .first()
            .and_then(|v| v.get("count"))
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        Ok(count as u32)
    }

    pub async fn create_text_product(
        &self,
        product: &crate::product::Product,
    ) -> Result<(), S::Error> {
        let value = serde_json::to_value(product).expect("Product always serializes");
        self.store.create("text_products", value).await?;
        Ok(())
    }

    pub async fn create_watch(&self, watch: &Watch) -> Result<(), S::Error> {
        let value = serde_json::to_value(watch).expect("Watch always serializes");
        self.store.create("severe_watches", value).await?;
        Ok(())
    }

    pub async fn relate_watch_segment(
        &self,
        watch_id: &str,
        segment_id: &str,
    ) -> Result<(), S::Error> {
        self.store
            .relate(
                &format!("severe_watches:{}", watch_id),
                "watch_vtec",
                &format!("vtec_segment:{}", segment_id),
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn create_mcd(&self, mcd: &Mcd) -> Result<(), S::Error> {
        let value = serde_json::to_value(mcd).expect("Mcd always serializes");
        self.store.create("mcd", value).await?;
        Ok(())
    }

    pub async fn relate_mcd_text_product(
        &self,
        mcd_id: &str,
        product_id: &str,
    ) -> Result<(), S::Error> {
        self.store
            .relate(
                &format!("mcd:{}", mcd_id),
                "mcd_text_products",
                &format!("text_products:{}", product_id),
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn relate_mcd_watch(&self, mcd_id: &str, watch_id: &str) -> Result<(), S::Error> {
        self.store
            .relate(&format!("mcd:{}", mcd_id), "mcd_watch", watch_id, None)
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl<S: Store + Send + Sync> VtecStore for GraphStore<S> {
    type Error = S::Error;

    async fn get_vtec_product(&self, id: &str) -> Result<Option<VtecProduct>, Self::Error> {
        let rows = self
            .store
            .query(
                "SELECT * FROM vtec_product WHERE id = $id",
                json!({ "id": id }),
            )
            .await?;
        Ok(rows.into_iter().next().and_then(|v| serde_json::from_value(v).ok()))
    }

    async fn create_vtec_product(&self, product: &VtecProduct) -> Result<(), Self::Error> {
        let value = serde_json::to_value(product).expect("VtecProduct always serializes");
        self.store.create("vtec_product", value).await?;
        Ok(())
    }

    async fn update_vtec_product(&self, product: &VtecProduct) -> Result<(), Self::Error> {
        let value = serde_json::to_value(product).expect("VtecProduct always serializes");
        self.store
            .update(&format!("vtec_product:{}", product.id), value)
            .await?;
        Ok(())
    }

    async fn create_segment(&self, segment: &VtecSegment) -> Result<(), Self::Error> {
        let value = serde_json::to_value(segment).expect("VtecSegment always serializes");
        self.store.create("vtec_segment", value).await?;
        Ok(())
    }

    async fn relate_text_product_segment(
        &self,
        product_id: &str,
        segment_id: &str,
    ) -> Result<(), Self::Error> {
        self.store
            .relate(
                &format!("text_products:{}", product_id),
                "vtec_text_products",
                &format!("vtec_segment:{}", segment_id),
                None,
            )
            .await?;
        Ok(())
    }

    async fn relate_vtec_product_segment(
        &self,
        parent_id: &str,
        segment_id: &str,
    ) -> Result<(), Self::Error> {
        self.store
            .relate(
                &format!("vtec_product:{}", parent_id),
                "vtec_product_segments",
                &format!("vtec_segment:{}", segment_id),
                None,
            )
            .await?;
        Ok(())
    }

    async fn get_ugc_edge(
        &self,
        parent_id: &str,
        ugc_id: &str,
    ) -> Result<Option<UgcEdge>, Self::Error> {
        let rows = self
            .store
            .query(
                "SELECT * FROM vtec_ugc WHERE in = $parent AND out = $ugc",
                json!({ "parent": format!("vtec_product:{}", parent_id), "ugc": ugc_id }),
            )
            .await?;
        Ok(rows.into_iter().next().and_then(|v| serde_json::from_value(v).ok()))
    }

    async fn put_ugc_edge(
        &self,
        parent_id: &str,
        ugc_id: &str,
        edge: &UgcEdge,
    ) -> Result<(), Self::Error> {
        let props = serde_json::to_value(edge).expect("UgcEdge always serializes");
        self.store
            .relate(
                &format!("vtec_product:{}", parent_id),
                "vtec_ugc",
                ugc_id,
                Some(props),
            )
            .await?;
        Ok(())
    }
}
