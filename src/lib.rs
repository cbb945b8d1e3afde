#![forbid(unsafe_code)]

//! Decodes NWS text products from the NWWS-OI feed into structured hazard
//! events.
//!
//! The transport layer (`config`/`connection`/`message`/`stream`) speaks
//! XMPP directly to NWWS-OI, unchanged in spirit from a plain MUC client.
//! Everything else — framing, the sub-parsers, the VTEC aggregator, and the
//! watch correlator — turns the product text that transport carries into the
//! typed records described in the data model.

mod aggregator;
mod config;
mod connection;
mod emitter;
mod error;
mod geo;
mod message;
mod parsers;
mod pipeline;
mod product;
mod router;
mod store_adapter;
mod stream;
mod vtec;
mod watch;
mod watch_queue;

pub use aggregator::{merge_segment, AggregatorError, UgcEdge, VtecProduct, VtecStore};
pub use config::{Channel, Config, Server};
pub use connection::Connection;
pub use emitter::{LiveStream, Store};
pub use error::{
    ConnectionError, ConnectionResult, Error, ParseError, ProductError, Result, VtecError,
};
pub use geo::{Geometry, Point};
pub use message::Message;
pub use parsers::{
    find_pvtec, parse_hazard_tags, parse_hvtec, parse_latlon, parse_mcd, parse_pvtec, parse_sel,
    parse_tml, parse_ugc, parse_wwp, HVtec, HazardTags, LatLon, Mcd, PVtec, Sel, Tml, Ugc,
    UgcState, Wwp, ZoneKind,
};
pub use pipeline::{ErrorSink, Pipeline};
pub use product::{
    finish_product, frame_product, frame_product_headers, Awips, Product, ProductHeaders, Wmo,
};
pub use router::{route, Route};
pub use store_adapter::GraphStore;
pub use stream::{ConnectionState, Stream, StreamEvent};
pub use vtec::{parse_vtec_segments, VtecSegment};
pub use watch::{Watch, WatchKind};
pub use watch_queue::WatchQueue;
