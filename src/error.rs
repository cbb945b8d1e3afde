use thiserror::Error;

/// Errors from the underlying XMPP connection to NWWS-OI.
///
/// `ConnectionError` is 1:1 with the transport; failures are generally
/// unrecoverable for that connection and are surfaced to [`Stream`](crate::Stream)
/// so it can reconnect.
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("the configuration is invalid: {0}")]
    Configuration(tokio_xmpp::Error),
    #[error("the credentials were refused: {0}")]
    Credentials(tokio_xmpp::Error),
    #[error("a network error occurred: {0}")]
    Network(tokio_xmpp::Error),
    #[error("an XMPP parse error occurred: {0}")]
    XmppParseError(#[from] xmpp_parsers::Error),
    #[error("the XMPP stream ended")]
    StreamEnded,
}

impl From<tokio_xmpp::Error> for ConnectionError {
    fn from(e: tokio_xmpp::Error) -> Self {
        Self::Network(e)
    }
}

pub type ConnectionResult<T, E = ConnectionError> = std::result::Result<T, E>;

/// A product is missing a header the framer requires to proceed.
///
/// Per the spec's error taxonomy, a missing AWIPS ID on what was never really
/// a product (heartbeat, empty message) is handled by the caller as
/// skip-silently; everything else here is a per-product recoverable failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    #[error("could not find an AWIPS ID line")]
    MissingAwips,
    #[error("could not find a WMO header line")]
    MissingWmo,
    #[error("unknown timezone abbreviation: {0}")]
    UnknownTimezone(String),
    #[error("could not parse the issuance line")]
    InvalidIssuanceLine,
    #[error("could not parse the WMO line's DDHHMM timestamp")]
    InvalidWmoTimestamp,
}

/// A sub-parser could not make sense of its input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("could not locate a UGC string")]
    UgcNotFound,
    #[error("could not parse the UGC expiry timestamp")]
    InvalidUgcExpiry,
    #[error("malformed UGC zone range token: {0}")]
    InvalidUgcRange(String),
    #[error("invalid P-VTEC type: {0}")]
    InvalidVtecType(String),
    #[error("invalid P-VTEC action: {0}")]
    InvalidVtecAction(String),
    #[error("invalid P-VTEC phenomena: {0}")]
    InvalidVtecPhenomena(String),
    #[error("invalid P-VTEC significance: {0}")]
    InvalidVtecSignificance(String),
    #[error("could not parse P-VTEC event tracking number")]
    InvalidVtecEtn,
    #[error("could not parse P-VTEC start/end timestamp")]
    InvalidVtecTimestamp,
    #[error("could not parse a LAT...LON point")]
    InvalidLatLonPoint,
    #[error("could not parse the TIME...MOT...LOC line")]
    InvalidTml,
    #[error("could not find a Mesoscale Discussion identifier")]
    MissingMcdId,
    #[error("could not find the MCD validity date line")]
    MissingMcdDateLine,
    #[error("could not parse a WWP probability or attribute table")]
    InvalidWwpTable,
    #[error("could not parse a watch number from a SEL/WWP/WOU product")]
    InvalidWatchNumber,
}

/// A VTEC segment could not be reconciled with its parent event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VtecError {
    #[error("segment WFO {segment} does not match parent WFO {parent} for event {event_id}")]
    WfoMismatch {
        event_id: String,
        parent: String,
        segment: String,
    },
    #[error("segment ETN {segment} does not match parent ETN {parent} for event {event_id}")]
    EtnMismatch {
        event_id: String,
        parent: u32,
        segment: u32,
    },
    #[error("segment phenomena {segment} does not match parent phenomena {parent} for event {event_id}")]
    PhenomenaMismatch {
        event_id: String,
        parent: String,
        segment: String,
    },
    #[error("segment significance {segment} does not match parent significance {parent} for event {event_id}")]
    SignificanceMismatch {
        event_id: String,
        parent: String,
        segment: String,
    },
}

/// The top-level error type for the decode/correlate pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("could not frame product: {0}")]
    Product(#[from] ProductError),
    #[error("could not parse product body: {0}")]
    Parse(#[from] ParseError),
    #[error("VTEC aggregation error: {0}")]
    Vtec(#[from] VtecError),
    #[error("storage error: {0}")]
    Store(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
