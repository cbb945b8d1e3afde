//! The `Watch` record a completed SEL+WWP+WOU triple produces.

use crate::parsers::Wwp;
use crate::vtec::VtecSegment;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WatchKind {
    Tornado,
    Severe,
}

impl WatchKind {
    pub fn code(self) -> &'static str {
        match self {
            WatchKind::Tornado => "TO",
            WatchKind::Severe => "SV",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "TO" => Some(WatchKind::Tornado),
            "SV" => Some(WatchKind::Severe),
            _ => None,
        }
    }
}

/// A severe thunderstorm or tornado watch, correlated from its three
/// independent component products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Watch {
    pub id: String,
    pub kind: WatchKind,
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wwp: Option<Wwp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wou: Option<String>,
    pub segments: Vec<VtecSegment>,
}

impl Watch {
    pub fn new(kind: WatchKind, number: u32, issued: DateTime<Utc>) -> Self {
        Watch {
            id: format!("{}A{:04}{}", kind.code(), number, issued.year()),
            kind,
            number,
            sel: None,
            wwp: None,
            wou: None,
            segments: Vec::new(),
        }
    }

    /// A watch is ready to emit once all three component slots have arrived,
    /// regardless of how many VTEC segments the WOU yielded.
    pub fn is_complete(&self) -> bool {
        self.sel.is_some() && self.wwp.is_some() && self.wou.is_some()
    }
}
