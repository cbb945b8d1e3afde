//! Pure sub-parsers over product body text.
//!
//! Every function here is deterministic and side-effect free: given the same
//! text (and, where needed, the parent product's issuance time), it always
//! returns the same result. None of them touch storage or the network.

pub mod hazards;
pub mod hvtec;
pub mod latlon;
pub mod mcd;
pub mod pvtec;
pub mod sel;
pub mod tml;
pub mod ugc;
pub mod wwp;

pub use hazards::{parse_hazard_tags, HazardTags};
pub use hvtec::{parse_hvtec, HVtec};
pub use latlon::{parse_latlon, LatLon};
pub use mcd::{parse_mcd, Mcd};
pub use pvtec::{find_pvtec, parse_pvtec, PVtec};
pub use sel::{parse_sel, Sel};
pub use tml::{parse_tml, Tml};
pub use ugc::{parse_ugc, Ugc, UgcState, ZoneKind};
pub use wwp::{parse_wwp, Wwp};
