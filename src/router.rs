//! Dispatches a framed [`Product`] onto one of the processing paths.

use crate::parsers::find_pvtec;
use crate::product::Product;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `WWP`, `SEL`, or `WOU` — feeds the watch correlator.
    Watch,
    /// `SWO` with `wfo == "MCD"` — a Mesoscale Discussion.
    Mcd,
    /// Any product carrying at least one P-VTEC string.
    Vtec,
    /// Everything else.
    PlainText,
}

pub fn route(product: &Product) -> Route {
    match product.awips.product.as_str() {
        "WWP" | "SEL" | "WOU" => return Route::Watch,
        "SWO" if product.awips.wfo == "MCD" => return Route::Mcd,
        _ => {}
    }

    if find_pvtec(&product.text) > 0 {
        return Route::Vtec;
    }

    Route::PlainText
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{Awips, Wmo};
    use chrono::Utc;

    fn product(product_code: &str, wfo: &str, text: &str) -> Product {
        Product {
            id: "test".to_string(),
            group: "test".to_string(),
            text: text.to_string(),
            wmo: Wmo {
                original: "WFUS51 KILN 151800".to_string(),
                datatype: "WFUS51".to_string(),
                wfo: "KILN".to_string(),
                issued: Utc::now(),
                bbb: None,
            },
            awips: Awips {
                original: format!("{}{}", product_code, wfo),
                product: product_code.to_string(),
                wfo: wfo.to_string(),
            },
            bil: None,
            issued: Utc::now(),
        }
    }

    #[test]
    fn wwp_sel_wou_route_to_watch() {
        assert_eq!(route(&product("WWP", "ILN", "")), Route::Watch);
        assert_eq!(route(&product("SEL", "ILN", "")), Route::Watch);
        assert_eq!(route(&product("WOU", "ILN", "")), Route::Watch);
    }

    #[test]
    fn swo_mcd_routes_to_mcd() {
        assert_eq!(route(&product("SWO", "MCD", "")), Route::Mcd);
    }

    #[test]
    fn swo_without_mcd_wfo_falls_through() {
        let p = product("SWO", "ILN", "no vtec here");
        assert_eq!(route(&p), Route::PlainText);
    }

    #[test]
    fn vtec_bearing_text_routes_to_vtec() {
        let p = product(
            "TOR",
            "ILN",
            "/O.NEW.KILN.TO.W.0023.240515T1815Z-240515T1900Z/",
        );
        assert_eq!(route(&p), Route::Vtec);
    }

    #[test]
    fn plain_text_otherwise() {
        let p = product("AFD", "ILN", "just a forecast discussion");
        assert_eq!(route(&p), Route::PlainText);
    }
}
