// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Geometry and pattern-matching helpers shared by filter node kinds.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two points given in
/// degrees, reusing `cos_lat` callers have already cached where possible.
pub fn haversine_km(lat1: f64, lon1: f64, cos_lat1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1r = lat1.to_radians();
    let lat2r = lat2.to_radians();
    let dlat = lat2r - lat1r;
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2) + cos_lat1 * lat2r.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

/// Match `text` against a pattern that may contain `*` wildcards (matching
/// any run of characters, including none), case-insensitively.
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    fn helper(p: &[u8], t: &[u8]) -> bool {
        match p.first() {
            None => t.is_empty(),
            Some(b'*') => helper(&p[1..], t) || (!t.is_empty() && helper(p, &t[1..])),
            Some(&pc) => {
                !t.is_empty() && pc.eq_ignore_ascii_case(&t[0]) && helper(&p[1..], &t[1..])
            }
        }
    }
    helper(pattern.as_bytes(), text.as_bytes())
}
