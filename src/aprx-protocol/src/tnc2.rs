// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Thin TNC2 text codec built on `aprx_core`'s address-chain parsing:
//! turning a received APRS-IS line into a PBuf, and a PBuf back into the
//! line that goes out over the wire (before `qAR` tagging, see
//! [`crate::line`]).

use aprx_core::pbuf::{PBuf, PbufInner};
use aprx_core::{AprxError, IfGroup};

/// Build a PBuf from one TNC2 data line received over APRS-IS.
pub fn decode(line: &str, source_ifgroup: IfGroup) -> Result<PBuf, AprxError> {
    PbufInner::from_tnc2(line, true, source_ifgroup)
}

/// Render a PBuf back to its TNC2 text form, without any `qAR` tagging.
pub fn encode(pbuf: &PBuf) -> &str {
    &pbuf.tnc2
}
