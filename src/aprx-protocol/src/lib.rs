// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Wire-level conversions between PBufs and the APRS-IS text protocol: the
//! TNC2 codec, login/data-line framing, and the legacy passcode algorithm.

pub mod line;
pub mod passcode;
pub mod tnc2;

pub use line::{classify_inbound, format_outbound_data_line, InboundLine, LoginLine};
pub use passcode::passcode as compute_passcode;
