// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! APRS-IS wire line framing: the login line sent at session start, and the
//! `qAR`-tagging applied to TNC2 lines sent upstream. Inbound line
//! classification (comment/heartbeat vs. data) lives here too since it's the
//! same CR/LF text protocol.

use crate::passcode::passcode;

/// Parameters for the login line sent immediately after connecting.
pub struct LoginLine<'a> {
    pub login: &'a str,
    pub software_name: &'a str,
    pub software_version: &'a str,
    pub filter: Option<&'a str>,
}

impl<'a> LoginLine<'a> {
    /// Render `user <login> pass <passcode> vers <name> <version>[ filter
    /// <spec>]\r\n`.
    pub fn build(&self) -> String {
        let mut s = format!(
            "user {} pass {} vers {} {}",
            self.login,
            passcode(self.login),
            self.software_name,
            self.software_version,
        );
        if let Some(filter) = self.filter {
            s.push_str(" filter ");
            s.push_str(filter);
        }
        s.push_str("\r\n");
        s
    }
}

/// A classified inbound line from the APRS-IS socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundLine {
    /// Starts with `#`: comment, server banner, or heartbeat. Still updates
    /// `last_read` but is not handed to the iGate-from-APRSIS path.
    Comment(String),
    /// Any other line: a TNC2 packet to decode and inject as a PBuf.
    Data(String),
}

/// Classify one line already stripped of its trailing `\r\n`.
pub fn classify_inbound(line: &str) -> InboundLine {
    if line.starts_with('#') {
        InboundLine::Comment(line.to_string())
    } else {
        InboundLine::Data(line.to_string())
    }
}

/// Insert a `qAR` (or caller-supplied `q`-construct) tag and gateway
/// callsign before the info separator of a TNC2 line, and append `\r\n`.
/// `tnc2` must already contain the `:` info separator.
pub fn format_outbound_data_line(tnc2: &str, gwcall: &str, tag: Option<&str>) -> Option<String> {
    let (prefix, info) = tnc2.split_once(':')?;
    let q = tag.unwrap_or("qAR");
    Some(format!("{prefix},{q},{gwcall}:{info}\r\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_line_includes_passcode() {
        let login = LoginLine {
            login: "N0CALL",
            software_name: "aprx",
            software_version: "1.0",
            filter: None,
        };
        assert_eq!(login.build(), "user N0CALL pass 13023 vers aprx 1.0\r\n");
    }

    #[test]
    fn login_line_with_filter() {
        let login = LoginLine {
            login: "N0CALL",
            software_name: "aprx",
            software_version: "1.0",
            filter: Some("r/60.0/25.0/50"),
        };
        assert_eq!(
            login.build(),
            "user N0CALL pass 13023 vers aprx 1.0 filter r/60.0/25.0/50\r\n"
        );
    }

    #[test]
    fn classifies_comment_and_data_lines() {
        assert_eq!(
            classify_inbound("# aprsc 2.1.4-g..."),
            InboundLine::Comment("# aprsc 2.1.4-g...".to_string())
        );
        assert_eq!(
            classify_inbound("N0CALL>APRS:>status"),
            InboundLine::Data("N0CALL>APRS:>status".to_string())
        );
    }

    #[test]
    fn outbound_line_gets_qar_tag() {
        let line = format_outbound_data_line("N0CALL>APRS,WIDE2-1:>status", "MYGATE", None).unwrap();
        assert_eq!(line, "N0CALL>APRS,WIDE2-1,qAR,MYGATE:>status\r\n");
    }

    #[test]
    fn outbound_line_rejects_missing_separator() {
        assert!(format_outbound_data_line("N0CALL>APRS", "MYGATE", None).is_none());
    }

    #[test]
    fn outbound_line_honors_custom_tag() {
        let line = format_outbound_data_line("N0CALL>APRS:>status", "MYGATE", Some("qAC")).unwrap();
        assert_eq!(line, "N0CALL>APRS,qAC,MYGATE:>status\r\n");
    }
}
