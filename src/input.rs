//! Parsing of arrival traces.
//!
//! One packet per line: `<arrival_ms> <flow_id> <priority> <size_bytes> <payload>`. The payload
//! is the remainder of the line and may contain whitespace. Blank lines and lines starting with
//! `#` are skipped.

use std::io::BufRead;

use tracing::{info, trace, warn};

use crate::{
    driver::Error,
    ident::{FlowId, Priority},
    packet::Packet,
    time::Time,
    units::Bytes,
};

/// Why a single trace line was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid {field} `{value}`")]
    InvalidField { field: &'static str, value: String },

    #[error("arrival time must be finite and non-negative, got `{0}`")]
    BadArrival(String),

    #[error("flow id must be positive")]
    ZeroFlow,

    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

/// How to treat malformed lines.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Report and skip malformed lines.
    #[default]
    Lenient,
    /// Fail on the first malformed line.
    Strict,
}

/// A line that was skipped in lenient mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    /// One-based line number.
    pub line_no: usize,
    pub line: String,
    pub error: ParseError,
}

/// The well-formed packets of a trace, in input order.
#[derive(Debug, Default, Clone)]
pub struct Trace {
    pub packets: Vec<Packet>,
    pub rejected: Vec<Rejected>,
}

/// Parses one line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<Packet>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut rest = line;

    let arrival = next_field(&mut rest, "arrival_time_ms")?;
    let arrival = parse_field::<f64>(arrival, "arrival_time_ms")?;
    if !arrival.is_finite() || arrival.is_sign_negative() {
        return Err(ParseError::BadArrival(arrival.to_string()));
    }
    let flow_id = parse_field::<FlowId>(next_field(&mut rest, "flow_id")?, "flow_id")?;
    if flow_id == FlowId::ZERO {
        return Err(ParseError::ZeroFlow);
    }
    let priority = parse_field::<Priority>(next_field(&mut rest, "priority")?, "priority")?;
    let size = parse_field::<Bytes>(next_field(&mut rest, "size_bytes")?, "size_bytes")?;
    if rest.is_empty() {
        return Err(ParseError::MissingField("payload"));
    }

    Ok(Some(
        Packet::builder()
            .arrival(Time::new(arrival))
            .flow_id(flow_id)
            .priority(priority)
            .size(size)
            .payload(rest)
            .build(),
    ))
}

// Splits off the next whitespace-delimited field and leaves `rest` pointing at the start of
// the following one.
fn next_field<'a>(rest: &mut &'a str, name: &'static str) -> Result<&'a str, ParseError> {
    let s = *rest;
    if s.is_empty() {
        return Err(ParseError::MissingField(name));
    }
    let (field, tail) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
    *rest = tail.trim_start();
    Ok(field)
}

fn parse_field<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidField {
        field,
        value: value.to_string(),
    })
}

/// Parses a whole trace.
///
/// In [`Mode::Lenient`] each malformed line is logged and recorded in [`Trace::rejected`]; in
/// [`Mode::Strict`] the first one is returned as [`Error::Parse`].
pub fn parse_trace(reader: impl BufRead, mode: Mode) -> Result<Trace, Error> {
    let mut parsed = Trace::default();
    // Raw lines, so a line that is not UTF-8 is rejected on its own instead of ending the read
    for (idx, raw) in reader.split(b'\n').enumerate() {
        let mut raw = raw?;
        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        let line_no = idx + 1;
        let (line, result) = match String::from_utf8(raw) {
            Ok(line) => {
                let result = parse_line(&line);
                (line, result)
            }
            Err(err) => (
                String::from_utf8_lossy(err.as_bytes()).into_owned(),
                Err(ParseError::InvalidUtf8),
            ),
        };
        match result {
            Ok(Some(pkt)) => {
                trace!(line_no, packet = ?pkt, "input");
                parsed.packets.push(pkt);
            }
            Ok(None) => {}
            Err(error) if mode == Mode::Strict => {
                return Err(Error::Parse {
                    line_no,
                    line,
                    source: error,
                });
            }
            Err(error) => {
                warn!(line_no, line = %line, %error, "skipping malformed line");
                parsed.rejected.push(Rejected {
                    line_no,
                    line,
                    error,
                });
            }
        }
    }
    info!(
        packets = parsed.packets.len(),
        rejected = parsed.rejected.len(),
        "parsed trace"
    );
    Ok(parsed)
}
