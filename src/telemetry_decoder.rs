//! Decoder for the ranging firmware's text telemetry. Each line carries at
//! most one field of one anchor's two-way-ranging report, in the form
//! `TWR[<id>].<property> : <value>`, usually behind a logger prefix and
//! sometimes wrapped in ANSI color codes.

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::{char, i32, space0, u32},
    combinator::{map, not},
    error::{Error, ErrorKind},
    number::complete::float,
    sequence::{delimited, preceded, terminated},
    Finish, IResult,
};

use std::str::FromStr;

use crate::measurement::Id;

/// The logger tag the firmware prints before the payload. Anything before
/// it is prefix noise (timestamps, module names) and is not searched.
const LOG_MARKER: &str = "INFO :";

/// One decoded field of a two-way-ranging report.
#[derive(Debug, Clone, PartialEq)]
pub enum TwrField {
    /// Non-line-of-sight indicator.
    NLos(i32),
    /// Range in centimeters.
    Distance(i32),
    /// Angle-of-arrival azimuth, degrees.
    AoaAzimuth(f32),
    /// Angle-of-arrival elevation, degrees.
    AoaElevation(f32),
}

/// A decoded telemetry line: which anchor reported, and the single field
/// the line carried.
#[derive(Debug, Clone, PartialEq)]
pub struct TwrReport {
    /// The reporting anchor.
    pub id: Id,
    /// The field carried by the line.
    pub field: TwrField,
}

/// Integer value that must not be the integral part of a decimal. The
/// firmware only ever prints whole centimeters; a fractional value here
/// means the line is damaged, not that it should be truncated.
fn whole_i32(s: &str) -> IResult<&str, i32> {
    terminated(i32, not(char('.')))(s)
}

fn parse_property(s: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(s)
}

/// Parses a report starting exactly at `TWR[`. Yields `None` when the
/// property name is not one we track.
fn parse_twr_report(s: &str) -> IResult<&str, Option<TwrReport>> {
    let (s, id) = delimited(tag("TWR["), u32, char(']'))(s)?;
    let (s, property) = preceded(char('.'), parse_property)(s)?;
    let (s, _) = delimited(space0, char(':'), space0)(s)?;

    let report = |field| TwrReport { id, field };
    match property {
        "nLos" => map(whole_i32, |v| Some(report(TwrField::NLos(v))))(s),
        "distance" => map(whole_i32, |v| Some(report(TwrField::Distance(v))))(s),
        "aoa_azimuth" => map(float, |v| Some(report(TwrField::AoaAzimuth(v))))(s),
        "aoa_elevation" => map(float, |v| Some(report(TwrField::AoaElevation(v))))(s),
        _ => Ok((s, None)),
    }
}

/// Removes ANSI color sequences (`ESC [` … `m`). Escape bytes that do not
/// open a well-formed color sequence are kept verbatim.
pub fn strip_ansi(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(esc) = rest.find('\u{1b}') {
        out.push_str(&rest[..esc]);
        let tail = &rest[esc + 1..];
        let body_len = tail.strip_prefix('[').and_then(|body| {
            let end = body.find(|c: char| !c.is_ascii_digit() && c != ';')?;
            (body.as_bytes()[end] == b'm').then_some(end)
        });
        match body_len {
            // ESC + '[' + body + 'm'
            Some(len) => rest = &rest[esc + len + 3..],
            None => {
                out.push('\u{1b}');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decodes one raw telemetry line, tolerating color codes, logger prefixes,
/// unknown properties, and outright garbage. Returns `None` for anything
/// that does not yield a usable field; malformed telemetry is routine and
/// never an error.
pub fn decode_line(raw: &str) -> Option<TwrReport> {
    let clean = strip_ansi(raw);
    let payload = match clean.find(LOG_MARKER) {
        Some(at) => &clean[at + LOG_MARKER.len()..],
        None => clean.as_str(),
    };
    // A damaged candidate does not rule out a good report later in the
    // same line, so keep scanning past failures.
    for (start, _) in payload.match_indices("TWR[") {
        if let Ok((_rest, report)) = parse_twr_report(&payload[start..]).finish() {
            return report;
        }
    }
    None
}

impl FromStr for TwrReport {
    type Err = Error<String>;

    /// Strict parse of a bare report (no prefix, no color codes). Unknown
    /// properties are a parse error here, unlike [`decode_line`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_twr_report(s).finish() {
            Ok((_rest, Some(report))) => Ok(report),
            Ok((rest, None)) => Err(Error {
                input: rest.to_string(),
                code: ErrorKind::Verify,
            }),
            Err(Error { input, code }) => Err(Error {
                input: input.to_string(),
                code,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_distance_field() {
        let report = decode_line("TWR[2].distance : 145").unwrap();
        assert_eq!(
            report,
            TwrReport {
                id: 2,
                field: TwrField::Distance(145),
            }
        );
    }

    #[test]
    fn decodes_behind_logger_prefix() {
        let line = "[00:01:12.448] <inf> APP: INFO : TWR[0].distance : 312";
        let report = decode_line(line).unwrap();
        assert_eq!(report.id, 0);
        assert_eq!(report.field, TwrField::Distance(312));
    }

    #[test]
    fn colored_line_decodes_like_plain_one() {
        let plain = "INFO : TWR[1].aoa_azimuth : -12.5";
        let colored = "\u{1b}[32mINFO : TWR[1].aoa_azimuth : \u{1b}[1;31m-12.5\u{1b}[0m";
        assert_eq!(decode_line(colored), decode_line(plain));
        assert_eq!(
            decode_line(plain).unwrap().field,
            TwrField::AoaAzimuth(-12.5)
        );
    }

    #[test]
    fn strips_only_wellformed_sequences() {
        assert_eq!(strip_ansi("\u{1b}[0;32mhi\u{1b}[m!"), "hi!");
        // An escape that never terminates is left alone.
        assert_eq!(strip_ansi("bad\u{1b}[12;"), "bad\u{1b}[12;");
    }

    #[test]
    fn unknown_property_is_ignored() {
        assert_eq!(decode_line("INFO : TWR[0].rssi : -81"), None);
    }

    #[test]
    fn garbage_and_overflow_are_ignored() {
        assert_eq!(decode_line("boot: radio init ok"), None);
        assert_eq!(decode_line("INFO : TWR[99999999999].distance : 10"), None);
        assert_eq!(decode_line("INFO : TWR[1].distance : abc"), None);
    }

    #[test]
    fn scans_past_a_damaged_candidate() {
        let line = "INFO : TWR[?? TWR[2].distance : 77";
        assert_eq!(decode_line(line).unwrap().field, TwrField::Distance(77));
    }

    #[test]
    fn fractional_distance_is_rejected() {
        // Whole centimeters only; a decimal point means a damaged line.
        assert_eq!(decode_line("INFO : TWR[1].distance : 145.5"), None);
    }

    #[test]
    fn negative_nlos_and_elevation_parse() {
        assert_eq!(
            decode_line("INFO : TWR[3].nLos : -1").unwrap().field,
            TwrField::NLos(-1)
        );
        assert_eq!(
            decode_line("INFO : TWR[3].aoa_elevation : 4.0").unwrap().field,
            TwrField::AoaElevation(4.0)
        );
    }

    #[test]
    fn strict_from_str_rejects_unknown_property() {
        assert!("TWR[0].distance : 20".parse::<TwrReport>().is_ok());
        assert!("TWR[0].rssi : -70".parse::<TwrReport>().is_err());
        assert!("INFO : TWR[0].distance : 20".parse::<TwrReport>().is_err());
    }
}
