//! printf-style numeric formatting for channel field values
//!
//! Station configuration files describe field formats the way weewx does,
//! e.g. `%.1f` or `%03.0f`. Only a single conversion per format is allowed,
//! optionally surrounded by literal text (`%%` for a literal percent sign).
//!
//! Supported conversions: `s`, `d`, `i`, `f`, `F`, `e`, `E`, `g`, `G`.
//! Supported flags: `-`, `+`, space, `0`, `#`.

use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static FORMAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<prefix>(?:[^%]|%%)*)%(?P<flags>[-+ 0#]*)(?P<width>\d+)?(?:\.(?P<precision>\d+))?(?P<conv>[sdifFeEgG])(?P<suffix>(?:[^%]|%%)*)$",
    )
    .expect("format pattern is valid")
});

/// Conversion character of a format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// `%s`: shortest round-trip representation
    Str,
    /// `%d` / `%i`: integer, truncated toward zero
    Int,
    /// `%f`: fixed point
    Fixed { upper: bool },
    /// `%e`: scientific
    Exp { upper: bool },
    /// `%g`: general
    General { upper: bool },
}

/// Parsed printf-style format for one numeric value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NumberFormat {
    source: String,
    prefix: String,
    suffix: String,
    left_align: bool,
    zero_pad: bool,
    plus_sign: bool,
    space_sign: bool,
    alternate: bool,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: Conversion,
}

impl NumberFormat {
    /// Parse a printf-style format string
    pub fn parse(format: &str) -> Result<Self> {
        let caps = FORMAT_PATTERN.captures(format).ok_or_else(|| {
            Error::invalid_format(format, "expected exactly one numeric conversion")
        })?;

        let flags = caps.name("flags").map_or("", |m| m.as_str());
        let width = parse_count(format, caps.name("width").map(|m| m.as_str()))?;
        let precision = parse_count(format, caps.name("precision").map(|m| m.as_str()))?;

        let conversion = match &caps["conv"] {
            "s" => Conversion::Str,
            "d" | "i" => Conversion::Int,
            "f" => Conversion::Fixed { upper: false },
            "F" => Conversion::Fixed { upper: true },
            "e" => Conversion::Exp { upper: false },
            "E" => Conversion::Exp { upper: true },
            "g" => Conversion::General { upper: false },
            "G" => Conversion::General { upper: true },
            other => {
                return Err(Error::invalid_format(
                    format,
                    format!("unsupported conversion '{other}'"),
                ));
            }
        };

        Ok(Self {
            source: format.to_string(),
            prefix: caps["prefix"].replace("%%", "%"),
            suffix: caps["suffix"].replace("%%", "%"),
            left_align: flags.contains('-'),
            zero_pad: flags.contains('0'),
            plus_sign: flags.contains('+'),
            space_sign: flags.contains(' '),
            alternate: flags.contains('#'),
            width,
            precision,
            conversion,
        })
    }

    /// The format string as configured
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render a value
    pub fn apply(&self, value: f64) -> String {
        let body = if value.is_finite() {
            match self.conversion {
                Conversion::Str => {
                    let text = python_str(value.abs());
                    match self.precision {
                        Some(p) => text.chars().take(p).collect(),
                        None => text,
                    }
                }
                Conversion::Int => format!("{}", value.abs().trunc()),
                Conversion::Fixed { .. } => {
                    let text = format!("{:.*}", self.precision.unwrap_or(6), value.abs());
                    if self.alternate && !text.contains('.') {
                        format!("{text}.")
                    } else {
                        text
                    }
                }
                Conversion::Exp { .. } => exp_notation(value.abs(), self.precision.unwrap_or(6)),
                Conversion::General { .. } => {
                    general_notation(value.abs(), self.precision, self.alternate)
                }
            }
        } else if value.is_nan() {
            "nan".to_string()
        } else {
            "inf".to_string()
        };

        let body = match self.conversion {
            Conversion::Fixed { upper: true }
            | Conversion::Exp { upper: true }
            | Conversion::General { upper: true } => body.to_uppercase(),
            _ => body,
        };

        let negative =
            value.is_sign_negative() && !value.is_nan() && !is_negative_zero_int(self, value);
        let sign = if negative {
            "-"
        } else if self.plus_sign {
            "+"
        } else if self.space_sign {
            " "
        } else {
            ""
        };

        let padded = self.pad(sign, &body, value.is_finite());
        format!("{}{}{}", self.prefix, padded, self.suffix)
    }

    fn pad(&self, sign: &str, body: &str, finite: bool) -> String {
        let len = sign.chars().count() + body.chars().count();
        let width = self.width.unwrap_or(0);
        if len >= width {
            return format!("{sign}{body}");
        }
        let fill = width - len;
        if self.left_align {
            format!("{sign}{body}{}", " ".repeat(fill))
        } else if self.zero_pad && finite && self.conversion != Conversion::Str {
            format!("{sign}{}{body}", "0".repeat(fill))
        } else {
            format!("{}{sign}{body}", " ".repeat(fill))
        }
    }
}

impl fmt::Display for NumberFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl TryFrom<String> for NumberFormat {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        NumberFormat::parse(&value)
    }
}

impl From<NumberFormat> for String {
    fn from(format: NumberFormat) -> Self {
        format.source
    }
}

fn parse_count(format: &str, digits: Option<&str>) -> Result<Option<usize>> {
    digits
        .map(|d| {
            d.parse::<usize>()
                .map_err(|_| Error::invalid_format(format, format!("invalid count '{d}'")))
        })
        .transpose()
}

/// `-0.4` truncates to `0`, which printf renders without a sign
fn is_negative_zero_int(format: &NumberFormat, value: f64) -> bool {
    format.conversion == Conversion::Int && value.trunc() == 0.0
}

/// Scientific notation with a signed, at least two digit exponent (`1.5e+01`)
fn exp_notation(value: f64, precision: usize) -> String {
    let raw = format!("{:.*e}", precision, value);
    let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exponent.abs())
}

/// `%g`: fixed or scientific depending on the exponent, trailing zeros removed
fn general_notation(value: f64, precision: Option<usize>, alternate: bool) -> String {
    let p = match precision {
        Some(0) => 1,
        Some(p) => p,
        None => 6,
    };
    if value == 0.0 {
        return if alternate {
            format!("{:.*}", p - 1, 0.0)
        } else {
            "0".to_string()
        };
    }

    // Exponent after rounding to p significant digits
    let rounded = format!("{:.*e}", p - 1, value);
    let exponent: i32 = rounded
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    let text = if exponent < -4 || exponent >= p as i32 {
        exp_notation(value, p - 1)
    } else {
        let decimals = (p as i32 - 1 - exponent).max(0) as usize;
        format!("{:.*}", decimals, value)
    };

    if alternate {
        return text;
    }
    strip_trailing_zeros(&text)
}

fn strip_trailing_zeros(text: &str) -> String {
    let (mantissa, exponent) = match text.split_once('e') {
        Some((m, e)) => (m, Some(e)),
        None => (text, None),
    };
    let mantissa = if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    };
    match exponent {
        Some(e) => format!("{mantissa}e{e}"),
        None => mantissa.to_string(),
    }
}

/// Shortest round-trip text in the style station software logs floats:
/// integral values keep a trailing `.0`, very large or small values use an
/// exponent.
fn python_str(value: f64) -> String {
    if value != 0.0 && !(1e-4..1e16).contains(&value) {
        let raw = format!("{:e}", value);
        let (mantissa, exponent) = raw.split_once('e').unwrap_or((raw.as_str(), "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.abs());
    }
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
