//! crates/logging/src/format/printf.rs
//! printf-style substitution over typed arguments.
//!
//! Supported verbs: `%v %s %q %d %i %x %X %o %b %c %t %f %F %e %E %g %G` and the
//! literal `%%`. Flags `-`, `+`, `0`, space and `#` may precede an optional width
//! and `.precision`. Problems never fail the call; they are rendered inline:
//!
//! | Problem | Output |
//! |---------|--------|
//! | argument of the wrong type | `%!d(string=abc)` |
//! | missing argument | `%!s(MISSING)` |
//! | unused arguments | `%!(EXTRA int=1, string=x)` |
//! | `%` at the end of the template | `%!(NOVERB)` |

use std::fmt::{self, Write as _};

/// Largest width or precision honoured; larger values are clamped.
const MAX_WIDTH: usize = 1_000_000;

/// A single printf argument.
///
/// Most primitive types convert with [`From`]; anything implementing
/// [`Display`](fmt::Display) can be passed with [`Arg::display`].
///
/// # Examples
///
/// ```
/// use logging::{Arg, sprintf};
///
/// let user = "ada";
/// let text = sprintf("%s logged in %d times", &[user.into(), 3.into()]);
/// assert_eq!(text, "ada logged in 3 times");
/// ```
#[derive(Clone, Copy)]
pub enum Arg<'a> {
    /// Text.
    Str(&'a str),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Unicode scalar value.
    Char(char),
    /// Any displayable value, formatted like a string.
    Display(&'a dyn fmt::Display),
}

impl<'a> Arg<'a> {
    /// Wraps a [`Display`](fmt::Display) value.
    pub fn display(value: &'a dyn fmt::Display) -> Self {
        Self::Display(value)
    }

    /// Name of the argument's type as shown in error markers.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "string",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float64",
            Self::Bool(_) => "bool",
            Self::Char(_) => "int32",
            Self::Display(_) => "display",
        }
    }
}

impl fmt::Debug for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => f.debug_tuple("Str").field(value).finish(),
            Self::Int(value) => f.debug_tuple("Int").field(value).finish(),
            Self::Uint(value) => f.debug_tuple("Uint").field(value).finish(),
            Self::Float(value) => f.debug_tuple("Float").field(value).finish(),
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Char(value) => f.debug_tuple("Char").field(value).finish(),
            Self::Display(value) => f.debug_tuple("Display").field(&value.to_string()).finish(),
        }
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(value)
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(value: &'a String) -> Self {
        Self::Str(value.as_str())
    }
}

macro_rules! arg_from {
    ($variant:ident as $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for Arg<'_> {
                fn from(value: $source) -> Self {
                    Self::$variant(<$target>::from(value))
                }
            }
        )+
    };
}

arg_from!(Int as i64: i8, i16, i32, i64);
arg_from!(Uint as u64: u8, u16, u32, u64);
arg_from!(Float as f64: f32, f64);
arg_from!(Bool as bool: bool);
arg_from!(Char as char: char);

impl From<isize> for Arg<'_> {
    fn from(value: isize) -> Self {
        i64::try_from(value).map_or(Self::Float(value as f64), Self::Int)
    }
}

impl From<usize> for Arg<'_> {
    fn from(value: usize) -> Self {
        u64::try_from(value).map_or(Self::Float(value as f64), Self::Uint)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Spec {
    minus: bool,
    plus: bool,
    zero: bool,
    space: bool,
    sharp: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Substitutes `args` into `template`.
///
/// Unlike C's `printf`, this never reads past the argument list or
/// misinterprets an argument's type; mismatches are spelled out in the output.
///
/// # Examples
///
/// ```
/// use logging::{Arg, sprintf};
///
/// assert_eq!(sprintf("%05.1f|%-4s|%x", &[3.14159.into(), "ab".into(), 255.into()]), "003.1|ab  |ff");
/// assert_eq!(sprintf("%d", &[Arg::Str("seven")]), "%!d(string=seven)");
/// assert_eq!(sprintf("%s and %s", &["one".into()]), "one and %!s(MISSING)");
/// ```
#[must_use]
pub fn sprintf(template: &str, args: &[Arg<'_>]) -> String {
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut next = 0;
    let mut rest = template;

    while let Some(position) = rest.find('%') {
        out.push_str(&rest[..position]);
        let (spec, verb, consumed) = parse_directive(&rest[position + 1..]);
        rest = &rest[position + 1 + consumed..];

        match verb {
            None => out.push_str("%!(NOVERB)"),
            Some('%') => out.push('%'),
            Some(verb) => match args.get(next) {
                Some(arg) => {
                    next += 1;
                    format_arg(&mut out, &spec, verb, arg);
                }
                None => {
                    let _ = write!(out, "%!{verb}(MISSING)");
                }
            },
        }
    }
    out.push_str(rest);

    if let Some(extra) = args.get(next..).filter(|extra| !extra.is_empty()) {
        out.push_str("%!(EXTRA ");
        for (index, arg) in extra.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}={}", arg.type_name(), plain_value(arg));
        }
        out.push(')');
    }
    out
}

/// Parses the flags, width, precision and verb following a `%`.
///
/// Returns the verb (if any) and the number of bytes consumed.
fn parse_directive(input: &str) -> (Spec, Option<char>, usize) {
    let bytes = input.as_bytes();
    let mut spec = Spec::default();
    let mut index = 0;

    while let Some(byte) = bytes.get(index) {
        match byte {
            b'-' => spec.minus = true,
            b'+' => spec.plus = true,
            b'0' => spec.zero = true,
            b' ' => spec.space = true,
            b'#' => spec.sharp = true,
            _ => break,
        }
        index += 1;
    }

    let (width, used) = parse_number(&bytes[index..]);
    spec.width = width;
    index += used;

    if bytes.get(index) == Some(&b'.') {
        index += 1;
        let (precision, used) = parse_number(&bytes[index..]);
        spec.precision = Some(precision.unwrap_or(0));
        index += used;
    }

    match input[index..].chars().next() {
        Some(verb) => (spec, Some(verb), index + verb.len_utf8()),
        None => (spec, None, index),
    }
}

fn parse_number(bytes: &[u8]) -> (Option<usize>, usize) {
    let digits = bytes.iter().take_while(|byte| byte.is_ascii_digit()).count();
    if digits == 0 {
        return (None, 0);
    }
    let value = bytes[..digits].iter().fold(0usize, |acc, digit| {
        acc.saturating_mul(10)
            .saturating_add(usize::from(digit - b'0'))
    });
    (Some(value.min(MAX_WIDTH)), digits)
}

fn format_arg(out: &mut String, spec: &Spec, verb: char, arg: &Arg<'_>) {
    let rendered = match (verb, *arg) {
        ('v' | 's', Arg::Str(text)) => Some(limit_chars(text, spec.precision).to_owned()),
        ('v' | 's', Arg::Display(value)) => {
            let text = value.to_string();
            Some(limit_chars(&text, spec.precision).to_owned())
        }
        ('v' | 's', Arg::Char(ch)) => Some(ch.to_string()),
        ('q', Arg::Str(text)) => Some(format!("{text:?}")),
        ('q', Arg::Display(value)) => Some(format!("{:?}", value.to_string())),
        ('x' | 'X', Arg::Str(text)) => Some(hex_bytes(text.as_bytes(), verb == 'X', spec.sharp)),
        ('x' | 'X', Arg::Display(value)) => Some(hex_bytes(
            value.to_string().as_bytes(),
            verb == 'X',
            spec.sharp,
        )),
        ('v' | 'd' | 'i' | 'x' | 'X' | 'o' | 'b', Arg::Int(value)) => {
            Some(format_integer(spec, verb, value < 0, value.unsigned_abs()))
        }
        ('v' | 'd' | 'i' | 'x' | 'X' | 'o' | 'b', Arg::Uint(value)) => {
            Some(format_integer(spec, verb, false, value))
        }
        ('d' | 'i' | 'x' | 'X' | 'o' | 'b', Arg::Char(ch)) => {
            Some(format_integer(spec, verb, false, u64::from(u32::from(ch))))
        }
        ('c', Arg::Char(ch)) => Some(ch.to_string()),
        ('c', Arg::Int(value)) => Some(char_from_code(u64::try_from(value).ok()).to_string()),
        ('c', Arg::Uint(value)) => Some(char_from_code(Some(value)).to_string()),
        ('q', Arg::Char(ch)) => Some(format!("{ch:?}")),
        ('q', Arg::Int(value)) => Some(format!("{:?}", char_from_code(u64::try_from(value).ok()))),
        ('q', Arg::Uint(value)) => Some(format!("{:?}", char_from_code(Some(value)))),
        ('v' | 'f' | 'F' | 'e' | 'E' | 'g' | 'G', Arg::Float(value)) => {
            Some(format_float(spec, verb, value))
        }
        ('v' | 't', Arg::Bool(value)) => Some(value.to_string()),
        _ => None,
    };

    match rendered {
        Some(text) => pad(out, spec, &text),
        None => {
            let _ = write!(
                out,
                "%!{verb}({}={})",
                arg.type_name(),
                plain_value(arg)
            );
        }
    }
}

/// Renders an argument the way `%v` does with no flags.
fn plain_value(arg: &Arg<'_>) -> String {
    let mut out = String::new();
    format_arg(&mut out, &Spec::default(), 'v', arg);
    out
}

fn limit_chars(text: &str, precision: Option<usize>) -> &str {
    match precision.and_then(|limit| text.char_indices().nth(limit)) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

fn char_from_code(code: Option<u64>) -> char {
    code.and_then(|code| u32::try_from(code).ok())
        .and_then(char::from_u32)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn hex_bytes(bytes: &[u8], upper: bool, sharp: bool) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + 2);
    if sharp {
        out.push_str(if upper { "0X" } else { "0x" });
    }
    for byte in bytes {
        let _ = if upper {
            write!(out, "{byte:02X}")
        } else {
            write!(out, "{byte:02x}")
        };
    }
    out
}

fn sign_of(spec: &Spec, negative: bool) -> &'static str {
    if negative {
        "-"
    } else if spec.plus {
        "+"
    } else if spec.space {
        " "
    } else {
        ""
    }
}

/// Joins sign, prefix and digits, zero-filling between them when requested.
fn zero_fill(spec: &Spec, head: &str, digits: &str, allow_zero: bool) -> String {
    let mut out = String::from(head);
    if allow_zero && spec.zero && !spec.minus {
        if let Some(width) = spec.width {
            let used = head.chars().count() + digits.chars().count();
            out.extend(std::iter::repeat_n('0', width.saturating_sub(used)));
        }
    }
    out.push_str(digits);
    out
}

fn format_integer(spec: &Spec, verb: char, negative: bool, magnitude: u64) -> String {
    let (mut digits, prefix) = match verb {
        'x' => (format!("{magnitude:x}"), "0x"),
        'X' => (format!("{magnitude:X}"), "0X"),
        'o' => (format!("{magnitude:o}"), "0"),
        'b' => (format!("{magnitude:b}"), "0b"),
        _ => (magnitude.to_string(), ""),
    };

    if let Some(precision) = spec.precision {
        if precision == 0 && magnitude == 0 {
            digits.clear();
        } else if digits.len() < precision {
            digits.insert_str(0, &"0".repeat(precision - digits.len()));
        }
    }

    let mut head = String::from(sign_of(spec, negative));
    if spec.sharp {
        head.push_str(prefix);
    }
    zero_fill(spec, &head, &digits, spec.precision.is_none())
}

fn format_float(spec: &Spec, verb: char, value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_owned();
    }

    let magnitude = value.abs();
    let body = match verb {
        'f' | 'F' => format!("{magnitude:.*}", spec.precision.unwrap_or(6)),
        'e' | 'E' => {
            let raw = format!("{magnitude:.*e}", spec.precision.unwrap_or(6));
            exponent_form(&raw, verb == 'E', true)
        }
        _ => general_form(magnitude, spec.precision, spec.sharp, verb == 'G'),
    };
    zero_fill(spec, sign_of(spec, value < 0.0), &body, true)
}

/// Splits Rust's `1.5e3` rendering into mantissa and exponent.
fn split_exponent(raw: &str) -> (&str, i32) {
    match raw.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse().unwrap_or(0)),
        None => (raw, 0),
    }
}

/// Rewrites `1.5e3` as `1.5e+03`.
fn exponent_form(raw: &str, upper: bool, keep_zeros: bool) -> String {
    let (mantissa, exponent) = split_exponent(raw);
    let mantissa = if keep_zeros {
        mantissa
    } else {
        trim_fraction(mantissa)
    };
    format!(
        "{mantissa}{}{}{:02}",
        if upper { 'E' } else { 'e' },
        if exponent < 0 { '-' } else { '+' },
        exponent.unsigned_abs()
    )
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// `%g`: exponent notation for very small or large values, plain otherwise.
///
/// Without a precision the shortest round-tripping digits are used and the
/// switch to exponent notation happens at 1e+06, as in Go's `fmt`.
fn general_form(magnitude: f64, precision: Option<usize>, sharp: bool, upper: bool) -> String {
    match precision {
        None => {
            let raw = format!("{magnitude:e}");
            let (_, exponent) = split_exponent(&raw);
            if !(-4..6).contains(&exponent) {
                exponent_form(&raw, upper, true)
            } else {
                format!("{magnitude}")
            }
        }
        Some(precision) => {
            let significant = precision.max(1);
            let raw = format!("{magnitude:.*e}", significant - 1);
            let (_, exponent) = split_exponent(&raw);
            let limit = i32::try_from(significant).unwrap_or(i32::MAX);
            if exponent < -4 || exponent >= limit {
                exponent_form(&raw, upper, sharp)
            } else {
                let decimals = usize::try_from(limit - 1 - exponent).unwrap_or(0);
                let fixed = format!("{magnitude:.decimals$}");
                if sharp {
                    fixed
                } else {
                    trim_fraction(&fixed).to_owned()
                }
            }
        }
    }
}

fn pad(out: &mut String, spec: &Spec, text: &str) {
    let width = spec.width.unwrap_or(0);
    let len = text.chars().count();
    if len >= width {
        out.push_str(text);
    } else if spec.minus {
        out.push_str(text);
        out.extend(std::iter::repeat_n(' ', width - len));
    } else {
        out.extend(std::iter::repeat_n(' ', width - len));
        out.push_str(text);
    }
}
