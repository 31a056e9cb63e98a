/// Largest value a register can hold.
pub const MAX_VALUE: u8 = u8::MAX;

/// Raw input arriving from a numeric field, a fragment entry, or a
/// programmatic caller, before it is coerced into a register value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    Text(&'a str),
    Integer(i64),
    Float(f64),
}

impl<'a> From<&'a str> for RawValue<'a> {
    fn from(s: &'a str) -> Self {
        RawValue::Text(s)
    }
}

impl<'a> From<&'a String> for RawValue<'a> {
    fn from(s: &'a String) -> Self {
        RawValue::Text(s.as_str())
    }
}

impl From<f64> for RawValue<'_> {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

macro_rules! raw_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for RawValue<'_> {
                fn from(v: $t) -> Self {
                    RawValue::Integer(v as i64)
                }
            }
        )*
    };
}

raw_from_int!(u8, u16, u32, i8, i16, i32, i64);

impl From<usize> for RawValue<'_> {
    fn from(v: usize) -> Self {
        RawValue::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

/// Coerce raw input into a register value.
///
/// Never fails: unparseable input becomes 0 and anything outside
/// `0..=255` is clamped to the nearest bound.
pub fn coerce<'a>(raw: impl Into<RawValue<'a>>) -> u8 {
    match raw.into() {
        RawValue::Text(s) => parse_leading_int(s).map_or(0, clamp),
        RawValue::Integer(v) => clamp(v),
        RawValue::Float(v) => {
            if v.is_nan() {
                0
            } else {
                // `as` saturates at the i64 bounds and truncates toward zero.
                clamp(v.trunc() as i64)
            }
        }
    }
}

/// Clamp an integer into `0..=255`.
pub fn clamp(v: i64) -> u8 {
    v.clamp(0, MAX_VALUE as i64) as u8
}

/// Parse the leading integer of a field value.
///
/// Reads like a browser's `parseInt(s, 10)`: skips leading whitespace,
/// accepts one optional sign, then consumes decimal digits up to the
/// first non-digit. Returns `None` when no digit was read. Digit runs
/// too long for an `i64` saturate, which still clamps correctly.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut seen = false;
    let mut acc: i64 = 0;
    for b in digits.bytes() {
        if !b.is_ascii_digit() {
            break;
        }
        seen = true;
        acc = acc.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }

    if !seen {
        return None;
    }
    Some(if negative { -acc } else { acc })
}
