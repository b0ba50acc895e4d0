//! Display formatting and input coercion helpers.

/// Format a second count as `MM:SS`.
///
/// Minutes are zero-padded to two digits but are not capped, so a two hour
/// focus block renders as `120:00`.
pub fn format_mm_ss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Parse an `MM:SS` string back into seconds.
///
/// Returns `None` when the seconds part is missing or not below 60.
pub fn parse_mm_ss(s: &str) -> Option<u64> {
    let (min, sec) = s.trim().split_once(':')?;
    let min: u64 = min.parse().ok()?;
    let sec: u64 = sec.parse().ok()?;
    if sec >= 60 {
        return None;
    }
    min.checked_mul(60)?.checked_add(sec)
}

/// Coerce raw user input into an integer within `[min, max]`.
///
/// Parsing is lenient: leading whitespace, an optional sign and the leading
/// run of decimal digits are taken (`"12abc"` is 12). Anything without digits
/// resolves to `min`. The result is always inside the bounds.
pub fn clamp_int(raw: &str, min: i64, max: i64) -> i64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let n = parse_int_prefix(raw).unwrap_or(lo);
    n.clamp(lo, hi)
}

/// Leading-integer parse; saturates on overflow instead of failing.
fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let run: &str = {
        let end = digits
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(digits.len());
        &digits[..end]
    };
    if run.is_empty() {
        return None;
    }

    let mut n: i64 = 0;
    for b in run.bytes() {
        n = n.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    Some(if negative { -n } else { n })
}
