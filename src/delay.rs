/// Any mention of hours counts as exactly one hour, whatever the stated quantity.
const HOUR_MINUTES: u64 = 60;

const RANGE_SEPARATORS: &[char] = &['-', '–'];

/// Estimate delay minutes from a free-text description such as "15-30 minutes" or "45 min".
pub fn parse_delay(text: Option<&str>) -> u64 {
    let text = match text {
        Some(t) => t.trim().to_lowercase(),
        None => return 0,
    };

    if text.is_empty() {
        return 0;
    }

    if text.contains("hour") {
        return HOUR_MINUTES;
    }

    let Some((min, rest)) = leading_number(&text) else {
        return 0;
    };

    match range_upper_bound(rest) {
        Some(max) => average(min, max),
        None => min,
    }
}

/// Split a leading run of ASCII digits from `text`, saturating at `u64::MAX`.
fn leading_number(text: &str) -> Option<(u64, &str)> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    if end == 0 {
        return None;
    }

    let (digits, rest) = text.split_at(end);
    let value = digits.parse().unwrap_or(u64::MAX);
    Some((value, rest))
}

fn range_upper_bound(rest: &str) -> Option<u64> {
    let after_separator = rest.strip_prefix(RANGE_SEPARATORS)?;
    leading_number(after_separator).map(|(max, _)| max)
}

fn average(min: u64, max: u64) -> u64 {
    ((u128::from(min) + u128::from(max)) / 2) as u64
}
