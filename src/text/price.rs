use crate::record::PRICE_UNAVAILABLE;

/// Currency glyphs removed from price text
const CURRENCY_GLYPHS: &[char] = &[
    '₹', '₨', '$', '€', '£', '¥', '¢', '₩', '₽', '₺', '₦', '฿', '₱', '৳',
];

/// Word-like currency tokens removed from price text (matched case-insensitively)
const CURRENCY_TOKENS: &[&str] = &["rs", "inr"];

/// Normalizes scraped price text into a display string
///
/// Strips currency glyphs, the `Rs`/`Rs.`/`INR` tokens and digit-grouping
/// commas, then collapses whitespace. Everything else is preserved; the
/// result is not guaranteed to be numeric. Empty or fully stripped input
/// becomes `"N/A"`.
///
/// # Examples
///
/// ```
/// use medprice::text::normalize_price;
///
/// assert_eq!(normalize_price("Rs. 1,234.50"), "1234.50");
/// assert_eq!(normalize_price("₹ 99"), "99");
/// assert_eq!(normalize_price("Rs."), "N/A");
/// assert_eq!(normalize_price(""), "N/A");
/// ```
pub fn normalize_price(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut stripped = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if CURRENCY_GLYPHS.contains(&c) {
            i += 1;
            continue;
        }

        if let Some(len) = currency_token_at(&chars, i) {
            i += len;
            // "Rs." carries its abbreviation dot
            if chars.get(i) == Some(&'.') {
                i += 1;
            }
            continue;
        }

        if c == ',' && i > 0 && is_digit_at(&chars, i - 1) && is_grouping_comma(&chars, i) {
            i += 1;
            continue;
        }

        stripped.push(c);
        i += 1;
    }

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        PRICE_UNAVAILABLE.to_string()
    } else {
        collapsed
    }
}

/// Extracts the first number in a price string
///
/// Permissive counterpart to [`normalize_price`] for callers that sort or
/// filter on price: grouping commas are ignored and anything after the first
/// numeric run is discarded.
///
/// # Examples
///
/// ```
/// use medprice::text::parse_price_value;
///
/// assert_eq!(parse_price_value("1234.50"), Some(1234.5));
/// assert_eq!(parse_price_value("MRP ₹1,099 (10% off)"), Some(1099.0));
/// assert_eq!(parse_price_value("N/A"), None);
/// ```
pub fn parse_price_value(text: &str) -> Option<f64> {
    let chars: Vec<char> = text.chars().collect();
    let start = chars.iter().position(|c| c.is_ascii_digit())?;

    let mut number = String::new();
    let mut seen_dot = false;
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            c if c.is_ascii_digit() => number.push(c),
            ',' if is_grouping_comma(&chars, i) => {}
            '.' if !seen_dot && is_digit_at(&chars, i + 1) => {
                seen_dot = true;
                number.push('.');
            }
            _ => break,
        }
        i += 1;
    }

    number.parse().ok()
}

/// Length of a currency token starting at `i`, if one stands there as a whole word
fn currency_token_at(chars: &[char], i: usize) -> Option<usize> {
    if i > 0 && chars[i - 1].is_alphabetic() {
        return None;
    }

    CURRENCY_TOKENS.iter().find_map(|token| {
        let len = token.chars().count();
        let candidate = chars.get(i..i + len)?;
        let matches = candidate
            .iter()
            .zip(token.chars())
            .all(|(c, t)| c.to_ascii_lowercase() == t);
        let followed_by_letter = chars.get(i + len).is_some_and(|c| c.is_alphabetic());

        (matches && !followed_by_letter).then_some(len)
    })
}

/// A comma followed by a 3-digit group, or a 2-digit group continuing into
/// another comma (lakh grouping such as `1,23,456`)
fn is_grouping_comma(chars: &[char], i: usize) -> bool {
    let group = chars[i + 1..]
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .count();
    let next = chars.get(i + 1 + group);

    group == 3 || (group == 2 && next == Some(&','))
}

fn is_digit_at(chars: &[char], i: usize) -> bool {
    chars.get(i).is_some_and(|c| c.is_ascii_digit())
}
