//! Utility functions.

/// Format an integer with thousands separators, e.g. `1,234,567`.
pub fn pretty_int(num: i64) -> String {
    let digits = num.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if num < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_int() {
        assert_eq!(pretty_int(0), "0");
        assert_eq!(pretty_int(999), "999");
        assert_eq!(pretty_int(1000), "1,000");
        assert_eq!(pretty_int(1_234_567), "1,234,567");
        assert_eq!(pretty_int(-45_000), "-45,000");
    }
}
