#[macro_export]
macro_rules! regex_oncelock {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        #[allow(clippy::regex_creation_in_loops)] // false positive as we use oncelock
        RE.get_or_init(|| regex::Regex::new($re).expect("Invalid regex"))
    }};
}

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Byte count as megabytes with two decimals, e.g. `57.22MB`.
pub fn format_mb(bytes: u64) -> String {
    #[allow(clippy::cast_precision_loss)]
    let mb = bytes as f64 / BYTES_PER_MB;
    format!("{mb:.2}MB")
}

/// Byte limit as whole megabytes when it divides evenly, e.g. `50MB`.
pub fn format_limit_mb(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else {
        format_mb(bytes)
    }
}

/// Lowercases `s` into `buf`, reusing its allocation.
#[inline]
pub fn to_lowercase_into(s: &str, buf: &mut String) {
    buf.clear();
    for c in s.chars() {
        for lc in c.to_lowercase() {
            buf.push(lc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_mb() {
        assert_eq!(format_mb(60_000_000), "57.22MB");
        assert_eq!(format_mb(0), "0.00MB");
    }

    #[test]
    fn test_format_limit_mb() {
        assert_eq!(format_limit_mb(50 * 1024 * 1024), "50MB");
        assert_eq!(format_limit_mb(1_500_000), "1.43MB");
    }

    #[test]
    fn test_to_lowercase_into_reuses_buffer() {
        let mut buf = String::from("leftover");
        to_lowercase_into("Stranger THINGS", &mut buf);
        assert_eq!(buf, "stranger things");
        to_lowercase_into("ÉCOLE", &mut buf);
        assert_eq!(buf, "école");
    }
}
