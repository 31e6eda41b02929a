/// Format a value for a display unit.
///
/// Covers the units the charts actually use; anything else renders as a
/// plain decimal.
pub fn format_value(unit: &str, value: f64, decimals: usize) -> String {
    match unit {
        "" | "none" | "short" => short(value, decimals),
        "ops" => format!("{} ops", short(value, decimals)),
        "bytes" => binary_bytes(value, decimals),
        "percent" => format!("{value:.decimals$}%"),
        "percentunit" => format!("{:.decimals$}%", value * 100.0),
        "s" | "seconds" => seconds(value, decimals),
        _ => format!("{value:.decimals$}"),
    }
}

/// Short scale: 1234 -> "1.2 K".
fn short(value: f64, decimals: usize) -> String {
    const SUFFIXES: &[&str] = &["", " K", " Mil", " Bil", " Tri"];
    scaled(value, decimals, 1000.0, SUFFIXES)
}

/// Binary byte scale: 1536 -> "1.5 KiB".
fn binary_bytes(value: f64, decimals: usize) -> String {
    const SUFFIXES: &[&str] = &[" B", " KiB", " MiB", " GiB", " TiB", " PiB"];
    scaled(value, decimals, 1024.0, SUFFIXES)
}

fn scaled(value: f64, decimals: usize, base: f64, suffixes: &[&str]) -> String {
    let mut scaled = value;
    let mut idx = 0;
    while scaled.abs() >= base && idx < suffixes.len() - 1 {
        scaled /= base;
        idx += 1;
    }
    format!("{scaled:.decimals$}{}", suffixes[idx])
}

/// Duration scale around a base of seconds.
fn seconds(value: f64, decimals: usize) -> String {
    let abs = value.abs();
    if abs == 0.0 {
        return format!("{value:.decimals$} s");
    }
    if abs < 1e-6 {
        format!("{:.decimals$} ns", value * 1e9)
    } else if abs < 1e-3 {
        format!("{:.decimals$} \u{00b5}s", value * 1e6)
    } else if abs < 1.0 {
        format!("{:.decimals$} ms", value * 1e3)
    } else if abs < 60.0 {
        format!("{value:.decimals$} s")
    } else if abs < 3600.0 {
        format!("{:.decimals$} min", value / 60.0)
    } else {
        format!("{:.decimals$} hour", value / 3600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_scales_by_thousands() {
        assert_eq!(format_value("short", 0.0, 1), "0.0");
        assert_eq!(format_value("short", 1234.0, 1), "1.2 K");
        assert_eq!(format_value("short", 2_500_000.0, 1), "2.5 Mil");
        assert_eq!(format_value("short", 3_000_000_000.0, 0), "3 Bil");
    }

    #[test]
    fn test_bytes_scale_is_binary() {
        assert_eq!(format_value("bytes", 512.0, 0), "512 B");
        assert_eq!(format_value("bytes", 1536.0, 1), "1.5 KiB");
        assert_eq!(format_value("bytes", 1048576.0, 0), "1 MiB");
    }

    #[test]
    fn test_percent_variants() {
        assert_eq!(format_value("percent", 42.5, 1), "42.5%");
        assert_eq!(format_value("percentunit", 0.425, 1), "42.5%");
    }

    #[test]
    fn test_seconds_scales_both_directions() {
        assert_eq!(format_value("s", 0.0005, 1), "0.5 ms");
        assert_eq!(format_value("s", 0.000002, 0), "2 \u{00b5}s");
        assert_eq!(format_value("s", 12.0, 1), "12.0 s");
        assert_eq!(format_value("s", 90.0, 1), "1.5 min");
        assert_eq!(format_value("s", 7200.0, 0), "2 hour");
    }

    #[test]
    fn test_unknown_unit_is_plain_decimal() {
        assert_eq!(format_value("connections", 17.25, 1), "17.2");
    }

    #[test]
    fn test_negative_values_keep_sign() {
        assert_eq!(format_value("short", -1234.0, 1), "-1.2 K");
        assert_eq!(format_value("s", -0.25, 0), "-250 ms");
    }
}
