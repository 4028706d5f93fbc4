// SPDX-License-Identifier: MIT

pub fn pretty_bytes(n: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut val = n as f64;
    let mut idx = 0usize;
    while val >= 1024.0 && idx + 1 < UNITS.len() {
        val /= 1024.0;
        idx += 1;
    }
    if idx == 0 {
        format!("{n} {}", UNITS[0])
    } else {
        format!("{val:.1} {}", UNITS[idx])
    }
}

/// Renders `bytes` for the terminal, replacing invalid UTF-8.
pub fn printable(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_bytes() {
        assert_eq!(pretty_bytes(0), "0 B");
        assert_eq!(pretty_bytes(1023), "1023 B");
        assert_eq!(pretty_bytes(4096), "4.0 KiB");
        assert_eq!(pretty_bytes(32 * 1024 * 1024), "32.0 MiB");
    }
}
