//! CRC-8 fingerprint of application names.
//!
//! Polynomial 0x07, initial register 0xFF, no input/output reflection and no
//! final XOR. Only ever used as a lookup key, never as an identity.

const POLY: u8 = 0x07;
const INIT: u8 = 0xFF;

const TABLE: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Fingerprint an application name over its raw UTF-8 bytes.
pub fn fingerprint(name: &str) -> u8 {
    name.as_bytes()
        .iter()
        .fold(INIT, |crc, &byte| TABLE[(crc ^ byte) as usize])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(fingerprint("123456789"), 0xFB);
    }

    #[test]
    fn test_empty_name_is_initial_register() {
        assert_eq!(fingerprint(""), 0xFF);
    }

    #[test]
    fn test_known_values() {
        assert_eq!(fingerprint("chrome.exe"), 0x6F);
        assert_eq!(fingerprint("firefox"), 0xE7);
        assert_eq!(fingerprint("a"), 0xD3);
    }

    #[test]
    fn test_unicode_uses_raw_bytes() {
        // "é" is 0xC3 0xA9 in UTF-8
        assert_eq!(fingerprint("é"), 0x53);
        assert_ne!(fingerprint("é"), fingerprint("e"));
    }

    #[test]
    fn test_deterministic() {
        for name in ["", "gedit", "sublime_text.exe", "日本語"] {
            assert_eq!(fingerprint(name), fingerprint(name));
        }
    }

    #[test]
    fn test_table_matches_bitwise() {
        fn bitwise(data: &[u8]) -> u8 {
            let mut crc = INIT;
            for &byte in data {
                crc ^= byte;
                for _ in 0..8 {
                    crc = if crc & 0x80 != 0 {
                        (crc << 1) ^ POLY
                    } else {
                        crc << 1
                    };
                }
            }
            crc
        }

        for name in ["FoxitReader", "wps.exe", "notify-osd", "Typora.exe"] {
            assert_eq!(fingerprint(name), bitwise(name.as_bytes()));
        }
    }
}
