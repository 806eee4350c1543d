//! Appearance streams and string encodings for filled widgets

/// Resource name of the Helvetica font used in generated appearances
pub(crate) const FONT_RESOURCE: &str = "Helv";

const PADDING: f64 = 2.0;
const MAX_AUTO_SIZE: f64 = 12.0;
const MIN_AUTO_SIZE: f64 = 4.0;

/// Font size from a default appearance string such as `/Helv 10 Tf 0 g`.
/// `0 Tf` means auto-size and yields `None`.
pub(crate) fn font_size_from_da(da: &str) -> Option<f64> {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    let pos = tokens.iter().position(|t| *t == "Tf")?;
    let size: f64 = tokens.get(pos.checked_sub(1)?)?.parse().ok()?;
    (size > 0.0).then_some(size)
}

/// Content of a text field's normal appearance (`/Tx BMC ... EMC`)
pub(crate) fn text_appearance(
    value: &str,
    width: f64,
    height: f64,
    font_size: Option<f64>,
    multiline: bool,
) -> Vec<u8> {
    let size = font_size.unwrap_or_else(|| {
        if multiline {
            10.0
        } else {
            ((height - 2.0 * PADDING) * 0.8).clamp(MIN_AUTO_SIZE, MAX_AUTO_SIZE)
        }
    });

    let mut out = Vec::new();
    out.extend_from_slice(b"/Tx BMC\nq\n");
    out.extend_from_slice(
        format!(
            "{} {} {} {} re W n\n",
            fmt(1.0),
            fmt(1.0),
            fmt((width - 2.0).max(0.0)),
            fmt((height - 2.0).max(0.0))
        )
        .as_bytes(),
    );
    out.extend_from_slice(format!("BT\n/{FONT_RESOURCE} {} Tf\n0 g\n", fmt(size)).as_bytes());

    if multiline {
        let leading = size * 1.15;
        let top = height - PADDING - size;
        out.extend_from_slice(format!("{} {} Td\n", fmt(PADDING), fmt(top)).as_bytes());
        for (i, line) in value.split('\n').enumerate() {
            if i > 0 {
                out.extend_from_slice(format!("0 {} Td\n", fmt(-leading)).as_bytes());
            }
            push_show_text(&mut out, line.trim_end_matches('\r'));
        }
    } else {
        let baseline = ((height - size) / 2.0 + size * 0.22).max(PADDING);
        out.extend_from_slice(format!("{} {} Td\n", fmt(PADDING), fmt(baseline)).as_bytes());
        let single = value.replace(['\r', '\n'], " ");
        push_show_text(&mut out, &single);
    }

    out.extend_from_slice(b"ET\nQ\nEMC\n");
    out
}

fn push_show_text(out: &mut Vec<u8>, text: &str) {
    out.push(b'(');
    out.extend_from_slice(&escape_literal(&win_ansi_bytes(text)));
    out.extend_from_slice(b") Tj\n");
}

/// Bytes for a PDF text string: plain for ASCII, UTF-16BE with BOM otherwise
pub(crate) fn encode_text_string(value: &str) -> Vec<u8> {
    if value.is_ascii() {
        return value.as_bytes().to_vec();
    }
    let mut out = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Decode a PDF text string (UTF-16BE with BOM, else byte-per-char)
pub(crate) fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|b| *b as char).collect()
}

/// Encode for the WinAnsi-encoded Helvetica resource; unmappable chars become `?`
fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => match c {
                '€' => 0x80,
                '…' => 0x85,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '\t' => b' ',
                _ => b'?',
            },
        })
        .collect()
}

fn escape_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(b);
            }
            _ => out.push(b),
        }
    }
    out
}

/// Compact number formatting for content streams
pub(crate) fn fmt(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_size_from_da() {
        assert_eq!(font_size_from_da("/Helv 10 Tf 0 g"), Some(10.0));
        assert_eq!(font_size_from_da("0 g /F1 9.5 Tf"), Some(9.5));
        assert_eq!(font_size_from_da("/Helv 0 Tf 0 g"), None);
        assert_eq!(font_size_from_da("0 g"), None);
        assert_eq!(font_size_from_da("Tf"), None);
    }

    #[test]
    fn test_text_appearance_single_line() {
        let content = text_appearance("Ada (Lovelace)", 200.0, 20.0, Some(10.0), false);
        let text = String::from_utf8(content).unwrap();

        assert!(text.starts_with("/Tx BMC"));
        assert!(text.contains("/Helv 10 Tf"));
        assert!(text.contains("(Ada \\(Lovelace\\)) Tj"));
        assert!(text.trim_end().ends_with("EMC"));
    }

    #[test]
    fn test_text_appearance_multiline() {
        let content = text_appearance("one\ntwo", 200.0, 60.0, None, true);
        let text = String::from_utf8(content).unwrap();

        assert!(text.contains("(one) Tj"));
        assert!(text.contains("(two) Tj"));
        assert!(text.contains("0 -11.5 Td"));
    }

    #[test]
    fn test_text_string_round_trip() {
        assert_eq!(encode_text_string("Ada"), b"Ada".to_vec());
        let encoded = encode_text_string("Zoë");
        assert_eq!(&encoded[..2], &[0xFE, 0xFF]);
        assert_eq!(decode_text_string(&encoded), "Zoë");
        assert_eq!(decode_text_string(b"Name"), "Name");
    }

    #[test]
    fn test_win_ansi_fallback() {
        assert_eq!(win_ansi_bytes("é€漢"), vec![0xE9, 0x80, b'?']);
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(fmt(10.0), "10");
        assert_eq!(fmt(2.5), "2.5");
        assert_eq!(fmt(1.23456), "1.235");
        assert_eq!(fmt(-11.5), "-11.5");
    }
}
