use log::warn;
use std::string::FromUtf16Error;

/// Convert little endian UTF16 bytes into a `String`. A trailing odd byte is ignored
pub(crate) fn utf16_le_to_string(data: &[u8]) -> Result<String, FromUtf16Error> {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units)
}

/// Convert big endian UTF16 bytes into a `String`
pub(crate) fn utf16_be_to_string(data: &[u8]) -> Result<String, FromUtf16Error> {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units)
}

/// Get a UTF16LE string, replacing invalid surrogates instead of failing
pub(crate) fn extract_utf16_string(data: &[u8]) -> String {
    match utf16_le_to_string(data) {
        Ok(result) => result,
        Err(err) => {
            warn!("[strings] Failed to get UTF16 string: {err:?}");
            let units: Vec<u16> = data
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
    }
}

/// Encode a string as UTF16LE bytes, optionally followed by a NUL terminator
pub(crate) fn string_to_utf16_le(value: &str, terminate: bool) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((value.len() + 1) * 2);
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    if terminate {
        bytes.extend_from_slice(&[0, 0]);
    }
    bytes
}

/// Get a UTF8 string. Invalid UTF8 is replaced and a leading byte order mark is dropped
pub(crate) fn extract_utf8_string(data: &[u8]) -> String {
    let bom = [0xef, 0xbb, 0xbf];
    let data = data.strip_prefix(&bom).unwrap_or(data);
    match String::from_utf8(data.to_vec()) {
        Ok(result) => result,
        Err(err) => {
            warn!("[strings] Failed to get UTF8 string: {err:?}");
            String::from_utf8_lossy(data).to_string()
        }
    }
}
