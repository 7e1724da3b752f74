use super::{
    error::UtilError,
    strings::{extract_utf16_string, extract_utf8_string, utf16_be_to_string},
};
use crate::filesystem::files::read_file;
use log::error;

/// Read a XML file. This function will check for UTF16 encoding via Byte Order Mark (BOM)
pub(crate) fn read_xml(path: &str) -> Result<String, UtilError> {
    let bytes = match read_file(path) {
        Ok(result) => result,
        Err(err) => {
            error!("[gptcore] Could not read XML file at {path}: {err:?}");
            return Err(UtilError::ReadXml);
        }
    };
    decode_xml_bytes(&bytes)
}

/// Decode raw XML bytes. UTF16 files must start with a BOM, everything else is treated as UTF8
pub(crate) fn decode_xml_bytes(bytes: &[u8]) -> Result<String, UtilError> {
    if bytes.is_empty() {
        return Ok(String::new());
    }
    if bytes.len() < 2 {
        return Ok(extract_utf8_string(bytes));
    }

    let utf16_le = [0xff, 0xfe];
    let utf16_be = [0xfe, 0xff];

    if bytes.starts_with(&utf16_le) {
        return Ok(extract_utf16_string(&bytes[2..]));
    }
    if bytes.starts_with(&utf16_be) {
        return match utf16_be_to_string(&bytes[2..]) {
            Ok(result) => Ok(result),
            Err(err) => {
                error!("[gptcore] Could not decode UTF16BE XML data: {err:?}");
                Err(UtilError::UtfType)
            }
        };
    }

    Ok(extract_utf8_string(bytes))
}

#[cfg(test)]
mod tests {
    use crate::utils::encoding::{decode_xml_bytes, read_xml};
    use std::path::PathBuf;

    #[test]
    fn test_read_xml() {
        let mut test_location = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        test_location.push("tests/test_data/policies/basic/updates.admx");
        let result = read_xml(&test_location.display().to_string()).unwrap();
        assert!(result.contains("policyDefinitions"));
    }

    #[test]
    fn test_read_xml_missing() {
        assert!(read_xml("/this/file/does/not/exist.admx").is_err());
    }

    #[test]
    fn test_decode_xml_bytes_utf16_le() {
        let test = [0xff, 0xfe, 60, 0, 97, 0, 47, 0, 62, 0];
        assert_eq!(decode_xml_bytes(&test).unwrap(), "<a/>");
    }

    #[test]
    fn test_decode_xml_bytes_utf16_be() {
        let test = [0xfe, 0xff, 0, 60, 0, 97, 0, 47, 0, 62];
        assert_eq!(decode_xml_bytes(&test).unwrap(), "<a/>");
    }

    #[test]
    fn test_decode_xml_bytes_utf8() {
        assert_eq!(decode_xml_bytes(b"<a/>").unwrap(), "<a/>");
        assert_eq!(decode_xml_bytes(b"").unwrap(), "");
    }
}
