/**
 * Registry.pol files contain the registry values a Group Policy writes.
 * Layout is a small header followed by entries until end of file:
 *   "PReg" signature, version (1)
 *   [key;value;type;size;data]
 * Brackets and semicolons are UTF16LE characters. Key and value names are NUL terminated UTF16LE
 */
use super::{error::RegistryError, types::RegType, value::EntryData};
use crate::utils::{
    nom_helper::{
        nom_data, nom_unsigned_eight_bytes, nom_unsigned_four_bytes, nom_wide_char,
        nom_wide_until_nul, Endian,
    },
    strings::{extract_utf16_string, string_to_utf16_le},
};
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use log::error;
use nom::error::{Error, ErrorKind};

pub(crate) const POL_SIGNATURE: u32 = 0x67655250; // PReg
pub(crate) const POL_VERSION: u32 = 1;

/// One `[key;value;type;size;data]` record
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PolEntry {
    pub(crate) key: String,
    pub(crate) value_name: String,
    pub(crate) reg_type: RegType,
    pub(crate) data: EntryData,
}

/// Parsed Registry.pol file
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PolFile {
    pub(crate) version: u32,
    pub(crate) entries: Vec<PolEntry>,
}

impl PolFile {
    /// Number of records in the file
    pub(crate) fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// Parse the bytes of a Registry.pol file
pub(crate) fn parse_pol(data: &[u8]) -> Result<PolFile, RegistryError> {
    let (input, (signature, version)) = match parse_header(data) {
        Ok(result) => result,
        Err(err) => {
            error!("[registry] Could not parse Registry.pol header: {err:?}");
            return Err(RegistryError::Parser);
        }
    };

    if signature != POL_SIGNATURE {
        error!("[registry] Registry.pol has unexpected signature {signature:#x}");
        return Err(RegistryError::BadSignature);
    }
    if version != POL_VERSION {
        error!("[registry] Registry.pol has unsupported version {version}");
        return Err(RegistryError::BadVersion);
    }

    let mut entries = Vec::new();
    let mut remaining = input;
    while !remaining.is_empty() {
        let (input, entry) = match parse_entry(remaining) {
            Ok(result) => result,
            Err(err) => {
                error!(
                    "[registry] Could not parse Registry.pol entry {}: {err:?}",
                    entries.len()
                );
                return Err(RegistryError::Parser);
            }
        };
        entries.push(entry);
        remaining = input;
    }

    Ok(PolFile { version, entries })
}

fn parse_header(data: &[u8]) -> nom::IResult<&[u8], (u32, u32)> {
    let (input, signature) = nom_unsigned_four_bytes(data, Endian::Le)?;
    let (input, version) = nom_unsigned_four_bytes(input, Endian::Le)?;
    Ok((input, (signature, version)))
}

fn parse_entry(data: &[u8]) -> nom::IResult<&[u8], PolEntry> {
    let (input, _) = expect_char(data, '[')?;
    let (input, key_units) = nom_wide_until_nul(input)?;
    let (input, _) = expect_char(input, ';')?;
    let (input, value_units) = nom_wide_until_nul(input)?;
    let (input, _) = expect_char(input, ';')?;
    let (input, type_code) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, _) = expect_char(input, ';')?;
    let (input, size) = nom_unsigned_four_bytes(input, Endian::Le)?;
    let (input, _) = expect_char(input, ';')?;
    let (input, raw) = nom_data(input, size as u64)?;
    let (input, _) = expect_char(input, ']')?;

    let reg_type = RegType::from_code(type_code);
    let (_, data) = parse_entry_data(raw, &reg_type)?;

    let entry = PolEntry {
        key: String::from_utf16_lossy(&key_units),
        value_name: String::from_utf16_lossy(&value_units),
        reg_type,
        data,
    };
    Ok((input, entry))
}

/// Consume one UTF16LE character and require it to be `expected`
fn expect_char(data: &[u8], expected: char) -> nom::IResult<&[u8], u16> {
    let (input, unit) = nom_wide_char(data)?;
    if unit != expected as u16 {
        return Err(nom::Err::Failure(Error::new(data, ErrorKind::Char)));
    }
    Ok((input, unit))
}

/// Interpret the data bytes of an entry based on the registry type
fn parse_entry_data<'a>(raw: &'a [u8], reg_type: &RegType) -> nom::IResult<&'a [u8], EntryData> {
    if raw.is_empty() {
        return Ok((raw, EntryData::Empty));
    }

    let data = match reg_type {
        RegType::Sz | RegType::ExpandSz | RegType::Link => {
            let text = extract_utf16_string(raw);
            EntryData::Text(text.trim_end_matches('\0').to_string())
        }
        RegType::Dword => {
            let (_, value) = nom_unsigned_four_bytes(raw, Endian::Le)?;
            EntryData::Integer(value as i64)
        }
        RegType::DwordBigEndian => {
            let (_, value) = nom_unsigned_four_bytes(raw, Endian::Be)?;
            EntryData::Integer(value as i64)
        }
        RegType::Qword => {
            let (_, value) = nom_unsigned_eight_bytes(raw)?;
            EntryData::Integer(value as i64)
        }
        RegType::None => EntryData::Empty,
        RegType::MultiSz
        | RegType::Binary
        | RegType::ResourceList
        | RegType::FullResourceDescriptor
        | RegType::ResourceRequirementsList
        | RegType::Unknown(_) => EntryData::Bytes(raw.to_vec()),
    };
    Ok((&[], data))
}

/// Build the bytes of a complete Registry.pol file
pub(crate) fn build_pol(entries: &[PolEntry]) -> Result<Vec<u8>, RegistryError> {
    let mut buffer = Vec::new();
    let header_result = write_header(&mut buffer);
    if let Err(err) = header_result {
        error!("[registry] Could not build Registry.pol header: {err:?}");
        return Err(RegistryError::BuildFile);
    }

    for entry in entries {
        if let Err(err) = write_entry(&mut buffer, entry) {
            error!(
                "[registry] Could not build Registry.pol entry {}\\{}: {err:?}",
                entry.key, entry.value_name
            );
            return Err(RegistryError::BuildFile);
        }
    }
    Ok(buffer)
}

fn write_header(buffer: &mut Vec<u8>) -> std::io::Result<()> {
    buffer.write_u32::<LittleEndian>(POL_SIGNATURE)?;
    buffer.write_u32::<LittleEndian>(POL_VERSION)
}

fn write_entry(buffer: &mut Vec<u8>, entry: &PolEntry) -> std::io::Result<()> {
    let data = entry_data_bytes(entry)?;

    buffer.write_u16::<LittleEndian>('[' as u16)?;
    buffer.extend_from_slice(&string_to_utf16_le(&entry.key, true));
    buffer.write_u16::<LittleEndian>(';' as u16)?;
    buffer.extend_from_slice(&string_to_utf16_le(&entry.value_name, true));
    buffer.write_u16::<LittleEndian>(';' as u16)?;
    buffer.write_u32::<LittleEndian>(entry.reg_type.code())?;
    buffer.write_u16::<LittleEndian>(';' as u16)?;
    buffer.write_u32::<LittleEndian>(data.len() as u32)?;
    buffer.write_u16::<LittleEndian>(';' as u16)?;
    buffer.extend_from_slice(&data);
    buffer.write_u16::<LittleEndian>(']' as u16)
}

/// Lay out the data bytes of an entry based on the registry type
fn entry_data_bytes(entry: &PolEntry) -> std::io::Result<Vec<u8>> {
    let mut data = Vec::new();
    match (&entry.reg_type, &entry.data) {
        (_, EntryData::Empty) | (RegType::None, _) => {}
        (RegType::Sz | RegType::ExpandSz | RegType::Link, EntryData::Text(text)) => {
            data = string_to_utf16_le(text, true);
        }
        (RegType::Sz | RegType::ExpandSz | RegType::Link, EntryData::Integer(number)) => {
            data = string_to_utf16_le(&number.to_string(), true);
        }
        (RegType::Dword, EntryData::Integer(number)) => {
            data.write_u32::<LittleEndian>(dword(*number)?);
        }
        (RegType::DwordBigEndian, EntryData::Integer(number)) => {
            data.write_u32::<BigEndian>(dword(*number)?);
        }
        (RegType::Qword, EntryData::Integer(number)) => {
            data.write_u64::<LittleEndian>(*number as u64)?;
        }
        (_, EntryData::Bytes(bytes)) => data.extend_from_slice(bytes),
        (_, EntryData::Text(text)) => data.extend_from_slice(text.as_bytes()),
        (_, EntryData::Integer(number)) => data.extend_from_slice(&number.to_le_bytes()),
    }
    Ok(data)
}

/// DWORD data must fit in an unsigned 32 bit integer
fn dword(number: i64) -> std::io::Result<u32> {
    match u32::try_from(number) {
        Ok(result) => Ok(result),
        Err(err) => Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{number} does not fit in a DWORD: {err}"),
        )),
    }
}
