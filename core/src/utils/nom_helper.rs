/**
 * Registry.pol files are a flat stream of little endian integers and UTF16 text
 * These helpers take the bytes and convert them in one step
 */
use nom::{
    bytes::complete::take,
    number::complete::{be_u32, le_u16, le_u32, le_u64},
};
use std::mem::size_of;

pub(crate) enum Endian {
    /**Little Endian */
    Le,
    /**Big Endian */
    Be,
}

/**
 * Nom four (4) bytes to u32
 * Need to specify Endianess
 */
pub(crate) fn nom_unsigned_four_bytes(data: &[u8], endian: Endian) -> nom::IResult<&[u8], u32> {
    let (input, value_data) = take(size_of::<u32>())(data)?;

    let (_, value) = match endian {
        Endian::Le => le_u32(value_data)?,
        Endian::Be => be_u32(value_data)?,
    };
    Ok((input, value))
}

/**
 * Nom eight (8) little endian bytes to u64
 */
pub(crate) fn nom_unsigned_eight_bytes(data: &[u8]) -> nom::IResult<&[u8], u64> {
    let (input, value_data) = take(size_of::<u64>())(data)?;
    let (_, value) = le_u64(value_data)?;
    Ok((input, value))
}

/**
 * Nom one UTF16LE code unit
 */
pub(crate) fn nom_wide_char(data: &[u8]) -> nom::IResult<&[u8], u16> {
    let (input, value_data) = take(size_of::<u16>())(data)?;
    let (_, value) = le_u16(value_data)?;
    Ok((input, value))
}

/**
 * Nom UTF16LE code units until a NUL code unit. The NUL is consumed but not returned
 */
pub(crate) fn nom_wide_until_nul(data: &[u8]) -> nom::IResult<&[u8], Vec<u16>> {
    let mut units = Vec::new();
    let mut input = data;
    loop {
        let (remaining, unit) = nom_wide_char(input)?;
        input = remaining;
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    Ok((input, units))
}

/**
 * Nom an arbitrary amount of data and return the bytes remaining and bytes nom'd
 */
pub(crate) fn nom_data(data: &[u8], count: u64) -> nom::IResult<&[u8], &[u8]> {
    let (input, value) = take(count)(data)?;

    Ok((input, value))
}
