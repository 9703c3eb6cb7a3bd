use crate::error::{IceError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use winnow::{
    ModalResult, Parser,
    error::{ContextError, ErrMode, StrContext},
    stream::AsChar,
    token::{any, take_while},
};

/// Raw capture time fields as they appear in a photo name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

fn field<'a>(width: usize, label: &'static str) -> impl Parser<&'a str, u32, ErrMode<ContextError>> {
    take_while(width, AsChar::is_dec_digit)
        .parse_to()
        .context(StrContext::Label(label))
}

fn separator(input: &mut &str) -> ModalResult<char> {
    any.context(StrContext::Label("separator")).parse_next(input)
}

/// Parses `YYYY?MM?DD?hhmmss`, where `?` is any single separator character.
///
/// Trailing input (file extension, sequence suffixes) is left unconsumed.
pub fn parse_timestamp_fields(input: &mut &str) -> ModalResult<TimestampFields> {
    let year = field(4, "year").parse_next(input)?;
    separator.parse_next(input)?;
    let month = field(2, "month").parse_next(input)?;
    separator.parse_next(input)?;
    let day = field(2, "day").parse_next(input)?;
    separator.parse_next(input)?;
    let hour = field(2, "hour").parse_next(input)?;
    let minute = field(2, "minute").parse_next(input)?;
    let second = field(2, "second").parse_next(input)?;

    Ok(TimestampFields {
        year: year as i32,
        month,
        day,
        hour,
        minute,
        second,
    })
}

/// Capture time encoded in `file_name`, starting `offset` characters in.
pub fn timestamp_from_file_name(file_name: &str, offset: usize) -> Result<NaiveDateTime> {
    let failure = |reason: String| IceError::Timestamp {
        file_name: file_name.to_string(),
        reason,
    };

    let byte_offset = file_name
        .char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .ok_or_else(|| failure(format!("name is shorter than offset {offset}")))?;
    let mut input = &file_name[byte_offset..];

    let fields = parse_timestamp_fields(&mut input).map_err(|e| failure(e.to_string()))?;
    NaiveDate::from_ymd_opt(fields.year, fields.month, fields.day)
        .and_then(|date| date.and_hms_opt(fields.hour, fields.minute, fields.second))
        .ok_or_else(|| failure(format!("{fields:?} is not a valid calendar time")))
}
