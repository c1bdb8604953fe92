// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! ASN.1 primitives shared by the other modules.

This holds the time types (`Time`, `UtcTime`, `GeneralizedTime`) and a few
helpers for capturing `ANY` values and emitting raw tag-length-value headers.
*/

use {
    bcder::{
        decode::{Constructed, Content, DecodeError, Primitive, SliceSource, Source},
        encode::{PrimitiveContent, Values},
        Captured, Integer, Mode, OctetString, Tag,
    },
    chrono::{Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike},
    std::{convert::Infallible, io::Write, str::FromStr},
};

/// Capture the next value in a constructed value, whatever its tag.
///
/// Returns `None` when the constructed value is exhausted.
pub fn take_opt_captured<S: Source>(
    cons: &mut Constructed<S>,
) -> Result<Option<Captured>, DecodeError<S::Error>> {
    let captured = cons.capture(|cons| {
        cons.take_opt_value(|_, content| match content {
            Content::Primitive(prim) => prim.skip_all(),
            Content::Constructed(inner) => inner.skip_all(),
        })?;

        Ok(())
    })?;

    if captured.as_slice().is_empty() {
        Ok(None)
    } else {
        Ok(Some(captured))
    }
}

/// Capture the next value in a constructed value, whatever its tag.
pub fn take_captured<S: Source>(
    cons: &mut Constructed<S>,
) -> Result<Captured, DecodeError<S::Error>> {
    match take_opt_captured(cons)? {
        Some(captured) => Ok(captured),
        None => Err(cons.content_err("expected a value")),
    }
}

/// An `ANY` value kept in its encoded form.
#[derive(Clone, Debug)]
pub struct AnyValue(Captured);

impl AnyValue {
    /// Construct an instance by DER encoding a value.
    pub fn from_values(values: impl Values) -> Self {
        Self(Captured::from_values(Mode::Der, values))
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        Ok(Self(take_captured(cons)?))
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        Ok(take_opt_captured(cons)?.map(Self))
    }

    /// Capture every remaining value in a constructed value.
    pub fn take_all_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Vec<Self>, DecodeError<S::Error>> {
        let mut values = Vec::new();

        while let Some(value) = Self::take_opt_from(cons)? {
            values.push(value);
        }

        Ok(values)
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_slice()
    }

    /// Decode the value with the given function.
    pub fn decode<'a, F, T>(&'a self, op: F) -> Result<T, DecodeError<Infallible>>
    where
        F: FnOnce(&mut Constructed<SliceSource<'a>>) -> Result<T, DecodeError<Infallible>>,
    {
        Constructed::decode(self.0.as_slice(), Mode::Der, op)
    }
}

impl From<Captured> for AnyValue {
    fn from(captured: Captured) -> Self {
        Self(captured)
    }
}

impl PartialEq for AnyValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for AnyValue {}

impl Values for AnyValue {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.0.encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.0.write_encoded(mode, target)
    }
}

/// A run of INTEGER values, encoded one after another.
pub struct IntegerValues<'a>(pub &'a [Integer]);

impl<'a> Values for IntegerValues<'a> {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.0.iter().map(|i| i.encode().encoded_len(mode)).sum()
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        for i in self.0 {
            i.encode().write_encoded(mode, target)?;
        }

        Ok(())
    }
}

/// A run of OCTET STRING values, encoded one after another.
pub struct OctetStringValues<'a>(pub &'a [OctetString]);

impl<'a> Values for OctetStringValues<'a> {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.0.iter().map(|s| s.encode_ref().encoded_len(mode)).sum()
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        for s in self.0 {
            s.encode_ref().write_encoded(mode, target)?;
        }

        Ok(())
    }
}

/// Write a DER tag-length header followed by `data`.
///
/// `tag` is the single identifier octet. bcder doesn't expose length encoding,
/// so it is done by hand.
pub fn write_der_tlv(tag: u8, data: &[u8], buffer: &mut Vec<u8>) -> Result<(), std::io::Error> {
    buffer.write_all(&[tag])?;

    let len = data.len();

    if len < 0x80 {
        buffer.write_all(&[len as u8])?;
    } else if len < 0x100 {
        buffer.write_all(&[0x81, len as u8])?;
    } else if len < 0x10000 {
        buffer.write_all(&[0x82, (len >> 8) as u8, len as u8])?;
    } else if len < 0x1000000 {
        buffer.write_all(&[0x83, (len >> 16) as u8, (len >> 8) as u8, len as u8])?;
    } else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "value length too long",
        ));
    }

    buffer.write_all(data)
}

/// The number of bytes [write_der_tlv] emits for `len` bytes of content.
pub fn der_tlv_len(len: usize) -> usize {
    let header = if len < 0x80 {
        2
    } else if len < 0x100 {
        3
    } else if len < 0x10000 {
        4
    } else {
        5
    };

    header + len
}

/// Obtain the DER encoding of a value.
pub fn der_encode(values: impl Values) -> Result<Vec<u8>, std::io::Error> {
    let mut der = Vec::new();
    values.write_encoded(Mode::Der, &mut der)?;

    Ok(der)
}

/// Time.
///
/// ```ASN.1
/// Time ::= CHOICE {
///   utcTime        UTCTime,
///   generalTime    GeneralizedTime }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Time {
    UtcTime(UtcTime),
    GeneralTime(GeneralizedTime),
}

impl Time {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match Self::take_opt_from(cons)? {
            Some(time) => Ok(time),
            None => Err(cons.content_err("expected UTCTime or GeneralizedTime")),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        if let Some(utc) =
            cons.take_opt_primitive_if(Tag::UTC_TIME, |prim| UtcTime::from_primitive(prim))?
        {
            Ok(Some(Self::UtcTime(utc)))
        } else if let Some(gt) = cons.take_opt_primitive_if(Tag::GENERALIZED_TIME, |prim| {
            GeneralizedTime::from_primitive(prim)
        })? {
            Ok(Some(Self::GeneralTime(gt)))
        } else {
            Ok(None)
        }
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        match self {
            Self::UtcTime(utc) => (Some(utc.encode_ref()), None),
            Self::GeneralTime(gt) => (None, Some(gt.encode_ref())),
        }
    }

    pub fn as_datetime(&self) -> chrono::DateTime<chrono::Utc> {
        match self {
            Self::UtcTime(t) => t.as_datetime(),
            Self::GeneralTime(t) => t.as_datetime(),
        }
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Time {
    fn from(t: chrono::DateTime<chrono::Utc>) -> Self {
        Self::UtcTime(UtcTime::from(t))
    }
}

fn parse_digits<T: FromStr>(data: &[u8]) -> Result<T, &'static str> {
    if !data.iter().all(|c| c.is_ascii_digit()) {
        return Err("non-digit in time value");
    }

    let s = std::str::from_utf8(data).map_err(|_| "time value is not ASCII")?;

    T::from_str(s).map_err(|_| "malformed number in time value")
}

fn make_datetime(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
    nanos: u32,
) -> Result<NaiveDateTime, &'static str> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_nano_opt(hour, minute, second, nanos))
        .ok_or("time value out of range")
}

/// ASN.1 GeneralizedTime in its DER form (UTC, `Z` suffix).
///
/// Fractional seconds are retained verbatim so a parsed value re-encodes to
/// the same bytes.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GeneralizedTime {
    time: NaiveDateTime,
    fraction: Option<String>,
}

impl GeneralizedTime {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_primitive_if(Tag::GENERALIZED_TIME, |prim| Self::from_primitive(prim))
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_primitive_if(Tag::GENERALIZED_TIME, |prim| Self::from_primitive(prim))
    }

    pub fn from_primitive<S: Source>(
        prim: &mut Primitive<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        let data = prim.take_all()?;

        Self::parse(data.as_ref()).map_err(|e| prim.content_err(e))
    }

    /// Parse GeneralizedTime string data.
    ///
    /// Accepts `YYYYMMDDHHMMSSZ` and `YYYYMMDDHHMMSS.fffZ`.
    pub fn parse(data: &[u8]) -> Result<Self, &'static str> {
        if data.len() < "YYYYMMDDHHMMSSZ".len() {
            return Err("GeneralizedTime too short");
        }

        if data[data.len() - 1] != b'Z' {
            return Err("GeneralizedTime must be in UTC");
        }

        let year = parse_digits::<i32>(&data[0..4])?;
        let month = parse_digits::<u32>(&data[4..6])?;
        let day = parse_digits::<u32>(&data[6..8])?;
        let hour = parse_digits::<u32>(&data[8..10])?;
        let minute = parse_digits::<u32>(&data[10..12])?;
        let second = parse_digits::<u32>(&data[12..14])?;

        let rest = &data[14..data.len() - 1];

        let (fraction, nanos) = if rest.is_empty() {
            (None, 0)
        } else if rest[0] == b'.' && rest.len() > 1 && rest.len() <= 10 {
            let digits = &rest[1..];
            let value = parse_digits::<u32>(digits)?;
            let nanos = value * 10u32.pow(9 - digits.len() as u32);

            let fraction = std::str::from_utf8(digits)
                .map_err(|_| "fraction is not ASCII")?
                .to_string();

            (Some(fraction), nanos)
        } else {
            return Err("malformed GeneralizedTime fraction");
        };

        Ok(Self {
            time: make_datetime(year, month, day, hour, minute, second, nanos)?,
            fraction,
        })
    }

    pub fn as_datetime(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.from_utc_datetime(&self.time)
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        PrimitiveContent::encode_ref(self)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for GeneralizedTime {
    fn from(t: chrono::DateTime<chrono::Utc>) -> Self {
        let time = t.naive_utc();

        Self {
            time: time.with_nanosecond(0).unwrap_or(time),
            fraction: None,
        }
    }
}

impl std::fmt::Display for GeneralizedTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}{:02}{:02}{:02}{:02}{:02}",
            self.time.year(),
            self.time.month(),
            self.time.day(),
            self.time.hour(),
            self.time.minute(),
            self.time.second()
        )?;

        if let Some(fraction) = &self.fraction {
            write!(f, ".{}", fraction)?;
        }

        f.write_str("Z")
    }
}

impl PrimitiveContent for GeneralizedTime {
    const TAG: Tag = Tag::GENERALIZED_TIME;

    fn encoded_len(&self, _: Mode) -> usize {
        self.to_string().len()
    }

    fn write_encoded<W: Write>(&self, _: Mode, target: &mut W) -> Result<(), std::io::Error> {
        target.write_all(self.to_string().as_bytes())
    }
}

/// ASN.1 UTCTime in its DER form (`YYMMDDHHMMSSZ`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UtcTime(NaiveDateTime);

impl UtcTime {
    /// Obtain a new instance with now as the time.
    pub fn now() -> Self {
        Self::from(chrono::Utc::now())
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_primitive_if(Tag::UTC_TIME, |prim| Self::from_primitive(prim))
    }

    pub fn from_primitive<S: Source>(
        prim: &mut Primitive<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        let data = prim.take_all()?;

        Self::parse(data.as_ref()).map_err(|e| prim.content_err(e))
    }

    pub fn parse(data: &[u8]) -> Result<Self, &'static str> {
        if data.len() != "YYMMDDHHMMSSZ".len() {
            return Err("UTCTime has wrong length");
        }

        if data[12] != b'Z' {
            return Err("UTCTime must be in UTC");
        }

        let year = parse_digits::<i32>(&data[0..2])?;
        let year = if year >= 50 { year + 1900 } else { year + 2000 };

        let month = parse_digits::<u32>(&data[2..4])?;
        let day = parse_digits::<u32>(&data[4..6])?;
        let hour = parse_digits::<u32>(&data[6..8])?;
        let minute = parse_digits::<u32>(&data[8..10])?;
        let second = parse_digits::<u32>(&data[10..12])?;

        Ok(Self(make_datetime(year, month, day, hour, minute, second, 0)?))
    }

    pub fn as_datetime(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::Utc.from_utc_datetime(&self.0)
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        PrimitiveContent::encode_ref(self)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for UtcTime {
    fn from(t: chrono::DateTime<chrono::Utc>) -> Self {
        let time = t.naive_utc();

        Self(time.with_nanosecond(0).unwrap_or(time))
    }
}

impl std::fmt::Display for UtcTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}{:02}{:02}{:02}{:02}{:02}Z",
            self.0.year() % 100,
            self.0.month(),
            self.0.day(),
            self.0.hour(),
            self.0.minute(),
            self.0.second()
        )
    }
}

impl PrimitiveContent for UtcTime {
    const TAG: Tag = Tag::UTC_TIME;

    fn encoded_len(&self, _: Mode) -> usize {
        self.to_string().len()
    }

    fn write_encoded<W: Write>(&self, _: Mode, target: &mut W) -> Result<(), std::io::Error> {
        target.write_all(self.to_string().as_bytes())
    }
}
