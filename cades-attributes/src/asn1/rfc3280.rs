// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! ASN.1 naming types defined by RFC 3280. */

use {
    crate::asn1::common::take_opt_captured,
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode::{self, PrimitiveContent, Values},
        string::{CharSetError, Ia5String, PrintableString, Utf8String},
        Captured, Mode, OctetString, Oid, Tag,
    },
    bytes::Bytes,
    std::{
        io::Write,
        ops::{Deref, DerefMut},
    },
};

/// OID of the common name attribute type.
///
/// 2.5.4.3
pub const OID_COMMON_NAME: bcder::ConstOid = Oid(&[85, 4, 3]);

/// General names.
///
/// ```ASN.1
/// GeneralNames ::= SEQUENCE SIZE (1..MAX) OF GeneralName
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GeneralNames(Vec<GeneralName>);

impl Deref for GeneralNames {
    type Target = Vec<GeneralName>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for GeneralNames {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<GeneralName>> for GeneralNames {
    fn from(v: Vec<GeneralName>) -> Self {
        Self(v)
    }
}

impl GeneralNames {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let mut names = Vec::new();

            while let Some(name) = GeneralName::take_opt_from(cons)? {
                names.push(name);
            }

            Ok(Self(names))
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence(&self.0)
    }
}

/// General name.
///
/// ```ASN.1
/// GeneralName ::= CHOICE {
///   otherName                       [0]     AnotherName,
///   rfc822Name                      [1]     IA5String,
///   dNSName                         [2]     IA5String,
///   x400Address                     [3]     ORAddress,
///   directoryName                   [4]     Name,
///   ediPartyName                    [5]     EDIPartyName,
///   uniformResourceIdentifier       [6]     IA5String,
///   iPAddress                       [7]     OCTET STRING,
///   registeredID                    [8]     OBJECT IDENTIFIER }
/// ```
///
/// `x400Address` and `ediPartyName` are kept as their captured inner content.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GeneralName {
    OtherName(AnotherName),
    Rfc822Name(Ia5String),
    DnsName(Ia5String),
    X400Address(CapturedContent),
    DirectoryName(Name),
    EdiPartyName(CapturedContent),
    UniformResourceIdentifier(Ia5String),
    IpAddress(OctetString),
    RegisteredId(Oid),
}

impl GeneralName {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match Self::take_opt_from(cons)? {
            Some(name) => Ok(name),
            None => Err(cons.content_err("expected GeneralName")),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        if let Some(name) = cons.take_opt_constructed_if(Tag::CTX_0, AnotherName::from_sequence)? {
            Ok(Some(Self::OtherName(name)))
        } else if let Some(name) =
            cons.take_opt_value_if(Tag::CTX_1, |content| Ia5String::from_content(content))?
        {
            Ok(Some(Self::Rfc822Name(name)))
        } else if let Some(name) =
            cons.take_opt_value_if(Tag::CTX_2, |content| Ia5String::from_content(content))?
        {
            Ok(Some(Self::DnsName(name)))
        } else if let Some(content) =
            cons.take_opt_constructed_if(Tag::CTX_3, |cons| cons.capture_all())?
        {
            Ok(Some(Self::X400Address(CapturedContent(content))))
        } else if let Some(name) = cons.take_opt_constructed_if(Tag::CTX_4, Name::take_from)? {
            Ok(Some(Self::DirectoryName(name)))
        } else if let Some(content) =
            cons.take_opt_constructed_if(Tag::CTX_5, |cons| cons.capture_all())?
        {
            Ok(Some(Self::EdiPartyName(CapturedContent(content))))
        } else if let Some(uri) =
            cons.take_opt_value_if(Tag::CTX_6, |content| Ia5String::from_content(content))?
        {
            Ok(Some(Self::UniformResourceIdentifier(uri)))
        } else if let Some(address) =
            cons.take_opt_value_if(Tag::ctx(7), |content| OctetString::from_content(content))?
        {
            Ok(Some(Self::IpAddress(address)))
        } else if let Some(oid) =
            cons.take_opt_primitive_if(Tag::ctx(8), |prim| Oid::from_primitive(prim))?
        {
            Ok(Some(Self::RegisteredId(oid)))
        } else {
            Ok(None)
        }
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        self
    }
}

impl Values for GeneralName {
    fn encoded_len(&self, mode: Mode) -> usize {
        match self {
            Self::OtherName(name) => name.encode_ref_as(Tag::CTX_0).encoded_len(mode),
            Self::Rfc822Name(name) => name.encode_ref_as(Tag::CTX_1).encoded_len(mode),
            Self::DnsName(name) => name.encode_ref_as(Tag::CTX_2).encoded_len(mode),
            Self::X400Address(content) => {
                encode::sequence_as(Tag::CTX_3, &content.0).encoded_len(mode)
            }
            Self::DirectoryName(name) => name.encode_ref().explicit(Tag::CTX_4).encoded_len(mode),
            Self::EdiPartyName(content) => {
                encode::sequence_as(Tag::CTX_5, &content.0).encoded_len(mode)
            }
            Self::UniformResourceIdentifier(uri) => uri.encode_ref_as(Tag::CTX_6).encoded_len(mode),
            Self::IpAddress(address) => address.encode_ref_as(Tag::ctx(7)).encoded_len(mode),
            Self::RegisteredId(oid) => oid.encode_ref_as(Tag::ctx(8)).encoded_len(mode),
        }
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        match self {
            Self::OtherName(name) => name.encode_ref_as(Tag::CTX_0).write_encoded(mode, target),
            Self::Rfc822Name(name) => name.encode_ref_as(Tag::CTX_1).write_encoded(mode, target),
            Self::DnsName(name) => name.encode_ref_as(Tag::CTX_2).write_encoded(mode, target),
            Self::X400Address(content) => {
                encode::sequence_as(Tag::CTX_3, &content.0).write_encoded(mode, target)
            }
            Self::DirectoryName(name) => name
                .encode_ref()
                .explicit(Tag::CTX_4)
                .write_encoded(mode, target),
            Self::EdiPartyName(content) => {
                encode::sequence_as(Tag::CTX_5, &content.0).write_encoded(mode, target)
            }
            Self::UniformResourceIdentifier(uri) => {
                uri.encode_ref_as(Tag::CTX_6).write_encoded(mode, target)
            }
            Self::IpAddress(address) => address
                .encode_ref_as(Tag::ctx(7))
                .write_encoded(mode, target),
            Self::RegisteredId(oid) => oid.encode_ref_as(Tag::ctx(8)).write_encoded(mode, target),
        }
    }
}

/// The raw content octets of a constructed value we don't model.
#[derive(Clone, Debug)]
pub struct CapturedContent(pub Captured);

impl PartialEq for CapturedContent {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl Eq for CapturedContent {}

/// A reference to another name.
///
/// ```ASN.1
/// AnotherName ::= SEQUENCE {
///   type-id    OBJECT IDENTIFIER,
///   value      [0] EXPLICIT ANY DEFINED BY type-id }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AnotherName {
    pub type_id: Oid,
    pub value: CapturedContent,
}

impl AnotherName {
    pub fn from_sequence<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        let type_id = Oid::take_from(cons)?;
        let value = cons.take_constructed_if(Tag::CTX_0, |cons| cons.capture_all())?;

        Ok(Self {
            type_id,
            value: CapturedContent(value),
        })
    }

    pub fn encode_ref_as(&self, tag: Tag) -> impl Values + '_ {
        encode::sequence_as(
            tag,
            (
                self.type_id.encode_ref(),
                encode::sequence_as(Tag::CTX_0, &self.value.0),
            ),
        )
    }
}

/// Directory string.
///
/// ```ASN.1
/// DirectoryString ::= CHOICE {
///       teletexString           TeletexString (SIZE (1..MAX)),
///       printableString         PrintableString (SIZE (1..MAX)),
///       universalString         UniversalString (SIZE (1..MAX)),
///       utf8String              UTF8String (SIZE (1..MAX)),
///       bmpString               BMPString (SIZE (1..MAX)) }
/// ```
///
/// Teletex, universal and BMP strings are kept as their raw octets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DirectoryString {
    TeletexString(OctetString),
    PrintableString(PrintableString),
    UniversalString(OctetString),
    Utf8String(Utf8String),
    BmpString(OctetString),
}

impl DirectoryString {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match Self::take_opt_from(cons)? {
            Some(s) => Ok(s),
            None => Err(cons.content_err("expected DirectoryString")),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        if let Some(s) = cons.take_opt_value_if(Tag::TELETEX_STRING, |content| {
            OctetString::from_content(content)
        })? {
            Ok(Some(Self::TeletexString(s)))
        } else if let Some(s) = cons.take_opt_value_if(Tag::PRINTABLE_STRING, |content| {
            PrintableString::from_content(content)
        })? {
            Ok(Some(Self::PrintableString(s)))
        } else if let Some(s) = cons.take_opt_value_if(Tag::UNIVERSAL_STRING, |content| {
            OctetString::from_content(content)
        })? {
            Ok(Some(Self::UniversalString(s)))
        } else if let Some(s) =
            cons.take_opt_value_if(Tag::UTF8_STRING, |content| Utf8String::from_content(content))?
        {
            Ok(Some(Self::Utf8String(s)))
        } else if let Some(s) =
            cons.take_opt_value_if(Tag::BMP_STRING, |content| OctetString::from_content(content))?
        {
            Ok(Some(Self::BmpString(s)))
        } else {
            Ok(None)
        }
    }

    /// Construct a UTF8String variant from a Rust string.
    pub fn from_utf8_str(s: &str) -> Result<Self, CharSetError> {
        Ok(Self::Utf8String(Utf8String::from_string(s.to_string())?))
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        match self {
            Self::TeletexString(s) => (
                Some(s.encode_ref_as(Tag::TELETEX_STRING)),
                None,
                None,
                None,
                None,
            ),
            Self::PrintableString(s) => (None, Some(s.encode_ref()), None, None, None),
            Self::UniversalString(s) => (
                None,
                None,
                Some(s.encode_ref_as(Tag::UNIVERSAL_STRING)),
                None,
                None,
            ),
            Self::Utf8String(s) => (None, None, None, Some(s.encode_ref()), None),
            Self::BmpString(s) => (
                None,
                None,
                None,
                None,
                Some(s.encode_ref_as(Tag::BMP_STRING)),
            ),
        }
    }

    /// Obtain the string value, if it is representable as Rust string.
    pub fn to_string_lossy(&self) -> String {
        match self {
            Self::PrintableString(s) => s.to_string(),
            Self::Utf8String(s) => s.to_string(),
            Self::TeletexString(s) => String::from_utf8_lossy(&s.to_bytes()).to_string(),
            Self::UniversalString(s) => decode_ucs(&s.to_bytes(), 4),
            Self::BmpString(s) => decode_ucs(&s.to_bytes(), 2),
        }
    }
}

impl Values for DirectoryString {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Decode big-endian UCS-2 (`width` 2) or UCS-4 (`width` 4) text.
pub(crate) fn decode_ucs(data: &[u8], width: usize) -> String {
    data.chunks(width)
        .filter_map(|chunk| {
            let code = chunk.iter().fold(0u32, |acc, b| (acc << 8) | *b as u32);
            char::from_u32(code)
        })
        .collect()
}

/// Name.
///
/// ```ASN.1
/// Name ::= CHOICE { -- only one possibility for now --
///   rdnSequence  RDNSequence }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Name {
    RdnSequence(RdnSequence),
}

impl Name {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        Ok(Self::RdnSequence(RdnSequence::take_from(cons)?))
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        match self {
            Self::RdnSequence(seq) => seq.encode_ref(),
        }
    }

    /// Construct a name holding a single common name attribute.
    pub fn with_common_name(cn: &str) -> Result<Self, CharSetError> {
        let value = Captured::from_values(
            Mode::Der,
            DirectoryString::from_utf8_str(cn)?.encode_ref(),
        );

        Ok(Self::RdnSequence(RdnSequence(vec![
            RelativeDistinguishedName(vec![AttributeTypeAndValue {
                typ: Oid(Bytes::copy_from_slice(OID_COMMON_NAME.as_ref())),
                value,
            }]),
        ])))
    }
}

impl Values for Name {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// RDN sequence.
///
/// ```ASN.1
/// RDNSequence ::= SEQUENCE OF RelativeDistinguishedName
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RdnSequence(Vec<RelativeDistinguishedName>);

impl Deref for RdnSequence {
    type Target = Vec<RelativeDistinguishedName>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for RdnSequence {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl RdnSequence {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let mut values = Vec::new();

            while let Some(value) = RelativeDistinguishedName::take_opt_from(cons)? {
                values.push(value);
            }

            Ok(Self(values))
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence(&self.0)
    }
}

/// Relative distinguished name.
///
/// ```ASN.1
/// RelativeDistinguishedName ::=
///   SET OF AttributeTypeAndValue
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RelativeDistinguishedName(Vec<AttributeTypeAndValue>);

impl Deref for RelativeDistinguishedName {
    type Target = Vec<AttributeTypeAndValue>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for RelativeDistinguishedName {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl RelativeDistinguishedName {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_set(|cons| {
            let mut values = Vec::new();

            while let Some(value) = AttributeTypeAndValue::take_opt_from(cons)? {
                values.push(value);
            }

            Ok(Self(values))
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::set(&self.0)
    }
}

impl Values for RelativeDistinguishedName {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Attribute type and its value.
///
/// ```ASN.1
/// AttributeTypeAndValue ::= SEQUENCE {
///   type     AttributeType,
///   value    AttributeValue }
/// ```
#[derive(Clone, Debug)]
pub struct AttributeTypeAndValue {
    pub typ: Oid,
    pub value: Captured,
}

impl AttributeTypeAndValue {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let typ = Oid::take_from(cons)?;
            let value = match take_opt_captured(cons)? {
                Some(value) => value,
                None => return Err(cons.content_err("missing attribute value")),
            };

            Ok(Self { typ, value })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.typ.encode_ref(), &self.value))
    }
}

impl PartialEq for AttributeTypeAndValue {
    fn eq(&self, other: &Self) -> bool {
        self.typ == other.typ && self.value.as_slice() == other.value.as_slice()
    }
}

impl Eq for AttributeTypeAndValue {}

impl Values for AttributeTypeAndValue {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

#[cfg(test)]
mod test {
    use {super::*, crate::asn1::common::der_encode};

    #[test]
    fn general_name_directory_name_is_explicit() {
        let name = Name::with_common_name("tsa").unwrap();
        let general = GeneralName::DirectoryName(name.clone());

        let der = der_encode(general.encode_ref()).unwrap();
        assert_eq!(der[0], 0xa4);

        let name_der = der_encode(name.encode_ref()).unwrap();
        assert_eq!(&der[2..], name_der.as_slice());

        let decoded =
            Constructed::decode(der.as_slice(), Mode::Der, |cons| GeneralName::take_from(cons))
                .unwrap();
        assert_eq!(decoded, general);
    }

    #[test]
    fn general_name_variants() {
        let names = GeneralNames::from(vec![
            GeneralName::DnsName(Ia5String::from_string("example.com".into()).unwrap()),
            GeneralName::UniformResourceIdentifier(
                Ia5String::from_string("http://tsa.example.com".into()).unwrap(),
            ),
            GeneralName::IpAddress(OctetString::new(Bytes::from_static(&[127, 0, 0, 1]))),
        ]);

        let der = der_encode(names.encode_ref()).unwrap();
        let decoded =
            Constructed::decode(der.as_slice(), Mode::Der, |cons| GeneralNames::take_from(cons))
                .unwrap();

        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded, names);
        assert_eq!(der_encode(decoded.encode_ref()).unwrap(), der);
    }

    #[test]
    fn directory_string() {
        let der = der_encode(DirectoryString::from_utf8_str("Zürich").unwrap().encode_ref()).unwrap();
        assert_eq!(der[0], 0x0c);

        let decoded =
            Constructed::decode(der.as_slice(), Mode::Der, |cons| DirectoryString::take_from(cons))
                .unwrap();
        assert_eq!(decoded.to_string_lossy(), "Zürich");

        // BMPString "AB".
        let der = [0x1e, 0x04, 0x00, 0x41, 0x00, 0x42];
        let decoded = Constructed::decode(&der[..], Mode::Der, |cons| {
            DirectoryString::take_from(cons)
        })
        .unwrap();
        assert!(matches!(decoded, DirectoryString::BmpString(_)));
        assert_eq!(decoded.to_string_lossy(), "AB");
        assert_eq!(der_encode(decoded.encode_ref()).unwrap(), der.to_vec());
    }

    #[test]
    fn name_equality_is_structural() {
        let a = Name::with_common_name("a").unwrap();
        let b = Name::with_common_name("b").unwrap();

        assert_eq!(a, Name::with_common_name("a").unwrap());
        assert_ne!(a, b);
    }
}
