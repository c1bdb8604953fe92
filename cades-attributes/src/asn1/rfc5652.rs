// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! ASN.1 data structures defined by RFC 5652.

The types defined in this module are intended to be extremely low-level
and only to be used for (de)serialization. See types outside the
`asn1` module tree for higher-level functionality.

Only the signed-data content type is modeled. Certificates and CRLs carried
in `SignedData` retain their original encoding so they can be referenced
and digested byte for byte.
*/

use {
    crate::{
        asn1::{
            common::{der_encode, der_tlv_len, take_opt_captured, write_der_tlv, Time},
            rfc3280::Name,
            rfc5280::{AlgorithmIdentifier, CertificateSerialNumber},
        },
        certificate::{CapturedCertificate, CapturedCrl},
    },
    bcder::{
        decode::{Constructed, DecodeError, SliceSource, Source},
        encode::{self, PrimitiveContent, Values},
        Captured, ConstOid, Integer, Mode, OctetString, Oid, Tag,
    },
    bytes::Bytes,
    std::{
        convert::Infallible,
        io::Write,
        ops::{Deref, DerefMut},
    },
};

/// The data content type.
///
/// `id-data` in RFC 5652.
///
/// 1.2.840.113549.1.7.1
pub const OID_ID_DATA: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 7, 1]);

/// The signed-data content type.
///
/// 1.2.840.113549.1.7.2
pub const OID_ID_SIGNED_DATA: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 7, 2]);

/// Identifies the content-type attribute.
///
/// 1.2.840.113549.1.9.3
pub const OID_CONTENT_TYPE: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 3]);

/// Identifies the message-digest attribute.
///
/// 1.2.840.113549.1.9.4
pub const OID_MESSAGE_DIGEST: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 4]);

/// Identifies the signing-time attribute.
///
/// 1.2.840.113549.1.9.5
pub const OID_SIGNING_TIME: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 5]);

/// Identifies the countersignature attribute.
///
/// 1.2.840.113549.1.9.6
pub const OID_COUNTER_SIGNATURE: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 6]);

/// Content info.
///
/// ```ASN.1
/// ContentInfo ::= SEQUENCE {
///   contentType ContentType,
///   content [0] EXPLICIT ANY DEFINED BY contentType }
/// ```
#[derive(Clone, Debug)]
pub struct ContentInfo {
    pub content_type: ContentType,
    pub content: Captured,
}

impl PartialEq for ContentInfo {
    fn eq(&self, other: &Self) -> bool {
        self.content_type == other.content_type
            && self.content.as_slice() == other.content.as_slice()
    }
}

impl Eq for ContentInfo {}

impl ContentInfo {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| Self::from_sequence(cons))
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| Self::from_sequence(cons))
    }

    pub fn from_sequence<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        let content_type = ContentType::take_from(cons)?;
        let content = cons.take_constructed_if(Tag::CTX_0, |cons| cons.capture_all())?;

        Ok(Self {
            content_type,
            content,
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.content_type.encode_ref(),
            encode::sequence_as(Tag::CTX_0, &self.content),
        ))
    }
}

impl Values for ContentInfo {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Represents signed data.
///
/// ASN.1 definition:
///
/// ```ASN.1
/// SignedData ::= SEQUENCE {
///   version CMSVersion,
///   digestAlgorithms DigestAlgorithmIdentifiers,
///   encapContentInfo EncapsulatedContentInfo,
///   certificates [0] IMPLICIT CertificateSet OPTIONAL,
///   crls [1] IMPLICIT RevocationInfoChoices OPTIONAL,
///   signerInfos SignerInfos }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignedData {
    pub version: CmsVersion,
    pub digest_algorithms: DigestAlgorithmIdentifiers,
    pub content_info: EncapsulatedContentInfo,
    pub certificates: Option<CertificateSet>,
    pub crls: Option<RevocationInfoChoices>,
    pub signer_infos: SignerInfos,
}

impl SignedData {
    /// Attempt to decode a DER encoded `ContentInfo` holding signed data.
    ///
    /// Values captured while decoding keep DER mode, so the result can be
    /// re-encoded and fed to the digest buffers.
    pub fn decode_der(data: &[u8]) -> Result<Self, DecodeError<Infallible>> {
        Constructed::decode(data, Mode::Der, |cons| Self::decode(cons))
    }

    /// Decode a `ContentInfo` whose content type is signed data.
    pub fn decode<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let oid = Oid::take_from(cons)?;

            if oid != OID_ID_SIGNED_DATA {
                return Err(cons.content_err("expected signed-data content type"));
            }

            cons.take_constructed_if(Tag::CTX_0, Self::take_from)
        })
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let version = CmsVersion::take_from(cons)?;
            let digest_algorithms = DigestAlgorithmIdentifiers::take_from(cons)?;
            let content_info = EncapsulatedContentInfo::take_from(cons)?;
            let certificates = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
                CertificateSet::from_set_content(cons)
            })?;
            let crls = cons.take_opt_constructed_if(Tag::CTX_1, |cons| {
                RevocationInfoChoices::from_set_content(cons)
            })?;
            let signer_infos = SignerInfos::take_from(cons)?;

            Ok(Self {
                version,
                digest_algorithms,
                content_info,
                certificates,
                crls,
                signer_infos,
            })
        })
    }

    /// Encode the bare `SignedData` SEQUENCE.
    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.version.encode(),
            self.digest_algorithms.encode_ref(),
            self.content_info.encode_ref(),
            self.certificates
                .as_ref()
                .map(|certs| certs.encode_ref_as(Tag::CTX_0)),
            self.crls.as_ref().map(|crls| crls.encode_ref_as(Tag::CTX_1)),
            self.signer_infos.encode_ref(),
        ))
    }

    /// Wrap this instance in a `ContentInfo` of type signed data.
    pub fn to_content_info(&self) -> ContentInfo {
        ContentInfo {
            content_type: Oid(Bytes::copy_from_slice(OID_ID_SIGNED_DATA.as_ref())),
            content: Captured::from_values(Mode::Der, self.encode_ref()),
        }
    }

    /// DER encode this instance wrapped in a `ContentInfo`.
    pub fn to_content_info_der(&self) -> Result<Vec<u8>, std::io::Error> {
        der_encode(self.to_content_info().encode_ref())
    }
}

/// Digest algorithm identifiers.
///
/// ```ASN.1
/// DigestAlgorithmIdentifiers ::= SET OF DigestAlgorithmIdentifier
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DigestAlgorithmIdentifiers(Vec<DigestAlgorithmIdentifier>);

impl Deref for DigestAlgorithmIdentifiers {
    type Target = Vec<DigestAlgorithmIdentifier>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DigestAlgorithmIdentifiers {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<DigestAlgorithmIdentifier>> for DigestAlgorithmIdentifiers {
    fn from(v: Vec<DigestAlgorithmIdentifier>) -> Self {
        Self(v)
    }
}

impl DigestAlgorithmIdentifiers {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_set(|cons| {
            let mut identifiers = Vec::new();

            while let Some(identifier) = AlgorithmIdentifier::take_opt_from(cons)? {
                identifiers.push(identifier);
            }

            Ok(Self(identifiers))
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::set(&self.0)
    }
}

pub type DigestAlgorithmIdentifier = AlgorithmIdentifier;

/// Signer infos.
///
/// ```ASN.1
/// SignerInfos ::= SET OF SignerInfo
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SignerInfos(Vec<SignerInfo>);

impl Deref for SignerInfos {
    type Target = Vec<SignerInfo>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SignerInfos {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<SignerInfo>> for SignerInfos {
    fn from(v: Vec<SignerInfo>) -> Self {
        Self(v)
    }
}

impl SignerInfos {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_set(|cons| {
            let mut infos = Vec::new();

            while let Some(info) = SignerInfo::take_opt_from(cons)? {
                infos.push(info);
            }

            Ok(Self(infos))
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::set(&self.0)
    }
}

/// Encapsulated content info.
///
/// ```ASN.1
/// EncapsulatedContentInfo ::= SEQUENCE {
///   eContentType ContentType,
///   eContent [0] EXPLICIT OCTET STRING OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncapsulatedContentInfo {
    pub content_type: ContentType,
    pub content: Option<OctetString>,
}

impl EncapsulatedContentInfo {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let content_type = ContentType::take_from(cons)?;
            let content =
                cons.take_opt_constructed_if(Tag::CTX_0, |cons| OctetString::take_from(cons))?;

            Ok(Self {
                content_type,
                content,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.content_type.encode_ref(),
            self.content
                .as_ref()
                .map(|content| encode::sequence_as(Tag::CTX_0, content.encode_ref())),
        ))
    }
}

/// Per-signer information.
///
/// ```ASN.1
/// SignerInfo ::= SEQUENCE {
///   version CMSVersion,
///   sid SignerIdentifier,
///   digestAlgorithm DigestAlgorithmIdentifier,
///   signedAttrs [0] IMPLICIT SignedAttributes OPTIONAL,
///   signatureAlgorithm SignatureAlgorithmIdentifier,
///   signature SignatureValue,
///   unsignedAttrs [1] IMPLICIT UnsignedAttributes OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignerInfo {
    pub version: CmsVersion,
    pub sid: SignerIdentifier,
    pub digest_algorithm: DigestAlgorithmIdentifier,
    pub signed_attributes: Option<SignedAttributes>,
    pub signature_algorithm: SignatureAlgorithmIdentifier,
    pub signature: SignatureValue,
    pub unsigned_attributes: Option<UnsignedAttributes>,

    /// Raw bytes backing signed attributes data.
    ///
    /// Does not include constructed tag or length bytes.
    pub signed_attributes_data: Option<Vec<u8>>,
}

impl SignerInfo {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| Self::from_sequence(cons))
    }

    pub fn from_sequence<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        let version = CmsVersion::take_from(cons)?;
        let sid = SignerIdentifier::take_from(cons)?;
        let digest_algorithm = DigestAlgorithmIdentifier::take_from(cons)?;
        let signed_attributes = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
            // RFC 5652 Section 5.3: SignedAttributes MUST be DER encoded, even if the
            // rest of the structure is BER encoded. The raw bytes are also digested
            // for signatures and archive time-stamps, so they are kept verbatim.
            let der = cons.capture_all()?;
            let der_data = der.as_slice().to_vec();

            let attributes = Constructed::decode(der.as_slice(), Mode::Der, |cons| {
                SignedAttributes::take_from_set(cons)
            })
            .map_err(|_| cons.content_err("signed attributes are not valid DER"))?;

            Ok((attributes, der_data))
        })?;

        let (signed_attributes, signed_attributes_data) = match signed_attributes {
            Some((attributes, data)) => (Some(attributes), Some(data)),
            None => (None, None),
        };

        let signature_algorithm = SignatureAlgorithmIdentifier::take_from(cons)?;
        let signature = SignatureValue::take_from(cons)?;
        let unsigned_attributes = cons
            .take_opt_constructed_if(Tag::CTX_1, |cons| UnsignedAttributes::take_from_set(cons))?;

        Ok(Self {
            version,
            sid,
            digest_algorithm,
            signed_attributes,
            signature_algorithm,
            signature,
            unsigned_attributes,
            signed_attributes_data,
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.version.encode(),
            &self.sid,
            self.digest_algorithm.encode_ref(),
            self.signed_attributes_encoding(),
            self.signature_algorithm.encode_ref(),
            self.signature.encode_ref(),
            self.unsigned_attributes
                .as_ref()
                .map(|attrs| attrs.encode_ref_as(Tag::CTX_1)),
        ))
    }

    /// The `[0]` signed attributes as they should be emitted.
    ///
    /// Parsed instances emit their original bytes so the signature stays valid.
    fn signed_attributes_encoding(&self) -> Option<SignedAttributesEncoding<'_>> {
        match (&self.signed_attributes_data, &self.signed_attributes) {
            (Some(data), _) => Some(SignedAttributesEncoding::Raw(data)),
            (None, Some(attrs)) => Some(SignedAttributesEncoding::Parsed(attrs)),
            (None, None) => None,
        }
    }

    fn signed_attributes_tlv(&self, tag: u8) -> Result<Option<Vec<u8>>, std::io::Error> {
        let data = match (&self.signed_attributes_data, &self.signed_attributes) {
            (Some(data), _) => data.clone(),
            (None, Some(attrs)) => der_encode(&attrs.0)?,
            (None, None) => return Ok(None),
        };

        // +8 should be enough for tag + length.
        let mut buffer = Vec::with_capacity(data.len() + 8);
        write_der_tlv(tag, &data, &mut buffer)?;

        Ok(Some(buffer))
    }

    /// Obtain content representing the signed attributes data to be digested.
    ///
    /// RFC 5652 Section 5.4: the IMPLICIT [0] tag in the signedAttrs is not used
    /// for the DER encoding, rather an EXPLICIT SET OF tag is used. If this
    /// instance came into existence via a parse, the stashed raw bytes are used
    /// so the copy is lossless.
    pub fn signed_attributes_digested_content(&self) -> Result<Option<Vec<u8>>, std::io::Error> {
        self.signed_attributes_tlv(0x31)
    }

    /// Obtain the signed attributes encoded as they appear in `SignerInfo`.
    ///
    /// This is the `[0] IMPLICIT` form (tag `0xA0`).
    pub fn signed_attributes_implicit_encoding(&self) -> Result<Option<Vec<u8>>, std::io::Error> {
        self.signed_attributes_tlv(0xa0)
    }

    /// Find the first signed attribute of the given type.
    pub fn signed_attribute(&self, typ: &Oid) -> Option<&Attribute> {
        self.signed_attributes
            .as_ref()
            .and_then(|attrs| attrs.iter().find(|attr| &attr.typ == typ))
    }

    /// Find the first unsigned attribute of the given type.
    pub fn unsigned_attribute(&self, typ: &Oid) -> Option<&Attribute> {
        self.unsigned_attributes
            .as_ref()
            .and_then(|attrs| attrs.iter().find(|attr| &attr.typ == typ))
    }

    /// Append an attribute to the unsigned attributes.
    pub fn push_unsigned_attribute(&mut self, attribute: Attribute) {
        self.unsigned_attributes
            .get_or_insert_with(UnsignedAttributes::default)
            .push(attribute);
    }
}

impl Values for SignerInfo {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

enum SignedAttributesEncoding<'a> {
    Raw(&'a [u8]),
    Parsed(&'a SignedAttributes),
}

impl<'a> Values for SignedAttributesEncoding<'a> {
    fn encoded_len(&self, mode: Mode) -> usize {
        match self {
            Self::Raw(data) => der_tlv_len(data.len()),
            Self::Parsed(attrs) => attrs.encode_ref_as(Tag::CTX_0).encoded_len(mode),
        }
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        match self {
            Self::Raw(data) => {
                let mut buffer = Vec::with_capacity(der_tlv_len(data.len()));
                write_der_tlv(0xa0, data, &mut buffer)?;
                target.write_all(&buffer)
            }
            Self::Parsed(attrs) => attrs.encode_ref_as(Tag::CTX_0).write_encoded(mode, target),
        }
    }
}

/// Identifies the signer.
///
/// ```ASN.1
/// SignerIdentifier ::= CHOICE {
///   issuerAndSerialNumber IssuerAndSerialNumber,
///   subjectKeyIdentifier [0] SubjectKeyIdentifier }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SignerIdentifier {
    IssuerAndSerialNumber(IssuerAndSerialNumber),
    SubjectKeyIdentifier(SubjectKeyIdentifier),
}

impl SignerIdentifier {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        if let Some(identifier) =
            cons.take_opt_value_if(Tag::CTX_0, |content| OctetString::from_content(content))?
        {
            Ok(Self::SubjectKeyIdentifier(identifier))
        } else {
            Ok(Self::IssuerAndSerialNumber(
                IssuerAndSerialNumber::take_from(cons)?,
            ))
        }
    }
}

impl Values for SignerIdentifier {
    fn encoded_len(&self, mode: Mode) -> usize {
        match self {
            Self::IssuerAndSerialNumber(v) => v.encode_ref().encoded_len(mode),
            Self::SubjectKeyIdentifier(v) => v.encode_ref_as(Tag::CTX_0).encoded_len(mode),
        }
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        match self {
            Self::IssuerAndSerialNumber(v) => v.encode_ref().write_encoded(mode, target),
            Self::SubjectKeyIdentifier(v) => {
                v.encode_ref_as(Tag::CTX_0).write_encoded(mode, target)
            }
        }
    }
}

pub type SubjectKeyIdentifier = OctetString;

/// Signed attributes.
///
/// ```ASN.1
/// SignedAttributes ::= SET SIZE (1..MAX) OF Attribute
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SignedAttributes(Vec<Attribute>);

impl Deref for SignedAttributes {
    type Target = Vec<Attribute>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SignedAttributes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Attribute>> for SignedAttributes {
    fn from(v: Vec<Attribute>) -> Self {
        Self(v)
    }
}

impl SignedAttributes {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_set(|cons| Self::take_from_set(cons))
    }

    pub fn take_from_set<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        let mut attributes = Vec::new();

        while let Some(attribute) = Attribute::take_opt_from(cons)? {
            attributes.push(attribute);
        }

        Ok(Self(attributes))
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::set(&self.0)
    }

    pub fn encode_ref_as(&self, tag: Tag) -> impl Values + '_ {
        encode::set_as(tag, &self.0)
    }
}

/// Unsigned attributes.
///
/// ```ASN.1
/// UnsignedAttributes ::= SET SIZE (1..MAX) OF Attribute
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UnsignedAttributes(Vec<Attribute>);

impl Deref for UnsignedAttributes {
    type Target = Vec<Attribute>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for UnsignedAttributes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Attribute>> for UnsignedAttributes {
    fn from(v: Vec<Attribute>) -> Self {
        Self(v)
    }
}

impl UnsignedAttributes {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_set(|cons| Self::take_from_set(cons))
    }

    pub fn take_from_set<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        let mut attributes = Vec::new();

        while let Some(attribute) = Attribute::take_opt_from(cons)? {
            attributes.push(attribute);
        }

        Ok(Self(attributes))
    }

    pub fn encode_ref_as(&self, tag: Tag) -> impl Values + '_ {
        encode::set_as(tag, &self.0)
    }
}

/// A single attribute.
///
/// ```ASN.1
/// Attribute ::= SEQUENCE {
///   attrType OBJECT IDENTIFIER,
///   attrValues SET OF AttributeValue }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribute {
    pub typ: Oid,
    pub values: Vec<AttributeValue>,
}

impl Attribute {
    /// Construct an attribute holding a single value.
    pub fn new(typ: Oid, value: AttributeValue) -> Self {
        Self {
            typ,
            values: vec![value],
        }
    }

    /// Construct a single valued attribute from something encodable.
    pub fn from_values(typ: Oid, value: impl Values) -> Self {
        Self::new(typ, AttributeValue::from_values(value))
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match Self::take_opt_from(cons)? {
            Some(attribute) => Ok(attribute),
            None => Err(cons.content_err("expected Attribute")),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let typ = Oid::take_from(cons)?;

            let values = cons.take_set(|cons| {
                let mut values = Vec::new();

                while let Some(value) = AttributeValue::take_opt_from(cons)? {
                    values.push(value);
                }

                Ok(values)
            })?;

            Ok(Self { typ, values })
        })
    }

    /// Decode an attribute from its DER encoding.
    pub fn from_der(data: &[u8]) -> Result<Self, DecodeError<Infallible>> {
        Constructed::decode(data, Mode::Der, |cons| Self::take_from(cons))
    }

    /// The first value, if any.
    pub fn first_value(&self) -> Option<&AttributeValue> {
        self.values.first()
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.typ.encode_ref(), encode::set(&self.values)))
    }

    /// Obtain the DER encoding of this attribute.
    pub fn to_der(&self) -> Result<Vec<u8>, std::io::Error> {
        der_encode(self.encode_ref())
    }
}

impl Values for Attribute {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// A single value of an attribute, kept in encoded form.
#[derive(Clone, Debug)]
pub struct AttributeValue(Captured);

impl AttributeValue {
    /// Construct a new instance from captured data.
    pub fn new(captured: Captured) -> Self {
        Self(captured)
    }

    /// Construct a new instance by DER encoding a value.
    pub fn from_values(values: impl Values) -> Self {
        Self(Captured::from_values(Mode::Der, values))
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        Ok(take_opt_captured(cons)?.map(Self))
    }

    /// Decode the value with the given function.
    pub fn decode<'a, F, T>(&'a self, op: F) -> Result<T, DecodeError<Infallible>>
    where
        F: FnOnce(&mut Constructed<SliceSource<'a>>) -> Result<T, DecodeError<Infallible>>,
    {
        Constructed::decode(self.0.as_slice(), Mode::Der, op)
    }
}

impl Values for AttributeValue {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.0.encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.0.write_encoded(mode, target)
    }
}

impl Deref for AttributeValue {
    type Target = Captured;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl Eq for AttributeValue {}

pub type SignatureValue = OctetString;

pub type SignatureAlgorithmIdentifier = AlgorithmIdentifier;

/// Revocation info choices.
///
/// ```ASN.1
/// RevocationInfoChoices ::= SET OF RevocationInfoChoice
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RevocationInfoChoices(Vec<RevocationInfoChoice>);

impl Deref for RevocationInfoChoices {
    type Target = Vec<RevocationInfoChoice>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for RevocationInfoChoices {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<RevocationInfoChoice>> for RevocationInfoChoices {
    fn from(v: Vec<RevocationInfoChoice>) -> Self {
        Self(v)
    }
}

impl RevocationInfoChoices {
    pub fn from_set_content<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        let mut choices = Vec::new();

        while let Some(choice) = RevocationInfoChoice::take_opt_from(cons)? {
            choices.push(choice);
        }

        Ok(Self(choices))
    }

    pub fn encode_ref_as(&self, tag: Tag) -> impl Values + '_ {
        encode::set_as(tag, &self.0)
    }

    /// Iterate over the CRLs, skipping other revocation formats.
    pub fn crls(&self) -> impl Iterator<Item = &CapturedCrl> {
        self.0.iter().filter_map(|choice| match choice {
            RevocationInfoChoice::Crl(crl) => Some(crl.as_ref()),
            RevocationInfoChoice::Other(_) => None,
        })
    }
}

/// Revocation info choice.
///
/// ```ASN.1
/// RevocationInfoChoice ::= CHOICE {
///   crl CertificateList,
///   other [1] IMPLICIT OtherRevocationInfoFormat }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RevocationInfoChoice {
    Crl(Box<CapturedCrl>),
    Other(OtherRevocationInfoFormat),
}

impl RevocationInfoChoice {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        if let Some(other) = cons.take_opt_constructed_if(Tag::CTX_1, |cons| {
            OtherRevocationInfoFormat::from_sequence(cons)
        })? {
            Ok(Some(Self::Other(other)))
        } else {
            Ok(CapturedCrl::take_opt_from(cons)?.map(|crl| Self::Crl(Box::new(crl))))
        }
    }
}

impl Values for RevocationInfoChoice {
    fn encoded_len(&self, mode: Mode) -> usize {
        match self {
            Self::Crl(crl) => crl.encoded_len(mode),
            Self::Other(other) => other.encode_ref_as(Tag::CTX_1).encoded_len(mode),
        }
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        match self {
            Self::Crl(crl) => crl.write_encoded(mode, target),
            Self::Other(other) => other.encode_ref_as(Tag::CTX_1).write_encoded(mode, target),
        }
    }
}

/// Other revocation info format.
///
/// ```ASN.1
/// OtherRevocationInfoFormat ::= SEQUENCE {
///   otherRevInfoFormat OBJECT IDENTIFIER,
///   otherRevInfo ANY DEFINED BY otherRevInfoFormat }
/// ```
#[derive(Clone, Debug)]
pub struct OtherRevocationInfoFormat {
    pub format: Oid,
    pub info: Captured,
}

impl OtherRevocationInfoFormat {
    pub fn from_sequence<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        let format = Oid::take_from(cons)?;
        let info = cons.capture_all()?;

        Ok(Self { format, info })
    }

    pub fn encode_ref_as(&self, tag: Tag) -> impl Values + '_ {
        encode::sequence_as(tag, (self.format.encode_ref(), &self.info))
    }
}

impl PartialEq for OtherRevocationInfoFormat {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format && self.info.as_slice() == other.info.as_slice()
    }
}

impl Eq for OtherRevocationInfoFormat {}

/// Certificate choices.
///
/// ```ASN.1
/// CertificateChoices ::= CHOICE {
///   certificate Certificate,
///   extendedCertificate [0] IMPLICIT ExtendedCertificate, -- Obsolete
///   v1AttrCert [1] IMPLICIT AttributeCertificateV1,       -- Obsolete
///   v2AttrCert [2] IMPLICIT AttributeCertificateV2,
///   other [3] IMPLICIT OtherCertificateFormat }
/// ```
///
/// Everything but X.509 certificates is kept as the opaque content of the
/// tagged value.
#[derive(Clone, Debug)]
pub enum CertificateChoices {
    Certificate(Box<CapturedCertificate>),
    ExtendedCertificate(Captured),
    AttributeCertificateV1(Captured),
    AttributeCertificateV2(Captured),
    Other(Box<OtherCertificateFormat>),
}

impl CertificateChoices {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        if let Some(content) = cons.take_opt_constructed_if(Tag::CTX_0, |cons| cons.capture_all())? {
            Ok(Some(Self::ExtendedCertificate(content)))
        } else if let Some(content) =
            cons.take_opt_constructed_if(Tag::CTX_1, |cons| cons.capture_all())?
        {
            Ok(Some(Self::AttributeCertificateV1(content)))
        } else if let Some(content) =
            cons.take_opt_constructed_if(Tag::CTX_2, |cons| cons.capture_all())?
        {
            Ok(Some(Self::AttributeCertificateV2(content)))
        } else if let Some(other) = cons.take_opt_constructed_if(Tag::CTX_3, |cons| {
            OtherCertificateFormat::from_sequence(cons)
        })? {
            Ok(Some(Self::Other(Box::new(other))))
        } else {
            Ok(CapturedCertificate::take_opt_from(cons)?
                .map(|cert| Self::Certificate(Box::new(cert))))
        }
    }

    /// The X.509 certificate, if this is one.
    pub fn as_certificate(&self) -> Option<&CapturedCertificate> {
        match self {
            Self::Certificate(cert) => Some(cert),
            _ => None,
        }
    }
}

impl PartialEq for CertificateChoices {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Certificate(a), Self::Certificate(b)) => a == b,
            (Self::ExtendedCertificate(a), Self::ExtendedCertificate(b))
            | (Self::AttributeCertificateV1(a), Self::AttributeCertificateV1(b))
            | (Self::AttributeCertificateV2(a), Self::AttributeCertificateV2(b)) => {
                a.as_slice() == b.as_slice()
            }
            (Self::Other(a), Self::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CertificateChoices {}

impl Values for CertificateChoices {
    fn encoded_len(&self, mode: Mode) -> usize {
        match self {
            Self::Certificate(cert) => cert.encoded_len(mode),
            Self::ExtendedCertificate(content) => {
                encode::sequence_as(Tag::CTX_0, content).encoded_len(mode)
            }
            Self::AttributeCertificateV1(content) => {
                encode::sequence_as(Tag::CTX_1, content).encoded_len(mode)
            }
            Self::AttributeCertificateV2(content) => {
                encode::sequence_as(Tag::CTX_2, content).encoded_len(mode)
            }
            Self::Other(other) => other.encode_ref_as(Tag::CTX_3).encoded_len(mode),
        }
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        match self {
            Self::Certificate(cert) => cert.write_encoded(mode, target),
            Self::ExtendedCertificate(content) => {
                encode::sequence_as(Tag::CTX_0, content).write_encoded(mode, target)
            }
            Self::AttributeCertificateV1(content) => {
                encode::sequence_as(Tag::CTX_1, content).write_encoded(mode, target)
            }
            Self::AttributeCertificateV2(content) => {
                encode::sequence_as(Tag::CTX_2, content).write_encoded(mode, target)
            }
            Self::Other(other) => other.encode_ref_as(Tag::CTX_3).write_encoded(mode, target),
        }
    }
}

/// Other certificate format.
///
/// ```ASN.1
/// OtherCertificateFormat ::= SEQUENCE {
///   otherCertFormat OBJECT IDENTIFIER,
///   otherCert ANY DEFINED BY otherCertFormat }
/// ```
#[derive(Clone, Debug)]
pub struct OtherCertificateFormat {
    pub format: Oid,
    pub certificate: Captured,
}

impl OtherCertificateFormat {
    pub fn from_sequence<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        let format = Oid::take_from(cons)?;
        let certificate = cons.capture_all()?;

        Ok(Self {
            format,
            certificate,
        })
    }

    pub fn encode_ref_as(&self, tag: Tag) -> impl Values + '_ {
        encode::sequence_as(tag, (self.format.encode_ref(), &self.certificate))
    }
}

impl PartialEq for OtherCertificateFormat {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format
            && self.certificate.as_slice() == other.certificate.as_slice()
    }
}

impl Eq for OtherCertificateFormat {}

/// Certificate set.
///
/// ```ASN.1
/// CertificateSet ::= SET OF CertificateChoices
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CertificateSet(Vec<CertificateChoices>);

impl Deref for CertificateSet {
    type Target = Vec<CertificateChoices>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CertificateSet {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<CertificateChoices>> for CertificateSet {
    fn from(v: Vec<CertificateChoices>) -> Self {
        Self(v)
    }
}

impl CertificateSet {
    pub fn from_set_content<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        let mut certs = Vec::new();

        while let Some(cert) = CertificateChoices::take_opt_from(cons)? {
            certs.push(cert);
        }

        Ok(Self(certs))
    }

    pub fn encode_ref_as(&self, tag: Tag) -> impl Values + '_ {
        encode::set_as(tag, &self.0)
    }

    /// Iterate over the X.509 certificates, skipping other formats.
    pub fn certificates(&self) -> impl Iterator<Item = &CapturedCertificate> {
        self.0.iter().filter_map(|choice| choice.as_certificate())
    }
}

/// Issuer and serial number.
///
/// ```ASN.1
/// IssuerAndSerialNumber ::= SEQUENCE {
///   issuer Name,
///   serialNumber CertificateSerialNumber }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IssuerAndSerialNumber {
    pub issuer: Name,
    pub serial_number: CertificateSerialNumber,
}

impl IssuerAndSerialNumber {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let issuer = Name::take_from(cons)?;
            let serial_number = Integer::take_from(cons)?;

            Ok(Self {
                issuer,
                serial_number,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.issuer.encode_ref(), (&self.serial_number).encode()))
    }
}

/// Version number.
///
/// ```ASN.1
/// CMSVersion ::= INTEGER
///                { v0(0), v1(1), v2(2), v3(3), v4(4), v5(5) }
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CmsVersion {
    V0 = 0,
    V1 = 1,
    V2 = 2,
    V3 = 3,
    V4 = 4,
    V5 = 5,
}

impl CmsVersion {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match cons.take_primitive_if(Tag::INTEGER, Integer::i8_from_primitive)? {
            0 => Ok(Self::V0),
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            4 => Ok(Self::V4),
            5 => Ok(Self::V5),
            _ => Err(cons.content_err("unexpected CMSVersion")),
        }
    }

    pub fn encode(self) -> impl Values {
        u8::from(self).encode()
    }
}

impl From<CmsVersion> for u8 {
    fn from(v: CmsVersion) -> u8 {
        match v {
            CmsVersion::V0 => 0,
            CmsVersion::V1 => 1,
            CmsVersion::V2 => 2,
            CmsVersion::V3 => 3,
            CmsVersion::V4 => 4,
            CmsVersion::V5 => 5,
        }
    }
}

pub type ContentType = Oid;

pub type MessageDigest = OctetString;

pub type SigningTime = Time;

#[cfg(test)]
mod test {
    use {super::*, crate::testutil::*};

    #[test]
    fn content_info_explicit_wrapper() {
        let info = ContentInfo {
            content_type: Oid(Bytes::copy_from_slice(OID_ID_DATA.as_ref())),
            content: Captured::from_values(
                Mode::Der,
                OctetString::new(Bytes::from_static(b"hi")).encode(),
            ),
        };

        let der = der_encode(info.encode_ref()).unwrap();
        assert_eq!(
            der,
            vec![
                0x30, 0x11, 0x06, 0x09, 42, 134, 72, 134, 247, 13, 1, 7, 1, 0xa0, 0x04, 0x04,
                0x02, b'h', b'i'
            ]
        );

        let decoded =
            Constructed::decode(der.as_slice(), Mode::Der, |cons| ContentInfo::take_from(cons))
                .unwrap();
        assert_eq!(decoded, info);
    }

    #[test]
    fn signed_data_round_trip() {
        let signed_data = signed_data(b"hello, world");
        let der = signed_data.to_content_info_der().unwrap();

        let parsed = SignedData::decode_der(&der).unwrap();
        assert_eq!(parsed.signer_infos.len(), 1);
        assert_eq!(parsed.certificates.as_ref().unwrap().certificates().count(), 2);
        assert_eq!(parsed.crls.as_ref().unwrap().crls().count(), 1);
        assert_eq!(parsed.to_content_info_der().unwrap(), der);
    }

    #[test]
    fn signed_attributes_encodings() {
        let signed_data = signed_data(b"content");
        let der = signed_data.to_content_info_der().unwrap();
        let parsed = SignedData::decode_der(&der).unwrap();

        let signer = &parsed.signer_infos[0];
        let raw = signer.signed_attributes_data.as_ref().unwrap();

        let digested = signer.signed_attributes_digested_content().unwrap().unwrap();
        assert_eq!(digested[0], 0x31);
        assert!(digested.ends_with(raw));

        let implicit = signer.signed_attributes_implicit_encoding().unwrap().unwrap();
        assert_eq!(implicit[0], 0xa0);
        assert_eq!(&implicit[1..], &digested[1..]);

        // A freshly constructed signer encodes the parsed attributes identically.
        let built = &signed_data.signer_infos[0];
        assert!(built.signed_attributes_data.is_none());
        assert_eq!(built.signed_attributes_digested_content().unwrap().unwrap(), digested);
    }

    #[test]
    fn subject_key_identifier_is_implicit() {
        let sid = SignerIdentifier::SubjectKeyIdentifier(OctetString::new(Bytes::from_static(&[
            1, 2, 3,
        ])));

        let der = der_encode(encode::sequence(&sid)).unwrap();
        assert_eq!(der, vec![0x30, 0x05, 0x80, 0x03, 1, 2, 3]);

        let decoded = Constructed::decode(der.as_slice(), Mode::Der, |cons| {
            cons.take_sequence(|cons| SignerIdentifier::take_from(cons))
        })
        .unwrap();
        assert_eq!(decoded, sid);
    }

    #[test]
    fn attribute_values_are_captured_individually() {
        let attribute = Attribute {
            typ: Oid(Bytes::copy_from_slice(OID_CONTENT_TYPE.as_ref())),
            values: vec![
                AttributeValue::from_values(Oid(Bytes::copy_from_slice(OID_ID_DATA.as_ref())).encode()),
                AttributeValue::from_values(Oid(Bytes::copy_from_slice(OID_ID_SIGNED_DATA.as_ref())).encode()),
            ],
        };

        let der = attribute.to_der().unwrap();
        let decoded = Attribute::from_der(&der).unwrap();

        assert_eq!(decoded.values.len(), 2);
        assert_eq!(decoded, attribute);

        let oid = decoded.values[1]
            .decode(|cons| Oid::take_from(cons))
            .unwrap();
        assert_eq!(oid, OID_ID_SIGNED_DATA);
    }

    #[test]
    fn push_unsigned_attribute() {
        let mut signer = signed_data(b"x").signer_infos[0].clone();
        assert!(signer.unsigned_attributes.is_none());

        let attribute = Attribute::from_values(
            Oid(Bytes::copy_from_slice(OID_CONTENT_TYPE.as_ref())),
            Oid(Bytes::copy_from_slice(OID_ID_DATA.as_ref())).encode(),
        );
        signer.push_unsigned_attribute(attribute.clone());

        assert_eq!(
            signer.unsigned_attribute(&Oid(Bytes::copy_from_slice(OID_CONTENT_TYPE.as_ref()))),
            Some(&attribute)
        );
    }
}
