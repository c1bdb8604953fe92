// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ASN.1 types defined by RFC 2634 (Enhanced Security Services).

use {
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode::{self, PrimitiveContent, Values},
        string::Utf8String,
        ConstOid, Mode, OctetString, Oid, Tag,
    },
    std::io::Write,
};

/// Content hints attribute.
///
/// 1.2.840.113549.1.9.16.2.4
pub const OID_CONTENT_HINTS: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 4]);

/// Content reference attribute.
///
/// 1.2.840.113549.1.9.16.2.10
pub const OID_CONTENT_REFERENCE: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 10]);

/// Content hints.
///
/// ```ASN.1
/// ContentHints ::= SEQUENCE {
///   contentDescription UTF8String (SIZE (1..MAX)) OPTIONAL,
///   contentType ContentType }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContentHints {
    pub content_description: Option<Utf8String>,
    pub content_type: Oid,
}

impl ContentHints {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let content_description = cons
                .take_opt_value_if(Tag::UTF8_STRING, |content| Utf8String::from_content(content))?;
            let content_type = Oid::take_from(cons)?;

            Ok(Self {
                content_description,
                content_type,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.content_description.as_ref().map(|s| s.encode_ref()),
            self.content_type.encode_ref(),
        ))
    }
}

impl Values for ContentHints {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Content reference.
///
/// ```ASN.1
/// ContentReference ::= SEQUENCE {
///   contentType ContentType,
///   signedContentIdentifier ContentIdentifier,
///   originatorSignatureValue OCTET STRING }
///
/// ContentIdentifier ::= OCTET STRING
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContentReference {
    pub content_type: Oid,
    pub signed_content_identifier: OctetString,
    pub originator_signature_value: OctetString,
}

impl ContentReference {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let content_type = Oid::take_from(cons)?;
            let signed_content_identifier = OctetString::take_from(cons)?;
            let originator_signature_value = OctetString::take_from(cons)?;

            Ok(Self {
                content_type,
                signed_content_identifier,
                originator_signature_value,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.content_type.encode_ref(),
            self.signed_content_identifier.encode_ref(),
            self.originator_signature_value.encode_ref(),
        ))
    }
}

impl Values for ContentReference {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::asn1::{common::der_encode, rfc5652::OID_ID_DATA},
        bytes::Bytes,
    };

    #[test]
    fn content_hints_description_is_optional() {
        let hints = ContentHints {
            content_description: None,
            content_type: Oid(Bytes::copy_from_slice(OID_ID_DATA.as_ref())),
        };

        let der = der_encode(hints.encode_ref()).unwrap();
        assert_eq!(
            der,
            vec![0x30, 0x0b, 0x06, 0x09, 42, 134, 72, 134, 247, 13, 1, 7, 1]
        );

        let described = ContentHints {
            content_description: Some(Utf8String::from_string("invoice".into()).unwrap()),
            content_type: Oid(Bytes::copy_from_slice(OID_ID_DATA.as_ref())),
        };

        let der = der_encode(described.encode_ref()).unwrap();
        let parsed =
            Constructed::decode(der.as_slice(), Mode::Der, |cons| ContentHints::take_from(cons))
                .unwrap();
        assert_eq!(parsed, described);
        assert_eq!(
            parsed.content_description.map(|s| s.to_string()),
            Some("invoice".to_string())
        );
    }

    #[test]
    fn content_reference() {
        let reference = ContentReference {
            content_type: Oid(Bytes::copy_from_slice(OID_ID_DATA.as_ref())),
            signed_content_identifier: OctetString::new(b"doc-1".to_vec().into()),
            originator_signature_value: OctetString::new(vec![9u8; 16].into()),
        };

        let der = der_encode(reference.encode_ref()).unwrap();
        let parsed = Constructed::decode(der.as_slice(), Mode::Der, |cons| {
            ContentReference::take_from(cons)
        })
        .unwrap();

        assert_eq!(parsed, reference);
    }
}
