// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adobe's revocation information archival attribute (PDF signatures).

use {
    crate::{asn1::rfc6960::OcspResponse, certificate::CapturedCrl},
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode::{self, PrimitiveContent, Values},
        ConstOid, Mode, OctetString, Oid, Tag,
    },
    std::io::Write,
};

/// Adobe revocation information archival attribute.
///
/// 1.2.840.113583.1.1.8
pub const OID_ADOBE_REVOCATION_INFO_ARCHIVAL: ConstOid =
    Oid(&[42, 134, 72, 134, 247, 47, 1, 1, 8]);

/// Revocation information archival.
///
/// ```ASN.1
/// RevocationInfoArchival ::= SEQUENCE {
///   crl [0] EXPLICIT SEQUENCE of CRLs, OPTIONAL
///   ocsp [1] EXPLICIT SEQUENCE of OCSP Responses, OPTIONAL
///   otherRevInfo [2] EXPLICIT SEQUENCE of OtherRevInfo, OPTIONAL
/// }
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RevocationInfoArchival {
    pub crl: Option<Vec<CapturedCrl>>,
    pub ocsp: Option<Vec<OcspResponse>>,
    pub other_rev_info: Option<Vec<OtherRevInfo>>,
}

impl RevocationInfoArchival {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let crl = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
                cons.take_sequence(|cons| {
                    let mut crls = Vec::new();

                    while let Some(crl) = CapturedCrl::take_opt_from(cons)? {
                        crls.push(crl);
                    }

                    Ok(crls)
                })
            })?;
            let ocsp = cons.take_opt_constructed_if(Tag::CTX_1, |cons| {
                cons.take_sequence(|cons| {
                    let mut responses = Vec::new();

                    while let Some(response) = OcspResponse::take_opt_from(cons)? {
                        responses.push(response);
                    }

                    Ok(responses)
                })
            })?;
            let other_rev_info = cons.take_opt_constructed_if(Tag::CTX_2, |cons| {
                cons.take_sequence(|cons| {
                    let mut infos = Vec::new();

                    while let Some(info) = OtherRevInfo::take_opt_from(cons)? {
                        infos.push(info);
                    }

                    Ok(infos)
                })
            })?;

            Ok(Self {
                crl,
                ocsp,
                other_rev_info,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.crl
                .as_ref()
                .map(|crls| encode::sequence(crls).explicit(Tag::CTX_0)),
            self.ocsp
                .as_ref()
                .map(|responses| encode::sequence(responses).explicit(Tag::CTX_1)),
            self.other_rev_info
                .as_ref()
                .map(|infos| encode::sequence(infos).explicit(Tag::CTX_2)),
        ))
    }
}

impl Values for RevocationInfoArchival {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Revocation information of another kind.
///
/// ```ASN.1
/// OtherRevInfo ::= SEQUENCE {
///   Type OBJECT IDENTIFIER
///   Value OCTET STRING
/// }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OtherRevInfo {
    pub typ: Oid,
    pub value: OctetString,
}

impl OtherRevInfo {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let typ = Oid::take_from(cons)?;
            let value = OctetString::take_from(cons)?;

            Ok(Self { typ, value })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.typ.encode_ref(), self.value.encode_ref()))
    }
}

impl Values for OtherRevInfo {
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
        crate::{asn1::common::der_encode, testutil::*},
        bytes::Bytes,
    };

    #[test]
    fn all_fields() {
        let archival = RevocationInfoArchival {
            crl: Some(vec![crl("Root", Some(1))]),
            ocsp: Some(vec![ocsp_response("Responder", 4)]),
            other_rev_info: Some(vec![OtherRevInfo {
                typ: Oid(Bytes::from_static(&[42, 3, 4])),
                value: OctetString::new(Bytes::from_static(b"other")),
            }]),
        };

        let der = der_encode(archival.encode_ref()).unwrap();
        let parsed = Constructed::decode(der.as_slice(), Mode::Der, |cons| {
            RevocationInfoArchival::take_from(cons)
        })
        .unwrap();

        assert_eq!(parsed, archival);
        assert_eq!(
            parsed.crl.as_ref().unwrap()[0].as_der(),
            archival.crl.as_ref().unwrap()[0].as_der()
        );
    }

    #[test]
    fn empty() {
        let archival = RevocationInfoArchival::default();
        let der = der_encode(archival.encode_ref()).unwrap();
        assert_eq!(der, vec![0x30, 0x00]);
    }
}
