// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ASN.1 types defined by RFC 6960 (OCSP).

use {
    crate::asn1::{
        common::GeneralizedTime,
        rfc3280::Name,
        rfc5280::{AlgorithmIdentifier, CertificateSerialNumber, Extensions},
    },
    crate::certificate::CapturedCertificate,
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode::{self, PrimitiveContent, Values},
        BitString, ConstOid, Integer, Mode, OctetString, Oid, Tag,
    },
    std::{convert::Infallible, io::Write},
};

/// Basic OCSP response type.
///
/// 1.3.6.1.5.5.7.48.1.1
pub const OID_PKIX_OCSP_BASIC: ConstOid = Oid(&[43, 6, 1, 5, 5, 7, 48, 1, 1]);

/// OCSP response.
///
/// ```ASN.1
/// OCSPResponse ::= SEQUENCE {
///    responseStatus         OCSPResponseStatus,
///    responseBytes          [0] EXPLICIT ResponseBytes OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OcspResponse {
    pub response_status: OcspResponseStatus,
    pub response_bytes: Option<ResponseBytes>,
}

impl OcspResponse {
    pub fn from_der(data: &[u8]) -> Result<Self, DecodeError<Infallible>> {
        Constructed::decode(data, Mode::Der, |cons| Self::take_from(cons))
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match Self::take_opt_from(cons)? {
            Some(response) => Ok(response),
            None => Err(cons.content_err("expected OCSPResponse")),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let response_status = OcspResponseStatus::take_from(cons)?;
            let response_bytes =
                cons.take_opt_constructed_if(Tag::CTX_0, |cons| ResponseBytes::take_from(cons))?;

            Ok(Self {
                response_status,
                response_bytes,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.response_status.encode(),
            self.response_bytes
                .as_ref()
                .map(|bytes| bytes.encode_ref().explicit(Tag::CTX_0)),
        ))
    }

    /// Decode the embedded basic OCSP response.
    ///
    /// Returns `None` when there are no response bytes or they are of a type
    /// other than `id-pkix-ocsp-basic`.
    pub fn basic_response(&self) -> Result<Option<BasicOcspResponse>, DecodeError<Infallible>> {
        match &self.response_bytes {
            Some(bytes) if bytes.response_type == OID_PKIX_OCSP_BASIC => {
                let data = bytes.response.to_bytes();

                Ok(Some(Constructed::decode(data.as_ref(), Mode::Der, |cons| {
                    BasicOcspResponse::take_from(cons)
                })?))
            }
            _ => Ok(None),
        }
    }
}

impl Values for OcspResponse {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// OCSP response status.
///
/// ```ASN.1
/// OCSPResponseStatus ::= ENUMERATED {
///     successful            (0),  -- Response has valid confirmations
///     malformedRequest      (1),  -- Illegal confirmation request
///     internalError         (2),  -- Internal error in issuer
///     tryLater              (3),  -- Try again later
///                                 -- (4) is not used
///     sigRequired           (5),  -- Must sign the request
///     unauthorized          (6)   -- Request unauthorized
/// }
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OcspResponseStatus {
    Successful = 0,
    MalformedRequest = 1,
    InternalError = 2,
    TryLater = 3,
    SigRequired = 5,
    Unauthorized = 6,
}

impl OcspResponseStatus {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match cons.take_primitive_if(Tag::ENUMERATED, |prim| prim.to_u8())? {
            0 => Ok(Self::Successful),
            1 => Ok(Self::MalformedRequest),
            2 => Ok(Self::InternalError),
            3 => Ok(Self::TryLater),
            5 => Ok(Self::SigRequired),
            6 => Ok(Self::Unauthorized),
            _ => Err(cons.content_err("unknown OCSPResponseStatus")),
        }
    }

    pub fn encode(self) -> impl Values {
        u8::from(self).encode_as(Tag::ENUMERATED)
    }
}

impl From<OcspResponseStatus> for u8 {
    fn from(v: OcspResponseStatus) -> u8 {
        match v {
            OcspResponseStatus::Successful => 0,
            OcspResponseStatus::MalformedRequest => 1,
            OcspResponseStatus::InternalError => 2,
            OcspResponseStatus::TryLater => 3,
            OcspResponseStatus::SigRequired => 5,
            OcspResponseStatus::Unauthorized => 6,
        }
    }
}

/// Response bytes.
///
/// ```ASN.1
/// ResponseBytes ::= SEQUENCE {
///     responseType   OBJECT IDENTIFIER,
///     response       OCTET STRING }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResponseBytes {
    pub response_type: Oid,
    pub response: OctetString,
}

impl ResponseBytes {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let response_type = Oid::take_from(cons)?;
            let response = OctetString::take_from(cons)?;

            Ok(Self {
                response_type,
                response,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.response_type.encode_ref(), self.response.encode_ref()))
    }
}

/// Basic OCSP response.
///
/// ```ASN.1
/// BasicOCSPResponse       ::= SEQUENCE {
///    tbsResponseData      ResponseData,
///    signatureAlgorithm   AlgorithmIdentifier,
///    signature            BIT STRING,
///    certs            [0] EXPLICIT SEQUENCE OF Certificate OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BasicOcspResponse {
    pub tbs_response_data: ResponseData,
    pub signature_algorithm: AlgorithmIdentifier,
    pub signature: BitString,
    pub certs: Option<Vec<CapturedCertificate>>,
}

impl BasicOcspResponse {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match Self::take_opt_from(cons)? {
            Some(response) => Ok(response),
            None => Err(cons.content_err("expected BasicOCSPResponse")),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let tbs_response_data = ResponseData::take_from(cons)?;
            let signature_algorithm = AlgorithmIdentifier::take_from(cons)?;
            let signature = BitString::take_from(cons)?;
            let certs = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
                cons.take_sequence(|cons| {
                    let mut certs = Vec::new();

                    while let Some(cert) = CapturedCertificate::take_opt_from(cons)? {
                        certs.push(cert);
                    }

                    Ok(certs)
                })
            })?;

            Ok(Self {
                tbs_response_data,
                signature_algorithm,
                signature,
                certs,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.tbs_response_data.encode_ref(),
            self.signature_algorithm.encode_ref(),
            self.signature.encode_ref(),
            self.certs
                .as_ref()
                .map(|certs| encode::sequence(certs).explicit(Tag::CTX_0)),
        ))
    }
}

impl Values for BasicOcspResponse {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Response data.
///
/// ```ASN.1
/// ResponseData ::= SEQUENCE {
///    version              [0] EXPLICIT Version DEFAULT v1,
///    responderID              ResponderID,
///    producedAt               GeneralizedTime,
///    responses                SEQUENCE OF SingleResponse,
///    responseExtensions   [1] EXPLICIT Extensions OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResponseData {
    pub version: Option<Integer>,
    pub responder_id: ResponderId,
    pub produced_at: GeneralizedTime,
    pub responses: Vec<SingleResponse>,
    pub response_extensions: Option<Extensions>,
}

impl ResponseData {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let version = cons.take_opt_constructed_if(Tag::CTX_0, |cons| Integer::take_from(cons))?;
            let responder_id = ResponderId::take_from(cons)?;
            let produced_at = GeneralizedTime::take_from(cons)?;
            let responses = cons.take_sequence(|cons| {
                let mut responses = Vec::new();

                while let Some(response) = SingleResponse::take_opt_from(cons)? {
                    responses.push(response);
                }

                Ok(responses)
            })?;
            let response_extensions =
                cons.take_opt_constructed_if(Tag::CTX_1, |cons| Extensions::take_from(cons))?;

            Ok(Self {
                version,
                responder_id,
                produced_at,
                responses,
                response_extensions,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.version
                .as_ref()
                .map(|version| version.encode().explicit(Tag::CTX_0)),
            &self.responder_id,
            self.produced_at.encode_ref(),
            encode::sequence(&self.responses),
            self.response_extensions
                .as_ref()
                .map(|extensions| extensions.encode_ref().explicit(Tag::CTX_1)),
        ))
    }
}

/// Responder identifier.
///
/// ```ASN.1
/// ResponderID ::= CHOICE {
///    byName   [1] Name,
///    byKey    [2] KeyHash }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResponderId {
    ByName(Name),
    ByKey(OctetString),
}

impl ResponderId {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        if let Some(name) = cons.take_opt_constructed_if(Tag::CTX_1, |cons| Name::take_from(cons))? {
            Ok(Self::ByName(name))
        } else if let Some(key) =
            cons.take_opt_constructed_if(Tag::CTX_2, |cons| OctetString::take_from(cons))?
        {
            Ok(Self::ByKey(key))
        } else {
            Err(cons.content_err("expected ResponderID"))
        }
    }
}

impl Values for ResponderId {
    fn encoded_len(&self, mode: Mode) -> usize {
        match self {
            Self::ByName(name) => name.encode_ref().explicit(Tag::CTX_1).encoded_len(mode),
            Self::ByKey(key) => key.encode_ref().explicit(Tag::CTX_2).encoded_len(mode),
        }
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        match self {
            Self::ByName(name) => name
                .encode_ref()
                .explicit(Tag::CTX_1)
                .write_encoded(mode, target),
            Self::ByKey(key) => key
                .encode_ref()
                .explicit(Tag::CTX_2)
                .write_encoded(mode, target),
        }
    }
}

/// Single response.
///
/// ```ASN.1
/// SingleResponse ::= SEQUENCE {
///    certID                       CertID,
///    certStatus                   CertStatus,
///    thisUpdate                   GeneralizedTime,
///    nextUpdate         [0]       EXPLICIT GeneralizedTime OPTIONAL,
///    singleExtensions   [1]       EXPLICIT Extensions OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SingleResponse {
    pub cert_id: CertId,
    pub cert_status: CertStatus,
    pub this_update: GeneralizedTime,
    pub next_update: Option<GeneralizedTime>,
    pub single_extensions: Option<Extensions>,
}

impl SingleResponse {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let cert_id = CertId::take_from(cons)?;
            let cert_status = CertStatus::take_from(cons)?;
            let this_update = GeneralizedTime::take_from(cons)?;
            let next_update =
                cons.take_opt_constructed_if(Tag::CTX_0, |cons| GeneralizedTime::take_from(cons))?;
            let single_extensions =
                cons.take_opt_constructed_if(Tag::CTX_1, |cons| Extensions::take_from(cons))?;

            Ok(Self {
                cert_id,
                cert_status,
                this_update,
                next_update,
                single_extensions,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.cert_id.encode_ref(),
            &self.cert_status,
            self.this_update.encode_ref(),
            self.next_update
                .as_ref()
                .map(|time| time.encode_ref().explicit(Tag::CTX_0)),
            self.single_extensions
                .as_ref()
                .map(|extensions| extensions.encode_ref().explicit(Tag::CTX_1)),
        ))
    }
}

impl Values for SingleResponse {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Certificate identifier.
///
/// ```ASN.1
/// CertID          ::=     SEQUENCE {
///     hashAlgorithm       AlgorithmIdentifier,
///     issuerNameHash      OCTET STRING, -- Hash of issuer's DN
///     issuerKeyHash       OCTET STRING, -- Hash of issuer's public key
///     serialNumber        CertificateSerialNumber }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertId {
    pub hash_algorithm: AlgorithmIdentifier,
    pub issuer_name_hash: OctetString,
    pub issuer_key_hash: OctetString,
    pub serial_number: CertificateSerialNumber,
}

impl CertId {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let hash_algorithm = AlgorithmIdentifier::take_from(cons)?;
            let issuer_name_hash = OctetString::take_from(cons)?;
            let issuer_key_hash = OctetString::take_from(cons)?;
            let serial_number = Integer::take_from(cons)?;

            Ok(Self {
                hash_algorithm,
                issuer_name_hash,
                issuer_key_hash,
                serial_number,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.hash_algorithm.encode_ref(),
            self.issuer_name_hash.encode_ref(),
            self.issuer_key_hash.encode_ref(),
            (&self.serial_number).encode(),
        ))
    }
}

/// Certificate status.
///
/// ```ASN.1
/// CertStatus ::= CHOICE {
///     good        [0]     IMPLICIT NULL,
///     revoked     [1]     IMPLICIT RevokedInfo,
///     unknown     [2]     IMPLICIT UnknownInfo }
///
/// RevokedInfo ::= SEQUENCE {
///     revocationTime              GeneralizedTime,
///     revocationReason    [0]     EXPLICIT CRLReason OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CertStatus {
    Good,
    Revoked {
        revocation_time: GeneralizedTime,
        revocation_reason: Option<u8>,
    },
    Unknown,
}

impl CertStatus {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        if cons
            .take_opt_primitive_if(Tag::CTX_0, |prim| prim.skip_all())?
            .is_some()
        {
            Ok(Self::Good)
        } else if let Some(status) = cons.take_opt_constructed_if(Tag::CTX_1, |cons| {
            let revocation_time = GeneralizedTime::take_from(cons)?;
            let revocation_reason = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
                cons.take_primitive_if(Tag::ENUMERATED, |prim| prim.to_u8())
            })?;

            Ok(Self::Revoked {
                revocation_time,
                revocation_reason,
            })
        })? {
            Ok(status)
        } else if cons
            .take_opt_primitive_if(Tag::CTX_2, |prim| prim.skip_all())?
            .is_some()
        {
            Ok(Self::Unknown)
        } else {
            Err(cons.content_err("expected CertStatus"))
        }
    }
}

impl Values for CertStatus {
    fn encoded_len(&self, mode: Mode) -> usize {
        match self {
            Self::Good => ().encode_as(Tag::CTX_0).encoded_len(mode),
            Self::Revoked {
                revocation_time,
                revocation_reason,
            } => encode::sequence_as(
                Tag::CTX_1,
                (
                    revocation_time.encode_ref(),
                    revocation_reason
                        .map(|reason| reason.encode_as(Tag::ENUMERATED).explicit(Tag::CTX_0)),
                ),
            )
            .encoded_len(mode),
            Self::Unknown => ().encode_as(Tag::CTX_2).encoded_len(mode),
        }
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        match self {
            Self::Good => ().encode_as(Tag::CTX_0).write_encoded(mode, target),
            Self::Revoked {
                revocation_time,
                revocation_reason,
            } => encode::sequence_as(
                Tag::CTX_1,
                (
                    revocation_time.encode_ref(),
                    revocation_reason
                        .map(|reason| reason.encode_as(Tag::ENUMERATED).explicit(Tag::CTX_0)),
                ),
            )
            .write_encoded(mode, target),
            Self::Unknown => ().encode_as(Tag::CTX_2).write_encoded(mode, target),
        }
    }
}

#[cfg(test)]
mod test {
    use {super::*, crate::asn1::common::der_encode, crate::testutil::*};

    #[test]
    fn basic_response_extraction() {
        let response = ocsp_response("OCSP Responder", 5);
        let der = der_encode(response.encode_ref()).unwrap();

        let parsed = OcspResponse::from_der(&der).unwrap();
        assert_eq!(parsed, response);
        assert_eq!(parsed.response_status, OcspResponseStatus::Successful);

        let basic = parsed.basic_response().unwrap().unwrap();
        assert_eq!(
            basic.tbs_response_data.responder_id,
            ResponderId::ByName(Name::with_common_name("OCSP Responder").unwrap())
        );
        assert_eq!(basic.tbs_response_data.responses.len(), 1);
        assert_eq!(
            basic.tbs_response_data.responses[0].cert_id.serial_number,
            Integer::from(5u64)
        );
    }

    #[test]
    fn unsuccessful_response_has_no_basic_response() {
        let response = OcspResponse {
            response_status: OcspResponseStatus::TryLater,
            response_bytes: None,
        };

        let der = der_encode(response.encode_ref()).unwrap();
        assert_eq!(der, vec![0x30, 0x03, 0x0a, 0x01, 0x03]);

        let parsed = OcspResponse::from_der(&der).unwrap();
        assert!(parsed.basic_response().unwrap().is_none());
    }

    #[test]
    fn responder_by_key_round_trip() {
        let id = ResponderId::ByKey(OctetString::new(bytes::Bytes::from_static(&[9; 20])));
        let der = der_encode(encode::sequence(&id)).unwrap();
        assert_eq!(&der[2..6], &[0xa2, 0x16, 0x04, 0x14]);

        let decoded = Constructed::decode(der.as_slice(), Mode::Der, |cons| {
            cons.take_sequence(|cons| ResponderId::take_from(cons))
        })
        .unwrap();
        assert_eq!(decoded, id);
    }

    #[test]
    fn revoked_status_round_trip() {
        let status = CertStatus::Revoked {
            revocation_time: GeneralizedTime::parse(b"20220101000000Z").unwrap(),
            revocation_reason: Some(1),
        };

        let der = der_encode(encode::sequence(&status)).unwrap();
        let decoded = Constructed::decode(der.as_slice(), Mode::Der, |cons| {
            cons.take_sequence(|cons| CertStatus::take_from(cons))
        })
        .unwrap();
        assert_eq!(decoded, status);
    }
}
