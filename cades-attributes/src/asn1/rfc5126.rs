// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! ASN.1 types defined by RFC 5126 (CMS Advanced Electronic Signatures).

All context specific tags in this module are EXPLICIT, matching the
`ETS-ElectronicSignatureFormats-ExplicitSyntax88` module.
*/

use {
    crate::{
        asn1::{
            common::{AnyValue, GeneralizedTime, IntegerValues, UtcTime},
            rfc3280::{decode_ucs, DirectoryString, Name},
            rfc5035::IssuerSerial,
            rfc5280::AlgorithmIdentifier,
            rfc6960::{BasicOcspResponse, ResponderId},
        },
        certificate::{CapturedCertificate, CapturedCrl},
    },
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode::{self, PrimitiveContent, Values},
        string::{Ia5String, Utf8String},
        ConstOid, Integer, Mode, OctetString, Oid, Tag,
    },
    std::{
        convert::Infallible,
        io::Write,
        ops::{Deref, DerefMut},
    },
};

/// Signature policy identifier attribute.
///
/// 1.2.840.113549.1.9.16.2.15
pub const OID_SIGNATURE_POLICY_IDENTIFIER: ConstOid =
    Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 15]);

/// Commitment type indication attribute.
///
/// 1.2.840.113549.1.9.16.2.16
pub const OID_COMMITMENT_TYPE_INDICATION: ConstOid =
    Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 16]);

/// Signer location attribute.
///
/// 1.2.840.113549.1.9.16.2.17
pub const OID_SIGNER_LOCATION: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 17]);

/// Other signing certificate attribute.
///
/// 1.2.840.113549.1.9.16.2.19
pub const OID_OTHER_SIGNING_CERTIFICATE: ConstOid =
    Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 19]);

/// Complete certificate references attribute.
///
/// 1.2.840.113549.1.9.16.2.21
pub const OID_COMPLETE_CERTIFICATE_REFERENCES: ConstOid =
    Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 21]);

/// Complete revocation references attribute.
///
/// 1.2.840.113549.1.9.16.2.22
pub const OID_COMPLETE_REVOCATION_REFERENCES: ConstOid =
    Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 22]);

/// Certificate values attribute.
///
/// 1.2.840.113549.1.9.16.2.23
pub const OID_CERTIFICATE_VALUES: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 23]);

/// Revocation values attribute.
///
/// 1.2.840.113549.1.9.16.2.24
pub const OID_REVOCATION_VALUES: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 24]);

/// CAdES-C time-stamp attribute (`id-aa-ets-escTimeStamp`).
///
/// 1.2.840.113549.1.9.16.2.25
pub const OID_CADES_C_TIMESTAMP: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 25]);

/// Signature policy qualifier holding a URI.
///
/// 1.2.840.113549.1.9.16.5.1
pub const OID_SPQ_ETS_URI: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 5, 1]);

/// Signature policy qualifier holding a user notice.
///
/// 1.2.840.113549.1.9.16.5.2
pub const OID_SPQ_ETS_UNOTICE: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 5, 2]);

/// Commitment type: proof of origin.
///
/// 1.2.840.113549.1.9.16.6.1
pub const OID_CTI_PROOF_OF_ORIGIN: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 6, 1]);

/// Commitment type: proof of receipt.
///
/// 1.2.840.113549.1.9.16.6.2
pub const OID_CTI_PROOF_OF_RECEIPT: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 6, 2]);

/// Commitment type: proof of delivery.
///
/// 1.2.840.113549.1.9.16.6.3
pub const OID_CTI_PROOF_OF_DELIVERY: ConstOid =
    Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 6, 3]);

/// Commitment type: proof of sender.
///
/// 1.2.840.113549.1.9.16.6.4
pub const OID_CTI_PROOF_OF_SENDER: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 6, 4]);

/// Commitment type: proof of approval.
///
/// 1.2.840.113549.1.9.16.6.5
pub const OID_CTI_PROOF_OF_APPROVAL: ConstOid =
    Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 6, 5]);

/// Commitment type: proof of creation.
///
/// 1.2.840.113549.1.9.16.6.6
pub const OID_CTI_PROOF_OF_CREATION: ConstOid =
    Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 6, 6]);

/// Hash of a referenced object.
///
/// ```ASN.1
/// OtherHash ::= CHOICE {
///     sha1Hash OtherHashValue,  -- This contains a SHA-1 hash
///     otherHash OtherHashAlgAndValue}
///
/// OtherHashValue ::= OCTET STRING
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OtherHash {
    Sha1Hash(OctetString),
    OtherHash(OtherHashAlgAndValue),
}

impl OtherHash {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match Self::take_opt_from(cons)? {
            Some(hash) => Ok(hash),
            None => Err(cons.content_err("expected OtherHash")),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        if let Some(hash) =
            cons.take_opt_value_if(Tag::OCTET_STRING, |content| OctetString::from_content(content))?
        {
            Ok(Some(Self::Sha1Hash(hash)))
        } else if let Some(hash) = OtherHashAlgAndValue::take_opt_from(cons)? {
            Ok(Some(Self::OtherHash(hash)))
        } else {
            Ok(None)
        }
    }

    /// The digest value, whichever form it is in.
    pub fn hash_value(&self) -> &OctetString {
        match self {
            Self::Sha1Hash(hash) => hash,
            Self::OtherHash(hash) => &hash.hash_value,
        }
    }

    /// The digest algorithm, if carried explicitly.
    pub fn hash_algorithm(&self) -> Option<&AlgorithmIdentifier> {
        match self {
            Self::Sha1Hash(_) => None,
            Self::OtherHash(hash) => Some(&hash.hash_algorithm),
        }
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        match self {
            Self::Sha1Hash(hash) => (Some(hash.encode_ref()), None),
            Self::OtherHash(hash) => (None, Some(hash.encode_ref())),
        }
    }
}

impl Values for OtherHash {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Digest with its algorithm.
///
/// ```ASN.1
/// OtherHashAlgAndValue ::= SEQUENCE {
///     hashAlgorithm AlgorithmIdentifier,
///     hashValue OtherHashValue }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OtherHashAlgAndValue {
    pub hash_algorithm: AlgorithmIdentifier,
    pub hash_value: OctetString,
}

impl OtherHashAlgAndValue {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match Self::take_opt_from(cons)? {
            Some(hash) => Ok(hash),
            None => Err(cons.content_err("expected OtherHashAlgAndValue")),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let hash_algorithm = AlgorithmIdentifier::take_from(cons)?;
            let hash_value = OctetString::take_from(cons)?;

            Ok(Self {
                hash_algorithm,
                hash_value,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.hash_algorithm.encode_ref(),
            self.hash_value.encode_ref(),
        ))
    }
}

/// Reference to a certificate.
///
/// ```ASN.1
/// OtherCertID ::= SEQUENCE {
///     otherCertHash            OtherHash,
///     issuerSerial             IssuerSerial OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OtherCertId {
    pub other_cert_hash: OtherHash,
    pub issuer_serial: Option<IssuerSerial>,
}

impl OtherCertId {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let other_cert_hash = OtherHash::take_from(cons)?;
            let issuer_serial = IssuerSerial::take_opt_from(cons)?;

            Ok(Self {
                other_cert_hash,
                issuer_serial,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.other_cert_hash.encode_ref(),
            self.issuer_serial.as_ref().map(|serial| serial.encode_ref()),
        ))
    }
}

impl Values for OtherCertId {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Complete certificate references.
///
/// ```ASN.1
/// CompleteCertificateRefs ::=  SEQUENCE OF OtherCertID
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CompleteCertificateRefs(Vec<OtherCertId>);

impl Deref for CompleteCertificateRefs {
    type Target = Vec<OtherCertId>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CompleteCertificateRefs {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<OtherCertId>> for CompleteCertificateRefs {
    fn from(refs: Vec<OtherCertId>) -> Self {
        Self(refs)
    }
}

impl CompleteCertificateRefs {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let mut refs = Vec::new();

            while let Some(id) = OtherCertId::take_opt_from(cons)? {
                refs.push(id);
            }

            Ok(Self(refs))
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence(&self.0)
    }
}

impl Values for CompleteCertificateRefs {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Complete revocation references.
///
/// ```ASN.1
/// CompleteRevocationRefs ::=  SEQUENCE OF CrlOcspRef
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CompleteRevocationRefs(Vec<CrlOcspRef>);

impl Deref for CompleteRevocationRefs {
    type Target = Vec<CrlOcspRef>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CompleteRevocationRefs {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<CrlOcspRef>> for CompleteRevocationRefs {
    fn from(refs: Vec<CrlOcspRef>) -> Self {
        Self(refs)
    }
}

impl CompleteRevocationRefs {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let mut refs = Vec::new();

            while let Some(r) = CrlOcspRef::take_opt_from(cons)? {
                refs.push(r);
            }

            Ok(Self(refs))
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence(&self.0)
    }
}

impl Values for CompleteRevocationRefs {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// References to the revocation data of one certificate.
///
/// ```ASN.1
/// CrlOcspRef ::= SEQUENCE {
///     crlids [0] CRLListID OPTIONAL,
///     ocspids [1] OcspListID OPTIONAL,
///     otherRev [2] OtherRevRefs OPTIONAL
/// }
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CrlOcspRef {
    pub crlids: Option<CrlListId>,
    pub ocspids: Option<OcspListId>,
    pub other_rev: Option<OtherRevRefs>,
}

impl CrlOcspRef {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let crlids = cons.take_opt_constructed_if(Tag::CTX_0, |cons| CrlListId::take_from(cons))?;
            let ocspids =
                cons.take_opt_constructed_if(Tag::CTX_1, |cons| OcspListId::take_from(cons))?;
            let other_rev =
                cons.take_opt_constructed_if(Tag::CTX_2, |cons| OtherRevRefs::take_from(cons))?;

            Ok(Self {
                crlids,
                ocspids,
                other_rev,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.crlids
                .as_ref()
                .map(|ids| ids.encode_ref().explicit(Tag::CTX_0)),
            self.ocspids
                .as_ref()
                .map(|ids| ids.encode_ref().explicit(Tag::CTX_1)),
            self.other_rev
                .as_ref()
                .map(|refs| refs.encode_ref().explicit(Tag::CTX_2)),
        ))
    }
}

impl Values for CrlOcspRef {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// CRL references.
///
/// ```ASN.1
/// CRLListID ::=  SEQUENCE {
///     crls        SEQUENCE OF CrlValidatedID }
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CrlListId {
    pub crls: Vec<CrlValidatedId>,
}

impl CrlListId {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let crls = cons.take_sequence(|cons| {
                let mut crls = Vec::new();

                while let Some(id) = CrlValidatedId::take_opt_from(cons)? {
                    crls.push(id);
                }

                Ok(crls)
            })?;

            Ok(Self { crls })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence(encode::sequence(&self.crls))
    }
}

/// Reference to a CRL.
///
/// ```ASN.1
/// CrlValidatedID ::=  SEQUENCE {
///      crlHash                   OtherHash,
///      crlIdentifier             CrlIdentifier OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CrlValidatedId {
    pub crl_hash: OtherHash,
    pub crl_identifier: Option<CrlIdentifier>,
}

impl CrlValidatedId {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let crl_hash = OtherHash::take_from(cons)?;
            let crl_identifier = CrlIdentifier::take_opt_from(cons)?;

            Ok(Self {
                crl_hash,
                crl_identifier,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.crl_hash.encode_ref(),
            self.crl_identifier.as_ref().map(|id| id.encode_ref()),
        ))
    }
}

impl Values for CrlValidatedId {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Identifies a CRL by issuer and issue time.
///
/// ```ASN.1
/// CrlIdentifier ::= SEQUENCE {
///     crlissuer                 Name,
///     crlIssuedTime             UTCTime,
///     crlNumber                 INTEGER OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CrlIdentifier {
    pub crl_issuer: Name,
    pub crl_issued_time: UtcTime,
    pub crl_number: Option<Integer>,
}

impl CrlIdentifier {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let crl_issuer = Name::take_from(cons)?;
            let crl_issued_time = UtcTime::take_from(cons)?;
            let crl_number =
                cons.take_opt_primitive_if(Tag::INTEGER, |prim| Integer::from_primitive(prim))?;

            Ok(Self {
                crl_issuer,
                crl_issued_time,
                crl_number,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.crl_issuer.encode_ref(),
            self.crl_issued_time.encode_ref(),
            self.crl_number.as_ref().map(|number| number.encode()),
        ))
    }
}

/// OCSP response references.
///
/// ```ASN.1
/// OcspListID ::=  SEQUENCE {
///     ocspResponses        SEQUENCE OF OcspResponsesID }
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct OcspListId {
    pub ocsp_responses: Vec<OcspResponsesId>,
}

impl OcspListId {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let ocsp_responses = cons.take_sequence(|cons| {
                let mut responses = Vec::new();

                while let Some(id) = OcspResponsesId::take_opt_from(cons)? {
                    responses.push(id);
                }

                Ok(responses)
            })?;

            Ok(Self { ocsp_responses })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence(encode::sequence(&self.ocsp_responses))
    }
}

/// Reference to an OCSP response.
///
/// ```ASN.1
/// OcspResponsesID ::=  SEQUENCE {
///     ocspIdentifier              OcspIdentifier,
///     ocspRepHash                 OtherHash    OPTIONAL
/// }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OcspResponsesId {
    pub ocsp_identifier: OcspIdentifier,
    pub ocsp_rep_hash: Option<OtherHash>,
}

impl OcspResponsesId {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let ocsp_identifier = OcspIdentifier::take_from(cons)?;
            let ocsp_rep_hash = OtherHash::take_opt_from(cons)?;

            Ok(Self {
                ocsp_identifier,
                ocsp_rep_hash,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.ocsp_identifier.encode_ref(),
            self.ocsp_rep_hash.as_ref().map(|hash| hash.encode_ref()),
        ))
    }
}

impl Values for OcspResponsesId {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Identifies an OCSP response by responder and production time.
///
/// ```ASN.1
/// OcspIdentifier ::= SEQUENCE {
///     ocspResponderID    ResponderID,
///     producedAt         GeneralizedTime
/// }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OcspIdentifier {
    pub ocsp_responder_id: ResponderId,
    pub produced_at: GeneralizedTime,
}

impl OcspIdentifier {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let ocsp_responder_id = ResponderId::take_from(cons)?;
            let produced_at = GeneralizedTime::take_from(cons)?;

            Ok(Self {
                ocsp_responder_id,
                produced_at,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((&self.ocsp_responder_id, self.produced_at.encode_ref()))
    }
}

/// Reference to revocation data of another format.
///
/// ```ASN.1
/// OtherRevRefs ::= SEQUENCE {
///     otherRevRefType   OtherRevRefType,
///     otherRevRefs      ANY DEFINED BY otherRevRefType
/// }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OtherRevRefs {
    pub other_rev_ref_type: Oid,
    pub other_rev_refs: AnyValue,
}

impl OtherRevRefs {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let other_rev_ref_type = Oid::take_from(cons)?;
            let other_rev_refs = AnyValue::take_from(cons)?;

            Ok(Self {
                other_rev_ref_type,
                other_rev_refs,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.other_rev_ref_type.encode_ref(), &self.other_rev_refs))
    }
}

/// Certificate values.
///
/// ```ASN.1
/// CertificateValues ::=  SEQUENCE OF Certificate
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CertificateValues(Vec<CapturedCertificate>);

impl Deref for CertificateValues {
    type Target = Vec<CapturedCertificate>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CertificateValues {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<CapturedCertificate>> for CertificateValues {
    fn from(certs: Vec<CapturedCertificate>) -> Self {
        Self(certs)
    }
}

impl CertificateValues {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let mut certs = Vec::new();

            while let Some(cert) = CapturedCertificate::take_opt_from(cons)? {
                certs.push(cert);
            }

            Ok(Self(certs))
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence(&self.0)
    }
}

impl Values for CertificateValues {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Revocation values.
///
/// ```ASN.1
/// RevocationValues ::=  SEQUENCE {
///     crlVals             [0] SEQUENCE OF CertificateList OPTIONAL,
///     ocspVals            [1] SEQUENCE OF BasicOCSPResponse OPTIONAL,
///     otherRevVals        [2] OtherRevVals OPTIONAL }
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RevocationValues {
    pub crl_vals: Option<Vec<CapturedCrl>>,
    pub ocsp_vals: Option<Vec<BasicOcspResponse>>,
    pub other_rev_vals: Option<OtherRevVals>,
}

impl RevocationValues {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let crl_vals = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
                cons.take_sequence(|cons| {
                    let mut crls = Vec::new();

                    while let Some(crl) = CapturedCrl::take_opt_from(cons)? {
                        crls.push(crl);
                    }

                    Ok(crls)
                })
            })?;
            let ocsp_vals = cons.take_opt_constructed_if(Tag::CTX_1, |cons| {
                cons.take_sequence(|cons| {
                    let mut responses = Vec::new();

                    while let Some(response) = BasicOcspResponse::take_opt_from(cons)? {
                        responses.push(response);
                    }

                    Ok(responses)
                })
            })?;
            let other_rev_vals =
                cons.take_opt_constructed_if(Tag::CTX_2, |cons| OtherRevVals::take_from(cons))?;

            Ok(Self {
                crl_vals,
                ocsp_vals,
                other_rev_vals,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.crl_vals
                .as_ref()
                .map(|crls| encode::sequence(crls).explicit(Tag::CTX_0)),
            self.ocsp_vals
                .as_ref()
                .map(|responses| encode::sequence(responses).explicit(Tag::CTX_1)),
            self.other_rev_vals
                .as_ref()
                .map(|vals| vals.encode_ref().explicit(Tag::CTX_2)),
        ))
    }
}

impl Values for RevocationValues {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Revocation values of another format.
///
/// ```ASN.1
/// OtherRevVals ::= SEQUENCE {
///     otherRevValType   OtherRevValType,
///     otherRevVals      ANY DEFINED BY otherRevValType
/// }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OtherRevVals {
    pub other_rev_val_type: Oid,
    pub other_rev_vals: AnyValue,
}

impl OtherRevVals {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let other_rev_val_type = Oid::take_from(cons)?;
            let other_rev_vals = AnyValue::take_from(cons)?;

            Ok(Self {
                other_rev_val_type,
                other_rev_vals,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.other_rev_val_type.encode_ref(), &self.other_rev_vals))
    }
}

/// Signature policy identifier.
///
/// ```ASN.1
/// SignaturePolicyIdentifier ::= CHOICE {
///     signaturePolicyId          SignaturePolicyId,
///     signaturePolicyImplied     SignaturePolicyImplied -- not used in this version
/// }
///
/// SignaturePolicyImplied ::= NULL
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SignaturePolicyIdentifier {
    SignaturePolicyId(SignaturePolicyId),
    SignaturePolicyImplied,
}

impl SignaturePolicyIdentifier {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        if cons
            .take_opt_primitive_if(Tag::NULL, |prim| prim.skip_all())?
            .is_some()
        {
            Ok(Self::SignaturePolicyImplied)
        } else {
            Ok(Self::SignaturePolicyId(SignaturePolicyId::take_from(cons)?))
        }
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        match self {
            Self::SignaturePolicyId(id) => (Some(id.encode_ref()), None),
            Self::SignaturePolicyImplied => (None, Some(().encode())),
        }
    }
}

impl Values for SignaturePolicyIdentifier {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Explicit signature policy.
///
/// ```ASN.1
/// SignaturePolicyId ::= SEQUENCE {
///     sigPolicyId           SigPolicyId,
///     sigPolicyHash         SigPolicyHash,
///     sigPolicyQualifiers   SEQUENCE SIZE (1..MAX) OF
///                             SigPolicyQualifierInfo OPTIONAL}
///
/// SigPolicyHash ::= OtherHashAlgAndValue
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignaturePolicyId {
    pub sig_policy_id: Oid,
    pub sig_policy_hash: OtherHashAlgAndValue,
    pub sig_policy_qualifiers: Option<Vec<SigPolicyQualifierInfo>>,
}

impl SignaturePolicyId {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let sig_policy_id = Oid::take_from(cons)?;
            let sig_policy_hash = OtherHashAlgAndValue::take_from(cons)?;
            let sig_policy_qualifiers = cons.take_opt_sequence(|cons| {
                let mut qualifiers = Vec::new();

                while let Some(qualifier) = SigPolicyQualifierInfo::take_opt_from(cons)? {
                    qualifiers.push(qualifier);
                }

                Ok(qualifiers)
            })?;

            Ok(Self {
                sig_policy_id,
                sig_policy_hash,
                sig_policy_qualifiers,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.sig_policy_id.encode_ref(),
            self.sig_policy_hash.encode_ref(),
            self.sig_policy_qualifiers.as_ref().map(encode::sequence),
        ))
    }
}

/// Signature policy qualifier.
///
/// ```ASN.1
/// SigPolicyQualifierInfo ::= SEQUENCE {
///     sigPolicyQualifierId  SigPolicyQualifierId,
///     sigQualifier          ANY DEFINED BY sigPolicyQualifierId }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigPolicyQualifierInfo {
    pub sig_policy_qualifier_id: Oid,
    pub sig_qualifier: AnyValue,
}

impl SigPolicyQualifierInfo {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let sig_policy_qualifier_id = Oid::take_from(cons)?;
            let sig_qualifier = AnyValue::take_from(cons)?;

            Ok(Self {
                sig_policy_qualifier_id,
                sig_qualifier,
            })
        })
    }

    /// The policy URI, if this is an `id-spq-ets-uri` qualifier.
    pub fn spuri(&self) -> Result<Option<Ia5String>, DecodeError<Infallible>> {
        if self.sig_policy_qualifier_id != OID_SPQ_ETS_URI {
            return Ok(None);
        }

        self.sig_qualifier
            .decode(|cons| Ia5String::take_from(cons))
            .map(Some)
    }

    /// The user notice, if this is an `id-spq-ets-unotice` qualifier.
    pub fn user_notice(&self) -> Result<Option<SpUserNotice>, DecodeError<Infallible>> {
        if self.sig_policy_qualifier_id != OID_SPQ_ETS_UNOTICE {
            return Ok(None);
        }

        self.sig_qualifier
            .decode(|cons| SpUserNotice::take_from(cons))
            .map(Some)
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.sig_policy_qualifier_id.encode_ref(), &self.sig_qualifier))
    }
}

impl Values for SigPolicyQualifierInfo {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// User notice policy qualifier.
///
/// ```ASN.1
/// SPUserNotice ::= SEQUENCE {
///     noticeRef        NoticeReference OPTIONAL,
///     explicitText     DisplayText OPTIONAL}
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SpUserNotice {
    pub notice_ref: Option<NoticeReference>,
    pub explicit_text: Option<DisplayText>,
}

impl SpUserNotice {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let notice_ref = NoticeReference::take_opt_from(cons)?;
            let explicit_text = DisplayText::take_opt_from(cons)?;

            Ok(Self {
                notice_ref,
                explicit_text,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.notice_ref.as_ref().map(|r| r.encode_ref()),
            self.explicit_text.as_ref().map(|t| t.encode_ref()),
        ))
    }
}

/// Reference to a notice in an organization's notice collection.
///
/// ```ASN.1
/// NoticeReference ::= SEQUENCE {
///     organization     DisplayText,
///     noticeNumbers    SEQUENCE OF INTEGER }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NoticeReference {
    pub organization: DisplayText,
    pub notice_numbers: Vec<Integer>,
}

impl NoticeReference {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let organization = DisplayText::take_from(cons)?;
            let notice_numbers = cons.take_sequence(|cons| {
                let mut numbers = Vec::new();

                while let Some(number) =
                    cons.take_opt_primitive_if(Tag::INTEGER, |prim| Integer::from_primitive(prim))?
                {
                    numbers.push(number);
                }

                Ok(numbers)
            })?;

            Ok(Self {
                organization,
                notice_numbers,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.organization.encode_ref(),
            encode::sequence(IntegerValues(&self.notice_numbers)),
        ))
    }
}

/// Display text.
///
/// ```ASN.1
/// DisplayText ::= CHOICE {
///     visibleString    VisibleString  (SIZE (1..200)),
///     bmpString        BMPString      (SIZE (1..200)),
///     utf8String       UTF8String     (SIZE (1..200)) }
/// ```
///
/// IA5String is accepted as well, as RFC 5280 allows it. Visible and BMP
/// strings are kept as their raw octets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DisplayText {
    Ia5String(Ia5String),
    VisibleString(OctetString),
    BmpString(OctetString),
    Utf8String(Utf8String),
}

impl DisplayText {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match Self::take_opt_from(cons)? {
            Some(text) => Ok(text),
            None => Err(cons.content_err("expected DisplayText")),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        if let Some(s) =
            cons.take_opt_value_if(Tag::IA5_STRING, |content| Ia5String::from_content(content))?
        {
            Ok(Some(Self::Ia5String(s)))
        } else if let Some(s) = cons.take_opt_value_if(Tag::VISIBLE_STRING, |content| {
            OctetString::from_content(content)
        })? {
            Ok(Some(Self::VisibleString(s)))
        } else if let Some(s) =
            cons.take_opt_value_if(Tag::BMP_STRING, |content| OctetString::from_content(content))?
        {
            Ok(Some(Self::BmpString(s)))
        } else if let Some(s) =
            cons.take_opt_value_if(Tag::UTF8_STRING, |content| Utf8String::from_content(content))?
        {
            Ok(Some(Self::Utf8String(s)))
        } else {
            Ok(None)
        }
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        match self {
            Self::Ia5String(s) => (Some(s.encode_ref()), None, None, None),
            Self::VisibleString(s) => (
                None,
                Some(s.encode_ref_as(Tag::VISIBLE_STRING)),
                None,
                None,
            ),
            Self::BmpString(s) => (None, None, Some(s.encode_ref_as(Tag::BMP_STRING)), None),
            Self::Utf8String(s) => (None, None, None, Some(s.encode_ref())),
        }
    }

    pub fn to_string_lossy(&self) -> String {
        match self {
            Self::Ia5String(s) => s.to_string(),
            Self::VisibleString(s) => String::from_utf8_lossy(&s.to_bytes()).to_string(),
            Self::BmpString(s) => decode_ucs(&s.to_bytes(), 2),
            Self::Utf8String(s) => s.to_string(),
        }
    }
}

/// Commitment type indication.
///
/// ```ASN.1
/// CommitmentTypeIndication ::= SEQUENCE {
///     commitmentTypeId CommitmentTypeIdentifier,
///     commitmentTypeQualifier SEQUENCE SIZE (1..MAX) OF
///                 CommitmentTypeQualifier OPTIONAL}
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommitmentTypeIndication {
    pub commitment_type_id: Oid,
    pub commitment_type_qualifier: Option<Vec<CommitmentTypeQualifier>>,
}

impl CommitmentTypeIndication {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let commitment_type_id = Oid::take_from(cons)?;
            let commitment_type_qualifier = cons.take_opt_sequence(|cons| {
                let mut qualifiers = Vec::new();

                while let Some(qualifier) = CommitmentTypeQualifier::take_opt_from(cons)? {
                    qualifiers.push(qualifier);
                }

                Ok(qualifiers)
            })?;

            Ok(Self {
                commitment_type_id,
                commitment_type_qualifier,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.commitment_type_id.encode_ref(),
            self.commitment_type_qualifier
                .as_ref()
                .map(encode::sequence),
        ))
    }
}

impl Values for CommitmentTypeIndication {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Commitment type qualifier.
///
/// ```ASN.1
/// CommitmentTypeQualifier ::= SEQUENCE {
///    commitmentTypeIdentifier   CommitmentTypeIdentifier,
///    qualifier                  ANY DEFINED BY commitmentTypeIdentifier }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommitmentTypeQualifier {
    pub commitment_type_identifier: Oid,
    pub qualifier: AnyValue,
}

impl CommitmentTypeQualifier {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let commitment_type_identifier = Oid::take_from(cons)?;
            let qualifier = AnyValue::take_from(cons)?;

            Ok(Self {
                commitment_type_identifier,
                qualifier,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.commitment_type_identifier.encode_ref(), &self.qualifier))
    }
}

impl Values for CommitmentTypeQualifier {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Where the signer claims to have signed.
///
/// ```ASN.1
/// SignerLocation ::= SEQUENCE {
///     countryName        [0] DirectoryString OPTIONAL,
///     localityName       [1] DirectoryString OPTIONAL,
///     postalAdddress     [2] PostalAddress OPTIONAL }
///
/// PostalAddress ::= SEQUENCE SIZE(1..6) OF DirectoryString
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SignerLocation {
    pub country_name: Option<DirectoryString>,
    pub locality_name: Option<DirectoryString>,
    pub postal_address: Option<Vec<DirectoryString>>,
}

impl SignerLocation {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let country_name =
                cons.take_opt_constructed_if(Tag::CTX_0, |cons| DirectoryString::take_from(cons))?;
            let locality_name =
                cons.take_opt_constructed_if(Tag::CTX_1, |cons| DirectoryString::take_from(cons))?;
            let postal_address = cons.take_opt_constructed_if(Tag::CTX_2, |cons| {
                cons.take_sequence(|cons| {
                    let mut lines = Vec::new();

                    while let Some(line) = DirectoryString::take_opt_from(cons)? {
                        lines.push(line);
                    }

                    if lines.is_empty() || lines.len() > 6 {
                        return Err(cons.content_err("postal address must have 1 to 6 lines"));
                    }

                    Ok(lines)
                })
            })?;

            Ok(Self {
                country_name,
                locality_name,
                postal_address,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.country_name
                .as_ref()
                .map(|name| name.encode_ref().explicit(Tag::CTX_0)),
            self.locality_name
                .as_ref()
                .map(|name| name.encode_ref().explicit(Tag::CTX_1)),
            self.postal_address
                .as_ref()
                .map(|lines| encode::sequence(lines).explicit(Tag::CTX_2)),
        ))
    }
}

impl Values for SignerLocation {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Other signing certificate.
///
/// ```ASN.1
/// OtherSigningCertificate ::=  SEQUENCE {
///     certs        SEQUENCE OF OtherCertID,
///     policies     SEQUENCE OF PolicyInformation OPTIONAL
/// }
/// ```
///
/// Policy information entries are kept in encoded form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OtherSigningCertificate {
    pub certs: Vec<OtherCertId>,
    pub policies: Option<Vec<AnyValue>>,
}

impl OtherSigningCertificate {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let certs = cons.take_sequence(|cons| {
                let mut certs = Vec::new();

                while let Some(cert) = OtherCertId::take_opt_from(cons)? {
                    certs.push(cert);
                }

                Ok(certs)
            })?;
            let policies = cons.take_opt_sequence(|cons| AnyValue::take_all_from(cons))?;

            Ok(Self { certs, policies })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            encode::sequence(&self.certs),
            self.policies.as_ref().map(encode::sequence),
        ))
    }
}

impl Values for OtherSigningCertificate {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}
