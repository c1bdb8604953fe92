// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! ASN.1 type definitions from RFC 5280.

Certificates and CRLs are fully decoded so issuer, serial number and update
times can be read. Callers needing the exact original encoding should use
[crate::CapturedCertificate] and [crate::CapturedCrl], which keep the bytes
alongside the parsed value.
*/

use {
    crate::asn1::{
        common::{take_opt_captured, Time},
        rfc3280::Name,
    },
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode::{self, PrimitiveContent, Values},
        BitString, Captured, ConstOid, Integer, Mode, OctetString, Oid, Tag,
    },
    bytes::Bytes,
    std::{
        io::Write,
        ops::{Deref, DerefMut},
    },
};

/// The CRL number extension.
///
/// 2.5.29.20
pub const OID_CRL_NUMBER: ConstOid = Oid(&[85, 29, 20]);

/// Algorithm identifier.
///
/// ```ASN.1
/// AlgorithmIdentifier  ::=  SEQUENCE  {
///   algorithm               OBJECT IDENTIFIER,
///   parameters              ANY DEFINED BY algorithm OPTIONAL  }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlgorithmIdentifier {
    pub algorithm: Oid,
    pub parameters: Option<AlgorithmParameter>,
}

impl AlgorithmIdentifier {
    /// Construct an instance without parameters.
    pub fn new(algorithm: Oid) -> Self {
        Self {
            algorithm,
            parameters: None,
        }
    }

    /// Construct an instance whose parameters are an explicit ASN.1 NULL.
    pub fn with_null_parameters(algorithm: Oid) -> Self {
        Self {
            algorithm,
            parameters: Some(AlgorithmParameter(Captured::from_values(
                Mode::Der,
                ().encode(),
            ))),
        }
    }

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
        let algorithm = Oid::take_from(cons)?;
        let parameters = take_opt_captured(cons)?.map(AlgorithmParameter);

        Ok(Self {
            algorithm,
            parameters,
        })
    }

    /// Parse SEQUENCE content that is an algorithm identifier only if it leads with an OID.
    ///
    /// Nothing is consumed when `None` is returned.
    pub fn from_opt_sequence<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        let algorithm = match Oid::take_opt_from(cons)? {
            Some(algorithm) => algorithm,
            None => return Ok(None),
        };
        let parameters = take_opt_captured(cons)?.map(AlgorithmParameter);

        Ok(Some(Self {
            algorithm,
            parameters,
        }))
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.algorithm.encode_ref(), self.parameters.as_ref()))
    }
}

impl Values for AlgorithmIdentifier {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// A parameter for an algorithm.
///
/// This type doesn't exist in the ASN.1. We've implemented it to
/// make (de)serialization simpler.
#[derive(Clone, Debug)]
pub struct AlgorithmParameter(Captured);

impl AlgorithmParameter {
    /// Whether this parameter is an ASN.1 NULL.
    pub fn is_null(&self) -> bool {
        self.0.as_slice() == [0x05, 0x00]
    }
}

impl Deref for AlgorithmParameter {
    type Target = Captured;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for AlgorithmParameter {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl Eq for AlgorithmParameter {}

impl Values for AlgorithmParameter {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.0.encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.0.write_encoded(mode, target)
    }
}

/// Certificate.
///
/// ```ASN.1
/// Certificate  ::=  SEQUENCE  {
///   tbsCertificate       TBSCertificate,
///   signatureAlgorithm   AlgorithmIdentifier,
///   signature            BIT STRING  }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Certificate {
    pub tbs_certificate: TbsCertificate,
    pub signature_algorithm: AlgorithmIdentifier,
    pub signature: BitString,
}

impl Certificate {
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
        let tbs_certificate = TbsCertificate::take_from(cons)?;
        let signature_algorithm = AlgorithmIdentifier::take_from(cons)?;
        let signature = BitString::take_from(cons)?;

        Ok(Self {
            tbs_certificate,
            signature_algorithm,
            signature,
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.tbs_certificate.encode_ref(),
            self.signature_algorithm.encode_ref(),
            self.signature.encode_ref(),
        ))
    }
}

/// TBS Certificate.
///
/// ```ASN.1
/// TBSCertificate  ::=  SEQUENCE  {
///      version         [0]  Version DEFAULT v1,
///      serialNumber         CertificateSerialNumber,
///      signature            AlgorithmIdentifier,
///      issuer               Name,
///      validity             Validity,
///      subject              Name,
///      subjectPublicKeyInfo SubjectPublicKeyInfo,
///      issuerUniqueID  [1]  IMPLICIT UniqueIdentifier OPTIONAL,
///                           -- If present, version MUST be v2 or v3
///      subjectUniqueID [2]  IMPLICIT UniqueIdentifier OPTIONAL,
///                           -- If present, version MUST be v2 or v3
///      extensions      [3]  Extensions OPTIONAL
///                           -- If present, version MUST be v3 --  }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TbsCertificate {
    pub version: Option<Version>,
    pub serial_number: CertificateSerialNumber,
    pub signature: AlgorithmIdentifier,
    pub issuer: Name,
    pub validity: Validity,
    pub subject: Name,
    pub subject_public_key_info: SubjectPublicKeyInfo,
    pub issuer_unique_id: Option<UniqueIdentifier>,
    pub subject_unique_id: Option<UniqueIdentifier>,
    pub extensions: Option<Extensions>,
}

impl TbsCertificate {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let version = cons.take_opt_constructed_if(Tag::CTX_0, Version::take_from)?;
            let serial_number = CertificateSerialNumber::take_from(cons)?;
            let signature = AlgorithmIdentifier::take_from(cons)?;
            let issuer = Name::take_from(cons)?;
            let validity = Validity::take_from(cons)?;
            let subject = Name::take_from(cons)?;
            let subject_public_key_info = SubjectPublicKeyInfo::take_from(cons)?;
            let issuer_unique_id = cons.take_opt_value_if(Tag::CTX_1, |content| {
                BitString::from_content(content)
            })?;
            let subject_unique_id = cons.take_opt_value_if(Tag::CTX_2, |content| {
                BitString::from_content(content)
            })?;
            let extensions =
                cons.take_opt_constructed_if(Tag::CTX_3, |cons| Extensions::take_from(cons))?;

            Ok(Self {
                version,
                serial_number,
                signature,
                issuer,
                validity,
                subject,
                subject_public_key_info,
                issuer_unique_id,
                subject_unique_id,
                extensions,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.version
                .map(|version| encode::Constructed::new(Tag::CTX_0, version.encode())),
            (&self.serial_number).encode(),
            self.signature.encode_ref(),
            self.issuer.encode_ref(),
            self.validity.encode_ref(),
            self.subject.encode_ref(),
            self.subject_public_key_info.encode_ref(),
            self.issuer_unique_id
                .as_ref()
                .map(|id| id.encode_ref_as(Tag::CTX_1)),
            self.subject_unique_id
                .as_ref()
                .map(|id| id.encode_ref_as(Tag::CTX_2)),
            self.extensions
                .as_ref()
                .map(|extensions| encode::Constructed::new(Tag::CTX_3, extensions.encode_ref())),
        ))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Version {
    V1 = 0,
    V2 = 1,
    V3 = 2,
}

impl Version {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match cons.take_primitive_if(Tag::INTEGER, Integer::i8_from_primitive)? {
            0 => Ok(Self::V1),
            1 => Ok(Self::V2),
            2 => Ok(Self::V3),
            _ => Err(cons.content_err("unexpected Version value")),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        match cons.take_opt_primitive_if(Tag::INTEGER, Integer::i8_from_primitive)? {
            None => Ok(None),
            Some(0) => Ok(Some(Self::V1)),
            Some(1) => Ok(Some(Self::V2)),
            Some(2) => Ok(Some(Self::V3)),
            Some(_) => Err(cons.content_err("unexpected Version value")),
        }
    }

    pub fn encode(self) -> impl Values {
        u8::from(self).encode()
    }
}

impl From<Version> for u8 {
    fn from(v: Version) -> Self {
        match v {
            Version::V1 => 0,
            Version::V2 => 1,
            Version::V3 => 2,
        }
    }
}

pub type CertificateSerialNumber = Integer;

/// Validity.
///
/// ```ASN.1
/// Validity ::= SEQUENCE {
///   notBefore      Time,
///   notAfter       Time }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Validity {
    pub not_before: Time,
    pub not_after: Time,
}

impl Validity {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let not_before = Time::take_from(cons)?;
            let not_after = Time::take_from(cons)?;

            Ok(Self {
                not_before,
                not_after,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.not_before.encode_ref(), self.not_after.encode_ref()))
    }
}

pub type UniqueIdentifier = BitString;

/// Subject public key info.
///
/// ```ASN.1
/// SubjectPublicKeyInfo  ::=  SEQUENCE  {
///   algorithm            AlgorithmIdentifier,
///   subjectPublicKey     BIT STRING  }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubjectPublicKeyInfo {
    pub algorithm: AlgorithmIdentifier,
    pub subject_public_key: BitString,
}

impl SubjectPublicKeyInfo {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let algorithm = AlgorithmIdentifier::take_from(cons)?;
            let subject_public_key = BitString::take_from(cons)?;

            Ok(Self {
                algorithm,
                subject_public_key,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.algorithm.encode_ref(),
            self.subject_public_key.encode_ref(),
        ))
    }
}

/// Extensions
///
/// ```ASN.1
/// Extensions  ::=  SEQUENCE SIZE (1..MAX) OF Extension
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Extensions(Vec<Extension>);

impl Extensions {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| Self::from_sequence(cons))
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| Self::from_sequence(cons))
    }

    pub fn from_sequence<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        let mut extensions = Vec::new();

        while let Some(extension) = Extension::take_opt_from(cons)? {
            extensions.push(extension);
        }

        Ok(Self(extensions))
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence(&self.0)
    }

    pub fn encode_ref_as(&self, tag: Tag) -> impl Values + '_ {
        encode::sequence_as(tag, &self.0)
    }

    /// Find the extension having the given OID.
    pub fn find(&self, id: &Oid) -> Option<&Extension> {
        self.0.iter().find(|extension| &extension.id == id)
    }
}

impl Deref for Extensions {
    type Target = Vec<Extension>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Extensions {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Extension>> for Extensions {
    fn from(v: Vec<Extension>) -> Self {
        Self(v)
    }
}

/// Extension.
///
/// ```ASN.1
/// Extension  ::=  SEQUENCE  {
///      extnID      OBJECT IDENTIFIER,
///      critical    BOOLEAN DEFAULT FALSE,
///      extnValue   OCTET STRING
///                  -- contains the DER encoding of an ASN.1 value
///                  -- corresponding to the extension type identified
///                  -- by extnID
///      }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Extension {
    pub id: Oid,
    pub critical: Option<bool>,
    pub value: OctetString,
}

impl Extension {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| Self::from_sequence(cons))
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| Self::from_sequence(cons))
    }

    fn from_sequence<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        let id = Oid::take_from(cons)?;
        let critical = cons.take_opt_bool()?;
        let value = OctetString::take_from(cons)?;

        Ok(Self {
            id,
            critical,
            value,
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.id.encode_ref(),
            if self.critical == Some(true) {
                Some(true.encode())
            } else {
                None
            },
            self.value.encode_ref(),
        ))
    }
}

impl Values for Extension {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Certificate list.
///
/// ```ASN.1
/// CertificateList  ::=  SEQUENCE  {
///      tbsCertList          TBSCertList,
///      signatureAlgorithm   AlgorithmIdentifier,
///      signature            BIT STRING  }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertificateList {
    pub tbs_cert_list: TbsCertList,
    pub signature_algorithm: AlgorithmIdentifier,
    pub signature: BitString,
}

impl CertificateList {
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
        let tbs_cert_list = TbsCertList::take_from(cons)?;
        let signature_algorithm = AlgorithmIdentifier::take_from(cons)?;
        let signature = BitString::take_from(cons)?;

        Ok(Self {
            tbs_cert_list,
            signature_algorithm,
            signature,
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.tbs_cert_list.encode_ref(),
            self.signature_algorithm.encode_ref(),
            self.signature.encode_ref(),
        ))
    }
}

/// Tbs Certificate list.
///
/// ```ASN.1
/// TBSCertList  ::=  SEQUENCE  {
///   version                 Version OPTIONAL,
///     -- if present, MUST be v2
///   signature               AlgorithmIdentifier,
///   issuer                  Name,
///   thisUpdate              Time,
///   nextUpdate              Time OPTIONAL,
///   revokedCertificates     SEQUENCE OF SEQUENCE  {
///     userCertificate         CertificateSerialNumber,
///     revocationDate          Time,
///     crlEntryExtensions      Extensions OPTIONAL
///                                 -- if present, MUST be v2
///  }  OPTIONAL,
///  crlExtensions           [0] Extensions OPTIONAL }
///                                -- if present, MUST be v2
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TbsCertList {
    pub version: Option<Version>,
    pub signature: AlgorithmIdentifier,
    pub issuer: Name,
    pub this_update: Time,
    pub next_update: Option<Time>,
    pub revoked_certificates: Option<Vec<RevokedCertificate>>,
    pub crl_extensions: Option<Extensions>,
}

impl TbsCertList {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let version = Version::take_opt_from(cons)?;
            let signature = AlgorithmIdentifier::take_from(cons)?;
            let issuer = Name::take_from(cons)?;
            let this_update = Time::take_from(cons)?;
            let next_update = Time::take_opt_from(cons)?;
            let revoked_certificates = cons.take_opt_sequence(|cons| {
                let mut entries = Vec::new();

                while let Some(entry) = RevokedCertificate::take_opt_from(cons)? {
                    entries.push(entry);
                }

                Ok(entries)
            })?;
            let crl_extensions =
                cons.take_opt_constructed_if(Tag::CTX_0, |cons| Extensions::take_from(cons))?;

            Ok(Self {
                version,
                signature,
                issuer,
                this_update,
                next_update,
                revoked_certificates,
                crl_extensions,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.version.map(|version| version.encode()),
            self.signature.encode_ref(),
            self.issuer.encode_ref(),
            self.this_update.encode_ref(),
            self.next_update.as_ref().map(|time| time.encode_ref()),
            self.revoked_certificates
                .as_ref()
                .map(|entries| encode::sequence(entries)),
            self.crl_extensions
                .as_ref()
                .map(|extensions| encode::Constructed::new(Tag::CTX_0, extensions.encode_ref())),
        ))
    }

    /// Obtain the value of the CRL number extension, if present.
    pub fn crl_number(&self) -> Option<Integer> {
        let extension = self
            .crl_extensions
            .as_ref()?
            .find(&Oid(Bytes::copy_from_slice(OID_CRL_NUMBER.as_ref())))?;

        Constructed::decode(extension.value.to_bytes(), Mode::Der, |cons| {
            Integer::take_from(cons)
        })
        .ok()
    }
}

/// A revoked certificate entry in a CRL.
///
/// ```ASN.1
/// SEQUENCE  {
///   userCertificate         CertificateSerialNumber,
///   revocationDate          Time,
///   crlEntryExtensions      Extensions OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevokedCertificate {
    pub user_certificate: CertificateSerialNumber,
    pub revocation_date: Time,
    pub crl_entry_extensions: Option<Extensions>,
}

impl RevokedCertificate {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let user_certificate = Integer::take_from(cons)?;
            let revocation_date = Time::take_from(cons)?;
            let crl_entry_extensions = Extensions::take_opt_from(cons)?;

            Ok(Self {
                user_certificate,
                revocation_date,
                crl_entry_extensions,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            (&self.user_certificate).encode(),
            self.revocation_date.encode_ref(),
            self.crl_entry_extensions
                .as_ref()
                .map(|extensions| extensions.encode_ref()),
        ))
    }
}

impl Values for RevokedCertificate {
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
        crate::asn1::common::{der_encode, UtcTime},
    };

    fn crl_with_number(number: Option<u64>) -> CertificateList {
        let crl_extensions = number.map(|number| {
            let value = der_encode((&Integer::from(number)).encode()).unwrap();

            Extensions::from(vec![Extension {
                id: Oid(Bytes::copy_from_slice(OID_CRL_NUMBER.as_ref())),
                critical: None,
                value: OctetString::new(Bytes::from(value)),
            }])
        });

        CertificateList {
            tbs_cert_list: TbsCertList {
                version: Some(Version::V2),
                signature: AlgorithmIdentifier::new(Oid(Bytes::from_static(&[
                    42, 134, 72, 134, 247, 13, 1, 1, 11,
                ]))),
                issuer: Name::with_common_name("CRL Issuer").unwrap(),
                this_update: Time::UtcTime(UtcTime::parse(b"220301000000Z").unwrap()),
                next_update: None,
                revoked_certificates: Some(vec![RevokedCertificate {
                    user_certificate: Integer::from(42u64),
                    revocation_date: Time::UtcTime(UtcTime::parse(b"220215000000Z").unwrap()),
                    crl_entry_extensions: None,
                }]),
                crl_extensions,
            },
            signature_algorithm: AlgorithmIdentifier::new(Oid(Bytes::from_static(&[
                42, 134, 72, 134, 247, 13, 1, 1, 11,
            ]))),
            signature: BitString::new(0, Bytes::from_static(&[1, 2, 3, 4])),
        }
    }

    #[test]
    fn null_parameters() {
        let alg = AlgorithmIdentifier::with_null_parameters(Oid(Bytes::from_static(&[
            43, 14, 3, 2, 26,
        ])));
        assert!(alg.parameters.as_ref().unwrap().is_null());

        let der = der_encode(alg.encode_ref()).unwrap();
        assert_eq!(
            der,
            vec![0x30, 0x09, 0x06, 0x05, 43, 14, 3, 2, 26, 0x05, 0x00]
        );

        let decoded =
            Constructed::decode(der.as_slice(), Mode::Der, |cons| AlgorithmIdentifier::take_from(cons))
                .unwrap();
        assert_eq!(decoded, alg);

        let bare = AlgorithmIdentifier::new(Oid(Bytes::from_static(&[43, 14, 3, 2, 26])));
        let der = der_encode(bare.encode_ref()).unwrap();
        assert_eq!(der, vec![0x30, 0x07, 0x06, 0x05, 43, 14, 3, 2, 26]);
    }

    #[test]
    fn crl_round_trip() {
        let crl = crl_with_number(Some(7));
        let der = der_encode(crl.encode_ref()).unwrap();

        let decoded =
            Constructed::decode(der.as_slice(), Mode::Der, |cons| CertificateList::take_from(cons))
                .unwrap();
        assert_eq!(decoded, crl);
        assert_eq!(der_encode(decoded.encode_ref()).unwrap(), der);
        assert_eq!(
            decoded.tbs_cert_list.crl_number(),
            Some(Integer::from(7u64))
        );
    }

    #[test]
    fn crl_without_number() {
        let crl = crl_with_number(None);
        assert!(crl.tbs_cert_list.crl_number().is_none());
    }
}
