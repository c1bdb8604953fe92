// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ASN.1 types defined by RFC 5035 (ESS update for certificate identification).

use {
    crate::{
        asn1::{
            common::AnyValue,
            rfc3280::{GeneralName, GeneralNames},
            rfc5280::{AlgorithmIdentifier, CertificateSerialNumber},
        },
        certificate::CapturedCertificate,
    },
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode::{self, PrimitiveContent, Values},
        ConstOid, Integer, Mode, OctetString, Oid,
    },
    std::io::Write,
};

/// Signing certificate v2 attribute.
///
/// 1.2.840.113549.1.9.16.2.47
pub const OID_SIGNING_CERTIFICATE_V2: ConstOid =
    Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 47]);

/// Signing certificate v2.
///
/// ```ASN.1
/// SigningCertificateV2 ::=  SEQUENCE {
///    certs        SEQUENCE OF ESSCertIDv2,
///    policies     SEQUENCE OF PolicyInformation OPTIONAL
/// }
/// ```
///
/// Policy information entries are kept in encoded form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigningCertificateV2 {
    pub certs: Vec<EssCertIdV2>,
    pub policies: Option<Vec<AnyValue>>,
}

impl SigningCertificateV2 {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let certs = cons.take_sequence(|cons| {
                let mut certs = Vec::new();

                while let Some(cert) = EssCertIdV2::take_opt_from(cons)? {
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

impl Values for SigningCertificateV2 {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// ESS certificate identifier, version 2.
///
/// ```ASN.1
/// ESSCertIDv2 ::=  SEQUENCE {
///     hashAlgorithm           AlgorithmIdentifier
///            DEFAULT {algorithm id-sha256},
///     certHash                 Hash,
///     issuerSerial             IssuerSerial OPTIONAL
/// }
/// ```
///
/// A `hash_algorithm` of `None` means SHA-256.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EssCertIdV2 {
    pub hash_algorithm: Option<AlgorithmIdentifier>,
    pub cert_hash: OctetString,
    pub issuer_serial: Option<IssuerSerial>,
}

impl EssCertIdV2 {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let hash_algorithm = AlgorithmIdentifier::take_opt_from(cons)?;
            let cert_hash = OctetString::take_from(cons)?;
            let issuer_serial = IssuerSerial::take_opt_from(cons)?;

            Ok(Self {
                hash_algorithm,
                cert_hash,
                issuer_serial,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.hash_algorithm.as_ref().map(|alg| alg.encode_ref()),
            self.cert_hash.encode_ref(),
            self.issuer_serial.as_ref().map(|serial| serial.encode_ref()),
        ))
    }
}

impl Values for EssCertIdV2 {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Issuer and serial number of a certificate, issuer as general names.
///
/// ```ASN.1
/// IssuerSerial ::= SEQUENCE {
///     issuer                   GeneralNames,
///     serialNumber             CertificateSerialNumber
/// }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IssuerSerial {
    pub issuer: GeneralNames,
    pub serial_number: CertificateSerialNumber,
}

impl IssuerSerial {
    /// Identify a certificate by its issuer's directory name and its serial.
    pub fn from_certificate(cert: &CapturedCertificate) -> Self {
        Self {
            issuer: vec![GeneralName::DirectoryName(cert.issuer().clone())].into(),
            serial_number: cert.serial_number().clone(),
        }
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match Self::take_opt_from(cons)? {
            Some(serial) => Ok(serial),
            None => Err(cons.content_err("expected IssuerSerial")),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let issuer = GeneralNames::take_from(cons)?;
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

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{asn1::common::der_encode, testutil::*},
        bytes::Bytes,
    };

    #[test]
    fn ess_cert_id_default_algorithm_is_omitted() {
        let cert = certificate("Signer", "Issuing CA", 42);

        let id = EssCertIdV2 {
            hash_algorithm: None,
            cert_hash: OctetString::new(vec![7u8; 32].into()),
            issuer_serial: Some(IssuerSerial::from_certificate(&cert)),
        };

        let der = der_encode(id.encode_ref()).unwrap();

        // SEQUENCE { OCTET STRING ...
        assert_eq!(der[0], 0x30);
        assert!(der.windows(2).any(|w| w == [0x04, 0x20]));

        let parsed = Constructed::decode(der.as_slice(), Mode::Der, |cons| {
            EssCertIdV2::take_opt_from(cons)
        })
        .unwrap()
        .unwrap();

        assert_eq!(parsed, id);
        assert!(parsed.hash_algorithm.is_none());

        let issuer_serial = parsed.issuer_serial.unwrap();
        assert_eq!(issuer_serial.serial_number, Integer::from(42u64));
        assert_eq!(
            issuer_serial.issuer.first(),
            Some(&GeneralName::DirectoryName(cert.issuer().clone()))
        );
    }

    #[test]
    fn signing_certificate_with_policies() {
        // PolicyInformation { anyPolicy }
        let policy =
            AnyValue::from_values(encode::sequence(Oid(Bytes::from_static(&[85, 29, 32, 0])).encode()));

        let value = SigningCertificateV2 {
            certs: vec![EssCertIdV2 {
                hash_algorithm: None,
                cert_hash: OctetString::new(vec![1u8; 32].into()),
                issuer_serial: None,
            }],
            policies: Some(vec![policy]),
        };

        let der = der_encode(value.encode_ref()).unwrap();
        let parsed = Constructed::decode(der.as_slice(), Mode::Der, |cons| {
            SigningCertificateV2::take_from(cons)
        })
        .unwrap();

        assert_eq!(parsed, value);
        assert_eq!(
            der_encode(parsed.encode_ref()).unwrap(),
            der,
            "re-encoding is stable"
        );
    }
}
