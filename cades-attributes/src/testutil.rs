// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{
        algorithm::{DigestAlgorithm, OID_SHA256},
        asn1::{
            common::{der_encode, GeneralizedTime, Time, UtcTime},
            rfc3161::{
                MessageImprint, PkiStatus, PkiStatusInfo, TimeStampResp, TimeStampToken, TstInfo,
                OID_CONTENT_TYPE_TST_INFO,
            },
            rfc3280::Name,
            rfc5280::{
                AlgorithmIdentifier, Certificate, CertificateList, Extension, Extensions,
                SubjectPublicKeyInfo, TbsCertList, TbsCertificate, Validity, Version,
                OID_CRL_NUMBER,
            },
            rfc5652::{
                Attribute, CertificateChoices, CertificateSet, CmsVersion,
                EncapsulatedContentInfo, RevocationInfoChoice, RevocationInfoChoices,
                SignedAttributes, SignedData, SignerIdentifier, SignerInfo, OID_CONTENT_TYPE,
                OID_ID_DATA, OID_MESSAGE_DIGEST,
            },
            rfc6960::{
                BasicOcspResponse, CertId, CertStatus, OcspResponse, OcspResponseStatus,
                ResponderId, ResponseBytes, ResponseData, SingleResponse, OID_PKIX_OCSP_BASIC,
            },
        },
        certificate::{CapturedCertificate, CapturedCrl},
        time_stamp_protocol::{TimeStampClient, TimeStampError, TimeStampResponse},
    },
    async_trait::async_trait,
    bcder::{
        encode::{PrimitiveContent, Values},
        BitString, Integer, OctetString, Oid,
    },
    bytes::Bytes,
    std::sync::Mutex,
};

pub fn sha256() -> AlgorithmIdentifier {
    AlgorithmIdentifier::new(Oid(Bytes::copy_from_slice(OID_SHA256.as_ref())))
}

pub fn sha256_with_rsa() -> AlgorithmIdentifier {
    AlgorithmIdentifier::with_null_parameters(Oid(Bytes::from_static(&[
        42, 134, 72, 134, 247, 13, 1, 1, 11,
    ])))
}

pub fn rsa_encryption() -> AlgorithmIdentifier {
    AlgorithmIdentifier::with_null_parameters(Oid(Bytes::from_static(&[
        42, 134, 72, 134, 247, 13, 1, 1, 1,
    ])))
}

pub fn name(cn: &str) -> Name {
    Name::with_common_name(cn).unwrap()
}

pub fn utc(s: &str) -> Time {
    Time::UtcTime(UtcTime::parse(s.as_bytes()).unwrap())
}

pub fn generalized(s: &str) -> GeneralizedTime {
    GeneralizedTime::parse(s.as_bytes()).unwrap()
}

pub fn certificate(subject: &str, issuer: &str, serial: u64) -> CapturedCertificate {
    CapturedCertificate::from_parsed(Certificate {
        tbs_certificate: TbsCertificate {
            version: Some(Version::V3),
            serial_number: Integer::from(serial),
            signature: sha256_with_rsa(),
            issuer: name(issuer),
            validity: Validity {
                not_before: utc("220101000000Z"),
                not_after: utc("320101000000Z"),
            },
            subject: name(subject),
            subject_public_key_info: SubjectPublicKeyInfo {
                algorithm: rsa_encryption(),
                subject_public_key: BitString::new(0, Bytes::from(vec![0x30; 16])),
            },
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: None,
        },
        signature_algorithm: sha256_with_rsa(),
        signature: BitString::new(0, Bytes::from(vec![0x5a; 32])),
    })
}

pub fn crl(issuer: &str, number: Option<u64>) -> CapturedCrl {
    let crl_extensions = number.map(|number| {
        Extensions::from(vec![Extension {
            id: Oid(Bytes::copy_from_slice(OID_CRL_NUMBER.as_ref())),
            critical: None,
            value: OctetString::new(Bytes::from(
                der_encode((&Integer::from(number)).encode()).unwrap(),
            )),
        }])
    });

    CapturedCrl::from_parsed(CertificateList {
        tbs_cert_list: TbsCertList {
            version: Some(Version::V2),
            signature: sha256_with_rsa(),
            issuer: name(issuer),
            this_update: utc("220301000000Z"),
            next_update: Some(utc("220401000000Z")),
            revoked_certificates: None,
            crl_extensions,
        },
        signature_algorithm: sha256_with_rsa(),
        signature: BitString::new(0, Bytes::from(vec![0x6b; 32])),
    })
}

pub fn basic_ocsp_response(responder: &str, serial: u64) -> BasicOcspResponse {
    BasicOcspResponse {
        tbs_response_data: ResponseData {
            version: None,
            responder_id: ResponderId::ByName(name(responder)),
            produced_at: generalized("20220301120000Z"),
            responses: vec![SingleResponse {
                cert_id: CertId {
                    hash_algorithm: DigestAlgorithm::Sha1.algorithm_identifier_with_null(),
                    issuer_name_hash: OctetString::new(Bytes::from(vec![1; 20])),
                    issuer_key_hash: OctetString::new(Bytes::from(vec![2; 20])),
                    serial_number: Integer::from(serial),
                },
                cert_status: CertStatus::Good,
                this_update: generalized("20220301120000Z"),
                next_update: None,
                single_extensions: None,
            }],
            response_extensions: None,
        },
        signature_algorithm: sha256_with_rsa(),
        signature: BitString::new(0, Bytes::from(vec![0x7c; 32])),
        certs: None,
    }
}

pub fn ocsp_response(responder: &str, serial: u64) -> OcspResponse {
    let basic = basic_ocsp_response(responder, serial);

    OcspResponse {
        response_status: OcspResponseStatus::Successful,
        response_bytes: Some(ResponseBytes {
            response_type: Oid(Bytes::copy_from_slice(OID_PKIX_OCSP_BASIC.as_ref())),
            response: OctetString::new(Bytes::from(der_encode(basic.encode_ref()).unwrap())),
        }),
    }
}

pub fn ocsp_response_der(responder: &str, serial: u64) -> Vec<u8> {
    der_encode(ocsp_response(responder, serial).encode_ref()).unwrap()
}

pub fn signer_certificate() -> CapturedCertificate {
    certificate("Signer", "Test CA", 2)
}

pub fn ca_certificate() -> CapturedCertificate {
    certificate("Test CA", "Test CA", 1)
}

fn simple_signed_data(
    content_type: Oid,
    content: &[u8],
    certificate: CapturedCertificate,
    crls: Option<RevocationInfoChoices>,
    signature: Vec<u8>,
) -> SignedData {
    let signed_attributes = SignedAttributes::from(vec![
        Attribute::from_values(
            Oid(Bytes::copy_from_slice(OID_CONTENT_TYPE.as_ref())),
            content_type.clone().encode(),
        ),
        Attribute::from_values(
            Oid(Bytes::copy_from_slice(OID_MESSAGE_DIGEST.as_ref())),
            OctetString::new(Bytes::from(DigestAlgorithm::Sha256.digest(content))).encode(),
        ),
    ]);

    SignedData {
        version: CmsVersion::V1,
        digest_algorithms: vec![sha256()].into(),
        content_info: EncapsulatedContentInfo {
            content_type,
            content: Some(OctetString::new(Bytes::copy_from_slice(content))),
        },
        certificates: None,
        crls,
        signer_infos: vec![SignerInfo {
            version: CmsVersion::V1,
            sid: SignerIdentifier::IssuerAndSerialNumber(certificate.issuer_and_serial_number()),
            digest_algorithm: sha256(),
            signed_attributes: Some(signed_attributes),
            signature_algorithm: sha256_with_rsa(),
            signature: OctetString::new(Bytes::from(signature)),
            unsigned_attributes: None,
            signed_attributes_data: None,
        }]
        .into(),
    }
}

/// Signed data over `content` with a signer and CA certificate and one CRL.
pub fn signed_data(content: &[u8]) -> SignedData {
    let mut signed_data = simple_signed_data(
        Oid(Bytes::copy_from_slice(OID_ID_DATA.as_ref())),
        content,
        signer_certificate(),
        Some(RevocationInfoChoices::from(vec![RevocationInfoChoice::Crl(
            Box::new(crl("Test CA", Some(1))),
        )])),
        vec![0x42; 64],
    );

    signed_data.certificates = Some(CertificateSet::from(vec![
        CertificateChoices::Certificate(Box::new(signer_certificate())),
        CertificateChoices::Certificate(Box::new(ca_certificate())),
    ]));

    signed_data
}

pub fn tst_info(algorithm: DigestAlgorithm, digest: &[u8], nonce: Option<Integer>) -> TstInfo {
    TstInfo {
        version: Integer::from(1),
        policy: Oid(Bytes::from_static(&[42, 3, 4])),
        message_imprint: MessageImprint {
            hash_algorithm: algorithm.into(),
            hashed_message: OctetString::new(Bytes::copy_from_slice(digest)),
        },
        serial_number: Integer::from(99u64),
        gen_time: generalized("20220301120000Z"),
        accuracy: None,
        ordering: None,
        nonce,
        tsa: None,
        extensions: None,
    }
}

pub fn time_stamp_token(
    algorithm: DigestAlgorithm,
    digest: &[u8],
    nonce: Option<Integer>,
) -> TimeStampToken {
    let tsa = certificate("Test TSA", "Test CA", 10);
    let tst_info = der_encode(tst_info(algorithm, digest, nonce).encode_ref()).unwrap();

    let mut signed_data = simple_signed_data(
        Oid(Bytes::copy_from_slice(OID_CONTENT_TYPE_TST_INFO.as_ref())),
        &tst_info,
        tsa.clone(),
        None,
        vec![0x24; 64],
    );
    signed_data.version = CmsVersion::V3;
    signed_data.certificates = Some(CertificateSet::from(vec![
        CertificateChoices::Certificate(Box::new(tsa)),
    ]));

    signed_data.to_content_info()
}

pub fn granted_response(
    algorithm: DigestAlgorithm,
    digest: &[u8],
    nonce: Option<Integer>,
) -> TimeStampResp {
    TimeStampResp {
        status: PkiStatusInfo {
            status: PkiStatus::Granted,
            status_string: None,
            fail_info: None,
        },
        time_stamp_token: Some(time_stamp_token(algorithm, digest, nonce)),
    }
}

/// Records requested imprints and answers with canned tokens.
#[derive(Debug)]
pub struct StubTimeStampClient {
    pub requests: Mutex<Vec<(DigestAlgorithm, Vec<u8>)>>,
    granted: bool,
}

impl Default for StubTimeStampClient {
    fn default() -> Self {
        Self {
            requests: Mutex::new(vec![]),
            granted: true,
        }
    }
}

impl StubTimeStampClient {
    pub fn rejecting() -> Self {
        Self {
            granted: false,
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<(DigestAlgorithm, Vec<u8>)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TimeStampClient for StubTimeStampClient {
    async fn time_stamp(
        &self,
        digest_algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> Result<TimeStampResponse, TimeStampError> {
        self.requests
            .lock()
            .unwrap()
            .push((digest_algorithm, digest.to_vec()));

        if self.granted {
            Ok(granted_response(digest_algorithm, digest, None).into())
        } else {
            Ok(TimeStampResp {
                status: PkiStatusInfo {
                    status: PkiStatus::Rejection,
                    status_string: None,
                    fail_info: None,
                },
                time_stamp_token: None,
            }
            .into())
        }
    }
}
