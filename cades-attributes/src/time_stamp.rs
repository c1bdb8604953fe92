// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Time-stamp attributes (CAdES-T, CAdES-C and CAdES-A).

Each time-stamp attribute covers a digest of a well defined concatenation of
DER encodings:

* `signature-time-stamp` covers the signature value.
* `CAdES-C-Timestamp` covers the signature value followed by the
  `signature-time-stamp`, `complete-certificate-references` and
  `complete-revocation-references` attributes.
* `archive-time-stamp-v3` covers the encapsulated content and every field of
  the signer info, followed by an [AtsHashIndex] listing digests of all
  certificates, revocation data and unsigned attributes present when the
  time-stamp was taken. The hash index travels as the only unsigned attribute
  of the time-stamp token's own signer.

The `*_buffer` functions compute those digests. [TimeStamper] sends them to a
time-stamp authority and wraps the returned tokens.
*/

use {
    crate::{
        algorithm::{digest_all, DigestAlgorithm, DigestProvider},
        asn1::{
            common::der_encode,
            etsi_en319122::{AtsHashIndex, OID_ARCHIVE_TIME_STAMP_V3, OID_ATS_HASH_INDEX},
            rfc3161::{TimeStampToken, TstInfo, OID_TIME_STAMP_TOKEN},
            rfc5126::{
                OID_CADES_C_TIMESTAMP, OID_COMPLETE_CERTIFICATE_REFERENCES,
                OID_COMPLETE_REVOCATION_REFERENCES,
            },
            rfc5652::{Attribute, ContentInfo, SignedData, SignerInfo, UnsignedAttributes},
        },
        attribute::signer_info,
        time_stamp_protocol::{signed_data_tst_info, token_signed_data, TimeStampClient},
        CadesError,
    },
    bcder::{encode::PrimitiveContent, ConstOid, OctetString, Oid},
    bytes::Bytes,
    log::debug,
};

/// Compute the digest a `signature-time-stamp` covers.
pub async fn signature_time_stamp_buffer(
    provider: &dyn DigestProvider,
    algorithm: DigestAlgorithm,
    signer: &SignerInfo,
) -> Result<Vec<u8>, CadesError> {
    provider
        .digest(algorithm, signer.signature.to_bytes().as_ref())
        .await
}

fn check_type(
    attribute: &Attribute,
    expected: ConstOid,
    name: &'static str,
) -> Result<(), CadesError> {
    if attribute.typ == expected {
        Ok(())
    } else {
        Err(CadesError::UnexpectedAttribute {
            expected: name,
            actual: format!("{}", attribute.typ),
        })
    }
}

/// Compute the digest a `CAdES-C-Timestamp` covers.
///
/// The attributes must be the signer's `signature-time-stamp`,
/// `complete-certificate-references` and `complete-revocation-references`,
/// in that order.
pub async fn cades_c_timestamp_buffer(
    provider: &dyn DigestProvider,
    algorithm: DigestAlgorithm,
    signer: &SignerInfo,
    signature_time_stamp: &Attribute,
    certificate_references: &Attribute,
    revocation_references: &Attribute,
) -> Result<Vec<u8>, CadesError> {
    check_type(
        signature_time_stamp,
        OID_TIME_STAMP_TOKEN,
        "signature-time-stamp",
    )?;
    check_type(
        certificate_references,
        OID_COMPLETE_CERTIFICATE_REFERENCES,
        "complete-certificate-references",
    )?;
    check_type(
        revocation_references,
        OID_COMPLETE_REVOCATION_REFERENCES,
        "complete-revocation-references",
    )?;

    let mut buffer = signer.signature.to_bytes().to_vec();
    buffer.extend(signature_time_stamp.to_der()?);
    buffer.extend(certificate_references.to_der()?);
    buffer.extend(revocation_references.to_der()?);

    provider.digest(algorithm, &buffer).await
}

/// Compute the [AtsHashIndex] of a signer.
///
/// Every certificate choice, revocation choice and unsigned attribute of the
/// signer is digested in its DER encoding, context tag included for choices of
/// another format.
pub async fn ats_hash_index(
    provider: &dyn DigestProvider,
    algorithm: DigestAlgorithm,
    signed_data: &SignedData,
    signer_index: usize,
) -> Result<AtsHashIndex, CadesError> {
    let signer = signer_info(signed_data, signer_index)?;

    let certs = signed_data
        .certificates
        .iter()
        .flat_map(|set| set.iter())
        .map(|choice| der_encode(choice))
        .collect::<Result<Vec<_>, _>>()?;
    let crls = signed_data
        .crls
        .iter()
        .flat_map(|crls| crls.iter())
        .map(|choice| der_encode(choice))
        .collect::<Result<Vec<_>, _>>()?;
    let attrs = signer
        .unsigned_attributes
        .iter()
        .flat_map(|attrs| attrs.iter())
        .map(|attr| attr.to_der())
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "indexing {} certificates, {} revocation entries and {} unsigned attributes",
        certs.len(),
        crls.len(),
        attrs.len()
    );

    let (certs, crls, attrs) = futures::try_join!(
        digest_all(provider, algorithm, &certs),
        digest_all(provider, algorithm, &crls),
        digest_all(provider, algorithm, &attrs),
    )?;

    let octets = |digests: Vec<Vec<u8>>| {
        digests
            .into_iter()
            .map(|digest| OctetString::new(Bytes::from(digest)))
            .collect::<Vec<_>>()
    };

    Ok(AtsHashIndex {
        hash_ind_algorithm: match algorithm {
            DigestAlgorithm::Sha256 => None,
            _ => Some(algorithm.algorithm_identifier_with_null()),
        },
        certificates_hash_index: octets(certs),
        crls_hash_index: octets(crls),
        unsigned_attrs_hash_index: octets(attrs),
    })
}

/// Compute the digest an `archive-time-stamp-v3` covers.
///
/// `content` supplies the signed content of a detached signature. It is
/// required when the signed data doesn't encapsulate its content and takes
/// precedence otherwise.
pub async fn archive_time_stamp_v3_buffer(
    provider: &dyn DigestProvider,
    algorithm: DigestAlgorithm,
    signed_data: &SignedData,
    signer_index: usize,
    content: Option<&[u8]>,
    hash_index: &AtsHashIndex,
) -> Result<Vec<u8>, CadesError> {
    let signer = signer_info(signed_data, signer_index)?;

    let signed_attributes = signer
        .signed_attributes_implicit_encoding()?
        .ok_or(CadesError::MissingParameter("signedAttrs"))?;

    let content = match content {
        Some(content) => Bytes::copy_from_slice(content),
        None => signed_data
            .content_info
            .content
            .as_ref()
            .map(|content| content.to_bytes())
            .ok_or(CadesError::MissingParameter("eContent"))?,
    };

    let content_digest = provider.digest(algorithm, content.as_ref()).await?;

    let mut buffer = der_encode(signed_data.content_info.content_type.encode_ref())?;
    buffer.extend(content_digest);
    buffer.extend(der_encode(signer.version.encode())?);
    buffer.extend(der_encode(&signer.sid)?);
    buffer.extend(der_encode(signer.digest_algorithm.encode_ref())?);
    buffer.extend(signed_attributes);
    buffer.extend(der_encode(signer.signature_algorithm.encode_ref())?);
    buffer.extend(der_encode(signer.signature.encode_ref())?);
    buffer.extend(der_encode(hash_index.encode_ref())?);

    provider.digest(algorithm, &buffer).await
}

fn token_from_attribute(
    attribute: &Attribute,
    expected: ConstOid,
    name: &'static str,
) -> Result<TimeStampToken, CadesError> {
    check_type(attribute, expected, name)?;

    let value = attribute
        .first_value()
        .ok_or_else(|| CadesError::Schema("TimeStampToken", format!("{} has no value", name)))?;

    value
        .decode(|cons| ContentInfo::take_from(cons))
        .map_err(|e| CadesError::Schema("TimeStampToken", format!("{}", e)))
}

/// A `signature-time-stamp` unsigned attribute.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureTimeStamp(TimeStampToken);

impl SignatureTimeStamp {
    pub fn from_attribute(attribute: &Attribute) -> Result<Self, CadesError> {
        Ok(Self(token_from_attribute(
            attribute,
            OID_TIME_STAMP_TOKEN,
            "signature-time-stamp",
        )?))
    }

    pub fn to_attribute(&self) -> Attribute {
        Attribute::from_values(
            Oid(Bytes::copy_from_slice(OID_TIME_STAMP_TOKEN.as_ref())),
            &self.0,
        )
    }

    pub fn token(&self) -> &TimeStampToken {
        &self.0
    }

    pub fn tst_info(&self) -> Result<Option<TstInfo>, CadesError> {
        Ok(signed_data_tst_info(&token_signed_data(&self.0)?)?)
    }
}

impl From<TimeStampToken> for SignatureTimeStamp {
    fn from(token: TimeStampToken) -> Self {
        Self(token)
    }
}

/// A `CAdES-C-Timestamp` unsigned attribute.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CadesCTimestamp(TimeStampToken);

impl CadesCTimestamp {
    pub fn from_attribute(attribute: &Attribute) -> Result<Self, CadesError> {
        Ok(Self(token_from_attribute(
            attribute,
            OID_CADES_C_TIMESTAMP,
            "CAdES-C-Timestamp",
        )?))
    }

    pub fn to_attribute(&self) -> Attribute {
        Attribute::from_values(
            Oid(Bytes::copy_from_slice(OID_CADES_C_TIMESTAMP.as_ref())),
            &self.0,
        )
    }

    pub fn token(&self) -> &TimeStampToken {
        &self.0
    }

    pub fn tst_info(&self) -> Result<Option<TstInfo>, CadesError> {
        Ok(signed_data_tst_info(&token_signed_data(&self.0)?)?)
    }
}

impl From<TimeStampToken> for CadesCTimestamp {
    fn from(token: TimeStampToken) -> Self {
        Self(token)
    }
}

/// An `archive-time-stamp-v3` unsigned attribute.
///
/// The token's signed data has a single signer whose only unsigned attribute
/// is the [AtsHashIndex].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ArchiveTimeStampV3 {
    token: TimeStampToken,
    signed_data: SignedData,
    hash_index: AtsHashIndex,
}

impl ArchiveTimeStampV3 {
    /// Parse a time-stamp token carrying a hash index.
    pub fn from_token(token: TimeStampToken) -> Result<Self, CadesError> {
        let signed_data = token_signed_data(&token)?;

        let signer = match signed_data.signer_infos.as_slice() {
            [signer] => signer,
            _ => {
                return Err(CadesError::Schema(
                    "ArchiveTimeStampV3",
                    "time-stamp token must have exactly one signer".to_string(),
                ))
            }
        };

        let attributes = signer
            .unsigned_attributes
            .as_ref()
            .map(|attrs| attrs.as_slice());

        let hash_index = match attributes {
            Some([attribute]) if attribute.typ == OID_ATS_HASH_INDEX => attribute
                .first_value()
                .map(|value| value.decode(|cons| AtsHashIndex::take_from(cons)))
                .transpose()?,
            _ => None,
        }
        .ok_or_else(|| {
            CadesError::Schema(
                "ArchiveTimeStampV3",
                "token signer must carry exactly one ATSHashIndex attribute".to_string(),
            )
        })?;

        Ok(Self {
            token,
            signed_data,
            hash_index,
        })
    }

    /// Embed a hash index into a time-stamp token.
    ///
    /// The hash index replaces any unsigned attributes of the token's signer.
    pub fn from_parts(
        token: &TimeStampToken,
        hash_index: AtsHashIndex,
    ) -> Result<Self, CadesError> {
        let mut signed_data = token_signed_data(token)?;

        if signed_data.signer_infos.len() != 1 {
            return Err(CadesError::Schema(
                "ArchiveTimeStampV3",
                "time-stamp token must have exactly one signer".to_string(),
            ));
        }

        signed_data.signer_infos[0].unsigned_attributes =
            Some(UnsignedAttributes::from(vec![Attribute::from_values(
                Oid(Bytes::copy_from_slice(OID_ATS_HASH_INDEX.as_ref())),
                &hash_index,
            )]));

        Ok(Self {
            token: signed_data.to_content_info(),
            signed_data,
            hash_index,
        })
    }

    pub fn from_attribute(attribute: &Attribute) -> Result<Self, CadesError> {
        Self::from_token(token_from_attribute(
            attribute,
            OID_ARCHIVE_TIME_STAMP_V3,
            "archive-time-stamp-v3",
        )?)
    }

    pub fn to_attribute(&self) -> Attribute {
        Attribute::from_values(
            Oid(Bytes::copy_from_slice(OID_ARCHIVE_TIME_STAMP_V3.as_ref())),
            &self.token,
        )
    }

    pub fn token(&self) -> &TimeStampToken {
        &self.token
    }

    /// The signed data of the time-stamp token.
    pub fn signed_data(&self) -> &SignedData {
        &self.signed_data
    }

    pub fn hash_index(&self) -> &AtsHashIndex {
        &self.hash_index
    }

    pub fn tst_info(&self) -> Result<Option<TstInfo>, CadesError> {
        Ok(signed_data_tst_info(&self.signed_data)?)
    }
}

/// Obtains time-stamp attributes from a time-stamp authority.
pub struct TimeStamper<'a> {
    digester: &'a dyn DigestProvider,
    client: &'a dyn TimeStampClient,
    digest_algorithm: DigestAlgorithm,
}

impl<'a> TimeStamper<'a> {
    /// Construct an instance using SHA-256.
    pub fn new(digester: &'a dyn DigestProvider, client: &'a dyn TimeStampClient) -> Self {
        Self {
            digester,
            client,
            digest_algorithm: DigestAlgorithm::Sha256,
        }
    }

    /// Set the digest algorithm for stamped buffers and hash indexes.
    pub fn digest_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.digest_algorithm = algorithm;
        self
    }

    async fn time_stamp(&self, digest: &[u8]) -> Result<TimeStampToken, CadesError> {
        debug!(
            "requesting time-stamp over {} digest {}",
            self.digest_algorithm.name(),
            hex::encode(digest)
        );

        self.client
            .time_stamp(self.digest_algorithm, digest)
            .await?
            .into_token()?
            .ok_or(CadesError::MissingParameter("timeStampToken"))
    }

    /// Time-stamp the signature of a signer.
    pub async fn signature_time_stamp(
        &self,
        signed_data: &SignedData,
        signer_index: usize,
    ) -> Result<SignatureTimeStamp, CadesError> {
        let signer = signer_info(signed_data, signer_index)?;

        debug!("obtaining signature-time-stamp for signer {}", signer_index);

        let digest =
            signature_time_stamp_buffer(self.digester, self.digest_algorithm, signer).await?;

        Ok(SignatureTimeStamp(self.time_stamp(&digest).await?))
    }

    /// Time-stamp the signature and CAdES-C references of a signer.
    pub async fn cades_c_timestamp(
        &self,
        signed_data: &SignedData,
        signer_index: usize,
        signature_time_stamp: &Attribute,
        certificate_references: &Attribute,
        revocation_references: &Attribute,
    ) -> Result<CadesCTimestamp, CadesError> {
        let signer = signer_info(signed_data, signer_index)?;

        debug!("obtaining CAdES-C-Timestamp for signer {}", signer_index);

        let digest = cades_c_timestamp_buffer(
            self.digester,
            self.digest_algorithm,
            signer,
            signature_time_stamp,
            certificate_references,
            revocation_references,
        )
        .await?;

        Ok(CadesCTimestamp(self.time_stamp(&digest).await?))
    }

    /// Obtain an archive time-stamp over a signer.
    ///
    /// `content` is the signed content of a detached signature.
    pub async fn archive_time_stamp_v3(
        &self,
        signed_data: &SignedData,
        signer_index: usize,
        content: Option<&[u8]>,
    ) -> Result<ArchiveTimeStampV3, CadesError> {
        let hash_index = ats_hash_index(
            self.digester,
            self.digest_algorithm,
            signed_data,
            signer_index,
        )
        .await?;

        let digest = archive_time_stamp_v3_buffer(
            self.digester,
            self.digest_algorithm,
            signed_data,
            signer_index,
            content,
            &hash_index,
        )
        .await?;

        debug!("obtaining archive-time-stamp-v3 for signer {}", signer_index);

        let token = self.time_stamp(&digest).await?;

        ArchiveTimeStampV3::from_parts(&token, hash_index)
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{
            algorithm::RingDigestProvider,
            asn1::{
                rfc3161::PkiStatus,
                rfc5652::{
                    CertificateChoices, OtherCertificateFormat, OtherRevocationInfoFormat,
                    RevocationInfoChoice, OID_CONTENT_TYPE,
                },
            },
            testutil::*,
            time_stamp_protocol::TimeStampError,
        },
        bcder::{Captured, Mode},
    };

    fn attribute(oid: ConstOid, data: &'static [u8]) -> Attribute {
        Attribute::from_values(
            Oid(Bytes::copy_from_slice(oid.as_ref())),
            OctetString::new(Bytes::from_static(data)).encode(),
        )
    }

    #[tokio::test]
    async fn signature_buffer_digests_signature() {
        let signed_data = signed_data(b"content");

        let digest = signature_time_stamp_buffer(
            &RingDigestProvider,
            DigestAlgorithm::Sha256,
            &signed_data.signer_infos[0],
        )
        .await
        .unwrap();

        assert_eq!(digest, DigestAlgorithm::Sha256.digest(&[0x42; 64]));
    }

    #[tokio::test]
    async fn cades_c_buffer_concatenation() {
        let signed_data = signed_data(b"content");
        let signer = &signed_data.signer_infos[0];

        let sig_ts = attribute(OID_TIME_STAMP_TOKEN, b"ts");
        let ccr = attribute(OID_COMPLETE_CERTIFICATE_REFERENCES, b"ccr");
        let crr = attribute(OID_COMPLETE_REVOCATION_REFERENCES, b"crr");

        let digest = cades_c_timestamp_buffer(
            &RingDigestProvider,
            DigestAlgorithm::Sha1,
            signer,
            &sig_ts,
            &ccr,
            &crr,
        )
        .await
        .unwrap();

        let mut expected = vec![0x42; 64];
        expected.extend(sig_ts.to_der().unwrap());
        expected.extend(ccr.to_der().unwrap());
        expected.extend(crr.to_der().unwrap());
        assert_eq!(digest, DigestAlgorithm::Sha1.digest(&expected));

        let res = cades_c_timestamp_buffer(
            &RingDigestProvider,
            DigestAlgorithm::Sha1,
            signer,
            &ccr,
            &sig_ts,
            &crr,
        )
        .await;
        assert!(matches!(
            res,
            Err(CadesError::UnexpectedAttribute {
                expected: "signature-time-stamp",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn hash_index_lists() {
        let mut signed_data = signed_data(b"content");
        signed_data.signer_infos[0].push_unsigned_attribute(attribute(OID_CONTENT_TYPE, b"a"));
        signed_data.signer_infos[0].push_unsigned_attribute(attribute(OID_CONTENT_TYPE, b"b"));

        let index = ats_hash_index(&RingDigestProvider, DigestAlgorithm::Sha256, &signed_data, 0)
            .await
            .unwrap();

        assert!(index.hash_ind_algorithm.is_none());
        assert_eq!(index.certificates_hash_index.len(), 2);
        assert_eq!(index.crls_hash_index.len(), 1);
        assert_eq!(index.unsigned_attrs_hash_index.len(), 2);

        assert_eq!(
            index.certificates_hash_index[0].to_bytes().as_ref(),
            DigestAlgorithm::Sha256
                .digest(signer_certificate().as_der())
                .as_slice()
        );
        assert_eq!(
            index.crls_hash_index[0].to_bytes().as_ref(),
            DigestAlgorithm::Sha256
                .digest(crl("Test CA", Some(1)).as_der())
                .as_slice()
        );
        assert_eq!(
            index.unsigned_attrs_hash_index[1].to_bytes().as_ref(),
            DigestAlgorithm::Sha256
                .digest(&attribute(OID_CONTENT_TYPE, b"b").to_der().unwrap())
                .as_slice()
        );

        let again = ats_hash_index(&RingDigestProvider, DigestAlgorithm::Sha256, &signed_data, 0)
            .await
            .unwrap();
        assert_eq!(again, index);

        let sha512 = ats_hash_index(&RingDigestProvider, DigestAlgorithm::Sha512, &signed_data, 0)
            .await
            .unwrap();
        assert!(sha512.hash_ind_algorithm.is_some());
        assert_eq!(sha512.certificates_hash_index[0].to_bytes().len(), 64);
    }

    #[tokio::test]
    async fn hash_index_retags_other_formats() {
        let mut signed_data = signed_data(b"content");
        signed_data.certificates = Some(
            vec![CertificateChoices::Other(Box::new(OtherCertificateFormat {
                format: Oid(Bytes::from_static(&[42, 3, 4])),
                certificate: Captured::from_values(
                    Mode::Der,
                    OctetString::new(Bytes::from_static(b"cert")).encode(),
                ),
            }))]
            .into(),
        );
        signed_data.crls = Some(
            vec![RevocationInfoChoice::Other(OtherRevocationInfoFormat {
                format: Oid(Bytes::from_static(&[42, 3, 5])),
                info: Captured::from_values(
                    Mode::Der,
                    OctetString::new(Bytes::from_static(b"crl")).encode(),
                ),
            })]
            .into(),
        );

        let index = ats_hash_index(&RingDigestProvider, DigestAlgorithm::Sha256, &signed_data, 0)
            .await
            .unwrap();

        // [3] { OID 1.2.3.4, OCTET STRING "cert" }
        let cert = [0xa3, 0x0b, 0x06, 0x03, 42, 3, 4, 0x04, 0x04, b'c', b'e', b'r', b't'];
        assert_eq!(
            index.certificates_hash_index[0].to_bytes().as_ref(),
            DigestAlgorithm::Sha256.digest(&cert).as_slice()
        );

        // [1] { OID 1.2.3.5, OCTET STRING "crl" }
        let crl = [0xa1, 0x0a, 0x06, 0x03, 42, 3, 5, 0x04, 0x03, b'c', b'r', b'l'];
        assert_eq!(
            index.crls_hash_index[0].to_bytes().as_ref(),
            DigestAlgorithm::Sha256.digest(&crl).as_slice()
        );
        assert!(index.unsigned_attrs_hash_index.is_empty());
    }

    #[tokio::test]
    async fn archive_buffer_fields() {
        let signed_data = signed_data(b"content");
        let signer = &signed_data.signer_infos[0];
        let index = AtsHashIndex::default();

        let digest = archive_time_stamp_v3_buffer(
            &RingDigestProvider,
            DigestAlgorithm::Sha256,
            &signed_data,
            0,
            None,
            &index,
        )
        .await
        .unwrap();

        let mut expected = der_encode(signed_data.content_info.content_type.encode_ref()).unwrap();
        expected.extend(DigestAlgorithm::Sha256.digest(b"content"));
        expected.extend(der_encode(signer.version.encode()).unwrap());
        expected.extend(der_encode(&signer.sid).unwrap());
        expected.extend(der_encode(signer.digest_algorithm.encode_ref()).unwrap());
        expected.extend(signer.signed_attributes_implicit_encoding().unwrap().unwrap());
        expected.extend(der_encode(signer.signature_algorithm.encode_ref()).unwrap());
        expected.extend(der_encode(signer.signature.encode_ref()).unwrap());
        expected.extend(vec![0x30, 0x06, 0x30, 0x00, 0x30, 0x00, 0x30, 0x00]);

        assert_eq!(digest, DigestAlgorithm::Sha256.digest(&expected));
    }

    #[tokio::test]
    async fn decoded_signed_data_digests_like_built() {
        let built = signed_data(b"content");
        let decoded = SignedData::decode_der(&built.to_content_info_der().unwrap()).unwrap();

        let index = ats_hash_index(&RingDigestProvider, DigestAlgorithm::Sha256, &decoded, 0)
            .await
            .unwrap();
        assert_eq!(
            index,
            ats_hash_index(&RingDigestProvider, DigestAlgorithm::Sha256, &built, 0)
                .await
                .unwrap()
        );

        let buffer = |signed_data: SignedData, index: AtsHashIndex| async move {
            archive_time_stamp_v3_buffer(
                &RingDigestProvider,
                DigestAlgorithm::Sha256,
                &signed_data,
                0,
                None,
                &index,
            )
            .await
            .unwrap()
        };
        assert_eq!(
            buffer(decoded, index.clone()).await,
            buffer(built, index).await
        );
    }

    #[tokio::test]
    async fn archive_buffer_sensitivity() {
        let signed_data = signed_data(b"content");
        let index = AtsHashIndex::default();

        let buffer = |signed_data: SignedData, index: AtsHashIndex| async move {
            archive_time_stamp_v3_buffer(
                &RingDigestProvider,
                DigestAlgorithm::Sha256,
                &signed_data,
                0,
                None,
                &index,
            )
            .await
            .unwrap()
        };

        let base = buffer(signed_data.clone(), index.clone()).await;
        assert_eq!(buffer(signed_data.clone(), index.clone()).await, base);

        let mut changed = signed_data.clone();
        changed.signer_infos[0].signature = OctetString::new(Bytes::from_static(&[0x43; 64]));
        assert_ne!(buffer(changed, index.clone()).await, base);

        assert_ne!(buffer(crate::testutil::signed_data(b"other"), index.clone()).await, base);

        let mut changed_index = index.clone();
        changed_index
            .unsigned_attrs_hash_index
            .push(OctetString::new(Bytes::from_static(&[1])));
        assert_ne!(buffer(signed_data, changed_index).await, base);
    }

    #[tokio::test]
    async fn archive_buffer_requirements() {
        let mut signed_data = signed_data(b"content");
        let index = AtsHashIndex::default();

        let attached = archive_time_stamp_v3_buffer(
            &RingDigestProvider,
            DigestAlgorithm::Sha256,
            &signed_data,
            0,
            None,
            &index,
        )
        .await
        .unwrap();

        signed_data.content_info.content = None;
        assert!(matches!(
            archive_time_stamp_v3_buffer(
                &RingDigestProvider,
                DigestAlgorithm::Sha256,
                &signed_data,
                0,
                None,
                &index,
            )
            .await,
            Err(CadesError::MissingParameter("eContent"))
        ));

        let detached = archive_time_stamp_v3_buffer(
            &RingDigestProvider,
            DigestAlgorithm::Sha256,
            &signed_data,
            0,
            Some(b"content"),
            &index,
        )
        .await
        .unwrap();
        assert_eq!(detached, attached);

        signed_data.signer_infos[0].signed_attributes = None;
        assert!(matches!(
            archive_time_stamp_v3_buffer(
                &RingDigestProvider,
                DigestAlgorithm::Sha256,
                &signed_data,
                0,
                Some(b"content"),
                &index,
            )
            .await,
            Err(CadesError::MissingParameter("signedAttrs"))
        ));

        assert!(matches!(
            archive_time_stamp_v3_buffer(
                &RingDigestProvider,
                DigestAlgorithm::Sha256,
                &signed_data,
                3,
                Some(b"content"),
                &index,
            )
            .await,
            Err(CadesError::SignerIndexOutOfRange(3, 1))
        ));
    }

    #[tokio::test]
    async fn stamper_signature_time_stamp() {
        let signed_data = signed_data(b"content");
        let client = StubTimeStampClient::default();
        let stamper = TimeStamper::new(&RingDigestProvider, &client);

        let stamp = stamper.signature_time_stamp(&signed_data, 0).await.unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, DigestAlgorithm::Sha256);
        assert_eq!(requests[0].1, DigestAlgorithm::Sha256.digest(&[0x42; 64]));

        let tst_info = stamp.tst_info().unwrap().unwrap();
        assert_eq!(
            tst_info.message_imprint.hashed_message.to_bytes().as_ref(),
            requests[0].1.as_slice()
        );

        let attribute = stamp.to_attribute();
        assert_eq!(attribute.typ, OID_TIME_STAMP_TOKEN);
        let parsed = Attribute::from_der(&attribute.to_der().unwrap()).unwrap();
        let parsed = SignatureTimeStamp::from_attribute(&parsed).unwrap();
        assert_eq!(parsed, stamp);

        assert!(matches!(
            CadesCTimestamp::from_attribute(&attribute),
            Err(CadesError::UnexpectedAttribute { .. })
        ));
    }

    #[tokio::test]
    async fn stamper_cades_c_timestamp() {
        let signed_data = signed_data(b"content");
        let client = StubTimeStampClient::default();
        let stamper =
            TimeStamper::new(&RingDigestProvider, &client).digest_algorithm(DigestAlgorithm::Sha512);

        let sig_ts = attribute(OID_TIME_STAMP_TOKEN, b"ts");
        let ccr = attribute(OID_COMPLETE_CERTIFICATE_REFERENCES, b"ccr");
        let crr = attribute(OID_COMPLETE_REVOCATION_REFERENCES, b"crr");

        let stamp = stamper
            .cades_c_timestamp(&signed_data, 0, &sig_ts, &ccr, &crr)
            .await
            .unwrap();

        let expected = cades_c_timestamp_buffer(
            &RingDigestProvider,
            DigestAlgorithm::Sha512,
            &signed_data.signer_infos[0],
            &sig_ts,
            &ccr,
            &crr,
        )
        .await
        .unwrap();

        assert_eq!(client.requests(), vec![(DigestAlgorithm::Sha512, expected)]);
        assert_eq!(stamp.to_attribute().typ, OID_CADES_C_TIMESTAMP);
        assert_eq!(
            CadesCTimestamp::from_attribute(&stamp.to_attribute()).unwrap(),
            stamp
        );
    }

    #[tokio::test]
    async fn stamper_archive_time_stamp() {
        let mut signed_data = signed_data(b"content");
        signed_data.signer_infos[0].push_unsigned_attribute(attribute(OID_CONTENT_TYPE, b"a"));

        let client = StubTimeStampClient::default();
        let stamper = TimeStamper::new(&RingDigestProvider, &client);

        let stamp = stamper
            .archive_time_stamp_v3(&signed_data, 0, None)
            .await
            .unwrap();

        assert_eq!(stamp.hash_index().certificates_hash_index.len(), 2);
        assert_eq!(stamp.hash_index().crls_hash_index.len(), 1);
        assert_eq!(stamp.hash_index().unsigned_attrs_hash_index.len(), 1);

        let expected = archive_time_stamp_v3_buffer(
            &RingDigestProvider,
            DigestAlgorithm::Sha256,
            &signed_data,
            0,
            None,
            stamp.hash_index(),
        )
        .await
        .unwrap();
        assert_eq!(client.requests()[0].1, expected);

        let token_signer = &stamp.signed_data().signer_infos[0];
        let unsigned = token_signer.unsigned_attributes.as_ref().unwrap();
        assert_eq!(unsigned.len(), 1);
        assert_eq!(unsigned[0].typ, OID_ATS_HASH_INDEX);

        let attribute = stamp.to_attribute();
        let parsed = Attribute::from_der(&attribute.to_der().unwrap()).unwrap();
        let parsed = ArchiveTimeStampV3::from_attribute(&parsed).unwrap();
        assert_eq!(parsed.hash_index(), stamp.hash_index());
        assert_eq!(
            parsed.tst_info().unwrap().unwrap().message_imprint.hashed_message,
            OctetString::new(Bytes::from(expected))
        );
    }

    #[test]
    fn archive_token_needs_hash_index() {
        let token = time_stamp_token(DigestAlgorithm::Sha256, &[0; 32], None);

        assert!(matches!(
            ArchiveTimeStampV3::from_token(token.clone()),
            Err(CadesError::Schema("ArchiveTimeStampV3", _))
        ));

        let stamp = ArchiveTimeStampV3::from_parts(&token, AtsHashIndex::default()).unwrap();
        assert_eq!(
            ArchiveTimeStampV3::from_token(stamp.token().clone()).unwrap(),
            stamp
        );
    }

    #[tokio::test]
    async fn rejected_time_stamp() {
        let signed_data = signed_data(b"content");
        let client = StubTimeStampClient::rejecting();
        let stamper = TimeStamper::new(&RingDigestProvider, &client);

        assert!(matches!(
            stamper.signature_time_stamp(&signed_data, 0).await,
            Err(CadesError::TimeStamp(TimeStampError::Unsuccessful(
                PkiStatus::Rejection,
                _
            )))
        ));
    }
}
