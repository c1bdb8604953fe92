// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Signed attributes of a CAdES-BES signature.

use {
    crate::{
        algorithm::{DigestAlgorithm, DigestProvider},
        asn1::{
            common::UtcTime,
            rfc2634::{ContentHints, OID_CONTENT_HINTS},
            rfc5035::{SigningCertificateV2, OID_SIGNING_CERTIFICATE_V2},
            rfc5126::{
                CommitmentTypeIndication, SignaturePolicyIdentifier, SignerLocation,
                OID_COMMITMENT_TYPE_INDICATION, OID_SIGNATURE_POLICY_IDENTIFIER,
                OID_SIGNER_LOCATION,
            },
            rfc5652::{
                Attribute, SignedAttributes, OID_CONTENT_TYPE, OID_ID_DATA, OID_MESSAGE_DIGEST,
                OID_SIGNING_TIME,
            },
        },
        certificate::CapturedCertificate,
        references::ess_cert_id_v2,
        CadesError,
    },
    bcder::{
        encode::{PrimitiveContent, Values},
        ConstOid, OctetString, Oid,
    },
    bytes::Bytes,
    log::debug,
};

fn attribute(oid: ConstOid, value: impl Values) -> Attribute {
    Attribute::from_values(Oid(Bytes::copy_from_slice(oid.as_ref())), value)
}

/// Builds the signed attributes every CAdES-BES signer carries.
///
/// The built set holds `content-type`, `signing-time`, `message-digest` and
/// `signing-certificate-v2`, followed by whichever optional attributes were
/// configured.
#[derive(Clone, Debug)]
pub struct CommonAttributesBuilder {
    signer_certificate: CapturedCertificate,
    content_type: Oid,
    signing_time: Option<UtcTime>,
    certificate_hash_algorithm: DigestAlgorithm,
    signature_policy: Option<SignaturePolicyIdentifier>,
    commitment_type_indication: Option<CommitmentTypeIndication>,
    signer_location: Option<SignerLocation>,
    content_hints: Option<ContentHints>,
}

impl CommonAttributesBuilder {
    /// Construct an instance for the given signing certificate.
    pub fn new(signer_certificate: CapturedCertificate) -> Self {
        Self {
            signer_certificate,
            content_type: Oid(Bytes::copy_from_slice(OID_ID_DATA.as_ref())),
            signing_time: None,
            certificate_hash_algorithm: DigestAlgorithm::Sha256,
            signature_policy: None,
            commitment_type_indication: None,
            signer_location: None,
            content_hints: None,
        }
    }

    /// Set the content type of the signed content. Defaults to `id-data`.
    pub fn content_type(mut self, oid: Oid) -> Self {
        self.content_type = oid;
        self
    }

    /// Set the signing time. Defaults to the time [Self::build] runs.
    pub fn signing_time(mut self, time: UtcTime) -> Self {
        self.signing_time = Some(time);
        self
    }

    /// Set the algorithm hashing the signer certificate. Defaults to SHA-256.
    pub fn certificate_hash_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.certificate_hash_algorithm = algorithm;
        self
    }

    pub fn signature_policy(mut self, policy: SignaturePolicyIdentifier) -> Self {
        self.signature_policy = Some(policy);
        self
    }

    pub fn commitment_type_indication(mut self, indication: CommitmentTypeIndication) -> Self {
        self.commitment_type_indication = Some(indication);
        self
    }

    pub fn signer_location(mut self, location: SignerLocation) -> Self {
        self.signer_location = Some(location);
        self
    }

    pub fn content_hints(mut self, hints: ContentHints) -> Self {
        self.content_hints = Some(hints);
        self
    }

    /// Build the signed attributes over `content`.
    ///
    /// `digest_algorithm` is the signer's digest algorithm and produces the
    /// `message-digest` value.
    pub async fn build(
        &self,
        provider: &dyn DigestProvider,
        digest_algorithm: DigestAlgorithm,
        content: &[u8],
    ) -> Result<SignedAttributes, CadesError> {
        let message_digest = provider.digest(digest_algorithm, content).await?;
        let cert_id = ess_cert_id_v2(
            provider,
            self.certificate_hash_algorithm,
            &self.signer_certificate,
        )
        .await?;

        let signing_time = self.signing_time.clone().unwrap_or_else(UtcTime::now);

        let mut attributes = vec![
            attribute(OID_CONTENT_TYPE, self.content_type.encode_ref()),
            attribute(OID_SIGNING_TIME, signing_time.encode_ref()),
            attribute(
                OID_MESSAGE_DIGEST,
                OctetString::new(Bytes::from(message_digest)).encode(),
            ),
            attribute(
                OID_SIGNING_CERTIFICATE_V2,
                SigningCertificateV2 {
                    certs: vec![cert_id],
                    policies: None,
                },
            ),
        ];

        if let Some(policy) = &self.signature_policy {
            attributes.push(attribute(OID_SIGNATURE_POLICY_IDENTIFIER, policy));
        }
        if let Some(indication) = &self.commitment_type_indication {
            attributes.push(attribute(OID_COMMITMENT_TYPE_INDICATION, indication));
        }
        if let Some(location) = &self.signer_location {
            attributes.push(attribute(OID_SIGNER_LOCATION, location));
        }
        if let Some(hints) = &self.content_hints {
            attributes.push(attribute(OID_CONTENT_HINTS, hints));
        }

        debug!(
            "built {} signed attributes for signing time {}",
            attributes.len(),
            signing_time
        );

        Ok(SignedAttributes::from(attributes))
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{
            algorithm::RingDigestProvider,
            asn1::{rfc5035::IssuerSerial, rfc5126::OID_CTI_PROOF_OF_ORIGIN},
            testutil::*,
        },
    };

    #[tokio::test]
    async fn default_attributes() {
        let time = UtcTime::parse(b"220315101500Z").unwrap();

        let attributes = CommonAttributesBuilder::new(signer_certificate())
            .signing_time(time.clone())
            .build(&RingDigestProvider, DigestAlgorithm::Sha256, b"hello")
            .await
            .unwrap();

        let types = attributes
            .iter()
            .map(|attr| attr.typ.clone())
            .collect::<Vec<_>>();
        assert_eq!(types.len(), 4);
        assert_eq!(types[0], OID_CONTENT_TYPE);
        assert_eq!(types[1], OID_SIGNING_TIME);
        assert_eq!(types[2], OID_MESSAGE_DIGEST);
        assert_eq!(types[3], OID_SIGNING_CERTIFICATE_V2);

        let content_type = attributes[0].values[0]
            .decode(|cons| Oid::take_from(cons))
            .unwrap();
        assert_eq!(content_type, OID_ID_DATA);

        let signing_time = attributes[1].values[0]
            .decode(|cons| UtcTime::take_from(cons))
            .unwrap();
        assert_eq!(signing_time, time);

        let digest = attributes[2].values[0]
            .decode(|cons| OctetString::take_from(cons))
            .unwrap();
        assert_eq!(
            digest.to_bytes().as_ref(),
            DigestAlgorithm::Sha256.digest(b"hello").as_slice()
        );

        let signing_cert = attributes[3].values[0]
            .decode(|cons| SigningCertificateV2::take_from(cons))
            .unwrap();
        assert_eq!(signing_cert.certs.len(), 1);
        let cert_id = &signing_cert.certs[0];
        assert!(cert_id.hash_algorithm.is_none());
        assert_eq!(
            cert_id.cert_hash.to_bytes().as_ref(),
            DigestAlgorithm::Sha256
                .digest(signer_certificate().as_der())
                .as_slice()
        );
        assert_eq!(
            cert_id.issuer_serial,
            Some(IssuerSerial::from_certificate(&signer_certificate()))
        );
    }

    #[tokio::test]
    async fn optional_attributes() {
        let policy = SignaturePolicyIdentifier::SignaturePolicyImplied;
        let indication = CommitmentTypeIndication {
            commitment_type_id: Oid(Bytes::copy_from_slice(OID_CTI_PROOF_OF_ORIGIN.as_ref())),
            commitment_type_qualifier: None,
        };

        let attributes = CommonAttributesBuilder::new(signer_certificate())
            .content_type(Oid(Bytes::from_static(&[42, 3, 4])))
            .certificate_hash_algorithm(DigestAlgorithm::Sha512)
            .signature_policy(policy.clone())
            .commitment_type_indication(indication.clone())
            .signer_location(SignerLocation::default())
            .build(&RingDigestProvider, DigestAlgorithm::Sha384, b"hello")
            .await
            .unwrap();

        assert_eq!(attributes.len(), 7);
        assert_eq!(attributes[4].typ, OID_SIGNATURE_POLICY_IDENTIFIER);
        assert_eq!(attributes[5].typ, OID_COMMITMENT_TYPE_INDICATION);
        assert_eq!(attributes[6].typ, OID_SIGNER_LOCATION);

        let content_type = attributes[0].values[0]
            .decode(|cons| Oid::take_from(cons))
            .unwrap();
        assert_eq!(content_type, Oid(Bytes::from_static(&[42, 3, 4])));

        let digest = attributes[2].values[0]
            .decode(|cons| OctetString::take_from(cons))
            .unwrap();
        assert_eq!(digest.to_bytes().len(), 48);

        let signing_cert = attributes[3].values[0]
            .decode(|cons| SigningCertificateV2::take_from(cons))
            .unwrap();
        assert_eq!(
            signing_cert.certs[0].hash_algorithm,
            Some(DigestAlgorithm::Sha512.algorithm_identifier_with_null())
        );
        assert_eq!(signing_cert.certs[0].cert_hash.to_bytes().len(), 64);

        assert_eq!(
            attributes[4].values[0]
                .decode(|cons| SignaturePolicyIdentifier::take_from(cons))
                .unwrap(),
            policy
        );
        assert_eq!(
            attributes[5].values[0]
                .decode(|cons| CommitmentTypeIndication::take_from(cons))
                .unwrap(),
            indication
        );
    }
}
