// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! CAdES Extended Validation Attributes in Pure Rust

This crate implements the unsigned attributes that extend a CMS
(RFC 5652) signature into the long-term CAdES forms defined by
[RFC 5126](https://tools.ietf.org/rfc/rfc5126.txt) and ETSI EN 319 122-1.

Functionality includes:

* (De)serialization of the ASN.1 structures CAdES attributes are made of,
  plus the CMS, X.509, OCSP and Time-Stamp Protocol structures they embed.
  See [asn1].
* Computing the digests covered by `signature-time-stamp`,
  `CAdES-C-Timestamp` and `archive-time-stamp-v3` attributes and filling the
  `ATSHashIndex` of an archive time-stamp. See [time_stamp].
* Building `complete-certificate-references` and
  `complete-revocation-references` from the certificates and revocation data
  of a signed message. See [references].
* Building `certificate-values`, `revocation-values` and Adobe's
  revocation information archival attribute. See [values].
* Parsing any unsigned attribute into a typed [CadesAttribute].
* An RFC 3161 client obtaining time-stamp tokens over HTTP. See
  [time_stamp_protocol].
* The signed attributes of a CAdES-BES signature. See [signed_attributes].

# Technical Notes

Digests go through the [DigestProvider] trait and time-stamp tokens come from
the [TimeStampClient] trait. Both are async so implementations can call out
to hardware or remote services. [RingDigestProvider] and
[HttpTimeStampClient] are the stock implementations.

Everything here operates on parsed [SignedData]. Attributes are appended to a
signer's unsigned attributes in the order they are produced, and the digests
computed for later attributes depend on the exact bytes of earlier ones. So
the usual sequence is:

1. `signature-time-stamp`
2. `complete-certificate-references` and `complete-revocation-references`
3. `CAdES-C-Timestamp`
4. `certificate-values` and `revocation-values`
5. `archive-time-stamp-v3`

Nothing in this crate verifies signatures, certificate chains or revocation
status. Callers are responsible for validating what they archive.
*/

pub mod algorithm;
pub mod asn1;
pub mod attribute;
pub mod certificate;
pub mod references;
pub mod signed_attributes;
pub mod time_stamp;
pub mod time_stamp_protocol;
pub mod values;

#[cfg(test)]
mod testutil;

pub use {
    algorithm::{DigestAlgorithm, DigestProvider, RingDigestProvider},
    asn1::rfc5652::{Attribute, SignedData, SignerInfo},
    attribute::{add_unsigned_attribute, signer_info, CadesAttribute},
    bcder::Oid,
    bytes::Bytes,
    certificate::{CapturedCertificate, CapturedCrl},
    references::{
        complete_certificate_references, complete_revocation_references, ReferenceOptions,
    },
    signed_attributes::CommonAttributesBuilder,
    time_stamp::{ArchiveTimeStampV3, CadesCTimestamp, SignatureTimeStamp, TimeStamper},
    time_stamp_protocol::{
        HttpTimeStampClient, TimeStampClient, TimeStampError, TimeStampResponse,
    },
    values::{certificate_values, revocation_info_archival, revocation_values},
};

use {bcder::decode::DecodeError, std::convert::Infallible, thiserror::Error};

/// Unified error type for CAdES attribute handling.
#[derive(Debug, Error)]
pub enum CadesError {
    /// ASN.1 data did not decode.
    #[error("ASN.1 decode error: {0}")]
    Decode(DecodeError<Infallible>),

    /// A structure decoded but its content is not what it should be.
    #[error("malformed {0}: {1}")]
    Schema(&'static str, String),

    /// A value needed to build an attribute is absent.
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("signer index {0} out of range; signed data has {1} signers")]
    SignerIndexOutOfRange(usize, usize),

    /// An attribute of one type was given where another was required.
    #[error("expected {expected} attribute; got {actual}")]
    UnexpectedAttribute {
        expected: &'static str,
        actual: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("time-stamp error: {0}")]
    TimeStamp(#[from] TimeStampError),
}

impl From<DecodeError<Infallible>> for CadesError {
    fn from(e: DecodeError<Infallible>) -> Self {
        Self::Decode(e)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            asn1::{
                etsi_en319122::OID_ARCHIVE_TIME_STAMP_V3, rfc3161::OID_TIME_STAMP_TOKEN,
                rfc5126::OID_CADES_C_TIMESTAMP,
                rfc5652::{CertificateChoices, CertificateSet},
            },
            testutil::*,
        },
    };

    /// Digest a signature and the DER of the attributes following it.
    fn cades_c_digest(signature: &[u8], attributes: &[&Attribute]) -> Vec<u8> {
        let mut buffer = signature.to_vec();
        for attribute in attributes {
            buffer.extend(attribute.to_der().unwrap());
        }

        DigestAlgorithm::Sha256.digest(&buffer)
    }

    #[tokio::test]
    async fn extend_to_archival_form() {
        let provider = RingDigestProvider;
        let client = StubTimeStampClient::default();
        let stamper = TimeStamper::new(&provider, &client);
        let ocsp = ocsp_response_der("Responder", 2);

        let mut signed_data = signed_data(b"hello, world");

        let signature_time_stamp = stamper
            .signature_time_stamp(&signed_data, 0)
            .await
            .unwrap()
            .to_attribute();
        add_unsigned_attribute(&mut signed_data, 0, signature_time_stamp.clone()).unwrap();

        let options = ReferenceOptions::default()
            .signer_certificate(signer_certificate())
            .ocsp_response(ocsp.clone());

        let certificate_references =
            complete_certificate_references(&provider, &signed_data, 0, &options)
                .await
                .unwrap();
        assert_eq!(certificate_references.len(), 1);
        let certificate_references = certificate_references.to_attribute();

        let revocation_references =
            complete_revocation_references(&provider, &signed_data, 0, &options)
                .await
                .unwrap()
                .to_attribute();

        add_unsigned_attribute(&mut signed_data, 0, certificate_references.clone()).unwrap();
        add_unsigned_attribute(&mut signed_data, 0, revocation_references.clone()).unwrap();

        let c_timestamp = stamper
            .cades_c_timestamp(
                &signed_data,
                0,
                &signature_time_stamp,
                &certificate_references,
                &revocation_references,
            )
            .await
            .unwrap();
        add_unsigned_attribute(&mut signed_data, 0, c_timestamp.to_attribute()).unwrap();

        let certificates = certificate_values(&signed_data);
        assert_eq!(certificates.len(), 2);
        add_unsigned_attribute(&mut signed_data, 0, certificates.to_attribute()).unwrap();

        let revocations = revocation_values(&signed_data, &[ocsp]).unwrap();
        add_unsigned_attribute(&mut signed_data, 0, revocations.to_attribute()).unwrap();

        let archive = stamper
            .archive_time_stamp_v3(&signed_data, 0, None)
            .await
            .unwrap();
        let hash_index = archive.hash_index();
        assert!(hash_index.hash_ind_algorithm.is_none());
        assert_eq!(hash_index.certificates_hash_index.len(), 2);
        assert_eq!(hash_index.crls_hash_index.len(), 1);
        assert_eq!(hash_index.unsigned_attrs_hash_index.len(), 6);
        assert_eq!(
            hash_index.unsigned_attrs_hash_index[0].to_bytes().as_ref(),
            DigestAlgorithm::Sha256
                .digest(&signature_time_stamp.to_der().unwrap())
                .as_slice()
        );
        add_unsigned_attribute(&mut signed_data, 0, archive.to_attribute()).unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].0, DigestAlgorithm::Sha256);
        assert_eq!(requests[0].1, DigestAlgorithm::Sha256.digest(&[0x42; 64]));
        assert_eq!(
            requests[1].1,
            cades_c_digest(
                &[0x42; 64],
                &[
                    &signature_time_stamp,
                    &certificate_references,
                    &revocation_references
                ]
            )
        );

        let signer = signer_info(&signed_data, 0).unwrap();
        let parsed = signer
            .unsigned_attributes
            .as_ref()
            .unwrap()
            .iter()
            .map(CadesAttribute::from_attribute)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(parsed.len(), 7);
        assert!(matches!(parsed[0], CadesAttribute::SignatureTimeStamp(_)));
        assert!(matches!(
            parsed[1],
            CadesAttribute::CompleteCertificateReferences(_)
        ));
        assert!(matches!(
            parsed[2],
            CadesAttribute::CompleteRevocationReferences(_)
        ));
        assert!(matches!(parsed[3], CadesAttribute::CadesCTimestamp(_)));
        assert!(matches!(parsed[4], CadesAttribute::CertificateValues(_)));
        assert!(matches!(parsed[5], CadesAttribute::RevocationValues(_)));
        assert!(matches!(
            &parsed[6],
            CadesAttribute::ArchiveTimeStampV3(stamp) if **stamp == archive
        ));

        assert_eq!(parsed[0].oid(), OID_TIME_STAMP_TOKEN);
        assert_eq!(parsed[3].oid(), OID_CADES_C_TIMESTAMP);
        assert_eq!(parsed[6].oid(), OID_ARCHIVE_TIME_STAMP_V3);

        // The whole structure survives a trip through DER.
        let der = signed_data.to_content_info_der().unwrap();
        let reparsed = SignedData::decode_der(&der).unwrap();
        assert_eq!(
            reparsed.signer_infos[0].unsigned_attributes,
            signed_data.signer_infos[0].unsigned_attributes
        );
    }

    #[tokio::test]
    async fn extend_decoded_signer_only_message() {
        let provider = RingDigestProvider;
        let client = StubTimeStampClient::default();
        let stamper = TimeStamper::new(&provider, &client);

        let mut original = signed_data(b"signed by a lone certificate");
        original.certificates = Some(CertificateSet::from(vec![
            CertificateChoices::Certificate(Box::new(signer_certificate())),
        ]));
        let der = original.to_content_info_der().unwrap();
        let mut signed_data = SignedData::decode_der(&der).unwrap();

        let signature_time_stamp = stamper
            .signature_time_stamp(&signed_data, 0)
            .await
            .unwrap()
            .to_attribute();
        add_unsigned_attribute(&mut signed_data, 0, signature_time_stamp.clone()).unwrap();

        let options = ReferenceOptions::default().signer_certificate(signer_certificate());
        let certificate_references =
            complete_certificate_references(&provider, &signed_data, 0, &options)
                .await
                .unwrap();
        assert!(certificate_references.is_empty());
        let certificate_references = certificate_references.to_attribute();

        let revocation_references =
            complete_revocation_references(&provider, &signed_data, 0, &options)
                .await
                .unwrap();
        assert_eq!(revocation_references.len(), 1);
        let revocation_references = revocation_references.to_attribute();

        add_unsigned_attribute(&mut signed_data, 0, certificate_references.clone()).unwrap();
        add_unsigned_attribute(&mut signed_data, 0, revocation_references.clone()).unwrap();

        let c_timestamp = stamper
            .cades_c_timestamp(
                &signed_data,
                0,
                &signature_time_stamp,
                &certificate_references,
                &revocation_references,
            )
            .await
            .unwrap();
        add_unsigned_attribute(&mut signed_data, 0, c_timestamp.to_attribute()).unwrap();

        let archive = stamper
            .archive_time_stamp_v3(&signed_data, 0, None)
            .await
            .unwrap();
        let hash_index = archive.hash_index();
        assert_eq!(hash_index.certificates_hash_index.len(), 1);
        assert_eq!(
            hash_index.certificates_hash_index[0].to_bytes().as_ref(),
            DigestAlgorithm::Sha256
                .digest(signer_certificate().as_der())
                .as_slice()
        );
        assert_eq!(hash_index.crls_hash_index.len(), 1);
        assert_eq!(hash_index.unsigned_attrs_hash_index.len(), 4);
        add_unsigned_attribute(&mut signed_data, 0, archive.to_attribute()).unwrap();

        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests[1].1,
            cades_c_digest(
                &[0x42; 64],
                &[
                    &signature_time_stamp,
                    &certificate_references,
                    &revocation_references
                ]
            )
        );

        // The extended message encodes and decodes again.
        let der = signed_data.to_content_info_der().unwrap();
        let reparsed = SignedData::decode_der(&der).unwrap();
        assert_eq!(
            reparsed.signer_infos[0]
                .unsigned_attributes
                .as_ref()
                .unwrap()
                .len(),
            5
        );
    }
}
