// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Hash references to certificates and revocation data (CAdES-C).

The functions in this module digest certificates, CRLs and OCSP responses
and pair the digests with the identifying data of the referenced object. They
produce the values of the `complete-certificate-references` and
`complete-revocation-references` attributes.
*/

use {
    crate::{
        algorithm::{DigestAlgorithm, DigestProvider},
        asn1::{
            common::UtcTime,
            rfc5035::{EssCertIdV2, IssuerSerial},
            rfc5126::{
                CompleteCertificateRefs, CompleteRevocationRefs, CrlIdentifier, CrlListId,
                CrlOcspRef, CrlValidatedId, OcspIdentifier, OcspListId, OcspResponsesId,
                OtherCertId, OtherHash, OtherHashAlgAndValue,
            },
            rfc5652::SignedData,
        },
        attribute::signer_info,
        certificate::{CapturedCertificate, CapturedCrl},
        values::decode_basic_ocsp_response,
        CadesError,
    },
    bcder::OctetString,
    bytes::Bytes,
    futures::future::try_join_all,
    log::debug,
};

/// Options controlling how references are computed.
#[derive(Clone, Debug)]
pub struct ReferenceOptions {
    hash_algorithm: DigestAlgorithm,
    signer_certificate: Option<CapturedCertificate>,
    ocsp_responses: Vec<Vec<u8>>,
}

impl Default for ReferenceOptions {
    fn default() -> Self {
        Self {
            hash_algorithm: DigestAlgorithm::Sha1,
            signer_certificate: None,
            ocsp_responses: vec![],
        }
    }
}

impl ReferenceOptions {
    /// Digest algorithm for the references. Defaults to SHA-1.
    pub fn hash_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// The certificate of the signer, which is never referenced.
    pub fn signer_certificate(mut self, cert: CapturedCertificate) -> Self {
        self.signer_certificate = Some(cert);
        self
    }

    /// Add a DER encoded `OCSPResponse` to reference.
    pub fn ocsp_response(mut self, response: impl Into<Vec<u8>>) -> Self {
        self.ocsp_responses.push(response.into());
        self
    }
}

/// Digest `data` into an [OtherHash].
///
/// SHA-1 uses the bare `sha1Hash` form. Any other algorithm is carried
/// explicitly with NULL parameters.
pub async fn other_hash(
    provider: &dyn DigestProvider,
    algorithm: DigestAlgorithm,
    data: &[u8],
) -> Result<OtherHash, CadesError> {
    let digest = OctetString::new(Bytes::from(provider.digest(algorithm, data).await?));

    Ok(match algorithm {
        DigestAlgorithm::Sha1 => OtherHash::Sha1Hash(digest),
        _ => OtherHash::OtherHash(OtherHashAlgAndValue {
            hash_algorithm: algorithm.algorithm_identifier_with_null(),
            hash_value: digest,
        }),
    })
}

/// Build the [OtherCertId] referencing a certificate.
pub async fn other_cert_id(
    provider: &dyn DigestProvider,
    algorithm: DigestAlgorithm,
    cert: &CapturedCertificate,
) -> Result<OtherCertId, CadesError> {
    Ok(OtherCertId {
        other_cert_hash: other_hash(provider, algorithm, cert.as_der()).await?,
        issuer_serial: Some(IssuerSerial::from_certificate(cert)),
    })
}

/// Build the [CrlValidatedId] referencing a CRL.
///
/// The identifier carries the CRL issuer, its `thisUpdate` time and, when the
/// CRL has one, its CRL number.
pub async fn crl_validated_id(
    provider: &dyn DigestProvider,
    algorithm: DigestAlgorithm,
    crl: &CapturedCrl,
) -> Result<CrlValidatedId, CadesError> {
    Ok(CrlValidatedId {
        crl_hash: other_hash(provider, algorithm, crl.as_der()).await?,
        crl_identifier: Some(CrlIdentifier {
            crl_issuer: crl.issuer().clone(),
            crl_issued_time: UtcTime::from(crl.this_update().as_datetime()),
            crl_number: crl.crl_number(),
        }),
    })
}

/// Build the [OcspResponsesId] referencing a DER encoded `OCSPResponse`.
pub async fn ocsp_responses_id(
    provider: &dyn DigestProvider,
    algorithm: DigestAlgorithm,
    response: &[u8],
) -> Result<OcspResponsesId, CadesError> {
    let basic = decode_basic_ocsp_response(response)?;

    Ok(OcspResponsesId {
        ocsp_identifier: OcspIdentifier {
            ocsp_responder_id: basic.tbs_response_data.responder_id,
            produced_at: basic.tbs_response_data.produced_at,
        },
        ocsp_rep_hash: Some(other_hash(provider, algorithm, response).await?),
    })
}

/// Build the [EssCertIdV2] identifying a signing certificate.
///
/// SHA-256 is the default algorithm and is left implicit.
pub async fn ess_cert_id_v2(
    provider: &dyn DigestProvider,
    algorithm: DigestAlgorithm,
    cert: &CapturedCertificate,
) -> Result<EssCertIdV2, CadesError> {
    let digest = provider.digest(algorithm, cert.as_der()).await?;

    Ok(EssCertIdV2 {
        hash_algorithm: match algorithm {
            DigestAlgorithm::Sha256 => None,
            _ => Some(algorithm.algorithm_identifier_with_null()),
        },
        cert_hash: OctetString::new(Bytes::from(digest)),
        issuer_serial: Some(IssuerSerial::from_certificate(cert)),
    })
}

/// Compute the `complete-certificate-references` of a signer.
///
/// Every certificate of the signed data is referenced except the signer's
/// own certificate, which must be set in `options`.
pub async fn complete_certificate_references(
    provider: &dyn DigestProvider,
    signed_data: &SignedData,
    signer_index: usize,
    options: &ReferenceOptions,
) -> Result<CompleteCertificateRefs, CadesError> {
    signer_info(signed_data, signer_index)?;

    let signer_cert = options
        .signer_certificate
        .as_ref()
        .ok_or(CadesError::MissingParameter("signerCertificate"))?;

    let certs = signed_data
        .certificates
        .iter()
        .flat_map(|set| set.certificates())
        .filter(|cert| !cert.matches(signer_cert.issuer(), signer_cert.serial_number()))
        .collect::<Vec<_>>();

    debug!(
        "referencing {} certificates with {}",
        certs.len(),
        options.hash_algorithm.name()
    );

    let ids = try_join_all(
        certs
            .into_iter()
            .map(|cert| other_cert_id(provider, options.hash_algorithm, cert)),
    )
    .await?;

    Ok(CompleteCertificateRefs::from(ids))
}

/// Compute the `complete-revocation-references` of a signer.
///
/// All CRLs of the signed data and all OCSP responses in `options` are
/// referenced from a single [CrlOcspRef]. Without any revocation data the
/// result is empty.
pub async fn complete_revocation_references(
    provider: &dyn DigestProvider,
    signed_data: &SignedData,
    signer_index: usize,
    options: &ReferenceOptions,
) -> Result<CompleteRevocationRefs, CadesError> {
    signer_info(signed_data, signer_index)?;

    let algorithm = options.hash_algorithm;
    let crls = signed_data
        .crls
        .iter()
        .flat_map(|crls| crls.crls())
        .collect::<Vec<_>>();

    debug!(
        "referencing {} CRLs and {} OCSP responses with {}",
        crls.len(),
        options.ocsp_responses.len(),
        algorithm.name()
    );

    let (crl_ids, ocsp_ids) = futures::try_join!(
        try_join_all(
            crls.into_iter()
                .map(|crl| crl_validated_id(provider, algorithm, crl))
        ),
        try_join_all(
            options
                .ocsp_responses
                .iter()
                .map(|response| ocsp_responses_id(provider, algorithm, response))
        ),
    )?;

    if crl_ids.is_empty() && ocsp_ids.is_empty() {
        return Ok(CompleteRevocationRefs::default());
    }

    Ok(CompleteRevocationRefs::from(vec![CrlOcspRef {
        crlids: if crl_ids.is_empty() {
            None
        } else {
            Some(CrlListId { crls: crl_ids })
        },
        ocspids: if ocsp_ids.is_empty() {
            None
        } else {
            Some(OcspListId {
                ocsp_responses: ocsp_ids,
            })
        },
        other_rev: None,
    }]))
}
