// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Certificate and revocation values (CAdES-X-L and Adobe archival).

use {
    crate::{
        asn1::{
            adobe::{RevocationInfoArchival, OID_ADOBE_REVOCATION_INFO_ARCHIVAL},
            rfc5126::{
                CertificateValues, RevocationValues, OID_CERTIFICATE_VALUES,
                OID_REVOCATION_VALUES,
            },
            rfc5652::{Attribute, SignedData},
            rfc6960::{BasicOcspResponse, OcspResponse},
        },
        CadesError,
    },
    bcder::Oid,
    bytes::Bytes,
    log::debug,
};

/// Decode a DER encoded `OCSPResponse` and extract its basic response.
pub(crate) fn decode_basic_ocsp_response(data: &[u8]) -> Result<BasicOcspResponse, CadesError> {
    OcspResponse::from_der(data)?
        .basic_response()?
        .ok_or_else(|| CadesError::Schema("OCSPResponse", "no basic OCSP response".to_string()))
}

/// Collect every X.509 certificate of the signed data.
pub fn certificate_values(signed_data: &SignedData) -> CertificateValues {
    let certs = signed_data
        .certificates
        .iter()
        .flat_map(|set| set.certificates())
        .cloned()
        .collect::<Vec<_>>();

    debug!("collected {} certificate values", certs.len());

    CertificateValues::from(certs)
}

/// Collect every CRL of the signed data plus the given OCSP responses.
///
/// `ocsp_responses` are DER encoded `OCSPResponse` values. Their basic
/// responses are what gets stored.
pub fn revocation_values(
    signed_data: &SignedData,
    ocsp_responses: &[Vec<u8>],
) -> Result<RevocationValues, CadesError> {
    let crls = signed_data
        .crls
        .iter()
        .flat_map(|crls| crls.crls())
        .cloned()
        .collect::<Vec<_>>();

    let ocsps = ocsp_responses
        .iter()
        .map(|data| decode_basic_ocsp_response(data))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        "collected {} CRL and {} OCSP revocation values",
        crls.len(),
        ocsps.len()
    );

    Ok(RevocationValues {
        crl_vals: if crls.is_empty() { None } else { Some(crls) },
        ocsp_vals: if ocsps.is_empty() { None } else { Some(ocsps) },
        other_rev_vals: None,
    })
}

/// Build Adobe's `RevocationInfoArchival` from the CRLs of the signed data and
/// the given OCSP responses.
///
/// OCSP responses are kept whole.
pub fn revocation_info_archival(
    signed_data: &SignedData,
    ocsp_responses: &[Vec<u8>],
) -> Result<RevocationInfoArchival, CadesError> {
    let crls = signed_data
        .crls
        .iter()
        .flat_map(|crls| crls.crls())
        .cloned()
        .collect::<Vec<_>>();

    let ocsps = ocsp_responses
        .iter()
        .map(|data| OcspResponse::from_der(data))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RevocationInfoArchival {
        crl: if crls.is_empty() { None } else { Some(crls) },
        ocsp: if ocsps.is_empty() { None } else { Some(ocsps) },
        other_rev_info: None,
    })
}

impl CertificateValues {
    /// Wrap this value as a `certificate-values` attribute.
    pub fn to_attribute(&self) -> Attribute {
        Attribute::from_values(
            Oid(Bytes::copy_from_slice(OID_CERTIFICATE_VALUES.as_ref())),
            self,
        )
    }
}

impl RevocationValues {
    /// Wrap this value as a `revocation-values` attribute.
    pub fn to_attribute(&self) -> Attribute {
        Attribute::from_values(
            Oid(Bytes::copy_from_slice(OID_REVOCATION_VALUES.as_ref())),
            self,
        )
    }
}

impl RevocationInfoArchival {
    /// Wrap this value as an Adobe revocation information archival attribute.
    pub fn to_attribute(&self) -> Attribute {
        Attribute::from_values(
            Oid(Bytes::copy_from_slice(OID_ADOBE_REVOCATION_INFO_ARCHIVAL.as_ref())),
            self,
        )
    }
}
