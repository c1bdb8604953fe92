// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed CAdES unsigned attributes.

use {
    crate::{
        asn1::{
            adobe::{RevocationInfoArchival, OID_ADOBE_REVOCATION_INFO_ARCHIVAL},
            etsi_en319122::{AtsHashIndex, OID_ARCHIVE_TIME_STAMP_V3, OID_ATS_HASH_INDEX},
            rfc3161::OID_TIME_STAMP_TOKEN,
            rfc5126::{
                CertificateValues, CompleteCertificateRefs, CompleteRevocationRefs,
                RevocationValues, OID_CADES_C_TIMESTAMP, OID_CERTIFICATE_VALUES,
                OID_COMPLETE_CERTIFICATE_REFERENCES, OID_COMPLETE_REVOCATION_REFERENCES,
                OID_REVOCATION_VALUES,
            },
            rfc5652::{Attribute, SignedData, SignerInfo},
        },
        time_stamp::{ArchiveTimeStampV3, CadesCTimestamp, SignatureTimeStamp},
        CadesError,
    },
    bcder::{
        decode::{Constructed, DecodeError, SliceSource},
        encode::Values,
        ConstOid, Oid,
    },
    bytes::Bytes,
    std::convert::{Infallible, TryFrom},
};

/// Obtain the signer at `index`.
pub fn signer_info(signed_data: &SignedData, index: usize) -> Result<&SignerInfo, CadesError> {
    signed_data
        .signer_infos
        .get(index)
        .ok_or(CadesError::SignerIndexOutOfRange(
            index,
            signed_data.signer_infos.len(),
        ))
}

/// Append an unsigned attribute to the signer at `index`.
pub fn add_unsigned_attribute(
    signed_data: &mut SignedData,
    index: usize,
    attribute: Attribute,
) -> Result<(), CadesError> {
    let count = signed_data.signer_infos.len();

    signed_data
        .signer_infos
        .get_mut(index)
        .ok_or(CadesError::SignerIndexOutOfRange(index, count))?
        .push_unsigned_attribute(attribute);

    Ok(())
}

/// A CAdES attribute, parsed according to its type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CadesAttribute {
    AtsHashIndex(AtsHashIndex),
    ArchiveTimeStampV3(Box<ArchiveTimeStampV3>),
    SignatureTimeStamp(SignatureTimeStamp),
    CompleteCertificateReferences(CompleteCertificateRefs),
    CompleteRevocationReferences(CompleteRevocationRefs),
    CadesCTimestamp(CadesCTimestamp),
    CertificateValues(CertificateValues),
    RevocationValues(RevocationValues),
    RevocationInfoArchival(RevocationInfoArchival),
    /// An attribute of any other type.
    Unknown(Attribute),
}

fn decode_value<T>(
    attribute: &Attribute,
    name: &'static str,
    op: impl FnOnce(&mut Constructed<SliceSource>) -> Result<T, DecodeError<Infallible>>,
) -> Result<T, CadesError> {
    attribute
        .first_value()
        .ok_or_else(|| CadesError::Schema(name, "attribute has no value".to_string()))?
        .decode(op)
        .map_err(|e| CadesError::Schema(name, format!("{}", e)))
}

fn to_attribute(oid: ConstOid, value: impl Values) -> Attribute {
    Attribute::from_values(Oid(Bytes::copy_from_slice(oid.as_ref())), value)
}

impl CadesAttribute {
    /// Parse an attribute based on its type.
    ///
    /// Attributes of an unrecognized type become [CadesAttribute::Unknown]. A
    /// recognized type whose value doesn't decode is an error.
    pub fn from_attribute(attribute: &Attribute) -> Result<Self, CadesError> {
        let typ = &attribute.typ;

        Ok(if typ == &OID_ATS_HASH_INDEX {
            Self::AtsHashIndex(decode_value(attribute, "ATSHashIndex", |cons| {
                AtsHashIndex::take_from(cons)
            })?)
        } else if typ == &OID_ARCHIVE_TIME_STAMP_V3 {
            Self::ArchiveTimeStampV3(Box::new(ArchiveTimeStampV3::from_attribute(attribute)?))
        } else if typ == &OID_TIME_STAMP_TOKEN {
            Self::SignatureTimeStamp(SignatureTimeStamp::from_attribute(attribute)?)
        } else if typ == &OID_COMPLETE_CERTIFICATE_REFERENCES {
            Self::CompleteCertificateReferences(decode_value(
                attribute,
                "CompleteCertificateRefs",
                |cons| CompleteCertificateRefs::take_from(cons),
            )?)
        } else if typ == &OID_COMPLETE_REVOCATION_REFERENCES {
            Self::CompleteRevocationReferences(decode_value(
                attribute,
                "CompleteRevocationRefs",
                |cons| CompleteRevocationRefs::take_from(cons),
            )?)
        } else if typ == &OID_CADES_C_TIMESTAMP {
            Self::CadesCTimestamp(CadesCTimestamp::from_attribute(attribute)?)
        } else if typ == &OID_CERTIFICATE_VALUES {
            Self::CertificateValues(decode_value(attribute, "CertificateValues", |cons| {
                CertificateValues::take_from(cons)
            })?)
        } else if typ == &OID_REVOCATION_VALUES {
            Self::RevocationValues(decode_value(attribute, "RevocationValues", |cons| {
                RevocationValues::take_from(cons)
            })?)
        } else if typ == &OID_ADOBE_REVOCATION_INFO_ARCHIVAL {
            Self::RevocationInfoArchival(decode_value(
                attribute,
                "RevocationInfoArchival",
                |cons| RevocationInfoArchival::take_from(cons),
            )?)
        } else {
            Self::Unknown(attribute.clone())
        })
    }

    /// The attribute type.
    pub fn oid(&self) -> Oid {
        let oid = match self {
            Self::AtsHashIndex(_) => OID_ATS_HASH_INDEX,
            Self::ArchiveTimeStampV3(_) => OID_ARCHIVE_TIME_STAMP_V3,
            Self::SignatureTimeStamp(_) => OID_TIME_STAMP_TOKEN,
            Self::CompleteCertificateReferences(_) => OID_COMPLETE_CERTIFICATE_REFERENCES,
            Self::CompleteRevocationReferences(_) => OID_COMPLETE_REVOCATION_REFERENCES,
            Self::CadesCTimestamp(_) => OID_CADES_C_TIMESTAMP,
            Self::CertificateValues(_) => OID_CERTIFICATE_VALUES,
            Self::RevocationValues(_) => OID_REVOCATION_VALUES,
            Self::RevocationInfoArchival(_) => OID_ADOBE_REVOCATION_INFO_ARCHIVAL,
            Self::Unknown(attribute) => return attribute.typ.clone(),
        };

        Oid(Bytes::copy_from_slice(oid.as_ref()))
    }

    /// Encode back into a generic attribute.
    pub fn to_attribute(&self) -> Attribute {
        match self {
            Self::AtsHashIndex(v) => to_attribute(OID_ATS_HASH_INDEX, v),
            Self::ArchiveTimeStampV3(v) => v.to_attribute(),
            Self::SignatureTimeStamp(v) => v.to_attribute(),
            Self::CompleteCertificateReferences(v) => {
                to_attribute(OID_COMPLETE_CERTIFICATE_REFERENCES, v)
            }
            Self::CompleteRevocationReferences(v) => {
                to_attribute(OID_COMPLETE_REVOCATION_REFERENCES, v)
            }
            Self::CadesCTimestamp(v) => v.to_attribute(),
            Self::CertificateValues(v) => v.to_attribute(),
            Self::RevocationValues(v) => v.to_attribute(),
            Self::RevocationInfoArchival(v) => v.to_attribute(),
            Self::Unknown(attribute) => attribute.clone(),
        }
    }
}

impl TryFrom<&Attribute> for CadesAttribute {
    type Error = CadesError;

    fn try_from(attribute: &Attribute) -> Result<Self, Self::Error> {
        Self::from_attribute(attribute)
    }
}

impl CompleteCertificateRefs {
    /// Wrap this value as a `complete-certificate-references` attribute.
    pub fn to_attribute(&self) -> Attribute {
        to_attribute(OID_COMPLETE_CERTIFICATE_REFERENCES, self)
    }
}

impl CompleteRevocationRefs {
    /// Wrap this value as a `complete-revocation-references` attribute.
    pub fn to_attribute(&self) -> Attribute {
        to_attribute(OID_COMPLETE_REVOCATION_REFERENCES, self)
    }
}
