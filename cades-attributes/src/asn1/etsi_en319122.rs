// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ASN.1 types for archive time-stamps (ETSI EN 319 122 / TS 101 733).

use {
    crate::asn1::{common::OctetStringValues, rfc5280::AlgorithmIdentifier},
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode::{self, Values},
        ConstOid, Mode, OctetString, Oid, Tag,
    },
    std::io::Write,
};

/// Archive time-stamp v3 attribute.
///
/// 0.4.0.1733.2.4
pub const OID_ARCHIVE_TIME_STAMP_V3: ConstOid = Oid(&[4, 0, 141, 69, 2, 4]);

/// ATS hash index attribute.
///
/// 0.4.0.1733.2.5
pub const OID_ATS_HASH_INDEX: ConstOid = Oid(&[4, 0, 141, 69, 2, 5]);

/// Archive time-stamp hash index.
///
/// ```ASN.1
/// ATSHashIndex ::= SEQUENCE {
///     hashIndAlgorithm         AlgorithmIdentifier DEFAULT {algorithm id-sha256},
///     certificatesHashIndex    SEQUENCE OF OCTET STRING,
///     crlsHashIndex            SEQUENCE OF OCTET STRING,
///     unsignedAttrsHashIndex   SEQUENCE OF OCTET STRING
/// }
/// ```
///
/// A `hash_ind_algorithm` of `None` means SHA-256.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AtsHashIndex {
    pub hash_ind_algorithm: Option<AlgorithmIdentifier>,
    pub certificates_hash_index: Vec<OctetString>,
    pub crls_hash_index: Vec<OctetString>,
    pub unsigned_attrs_hash_index: Vec<OctetString>,
}

impl AtsHashIndex {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            // The optional algorithm and the hash lists are all SEQUENCEs. They
            // are told apart by the first element: an OID or an OCTET STRING.
            let mut hash_ind_algorithm = None;
            let mut lists = Vec::with_capacity(3);

            while let Some(element) = cons.take_opt_sequence(|cons| {
                if let Some(algorithm) = AlgorithmIdentifier::from_opt_sequence(cons)? {
                    Ok(Element::Algorithm(algorithm))
                } else {
                    Ok(Element::Hashes(take_hashes(cons)?))
                }
            })? {
                match element {
                    Element::Algorithm(algorithm)
                        if lists.is_empty() && hash_ind_algorithm.is_none() =>
                    {
                        hash_ind_algorithm = Some(algorithm);
                    }
                    Element::Algorithm(_) => {
                        return Err(cons.content_err("unexpected hashIndAlgorithm in ATSHashIndex"));
                    }
                    Element::Hashes(hashes) => lists.push(hashes),
                }
            }

            if lists.len() != 3 {
                return Err(cons.content_err("ATSHashIndex must have three hash lists"));
            }

            let unsigned_attrs_hash_index = lists.pop().unwrap_or_default();
            let crls_hash_index = lists.pop().unwrap_or_default();
            let certificates_hash_index = lists.pop().unwrap_or_default();

            Ok(Self {
                hash_ind_algorithm,
                certificates_hash_index,
                crls_hash_index,
                unsigned_attrs_hash_index,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.hash_ind_algorithm.as_ref().map(|alg| alg.encode_ref()),
            encode::sequence(OctetStringValues(&self.certificates_hash_index)),
            encode::sequence(OctetStringValues(&self.crls_hash_index)),
            encode::sequence(OctetStringValues(&self.unsigned_attrs_hash_index)),
        ))
    }
}

impl Values for AtsHashIndex {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

enum Element {
    Algorithm(AlgorithmIdentifier),
    Hashes(Vec<OctetString>),
}

fn take_hashes<S: Source>(
    cons: &mut Constructed<S>,
) -> Result<Vec<OctetString>, DecodeError<S::Error>> {
    let mut hashes = Vec::new();

    while let Some(hash) =
        cons.take_opt_value_if(Tag::OCTET_STRING, |content| OctetString::from_content(content))?
    {
        hashes.push(hash);
    }

    Ok(hashes)
}
