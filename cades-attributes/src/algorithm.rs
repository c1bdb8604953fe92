// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Digest algorithms and digest computation.

Digesting goes through the [DigestProvider] trait so the builders in this
crate can be driven by any digest implementation. [RingDigestProvider] is the
default, backed by `ring`.
*/

use {
    crate::{asn1::rfc5280::AlgorithmIdentifier, CadesError},
    async_trait::async_trait,
    bcder::{ConstOid, Oid},
    bytes::Bytes,
    futures::future::try_join_all,
    ring::digest,
    std::{convert::TryFrom, str::FromStr},
};

/// SHA-1 digest algorithm.
///
/// 1.3.14.3.2.26
pub const OID_SHA1: ConstOid = Oid(&[43, 14, 3, 2, 26]);

/// SHA-256 digest algorithm.
///
/// 2.16.840.1.101.3.4.2.1
pub const OID_SHA256: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 1]);

/// SHA-384 digest algorithm.
///
/// 2.16.840.1.101.3.4.2.2
pub const OID_SHA384: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 2]);

/// SHA-512 digest algorithm.
///
/// 2.16.840.1.101.3.4.2.3
pub const OID_SHA512: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 3]);

/// A hashing algorithm used for digesting data.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DigestAlgorithm {
    /// SHA-1.
    ///
    /// Corresponds to OID 1.3.14.3.2.26. The default for CAdES-C references.
    Sha1,

    /// SHA-256.
    ///
    /// Corresponds to OID 2.16.840.1.101.3.4.2.1.
    Sha256,

    /// SHA-384.
    ///
    /// Corresponds to OID 2.16.840.1.101.3.4.2.2.
    Sha384,

    /// SHA-512.
    ///
    /// Corresponds to OID 2.16.840.1.101.3.4.2.3.
    Sha512,
}

impl DigestAlgorithm {
    /// The canonical name of this algorithm (e.g. `SHA-256`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Obtain an object that can be used to digest content using this algorithm.
    pub fn digester(&self) -> digest::Context {
        digest::Context::new(match self {
            Self::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            Self::Sha256 => &digest::SHA256,
            Self::Sha384 => &digest::SHA384,
            Self::Sha512 => &digest::SHA512,
        })
    }

    /// Digest a buffer in one shot.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        let mut h = self.digester();
        h.update(data);

        h.finish().as_ref().to_vec()
    }

    /// The algorithm identifier with explicit NULL parameters.
    ///
    /// This is the form CAdES uses inside `OtherHashAlgAndValue` and
    /// `ESSCertIDv2`.
    pub fn algorithm_identifier_with_null(&self) -> AlgorithmIdentifier {
        AlgorithmIdentifier::with_null_parameters((*self).into())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = CadesError;

    /// Resolve an algorithm by name.
    ///
    /// Matching ignores case and dashes, so `SHA-256`, `sha256` and `Sha-256`
    /// are all SHA-256.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('-', "").to_ascii_lowercase();

        match normalized.as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(CadesError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl From<DigestAlgorithm> for Oid {
    fn from(alg: DigestAlgorithm) -> Self {
        Oid(Bytes::copy_from_slice(
            match alg {
                DigestAlgorithm::Sha1 => OID_SHA1,
                DigestAlgorithm::Sha256 => OID_SHA256,
                DigestAlgorithm::Sha384 => OID_SHA384,
                DigestAlgorithm::Sha512 => OID_SHA512,
            }
            .as_ref(),
        ))
    }
}

impl TryFrom<&Oid> for DigestAlgorithm {
    type Error = CadesError;

    fn try_from(v: &Oid) -> Result<Self, Self::Error> {
        if v == &OID_SHA1 {
            Ok(Self::Sha1)
        } else if v == &OID_SHA256 {
            Ok(Self::Sha256)
        } else if v == &OID_SHA384 {
            Ok(Self::Sha384)
        } else if v == &OID_SHA512 {
            Ok(Self::Sha512)
        } else {
            Err(CadesError::UnsupportedAlgorithm(format!("{}", v)))
        }
    }
}

impl TryFrom<&AlgorithmIdentifier> for DigestAlgorithm {
    type Error = CadesError;

    fn try_from(v: &AlgorithmIdentifier) -> Result<Self, Self::Error> {
        Self::try_from(&v.algorithm)
    }
}

impl From<DigestAlgorithm> for AlgorithmIdentifier {
    fn from(alg: DigestAlgorithm) -> Self {
        Self::new(alg.into())
    }
}

/// Resolve the OID of a digest algorithm given its name.
pub fn oid_for_algorithm(name: &str) -> Result<Oid, CadesError> {
    Ok(DigestAlgorithm::from_str(name)?.into())
}

/// Resolve the name of a digest algorithm given its OID.
pub fn algorithm_for_oid(oid: &Oid) -> Result<&'static str, CadesError> {
    Ok(DigestAlgorithm::try_from(oid)?.name())
}

/// Something that computes digests.
#[async_trait]
pub trait DigestProvider: Send + Sync {
    /// Digest `data` with `algorithm`.
    async fn digest(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Result<Vec<u8>, CadesError>;
}

/// [DigestProvider] backed by `ring`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RingDigestProvider;

#[async_trait]
impl DigestProvider for RingDigestProvider {
    async fn digest(&self, algorithm: DigestAlgorithm, data: &[u8]) -> Result<Vec<u8>, CadesError> {
        Ok(algorithm.digest(data))
    }
}

/// Digest several buffers concurrently.
///
/// Results are in the order of `buffers`.
pub async fn digest_all<B: AsRef<[u8]>>(
    provider: &dyn DigestProvider,
    algorithm: DigestAlgorithm,
    buffers: &[B],
) -> Result<Vec<Vec<u8>>, CadesError> {
    try_join_all(
        buffers
            .iter()
            .map(|buffer| provider.digest(algorithm, buffer.as_ref())),
    )
    .await
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_resolve() {
        assert_eq!(
            DigestAlgorithm::from_str("SHA-1").unwrap(),
            DigestAlgorithm::Sha1
        );
        assert_eq!(
            DigestAlgorithm::from_str("sha256").unwrap(),
            DigestAlgorithm::Sha256
        );
        assert_eq!(
            DigestAlgorithm::from_str("Sha-384").unwrap(),
            DigestAlgorithm::Sha384
        );
        assert_eq!(
            DigestAlgorithm::from_str("SHA512").unwrap(),
            DigestAlgorithm::Sha512
        );
        assert!(matches!(
            DigestAlgorithm::from_str("MD5"),
            Err(CadesError::UnsupportedAlgorithm(name)) if name == "MD5"
        ));
    }

    #[test]
    fn oid_lookup() {
        for alg in [
            DigestAlgorithm::Sha1,
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha384,
            DigestAlgorithm::Sha512,
        ] {
            let oid = oid_for_algorithm(alg.name()).unwrap();
            assert_eq!(algorithm_for_oid(&oid).unwrap(), alg.name());
            assert_eq!(DigestAlgorithm::try_from(&oid).unwrap(), alg);
        }

        assert_eq!(Oid::from(DigestAlgorithm::Sha1), OID_SHA1);
        assert!(algorithm_for_oid(&Oid(Bytes::from_static(&[42, 3, 4]))).is_err());
    }

    #[test]
    fn algorithm_identifiers() {
        let plain = AlgorithmIdentifier::from(DigestAlgorithm::Sha256);
        assert!(plain.parameters.is_none());

        let null = DigestAlgorithm::Sha512.algorithm_identifier_with_null();
        assert!(null.parameters.as_ref().unwrap().is_null());
        assert_eq!(
            DigestAlgorithm::try_from(&null).unwrap(),
            DigestAlgorithm::Sha512
        );
    }

    #[test]
    fn digest_lengths() {
        assert_eq!(DigestAlgorithm::Sha1.digest(b"abc").len(), 20);
        assert_eq!(DigestAlgorithm::Sha256.digest(b"abc").len(), 32);
        assert_eq!(DigestAlgorithm::Sha384.digest(b"abc").len(), 48);
        assert_eq!(DigestAlgorithm::Sha512.digest(b"abc").len(), 64);

        assert_eq!(
            hex::encode(DigestAlgorithm::Sha256.digest(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn concurrent_digests_keep_order() {
        let buffers = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];

        let digests = digest_all(&RingDigestProvider, DigestAlgorithm::Sha1, &buffers)
            .await
            .unwrap();

        assert_eq!(digests.len(), 3);
        for (buffer, digest) in buffers.iter().zip(digests.iter()) {
            assert_eq!(digest, &DigestAlgorithm::Sha1.digest(buffer));
        }
    }
}
