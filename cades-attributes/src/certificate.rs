// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Certificates and CRLs paired with their original encoding.

CAdES references digest the exact bytes of certificates and CRLs. Re-encoding
a parsed value isn't guaranteed to reproduce them, so the types in this module
hold on to the captured encoding and serialize from it.
*/

use {
    crate::{
        asn1::{
            common::Time,
            rfc3280::Name,
            rfc5280::{Certificate, CertificateList},
            rfc5652::IssuerAndSerialNumber,
        },
        CadesError,
    },
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode::Values,
        Captured, Integer, Mode,
    },
    std::io::Write,
};

/// An X.509 certificate and the bytes it was parsed from.
#[derive(Clone, Debug)]
pub struct CapturedCertificate {
    captured: Captured,
    inner: Certificate,
}

impl CapturedCertificate {
    /// Parse a certificate from DER bytes.
    pub fn from_der(data: &[u8]) -> Result<Self, CadesError> {
        Ok(Constructed::decode(data, Mode::Der, |cons| Self::take_from(cons))?)
    }

    /// Construct an instance by encoding a parsed certificate.
    pub fn from_parsed(certificate: Certificate) -> Self {
        Self {
            captured: Captured::from_values(Mode::Der, certificate.encode_ref()),
            inner: certificate,
        }
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match Self::take_opt_from(cons)? {
            Some(cert) => Ok(cert),
            None => Err(cons.content_err("expected Certificate")),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        let mut inner = None;

        let captured = cons.capture(|cons| {
            inner = Certificate::take_opt_from(cons)?;

            Ok(())
        })?;

        Ok(inner.map(|inner| Self { captured, inner }))
    }

    /// The parsed certificate.
    pub fn certificate(&self) -> &Certificate {
        &self.inner
    }

    pub fn serial_number(&self) -> &Integer {
        &self.inner.tbs_certificate.serial_number
    }

    pub fn subject(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    /// Obtain the `IssuerAndSerialNumber` identifying this certificate.
    pub fn issuer_and_serial_number(&self) -> IssuerAndSerialNumber {
        IssuerAndSerialNumber {
            issuer: self.issuer().clone(),
            serial_number: self.serial_number().clone(),
        }
    }

    /// Whether this certificate has the given issuer and serial number.
    pub fn matches(&self, issuer: &Name, serial_number: &Integer) -> bool {
        self.issuer() == issuer && self.serial_number() == serial_number
    }

    /// The encoded certificate.
    pub fn as_der(&self) -> &[u8] {
        self.captured.as_slice()
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        &self.captured
    }
}

impl PartialEq for CapturedCertificate {
    fn eq(&self, other: &Self) -> bool {
        self.captured.as_slice() == other.captured.as_slice()
    }
}

impl Eq for CapturedCertificate {}

impl Values for CapturedCertificate {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.captured.encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.captured.write_encoded(mode, target)
    }
}

/// A certificate revocation list and the bytes it was parsed from.
#[derive(Clone, Debug)]
pub struct CapturedCrl {
    captured: Captured,
    inner: CertificateList,
}

impl CapturedCrl {
    pub fn from_der(data: &[u8]) -> Result<Self, CadesError> {
        Ok(Constructed::decode(data, Mode::Der, |cons| Self::take_from(cons))?)
    }

    pub fn from_parsed(crl: CertificateList) -> Self {
        Self {
            captured: Captured::from_values(Mode::Der, crl.encode_ref()),
            inner: crl,
        }
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match Self::take_opt_from(cons)? {
            Some(crl) => Ok(crl),
            None => Err(cons.content_err("expected CertificateList")),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        let mut inner = None;

        let captured = cons.capture(|cons| {
            inner = CertificateList::take_opt_from(cons)?;

            Ok(())
        })?;

        Ok(inner.map(|inner| Self { captured, inner }))
    }

    pub fn crl(&self) -> &CertificateList {
        &self.inner
    }

    pub fn issuer(&self) -> &Name {
        &self.inner.tbs_cert_list.issuer
    }

    pub fn this_update(&self) -> &Time {
        &self.inner.tbs_cert_list.this_update
    }

    pub fn crl_number(&self) -> Option<Integer> {
        self.inner.tbs_cert_list.crl_number()
    }

    pub fn as_der(&self) -> &[u8] {
        self.captured.as_slice()
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        &self.captured
    }
}

impl PartialEq for CapturedCrl {
    fn eq(&self, other: &Self) -> bool {
        self.captured.as_slice() == other.captured.as_slice()
    }
}

impl Eq for CapturedCrl {}

impl Values for CapturedCrl {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.captured.encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.captured.write_encoded(mode, target)
    }
}

#[cfg(test)]
mod test {
    use {super::*, crate::testutil::*};

    #[test]
    fn certificate_keeps_original_bytes() {
        let cert = certificate("Some Signer", "Some CA", 1234);
        let der = cert.as_der().to_vec();

        let parsed = CapturedCertificate::from_der(&der).unwrap();
        assert_eq!(parsed.as_der(), der.as_slice());
        assert_eq!(parsed.serial_number(), &Integer::from(1234u64));
        assert_eq!(parsed.issuer(), &Name::with_common_name("Some CA").unwrap());
        assert_eq!(
            parsed.subject(),
            &Name::with_common_name("Some Signer").unwrap()
        );
        assert!(parsed.matches(
            &Name::with_common_name("Some CA").unwrap(),
            &Integer::from(1234u64)
        ));
        assert!(!parsed.matches(
            &Name::with_common_name("Some CA").unwrap(),
            &Integer::from(1235u64)
        ));

        let ias = parsed.issuer_and_serial_number();
        assert_eq!(ias.serial_number, Integer::from(1234u64));
    }

    #[test]
    fn crl_accessors() {
        let crl = crl("Some CA", Some(3));
        let parsed = CapturedCrl::from_der(crl.as_der()).unwrap();

        assert_eq!(parsed, crl);
        assert_eq!(parsed.issuer(), &Name::with_common_name("Some CA").unwrap());
        assert_eq!(parsed.crl_number(), Some(Integer::from(3u64)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(CapturedCertificate::from_der(&[0x30, 0x03, 0x02, 0x01, 0x01]).is_err());
        assert!(CapturedCrl::from_der(&[0x04, 0x00]).is_err());
    }
}
