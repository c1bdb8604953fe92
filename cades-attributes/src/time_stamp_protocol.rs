// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Time-Stamp Protocol (TSP) / RFC 3161 client.

The CAdES attribute builders obtain time-stamp tokens through the
[TimeStampClient] trait. [HttpTimeStampClient] talks to a time-stamp
authority over HTTP.
*/

use {
    crate::{
        algorithm::DigestAlgorithm,
        asn1::{
            common::der_encode,
            rfc3161::{
                MessageImprint, PkiStatus, TimeStampReq, TimeStampResp, TimeStampToken, TstInfo,
                TsaPolicyId, OID_CONTENT_TYPE_TST_INFO,
            },
            rfc5652::{SignedData, OID_ID_SIGNED_DATA},
        },
    },
    async_trait::async_trait,
    bcder::{
        decode::{Constructed, DecodeError},
        Integer, Mode, OctetString,
    },
    bytes::Bytes,
    log::{info, warn},
    reqwest::{header::CONTENT_TYPE, Client, IntoUrl, Url},
    ring::rand::SecureRandom,
    std::{convert::Infallible, ops::Deref},
    thiserror::Error,
};

pub const HTTP_CONTENT_TYPE_REQUEST: &str = "application/timestamp-query";

pub const HTTP_CONTENT_TYPE_RESPONSE: &str = "application/timestamp-reply";

#[derive(Debug, Error)]
pub enum TimeStampError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("ASN.1 decode error: {0}")]
    Asn1Decode(DecodeError<Infallible>),

    #[error("bad HTTP response: {0}")]
    Http(String),

    #[error("error generating random nonce")]
    Random,

    #[error("nonce mismatch")]
    NonceMismatch,

    #[error("unsuccessful Time-Stamp Protocol response: {0:?}: {1}")]
    Unsuccessful(PkiStatus, String),

    #[error("time-stamp token is not signed data")]
    NotSignedData,
}

impl From<DecodeError<Infallible>> for TimeStampError {
    fn from(e: DecodeError<Infallible>) -> Self {
        Self::Asn1Decode(e)
    }
}

/// Decode the `SignedData` carried by a time-stamp token.
pub fn token_signed_data(token: &TimeStampToken) -> Result<SignedData, TimeStampError> {
    if token.content_type != OID_ID_SIGNED_DATA {
        return Err(TimeStampError::NotSignedData);
    }

    Ok(Constructed::decode(
        token.content.as_slice(),
        Mode::Der,
        |cons| SignedData::take_from(cons),
    )?)
}

/// Decode the `TSTInfo` encapsulated in a time-stamp token's signed data.
///
/// Returns `None` if the encapsulated content is of another type or is absent.
pub fn signed_data_tst_info(signed_data: &SignedData) -> Result<Option<TstInfo>, TimeStampError> {
    if signed_data.content_info.content_type != OID_CONTENT_TYPE_TST_INFO {
        return Ok(None);
    }

    match &signed_data.content_info.content {
        Some(content) => Ok(Some(Constructed::decode(
            content.to_bytes(),
            Mode::Der,
            |cons| TstInfo::take_from(cons),
        )?)),
        None => Ok(None),
    }
}

/// High-level interface to [TimeStampResp].
///
/// This type provides a high-level interface to the low-level ASN.1 response
/// type from a Time-Stamp Protocol request.
#[derive(Clone, Debug)]
pub struct TimeStampResponse(TimeStampResp);

impl Deref for TimeStampResponse {
    type Target = TimeStampResp;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<TimeStampResp> for TimeStampResponse {
    fn from(v: TimeStampResp) -> Self {
        Self(v)
    }
}

impl TimeStampResponse {
    /// Decode a DER encoded `TimeStampResp`.
    pub fn from_der(data: &[u8]) -> Result<Self, TimeStampError> {
        Ok(Self(Constructed::decode(data, Mode::Der, |cons| {
            TimeStampResp::take_from(cons)
        })?))
    }

    /// Whether the time stamp request was successful.
    pub fn is_success(&self) -> bool {
        matches!(
            self.0.status.status,
            PkiStatus::Granted | PkiStatus::GrantedWithMods
        )
    }

    /// Human readable status text, including failure reasons.
    pub fn status_text(&self) -> String {
        let mut parts = Vec::new();

        if let Some(text) = &self.0.status.status_string {
            parts.push(text.to_text());
        }
        if let Some(fail_info) = &self.0.status.fail_info {
            parts.extend(fail_info.names().into_iter().map(|s| s.to_string()));
        }

        parts.join("; ")
    }

    /// The time-stamp token, if the request was granted.
    ///
    /// Errors if the authority did not grant the request.
    pub fn token(&self) -> Result<Option<&TimeStampToken>, TimeStampError> {
        if !self.is_success() {
            return Err(TimeStampError::Unsuccessful(
                self.0.status.status,
                self.status_text(),
            ));
        }

        Ok(self.0.time_stamp_token.as_ref())
    }

    /// Obtain the owned time-stamp token.
    pub fn into_token(self) -> Result<Option<TimeStampToken>, TimeStampError> {
        self.token()?;

        Ok(self.0.time_stamp_token)
    }

    /// Decode the `SignedData` value in the response.
    pub fn signed_data(&self) -> Result<Option<SignedData>, TimeStampError> {
        match &self.0.time_stamp_token {
            Some(token) => Ok(Some(token_signed_data(token)?)),
            None => Ok(None),
        }
    }

    pub fn tst_info(&self) -> Result<Option<TstInfo>, TimeStampError> {
        match self.signed_data()? {
            Some(signed_data) => signed_data_tst_info(&signed_data),
            None => Ok(None),
        }
    }

    /// Verify the nonce of a request was reflected.
    pub fn verify_nonce(&self, request: &TimeStampReq) -> Result<(), TimeStampError> {
        if self.is_success() {
            if let Some(tst_info) = self.tst_info()? {
                if tst_info.nonce != request.nonce {
                    return Err(TimeStampError::NonceMismatch);
                }
            }
        }

        Ok(())
    }
}

/// Construct a [TimeStampReq] for an already computed digest.
///
/// The request has version 1 and a random 64-bit nonce. `cert_req` asks for
/// the authority's certificate to be included in the token.
pub fn time_stamp_request_for_digest(
    digest_algorithm: DigestAlgorithm,
    digest: &[u8],
    policy: Option<TsaPolicyId>,
    cert_req: bool,
) -> Result<TimeStampReq, TimeStampError> {
    let mut random = [0u8; 8];
    ring::rand::SystemRandom::new()
        .fill(&mut random)
        .map_err(|_| TimeStampError::Random)?;

    Ok(TimeStampReq {
        version: Integer::from(1),
        message_imprint: MessageImprint {
            hash_algorithm: digest_algorithm.into(),
            hashed_message: OctetString::new(Bytes::copy_from_slice(digest)),
        },
        req_policy: policy,
        nonce: Some(Integer::from(u64::from_le_bytes(random))),
        cert_req: Some(cert_req),
        extensions: None,
    })
}

/// Something that obtains time-stamp tokens.
#[async_trait]
pub trait TimeStampClient: Send + Sync {
    /// Obtain a time-stamp over `digest`, computed with `digest_algorithm`.
    async fn time_stamp(
        &self,
        digest_algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> Result<TimeStampResponse, TimeStampError>;
}

/// Time-stamp authority reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpTimeStampClient {
    client: Client,
    url: Url,
    policy: Option<TsaPolicyId>,
    cert_req: bool,
}

impl HttpTimeStampClient {
    /// Construct an instance bound to the specified URL.
    pub fn new(url: impl IntoUrl) -> Result<Self, TimeStampError> {
        Self::new_client(Client::default(), url)
    }

    /// Construct an instance using the given [Client] and URL.
    pub fn new_client(client: Client, url: impl IntoUrl) -> Result<Self, TimeStampError> {
        Ok(Self {
            client,
            url: url.into_url()?,
            policy: None,
            cert_req: true,
        })
    }

    /// Request time-stamps under the given TSA policy.
    pub fn policy(mut self, policy: TsaPolicyId) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Whether to ask for the authority's certificate in tokens.
    ///
    /// Defaults to true.
    pub fn cert_req(mut self, value: bool) -> Self {
        self.cert_req = value;
        self
    }

    /// The URL requests are sent to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Send a [TimeStampReq] to the server.
    pub async fn send_request(
        &self,
        request: &TimeStampReq,
    ) -> Result<TimeStampResponse, TimeStampError> {
        let body = der_encode(request.encode_ref())?;

        info!("requesting time-stamp from {}", self.url);

        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, HTTP_CONTENT_TYPE_REQUEST)
            .body(body)
            .send()
            .await?
            .error_for_status()?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if content_type.as_deref() != Some(HTTP_CONTENT_TYPE_RESPONSE) {
            return Err(TimeStampError::Http(format!(
                "unexpected content type: {:?}",
                content_type
            )));
        }

        let res = TimeStampResponse::from_der(response.bytes().await?.as_ref())?;

        if res.is_success() {
            res.verify_nonce(request)?;
        } else {
            warn!(
                "time-stamp authority {} did not grant request: {:?} {}",
                self.url,
                res.status.status,
                res.status_text()
            );
        }

        Ok(res)
    }
}

#[async_trait]
impl TimeStampClient for HttpTimeStampClient {
    async fn time_stamp(
        &self,
        digest_algorithm: DigestAlgorithm,
        digest: &[u8],
    ) -> Result<TimeStampResponse, TimeStampError> {
        let request = time_stamp_request_for_digest(
            digest_algorithm,
            digest,
            self.policy.clone(),
            self.cert_req,
        )?;

        self.send_request(&request).await
    }
}
