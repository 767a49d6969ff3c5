//! Threshold signing
//!
//! Any $t + 1$ participants of key generation can jointly produce an Ed25519 signature under the
//! group key. Signing takes three rounds:
//! 1. Each signer $i$ samples nonces $d_i, e_i$ and broadcasts commitments $D_i = d_i G$,
//!    $E_i = e_i G$ ([`MessageType::Sign1`])
//! 2. Once all commitments are received, each signer computes binding factors $\rho_j$, group
//!    commitment $R = \sum_j (D_j + \rho_j E_j)$, challenge $c = H(R \| A \| m)$, and broadcasts
//!    signature share $z_i = d_i + \rho_i e_i + \lambda_i s_i c$ ([`MessageType::Sign2`])
//! 3. Each signer verifies shares of others and outputs signature $(R, \sum_j z_j)$
//!
//! Where $\lambda_i$ is the Lagrange coefficient of signer $i$ over the set of signers, so that
//! $\sum_j \lambda_j s_j$ is the group secret.
//!
//! Every signer obtains the same signature, there's no designated aggregator.
//!
//! [`MessageType::Sign1`]: crate::messages::MessageType::Sign1
//! [`MessageType::Sign2`]: crate::messages::MessageType::Sign2

use alloc::{boxed::Box, collections::BTreeMap, vec::Vec};
use core::time::Duration;

use generic_ec::{Point, Scalar, SecretScalar};
use rand_core::{CryptoRng, RngCore};

use crate::{
    ciphersuite::{random_scalar, Curve, ProtocolVersion},
    eddsa::{InvalidPublic, Public, SecretShare, Signature},
    error::{Error, InvalidParameters},
    messages::MessageType,
    state::{Output, State},
    PartyId, PartyIdList,
};

mod round0;
mod round1;
mod round2;
mod utils;

/// Message types consumed by signing, in order
pub const PROTOCOL: &[MessageType] = &[MessageType::Sign1, MessageType::Sign2];

/// Signing running on behalf of one party
pub type SignState = State<Signature>;

/// Handle to the output of signing
pub type SignOutput = Output<Signature>;

impl Output<Signature> {
    /// Signature, available once signing completed successfully
    pub fn signature(&self) -> Option<Signature> {
        self.get()
    }
}

/// Per-signer data collected during the protocol
#[derive(Debug, Clone)]
pub(crate) struct Signer {
    /// Public share multiplied by the Lagrange coefficient
    public: Point<Curve>,
    /// Hiding nonce commitment $D_j$
    d: Point<Curve>,
    /// Binding nonce commitment $E_j$
    e: Point<Curve>,
    /// Binding factor $\rho_j$
    rho: Scalar<Curve>,
    /// Commitment $R_j = D_j + \rho_j E_j$
    r: Point<Curve>,
    /// Signature share $z_j$
    z: Scalar<Curve>,
}

impl Signer {
    fn new(public: Point<Curve>) -> Self {
        Self {
            public,
            d: Point::zero(),
            e: Point::zero(),
            rho: Scalar::zero(),
            r: Point::zero(),
            z: Scalar::zero(),
        }
    }
}

/// Parameters of the signing session shared by all rounds
pub(crate) struct Session {
    i: PartyId,
    signers: BTreeMap<PartyId, Signer>,
    group_key: Point<Curve>,
    msg: Vec<u8>,
    version: ProtocolVersion,
}

/// Builder for signing
pub struct SigningBuilder<'a> {
    signers: &'a PartyIdList,
    secret: &'a SecretShare,
    public: &'a Public,
    msg: &'a [u8],
    version: ProtocolVersion,
    timeout: Duration,
}

impl<'a> SigningBuilder<'a> {
    /// Constructs a builder
    ///
    /// * `signers` is the set of parties that carry out signing. It must consist of at least
    ///   `t + 1` participants of key generation and must include the owner of `secret`
    /// * `secret` and `public` are the output of key generation
    /// * `msg` is the message to be signed
    pub fn new(
        signers: &'a PartyIdList,
        secret: &'a SecretShare,
        public: &'a Public,
        msg: &'a [u8],
    ) -> Self {
        Self {
            signers,
            secret,
            public,
            msg,
            version: ProtocolVersion::default(),
            timeout: Duration::ZERO,
        }
    }

    /// Sets the binding factor derivation
    ///
    /// All signers must use the same version. Defaults to [`ProtocolVersion::Frost2`].
    pub fn set_protocol_version(self, version: ProtocolVersion) -> Self {
        Self { version, ..self }
    }

    /// Aborts the protocol with [`Error::Timeout`] if it doesn't complete within `timeout`
    ///
    /// Zero disables the timeout (default). Non-zero timeout requires [`start`](Self::start) to
    /// be called within a tokio runtime.
    pub fn set_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    /// Validates parameters, samples nonces and constructs the state
    pub fn start<R: RngCore + CryptoRng>(
        self,
        rng: &mut R,
    ) -> Result<(SignState, SignOutput), Error> {
        let i = self.secret.id();
        let required = usize::from(self.public.threshold()) + 1;
        if self.signers.len() < required {
            return Err(InvalidParameters::TooFewSigners {
                n: self.signers.len(),
                required,
            }
            .into());
        }
        if let Some(j) = self
            .signers
            .iter()
            .find(|j| !self.public.participants().contains(*j))
        {
            return Err(InvalidParameters::UnknownSigner(j).into());
        }
        if !self.signers.contains(i) {
            return Err(InvalidParameters::NotAParticipant(i).into());
        }
        if self.public.public_share(i) != Some(self.secret.public_share()) {
            return Err(InvalidParameters::SecretShareMismatch(i).into());
        }

        let signers = self
            .signers
            .iter()
            .map(|j| -> Result<_, InvalidPublic> {
                let lambda_j = self
                    .signers
                    .lagrange_coefficient(j)
                    .map_err(InvalidPublic::from)?;
                let public_j = self
                    .public
                    .public_share(j)
                    .ok_or(InvalidPublic::MissingShare(j))?;
                Ok((j, Signer::new(public_j * lambda_j)))
            })
            .collect::<Result<BTreeMap<_, _>, InvalidPublic>>()
            .map_err(InvalidParameters::from)?;

        let lambda_i = self
            .signers
            .lagrange_coefficient(i)
            .map_err(InvalidPublic::from)
            .map_err(InvalidParameters::from)?;
        let mut secret = lambda_i * self.secret.secret().as_ref();
        let secret = SecretScalar::new(&mut secret);

        tracing::debug!(
            party = %i,
            signers = self.signers.len(),
            version = ?self.version,
            "starting signing"
        );
        let session = Session {
            i,
            signers,
            group_key: self.public.group_key(),
            msg: self.msg.to_vec(),
            version: self.version,
        };
        let round = round0::Round0::new(
            session,
            secret,
            random_scalar(rng),
            random_scalar(rng),
        );

        let (state, output) = State::new(
            i,
            self.signers.clone(),
            PROTOCOL,
            Box::new(round),
            self.timeout,
        )?;
        Ok((state, output))
    }
}

/// Constructs a signing state with the default protocol version
///
/// Shortcut for [`SigningBuilder`].
pub fn new_sign_state<R: RngCore + CryptoRng>(
    signers: &PartyIdList,
    secret: &SecretShare,
    public: &Public,
    msg: &[u8],
    timeout: Duration,
    rng: &mut R,
) -> Result<(SignState, SignOutput), Error> {
    SigningBuilder::new(signers, secret, public, msg)
        .set_timeout(timeout)
        .start(rng)
}
