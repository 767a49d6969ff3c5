use alloc::vec::Vec;

use digest::Digest;
use generic_ec::{Point, Scalar};

use crate::{
    ciphersuite::{hash_message, serialize_point, Curve, ProtocolVersion, BINDING_CONTEXT},
    PartyId,
};

/// Nonce commitments $(D_j, E_j)$ of a signer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commitments {
    pub hiding: Point<Curve>,
    pub binding: Point<Curve>,
}

/// Feeds the binding factor preimage into the hash
///
/// Preimage is `"FROST-SHA512" || SHA-512(msg) || (id_j || D_j || E_j)...` over all signers in
/// ascending order of identifiers.
pub fn encode_commitment_list(
    mut output: sha2::Sha512,
    msg: &[u8],
    commitment_list: &[(PartyId, Commitments)],
) -> sha2::Sha512 {
    output.update(BINDING_CONTEXT);
    output.update(hash_message(msg));
    for (j, Commitments { hiding, binding }) in commitment_list {
        output.update(j.to_bytes());
        output.update(serialize_point(hiding));
        output.update(serialize_point(binding));
    }
    output
}

/// Computes binding factors
///
/// `commitment_list` must be sorted in ascending order by identifier, output list comes in the
/// same order. Under [`ProtocolVersion::Frost2`] all signers get the same binding factor.
pub fn compute_binding_factors(
    version: ProtocolVersion,
    msg: &[u8],
    commitment_list: &[(PartyId, Commitments)],
) -> Vec<(PartyId, Scalar<Curve>)> {
    debug_assert!(
        is_sorted_by_key(commitment_list, |(j, _)| j),
        "commitments list must be sorted"
    );

    let preimage = encode_commitment_list(sha2::Sha512::new(), msg, commitment_list);
    match version {
        ProtocolVersion::Frost1 => commitment_list
            .iter()
            .map(|(j, _)| {
                let hash = preimage.clone().chain_update(j.to_bytes()).finalize();
                (*j, Scalar::from_le_bytes_mod_order(hash))
            })
            .collect(),
        ProtocolVersion::Frost2 => {
            let rho = Scalar::from_le_bytes_mod_order(preimage.finalize());
            commitment_list.iter().map(|(j, _)| (*j, rho)).collect()
        }
    }
}

/// Computes commitment $R_j = D_j + \rho_j E_j$ of a single signer
pub fn signer_commitment(comm: &Commitments, binding_factor: &Scalar<Curve>) -> Point<Curve> {
    comm.hiding + comm.binding * binding_factor
}

/// Computes the group commitment $R = \sum_j R_j$
///
/// Assumes that commitments and binding factors come in the same order, which is enforced via
/// debug assertion.
pub fn compute_group_commitment<'a>(
    commitment_list: impl IntoIterator<Item = &'a (PartyId, Commitments)>,
    binding_factor_list: impl IntoIterator<Item = &'a (PartyId, Scalar<Curve>)>,
) -> Point<Curve> {
    commitment_list
        .into_iter()
        .zip(binding_factor_list)
        .fold(Point::zero(), |acc, ((j, comm), (_j, factor))| {
            debug_assert_eq!(j, _j);
            acc + signer_commitment(comm, factor)
        })
}

pub fn is_sorted_by_key<T, B, F>(slice: &[T], f: F) -> bool
where
    F: Fn(&T) -> &B,
    B: Ord,
{
    slice.windows(2).all(|win| f(&win[0]) <= f(&win[1]))
}
