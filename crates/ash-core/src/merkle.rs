//! BLAKE3 Merkle allowlist for proof-gated multiplier unlocks.
//!
//! Uses domain-separated hashing to prevent second-preimage attacks:
//! - Leaf hash: `BLAKE3(0x00 || account || numerator_be16)`
//! - Internal node: `BLAKE3(0x01 || min(a, b) || max(a, b))`
//!
//! Sibling pairs are sorted before hashing, so a proof is a plain sequence
//! of sibling hashes with no left/right markers. Odd-length layers are
//! padded by duplicating the last element. Empty trees produce
//! [`Hash256::ZERO`].

use crate::traits::ProofVerifier;
use crate::types::{Address, Hash256};

/// Domain separation prefix for leaf hashes.
const LEAF_PREFIX: u8 = 0x00;

/// Domain separation prefix for internal node hashes.
const NODE_PREFIX: u8 = 0x01;

/// Hash an allowlist entry: `BLAKE3(0x00 || account || numerator_be16)`.
///
/// This is the replay-guard key for a Merkle unlock.
pub fn unlock_leaf(account: &Address, numerator: u128) -> Hash256 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[LEAF_PREFIX]);
    hasher.update(account.as_bytes());
    hasher.update(&numerator.to_be_bytes());
    Hash256(hasher.finalize().into())
}

/// Hash two siblings in sorted order: `BLAKE3(0x01 || min || max)`.
pub fn node_hash(a: &Hash256, b: &Hash256) -> Hash256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[NODE_PREFIX]);
    hasher.update(lo.as_bytes());
    hasher.update(hi.as_bytes());
    Hash256(hasher.finalize().into())
}

/// Fold a leaf up through its proof to the implied root.
pub fn process_proof(leaf: &Hash256, proof: &[Hash256]) -> Hash256 {
    proof.iter().fold(*leaf, |acc, sibling| node_hash(&acc, sibling))
}

/// Check that `leaf` is included under `root` via `proof`.
pub fn verify_proof(proof: &[Hash256], root: &Hash256, leaf: &Hash256) -> bool {
    process_proof(leaf, proof) == *root
}

/// Compute the next layer of the tree from the current one.
///
/// Duplicates the last element when the layer has an odd number of entries.
fn next_layer(layer: &[Hash256]) -> Vec<Hash256> {
    layer
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => node_hash(left, right),
            [single] => node_hash(single, single),
            _ => unreachable!("chunks(2) yields one or two elements"),
        })
        .collect()
}

/// Root over already-hashed leaves. Returns [`Hash256::ZERO`] when empty.
pub fn merkle_root(leaves: &[Hash256]) -> Hash256 {
    if leaves.is_empty() {
        return Hash256::ZERO;
    }
    let mut current = leaves.to_vec();
    while current.len() > 1 {
        current = next_layer(&current);
    }
    current[0]
}

/// The production [`ProofVerifier`]: BLAKE3 leaves, sorted-pair nodes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Blake3Verifier;

impl ProofVerifier for Blake3Verifier {
    fn unlock_leaf(&self, account: &Address, numerator: u128) -> Hash256 {
        unlock_leaf(account, numerator)
    }

    fn verify(&self, proof: &[Hash256], root: &Hash256, leaf: &Hash256) -> bool {
        verify_proof(proof, root, leaf)
    }
}

/// Allowlist of `(account, numerator)` grants and the tree committing to it.
///
/// Operators build this off-ledger to publish the root and hand each
/// account its proof.
#[derive(Clone, Debug)]
pub struct AllowlistTree {
    entries: Vec<(Address, u128)>,
    /// `layers[0]` = leaf hashes, `layers[last]` = `[root]`.
    layers: Vec<Vec<Hash256>>,
}

impl AllowlistTree {
    /// Build the tree over `entries` in the given order.
    pub fn from_entries(entries: &[(Address, u128)]) -> Self {
        let mut layers: Vec<Vec<Hash256>> = Vec::new();
        let mut current: Vec<Hash256> = entries
            .iter()
            .map(|(account, numerator)| unlock_leaf(account, *numerator))
            .collect();

        while current.len() > 1 {
            let next = next_layer(&current);
            layers.push(current);
            current = next;
        }
        if !current.is_empty() {
            layers.push(current);
        }

        Self {
            entries: entries.to_vec(),
            layers,
        }
    }

    /// The allowlist root. [`Hash256::ZERO`] for an empty allowlist.
    pub fn root(&self) -> Hash256 {
        self.layers
            .last()
            .and_then(|l| l.first())
            .copied()
            .unwrap_or(Hash256::ZERO)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sibling path for the entry at `index`, leaf level first.
    pub fn proof(&self, index: usize) -> Option<Vec<Hash256>> {
        if index >= self.entries.len() {
            return None;
        }

        let mut path = Vec::with_capacity(self.layers.len().saturating_sub(1));
        let mut pos = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling = layer.get(pos ^ 1).unwrap_or(&layer[pos]);
            path.push(*sibling);
            pos /= 2;
        }
        Some(path)
    }

    /// Proof for the first entry matching `(account, numerator)`.
    pub fn proof_for(&self, account: &Address, numerator: u128) -> Option<Vec<Hash256>> {
        let index = self
            .entries
            .iter()
            .position(|(a, n)| a == account && *n == numerator)?;
        self.proof(index)
    }
}
