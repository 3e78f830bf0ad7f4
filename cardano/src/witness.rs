//! Witness-set surgery on serialized transactions
//!
//! A transaction is `[body, witness_set, is_valid, auxiliary_data]`. The body bytes are kept
//! untouched so the transaction hash never changes; only the witness-set map is rebuilt.

use cairn_common::{BuilderError, BuilderResult, TxHash};
use cryptoxide::{ed25519, hashing::blake2b::Blake2b};
use pallas::codec::{
    minicbor::{data::Tag, data::Type, Decoder, Encoder},
    utils::AnyCbor,
};

pub const VKEY_LENGTH: usize = 32;
pub const SIGNATURE_LENGTH: usize = 64;
pub const CHAIN_CODE_LENGTH: usize = 32;

const WITNESS_KEY_VKEYS: u64 = 0;
const WITNESS_KEY_BOOTSTRAPS: u64 = 2;
const SET_TAG: u64 = 258;

fn cbor_error(e: impl std::fmt::Display) -> BuilderError {
    BuilderError::Cbor(e.to_string())
}

/// `index` big-endian in the low bytes of an otherwise zero buffer
fn padded_index<const N: usize>(index: usize) -> [u8; N] {
    let mut bytes = [0u8; N];
    let be = (index as u64).to_be_bytes();
    bytes[N - be.len()..].copy_from_slice(&be);
    bytes
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VKeyWitness {
    pub vkey: [u8; VKEY_LENGTH],
    pub signature: [u8; SIGNATURE_LENGTH],
}

impl VKeyWitness {
    /// A stand-in for the `index`th signer, encoding to the same length as a real witness
    pub fn placeholder(index: usize) -> Self {
        Self {
            vkey: padded_index(index),
            signature: padded_index(index),
        }
    }

    fn encode(&self) -> BuilderResult<Vec<u8>> {
        let mut encoder = Encoder::new(Vec::new());
        encoder
            .array(2)
            .and_then(|e| e.bytes(&self.vkey))
            .and_then(|e| e.bytes(&self.signature))
            .map_err(cbor_error)?;
        Ok(encoder.into_writer())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapWitness {
    pub vkey: [u8; VKEY_LENGTH],
    pub signature: [u8; SIGNATURE_LENGTH],
    pub chain_code: [u8; CHAIN_CODE_LENGTH],

    /// CBOR of the Byron address attributes
    pub attributes: Vec<u8>,
}

impl BootstrapWitness {
    pub fn placeholder(index: usize, attributes: Vec<u8>) -> Self {
        Self {
            vkey: padded_index(index),
            signature: padded_index(index),
            chain_code: padded_index(index),
            attributes,
        }
    }

    fn encode(&self) -> BuilderResult<Vec<u8>> {
        let mut encoder = Encoder::new(Vec::new());
        encoder
            .array(4)
            .and_then(|e| e.bytes(&self.vkey))
            .and_then(|e| e.bytes(&self.signature))
            .and_then(|e| e.bytes(&self.chain_code))
            .and_then(|e| e.bytes(&self.attributes))
            .map_err(cbor_error)?;
        Ok(encoder.into_writer())
    }
}

/// A transaction split at its top level, holding raw slices of everything but the witness set
struct TxParts<'a> {
    length: Option<u64>,
    body: &'a [u8],
    witnesses: Vec<(u64, Vec<u8>)>,
    rest: &'a [u8],
}

fn split_transaction(tx: &[u8]) -> BuilderResult<TxParts<'_>> {
    let mut decoder = Decoder::new(tx);
    let length = decoder.array().map_err(cbor_error)?;

    let start = decoder.position();
    decoder.skip().map_err(cbor_error)?;
    let body = &tx[start..decoder.position()];

    let mut witnesses = Vec::new();
    for pair in decoder.map_iter::<u64, AnyCbor>().map_err(cbor_error)? {
        let (key, value) = pair.map_err(cbor_error)?;
        witnesses.push((key, value.raw_bytes().to_vec()));
    }

    Ok(TxParts {
        length,
        body,
        witnesses,
        rest: &tx[decoder.position()..],
    })
}

/// Raw elements of a witness list and whether it carried the set tag. Any other tag is an error.
fn split_witness_list(raw: &[u8]) -> BuilderResult<(bool, Vec<Vec<u8>>)> {
    let mut decoder = Decoder::new(raw);
    let mut tagged = false;
    if decoder.datatype().map_err(cbor_error)? == Type::Tag {
        let tag = decoder.tag().map_err(cbor_error)?.as_u64();
        if tag != SET_TAG {
            let reason = format!("witness list tagged {tag}, expected {SET_TAG}");
            return Err(BuilderError::Cbor(reason));
        }
        tagged = true;
    }
    let mut items = Vec::new();
    for item in decoder.array_iter::<AnyCbor>().map_err(cbor_error)? {
        items.push(item.map_err(cbor_error)?.raw_bytes().to_vec());
    }
    Ok((tagged, items))
}

fn encode_witness_list(tagged: bool, items: &[Vec<u8>]) -> BuilderResult<Vec<u8>> {
    let mut encoder = Encoder::new(Vec::new());
    if tagged {
        encoder.tag(Tag::new(SET_TAG)).map_err(cbor_error)?;
    }
    encoder.array(items.len() as u64).map_err(cbor_error)?;
    let mut bytes = encoder.into_writer();
    for item in items {
        bytes.extend_from_slice(item);
    }
    Ok(bytes)
}

/// Append encoded witnesses to the list under `key`, creating it if absent
fn append_witnesses(
    witnesses: &mut Vec<(u64, Vec<u8>)>,
    key: u64,
    added: Vec<Vec<u8>>,
) -> BuilderResult<()> {
    if added.is_empty() {
        return Ok(());
    }
    match witnesses.iter_mut().find(|(k, _)| *k == key) {
        Some((_, raw)) => {
            let (tagged, mut items) = split_witness_list(raw)?;
            items.extend(added);
            *raw = encode_witness_list(tagged, &items)?;
        }
        None => witnesses.push((key, encode_witness_list(false, &added)?)),
    }
    Ok(())
}

/// Inject vkey witnesses (key 0) and bootstrap witnesses (key 2) into a serialized transaction
pub fn add_witnesses(
    tx: &[u8],
    vkeys: &[VKeyWitness],
    bootstraps: &[BootstrapWitness],
) -> BuilderResult<Vec<u8>> {
    let TxParts {
        length,
        body,
        mut witnesses,
        rest,
    } = split_transaction(tx)?;

    let vkeys = vkeys.iter().map(VKeyWitness::encode).collect::<BuilderResult<Vec<_>>>()?;
    append_witnesses(&mut witnesses, WITNESS_KEY_VKEYS, vkeys)?;
    let bootstraps =
        bootstraps.iter().map(BootstrapWitness::encode).collect::<BuilderResult<Vec<_>>>()?;
    append_witnesses(&mut witnesses, WITNESS_KEY_BOOTSTRAPS, bootstraps)?;
    witnesses.sort_by_key(|(key, _)| *key);

    let mut encoder = Encoder::new(Vec::new());
    let header = match length {
        Some(length) => encoder.array(length),
        None => encoder.begin_array(),
    };
    header.map_err(cbor_error)?;
    encoder.writer_mut().extend_from_slice(body);
    encoder.map(witnesses.len() as u64).map_err(cbor_error)?;
    for (key, raw) in &witnesses {
        encoder.u64(*key).map_err(cbor_error)?;
        encoder.writer_mut().extend_from_slice(raw);
    }
    let mut bytes = encoder.into_writer();
    bytes.extend_from_slice(rest);
    Ok(bytes)
}

/// Blake2b-256 of the body bytes, which is both the transaction id and the signed message
pub fn transaction_hash(tx: &[u8]) -> BuilderResult<TxHash> {
    let body = split_transaction(tx)?.body;
    let mut context = Blake2b::<256>::new();
    context.update_mut(body);
    TxHash::try_from(context.finalize().as_slice()).map_err(cbor_error)
}

/// Sign `message` with a hex secret key: a 32 byte seed or a 64 byte extended key, either
/// optionally wrapped as a CBOR byte string
pub fn sign(secret_key: &str, message: &[u8]) -> BuilderResult<VKeyWitness> {
    let invalid = |reason: &str| BuilderError::InvalidSigningKey(reason.to_string());
    let bytes = hex::decode(secret_key).map_err(|e| invalid(&e.to_string()))?;
    let key = match bytes.as_slice() {
        [0x58, 0x20, rest @ ..] if rest.len() == 32 => rest,
        [0x58, 0x40, rest @ ..] if rest.len() == 64 => rest,
        raw => raw,
    };

    if let Ok(seed) = <[u8; 32]>::try_from(key) {
        let (keypair, vkey) = ed25519::keypair(&seed);
        return Ok(VKeyWitness {
            vkey,
            signature: ed25519::signature(message, &keypair),
        });
    }
    if let Ok(extended) = <[u8; 64]>::try_from(key) {
        return Ok(VKeyWitness {
            vkey: ed25519::extended_to_public(&extended),
            signature: ed25519::signature_extended(message, &extended),
        });
    }
    Err(invalid(&format!("expected 32 or 64 key bytes, got {}", key.len())))
}

/// Add one vkey witness per secret key over the transaction's body hash
pub fn sign_transaction(tx: &[u8], secret_keys: &[String]) -> BuilderResult<Vec<u8>> {
    let hash = transaction_hash(tx)?;
    let witnesses = secret_keys
        .iter()
        .map(|key| sign(key, hash.as_ref()))
        .collect::<BuilderResult<Vec<_>>>()?;
    add_witnesses(tx, &witnesses, &[])
}

/// Number of entries in the vkey witness list, zero when there is none
pub fn count_vkey_witnesses(tx: &[u8]) -> BuilderResult<usize> {
    let parts = split_transaction(tx)?;
    match parts.witnesses.iter().find(|(key, _)| *key == WITNESS_KEY_VKEYS) {
        Some((_, raw)) => Ok(split_witness_list(raw)?.1.len()),
        None => Ok(0),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// `[ {0: [], 2: 1_000_000}, {}, true, null ]`
    pub fn unsigned_tx() -> Vec<u8> {
        let mut encoder = Encoder::new(Vec::new());
        encoder
            .array(4)
            .unwrap()
            .map(2)
            .unwrap()
            .u8(0)
            .unwrap()
            .array(0)
            .unwrap()
            .u8(2)
            .unwrap()
            .u64(1_000_000)
            .unwrap()
            .map(0)
            .unwrap()
            .bool(true)
            .unwrap()
            .null()
            .unwrap();
        encoder.into_writer()
    }

    const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    #[test]
    fn placeholder_witnesses_grow_the_transaction_predictably() {
        let tx = unsigned_tx();
        let one = add_witnesses(&tx, &[VKeyWitness::placeholder(0)], &[]).unwrap();
        // map key, list header and the witness itself
        assert_eq!(one.len(), tx.len() + 2 + 101);

        let two = add_witnesses(&one, &[VKeyWitness::placeholder(1)], &[]).unwrap();
        assert_eq!(two.len(), one.len() + 101);
        assert_eq!(count_vkey_witnesses(&two).unwrap(), 2);
    }

    #[test]
    fn placeholders_are_distinct_per_index() {
        assert_ne!(VKeyWitness::placeholder(0), VKeyWitness::placeholder(1));
        assert_eq!(VKeyWitness::placeholder(258).vkey[30..], [0x01, 0x02]);
    }

    #[test]
    fn body_bytes_and_hash_survive_injection() {
        let tx = unsigned_tx();
        let witnessed = add_witnesses(&tx, &[VKeyWitness::placeholder(3)], &[]).unwrap();
        assert_eq!(transaction_hash(&tx).unwrap(), transaction_hash(&witnessed).unwrap());
        assert_eq!(witnessed.last(), tx.last());
    }

    #[test]
    fn real_signature_has_placeholder_size() {
        let tx = unsigned_tx();
        let signed = sign_transaction(&tx, &[SEED.to_string()]).unwrap();
        let mocked = add_witnesses(&tx, &[VKeyWitness::placeholder(0)], &[]).unwrap();
        assert_eq!(signed.len(), mocked.len());

        let prefixed = sign_transaction(&tx, &[format!("5820{SEED}")]).unwrap();
        assert_eq!(prefixed, signed);
    }

    #[test]
    fn signature_verifies_against_body_hash() {
        let tx = unsigned_tx();
        let hash = transaction_hash(&tx).unwrap();
        let witness = sign(SEED, hash.as_ref()).unwrap();
        assert!(ed25519::verify(hash.as_ref(), &witness.vkey, &witness.signature));
    }

    #[test]
    fn set_tag_is_preserved_when_appending() {
        let mut encoder = Encoder::new(Vec::new());
        encoder.array(4).unwrap().map(0).unwrap().map(1).unwrap().u8(0).unwrap();
        encoder.tag(Tag::new(SET_TAG)).unwrap().array(1).unwrap();
        let mut tx = encoder.into_writer();
        tx.extend(VKeyWitness::placeholder(9).encode().unwrap());
        tx.extend([0xf5, 0xf6]);

        let witnessed = add_witnesses(&tx, &[VKeyWitness::placeholder(0)], &[]).unwrap();
        assert_eq!(witnessed.len(), tx.len() + 101);
        assert_eq!(count_vkey_witnesses(&witnessed).unwrap(), 2);
        // [ {}, {0: 258([..]) ...
        assert_eq!(&witnessed[..6], &[0x84, 0xa0, 0xa1, 0x00, 0xd9, 0x01]);
    }

    #[test]
    fn unknown_witness_list_tag_is_rejected() {
        let mut encoder = Encoder::new(Vec::new());
        encoder.array(4).unwrap().map(0).unwrap().map(1).unwrap().u8(0).unwrap();
        encoder.tag(Tag::new(259)).unwrap().array(1).unwrap();
        let mut tx = encoder.into_writer();
        tx.extend(VKeyWitness::placeholder(9).encode().unwrap());
        tx.extend([0xf5, 0xf6]);

        let appended = add_witnesses(&tx, &[VKeyWitness::placeholder(0)], &[]);
        assert!(matches!(appended, Err(BuilderError::Cbor(ref reason)) if reason.contains("259")));
        assert!(matches!(count_vkey_witnesses(&tx), Err(BuilderError::Cbor(_))));
    }

    #[test]
    fn bootstrap_witness_carries_attributes() {
        let tx = unsigned_tx();
        let witness = BootstrapWitness::placeholder(0, vec![0xa0]);
        let witnessed = add_witnesses(&tx, &[], &[witness]).unwrap();
        // key, list header, array header, three byte strings, attribute bytes
        assert_eq!(witnessed.len(), tx.len() + 2 + 1 + 34 + 66 + 34 + 2);
    }

    #[test]
    fn bad_keys_are_rejected() {
        let tx = unsigned_tx();
        assert!(matches!(
            sign_transaction(&tx, &["abcd".to_string()]),
            Err(BuilderError::InvalidSigningKey(_))
        ));
        assert!(matches!(
            sign_transaction(&tx, &["zz".to_string()]),
            Err(BuilderError::InvalidSigningKey(_))
        ));
    }

    #[test]
    fn malformed_transactions_are_cbor_errors() {
        assert!(matches!(add_witnesses(&[0x01], &[], &[]), Err(BuilderError::Cbor(_))));
    }
}
