//! Address decoding helpers, delegating the bech32 / base58 formats to Pallas

use pallas::{
    codec::minicbor,
    ledger::addresses::{
        Address as PallasAddress, ByronAddress, ShelleyPaymentPart, StakePayload,
    },
};

use crate::{
    error::{BuilderError, BuilderResult},
    hash::KeyHash,
};

/// Decode a bech32 Shelley / stake address or a base58 Byron address
pub fn parse_address(text: &str) -> BuilderResult<PallasAddress> {
    if let Ok(address) = PallasAddress::from_bech32(text) {
        return Ok(address);
    }
    ByronAddress::from_base58(text)
        .map(PallasAddress::Byron)
        .map_err(|e| BuilderError::invalid_field("Address", "address", e.to_string()))
}

/// Raw address bytes as they appear in a transaction output
pub fn address_bytes(text: &str) -> BuilderResult<Vec<u8>> {
    parse_address(text).map(|address| address.to_vec())
}

pub fn is_byron(text: &str) -> bool {
    matches!(parse_address(text), Ok(PallasAddress::Byron(_)))
}

/// The key hash whose signature spends from (or withdraws to) this address, if the address is
/// key-locked
pub fn signing_key_hash(text: &str) -> Option<KeyHash> {
    match parse_address(text).ok()? {
        PallasAddress::Shelley(shelley) => match shelley.payment() {
            ShelleyPaymentPart::Key(hash) => Some(KeyHash::from(*hash)),
            ShelleyPaymentPart::Script(_) => None,
        },
        PallasAddress::Stake(stake) => match stake.payload() {
            StakePayload::Stake(hash) => Some(KeyHash::from(*hash)),
            StakePayload::Script(_) => None,
        },
        PallasAddress::Byron(_) => None,
    }
}

/// CBOR of the attributes map inside a Byron address, which bootstrap witnesses repeat
pub fn byron_attributes(text: &str) -> BuilderResult<Vec<u8>> {
    let PallasAddress::Byron(byron) = parse_address(text)? else {
        return Err(BuilderError::invalid_field("Address", "address", "not a Byron address"));
    };
    let payload = byron.payload.to_vec();
    let malformed = |e: minicbor::decode::Error| BuilderError::Cbor(e.to_string());

    // [root, attributes, type]
    let mut decoder = minicbor::Decoder::new(&payload);
    decoder.array().map_err(malformed)?;
    decoder.skip().map_err(malformed)?;
    let start = decoder.position();
    decoder.skip().map_err(malformed)?;
    Ok(payload[start..decoder.position()].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHELLEY: &str = "addr_test1qpvx0sacufuypa2k4sngk7q40zc5c4npl337uusdh64kv0uafhxhu32dys6pvn6wlw8dav6cmp4pmtv7cc3yel9uu0nq93swx9";
    const BYRON: &str = "Ae2tdPwUPEZ4YjgvykNpoFeYUxoyhNj2kg8KfKWN2FizsSpLUPv68MpTVDo";

    #[test]
    fn shelley_address_yields_payment_key_hash() {
        let hash = signing_key_hash(SHELLEY).unwrap();
        assert_eq!(hash.to_string(), "5867c3b8e27840f556ac268b781578b14c5661fc63ee720dbeab663f");
        assert!(!is_byron(SHELLEY));
        assert_eq!(address_bytes(SHELLEY).unwrap().len(), 57);
    }

    #[test]
    fn byron_address_is_recognised() {
        assert!(is_byron(BYRON));
        assert_eq!(signing_key_hash(BYRON), None);
        assert_eq!(byron_attributes(BYRON).unwrap(), vec![0xa0]);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_address("not-an-address").is_err());
        assert!(byron_attributes(SHELLEY).is_err());
    }
}
