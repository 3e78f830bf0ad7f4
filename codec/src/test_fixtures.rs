use cairn_common::{
    Anchor, ExUnits, KeyHash, LanguageVersion, PolicyId, Redeemer, ScriptHash, ScriptSource,
    TxHash, BuilderData, merge_unit,
};

pub const TX_HASH: &str = "0d8d00cdd4657ac84d82f0a56067634a7adfdf43da41cb534bcaa45060973d21";
pub const SCRIPT_CBOR: &str = "4e4d01000033222220051200120011";
pub const ADDRESS: &str = "addr_test1qpvx0sacufuypa2k4sngk7q40zc5c4npl337uusdh64kv0uafhxhu32dys6pvn6wlw8dav6cmp4pmtv7cc3yel9uu0nq93swx9";
pub const STAKE_ADDRESS: &str = "stake_test1ur5affkzhze7ru98chv78vh35rya3elk5k6v85hp7z5m33ck3l9w3";
pub const POOL_ID: &str = "pool1pu5jlj4q9w9jlxeu370a3c9myx47md5j5m2str0naunn2q3lkdy";
pub const DREP_ID: &str = "drep1a822ds4ck0slpf79m83m9udqe8vw0a49knpa9c0s4xuvwuak3md";

pub fn tx_hash() -> TxHash {
    TX_HASH.parse().unwrap()
}

pub fn script_hash() -> ScriptHash {
    "c0b3a4f37a5b1e5f6c1f9b7d0c8e4a2b6d3f5e7a9c1b3d5f7e9a1c3b".parse().unwrap()
}

pub fn key_hash() -> KeyHash {
    "5867c3b8e27840f556ac268b781578b14c5661fc63ee720dbeab663f".parse().unwrap()
}

pub fn policy_id() -> PolicyId {
    "d441227553a0f1a965fee7d60a0f724b368dd1bddbc208730fccebcf".parse().unwrap()
}

/// `policy_id()` with the asset name "TEST" hex encoded
pub fn asset_unit() -> String {
    merge_unit(&policy_id(), "54455354")
}

pub fn provided_script() -> ScriptSource {
    ScriptSource::Provided {
        code: SCRIPT_CBOR.to_string(),
        version: LanguageVersion::V2,
    }
}

pub fn redeemer() -> Redeemer {
    Redeemer {
        data: BuilderData::cbor("d87980"),
        ex_units: ExUnits::new(7_000_000, 3_000_000_000),
    }
}

pub fn anchor() -> Anchor {
    Anchor {
        url: "https://example.com/anchor.json".to_string(),
        data_hash: TX_HASH.parse().unwrap(),
    }
}
