//! A stand-in ledger engine for exercising the serializer end to end.
//!
//! Transactions are `[ {0: [], 2: fee, 7: h'<wire json>'}, {}, true, null ]`. The fee has its
//! own CBOR field so the transaction grows with it the way a real one does.

#![allow(dead_code)]

use cairn_common::{Asset, BuilderData, ProtocolParams, RefTxIn, TxHash, UTxO, UtxoOutput};
use cairn_module_tx_builder::LedgerEngine;
use pallas::codec::minicbor::{Decoder, Encoder};
use serde_json::Value;

pub const SHELLEY: &str = "addr_test1qpvx0sacufuypa2k4sngk7q40zc5c4npl337uusdh64kv0uafhxhu32dys6pvn6wlw8dav6cmp4pmtv7cc3yel9uu0nq93swx9";
pub const POLICY: &str = "d441227553a0f1a965fee7d60a0f724b368dd1bddbc208730fccebcf";
pub const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

const FEE_KEY: u64 = 2;
const WIRE_KEY: u64 = 7;

#[derive(Default)]
pub struct FakeEngine {
    /// Every call fails with this message when set
    pub failure: Option<String>,
}

impl FakeEngine {
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
        }
    }

    fn check(&self) -> Result<(), String> {
        match &self.failure {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }
}

impl LedgerEngine for FakeEngine {
    fn serialize_body(&self, body: &Value, _params: &ProtocolParams) -> Result<String, String> {
        self.check()?;
        let fee = body["fee"].as_u64().unwrap_or(0);
        let mut rest = body.clone();
        if let Some(obj) = rest.as_object_mut() {
            obj.remove("fee");
        }
        let wire = serde_json::to_vec(&rest).map_err(|e| e.to_string())?;

        let mut encoder = Encoder::new(Vec::new());
        encoder
            .array(4)
            .and_then(|e| e.map(3))
            .and_then(|e| e.u64(0))
            .and_then(|e| e.array(0))
            .and_then(|e| e.u64(FEE_KEY))
            .and_then(|e| e.u64(fee))
            .and_then(|e| e.u64(WIRE_KEY))
            .and_then(|e| e.bytes(&wire))
            .and_then(|e| e.map(0))
            .and_then(|e| e.bool(true))
            .and_then(|e| e.null())
            .map_err(|e| e.to_string())?;
        Ok(hex::encode(encoder.into_writer()))
    }

    fn parse_tx(&self, tx_hex: &str, _utxos: &[UTxO]) -> Result<Value, String> {
        self.check()?;
        let bytes = hex::decode(tx_hex).map_err(|e| e.to_string())?;
        let mut decoder = Decoder::new(&bytes);
        decoder.array().map_err(|e| e.to_string())?;
        let entries = decoder.map().map_err(|e| e.to_string())?.unwrap_or(0);

        let (mut fee, mut wire) = (None, None);
        for _ in 0..entries {
            match decoder.u64().map_err(|e| e.to_string())? {
                FEE_KEY => fee = Some(decoder.u64().map_err(|e| e.to_string())?),
                WIRE_KEY => wire = Some(decoder.bytes().map_err(|e| e.to_string())?.to_vec()),
                _ => decoder.skip().map_err(|e| e.to_string())?,
            }
        }

        let wire = wire.ok_or("missing body")?;
        let mut body: Value = serde_json::from_slice(&wire).map_err(|e| e.to_string())?;
        if let Some(obj) = body.as_object_mut() {
            obj.insert("fee".to_string(), fee.map(Value::from).unwrap_or(Value::Null));
        }
        Ok(body)
    }

    fn normalize_data(&self, data: &BuilderData) -> Result<String, String> {
        self.check()?;
        let json = match data {
            BuilderData::Structured(value) | BuilderData::RawTextSchema(value) => value.to_string(),
            BuilderData::RawBinary(hex) => return Ok(hex.clone()),
        };
        let mut encoder = Encoder::new(Vec::new());
        encoder.bytes(json.as_bytes()).map_err(|e| e.to_string())?;
        Ok(hex::encode(encoder.into_writer()))
    }
}

pub fn utxo(byte: u8, index: u32, amount: Vec<Asset>) -> UTxO {
    UTxO {
        input: RefTxIn::new(TxHash::new([byte; 32]), index),
        output: UtxoOutput {
            address: SHELLEY.to_string(),
            amount,
            ..Default::default()
        },
    }
}

pub fn token(quantity: u64) -> Asset {
    Asset::new(format!("{POLICY}544f4b454e"), quantity)
}
