use crate::Quantity;

/// Transaction metadata value. Integers are unbounded so labels like CIP-25 serial numbers
/// survive any round trip untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadatum {
    Int(Quantity),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Metadatum>),
    Map(Vec<(Metadatum, Metadatum)>),
}

pub type MetadatumLabel = u64;

/// One labelled metadata entry; entries keep the order they were added in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxMetadata {
    pub tag: MetadatumLabel,
    pub value: Metadatum,
}
