//! Value algebra: flat `(unit, quantity)` lists and policy-grouped multi-asset bundles

use std::{
    collections::BTreeMap,
    ops::{AddAssign, Neg, SubAssign},
};

use serde_with::{serde_as, DisplayFromStr};

use crate::{
    error::{BuilderError, BuilderResult},
    hash::PolicyId,
    Quantity,
};

/// Unit naming the base currency
pub const LOVELACE: &str = "lovelace";

/// Hex length of a policy id at the front of an asset unit
const POLICY_ID_HEX_LEN: usize = 56;

/// One entry of a flat asset list
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Asset {
    /// `lovelace` or policy id hex followed by asset name hex
    pub unit: String,

    #[serde_as(as = "DisplayFromStr")]
    pub quantity: Quantity,
}

impl Asset {
    pub fn new(unit: impl Into<String>, quantity: impl Into<Quantity>) -> Self {
        Self {
            unit: unit.into(),
            quantity: quantity.into(),
        }
    }

    pub fn lovelace(quantity: impl Into<Quantity>) -> Self {
        Self::new(LOVELACE, quantity)
    }

    pub fn is_lovelace(&self) -> bool {
        self.unit == LOVELACE || self.unit.is_empty()
    }
}

/// Split a unit into policy id and asset name hex. Returns `None` for lovelace or a unit
/// whose policy part is not a valid policy id.
pub fn split_unit(unit: &str) -> Option<(PolicyId, String)> {
    if unit == LOVELACE {
        return None;
    }
    let policy = unit.get(..POLICY_ID_HEX_LEN)?.parse().ok()?;
    let name = &unit[POLICY_ID_HEX_LEN..];
    Some((policy, name.to_lowercase()))
}

/// Reject a unit that is neither lovelace nor a policy id followed by a hex asset name
pub fn check_unit(unit: &str) -> BuilderResult<()> {
    if unit == LOVELACE || unit.is_empty() {
        return Ok(());
    }
    let invalid = |reason: String| BuilderError::invalid_field("Asset", "unit", reason);
    let (_, name) = split_unit(unit).ok_or_else(|| invalid(format!("'{unit}' has no policy id")))?;
    hex::decode(&name).map_err(|e| invalid(format!("asset name of '{unit}': {e}")))?;
    Ok(())
}

pub fn merge_unit(policy: &PolicyId, asset_name: &str) -> String {
    format!("{policy}{asset_name}")
}

/// A policy-grouped multi-asset bundle. Entries with zero quantity are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
    pub lovelace: Quantity,
    pub multiasset: BTreeMap<PolicyId, BTreeMap<String, Quantity>>,
}

impl Value {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_lovelace(lovelace: impl Into<Quantity>) -> Self {
        Self {
            lovelace: lovelace.into(),
            multiasset: BTreeMap::new(),
        }
    }

    /// Group a flat asset list, summing repeated units. Every unit is checked with
    /// [`check_unit`].
    pub fn try_from_assets(assets: &[Asset]) -> BuilderResult<Self> {
        let mut value = Self::new();
        for asset in assets {
            check_unit(&asset.unit)?;
            value.add_unit(&asset.unit, &asset.quantity);
        }
        Ok(value)
    }

    /// Group a list whose units are already known to be well formed. Anything else is
    /// ignored, so lists from outside go through [`Value::try_from_assets`].
    pub fn from_assets(assets: &[Asset]) -> Self {
        let mut value = Self::new();
        for asset in assets {
            value.add_unit(&asset.unit, &asset.quantity);
        }
        value
    }

    /// Ungroup into a flat list: lovelace first, then policies and names in sorted order
    pub fn to_assets(&self) -> Vec<Asset> {
        let mut assets = Vec::new();
        if self.lovelace != Quantity::ZERO {
            assets.push(Asset::lovelace(self.lovelace.clone()));
        }
        for (policy, names) in &self.multiasset {
            for (name, quantity) in names {
                assets.push(Asset::new(merge_unit(policy, name), quantity.clone()));
            }
        }
        assets
    }

    pub fn add_unit(&mut self, unit: &str, quantity: &Quantity) {
        if unit == LOVELACE || unit.is_empty() {
            self.lovelace += quantity;
            return;
        }
        let Some((policy, name)) = split_unit(unit) else {
            return;
        };
        let names = self.multiasset.entry(policy).or_default();
        let entry = names.entry(name.clone()).or_insert(Quantity::ZERO);
        *entry += quantity;
        if *entry == Quantity::ZERO {
            names.remove(&name);
            if names.is_empty() {
                self.multiasset.remove(&policy);
            }
        }
    }

    pub fn sub_unit(&mut self, unit: &str, quantity: &Quantity) {
        self.add_unit(unit, &-quantity);
    }

    /// Quantity held of `unit`, zero when absent
    pub fn get(&self, unit: &str) -> Quantity {
        if unit == LOVELACE {
            return self.lovelace.clone();
        }
        split_unit(unit)
            .and_then(|(policy, name)| self.multiasset.get(&policy)?.get(&name).cloned())
            .unwrap_or(Quantity::ZERO)
    }

    /// Every unit with a non-zero quantity, lovelace first
    pub fn units(&self) -> Vec<(String, Quantity)> {
        self.to_assets().into_iter().map(|a| (a.unit, a.quantity)).collect()
    }

    pub fn is_zero(&self) -> bool {
        self.lovelace == Quantity::ZERO && self.multiasset.is_empty()
    }

    /// True when some unit carries a positive quantity
    pub fn has_positive(&self) -> bool {
        self.units().iter().any(|(_, q)| *q > Quantity::ZERO)
    }

    pub fn has_assets(&self) -> bool {
        !self.multiasset.is_empty()
    }

    /// Keep only the strictly positive entries
    pub fn positive_part(&self) -> Value {
        let mut value = Value::new();
        for (unit, quantity) in self.units() {
            if quantity > Quantity::ZERO {
                value.add_unit(&unit, &quantity);
            }
        }
        value
    }
}

impl AddAssign<&Value> for Value {
    fn add_assign(&mut self, other: &Value) {
        for (unit, quantity) in other.units() {
            self.add_unit(&unit, &quantity);
        }
    }
}

impl SubAssign<&Value> for Value {
    fn sub_assign(&mut self, other: &Value) {
        for (unit, quantity) in other.units() {
            self.sub_unit(&unit, &quantity);
        }
    }
}

impl Neg for Value {
    type Output = Value;

    fn neg(self) -> Value {
        let mut negated = Value::new();
        negated -= &self;
        negated
    }
}

impl From<&[Asset]> for Value {
    fn from(assets: &[Asset]) -> Self {
        Value::from_assets(assets)
    }
}
