use serde::{Deserialize, Serialize};

/// Battery details recorded for a sensor in the registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatteryInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chemistry: Option<String>,
}

/// Battery chemistries in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatteryChemistry {
    LithiumIronDisulfideAa,
    AlkalineAa,
    LithiumThionylChloride,
    CoinCellCr2032,
    LithiumPolymer,
}

impl BatteryChemistry {
    pub const ALL: [BatteryChemistry; 5] = [
        BatteryChemistry::LithiumIronDisulfideAa,
        BatteryChemistry::AlkalineAa,
        BatteryChemistry::LithiumThionylChloride,
        BatteryChemistry::CoinCellCr2032,
        BatteryChemistry::LithiumPolymer,
    ];

    /// Key stored in `battery_info.chemistry`
    pub fn catalog_key(&self) -> &'static str {
        match self {
            BatteryChemistry::LithiumIronDisulfideAa => "LiFeS2_AA",
            BatteryChemistry::AlkalineAa => "Alkaline_AA",
            BatteryChemistry::LithiumThionylChloride => "LiSOCl2",
            BatteryChemistry::CoinCellCr2032 => "CR2032",
            BatteryChemistry::LithiumPolymer => "LiPo",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BatteryChemistry::LithiumIronDisulfideAa => "Lithium AA (Li-FeS2)",
            BatteryChemistry::AlkalineAa => "Alkaline AA",
            BatteryChemistry::LithiumThionylChloride => "Lithium thionyl chloride (Li-SOCl2)",
            BatteryChemistry::CoinCellCr2032 => "CR2032 coin cell",
            BatteryChemistry::LithiumPolymer => "Lithium polymer",
        }
    }

    /// Nominal cell voltage in volts
    pub fn nominal_voltage(&self) -> f64 {
        match self {
            BatteryChemistry::LithiumIronDisulfideAa => 1.5,
            BatteryChemistry::AlkalineAa => 1.5,
            BatteryChemistry::LithiumThionylChloride => 3.6,
            BatteryChemistry::CoinCellCr2032 => 3.0,
            BatteryChemistry::LithiumPolymer => 3.7,
        }
    }

    /// Voltage at which the cell is considered depleted
    pub fn cutoff_voltage(&self) -> f64 {
        match self {
            BatteryChemistry::LithiumIronDisulfideAa => 0.9,
            BatteryChemistry::AlkalineAa => 0.9,
            BatteryChemistry::LithiumThionylChloride => 2.7,
            BatteryChemistry::CoinCellCr2032 => 2.0,
            BatteryChemistry::LithiumPolymer => 3.0,
        }
    }

    /// Look up a catalog entry. Exact keys win; otherwise case, `-`, `_` and
    /// spaces are ignored.
    pub fn from_catalog_key(key: &str) -> Option<Self> {
        let key = key.trim();
        if let Some(exact) = Self::ALL.iter().find(|c| c.catalog_key() == key) {
            return Some(*exact);
        }

        let wanted = fold_key(key);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL
            .iter()
            .find(|c| fold_key(c.catalog_key()) == wanted)
            .copied()
    }
}

fn fold_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolve a sensor's chemistry from its battery info.
///
/// Missing info, a missing `chemistry` field and unknown catalog keys all
/// yield `None`; there is no default chemistry.
pub fn resolve_chemistry(info: Option<&BatteryInfo>) -> Option<BatteryChemistry> {
    info?
        .chemistry
        .as_deref()
        .and_then(BatteryChemistry::from_catalog_key)
}
