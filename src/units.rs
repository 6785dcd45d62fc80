use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// How a product is measured when sold. Continuous units (fabric cut to
/// length) allow fractional quantities; discrete units step by whole pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum SaleUnit {
    #[default]
    #[serde(rename = "mètre")]
    Metre,
    #[serde(rename = "rouleau")]
    Rouleau,
    #[serde(rename = "pièce")]
    Piece,
    #[serde(rename = "complet")]
    Complet,
    #[serde(rename = "yard", alias = "yards")]
    Yard,
    #[serde(rename = "bande")]
    Bande,
}

#[derive(Debug, Error, PartialEq)]
pub enum QuantityError {
    #[error("quantity {quantity} is below the minimum of {floor} {unit}")]
    BelowFloor {
        quantity: Decimal,
        floor: Decimal,
        unit: SaleUnit,
    },
    #[error("quantity {quantity} is not a multiple of the {step} {unit} step")]
    OffStep {
        quantity: Decimal,
        step: Decimal,
        unit: SaleUnit,
    },
}

impl SaleUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleUnit::Metre => "mètre",
            SaleUnit::Rouleau => "rouleau",
            SaleUnit::Piece => "pièce",
            SaleUnit::Complet => "complet",
            SaleUnit::Yard => "yard",
            SaleUnit::Bande => "bande",
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, SaleUnit::Metre | SaleUnit::Yard)
    }

    /// Smallest quantity a cart line may hold for this unit.
    pub fn floor(&self) -> Decimal {
        if self.is_continuous() {
            // 0.5 m of fabric is the smallest cut the shop sells.
            Decimal::new(5, 1)
        } else {
            Decimal::ONE
        }
    }

    /// Granularity of quantity changes for this unit.
    pub fn step(&self) -> Decimal {
        self.floor()
    }

    /// Rejects quantities below the floor or off the unit's step grid.
    pub fn validate_quantity(&self, quantity: Decimal) -> Result<(), QuantityError> {
        let floor = self.floor();
        if quantity < floor {
            return Err(QuantityError::BelowFloor {
                quantity,
                floor,
                unit: *self,
            });
        }
        let step = self.step();
        if !(quantity % step).is_zero() {
            return Err(QuantityError::OffStep {
                quantity,
                step,
                unit: *self,
            });
        }
        Ok(())
    }
}

impl fmt::Display for SaleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mètre" => Ok(SaleUnit::Metre),
            "rouleau" => Ok(SaleUnit::Rouleau),
            "pièce" => Ok(SaleUnit::Piece),
            "complet" => Ok(SaleUnit::Complet),
            // legacy catalogs stored both spellings
            "yard" | "yards" => Ok(SaleUnit::Yard),
            "bande" => Ok(SaleUnit::Bande),
            other => Err(format!("unknown sale unit: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn continuous_units_allow_half_steps() {
        assert!(SaleUnit::Metre.validate_quantity(dec!(0.5)).is_ok());
        assert!(SaleUnit::Metre.validate_quantity(dec!(2.5)).is_ok());
        assert!(SaleUnit::Yard.validate_quantity(dec!(1.5)).is_ok());
    }

    #[test]
    fn continuous_unit_floor_is_half() {
        let err = SaleUnit::Metre.validate_quantity(dec!(0.4)).unwrap_err();
        assert!(matches!(err, QuantityError::BelowFloor { .. }));
    }

    #[test]
    fn continuous_unit_rejects_off_step() {
        let err = SaleUnit::Metre.validate_quantity(dec!(1.3)).unwrap_err();
        assert!(matches!(err, QuantityError::OffStep { .. }));
    }

    #[test]
    fn discrete_units_require_whole_numbers() {
        assert!(SaleUnit::Rouleau.validate_quantity(dec!(1)).is_ok());
        assert!(SaleUnit::Piece.validate_quantity(dec!(3)).is_ok());
        assert!(matches!(
            SaleUnit::Rouleau.validate_quantity(dec!(0.5)),
            Err(QuantityError::BelowFloor { .. })
        ));
        assert!(matches!(
            SaleUnit::Piece.validate_quantity(dec!(1.5)),
            Err(QuantityError::OffStep { .. })
        ));
    }

    #[test]
    fn round_trips_french_names() {
        for unit in [
            SaleUnit::Metre,
            SaleUnit::Rouleau,
            SaleUnit::Piece,
            SaleUnit::Complet,
            SaleUnit::Yard,
            SaleUnit::Bande,
        ] {
            assert_eq!(unit.as_str().parse::<SaleUnit>().unwrap(), unit);
        }
        // plural spelling from older product rows
        assert_eq!("yards".parse::<SaleUnit>().unwrap(), SaleUnit::Yard);
    }

    #[test]
    fn serde_uses_french_names() {
        let json = serde_json::to_string(&SaleUnit::Metre).unwrap();
        assert_eq!(json, "\"mètre\"");
        let unit: SaleUnit = serde_json::from_str("\"yards\"").unwrap();
        assert_eq!(unit, SaleUnit::Yard);
    }
}
