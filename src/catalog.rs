use serde::Serialize;
use utoipa::ToSchema;

use crate::units::SaleUnit;

/// One fabric family the shop carries, with the units it may be sold in.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FabricType {
    #[schema(value_type = String)]
    pub key: &'static str,
    #[schema(value_type = String)]
    pub name: &'static str,
    #[schema(value_type = Vec<String>)]
    pub subtypes: &'static [&'static str],
    #[schema(value_type = Vec<SaleUnit>)]
    pub units: &'static [SaleUnit],
    pub default_unit: SaleUnit,
}

pub const FABRIC_TYPES: &[FabricType] = &[
    FabricType {
        key: "gabardine",
        name: "Gabardine",
        subtypes: &["Type 1", "Type 2", "Type 3", "Type 4", "Type 5", "Type 6"],
        units: &[SaleUnit::Metre, SaleUnit::Rouleau],
        default_unit: SaleUnit::Metre,
    },
    FabricType {
        key: "bazin",
        name: "Bazin",
        subtypes: &["Riche", "Getzner", "Superfanga", "Doré", "Impérial"],
        units: &[SaleUnit::Metre],
        default_unit: SaleUnit::Metre,
    },
    FabricType {
        key: "soie",
        name: "Soie",
        subtypes: &["uni", "perlée Bazin", "Bazin", "fleurie", "plissée", "motif pagne"],
        units: &[SaleUnit::Piece, SaleUnit::Metre],
        default_unit: SaleUnit::Metre,
    },
    FabricType {
        key: "velours",
        name: "Velours",
        subtypes: &["Côtelé", "Cisélé", "De soie"],
        units: &[SaleUnit::Metre],
        default_unit: SaleUnit::Metre,
    },
    FabricType {
        key: "satin",
        name: "Satin",
        subtypes: &["De Paris", "Duchesse", "riche", "Coton"],
        units: &[SaleUnit::Metre],
        default_unit: SaleUnit::Metre,
    },
    FabricType {
        key: "kente",
        name: "Kente",
        subtypes: &["Adweneasa", "Sika Futuro", "Oyokoman", "traditionnel", "Asasia"],
        units: &[SaleUnit::Piece, SaleUnit::Metre],
        default_unit: SaleUnit::Metre,
    },
    FabricType {
        key: "lin",
        name: "Lin",
        subtypes: &["Naturel", "Lavé", "Mélangé", "Brodé", "Fin"],
        units: &[SaleUnit::Metre],
        default_unit: SaleUnit::Metre,
    },
    FabricType {
        key: "pagne",
        name: "Pagne",
        subtypes: &["Wax", "Super Wax", "Fancy", "Java", "Woodin", "Vlisco"],
        units: &[SaleUnit::Complet, SaleUnit::Yard, SaleUnit::Metre],
        default_unit: SaleUnit::Complet,
    },
    FabricType {
        key: "moustiquaire",
        name: "Moustiquaire",
        subtypes: &["Simple", "Brodée", "Renforcée", "Colorée"],
        units: &[SaleUnit::Piece, SaleUnit::Metre],
        default_unit: SaleUnit::Metre,
    },
    FabricType {
        key: "bogolan",
        name: "Bogolan",
        subtypes: &["Traditionnel", "Moderne", "Bamanan", "Ségovien", "Minianka"],
        units: &[SaleUnit::Bande, SaleUnit::Metre],
        default_unit: SaleUnit::Metre,
    },
    FabricType {
        key: "dashiki",
        name: "Dashiki",
        subtypes: &["Classique", "Brodé", "Angelina", "Festif", "Royal"],
        units: &[SaleUnit::Piece],
        default_unit: SaleUnit::Piece,
    },
    FabricType {
        key: "ankara",
        name: "Ankara",
        subtypes: &["Hollandais", "Hitarget", "ABC", "Premium", "Phoenix"],
        units: &[SaleUnit::Yard, SaleUnit::Complet, SaleUnit::Metre],
        default_unit: SaleUnit::Metre,
    },
];

pub fn find_fabric_type(key: &str) -> Option<&'static FabricType> {
    FABRIC_TYPES.iter().find(|f| f.key == key)
}

impl FabricType {
    pub fn allows_unit(&self, unit: SaleUnit) -> bool {
        self.units.contains(&unit)
    }

    pub fn has_subtype(&self, subtype: &str) -> bool {
        self.subtypes.contains(&subtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_unique() {
        for (i, fabric) in FABRIC_TYPES.iter().enumerate() {
            assert!(
                !FABRIC_TYPES[i + 1..].iter().any(|f| f.key == fabric.key),
                "duplicate key {}",
                fabric.key
            );
        }
    }

    #[test]
    fn default_unit_is_always_allowed() {
        for fabric in FABRIC_TYPES {
            assert!(
                fabric.allows_unit(fabric.default_unit),
                "{} default unit not in its unit list",
                fabric.key
            );
        }
    }

    #[test]
    fn lookup_by_key() {
        let pagne = find_fabric_type("pagne").unwrap();
        assert_eq!(pagne.default_unit, SaleUnit::Complet);
        assert!(pagne.allows_unit(SaleUnit::Yard));
        assert!(pagne.has_subtype("Wax"));
        assert!(find_fabric_type("tweed").is_none());
    }
}
