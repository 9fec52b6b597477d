//! Marker colours for property updates
//!
//! A draw task's attribute is picked from the update category and the owning
//! player token. Held properties (bought, or won when an auction folds) and
//! mortgaged ones use separate colour sets.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of property update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    AuctionFolded,
    Unmortgaged,
    Mortgaged,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown update category '{0}' (expected auction-folded, unmortgaged or mortgaged)")]
pub struct UnknownCategory(String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auction-folded" => Ok(Category::AuctionFolded),
            "unmortgaged" => Ok(Category::Unmortgaged),
            "mortgaged" => Ok(Category::Mortgaged),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Owner colour tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    /// Colours for held properties, keyed by owner token
    pub held: BTreeMap<String, String>,

    /// Colours for mortgaged properties, keyed by owner token
    pub mortgaged: BTreeMap<String, String>,

    /// Used when the owner has no entry
    pub fallback: String,
}

impl Default for Palette {
    fn default() -> Self {
        let table = |pairs: [(&str, &str); 4]| {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            held: table([("p1", "red"), ("p2", "blue"), ("p3", "orange"), ("p4", "purple")]),
            mortgaged: table([("p1", "black"), ("p2", "grey"), ("p3", "white"), ("p4", "lightpink")]),
            fallback: "red".to_string(),
        }
    }
}

impl Palette {
    /// Colour for an owner's marker in the given category
    pub fn attribute_for(&self, category: Category, owner: &str) -> &str {
        let table = match category {
            Category::AuctionFolded | Category::Unmortgaged => &self.held,
            Category::Mortgaged => &self.mortgaged,
        };
        table
            .get(&owner.trim().to_lowercase())
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("auction-folded".parse::<Category>().unwrap(), Category::AuctionFolded);
        assert_eq!("Mortgaged".parse::<Category>().unwrap(), Category::Mortgaged);
        assert!("sold".parse::<Category>().is_err());
    }

    #[test]
    fn test_attribute_for() {
        let palette = Palette::default();
        assert_eq!(palette.attribute_for(Category::Unmortgaged, "p2"), "blue");
        assert_eq!(palette.attribute_for(Category::AuctionFolded, "p4"), "purple");
        assert_eq!(palette.attribute_for(Category::Mortgaged, "P4"), "lightpink");
    }

    #[test]
    fn test_unknown_owner_falls_back() {
        let palette = Palette::default();
        assert_eq!(palette.attribute_for(Category::Mortgaged, "p9"), "red");
    }
}
