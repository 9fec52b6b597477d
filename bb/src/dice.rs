//! Weighted dice used by the game
//!
//! Each variant rolls two dice, each drawn uniformly from a six-entry pool.
//! Duplicated faces in a pool skew the odds toward low or high rolls.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

const LOW: [u8; 6] = [1, 1, 2, 2, 3, 3];
const HIGH: [u8; 6] = [4, 4, 5, 5, 6, 6];
const FAIR: [u8; 6] = [1, 2, 3, 4, 5, 6];

/// Errors from rolling
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("Unknown dice '{0}' (expected dice1-dice4)")]
    UnknownVariant(String),

    #[error("Invalid player number. Must be 1-{max}.")]
    InvalidPlayer { player: u8, max: u8 },
}

/// Dice variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiceVariant {
    /// Two low dice
    Dice1,
    /// One low, one high
    Dice2,
    /// Two high dice
    Dice3,
    /// Two fair dice
    Dice4,
}

impl DiceVariant {
    pub const ALL: [DiceVariant; 4] = [
        DiceVariant::Dice1,
        DiceVariant::Dice2,
        DiceVariant::Dice3,
        DiceVariant::Dice4,
    ];

    /// Pools for the first and second die
    pub fn pools(&self) -> (&'static [u8; 6], &'static [u8; 6]) {
        match self {
            DiceVariant::Dice1 => (&LOW, &LOW),
            DiceVariant::Dice2 => (&LOW, &HIGH),
            DiceVariant::Dice3 => (&HIGH, &HIGH),
            DiceVariant::Dice4 => (&FAIR, &FAIR),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiceVariant::Dice1 => "dice1",
            DiceVariant::Dice2 => "dice2",
            DiceVariant::Dice3 => "dice3",
            DiceVariant::Dice4 => "dice4",
        }
    }
}

impl fmt::Display for DiceVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DiceVariant {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        DiceVariant::ALL
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or(DiceError::UnknownVariant(s))
    }
}

/// Outcome of one roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Roll {
    pub variant: DiceVariant,
    pub player: u8,
    pub first: u8,
    pub second: u8,
}

impl Roll {
    pub fn total(&self) -> u8 {
        self.first + self.second
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rolled by p{} {} + {}",
            self.variant, self.player, self.first, self.second
        )
    }
}

/// Last roll per player
#[derive(Debug, Clone)]
pub struct DiceTable {
    num_players: u8,
    last: HashMap<u8, Roll>,
}

impl DiceTable {
    pub fn new(num_players: u8) -> Self {
        Self {
            num_players,
            last: HashMap::new(),
        }
    }

    /// Roll for `player` using the thread-local generator
    pub fn roll(&mut self, variant: DiceVariant, player: u8) -> Result<Roll, DiceError> {
        self.roll_with(&mut rand::rng(), variant, player)
    }

    /// Roll for `player` with a caller-supplied generator
    pub fn roll_with<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        variant: DiceVariant,
        player: u8,
    ) -> Result<Roll, DiceError> {
        debug!(%variant, player, "DiceTable::roll_with: called");
        if player == 0 || player > self.num_players {
            return Err(DiceError::InvalidPlayer {
                player,
                max: self.num_players,
            });
        }

        let (pool1, pool2) = variant.pools();
        // Pools are fixed, non-empty arrays
        let first = *pool1.choose(rng).unwrap_or(&pool1[0]);
        let second = *pool2.choose(rng).unwrap_or(&pool2[0]);

        let roll = Roll {
            variant,
            player,
            first,
            second,
        };
        self.last.insert(player, roll);
        Ok(roll)
    }

    /// Most recent roll by `player`
    pub fn last_roll(&self, player: u8) -> Option<&Roll> {
        self.last.get(&player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_variant_parse() {
        assert_eq!("dice2".parse::<DiceVariant>().unwrap(), DiceVariant::Dice2);
        assert_eq!("DICE4".parse::<DiceVariant>().unwrap(), DiceVariant::Dice4);
        assert_eq!(
            "dice5".parse::<DiceVariant>(),
            Err(DiceError::UnknownVariant("dice5".to_string()))
        );
    }

    #[test]
    fn test_rolls_stay_in_pools() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut table = DiceTable::new(4);

        for variant in DiceVariant::ALL {
            let (pool1, pool2) = variant.pools();
            for _ in 0..200 {
                let roll = table.roll_with(&mut rng, variant, 1).unwrap();
                assert!(pool1.contains(&roll.first));
                assert!(pool2.contains(&roll.second));
            }
        }
    }

    #[test]
    fn test_dice2_is_low_plus_high() {
        let mut table = DiceTable::new(2);
        let roll = table.roll(DiceVariant::Dice2, 2).unwrap();
        assert!((1..=3).contains(&roll.first));
        assert!((4..=6).contains(&roll.second));
        assert!((5..=9).contains(&roll.total()));
    }

    #[test]
    fn test_invalid_player() {
        let mut table = DiceTable::new(4);
        assert_eq!(
            table.roll(DiceVariant::Dice1, 5),
            Err(DiceError::InvalidPlayer { player: 5, max: 4 })
        );
        assert_eq!(
            table.roll(DiceVariant::Dice1, 0).unwrap_err().to_string(),
            "Invalid player number. Must be 1-4."
        );
        assert!(table.last_roll(5).is_none());
    }

    #[test]
    fn test_last_roll_recorded() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut table = DiceTable::new(4);

        table.roll_with(&mut rng, DiceVariant::Dice4, 3).unwrap();
        let second = table.roll_with(&mut rng, DiceVariant::Dice3, 3).unwrap();

        assert_eq!(table.last_roll(3), Some(&second));
    }

    #[test]
    fn test_roll_display() {
        let roll = Roll {
            variant: DiceVariant::Dice1,
            player: 1,
            first: 2,
            second: 3,
        };
        assert_eq!(roll.to_string(), "dice1 rolled by p1 2 + 3");
    }
}
