//! Card Pool
//!
//! Pre-generated cards shared read-only by every round. The pool is loaded
//! once at startup and never mutated afterwards.

use crate::games::types::{BingoCard, CardError, CardId, CardLayout, Letter, FREE_SPACE, GRID_SIZE};
use rand::{rngs::StdRng, seq::index::sample, Rng, SeedableRng};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Generate a standard card: five distinct numbers per letter from its range
pub fn generate_card<R: Rng + ?Sized>(id: CardId, rng: &mut R) -> BingoCard {
    let mut columns: [Vec<u8>; GRID_SIZE] = Default::default();
    for letter in Letter::ALL {
        let (low, high) = letter.range();
        let span = (high - low + 1) as usize;
        let mut picked: Vec<u8> = sample(rng, span, GRID_SIZE)
            .into_iter()
            .map(|offset| low + offset as u8)
            .collect();
        if letter == Letter::N {
            picked[2] = FREE_SPACE;
        }
        columns[letter.index()] = picked;
    }

    // Letter ranges are disjoint and samples are distinct, so this cannot fail.
    match BingoCard::new(id, &columns[0], &columns[1], &columns[2], &columns[3], &columns[4]) {
        Ok(card) => card,
        Err(e) => unreachable!("generated card is always valid: {}", e),
    }
}

/// Failures while building or loading the pool
#[derive(Debug, thiserror::Error)]
pub enum CardPoolError {
    #[error(transparent)]
    InvalidCard(#[from] CardError),

    #[error("failed to read card pool {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse card pool {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only registry of every card a hall can sell
#[derive(Debug, Clone, Default)]
pub struct CardRegistry {
    cards: Arc<HashMap<CardId, BingoCard>>,
}

impl CardRegistry {
    /// Build a registry, rejecting repeated ids
    pub fn from_cards(cards: impl IntoIterator<Item = BingoCard>) -> Result<Self, CardError> {
        let mut map = HashMap::new();
        for card in cards {
            let id = card.id();
            if map.insert(id, card).is_some() {
                return Err(CardError::DuplicateId(id));
            }
        }
        Ok(Self { cards: Arc::new(map) })
    }

    /// Deterministic pool of `size` cards numbered from 1
    pub fn generate(size: u32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let map = (1..=size)
            .map(|n| {
                let card = generate_card(CardId(n), &mut rng);
                (card.id(), card)
            })
            .collect();
        Self { cards: Arc::new(map) }
    }

    /// Load a JSON array of card layouts
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, CardPoolError> {
        let display = path.as_ref().display().to_string();
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| CardPoolError::Read {
            path: display.clone(),
            source,
        })?;
        let layouts: Vec<CardLayout> =
            serde_json::from_str(&content).map_err(|source| CardPoolError::Parse {
                path: display,
                source,
            })?;

        let cards = layouts
            .into_iter()
            .map(BingoCard::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_cards(cards)?)
    }

    pub fn get(&self, id: CardId) -> Option<&BingoCard> {
        self.cards.get(&id)
    }

    pub fn contains(&self, id: CardId) -> bool {
        self.cards.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Card ids in ascending order
    pub fn ids(&self) -> Vec<CardId> {
        let mut ids: Vec<CardId> = self.cards.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
