//! Bingo Domain Types
//!
//! Cards, called numbers and pattern names shared by the engines and the API.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

/// Highest number that can be called in a round
pub const MAX_NUMBER: u8 = 75;

/// Cells per side of the card grid
pub const GRID_SIZE: usize = 5;

/// Sentinel stored in the centre of the N column
pub const FREE_SPACE: u8 = 0;

/// Position of the free space on the grid
pub const FREE_CELL: Cell = Cell { row: 2, col: 2 };

/// Card column letters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Letter {
    B,
    I,
    N,
    G,
    O,
}

impl Letter {
    pub const ALL: [Letter; GRID_SIZE] = [Letter::B, Letter::I, Letter::N, Letter::G, Letter::O];

    /// Grid index of the letter
    pub fn index(self) -> usize {
        self as usize
    }

    /// Inclusive number range a standard card draws this letter from
    pub fn range(self) -> (u8, u8) {
        let low = self.index() as u8 * 15 + 1;
        (low, low + 14)
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Letter::B => "B",
            Letter::I => "I",
            Letter::N => "N",
            Letter::G => "G",
            Letter::O => "O",
        };
        write!(f, "{}", c)
    }
}

/// Identifier of a card in the shared pool
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A grid coordinate.
///
/// The grid is letter-major: `row` is the letter index (B = 0 .. O = 4) and
/// `col` is the position inside that letter's sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: u8,
    pub col: u8,
}

impl Cell {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

/// Card layout as it arrives from storage or a request body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub struct CardLayout {
    #[serde(rename = "id")]
    pub id: u32,
    pub b: Vec<u8>,
    pub i: Vec<u8>,
    pub n: Vec<u8>,
    pub g: Vec<u8>,
    pub o: Vec<u8>,
}

/// Reasons a card layout is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardError {
    #[error("card {card}: column {letter} has {len} numbers, expected 5")]
    WrongColumnLength { card: CardId, letter: Letter, len: usize },

    #[error("card {card}: centre of column N must be the free space (0), found {found}")]
    MissingFreeSpace { card: CardId, found: u8 },

    #[error("card {card}: number {number} in column {letter} is outside 1..=75")]
    NumberOutOfRange { card: CardId, letter: Letter, number: u8 },

    #[error("card {card}: number {number} appears more than once")]
    DuplicateNumber { card: CardId, number: u8 },

    #[error("duplicate card id {0} in pool")]
    DuplicateId(CardId),
}

/// An immutable, validated bingo card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BingoCard {
    id: CardId,
    columns: [[u8; GRID_SIZE]; GRID_SIZE],
}

impl BingoCard {
    /// Build a card from its five letter columns
    pub fn new(
        id: CardId,
        b: &[u8],
        i: &[u8],
        n: &[u8],
        g: &[u8],
        o: &[u8],
    ) -> Result<Self, CardError> {
        let mut columns = [[0u8; GRID_SIZE]; GRID_SIZE];
        for (letter, source) in Letter::ALL.into_iter().zip([b, i, n, g, o]) {
            if source.len() != GRID_SIZE {
                return Err(CardError::WrongColumnLength {
                    card: id,
                    letter,
                    len: source.len(),
                });
            }
            columns[letter.index()].copy_from_slice(source);
        }

        let centre = columns[FREE_CELL.row as usize][FREE_CELL.col as usize];
        if centre != FREE_SPACE {
            return Err(CardError::MissingFreeSpace { card: id, found: centre });
        }

        let mut seen = [false; MAX_NUMBER as usize + 1];
        for letter in Letter::ALL {
            for (pos, &number) in columns[letter.index()].iter().enumerate() {
                if letter == Letter::N && pos == FREE_CELL.col as usize {
                    continue;
                }
                if number == 0 || number > MAX_NUMBER {
                    return Err(CardError::NumberOutOfRange { card: id, letter, number });
                }
                if seen[number as usize] {
                    return Err(CardError::DuplicateNumber { card: id, number });
                }
                seen[number as usize] = true;
            }
        }

        Ok(Self { id, columns })
    }

    pub fn id(&self) -> CardId {
        self.id
    }

    /// Numbers of one letter column
    pub fn column(&self, letter: Letter) -> &[u8; GRID_SIZE] {
        &self.columns[letter.index()]
    }

    /// Number at a grid cell (0 for the free space)
    pub fn number_at(&self, cell: Cell) -> u8 {
        self.columns[cell.row as usize][cell.col as usize]
    }

    /// Iterate every cell with its number, letter-major
    pub fn cells(&self) -> impl Iterator<Item = (Cell, u8)> + '_ {
        (0..GRID_SIZE).flat_map(move |row| {
            (0..GRID_SIZE).map(move |col| {
                (Cell::new(row as u8, col as u8), self.columns[row][col])
            })
        })
    }

    pub fn to_layout(&self) -> CardLayout {
        CardLayout {
            id: self.id.0,
            b: self.columns[0].to_vec(),
            i: self.columns[1].to_vec(),
            n: self.columns[2].to_vec(),
            g: self.columns[3].to_vec(),
            o: self.columns[4].to_vec(),
        }
    }
}

impl TryFrom<CardLayout> for BingoCard {
    type Error = CardError;

    fn try_from(layout: CardLayout) -> Result<Self, Self::Error> {
        BingoCard::new(
            CardId(layout.id),
            &layout.b,
            &layout.i,
            &layout.n,
            &layout.g,
            &layout.o,
        )
    }
}

impl Serialize for BingoCard {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_layout().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BingoCard {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let layout = CardLayout::deserialize(deserializer)?;
        BingoCard::try_from(layout).map_err(serde::de::Error::custom)
    }
}

/// Anything that can answer "has this number been called?"
pub trait CalledSet {
    fn contains_number(&self, number: u8) -> bool;
}

impl CalledSet for HashSet<u8> {
    fn contains_number(&self, number: u8) -> bool {
        self.contains(&number)
    }
}

impl CalledSet for BTreeSet<u8> {
    fn contains_number(&self, number: u8) -> bool {
        self.contains(&number)
    }
}

impl CalledSet for [u8] {
    fn contains_number(&self, number: u8) -> bool {
        self.contains(&number)
    }
}

impl CalledSet for Vec<u8> {
    fn contains_number(&self, number: u8) -> bool {
        self.contains(&number)
    }
}

/// Rejected calls
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("number {0} is outside 1..=75")]
    OutOfRange(u8),

    #[error("number {0} has already been called")]
    AlreadyCalled(u8),
}

/// Append-only sequence of unique called numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalledNumbers {
    order: Vec<u8>,
    seen: [bool; MAX_NUMBER as usize + 1],
}

impl CalledNumbers {
    pub fn new() -> Self {
        Self {
            order: Vec::with_capacity(MAX_NUMBER as usize),
            seen: [false; MAX_NUMBER as usize + 1],
        }
    }

    /// Append a number
    pub fn call(&mut self, number: u8) -> Result<(), CallError> {
        if number == 0 || number > MAX_NUMBER {
            return Err(CallError::OutOfRange(number));
        }
        if self.seen[number as usize] {
            return Err(CallError::AlreadyCalled(number));
        }
        self.seen[number as usize] = true;
        self.order.push(number);
        Ok(())
    }

    pub fn contains(&self, number: u8) -> bool {
        number <= MAX_NUMBER && self.seen[number as usize]
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn last(&self) -> Option<u8> {
        self.order.last().copied()
    }

    /// Called numbers in call order
    pub fn as_slice(&self) -> &[u8] {
        &self.order
    }

    /// Numbers not yet called, ascending
    pub fn remaining(&self) -> Vec<u8> {
        (1..=MAX_NUMBER).filter(|n| !self.seen[*n as usize]).collect()
    }

    pub fn reset(&mut self) {
        self.order.clear();
        self.seen = [false; MAX_NUMBER as usize + 1];
    }
}

impl Default for CalledNumbers {
    fn default() -> Self {
        Self::new()
    }
}

impl CalledSet for CalledNumbers {
    fn contains_number(&self, number: u8) -> bool {
        self.contains(number)
    }
}

impl TryFrom<&[u8]> for CalledNumbers {
    type Error = CallError;

    fn try_from(numbers: &[u8]) -> Result<Self, Self::Error> {
        let mut called = CalledNumbers::new();
        for &n in numbers {
            called.call(n)?;
        }
        Ok(called)
    }
}

impl Serialize for CalledNumbers {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.order.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CalledNumbers {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let numbers = Vec::<u8>::deserialize(deserializer)?;
        CalledNumbers::try_from(numbers.as_slice()).map_err(serde::de::Error::custom)
    }
}

/// Winning pattern requested by a card check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    OneLine,
    TwoLine,
    ThreeLine,
    Diagonals,
    X,
    OuterSquare,
    InnerSquare,
    /// Fallback for unrecognised names: any row, column or diagonal
    AnyLine,
}

impl PatternKind {
    pub fn name(self) -> &'static str {
        match self {
            PatternKind::OneLine => "1line",
            PatternKind::TwoLine => "2line",
            PatternKind::ThreeLine => "3line",
            PatternKind::Diagonals => "diagonals",
            PatternKind::X => "x",
            PatternKind::OuterSquare => "outerSquare",
            PatternKind::InnerSquare => "innerSquare",
            PatternKind::AnyLine => "default",
        }
    }

    /// Map a wire name; unknown names select the any-line rule
    pub fn from_name(name: &str) -> Self {
        match name {
            "1line" => PatternKind::OneLine,
            "2line" => PatternKind::TwoLine,
            "3line" => PatternKind::ThreeLine,
            "diagonals" => PatternKind::Diagonals,
            "x" => PatternKind::X,
            "outerSquare" => PatternKind::OuterSquare,
            "innerSquare" => PatternKind::InnerSquare,
            _ => PatternKind::AnyLine,
        }
    }

    /// Number of distinct kinds required by the multi-line patterns
    pub fn required_kinds(self) -> Option<usize> {
        match self {
            PatternKind::OneLine => Some(1),
            PatternKind::TwoLine => Some(2),
            PatternKind::ThreeLine => Some(3),
            _ => None,
        }
    }
}

impl FromStr for PatternKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PatternKind::from_name(s))
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for PatternKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for PatternKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(PatternKind::from_name(&name))
    }
}

/// Classification used by the 1line/2line/3line thresholds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    Horizontal,
    Vertical,
    Diagonal,
    InnerSquare,
    OuterSquare,
    X,
}

/// Outcome of evaluating a card against a pattern
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WinResult {
    pub is_winner: bool,
    pub winning_cells: Vec<Cell>,
}

impl WinResult {
    pub fn loss() -> Self {
        Self {
            is_winner: false,
            winning_cells: Vec::new(),
        }
    }
}
