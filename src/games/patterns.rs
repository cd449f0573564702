//! Pattern Engine
//!
//! Decides whether a card satisfies a winning pattern for the numbers called
//! so far, and reports the cells that made it win. Pure and deterministic.

use crate::games::types::{
    BingoCard, CalledSet, Cell, PatternKind, ShapeKind, WinResult, FREE_CELL, GRID_SIZE,
};

const LAST: u8 = GRID_SIZE as u8 - 1;

const OUTER_CORNERS: [Cell; 4] = [
    Cell::new(0, 0),
    Cell::new(0, LAST),
    Cell::new(LAST, 0),
    Cell::new(LAST, LAST),
];

const INNER_CORNERS: [Cell; 4] = [
    Cell::new(1, 1),
    Cell::new(1, LAST - 1),
    Cell::new(LAST - 1, 1),
    Cell::new(LAST - 1, LAST - 1),
];

/// A concrete set of cells that is either fully marked or not
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseShape {
    Row(u8),
    Column(u8),
    MainDiagonal,
    AntiDiagonal,
    OuterSquare,
    InnerSquare,
}

impl BaseShape {
    /// Cells covered by the shape
    pub fn cells(self) -> Vec<Cell> {
        let n = GRID_SIZE as u8;
        match self {
            BaseShape::Row(r) => (0..n).map(|c| Cell::new(r, c)).collect(),
            BaseShape::Column(c) => (0..n).map(|r| Cell::new(r, c)).collect(),
            BaseShape::MainDiagonal => (0..n).map(|i| Cell::new(i, i)).collect(),
            BaseShape::AntiDiagonal => (0..n).map(|i| Cell::new(i, LAST - i)).collect(),
            BaseShape::OuterSquare => OUTER_CORNERS.to_vec(),
            BaseShape::InnerSquare => INNER_CORNERS.to_vec(),
        }
    }

    /// Every base shape in evaluation order
    pub fn all() -> Vec<BaseShape> {
        let n = GRID_SIZE as u8;
        let mut shapes = Vec::with_capacity(14);
        shapes.extend((0..n).map(BaseShape::Row));
        shapes.extend((0..n).map(BaseShape::Column));
        shapes.extend([
            BaseShape::MainDiagonal,
            BaseShape::AntiDiagonal,
            BaseShape::OuterSquare,
            BaseShape::InnerSquare,
        ]);
        shapes
    }

    fn is_line(self) -> bool {
        !matches!(self, BaseShape::OuterSquare | BaseShape::InnerSquare)
    }

    fn is_diagonal(self) -> bool {
        matches!(self, BaseShape::MainDiagonal | BaseShape::AntiDiagonal)
    }
}

/// Marked state of one card, computed once per evaluation
#[derive(Debug, Clone)]
pub struct MarkedGrid {
    marked: [[bool; GRID_SIZE]; GRID_SIZE],
}

impl MarkedGrid {
    pub fn new<S: CalledSet + ?Sized>(card: &BingoCard, called: &S) -> Self {
        let mut marked = [[false; GRID_SIZE]; GRID_SIZE];
        for (cell, number) in card.cells() {
            marked[cell.row as usize][cell.col as usize] =
                cell == FREE_CELL || called.contains_number(number);
        }
        Self { marked }
    }

    pub fn is_marked(&self, cell: Cell) -> bool {
        self.marked[cell.row as usize][cell.col as usize]
    }

    pub fn is_complete(&self, shape: BaseShape) -> bool {
        shape.cells().into_iter().all(|cell| self.is_marked(cell))
    }
}

/// The base shapes a card has completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseShapes {
    completed: Vec<BaseShape>,
}

impl BaseShapes {
    pub fn detect<S: CalledSet + ?Sized>(card: &BingoCard, called: &S) -> Self {
        let grid = MarkedGrid::new(card, called);
        let completed = BaseShape::all()
            .into_iter()
            .filter(|shape| grid.is_complete(*shape))
            .collect();
        Self { completed }
    }

    pub fn completed(&self) -> &[BaseShape] {
        &self.completed
    }

    fn has(&self, shape: BaseShape) -> bool {
        self.completed.contains(&shape)
    }

    fn any(&self, pred: impl Fn(BaseShape) -> bool) -> bool {
        self.completed.iter().any(|s| pred(*s))
    }

    /// Distinct pattern kinds present, in a stable order
    pub fn kinds(&self) -> Vec<ShapeKind> {
        let mut kinds = Vec::new();
        if self.any(|s| matches!(s, BaseShape::Row(_))) {
            kinds.push(ShapeKind::Horizontal);
        }
        if self.any(|s| matches!(s, BaseShape::Column(_))) {
            kinds.push(ShapeKind::Vertical);
        }
        if self.any(BaseShape::is_diagonal) {
            kinds.push(ShapeKind::Diagonal);
        }
        if self.has(BaseShape::InnerSquare) {
            kinds.push(ShapeKind::InnerSquare);
        }
        if self.has(BaseShape::OuterSquare) {
            kinds.push(ShapeKind::OuterSquare);
        }
        if self.has(BaseShape::MainDiagonal) && self.has(BaseShape::AntiDiagonal) {
            kinds.push(ShapeKind::X);
        }
        kinds
    }

    /// Union of the cells of the selected shapes, first occurrence kept
    fn cells_of(&self, select: impl Fn(BaseShape) -> bool) -> Vec<Cell> {
        let mut cells: Vec<Cell> = Vec::new();
        for shape in self.completed.iter().copied().filter(|s| select(*s)) {
            for cell in shape.cells() {
                if !cells.contains(&cell) {
                    cells.push(cell);
                }
            }
        }
        cells
    }
}

fn result(is_winner: bool, cells: impl FnOnce() -> Vec<Cell>) -> WinResult {
    if is_winner {
        WinResult {
            is_winner,
            winning_cells: cells(),
        }
    } else {
        WinResult::loss()
    }
}

/// Evaluate a card against a pattern
pub fn evaluate<S: CalledSet + ?Sized>(
    card: &BingoCard,
    called: &S,
    pattern: PatternKind,
) -> WinResult {
    let shapes = BaseShapes::detect(card, called);
    evaluate_shapes(&shapes, pattern)
}

/// Apply a pattern's composition rule to already detected shapes
pub fn evaluate_shapes(shapes: &BaseShapes, pattern: PatternKind) -> WinResult {
    match pattern {
        PatternKind::OneLine | PatternKind::TwoLine | PatternKind::ThreeLine => {
            let required = pattern.required_kinds().unwrap_or(1);
            result(shapes.kinds().len() >= required, || shapes.cells_of(|_| true))
        }
        PatternKind::Diagonals => result(shapes.any(BaseShape::is_diagonal), || {
            shapes.cells_of(BaseShape::is_diagonal)
        }),
        PatternKind::X => result(
            shapes.has(BaseShape::MainDiagonal) && shapes.has(BaseShape::AntiDiagonal),
            || shapes.cells_of(BaseShape::is_diagonal),
        ),
        PatternKind::OuterSquare => result(shapes.has(BaseShape::OuterSquare), || {
            OUTER_CORNERS.to_vec()
        }),
        PatternKind::InnerSquare => result(shapes.has(BaseShape::InnerSquare), || {
            INNER_CORNERS.to_vec()
        }),
        PatternKind::AnyLine => result(shapes.any(BaseShape::is_line), || {
            shapes.cells_of(BaseShape::is_line)
        }),
    }
}

/// Distinct kinds a card has completed
pub fn completed_kinds<S: CalledSet + ?Sized>(card: &BingoCard, called: &S) -> Vec<ShapeKind> {
    BaseShapes::detect(card, called).kinds()
}
