use arrayvec::ArrayVec;
use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::grid::Grid;

/// Anchor column for freshly spawned pieces (`COLS / 2 - 2`).
#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub(crate) const PIECE_SPAWN_X: i8 = (Grid::WIDTH / 2) as i8 - 2;
pub(crate) const PIECE_SPAWN_Y: i8 = 0;

/// A piece on the board with position, rotation, kind, and cell shape.
///
/// Pieces are immutable: movement and rotation return new `Piece` values, and
/// the caller decides whether to adopt them after a collision check. This is
/// what keeps every board mutation transactional.
///
/// The `kind` is what the piece *is* (a standard tetromino, a bomb, or a color
/// buster); the `shape` is which tetromino outline its cells follow. For
/// standard pieces both agree, a bomb uses the 2×2 outline, and a buster uses
/// the disguise drawn when it spawned.
///
/// # Example
///
/// ```
/// use blockduel_engine::{Piece, PieceKind};
///
/// let piece = Piece::new(PieceKind::T);
/// let moved = piece.right().unwrap();
/// let rotated = moved.rotated_right();
/// assert_eq!(rotated.kind(), piece.kind());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    position: PiecePosition,
    rotation: PieceRotation,
    kind: SpawnKind,
    shape: PieceKind,
}

impl Piece {
    /// Creates a standard piece at the spawn position.
    #[must_use]
    pub fn new(kind: PieceKind) -> Self {
        Self::with_shape(SpawnKind::Standard(kind), kind)
    }

    /// Creates a bomb piece at the spawn position.
    #[must_use]
    pub fn bomb() -> Self {
        Self::with_shape(SpawnKind::Bomb, PieceKind::O)
    }

    /// Creates a color buster disguised as `disguise`.
    #[must_use]
    pub fn buster(disguise: PieceKind) -> Self {
        Self::with_shape(SpawnKind::Buster, disguise)
    }

    /// Creates a piece of the given kind, drawing a buster disguise from `rng`.
    pub fn spawn<R>(kind: SpawnKind, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        match kind {
            SpawnKind::Standard(kind) => Self::new(kind),
            SpawnKind::Bomb => Self::bomb(),
            SpawnKind::Buster => Self::buster(rng.random()),
        }
    }

    fn with_shape(kind: SpawnKind, shape: PieceKind) -> Self {
        Self {
            position: PiecePosition::SPAWN_POSITION,
            rotation: PieceRotation::default(),
            kind,
            shape,
        }
    }

    #[must_use]
    pub fn position(&self) -> PiecePosition {
        self.position
    }

    #[must_use]
    pub fn rotation(&self) -> PieceRotation {
        self.rotation
    }

    #[must_use]
    pub fn kind(&self) -> SpawnKind {
        self.kind
    }

    /// Outline the piece's cells follow.
    #[must_use]
    pub fn shape(&self) -> PieceKind {
        self.shape
    }

    /// Returns the piece moved to `position`, keeping kind and rotation.
    #[must_use]
    pub fn at(self, position: PiecePosition) -> Self {
        Self { position, ..self }
    }

    /// Absolute grid coordinates `(x, y)` of the piece's cells.
    pub fn occupied_positions(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .occupied_positions(self.rotation)
            .map(move |(dx, dy)| (self.position.x() + dx, self.position.y() + dy))
    }

    /// Snapshot-friendly description, including the buster disguise.
    #[must_use]
    pub fn descriptor(&self) -> PieceDescriptor {
        PieceDescriptor {
            kind: self.kind,
            shape: self.shape,
            rotation: self.rotation,
            position: self.position,
        }
    }

    #[must_use]
    pub fn left(&self) -> Option<Self> {
        self.shifted(-1, 0)
    }

    #[must_use]
    pub fn right(&self) -> Option<Self> {
        self.shifted(1, 0)
    }

    #[must_use]
    pub fn up(&self) -> Option<Self> {
        self.shifted(0, -1)
    }

    #[must_use]
    pub fn down(&self) -> Option<Self> {
        self.shifted(0, 1)
    }

    #[must_use]
    pub fn shifted(&self, dx: i32, dy: i32) -> Option<Self> {
        let position = self.position.shifted(dx, dy)?;
        Some(Self { position, ..*self })
    }

    #[must_use]
    pub fn rotated_right(&self) -> Self {
        Self {
            rotation: self.rotation.rotated_right(),
            ..*self
        }
    }

    #[must_use]
    pub fn rotated_left(&self) -> Self {
        Self {
            rotation: self.rotation.rotated_left(),
            ..*self
        }
    }

    /// Rotates counter-clockwise, resolving collisions with the kick table row
    /// of the destination rotation state.
    #[must_use]
    pub fn super_rotated_left(self, grid: &Grid) -> Option<Self> {
        let rotated = self.rotated_left();
        wall_kick(grid, rotated, rotated.rotation)
    }

    /// Rotates clockwise, resolving collisions with the kick table row of the
    /// source rotation state.
    #[must_use]
    pub fn super_rotated_right(self, grid: &Grid) -> Option<Self> {
        let rotated = self.rotated_right();
        wall_kick(grid, rotated, self.rotation)
    }

    /// Every rotation reachable by repeated clockwise turns from this spot.
    #[must_use]
    pub fn super_rotations(&self, grid: &Grid) -> ArrayVec<Self, 4> {
        let mut rotations = ArrayVec::new();
        rotations.push(*self);
        if self.shape == PieceKind::O {
            return rotations;
        }
        let mut prev = *self;
        for _ in 0..3 {
            let Some(piece) = prev.super_rotated_right(grid) else {
                break;
            };
            rotations.push(piece);
            prev = piece;
        }
        rotations
    }

    #[must_use]
    pub fn simulate_drop_position(&self, grid: &Grid) -> Self {
        let mut dropped = *self;
        while let Some(piece) = dropped.down().filter(|m| !grid.is_colliding(m)) {
            dropped = piece;
        }
        dropped
    }

    /// Whether a T piece sits in a slot with at least 3 of the 4 corners of
    /// its 3×3 box blocked.
    ///
    /// Only the real T kind qualifies; a buster disguised as T does not. The
    /// caller is responsible for checking that the last move was a rotation.
    #[must_use]
    pub fn is_t_slot(&self, grid: &Grid) -> bool {
        if self.kind != SpawnKind::Standard(PieceKind::T) {
            return false;
        }
        let (x, y) = (self.position.x(), self.position.y());
        let blocked = [(0, 0), (2, 0), (0, 2), (2, 2)]
            .into_iter()
            .filter(|&(dx, dy)| grid.is_corner_blocked(x + dx, y + dy))
            .count();
        blocked >= 3
    }
}

/// Wall kick offsets `(dx, dy)`, applied as `x += dx, y -= dy`.
///
/// The first entry of every row is the unkicked rotation.
type KickTable = [[(i8, i8); 5]; 4];

const STANDARD_KICKS: KickTable = [
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
];

const I_KICKS: KickTable = [
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)],
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)],
    [(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)],
    [(0, 0), (1, 0), (-2, 0), (1, -2), (-2, 1)],
];

/// Tries the kick candidates of `row` in order and returns the first rotated
/// piece that fits.
fn wall_kick(grid: &Grid, rotated: Piece, row: PieceRotation) -> Option<Piece> {
    let table = if rotated.shape == PieceKind::I {
        &I_KICKS
    } else {
        &STANDARD_KICKS
    };
    table[row.as_usize()]
        .iter()
        .filter_map(|&(dx, dy)| rotated.shifted(i32::from(dx), -i32::from(dy)))
        .find(|piece| !grid.is_colliding(piece))
}

/// Position of a piece's 4×4 bounding box on the grid.
///
/// The anchor may sit up to two cells outside the grid on the left, right and
/// top, so that every cell of every shape can reach every column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PiecePosition {
    x: i8,
    y: i8,
}

impl PiecePosition {
    pub const SPAWN_POSITION: Self = Self::new(PIECE_SPAWN_X, PIECE_SPAWN_Y);

    const MARGIN: i32 = 2;

    #[must_use]
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn x(self) -> i32 {
        i32::from(self.x)
    }

    #[must_use]
    pub fn y(self) -> i32 {
        i32::from(self.y)
    }

    /// Moves the anchor, or `None` if it would leave the reachable area.
    #[must_use]
    pub fn shifted(self, dx: i32, dy: i32) -> Option<Self> {
        #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        const MAX_X: i32 = Grid::WIDTH as i32;
        #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        const MAX_Y: i32 = Grid::HEIGHT as i32;
        let x = self.x() + dx;
        let y = self.y() + dy;
        if !(-Self::MARGIN..=MAX_X).contains(&x) || !(-Self::MARGIN..=MAX_Y).contains(&y) {
            return None;
        }
        Some(Self {
            x: i8::try_from(x).ok()?,
            y: i8::try_from(y).ok()?,
        })
    }
}

/// Rotation state of a piece.
///
/// - `0`: spawn orientation
/// - `1`: 90° clockwise
/// - `2`: 180°
/// - `3`: 270° clockwise
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PieceRotation(u8);

impl PieceRotation {
    #[must_use]
    pub fn rotated_right(self) -> Self {
        PieceRotation((self.0 + 1) % 4)
    }

    #[must_use]
    pub fn rotated_left(self) -> Self {
        PieceRotation((self.0 + 3) % 4)
    }

    #[must_use]
    pub fn as_u8(self) -> u8 {
        self.0
    }

    const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// The seven standard tetromino kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// S-piece.
    S = 2,
    /// Z-piece.
    Z = 3,
    /// J-piece.
    J = 4,
    /// L-piece.
    L = 5,
    /// T-piece.
    T = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        match rng.random_range(0..=6) {
            0 => PieceKind::I,
            1 => PieceKind::O,
            2 => PieceKind::S,
            3 => PieceKind::Z,
            4 => PieceKind::J,
            5 => PieceKind::L,
            _ => PieceKind::T,
        }
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    pub const ALL: [PieceKind; Self::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
        PieceKind::T,
    ];

    /// Returns the cell offsets `(dx, dy)` of the shape in the given rotation.
    pub fn occupied_positions(self, rotation: PieceRotation) -> impl Iterator<Item = (i32, i32)> {
        let shape = &PIECE_SHAPES[self as usize][rotation.as_usize()];
        (0_u8..4).flat_map(move |dy| {
            (0_u8..4).filter_map(move |dx| {
                shape[usize::from(dy)][usize::from(dx)].then(|| (i32::from(dx), i32::from(dy)))
            })
        })
    }

    /// Display color of locked cells of this kind.
    #[must_use]
    pub const fn color(self) -> CellColor {
        match self {
            PieceKind::I => CellColor::Cyan,
            PieceKind::O => CellColor::Yellow,
            PieceKind::S => CellColor::Green,
            PieceKind::Z => CellColor::Red,
            PieceKind::J => CellColor::Blue,
            PieceKind::L => CellColor::Orange,
            PieceKind::T => CellColor::Purple,
        }
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockduel_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::T => 'T',
        }
    }

    /// Parses a piece kind from a single character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'T' => Some(PieceKind::T),
            _ => None,
        }
    }
}

/// What a queue entry spawns: a standard tetromino or one of the hazards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::IsVariant)]
pub enum SpawnKind {
    Standard(PieceKind),
    /// 2×2 timed bomb; detonates unless one of its rows is cleared in time.
    Bomb,
    /// Color buster; moves like its disguise, removes one color on lock.
    Buster,
}

impl From<PieceKind> for SpawnKind {
    fn from(kind: PieceKind) -> Self {
        SpawnKind::Standard(kind)
    }
}

impl SpawnKind {
    /// `B` for bombs, `*` for busters, the kind letter otherwise.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            SpawnKind::Standard(kind) => kind.as_char(),
            SpawnKind::Bomb => 'B',
            SpawnKind::Buster => '*',
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'B' => Some(SpawnKind::Bomb),
            '*' => Some(SpawnKind::Buster),
            _ => match PieceKind::from_char(c) {
                Some(kind) => Some(SpawnKind::Standard(kind)),
                None => None,
            },
        }
    }
}

impl Serialize for SpawnKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_char(self.as_char())
    }
}

impl<'de> Deserialize<'de> for SpawnKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let c = char::deserialize(deserializer)?;
        SpawnKind::from_char(c)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid spawn kind: {c}")))
    }
}

/// Colors of locked standard cells, in palette order.
///
/// The color buster counts neighbors by color rather than by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellColor {
    Cyan,
    Blue,
    Orange,
    Yellow,
    Green,
    Purple,
    Red,
}

impl CellColor {
    pub const ALL: [CellColor; 7] = [
        CellColor::Cyan,
        CellColor::Blue,
        CellColor::Orange,
        CellColor::Yellow,
        CellColor::Green,
        CellColor::Purple,
        CellColor::Red,
    ];
}

/// Kind, rotation and position of an active piece, as replicated to peers.
///
/// Serializes as `"kind#rotation@x,y"` (e.g. `"S#1@4,18"`). A buster carries
/// its disguise right after the kind: `"*L#0@-1,3"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceDescriptor {
    pub kind: SpawnKind,
    pub shape: PieceKind,
    pub rotation: PieceRotation,
    pub position: PiecePosition,
}

impl PieceDescriptor {
    /// Rebuilds the described piece.
    #[must_use]
    pub fn to_piece(self) -> Piece {
        Piece {
            position: self.position,
            rotation: self.rotation,
            kind: self.kind,
            shape: self.shape,
        }
    }
}

impl Serialize for PieceDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let disguise = match self.kind {
            SpawnKind::Buster => Some(self.shape.as_char()),
            SpawnKind::Standard(_) | SpawnKind::Bomb => None,
        };
        let s = format!(
            "{}{}#{}@{},{}",
            self.kind.as_char(),
            disguise.map(String::from).unwrap_or_default(),
            self.rotation.0,
            self.position.x,
            self.position.y
        );
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for PieceDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let (kind_str, rest) = s.split_once('#').ok_or_else(|| {
            serde::de::Error::custom(format!("expected format 'kind#rotation@x,y', got '{s}'"))
        })?;
        let mut kind_chars = kind_str.chars();
        let (Some(kind_char), shape_char, None) =
            (kind_chars.next(), kind_chars.next(), kind_chars.next())
        else {
            return Err(serde::de::Error::custom(format!(
                "piece kind must be one character plus an optional disguise, got '{kind_str}'"
            )));
        };
        let kind = SpawnKind::from_char(kind_char)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid piece kind: {kind_char}")))?;
        let shape = match (kind, shape_char) {
            (SpawnKind::Standard(kind), None) => kind,
            (SpawnKind::Bomb, None) => PieceKind::O,
            (SpawnKind::Buster, Some(c)) => PieceKind::from_char(c)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid disguise: {c}")))?,
            (SpawnKind::Buster, None) => {
                return Err(serde::de::Error::custom("buster descriptor needs a disguise"));
            }
            (_, Some(c)) => {
                return Err(serde::de::Error::custom(format!(
                    "only busters carry a disguise, got '{c}' after '{kind_char}'"
                )));
            }
        };

        let (rotation_str, position_str) = rest.split_once('@').ok_or_else(|| {
            serde::de::Error::custom(format!(
                "missing '@' in format 'kind#rotation@x,y', got '{s}'"
            ))
        })?;
        let rotation_num = rotation_str.parse::<u8>().map_err(|e| {
            serde::de::Error::custom(format!("invalid rotation: {rotation_str} ({e})"))
        })?;
        if rotation_num > 3 {
            return Err(serde::de::Error::custom(format!(
                "rotation must be 0-3, got {rotation_num}"
            )));
        }

        let (x_str, y_str) = position_str.split_once(',').ok_or_else(|| {
            serde::de::Error::custom(format!(
                "missing ',' in format 'kind#rotation@x,y', got '{s}'"
            ))
        })?;
        let x = x_str
            .parse::<i8>()
            .map_err(|e| serde::de::Error::custom(format!("invalid x position: {x_str} ({e})")))?;
        let y = y_str
            .parse::<i8>()
            .map_err(|e| serde::de::Error::custom(format!("invalid y position: {y_str} ({e})")))?;

        Ok(PieceDescriptor {
            kind,
            shape,
            rotation: PieceRotation(rotation_num),
            position: PiecePosition::new(x, y),
        })
    }
}

/// Piece shape within its 4×4 bounding box.
type PieceShape = [[bool; 4]; 4];

/// Generates all 4 rotation states of a piece shape by rotating 90° clockwise.
///
/// # Arguments
///
/// * `size` - Effective size of the piece (3 for most pieces, 4 for I, 2 for O)
/// * `shape` - Initial piece shape at 0° rotation
const fn shape_rotations(size: usize, shape: &PieceShape) -> [PieceShape; 4] {
    let mut rotates = [*shape; 4];
    let mut i = 1;
    while i < 4 {
        let mut new_shape = [[false; 4]; 4];
        let mut y = 0;
        while y < size {
            let mut x = 0;
            while x < size {
                new_shape[y][x] = rotates[i - 1][size - 1 - x][y];
                x += 1;
            }
            y += 1;
        }
        rotates[i] = new_shape;
        i += 1;
    }
    rotates
}

const PIECE_SHAPES: [[PieceShape; 4]; PieceKind::LEN] = {
    const C: bool = true;
    const E: bool = false;
    const EEEE: [bool; 4] = [E; 4];
    [
        // I-piece
        shape_rotations(4, &[EEEE, [C, C, C, C], EEEE, EEEE]),
        // O-piece
        shape_rotations(2, &[[C, C, E, E], [C, C, E, E], EEEE, EEEE]),
        // S-piece
        shape_rotations(3, &[[E, C, C, E], [C, C, E, E], EEEE, EEEE]),
        // Z-piece
        shape_rotations(3, &[[C, C, E, E], [E, C, C, E], EEEE, EEEE]),
        // J-piece
        shape_rotations(3, &[[C, E, E, E], [C, C, C, E], EEEE, EEEE]),
        // L-piece
        shape_rotations(3, &[[E, E, C, E], [C, C, C, E], EEEE, EEEE]),
        // T-piece
        shape_rotations(3, &[[E, C, E, E], [C, C, C, E], EEEE, EEEE]),
    ]
};
