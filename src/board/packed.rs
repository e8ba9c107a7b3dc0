//! Packed board representation.
//!
//! The board is eight 32-bit rows, four bits per square: one color bit and a
//! 3-bit piece-type code, with an all-zero slot meaning empty. Castling
//! bookkeeping lives in a single flags byte (four flags per color). The rows
//! plus the flags byte form the 33-byte structural hash, a bijective encoding
//! of board content.
//!
//! Boards are cloned on every move application during search. Clones share
//! the handle to the same move/attack caches but own their content, so no
//! board state is ever shared across concurrent search paths.

use std::fmt;
use std::sync::Arc;

use crate::cache::ShardedCache;

use super::types::{BitBoard, Color, LastMove, Location, Move, PieceKind};

/// Per-color board flags packed into the flags byte.
///
/// White occupies bits 0-3, Black bits 4-7.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoardFlag {
    KingMoved = 0,
    Castled = 1,
    QueensideRookMoved = 2,
    KingsideRookMoved = 3,
}

impl BoardFlag {
    #[inline]
    const fn mask(self, color: Color) -> u8 {
        (1u8 << (self as u8)) << (4 * color.index())
    }
}

/// The 33-byte structural board hash.
///
/// Bytes 0-31 are the eight packed rows (four little-endian bytes each);
/// byte 32 is the flags byte. Identical content produces identical hashes
/// and distinct content produces distinct hashes; this is an encoding, not
/// a digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardHash([u8; 33]);

impl BoardHash {
    /// The four leading 64-bit words (bytes 0-31), used as the outer cache
    /// key.
    #[inline]
    #[must_use]
    pub fn words(&self) -> [u64; 4] {
        std::array::from_fn(|i| {
            let mut word = [0u8; 8];
            word.copy_from_slice(&self.0[i * 8..i * 8 + 8]);
            u64::from_le_bytes(word)
        })
    }

    /// The trailing flags byte (byte 32), used as the inner cache key.
    #[inline]
    #[must_use]
    pub const fn tail(&self) -> u8 {
        self.0[32]
    }

    /// The raw 33 bytes.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }
}

impl fmt::Debug for BoardHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoardHash(")?;
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

/// Move and attack caches shared by every clone of a board.
///
/// Keyed by (structural hash, color); legality filtering is expensive enough
/// that recomputing these per transposition would dominate search time.
pub(crate) struct BoardCaches {
    pub(crate) moves: ShardedCache<Arc<Vec<Move>>>,
    pub(crate) attacks: ShardedCache<BitBoard>,
}

impl BoardCaches {
    fn new() -> Self {
        BoardCaches {
            moves: ShardedCache::new(),
            attacks: ShardedCache::new(),
        }
    }

    pub(crate) fn clear(&self) {
        self.moves.clear();
        self.attacks.clear();
    }
}

/// The packed chess board.
#[derive(Clone)]
pub struct PackedBoard {
    /// Eight rows, four bits per square (color bit + 3-bit type code).
    rows: [u32; 8],
    /// Castling flags, four bits per color.
    flags: u8,
    /// Cached king locations per color.
    kings: [Option<Location>; 2],
    /// Half-moves since the last pawn move or capture (fifty-move rule).
    halfmove_clock: u32,
    /// Hashes of every position reached, for threefold repetition.
    history: Vec<BoardHash>,
    /// Shared move/attack caches; clones share the same instance.
    caches: Arc<BoardCaches>,
}

impl PackedBoard {
    /// The standard starting position.
    #[must_use]
    pub fn new() -> Self {
        let mut board = PackedBoard::empty();
        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (col, kind) in back_rank.iter().enumerate() {
            board.set_piece(Location(0, col), Color::White, *kind);
            board.set_piece(Location(7, col), Color::Black, *kind);
            board.set_piece(Location(1, col), Color::White, PieceKind::Pawn);
            board.set_piece(Location(6, col), Color::Black, PieceKind::Pawn);
        }
        board.history.push(board.hash());
        board
    }

    /// An empty board with no pieces and no flags set.
    #[must_use]
    pub fn empty() -> Self {
        PackedBoard {
            rows: [0; 8],
            flags: 0,
            kings: [None; 2],
            halfmove_clock: 0,
            history: Vec::new(),
            caches: Arc::new(BoardCaches::new()),
        }
    }

    /// Decode the piece at a square.
    ///
    /// # Panics
    /// Panics if the slot holds the unused type code 7, which indicates
    /// corrupted board state.
    #[must_use]
    pub fn piece_at(&self, loc: Location) -> Option<(Color, PieceKind)> {
        let nibble = (self.rows[loc.row()] >> (loc.col() * 4)) & 0xF;
        let code = nibble & 0b111;
        if code == 0 {
            return None;
        }
        let Some(kind) = PieceKind::from_code(code) else {
            panic!("corrupted board: unknown piece code {code} at {loc}");
        };
        let color = if nibble & 0b1000 != 0 {
            Color::Black
        } else {
            Color::White
        };
        Some((color, kind))
    }

    /// Place a piece, overwriting whatever occupied the square.
    pub fn set_piece(&mut self, loc: Location, color: Color, kind: PieceKind) {
        let shift = loc.col() * 4;
        let color_bit = (color.index() as u32) << 3;
        let nibble = color_bit | kind.code();
        self.rows[loc.row()] = (self.rows[loc.row()] & !(0xF << shift)) | (nibble << shift);
        if kind == PieceKind::King {
            self.kings[color.index()] = Some(loc);
        }
    }

    /// Empty a square.
    pub fn clear_square(&mut self, loc: Location) {
        if let Some((color, PieceKind::King)) = self.piece_at(loc) {
            self.kings[color.index()] = None;
        }
        self.rows[loc.row()] &= !(0xF << (loc.col() * 4));
    }

    /// Read a castling flag for a color.
    #[inline]
    #[must_use]
    pub fn flag(&self, flag: BoardFlag, color: Color) -> bool {
        self.flags & flag.mask(color) != 0
    }

    /// Set or clear a castling flag for a color.
    #[inline]
    pub fn set_flag(&mut self, flag: BoardFlag, color: Color, value: bool) {
        if value {
            self.flags |= flag.mask(color);
        } else {
            self.flags &= !flag.mask(color);
        }
    }

    /// The cached king location for a color, if a king is on the board.
    #[inline]
    #[must_use]
    pub fn king(&self, color: Color) -> Option<Location> {
        self.kings[color.index()]
    }

    /// The structural hash of the current content: packed rows plus flags.
    /// Depends on nothing else, so mutating a clone never changes the
    /// original's hash.
    #[must_use]
    pub fn hash(&self) -> BoardHash {
        let mut bytes = [0u8; 33];
        for (r, row) in self.rows.iter().enumerate() {
            bytes[r * 4..r * 4 + 4].copy_from_slice(&row.to_le_bytes());
        }
        bytes[32] = self.flags;
        BoardHash(bytes)
    }

    /// Raw access to a packed row; `0` means the whole row is empty.
    #[inline]
    #[must_use]
    pub(crate) fn row_bits(&self, row: usize) -> u32 {
        self.rows[row]
    }

    /// Half-moves since the last pawn move or capture.
    #[inline]
    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub(crate) fn set_halfmove_clock(&mut self, clock: u32) {
        self.halfmove_clock = clock;
    }

    /// Fifty-move rule: 100 quiet half-moves make the position claimable as
    /// a draw.
    #[must_use]
    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Threefold repetition over the positions reached so far.
    #[must_use]
    pub fn is_threefold_repetition(&self) -> bool {
        let current = self.hash();
        self.history.iter().filter(|h| **h == current).count() >= 3
    }

    /// Apply a move and return the record used for en passant and
    /// draw-counter context at the next ply.
    ///
    /// The move is assumed to come from move generation; legality is not
    /// re-checked here.
    ///
    /// # Panics
    /// Panics if `mv.from == mv.to` (a programmer error; the board is left
    /// unmodified) or if the source square is empty.
    pub fn make_move(&mut self, mv: Move) -> LastMove {
        assert!(
            mv.from != mv.to,
            "move with identical start and end square: {mv}"
        );
        let Some((color, kind)) = self.piece_at(mv.from) else {
            panic!("no piece to move at {}", mv.from);
        };
        let mut is_capture = self.piece_at(mv.to).is_some();

        let promotion = if kind == PieceKind::Pawn && mv.to.row() == color.pawn_promotion_row() {
            Some(mv.promotion.unwrap_or(PieceKind::Queen))
        } else {
            None
        };

        self.clear_square(mv.from);
        self.set_piece(mv.to, color, promotion.unwrap_or(kind));

        // Post-move side effects, dispatched on the moved piece's kind.
        match kind {
            PieceKind::King => {
                if mv.from.col().abs_diff(mv.to.col()) == 2 {
                    self.relocate_castling_rook(color, mv.to.col());
                    self.set_flag(BoardFlag::Castled, color, true);
                }
                self.set_flag(BoardFlag::KingMoved, color, true);
            }
            PieceKind::Rook => {
                let row = color.back_row();
                if mv.from == Location(row, 0) {
                    self.set_flag(BoardFlag::QueensideRookMoved, color, true);
                } else if mv.from == Location(row, 7) {
                    self.set_flag(BoardFlag::KingsideRookMoved, color, true);
                }
            }
            PieceKind::Pawn => {
                // A diagonal pawn move onto an empty square is en passant;
                // the captured pawn sits beside the destination.
                if mv.from.col() != mv.to.col() && !is_capture {
                    self.clear_square(Location(mv.from.row(), mv.to.col()));
                    is_capture = true;
                }
            }
            _ => {}
        }

        if kind == PieceKind::Pawn || is_capture {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        self.history.push(self.hash());

        LastMove {
            piece: kind,
            mv,
            promotion,
            is_capture,
        }
    }

    fn relocate_castling_rook(&mut self, color: Color, king_dest_col: usize) {
        let row = color.back_row();
        let (rook_from, rook_to) = if king_dest_col == 6 {
            (Location(row, 7), Location(row, 5))
        } else {
            (Location(row, 0), Location(row, 3))
        };
        self.clear_square(rook_from);
        self.set_piece(rook_to, color, PieceKind::Rook);
        if king_dest_col == 6 {
            self.set_flag(BoardFlag::KingsideRookMoved, color, true);
        } else {
            self.set_flag(BoardFlag::QueensideRookMoved, color, true);
        }
    }

    /// Shared move/attack caches; clones of this board hand back the same
    /// instance.
    pub(crate) fn caches(&self) -> &BoardCaches {
        &self.caches
    }

    /// Drop all cached move lists and attack maps. Call between games;
    /// nothing is evicted implicitly.
    pub fn clear_caches(&self) {
        self.caches.clear();
    }
}

impl PartialEq for PackedBoard {
    /// Boards are equal when their content (rows and flags) is equal;
    /// counters, history, and caches do not participate.
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.flags == other.flags
    }
}

impl Eq for PackedBoard {}

impl Default for PackedBoard {
    fn default() -> Self {
        PackedBoard::new()
    }
}

impl fmt::Display for PackedBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in (0..8).rev() {
            write!(f, "{} ", row + 1)?;
            for col in 0..8 {
                match self.piece_at(Location(row, col)) {
                    Some((color, kind)) => write!(f, "{} ", kind.to_fen_char(color))?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}

impl fmt::Debug for PackedBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")?;
        write!(f, "flags: {:08b}, halfmove clock: {}", self.flags, self.halfmove_clock)
    }
}
