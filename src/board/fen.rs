//! FEN parsing and formatting.
//!
//! A development and test surface: positions are described in
//! Forsyth-Edwards Notation and loaded into a packed board. The en passant
//! field is accepted but ignored, because en passant context travels as a
//! `LastMove` between plies rather than as board state.

use super::error::FenError;
use super::packed::{BoardFlag, PackedBoard};
use super::types::{Color, Location, PieceKind};

impl PackedBoard {
    /// Parse a FEN string into a board and the side to move.
    ///
    /// Castling rights map onto the flags byte: a missing right marks the
    /// corresponding rook (and, when both rights are gone, the king) as
    /// having moved.
    pub fn from_fen(fen: &str) -> Result<(PackedBoard, Color), FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::TooFewParts { found: parts.len() });
        }

        let mut board = PackedBoard::empty();

        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() > 8 {
            return Err(FenError::TooManyRanks { ranks: ranks.len() });
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let row = 7 - i;
            let mut col = 0usize;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    col += skip as usize;
                } else {
                    let kind = PieceKind::from_char(c).ok_or(FenError::InvalidPiece { char: c })?;
                    let color = if c.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    if col >= 8 {
                        return Err(FenError::TooManyFiles {
                            rank: row,
                            files: col + 1,
                        });
                    }
                    board.set_piece(Location(row, col), color, kind);
                    col += 1;
                }
                if col > 8 {
                    return Err(FenError::TooManyFiles { rank: row, files: col });
                }
            }
        }

        let to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => {
                return Err(FenError::InvalidSideToMove {
                    found: other.to_string(),
                })
            }
        };

        // Start from "everything has moved" and clear flags per granted right.
        for color in Color::BOTH {
            board.set_flag(BoardFlag::KingMoved, color, true);
            board.set_flag(BoardFlag::KingsideRookMoved, color, true);
            board.set_flag(BoardFlag::QueensideRookMoved, color, true);
        }
        if parts[2] != "-" {
            for c in parts[2].chars() {
                let (color, flag) = match c {
                    'K' => (Color::White, BoardFlag::KingsideRookMoved),
                    'Q' => (Color::White, BoardFlag::QueensideRookMoved),
                    'k' => (Color::Black, BoardFlag::KingsideRookMoved),
                    'q' => (Color::Black, BoardFlag::QueensideRookMoved),
                    _ => return Err(FenError::InvalidCastling { char: c }),
                };
                board.set_flag(flag, color, false);
                board.set_flag(BoardFlag::KingMoved, color, false);
            }
        }

        if let Some(clock) = parts.get(4) {
            let clock: u32 = clock
                .parse()
                .map_err(|_| FenError::InvalidHalfmoveClock {
                    found: (*clock).to_string(),
                })?;
            board.set_halfmove_clock(clock);
        }

        Ok((board, to_move))
    }

    /// Format the board as a FEN string. The en passant field is always `-`.
    #[must_use]
    pub fn to_fen(&self, to_move: Color) -> String {
        let mut fen = String::with_capacity(80);
        for row in (0..8).rev() {
            let mut empty = 0;
            for col in 0..8 {
                match self.piece_at(Location(row, col)) {
                    Some((color, kind)) => {
                        if empty > 0 {
                            fen.push(char::from_digit(empty, 10).expect("digit"));
                            empty = 0;
                        }
                        fen.push(kind.to_fen_char(color));
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push(char::from_digit(empty, 10).expect("digit"));
            }
            if row > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if to_move == Color::White { 'w' } else { 'b' });

        fen.push(' ');
        let mut any_right = false;
        for (color, flag, c) in [
            (Color::White, BoardFlag::KingsideRookMoved, 'K'),
            (Color::White, BoardFlag::QueensideRookMoved, 'Q'),
            (Color::Black, BoardFlag::KingsideRookMoved, 'k'),
            (Color::Black, BoardFlag::QueensideRookMoved, 'q'),
        ] {
            if !self.flag(BoardFlag::KingMoved, color) && !self.flag(flag, color) {
                fen.push(c);
                any_right = true;
            }
        }
        if !any_right {
            fen.push('-');
        }

        fen.push_str(" - ");
        fen.push_str(&self.halfmove_clock().to_string());
        fen.push_str(" 1");
        fen
    }
}
