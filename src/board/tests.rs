//! Property-based board tests using proptest.

use proptest::prelude::*;
use rand::prelude::*;
use rand::Rng;

use super::{Color, PackedBoard};

fn move_count_strategy() -> impl Strategy<Value = usize> {
    1..=24usize
}

fn seed_strategy() -> impl Strategy<Value = u64> {
    any::<u64>()
}

/// Play out a random line of legal moves, returning the final board, the
/// side to move, and the last applied move.
fn random_playout(
    seed: u64,
    num_moves: usize,
) -> (PackedBoard, Color, Option<super::LastMove>) {
    let mut board = PackedBoard::new();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut color = Color::White;
    let mut previous = None;

    for _ in 0..num_moves {
        let moves = board.legal_moves(color, previous.as_ref());
        if moves.is_empty() {
            break;
        }
        let mv = moves[rng.gen_range(0..moves.len())];
        previous = Some(board.make_move(mv));
        color = color.opponent();
    }
    (board, color, previous)
}

proptest! {
    /// Legal moves never leave the mover's own king in check.
    #[test]
    fn prop_legal_moves_are_legal(seed in seed_strategy(), num_moves in move_count_strategy()) {
        let (board, color, previous) = random_playout(seed, num_moves);

        for mv in board.legal_moves(color, previous.as_ref()).iter() {
            let mut probe = board.clone();
            probe.make_move(*mv);
            prop_assert!(
                !probe.is_king_in_check(color),
                "move {} leaves own king in check", mv
            );
        }
    }

    /// Mutating a clone never changes the original's hash.
    #[test]
    fn prop_hash_is_pure(seed in seed_strategy(), num_moves in move_count_strategy()) {
        let (board, color, previous) = random_playout(seed, num_moves);
        let hash = board.hash();

        let moves = board.legal_moves(color, previous.as_ref());
        if let Some(mv) = moves.first() {
            let mut clone = board.clone();
            clone.make_move(*mv);
            prop_assert_ne!(clone.hash(), hash);
        }
        prop_assert_eq!(board.hash(), hash);
    }

    /// FEN round-trips preserve piece placement and re-emit identically.
    /// (The `Castled` flag is not representable in FEN, so full flag-level
    /// equality is not expected here.)
    #[test]
    fn prop_fen_roundtrip(seed in seed_strategy(), num_moves in move_count_strategy()) {
        let (board, color, _) = random_playout(seed, num_moves);

        let fen = board.to_fen(color);
        let (restored, restored_color) = PackedBoard::from_fen(&fen).expect("own FEN parses");

        prop_assert_eq!(restored_color, color);
        for idx in 0..64 {
            let loc = super::Location::from_index(idx);
            prop_assert_eq!(restored.piece_at(loc), board.piece_at(loc));
        }
        prop_assert_eq!(restored.to_fen(restored_color), fen);
    }

    /// The move cache returns the same list it computed.
    #[test]
    fn prop_move_cache_is_consistent(seed in seed_strategy(), num_moves in move_count_strategy()) {
        let (board, color, previous) = random_playout(seed, num_moves);

        let first = board.legal_moves(color, previous.as_ref());
        let second = board.legal_moves(color, previous.as_ref());
        prop_assert_eq!(&*first, &*second);
    }
}
