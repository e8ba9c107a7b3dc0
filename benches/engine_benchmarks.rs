//! Criterion benchmarks for move generation, evaluation, and search.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use gambit::board::{Color, Evaluator, PackedBoard};
use gambit::{Algorithm, EngineConfig, SearchBudget, SearchEngine, StopFlag};

const MIDDLEGAME: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";
const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn bench_movegen(c: &mut Criterion) {
    let mut group = c.benchmark_group("movegen");

    let positions = [
        ("startpos", PackedBoard::new()),
        ("middlegame", PackedBoard::from_fen(MIDDLEGAME).expect("valid FEN").0),
        ("kiwipete", PackedBoard::from_fen(KIWIPETE).expect("valid FEN").0),
    ];

    for (name, board) in positions {
        group.bench_function(name, |b| {
            b.iter(|| {
                // Clear between iterations so the cache does not absorb the
                // work being measured.
                board.clear_caches();
                black_box(board.legal_moves(Color::White, None))
            })
        });
    }

    group.finish();
}

fn bench_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("eval");

    let positions = [
        ("startpos", PackedBoard::new()),
        ("middlegame", PackedBoard::from_fen(MIDDLEGAME).expect("valid FEN").0),
        ("endgame", PackedBoard::from_fen("8/5k2/8/8/8/8/5K2/4R3 w - - 0 1").expect("valid FEN").0),
    ];

    for (name, board) in positions {
        group.bench_with_input(BenchmarkId::new("position", name), &board, |b, board| {
            b.iter(|| {
                let evaluator = Evaluator::new();
                black_box(evaluator.evaluate(board, Color::White, None))
            })
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    let algorithms = [
        ("alphabeta", Algorithm::AlphaBetaWithMemory),
        ("mtdf", Algorithm::Mtdf),
        ("negascout", Algorithm::NegaScout),
        ("abdada", Algorithm::Abdada),
        ("jamboree", Algorithm::Jamboree),
    ];

    for (name, algorithm) in algorithms {
        for depth in [3, 4] {
            group.bench_with_input(
                BenchmarkId::new(name, depth),
                &depth,
                |b, &depth| {
                    b.iter(|| {
                        let board = PackedBoard::new();
                        let engine = SearchEngine::new(EngineConfig {
                            use_opening_table: false,
                            ..EngineConfig::default()
                        });
                        let stop = StopFlag::new();
                        engine.find_move(
                            &board,
                            Color::White,
                            None,
                            SearchBudget::depth(black_box(depth)),
                            algorithm,
                            &stop,
                        )
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_movegen, bench_eval, bench_search);
criterion_main!(benches);
