//! Seeded random playouts checking board invariants after every ply.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use chess_engine::ai::MinimaxAi;
use chess_engine::engine::board::Board;
use chess_engine::engine::movegen::legal_moves;
use chess_engine::engine::{Game, STARTING_FEN};

const SEEDS: [u64; 6] = [1, 7, 42, 1234, 99_991, 2_718_281];
const MAX_PLIES: usize = 200;

#[test]
fn random_playouts_keep_board_consistent() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut board = Board::starting();

        for ply in 0..MAX_PLIES {
            let moves = legal_moves(&board);
            let Some(&mv) = moves.choose(&mut rng) else {
                break;
            };

            let before = board.clone();
            let undo = board.make_move(mv);

            let mover = !board.side_to_move;
            assert!(
                !board.is_color_in_check(mover),
                "seed {seed} ply {ply}: {mv} left the {mover} king in check"
            );
            board.assert_consistent();
            assert_eq!(
                Board::from_fen(&board.to_fen()).unwrap(),
                board,
                "seed {seed} ply {ply}: FEN round trip"
            );

            board.unmake_move(mv, &undo);
            assert_eq!(board, before, "seed {seed} ply {ply}: unmake of {mv}");

            board.make_move(mv);
        }
    }
}

#[test]
fn random_games_unwind_to_the_start() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Game::new();
        let mut fens = vec![game.to_fen()];

        while !game.is_game_over() && game.move_history().len() < MAX_PLIES {
            let moves = game.legal_moves();
            let mv = *moves.choose(&mut rng).unwrap();
            game.apply_move(mv).unwrap();
            fens.push(game.to_fen());
        }

        // Every undo lands exactly on the position before that move.
        fens.pop();
        while let Some(expected) = fens.pop() {
            game.undo_move().unwrap();
            assert_eq!(game.to_fen(), expected, "seed {seed}");
        }
        assert_eq!(game.to_fen(), STARTING_FEN);
        assert!(!game.can_undo());
    }
}

#[test]
fn hints_stay_inside_the_legal_set() {
    let engine = MinimaxAi::new();
    let mut rng = StdRng::seed_from_u64(5);
    let mut game = Game::new();

    for _ in 0..40 {
        if game.is_game_over() {
            break;
        }
        let hint = game.suggest_hint_with(&engine, 1).unwrap();
        assert!(game.legal_moves().contains(&hint));

        let moves = game.legal_moves();
        game.apply_move(*moves.choose(&mut rng).unwrap()).unwrap();
    }
}
