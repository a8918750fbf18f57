//! End-to-end builds of small endgames.

use lazy_static::lazy_static;

use retrograde::{
    build, legal_moves, squares_to_index, write_table, BuildOptions, BuildSummary, Color, Config,
    FinalOutcome, Frozen, Futurebase, FuturebaseSet, Index, Kind, Mover, Outcome, Prune, Pruning,
    Square, TableFlags, Tablebase,
};

fn build_simple(notation: &str, futurebases: Vec<Futurebase>) -> (Tablebase, BuildSummary) {
    let config: Config = notation.parse().expect("valid notation");
    let mut set = FuturebaseSet::new();
    for fb in futurebases {
        set.add(fb);
    }
    let pruning = Pruning::none(Color::White);
    build(config, &mut set, &pruning, &BuildOptions::default()).expect("build succeeds")
}

lazy_static! {
    static ref KK: (Tablebase, BuildSummary) = build_simple("KvK", Vec::new());
    static ref KQK: (Tablebase, BuildSummary) = {
        build_simple("KQvK", vec![Futurebase::from_table(&KK.0, false)])
    };
    static ref KRK: (Tablebase, BuildSummary) = {
        build_simple("KRvK", vec![Futurebase::from_table(&KK.0, false)])
    };
}

/// Follows best moves per the table and returns the number of half-moves
/// until checkmate, asserting the labeling is self-consistent along the
/// way.
fn playout(tb: &Tablebase, start: Index) -> u8 {
    let config = tb.config().clone();
    let mut index = start;
    let mut plies = 0u8;

    loop {
        let entry = tb.entry(index);
        let pos = tb.position(index).expect("playout stays on legal indices");

        let mut moves = Vec::new();
        legal_moves(&config, &pos, &mut moves);

        if moves.is_empty() {
            assert_eq!(entry.outcome(), Outcome::PntmWins { done: true });
            assert_eq!(entry.mate_ply, 0);
            assert!(pos.in_check(&config, pos.turn));
            return plies;
        }

        let wanted_mate = entry.mate_ply.checked_sub(1).expect("nonzero mate distance");
        let mut chosen = None;
        for mv in moves.iter().filter(|m| m.is_intra()) {
            let slot = match mv.mover {
                Mover::Mobile(slot) => slot,
                Mover::Frozen(_) => unreachable!("intra moves have mobile movers"),
            };
            let mut squares: Vec<Square> = pos.squares.to_vec();
            squares[slot] = mv.to;
            let child = squares_to_index(!pos.turn, &squares);

            let child_entry = tb.entry(child);
            let matches = match entry.outcome() {
                Outcome::PtmWins { .. } => {
                    matches!(child_entry.outcome(), Outcome::PntmWins { .. })
                        && child_entry.mate_ply == wanted_mate
                }
                Outcome::PntmWins { .. } => {
                    matches!(child_entry.outcome(), Outcome::PtmWins { .. })
                        && child_entry.mate_ply == wanted_mate
                }
                other => panic!("playout reached a non-win entry: {:?}", other),
            };
            if matches {
                chosen = Some(child);
                break;
            }
        }

        index = chosen.expect("a move matching the mate distance exists");
        plies += 1;
    }
}

#[test]
fn kk_every_legal_position_draws() {
    let (tb, summary) = &*KK;
    assert_eq!(summary.ptm_wins, 0);
    assert_eq!(summary.pntm_wins, 0);
    assert_eq!(summary.violations, 0);
    for entry in tb.store().entries() {
        assert!(matches!(
            entry.final_outcome(),
            FinalOutcome::Draw | FinalOutcome::Illegal
        ));
    }
}

#[test]
fn kk_adjacent_kings_are_illegal() {
    let (tb, _) = &*KK;
    let index = squares_to_index(Color::White, &[Square::E4, Square::E5]);
    assert_eq!(tb.entry(index).final_outcome(), FinalOutcome::Illegal);
    let index = squares_to_index(Color::Black, &[Square::E4, Square::E5]);
    assert_eq!(tb.entry(index).final_outcome(), FinalOutcome::Illegal);
}

#[test]
fn kk_builds_are_deterministic() {
    let (first, _) = build_simple("KvK", Vec::new());
    let (second, _) = build_simple("KvK", Vec::new());

    let mut a = Vec::new();
    write_table(&first, TableFlags::DTM, &mut a).unwrap();
    let mut b = Vec::new();
    write_table(&second, TableFlags::DTM, &mut b).unwrap();
    assert_eq!(a, b);
}

#[test]
fn kqk_white_to_move_wins() {
    let (tb, summary) = &*KQK;
    assert_eq!(summary.violations, 0);

    // White Ke1 Qd1, black Ke8, white to move.
    let index = squares_to_index(Color::White, &[Square::E1, Square::D1, Square::E8]);
    let entry = tb.entry(index);
    assert_eq!(entry.final_outcome(), FinalOutcome::PtmWins);

    // The winner moves first: mate arrives on an odd half-move (the mated
    // position itself is distance zero), well within the known bounds of
    // the queen endgame.
    assert_eq!(entry.mate_ply % 2, 1);
    assert!(entry.mate_ply >= 7 && entry.mate_ply <= 19, "mate_ply = {}", entry.mate_ply);

    // The mate distance is exact: optimal play mates in exactly that many
    // half-moves.
    assert_eq!(playout(tb, index), entry.mate_ply);
}

#[test]
fn kqk_black_to_move_still_loses() {
    let (tb, _) = &*KQK;

    // White Ke1 Qe4, black Ke8, black to move.
    let index = squares_to_index(Color::Black, &[Square::E1, Square::E4, Square::E8]);
    let entry = tb.entry(index);
    assert_eq!(entry.final_outcome(), FinalOutcome::PntmWins);

    // The loser moves first: an even number of half-moves.
    assert_eq!(entry.mate_ply % 2, 0);
    assert!(entry.mate_ply <= 20, "mate_ply = {}", entry.mate_ply);
    assert_eq!(playout(tb, index), entry.mate_ply);
}

#[test]
fn kqk_stalemate_seed() {
    let (tb, _) = &*KQK;

    // White Kf6 Qg6, black Kh8 to move: stalemate.
    let index = squares_to_index(Color::Black, &[Square::F6, Square::G6, Square::H8]);
    assert_eq!(tb.entry(index).outcome(), Outcome::Stalemate);
    assert_eq!(tb.entry(index).final_outcome(), FinalOutcome::Draw);
}

#[test]
fn kqk_hanging_queen_draws() {
    let (tb, _) = &*KQK;

    // Black to move captures the undefended queen, reaching the drawn
    // two-king table.
    let index = squares_to_index(Color::Black, &[Square::A1, Square::G7, Square::H8]);
    assert_eq!(tb.entry(index).final_outcome(), FinalOutcome::Draw);
}

#[test]
fn kqk_probes_identically_after_serialization() {
    let (tb, _) = &*KQK;

    let mut buf = Vec::new();
    write_table(tb, TableFlags::DTM, &mut buf).unwrap();
    let reloaded = Futurebase::from_reader(&mut buf.as_slice(), false).unwrap();
    assert_eq!(reloaded.config(), tb.config());
}

#[test]
fn krk_checking_rook_with_white_to_move_is_illegal() {
    let (tb, _) = &*KRK;

    // White Ka1 Ra8, black Kh8: the rook already attacks the king, so the
    // side not to move is in check and the position cannot have arisen.
    let index = squares_to_index(Color::White, &[Square::A1, Square::A8, Square::H8]);
    assert_eq!(tb.entry(index).final_outcome(), FinalOutcome::Illegal);
}

#[test]
fn krk_black_to_move_in_check_loses_within_bound() {
    let (tb, summary) = &*KRK;
    assert_eq!(summary.violations, 0);

    // Same placement with black to move: black escapes the check but the
    // rook endgame is lost within the known 32-half-move bound.
    let index = squares_to_index(Color::Black, &[Square::A1, Square::A8, Square::H8]);
    let entry = tb.entry(index);
    assert_eq!(entry.final_outcome(), FinalOutcome::PntmWins);
    assert!(entry.mate_ply <= 32, "mate_ply = {}", entry.mate_ply);
    assert_eq!(playout(tb, index), entry.mate_ply);
}

#[test]
fn krk_has_wins_and_draws_but_no_black_wins() {
    let (tb, _) = &*KRK;

    for index in 0..tb.index_range() {
        let entry = tb.entry(index);
        match entry.final_outcome() {
            FinalOutcome::PtmWins => {
                // Only white, the rook side, ever wins.
                assert_eq!(index & 1, 0, "black cannot win KRvK at {}", index);
            }
            FinalOutcome::PntmWins => {
                assert_eq!(index & 1, 1, "black cannot win KRvK at {}", index);
            }
            _ => {}
        }
    }
}

fn kings_with_frozen_pawn(square: Square) -> Config {
    Config::new(
        vec![Kind::King.of(Color::White), Kind::King.of(Color::Black)],
        vec![Frozen {
            piece: Kind::Pawn.of(Color::White),
            square,
        }],
    )
    .unwrap()
}

#[test]
fn prune_our_move_discards_the_frozen_pawn_advance() {
    let config = kings_with_frozen_pawn(Square::E3);
    let mut set = FuturebaseSet::new();
    set.add(Futurebase::from_table(&KK.0, false));
    let pruning = Pruning {
        our_color: Color::White,
        prunes: vec![Prune {
            ours: true,
            from: Square::E3,
            to: Square::E4,
        }],
    };
    let (tb, summary) = build(config, &mut set, &pruning, &BuildOptions::default()).unwrap();

    assert_eq!(summary.ptm_wins, 0);
    assert_eq!(summary.pntm_wins, 0);
    assert_eq!(summary.violations, 0);

    // White on a1 has three king moves plus the pawn advance; the pruned
    // advance is decremented away without propagating, leaving the king
    // moves counted, and the position finalizes as a draw.
    let index = squares_to_index(Color::White, &[Square::A1, Square::H8]);
    assert_eq!(tb.entry(index).outcome(), Outcome::Counting(3));
    assert_eq!(tb.entry(index).final_outcome(), FinalOutcome::Draw);

    // Black beside the pawn can always capture it into the drawn two-king
    // table.
    let index = squares_to_index(Color::Black, &[Square::A1, Square::D4]);
    assert_eq!(tb.entry(index).final_outcome(), FinalOutcome::Draw);
}

#[test]
fn prune_his_move_resolves_by_reply_search() {
    let config = kings_with_frozen_pawn(Square::A6);
    let mut set = FuturebaseSet::new();
    set.add(Futurebase::from_table(&KK.0, false));
    // The frozen pawn belongs to the opponent of the declared side, so its
    // advance is "his" move and resolves through the one-reply search.
    let pruning = Pruning {
        our_color: Color::Black,
        prunes: vec![Prune {
            ours: false,
            from: Square::A6,
            to: Square::A7,
        }],
    };
    let (tb, summary) = build(config, &mut set, &pruning, &BuildOptions::default()).unwrap();
    assert_eq!(summary.violations, 0);

    // Far black king: after a6-a7 no black reply reaches any table, so the
    // advance is assumed won for white, two half-moves out, with a fresh
    // conversion window behind the pawn move.
    let index = squares_to_index(Color::White, &[Square::A1, Square::H8]);
    assert_eq!(tb.entry(index).final_outcome(), FinalOutcome::PtmWins);
    assert_eq!(tb.entry(index).mate_ply, 2);
    assert_eq!(tb.entry(index).conv_ply, 1);

    // Black king beside the promotion square: the reply captures the
    // advanced pawn into the drawn two-king table, so the pruned move
    // proves nothing and the position stays a draw.
    let index = squares_to_index(Color::White, &[Square::A1, Square::B8]);
    assert_eq!(tb.entry(index).final_outcome(), FinalOutcome::Draw);

    // Kb6 against the cornered king: a6-a7 would stalemate black on the
    // spot, which the reply search reports as a draw.
    let index = squares_to_index(Color::White, &[Square::B6, Square::A8]);
    assert_eq!(tb.entry(index).final_outcome(), FinalOutcome::Draw);
}
