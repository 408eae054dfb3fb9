use detmin_core::{
    EnsembleConfig, EnsemblePlayer, GameState, RewardPerspective, SearchBudget, TreeBuilder, minimax,
};
use detmin_pegging::model::card::Card;
use detmin_pegging::model::deck::Deck;
use detmin_pegging::model::hand::Hand;
use detmin_pegging::model::suit::Suit;
use detmin_pegging::{DEFAULT_HAND_SIZE, PegAction, PeggingState, Seat};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn player(samples: usize) -> EnsemblePlayer {
    EnsemblePlayer::new(EnsembleConfig::with_samples(samples)).expect("valid config")
}

// Plays a hand out with one ensemble player per seat, forced steps applied directly.
fn play_out(seed: u64, samples: usize) -> (PeggingState, [EnsemblePlayer; 2]) {
    let mut state = PeggingState::deal(&Deck::shuffled_with_seed(seed), DEFAULT_HAND_SIZE);
    let mut players = [player(samples), player(samples)];
    let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);

    while !state.hand_over() {
        let action = match state.player_to_move() {
            Some(seat) => {
                let legal = state.actions();
                let action = players[seat.index()]
                    .select_move(&state, &mut rng)
                    .expect("selection succeeds");
                assert!(legal.contains(&action), "{action} not legal for {seat}");
                action
            }
            None => state.actions()[0],
        };
        state = state.apply_action(action).expect("apply");
    }
    (state, players)
}

#[test]
fn full_hand_plays_only_legal_moves() {
    for seed in [1_u64, 7, 42] {
        let (state, players) = play_out(seed, 6);
        assert!(state.hand_over());
        assert_eq!(state.played().len(), DEFAULT_HAND_SIZE * 2);
        for player in &players {
            let stats = player.lifetime();
            assert!(stats.selections > 0);
            assert_eq!(stats.repaired_samples, 0);
        }
    }
}

#[test]
fn go_is_taken_without_sampling() {
    let dealer = Hand::with_cards(vec![Card::new(9, Suit::Hearts)]);
    let pone = Hand::with_cards(vec![
        Card::new(13, Suit::Clubs),
        Card::new(12, Suit::Clubs),
        Card::new(11, Suit::Clubs),
    ]);
    let mut state = PeggingState::from_hands(dealer, pone);
    for action in [
        PegAction::Play(Card::new(13, Suit::Clubs)),
        PegAction::Play(Card::new(9, Suit::Hearts)),
        PegAction::Play(Card::new(12, Suit::Clubs)),
    ] {
        state = state.apply_action(action).expect("apply");
    }
    assert_eq!(state.count(), 29);
    assert_eq!(state.player_to_move(), Some(Seat::Pone));

    let mut ensemble = player(10);
    let outcome = ensemble
        .select(&state, &mut StdRng::seed_from_u64(3))
        .expect("select");
    assert_eq!(outcome.action, PegAction::Go);
    assert!(outcome.shortcut);
    assert_eq!(outcome.total_samples, 0);
}

#[test]
fn every_leaf_of_a_deal_is_hand_over() {
    let state = PeggingState::deal(&Deck::shuffled_with_seed(19), 3);
    let budget = SearchBudget::unlimited();
    let tree = TreeBuilder::new(RewardPerspective::NodeActor, &budget)
        .build(state)
        .expect("build");

    let leaves: Vec<_> = tree.leaves().collect();
    assert!(!leaves.is_empty());
    for leaf in leaves {
        assert!(tree.node(leaf).state().hand_over());
    }

    let solution = minimax::solve(&tree);
    let first = tree.first_move(solution.leaf).expect("root has children");
    let root_actions = tree.root().state().actions();
    assert!(root_actions.contains(&first));
}

#[test]
fn parallel_and_sequential_agree_on_a_deal() {
    let state = PeggingState::deal(&Deck::shuffled_with_seed(23), DEFAULT_HAND_SIZE);
    let sequential = player(8)
        .select(&state, &mut StdRng::seed_from_u64(99))
        .expect("sequential");

    #[cfg(feature = "parallel")]
    {
        let parallel = player(8)
            .select_parallel(&state, &mut StdRng::seed_from_u64(99))
            .expect("parallel");
        assert_eq!(parallel.action, sequential.action);
        assert_eq!(parallel.votes, sequential.votes);
    }

    let again = player(8)
        .select(&state, &mut StdRng::seed_from_u64(99))
        .expect("sequential");
    assert_eq!(again.action, sequential.action);
    assert_eq!(again.votes, sequential.votes);
}
