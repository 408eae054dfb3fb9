mod common;

use common::{Script, Scripted, three_way_choice};
use detmin_core::{
    GameState, NodeId, NodeKind, RewardPerspective, SearchBudget, SearchError, TreeBuilder,
};
use std::time::Instant;

fn build(state: Scripted, perspective: RewardPerspective) -> detmin_core::SearchTree<Scripted> {
    let budget = SearchBudget::unlimited();
    TreeBuilder::new(perspective, &budget)
        .build(state)
        .expect("tree builds")
}

#[test]
fn forced_step_after_decided_hand_is_skipped_silently() {
    let mut script = Script::new();
    let root = script.decision(0);
    for action in [1, 2] {
        let scoring = script.forced(true);
        let done = script.terminal(action as i32);
        script.link(root, action, scoring);
        script.link(scoring, 99, done);
    }
    let state = Scripted::open(script.finish());
    let calls = state.calls();

    let tree = build(state, RewardPerspective::NodeActor);

    assert_eq!(tree.len(), 3, "root plus one node per root action");
    assert_eq!(tree.max_depth(), 1);
    for &child in tree.root().children() {
        let node = tree.node(child);
        assert!(node.is_leaf());
        assert!(node.state().hand_over());
        assert!(node.state().actions().is_empty(), "node holds the post-forced state");
        assert_ne!(node.action(), Some(99));
    }
    // Two root actions plus the two forced steps; nothing below the forced positions.
    assert_eq!(calls.applied(), 4);
}

#[test]
fn forced_step_mid_hand_continues_into_the_next_decision() {
    let mut script = Script::new();
    let root = script.decision(0);
    let reset = script.forced(false);
    let reply = script.decision(1);
    let done = script.terminal(3);
    script.link(root, 1, reset);
    script.link(reset, 50, reply);
    script.link(reply, 7, done);

    let tree = build(Scripted::open(script.finish()), RewardPerspective::NodeActor);

    assert_eq!(tree.len(), 3);
    let child = tree.node(tree.root().children()[0]);
    assert_eq!(child.action(), Some(1));
    assert_eq!(child.state().player_to_move(), Some(1));
    assert_eq!(child.kind(), NodeKind::Minimizer);
    let grandchild = tree.node(child.children()[0]);
    assert_eq!(grandchild.action(), Some(7));
    assert_eq!(grandchild.depth(), 2);
    assert!(grandchild.is_leaf());
}

#[test]
fn kind_is_inherited_while_the_same_player_keeps_moving() {
    let mut script = Script::new();
    let root = script.decision(0);
    let again = script.decision(0);
    let reply = script.decision(1);
    let done = script.terminal(0);
    script.link(root, 1, again);
    script.link(again, 2, reply);
    script.link(reply, 3, done);

    let tree = build(Scripted::open(script.finish()), RewardPerspective::NodeActor);

    let kinds: Vec<NodeKind> = tree.ids().map(|id| tree.node(id).kind()).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Maximizer,
            NodeKind::Maximizer,
            NodeKind::Minimizer,
            NodeKind::Maximizer,
        ]
    );
}

#[test]
fn children_keep_action_enumeration_order() {
    let tree = build(Scripted::open(three_way_choice()), RewardPerspective::RootActor);
    let actions: Vec<_> = tree
        .root()
        .children()
        .iter()
        .map(|id| tree.node(*id).action())
        .collect();
    assert_eq!(actions, vec![Some(1), Some(2), Some(3)]);
    assert_eq!(tree.len(), 1 + 3 + 6);
    assert_eq!(tree.leaves().count(), 6);
}

#[test]
fn actor_follows_configured_perspective() {
    let mut script = Script::new();
    let root = script.decision(0);
    let reply = script.decision(1);
    let done = script.terminal(4);
    script.link(root, 1, reply);
    script.link(reply, 2, done);
    let book = script.finish();

    let node_view = build(Scripted::open(book.clone()), RewardPerspective::NodeActor);
    let leaf = node_view.leaves().next().expect("one leaf");
    assert_eq!(node_view.node(leaf).actor(), 1, "inherited from the replying node");
    assert_eq!(node_view.node(leaf).reward(), -4);

    let root_view = build(Scripted::open(book), RewardPerspective::RootActor);
    let leaf = root_view.leaves().next().expect("one leaf");
    assert_eq!(root_view.node(leaf).actor(), 0);
    assert_eq!(root_view.node(leaf).reward(), 4);
}

#[test]
fn first_move_climbs_to_the_root_child() {
    let tree = build(Scripted::open(three_way_choice()), RewardPerspective::RootActor);
    for leaf in tree.leaves() {
        let below_root = tree.ancestor_below_root(leaf).expect("leaf has ancestry");
        assert_eq!(tree.node(below_root).parent(), Some(NodeId::ROOT));
        assert_eq!(tree.first_move(leaf), tree.node(below_root).action());
    }
    assert_eq!(tree.first_move(NodeId::ROOT), None);
}

#[test]
fn empty_decision_before_hand_over_is_an_error() {
    let mut script = Script::new();
    let root = script.decision(0);
    let stuck = script.decision(1);
    script.link(root, 1, stuck);

    let budget = SearchBudget::unlimited();
    let result = TreeBuilder::new(RewardPerspective::NodeActor, &budget)
        .build(Scripted::open(script.finish()));
    assert_eq!(result.err(), Some(SearchError::NoLegalActions));
}

#[test]
fn forced_position_without_action_is_an_error() {
    let mut script = Script::new();
    let root = script.decision(0);
    let limbo = script.forced(false);
    script.link(root, 1, limbo);

    let budget = SearchBudget::unlimited();
    let result = TreeBuilder::new(RewardPerspective::NodeActor, &budget)
        .build(Scripted::open(script.finish()));
    assert_eq!(result.err(), Some(SearchError::MissingForcedAction));
}

#[test]
fn root_must_be_a_live_decision() {
    let budget = SearchBudget::unlimited();
    let builder = TreeBuilder::new(RewardPerspective::NodeActor, &budget);

    let mut script = Script::new();
    script.terminal(0);
    let over = builder.build(Scripted::open(script.finish()));
    assert_eq!(over.err(), Some(SearchError::HandOver));

    let mut script = Script::new();
    let root = script.forced(false);
    let next = script.decision(0);
    script.link(root, 1, next);
    let forced = builder.build(Scripted::open(script.finish()));
    assert_eq!(forced.err(), Some(SearchError::NoPlayerToMove));
}

#[test]
fn node_limit_stops_construction() {
    let budget = SearchBudget::new(Instant::now(), None, Some(5));
    let result =
        TreeBuilder::new(RewardPerspective::RootActor, &budget).build(Scripted::open(three_way_choice()));
    assert_eq!(result.err(), Some(SearchError::NodeLimit { limit: 5 }));
}
