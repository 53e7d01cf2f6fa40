//! Match and goal tests: atomic create/update/delete and the hand-back of
//! unknown player goals.

mod common;

use common::{add_match, add_player, date, goal, match_input, setup};
use core_types::{GoalSpec, ReassignRequest, Team, SENTINEL_PLAYER_NAME};
use database::DbError;

#[tokio::test]
async fn create_match_returns_hydrated_goals() {
    let db = setup().await;
    let alice = add_player(&db.repo, "Alice", "1990-01-01").await;
    let bob = add_player(&db.repo, "Bob", "1985-01-01").await;

    let m = add_match(
        &db.repo,
        match_input(
            "2024-07-20",
            2,
            1,
            vec![
                goal(alice.id, Team::Young),
                goal(bob.id, Team::Old),
                goal(alice.id, Team::Young),
            ],
        ),
    )
    .await;

    assert_eq!(m.date, date("2024-07-20"));
    assert_eq!((m.team_young_score, m.team_old_score), (2, 1));
    assert_eq!(m.goals.len(), 3);
    assert_eq!(m.goals[0].player_id, alice.id);
    assert_eq!(m.goals[0].player.name, "Alice");
    assert_eq!(m.goals[1].player.name, "Bob");
    assert_eq!(m.goals[1].team, Team::Old);

    let fetched = db.repo.get_match(m.id).await.unwrap();
    assert_eq!(fetched, m);
}

#[tokio::test]
async fn own_goal_flag_and_team_are_stored() {
    let db = setup().await;
    let p = add_player(&db.repo, "Own Goal Player", "1992-02-02").await;
    let m = add_match(
        &db.repo,
        match_input(
            "2024-07-22",
            0,
            1,
            vec![GoalSpec {
                player_id: p.id,
                is_own_goal: true,
                team: Team::Old,
            }],
        ),
    )
    .await;
    assert!(m.goals[0].is_own_goal);
    assert_eq!(m.goals[0].team, Team::Old);
}

#[tokio::test]
async fn goal_for_unknown_player_rolls_back_whole_match() {
    let db = setup().await;
    let alice = add_player(&db.repo, "Alice", "1990-01-01").await;

    let err = db
        .repo
        .create_match(&match_input(
            "2024-07-21",
            2,
            0,
            vec![goal(alice.id, Team::Young), goal(99_999, Team::Young)],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { entity: "player", ref id } if id == "99999"));
    assert!(db.repo.list_matches(0, 100).await.unwrap().is_empty());
    assert!(db.repo.get_goals_for_player(alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn negative_score_is_a_validation_error() {
    let db = setup().await;
    let err = db
        .repo
        .create_match(&match_input("2024-07-21", -1, 0, vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation(_)));
}

#[tokio::test]
async fn deleting_a_match_removes_only_its_goals() {
    let db = setup().await;
    let alice = add_player(&db.repo, "Alice", "1990-01-01").await;
    let doomed = add_match(
        &db.repo,
        match_input(
            "2024-07-20",
            2,
            1,
            vec![
                goal(alice.id, Team::Young),
                goal(alice.id, Team::Young),
                goal(alice.id, Team::Old),
            ],
        ),
    )
    .await;
    let kept = add_match(
        &db.repo,
        match_input("2024-07-27", 1, 0, vec![goal(alice.id, Team::Young)]),
    )
    .await;

    let outcome = db.repo.delete_match(doomed.id).await.unwrap();
    assert_eq!(outcome.deleted_goals, 3);
    assert_eq!(outcome.deleted_match, "2024-07-20 - 1:2");

    assert!(matches!(
        db.repo.get_match(doomed.id).await,
        Err(DbError::NotFound { entity: "match", .. })
    ));
    assert!(db.repo.get_goals_for_match(doomed.id).await.unwrap().is_empty());
    assert_eq!(db.repo.get_match(kept.id).await.unwrap().goals.len(), 1);
    assert_eq!(db.repo.get_player(alice.id).await.unwrap().goals.len(), 1);
}

#[tokio::test]
async fn deleting_missing_match_is_not_found() {
    let db = setup().await;
    let err = db.repo.delete_match(7).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { entity: "match", .. }));
}

#[tokio::test]
async fn update_replaces_the_whole_goal_set() {
    let db = setup().await;
    let alice = add_player(&db.repo, "Alice", "1990-01-01").await;
    let bob = add_player(&db.repo, "Bob", "1985-01-01").await;
    let m = add_match(
        &db.repo,
        match_input(
            "2024-07-20",
            2,
            1,
            vec![goal(alice.id, Team::Young), goal(alice.id, Team::Young), goal(bob.id, Team::Old)],
        ),
    )
    .await;
    let old_goal_ids: Vec<i64> = m.goals.iter().map(|g| g.id).collect();

    let replacement = vec![
        GoalSpec {
            player_id: bob.id,
            is_own_goal: true,
            team: Team::Young,
        },
        goal(bob.id, Team::Old),
    ];
    let updated = db
        .repo
        .update_match(m.id, &match_input("2024-07-21", 1, 1, replacement.clone()))
        .await
        .unwrap();

    assert_eq!(updated.id, m.id);
    assert_eq!(updated.date, date("2024-07-21"));
    assert_eq!((updated.team_young_score, updated.team_old_score), (1, 1));
    assert_eq!(updated.goals.len(), 2);
    for (view, spec) in updated.goals.iter().zip(&replacement) {
        assert_eq!(view.player_id, spec.player_id);
        assert_eq!(view.is_own_goal, spec.is_own_goal);
        assert_eq!(view.team, spec.team);
        assert!(!old_goal_ids.contains(&view.id));
    }
    assert!(db.repo.get_goals_for_player(alice.id).await.unwrap().is_empty());
    assert_eq!(db.repo.get_goals_for_match(m.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn failed_update_leaves_match_untouched() {
    let db = setup().await;
    let alice = add_player(&db.repo, "Alice", "1990-01-01").await;
    let m = add_match(
        &db.repo,
        match_input("2024-07-20", 1, 0, vec![goal(alice.id, Team::Young)]),
    )
    .await;

    let err = db
        .repo
        .update_match(m.id, &match_input("2024-08-01", 5, 5, vec![goal(12345, Team::Old)]))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { entity: "player", .. }));
    assert_eq!(db.repo.get_match(m.id).await.unwrap(), m);

    let err = db
        .repo
        .update_match(m.id + 100, &match_input("2024-08-01", 0, 0, vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { entity: "match", .. }));
}

#[tokio::test]
async fn deleted_scorer_shows_as_unknown_player() {
    let db = setup().await;
    let alice = add_player(&db.repo, "Alice", "1990-01-01").await;
    let m = add_match(
        &db.repo,
        match_input("2024-07-20", 1, 0, vec![goal(alice.id, Team::Young)]),
    )
    .await;
    assert!(db.repo.list_unknown_player_goals().await.unwrap().is_empty());

    db.repo.delete_player(alice.id).await.unwrap();

    let fetched = db.repo.get_match(m.id).await.unwrap();
    assert_eq!(fetched.goals[0].player.name, SENTINEL_PLAYER_NAME);

    let orphans = db.repo.list_unknown_player_goals().await.unwrap();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id, m.goals[0].id);
    assert_eq!(orphans[0].match_info.id, m.id);
    assert_eq!(orphans[0].match_info.date, date("2024-07-20"));
}

#[tokio::test]
async fn reassign_moves_only_sentinel_goals() {
    let db = setup().await;
    let alice = add_player(&db.repo, "Alice", "1990-01-01").await;
    let bob = add_player(&db.repo, "Bob", "1985-01-01").await;
    let carol = add_player(&db.repo, "Carol", "1992-02-02").await;
    let m = add_match(
        &db.repo,
        match_input(
            "2024-07-20",
            2,
            1,
            vec![goal(alice.id, Team::Young), goal(alice.id, Team::Young), goal(bob.id, Team::Old)],
        ),
    )
    .await;
    let bobs_goal = m.goals[2].id;
    db.repo.delete_player(alice.id).await.unwrap();

    let request = ReassignRequest {
        goal_ids: vec![m.goals[0].id, bobs_goal, 987_654],
        new_player_id: carol.id,
    };
    assert_eq!(db.repo.reassign_goals(&request).await.unwrap(), 1);

    let carols = db.repo.get_goals_for_player(carol.id).await.unwrap();
    assert_eq!(carols.len(), 1);
    assert_eq!(carols[0].id, m.goals[0].id);
    let bobs = db.repo.get_goals_for_player(bob.id).await.unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].id, bobs_goal);
    assert_eq!(db.repo.list_unknown_player_goals().await.unwrap().len(), 1);
}

#[tokio::test]
async fn reassign_to_missing_player_is_not_found() {
    let db = setup().await;
    let request = ReassignRequest {
        goal_ids: vec![1],
        new_player_id: 31337,
    };
    let err = db.repo.reassign_goals(&request).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { entity: "player", .. }));
}

#[tokio::test]
async fn reassign_to_sentinel_is_forbidden() {
    let db = setup().await;
    let sentinel = db.repo.ensure_sentinel_player().await.unwrap();
    let request = ReassignRequest {
        goal_ids: vec![1],
        new_player_id: sentinel.id,
    };
    let err = db.repo.reassign_goals(&request).await.unwrap_err();
    assert!(matches!(err, DbError::ForbiddenOperation(_)));
}

#[tokio::test]
async fn list_matches_pages_in_insertion_order() {
    let db = setup().await;
    for day in ["2024-07-06", "2024-07-13", "2024-07-20"] {
        add_match(&db.repo, match_input(day, 0, 0, vec![])).await;
    }
    let all = db.repo.list_matches(0, 100).await.unwrap();
    let days: Vec<_> = all.iter().map(|m| m.date).collect();
    assert_eq!(days, [date("2024-07-06"), date("2024-07-13"), date("2024-07-20")]);

    let page = db.repo.list_matches(1, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].date, date("2024-07-13"));
}

#[tokio::test]
async fn delete_all_matches_clears_goals() {
    let db = setup().await;
    let alice = add_player(&db.repo, "Alice", "1990-01-01").await;
    add_match(&db.repo, match_input("2024-07-20", 1, 0, vec![goal(alice.id, Team::Young)])).await;
    add_match(&db.repo, match_input("2024-07-27", 0, 0, vec![])).await;

    assert_eq!(db.repo.delete_all_matches().await.unwrap(), 2);
    assert!(db.repo.list_matches(0, 100).await.unwrap().is_empty());
    let alice = db.repo.get_player(alice.id).await.unwrap();
    assert!(alice.goals.is_empty());
}

#[tokio::test]
async fn reassign_counts_repeated_ids_once_and_accepts_empty_lists() {
    let db = setup().await;
    let alice = add_player(&db.repo, "Alice", "1990-01-01").await;
    let carol = add_player(&db.repo, "Carol", "1992-02-02").await;
    let m = add_match(
        &db.repo,
        match_input("2024-07-20", 1, 0, vec![goal(alice.id, Team::Young)]),
    )
    .await;
    let goal_id = m.goals[0].id;

    let empty = ReassignRequest {
        goal_ids: vec![],
        new_player_id: carol.id,
    };
    assert_eq!(db.repo.reassign_goals(&empty).await.unwrap(), 0);

    // Before any deletion there is no sentinel, so nothing moves.
    let early = ReassignRequest {
        goal_ids: vec![goal_id],
        new_player_id: carol.id,
    };
    assert_eq!(db.repo.reassign_goals(&early).await.unwrap(), 0);
    assert!(db.repo.find_sentinel_player().await.unwrap().is_none());

    db.repo.delete_player(alice.id).await.unwrap();
    let repeated = ReassignRequest {
        goal_ids: vec![goal_id, goal_id, goal_id],
        new_player_id: carol.id,
    };
    assert_eq!(db.repo.reassign_goals(&repeated).await.unwrap(), 1);
    assert_eq!(db.repo.get_goals_for_player(carol.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn reassign_handles_id_lists_beyond_sqlite_parameter_limit() {
    let db = setup().await;
    let alice = add_player(&db.repo, "Alice", "1990-01-01").await;
    let carol = add_player(&db.repo, "Carol", "1992-02-02").await;
    let m = add_match(
        &db.repo,
        match_input(
            "2024-07-20",
            2,
            0,
            vec![goal(alice.id, Team::Young), goal(alice.id, Team::Young)],
        ),
    )
    .await;
    db.repo.delete_player(alice.id).await.unwrap();

    let mut goal_ids: Vec<i64> = (1_000_000..1_040_000).collect();
    goal_ids.push(m.goals[0].id);
    goal_ids.push(m.goals[1].id);
    let request = ReassignRequest {
        goal_ids,
        new_player_id: carol.id,
    };
    assert_eq!(db.repo.reassign_goals(&request).await.unwrap(), 2);
    assert!(db.repo.list_unknown_player_goals().await.unwrap().is_empty());
}
