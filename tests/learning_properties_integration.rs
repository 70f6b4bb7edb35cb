//! Property-style checks over sequences of submissions
//! Retention, aggregate consistency, confidence growth and pattern uniqueness.

use content_memory::domain::{FeedbackMetadata, NewFeedback, PreferenceKind, UserAction};
use content_memory::{FeedbackStore, StoreConfig};

fn store_with_cap(max_records: usize) -> FeedbackStore {
    let config = StoreConfig {
        max_records,
        ..StoreConfig::default()
    };
    FeedbackStore::open_in_memory(config).unwrap()
}

#[test]
fn test_reads_are_idempotent() {
    let store = store_with_cap(100);
    store
        .try_submit(NewFeedback::new("thread", "**Bold** start.\n\n- item", UserAction::Accept))
        .unwrap();
    store
        .try_submit(
            NewFeedback::new("thread", "plain words here", UserAction::Edit).with_metadata(
                FeedbackMetadata::edited("plain words here plus several brand new extra terms"),
            ),
        )
        .unwrap();
    store
        .try_submit(
            NewFeedback::new("thread", "Dense.", UserAction::Reject)
                .with_metadata(FeedbackMetadata::revision("too complex")),
        )
        .unwrap();

    assert_eq!(
        store.get_generation_stats(None),
        store.get_generation_stats(None)
    );
    assert_eq!(
        store.get_recent_feedback(None, 10),
        store.get_recent_feedback(None, 10)
    );
    assert_eq!(
        store.get_edit_patterns(None, 1),
        store.get_edit_patterns(None, 1)
    );
    assert_eq!(
        store.get_quality_analysis_all(),
        store.get_quality_analysis_all()
    );
    assert_eq!(
        store.get_user_preferences(Some("thread"), 0.0),
        store.get_user_preferences(Some("thread"), 0.0)
    );
    assert_eq!(
        store.get_learning_insights("thread"),
        store.get_learning_insights("thread")
    );
    assert_eq!(
        store.get_prompt_enhancements("thread"),
        store.get_prompt_enhancements("thread")
    );
    assert_eq!(store.get_database_info(), store.get_database_info());
}

#[test]
fn test_retention_keeps_exactly_the_most_recent() {
    for (cap, submissions) in [(1usize, 3usize), (5, 12), (7, 8)] {
        let store = store_with_cap(cap);
        for i in 0..submissions {
            store
                .try_submit(NewFeedback::new("post", format!("item {i}"), UserAction::Accept))
                .unwrap();
        }

        let retained = store.get_recent_feedback(None, submissions);
        assert_eq!(retained.len(), cap);
        let expected: Vec<String> = (submissions - cap..submissions)
            .rev()
            .map(|i| format!("item {i}"))
            .collect();
        let actual: Vec<String> = retained.into_iter().map(|e| e.content_text).collect();
        assert_eq!(actual, expected);
    }
}

#[test]
fn test_aggregate_counts_are_consistent() {
    let store = store_with_cap(1000);
    let actions = [
        UserAction::Accept,
        UserAction::Edit,
        UserAction::Reject,
        UserAction::Accept,
        UserAction::Accept,
        UserAction::Reject,
        UserAction::Edit,
    ];
    for (i, action) in actions.iter().cycle().take(40).enumerate() {
        let content_type = ["thread", "summary", "post"][i % 3];
        let mut feedback = NewFeedback::new(content_type, format!("content {i}"), *action);
        if i % 2 == 0 {
            feedback = feedback.with_generation_time(i as f64 / 10.0);
        }
        store.try_submit(feedback).unwrap();
    }

    let stats = store.get_generation_stats(None);
    assert_eq!(stats.len(), 3);
    assert_eq!(stats.iter().map(|s| s.total_generated).sum::<i64>(), 40);
    for s in &stats {
        assert_eq!(
            s.total_generated,
            s.total_accepted + s.total_rejected + s.total_edited
        );
        let rate = s.total_accepted as f64 / s.total_generated as f64;
        assert!((s.acceptance_rate - rate).abs() < 1e-9);
    }
}

#[test]
fn test_confidence_grows_by_step_until_capped() {
    let store = store_with_cap(1000);
    let reason = FeedbackMetadata::revision("Please add more detail");

    for k in 1..=10 {
        store
            .try_submit(
                NewFeedback::new("summary", "Too thin.", UserAction::Reject)
                    .with_metadata(reason.clone()),
            )
            .unwrap();

        let prefs = store.get_user_preferences(Some("summary"), 0.0);
        let expected = (0.3 + 0.1 * (k - 1) as f64).min(1.0);
        let actual = prefs[&PreferenceKind::AvoidShortContent].confidence;
        assert!(
            (actual - expected).abs() < 1e-9,
            "after {k} observations expected {expected}, got {actual}"
        );
    }
}

#[test]
fn test_same_edit_twice_does_not_duplicate_patterns() {
    let store = store_with_cap(1000);
    let original = "Intro sentence here.\nBody text follows.";
    let edited = "**Intro** sentence here.\n\n- Body text follows with several added words \
                  and many more extra words to lengthen things considerably.";
    let feedback = NewFeedback::new("post", original, UserAction::Edit)
        .with_metadata(FeedbackMetadata::edited(edited));

    store.try_submit(feedback.clone()).unwrap();
    let first = store.get_edit_patterns(Some("post"), 1);
    assert!(!first.is_empty());
    assert!(first.iter().all(|p| p.frequency == 1));

    store.try_submit(feedback).unwrap();
    let second = store.get_edit_patterns(Some("post"), 1);
    assert_eq!(second.len(), first.len());
    assert!(second.iter().all(|p| p.frequency == 2));

    let mut kinds: Vec<_> = second.iter().map(|p| p.edit_type.to_string()).collect();
    kinds.sort();
    kinds.dedup();
    assert_eq!(kinds.len(), second.len());
}

#[test]
fn test_rebuild_matches_incremental_stats() {
    let store = store_with_cap(1000);
    for i in 0..12 {
        let action = UserAction::ALL[i % 3];
        let mut feedback = NewFeedback::new(["a", "b"][i % 2], format!("text {i}"), action);
        if i % 4 != 0 {
            feedback = feedback.with_generation_time(1.0 + i as f64);
        }
        store.try_submit(feedback).unwrap();
    }

    let before = store.get_generation_stats(None);
    store.rebuild_generation_stats().unwrap();
    let after = store.get_generation_stats(None);

    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.content_type, a.content_type);
        assert_eq!(b.total_generated, a.total_generated);
        assert_eq!(b.total_accepted, a.total_accepted);
        assert_eq!(b.total_rejected, a.total_rejected);
        assert_eq!(b.total_edited, a.total_edited);
        assert!((b.avg_generation_time - a.avg_generation_time).abs() < 1e-9);
    }
}
