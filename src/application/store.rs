//! `FeedbackStore`: the write path for feedback events and the read-only
//! query surface over everything learned from them.
//!
//! Every operation comes in two flavours. `try_*` methods return
//! [`StoreResult`] so callers can tell "no data" apart from a storage
//! failure. The plain methods (`submit_feedback`, `get_*`) log failures and
//! degrade to `false` or an empty value.

use super::insights;
use super::metrics;
use super::patterns::EditPatternMiner;
use super::preferences::{PreferenceLearner, SignalContext};
use crate::domain::{
    DatabaseInfo, EditPattern, FeedbackEvent, FeedbackId, FeedbackMetadata, GenerationStats,
    LearningInsights, NewFeedback, PreferenceMap, PreferenceValue, QualityByAction,
    QualityMetricSample, StoreError, StoreResult, UserAction, UserPreference,
};
use crate::infra::app_config::{self, StoreConfig};
use crate::infra::db::{
    Database, EditPatternRepository, FeedbackEventRepository, GenerationStatsRepository,
    QualityMetricRepository, UserPreferenceRepository,
};
use crate::infra::hash::content_hash;
use chrono::{SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

pub struct FeedbackStore {
    db: Database,
    config: StoreConfig,
    miner: EditPatternMiner,
    learner: PreferenceLearner,
}

impl FeedbackStore {
    /// Open the store at the location resolved from `config`.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let path = app_config::database_path(&config);
        Self::open_at(path, config)
    }

    pub fn open_at(path: impl Into<PathBuf>, config: StoreConfig) -> StoreResult<Self> {
        let db = Database::open_at(path)?;
        Ok(Self::with_database(db, config))
    }

    pub fn open_in_memory(config: StoreConfig) -> StoreResult<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self::with_database(db, config))
    }

    pub fn with_database(db: Database, config: StoreConfig) -> Self {
        Self {
            db,
            miner: EditPatternMiner::new(config.thresholds.clone()),
            learner: PreferenceLearner::default(),
            config,
        }
    }

    /// Replace the preference rule table.
    pub fn with_learner(mut self, learner: PreferenceLearner) -> Self {
        self.learner = learner;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Record one feedback event and update everything derived from it in a
    /// single transaction.
    ///
    /// Returns `Ok(None)` when the store is disabled in configuration.
    pub fn try_submit(&self, feedback: NewFeedback) -> StoreResult<Option<FeedbackId>> {
        if !self.config.enabled {
            log::debug!(
                "Feedback store disabled; ignoring {} event",
                feedback.user_action
            );
            return Ok(None);
        }

        let feedback = validate(feedback)?;
        let content_type = feedback.content_type.as_str();
        let action = feedback.user_action;

        let now = now_timestamp();
        let hash = content_hash(&feedback.content_text);
        let text_metrics = metrics::analyze(&feedback.content_text);
        let observations = feedback
            .edited_content()
            .map(|edited| self.miner.mine(&feedback.content_text, edited))
            .unwrap_or_default();
        let signals = self.learner.signals(&SignalContext {
            action,
            text: &feedback.content_text,
            metrics: &text_metrics,
            metadata: &feedback.metadata,
        });

        let max_examples = self.config.thresholds.max_examples;
        let (id, pruned) = self.db.transaction(|tx| -> StoreResult<_> {
            let id = FeedbackEventRepository::insert(tx, &feedback, &now, &hash)?;

            let mut stats = GenerationStatsRepository::find(tx, content_type)?
                .unwrap_or_else(|| GenerationStats::empty(content_type, now.as_str()));
            stats.record(action, feedback.generation_time, &now);
            GenerationStatsRepository::save(tx, &stats)?;

            QualityMetricRepository::insert(tx, id, content_type, action, &text_metrics, &now)?;

            for observation in &observations {
                EditPatternRepository::record_observation(
                    tx,
                    content_type,
                    observation,
                    max_examples,
                    &now,
                )?;
            }
            for signal in &signals {
                UserPreferenceRepository::reinforce(
                    tx,
                    content_type,
                    signal,
                    &self.config.learning,
                    &now,
                )?;
            }

            let pruned = FeedbackEventRepository::enforce_limit(tx, self.config.max_records)?;
            Ok((id, pruned))
        })?;

        log::info!("Recorded {action} feedback for {content_type}");
        if !observations.is_empty() || !signals.is_empty() {
            log::debug!(
                "Learned {} edit patterns and {} preference signals for {content_type}",
                observations.len(),
                signals.len()
            );
        }
        if pruned > 0 {
            log::info!("Removed {pruned} old records to maintain limit");
        }
        Ok(Some(id))
    }

    /// Boundary form of [`Self::try_submit`] taking the raw action string.
    pub fn submit_feedback(
        &self,
        content_type: &str,
        content_text: &str,
        user_action: &str,
        original_prompt: Option<&str>,
        generation_time: Option<f64>,
        metadata: Option<FeedbackMetadata>,
    ) -> bool {
        let action = match UserAction::from_str(user_action) {
            Ok(action) => action,
            Err(err) => {
                log::warn!("Rejected feedback for {content_type:?}: {err}");
                return false;
            }
        };

        let mut feedback = NewFeedback::new(content_type, content_text, action);
        feedback.original_prompt = original_prompt.map(str::to_string);
        feedback.generation_time = generation_time;
        feedback.metadata = metadata.unwrap_or_default();

        match self.try_submit(feedback) {
            Ok(id) => id.is_some(),
            Err(err) if err.is_validation() => {
                log::warn!("Rejected feedback for {content_type:?}: {err}");
                false
            }
            Err(err) => {
                log::error!("Error recording feedback: {err}");
                false
            }
        }
    }

    pub fn try_generation_stats(
        &self,
        content_type: Option<&str>,
    ) -> StoreResult<Vec<GenerationStats>> {
        Ok(self.db.stats_repo().list(content_type)?)
    }

    pub fn get_generation_stats(&self, content_type: Option<&str>) -> Vec<GenerationStats> {
        degrade("generation stats", self.try_generation_stats(content_type))
    }

    pub fn try_recent_feedback(
        &self,
        content_type: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<FeedbackEvent>> {
        Ok(self.db.event_repo().list_recent(content_type, limit)?)
    }

    pub fn get_recent_feedback(
        &self,
        content_type: Option<&str>,
        limit: usize,
    ) -> Vec<FeedbackEvent> {
        degrade(
            "recent feedback",
            self.try_recent_feedback(content_type, limit),
        )
    }

    pub fn try_edit_patterns(
        &self,
        content_type: Option<&str>,
        min_frequency: i64,
    ) -> StoreResult<Vec<EditPattern>> {
        Ok(self.db.pattern_repo().list(content_type, min_frequency)?)
    }

    pub fn get_edit_patterns(
        &self,
        content_type: Option<&str>,
        min_frequency: i64,
    ) -> Vec<EditPattern> {
        degrade(
            "edit patterns",
            self.try_edit_patterns(content_type, min_frequency),
        )
    }

    /// Per-action averages for one content type.
    pub fn try_quality_analysis(&self, content_type: &str) -> StoreResult<QualityByAction> {
        Ok(self.db.quality_repo().analysis(content_type)?)
    }

    pub fn get_quality_analysis(&self, content_type: &str) -> QualityByAction {
        degrade("quality analysis", self.try_quality_analysis(content_type))
    }

    /// Per-action averages keyed by content type.
    pub fn try_quality_analysis_all(&self) -> StoreResult<BTreeMap<String, QualityByAction>> {
        Ok(self.db.quality_repo().analysis_all()?)
    }

    pub fn get_quality_analysis_all(&self) -> BTreeMap<String, QualityByAction> {
        degrade("quality analysis", self.try_quality_analysis_all())
    }

    /// Individual metric samples, newest first. Samples outlive pruned events.
    pub fn try_quality_samples(
        &self,
        content_type: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<QualityMetricSample>> {
        Ok(self.db.quality_repo().list_samples(content_type, limit)?)
    }

    /// Raw preference rows, most confident first.
    pub fn try_preference_rows(
        &self,
        content_type: Option<&str>,
        min_confidence: f64,
    ) -> StoreResult<Vec<UserPreference>> {
        let repo = self.db.preference_repo();
        Ok(repo.list(content_type, min_confidence)?)
    }

    /// Preferences keyed by type. Without a content type the most confident
    /// row of each type wins.
    pub fn try_user_preferences(
        &self,
        content_type: Option<&str>,
        min_confidence: f64,
    ) -> StoreResult<PreferenceMap> {
        let mut map = PreferenceMap::new();
        for row in self.try_preference_rows(content_type, min_confidence)? {
            map.entry(row.preference_type).or_insert(PreferenceValue {
                value: row.preference_value,
                confidence: row.confidence_score,
            });
        }
        Ok(map)
    }

    pub fn get_user_preferences(
        &self,
        content_type: Option<&str>,
        min_confidence: f64,
    ) -> PreferenceMap {
        degrade(
            "user preferences",
            self.try_user_preferences(content_type, min_confidence),
        )
    }

    pub fn try_learning_insights(&self, content_type: &str) -> StoreResult<LearningInsights> {
        let stats = self
            .try_generation_stats(Some(content_type))?
            .into_iter()
            .next();
        let patterns = self.try_edit_patterns(Some(content_type), 1)?;
        let quality = self.try_quality_analysis(content_type)?;
        let preferences = self.try_user_preferences(Some(content_type), 0.0)?;
        let recommendations = insights::recommendations(&quality, &patterns, &preferences);

        Ok(LearningInsights {
            content_type: content_type.to_string(),
            stats,
            patterns,
            quality,
            preferences,
            recommendations,
        })
    }

    pub fn get_learning_insights(&self, content_type: &str) -> LearningInsights {
        match self.try_learning_insights(content_type) {
            Ok(insights) => insights,
            Err(err) => {
                log::error!("Error generating learning insights: {err}");
                LearningInsights {
                    content_type: content_type.to_string(),
                    stats: None,
                    patterns: Vec::new(),
                    quality: QualityByAction::new(),
                    preferences: PreferenceMap::new(),
                    recommendations: Vec::new(),
                }
            }
        }
    }

    /// Guidance block for the next generation request; empty when nothing
    /// has been learned with enough confidence.
    pub fn try_prompt_enhancements(&self, content_type: &str) -> StoreResult<String> {
        let preferences =
            self.try_user_preferences(Some(content_type), insights::GUIDANCE_MIN_CONFIDENCE)?;
        let patterns =
            self.try_edit_patterns(Some(content_type), insights::GUIDANCE_MIN_PATTERN_FREQUENCY)?;

        let guidance = insights::guidance_lines(&preferences, &patterns);
        if guidance.is_empty() {
            return Ok(String::new());
        }

        let rendered = crate::prompts::render(
            "prompt_enhancements",
            &serde_json::json!({ "guidance": guidance }),
        )
        .map_err(|e| StoreError::Template(e.to_string()))?;
        Ok(rendered.trim_end().to_string())
    }

    pub fn get_prompt_enhancements(&self, content_type: &str) -> String {
        degrade(
            "prompt enhancements",
            self.try_prompt_enhancements(content_type),
        )
    }

    pub fn try_database_info(&self) -> StoreResult<DatabaseInfo> {
        let events = self.db.event_repo();
        let total_feedback_records = events.count()?;
        let (earliest_record, latest_record) = events.date_range()?;
        let content_types_tracked = self.db.stats_repo().count()?;
        let edit_patterns_tracked = self.db.pattern_repo().count()?;
        let quality_samples = self.db.quality_repo().count()?;

        Ok(DatabaseInfo {
            database_path: self.db.display_path(),
            total_feedback_records,
            content_types_tracked,
            edit_patterns_tracked,
            quality_samples,
            earliest_record,
            latest_record,
            max_records_limit: self.config.max_records,
        })
    }

    /// Database information; `None` when it could not be read.
    pub fn get_database_info(&self) -> Option<DatabaseInfo> {
        match self.try_database_info() {
            Ok(info) => Some(info),
            Err(err) => {
                log::error!("Error retrieving database info: {err}");
                None
            }
        }
    }

    /// Recompute every generation-stats row by replaying the retained event
    /// log. Returns the number of content types rebuilt.
    pub fn rebuild_generation_stats(&self) -> StoreResult<usize> {
        let now = now_timestamp();
        let rebuilt = self.db.transaction(|tx| -> StoreResult<_> {
            let mut rebuilt: BTreeMap<String, GenerationStats> = BTreeMap::new();
            let outcomes = FeedbackEventRepository::list_outcomes(tx)?;
            for (content_type, action, generation_time) in outcomes {
                rebuilt
                    .entry(content_type)
                    .or_insert_with_key(|ct| GenerationStats::empty(ct.as_str(), now.as_str()))
                    .record(action, generation_time, &now);
            }

            GenerationStatsRepository::clear(tx)?;
            for stats in rebuilt.values() {
                GenerationStatsRepository::save(tx, stats)?;
            }
            Ok(rebuilt.len())
        })?;

        log::info!("Rebuilt generation stats for {rebuilt} content types");
        Ok(rebuilt)
    }
}

fn validate(mut feedback: NewFeedback) -> StoreResult<NewFeedback> {
    let content_type = feedback.content_type.trim();
    if content_type.is_empty() {
        return Err(StoreError::Validation("content type must not be empty".into()));
    }
    feedback.content_type = content_type.to_string();

    if let Some(seconds) = feedback.generation_time {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(StoreError::Validation(format!(
                "generation time must be a non-negative number of seconds, got {seconds}"
            )));
        }
    }
    Ok(feedback)
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn degrade<T: Default>(what: &str, result: StoreResult<T>) -> T {
    result.unwrap_or_else(|err| {
        log::error!("Error retrieving {what}: {err}");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EditType, PreferenceKind};

    fn store() -> FeedbackStore {
        FeedbackStore::open_in_memory(StoreConfig::default()).unwrap()
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn submit_updates_all_derived_state() {
        let store = store();
        let id = store
            .try_submit(
                NewFeedback::new("summary", "**Short** and clear.", UserAction::Accept)
                    .with_prompt("Summarise the paper")
                    .with_generation_time(2.5),
            )
            .unwrap();
        assert!(id.is_some());

        let stats = store.get_generation_stats(Some("summary"));
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total_accepted, 1);
        assert_eq!(stats[0].avg_generation_time, 2.5);

        let recent = store.get_recent_feedback(None, 10);
        assert_eq!(recent.len(), 1);
        assert_eq!(
            recent[0].original_prompt.as_deref(),
            Some("Summarise the paper")
        );
        assert_eq!(recent[0].content_hash, content_hash("**Short** and clear."));

        let quality = store.get_quality_analysis("summary");
        assert_eq!(quality[&UserAction::Accept].sample_count, 1);

        let prefs = store.get_user_preferences(Some("summary"), 0.0);
        assert_eq!(prefs[&PreferenceKind::PreferredLength].value, "3");
        assert!(prefs[&PreferenceKind::UsesBold].is_true());
    }

    #[test]
    fn validation_failures_write_nothing() {
        let store = store();
        let err = store
            .try_submit(NewFeedback::new("  ", "text", UserAction::Accept))
            .unwrap_err();
        assert!(err.is_validation());

        let err = store
            .try_submit(
                NewFeedback::new("summary", "text", UserAction::Accept).with_generation_time(-1.0),
            )
            .unwrap_err();
        assert!(err.is_validation());

        assert!(!store.submit_feedback("summary", "text", "approve", None, None, None));
        assert!(!store.submit_feedback("summary", "text", "", None, None, None));
        assert_eq!(store.get_database_info().unwrap().total_feedback_records, 0);
    }

    #[test]
    fn boundary_submit_parses_action_case_insensitively() {
        let store = store();
        assert!(store.submit_feedback("post", "Hello there.", "ACCEPT", None, None, None));
        assert!(store.submit_feedback("post", "Hello there.", " reject ", None, None, None));
        let stats = &store.get_generation_stats(Some("post"))[0];
        assert_eq!(stats.total_accepted, 1);
        assert_eq!(stats.total_rejected, 1);
    }

    #[test]
    fn disabled_store_ignores_submissions() {
        let config = StoreConfig {
            enabled: false,
            ..StoreConfig::default()
        };
        let store = FeedbackStore::open_in_memory(config).unwrap();
        assert_eq!(
            store
                .try_submit(NewFeedback::new("post", "text", UserAction::Accept))
                .unwrap(),
            None
        );
        assert!(!store.submit_feedback("post", "text", "accept", None, None, None));
        assert!(store.get_generation_stats(None).is_empty());
    }

    #[test]
    fn edit_without_edited_content_mines_nothing() {
        let store = store();
        store
            .try_submit(NewFeedback::new("post", words(10), UserAction::Edit))
            .unwrap();
        assert!(store.get_edit_patterns(None, 1).is_empty());
        assert_eq!(store.get_generation_stats(Some("post"))[0].total_edited, 1);
    }

    #[test]
    fn edit_with_edited_content_records_patterns() {
        let store = store();
        let feedback = NewFeedback::new("post", words(10), UserAction::Edit)
            .with_metadata(FeedbackMetadata::edited(words(30)));
        store.try_submit(feedback.clone()).unwrap();
        store.try_submit(feedback).unwrap();

        let patterns = store.get_edit_patterns(Some("post"), 1);
        let length = patterns
            .iter()
            .find(|p| p.edit_type == EditType::LengthIncrease)
            .unwrap();
        assert_eq!(length.frequency, 2);
        let info = store.get_database_info().unwrap();
        assert_eq!(info.edit_patterns_tracked, patterns.len() as i64);
        assert_eq!(
            patterns
                .iter()
                .filter(|p| p.edit_type == EditType::LengthIncrease)
                .count(),
            1
        );
    }

    #[test]
    fn retention_keeps_the_newest_events() {
        let config = StoreConfig {
            max_records: 3,
            ..StoreConfig::default()
        };
        let store = FeedbackStore::open_in_memory(config).unwrap();
        for i in 0..5 {
            store
                .try_submit(NewFeedback::new("post", format!("event {i}"), UserAction::Accept))
                .unwrap();
        }

        let recent = store.get_recent_feedback(None, 10);
        let texts: Vec<_> = recent.iter().map(|e| e.content_text.as_str()).collect();
        assert_eq!(texts, vec!["event 4", "event 3", "event 2"]);

        // aggregates and quality samples are not pruned
        assert_eq!(store.get_generation_stats(None)[0].total_generated, 5);
        let quality = store.get_quality_analysis("post");
        assert_eq!(quality[&UserAction::Accept].sample_count, 5);
        let samples = store.try_quality_samples(Some("post"), 10).unwrap();
        let ids: Vec<_> = samples.iter().map(|s| s.feedback_id).collect();
        assert_eq!(ids, vec![5, 4, 3, 2, 1]);
        let info = store.get_database_info().unwrap();
        assert_eq!(info.total_feedback_records, 3);
        assert_eq!(info.quality_samples, 5);
        assert_eq!(info.max_records_limit, 3);
        assert_eq!(store.config().max_records, 3);
    }

    #[test]
    fn custom_learner_replaces_default_rules() {
        use crate::application::preferences::{PreferenceRule, RuleCondition};

        let learner = PreferenceLearner::with_rules(vec![PreferenceRule {
            kind: PreferenceKind::AvoidLongContent,
            condition: RuleCondition::RejectedFor(&["rambling"]),
        }]);
        let store = store().with_learner(learner);

        store
            .try_submit(NewFeedback::new("post", "**Bold** text.", UserAction::Accept))
            .unwrap();
        assert!(store.get_user_preferences(Some("post"), 0.0).is_empty());

        store
            .try_submit(
                NewFeedback::new("post", "text", UserAction::Reject)
                    .with_metadata(FeedbackMetadata::revision("Rambling intro")),
            )
            .unwrap();
        let prefs = store.get_user_preferences(Some("post"), 0.0);
        assert_eq!(prefs.len(), 1);
        assert!(prefs[&PreferenceKind::AvoidLongContent].is_true());
    }

    #[test]
    fn learning_insights_bundle() {
        let store = store();
        store
            .try_submit(NewFeedback::new("thread", words(80), UserAction::Accept))
            .unwrap();
        store
            .try_submit(NewFeedback::new("thread", words(20), UserAction::Reject))
            .unwrap();

        let insights = store.get_learning_insights("thread");
        assert_eq!(insights.stats.unwrap().total_generated, 2);
        assert_eq!(insights.quality.len(), 2);
        assert!(
            insights
                .recommendations
                .contains(&"User prefers longer content (~80 words)".to_string())
        );
    }

    #[test]
    fn prompt_enhancements_need_confident_preferences() {
        let store = store();
        assert_eq!(store.get_prompt_enhancements("thread"), "");

        let reason = FeedbackMetadata::revision("Way too technical");
        store
            .try_submit(
                NewFeedback::new("thread", "x", UserAction::Reject).with_metadata(reason.clone()),
            )
            .unwrap();
        // confidence 0.3 is below the guidance floor
        assert_eq!(store.get_prompt_enhancements("thread"), "");

        store
            .try_submit(NewFeedback::new("thread", "x", UserAction::Reject).with_metadata(reason))
            .unwrap();
        let text = store.get_prompt_enhancements("thread");
        assert!(text.starts_with("LEARNED USER PREFERENCES"));
        assert!(text.contains("- Avoid technical jargon and overly complex explanations"));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn rebuild_replays_retained_events() {
        let store = store();
        store
            .try_submit(NewFeedback::new("a", "one", UserAction::Accept).with_generation_time(2.0))
            .unwrap();
        store
            .try_submit(NewFeedback::new("a", "two", UserAction::Edit))
            .unwrap();
        let slow = NewFeedback::new("a", "three", UserAction::Reject).with_generation_time(5.0);
        store.try_submit(slow).unwrap();
        store
            .try_submit(NewFeedback::new("b", "four", UserAction::Accept))
            .unwrap();
        let before = store.get_generation_stats(None);

        {
            let conn = store.database().connection();
            let conn = conn.lock().unwrap();
            conn.execute("UPDATE generation_stats SET total_generated = 99", [])
                .unwrap();
        }

        assert_eq!(store.rebuild_generation_stats().unwrap(), 2);
        let after = store.get_generation_stats(None);
        assert_eq!(after.len(), 2);
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(b.content_type, a.content_type);
            assert_eq!(b.total_generated, a.total_generated);
            assert_eq!(b.total_accepted, a.total_accepted);
            assert_eq!(b.total_edited, a.total_edited);
            assert_eq!(b.total_rejected, a.total_rejected);
            assert!((b.avg_generation_time - a.avg_generation_time).abs() < 1e-9);
        }
    }

    #[test]
    fn database_info_for_in_memory_store() {
        let info = store().get_database_info().unwrap();
        assert_eq!(info.database_path, ":memory:");
        assert_eq!(info.total_feedback_records, 0);
        assert_eq!(info.content_types_tracked, 0);
        assert_eq!(info.edit_patterns_tracked, 0);
        assert_eq!(info.quality_samples, 0);
        assert_eq!(info.earliest_record, None);
        assert_eq!(info.max_records_limit, 2000);
    }
}
