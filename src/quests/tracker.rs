//! Quest progress tracker
//!
//! The tracker aggregates; it never decides what counts as progress. The
//! host matches rewards, kills, crafts and gifts against objectives and
//! feeds the result in through `record_progress`. Progress only ever moves
//! forward: counters never drop and a completed objective stays completed.
//!
//! Persisted form is a flat object `{quest_id: {objective_index: bool|count}}`.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::QuestRejection;
use crate::persistence::{keys, PersistenceAdapter};
use crate::quests::definition::{ObjectiveDefinition, QuestDefinition};

/// A progress report for one objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Progress {
    /// Mark the objective done
    Complete,
    /// Counter value observed by the host; lower values are ignored
    Count(u32),
    /// Add to the counter
    Add(u32),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ObjectiveProgress {
    completed: bool,
    count: u32,
}

impl ObjectiveProgress {
    /// Apply a report. Returns true if anything changed.
    fn apply(&mut self, definition: &ObjectiveDefinition, progress: Progress) -> bool {
        let before = *self;
        match (progress, definition.target) {
            (Progress::Complete, Some(target)) => self.count = self.count.max(target),
            (Progress::Complete, None) => {}
            (Progress::Count(n), _) => self.count = self.count.max(n),
            (Progress::Add(n), _) => self.count = self.count.saturating_add(n),
        }
        if let Some(target) = definition.target {
            self.count = self.count.min(target);
        }
        let reached = match definition.target {
            Some(target) => self.count >= target,
            None => progress == Progress::Complete || self.count > 0,
        };
        self.completed = self.completed || reached;
        *self != before
    }

    fn to_json(self, definition: &ObjectiveDefinition) -> Value {
        match definition.target {
            Some(_) => Value::from(self.count),
            None => Value::Bool(self.completed),
        }
    }

    fn merge_json(&mut self, definition: &ObjectiveDefinition, value: &Value) -> bool {
        match value {
            Value::Bool(true) => self.apply(definition, Progress::Complete),
            Value::Number(n) => match n.as_u64() {
                Some(count) => {
                    self.apply(definition, Progress::Count(count.min(u32::MAX as u64) as u32))
                }
                None => false,
            },
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectiveStatus {
    pub text: String,
    pub completed: bool,
    /// `(count, target)` for counter objectives
    pub progress: Option<(u32, u32)>,
}

/// Derived view of one quest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestStatus {
    pub id: String,
    pub title: String,
    pub locked: bool,
    pub objectives: Vec<ObjectiveStatus>,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct QuestTracker {
    definitions: Vec<QuestDefinition>,
    progress: BTreeMap<String, Vec<ObjectiveProgress>>,
    /// Completed quests whose completion was already handed out
    reported: BTreeSet<String>,
}

impl QuestTracker {
    pub fn new(definitions: Vec<QuestDefinition>) -> Self {
        let progress = definitions
            .iter()
            .map(|q| (q.id.clone(), vec![ObjectiveProgress::default(); q.objectives.len()]))
            .collect();
        Self {
            definitions,
            progress,
            reported: BTreeSet::new(),
        }
    }

    pub fn definitions(&self) -> &[QuestDefinition] {
        &self.definitions
    }

    pub fn definition(&self, quest_id: &str) -> Option<&QuestDefinition> {
        self.definitions.iter().find(|q| q.id == quest_id)
    }

    pub fn is_complete(&self, quest_id: &str) -> bool {
        self.progress
            .get(quest_id)
            .map(|objectives| objectives.iter().all(|o| o.completed))
            .unwrap_or(false)
    }

    /// Locked while any quest that unlocks it is incomplete
    pub fn is_locked(&self, quest_id: &str) -> bool {
        self.definitions
            .iter()
            .filter(|q| q.unlocks.as_deref() == Some(quest_id))
            .any(|q| !self.is_complete(&q.id))
    }

    /// Record progress on one objective.
    ///
    /// Returns whether anything changed. Locked quests are not touched.
    pub fn record_progress(
        &mut self,
        quest_id: &str,
        objective_index: usize,
        progress: Progress,
    ) -> Result<bool, QuestRejection> {
        let definition = self
            .definitions
            .iter()
            .find(|q| q.id == quest_id)
            .ok_or_else(|| QuestRejection::UnknownQuest(quest_id.to_string()))?;
        let objective = definition.objectives.get(objective_index).ok_or_else(|| {
            QuestRejection::ObjectiveOutOfRange {
                quest: quest_id.to_string(),
                index: objective_index,
            }
        })?;
        if self.is_locked(quest_id) {
            return Err(QuestRejection::Locked(quest_id.to_string()));
        }

        let Some(state) = self
            .progress
            .get_mut(quest_id)
            .and_then(|objectives| objectives.get_mut(objective_index))
        else {
            return Err(QuestRejection::UnknownQuest(quest_id.to_string()));
        };
        let changed = state.apply(objective, progress);
        if changed {
            tracing::debug!("Quest {} objective {} -> {:?}", quest_id, objective_index, state);
        }
        Ok(changed)
    }

    pub fn status(&self, quest_id: &str) -> Option<QuestStatus> {
        let definition = self.definition(quest_id)?;
        let progress = self.progress.get(quest_id)?;
        let objectives: Vec<ObjectiveStatus> = definition
            .objectives
            .iter()
            .zip(progress)
            .map(|(def, state)| ObjectiveStatus {
                text: def.text.clone(),
                completed: state.completed,
                progress: def.target.map(|target| (state.count, target)),
            })
            .collect();
        Some(QuestStatus {
            id: definition.id.clone(),
            title: definition.title.clone(),
            locked: self.is_locked(quest_id),
            completed: objectives.iter().all(|o| o.completed),
            objectives,
        })
    }

    /// Status of every quest in table order
    pub fn statuses(&self) -> Vec<QuestStatus> {
        self.definitions
            .iter()
            .filter_map(|q| self.status(&q.id))
            .collect()
    }

    /// Quests that completed since the last call, each returned once
    pub fn take_completions(&mut self) -> Vec<&QuestDefinition> {
        let newly: Vec<String> = self
            .definitions
            .iter()
            .filter(|q| !self.reported.contains(&q.id) && self.is_complete(&q.id))
            .map(|q| q.id.clone())
            .collect();
        self.reported.extend(newly.iter().cloned());
        self.definitions
            .iter()
            .filter(|q| newly.contains(&q.id))
            .collect()
    }

    pub fn to_json(&self) -> Value {
        let mut quests = Map::new();
        for definition in &self.definitions {
            let Some(progress) = self.progress.get(&definition.id) else {
                continue;
            };
            let objectives: Map<String, Value> = definition
                .objectives
                .iter()
                .zip(progress)
                .enumerate()
                .map(|(index, (def, state))| (index.to_string(), state.to_json(def)))
                .collect();
            quests.insert(definition.id.clone(), Value::Object(objectives));
        }
        Value::Object(quests)
    }

    /// Merge saved progress. Saved values can only move progress forward.
    ///
    /// Quests that are complete after loading count as already reported.
    pub fn merge_json(&mut self, value: &Value) -> usize {
        let Value::Object(quests) = value else {
            return 0;
        };

        let mut merged = 0;
        for (quest_id, objectives) in quests {
            let (Some(definition), Value::Object(objectives)) =
                (self.definitions.iter().find(|q| &q.id == quest_id), objectives)
            else {
                continue;
            };
            let Some(states) = self.progress.get_mut(quest_id) else {
                continue;
            };
            for (index, saved) in objectives {
                let Ok(index) = index.parse::<usize>() else {
                    continue;
                };
                if let (Some(def), Some(state)) =
                    (definition.objectives.get(index), states.get_mut(index))
                {
                    if state.merge_json(def, saved) {
                        merged += 1;
                    }
                }
            }
        }

        let complete: Vec<String> = self
            .definitions
            .iter()
            .filter(|q| self.is_complete(&q.id))
            .map(|q| q.id.clone())
            .collect();
        self.reported.extend(complete);
        merged
    }

    pub fn save_progress(&self, persistence: &mut PersistenceAdapter) -> bool {
        persistence.save(keys::QUEST_PROGRESS, self.to_json())
    }

    pub fn load_progress(&mut self, persistence: &PersistenceAdapter) -> usize {
        match persistence.load(keys::QUEST_PROGRESS) {
            Some(value) => self.merge_json(&value),
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quests::definition::default_quests;
    use serde_json::json;

    fn tracker() -> QuestTracker {
        QuestTracker::new(default_quests())
    }

    #[test]
    fn test_lock_derivation_follows_chain() {
        let mut quests = tracker();
        assert!(!quests.is_locked("first_harvest"));
        assert!(quests.is_locked("toolmaker"));
        assert!(quests.is_locked("monster_hunter"));

        quests.record_progress("first_harvest", 0, Progress::Count(5)).unwrap();
        assert!(quests.is_complete("first_harvest"));
        assert!(!quests.is_locked("toolmaker"));
        assert!(quests.is_locked("monster_hunter"));
    }

    #[test]
    fn test_locked_quest_rejects_progress() {
        let mut quests = tracker();
        assert_eq!(
            quests.record_progress("toolmaker", 0, Progress::Complete),
            Err(QuestRejection::Locked("toolmaker".into()))
        );
        assert!(!quests.status("toolmaker").unwrap().objectives[0].completed);
        assert_eq!(
            quests.record_progress("nope", 0, Progress::Complete),
            Err(QuestRejection::UnknownQuest("nope".into()))
        );
        assert_eq!(
            quests.record_progress("first_harvest", 3, Progress::Complete),
            Err(QuestRejection::ObjectiveOutOfRange {
                quest: "first_harvest".into(),
                index: 3
            })
        );
    }

    #[test]
    fn test_counters_never_decrease() {
        let mut quests = tracker();
        assert_eq!(quests.record_progress("first_harvest", 0, Progress::Count(3)), Ok(true));
        assert_eq!(quests.record_progress("first_harvest", 0, Progress::Count(1)), Ok(false));
        assert_eq!(
            quests.status("first_harvest").unwrap().objectives[0].progress,
            Some((3, 5))
        );
        quests.record_progress("first_harvest", 0, Progress::Add(4)).unwrap();
        let status = quests.status("first_harvest").unwrap();
        assert_eq!(status.objectives[0].progress, Some((5, 5)), "Capped at the target");
        assert!(status.completed);

        // Completed stays completed
        assert_eq!(quests.record_progress("first_harvest", 0, Progress::Count(0)), Ok(false));
        assert!(quests.is_complete("first_harvest"));
    }

    #[test]
    fn test_completion_reported_once() {
        let mut quests = tracker();
        quests.record_progress("first_harvest", 0, Progress::Add(5)).unwrap();

        let done: Vec<String> = quests.take_completions().iter().map(|q| q.id.clone()).collect();
        assert_eq!(done, vec!["first_harvest"]);
        assert!(quests.take_completions().is_empty());
    }

    #[test]
    fn test_multi_objective_quest() {
        let mut quests = tracker();
        quests.record_progress("first_harvest", 0, Progress::Complete).unwrap();
        quests.record_progress("toolmaker", 0, Progress::Complete).unwrap();
        quests.record_progress("monster_hunter", 0, Progress::Add(3)).unwrap();

        quests.record_progress("herbalist_favour", 0, Progress::Complete).unwrap();
        assert!(!quests.is_complete("herbalist_favour"));
        quests.record_progress("herbalist_favour", 1, Progress::Count(35)).unwrap();
        assert!(quests.is_complete("herbalist_favour"));
        assert_eq!(quests.statuses().iter().filter(|s| s.completed).count(), 4);
    }

    #[test]
    fn test_json_roundtrip_marks_reported() {
        let mut quests = tracker();
        quests.record_progress("first_harvest", 0, Progress::Count(5)).unwrap();
        quests.record_progress("toolmaker", 0, Progress::Complete).unwrap();
        let saved = quests.to_json();
        assert_eq!(saved["first_harvest"], json!({"0": 5}));
        assert_eq!(saved["toolmaker"], json!({"0": true}));
        assert_eq!(saved["herbalist_favour"], json!({"0": false, "1": 0}));

        let mut restored = tracker();
        assert_eq!(restored.merge_json(&saved), 2);
        assert!(restored.is_complete("toolmaker"));
        assert!(restored.take_completions().is_empty(), "Already rewarded before saving");
    }

    #[test]
    fn test_merge_ignores_junk_and_never_regresses() {
        let mut quests = tracker();
        quests.record_progress("first_harvest", 0, Progress::Count(4)).unwrap();
        let merged = quests.merge_json(&json!({
            "first_harvest": {"0": 2, "9": 1, "x": true},
            "ghost": {"0": true},
            "toolmaker": "bad"
        }));
        assert_eq!(merged, 0);
        assert_eq!(
            quests.status("first_harvest").unwrap().objectives[0].progress,
            Some((4, 5))
        );
    }

    #[test]
    fn test_persistence() {
        let mut persistence = PersistenceAdapter::in_memory();
        let mut quests = tracker();
        quests.record_progress("first_harvest", 0, Progress::Count(2)).unwrap();
        assert!(quests.save_progress(&mut persistence));

        let mut restored = tracker();
        assert_eq!(restored.load_progress(&persistence), 1);
        assert_eq!(
            restored.status("first_harvest").unwrap().objectives[0].progress,
            Some((2, 5))
        );
    }
}
