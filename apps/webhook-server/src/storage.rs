//! In-memory record of generated scripts. Nothing is written to disk.

use crate::models::ScriptRecord;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

pub struct ScriptStore {
    video_base: String,
    scripts: RwLock<HashMap<String, ScriptRecord>>,
}

impl ScriptStore {
    pub fn new(video_base: impl Into<String>) -> Self {
        Self {
            video_base: video_base.into(),
            scripts: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self, topic: &str) -> ScriptRecord {
        let response_id = Uuid::new_v4().to_string();
        let record = ScriptRecord {
            video_url: format!("{}/{}.mp4", self.video_base.trim_end_matches('/'), response_id),
            response_id: response_id.clone(),
            topic: topic.to_string(),
            revisions: 0,
            approved: false,
            video_status: None,
            created_at: Utc::now(),
        };
        self.scripts.write().insert(response_id, record.clone());
        record
    }

    pub fn get(&self, response_id: &str) -> Option<ScriptRecord> {
        self.scripts.read().get(response_id).cloned()
    }

    /// Returns the new revision number; unknown ids start a fresh count.
    pub fn record_revision(&self, response_id: &str) -> u32 {
        let mut scripts = self.scripts.write();
        match scripts.get_mut(response_id) {
            Some(record) => {
                record.revisions += 1;
                record.revisions
            }
            None => 1,
        }
    }

    pub fn mark_approved(&self, response_id: &str) -> bool {
        match self.scripts.write().get_mut(response_id) {
            Some(record) => {
                record.approved = true;
                true
            }
            None => false,
        }
    }

    pub fn record_video_decision(&self, video_url: &str, status: &str) -> bool {
        let mut scripts = self.scripts.write();
        match scripts.values_mut().find(|record| record.video_url == video_url) {
            Some(record) => {
                record.video_status = Some(status.to_string());
                true
            }
            None => false,
        }
    }
}
