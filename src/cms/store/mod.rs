use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use log::{debug, info, warn};
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use crate::cms::content::Content;
use crate::cms::{slug, Channel, CmsError, Collection, DocId, User};
use crate::question::model::{self, Answer, Candidate, Question};

#[cfg(test)]
mod tests;

const MAX_PRETTY_SLUG_ATTEMPTS: usize = 1000;

#[derive(Debug, Default)]
struct Collections {
    last_id: u64,
    channels: BTreeMap<DocId, Channel>,
    questions: BTreeMap<DocId, Question>,
    candidates: BTreeMap<String, Candidate>,
}

impl Collections {
    fn next_id(&mut self) -> DocId {
        self.last_id += 1;
        DocId(self.last_id)
    }

    fn channel_slug_taken(&self, channel: &Channel) -> bool {
        self.channels
            .values()
            .any(|c| c.id != channel.id && c.long_slug == channel.long_slug)
    }

    fn question_slug_taken(&self, question: &Question) -> bool {
        self.questions.values().any(|q| {
            q.content.id != question.content.id && q.content.long_slug == question.content.long_slug
        })
    }

    fn pretty_slug_taken(&self, question: &Question) -> bool {
        self.questions
            .values()
            .any(|q| q.content.id != question.content.id && q.pretty_slug == question.pretty_slug)
    }

    fn require_channel(&self, id: DocId) -> Result<Channel, CmsError> {
        self.channels
            .get(&id)
            .cloned()
            .ok_or_else(|| CmsError::NotFound(format!("Channel {}", id)))
    }

    /// Keeps an existing free pretty slug, otherwise draws a new one.
    fn assign_pretty_slug<R: Rng + ?Sized>(
        &self,
        question: &mut Question,
        rng: &mut R,
    ) -> Result<(), CmsError> {
        let mut attempts = 0;
        while question.pretty_slug.is_empty() || self.pretty_slug_taken(question) {
            if attempts == MAX_PRETTY_SLUG_ATTEMPTS {
                return Err(CmsError::Exhausted("pretty slug"));
            }
            attempts += 1;
            question.pretty_slug = model::generate_pretty_slug(rng);
        }
        Ok(())
    }

    /// Whether `channel` sits on the parent chain starting at `start`.
    fn is_ancestor_of(&self, channel: DocId, start: DocId) -> bool {
        let mut current = Some(start);
        let mut steps = 0;
        while let Some(id) = current {
            if id == channel {
                return true;
            }
            steps += 1;
            if steps > self.channels.len() {
                break;
            }
            current = self.channels.get(&id).and_then(|c| c.parent);
        }
        false
    }

    /// Recomputes long slugs and material paths below a channel whose own
    /// paths changed.
    fn refresh_descendants(&mut self, parent: &Channel) {
        let children: Vec<DocId> = self
            .channels
            .values()
            .filter(|c| c.parent == Some(parent.id) && c.id != parent.id)
            .map(|c| c.id)
            .collect();
        for child_id in children {
            let child = match self.channels.get_mut(&child_id) {
                Some(child) => {
                    child.assign_paths(Some(parent));
                    child.clone()
                }
                None => continue,
            };
            self.refresh_descendants(&child);
        }
        for question in self
            .questions
            .values_mut()
            .filter(|q| q.content.channel == parent.id)
        {
            question.content.assign_paths(parent);
        }
    }
}

#[derive(Default, Deserialize, Serialize)]
struct Snapshot {
    last_id: u64,
    channels: Vec<Channel>,
    questions: Vec<Question>,
    candidates: Vec<Candidate>,
}

/// In-memory content tree shared by the views and the admin layer.
pub struct Store {
    collections: RwLock<Collections>,
    smart_slugs: bool,
}

impl Store {
    pub fn new(smart_slugs: bool) -> Self {
        Store {
            collections: RwLock::new(Collections::default()),
            smart_slugs,
        }
    }

    pub fn open(path: &Path, smart_slugs: bool) -> Result<Store> {
        if !path.exists() {
            info!("No data file at {}, starting empty", path.display());
            return Ok(Store::new(smart_slugs));
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("Could not read data file {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&json)
            .with_context(|| format!("Could not parse data file {}", path.display()))?;
        let collections = Collections {
            last_id: snapshot.last_id,
            channels: snapshot.channels.into_iter().map(|c| (c.id, c)).collect(),
            questions: snapshot
                .questions
                .into_iter()
                .map(|q| (q.content.id, q))
                .collect(),
            candidates: snapshot
                .candidates
                .into_iter()
                .map(|c| (c.user.id.clone(), c))
                .collect(),
        };
        info!(
            "Loaded {} channels and {} questions from {}",
            collections.channels.len(),
            collections.questions.len(),
            path.display()
        );
        Ok(Store {
            collections: RwLock::new(collections),
            smart_slugs,
        })
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        let json = {
            let collections = self.collections.read();
            let snapshot = Snapshot {
                last_id: collections.last_id,
                channels: collections.channels.values().cloned().collect(),
                questions: collections.questions.values().cloned().collect(),
                candidates: collections.candidates.values().cloned().collect(),
            };
            serde_json::to_string_pretty(&snapshot)?
        };
        fs::write(path, json)
            .with_context(|| format!("Could not write data file {}", path.display()))?;
        Ok(())
    }

    pub fn save_channel(
        &self,
        mut channel: Channel,
        user: Option<&User>,
        now: DateTime<Utc>,
    ) -> Result<DocId, CmsError> {
        let mut collections = self.collections.write();
        let is_new = channel.id.is_unsaved();
        let previous = if is_new {
            None
        } else {
            Some(collections.require_channel(channel.id)?)
        };

        channel.slug = slug::slugify(if channel.slug.trim().is_empty() {
            &channel.title
        } else {
            &channel.slug
        });
        if channel.slug.is_empty() {
            return Err(CmsError::MissingField("slug"));
        }

        if channel.is_homepage
            && collections
                .channels
                .values()
                .any(|c| c.is_homepage && c.id != channel.id)
        {
            return Err(CmsError::HomepageExists);
        }

        if let Some(content_id) = channel.render_content {
            if !collections.questions.contains_key(&content_id) {
                return Err(CmsError::NotFound(format!("Content {}", content_id)));
            }
        }

        let parent = match channel.parent {
            Some(parent_id) if parent_id != channel.id => {
                if !is_new && collections.is_ancestor_of(channel.id, parent_id) {
                    return Err(CmsError::InvalidValue {
                        field: "parent",
                        value: parent_id.to_string(),
                    });
                }
                Some(collections.require_channel(parent_id)?)
            }
            _ => None,
        };

        channel.assign_paths(parent.as_ref());
        let base_slug = channel.slug.clone();
        let mut rng = rand::thread_rng();
        while collections.channel_slug_taken(&channel) {
            if !self.smart_slugs {
                return Err(CmsError::DuplicateSlug(channel.long_slug));
            }
            channel.slug = slug::smart_suffix(&base_slug, &mut rng);
            channel.assign_paths(parent.as_ref());
        }

        if let Some(parent) = &parent {
            channel.heritage(parent);
        }

        channel.publication.touch(is_new, user, now);
        if is_new {
            channel.id = collections.next_id();
        }

        let id = channel.id;
        let moved = previous.map_or(false, |p| p.mpath != channel.mpath);
        debug!("Saving channel {} at {}", id, channel.long_slug);
        collections.channels.insert(id, channel.clone());
        if moved {
            collections.refresh_descendants(&channel);
        }
        Ok(id)
    }

    pub fn save_question(
        &self,
        mut question: Question,
        user: Option<&User>,
        now: DateTime<Utc>,
    ) -> Result<DocId, CmsError> {
        let mut collections = self.collections.write();
        let is_new = question.content.id.is_unsaved();
        if !is_new && !collections.questions.contains_key(&question.content.id) {
            return Err(CmsError::NotFound(format!(
                "Question {}",
                question.content.id
            )));
        }

        question.strip_outer_paragraphs();
        question.check_required()?;

        let content = &mut question.content;
        content.slug = slug::slugify(if content.slug.trim().is_empty() {
            &content.title
        } else {
            &content.slug
        });
        if content.slug.is_empty() {
            return Err(CmsError::MissingField("slug"));
        }

        let channel = collections.require_channel(content.channel)?;
        content.assign_paths(&channel);
        let base_slug = content.slug.clone();
        let mut rng = rand::thread_rng();
        while collections.question_slug_taken(&question) {
            if !self.smart_slugs {
                return Err(CmsError::DuplicateSlug(question.content.long_slug));
            }
            question.content.slug = slug::smart_suffix(&base_slug, &mut rng);
            question.content.assign_paths(&channel);
        }

        collections.assign_pretty_slug(&mut question, &mut rng)?;

        question.content.model = format!("{}.{}", model::MODULE_NAME, model::MODEL_NAME);
        question.content.publication.touch(is_new, user, now);
        if is_new {
            question.content.id = collections.next_id();
        }

        let id = question.content.id;
        debug!(
            "Saving question {} at {} ({})",
            id, question.content.long_slug, question.pretty_slug
        );
        collections.questions.insert(id, question);
        Ok(id)
    }

    pub fn get_channel(&self, id: DocId) -> Option<Channel> {
        self.collections.read().channels.get(&id).cloned()
    }

    pub fn get_question(&self, id: DocId) -> Option<Question> {
        self.collections.read().questions.get(&id).cloned()
    }

    pub fn get_candidate(&self, user_id: &str) -> Option<Candidate> {
        self.collections.read().candidates.get(user_id).cloned()
    }

    pub fn channels(&self) -> Vec<Channel> {
        let mut channels: Vec<Channel> = self.collections.read().channels.values().cloned().collect();
        channels.sort_by(|a, b| a.long_slug.cmp(&b.long_slug));
        channels
    }

    pub fn questions(&self) -> Vec<Question> {
        self.collections.read().questions.values().cloned().collect()
    }

    pub fn channel_by_mpath(&self, mpath: &str) -> Option<Channel> {
        self.collections
            .read()
            .channels
            .values()
            .find(|c| c.mpath == mpath)
            .cloned()
    }

    pub fn channel_by_long_slug(&self, long_slug: &str) -> Option<Channel> {
        self.collections
            .read()
            .channels
            .values()
            .find(|c| c.long_slug == long_slug)
            .cloned()
    }

    pub fn get_homepage(&self) -> Option<Channel> {
        let homepage = self
            .collections
            .read()
            .channels
            .values()
            .find(|c| c.is_homepage)
            .cloned();
        if homepage.is_none() {
            info!("There is no homepage");
        }
        homepage
    }

    /// Theme names set on the channel types of a channel and its ancestors,
    /// innermost first.
    pub fn get_channel_themes(&self, channel: &Channel) -> Vec<String> {
        let ancestors: HashSet<String> = channel.get_ancestors_slugs().into_iter().collect();
        let collections = self.collections.read();
        collections
            .channels
            .values()
            .filter(|c| ancestors.contains(&c.long_slug))
            .sorted_by(|a, b| b.long_slug.cmp(&a.long_slug))
            .filter_map(|c| {
                c.channel_type
                    .as_ref()
                    .and_then(|t| t.template.theme_name.clone())
            })
            .unique()
            .collect()
    }

    pub fn get_question_themes(&self, question: &Question) -> Vec<String> {
        let channel_themes = self
            .get_channel(question.content.channel)
            .map(|c| self.get_channel_themes(&c))
            .unwrap_or_default();
        question.content.get_themes(channel_themes)
    }

    /// Questions listed on a channel page, newest first.
    pub fn channel_contents(&self, channel: &Channel, now: DateTime<Utc>) -> Vec<Question> {
        let filters = channel.get_content_filters();
        let collections = self.collections.read();
        collections
            .questions
            .values()
            .filter(|q| q.content.publication.is_available(now) && q.content.show_on_channel)
            .filter(|q| channel.is_homepage || q.content.mpath.starts_with(&channel.mpath))
            .filter(|q| matches_filters(&q.content, &filters))
            .sorted_by(|a, b| {
                b.content
                    .publication
                    .created_at
                    .cmp(&a.content.publication.created_at)
            })
            .cloned()
            .collect()
    }

    pub fn question_by_pretty_slug(&self, pretty_slug: &str, now: DateTime<Utc>) -> Option<Question> {
        self.collections
            .read()
            .questions
            .values()
            .find(|q| q.pretty_slug == pretty_slug && q.content.publication.is_available(now))
            .cloned()
    }

    pub fn question_on_channel(
        &self,
        channel: DocId,
        slug: &str,
        now: DateTime<Utc>,
    ) -> Option<Question> {
        self.collections
            .read()
            .questions
            .values()
            .find(|q| {
                q.content.channel == channel
                    && q.content.slug == slug
                    && q.content.publication.is_available(now)
            })
            .cloned()
    }

    pub fn record_answer(
        &self,
        question_id: DocId,
        mut answer: Answer,
        user: Option<&User>,
    ) -> Result<(), CmsError> {
        let mut collections = self.collections.write();
        answer.created_by = user.map(|u| u.id.clone());
        collections
            .questions
            .get_mut(&question_id)
            .ok_or_else(|| CmsError::NotFound(format!("Question {}", question_id)))?
            .tries
            .push(answer.clone());
        if let Some(user) = user {
            collections
                .candidates
                .entry(user.id.clone())
                .or_insert_with(|| Candidate::new(user.clone()))
                .answers
                .push((question_id, answer));
        }
        Ok(())
    }
}

fn matches_filters(content: &Content, filters: &BTreeMap<String, String>) -> bool {
    filters.iter().all(|(key, value)| match key.as_str() {
        "model" => content.model == *value,
        "tag" | "tags" => content.tags.iter().any(|t| t == value),
        "template_type" => content
            .template_type
            .as_ref()
            .map_or(false, |t| t.identifier == *value),
        other => {
            warn!("Ignoring unsupported content filter: {}", other);
            true
        }
    })
}

impl Collection<Channel> for Store {
    fn get(&self, id: DocId) -> Option<Channel> {
        self.get_channel(id)
    }

    fn save(&self, channel: Channel, user: Option<&User>, now: DateTime<Utc>) -> Result<DocId, CmsError> {
        self.save_channel(channel, user, now)
    }
}

impl Collection<Question> for Store {
    fn get(&self, id: DocId) -> Option<Question> {
        self.get_question(id)
    }

    fn save(&self, question: Question, user: Option<&User>, now: DateTime<Utc>) -> Result<DocId, CmsError> {
        self.save_question(question, user, now)
    }
}
