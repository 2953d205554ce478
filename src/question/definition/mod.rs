use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::de;
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::cms::{slug, Channel, DocId, Store, User};
use crate::question::model::{Choice, Question};

#[cfg(test)]
mod tests;

fn bool_from_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match String::deserialize(deserializer)?
        .trim()
        .to_lowercase()
        .as_str()
    {
        "true" | "" => Ok(true),
        "false" => Ok(false),
        other => Err(de::Error::invalid_value(
            de::Unexpected::Str(other),
            &"true, false or blank",
        )),
    }
}

fn choice_from_string<'de, D>(deserializer: D) -> Result<Choice, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(|_| {
        de::Error::invalid_value(de::Unexpected::Str(&raw), &"one of A, B, C, D or E")
    })
}

/// One row of a question spreadsheet.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RawQuestion {
    pub title: String,
    pub channel: String,
    pub slug: Option<String>,
    pub body: String,
    pub choice_a: String,
    pub choice_b: String,
    pub choice_c: String,
    pub choice_d: String,
    pub choice_e: String,
    #[serde(deserialize_with = "choice_from_string")]
    pub correct_answer: Choice,
    #[serde(deserialize_with = "bool_from_string", default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

impl RawQuestion {
    fn into_question(self, channel: DocId, now: DateTime<Utc>) -> Question {
        let mut question = Question::new(
            &self.title,
            channel,
            &self.body,
            [
                self.choice_a.as_str(),
                self.choice_b.as_str(),
                self.choice_c.as_str(),
                self.choice_d.as_str(),
                self.choice_e.as_str(),
            ],
            self.correct_answer,
            now,
        );
        question.content.slug = self.slug.unwrap_or_default();
        question.content.publication.published = self.published;
        question
    }
}

#[derive(Debug)]
pub struct QuizDefinition {
    questions: Vec<RawQuestion>,
}

impl QuizDefinition {
    pub fn open(source: &Path) -> Result<QuizDefinition> {
        let file = File::open(source)
            .with_context(|| format!("Could not open question file {}", source.display()))?;
        QuizDefinition::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<QuizDefinition> {
        let mut questions = Vec::new();
        let mut csv_reader = csv::Reader::from_reader(reader);
        for (line, question) in csv_reader.deserialize().enumerate() {
            let raw_question: RawQuestion =
                question.with_context(|| format!("Invalid question on row {}", line + 1))?;
            questions.push(raw_question);
        }
        Ok(QuizDefinition { questions })
    }

    pub fn get_questions(&self) -> &Vec<RawQuestion> {
        &self.questions
    }

    /// Saves every question, creating the channels named by their long slugs
    /// along the way.
    pub fn import(
        self,
        store: &Store,
        user: Option<&User>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DocId>> {
        let mut ids = Vec::with_capacity(self.questions.len());
        for raw_question in self.questions {
            let channel = ensure_channel(store, &raw_question.channel, user, now)?;
            let title = raw_question.title.clone();
            let question = raw_question.into_question(channel, now);
            let id = store
                .save_question(question, user, now)
                .with_context(|| format!("Could not save question \"{}\"", title))?;
            ids.push(id);
        }
        info!("Imported {} questions", ids.len());
        Ok(ids)
    }
}

fn ensure_channel(
    store: &Store,
    long_slug: &str,
    user: Option<&User>,
    now: DateTime<Utc>,
) -> Result<DocId> {
    let mut parent: Option<DocId> = None;
    let mut path = Vec::new();
    for segment in long_slug.split('/').map(slug::slugify) {
        if segment.is_empty() {
            continue;
        }
        path.push(segment.clone());
        let id = match store.channel_by_long_slug(&path.join("/")) {
            Some(channel) => channel.id,
            None => {
                let mut channel = Channel::new(&segment, now);
                channel.slug = segment;
                channel.parent = parent;
                channel.publication.published = true;
                info!("Creating channel {}", path.join("/"));
                store.save_channel(channel, user, now)?
            }
        };
        parent = Some(id);
    }
    parent.ok_or_else(|| anyhow!("Question has no channel"))
}
