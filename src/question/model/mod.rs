use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cms::content::{Content, ContentItem, Publication};
use crate::cms::{CmsError, DocId, Document, User};


pub const MODULE_NAME: &'static str = "question";
pub const MODEL_NAME: &'static str = "question";

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Choice {
    A,
    B,
    C,
    D,
    E,
}

impl Choice {
    pub const ALL: [Choice; 5] = [Choice::A, Choice::B, Choice::C, Choice::D, Choice::E];

    pub fn letter(self) -> char {
        match self {
            Choice::A => 'A',
            Choice::B => 'B',
            Choice::C => 'C',
            Choice::D => 'D',
            Choice::E => 'E',
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Choice {
    type Err = CmsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Choice::A),
            "B" => Ok(Choice::B),
            "C" => Ok(Choice::C),
            "D" => Ok(Choice::D),
            "E" => Ok(Choice::E),
            other => Err(CmsError::InvalidValue {
                field: "answer",
                value: other.to_owned(),
            }),
        }
    }
}

/// One attempt at answering a question.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Answer {
    pub answer: Choice,
    pub explanation: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
}

impl Answer {
    pub fn new(answer: Choice, now: DateTime<Utc>) -> Self {
        Answer {
            answer,
            explanation: None,
            published: false,
            created_at: now,
            created_by: None,
        }
    }
}

/// Answer history of a user.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Candidate {
    pub user: User,
    pub answers: Vec<(DocId, Answer)>,
}

impl Candidate {
    pub fn new(user: User) -> Self {
        Candidate {
            user,
            answers: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Question {
    #[serde(flatten)]
    pub content: Content,
    pub pretty_slug: String,
    pub body: String,
    pub choice_a: String,
    pub choice_b: String,
    pub choice_c: String,
    pub choice_d: String,
    pub choice_e: String,
    pub correct_answer: Choice,
    pub tries: Vec<Answer>,
}

impl Question {
    pub fn new(
        title: &str,
        channel: DocId,
        body: &str,
        choices: [&str; 5],
        correct_answer: Choice,
        now: DateTime<Utc>,
    ) -> Self {
        let mut content = Content::new(title, channel, now);
        content.publication.published = true;
        Question {
            content,
            pretty_slug: String::new(),
            body: body.to_owned(),
            choice_a: choices[0].to_owned(),
            choice_b: choices[1].to_owned(),
            choice_c: choices[2].to_owned(),
            choice_d: choices[3].to_owned(),
            choice_e: choices[4].to_owned(),
            correct_answer,
            tries: Vec::new(),
        }
    }

    pub fn choice(&self, choice: Choice) -> &str {
        match choice {
            Choice::A => &self.choice_a,
            Choice::B => &self.choice_b,
            Choice::C => &self.choice_c,
            Choice::D => &self.choice_d,
            Choice::E => &self.choice_e,
        }
    }

    pub fn labels(&self) -> Vec<(Choice, String)> {
        Choice::ALL
            .iter()
            .map(|c| (*c, self.choice(*c).to_owned()))
            .collect()
    }

    pub fn is_correct(&self, answer: &Answer) -> bool {
        answer.answer == self.correct_answer
    }

    pub fn strip_outer_paragraphs(&mut self) {
        for field in vec![
            &mut self.body,
            &mut self.choice_a,
            &mut self.choice_b,
            &mut self.choice_c,
            &mut self.choice_d,
            &mut self.choice_e,
        ] {
            *field = strip_outer_p(field.as_str()).to_owned();
        }
    }

    pub fn check_required(&self) -> Result<(), CmsError> {
        let required = [
            ("title", &self.content.title),
            ("body", &self.body),
            ("choice_A", &self.choice_a),
            ("choice_B", &self.choice_b),
            ("choice_C", &self.choice_c),
            ("choice_D", &self.choice_d),
            ("choice_E", &self.choice_e),
        ];
        for (field, value) in required.iter() {
            if value.trim().is_empty() {
                return Err(CmsError::MissingField(*field));
            }
        }
        Ok(())
    }

    /// Public URL of the question. Questions on the homepage are addressed by
    /// their plain slug, every other question by its pretty slug.
    pub fn get_absolute_url(&self, on_homepage: bool, prefix: &str) -> String {
        let slug = if on_homepage {
            &self.content.slug
        } else {
            &self.pretty_slug
        };
        format!("{}/{}", prefix.trim_end_matches('/'), slug)
    }
}

impl ContentItem for Question {
    fn content(&self) -> &Content {
        &self.content
    }

    fn module_name(&self) -> &str {
        MODULE_NAME
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}

impl Document for Question {
    const MODEL_NAME: &'static str = MODEL_NAME;

    fn slug_mut(&mut self) -> &mut String {
        &mut self.content.slug
    }

    fn publication_mut(&mut self) -> &mut Publication {
        &mut self.content.publication
    }

    fn detach(&mut self) {
        self.content.id = DocId::default();
        self.pretty_slug.clear();
    }
}

pub fn strip_outer_p(s: &str) -> &str {
    if s.starts_with("<p>") && s.ends_with("</p>") && s.len() >= 7 {
        &s[3..s.len() - 4]
    } else {
        s
    }
}

pub fn generate_pretty_slug<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("q-{}", rng.gen_range(10000, 100000))
}
