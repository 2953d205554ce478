use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

use crate::cms::{slug, Channel, CmsError, Placed, Store, User};
use crate::question::model::{Answer, Choice, Question};
use crate::settings::Settings;
use crate::templates::{TemplateError, TemplateNames};


const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Cms(#[from] CmsError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Clone, Debug)]
pub struct Session {
    pub id: String,
    pub user: Option<User>,
}

impl Session {
    pub fn anonymous(id: &str) -> Self {
        Session {
            id: id.to_owned(),
            user: None,
        }
    }

    pub fn for_user(user: User) -> Self {
        Session {
            id: user.id.clone(),
            user: Some(user),
        }
    }

    /// Seed for everything randomized per visitor. FNV-1a over the visitor
    /// key; must stay stable across builds.
    pub fn seed(&self) -> u64 {
        let key = self.user.as_ref().map_or(&self.id, |u| &u.id);
        key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnswerForm {
    pub choices: Vec<(Choice, String)>,
    pub answer: Option<Choice>,
    pub explanation: Option<String>,
    pub errors: Vec<String>,
}

impl AnswerForm {
    fn new(question: &Question, session: &Session) -> Self {
        let mut choices = question.labels();
        let mut rng = StdRng::seed_from_u64(session.seed());
        choices.shuffle(&mut rng);
        AnswerForm {
            choices,
            ..Default::default()
        }
    }

    /// Binds submitted values, returning the answer when the form is valid.
    fn bind(&mut self, submission: &AnswerSubmission) -> Option<Choice> {
        self.explanation = submission
            .explanation
            .clone()
            .filter(|e| !e.trim().is_empty());
        let raw = match submission.answer.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                self.errors.push("This field is required.".to_owned());
                return None;
            }
        };
        match raw.parse::<Choice>() {
            Ok(choice) if self.choices.iter().any(|(c, _)| *c == choice) => {
                self.answer = Some(choice);
                Some(choice)
            }
            _ => {
                self.errors.push("Not a valid choice".to_owned());
                None
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AnswerSubmission {
    pub answer: Option<String>,
    pub explanation: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ListPage {
    pub templates: Vec<String>,
    pub themes: Vec<String>,
    pub channel: Channel,
    pub contents: Vec<Question>,
}

#[derive(Clone, Debug)]
pub struct DetailPage {
    pub templates: Vec<String>,
    pub themes: Vec<String>,
    pub question: Question,
    pub form: AnswerForm,
}

#[derive(Clone, Debug)]
pub enum Page {
    List(ListPage),
    Detail(DetailPage),
    Redirect(String),
}

enum Lookup {
    Found(Question),
    Redirect(String),
}

pub struct QuestionDetail<'a> {
    store: &'a Store,
    names: TemplateNames,
    url_prefix: String,
}

impl<'a> QuestionDetail<'a> {
    pub fn new(store: &'a Store, settings: &Settings) -> Self {
        QuestionDetail {
            store,
            names: settings.template_names(),
            url_prefix: settings.question_url_prefix.clone(),
        }
    }

    pub fn get_template_names(&self, question: &Question) -> Result<Vec<String>, ViewError> {
        let channel = self.require_channel(question)?;
        let placed = Placed {
            item: question,
            channel: &channel,
        };
        Ok(self.names.detail_paths(&placed)?)
    }

    fn require_channel(&self, question: &Question) -> Result<Channel, CmsError> {
        self.store
            .get_channel(question.content.channel)
            .ok_or_else(|| CmsError::NotFound(format!("Channel {}", question.content.channel)))
    }

    /// Finds a question by pretty slug, falling back to a content of the
    /// homepage with that slug.
    fn lookup(
        &self,
        pretty_slug: &str,
        render_content: bool,
        now: DateTime<Utc>,
    ) -> Result<Lookup, CmsError> {
        let homepage = self.store.get_homepage().ok_or(CmsError::MissingHomepage)?;

        if pretty_slug.starts_with(&homepage.slug)
            && pretty_slug.split('/').count() < 3
            && !render_content
        {
            let slug = pretty_slug.split('/').last().unwrap_or(pretty_slug);
            return Ok(Lookup::Redirect(format!("/{}.html", slug)));
        }

        let question = match self.store.question_by_pretty_slug(pretty_slug, now) {
            Some(question) => Some(question),
            None => {
                debug!("No question with pretty slug {}, trying homepage", pretty_slug);
                self.store.question_on_channel(homepage.id, pretty_slug, now)
            }
        };
        question
            .map(Lookup::Found)
            .ok_or_else(|| CmsError::NotFound(format!("Question {}", pretty_slug)))
    }

    fn render(&self, question: Question, form: AnswerForm) -> Result<DetailPage, ViewError> {
        Ok(DetailPage {
            templates: self.get_template_names(&question)?,
            themes: self.store.get_question_themes(&question),
            question,
            form,
        })
    }

    pub fn get(
        &self,
        pretty_slug: &str,
        render_content: bool,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<Page, ViewError> {
        let question = match self.lookup(pretty_slug, render_content, now)? {
            Lookup::Found(question) => question,
            Lookup::Redirect(location) => return Ok(Page::Redirect(location)),
        };
        let form = AnswerForm::new(&question, session);
        Ok(Page::Detail(self.render(question, form)?))
    }

    pub fn post(
        &self,
        pretty_slug: &str,
        submission: &AnswerSubmission,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<Page, ViewError> {
        let question = match self.lookup(pretty_slug, false, now)? {
            Lookup::Found(question) => question,
            Lookup::Redirect(location) => return Ok(Page::Redirect(location)),
        };
        let mut form = AnswerForm::new(&question, session);
        let choice = match form.bind(submission) {
            Some(choice) => choice,
            None => return Ok(Page::Detail(self.render(question, form)?)),
        };

        let mut answer = Answer::new(choice, now);
        answer.explanation = form.explanation.clone();
        self.store
            .record_answer(question.content.id, answer, session.user.as_ref())?;
        info!(
            "Recorded answer {} to question {}",
            choice, question.content.id
        );

        let on_homepage = self.require_channel(&question)?.is_homepage;
        Ok(Page::Redirect(
            question.get_absolute_url(on_homepage, &self.url_prefix),
        ))
    }
}

pub struct QuestionList<'a> {
    store: &'a Store,
    settings: &'a Settings,
    names: TemplateNames,
}

impl<'a> QuestionList<'a> {
    pub fn new(store: &'a Store, settings: &'a Settings) -> Self {
        QuestionList {
            store,
            settings,
            names: settings.template_names(),
        }
    }

    pub fn get_template_names(&self, channel: &Channel) -> Result<Vec<String>, ViewError> {
        Ok(self.names.list_paths(channel)?)
    }

    pub fn get(
        &self,
        path: &str,
        session: &Session,
        now: DateTime<Utc>,
    ) -> Result<Page, ViewError> {
        let mpath = slug::mpath_from_path(path);
        let channel = self
            .store
            .channel_by_mpath(&mpath)
            .ok_or_else(|| CmsError::NotFound(format!("Channel {}", path)))?;

        if let Some(content_id) = channel.render_content {
            let question = self
                .store
                .get_question(content_id)
                .ok_or_else(|| CmsError::NotFound(format!("Content {}", content_id)))?;
            return QuestionDetail::new(self.store, self.settings).get(
                &question.pretty_slug,
                true,
                session,
                now,
            );
        }

        Ok(Page::List(ListPage {
            templates: self.get_template_names(&channel)?,
            themes: self.store.get_channel_themes(&channel),
            contents: self.store.channel_contents(&channel, now),
            channel,
        }))
    }
}
