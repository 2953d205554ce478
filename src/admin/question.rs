use std::collections::BTreeMap;

use crate::admin::ModelAdmin;
use crate::cms::{CmsError, DocId, Store};
use crate::question::model::{Choice, Question, MODEL_NAME};
use crate::settings::Settings;

pub const COLUMN_LIST: [&'static str; 7] = [
    "title",
    "slug",
    "pretty_slug",
    "channel",
    "published",
    "created_at",
    "view_on_site",
];

pub const FORM_COLUMNS: [&'static str; 10] = [
    "title",
    "slug",
    "channel",
    "body",
    "choice_A",
    "choice_B",
    "choice_C",
    "choice_D",
    "choice_E",
    "correct_answer",
];

pub struct QuestionAdmin {
    pub view: ModelAdmin,
    url_prefix: String,
}

impl QuestionAdmin {
    pub fn new(settings: &Settings) -> Self {
        let mut view = ModelAdmin::new(MODEL_NAME).with_roles(&["admin", "editor"]);
        view.column_list = COLUMN_LIST.to_vec();
        view.form_columns = FORM_COLUMNS.to_vec();
        view.datetime_format = settings.admin.datetime_format.clone();
        QuestionAdmin {
            view,
            url_prefix: settings.question_url_prefix.clone(),
        }
    }

    pub fn view_on_site(&self, question: &Question, on_homepage: bool) -> String {
        format!(
            "<a href=\"{}\" target=\"_blank\"><i class=\"icon icon-eye-open\" style=\"margin-right: 5px;\"></i>View on site</a>",
            question.get_absolute_url(on_homepage, &self.url_prefix)
        )
    }

    /// Cell values of a list row, in column order.
    pub fn row(&self, question: &Question, store: &Store) -> Vec<String> {
        let channel = store.get_channel(question.content.channel);
        self.view
            .column_list
            .iter()
            .map(|column| match *column {
                "title" => question.content.title.clone(),
                "slug" => question.content.slug.clone(),
                "pretty_slug" => question.pretty_slug.clone(),
                "channel" => channel
                    .as_ref()
                    .map_or_else(String::new, |c| c.title.clone()),
                "published" => question.content.publication.published.to_string(),
                "created_at" => self
                    .view
                    .format_datetime(&question.content.publication.created_at),
                "view_on_site" => {
                    self.view_on_site(question, channel.as_ref().map_or(false, |c| c.is_homepage))
                }
                _ => String::new(),
            })
            .collect()
    }

    /// Applies submitted form fields to a question. Fields missing from the
    /// form keep their current value; unknown fields are rejected.
    pub fn bind_form(
        &self,
        mut question: Question,
        form: &BTreeMap<String, String>,
    ) -> Result<Question, CmsError> {
        if let Some(unknown) = form
            .keys()
            .find(|key| !self.view.form_columns.contains(&key.as_str()))
        {
            return Err(CmsError::InvalidValue {
                field: "form",
                value: unknown.clone(),
            });
        }
        for column in &self.view.form_columns {
            let value = match form.get(*column) {
                Some(value) => value.clone(),
                None => continue,
            };
            match *column {
                "title" => question.content.title = value,
                "slug" => question.content.slug = value,
                "channel" => {
                    question.content.channel =
                        DocId(value.trim().parse().map_err(|_| CmsError::InvalidValue {
                            field: "channel",
                            value: value.clone(),
                        })?)
                }
                "body" => question.body = value,
                "choice_A" => question.choice_a = value,
                "choice_B" => question.choice_b = value,
                "choice_C" => question.choice_c = value,
                "choice_D" => question.choice_d = value,
                "choice_E" => question.choice_e = value,
                "correct_answer" => question.correct_answer = value.parse::<Choice>()?,
                _ => {}
            }
        }
        Ok(question)
    }
}
