use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cms::channel::{Channel, TemplateType};
use crate::cms::{slug, DocId, User};
use crate::templates::{ChannelHierarchy, TemplateSubject};

/// Publishing state and audit trail shared by channels and contents.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Publication {
    pub published: bool,
    pub available_at: DateTime<Utc>,
    pub available_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub last_updated_by: Option<String>,
}

impl Publication {
    pub fn new(published: bool, now: DateTime<Utc>) -> Self {
        Publication {
            published,
            available_at: now,
            available_until: None,
            created_at: now,
            updated_at: now,
            created_by: None,
            last_updated_by: None,
        }
    }

    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        self.published
            && self.available_at <= now
            && self.available_until.map_or(true, |until| now < until)
    }

    pub fn touch(&mut self, is_new: bool, user: Option<&User>, now: DateTime<Utc>) {
        self.updated_at = now;
        let user_id = user.map(|u| u.id.clone());
        if is_new {
            self.created_by = user_id.clone();
        }
        self.last_updated_by = user_id;
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Content {
    pub id: DocId,
    pub title: String,
    pub summary: Option<String>,
    pub slug: String,
    pub long_slug: String,
    pub mpath: String,
    pub channel: DocId,
    pub template_type: Option<TemplateType>,
    pub tags: Vec<String>,
    pub show_on_channel: bool,
    pub model: String,
    #[serde(flatten)]
    pub publication: Publication,
}

impl Content {
    pub fn new(title: &str, channel: DocId, now: DateTime<Utc>) -> Self {
        Content {
            id: DocId::default(),
            title: title.to_owned(),
            summary: None,
            slug: String::new(),
            long_slug: String::new(),
            mpath: String::new(),
            channel,
            template_type: None,
            tags: Vec::new(),
            show_on_channel: true,
            model: String::new(),
            publication: Publication::new(false, now),
        }
    }

    pub fn assign_paths(&mut self, channel: &Channel) {
        self.long_slug = slug::long_slug(Some(&channel.long_slug), &self.slug);
        self.mpath = slug::mpath(Some(&channel.mpath), &self.slug);
    }

    pub fn get_themes(&self, channel_themes: Vec<String>) -> Vec<String> {
        let mut themes = Vec::with_capacity(channel_themes.len() + 1);
        if let Some(theme) = self.template_type.as_ref().and_then(|t| t.theme_name.clone()) {
            themes.push(theme);
        }
        for theme in channel_themes {
            if !themes.contains(&theme) {
                themes.push(theme);
            }
        }
        themes
    }
}

/// Anything stored in a channel that renders through the content templates.
pub trait ContentItem {
    fn content(&self) -> &Content;
    fn module_name(&self) -> &str;
    fn model_name(&self) -> &str;
}

impl ContentItem for Content {
    fn content(&self) -> &Content {
        self
    }

    fn module_name(&self) -> &str {
        "core"
    }

    fn model_name(&self) -> &str {
        "content"
    }
}

/// A content item together with the channel it lives in.
pub struct Placed<'a, T: ?Sized> {
    pub item: &'a T,
    pub channel: &'a Channel,
}

impl<'a, T: ContentItem + ?Sized> TemplateSubject for Placed<'a, T> {
    fn template_suffix(&self) -> Option<&str> {
        self.item
            .content()
            .template_type
            .as_ref()
            .map(|t| t.template_suffix.as_str())
    }

    fn module_name(&self) -> &str {
        self.item.module_name()
    }

    fn model_name(&self) -> &str {
        self.item.model_name()
    }

    fn slug(&self) -> &str {
        &self.item.content().slug
    }

    fn long_slug(&self) -> &str {
        &self.item.content().long_slug
    }

    fn channel(&self) -> &dyn ChannelHierarchy {
        self.channel
    }
}
