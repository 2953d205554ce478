use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cms::content::Publication;
use crate::cms::{slug, DocId, Document};
use crate::templates::ChannelHierarchy;


/// Template variant picked by editors for a channel or a content item.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TemplateType {
    pub title: String,
    pub identifier: String,
    pub template_suffix: String,
    pub theme_name: Option<String>,
}

impl TemplateType {
    pub fn new(title: &str, template_suffix: &str) -> Self {
        TemplateType {
            title: title.to_owned(),
            identifier: slug::slugify(title),
            template_suffix: template_suffix.to_owned(),
            theme_name: None,
        }
    }

    pub fn with_theme(mut self, theme_name: &str) -> Self {
        self.theme_name = Some(theme_name.to_owned());
        self
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ChannelType {
    #[serde(flatten)]
    pub template: TemplateType,
    pub content_filters: BTreeMap<String, String>,
}

impl From<TemplateType> for ChannelType {
    fn from(template: TemplateType) -> Self {
        ChannelType {
            template,
            content_filters: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Channel {
    pub id: DocId,
    pub title: String,
    pub description: Option<String>,
    pub slug: String,
    pub long_slug: String,
    pub mpath: String,
    pub parent: Option<DocId>,
    pub is_homepage: bool,
    pub show_in_menu: bool,
    pub include_in_rss: bool,
    pub indexable: bool,
    pub inherit_parent: bool,
    pub canonical_url: Option<String>,
    pub order: i32,
    pub aliases: Vec<String>,
    pub channel_type: Option<ChannelType>,
    pub content_filters: BTreeMap<String, String>,
    pub render_content: Option<DocId>,
    #[serde(flatten)]
    pub publication: Publication,
}

impl Channel {
    pub fn new(title: &str, now: DateTime<Utc>) -> Self {
        Channel {
            id: DocId::default(),
            title: title.to_owned(),
            description: None,
            slug: String::new(),
            long_slug: String::new(),
            mpath: String::new(),
            parent: None,
            is_homepage: false,
            show_in_menu: false,
            include_in_rss: true,
            indexable: true,
            inherit_parent: true,
            canonical_url: None,
            order: 0,
            aliases: Vec::new(),
            channel_type: None,
            content_filters: BTreeMap::new(),
            render_content: None,
            publication: Publication::new(false, now),
        }
    }

    pub fn with_parent(mut self, parent: DocId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn homepage(mut self) -> Self {
        self.is_homepage = true;
        self
    }

    /// Long slugs of this channel and every channel above it, this one first.
    pub fn get_ancestors_slugs(&self) -> Vec<String> {
        slug::ancestors(&self.long_slug)
    }

    pub fn get_content_filters(&self) -> BTreeMap<String, String> {
        let mut filters = BTreeMap::new();
        if let Some(channel_type) = &self.channel_type {
            filters.extend(channel_type.content_filters.clone());
        }
        filters.extend(self.content_filters.clone());
        filters
    }

    pub fn get_absolute_url(&self) -> String {
        format!("/{}/", self.long_slug)
    }

    pub fn assign_paths(&mut self, parent: Option<&Channel>) {
        let parent = parent.filter(|p| p.id != self.id);
        self.long_slug = slug::long_slug(parent.map(|p| p.long_slug.as_str()), &self.slug);
        self.mpath = slug::mpath(parent.map(|p| p.mpath.as_str()), &self.slug);
    }

    /// Fills unset settings from the parent channel.
    pub fn heritage(&mut self, parent: &Channel) {
        if !self.inherit_parent {
            return;
        }
        if self.content_filters.is_empty() {
            self.content_filters = parent.content_filters.clone();
        }
        self.include_in_rss = self.include_in_rss || parent.include_in_rss;
        self.show_in_menu = self.show_in_menu || parent.show_in_menu;
        self.indexable = self.indexable || parent.indexable;
        if self.channel_type.is_none() {
            self.channel_type = parent.channel_type.clone();
        }
    }
}

impl ChannelHierarchy for Channel {
    fn template_suffix(&self) -> Option<&str> {
        self.channel_type
            .as_ref()
            .map(|t| t.template.template_suffix.as_str())
    }

    fn ancestors_slugs(&self) -> Vec<String> {
        self.get_ancestors_slugs()
    }
}

impl Document for Channel {
    const MODEL_NAME: &'static str = "channel";

    fn slug_mut(&mut self) -> &mut String {
        &mut self.slug
    }

    fn publication_mut(&mut self) -> &mut Publication {
        &mut self.publication
    }

    fn detach(&mut self) {
        self.id = DocId::default();
        self.is_homepage = false;
    }
}
