use thiserror::Error;


pub const DEFAULT_OBJECT_NAME: &'static str = "question";
pub const DEFAULT_TEMPLATE_EXT: &'static str = "html";
pub const DEFAULT_TYPE_SUFFIX: &'static str = "default";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Malformed template subject: {0} is empty")]
    ContractViolation(&'static str),
}

/// A node of the channel tree, as seen by template resolution.
pub trait ChannelHierarchy {
    /// Suffix of the channel type, if the channel has one.
    fn template_suffix(&self) -> Option<&str>;

    /// Slugs to qualify templates with, in the order they should be tried.
    fn ancestors_slugs(&self) -> Vec<String>;
}

/// A content item that can be rendered in a detail view.
pub trait TemplateSubject {
    fn template_suffix(&self) -> Option<&str>;
    fn module_name(&self) -> &str;
    fn model_name(&self) -> &str;
    fn slug(&self) -> &str;
    fn long_slug(&self) -> &str;
    fn channel(&self) -> &dyn ChannelHierarchy;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ViewKind {
    List,
    Detail,
}

impl ViewKind {
    fn base_suffix(self) -> &'static str {
        match self {
            ViewKind::List => "list",
            ViewKind::Detail => "detail",
        }
    }
}

/// Naming scheme used to build candidate template paths.
///
/// Every call computes a fresh list: the suffix is derived per call and never
/// stored, so one value can serve any number of concurrent requests.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TemplateNames {
    object_name: String,
    ext: String,
    default_type_suffix: String,
}

impl Default for TemplateNames {
    fn default() -> Self {
        TemplateNames::new(
            DEFAULT_OBJECT_NAME,
            DEFAULT_TEMPLATE_EXT,
            DEFAULT_TYPE_SUFFIX,
        )
    }
}

impl TemplateNames {
    pub fn new(object_name: &str, ext: &str, default_type_suffix: &str) -> Self {
        TemplateNames {
            object_name: object_name.to_owned(),
            ext: ext.to_owned(),
            default_type_suffix: default_type_suffix.to_owned(),
        }
    }

    fn suffix(&self, type_suffix: Option<&str>, kind: ViewKind) -> Result<String, TemplateError> {
        let type_suffix = match type_suffix {
            Some("") => return Err(TemplateError::ContractViolation("template suffix")),
            Some(s) => s,
            None => self.default_type_suffix.as_str(),
        };
        Ok(format!("{}_{}", type_suffix, kind.base_suffix()))
    }

    fn check_names(&self) -> Result<(), TemplateError> {
        require("object name", &self.object_name)?;
        require("template extension", &self.ext)?;
        require("default type suffix", &self.default_type_suffix)?;
        Ok(())
    }

    pub fn list_paths<C: ChannelHierarchy + ?Sized>(
        &self,
        channel: &C,
    ) -> Result<Vec<String>, TemplateError> {
        self.check_names()?;
        let suffix = self.suffix(channel.template_suffix(), ViewKind::List)?;
        let channels = checked_ancestors(channel)?;
        let object_name = &self.object_name;
        let ext = &self.ext;

        let mut names: Vec<String> = channels
            .iter()
            .map(|channel| format!("{}/{}/{}.{}", object_name, channel, suffix, ext))
            .collect();
        names.push(format!("{}/{}.{}", object_name, suffix, ext));
        Ok(names)
    }

    pub fn detail_paths<S: TemplateSubject + ?Sized>(
        &self,
        content: &S,
    ) -> Result<Vec<String>, TemplateError> {
        self.check_names()?;
        let suffix = self.suffix(content.template_suffix(), ViewKind::Detail)?;
        let module_name = require("module name", content.module_name())?;
        let model_name = require("model name", content.model_name())?;
        let slug = require("slug", content.slug())?;
        let long_slug = require("long slug", content.long_slug())?;
        let channels = checked_ancestors(content.channel())?;
        let object_name = &self.object_name;
        let ext = &self.ext;

        let mut names = Vec::with_capacity(8 + 4 * channels.len());
        names.push(format!("{}/{}.{}", object_name, long_slug, ext));
        names.push(format!("{}/{}_{}.{}", object_name, long_slug, suffix, ext));
        names.push(format!("{}/{}.{}", object_name, slug, ext));
        names.push(format!("{}/{}_{}.{}", object_name, slug, suffix, ext));

        for channel in &channels {
            names.push(format!(
                "{}/_{}/{}/{}_{}.{}",
                object_name, module_name, channel, model_name, suffix, ext
            ));
        }
        for channel in &channels {
            names.push(format!(
                "{}/_{}/{}/{}.{}",
                object_name, module_name, channel, suffix, ext
            ));
        }
        names.push(format!(
            "{}/_{}/{}_{}.{}",
            object_name, module_name, model_name, suffix, ext
        ));
        names.push(format!("{}/_{}/{}.{}", object_name, module_name, suffix, ext));

        for channel in &channels {
            names.push(format!(
                "{}/{}/{}_{}.{}",
                object_name, channel, model_name, suffix, ext
            ));
        }
        for channel in &channels {
            names.push(format!("{}/{}/{}.{}", object_name, channel, suffix, ext));
        }
        names.push(format!("{}/{}_{}.{}", object_name, model_name, suffix, ext));
        names.push(format!("{}/{}.{}", object_name, suffix, ext));

        Ok(names)
    }
}

fn require<'a>(what: &'static str, value: &'a str) -> Result<&'a str, TemplateError> {
    if value.trim().is_empty() {
        Err(TemplateError::ContractViolation(what))
    } else {
        Ok(value)
    }
}

fn checked_ancestors<C: ChannelHierarchy + ?Sized>(
    channel: &C,
) -> Result<Vec<String>, TemplateError> {
    let slugs = channel.ancestors_slugs();
    for slug in &slugs {
        require("ancestor channel slug", slug)?;
    }
    Ok(slugs)
}

pub fn resolve_list_paths<C: ChannelHierarchy + ?Sized>(
    channel: &C,
) -> Result<Vec<String>, TemplateError> {
    TemplateNames::default().list_paths(channel)
}

pub fn resolve_detail_paths<S: TemplateSubject + ?Sized>(
    content: &S,
) -> Result<Vec<String>, TemplateError> {
    TemplateNames::default().detail_paths(content)
}
