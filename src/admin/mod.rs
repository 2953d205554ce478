use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::cms::User;
use crate::settings::AdminSettings;

pub mod actions;
pub mod question;


pub const DENIED_TEMPLATE: &'static str = "admin/denied.html";

/// Outcome of the access check that runs before every admin view.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Access {
    Granted,
    Login(String),
    Denied(&'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModelAdmin {
    pub model_name: String,
    pub category: String,
    pub name: String,
    pub roles_accepted: Vec<String>,
    pub column_list: Vec<&'static str>,
    pub form_columns: Vec<&'static str>,
    pub datetime_format: String,
}

impl ModelAdmin {
    pub fn new(model_name: &str) -> Self {
        ModelAdmin {
            model_name: model_name.to_owned(),
            category: String::new(),
            name: model_name.to_owned(),
            roles_accepted: Vec::new(),
            column_list: Vec::new(),
            form_columns: Vec::new(),
            datetime_format: "%Y-%m-%d %H:%M".to_owned(),
        }
    }

    pub fn with_roles(mut self, roles: &[&str]) -> Self {
        self.roles_accepted = roles.iter().map(|r| (*r).to_owned()).collect();
        self
    }

    /// Views without accepted roles are open to every signed-in user.
    pub fn is_accessible(&self, user: &User) -> bool {
        self.roles_accepted.is_empty() || self.roles_accepted.iter().any(|r| user.has_role(r))
    }

    pub fn handle_view(&self, user: Option<&User>, admin_url: &str) -> Access {
        let user = match user {
            Some(user) => user,
            None => return Access::Login(format!("/login?next={}", admin_url)),
        };
        if self.is_accessible(user) {
            Access::Granted
        } else {
            info!("User {} may not access {} admin", user.id, self.model_name);
            Access::Denied(DENIED_TEMPLATE)
        }
    }

    pub fn format_datetime(&self, datetime: &DateTime<Utc>) -> String {
        datetime.format(&self.datetime_format).to_string()
    }
}

pub struct AdminRegistry {
    pub name: String,
    pub url: String,
    datetime_format: String,
    views: Vec<ModelAdmin>,
}

impl AdminRegistry {
    pub fn new(settings: &AdminSettings) -> Self {
        AdminRegistry {
            name: settings.name.clone(),
            url: settings.url.clone(),
            datetime_format: settings.datetime_format.clone(),
            views: Vec::new(),
        }
    }

    pub fn register(&mut self, mut view: ModelAdmin, category: &str, name: &str) {
        debug!("Registering {} admin under {}", view.model_name, category);
        view.category = category.to_owned();
        view.name = name.to_owned();
        view.datetime_format = self.datetime_format.clone();
        self.views.push(view);
    }

    pub fn find(&self, model_name: &str) -> Option<&ModelAdmin> {
        self.views.iter().find(|v| v.model_name == model_name)
    }

    pub fn handle_view(&self, model_name: &str, user: Option<&User>) -> Option<Access> {
        self.find(model_name)
            .map(|view| view.handle_view(user, &self.url))
    }
}
