use parking_lot::RwLock;
use std::collections::HashSet;

use crate::render::TemplateLoader;

#[derive(Default)]
pub struct MockTemplateLoader {
    templates: HashSet<String>,
    lookups: RwLock<Vec<String>>,
}

impl MockTemplateLoader {
    pub fn new(templates: &[&str]) -> Self {
        MockTemplateLoader {
            templates: templates.iter().map(|t| (*t).to_owned()).collect(),
            lookups: RwLock::new(Vec::new()),
        }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.read().clone()
    }
}

impl TemplateLoader for MockTemplateLoader {
    fn exists(&self, name: &str) -> bool {
        self.lookups.write().push(name.to_owned());
        self.templates.contains(name)
    }
}
