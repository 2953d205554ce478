use log::debug;
use std::path::{Path, PathBuf};

#[cfg(test)]
pub mod mock;

pub trait TemplateLoader {
    fn exists(&self, name: &str) -> bool;
}

/// Picks the first candidate the loader knows about.
pub fn select_template<'a, L: TemplateLoader + ?Sized>(
    loader: &L,
    candidates: &'a [String],
) -> Option<&'a str> {
    let selected = candidates
        .iter()
        .find(|name| loader.exists(name))
        .map(String::as_str);
    match selected {
        Some(name) => debug!("Selected template {}", name),
        None => debug!("None of {} templates exist", candidates.len()),
    }
    selected
}

/// Looks templates up in theme directories first, then in the shared
/// template directory.
#[derive(Clone, Debug)]
pub struct FsTemplateLoader {
    search_path: Vec<PathBuf>,
}

impl FsTemplateLoader {
    pub fn new(root: &Path, themes: &[String]) -> Self {
        let mut search_path: Vec<PathBuf> = themes
            .iter()
            .map(|theme| root.join("themes").join(theme).join("templates"))
            .collect();
        search_path.push(root.join("templates"));
        FsTemplateLoader { search_path }
    }

    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        self.search_path
            .iter()
            .map(|dir| dir.join(name))
            .find(|path| path.is_file())
    }
}

impl TemplateLoader for FsTemplateLoader {
    fn exists(&self, name: &str) -> bool {
        self.locate(name).is_some()
    }
}
