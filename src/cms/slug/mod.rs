use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use unidecode::unidecode;


lazy_static! {
    static ref FORBIDDEN_SLUG_CHARACTERS_REGEX: Regex = Regex::new("[^\\sa-z0-9_-]").unwrap();
    static ref SEPARATORS_REGEX: Regex = Regex::new("[\\s_-]+").unwrap();
}

pub fn slugify(text: &str) -> String {
    let text = unidecode(text).to_lowercase();
    let text: String = FORBIDDEN_SLUG_CHARACTERS_REGEX.replace_all(&text, "").into();
    let text: String = SEPARATORS_REGEX.replace_all(text.trim(), "-").into();
    text.trim_matches('-').to_owned()
}

/// Appends a random number to a slug that collides with an existing one.
pub fn smart_suffix<R: Rng + ?Sized>(slug: &str, rng: &mut R) -> String {
    format!("{}-{}", slug, rng.gen::<u32>())
}

pub fn long_slug(parent_long_slug: Option<&str>, slug: &str) -> String {
    match parent_long_slug {
        Some(parent) => format!("{}/{}", parent, slug),
        None => slug.to_owned(),
    }
}

/// Material path of a node: comma separated slugs from the root, with
/// leading and trailing commas (`,quizzes,science,`).
pub fn mpath(parent_mpath: Option<&str>, slug: &str) -> String {
    match parent_mpath {
        Some(parent) => format!("{}{},", parent, slug),
        None => format!(",{},", slug),
    }
}

/// Material path for a URL path (`quizzes/science` becomes `,quizzes,science,`).
pub fn mpath_from_path(path: &str) -> String {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    format!(",{},", segments.join(","))
}

/// Every prefix of a long slug, the full slug first.
pub fn ancestors(long_slug: &str) -> Vec<String> {
    let mut segments: Vec<&str> = long_slug.split('/').filter(|s| !s.is_empty()).collect();
    let mut slugs = Vec::with_capacity(segments.len());
    while !segments.is_empty() {
        slugs.push(segments.join("/"));
        segments.pop();
    }
    slugs
}
