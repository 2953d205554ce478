use super::*;
use chrono::Duration;
use rand::rngs::mock::StepRng;

use crate::cms::channel::{ChannelType, TemplateType};
use crate::question::model::Choice;

struct Context {
    store: Store,
    homepage: DocId,
    quizzes: DocId,
    science: DocId,
}

struct ContextBuilder {
    smart_slugs: bool,
}

impl ContextBuilder {
    fn new() -> Self {
        ContextBuilder { smart_slugs: false }
    }

    fn smart_slugs(mut self) -> Self {
        self.smart_slugs = true;
        self
    }

    fn build(self) -> Context {
        let now = Utc::now();
        let store = Store::new(self.smart_slugs);
        let homepage = store
            .save_channel(Channel::new("Home", now).homepage(), None, now)
            .unwrap();
        let quizzes = store
            .save_channel(Channel::new("Quizzes", now), None, now)
            .unwrap();
        let science = store
            .save_channel(Channel::new("Science", now).with_parent(quizzes), None, now)
            .unwrap();
        Context {
            store,
            homepage,
            quizzes,
            science,
        }
    }
}

fn question(title: &str, channel: DocId) -> Question {
    Question::new(
        title,
        channel,
        "<p>What is the chemical symbol for gold?</p>",
        ["Au", "Ag", "Gd", "Go", "Ge"],
        Choice::A,
        Utc::now() - Duration::minutes(1),
    )
}

#[test]
fn channel_paths_follow_parent() {
    let ctx = ContextBuilder::new().build();
    let science = ctx.store.get_channel(ctx.science).unwrap();
    assert_eq!(science.slug, "science");
    assert_eq!(science.long_slug, "quizzes/science");
    assert_eq!(science.mpath, ",quizzes,science,");
    assert_eq!(
        ctx.store.channel_by_mpath(",quizzes,science,").map(|c| c.id),
        Some(ctx.science)
    );
}

#[test]
fn only_one_homepage() {
    let ctx = ContextBuilder::new().build();
    let now = Utc::now();
    assert_eq!(
        ctx.store
            .save_channel(Channel::new("Other home", now).homepage(), None, now),
        Err(CmsError::HomepageExists)
    );
    assert_eq!(ctx.store.get_homepage().map(|c| c.id), Some(ctx.homepage));
}

#[test]
fn rejects_duplicate_channel_slug() {
    let ctx = ContextBuilder::new().build();
    let now = Utc::now();
    assert_eq!(
        ctx.store.save_channel(Channel::new("Quizzes", now), None, now),
        Err(CmsError::DuplicateSlug("quizzes".to_owned()))
    );
}

#[test]
fn smart_slugs_resolve_collisions() {
    let ctx = ContextBuilder::new().smart_slugs().build();
    let now = Utc::now();
    let id = ctx
        .store
        .save_channel(Channel::new("Quizzes", now), None, now)
        .unwrap();
    let channel = ctx.store.get_channel(id).unwrap();
    assert!(channel.slug.starts_with("quizzes-"));
    assert_eq!(channel.mpath, format!(",{},", channel.slug));
}

#[test]
fn child_inherits_channel_type() {
    let ctx = ContextBuilder::new().build();
    let now = Utc::now();
    let mut quizzes = ctx.store.get_channel(ctx.quizzes).unwrap();
    quizzes.channel_type = Some(TemplateType::new("Gallery", "gallery").into());
    ctx.store.save_channel(quizzes, None, now).unwrap();

    let id = ctx
        .store
        .save_channel(Channel::new("History", now).with_parent(ctx.quizzes), None, now)
        .unwrap();
    let history = ctx.store.get_channel(id).unwrap();
    assert_eq!(
        history.channel_type.map(|t| t.template.template_suffix),
        Some("gallery".to_owned())
    );
}

#[test]
fn moving_a_channel_updates_descendants() {
    let ctx = ContextBuilder::new().build();
    let now = Utc::now();
    let question_id = ctx
        .store
        .save_question(question("Gold", ctx.science), None, now)
        .unwrap();

    let mut quizzes = ctx.store.get_channel(ctx.quizzes).unwrap();
    quizzes.slug = "trivia".to_owned();
    ctx.store.save_channel(quizzes, None, now).unwrap();

    let science = ctx.store.get_channel(ctx.science).unwrap();
    assert_eq!(science.long_slug, "trivia/science");
    let question = ctx.store.get_question(question_id).unwrap();
    assert_eq!(question.content.long_slug, "trivia/science/gold");
    assert_eq!(question.content.mpath, ",trivia,science,gold,");
}

#[test]
fn channel_cannot_move_under_its_descendant() {
    let ctx = ContextBuilder::new().build();
    let now = Utc::now();
    let mut quizzes = ctx.store.get_channel(ctx.quizzes).unwrap();
    quizzes.parent = Some(ctx.science);
    assert_eq!(
        ctx.store.save_channel(quizzes, None, now),
        Err(CmsError::InvalidValue {
            field: "parent",
            value: ctx.science.to_string(),
        })
    );
    assert_eq!(ctx.store.get_channel(ctx.quizzes).unwrap().long_slug, "quizzes");
    assert_eq!(
        ctx.store.get_channel(ctx.science).unwrap().long_slug,
        "quizzes/science"
    );
}

#[test]
fn channel_can_move_under_unrelated_channel() {
    let ctx = ContextBuilder::new().build();
    let now = Utc::now();
    let mut science = ctx.store.get_channel(ctx.science).unwrap();
    science.parent = Some(ctx.homepage);
    ctx.store.save_channel(science, None, now).unwrap();
    assert_eq!(
        ctx.store.get_channel(ctx.science).unwrap().long_slug,
        "home/science"
    );
}

#[test]
fn pretty_slug_draws_are_bounded() {
    let mut taken = question("Gold", DocId(1));
    taken.content.id = DocId(2);
    taken.pretty_slug = "q-10000".to_owned();
    let mut collections = Collections::default();
    collections.questions.insert(taken.content.id, taken);

    let mut rng = StepRng::new(0, 0);
    let mut fresh = question("Silver", DocId(1));
    assert_eq!(
        collections.assign_pretty_slug(&mut fresh, &mut rng),
        Err(CmsError::Exhausted("pretty slug"))
    );

    fresh.pretty_slug = "q-20000".to_owned();
    assert_eq!(collections.assign_pretty_slug(&mut fresh, &mut rng), Ok(()));
    assert_eq!(fresh.pretty_slug, "q-20000");
}

#[test]
fn saving_a_question_fills_derived_fields() {
    let ctx = ContextBuilder::new().build();
    let user = User::new("7", "editor");
    let now = Utc::now();
    let id = ctx
        .store
        .save_question(question("Symbol of Gold", ctx.science), Some(&user), now)
        .unwrap();
    let question = ctx.store.get_question(id).unwrap();
    assert_eq!(question.body, "What is the chemical symbol for gold?");
    assert_eq!(question.content.slug, "symbol-of-gold");
    assert_eq!(question.content.long_slug, "quizzes/science/symbol-of-gold");
    assert_eq!(question.content.mpath, ",quizzes,science,symbol-of-gold,");
    assert_eq!(question.content.model, "question.question");
    assert!(question.pretty_slug.starts_with("q-"));
    assert_eq!(question.content.publication.created_by, Some("7".to_owned()));
}

#[test]
fn pretty_slug_survives_updates() {
    let ctx = ContextBuilder::new().build();
    let now = Utc::now();
    let id = ctx
        .store
        .save_question(question("Gold", ctx.science), None, now)
        .unwrap();
    let saved = ctx.store.get_question(id).unwrap();
    let pretty_slug = saved.pretty_slug.clone();
    ctx.store.save_question(saved, None, now).unwrap();
    assert_eq!(ctx.store.get_question(id).unwrap().pretty_slug, pretty_slug);
}

#[test]
fn question_requires_known_channel() {
    let ctx = ContextBuilder::new().build();
    assert_eq!(
        ctx.store
            .save_question(question("Gold", DocId(999)), None, Utc::now()),
        Err(CmsError::NotFound("Channel 999".to_owned()))
    );
}

#[test]
fn channel_contents_respect_hierarchy_and_availability() {
    let ctx = ContextBuilder::new().build();
    let now = Utc::now();
    ctx.store
        .save_question(question("Gold", ctx.science), None, now)
        .unwrap();
    ctx.store
        .save_question(question("Silver", ctx.quizzes), None, now)
        .unwrap();
    let mut hidden = question("Copper", ctx.science);
    hidden.content.publication.published = false;
    ctx.store.save_question(hidden, None, now).unwrap();
    let mut future = question("Iron", ctx.science);
    future.content.publication.available_at = now + Duration::days(1);
    ctx.store.save_question(future, None, now).unwrap();

    let science = ctx.store.get_channel(ctx.science).unwrap();
    let titles: Vec<String> = ctx
        .store
        .channel_contents(&science, now)
        .into_iter()
        .map(|q| q.content.title)
        .collect();
    assert_eq!(titles, vec!["Gold".to_owned()]);

    let quizzes = ctx.store.get_channel(ctx.quizzes).unwrap();
    assert_eq!(ctx.store.channel_contents(&quizzes, now).len(), 2);

    let homepage = ctx.store.get_channel(ctx.homepage).unwrap();
    assert_eq!(ctx.store.channel_contents(&homepage, now).len(), 2);
}

#[test]
fn channel_contents_apply_tag_filter() {
    let ctx = ContextBuilder::new().build();
    let now = Utc::now();
    let mut tagged = question("Gold", ctx.science);
    tagged.content.tags.push("chemistry".to_owned());
    ctx.store.save_question(tagged, None, now).unwrap();
    ctx.store
        .save_question(question("Mercury", ctx.science), None, now)
        .unwrap();

    let mut science = ctx.store.get_channel(ctx.science).unwrap();
    science
        .content_filters
        .insert("tag".to_owned(), "chemistry".to_owned());
    let contents = ctx.store.channel_contents(&science, now);
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0].content.title, "Gold");
}

#[test]
fn themes_collect_from_ancestors() {
    let ctx = ContextBuilder::new().build();
    let now = Utc::now();
    let mut quizzes = ctx.store.get_channel(ctx.quizzes).unwrap();
    quizzes.channel_type = Some(ChannelType::from(
        TemplateType::new("Dark", "dark").with_theme("night"),
    ));
    ctx.store.save_channel(quizzes, None, now).unwrap();

    let mut gold = question("Gold", ctx.science);
    gold.content.template_type = Some(TemplateType::new("Card", "card").with_theme("cards"));
    let id = ctx.store.save_question(gold, None, now).unwrap();

    let science = ctx.store.get_channel(ctx.science).unwrap();
    assert_eq!(ctx.store.get_channel_themes(&science), vec!["night".to_owned()]);
    let gold = ctx.store.get_question(id).unwrap();
    assert_eq!(
        ctx.store.get_question_themes(&gold),
        vec!["cards".to_owned(), "night".to_owned()]
    );
}

#[test]
fn lookups_skip_unavailable_questions() {
    let ctx = ContextBuilder::new().build();
    let now = Utc::now();
    let id = ctx
        .store
        .save_question(question("Gold", ctx.homepage), None, now)
        .unwrap();
    let pretty_slug = ctx.store.get_question(id).unwrap().pretty_slug;
    assert!(ctx.store.question_by_pretty_slug(&pretty_slug, now).is_some());
    assert!(ctx.store.question_on_channel(ctx.homepage, "gold", now).is_some());
    assert!(ctx.store.question_on_channel(ctx.science, "gold", now).is_none());

    let earlier = now - Duration::hours(1);
    assert!(ctx.store.question_by_pretty_slug(&pretty_slug, earlier).is_none());
}

#[test]
fn records_answers_for_candidates() {
    let ctx = ContextBuilder::new().build();
    let now = Utc::now();
    let id = ctx
        .store
        .save_question(question("Gold", ctx.science), None, now)
        .unwrap();
    let user = User::new("42", "player");
    ctx.store
        .record_answer(id, Answer::new(Choice::A, now), Some(&user))
        .unwrap();
    ctx.store
        .record_answer(id, Answer::new(Choice::B, now), None)
        .unwrap();

    let question = ctx.store.get_question(id).unwrap();
    assert_eq!(question.tries.len(), 2);
    assert_eq!(question.tries[0].created_by, Some("42".to_owned()));
    let candidate = ctx.store.get_candidate("42").unwrap();
    assert_eq!(candidate.answers.len(), 1);
    assert_eq!(candidate.answers[0].0, id);
    assert!(question.is_correct(&candidate.answers[0].1));
}

#[test]
fn snapshot_round_trip() {
    let ctx = ContextBuilder::new().build();
    let now = Utc::now();
    let id = ctx
        .store
        .save_question(question("Gold", ctx.science), None, now)
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    ctx.store.persist(&path).unwrap();

    let reopened = Store::open(&path, false).unwrap();
    assert_eq!(reopened.get_question(id), ctx.store.get_question(id));
    assert_eq!(reopened.channels().len(), 3);
    let next = reopened
        .save_channel(Channel::new("History", now), None, now)
        .unwrap();
    assert!(next > id);
}

#[test]
fn missing_snapshot_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(&dir.path().join("missing.json"), false).unwrap();
    assert!(store.channels().is_empty());
}
