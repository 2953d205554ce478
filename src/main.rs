use anyhow::*;
use chrono::Utc;
use clap::Parser;
use log::{info, LevelFilter};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::admin::actions::{self, Flash};
use crate::admin::question::QuestionAdmin;
use crate::admin::{Access, AdminRegistry};
use crate::cli::{Cli, Command, ExportFormat, TemplatesCommand, UserArgs};
use crate::cms::{Channel, DocId, Store, User};
use crate::question::definition::QuizDefinition;
use crate::question::model::Question;
use crate::question::views::{AnswerSubmission, Page, QuestionDetail, QuestionList, Session};
use crate::render::{select_template, FsTemplateLoader};
use crate::settings::Settings;

mod admin;
mod cli;
mod cms;
mod question;
mod render;
mod settings;
mod templates;

fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

impl UserArgs {
    fn to_user(&self) -> Option<User> {
        self.user.as_ref().map(|id| {
            self.roles
                .iter()
                .fold(User::new(id, id), |user, role| user.with_role(role))
        })
    }

    fn session(&self) -> Session {
        match self.to_user() {
            Some(user) => Session::for_user(user),
            None => Session::anonymous("cli"),
        }
    }
}

struct App {
    settings: Settings,
    store: Store,
    registry: AdminRegistry,
}

impl App {
    fn open(cli: &Cli) -> Result<App> {
        let settings = Settings::load(cli.settings.as_deref()).context("Failed to load settings")?;
        let store = Store::open(&cli.data, settings.smart_slug_enabled)?;
        let mut registry = AdminRegistry::new(&settings.admin);
        registry.register(QuestionAdmin::new(&settings).view, "Content", "Question");
        Ok(App {
            settings,
            store,
            registry,
        })
    }

    fn require_admin(&self, user: &UserArgs) -> Result<Option<User>> {
        let user = user.to_user();
        match self.registry.handle_view(crate::question::model::MODEL_NAME, user.as_ref()) {
            Some(Access::Granted) => Ok(user),
            Some(Access::Login(location)) => Err(anyhow!("Sign in first ({})", location)),
            Some(Access::Denied(_)) => Err(anyhow!("Access denied")),
            None => Err(anyhow!("No admin registered for questions")),
        }
    }
}

fn print_page(app: &App, page: &Page) {
    match page {
        Page::Redirect(location) => println!("Redirect: {}", location),
        Page::List(list) => {
            print_templates(app, &list.templates, &list.themes);
            println!("{}", list.channel.title);
            for question in &list.contents {
                println!("  [{}] {}", question.pretty_slug, question.content.title);
            }
        }
        Page::Detail(detail) => {
            print_templates(app, &detail.templates, &detail.themes);
            println!("{}", detail.question.content.title);
            println!("{}", detail.question.body);
            for (choice, label) in &detail.form.choices {
                println!("  {}) {}", choice, label);
            }
            for error in &detail.form.errors {
                println!("! {}", error);
            }
        }
    }
}

fn print_templates(app: &App, templates: &[String], themes: &[String]) {
    let loader = FsTemplateLoader::new(&app.settings.template_root, themes);
    match select_template(&loader, templates) {
        Some(template) => println!("Template: {}", template),
        None => println!("Template: none of {} candidates found", templates.len()),
    }
}

fn print_flashes(flashes: &[Flash]) {
    for flash in flashes {
        match flash {
            Flash::Info(message) => println!("{}", message),
            Flash::Error(message) => eprintln!("{}", message),
        }
    }
}

fn cmd_import(app: &App, file: &Path, user: &UserArgs) -> Result<()> {
    let now = Utc::now();
    let user = user.to_user();
    if app.store.get_homepage().is_none() {
        let mut homepage = Channel::new("Home", now).homepage();
        homepage.publication.published = true;
        app.store.save_channel(homepage, user.as_ref(), now)?;
    }
    let ids = QuizDefinition::open(file)?.import(&app.store, user.as_ref(), now)?;
    println!("Imported {} questions", ids.len());
    Ok(())
}

fn cmd_templates(app: &App, command: &TemplatesCommand) -> Result<()> {
    let templates = match command {
        TemplatesCommand::List { path } => {
            let mpath = cms::slug::mpath_from_path(path);
            let channel = app
                .store
                .channel_by_mpath(&mpath)
                .ok_or_else(|| anyhow!("Channel {} not found", path))?;
            QuestionList::new(&app.store, &app.settings).get_template_names(&channel)?
        }
        TemplatesCommand::Detail { pretty_slug } => {
            let question = app
                .store
                .question_by_pretty_slug(pretty_slug, Utc::now())
                .ok_or_else(|| anyhow!("Question {} not found", pretty_slug))?;
            QuestionDetail::new(&app.store, &app.settings).get_template_names(&question)?
        }
    };
    for template in templates {
        println!("{}", template);
    }
    Ok(())
}

fn cmd_show(app: &App, pretty_slug: &str, user: &UserArgs) -> Result<()> {
    let session = user.session();
    let now = Utc::now();
    let page = if pretty_slug.contains('/') {
        QuestionList::new(&app.store, &app.settings).get(pretty_slug, &session, now)?
    } else {
        QuestionDetail::new(&app.store, &app.settings).get(pretty_slug, false, &session, now)?
    };
    print_page(app, &page);
    Ok(())
}

fn cmd_answer(
    app: &App,
    pretty_slug: &str,
    choice: &str,
    explanation: Option<String>,
    user: &UserArgs,
) -> Result<bool> {
    let submission = AnswerSubmission {
        answer: Some(choice.to_owned()),
        explanation,
    };
    let page = QuestionDetail::new(&app.store, &app.settings).post(
        pretty_slug,
        &submission,
        &user.session(),
        Utc::now(),
    )?;
    print_page(app, &page);
    Ok(matches!(page, Page::Redirect(_)))
}

fn question_ids(app: &App, ids: &[u64]) -> Vec<DocId> {
    if ids.is_empty() {
        app.store.questions().iter().map(|q| q.content.id).collect()
    } else {
        ids.iter().map(|id| DocId(*id)).collect()
    }
}

fn cmd_export(
    app: &App,
    format: ExportFormat,
    ids: &[u64],
    output: Option<&Path>,
    user: &UserArgs,
) -> Result<()> {
    app.require_admin(user)?;
    let ids = question_ids(app, ids);
    let attachment = match format {
        ExportFormat::Json => actions::export_to_json::<Question, _>(&app.store, &ids)?,
        ExportFormat::Csv => actions::export_to_csv::<Question, _>(&app.store, &ids)?,
    };
    for id in &attachment.missing {
        eprintln!("Item not found {}", id);
    }
    match output {
        Some(path) => {
            fs::write(path, &attachment.body)
                .with_context(|| format!("Could not write {}", path.display()))?;
            info!("Wrote {} to {}", attachment.filename, path.display());
        }
        None => print!("{}", attachment.body),
    }
    Ok(())
}

fn cmd_list(app: &App, user: &UserArgs) -> Result<()> {
    app.require_admin(user)?;
    let admin = QuestionAdmin::new(&app.settings);
    if let Some(view) = app.registry.find(crate::question::model::MODEL_NAME) {
        println!("{} / {} / {}", app.registry.name, view.category, view.name);
    }
    println!("{}", admin.view.column_list.join("\t"));
    for channel in app.store.channels() {
        for question in app
            .store
            .questions()
            .iter()
            .filter(|q| q.content.channel == channel.id)
        {
            println!("{}", admin.row(question, &app.store).join("\t"));
        }
    }
    Ok(())
}

fn cmd_edit(app: &App, id: u64, fields: &[String], user: &UserArgs) -> Result<()> {
    let user = app.require_admin(user)?;
    let mut form = BTreeMap::new();
    for field in fields {
        let (name, value) = field
            .split_once('=')
            .ok_or_else(|| anyhow!("Expected FIELD=VALUE, got {}", field))?;
        form.insert(name.to_owned(), value.to_owned());
    }
    let question = app
        .store
        .get_question(DocId(id))
        .ok_or_else(|| anyhow!("Question {} not found", id))?;
    let question = QuestionAdmin::new(&app.settings).bind_form(question, &form)?;
    app.store.save_question(question, user.as_ref(), Utc::now())?;
    println!("Saved question {}", id);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let app = App::open(&cli)?;
    let now = Utc::now();

    let changed = match &cli.command {
        Command::Import { file, user } => {
            cmd_import(&app, file, user)?;
            true
        }
        Command::Templates { command } => {
            cmd_templates(&app, command)?;
            false
        }
        Command::Show { pretty_slug, user } => {
            cmd_show(&app, pretty_slug, user)?;
            false
        }
        Command::Answer {
            pretty_slug,
            choice,
            explanation,
            user,
        } => cmd_answer(&app, pretty_slug, choice, explanation.clone(), user)?,
        Command::Export {
            format,
            ids,
            output,
            user,
        } => {
            cmd_export(&app, *format, ids, output.as_deref(), user)?;
            false
        }
        Command::List { user } => {
            cmd_list(&app, user)?;
            false
        }
        Command::Edit { id, fields, user } => {
            cmd_edit(&app, *id, fields, user)?;
            true
        }
        Command::TogglePublish { ids, user } => {
            let user = app.require_admin(user)?;
            let ids: Vec<DocId> = ids.iter().map(|id| DocId(*id)).collect();
            let report = actions::toggle_publish::<Question, _>(&app.store, &ids, user.as_ref(), now)?;
            print_flashes(&report.flashes);
            !report.affected.is_empty()
        }
        Command::Clone { id, user } => {
            let user = app.require_admin(user)?;
            let report =
                actions::clone_item::<Question, _>(&app.store, &[DocId(*id)], user.as_ref(), now)?;
            print_flashes(&report.flashes);
            !report.affected.is_empty()
        }
    };

    if changed {
        app.store.persist(&cli.data)?;
    }
    Ok(())
}
