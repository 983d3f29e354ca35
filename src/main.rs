use qsheet::app::{App, AppError, SourceOverride};
use qsheet::cli::{
    self, Commands, QuestionSubcommands, SubSubcommands, TopicSubcommands,
};
use qsheet::config::SheetConfig;
use qsheet::domain::Sheet;
use qsheet::listing::{apply_filters, progress_report, SheetListFilter};
use qsheet::reorder::{apply_reorder, ReorderEvent, ReorderScope};
use qsheet::{completions, logging, ui};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run() -> Result<(), AppError> {
    use clap::Parser;

    let cli = cli::Cli::parse();
    if let Commands::Completions(args) = &cli.command {
        return completions::run_completions_command(args.shell.as_deref(), args.install);
    }

    let mut config = SheetConfig::load(&cli.config)?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    logging::init_logging(cli.verbose, config.log_filter.as_deref());
    let app = App::open(config)?;

    match cli.command {
        Commands::Hydrate(args) => {
            let source = match (args.file, args.url) {
                (Some(path), _) => Some(SourceOverride::File(path)),
                (None, Some(url)) => Some(SourceOverride::Url(url)),
                (None, None) => None,
            };
            let report = app.hydrate(source)?;
            if args.json {
                print_json(&report)?;
            } else {
                ui::print_hydrate_report(&report);
            }
            if let Some(error) = report.error {
                return Err(AppError::InvalidArgument(format!("hydration failed: {error}")));
            }
            Ok(())
        }
        Commands::Ls(args) => {
            if let Some(report) = app.ensure_hydrated()? {
                if let Some(error) = report.error.as_deref() {
                    eprintln!("warning: hydration failed: {error}");
                }
            }
            let filter = SheetListFilter {
                unsolved: args.unsolved,
                starred: args.starred,
            };
            let sheet = apply_filters(&app.sheet(), &filter);
            if args.json {
                print_json(&sheet)
            } else {
                ui::print_sheet(&sheet, &filter);
                Ok(())
            }
        }
        Commands::Progress(args) => {
            let sheet = app.sheet();
            if args.json {
                print_json(&progress_report(&sheet))
            } else {
                ui::print_progress(&sheet);
                Ok(())
            }
        }
        Commands::Topic(args) => run_topic(&app, args.command),
        Commands::Sub(args) => run_sub(&app, args.command),
        Commands::Question(args) => run_question(&app, args.command),
        Commands::Status(args) => {
            let status = app.status()?;
            if args.json {
                print_json(&status)
            } else {
                ui::print_status(&status);
                Ok(())
            }
        }
        Commands::Export => {
            println!("{}", app.export_snapshot()?);
            Ok(())
        }
        Commands::Reset(args) => {
            if !args.yes {
                return Err(AppError::InvalidArgument(
                    "reset discards every topic and all progress; pass --yes to confirm".to_string(),
                ));
            }
            if app.reset() {
                println!("sheet cleared");
            } else {
                println!("sheet already empty");
            }
            Ok(())
        }
        Commands::Completions(_) => Ok(()),
    }
}

fn run_topic(app: &App, command: TopicSubcommands) -> Result<(), AppError> {
    match command {
        TopicSubcommands::Add { title } => {
            let id = app.mutate(|store| store.add_topic(&title));
            println!("{id}");
        }
        TopicSubcommands::Rename { id, title } => {
            require_topic(&app.sheet(), &id)?;
            report_change(app.mutate(|store| store.update_topic(&id, &title)));
        }
        TopicSubcommands::Rm { id } => {
            require_topic(&app.sheet(), &id)?;
            report_change(app.mutate(|store| store.delete_topic(&id)));
        }
        TopicSubcommands::Move { from, to } => {
            report_change(app.try_mutate(|store| store.reorder_topics(from, to))?);
        }
        TopicSubcommands::Drag { active, over } => {
            let event = ReorderEvent::new(active, over);
            report_change(
                app.try_mutate(|store| apply_reorder(store, ReorderScope::Topics, &event))?,
            );
        }
    }
    Ok(())
}

fn run_sub(app: &App, command: SubSubcommands) -> Result<(), AppError> {
    match command {
        SubSubcommands::Add { topic, title } => {
            let id = app
                .mutate(|store| store.add_sub_topic(&topic, &title))
                .ok_or_else(|| AppError::NotFound(format!("topic '{topic}'")))?;
            println!("{id}");
        }
        SubSubcommands::Rename { id, title } => {
            let topic_id = locate_sub(&app.sheet(), &id)?;
            report_change(app.mutate(|store| store.update_sub_topic(&topic_id, &id, &title)));
        }
        SubSubcommands::Rm { id } => {
            let topic_id = locate_sub(&app.sheet(), &id)?;
            report_change(app.mutate(|store| store.delete_sub_topic(&topic_id, &id)));
        }
        SubSubcommands::Move { topic, from, to } => {
            require_topic(&app.sheet(), &topic)?;
            report_change(app.try_mutate(|store| store.reorder_sub_topics(&topic, from, to))?);
        }
        SubSubcommands::Drag { active, over } => {
            let Some(topic_id) = app
                .sheet()
                .locate_sub_topic(&active)
                .map(|topic| topic.id.clone())
            else {
                report_change(false);
                return Ok(());
            };
            let event = ReorderEvent::new(active, over);
            let scope = ReorderScope::SubTopics {
                topic_id: &topic_id,
            };
            report_change(app.try_mutate(|store| apply_reorder(store, scope, &event))?);
        }
    }
    Ok(())
}

fn run_question(app: &App, command: QuestionSubcommands) -> Result<(), AppError> {
    match command {
        QuestionSubcommands::Add { sub, title } => {
            let topic_id = locate_sub(&app.sheet(), &sub)?;
            let id = app
                .mutate(|store| store.add_question(&topic_id, &sub, &title))
                .ok_or_else(|| AppError::NotFound(format!("sub-topic '{sub}'")))?;
            println!("{id}");
        }
        QuestionSubcommands::Rename { id, title } => {
            let (topic_id, sub_id) = locate_question(&app.sheet(), &id)?;
            report_change(
                app.mutate(|store| store.update_question(&topic_id, &sub_id, &id, &title)),
            );
        }
        QuestionSubcommands::Rm { id } => {
            let (topic_id, sub_id) = locate_question(&app.sheet(), &id)?;
            report_change(app.mutate(|store| store.delete_question(&topic_id, &sub_id, &id)));
        }
        QuestionSubcommands::Move { sub, from, to } => {
            let topic_id = locate_sub(&app.sheet(), &sub)?;
            report_change(
                app.try_mutate(|store| store.reorder_questions(&topic_id, &sub, from, to))?,
            );
        }
        QuestionSubcommands::Drag { active, over } => {
            let Ok((topic_id, sub_id)) = locate_question(&app.sheet(), &active) else {
                report_change(false);
                return Ok(());
            };
            let event = ReorderEvent::new(active, over);
            let scope = ReorderScope::Questions {
                topic_id: &topic_id,
                sub_topic_id: &sub_id,
            };
            report_change(app.try_mutate(|store| apply_reorder(store, scope, &event))?);
        }
        QuestionSubcommands::Solve { id } => {
            let (topic_id, sub_id) = locate_question(&app.sheet(), &id)?;
            app.mutate(|store| store.toggle_solved(&topic_id, &sub_id, &id));
            print_question_flags(app, &topic_id, &sub_id, &id);
        }
        QuestionSubcommands::Star { id } => {
            let (topic_id, sub_id) = locate_question(&app.sheet(), &id)?;
            app.mutate(|store| store.toggle_star(&topic_id, &sub_id, &id));
            print_question_flags(app, &topic_id, &sub_id, &id);
        }
        QuestionSubcommands::Difficulty { id, level } => {
            let (topic_id, sub_id) = locate_question(&app.sheet(), &id)?;
            report_change(app.mutate(|store| {
                store.set_question_difficulty(&topic_id, &sub_id, &id, level)
            }));
        }
    }
    Ok(())
}

fn require_topic(sheet: &Sheet, topic_id: &str) -> Result<(), AppError> {
    sheet
        .topic(topic_id)
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("topic '{topic_id}'")))
}

fn locate_sub(sheet: &Sheet, sub_topic_id: &str) -> Result<String, AppError> {
    sheet
        .locate_sub_topic(sub_topic_id)
        .map(|topic| topic.id.clone())
        .ok_or_else(|| AppError::NotFound(format!("sub-topic '{sub_topic_id}'")))
}

fn locate_question(sheet: &Sheet, question_id: &str) -> Result<(String, String), AppError> {
    sheet
        .locate_question(question_id)
        .map(|(topic, sub)| (topic.id.clone(), sub.id.clone()))
        .ok_or_else(|| AppError::NotFound(format!("question '{question_id}'")))
}

fn report_change(changed: bool) {
    if changed {
        println!("updated");
    } else {
        println!("no change");
    }
}

fn print_question_flags(app: &App, topic_id: &str, sub_id: &str, question_id: &str) {
    let sheet = app.sheet();
    if let Some(question) = sheet.question(topic_id, sub_id, question_id) {
        println!(
            "{} solved={} starred={}",
            question.id, question.solved, question.starred
        );
    }
}
