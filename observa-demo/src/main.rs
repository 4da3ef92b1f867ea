use std::env;
use std::process::ExitCode;

use observa::prelude::*;
use observa::{ErrorsChanged, PropertyChanged};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

#[derive(Debug, Default)]
struct SignupForm {
    handle: String,
    short_code: String,
}

impl Model for SignupForm {
    fn schema() -> observa::Result<Schema<Self>> {
        Schema::builder()
            .property("Handle", |f: &SignupForm| &f.handle)
            .constrained(
                "ShortCode",
                |f: &SignupForm| &f.short_code,
                [Constraint::max_length(3)],
            )
            .build()
    }

    fn register_rules(rules: &mut Rules<'_, Self>) -> observa::Result<()> {
        rules.register_fn("Handle", |v: &String| {
            ValidationOutcome::check(v.starts_with('@'), "Input must start with '@'.")
        })?;
        Ok(())
    }
}

fn log_level() -> LevelFilter {
    env::var("OBSERVA_LOG")
        .ok()
        .and_then(|level| level.parse().ok())
        .unwrap_or(LevelFilter::Debug)
}

fn save(form: &Observable<SignupForm>) -> observa::Result<()> {
    form.ensure_valid()?;
    log::info!("Saved {:?}", form.model());
    Ok(())
}

fn run() -> observa::Result<()> {
    let mut form = Observable::new(SignupForm::default())?;

    form.notifier().on_property_changed(|e: &PropertyChanged| {
        log::info!(
            "property changed: {}",
            e.property.as_deref().unwrap_or("<all>")
        );
    });
    form.notifier().on_errors_changed(|e: &ErrorsChanged| {
        log::info!("errors changed: {}", e.property);
    });

    form.set("Handle", |f| &mut f.handle, "hello".to_string())?;
    println!("Handle = \"hello\": {:?}", form.errors(Some("Handle")));

    form.set("Handle", |f| &mut f.handle, "@hello".to_string())?;
    println!("Handle = \"@hello\": {:?}", form.errors(Some("Handle")));

    form.set("ShortCode", |f| &mut f.short_code, "abcd".to_string())?;
    println!("ShortCode = \"abcd\": {:?}", form.errors(Some("ShortCode")));

    if let Err(e) = save(&form) {
        eprintln!("Save refused: {}", e);
    }

    form.set("ShortCode", |f| &mut f.short_code, "abc".to_string())?;
    save(&form)?;
    println!("Saved with no errors: {}", !form.has_errors());

    Ok(())
}

fn main() -> ExitCode {
    if let Err(e) = TermLogger::init(
        log_level(),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Error: failed to initialize logger: {}", e);
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
