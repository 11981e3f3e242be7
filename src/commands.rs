use std::path::{Path, PathBuf};
use std::sync::Arc;
use owo_colors::OwoColorize;
use sqlpractice::assets::{AssetDir, LayeredAssets};
use sqlpractice::auth::{AuthProvider, Credentials, LocalAuthProvider};
use sqlpractice::config::{self, SqlPracticeConfig};
use sqlpractice::exercise::{self, DocumentCatalog, ExerciseCatalog};
use sqlpractice::export::{self, ExportFormat};
use sqlpractice::storage::{DatasetStore, LoadOutcome, TracingObserver};
use sqlpractice::ui::{self, Icons};
use crate::{AuthCommand, Commands, ExerciseCommand};

pub fn run_init(path: &Path, force: bool) -> anyhow::Result<()> {
    let config = SqlPracticeConfig::default();
    config::write_config(path, &config, force)?;
    config::ensure_data_dir(&config)?;
    ui::success(&format!("Wrote {}", path.display()));
    ui::info("Data directory", &config.data_dir);
    Ok(())
}

/// Everything a command needs, built once from the config
pub struct App {
    config: SqlPracticeConfig,
    store: DatasetStore,
    assets: LayeredAssets,
    auth: LocalAuthProvider,
}

impl App {
    pub fn new(config: SqlPracticeConfig) -> anyhow::Result<Self> {
        let store = DatasetStore::new(config.data_path());
        let assets = LayeredAssets::new(config.assets_dir.as_ref().map(AssetDir::new));
        let auth = LocalAuthProvider::open(&config.meta_db_path())?;
        Ok(Self { config, store, assets, auth })
    }

    pub fn run(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Init { .. } => unreachable!("handled before the config is loaded"),
            Commands::Datasets => self.run_datasets(),
            Commands::Load { dataset } => self.run_load(dataset),
            Commands::Reset { dataset } => self.run_reset(&dataset),
            Commands::Query { dataset, sql, file, export } => {
                self.require_sign_in()?;
                let sql = match (sql, file) {
                    (Some(sql), _) => sql,
                    (None, Some(file)) => std::fs::read_to_string(&file)?,
                    (None, None) => anyhow::bail!("pass the SQL as an argument or with --file"),
                };
                self.run_query(&dataset, &sql, export)
            }
            Commands::Check { dataset, query, reference } => {
                self.require_sign_in()?;
                self.run_check(&dataset, &query, &reference)
            }
            Commands::Exercises { command } => {
                self.require_sign_in()?;
                self.run_exercises(command)
            }
            Commands::Decks => self.run_decks(),
            Commands::Auth { command } => self.run_auth(command),
            Commands::Serve { port } => {
                self.require_sign_in()?;
                self.run_serve(port)
            }
        }
    }

    fn require_sign_in(&self) -> anyhow::Result<()> {
        if self.config.require_sign_in {
            let identity = self.auth.require_identity()?;
            tracing::debug!("acting as {}", identity.email);
        }
        Ok(())
    }

    fn catalog(&self) -> DocumentCatalog {
        match &self.config.catalog {
            Some(path) => DocumentCatalog::from_file(path),
            None => DocumentCatalog::bundled(),
        }
    }

    /// Initialize a configured dataset if it is not there yet
    fn ensure(&self, name: &str) -> anyhow::Result<LoadOutcome> {
        let spec = self
            .config
            .dataset(name)
            .ok_or_else(|| sqlpractice::Error::UnknownDataset(name.to_string()))?;

        if self.store.exists(name) {
            return Ok(LoadOutcome::AlreadyPresent);
        }

        let spinner = ui::Spinner::new(&format!("Loading {} from {}...", name, spec.script));
        let outcome = self.store.ensure(
            &spec.name,
            &self.assets,
            &spec.script,
            self.config.split_mode,
            &TracingObserver,
        );
        spinner.finish_and_clear();
        ui::load_outcome(name, &outcome);
        Ok(outcome)
    }

    fn run_datasets(&self) -> anyhow::Result<()> {
        ui::header("Datasets");
        ui::info("Data directory", &self.store.root().display().to_string());
        ui::info("Split mode", self.config.split_mode.as_str());

        for spec in &self.config.datasets {
            if self.store.exists(&spec.name) {
                let stats = self.store.stats(&spec.name)?;
                ui::section(&format!(" {} ", spec.name));
                let rows: Vec<(String, String)> = stats
                    .tables
                    .iter()
                    .map(|t| (t.table.clone(), t.rows.to_string()))
                    .collect();
                let pairs: Vec<(&str, &str)> =
                    rows.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
                println!("{}", ui::stats_table(&pairs));
            } else {
                ui::status(Icons::DATABASE, &spec.name, &ui::muted(&format!("not loaded ({})", spec.script)));
            }
        }

        let unconfigured: Vec<String> = self
            .store
            .list()?
            .into_iter()
            .filter(|name| self.config.dataset(name).is_none())
            .collect();
        if !unconfigured.is_empty() {
            ui::info("Other databases", &unconfigured.join(", "));
        }
        Ok(())
    }

    fn run_load(&self, dataset: Option<String>) -> anyhow::Result<()> {
        let names: Vec<String> = match dataset {
            Some(name) => vec![name],
            None => self.config.datasets.iter().map(|d| d.name.clone()).collect(),
        };

        let mut aborted = 0;
        for name in &names {
            if self.ensure(name)?.is_aborted() {
                aborted += 1;
            }
        }
        if aborted > 0 {
            anyhow::bail!("{} dataset(s) could not be initialized", aborted);
        }
        Ok(())
    }

    fn run_reset(&self, dataset: &str) -> anyhow::Result<()> {
        if self.store.reset(dataset)? {
            ui::success(&format!("Removed {}; it will be rebuilt on next use", dataset));
        } else {
            ui::warn(&format!("{} was not loaded", dataset));
        }
        Ok(())
    }

    fn run_query(&self, dataset: &str, sql: &str, export_to: Option<PathBuf>) -> anyhow::Result<()> {
        self.ensure(dataset)?;

        let result = match self.store.run(dataset, sql) {
            Ok(result) => result,
            Err(e) => {
                ui::error(&e.to_string());
                return Ok(());
            }
        };

        if result.columns.is_empty() {
            ui::success("Statement executed");
        } else {
            println!("{}", ui::result_table(&result));
            ui::summary_row("rows", &result.row_count().to_string());
        }

        if let Some(path) = export_to {
            let format = ExportFormat::from_path(&path).unwrap_or(ExportFormat::Csv);
            let written = export::export_delimited(&result, &path, format)?;
            ui::success(&format!("Exported to {}", written.display()));
        }
        Ok(())
    }

    fn run_check(&self, dataset: &str, query: &str, reference: &str) -> anyhow::Result<()> {
        self.ensure(dataset)?;
        let comparison = self.store.compare(dataset, query, reference);
        self.print_comparison(&comparison);
        Ok(())
    }

    fn print_comparison(&self, comparison: &sqlpractice::Comparison) {
        if let Some(user) = &comparison.user {
            ui::section(" Your result ");
            println!("{}", ui::result_table(user));
        }
        if !comparison.is_correct() {
            if let Some(reference) = &comparison.reference {
                ui::section(" Expected ");
                println!("{}", ui::result_table(reference));
            }
        }
        println!();
        ui::verdict(&comparison.verdict);
    }

    fn run_exercises(&self, command: ExerciseCommand) -> anyhow::Result<()> {
        let catalog = self.catalog();
        match command {
            ExerciseCommand::List { category } => {
                let exercises = catalog.list()?;
                ui::header("SQL exercises");
                for cat in exercise::categories(&exercises) {
                    if category.as_deref().is_some_and(|c| !c.eq_ignore_ascii_case(cat)) {
                        continue;
                    }
                    ui::section(&format!(" {} ", cat));
                    for ex in exercises.iter().filter(|e| e.category == cat) {
                        println!("  {} {}", format!("{:>3}", ex.id).bold(), ex.title);
                    }
                }
            }
            ExerciseCommand::Show { id } => {
                let ex = catalog
                    .get(id)?
                    .ok_or(sqlpractice::Error::ExerciseNotFound(id))?;
                println!("{} {}", Icons::PENCIL, ex.title.style(ui::theme().header.clone()));
                println!("{}", ui::dim(&ex.category));
                println!();
                println!("{}", ex.description);
            }
            ExerciseCommand::Solve { id, query } => {
                let ex = catalog
                    .get(id)?
                    .ok_or(sqlpractice::Error::ExerciseNotFound(id))?;
                let dataset = &self.config.exercise_dataset;
                self.ensure(dataset)?;
                let comparison = exercise::grade(&self.store, dataset, &ex, &query);
                self.print_comparison(&comparison);
            }
        }
        Ok(())
    }

    fn run_decks(&self) -> anyhow::Result<()> {
        let Some(dir) = &self.config.slides_dir else {
            ui::warn("No slides_dir configured");
            return Ok(());
        };
        let decks = sqlpractice::decks::list_decks(Path::new(dir))?;
        if decks.is_empty() {
            ui::warn(&format!("No decks found in {}", dir));
        }
        for deck in decks {
            ui::status(Icons::BOOK, &deck.title, &ui::muted(&deck.path.display().to_string()));
        }
        Ok(())
    }

    fn run_auth(&self, command: AuthCommand) -> anyhow::Result<()> {
        match command {
            AuthCommand::Register { email, password } => {
                let password = password_or_prompt(password)?;
                let identity = self.auth.create_account(&Credentials::new(&email, &password)?)?;
                ui::success(&format!("Account created, signed in as {}", identity.email));
            }
            AuthCommand::Login { email, password } => {
                let password = password_or_prompt(password)?;
                let identity = self.auth.sign_in(&Credentials::new(&email, &password)?)?;
                ui::success(&format!("Signed in as {}", identity.email));
            }
            AuthCommand::Logout => {
                self.auth.sign_out()?;
                ui::success("Signed out");
            }
            AuthCommand::Whoami => match self.auth.current_identity()? {
                Some(identity) => ui::status(
                    Icons::PERSON,
                    &identity.email,
                    &ui::muted(&format!("since {}", identity.signed_in_at.format("%Y-%m-%d %H:%M UTC"))),
                ),
                None => ui::warn("Not signed in"),
            },
            AuthCommand::ResetPassword { email } => {
                let message = self.auth.send_password_reset(&email)?;
                ui::status(Icons::KEY, "Password reset", &message);
            }
        }
        Ok(())
    }

    fn run_serve(&self, port: u16) -> anyhow::Result<()> {
        let catalog: Arc<dyn ExerciseCatalog + Send + Sync> = Arc::new(self.catalog());
        let state = sqlpractice::server::AppState {
            config: self.config.clone(),
            store: self.store.clone(),
            assets: self.assets.clone(),
            catalog,
        };

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(sqlpractice::server::start_server(port, state))
    }
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(p) => Ok(p),
        None => {
            let term = console::Term::stderr();
            term.write_str("Password: ")?;
            Ok(term.read_secure_line()?)
        }
    }
}
