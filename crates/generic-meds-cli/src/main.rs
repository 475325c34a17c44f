//! Look up generic alternatives for a branded medicine from the terminal.
//!
//! Reads settings from `generic-meds.toml` and the environment; the Gemini key
//! comes from `API_KEY` or `GEMINI_API_KEY`.
//!
//! ```sh
//! generic-meds search --name "Dolo 650"
//! generic-meds search --composition "Paracetamol:500mg" --database dava --state Tripura
//! generic-meds search --image strip.jpg --save
//! generic-meds saved list
//! generic-meds saved view 1
//! ```

mod render;

use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use generic_meds_core::{
    logging, Composition, Database, InlineImage, MedicineFinder, MedicineView, QueryState,
    SavedMedicines, SearchDatabase, SearchForm, Settings,
};

#[derive(Parser)]
#[command(name = "generic-meds", version, about = "Find generic alternatives to branded medicines")]
struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = generic_meds_core::config::SETTINGS_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a medicine by name, composition or photo
    Search {
        /// Brand name, e.g. "Dolo 650"
        #[arg(long)]
        name: Option<String>,

        /// Ingredient and strength as "Ingredient:Strength"; repeat for each row
        #[arg(long = "composition", value_name = "INGREDIENT:STRENGTH")]
        composition: Vec<String>,

        /// Photo of the strip or packaging
        #[arg(long)]
        image: Option<PathBuf>,

        /// Product database: general or dava
        #[arg(long, default_value = "general")]
        database: String,

        /// Add the result to the saved list
        #[arg(long)]
        save: bool,

        /// Only list stores in this state
        #[arg(long)]
        state: Option<String>,

        /// Only list stores in this city
        #[arg(long, requires = "state")]
        city: Option<String>,
    },

    /// Manage saved medicines
    Saved {
        #[command(subcommand)]
        action: SavedCommand,
    },

    /// List the states offered by the store locator
    States,
}

#[derive(Subcommand)]
enum SavedCommand {
    /// Show the saved list
    List,
    /// Show a saved entry (1-based)
    View {
        index: usize,
        #[arg(long)]
        state: Option<String>,
        #[arg(long, requires = "state")]
        city: Option<String>,
    },
    /// Remove a saved entry (1-based)
    Remove { index: usize },
    /// Remove every saved entry
    Clear,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;
    logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Search {
            name,
            composition,
            image,
            database,
            save,
            state,
            city,
        } => {
            let form = build_form(name, &composition, image, &database)?;
            let mut finder = MedicineFinder::from_settings(&settings)?;

            match finder.search(form).await? {
                QueryState::Success(_) => {}
                QueryState::Failure(message) => bail!("{}", message),
                other => bail!("search ended in unexpected state {:?}", other),
            }

            let view = finder
                .current_view()
                .context("search succeeded without a result")?;
            print!("{}", render::render_view(&view, state.as_deref(), city.as_deref()));

            if save {
                if finder.save_current() {
                    println!("\nSaved {}.", view.brand_name);
                } else {
                    println!("\n{} is already saved.", view.brand_name);
                }
            }
        }

        Commands::Saved { action } => {
            // The saved list needs no backend, so no API key either
            let db = Database::open(&settings.database_path)?;
            let mut saved = SavedMedicines::load(&db);

            match action {
                SavedCommand::List => print!("{}", render::render_saved_list(&saved)),
                SavedCommand::View { index, state, city } => {
                    let Some(entry) = index.checked_sub(1).and_then(|i| saved.get(i)) else {
                        bail!("no saved medicine at position {}", index);
                    };
                    let view = MedicineView::new(&entry.medicine, entry.database);
                    print!("{}", render::render_view(&view, state.as_deref(), city.as_deref()));
                }
                SavedCommand::Remove { index } => {
                    match index.checked_sub(1).and_then(|i| saved.remove(&db, i)) {
                        Some(entry) => println!("Removed {}.", entry.medicine.brand_name),
                        None => println!("No saved medicine at position {}.", index),
                    }
                }
                SavedCommand::Clear => {
                    saved.clear(&db);
                    println!("Saved list cleared.");
                }
            }
        }

        Commands::States => print!("{}", render::render_states()),
    }

    Ok(())
}

fn build_form(
    name: Option<String>,
    composition: &[String],
    image: Option<PathBuf>,
    database: &str,
) -> anyhow::Result<SearchForm> {
    let composition = composition
        .iter()
        .map(|row| {
            Composition::parse(row).with_context(|| {
                format!("invalid composition {:?}, expected INGREDIENT:STRENGTH", row)
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let image = image
        .map(|path| {
            InlineImage::from_path(&path)
                .with_context(|| format!("failed to read image {}", path.display()))
        })
        .transpose()?;

    tracing::debug!(
        "Form: name={:?} rows={} image={}",
        name,
        composition.len(),
        image.is_some()
    );

    Ok(SearchForm {
        name,
        image,
        composition,
        database: SearchDatabase::parse(database),
    })
}
