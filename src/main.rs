use log::{debug, info};
use serde::Serialize;
use std::env;
use std::fs;

use recipe_fork::{
    build_graph, compute_section_diffs, load_config, merge_content, parse_ingredient,
    parse_sections, parse_timers, total_columns, ForkError, GroceryService, StreamEvent,
};

const USAGE: &str = "Usage: recipe-fork <command> [args]

Commands:
  diff <base.md> <fork.md>       Section diffs of a fork against its base (JSON)
  merge <base.md> <fork.md>      Base recipe with the fork's sections applied
  sections <recipe.md>           Sections of a recipe (JSON)
  graph <events.json>            Branch graph of a recipe stream (JSON)
  timers <recipe.md>             Durations mentioned in a recipe (JSON)
  ingredient <line>              Parse one ingredient line (JSON)
  grocery list                   Merged grocery list (JSON)
  grocery export                 Grocery list as plain text
  grocery add <slug> <title> <ingredients.txt>
  grocery remove <slug>
  grocery check <key>
  grocery clear";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphOutput<T> {
    rows: T,
    total_columns: usize,
}

fn arg<'a>(args: &'a [String], index: usize, what: &str) -> Result<&'a str, ForkError> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| ForkError::InvalidInput(format!("missing {what}\n\n{USAGE}")))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_grocery(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let service = GroceryService::from_config(&config.grocery);
    debug!("Grocery command using '{}' backend", service.backend_name());

    match arg(args, 2, "grocery command")? {
        "list" => print_json(&service.load().await?.merged_items())?,
        "export" => print!("{}", service.load().await?.export_text()),
        "add" => {
            let slug = arg(args, 3, "slug")?.to_string();
            let title = arg(args, 4, "title")?.to_string();
            let ingredients: Vec<String> = fs::read_to_string(arg(args, 5, "ingredients file")?)?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();
            let store = service
                .update(|store| store.add_recipe(&slug, &title, &ingredients, None, None))
                .await?;
            print_json(&store.merged_items())?;
        }
        "remove" => {
            let slug = arg(args, 3, "slug")?.to_string();
            let store = service
                .update(|store| {
                    store.remove_recipe(&slug);
                })
                .await?;
            print_json(&store.merged_items())?;
        }
        "check" => {
            let key = arg(args, 3, "ingredient key")?.to_string();
            let store = service
                .update(|store| {
                    store.toggle_checked(&key);
                })
                .await?;
            print_json(&store.merged_items())?;
        }
        "clear" => {
            service.update(|store| store.clear_all()).await?;
            info!("Grocery list cleared");
        }
        other => return Err(format!("Unknown grocery command: {other}\n\n{USAGE}").into()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = arg(&args, 1, "command")?;

    match command {
        "diff" => {
            let base = fs::read_to_string(arg(&args, 2, "base file")?)?;
            let fork = fs::read_to_string(arg(&args, 3, "fork file")?)?;
            print_json(&compute_section_diffs(&base, &fork))?;
        }
        "merge" => {
            let base = fs::read_to_string(arg(&args, 2, "base file")?)?;
            let fork = fs::read_to_string(arg(&args, 3, "fork file")?)?;
            println!("{}", merge_content(&base, &fork));
        }
        "sections" => {
            let markdown = fs::read_to_string(arg(&args, 2, "recipe file")?)?;
            print_json(&parse_sections(&markdown))?;
        }
        "graph" => {
            let raw = fs::read_to_string(arg(&args, 2, "events file")?)?;
            let events: Vec<StreamEvent> = serde_json::from_str(&raw)?;
            let rows = build_graph(&events);
            let columns = total_columns(&rows);
            print_json(&GraphOutput {
                rows,
                total_columns: columns,
            })?;
        }
        "timers" => {
            let text = fs::read_to_string(arg(&args, 2, "recipe file")?)?;
            print_json(&parse_timers(&text))?;
        }
        "ingredient" => {
            let line = args[2..].join(" ");
            if line.trim().is_empty() {
                let message = format!("missing ingredient line\n\n{USAGE}");
                return Err(ForkError::InvalidInput(message).into());
            }
            print_json(&parse_ingredient(&line))?;
        }
        "grocery" => run_grocery(&args).await?,
        "help" | "--help" | "-h" => println!("{USAGE}"),
        other => return Err(format!("Unknown command: {other}\n\n{USAGE}").into()),
    }

    Ok(())
}
