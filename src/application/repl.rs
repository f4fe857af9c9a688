#[cfg(test)]
#[path = "repl_test.rs"]
mod tests;

use std::io::Write;
use std::path;

use anyhow::Result;
use tokio::fs;
use tokio::io;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use yansi::Paint;

use crate::domain::models::Change;
use crate::domain::models::Image;
use crate::domain::models::Message;
use crate::domain::models::QuickQuestion;
use crate::domain::models::Role;
use crate::domain::models::SlashCommand;
use crate::domain::models::WorkflowError;
use crate::domain::services::RecipeWorkflow;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /add (/a) [PATH...] - Uploads one or more images of your ingredients for detection.
- /remove (/rm) [IMAGE_ID] - Removes an uploaded image and its ingredients.
- /images (/i) - Lists uploaded images with their detection status.
- /ingredients (/l) - Lists the current ingredients, or the draft while editing.
- /edit (/e) - Starts editing the ingredient list by hand.
- /set [N] [VALUE] - Replaces draft entry N with VALUE.
- /slot - Adds an empty entry to the end of the draft.
- /drop [N] - Removes draft entry N.
- /save - Replaces the ingredient list with the draft. Blank entries are dropped.
- /cancel - Discards the draft.
- /generate (/g) - Generates a recipe from the current ingredients and starts a new chat about it.
- /recipe (/r) - Shows the current recipe.
- /quick (/qq) [N?] - Lists quick questions, or asks quick question N.
- /classes (/c) - Lists every ingredient the detector knows.
- /quit /exit (/q) - Exit Pantry.
- /help (/h) - Provides this help menu.

Anything else is asked about the current recipe.
        "#;

    return text.trim().to_string();
}

fn print_error(text: &str) {
    println!("{}", Paint::red(text));
}

fn print_message(message: &Message) {
    let author = Paint::new(format!("{}:", message.role)).bold();
    if message.is_error() {
        println!("{author} {}", Paint::red(&message.text));
    } else {
        println!("{author} {}", message.text);
    }
}

fn report(res: Result<(), WorkflowError>) -> bool {
    if let Err(err) = res {
        print_error(&err.to_string());
        return false;
    }

    return true;
}

pub fn format_images(images: &[Image]) -> String {
    if images.is_empty() {
        return "No images uploaded yet. Add some with /add PATH".to_string();
    }

    return images
        .iter()
        .map(|image| return format!("- [{}] {}: {}", image.id, image.name, image.status_text()))
        .collect::<Vec<String>>()
        .join("\n");
}

pub fn format_ingredients(ingredients: &[String]) -> String {
    if ingredients.is_empty() {
        return "No ingredients yet.".to_string();
    }

    return format!("Ingredients: {}", ingredients.join(", "));
}

pub fn format_draft(draft: &[String]) -> String {
    if draft.is_empty() {
        return "Draft is empty. Add an entry with /slot".to_string();
    }

    return draft
        .iter()
        .enumerate()
        .map(|(idx, entry)| return format!("{}. {entry}", idx + 1))
        .collect::<Vec<String>>()
        .join("\n");
}

pub fn format_quick_questions(questions: &[QuickQuestion]) -> String {
    return questions
        .iter()
        .enumerate()
        .map(|(idx, quick)| return format!("{}. {} ({})", idx + 1, quick.text, quick.category))
        .collect::<Vec<String>>()
        .join("\n");
}

fn print_ingredients(workflow: &RecipeWorkflow) {
    if let Some(draft) = workflow.draft() {
        println!("{}", format_draft(draft));
        return;
    }

    println!("{}", format_ingredients(workflow.ingredients().as_slice()));
}

async fn add_image(workflow: &mut RecipeWorkflow, image_path: &str) {
    let name = path::Path::new(image_path)
        .file_name()
        .map(|name| return name.to_string_lossy().to_string())
        .unwrap_or_else(|| return image_path.to_string());

    if !Image::is_supported(&name) {
        report(Err(WorkflowError::UnsupportedImage(name)));
        return;
    }

    let bytes = match fs::read(image_path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(path = image_path, error = ?err, "Failed to read image");
            print_error(&format!("Unable to read {image_path}: {err}"));
            return;
        }
    };

    match workflow.upload_image(&name, bytes) {
        Ok(image_id) => println!("Detecting ingredients in {name} [{image_id}]..."),
        Err(err) => print_error(&err.to_string()),
    }
}

fn render_change(workflow: &RecipeWorkflow, change: Change) {
    match change {
        Change::ImagesChanged => {
            println!("{}", format_images(workflow.images()));
            println!("{}", format_ingredients(workflow.ingredients().as_slice()));
        }
        Change::RecipeReady => {
            if let Some(recipe) = workflow.recipe() {
                println!("\n{}\n", recipe.text);
            }
            for message in workflow.messages() {
                print_message(message);
            }
        }
        Change::RecipeFailed(reason) => print_error(&reason),
        Change::QuestionsReady => {
            println!("Quick questions for this recipe:");
            println!("{}", format_quick_questions(workflow.quick_questions()));
        }
        Change::ChatReady => {
            println!(
                "{}",
                Paint::green("Chat is ready. Ask away, or try /quick for ideas.")
            );
        }
        Change::ChatUnavailable(reason) => print_error(&reason),
        Change::AnswerChunk(text) => {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
        Change::AnswerDone => println!(),
        Change::AnswerFailed(reason) => {
            println!();
            print_error(&format!("The answer was cut short: {reason}"));
        }
    }
}

fn print_answer_prefix() {
    print!("{} ", Paint::new(format!("{}:", Role::Assistant)).bold());
    let _ = std::io::stdout().flush();
}

/// Starts a generation unless one is already outstanding. The workflow lets
/// a newer generation win, the prompt does not offer that.
fn request_generation(workflow: &mut RecipeWorkflow) -> Result<u64, WorkflowError> {
    if workflow.processing() {
        return Err(WorkflowError::Processing);
    }

    return workflow.generate();
}

/// Applies one line of user input. Returns false once the user asked to quit.
async fn handle_line(workflow: &mut RecipeWorkflow, line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return true;
    }

    let cmd = match SlashCommand::parse(line) {
        Some(cmd) => cmd,
        None if line.starts_with('/') => {
            print_error("Unknown command. Try /help");
            return true;
        }
        None => {
            if report(workflow.ask(line)) {
                print_answer_prefix();
            }
            return true;
        }
    };

    if cmd.is_quit() {
        return false;
    }

    if cmd.is_help() {
        println!("{}", help_text());
    } else if cmd.is_add_images() {
        for image_path in cmd.args.iter() {
            add_image(workflow, image_path).await;
        }
    } else if cmd.is_remove_image() {
        if report(workflow.remove_image(&cmd.args[0])) {
            println!("{}", format_images(workflow.images()));
            println!("{}", format_ingredients(workflow.ingredients().as_slice()));
        }
    } else if cmd.is_list_images() {
        println!("{}", format_images(workflow.images()));
    } else if cmd.is_list_ingredients() {
        print_ingredients(workflow);
    } else if cmd.is_edit_begin() {
        if report(workflow.begin_manual_edit()) {
            print_ingredients(workflow);
        }
    } else if cmd.is_edit_set() {
        let position = cmd.position().unwrap_or_default();
        if report(workflow.edit_draft(position.saturating_sub(1), &cmd.rest())) {
            print_ingredients(workflow);
        }
    } else if cmd.is_edit_slot() {
        if report(workflow.add_draft_slot()) {
            print_ingredients(workflow);
        }
    } else if cmd.is_edit_drop() {
        let position = cmd.position().unwrap_or_default();
        if report(workflow.remove_draft_slot(position.saturating_sub(1))) {
            print_ingredients(workflow);
        }
    } else if cmd.is_edit_save() {
        if report(workflow.commit_manual_edit()) {
            print_ingredients(workflow);
        }
    } else if cmd.is_edit_cancel() {
        workflow.cancel_manual_edit();
        print_ingredients(workflow);
    } else if cmd.is_generate() {
        if report(request_generation(workflow).map(|_| return ())) {
            println!("Cooking up a recipe with {}...", workflow.ingredients().as_slice().join(", "));
        }
    } else if cmd.is_show_recipe() {
        match workflow.recipe() {
            Some(recipe) => println!("{}", recipe.text),
            None => println!("No recipe yet. Generate one with /generate"),
        }
    } else if cmd.is_quick_question() {
        if cmd.args.is_empty() {
            println!("{}", format_quick_questions(workflow.quick_questions()));
        } else if report(workflow.ask_quick(cmd.position().unwrap_or_default())) {
            print_answer_prefix();
        }
    } else if cmd.is_list_classes() {
        match workflow.list_classes().await {
            Ok(classes) => println!("{}", classes.join(", ")),
            Err(err) => print_error(&format!("Unable to list classes: {err}")),
        }
    }

    return true;
}

/// Runs the interactive session on stdin until the user quits or input ends,
/// applying backend results as they arrive.
pub async fn start(mut workflow: RecipeWorkflow, image_paths: Vec<String>) -> Result<()> {
    if !workflow.health_check().await {
        if let Some(message) = workflow.messages().last() {
            print_message(message);
        }
    }

    println!("Welcome to Pantry! Type /help for the list of commands.");
    for image_path in image_paths.iter() {
        add_image(&mut workflow, image_path).await;
    }

    return run(workflow, BufReader::new(io::stdin())).await;
}

/// Reads lines from `input` until quit, end of input or a read error. The
/// workflow is always shut down before returning, including on error.
async fn run<R>(mut workflow: RecipeWorkflow, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut res = Ok(());
    let mut lines = input.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(err) => {
                        tracing::error!(error = ?err, "Failed to read input");
                        res = Err(err.into());
                        break;
                    }
                };
                if !handle_line(&mut workflow, &line).await {
                    break;
                }
            }
            event = workflow.next_event() => {
                let event = match event {
                    Some(event) => event,
                    None => break,
                };
                if let Some(change) = workflow.handle_event(event) {
                    render_change(&workflow, change);
                }
            }
        }
    }

    workflow.shutdown().await;
    println!("Goodbye!");

    return res;
}
