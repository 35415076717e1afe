//! Compose captioned image PDFs and list PDF comments.
//!
//! Usage:
//!   annotate_images compose [--caption TEXT] [--inline | --annotated] [--font times|helvetica]
//!                           [--author NAME] [--storage DIR] [--config FILE] IMAGE...
//!   annotate_images extract FILE [--mime TYPE] [--json] [--storage DIR] [--config FILE]
//!
//! Set RUST_LOG=debug for per-page detail.

use pdf_annotator::composer::{CaptionMode, ImageSource};
use pdf_annotator::config::AnnotatorConfig;
use pdf_annotator::service::{AnnotationService, Outcome, Request};
use pdf_annotator::writer::CaptionFont;
use std::path::PathBuf;
use std::process::ExitCode;

enum Command {
    Compose {
        images: Vec<ImageSource>,
        caption: Option<String>,
        mode: Option<CaptionMode>,
    },
    Extract {
        file: String,
        mime: Option<String>,
        json: bool,
    },
}

struct CliArgs {
    command: Command,
    config: AnnotatorConfig,
}

fn usage() -> String {
    "usage:\n  \
     annotate_images compose [--caption TEXT] [--inline | --annotated] [--font times|helvetica] \
     [--author NAME] [--storage DIR] [--config FILE] IMAGE...\n  \
     annotate_images extract FILE [--mime TYPE] [--json] [--storage DIR] [--config FILE]"
        .to_string()
}

fn take_value(args: &[String], i: &mut usize, name: &str) -> Result<String, String> {
    *i += 1;
    args.get(*i).cloned().ok_or_else(|| format!("{} needs a value", name))
}

impl CliArgs {
    fn from_args(args: &[String]) -> Result<Self, String> {
        let command_name = args.get(1).ok_or_else(usage)?;

        let mut config_file: Option<PathBuf> = None;
        let mut storage: Option<PathBuf> = None;
        let mut font: Option<CaptionFont> = None;
        let mut author: Option<String> = None;
        let mut caption = None;
        let mut mode = None;
        let mut mime = None;
        let mut json = false;
        let mut positional = Vec::new();

        let mut i = 2;
        while i < args.len() {
            match args[i].as_str() {
                "--caption" => caption = Some(take_value(args, &mut i, "--caption")?),
                "--inline" => mode = Some(CaptionMode::Inline),
                "--annotated" => mode = Some(CaptionMode::Annotated),
                "--font" => {
                    font = Some(match take_value(args, &mut i, "--font")?.as_str() {
                        "times" => CaptionFont::TimesBold,
                        "helvetica" => CaptionFont::HelveticaBold,
                        other => return Err(format!("unknown font '{}'", other)),
                    })
                },
                "--author" => author = Some(take_value(args, &mut i, "--author")?),
                "--storage" => storage = Some(PathBuf::from(take_value(args, &mut i, "--storage")?)),
                "--config" => config_file = Some(PathBuf::from(take_value(args, &mut i, "--config")?)),
                "--mime" => mime = Some(take_value(args, &mut i, "--mime")?),
                "--json" => json = true,
                "--help" | "-h" => return Err(usage()),
                flag if flag.starts_with("--") => return Err(format!("unknown option '{}'\n{}", flag, usage())),
                other => positional.push(other.to_string()),
            }
            i += 1;
        }

        let mut config = match config_file {
            Some(path) => {
                let text = std::fs::read_to_string(&path).map_err(|e| format!("{}: {}", path.display(), e))?;
                serde_json::from_str(&text).map_err(|e| format!("{}: {}", path.display(), e))?
            },
            None => AnnotatorConfig::default(),
        };
        if let Some(root) = storage {
            config = config.with_storage_root(root);
        }
        if let Some(font) = font {
            config = config.with_caption_font(font);
        }
        if let Some(author) = author {
            config = config.with_annotation_author(author);
        }

        let command = match command_name.as_str() {
            "compose" => Command::Compose {
                images: positional.into_iter().map(|p| ImageSource::Path(PathBuf::from(p))).collect(),
                caption,
                mode,
            },
            "extract" => match positional.as_slice() {
                [file] => Command::Extract {
                    file: file.clone(),
                    mime,
                    json,
                },
                _ => return Err(usage()),
            },
            _ => return Err(usage()),
        };

        Ok(Self { command, config })
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let cli = match CliArgs::from_args(&args) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::from(2);
        },
    };

    let mut service = match AnnotationService::start(cli.config) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        },
    };

    let mut print_json = false;
    let submitted = match cli.command {
        Command::Compose { images, caption, mode } => service.submit(Request::Compose { images, caption, mode }),
        Command::Extract { file, mime, json } => {
            print_json = json;
            service.open_incoming(&file, mime.as_deref())
        },
    };
    if let Err(e) = submitted {
        eprintln!("{}", e.user_message());
        return ExitCode::FAILURE;
    }

    let outcome = match service.recv_outcome() {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return ExitCode::FAILURE;
        },
    };
    service.shutdown();

    match &outcome {
        Outcome::Extracted { records, .. } if print_json => match serde_json::to_string_pretty(records) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            },
        },
        Outcome::Extracted { records, .. } if !records.is_empty() => {
            for record in records {
                println!("{}\n", record);
            }
        },
        Outcome::Failed { message, .. } => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        },
        other => println!("{}", other.message()),
    }

    ExitCode::SUCCESS
}
