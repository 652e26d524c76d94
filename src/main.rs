//! qrgen command-line entrypoint

use clap::Parser;
use qrgen::events::EventReceiver;
use qrgen::output::{Rendered, render_download, render_event, render_status};
use qrgen::{Error, QrController, QrFormat, QrSize, QrgenConfig, Result, events, logging};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "qrgen",
    version,
    about = "Generate and download QR code images through a remote QR API"
)]
struct Cli {
    /// Text or URL to encode. Starts the interactive prompt when omitted.
    text: Option<String>,

    /// Optional configuration file (toml/yaml). Defaults to qrgen.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// QR size in pixels (150, 200, 250, 300, 400 or 500)
    #[arg(long, short, value_name = "PIXELS")]
    size: Option<QrSize>,

    /// Output format (`png` or `svg`)
    #[arg(long, short, value_name = "FORMAT")]
    format: Option<QrFormat>,

    /// Directory downloads are saved into
    #[arg(long, short, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Override the QR API endpoint
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,

    /// Only display the result, do not download it
    #[arg(long)]
    no_download: bool,

    /// Output results as JSON lines instead of human-readable text
    #[arg(long)]
    json: bool,

    /// Start the interactive prompt even when TEXT is given
    #[arg(long, short)]
    interactive: bool,

    /// Switch between light and dark theme and exit
    #[arg(long)]
    toggle_theme: bool,
}

/// One line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Generate(String),
    Format(QrFormat),
    Size(QrSize),
    Download,
    Theme,
    Status,
    Help,
    Quit,
    Invalid(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        // `::` escapes a leading colon, so `::)` generates `:)`.
        if let Some(text) = trimmed.strip_prefix("::") {
            return Self::Generate(format!(":{text}"));
        }
        let Some(command) = trimmed.strip_prefix(':') else {
            return Self::Generate(line.to_string());
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("png"), None) => Self::Format(QrFormat::Png),
            (Some("svg"), None) => Self::Format(QrFormat::Svg),
            (Some("format"), Some(value)) => match value.parse() {
                Ok(format) => Self::Format(format),
                Err(err) => Self::Invalid(err.to_string()),
            },
            (Some("size"), Some(value)) => match value.parse() {
                Ok(size) => Self::Size(size),
                Err(err) => Self::Invalid(err.to_string()),
            },
            (Some("download" | "d"), None) => Self::Download,
            (Some("theme"), None) => Self::Theme,
            (Some("status"), None) => Self::Status,
            (Some("help" | "h" | "?"), None) => Self::Help,
            (Some("quit" | "q" | "exit"), None) => Self::Quit,
            _ => Self::Invalid(format!(
                "Unknown command ':{command}', try :help (use :: to generate text starting with ':')"
            )),
        }
    }
}

const HELP: &[&str] = &[
    "Type text and press Enter to generate a QR code.",
    "  :png | :svg        choose output format",
    "  :size <pixels>     choose size (150, 200, 250, 300, 400, 500)",
    "  :download          save the displayed QR code",
    "  :theme             toggle light/dark theme",
    "  :status            show current selection and result",
    "  :quit              exit",
    "Start a line with :: to generate text beginning with ':'.",
];

struct Printer {
    json: bool,
}

impl Printer {
    fn emit(&self, rendered: &Rendered) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(&rendered.json)?);
        } else {
            for line in &rendered.human {
                println!("{line}");
            }
        }
        Ok(())
    }

    fn drain(&self, rx: &mut EventReceiver) -> Result<()> {
        while let Ok(event) = rx.try_recv() {
            self.emit(&render_event(&event))?;
        }
        Ok(())
    }

    fn error(&self, err: &Error) -> Result<()> {
        if self.json {
            let payload = serde_json::json!({ "error": err.to_string() });
            println!("{}", serde_json::to_string(&payload)?);
        } else {
            println!("✗ {err}");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = QrgenConfig::load(cli.config.as_deref())?;

    if let Some(size) = cli.size {
        config.ui.default_size = size;
    }
    if let Some(format) = cli.format {
        config.ui.default_format = format;
    }
    if let Some(ref dir) = cli.out {
        config.storage.download_dir = dir.clone();
    }
    if let Some(ref base) = cli.api_base {
        config.api.base_url = base.clone();
    }

    logging::init(&config.logging)?;
    info!(api = %config.api.base_url, "Starting qrgen");

    let (tx, mut rx) = events::channel();
    let mut controller = QrController::from_config(&config, tx)?;
    let printer = Printer { json: cli.json };

    if cli.toggle_theme {
        controller.toggle_theme()?;
        return printer.drain(&mut rx);
    }

    match cli.text {
        Some(ref text) if !cli.interactive => {
            run_once(&mut controller, &mut rx, &printer, text, !cli.no_download).await
        }
        _ => run_interactive(&mut controller, &mut rx, &printer, cli.text.as_deref()).await,
    }
}

async fn run_once(
    controller: &mut QrController,
    rx: &mut EventReceiver,
    printer: &Printer,
    text: &str,
    download: bool,
) -> Result<()> {
    let displayed = controller.generate(text).await?;
    printer.drain(rx)?;

    let Some(displayed) = displayed else {
        return Err(Error::EmptyInput);
    };

    if download {
        let outcome = controller.download().await?;
        if printer.json {
            printer.emit(&render_download(&outcome))?;
        } else {
            printer.drain(rx)?;
            if let Some(path) = &outcome.saved {
                println!("  Saved to {}", path.display());
            }
        }
    } else {
        displayed.load().wait().await;
        printer.emit(&render_status(&controller.selection(), controller.view()))?;
    }

    Ok(())
}

async fn run_interactive(
    controller: &mut QrController,
    rx: &mut EventReceiver,
    printer: &Printer,
    initial: Option<&str>,
) -> Result<()> {
    if !printer.json {
        for line in HELP {
            println!("{line}");
        }
    }

    if let Some(text) = initial {
        controller.generate(text).await?;
        printer.drain(rx)?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if !printer.json {
            print!("> ");
            std::io::stdout().flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let outcome = match Command::parse(&line) {
            Command::Generate(text) => controller.generate(&text).await.map(|_| ()),
            Command::Format(format) => {
                controller.select_format(format);
                Ok(())
            }
            Command::Size(size) => {
                controller.select_size(size);
                Ok(())
            }
            Command::Download => controller.download().await.and_then(|outcome| {
                printer.drain(rx)?;
                if let Some(path) = &outcome.saved {
                    if !printer.json {
                        println!("  Saved to {}", path.display());
                    }
                }
                Ok(())
            }),
            Command::Theme => controller.toggle_theme().map(|_| ()),
            Command::Status => {
                printer.emit(&render_status(&controller.selection(), controller.view()))
            }
            Command::Help => {
                for line in HELP {
                    println!("{line}");
                }
                Ok(())
            }
            Command::Quit => break,
            Command::Invalid(message) => Err(Error::Other(message)),
        };

        printer.drain(rx)?;
        if let Err(err) = outcome {
            if !err.is_recoverable() && !matches!(err, Error::Other(_)) {
                return Err(err);
            }
            printer.error(&err)?;
        }
    }

    Ok(())
}
