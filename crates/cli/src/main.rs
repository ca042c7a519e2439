use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use script_review::{
    DecisionKind, Genre, MockConfig, MockScriptService, RequestParameters, ReviewConfig,
    ReviewSession, ReviewState, ScriptService, Tone, Transition, VideoDecision,
    VideoDecisionState, WebhookClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "script-review-cli")]
#[command(about = "Generate a video script, refine it with feedback and approve the result")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a script and start an interactive review
    Run {
        /// Topic of the video
        topic: Vec<String>,

        /// Tone (Professional, Casual, Funny)
        #[arg(long, default_value = "Professional")]
        tone: Tone,

        /// Genre (Educational, Entertainment, Tutorial)
        #[arg(long, default_value = "Educational")]
        genre: Genre,

        /// Config file path (defaults to the platform config dir)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Point every webhook at this base url
        #[arg(long)]
        base_url: Option<String>,

        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Use the built-in mock service instead of the webhooks
        #[arg(long)]
        mock: bool,

        /// Simulated latency of the mock service in milliseconds
        #[arg(long, default_value = "800")]
        mock_latency_ms: u64,
    },

    /// Write a default config file
    InitConfig {
        /// Destination (defaults to the platform config dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base url for the webhooks
        #[arg(long)]
        base_url: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Commands::Run {
            topic,
            tone,
            genre,
            config,
            base_url,
            timeout,
            mock,
            mock_latency_ms,
        } => {
            run_command(
                topic.join(" "),
                tone,
                genre,
                config,
                base_url,
                timeout,
                mock.then_some(Duration::from_millis(mock_latency_ms)),
            )
            .await
        }
        Commands::InitConfig {
            output,
            base_url,
            force,
        } => init_config_command(output, base_url, force),
    }
}

fn resolve_config_path(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => ReviewConfig::default_path().context("Could not determine a config path"),
    }
}

fn init_config_command(output: Option<PathBuf>, base_url: Option<String>, force: bool) -> Result<()> {
    let path = resolve_config_path(output)?;
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let config = match base_url {
        Some(base) => ReviewConfig::with_base_url(&base),
        None => ReviewConfig::default(),
    };
    config.save(&path)?;
    info!("Wrote config to {}", path.display());
    Ok(())
}

async fn run_command(
    topic: String,
    tone: Tone,
    genre: Genre,
    config_path: Option<PathBuf>,
    base_url: Option<String>,
    timeout: Option<u64>,
    mock_latency: Option<Duration>,
) -> Result<()> {
    let path = resolve_config_path(config_path)?;
    let mut config = ReviewConfig::load_or_default(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    if let Some(base) = base_url {
        let overridden = ReviewConfig::with_base_url(&base);
        config = config
            .with_generate_url(overridden.generate_url)
            .with_decision_url(overridden.decision_url)
            .with_video_urls(overridden.video_approve_url, overridden.video_reject_url);
    }
    if let Some(secs) = timeout {
        config = config.with_timeout(secs);
    }

    let service: Arc<dyn ScriptService> = match mock_latency {
        Some(latency) => Arc::new(MockScriptService::new(MockConfig {
            latency,
            video_url: Some("https://example.com/videos/mock-preview.mp4".to_string()),
        })),
        None => Arc::new(WebhookClient::new(&config)?),
    };
    info!("Using {} script service", service.name());

    let mut repl = Repl {
        session: ReviewSession::new(service, config),
        tone,
        genre,
        compose: None,
    };
    repl.generate(&topic);
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = repl.session.next_event() => {
                let transition = repl.session.handle_event(event);
                repl.report(transition);
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if repl.handle_line(&line) == Flow::Quit {
                    break;
                }
            }
        }
    }

    if repl.session.outstanding() > 0 {
        info!(
            "Waiting for {} outstanding request(s)...",
            repl.session.outstanding()
        );
        for transition in repl.session.settle().await {
            repl.report(transition);
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct Repl {
    session: ReviewSession,
    tone: Tone,
    genre: Genre,
    /// Lines typed since `edit`, until a lone `.`
    compose: Option<Vec<String>>,
}

impl Repl {
    fn generate(&mut self, topic: &str) {
        let params = match RequestParameters::new(topic, self.tone, self.genre) {
            Ok(params) => params,
            Err(err) => {
                println!("{err}. Usage: generate <topic>");
                return;
            }
        };
        match self.session.submit(params) {
            Ok(()) => println!("Generating..."),
            Err(err) => println!("{err}"),
        }
    }

    fn handle_line(&mut self, line: &str) -> Flow {
        if let Some(buffer) = self.compose.as_mut() {
            if line.trim() == "." {
                let text = buffer.join("\n");
                self.compose = None;
                match self.session.update_working_text(text) {
                    Ok(()) => println!("Draft captured. `save` to keep it or `cancel` to discard."),
                    Err(err) => println!("{err}"),
                }
            } else {
                buffer.push(line.to_string());
            }
            return Flow::Continue;
        }

        let (command, rest) = match line.trim().split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line.trim(), ""),
        };
        let outcome = match command {
            "" => Ok(()),
            "help" => {
                print_help();
                Ok(())
            }
            "quit" | "exit" => return Flow::Quit,
            "show" => {
                self.show();
                Ok(())
            }
            "status" => {
                match self.session.status().message() {
                    Some(message) => println!("{message}"),
                    None => println!("(no status)"),
                }
                Ok(())
            }
            "generate" => {
                self.generate(rest);
                Ok(())
            }
            "tone" => rest.parse().map(|tone| self.tone = tone),
            "genre" => rest.parse().map(|genre| self.genre = genre),
            "edit" => self.session.start_edit().map(|()| {
                println!("Enter the new script, finish with a line containing only `.`");
                self.compose = Some(Vec::new());
            }),
            "save" => self.session.save_edit().map(|()| self.print_status()),
            "cancel" => self.session.cancel_edit(),
            "feedback" => self.session.set_feedback(rest).map(|()| {
                println!(
                    "Next action: {}",
                    script_review::classify(rest).action_label()
                );
            }),
            "submit" => self.session.submit_decision().map(|kind| match kind {
                DecisionKind::Refine => println!("Sending refinement request..."),
                DecisionKind::Approved => println!("Sending approval..."),
            }),
            "video" => match rest {
                "approve" => self.decide_video(VideoDecision::Approved),
                "reject" => self.decide_video(VideoDecision::Rejected),
                _ => {
                    println!("Usage: video approve|reject");
                    Ok(())
                }
            },
            "reset" => {
                self.compose = None;
                self.session.reset();
                println!("Workflow reset. Use `generate <topic>` to start over.");
                Ok(())
            }
            other => {
                println!("Unknown command '{other}'. Type `help` for a list.");
                Ok(())
            }
        };
        if let Err(err) = outcome {
            warn!("{}", err);
        }
        Flow::Continue
    }

    fn decide_video(&mut self, decision: VideoDecision) -> script_review::error::Result<()> {
        if !self.session.decide_video(decision)? {
            println!("Video already {decision}.");
        }
        Ok(())
    }

    fn report(&self, transition: Transition) {
        match transition {
            Transition::Generated { .. } => self.show(),
            Transition::Refined => {
                self.print_status();
                self.show();
            }
            Transition::Stale => {}
            _ => self.print_status(),
        }
    }

    fn print_status(&self) {
        if let Some(message) = self.session.status().message() {
            println!(">> {message}");
        }
    }

    fn show(&self) {
        let machine = self.session.machine();
        println!("State: {}", machine.state());
        if let Some(params) = machine.params() {
            println!(
                "Topic: {} ({}, {})",
                params.topic(),
                params.tone(),
                params.genre()
            );
        }
        let Some(script) = machine.session() else {
            return;
        };
        println!("----- Script -----");
        if machine.state() == ReviewState::Editing {
            println!("{}", script.draft().working_text());
            if script.draft().is_dirty() {
                println!("(unsaved changes: `save` or `cancel`)");
            }
        } else {
            println!("{}", script.draft().committed_text());
        }
        println!("------------------");
        if machine.state() == ReviewState::Reviewing {
            println!(
                "Feedback: {:?} -> `submit` will {}",
                script.feedback(),
                script.pending_decision().action_label()
            );
        }
        if let Some(video) = script.video() {
            let decision = match video.decision() {
                VideoDecisionState::Undecided => "undecided".to_string(),
                VideoDecisionState::Decided(decision) => decision.to_string(),
            };
            println!("Video: {} [{}]", video.url(), decision);
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  show                 print the script and workflow state");
    println!("  edit                 edit the script (end input with a lone `.`)");
    println!("  save | cancel        keep or discard the edit");
    println!("  feedback <text>      set feedback; empty feedback approves");
    println!("  submit               approve or refine, depending on feedback");
    println!("  video approve|reject decide on the generated video");
    println!("  reset                start over");
    println!("  generate <topic>     request a new script (after reset)");
    println!("  tone <t> | genre <g> change parameters for the next generate");
    println!("  status               show the current status message");
    println!("  quit");
}
