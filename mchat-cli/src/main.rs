use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use mchat_core::{
    ChatConfig, Conversation, HttpChatTransport, MchatError, PanelState, RenderBlock,
    blocks_to_raw_json, conversation_to_raw_json, render_blocks, render_blocks_markdown,
    render_conversation_markdown, render_message,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "mchat",
    version,
    about = "Render tool-call markers in chat messages and talk to a chat endpoint"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render an assistant message body read from FILE or stdin
    Render {
        /// Message body file; `-` or absent reads stdin
        file: Option<PathBuf>,

        /// List markers as `<identifier> <kind> <summary>` instead of rendering
        #[arg(long)]
        list: bool,

        #[command(flatten)]
        panels: PanelArgs,
    },
    /// Send a query to the chat endpoint and print the conversation
    Ask {
        query: String,

        /// Chat endpoint base URL; overrides MCHAT_ENDPOINT
        #[arg(long)]
        endpoint: Option<String>,

        #[command(flatten)]
        panels: PanelArgs,
    },
}

#[derive(Debug, Args)]
struct PanelArgs {
    /// Output raw JSON instead of markdown
    #[arg(long)]
    raw: bool,

    /// Expand the tool panel with this identifier (repeatable)
    #[arg(long = "expand", value_name = "ID")]
    expand: Vec<String>,

    /// Expand every tool panel
    #[arg(long)]
    expand_all: bool,
}

impl PanelArgs {
    fn state_for(&self, blocks: &[RenderBlock]) -> PanelState {
        let mut state = PanelState::new();
        if self.expand_all {
            state.expand_all(blocks);
        }
        for identifier in &self.expand {
            state.set_expanded(identifier.clone(), true);
        }
        state
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MCHAT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> mchat_core::Result<()> {
    match cli.command {
        Command::Render { file, list, panels } => {
            let body = read_body(file.as_deref())?;
            let blocks = render_blocks(&body);

            if list {
                for marker in blocks.iter().filter_map(RenderBlock::as_tool) {
                    println!("{} {} {}", marker.identifier, marker.kind, marker.summary);
                }
            } else if panels.raw {
                println!("{}", blocks_to_raw_json(&blocks)?);
            } else {
                print!("{}", render_blocks_markdown(&blocks, &panels.state_for(&blocks)));
            }
            Ok(())
        }
        Command::Ask {
            query,
            endpoint,
            panels,
        } => {
            let config = ChatConfig::resolve(endpoint.as_deref())?;
            let transport = HttpChatTransport::new(&config)?;
            let mut conversation = Conversation::new();
            if conversation.send(&transport, &query).is_none() {
                return Err(MchatError::InvalidQuery("query must not be blank".to_string()));
            }

            if panels.raw {
                println!("{}", conversation_to_raw_json(&conversation)?);
            } else {
                let blocks: Vec<RenderBlock> = conversation
                    .messages()
                    .iter()
                    .flat_map(|message| render_message(message).blocks)
                    .collect();
                let state = panels.state_for(&blocks);
                print!("{}", render_conversation_markdown(&conversation, &state));
            }

            match conversation.error() {
                Some(reason) => Err(MchatError::ChatFailed(reason.to_string())),
                None => Ok(()),
            }
        }
    }
}

fn read_body(path: Option<&Path>) -> mchat_core::Result<String> {
    match path {
        Some(path) if path != Path::new("-") => {
            let bytes = fs::read(path).map_err(|source| MchatError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            String::from_utf8(bytes).map_err(|_| MchatError::NonUtf8Input {
                path: path.to_path_buf(),
            })
        }
        _ => {
            let stdin = PathBuf::from("<stdin>");
            let mut bytes = Vec::new();
            io::stdin()
                .read_to_end(&mut bytes)
                .map_err(|source| MchatError::Io {
                    path: stdin.clone(),
                    source,
                })?;
            String::from_utf8(bytes).map_err(|_| MchatError::NonUtf8Input { path: stdin })
        }
    }
}
