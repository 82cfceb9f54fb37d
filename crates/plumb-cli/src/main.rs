use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use plumb_config::{validate, Config, ConfigFile, Layout, DEFAULT_DENY_LIST};
use plumb_tui::AcceptOutcome;
use std::io::{IsTerminal, Read};
use std::process::Stdio;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// plumb — compose a shell pipeline interactively, one stage at a time,
/// with a live preview of what each stage produces. Nothing runs "for
/// real" until you press Enter.
#[derive(Parser)]
#[command(name = "plumb", version, about)]
struct Cli {
    /// Initial pipeline text (split on '|' like any later edit)
    command: Option<String>,

    /// Shell used to run every stage as `<shell> -c <stage>`
    #[arg(short, long)]
    shell: Option<String>,

    /// On accept, print the assembled command line instead of executing it
    #[arg(short = 'c', long)]
    print_command: bool,

    /// Arrangement of the two preview panes
    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    /// Extra deny-list entries: leading command names whose preview
    /// execution is suppressed
    #[arg(long = "deny", value_name = "CMD")]
    deny: Vec<String>,

    /// Skip the user config file
    #[arg(long)]
    no_config: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LayoutArg {
    /// Side by side
    Columns,
    /// Stacked
    Rows,
}

impl From<LayoutArg> for Layout {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Columns => Layout::Columns,
            LayoutArg::Rows => Layout::Rows,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Tracing goes to a file, never to the terminal the TUI owns.
    if let Ok(path) = std::env::var("PLUMB_LOG") {
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create log file: {path}"))?;
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(file)
            .with_ansi(false)
            .init();
    }

    let file_config = if cli.no_config {
        None
    } else {
        ConfigFile::load_default().with_context(|| {
            format!(
                "Failed to load user config: {}",
                ConfigFile::default_path().display()
            )
        })?
    };

    let config = assemble_config(&cli, file_config);

    let validation = validate(&config);
    for warning in &validation.warnings {
        eprintln!("warning: {warning}");
    }
    if !validation.is_valid() {
        for error in &validation.errors {
            eprintln!("error: {error}");
        }
        anyhow::bail!("Invalid configuration");
    }

    // External input: read fully once when stdin is piped in.
    let stdin_bytes = if std::io::stdin().is_terminal() {
        Vec::new()
    } else {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read piped stdin")?;
        bytes
    };

    let config = Arc::new(config);
    let outcome = plumb_tui::run_tui(config.clone(), stdin_bytes.clone()).await?;

    match outcome {
        AcceptOutcome::Aborted => Ok(()),
        AcceptOutcome::Accepted(text) => {
            if config.print_command {
                println!("{text}");
                Ok(())
            } else {
                execute(&config.shell, &text, &stdin_bytes).await
            }
        }
    }
}

/// Layer CLI flags over the optional user config file and the defaults.
fn assemble_config(cli: &Cli, file: Option<ConfigFile>) -> Config {
    let file = file.unwrap_or_default();

    let shell = cli
        .shell
        .clone()
        .or_else(|| std::env::var("SHELL").ok().filter(|s| !s.is_empty()))
        .or(file.shell)
        .unwrap_or_default();

    let layout = cli
        .layout
        .map(Layout::from)
        .or(file.layout)
        .unwrap_or_default();

    let mut deny_list = file
        .deny
        .unwrap_or_else(|| DEFAULT_DENY_LIST.iter().map(|s| s.to_string()).collect());
    deny_list.extend(cli.deny.iter().cloned());

    Config {
        shell,
        initial_text: cli.command.clone().unwrap_or_default(),
        print_command: cli.print_command,
        layout,
        deny_list,
    }
}

/// Run the accepted command line once, for real.
///
/// The captured external input is replayed as stdin; stdout and stderr are
/// inherited, so a failing command is the user's normal shell experience.
/// plumb exits with the command's own status.
async fn execute(shell: &str, text: &str, stdin_bytes: &[u8]) -> Result<()> {
    let mut cmd = tokio::process::Command::new(shell);
    cmd.arg("-c")
        .arg(text)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    if stdin_bytes.is_empty() {
        cmd.stdin(Stdio::inherit());
    } else {
        cmd.stdin(Stdio::piped());
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to run {shell} -c {text:?}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        use tokio::io::AsyncWriteExt;
        let _ = stdin.write_all(stdin_bytes).await;
        let _ = stdin.shutdown().await;
        drop(stdin);
    }

    let status = child.wait().await.context("Failed to wait for command")?;
    if let Some(code) = status.code() {
        if code != 0 {
            std::process::exit(code);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("plumb").chain(args.iter().copied()))
    }

    #[test]
    fn test_flags_win_over_file() {
        let file = ConfigFile {
            shell: Some("/bin/zsh".to_string()),
            layout: Some(Layout::Rows),
            deny: None,
        };
        let config = assemble_config(
            &cli(&["--shell", "/bin/bash", "--layout", "columns"]),
            Some(file),
        );
        assert_eq!(config.shell, "/bin/bash");
        assert_eq!(config.layout, Layout::Columns);
    }

    #[test]
    fn test_default_deny_list_applies() {
        let config = assemble_config(&cli(&[]), None);
        assert_eq!(config.deny_list, vec!["rm".to_string()]);
    }

    #[test]
    fn test_deny_flags_extend_file_list() {
        let file = ConfigFile {
            shell: None,
            layout: None,
            deny: Some(vec!["dd".to_string()]),
        };
        let config = assemble_config(&cli(&["--deny", "shutdown"]), Some(file));
        assert_eq!(
            config.deny_list,
            vec!["dd".to_string(), "shutdown".to_string()]
        );
    }

    #[test]
    fn test_initial_text_positional() {
        let config = assemble_config(&cli(&["cat log|grep err"]), None);
        assert_eq!(config.initial_text, "cat log|grep err");
    }

    #[test]
    fn test_print_command_flag() {
        assert!(assemble_config(&cli(&["-c"]), None).print_command);
        assert!(!assemble_config(&cli(&[]), None).print_command);
    }
}
