use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use clap_mangen::Man;
use pedal_macro::cli::Args;

use std::io::Write;
use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct XtaskArgs {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Generate man page and shell completions.
    GenerateDocs,
    /// Run cargo check.
    Check,
    /// Run cargo test.
    Test,
    /// Run cargo clippy.
    Clippy,
    /// Run cargo fmt --check.
    FmtCheck,
}

fn main() -> Result<()> {
    let args = XtaskArgs::parse();

    match args.command {
        Commands::GenerateDocs => generate_docs().context("Failed to generate docs"),
        Commands::Check => run_cargo("check", &[]).context("cargo check failed"),
        Commands::Test => run_cargo("test", &[]).context("cargo test failed"),
        Commands::Clippy => {
            run_cargo("clippy", &["--", "-D", "warnings"]).context("cargo clippy failed")
        }
        Commands::FmtCheck => run_cargo("fmt", &["--", "--check"]).context("cargo fmt failed"),
    }
}

fn run_cargo(command: &str, args: &[&str]) -> Result<()> {
    let cargo = env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let mut cmd = Command::new(cargo);
    cmd.arg(command);
    cmd.args(args);
    // Run in the workspace root
    cmd.current_dir(project_root());

    let status = cmd
        .status()
        .context(format!("Failed to execute cargo {command}"))?;

    if !status.success() {
        anyhow::bail!("cargo {command} command failed");
    }
    Ok(())
}

fn project_root() -> PathBuf {
    Path::new(&env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(1)
        .unwrap()
        .to_path_buf()
}

fn generate_docs() -> Result<()> {
    let root_dir = project_root();
    let docs_dir = root_dir.join("docs");
    let man_dir = docs_dir.join("man");
    let completions_dir = docs_dir.join("completions");

    fs::create_dir_all(&man_dir).context("Failed to create man directory")?;
    fs::create_dir_all(&completions_dir).context("Failed to create completions directory")?;

    let cmd = Args::command();
    let bin_name = cmd.get_name().to_string();

    // --- Generate Man Page ---
    let man_path = man_dir.join(format!("{bin_name}.1"));
    println!("Generating man page: {man_path:?}");
    generate_man_page(&cmd, &man_path)?;

    // --- Generate Shell Completions ---
    generate_completions(&cmd, &completions_dir)?;

    println!(
        "Successfully generated man page and completions in: {}",
        docs_dir.display()
    );
    Ok(())
}

// --- Man Page Content Constants ---
// Note: Using roff formatting. \fB...\fR = bold, \fI...\fR = italic, \- = hyphen, \(bu = bullet

// clap_mangen generates the DESCRIPTION section from the command's about/long_about.

const MAN_CONFIG_FORMAT: &str = r#"
.B Device Lines
.PP
A line starting with \fBdev:\fR binds one evdev node to a contiguous range of button numbers, one per listed event code:
.IP
.nf
dev: /dev/input/by\-id/your\-pedal\-event\-kbd KEY_A, KEY_B, KEY_C
.fi
.PP
Append \fB[shared]\fR to open the device without an exclusive grab, so other listeners (e.g. the desktop) still see its events.
.PP
.B Rule Lines
.PP
Every other non\-blank, non\-comment line is a rule: a comma\-separated pattern, an optional time limit, a colon, and a command to run \fIverbatim\fR via \fBsh \-c\fR:
.IP
.nf
1v,2 < 0.3: notify\-send "combo fired"
.fi
.PP
A bare button number alone (e.g. \fB1\fR) as the whole pattern means "tap": it desugars to a press followed by a release of that button, each usable only once. A bare number used \fIalongside\fR other tokens matches either edge of that button.
.PP
Append \fBv\fR to a button number to require a press, or \fB^\fR to require a release.
"#;

const MAN_EXAMPLES: &str = r#"
.PP
.B Basic Pedal Macro:
.IP
.nf
sudo {bin_name} \-\-config pedals.conf
.fi
.PP
Loads the given configuration, grabs the devices it lists, and runs commands as their button sequences complete.
.PP
.B Dry Run:
.IP
.nf
sudo {bin_name} \-\-config pedals.conf \-\-debug
.fi
.PP
Logs every event and every rule that would have fired, without executing any commands. Useful for tuning a configuration safely.
.PP
.B List Input Devices:
.IP
.nf
sudo {bin_name} \-\-list\-devices
.fi
.PP
Lists \fI/dev/input/event*\fR nodes and their capabilities. Requires read access to the device nodes.
.PP
.B JSON Statistics Output:
.IP
.nf
sudo {bin_name} \-\-config pedals.conf \-\-stats\-json 2> stats.json
.fi
.PP
Writes statistics as JSON to standard error, redirected to a file.
"#;

const MAN_SIGNALS: &str = r#"
\fB{bin_name}\fR handles the following signals gracefully to ensure clean shutdown and reporting of final statistics:
.IP \(bu 4
SIGINT (Interrupt, typically Ctrl+C)
.IP \(bu 4
SIGTERM (Termination signal)
.IP \(bu 4
SIGQUIT (Quit signal)
.PP
When any of these signals are received, the program stops reading new device events, signals the logger thread to drain its queue, waits for it to finish, and prints final cumulative statistics before exiting.
"#;

const MAN_LOGGING: &str = r#"
\fB{bin_name}\fR logs to standard error using the \fBtracing\fR framework.
.PP
.B Log Flags:
.IP "\fB\-\-quiet\fR" 4
Suppress informational logging; only warnings and errors are printed.
.IP "\fB\-\-debug\fR" 4
Log every event and every rule that would fire, without executing commands.
.PP
.B Environment Variable: RUST_LOG
.IP
Provides fine\-grained control over logging using the \fBtracing_subscriber::EnvFilter\fR format, overriding the default level implied by \fB\-\-quiet\fR/\fB\-\-debug\fR. Example: \fBRUST_LOG=pedal_macro=trace\fR.
"#;

const MAN_EXIT_STATUS: &str = r#"
.IP 0 4
Success. The program completed normally or was terminated cleanly by a handled signal.
.IP 1 4
Runtime error: a malformed configuration file, a device that failed to open, or an internal error.
.IP 2 4
Device listing error when using \fB\-\-list\-devices\fR, likely due to insufficient permissions.
"#;

const MAN_ENVIRONMENT: &str = r#"
.TP
.B RUST_LOG
Controls logging verbosity and filtering, overriding the defaults set by \fB\-\-quiet\fR/\fB\-\-debug\fR. Uses the \fBtracing_subscriber::EnvFilter\fR format.
"#;

const MAN_BUGS: &str = r#"
Please report bugs, issues, or feature requests via the GitHub issue tracker.
"#;

const MAN_SEE_ALSO: &str = r#"
\fBinput_event\fR(5), \fBlibinput\fR(1), \fBevtest\fR(1), \fBudevmon\fR(1)
"#;

const MAN_TROUBLESHOOTING: &str = r#"
.TP
.B Permission Denied (opening /dev/input/event*):
Reading and grabbing evdev nodes typically requires root privileges or membership in the 'input' group.
.TP
.B Device Already Grabbed:
Another process (or another instance of \fB{bin_name}\fR) may already hold an exclusive grab on the device. Use \fB[shared]\fR on the \fBdev:\fR line if the device needs to stay usable elsewhere.
.TP
.B Rule Never Fires:
Run with \fB\-\-debug\fR to see every incoming event and confirm button numbers and polarities match what you expect. Check that no earlier, higher\-priority rule is consuming the same history entries first.
"#;

/// Generates the man page with custom sections.
fn generate_man_page(cmd: &clap::Command, path: &Path) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    let date = chrono::Local::now().format("%B %d, %Y").to_string();
    let app_name_uppercase = cmd.get_name().to_uppercase();
    let bin_name = cmd.get_name();

    let mut buffer: Vec<u8> = Vec::new();

    writeln!(
        buffer,
        r#".TH "{app_name_uppercase}" 1 "{date}" "{version}" "User Commands""#
    )?;
    Man::new(cmd.clone()).render(&mut buffer)?;

    let custom_sections = [
        ("CONFIGURATION FORMAT", MAN_CONFIG_FORMAT),
        ("EXAMPLES", MAN_EXAMPLES),
        ("LOGGING", MAN_LOGGING),
        ("SIGNALS", MAN_SIGNALS),
        ("TROUBLESHOOTING", MAN_TROUBLESHOOTING),
        ("EXIT STATUS", MAN_EXIT_STATUS),
        ("ENVIRONMENT", MAN_ENVIRONMENT),
        ("BUGS", MAN_BUGS),
        ("SEE ALSO", MAN_SEE_ALSO),
    ];

    for (title, content_template) in custom_sections {
        writeln!(buffer, ".SH {title}")?;
        let formatted_content = content_template.replace("{bin_name}", bin_name);
        writeln!(buffer, "{formatted_content}")?;
    }

    fs::write(path, buffer).with_context(|| format!("Failed to write man page to {path:?}"))?;
    Ok(())
}

/// Generates shell completion files, including Nushell via clap_complete's
/// built-in `Shell::Nu` variant.
fn generate_completions(cmd: &clap::Command, completions_dir: &Path) -> Result<()> {
    let bin_name = cmd.get_name();
    let shells = [
        Shell::Bash,
        Shell::Elvish,
        Shell::Fish,
        Shell::PowerShell,
        Shell::Zsh,
        Shell::Nu,
    ];

    for shell in shells {
        let ext = match shell {
            Shell::Bash => "bash",
            Shell::Elvish => "elv",
            Shell::Fish => "fish",
            Shell::PowerShell => "ps1",
            Shell::Zsh => "zsh",
            Shell::Nu => "nu",
            _ => continue,
        };
        let completions_path = completions_dir.join(format!("{bin_name}.{ext}"));
        println!("Generating completion file: {completions_path:?}");
        let mut file = fs::File::create(&completions_path)
            .with_context(|| format!("Failed to create completion file: {completions_path:?}"))?;
        generate(shell, &mut cmd.clone(), bin_name, &mut file);
    }

    Ok(())
}
