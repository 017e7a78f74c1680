use clap::{CommandFactory, Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use vslc::{compile, compile_to_resolved, debug, CompilerConfig, ParseNode};

#[derive(Parser)]
#[command(name = "vslc", version, about = "VSL compiler backend: tree simplification, resolution, and x86-64 codegen")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a JSON parse tree into x86-64 AT&T assembly.
    Build {
        /// Path to the JSON `ParseNode` input, or `-` for stdin.
        input: PathBuf,
        /// Write assembly here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override which function the `main` entry wrapper calls.
        #[arg(long)]
        entry: Option<String>,
    },
    /// Print the resolved tree (indented text, or Graphviz with
    /// `--graphviz` or `GRAPHVIZ_OUTPUT` set).
    DumpTree {
        input: PathBuf,
        #[arg(long)]
        graphviz: bool,
    },
    /// Generate shell completions for this CLI.
    Completions {
        shell: clap_complete::Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run() {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Build { input, output, entry } => run_build(&input, output.as_deref(), entry),
        Commands::DumpTree { input, graphviz } => run_dump_tree(&input, graphviz),
        Commands::Completions { shell } => run_completions(shell),
    }
}

fn read_input(path: &PathBuf) -> Result<ParseNode, String> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        buf
    } else {
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?
    };
    serde_json::from_str(&text).map_err(|e| format!("failed to parse input tree: {e}"))
}

fn run_build(input: &PathBuf, output: Option<&std::path::Path>, entry: Option<String>) -> Result<(), String> {
    let tree = read_input(input)?;
    let mut config = CompilerConfig::default();
    if let Some(name) = entry {
        config = config.with_entry(name);
    }
    let asm = compile(tree, &config).map_err(|e| e.to_string())?;
    match output {
        Some(path) => fs::write(path, asm).map_err(|e| format!("failed to write {}: {e}", path.display()))?,
        None => io::stdout()
            .write_all(asm.as_bytes())
            .map_err(|e| format!("failed to write to stdout: {e}"))?,
    }
    Ok(())
}

fn run_dump_tree(input: &PathBuf, graphviz_flag: bool) -> Result<(), String> {
    let tree = read_input(input)?;
    let (program, resolved) = compile_to_resolved(tree).map_err(|e| e.to_string())?;
    let graphviz = graphviz_flag || std::env::var_os("GRAPHVIZ_OUTPUT").is_some();
    let text = debug::dump(&program, Some(&resolved), graphviz);
    print!("{text}");
    Ok(())
}

fn run_completions(shell: clap_complete::Shell) -> Result<(), String> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_PROGRAM: &str = r#"
        {"kind":"FunctionDef","payload":{"type":"Name","value":"main"},"children":[
            {"kind":"Block","children":[
                {"kind":"PrintStatement","children":[
                    {"kind":"NumberData","payload":{"type":"Number","value":7}}
                ]}
            ]}
        ]}
    "#;

    #[test]
    fn build_reads_json_file_and_writes_assembly_to_disk() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let input_path = dir.path().join("program.json");
        let output_path = dir.path().join("program.s");
        fs::write(&input_path, MINIMAL_PROGRAM).expect("write input fixture");

        run_build(&input_path, Some(output_path.as_path()), None).expect("build should succeed");

        let asm = fs::read_to_string(&output_path).expect("read generated assembly");
        assert!(asm.contains(".globl main"));
    }

    #[test]
    fn build_reports_parse_errors_without_panicking() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let input_path = dir.path().join("broken.json");
        let mut file = fs::File::create(&input_path).expect("create fixture");
        file.write_all(b"not json").expect("write fixture");

        assert!(run_build(&input_path, None, None).is_err());
    }
}
