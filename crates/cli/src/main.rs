//! zplgrid CLI — compile, inspect, and print declarative label templates.

use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use zplgrid_core::{
    CompileError, CompileOptions, MacroContext, MissingVarPolicy, RenderTarget, compile_str,
    solve_str,
};
use zplgrid_print_client::{PrintTimeouts, Printer, TcpPrinter};
use zplgrid_store::{CounterStore, TemplateStore};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "zplgrid",
    version,
    about = "zplgrid — compile declarative JSON label templates to ZPL II"
)]
struct Cli {
    /// Output mode for errors and structured results: "pretty" or "json".
    #[arg(long, global = true, value_parser = ["pretty", "json"], default_value = "pretty")]
    output: String,

    #[command(subcommand)]
    cmd: Cmd,
}

/// Render target geometry, shared by every compiling subcommand.
#[derive(Args, Debug)]
struct TargetArgs {
    /// Label width in millimetres.
    #[arg(long)]
    width_mm: f64,
    /// Label height in millimetres.
    #[arg(long)]
    height_mm: f64,
    /// Print resolution in dots per inch.
    #[arg(long)]
    dpi: u32,
    /// Horizontal origin offset in millimetres.
    #[arg(long, default_value_t = 0.0)]
    origin_x_mm: f64,
    /// Vertical origin offset in millimetres.
    #[arg(long, default_value_t = 0.0)]
    origin_y_mm: f64,
}

impl TargetArgs {
    fn target(&self) -> RenderTarget {
        RenderTarget::new(self.width_mm, self.height_mm, self.dpi)
            .with_origin(self.origin_x_mm, self.origin_y_mm)
    }
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compile a template to ZPL and write it to stdout or a file.
    Render {
        /// Template JSON file ("-" for stdin).
        #[arg(value_name = "TEMPLATE")]
        template: String,
        #[command(flatten)]
        target: TargetArgs,
        /// Template variables as NAME=VALUE (repeatable).
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
        /// Override the template's missing-variable policy.
        #[arg(long, value_parser = ["error", "empty"])]
        missing: Option<String>,
        /// Render debug guides for leaf content rects and gutters.
        #[arg(long)]
        debug: bool,
        /// Counter/template store directory (counters read as 0 without it).
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
        /// Write the ZPL here instead of stdout.
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Validate a template (schema, invariants, defaults) without compiling.
    Check {
        /// Template JSON file ("-" for stdin).
        #[arg(value_name = "TEMPLATE")]
        template: String,
    },

    /// Solve the layout and dump the rect tree as JSON.
    Inspect {
        /// Template JSON file ("-" for stdin).
        #[arg(value_name = "TEMPLATE")]
        template: String,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Compile a template and send it to a printer. Counters commit once
    /// on success.
    Print {
        /// Template JSON file ("-" for stdin).
        #[arg(value_name = "TEMPLATE")]
        template: String,
        #[command(flatten)]
        target: TargetArgs,
        /// Printer target: IP, IP:PORT, hostname, or hostname:PORT.
        #[arg(long, short)]
        printer: String,
        /// Template variables as NAME=VALUE (repeatable).
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
        /// Counter/template store directory.
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
        /// Compile and resolve the address, but do not send or commit.
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage the template library.
    Lib {
        /// Library directory.
        #[arg(long, value_name = "DIR", default_value = "zplgrid-store")]
        store: PathBuf,
        #[command(subcommand)]
        cmd: LibCmd,
    },
}

#[derive(Subcommand, Debug)]
enum LibCmd {
    /// Save (or replace) a template under a name.
    Save {
        /// Name to store the template under.
        name: String,
        /// Template JSON file.
        file: PathBuf,
    },
    /// List stored template names.
    List,
    /// Print a stored template's JSON.
    Show {
        /// Stored template name.
        name: String,
    },
    /// Delete a stored template.
    Delete {
        /// Stored template name.
        name: String,
    },
}

// ── Entry point ─────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_output = cli.output == "json";

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            report_error(&err, json_output);
            let code = if err.downcast_ref::<zplgrid_print_client::PrintError>().is_some() {
                2
            } else {
                1
            };
            process::exit(code);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.cmd {
        Cmd::Render {
            template,
            target,
            vars,
            missing,
            debug,
            store,
            out,
        } => {
            let template_json = read_input(&template)?;
            let variables = parse_vars(&vars)?;
            let counters = store.map(counter_store).transpose()?;

            let mut macros = MacroContext::local_now();
            if let Some(counters) = counters.as_ref() {
                macros = macros.with_counters(counters);
            }
            let options = CompileOptions {
                debug,
                missing_variables_override: missing.as_deref().map(parse_policy),
                macros,
                measurer: None,
            };

            let zpl = compile_str(&template_json, &target.target(), &variables, &options)?;
            match out {
                Some(path) => fs::write(&path, &zpl)
                    .with_context(|| format!("cannot write {}", path.display()))?,
                None => println!("{zpl}"),
            }
            Ok(0)
        }

        Cmd::Check { template } => {
            let template_json = read_input(&template)?;
            check_template(&template_json)?;
            eprintln!("ok");
            Ok(0)
        }

        Cmd::Inspect { template, target } => {
            let template_json = read_input(&template)?;
            let tree = solve_str(&template_json, &target.target())?;
            println!(
                "{}",
                serde_json::to_string_pretty(&tree).context("cannot serialize layout tree")?
            );
            Ok(0)
        }

        Cmd::Print {
            template,
            target,
            printer,
            vars,
            store,
            dry_run,
        } => {
            let template_json = read_input(&template)?;
            let variables = parse_vars(&vars)?;
            let counters = store.map(counter_store).transpose()?;
            let template_name = zplgrid_core::parse_document_str(&template_json)?.name;

            let mut macros = MacroContext::local_now().with_printer_id(&printer);
            if let Some(name) = template_name.as_deref() {
                macros = macros.with_template_name(name);
            }
            if let Some(counters) = counters.as_ref() {
                macros = macros.with_counters(counters);
            }
            let local_date = macros.now.date_naive();
            let options = CompileOptions {
                debug: false,
                missing_variables_override: None,
                macros,
                measurer: None,
            };

            let zpl = compile_str(&template_json, &target.target(), &variables, &options)?;

            if dry_run {
                zplgrid_print_client::resolve_printer_addr(&printer)?;
                eprintln!("dry run: {} bytes compiled, nothing sent", zpl.len());
                return Ok(0);
            }

            let mut connection = TcpPrinter::connect(&printer, PrintTimeouts::default())?;
            connection.send_zpl(&zpl)?;
            eprintln!("sent {} bytes to {}", zpl.len(), connection.remote_addr());

            // Counters move only after the printer accepted the job.
            if let Some(counters) = counters.as_ref() {
                counters.commit_print(Some(&printer), template_name.as_deref(), local_date)?;
            }
            Ok(0)
        }

        Cmd::Lib { store, cmd } => {
            let library = TemplateStore::open(&store)
                .with_context(|| format!("cannot open library at {}", store.display()))?;
            match cmd {
                LibCmd::Save { name, file } => {
                    let template_json = fs::read_to_string(&file)
                        .with_context(|| format!("cannot read {}", file.display()))?;
                    library.save(&name, &template_json)?;
                    eprintln!("saved `{name}`");
                }
                LibCmd::List => {
                    for name in library.list()? {
                        println!("{name}");
                    }
                }
                LibCmd::Show { name } => println!("{}", library.load(&name)?),
                LibCmd::Delete { name } => {
                    library.delete(&name)?;
                    eprintln!("deleted `{name}`");
                }
            }
            Ok(0)
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("cannot read stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(path).with_context(|| format!("cannot read {path}"))
    }
}

fn parse_vars(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .with_context(|| format!("invalid --var `{pair}`, expected NAME=VALUE"))
        })
        .collect()
}

fn parse_policy(s: &str) -> MissingVarPolicy {
    match s {
        "empty" => MissingVarPolicy::Empty,
        _ => MissingVarPolicy::Error,
    }
}

fn counter_store(dir: PathBuf) -> Result<CounterStore> {
    CounterStore::open(dir.join("counters")).context("cannot open counter store")
}

/// Validate a template without a render target: schema, invariants, and
/// defaults resolution (which catches un-sizable text elements).
fn check_template(template_json: &str) -> Result<(), CompileError> {
    let doc = zplgrid_core::parse_document_str(template_json)?;
    zplgrid_core::template::invariants::check(&doc)?;
    zplgrid_core::template::defaults::resolve(&doc)?;
    Ok(())
}

fn report_error(err: &anyhow::Error, json_output: bool) {
    if let Some(compile_err) = err.downcast_ref::<CompileError>() {
        if json_output {
            match serde_json::to_string(compile_err) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{compile_err}"),
            }
            return;
        }
        eprintln!("error: {compile_err}");
        return;
    }
    eprintln!("error: {err:#}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_parsing_splits_on_first_equals() {
        let vars = parse_vars(&["a=1".into(), "msg=x=y".into()]).unwrap();
        assert_eq!(vars["a"], "1");
        assert_eq!(vars["msg"], "x=y");
    }

    #[test]
    fn var_parsing_rejects_missing_equals() {
        assert!(parse_vars(&["oops".into()]).is_err());
    }

    #[test]
    fn check_accepts_valid_and_rejects_invalid() {
        let good = r#"{
            "schema_version": 1,
            "layout": {
                "kind": "leaf",
                "elements": [{"type": "text", "text": "x", "font_height_mm": 3}]
            }
        }"#;
        assert!(check_template(good).is_ok());

        let bad = r#"{"schema_version": 1, "layout": {"kind": "leaf", "elements": []}}"#;
        assert!(check_template(bad).is_err());
    }
}
