//! Regnet CLI: infer interaction networks and simulate perturbations
//!
//! Matrices are read from JSON files. Results go to stdout as a table, JSON
//! or CSV; logs go to stderr (filter with `RUST_LOG`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use regnet::{
    build_view, infer_with_diagnostics, run_full_atlas, run_perturbation_atlas, run_pipeline,
    run_stability_batch, simulate, ExpressionMatrix, InferenceConfig, InhibitionSet,
    InteractionMatrix, PerturbationAtlas, PipelineConfig, PipelineReport, SeedPolicy,
    SimulationParams,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "regnet", version, about = "Gene regulatory network inference and simulation")]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Base seed for simulation runs
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(clap::Args)]
struct SimulationArgs {
    /// Recorded time steps
    #[arg(long, default_value_t = 100)]
    steps: usize,

    /// Decay rate λ
    #[arg(long, default_value_t = 1.0)]
    decay: f64,

    /// Euler step size
    #[arg(long, default_value_t = 0.1)]
    dt: f64,
}

impl SimulationArgs {
    fn params(&self) -> SimulationParams {
        SimulationParams {
            decay_rate: self.decay,
            dt: self.dt,
            time_steps: self.steps,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Infer an interaction network from an expression matrix
    Infer {
        /// Expression JSON: {"genes": [...], "samples": [...], "values": [[...]]}
        #[arg(long)]
        expression: PathBuf,

        /// Cross-validation folds
        #[arg(long, default_value_t = 5)]
        folds: usize,

        /// Write the interaction matrix JSON here
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Simulate the network, optionally with inhibited genes
    Simulate {
        /// Interaction JSON: {"genes": [...], "weights": [[...]]}
        #[arg(long)]
        network: PathBuf,

        /// Gene to hold at zero (repeatable)
        #[arg(long = "inhibit")]
        inhibit: Vec<String>,

        #[command(flatten)]
        sim: SimulationArgs,
    },
    /// Inhibit each gene in turn and report final states
    Atlas {
        #[arg(long)]
        network: PathBuf,

        /// Restrict the atlas to these genes (repeatable); all genes when omitted
        #[arg(long = "gene")]
        genes: Vec<String>,

        #[command(flatten)]
        sim: SimulationArgs,
    },
    /// Replicate uninhibited runs and rank genes by variability
    Stability {
        #[arg(long)]
        network: PathBuf,

        #[arg(long, default_value_t = 10)]
        replicates: usize,

        /// Rows to show
        #[arg(long, default_value_t = 20)]
        top: usize,

        #[command(flatten)]
        sim: SimulationArgs,
    },
    /// Inference, stability batch and perturbation atlas in one run
    Pipeline {
        #[arg(long)]
        expression: PathBuf,

        /// YAML or JSON pipeline configuration; its seed replaces --seed
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the full report JSON here
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Infer {
            expression,
            folds,
            output,
        } => run_infer(&expression, folds, output.as_deref(), cli.format),
        Commands::Simulate {
            network,
            inhibit,
            sim,
        } => run_simulate(&network, &inhibit, &sim, cli.seed, cli.format),
        Commands::Atlas {
            network,
            genes,
            sim,
        } => run_atlas(&network, &genes, &sim, cli.seed, cli.format),
        Commands::Stability {
            network,
            replicates,
            top,
            sim,
        } => run_stability(&network, replicates, top, &sim, cli.seed, cli.format),
        Commands::Pipeline {
            expression,
            config,
            output,
        } => run_full_pipeline(
            &expression,
            config.as_deref(),
            output.as_deref(),
            cli.seed,
            cli.format,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), "Wrote output");
    Ok(())
}

fn run_infer(
    expression: &Path,
    folds: usize,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let expression: ExpressionMatrix = read_json(expression)?;
    let config = InferenceConfig {
        folds,
        ..InferenceConfig::default()
    };
    let fit = infer_with_diagnostics(&expression, &config)?;
    tracing::info!(edges = fit.matrix.nonzero_count(), "Network inferred");

    if let Some(path) = output {
        write_json(path, &fit.matrix)?;
    }

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&fit)?);
        return Ok(());
    }

    let genes = fit.matrix.genes();
    let weights = fit.matrix.weights();
    let mut rows = Vec::new();
    for (i, target) in genes.iter().enumerate() {
        for (j, regulator) in genes.iter().enumerate() {
            let w = weights[[i, j]];
            if w != 0.0 {
                rows.push(vec![target.clone(), regulator.clone(), format_float(w)]);
            }
        }
    }
    print_rows(format, &["target", "regulator", "weight"], &rows);
    if let OutputFormat::Table = format {
        println!(
            "{} non-zero interaction(s) among {} gene(s)",
            fit.matrix.nonzero_count(),
            genes.len()
        );
    }
    Ok(())
}

fn run_simulate(
    network: &Path,
    inhibit: &[String],
    sim: &SimulationArgs,
    seed: u64,
    format: OutputFormat,
) -> Result<()> {
    let matrix: InteractionMatrix = read_json(network)?;
    let view = build_view(&matrix)?;
    let inhibited = InhibitionSet::from_genes(&view, inhibit)?;
    let mut rng = SeedPolicy::new(seed).rng_for(0);
    let trajectory = simulate(&view, &inhibited, None, &sim.params(), &mut rng)?;

    match format {
        OutputFormat::Json => {
            let out = serde_json::json!({
                "genes": view.genes(),
                "inhibited": inhibit,
                "trajectory": trajectory,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => {
            let first = trajectory.state(0);
            let last = trajectory.final_state();
            let rows: Vec<Vec<String>> = view
                .genes()
                .iter()
                .enumerate()
                .map(|(i, gene)| {
                    vec![
                        gene.clone(),
                        inhibited.contains(i).to_string(),
                        format_float(first[i]),
                        format_float(last[i]),
                    ]
                })
                .collect();
            print_rows(format, &["gene", "inhibited", "first_step", "final"], &rows);
        }
    }
    Ok(())
}

fn run_atlas(
    network: &Path,
    genes: &[String],
    sim: &SimulationArgs,
    seed: u64,
    format: OutputFormat,
) -> Result<()> {
    let matrix: InteractionMatrix = read_json(network)?;
    let view = build_view(&matrix)?;
    let seeds = SeedPolicy::new(seed);
    let atlas = if genes.is_empty() {
        run_full_atlas(&view, &sim.params(), &seeds)?
    } else {
        run_perturbation_atlas(&view, genes, &sim.params(), &seeds)?
    };
    print_atlas(&atlas, format)
}

fn print_atlas(atlas: &PerturbationAtlas, format: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        let runs: serde_json::Map<String, serde_json::Value> = atlas
            .iter()
            .map(|(gene, trajectory)| -> Result<(String, serde_json::Value)> {
                Ok((gene.clone(), serde_json::to_value(trajectory)?))
            })
            .collect::<Result<_>>()?;
        let out = serde_json::json!({ "genes": atlas.genes, "runs": runs });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut header = vec!["inhibited".to_string()];
    header.extend(atlas.genes.iter().cloned());
    let rows: Vec<Vec<String>> = atlas
        .iter()
        .map(|(gene, trajectory)| {
            let mut row = vec![gene.clone()];
            row.extend(trajectory.final_state().iter().map(|&x| format_float(x)));
            row
        })
        .collect();
    let header: Vec<&str> = header.iter().map(String::as_str).collect();
    print_rows(format, &header, &rows);
    Ok(())
}

fn run_stability(
    network: &Path,
    replicates: usize,
    top: usize,
    sim: &SimulationArgs,
    seed: u64,
    format: OutputFormat,
) -> Result<()> {
    let matrix: InteractionMatrix = read_json(network)?;
    let view = build_view(&matrix)?;
    let summary = run_stability_batch(&view, replicates, &sim.params(), &SeedPolicy::new(seed))?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = summary
        .top(top)
        .iter()
        .map(|g| {
            vec![
                g.gene.clone(),
                format_float(g.mean),
                format_float(g.std_dev),
                format_float(g.cv),
            ]
        })
        .collect();
    print_rows(format, &["gene", "mean", "std_dev", "cv"], &rows);
    Ok(())
}

fn run_full_pipeline(
    expression: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    seed: u64,
    format: OutputFormat,
) -> Result<()> {
    let expression: ExpressionMatrix = read_json(expression)?;
    let config = match config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig {
            seed,
            ..PipelineConfig::default()
        },
    };
    let report = run_pipeline(&expression, &config)?;
    if let Some(path) = output {
        write_json(path, &report)?;
    }

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_report(&report, config.stability.top, format);
    Ok(())
}

fn print_report(report: &PipelineReport, top: usize, format: OutputFormat) {
    let rows: Vec<Vec<String>> = report
        .stability
        .top(top)
        .iter()
        .map(|g| {
            let fit = report.fits.iter().find(|f| f.gene == g.gene);
            let strongest = report
                .knockdown
                .as_ref()
                .and_then(|k| k.strongest_effect(&g.gene))
                .map(|(gene, delta)| format!("{} ({})", gene, format_float(delta)))
                .unwrap_or_default();
            vec![
                g.gene.clone(),
                fit.map(|f| f.nonzero.to_string()).unwrap_or_default(),
                fit.map(|f| format_float(f.alpha)).unwrap_or_default(),
                format_float(g.cv),
                strongest,
            ]
        })
        .collect();
    print_rows(format, &["gene", "regulators", "alpha", "cv", "strongest_knockdown_effect"], &rows);
    if let OutputFormat::Table = format {
        println!(
            "{} gene(s), {} non-zero interaction(s), {} replicate(s)",
            report.matrix.n_genes(),
            report.edge_count(),
            report.stability.replicates
        );
    }
}

fn print_rows(format: OutputFormat, header: &[&str], rows: &[Vec<String>]) {
    match format {
        OutputFormat::Csv => {
            println!("{}", csv_line(header));
            for row in rows {
                println!("{}", csv_line(row.as_slice()));
            }
        }
        _ => {
            if rows.is_empty() {
                println!("(no results)");
                return;
            }
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(header);
            for row in rows {
                table.add_row(row);
            }
            println!("{}", table);
        }
    }
}

fn format_float(v: f64) -> String {
    if v.is_finite() {
        format!("{:.6}", v)
    } else {
        v.to_string()
    }
}

fn csv_line<S: AsRef<str>>(cells: &[S]) -> String {
    cells
        .iter()
        .map(|c| format_csv_value(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

fn format_csv_value(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
