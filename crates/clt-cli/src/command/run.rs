use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use clt_engine::{
    Demonstration, DemonstrationResult, ExperimentConfig, OutOfRangePolicy, PdfPreset, PdfSpec,
    Summary,
};
use clt_stats::histogram::Histogram;
use log::debug;

use crate::{
    schema::report::Report,
    util::{self, Output},
};

const MAX_BAR_WIDTH: u64 = 50;

#[derive(Debug, Clone, Args)]
pub(crate) struct RunArg {
    /// Experiment configuration JSON file; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    /// Built-in density to sample
    #[arg(long)]
    preset: Option<PdfPreset>,
    /// Lower bound of the domain
    #[arg(long, allow_negative_numbers = true)]
    xmin: Option<f64>,
    /// Upper bound of the domain
    #[arg(long, allow_negative_numbers = true)]
    xmax: Option<f64>,
    /// Points in the discrete CDF
    #[arg(long)]
    numpoints: Option<usize>,
    /// Samples averaged into each batch mean
    #[arg(long)]
    iterations: Option<usize>,
    /// Number of batch means to collect
    #[arg(long)]
    means: Option<usize>,
    /// Seed of the pseudorandom generator (any 64-bit integer)
    #[arg(long, allow_negative_numbers = true)]
    seed: Option<i64>,
    /// Handling of uniform draws outside the CDF range (redraw or clamp)
    #[arg(long)]
    policy: Option<OutOfRangePolicy>,
    /// Worker threads
    #[arg(long)]
    threads: Option<usize>,
    /// Bins in the printed histogram of batch means
    #[arg(long, default_value_t = 40)]
    bins: usize,
    /// Write a JSON report with the curves and batch means
    #[arg(long)]
    output: Option<PathBuf>,
    /// Write the discrete CDF as CSV
    #[arg(long)]
    cdf_csv: Option<PathBuf>,
    /// Write the normalized PDF, sampled on the CDF grid, as CSV
    #[arg(long)]
    pdf_csv: Option<PathBuf>,
}

impl Default for RunArg {
    fn default() -> Self {
        Self {
            config: None,
            preset: None,
            xmin: None,
            xmax: None,
            numpoints: None,
            iterations: None,
            means: None,
            seed: None,
            policy: None,
            threads: None,
            bins: 40,
            output: None,
            cdf_csv: None,
            pdf_csv: None,
        }
    }
}

impl RunArg {
    fn experiment_config(&self) -> anyhow::Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => util::read_json_file("experiment config", path)?,
            None => ExperimentConfig::default(),
        };
        if let Some(preset) = self.preset {
            config.pdf = PdfSpec::Preset(preset);
        }
        let overrides = [
            (&mut config.numpoints, self.numpoints),
            (&mut config.num_iterations, self.iterations),
            (&mut config.num_means, self.means),
            (&mut config.threads, self.threads),
        ];
        for (field, value) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(xmin) = self.xmin {
            config.xmin = xmin;
        }
        if let Some(xmax) = self.xmax {
            config.xmax = xmax;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(policy) = self.policy {
            config.out_of_range = policy;
        }
        Ok(config)
    }
}

pub(crate) fn run(arg: &RunArg) -> anyhow::Result<()> {
    anyhow::ensure!(arg.bins > 0, "--bins must be at least 1");
    let config = arg.experiment_config()?;
    debug!("effective configuration: {config:?}");

    eprintln!(
        "Sampling {} on [{}, {}]...",
        config.pdf, config.xmin, config.xmax
    );
    let result = Demonstration::run(&config).context("Failed to run the demonstration")?;

    let summary = result.summary();
    print_statistics(&summary);
    println!();
    print_histogram(&result.empirical.histogram(arg.bins, None));
    print_out_of_range(&result);

    if let Some(path) = &arg.cdf_csv {
        let mut output = Output::create(Some(path.as_path()))?;
        output.write_csv(["x", "y"], result.cdf.points().map(|(x, y)| [x, y]))?;
        eprintln!("CDF saved to {output}");
    }
    if let Some(path) = &arg.pdf_csv {
        let mut output = Output::create(Some(path.as_path()))?;
        let rows = result.cdf.xs().iter().map(|&x| [x, result.pdf.eval(x)]);
        output.write_csv(["x", "pdf"], rows)?;
        eprintln!("PDF saved to {output}");
    }
    if let Some(path) = &arg.output {
        let mut output = Output::create(Some(path.as_path()))?;
        output.write_json(&Report::new(config, &result))?;
        eprintln!("Report saved to {output}");
    }

    Ok(())
}

fn print_statistics(summary: &Summary) {
    println!("STATISTICS");
    println!("{:<8} {:>14} {:>14}", "", "Predicted", "Experimental");
    println!("{}", "-".repeat(38));
    println!(
        "{:<8} {:>14.6} {:>14.6}",
        "Mean", summary.predicted_mean, summary.empirical_mean
    );
    println!(
        "{:<8} {:>14.6} {:>14.6}",
        "Stdev", summary.predicted_std_dev, summary.empirical_std_dev
    );
}

fn print_histogram(histogram: &Histogram) {
    println!("Distribution of batch means");
    let max_count = histogram.max_count().max(1);
    for bin in &histogram.bins {
        let bar_width = usize::try_from(bin.count * MAX_BAR_WIDTH / max_count).unwrap_or(0);
        println!(
            "{:>12.4} | {:<6} {}",
            bin.center(),
            bin.count,
            "#".repeat(bar_width)
        );
    }
}

fn print_out_of_range(result: &DemonstrationResult) {
    let counts = result.empirical.out_of_range();
    if counts.total() == 0 {
        return;
    }
    let draws = result.empirical.len() * result.empirical.num_iterations();
    eprintln!(
        "{} uniform draws fell outside the CDF range ({} below, {} above) over {draws} samples",
        counts.total(),
        counts.below,
        counts.above,
    );
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use clap::Parser as _;

    use super::*;

    #[derive(Debug, clap::Parser)]
    struct TestArgs {
        #[clap(flatten)]
        run: RunArg,
    }

    fn parse(args: &[&str]) -> RunArg {
        TestArgs::parse_from(std::iter::once("test").chain(args.iter().copied())).run
    }

    #[test]
    fn test_defaults_match_config_defaults() {
        let arg = parse(&[]);
        assert_eq!(arg.bins, RunArg::default().bins);
        assert_eq!(arg.experiment_config().unwrap(), ExperimentConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let arg = parse(&[
            "--preset",
            "parabolic",
            "--xmin",
            "-2",
            "--xmax",
            "3",
            "--means",
            "50",
            "--iterations",
            "7",
            "--seed",
            "99",
            "--policy",
            "clamp",
            "--threads",
            "2",
        ]);
        let config = arg.experiment_config().unwrap();
        assert_eq!(config.pdf, PdfSpec::Preset(PdfPreset::Parabolic));
        assert_eq!(config.xmin, -2.0);
        assert_eq!(config.xmax, 3.0);
        assert_eq!(config.num_means, 50);
        assert_eq!(config.num_iterations, 7);
        assert_eq!(config.seed, 99);
        assert_eq!(config.out_of_range, OutOfRangePolicy::Clamp);
        assert_eq!(config.threads, 2);
        assert_eq!(config.numpoints, 1000);
    }

    #[test]
    fn test_config_file_then_override() {
        let path = std::env::temp_dir().join(format!("clt-run-config-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, r#"{{"pdf": {{"preset": "step"}}, "num_means": 123, "seed": 5}}"#).unwrap();
        drop(file);

        let arg = parse(&["--config", path.to_str().unwrap(), "--seed", "6"]);
        let config = arg.experiment_config().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.pdf, PdfSpec::Preset(PdfPreset::Step));
        assert_eq!(config.num_means, 123);
        assert_eq!(config.seed, 6);
    }

    #[test]
    fn test_negative_seed() {
        let config = parse(&["--seed", "-5"]).experiment_config().unwrap();
        assert_eq!(config.seed, -5);
        assert_eq!(config.rng_seed(), 5_u64.wrapping_neg());
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let result = TestArgs::try_parse_from(["test", "--preset", "cauchy"]);
        assert!(result.is_err());
    }
}
