use std::path::PathBuf;

use clt_engine::ExperimentConfig;

use crate::util::Output;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct InitConfigArg {
    /// Output file path (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &InitConfigArg) -> anyhow::Result<()> {
    let mut output = Output::create(arg.output.as_deref())?;
    output.write_json(&ExperimentConfig::default())?;
    if output.path().is_some() {
        eprintln!("Default configuration written to {output}");
    }
    Ok(())
}
