use std::path::PathBuf;

use blockduel_engine::BattleConfig;

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct PrintConfigArg {
    /// Config file to merge over the defaults before printing
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &PrintConfigArg) -> anyhow::Result<()> {
    let config = match &arg.config {
        Some(path) => util::read_config_file(path)?,
        None => BattleConfig::default(),
    };
    Output::save_json(&config, arg.output.clone())
}
