//! sbm: fit a polynomial surrogate to a training table and evaluate it on another table.
use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};
use polysurrogate::{
    selection::parse_degree, table, table::Table, Aggregation, CrossValidation, DegreeRange,
    SingularPolicy, SurrogateModel,
};

#[derive(Parser)]
#[command(name = "sbm")]
#[command(about = "Surrogate-based modeling with cross-validated polynomial degree selection")]
#[command(version)]
struct Cli {
    /// Training table (CSV with a header row)
    #[arg(short = 't', long)]
    training_data: PathBuf,

    /// Evaluation table (CSV with the training input columns)
    #[arg(short = 'e', long)]
    evaluation_data: PathBuf,

    /// Where to write the evaluation table with predictions appended
    #[arg(short = 'o', long)]
    output_data: PathBuf,

    /// Number of cross-validation epochs
    #[arg(long, default_value_t = 2)]
    epochs: usize,

    /// Number of cross-validation folds
    #[arg(long, default_value_t = 10)]
    kfolds: usize,

    /// Name of the response column in the training table
    #[arg(long, default_value = "z")]
    response: String,

    /// Name of the prediction column in the output table [default: same as --response]
    #[arg(long)]
    output_column: Option<String>,

    /// Lowest candidate degree
    #[arg(long, default_value = "1", value_parser = parse_degree, allow_hyphen_values = true)]
    min_degree: usize,

    /// Highest candidate degree
    #[arg(long, default_value = "9", value_parser = parse_degree, allow_hyphen_values = true)]
    max_degree: usize,

    /// Random seed for reproducible fold partitions
    #[arg(long)]
    seed: Option<u64>,

    /// What to do when a candidate degree cannot be fitted
    #[arg(long, value_enum, default_value_t = PolicyArg::Skip)]
    singular_policy: PolicyArg,

    /// How fold errors are combined
    #[arg(long, value_enum, default_value_t = AggregationArg::Sum)]
    aggregation: AggregationArg,

    /// Give up on degree selection after this many seconds
    #[arg(long)]
    time_limit: Option<f64>,

    /// Print a JSON summary of the model to stdout
    #[arg(long)]
    properties: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Reject the degree and keep searching
    Skip,
    /// Stop with an error
    Abort,
}

#[derive(Clone, Copy, ValueEnum)]
enum AggregationArg {
    /// Sum of fold errors
    Sum,
    /// Fold errors divided by fold size, then summed
    Mean,
}

impl Cli {
    fn cross_validation(&self) -> Result<CrossValidation, Box<dyn std::error::Error>> {
        let mut cv = CrossValidation::default()
            .with_epochs(self.epochs)
            .with_folds(self.kfolds)
            .with_degrees(DegreeRange::new(self.min_degree, self.max_degree))
            .with_random(self.seed.into())
            .with_singular_policy(match self.singular_policy {
                PolicyArg::Skip => SingularPolicy::SkipDegree,
                PolicyArg::Abort => SingularPolicy::Abort,
            })
            .with_aggregation(match self.aggregation {
                AggregationArg::Sum => Aggregation::Sum,
                AggregationArg::Mean => Aggregation::MeanPerObservation,
            });

        if let Some(seconds) = self.time_limit {
            cv = cv.with_time_limit(Duration::try_from_secs_f64(seconds)?);
        }

        Ok(cv)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cv = cli.cross_validation()?;

    let training = Table::read_csv(&cli.training_data)?;
    let (inputs, observations) = training.split_response(&cli.response)?;
    log::info!(
        "training on {} rows, inputs: {}",
        observations.len(),
        inputs.join(", ")
    );

    let model = SurrogateModel::construct(&observations, &cv)?;
    log::info!("{model}");

    let evaluation = Table::read_csv(&cli.evaluation_data)?;
    let evaluation = match evaluation.select_columns(&inputs) {
        Ok(table) => table,
        Err(e) if evaluation.width() == inputs.len() => {
            log::warn!("{e}; matching evaluation columns by position instead");
            evaluation
        }
        Err(e) => return Err(e.into()),
    };

    let output_column = cli.output_column.as_deref().unwrap_or(&cli.response);
    table::evaluate_model(&evaluation, &model, output_column, &cli.output_data)?;

    if cli.properties {
        let properties = model.properties(&observations)?;
        println!("{}", serde_json::to_string_pretty(&properties)?);
    }

    Ok(())
}
