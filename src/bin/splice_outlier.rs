use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use splicing_outlier::count_table::{CatInference, CountTable};
use splicing_outlier::dataloader::{DataloaderOptions, SpliceOutlierDataloader};
use splicing_outlier::model::LinearSpliceModel;
use splicing_outlier::population::read_population;
use splicing_outlier::predict::{SpliceOutlier, BATCH_SIZE};
use splicing_outlier::result::{MAF_CUTOFF, MAX_NUM_SAMPLE};
use splicing_outlier::utils::CLIP_THRESHOLD;

#[derive(Parser, Debug)]
#[command(version, about = "Predict splicing outliers of genetic variants", long_about = None)]
struct Cli {
    /// path to the indexed reference genome
    #[arg(long, value_name = "FASTA")]
    fasta: PathBuf,

    /// path to the variants (VCF/BCF)
    #[arg(long, value_name = "VCF")]
    vcf: PathBuf,

    /// reference table of 5' splice sites
    #[arg(long = "ref-table5", value_name = "CSV")]
    ref_table5: Option<PathBuf>,

    /// reference table of 3' splice sites
    #[arg(long = "ref-table3", value_name = "CSV")]
    ref_table3: Option<PathBuf>,

    /// model weights (JSON)
    #[arg(long, value_name = "JSON")]
    model: PathBuf,

    /// output file of all predictions
    #[arg(short, long, value_name = "CSV")]
    output: PathBuf,

    /// number of variant/junction pairs per batch
    #[arg(long, default_value_t = BATCH_SIZE)]
    batch_size: usize,

    /// clip reference PSI to [t, 1 - t]
    #[arg(long, default_value_t = CLIP_THRESHOLD)]
    clip_threshold: f64,

    /// intronic bases of the sequence window
    #[arg(long, default_value_t = 100)]
    intron_overhang: usize,

    /// exonic bases of the sequence window
    #[arg(long, default_value_t = 100)]
    exon_overhang: usize,

    /// output file of the junction level aggregation
    #[arg(long, value_name = "CSV")]
    junction_out: Option<PathBuf>,

    /// output file of the splice-site level aggregation
    #[arg(long, value_name = "CSV")]
    splice_site_out: Option<PathBuf>,

    /// output file of the gene level aggregation
    #[arg(long, value_name = "CSV")]
    gene_out: Option<PathBuf>,

    /// split-read counts of a clinically accessible tissue
    #[arg(long, value_name = "CSV", requires = "tissue_cat")]
    count_cat: Option<PathBuf>,

    /// name of the clinically accessible tissue
    #[arg(long, requires = "count_cat")]
    tissue_cat: Option<String>,

    /// population minor allele frequencies
    #[arg(long, value_name = "CSV")]
    population: Option<PathBuf>,

    /// keep variants carried by at most this many samples
    #[arg(long)]
    max_num_sample: Option<usize>,

    /// maximal population MAF of kept variants
    #[arg(long, default_value_t = MAF_CUTOFF)]
    maf_cutoff: f64,

    /// hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Turn debugging information on
    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,
}

impl Cli {
    /// True if predictions are post-processed after prediction
    fn needs_result(&self) -> bool {
        self.junction_out.is_some()
            || self.splice_site_out.is_some()
            || self.gene_out.is_some()
            || self.count_cat.is_some()
            || self.population.is_some()
            || self.max_num_sample.is_some()
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut dataloader = SpliceOutlierDataloader::new(
        &cli.fasta,
        &cli.vcf,
        cli.ref_table5.clone().map(Into::into),
        cli.ref_table3.clone().map(Into::into),
        DataloaderOptions {
            intron_overhang: cli.intron_overhang,
            exon_overhang: cli.exon_overhang,
        },
    )?;
    let model = SpliceOutlier::new(
        LinearSpliceModel::from_json(&cli.model)?,
        Some(cli.clip_threshold),
    );
    let progress = !cli.no_progress;

    if !cli.needs_result() {
        let n_rows = model.predict_save(&mut dataloader, &cli.output, cli.batch_size, progress)?;
        info!("Wrote {} predictions", n_rows);
        return Ok(());
    }

    let mut result = model.predict_on_dataloader(&mut dataloader, cli.batch_size, progress)?;

    let population = match &cli.population {
        Some(path) => Some(read_population(path)?),
        None => None,
    };
    if let Some(population) = &population {
        result.add_maf(population);
    }
    if cli.population.is_some() || cli.max_num_sample.is_some() {
        result = result.filter_maf(
            cli.max_num_sample.unwrap_or(MAX_NUM_SAMPLE),
            population.as_ref(),
            cli.maf_cutoff,
        );
    }

    if let (Some(count_cat), Some(tissue)) = (&cli.count_cat, &cli.tissue_cat) {
        let cat = CatInference::new(CountTable::read_csv(count_cat)?, tissue)
            .with_clip_threshold(cli.clip_threshold);
        result.infer_cat(&cat)?;
    }

    result.write_csv(&cli.output)?;
    if let Some(path) = &cli.junction_out {
        info!("Writing junction level results to {}", path.display());
        result.write_junction_csv(path)?;
    }
    if let Some(path) = &cli.splice_site_out {
        info!("Writing splice-site level results to {}", path.display());
        result.write_splice_site_csv(path)?;
    }
    if let Some(path) = &cli.gene_out {
        info!("Writing gene level results to {}", path.display());
        result.write_gene_csv(path)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let start = std::time::Instant::now();
    let cli = Cli::parse();

    let log_level = match cli.debug {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::builder().filter_level(log_level).init();

    info!("{:?}", cli);
    run(&cli)?;

    let elapsed = start.elapsed();
    info!("elapsed time: {:.2?}", elapsed);
    Ok(())
}
