use splicing_outlier::count_table::{CatInference, CountTable};
use splicing_outlier::dataloader::{DataloaderOptions, SpliceOutlierDataloader};
use splicing_outlier::model::LinearSpliceModel;
use splicing_outlier::models::EventType;
use splicing_outlier::population::read_population;
use splicing_outlier::predict::SpliceOutlier;
use splicing_outlier::result::SplicingOutlierResult;
use splicing_outlier::utils::errors::Error;

const FASTA: &str = "tests/data/genome.fa";
const VCF: &str = "tests/data/variants.vcf";
const REF_TABLE5: &str = "tests/data/ref_table5.csv";
const REF_TABLE3: &str = "tests/data/ref_table3.csv";
const WEIGHTS: &str = "tests/data/weights.json";

fn options() -> DataloaderOptions {
    DataloaderOptions {
        intron_overhang: 60,
        exon_overhang: 10,
    }
}

fn dataloader() -> SpliceOutlierDataloader {
    SpliceOutlierDataloader::new(
        FASTA,
        VCF,
        Some(REF_TABLE5.into()),
        Some(REF_TABLE3.into()),
        options(),
    )
    .unwrap()
}

fn predictor() -> SpliceOutlier<LinearSpliceModel> {
    SpliceOutlier::new(LinearSpliceModel::from_json(WEIGHTS).unwrap(), None)
}

fn predict(batch_size: usize) -> SplicingOutlierResult {
    predictor()
        .predict_on_dataloader(&mut dataloader(), batch_size, false)
        .unwrap()
}

#[test]
fn test_predict_on_dataloader() {
    let result = predict(3);
    assert!(result.has_samples());

    let pairs: Vec<(EventType, &str, &str)> = result
        .rows()
        .iter()
        .map(|r| (r.event_type, r.junction.as_str(), r.variant.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            (EventType::Psi5, "chr1:101-200:+", "chr1:105:A>T"),
            (EventType::Psi5, "chr1:101-200:+", "chr1:151:G>T"),
            (EventType::Psi5, "chr1:101-300:+", "chr1:105:A>T"),
            (EventType::Psi5, "chr1:101-300:+", "chr1:151:G>T"),
            (EventType::Psi5, "chr2:150-250:-", "chr2:255:G>A"),
            (EventType::Psi3, "chr1:101-200:+", "chr1:151:G>T"),
            (EventType::Psi3, "chr1:101-200:+", "chr1:194:C>G"),
            (EventType::Psi3, "chr1:101-300:+", "chr1:295:GTA>G"),
        ]
    );

    let first = &result.rows()[0];
    assert_eq!(first.ref_psi, 0.8);
    assert_eq!(first.gene_id.as_deref(), Some("ENSG01"));
    assert_eq!(first.gene_name.as_deref(), Some("GENE1"));
    assert_eq!(first.splice_site.as_deref(), Some("chr1:101:+"));
    assert_eq!(first.samples.as_deref(), Some("S1"));
    assert_eq!(first.k, Some(80));
    assert!((first.maf - 0.1).abs() < 1e-6);

    // the variant at 105 changes the donor sequence
    assert_ne!(first.ref_donor, first.alt_donor);
    assert!(first.delta_logit_psi != 0.0);
    assert_eq!(first.delta_logit_psi > 0.0, first.delta_psi > 0.0);

    let psi3 = &result.rows()[6];
    assert_eq!(psi3.splice_site.as_deref(), Some("chr1:200:+"));
    assert!((psi3.maf - 0.3).abs() < 1e-6);
}

#[test]
fn test_batch_size_does_not_change_predictions() {
    let small = predict(1);
    let large = predict(512);
    assert_eq!(small.rows(), large.rows());
}

#[test]
fn test_aggregation() {
    let result = predict(4);
    // 105: S1, 151: S1;S2, 194: S3, 295: S2, chr2:255: S3
    assert_eq!(result.junction().len(), 11);
    assert_eq!(result.splice_site().len(), 7);

    let gene: Vec<(&str, &str)> = result
        .gene()
        .iter()
        .map(|r| {
            (
                r.prediction.gene_id.as_deref().unwrap(),
                r.sample.as_deref().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        gene,
        vec![
            ("ENSG01", "S1"),
            ("ENSG01", "S2"),
            ("ENSG01", "S3"),
            ("ENSG02", "S3"),
        ]
    );

    for row in result.gene() {
        let gene_id = row.prediction.gene_id.as_deref();
        let max = result
            .junction()
            .iter()
            .filter(|r| r.prediction.gene_id.as_deref() == gene_id && r.sample == row.sample)
            .map(|r| r.prediction.delta_psi.abs())
            .fold(0.0, f64::max);
        assert_eq!(row.prediction.delta_psi.abs(), max);
    }
}

#[test]
fn test_predict_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("predictions.csv");
    let n_rows = predictor()
        .predict_save(&mut dataloader(), &path, 2, false)
        .unwrap();
    assert_eq!(n_rows, 8);

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("variant,junction").count(), 1);

    let saved = SplicingOutlierResult::read_csv(&path).unwrap();
    assert!(saved.has_samples());
    assert_eq!(saved.rows(), predict(512).rows());
}

#[test]
fn test_filter_maf() {
    let mut result = predict(512);
    let population = read_population("tests/data/population.csv").unwrap();
    result.add_maf(&population);
    assert_eq!(result.rows()[0].maf, 0.0005);
    assert_eq!(result.rows()[4].maf, 0.0);

    // chr1:151:G>T is too frequent
    let rare = result.filter_maf(2, Some(&population), 0.001);
    assert_eq!(rare.len(), 5);
    assert!(rare.rows().iter().all(|r| r.variant != "chr1:151:G>T"));

    // chr1:151:G>T is carried by two samples
    let private = result.filter_maf(1, None, 0.001);
    assert_eq!(private.len(), 5);
}

#[test]
fn test_infer_cat() {
    let mut result = predict(512);
    let ct = CountTable::read_csv("tests/data/counts_cat.csv").unwrap();
    let cat = CatInference::new(ct.filter_event5(&["chr1:101-200:+"]), "blood");
    result.infer_cat(&cat).unwrap();

    let row = &result.junction()[0];
    assert_eq!(row.sample.as_deref(), Some("S1"));
    let ann = row.cat.as_ref().unwrap();
    assert_eq!(ann.tissue_cat, "blood");
    assert_eq!(ann.count_cat, Some(12));
    assert_eq!(ann.n_cat, Some(20));
    assert_eq!(ann.psi_cat, Some(0.6));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junction.csv");
    result.write_junction_csv(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.ends_with(",sample,tissue_cat,count_cat,n_cat,psi_cat,ref_psi_cat,delta_logit_psi_cat,delta_psi_cat"));
    assert_eq!(text.lines().count(), 12);
}

#[test]
fn test_missing_ref_tables() {
    let res = SpliceOutlierDataloader::new(FASTA, VCF, None, None, options());
    match res {
        Err(err @ Error::MissingRefTable) => assert_eq!(
            err.to_string(),
            "`ref_table5` and `ref_table3` cannot be both None"
        ),
        _ => panic!("expected MissingRefTable"),
    }
}

#[test]
fn test_single_ref_table() {
    let mut dl =
        SpliceOutlierDataloader::new(FASTA, VCF, None, Some(REF_TABLE3.into()), options()).unwrap();
    let result = predictor().predict_on_dataloader(&mut dl, 512, false).unwrap();
    assert_eq!(result.len(), 3);
    assert!(result
        .rows()
        .iter()
        .all(|r| r.event_type == EventType::Psi3));
}
