use neta_core::db::{
    CatalogDb, CatalogManifest, CountBucket, DatasetFilter, DatasetRecord, GeneExpressionRecord,
    GeneRecord, PageRequest, SampleRecord,
};

fn dataset(id: i64, geo: &str, tissue: &str, tumor: &str, year: Option<i64>, n: i64) -> DatasetRecord {
    DatasetRecord {
        id: Some(id),
        title: Some(format!("{tumor} cohort {geo}")),
        tissue_type: Some(tissue.to_string()),
        tumor_type: Some(tumor.to_string()),
        platform: Some(if id % 2 == 0 { "RNA-seq" } else { "Affymetrix" }.to_string()),
        data_source: Some("GEO".to_string()),
        publication_year: year,
        n_samples: Some(n),
        ..DatasetRecord::new(geo)
    }
}

fn seeded_db() -> CatalogDb {
    let db = CatalogDb::open_in_memory().unwrap();
    let manifest = CatalogManifest {
        datasets: vec![
            dataset(1, "GSE1001", "brain", "glioma", Some(2018), 40),
            dataset(2, "GSE1002", "brain", "glioblastoma", Some(2020), 120),
            dataset(3, "GSE1003", "adrenal", "neuroblastoma", Some(2020), 60),
            dataset(4, "GSE1004", "lung", "carcinoid", None, 15),
            DatasetRecord {
                status: Some("retired".into()),
                ..dataset(5, "GSE1005", "brain", "glioma", Some(2015), 30)
            },
        ],
        samples: vec![SampleRecord {
            dataset_id: 1,
            sample_id: "S1".into(),
            age: Some(54),
            quality_score: Some(0.93),
            ..Default::default()
        }],
        genes: vec![
            GeneRecord {
                gene_name: Some("tumor protein p53".into()),
                ..GeneRecord::new("ENSG00000141510", Some("TP53"))
            },
            GeneRecord::new("ENSG00000146648", Some("EGFR")),
            GeneRecord {
                gene_name: Some("MYCN proto-oncogene".into()),
                ..GeneRecord::new("ENSG00000134323", Some("MYCN"))
            },
        ],
        expressions: vec![
            GeneExpressionRecord {
                dataset_id: 1,
                sample_id: "S1".into(),
                gene_id: "ENSG00000141510".into(),
                gene_symbol: Some("TP53".into()),
                expression_value: Some(12.5),
                is_expressed: Some(true),
                ..Default::default()
            },
            GeneExpressionRecord {
                dataset_id: 3,
                sample_id: "S9".into(),
                gene_id: "ENSG00000134323".into(),
                expression_value: Some(88.0),
                ..Default::default()
            },
            GeneExpressionRecord {
                dataset_id: 5,
                sample_id: "S7".into(),
                gene_id: "ENSG00000146648".into(),
                ..Default::default()
            },
        ],
    };
    let summary = db.import_manifest(&manifest).expect("import");
    assert_eq!(summary.datasets, 5);
    assert_eq!(summary.expressions, 3);
    db
}

#[test]
fn list_datasets_paginates_by_id() {
    let db = seeded_db();
    let page = db.list_datasets(PageRequest::new(Some(2), Some(2))).unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.pages, 3);
    assert_eq!(page.current_page, 2);
    assert_eq!(page.datasets.iter().map(|d| d.id).collect::<Vec<_>>(), vec![3, 4]);
}

#[test]
fn out_of_range_page_is_empty_not_error() {
    let db = seeded_db();
    let page = db.list_datasets(PageRequest::new(Some(9), Some(2))).unwrap();
    assert!(page.datasets.is_empty());
    assert_eq!(page.total, 5);
    assert_eq!(page.current_page, 9);
}

#[test]
fn empty_catalog_has_zero_pages() {
    let db = CatalogDb::open_in_memory().unwrap();
    let page = db.list_datasets(PageRequest::new(None, None)).unwrap();
    assert_eq!(page.total, 0);
    assert_eq!(page.pages, 0);
    assert!(page.datasets.is_empty());
}

#[test]
fn get_dataset_returns_full_record() {
    let db = seeded_db();
    let record = db.get_dataset(3).unwrap().expect("dataset 3");
    assert_eq!(record.geo_id, "GSE1003");
    assert_eq!(record.platform.as_deref(), Some("Affymetrix"));
    assert_eq!(record.status.as_deref(), Some("active"));
    assert!(db.get_dataset(99).unwrap().is_none());
}

#[test]
fn filters_combine_with_and() {
    let db = seeded_db();
    let filter = DatasetFilter { tissue_type: Some("brain".into()), ..Default::default() };
    let page = db.filter_datasets(&filter, PageRequest::new(None, None)).unwrap();
    assert_eq!(page.total, 3);

    let filter = DatasetFilter {
        tissue_type: Some("brain".into()),
        year_from: Some(2018),
        year_to: Some(2019),
        ..Default::default()
    };
    let page = db.filter_datasets(&filter, PageRequest::new(None, None)).unwrap();
    assert_eq!(page.datasets.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1]);

    let filter = DatasetFilter { min_samples: Some(50), ..Default::default() };
    let page = db.filter_datasets(&filter, PageRequest::new(None, None)).unwrap();
    assert_eq!(page.datasets.iter().map(|d| d.id).collect::<Vec<_>>(), vec![2, 3]);

    let filter = DatasetFilter { platform: Some("RNA-seq".into()), ..Default::default() };
    let page = db.filter_datasets(&filter, PageRequest::new(None, None)).unwrap();
    assert_eq!(page.datasets.iter().map(|d| d.id).collect::<Vec<_>>(), vec![2, 4]);
}

#[test]
fn search_matches_case_insensitive_substrings() {
    let db = seeded_db();
    let hits = db.search_datasets("GLIO", None).unwrap();
    assert_eq!(hits.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 2, 5]);
    assert_eq!(db.search_datasets("gse1004", None).unwrap().len(), 1);
    assert_eq!(db.search_datasets("glio", Some(1)).unwrap().len(), 1);
    assert!(db.search_datasets("%", None).unwrap().is_empty());
}

#[test]
fn gene_search_covers_symbol_and_name() {
    let db = seeded_db();
    let by_symbol = db.search_genes("egf", None).unwrap();
    assert_eq!(by_symbol.len(), 1);
    assert_eq!(by_symbol[0].gene_symbol.as_deref(), Some("EGFR"));

    let by_name = db.search_genes("proto-onco", None).unwrap();
    assert_eq!(by_name[0].gene_id, "ENSG00000134323");

    assert_eq!(db.search_genes("n", Some(1)).unwrap().len(), 1);
}

#[test]
fn gene_search_honors_limit_as_given() {
    let db = seeded_db();
    assert!(db.search_genes("", Some(0)).unwrap().is_empty());
    assert_eq!(db.search_genes("", Some(500)).unwrap().len(), 3);
    assert_eq!(db.search_genes("", None).unwrap().len(), 3);
}

#[test]
fn overview_statistics_group_counts() {
    let db = seeded_db();
    let stats = db.statistics().unwrap();
    assert_eq!(stats.total_datasets, 5);
    assert_eq!(stats.total_samples, 1);
    assert_eq!(stats.total_genes, 3);
    assert_eq!(stats.total_expressions, 3);
    assert_eq!(stats.tissue_types[0], CountBucket { name: Some("brain".into()), count: 3 });
    // Null publication years are left out.
    let years: i64 = stats.publication_years.iter().map(|b| b.count).sum();
    assert_eq!(years, 4);
    assert!(stats.publication_years.contains(&CountBucket { name: Some("2020".into()), count: 2 }));
}

#[test]
fn expression_statistics_only_count_datasets_with_expression() {
    let db = seeded_db();
    let stats = db.expression_statistics().unwrap();
    assert_eq!(stats.total_datasets, 3);
    assert_eq!(stats.total_expressions, 3);
    let brain = stats.tissue_types.iter().find(|b| b.name.as_deref() == Some("brain")).unwrap();
    assert_eq!(brain.count, 2);
}

#[test]
fn exportable_datasets_skip_retired_and_empty() {
    let db = seeded_db();
    let ids: Vec<_> = db.exportable_datasets().unwrap().into_iter().filter_map(|d| d.id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn single_inserts_return_row_ids() {
    let db = CatalogDb::open_in_memory().unwrap();
    let id = db.insert_dataset(&DatasetRecord::new("GSE9")).unwrap();
    let sample = db
        .insert_sample(&SampleRecord { dataset_id: id, sample_id: "A".into(), ..Default::default() })
        .unwrap();
    let gene = db.insert_gene(&GeneRecord::new("G1", Some("ABC1"))).unwrap();
    let expr = db
        .insert_expression(&GeneExpressionRecord {
            dataset_id: id,
            sample_id: "A".into(),
            gene_id: "G1".into(),
            ..Default::default()
        })
        .unwrap();
    assert_eq!((id, sample, gene, expr), (1, 1, 1, 1));
    assert_eq!(db.exportable_datasets().unwrap().len(), 1);
}
