use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use neta_core::db::{CatalogManifest, CatalogStatistics, DatasetFilter, PageRequest};

use crate::commands::{open_context, or_dash, print_json};

/// Load a catalog manifest; `.json` files are parsed as JSON, anything else as YAML.
pub fn load_manifest(path: &Path) -> Result<CatalogManifest> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read catalog manifest at {}", path.display()))?;
    let manifest = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_slice(&bytes).context("Failed to parse catalog manifest JSON")?
    } else {
        serde_yaml::from_slice(&bytes).context("Failed to parse catalog manifest YAML")?
    };
    Ok(manifest)
}

/// Import datasets, samples, genes and expression rows from a manifest file.
pub fn import_catalog_command(root: &str, file: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let manifest = load_manifest(Path::new(file))?;
    let summary = ctx
        .db
        .import_manifest(&manifest)
        .with_context(|| format!("Failed to import catalog manifest {file}"))?;

    if json {
        return print_json(&summary);
    }
    println!("Imported catalog manifest {}:", file);
    println!("  Datasets: {}", summary.datasets);
    println!("  Samples: {}", summary.samples);
    println!("  Genes: {}", summary.genes);
    println!("  Expression rows: {}", summary.expressions);
    Ok(())
}

/// List (or search) datasets, one page at a time.
pub fn list_datasets_command(
    root: &str,
    page: PageRequest,
    filter: &DatasetFilter,
    search: Option<&str>,
    json: bool,
) -> Result<()> {
    let ctx = open_context(root)?;

    if let Some(query) = search {
        let hits = ctx
            .db
            .search_datasets(query, Some(page.per_page))
            .context("Failed to search datasets")?;
        if json {
            return print_json(&hits);
        }
        if hits.is_empty() {
            println!("Datasets matching '{}': (none)", query);
            return Ok(());
        }
        println!("Datasets matching '{}':", query);
        for d in hits {
            println!("- [{}] {} -- {}", d.id, d.geo_id, or_dash(d.title.as_deref()));
        }
        return Ok(());
    }

    let result = ctx.db.filter_datasets(filter, page).context("Failed to list datasets")?;
    if json {
        return print_json(&result);
    }
    println!(
        "Datasets (page {} of {}, {} total):",
        result.current_page, result.pages, result.total
    );
    if result.datasets.is_empty() {
        println!("  (none)");
    }
    for d in result.datasets {
        println!(
            "- [{}] {} | {} / {} | samples: {} | {}",
            d.id,
            d.geo_id,
            or_dash(d.tissue_type.as_deref()),
            or_dash(d.tumor_type.as_deref()),
            d.n_samples.map(|n| n.to_string()).unwrap_or_else(|| "-".into()),
            or_dash(d.title.as_deref()),
        );
    }
    Ok(())
}

/// Search genes by symbol or name.
pub fn search_genes_command(root: &str, query: &str, limit: Option<u32>, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let genes = ctx.db.search_genes(query, limit).context("Failed to search genes")?;
    if json {
        return print_json(&genes);
    }
    if genes.is_empty() {
        println!("Genes matching '{}': (none)", query);
        return Ok(());
    }
    println!("Genes matching '{}':", query);
    for g in genes {
        println!(
            "- {} ({}) {}",
            or_dash(g.gene_symbol.as_deref()),
            g.gene_id,
            or_dash(g.gene_name.as_deref())
        );
    }
    Ok(())
}

/// Print catalog statistics; `expression_only` restricts to datasets with expression rows.
pub fn stats_command(root: &str, expression_only: bool, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let stats = if expression_only {
        ctx.db.expression_statistics()
    } else {
        ctx.db.statistics()
    }
    .context("Failed to compute catalog statistics")?;

    if json {
        return print_json(&stats);
    }
    print_statistics(&stats);
    Ok(())
}

fn print_statistics(stats: &CatalogStatistics) {
    println!("Catalog statistics:");
    println!("  Datasets: {}", stats.total_datasets);
    println!("  Samples: {}", stats.total_samples);
    println!("  Genes: {}", stats.total_genes);
    println!("  Expression rows: {}", stats.total_expressions);
    for (label, buckets) in [
        ("Tissue types", &stats.tissue_types),
        ("Tumor types", &stats.tumor_types),
        ("Publication years", &stats.publication_years),
    ] {
        if buckets.is_empty() {
            continue;
        }
        println!("{label}:");
        for b in buckets {
            println!("  - {}: {}", b.name.as_deref().unwrap_or("(unknown)"), b.count);
        }
    }
}
