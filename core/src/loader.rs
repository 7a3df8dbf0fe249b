use crate::product::ProductSnapshot;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Load product snapshots from a `.json` / `.jsonl` file or a directory of them.
pub fn load_products<P: AsRef<Path>>(path: P) -> Result<Vec<ProductSnapshot>> {
    let input_path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && is_catalog_file(p) {
                files.push(p.to_path_buf());
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        anyhow::bail!("catalog path {} does not exist", input_path.display());
    }

    let mut products = Vec::new();
    for file in files {
        let before = products.len();
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut products)?;
        } else {
            read_json(&file, &mut products)?;
        }
        tracing::debug!(file = %file.display(), products = products.len() - before, "loaded catalog file");
    }
    Ok(products)
}

fn is_catalog_file(p: &Path) -> bool {
    matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl"))
}

fn read_jsonl(file: &Path, out: &mut Vec<ProductSnapshot>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let product: ProductSnapshot = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid product record", file.display(), lineno + 1))?;
        out.push(product);
    }
    Ok(())
}

fn read_json(file: &Path, out: &mut Vec<ProductSnapshot>) -> Result<()> {
    let reader = BufReader::new(File::open(file).with_context(|| format!("opening {}", file.display()))?);
    let json: serde_json::Value =
        serde_json::from_reader(reader).with_context(|| format!("{}: invalid JSON", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                out.push(serde_json::from_value(v).with_context(|| format!("{}: invalid product record", file.display()))?);
            }
        }
        serde_json::Value::Object(_) => {
            out.push(serde_json::from_value(json).with_context(|| format!("{}: invalid product record", file.display()))?);
        }
        _ => {}
    }
    Ok(())
}
