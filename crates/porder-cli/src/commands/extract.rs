//! Extract command - pull a structured purchase order out of one document.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use tracing::{debug, info};

use porder_core::{
    Cell, DocumentInput, ExtractionResult, Extractor, RawGrid, TextLines, VendorProfile,
};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (.csv for decoded grids, .txt for PDF-derived text)
    #[arg(required = true)]
    input: PathBuf,

    /// Built-in vendor profile name
    #[arg(short, long, default_value = "generic")]
    profile: String,

    /// Load the vendor profile from a JSON file instead
    #[arg(long, conflicts_with = "profile")]
    profile_file: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Full result as JSON
    Json,
    /// Line items as CSV
    Csv,
    /// Plain text summary
    Text,
}

pub fn run(args: ExtractArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let profile = load_profile(&args)?;
    info!(profile = %profile.name, "extracting {}", args.input.display());

    let input = decode_input(&args.input)?;
    let extractor = Extractor::new(profile);
    let result = extractor.extract(&input)?;

    for diag in &result.diagnostics {
        debug!(stage = %diag.stage, "{}", diag.message);
    }

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Csv => render_csv(&result)?,
        OutputFormat::Text => render_text(&result),
    };

    match &args.output {
        Some(path) => fs::write(path, rendered)?,
        None => println!("{}", rendered),
    }
    Ok(())
}

fn load_profile(args: &ExtractArgs) -> anyhow::Result<VendorProfile> {
    if let Some(path) = &args.profile_file {
        return Ok(VendorProfile::from_file(path)?);
    }
    VendorProfile::builtin(&args.profile).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown profile '{}' (available: {})",
            args.profile,
            VendorProfile::builtin_names().join(", ")
        )
    })
}

/// Decode the input file by extension. XLSX and PDF decoding live upstream;
/// this tool takes their decoded forms.
fn decode_input(path: &Path) -> anyhow::Result<DocumentInput> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(DocumentInput::Grid(read_csv_grid(path)?)),
        "txt" | "text" => Ok(DocumentInput::Text(TextLines::from_text(
            &fs::read_to_string(path)?,
        ))),
        other => anyhow::bail!("Unsupported input type: .{} (expected .csv or .txt)", other),
    }
}

fn read_csv_grid(path: &Path) -> anyhow::Result<RawGrid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(RawGrid::normalize(rows))
}

fn render_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "line", "item_code", "sku", "asin", "article_id", "hsn_code", "upc", "description",
        "quantity", "unit_cost", "tax_rate", "tax_amount", "mrp", "total_amount",
    ])?;

    for item in &result.lines {
        writer.write_record([
            item.line_number.to_string(),
            item.item_code.clone(),
            item.sku.clone(),
            item.asin.clone(),
            item.article_id.clone(),
            item.hsn_code.clone(),
            item.upc.clone(),
            item.description.clone(),
            item.quantity.to_string(),
            item.unit_cost.to_string(),
            item.tax_rate.to_string(),
            item.tax_amount.to_string(),
            item.mrp.to_string(),
            item.total_amount.to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("csv write failed: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}

fn render_text(result: &ExtractionResult) -> String {
    let mut out = String::new();

    out.push_str("Purchase Order\n==============\n");
    for (field, value) in result.header.iter() {
        out.push_str(&format!("{:20} {}\n", field, value.as_text()));
    }

    out.push_str(&format!(
        "\nItems: {}  Quantity: {}  Amount: {}\n",
        result.total_items, result.total_quantity, result.total_amount
    ));
    for item in &result.lines {
        let id = [
            &item.item_code,
            &item.sku,
            &item.asin,
            &item.article_id,
            &item.description,
        ]
        .into_iter()
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_default();
        out.push_str(&format!(
            "  {:>3}. {:30} x{:<5} {}\n",
            item.line_number, id, item.quantity, item.total_amount
        ));
    }

    if !result.diagnostics.is_empty() {
        out.push_str(&format!("\nDiagnostics: {}\n", result.diagnostics.len()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_csv_decodes_to_grid() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "ASIN,Title,Quantity").unwrap();
        writeln!(file, "B000X1,Widget,5").unwrap();

        let input = decode_input(file.path()).unwrap();
        match input {
            DocumentInput::Grid(grid) => {
                assert_eq!(grid.row_count(), 2);
                assert_eq!(grid.cell(1, 0).as_text(), "B000X1");
            }
            _ => panic!("expected grid input"),
        }
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        assert!(decode_input(file.path()).is_err());
    }

    #[test]
    fn test_csv_render_includes_all_lines() {
        let extractor = Extractor::new(VendorProfile::amazon());
        let result = extractor
            .extract(&DocumentInput::Grid(RawGrid::from_strings(vec![
                vec!["ASIN", "Quantity", "Total Amount"],
                vec!["B000X1", "5", "500.00"],
                vec!["B000X2", "3", "150.00"],
            ])))
            .unwrap();

        let csv = render_csv(&result).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.contains("B000X2"));
    }
}
