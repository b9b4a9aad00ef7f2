use super::ui;
use crate::core::allocation::{
    AllocationRequest, AllocationResult, Category, allocate_with_observer, split_budget,
};
use crate::core::catalog::{build_catalog, lookup_count};
use crate::core::config::AppConfig;
use crate::core::observer::LoggingObserver;
use crate::core::price::PriceProvider;
use crate::core::report::AllocationReport;
use crate::core::sector::SectorProvider;
use crate::core::universe::{load_broad_market, load_mid_cap};
use anyhow::Result;
use comfy_table::Cell;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone)]
pub struct AllocateOptions {
    pub budget: f64,
    pub mid_cap_percent: f64,
    pub format: OutputFormat,
    /// Overrides `universes.mid_cap` from the config.
    pub mid_cap_csv: Option<PathBuf>,
    /// Overrides `universes.broad_market` from the config.
    pub broad_market_csv: Option<PathBuf>,
}

/// Loads both universes, prices them, allocates the budget and prints the plan.
pub async fn run(
    config: &AppConfig,
    options: &AllocateOptions,
    price_provider: &dyn PriceProvider,
    sector_provider: &dyn SectorProvider,
) -> Result<AllocationResult> {
    let mut request = AllocationRequest {
        total_budget: options.budget,
        mid_cap_percent: options.mid_cap_percent,
        sector_allocation: config.sector_allocation.clone(),
        mid_cap: Vec::new(),
        broad_market: Vec::new(),
    };
    // Fail on bad input before touching files or the network.
    request.validate()?;

    let mid_cap_path = options
        .mid_cap_csv
        .as_ref()
        .unwrap_or(&config.universes.mid_cap);
    let broad_market_path = options
        .broad_market_csv
        .as_ref()
        .unwrap_or(&config.universes.broad_market);
    let broad_market = load_broad_market(broad_market_path)?;
    let mid_cap_symbols = load_mid_cap(mid_cap_path)?;
    info!(
        mid_cap = mid_cap_symbols.len(),
        broad_market = broad_market.len(),
        "Loaded universes"
    );

    let pb = ui::new_progress_bar(lookup_count(&mid_cap_symbols, &broad_market));
    pb.set_message("Fetching sectors and prices...");
    let catalog = build_catalog(
        &mid_cap_symbols,
        &broad_market,
        price_provider,
        sector_provider,
        &|| pb.inc(1),
    )
    .await;
    pb.finish_and_clear();

    request.mid_cap = catalog.mid_cap;
    request.broad_market = catalog.broad_market;
    let result = allocate_with_observer(&request, &LoggingObserver)?;

    match options.format {
        OutputFormat::Table => display_allocation_table(&request, &result),
        OutputFormat::Json => println!("{}", AllocationReport::from(&result).to_json()?),
    }

    Ok(result)
}

fn display_allocation_table(request: &AllocationRequest, result: &AllocationResult) {
    let report = AllocationReport::from(result);
    let split = split_budget(request.total_budget, request.mid_cap_percent);

    println!(
        "\n{}\n",
        ui::style_text("Recommended purchases", ui::StyleType::Title)
    );

    if report.lines.is_empty() {
        println!(
            "{}",
            ui::style_text(
                "No affordable securities for this budget.",
                ui::StyleType::Subtle
            )
        );
    } else {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Category"),
            ui::header_cell("Sector"),
            ui::header_cell("Symbol"),
            ui::header_cell("Price"),
            ui::header_cell("Quantity"),
            ui::header_cell("Remaining Budget"),
        ]);

        for (line, shown) in result.lines.iter().zip(&report.lines) {
            table.add_row(vec![
                ui::category_cell(line.category),
                Cell::new(&shown.sector),
                Cell::new(&shown.symbol),
                ui::amount_cell(shown.price),
                ui::quantity_cell(shown.quantity),
                ui::amount_cell(shown.remaining_budget),
            ]);
        }
        println!("{table}");
    }

    println!();
    for (category, planned) in [
        (Category::MidCap, split.mid_cap),
        (Category::BroadMarket, split.broad_market),
    ] {
        println!(
            "{} {:.2} of {:.2}",
            ui::style_text(&format!("{category} spent:"), ui::StyleType::TotalLabel),
            AllocationReport::spent_in(result, category),
            planned
        );
    }
    println!(
        "{} {}",
        ui::style_text("Total spent:", ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{:.2}", report.total_spent),
            ui::StyleType::TotalValue
        )
    );
    println!(
        "{} {:.2}",
        ui::style_text("Remaining budget:", ui::StyleType::TotalLabel),
        report.remaining_budget
    );

    ui::print_separator();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AllocationError;
    use crate::core::price::PriceResult;
    use std::io::Write;
    use tempfile::NamedTempFile;

    struct MockPriceProvider;

    #[async_trait::async_trait]
    impl PriceProvider for MockPriceProvider {
        async fn fetch_price(&self, symbol: &str) -> anyhow::Result<PriceResult> {
            let price = match symbol {
                "MID1" => 50.0,
                "SP1" => 20.0,
                _ => return Err(anyhow::anyhow!("No price data found for symbol: {symbol}")),
            };
            Ok(PriceResult {
                price,
                currency: "USD".to_string(),
                as_of: None,
            })
        }
    }

    struct MockSectorProvider;

    #[async_trait::async_trait]
    impl SectorProvider for MockSectorProvider {
        async fn fetch_sector(&self, _symbol: &str) -> anyhow::Result<Option<String>> {
            Ok(Some("Technology".to_string()))
        }
    }

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write temp file");
        file
    }

    fn options(
        budget: f64,
        mid_cap_percent: f64,
        mid: &NamedTempFile,
        sp: &NamedTempFile,
    ) -> AllocateOptions {
        AllocateOptions {
            budget,
            mid_cap_percent,
            format: OutputFormat::Table,
            mid_cap_csv: Some(mid.path().to_path_buf()),
            broad_market_csv: Some(sp.path().to_path_buf()),
        }
    }

    #[tokio::test]
    async fn test_allocate_command() {
        let mid = csv_file("Symbol\nMID1\nMID2\n");
        let sp = csv_file("Symbol,Sector\nSP1,Technology\nSP2,Energy\n");

        let result = run(
            &AppConfig::default(),
            &options(1000.0, 50.0, &mid, &sp),
            &MockPriceProvider,
            &MockSectorProvider,
        )
        .await
        .unwrap();

        // 40% of each 500 half goes to Technology.
        let bought: Vec<(&str, u64)> = result
            .lines
            .iter()
            .map(|l| (l.symbol.as_str(), l.quantity))
            .collect();
        assert_eq!(bought, vec![("MID1", 4), ("SP1", 10)]);
        assert_eq!(result.remaining_budget, 600.0);
    }

    #[tokio::test]
    async fn test_allocate_rejects_bad_percent() {
        let mid = csv_file("Symbol\nMID1\n");
        let sp = csv_file("Symbol,Sector\nSP1,Technology\n");

        let err = run(
            &AppConfig::default(),
            &options(1000.0, 150.0, &mid, &sp),
            &MockPriceProvider,
            &MockSectorProvider,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AllocationError>(),
            Some(AllocationError::InvalidMidCapPercent(_))
        ));
    }

    #[tokio::test]
    async fn test_allocate_requires_sector_column() {
        let mid = csv_file("Symbol\nMID1\n");
        let sp = csv_file("Symbol,Name\nSP1,Some Co\n");

        let err = run(
            &AppConfig::default(),
            &options(1000.0, 50.0, &mid, &sp),
            &MockPriceProvider,
            &MockSectorProvider,
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AllocationError>(),
            Some(AllocationError::MissingColumn { column: "Sector", .. })
        ));
    }
}
