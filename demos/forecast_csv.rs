use expense_forecaster::*;
use std::env;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1);
    let path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos").join("sample_expenses.csv"));
    let horizon: usize = match args.next() {
        Some(raw) => raw.parse()?,
        None => 6,
    };

    println!("📊 Expense Forecast Demo\n");
    println!("Input:   {}", path.display());
    println!("Horizon: {} months\n", horizon);

    let pipeline = ExpenseForecastPipeline::new(ForecastConfig::default())?;
    let outcome = pipeline.run_csv(&path, horizon)?;
    let report = &outcome.report;

    println!("═══════════════════════════════════════════════════════════════");
    println!("Validation");
    println!("═══════════════════════════════════════════════════════════════");
    println!("  Valid: {}", report.is_valid);
    if let Some(info) = &report.data_info {
        println!("  Records: {}", info.record_count);
        println!("  Range:   {}", info.date_range);
        println!("  Filled:  {} missing values", info.missing_values_filled);
    }
    for error in &report.errors {
        println!("  ❌ {}", error);
    }
    for warning in &report.warnings {
        println!("  ⚠️  {}", warning);
    }

    let Some(result) = &outcome.result else {
        println!("\nNo forecast produced.");
        return Ok(());
    };

    println!("\n═══════════════════════════════════════════════════════════════");
    println!("Model selection");
    println!("═══════════════════════════════════════════════════════════════");
    for (column, candidates) in &result.performance {
        let selected = result
            .selected_models
            .get(column)
            .map(String::as_str)
            .unwrap_or("-");
        println!("  {} → {}", column, selected);
        for (name, metrics) in candidates {
            println!(
                "      {:<18} MAE {:>12.2}  RMSE {:>12.2}  R² {:>8.4}",
                name, metrics.mae, metrics.rmse, metrics.r2
            );
        }
    }
    for (column, reason) in &result.category_failures {
        println!("  ⚠️  {} used growth fallback: {}", column, reason);
    }

    println!("\n═══════════════════════════════════════════════════════════════");
    println!("Forecast");
    println!("═══════════════════════════════════════════════════════════════");
    print!("{}", result.to_csv());

    let json_path = env::temp_dir().join("expense_forecast.json");
    std::fs::write(&json_path, outcome.to_json()?)?;
    println!("\n✅ Full outcome written to {}", json_path.display());

    Ok(())
}
