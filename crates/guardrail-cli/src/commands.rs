//! Command implementations

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use guardrail_core::{
    CaseFilter, EngineConfig, InMemoryCatalog, InMemoryModelRegistry, ModelConfig, ModelRegistry,
    Report, ReportConfig, TestCase, TestCaseCatalog,
};
use guardrail_sdk::{CustomPrompt, GuardrailClient, TaskRequest, TaskStatus};
use tracing::{debug, info};

use crate::args::{CasesArgs, Cli, ModelsArgs, RunArgs};

fn load_models(path: &Path) -> Result<Arc<InMemoryModelRegistry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read models file {}", path.display()))?;
    let models: Vec<ModelConfig> =
        serde_json::from_str(&content).context("failed to parse models file")?;
    debug!(path = %path.display(), count = models.len(), "loaded model configs");
    let registry = InMemoryModelRegistry::with_models(models)?;
    Ok(Arc::new(registry))
}

fn load_cases(path: &Path) -> Result<Arc<InMemoryCatalog>> {
    if !path.exists() {
        // A run limited to custom prompts needs no catalog.
        return Ok(Arc::new(InMemoryCatalog::new()));
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read cases file {}", path.display()))?;
    let cases: Vec<TestCase> =
        serde_json::from_str(&content).context("failed to parse cases file")?;
    Ok(Arc::new(InMemoryCatalog::with_cases(cases)))
}

pub async fn run(cli: &Cli, args: &RunArgs) -> Result<()> {
    let registry = load_models(&cli.models_file)?;
    let catalog = load_cases(&cli.cases_file)?;

    let mut engine_config = EngineConfig::new().with_retry_attempts(args.retries);
    if let Some(limit) = args.max_in_flight {
        engine_config = engine_config.with_max_in_flight(limit);
    }

    let client = GuardrailClient::builder()
        .with_registry(registry)
        .with_catalog(catalog.clone())
        .with_engine_config(engine_config)
        .with_report_config(ReportConfig::new().with_pass_threshold(args.threshold))
        .build()?;

    let mut request = TaskRequest::new();
    for model in &args.models {
        request = request.with_model(model.as_str());
    }
    for case in &args.cases {
        request = request.with_case(case.as_str());
    }
    if let Some(category) = &args.category {
        for case in catalog.list(&CaseFilter::by_category(category)).await? {
            request = request.with_case(case.id);
        }
    }
    if let Some(prompt) = &args.prompt {
        let mut custom = CustomPrompt::new(prompt);
        if let Some(system) = &args.system {
            custom = custom.with_system_prompt(system);
        }
        request = request.with_custom_prompt(custom);
    }

    let units = client.build_units(&request).await?;
    let total = units.len();
    println!("Submitting {total} evaluation units...");

    let task_id = client.submit_task(units).await?;
    info!(task_id = %task_id, units = total, "task submitted");

    // Status poll with progress output; never blocks on the task itself.
    loop {
        let task = client.get_task(&task_id)?;
        print!("\r  settled {}/{}   ", task.settled_count(), total);
        let _ = std::io::stdout().flush();
        if task.status != TaskStatus::Running {
            println!();
            break;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    let task = client.get_task(&task_id)?;
    if task.status == TaskStatus::Failed {
        anyhow::bail!("task {task_id} failed to start");
    }

    info!(task_id = %task_id, status = %task.status, "task finished");
    let report = client.get_report(&task_id)?;
    print_report(&report);

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

pub async fn models(cli: &Cli, args: &ModelsArgs) -> Result<()> {
    let registry = load_models(&cli.models_file)?;
    let models = registry.list().await?;

    if models.is_empty() {
        println!("No models configured.");
        return Ok(());
    }

    for model in models {
        if args.verify {
            match registry.verify(&model.id).await {
                Ok(()) => println!("{}  {} ({})", "ok".green(), model.id, model.model),
                Err(e) => println!("{}  {} ({}): {e}", "unreachable".red(), model.id, model.model),
            }
        } else {
            println!(
                "{}  {}  model={} temperature={} max_tokens={}",
                model.id, model.name, model.model, model.temperature, model.max_tokens
            );
        }
    }
    Ok(())
}

pub async fn cases(cli: &Cli, args: &CasesArgs) -> Result<()> {
    let catalog = load_cases(&cli.cases_file)?;
    let filter = CaseFilter {
        category: args.category.clone(),
        method: args.method.clone(),
    };
    let cases = catalog.list(&filter).await?;

    if cases.is_empty() {
        println!("No matching test cases.");
        return Ok(());
    }

    for case in cases {
        println!("{}  [{}] {}: {}", case.id, case.category, case.method, case.prompt);
    }
    Ok(())
}

fn print_report(report: &Report) {
    println!();
    println!("{}", "Evaluation report".bold());
    println!(
        "  total: {}   passed: {}   failed: {}",
        report.total_cases,
        report.passed_cases.to_string().green(),
        report.failed_cases.to_string().red()
    );

    println!("  mean scores:");
    for (name, mean) in [
        ("safety", report.average_scores.safety),
        ("robustness", report.average_scores.robustness),
        ("value_alignment", report.average_scores.value_alignment),
        ("privacy_protection", report.average_scores.privacy_protection),
    ] {
        match mean {
            Some(value) => println!("    {name:<20} {value:.3}"),
            None => println!("    {name:<20} {}", "n/a".dimmed()),
        }
    }

    if !report.category_scores.is_empty() {
        println!("  categories:");
        let mut categories: Vec<_> = report.category_scores.iter().collect();
        categories.sort_by_key(|(name, _)| name.as_str());
        for (name, scores) in categories {
            println!("    {name:<20} {} scored units", scores.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_models_roundtrip() {
        let models = vec![
            ModelConfig::new("m1", "Model One", "model-one"),
            ModelConfig::new("m2", "Model Two", "model-two").with_temperature(0.1),
        ];
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), serde_json::to_string(&models).unwrap()).unwrap();

        let registry = load_models(file.path()).unwrap();
        let loaded = registry.list().await.unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_cases_file_yields_empty_catalog() {
        let catalog = load_cases(Path::new("/nonexistent/cases.json")).unwrap();
        let cases = catalog.list(&CaseFilter::default()).await.unwrap();
        assert!(cases.is_empty());
    }
}
