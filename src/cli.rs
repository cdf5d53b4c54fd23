//! Thin CLI over the engine, backed by the built-in catalog. Positional
//! args with defaults, JSON to stdout, exit code signalling.

use std::str::FromStr;
use std::sync::Arc;

use crate::cache::CompositionCache as _;
use crate::catalog::seed_repository;
use crate::deps::EngineDeps;
use crate::engine::{ComposeOptions, Engine};
use crate::error::EngineError;
use crate::model::{CombatContext, CombatStyle};
use crate::optimizer::OptimizationRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Compose,
    Validate,
    Optimize,
    Analyze,
    Compare,
    CacheStats,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("compose") => Some(Command::Compose),
        Some("validate") => Some(Command::Validate),
        Some("optimize") => Some(Command::Optimize),
        Some("analyze") => Some(Command::Analyze),
        Some("compare") => Some(Command::Compare),
        Some("cache-stats") => Some(Command::CacheStats),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let engine = match seeded_engine() {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("failed to load the built-in catalog: {err}");
            return 1;
        }
    };

    match parse_command(args) {
        Some(Command::Compose) => handle_compose(&engine, args),
        Some(Command::Validate) => handle_validate(&engine, args),
        Some(Command::Optimize) => handle_optimize(&engine, args),
        Some(Command::Analyze) => handle_analyze(&engine, args),
        Some(Command::Compare) => handle_compare(&engine, args),
        Some(Command::CacheStats) => handle_cache_stats(&engine),
        None => {
            eprintln!(
                "usage: reliquary <compose|validate|optimize|analyze|compare|cache-stats>"
            );
            2
        }
    }
}

fn seeded_engine() -> Result<Engine, serde_json::Error> {
    let repo = Arc::new(seed_repository()?);
    Ok(Engine::new(EngineDeps::new(repo)))
}

fn parse_relic_ids(raw: Option<&String>) -> Vec<String> {
    raw.map(|joined| {
        joined
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_context(args: &[String], style_position: usize) -> Result<CombatContext, EngineError> {
    let mut context = CombatContext::default();
    if let Some(raw_style) = args.get(style_position) {
        context.combat_style = CombatStyle::from_str(raw_style)?;
    }
    if let Some(weapon) = args.iter().position(|arg| arg == "--weapon") {
        context.weapon_type = args.get(weapon + 1).cloned();
    }
    if let Some(level) = args.iter().position(|arg| arg == "--level") {
        context.character_level = args
            .get(level + 1)
            .and_then(|value| value.parse().ok())
            .unwrap_or(1);
    }
    Ok(context)
}

fn print_error(err: &EngineError) -> i32 {
    match serde_json::to_string_pretty(&err.to_payload()) {
        Ok(payload) => eprintln!("{payload}"),
        Err(_) => eprintln!("{err}"),
    }
    1
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize output: {err}");
            1
        }
    }
}

fn handle_compose(engine: &Engine, args: &[String]) -> i32 {
    let relic_ids = parse_relic_ids(args.get(2));
    let context = match parse_context(args, 3) {
        Ok(context) => context,
        Err(err) => return print_error(&err),
    };

    match engine.compose(&relic_ids, Some(&context), &ComposeOptions::default()) {
        Ok(result) => print_json(&result),
        Err(err) => print_error(&err),
    }
}

fn handle_validate(engine: &Engine, args: &[String]) -> i32 {
    let relic_ids = parse_relic_ids(args.get(2));
    let strict = args.iter().any(|arg| arg == "--strict");
    let context = match parse_context(args, 3) {
        Ok(context) => context,
        Err(err) => return print_error(&err),
    };

    match engine.validate(&relic_ids, Some(&context), strict) {
        Ok(bundle) => print_json(&bundle),
        Err(err) => print_error(&err),
    }
}

fn handle_optimize(engine: &Engine, args: &[String]) -> i32 {
    let current_ids = parse_relic_ids(args.get(2));
    let combat_style = match args.get(3) {
        Some(raw) => match CombatStyle::from_str(raw) {
            Ok(style) => style,
            Err(err) => return print_error(&err),
        },
        None => CombatStyle::Melee,
    };

    let request = OptimizationRequest::new(current_ids, combat_style);
    match engine.optimize(&request) {
        Ok(outcome) => print_json(&outcome),
        Err(err) => print_error(&err),
    }
}

fn handle_analyze(engine: &Engine, args: &[String]) -> i32 {
    let relic_ids = parse_relic_ids(args.get(2));
    let context = match parse_context(args, 3) {
        Ok(context) => context,
        Err(err) => return print_error(&err),
    };

    match engine.analyze(&relic_ids, Some(&context)) {
        Ok(report) => print_json(&report),
        Err(err) => print_error(&err),
    }
}

fn handle_compare(engine: &Engine, args: &[String]) -> i32 {
    // Combinations are semicolon-separated lists of comma-separated ids.
    let combinations: Vec<Vec<String>> = args
        .get(2)
        .map(|joined| {
            joined
                .split(';')
                .map(|combo| parse_relic_ids(Some(&combo.to_string())))
                .collect()
        })
        .unwrap_or_default();

    match engine.compare(&combinations, None) {
        Ok(report) => print_json(&report),
        Err(err) => print_error(&err),
    }
}

fn handle_cache_stats(engine: &Engine) -> i32 {
    print_json(&engine.deps().cache.statistics())
}
