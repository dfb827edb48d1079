use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use rowport_cli::pipeline::{
    ImportOutcome, ImportRequest, StoreLayout, list_sessions, record_decision, run_import,
    session_status,
};
use rowport_core::store::LedgerEntry;
use rowport_core::{ImportProfile, SessionStatus};
use rowport_map::EmptyCellPolicy;
use tracing::{info, info_span};

use crate::cli::{DecideArgs, ImportArgs, SourceArgs};

pub fn run_import_command(args: &ImportArgs, store: &StoreLayout) -> Result<ImportOutcome> {
    let span = info_span!("import", profile = %args.profile.display());
    let _guard = span.enter();

    let mut profile = ImportProfile::load(&args.profile)
        .with_context(|| format!("load profile {}", args.profile.display()))?;
    apply_overrides(&mut profile, args);
    let source = resolve_source(&profile, args)?;

    let request = ImportRequest {
        profile,
        source,
        decision: args.decision,
        persist: args.persist,
        register_kinds: args.register_kinds.clone(),
        return_to: Some(args.profile.display().to_string()),
    };
    // No context here: main downcasts to ImportError.
    Ok(run_import(&request, store)?)
}

pub fn run_status(args: &SourceArgs, store: &StoreLayout) -> Result<SessionStatus> {
    session_status(&args.source, store).context("read session state")
}

pub fn run_decide(args: &DecideArgs, store: &StoreLayout) -> Result<SessionStatus> {
    let (status, return_to) =
        record_decision(&args.source, store, args.decision).context("record decision")?;
    info!(key = %status.key, decision = %args.decision, "decision stored");
    if let Some(location) = return_to {
        println!("Resume with: rowport import {location}");
    }
    Ok(status)
}

pub fn run_list(store: &StoreLayout) -> Result<Vec<(String, LedgerEntry)>> {
    list_sessions(store).context("list sessions")
}

fn apply_overrides(profile: &mut ImportProfile, args: &ImportArgs) {
    let options = &mut profile.options;
    if let Some(delimiter) = &args.delimiter {
        options.delimiter = delimiter.clone();
    }
    if let Some(start_row) = args.start_row {
        options.start_row = start_row;
    }
    if args.trim {
        options.trim_cells = true;
    }
    if args.keep_positions {
        options.empty_cells = EmptyCellPolicy::KeepPositions;
    }
}

fn resolve_source(profile: &ImportProfile, args: &ImportArgs) -> Result<PathBuf> {
    args.source
        .clone()
        .or_else(|| profile.source.clone())
        .ok_or_else(|| {
            anyhow!(
                "no source given: pass --source or set \"source\" in {}",
                args.profile.display()
            )
        })
}
