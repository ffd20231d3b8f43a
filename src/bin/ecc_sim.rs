//! ecc-sim: drives one orchestrator from YAML sheets.
//!
//! Loads every sheet under a directory, resolves the root sheets, runs a
//! fixed number of fixed-cadence passes and prints what happened.
//!
//! # Environment Variables
//!
//! - `ECC_SHEET_DIR` - Sheet directory (default: `sheets`)
//! - `ECC_ROOT_SHEETS` - Comma-separated root sheet names (default: `player`)
//! - `ECC_FRAMES` - Number of fixed passes (default: 120)
//! - `ECC_DT` - Fixed step in seconds (default: 0.02)
//! - `ECC_STATUS_JSON` - Print the final status report as JSON when `1`
//! - `ECC_NAME`, `ECC_LOG_INIT_STATUS`, `ECC_CATCH_HOOK_PANICS` - see `OrchestratorConfig`
//! - `RUST_LOG` - Tracing filter (default: "info")
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --bin ecc-sim
//! ```

use anyhow::{bail, Context, Result};

use ecc::blocking::{tags, InstigatorId};
use ecc::capabilities::{Capability, CapabilityContext};
use ecc::components::Component;
use ecc::hooks::HookError;
use ecc::orchestrator::{Orchestrator, OrchestratorConfig};
use ecc::sheets::{SheetLibrary, TemplateRegistry};

// ---------------------------------------------------------------------------
// Demo components
// ---------------------------------------------------------------------------

/// Latest sampled input axis.
#[derive(Debug, Default)]
struct InputState {
    axis: f32,
}

impl Component for InputState {}

/// One-dimensional body integrated every fixed pass.
#[derive(Debug, Default)]
struct Motion {
    position: f32,
    velocity: f32,
}

impl Component for Motion {
    fn on_tick(&mut self, dt: f32) -> Result<(), HookError> {
        self.position += self.velocity * dt;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Demo capabilities
// ---------------------------------------------------------------------------

/// Holds the axis for 40 passes, releases it for 20.
#[derive(Default)]
struct SampleInput;

impl Capability for SampleInput {
    fn should_activate(&self, _ctx: &CapabilityContext<'_>) -> bool {
        true
    }

    fn on_tick(&mut self, ctx: &mut CapabilityContext<'_>, _dt: f32) -> Result<(), HookError> {
        let held = ctx.pass() % 60 < 40;
        let input = ctx
            .component_mut::<InputState>()
            .ok_or_else(|| HookError::new("no input component"))?;
        input.axis = if held { 1.0 } else { 0.0 };
        Ok(())
    }
}

/// Moves while the input axis is held.
#[derive(Default)]
struct Walk;

const WALK_SPEED: f32 = 3.0;

fn axis(ctx: &CapabilityContext<'_>) -> f32 {
    ctx.component::<InputState>().map_or(0.0, |i| i.axis)
}

impl Capability for Walk {
    fn should_activate(&self, ctx: &CapabilityContext<'_>) -> bool {
        axis(ctx) != 0.0
    }

    fn should_deactivate(&self, ctx: &CapabilityContext<'_>) -> bool {
        axis(ctx) == 0.0
    }

    fn on_deactivate(&mut self, ctx: &mut CapabilityContext<'_>) -> Result<(), HookError> {
        if let Some(motion) = ctx.component_mut::<Motion>() {
            motion.velocity = 0.0;
        }
        Ok(())
    }

    fn on_tick(&mut self, ctx: &mut CapabilityContext<'_>, _dt: f32) -> Result<(), HookError> {
        let velocity = axis(ctx) * WALK_SPEED;
        if let Some(motion) = ctx.component_mut::<Motion>() {
            motion.velocity = velocity;
        }
        Ok(())
    }
}

/// Every 50 passes, stops the body and blocks movement for 10 passes.
struct Stun {
    instigator: InstigatorId,
    since: u64,
}

impl Default for Stun {
    fn default() -> Self {
        Self {
            instigator: InstigatorId::new("stun"),
            since: 0,
        }
    }
}

impl Capability for Stun {
    fn should_activate(&self, ctx: &CapabilityContext<'_>) -> bool {
        ctx.pass() % 50 == 25
    }

    fn should_deactivate(&self, ctx: &CapabilityContext<'_>) -> bool {
        ctx.pass() >= self.since + 10
    }

    fn on_activate(&mut self, ctx: &mut CapabilityContext<'_>) -> Result<(), HookError> {
        self.since = ctx.pass();
        ctx.block(tags(["movement"]), &self.instigator);
        if let Some(motion) = ctx.component_mut::<Motion>() {
            motion.velocity = 0.0;
        }
        Ok(())
    }

    fn on_deactivate(&mut self, ctx: &mut CapabilityContext<'_>) -> Result<(), HookError> {
        ctx.unblock(tags(["movement"]), &self.instigator);
        Ok(())
    }
}

fn registry() -> TemplateRegistry {
    let mut registry = TemplateRegistry::new();
    registry.register_component::<InputState>("input_state");
    registry.register_component::<Motion>("motion");
    registry.register_capability::<SampleInput>("sample_input");
    registry.register_capability::<Walk>("walk");
    registry.register_capability::<Stun>("stun");
    registry
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let sheet_dir = env_or("ECC_SHEET_DIR", "sheets");
    let roots = env_or("ECC_ROOT_SHEETS", "player");
    let frames: u64 = env_or("ECC_FRAMES", "120")
        .parse()
        .context("ECC_FRAMES must be an unsigned integer")?;
    let dt: f32 = env_or("ECC_DT", "0.02")
        .parse()
        .context("ECC_DT must be a number")?;
    let status_json = std::env::var("ECC_STATUS_JSON").as_deref() == Ok("1");

    let mut library = SheetLibrary::new();
    let loaded = library
        .load_directory(&sheet_dir)
        .with_context(|| format!("loading sheets from {}", sheet_dir))?;
    if loaded == 0 {
        bail!("no sheets found in {}", sheet_dir);
    }
    tracing::info!("Loaded {} sheets from {}", loaded, sheet_dir);

    let root_names: Vec<&str> = roots
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();
    let sheets = library.resolve_many(root_names.iter().copied(), &registry())?;

    let mut orchestrator = Orchestrator::new(OrchestratorConfig::from_env());
    let summary = orchestrator.register_sheets(sheets.iter().map(|sheet| &**sheet))?;
    tracing::info!(
        "Registered {} sheets: {} components, {} capabilities ({} empty slots skipped)",
        summary.sheets,
        summary.components,
        summary.capabilities,
        summary.skipped_slots
    );

    for _ in 0..frames {
        let report = orchestrator.fixed_tick(dt)?;
        if report.activated + report.deactivated > 0 || !report.is_clean() {
            tracing::info!("{}", report);
        } else {
            tracing::debug!("{}", report);
        }
        for failure in &report.failures {
            tracing::warn!("{}", failure);
        }
    }

    if let Some(motion) = orchestrator.get_component::<Motion>() {
        tracing::info!("Final position: {:.3}", motion.position);
    }

    let status = orchestrator.status_report();
    if status_json {
        println!("{}", status.to_json()?);
    } else {
        println!("{}", status);
    }

    let teardown = orchestrator.teardown();
    tracing::info!(
        "Teardown: {} capabilities deactivated, {} components removed",
        teardown.deactivated,
        teardown.components_removed
    );
    Ok(())
}
